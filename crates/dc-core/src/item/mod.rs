//! Items and the enchantment model

pub mod enchant;
mod kinds;
mod pack;
pub mod power;
mod runics;

pub use enchant::{accuracy_fraction, damage_fraction, defense_fraction, net_enchant, strength_modifier};
pub use kinds::{
    ArmorKind, ArmorStats, CharmKind, ItemCategory, RingKind, StaffKind, WandKind, WeaponKind,
    WeaponStats,
};
pub use pack::{FloorItem, Pack};
pub use runics::{ArmorRunic, NUMBER_GOOD_ARMOR_RUNICS, NUMBER_GOOD_WEAPON_RUNICS, WeaponRunic};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::creature::MonsterClass;
use crate::rng::RandomRange;

/// Soul-bearing kills before an unknown weapon identifies itself
pub const WEAPON_KILLS_TO_AUTO_ID: i32 = 20;

/// Turns of wear before unknown armor identifies itself
pub const ARMOR_DELAY_TO_AUTO_ID: i32 = 1000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ItemId(pub u32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFlags: u32 {
        const IDENTIFIED = 1 << 0;
        const EQUIPPED = 1 << 1;
        const CURSED = 1 << 2;
        const PROTECTED = 1 << 3;
        const RUNIC = 1 << 5;
        const RUNIC_HINTED = 1 << 6;
        const RUNIC_IDENTIFIED = 1 << 7;
        const CAN_BE_IDENTIFIED = 1 << 8;
        const SNEAK_ATTACK_BONUS = 1 << 12;
        const ATTACKS_STAGGER = 1 << 16;
        const ATTACKS_EXTEND = 1 << 17;
        const ATTACKS_QUICKLY = 1 << 18;
        const ATTACKS_PENETRATE = 1 << 19;
        const ATTACKS_ALL_ADJACENT = 1 << 20;
        const LUNGE_ATTACKS = 1 << 21;
    }
}

impl_bits_serde!(ItemFlags, u32);

/// One item or stack of identical items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub category: ItemCategory,
    pub kind: u16,
    pub flags: ItemFlags,
    pub damage: RandomRange,
    /// Armor value in tenths
    pub armor: i32,
    /// Staff and wand charges, or the auto-identification countdown for
    /// weapons and armor
    pub charges: i32,
    pub enchant1: i32,
    /// Runic selector for weapons and armor
    pub enchant2: i32,
    pub strength_required: i32,
    pub quantity: i32,
    pub vorpal_enemy: Option<MonsterClass>,
}

impl Item {
    fn blank(id: ItemId, category: ItemCategory, kind: u16) -> Self {
        Self {
            id,
            category,
            kind,
            flags: ItemFlags::empty(),
            damage: RandomRange::default(),
            armor: 0,
            charges: 0,
            enchant1: 0,
            enchant2: 0,
            strength_required: 0,
            quantity: 1,
            vorpal_enemy: None,
        }
    }

    pub fn weapon(id: ItemId, kind: WeaponKind) -> Self {
        let stats = kind.stats();
        let mut item = Self::blank(id, ItemCategory::Weapon, kind as u16);
        item.damage = stats.damage;
        item.strength_required = stats.strength_required;
        item.flags = stats.flags;
        item.charges = WEAPON_KILLS_TO_AUTO_ID;
        item
    }

    pub fn armor(id: ItemId, kind: ArmorKind) -> Self {
        let stats = kind.stats();
        let mut item = Self::blank(id, ItemCategory::Armor, kind as u16);
        item.armor = stats.armor;
        item.strength_required = stats.strength_required;
        item.charges = ARMOR_DELAY_TO_AUTO_ID;
        item
    }

    pub fn staff(id: ItemId, kind: StaffKind, enchant: i32) -> Self {
        let mut item = Self::blank(id, ItemCategory::Staff, kind as u16);
        item.enchant1 = enchant;
        item.charges = enchant;
        item
    }

    pub fn wand(id: ItemId, kind: WandKind, charges: i32) -> Self {
        let mut item = Self::blank(id, ItemCategory::Wand, kind as u16);
        item.charges = charges;
        item
    }

    pub fn ring(id: ItemId, kind: RingKind, enchant: i32) -> Self {
        let mut item = Self::blank(id, ItemCategory::Ring, kind as u16);
        item.enchant1 = enchant;
        item
    }

    pub fn charm(id: ItemId, kind: CharmKind, enchant: i32) -> Self {
        let mut item = Self::blank(id, ItemCategory::Charm, kind as u16);
        item.enchant1 = enchant;
        item
    }

    /// A generic item of another category, for pack filler and steal targets
    pub fn other(id: ItemId, category: ItemCategory, kind: u16) -> Self {
        Self::blank(id, category, kind)
    }

    /// Set the enchantment level
    pub fn with_enchant(mut self, enchant: i32) -> Self {
        self.enchant1 = enchant;
        self
    }

    pub fn with_quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Attach a weapon runic. Slaying runics need a target class.
    pub fn with_weapon_runic(mut self, runic: WeaponRunic, vorpal: Option<MonsterClass>) -> Self {
        self.flags |= ItemFlags::RUNIC;
        self.enchant2 = runic as i32;
        self.vorpal_enemy = vorpal;
        self
    }

    /// Attach an armor runic. Immunity runics need a target class.
    pub fn with_armor_runic(mut self, runic: ArmorRunic, vorpal: Option<MonsterClass>) -> Self {
        self.flags |= ItemFlags::RUNIC;
        self.enchant2 = runic as i32;
        self.vorpal_enemy = vorpal;
        self
    }

    pub fn is_weapon(&self) -> bool {
        self.category == ItemCategory::Weapon
    }

    pub fn is_armor(&self) -> bool {
        self.category == ItemCategory::Armor
    }

    pub fn has_flag(&self, flags: ItemFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn is_equipped(&self) -> bool {
        self.has_flag(ItemFlags::EQUIPPED)
    }

    /// The weapon runic, or `None` for anything that is not a runic weapon
    pub fn weapon_runic(&self) -> Option<WeaponRunic> {
        if self.is_weapon() && self.has_flag(ItemFlags::RUNIC) {
            WeaponRunic::from_index(self.enchant2)
        } else {
            None
        }
    }

    /// The armor runic, or `None` for anything that is not runic armor
    pub fn armor_runic(&self) -> Option<ArmorRunic> {
        if self.is_armor() && self.has_flag(ItemFlags::RUNIC) {
            ArmorRunic::from_index(self.enchant2)
        } else {
            None
        }
    }

    /// True when this is a slaying weapon keyed to `class`
    pub fn slays(&self, class: impl Into<crate::creature::MonsterClasses>) -> bool {
        self.weapon_runic() == Some(WeaponRunic::Slaying)
            && self
                .vorpal_enemy
                .is_some_and(|v| class.into().has_class(v))
    }

    /// Armor of immunity against one of `classes`
    pub fn grants_immunity_to(&self, classes: crate::creature::MonsterClasses) -> bool {
        self.armor_runic() == Some(ArmorRunic::Immunity)
            && self.vorpal_enemy.is_some_and(|v| classes.has_class(v))
    }

    /// Base name without quantity or article
    pub fn kind_name(&self) -> String {
        match self.category {
            ItemCategory::Weapon => WeaponKind::from_index(self.kind)
                .map(|k| k.stats().name.to_string())
                .unwrap_or_else(|| "weapon".into()),
            ItemCategory::Armor => ArmorKind::from_index(self.kind)
                .map(|k| k.stats().name.to_string())
                .unwrap_or_else(|| "armor".into()),
            ItemCategory::Staff => StaffKind::from_index(self.kind)
                .map(|k| format!("staff of {}", k))
                .unwrap_or_else(|| "staff".into()),
            ItemCategory::Wand => WandKind::from_index(self.kind)
                .map(|k| format!("wand of {}", k))
                .unwrap_or_else(|| "wand".into()),
            ItemCategory::Ring => RingKind::from_index(self.kind)
                .map(|k| format!("ring of {}", k))
                .unwrap_or_else(|| "ring".into()),
            ItemCategory::Charm => CharmKind::from_index(self.kind)
                .map(|k| format!("{} charm", k))
                .unwrap_or_else(|| "charm".into()),
            ItemCategory::Food => "ration of food".into(),
            ItemCategory::Potion => "potion".into(),
            ItemCategory::Scroll => "scroll".into(),
            ItemCategory::Gold => "gold piece".into(),
            ItemCategory::Amulet => "Amulet of Yendor".into(),
            ItemCategory::Gem => "lumenstone".into(),
            ItemCategory::Key => "key".into(),
        }
    }

    /// Display name.
    ///
    /// Stacks are prefixed with their count; single items get an indefinite
    /// article when `include_article` is set. Known enchantments and
    /// runics are shown.
    pub fn name(&self, include_article: bool) -> String {
        let mut root = self.kind_name();
        if self.quantity > 1 {
            root = pluralize(&root);
        }
        if (self.is_weapon() || self.is_armor()) && self.has_flag(ItemFlags::IDENTIFIED) {
            root = format!("{}{} {}", if self.enchant1 < 0 { "" } else { "+" }, self.enchant1, root);
        }
        if self.has_flag(ItemFlags::RUNIC_IDENTIFIED) {
            let runic = self
                .weapon_runic()
                .map(|r| r.to_string())
                .or_else(|| self.armor_runic().map(|r| r.to_string()));
            if let Some(runic) = runic {
                match (runic.as_str(), self.vorpal_enemy) {
                    ("slaying", Some(class)) => root = format!("{} of {} slaying", root, class),
                    ("immunity", Some(class)) => root = format!("{} of {} immunity", root, class),
                    _ => root = format!("{} of {}", root, runic),
                }
            }
        }
        if self.quantity > 1 {
            format!("{} {}", self.quantity, root)
        } else if include_article {
            let article = if is_vowelish(&root) { "an" } else { "a" };
            format!("{} {}", article, root)
        } else {
            root
        }
    }
}

/// Whether a name reads with "an": a leading vowel, or an enchantment that
/// is pronounced with one (+8, +11, +18).
fn is_vowelish(name: &str) -> bool {
    if let Some(rest) = name.strip_prefix('+') {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        return matches!(digits.as_str(), "8" | "11" | "18") || digits.starts_with('8') && digits.len() == 2;
    }
    name.starts_with(['a', 'e', 'i', 'o', 'u', 'A', 'E', 'I', 'O', 'U'])
}

fn pluralize(name: &str) -> String {
    // "staff of lightning" -> "staffs of lightning"
    if let Some((head, tail)) = name.split_once(" of ") {
        format!("{} of {}", pluralize(head), tail)
    } else if name.ends_with("armor") || name.ends_with("mail") {
        format!("suits of {}", name)
    } else if name.ends_with('h') || name.ends_with('s') {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}
