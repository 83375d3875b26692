//! Item kinds and their base tables

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

use super::ItemFlags;
use crate::rng::RandomRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum ItemCategory {
    Food,
    Weapon,
    Armor,
    Potion,
    Scroll,
    Staff,
    Wand,
    Ring,
    Charm,
    Gold,
    Amulet,
    Gem,
    Key,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumCount,
)]
pub enum WeaponKind {
    Dagger,
    Sword,
    Broadsword,
    Whip,
    Rapier,
    Flail,
    Mace,
    WarHammer,
    Spear,
    WarPike,
    Axe,
    WarAxe,
    Dart,
    IncendiaryDart,
    Javelin,
}

/// Base stats shared by every item of a weapon kind
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    pub name: &'static str,
    pub strength_required: i32,
    pub damage: RandomRange,
    pub flags: ItemFlags,
}

const fn weapon(name: &'static str, strength: i32, lo: i32, hi: i32, clump: i32, flags: ItemFlags) -> WeaponStats {
    WeaponStats {
        name,
        strength_required: strength,
        damage: RandomRange::new(lo, hi, clump),
        flags,
    }
}

const WEAPON_TABLE: [WeaponStats; WeaponKind::COUNT] = [
    weapon("dagger", 12, 3, 4, 1, ItemFlags::SNEAK_ATTACK_BONUS),
    weapon("sword", 14, 7, 9, 1, ItemFlags::empty()),
    weapon("broadsword", 19, 14, 22, 1, ItemFlags::empty()),
    weapon("whip", 14, 3, 5, 1, ItemFlags::ATTACKS_EXTEND),
    weapon(
        "rapier",
        15,
        3,
        5,
        1,
        ItemFlags::ATTACKS_QUICKLY.union(ItemFlags::LUNGE_ATTACKS),
    ),
    weapon("flail", 17, 9, 15, 1, ItemFlags::empty()),
    weapon("mace", 16, 16, 20, 1, ItemFlags::ATTACKS_STAGGER),
    weapon("war hammer", 20, 25, 35, 1, ItemFlags::ATTACKS_STAGGER),
    weapon("spear", 13, 4, 5, 1, ItemFlags::ATTACKS_PENETRATE),
    weapon("war pike", 18, 11, 15, 1, ItemFlags::ATTACKS_PENETRATE),
    weapon("axe", 15, 7, 9, 1, ItemFlags::ATTACKS_ALL_ADJACENT),
    weapon("war axe", 19, 12, 17, 1, ItemFlags::ATTACKS_ALL_ADJACENT),
    weapon("dart", 10, 2, 4, 1, ItemFlags::empty()),
    weapon("incendiary dart", 12, 1, 2, 1, ItemFlags::empty()),
    weapon("javelin", 15, 3, 11, 3, ItemFlags::empty()),
];

impl WeaponKind {
    pub fn stats(self) -> &'static WeaponStats {
        &WEAPON_TABLE[self as usize]
    }

    /// Thrown weapons come in stacks
    pub fn is_thrown(self) -> bool {
        matches!(self, WeaponKind::Dart | WeaponKind::IncendiaryDart | WeaponKind::Javelin)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumCount,
)]
pub enum ArmorKind {
    LeatherArmor,
    ScaleMail,
    ChainMail,
    BandedMail,
    SplintMail,
    PlateArmor,
}

#[derive(Debug, Clone, Copy)]
pub struct ArmorStats {
    pub name: &'static str,
    pub strength_required: i32,
    /// Armor value in tenths of a displayed point
    pub armor: i32,
}

const ARMOR_TABLE: [ArmorStats; ArmorKind::COUNT] = [
    ArmorStats { name: "leather armor", strength_required: 10, armor: 30 },
    ArmorStats { name: "scale mail", strength_required: 12, armor: 40 },
    ArmorStats { name: "chain mail", strength_required: 13, armor: 50 },
    ArmorStats { name: "banded mail", strength_required: 15, armor: 70 },
    ArmorStats { name: "splint mail", strength_required: 17, armor: 90 },
    ArmorStats { name: "plate armor", strength_required: 19, armor: 110 },
];

impl ArmorKind {
    pub fn stats(self) -> &'static ArmorStats {
        &ARMOR_TABLE[self as usize]
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum StaffKind {
    Lightning,
    Firebolt,
    Poison,
    Tunneling,
    Blinking,
    Entrancement,
    Obstruction,
    Discord,
    Conjuration,
    Healing,
    Haste,
    Protection,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum WandKind {
    Teleport,
    Slow,
    Polymorph,
    Negation,
    Domination,
    Beckoning,
    Plenty,
    Invisibility,
    Empowerment,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum RingKind {
    Clairvoyance,
    Stealth,
    Regeneration,
    Transference,
    Light,
    Awareness,
    Wisdom,
    Reaping,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum CharmKind {
    Health,
    Protection,
    Haste,
    #[strum(serialize = "fire immunity")]
    FireImmunity,
    Invisibility,
    Telepathy,
    Levitation,
    Shattering,
    Guardian,
    Teleportation,
    Recharging,
    Negation,
}

macro_rules! kind_from_index {
    ($($ty:ty),*) => {
        $(impl $ty {
            pub fn from_index(i: u16) -> Option<Self> {
                use strum::IntoEnumIterator;
                Self::iter().nth(i as usize)
            }
        })*
    };
}

kind_from_index!(WeaponKind, ArmorKind, StaffKind, WandKind, RingKind, CharmKind);
