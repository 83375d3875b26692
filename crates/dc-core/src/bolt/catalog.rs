//! Bolt catalog

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

use crate::creature::BehaviorFlags;
use crate::errors::CatalogError;
use crate::item::{Item, ItemCategory, StaffKind, WandKind};
use crate::map::DungeonFeature;

/// Every bolt in the catalog, in catalog order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumCount,
)]
pub enum BoltKind {
    Teleport,
    Slow,
    Polymorph,
    Negation,
    Domination,
    Beckoning,
    Plenty,
    Invisibility,
    Empowerment,
    Lightning,
    Fire,
    Poison,
    Tunneling,
    Blinking,
    Entrancement,
    Obstruction,
    Discord,
    Conjuration,
    Healing,
    Haste,
    /// The weaker slowing spell some monsters cast
    SlowShort,
    Shielding,
    Spiderweb,
    Spark,
    Dragonfire,
    Arrow,
    PoisonDart,
    SpiritVines,
    Whip,
}

impl BoltKind {
    /// Catalog entry for this kind
    pub fn bolt(self) -> Bolt {
        bolt_catalog()[self as usize]
    }
}

/// What a bolt does to a creature it hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum BoltEffect {
    None,
    Attack,
    Teleport,
    Slow,
    Polymorph,
    Negation,
    Domination,
    Beckoning,
    Plenty,
    Invisibility,
    Empowerment,
    Damage,
    Poison,
    Tunneling,
    Blinking,
    Entrancement,
    Obstruction,
    Discord,
    Conjuration,
    Healing,
    Haste,
    Shielding,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BoltFlags: u16 {
        /// Keeps going after resolving a creature
        const PASSES_THRU_CREATURES = 1 << 0;
        /// Detonates in the cell before a wall or creature
        const HALTS_BEFORE_OBSTRUCTION = 1 << 1;
        const TARGET_ALLIES = 1 << 2;
        const TARGET_ENEMIES = 1 << 3;
        /// Ignites flammable terrain and the creatures it hits
        const FIERY = 1 << 4;
        const NEVER_REFLECTS = 1 << 6;
        /// Cannot be absorbed by empowered allies
        const NOT_LEARNABLE = 1 << 7;
        /// Survives negation of the creature that knows it
        const NOT_NEGATABLE = 1 << 8;
        const ELECTRIC = 1 << 9;
        const DISPLAY_CHAR_ALONG_LENGTH = 1 << 10;
    }
}

impl_bits_serde!(BoltFlags, u16);

/// A bolt about to be (or being) fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bolt {
    pub kind: BoltKind,
    pub name: &'static str,
    pub effect: BoltEffect,
    pub magnitude: i32,
    /// Spawned in every cell the bolt passes
    pub path_feature: Option<DungeonFeature>,
    /// Spawned where the bolt stops
    pub target_feature: Option<DungeonFeature>,
    /// Creatures with any of these behaviors are never targeted with it
    pub forbidden_behaviors: BehaviorFlags,
    pub flags: BoltFlags,
}

impl Bolt {
    pub fn has_flag(&self, flags: BoltFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn with_magnitude(mut self, magnitude: i32) -> Self {
        self.magnitude = magnitude;
        self
    }
}

#[allow(clippy::too_many_arguments)]
const fn entry(
    kind: BoltKind,
    name: &'static str,
    effect: BoltEffect,
    magnitude: i32,
    path_feature: Option<DungeonFeature>,
    target_feature: Option<DungeonFeature>,
    forbidden_behaviors: BehaviorFlags,
    flags: BoltFlags,
) -> Bolt {
    Bolt {
        kind,
        name,
        effect,
        magnitude,
        path_feature,
        target_feature,
        forbidden_behaviors,
        flags,
    }
}

const fn plain(kind: BoltKind, name: &'static str, effect: BoltEffect, magnitude: i32, forbidden: BehaviorFlags, flags: BoltFlags) -> Bolt {
    entry(kind, name, effect, magnitude, None, None, forbidden, flags)
}

const NONE: BehaviorFlags = BehaviorFlags::empty();
const ENEMIES: BoltFlags = BoltFlags::TARGET_ENEMIES;
const ALLIES: BoltFlags = BoltFlags::TARGET_ALLIES;

static CATALOG: [Bolt; BoltKind::COUNT] = {
    use BoltEffect as E;
    use BoltKind as K;
    use BehaviorFlags as B;
    use BoltFlags as F;
    [
        plain(K::Teleport, "teleportation spell", E::Teleport, 10, B::IMMOBILE, ENEMIES),
        plain(K::Slow, "slowing spell", E::Slow, 10, B::INANIMATE, ENEMIES),
        plain(K::Polymorph, "polymorph spell", E::Polymorph, 10, B::INANIMATE, ENEMIES),
        plain(K::Negation, "negation magic", E::Negation, 10, NONE, ENEMIES),
        plain(K::Domination, "domination spell", E::Domination, 10, B::INANIMATE, ENEMIES),
        plain(K::Beckoning, "beckoning spell", E::Beckoning, 10, B::IMMOBILE, ENEMIES),
        plain(K::Plenty, "spell of plenty", E::Plenty, 10, B::INANIMATE, ALLIES.union(F::NOT_LEARNABLE)),
        plain(K::Invisibility, "invisibility magic", E::Invisibility, 10, B::INANIMATE, ALLIES),
        plain(K::Empowerment, "empowerment sorcery", E::Empowerment, 10, B::INANIMATE, ALLIES.union(F::NOT_LEARNABLE)),
        plain(
            K::Lightning,
            "lightning",
            E::Damage,
            10,
            NONE,
            F::PASSES_THRU_CREATURES.union(ENEMIES).union(F::ELECTRIC),
        ),
        plain(K::Fire, "flame", E::Damage, 4, B::IMMUNE_TO_FIRE, ENEMIES.union(F::FIERY)),
        plain(K::Poison, "poison ray", E::Poison, 10, B::INANIMATE, ENEMIES),
        plain(K::Tunneling, "tunneling magic", E::Tunneling, 10, NONE, F::PASSES_THRU_CREATURES),
        plain(K::Blinking, "blink trajectory", E::Blinking, 5, NONE, F::HALTS_BEFORE_OBSTRUCTION),
        plain(K::Entrancement, "entrancement ray", E::Entrancement, 10, B::INANIMATE, ENEMIES),
        plain(K::Obstruction, "obstruction magic", E::Obstruction, 10, NONE, F::HALTS_BEFORE_OBSTRUCTION),
        plain(K::Discord, "spell of discord", E::Discord, 10, B::INANIMATE, ENEMIES),
        plain(
            K::Conjuration,
            "conjuration magic",
            E::Conjuration,
            10,
            B::IMMUNE_TO_WEAPONS,
            F::HALTS_BEFORE_OBSTRUCTION.union(ENEMIES),
        ),
        plain(K::Healing, "healing magic", E::Healing, 5, NONE, ALLIES),
        plain(K::Haste, "haste spell", E::Haste, 2, B::INANIMATE, ALLIES),
        plain(K::SlowShort, "slowing spell", E::Slow, 2, B::INANIMATE, ENEMIES),
        plain(K::Shielding, "protection magic", E::Shielding, 5, B::INANIMATE, ALLIES),
        entry(
            K::Spiderweb,
            "spiderweb",
            E::None,
            10,
            Some(DungeonFeature::SpiderwebSmall),
            Some(DungeonFeature::SpiderwebLarge),
            B::IMMOBILE.union(B::IMMUNE_TO_WEBS),
            ENEMIES.union(F::NEVER_REFLECTS).union(F::NOT_LEARNABLE),
        ),
        plain(
            K::Spark,
            "spark",
            E::Damage,
            1,
            NONE,
            F::PASSES_THRU_CREATURES.union(ENEMIES).union(F::ELECTRIC),
        ),
        entry(
            K::Dragonfire,
            "dragonfire",
            E::Damage,
            18,
            Some(DungeonFeature::ObsidianPath),
            None,
            B::IMMUNE_TO_FIRE,
            ENEMIES.union(F::FIERY).union(F::NOT_LEARNABLE),
        ),
        plain(
            K::Arrow,
            "arrow",
            E::Attack,
            1,
            B::IMMUNE_TO_WEAPONS,
            ENEMIES.union(F::NEVER_REFLECTS).union(F::NOT_LEARNABLE),
        ),
        plain(
            K::PoisonDart,
            "poisoned dart",
            E::Attack,
            1,
            NONE,
            ENEMIES.union(F::NEVER_REFLECTS).union(F::NOT_LEARNABLE),
        ),
        entry(
            K::SpiritVines,
            "growing vines",
            E::None,
            5,
            Some(DungeonFeature::SpiritGrass),
            Some(DungeonFeature::SpiritVines),
            B::INANIMATE.union(B::IMMUNE_TO_WEBS),
            ENEMIES.union(F::NEVER_REFLECTS),
        ),
        plain(
            K::Whip,
            "whip",
            E::Attack,
            1,
            B::IMMUNE_TO_WEAPONS,
            ENEMIES
                .union(F::NEVER_REFLECTS)
                .union(F::NOT_LEARNABLE)
                .union(F::DISPLAY_CHAR_ALONG_LENGTH),
        ),
    ]
};

/// The whole catalog, indexed by `BoltKind as usize`
pub fn bolt_catalog() -> &'static [Bolt; BoltKind::COUNT] {
    &CATALOG
}

/// Look a bolt up by its catalog name. Two entries share the name
/// "slowing spell"; the stronger one is returned.
pub fn bolt_by_name(name: &str) -> Result<Bolt, CatalogError> {
    CATALOG
        .iter()
        .find(|b| b.name == name)
        .copied()
        .ok_or_else(|| CatalogError::UnknownBolt(name.to_string()))
}

/// The bolt a staff or wand fires, or `None` for anything else.
///
/// Staffs fire at their enchantment level (at least 1); wands always fire
/// at the catalog magnitude.
pub fn bolt_for_item(item: &Item) -> Option<Bolt> {
    match item.category {
        ItemCategory::Staff => {
            let kind = match StaffKind::from_index(item.kind)? {
                StaffKind::Lightning => BoltKind::Lightning,
                StaffKind::Firebolt => BoltKind::Fire,
                StaffKind::Poison => BoltKind::Poison,
                StaffKind::Tunneling => BoltKind::Tunneling,
                StaffKind::Blinking => BoltKind::Blinking,
                StaffKind::Entrancement => BoltKind::Entrancement,
                StaffKind::Obstruction => BoltKind::Obstruction,
                StaffKind::Discord => BoltKind::Discord,
                StaffKind::Conjuration => BoltKind::Conjuration,
                StaffKind::Healing => BoltKind::Healing,
                StaffKind::Haste => BoltKind::Haste,
                StaffKind::Protection => BoltKind::Shielding,
            };
            Some(kind.bolt().with_magnitude(item.enchant1.max(1)))
        }
        ItemCategory::Wand => {
            let kind = match WandKind::from_index(item.kind)? {
                WandKind::Teleport => BoltKind::Teleport,
                WandKind::Slow => BoltKind::Slow,
                WandKind::Polymorph => BoltKind::Polymorph,
                WandKind::Negation => BoltKind::Negation,
                WandKind::Domination => BoltKind::Domination,
                WandKind::Beckoning => BoltKind::Beckoning,
                WandKind::Plenty => BoltKind::Plenty,
                WandKind::Invisibility => BoltKind::Invisibility,
                WandKind::Empowerment => BoltKind::Empowerment,
            };
            Some(kind.bolt())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::item::ItemId;

    #[test]
    fn test_catalog_is_in_kind_order() {
        for kind in BoltKind::iter() {
            assert_eq!(kind.bolt().kind, kind);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let b = bolt_by_name("dragonfire").unwrap();
        assert_eq!(b.magnitude, 18);
        assert_eq!(b.path_feature, Some(DungeonFeature::ObsidianPath));
        assert!(b.has_flag(BoltFlags::FIERY));
        assert_eq!(bolt_by_name("slowing spell").unwrap().magnitude, 10);
        assert_eq!(
            bolt_by_name("magic missile"),
            Err(CatalogError::UnknownBolt("magic missile".into()))
        );
    }

    #[test]
    fn test_staff_magnitude_follows_enchant() {
        let staff = Item::staff(ItemId(1), StaffKind::Firebolt, 3);
        let bolt = bolt_for_item(&staff).unwrap();
        assert_eq!(bolt.kind, BoltKind::Fire);
        assert_eq!(bolt.magnitude, 3);

        let drained = Item::staff(ItemId(2), StaffKind::Lightning, 0);
        assert_eq!(bolt_for_item(&drained).unwrap().magnitude, 1);
    }

    #[test]
    fn test_wands_use_catalog_magnitude() {
        let wand = Item::wand(ItemId(1), WandKind::Beckoning, 4);
        let bolt = bolt_for_item(&wand).unwrap();
        assert_eq!(bolt.effect, BoltEffect::Beckoning);
        assert_eq!(bolt.magnitude, 10);
        assert!(bolt_for_item(&Item::ring(ItemId(2), crate::item::RingKind::Light, 1)).is_none());
    }
}
