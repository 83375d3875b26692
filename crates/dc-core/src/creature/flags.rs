//! Creature flag sets and monster classes

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

bitflags! {
    /// Innate behaviors (MONST_*)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BehaviorFlags: u32 {
        const INVISIBLE = 1 << 0;
        const INANIMATE = 1 << 1;
        const IMMOBILE = 1 << 2;
        const CARRY_ITEM_100 = 1 << 3;
        const CARRY_ITEM_25 = 1 << 4;
        const ALWAYS_HUNTING = 1 << 5;
        const FLEES_NEAR_DEATH = 1 << 6;
        const ATTACKABLE_THRU_WALLS = 1 << 7;
        const DEFEND_DEGRADE_WEAPON = 1 << 8;
        const IMMUNE_TO_WEAPONS = 1 << 9;
        const FLIES = 1 << 10;
        const FLITS = 1 << 11;
        const IMMUNE_TO_FIRE = 1 << 12;
        const CAST_SPELLS_SLOWLY = 1 << 13;
        const IMMUNE_TO_WEBS = 1 << 14;
        const REFLECT_50 = 1 << 15;
        const NEVER_SLEEPS = 1 << 16;
        const FIERY = 1 << 17;
        const INVULNERABLE = 1 << 18;
        const IMMUNE_TO_WATER = 1 << 19;
        const RESTRICTED_TO_LIQUID = 1 << 20;
        const SUBMERGES = 1 << 21;
        const MAINTAINS_DISTANCE = 1 << 22;
        const WILL_NOT_USE_STAIRS = 1 << 23;
        const DIES_IF_NEGATED = 1 << 24;
        const MALE = 1 << 25;
        const FEMALE = 1 << 26;
        const NOT_LISTED_IN_SIDEBAR = 1 << 27;
        const GETS_TURN_ON_ACTIVATION = 1 << 28;
        const ALWAYS_USE_ABILITY = 1 << 29;
        const NO_POLYMORPH = 1 << 30;

        /// Behaviors that negation strips
        const NEGATABLE_TRAITS = Self::INVISIBLE.bits()
            | Self::DEFEND_DEGRADE_WEAPON.bits()
            | Self::IMMUNE_TO_WEAPONS.bits()
            | Self::FLIES.bits()
            | Self::FLITS.bits()
            | Self::IMMUNE_TO_FIRE.bits()
            | Self::REFLECT_50.bits()
            | Self::FIERY.bits()
            | Self::MAINTAINS_DISTANCE.bits();

        const TURRET = Self::IMMUNE_TO_WEBS.bits()
            | Self::NEVER_SLEEPS.bits()
            | Self::IMMOBILE.bits()
            | Self::INANIMATE.bits()
            | Self::ATTACKABLE_THRU_WALLS.bits()
            | Self::WILL_NOT_USE_STAIRS.bits();
    }
}

impl_bits_serde!(BehaviorFlags, u32);

bitflags! {
    /// Special abilities (MA_*)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AbilityFlags: u32 {
        const HIT_HALLUCINATE = 1 << 0;
        const HIT_STEAL_FLEE = 1 << 1;
        const HIT_BURN = 1 << 2;
        const ENTER_SUMMONS = 1 << 3;
        const HIT_DEGRADE_ARMOR = 1 << 4;
        const CAST_SUMMON = 1 << 5;
        const SEIZES = 1 << 6;
        const POISONS = 1 << 7;
        const DF_ON_DEATH = 1 << 8;
        const CLONE_SELF_ON_DEFEND = 1 << 9;
        const KAMIKAZE = 1 << 10;
        const TRANSFERENCE = 1 << 11;
        const CAUSES_WEAKNESS = 1 << 12;
        const ATTACKS_PENETRATE = 1 << 13;
        const ATTACKS_ALL_ADJACENT = 1 << 14;
        const ATTACKS_EXTEND = 1 << 15;
        const ATTACKS_STAGGER = 1 << 16;
        const AVOID_CORRIDORS = 1 << 17;
        const REFLECT_100 = 1 << 18;

        /// Abilities resolved after a successful hit
        const SPECIAL_HIT = Self::HIT_HALLUCINATE.bits()
            | Self::HIT_STEAL_FLEE.bits()
            | Self::HIT_DEGRADE_ARMOR.bits()
            | Self::POISONS.bits()
            | Self::TRANSFERENCE.bits()
            | Self::CAUSES_WEAKNESS.bits()
            | Self::HIT_BURN.bits()
            | Self::ATTACKS_STAGGER.bits();

        /// Attack shapes that survive negation
        const NON_NEGATABLE = Self::ATTACKS_PENETRATE.bits()
            | Self::ATTACKS_ALL_ADJACENT.bits()
            | Self::ATTACKS_EXTEND.bits()
            | Self::ATTACKS_STAGGER.bits();
    }
}

impl_bits_serde!(AbilityFlags, u32);

bitflags! {
    /// Per-creature bookkeeping (MB_*)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BookkeepingFlags: u32 {
        const WAS_VISIBLE = 1 << 0;
        const TELEPATHICALLY_REVEALED = 1 << 1;
        const PREPLACED = 1 << 2;
        const LEADER = 1 << 6;
        const FOLLOWER = 1 << 7;
        const CAPTIVE = 1 << 8;
        const SEIZED = 1 << 9;
        const SEIZING = 1 << 10;
        const SUBMERGED = 1 << 11;
        const JUST_SUMMONED = 1 << 12;
        const BOUND_TO_LEADER = 1 << 14;
        const ABSORBING = 1 << 16;
        const DOES_NOT_TRACK_LEADER = 1 << 17;
        const IS_FALLING = 1 << 18;
        const IS_DYING = 1 << 19;
        const IS_DORMANT = 1 << 21;
        /// Killing it counts toward weapon auto-ID; resurrectable as an ally
        const HAS_SOUL = 1 << 22;
        const ALREADY_SEEN = 1 << 23;
        const ADMINISTRATIVE_DEATH = 1 << 24;
        const HAS_DIED = 1 << 25;
        const DOES_NOT_RESURRECT = 1 << 26;
    }
}

impl_bits_serde!(BookkeepingFlags, u32);

/// Monster classes targeted by slaying weapons and immunity armor
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
pub enum MonsterClass {
    Abomination,
    Dar,
    Animal,
    Goblin,
    Ogre,
    Dragon,
    Undead,
    Jelly,
    Turret,
    Infernal,
    Mage,
    Waterborne,
    Airborne,
    Fireborne,
    Troll,
}

bitflags! {
    /// Class membership of a monster kind
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MonsterClasses: u16 {
        const ABOMINATION = 1 << 0;
        const DAR = 1 << 1;
        const ANIMAL = 1 << 2;
        const GOBLIN = 1 << 3;
        const OGRE = 1 << 4;
        const DRAGON = 1 << 5;
        const UNDEAD = 1 << 6;
        const JELLY = 1 << 7;
        const TURRET = 1 << 8;
        const INFERNAL = 1 << 9;
        const MAGE = 1 << 10;
        const WATERBORNE = 1 << 11;
        const AIRBORNE = 1 << 12;
        const FIREBORNE = 1 << 13;
        const TROLL = 1 << 14;
    }
}

impl_bits_serde!(MonsterClasses, u16);

impl MonsterClass {
    pub fn flag(self) -> MonsterClasses {
        MonsterClasses::from_bits_truncate(1 << self as u16)
    }
}

impl MonsterClasses {
    pub fn has_class(self, class: MonsterClass) -> bool {
        self.contains(class.flag())
    }
}

impl From<MonsterClass> for MonsterClasses {
    fn from(class: MonsterClass) -> Self {
        class.flag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_class_flags_are_distinct() {
        let mut all = MonsterClasses::empty();
        for class in MonsterClass::iter() {
            assert!(!all.intersects(class.flag()), "{} overlaps", class);
            all |= class.flag();
        }
        assert_eq!(all, MonsterClasses::all());
        assert_eq!(MonsterClass::COUNT, 15);
    }

    #[test]
    fn test_composite_masks() {
        assert!(AbilityFlags::SPECIAL_HIT.contains(AbilityFlags::POISONS));
        assert!(!AbilityFlags::SPECIAL_HIT.contains(AbilityFlags::SEIZES));
        assert!(BehaviorFlags::NEGATABLE_TRAITS.contains(BehaviorFlags::FLIES));
        assert!(!BehaviorFlags::NEGATABLE_TRAITS.contains(BehaviorFlags::INANIMATE));
    }

    #[test]
    fn test_flag_serde_uses_bits() {
        let flags = BookkeepingFlags::HAS_SOUL | BookkeepingFlags::CAPTIVE;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, ((1u32 << 22) | (1 << 8)).to_string());
        let back: BookkeepingFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn test_class_display() {
        assert_eq!(MonsterClass::Goblin.to_string(), "goblin");
        assert!(MonsterClasses::from(MonsterClass::Dragon).has_class(MonsterClass::Dragon));
    }
}
