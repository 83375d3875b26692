//! Weapon and armor runics

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

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
pub enum WeaponRunic {
    Speed,
    Quietus,
    Paralysis,
    Multiplicity,
    Slowing,
    Confusion,
    Force,
    Slaying,
    Mercy,
    Plenty,
}

/// Weapon runics below this index help the wielder
pub const NUMBER_GOOD_WEAPON_RUNICS: i32 = 8;

impl WeaponRunic {
    pub fn from_index(i: i32) -> Option<Self> {
        use strum::IntoEnumIterator;
        usize::try_from(i).ok().and_then(|i| Self::iter().nth(i))
    }

    pub fn is_bad(self) -> bool {
        self as i32 >= NUMBER_GOOD_WEAPON_RUNICS
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
pub enum ArmorRunic {
    Multiplicity,
    Mutuality,
    Absorption,
    Reprisal,
    Immunity,
    Reflection,
    Respiration,
    Dampening,
    Burden,
    Vulnerability,
    Immolation,
}

/// Armor runics below this index help the wearer
pub const NUMBER_GOOD_ARMOR_RUNICS: i32 = 8;

impl ArmorRunic {
    pub fn from_index(i: i32) -> Option<Self> {
        use strum::IntoEnumIterator;
        usize::try_from(i).ok().and_then(|i| Self::iter().nth(i))
    }

    pub fn is_bad(self) -> bool {
        self as i32 >= NUMBER_GOOD_ARMOR_RUNICS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_and_bad_runics() {
        assert!(!WeaponRunic::Slaying.is_bad());
        assert!(WeaponRunic::Mercy.is_bad());
        assert!(WeaponRunic::Plenty.is_bad());
        assert!(!ArmorRunic::Dampening.is_bad());
        assert!(ArmorRunic::Burden.is_bad());
        assert_eq!(WeaponRunic::COUNT, 10);
        assert_eq!(ArmorRunic::COUNT, 11);
    }

    #[test]
    fn test_from_index() {
        assert_eq!(WeaponRunic::from_index(6), Some(WeaponRunic::Force));
        assert_eq!(WeaponRunic::from_index(-1), None);
        assert_eq!(ArmorRunic::from_index(10), Some(ArmorRunic::Immolation));
        assert_eq!(ArmorRunic::from_index(11), None);
        assert_eq!(ArmorRunic::Reprisal.to_string(), "reprisal");
    }
}
