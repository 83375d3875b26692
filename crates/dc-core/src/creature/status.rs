//! Timed status effects
//!
//! Every creature tracks a current value and a maximum for each status.
//! Most statuses count down one per turn; the maximum is kept so a display
//! can show how much of an effect remains.

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
pub enum StatusKind {
    Searching,
    Donning,
    Weakened,
    Telepathic,
    Hallucinating,
    Levitating,
    Slowed,
    Hasted,
    Confused,
    Burning,
    Paralyzed,
    Poisoned,
    Stuck,
    Nauseous,
    Discordant,
    ImmuneToFire,
    ExplosionImmunity,
    Nutrition,
    EntersLevelIn,
    Enraged,
    MagicalFear,
    Entranced,
    Darkened,
    LifespanRemaining,
    Shielded,
    Invisible,
    Aggravating,
}

impl StatusKind {
    /// Statuses that negation clears, with the value the player keeps.
    ///
    /// Monsters always drop to zero. The player keeps a residual turn of
    /// telepathy, levitation and fire immunity so the effect ends on the
    /// next tick instead of mid-action.
    pub fn negation_residue(self) -> Option<i32> {
        use StatusKind::*;
        match self {
            Telepathic | Levitating | ImmuneToFire => Some(1),
            Hallucinating | Slowed | Hasted | Confused | Discordant | MagicalFear | Entranced
            | Darkened | Shielded | Invisible => Some(0),
            _ => None,
        }
    }
}

/// Current and maximum value for every [`StatusKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    current: [i32; StatusKind::COUNT],
    max: [i32; StatusKind::COUNT],
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            current: [0; StatusKind::COUNT],
            max: [0; StatusKind::COUNT],
        }
    }
}

impl StatusEffects {
    pub fn get(&self, kind: StatusKind) -> i32 {
        self.current[kind as usize]
    }

    pub fn max(&self, kind: StatusKind) -> i32 {
        self.max[kind as usize]
    }

    pub fn is_active(&self, kind: StatusKind) -> bool {
        self.get(kind) > 0
    }

    /// Set the current value only
    pub fn set(&mut self, kind: StatusKind, value: i32) {
        self.current[kind as usize] = value;
    }

    pub fn set_max(&mut self, kind: StatusKind, value: i32) {
        self.max[kind as usize] = value;
    }

    /// Set both current and maximum
    pub fn set_both(&mut self, kind: StatusKind, value: i32) {
        self.set(kind, value);
        self.set_max(kind, value);
    }

    /// Raise the current value to at least `value`, raising the maximum with it.
    pub fn extend_to(&mut self, kind: StatusKind, value: i32) {
        let cur = self.get(kind).max(value);
        self.set(kind, cur);
        self.set_max(kind, self.max(kind).max(cur));
    }

    pub fn add(&mut self, kind: StatusKind, amount: i32) {
        self.current[kind as usize] += amount;
    }

    pub fn clear(&mut self, kind: StatusKind) {
        self.set_both(kind, 0);
    }

    /// Iterate over every status with a positive value
    pub fn active(&self) -> impl Iterator<Item = (StatusKind, i32)> + '_ {
        use strum::IntoEnumIterator;
        StatusKind::iter()
            .map(|k| (k, self.get(k)))
            .filter(|&(_, v)| v > 0)
    }
}
