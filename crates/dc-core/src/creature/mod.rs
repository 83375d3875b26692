//! Creatures: the player and every monster
//!
//! A [`Creature`] pairs an [`CreatureInfo`] template (copied in, then
//! mutated by negation, empowerment and the like) with its live state.
//! Creatures live in the [`Roster`] and are addressed by [`CreatureId`].

mod flags;
pub mod relations;
mod roster;
mod status;

pub use flags::{AbilityFlags, BehaviorFlags, BookkeepingFlags, MonsterClass, MonsterClasses};
pub use roster::Roster;
pub use status::{StatusEffects, StatusKind};

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::bolt::BoltKind;
use crate::consts::NORMAL_SPEED;
use crate::geom::Pos;
use crate::item::Item;
use crate::map::{DungeonFeature, TerrainFlags};
use crate::rng::RandomRange;

/// Stable handle to a creature in the [`Roster`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CreatureId(pub u32);

impl core::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Behavioral state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum CreatureState {
    Sleeping,
    #[default]
    TrackingScent,
    Wandering,
    Fleeing,
    Ally,
}

/// Behavioral mode, above the state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum CreatureMode {
    #[default]
    Normal,
    PermFleeing,
}

/// Static description of a monster kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureInfo {
    /// Catalog identity; polymorph never picks the same kind
    pub kind: u16,
    pub name: String,
    pub max_hp: i32,
    pub defense: i32,
    pub accuracy: i32,
    pub damage: RandomRange,
    pub movement_duration: i32,
    pub attack_duration: i32,
    pub classes: MonsterClasses,
    pub behaviors: BehaviorFlags,
    pub abilities: AbilityFlags,
    pub blood: Option<DungeonFeature>,
    pub death_feature: Option<DungeonFeature>,
    pub bolts: Vec<BoltKind>,
    /// Hit verbs from feeblest to strongest; `$HESHE` style escapes allowed
    #[serde(default)]
    pub attack_verbs: Vec<String>,
}

impl CreatureInfo {
    pub fn new(kind: u16, name: &str, max_hp: i32, defense: i32, accuracy: i32, damage: RandomRange) -> Self {
        Self {
            kind,
            name: name.to_string(),
            max_hp,
            defense,
            accuracy,
            damage,
            movement_duration: NORMAL_SPEED,
            attack_duration: NORMAL_SPEED,
            classes: MonsterClasses::empty(),
            behaviors: BehaviorFlags::empty(),
            abilities: AbilityFlags::empty(),
            blood: None,
            death_feature: None,
            bolts: Vec::new(),
            attack_verbs: Vec::new(),
        }
    }

    pub fn with_behaviors(mut self, behaviors: BehaviorFlags) -> Self {
        self.behaviors |= behaviors;
        self
    }

    pub fn with_abilities(mut self, abilities: AbilityFlags) -> Self {
        self.abilities |= abilities;
        self
    }

    pub fn with_classes(mut self, classes: MonsterClasses) -> Self {
        self.classes |= classes;
        self
    }

    pub fn with_speed(mut self, movement: i32, attack: i32) -> Self {
        self.movement_duration = movement;
        self.attack_duration = attack;
        self
    }

    pub fn with_blood(mut self, blood: DungeonFeature) -> Self {
        self.blood = Some(blood);
        self
    }

    pub fn with_death_feature(mut self, feature: DungeonFeature) -> Self {
        self.death_feature = Some(feature);
        self.abilities |= AbilityFlags::DF_ON_DEATH;
        self
    }

    pub fn with_bolts(mut self, bolts: &[BoltKind]) -> Self {
        self.bolts = bolts.to_vec();
        self
    }

    pub fn with_attack_verbs(mut self, verbs: &[&str]) -> Self {
        self.attack_verbs = verbs.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Statuses a freshly created creature of this kind starts with
    pub fn innate_statuses(&self) -> StatusEffects {
        let mut status = StatusEffects::default();
        if self.behaviors.contains(BehaviorFlags::FLIES) {
            status.set_both(StatusKind::Levitating, crate::consts::PERMANENT_STATUS);
        }
        if self.behaviors.contains(BehaviorFlags::INVISIBLE) {
            status.set_both(StatusKind::Invisible, crate::consts::PERMANENT_STATUS);
        }
        status
    }

    /// Terrain this kind can never enter
    pub fn forbidden_terrain(&self) -> TerrainFlags {
        let mut flags = TerrainFlags::PATHING_BLOCKER;
        let b = self.behaviors;
        if b.contains(BehaviorFlags::INVULNERABLE) {
            flags.remove(
                TerrainFlags::LAVA_INSTA_DEATH
                    | TerrainFlags::SPONTANEOUSLY_IGNITES
                    | TerrainFlags::IS_FIRE,
            );
        }
        if b.intersects(BehaviorFlags::IMMUNE_TO_FIRE | BehaviorFlags::FLIES) {
            flags.remove(TerrainFlags::LAVA_INSTA_DEATH);
        }
        if b.contains(BehaviorFlags::IMMUNE_TO_FIRE) {
            flags.remove(TerrainFlags::SPONTANEOUSLY_IGNITES | TerrainFlags::IS_FIRE);
        }
        if b.intersects(BehaviorFlags::IMMUNE_TO_WATER | BehaviorFlags::FLIES) {
            flags.remove(TerrainFlags::IS_DEEP_WATER);
        }
        if b.contains(BehaviorFlags::FLIES) {
            flags.remove(TerrainFlags::AUTO_DESCENT | TerrainFlags::IS_DF_TRAP);
        }
        flags
    }

    /// Terrain this kind will not willingly stand in
    pub fn avoided_terrain(&self) -> TerrainFlags {
        let mut flags = self.forbidden_terrain() | TerrainFlags::HARMFUL;
        let b = self.behaviors;
        if b.contains(BehaviorFlags::INVULNERABLE) {
            flags.remove(TerrainFlags::HARMFUL | TerrainFlags::IS_DF_TRAP);
        }
        if b.contains(BehaviorFlags::INANIMATE) {
            flags.remove(TerrainFlags::CAUSES_DAMAGE);
        }
        if b.contains(BehaviorFlags::IMMUNE_TO_FIRE) {
            flags.remove(TerrainFlags::IS_FIRE);
        }
        flags
    }
}

/// Live creature state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: CreatureId,
    pub info: CreatureInfo,
    pub pos: Pos,
    pub current_hp: i32,
    pub status: StatusEffects,
    pub bookkeeping: BookkeepingFlags,
    pub state: CreatureState,
    pub mode: CreatureMode,
    pub leader: Option<CreatureId>,
    pub carried_item: Option<Item>,
    pub carried_monster: Option<Box<Creature>>,
    pub ticks_until_turn: i32,
    pub movement_duration: i32,
    pub attack_duration: i32,
    pub poison_amount: i32,
    pub weakness_amount: i32,
    /// Empowerments and absorbed abilities, used to rank resurrection
    pub total_power_count: i32,
    pub new_power_count: i32,
    /// Whoever last wounded this creature, credited with the kill
    #[serde(default)]
    pub last_attacker: Option<CreatureId>,
}

impl Creature {
    pub fn new(id: CreatureId, info: CreatureInfo, pos: Pos) -> Self {
        let status = info.innate_statuses();
        Self {
            id,
            pos,
            current_hp: info.max_hp,
            status,
            bookkeeping: BookkeepingFlags::empty(),
            state: CreatureState::default(),
            mode: CreatureMode::default(),
            leader: None,
            carried_item: None,
            carried_monster: None,
            ticks_until_turn: 0,
            movement_duration: info.movement_duration,
            attack_duration: info.attack_duration,
            poison_amount: 0,
            weakness_amount: 0,
            total_power_count: 0,
            new_power_count: 0,
            last_attacker: None,
            info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn has_behavior(&self, flags: BehaviorFlags) -> bool {
        self.info.behaviors.intersects(flags)
    }

    pub fn has_ability(&self, flags: AbilityFlags) -> bool {
        self.info.abilities.intersects(flags)
    }

    pub fn has_bookkeeping(&self, flags: BookkeepingFlags) -> bool {
        self.bookkeeping.intersects(flags)
    }

    pub fn status(&self, kind: StatusKind) -> i32 {
        self.status.get(kind)
    }

    /// Dying or already dead; such a creature takes no further part in combat
    pub fn is_dying(&self) -> bool {
        self.has_bookkeeping(BookkeepingFlags::IS_DYING | BookkeepingFlags::HAS_DIED)
    }

    pub fn has_died(&self) -> bool {
        self.has_bookkeeping(BookkeepingFlags::HAS_DIED)
    }

    pub fn is_inanimate(&self) -> bool {
        self.has_behavior(BehaviorFlags::INANIMATE)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.has_behavior(BehaviorFlags::INVULNERABLE)
    }

    pub fn is_immune_to_weapons(&self) -> bool {
        self.has_behavior(BehaviorFlags::IMMUNE_TO_WEAPONS)
    }

    pub fn is_immune_to_fire(&self) -> bool {
        self.has_behavior(BehaviorFlags::IMMUNE_TO_FIRE) || self.status(StatusKind::ImmuneToFire) > 0
    }

    pub fn is_submerged(&self) -> bool {
        self.has_bookkeeping(BookkeepingFlags::SUBMERGED)
    }

    pub fn is_captive(&self) -> bool {
        self.has_bookkeeping(BookkeepingFlags::CAPTIVE)
    }

    pub fn is_ally(&self) -> bool {
        self.state == CreatureState::Ally
    }

    pub fn is_levitating(&self) -> bool {
        self.status(StatusKind::Levitating) > 0
    }

    pub fn is_paralyzed(&self) -> bool {
        self.status(StatusKind::Paralyzed) > 0
    }

    pub fn is_in_class(&self, class: MonsterClass) -> bool {
        self.info.classes.has_class(class)
    }

    /// Net defense after weakness
    pub fn effective_defense(&self) -> i32 {
        (self.info.defense - crate::consts::DEFENSE_PER_WEAKNESS * self.weakness_amount).max(0)
    }

    pub fn heal_fully(&mut self) {
        self.current_hp = self.info.max_hp;
    }
}

/// Grammatical gender used when resolving pronouns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Neuter,
}

impl Creature {
    pub fn gender(&self) -> Gender {
        if self.has_behavior(BehaviorFlags::MALE) {
            Gender::Male
        } else if self.has_behavior(BehaviorFlags::FEMALE) {
            Gender::Female
        } else {
            Gender::Neuter
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A plain 15 HP monster with 70 accuracy and 2-5 damage
    pub fn goblin_info() -> CreatureInfo {
        CreatureInfo::new(1, "goblin", 15, 10, 70, RandomRange::new(2, 5, 1))
            .with_classes(MonsterClass::Goblin.into())
            .with_blood(DungeonFeature::RedBlood)
            .with_behaviors(BehaviorFlags::MALE | BehaviorFlags::FEMALE)
    }

    pub fn jelly_info() -> CreatureInfo {
        CreatureInfo::new(2, "pink jelly", 50, 0, 50, RandomRange::new(1, 3, 1))
            .with_classes(MonsterClass::Jelly.into())
            .with_abilities(AbilityFlags::CLONE_SELF_ON_DEFEND)
            .with_blood(DungeonFeature::PurpleBlood)
    }

    pub fn player_info() -> CreatureInfo {
        CreatureInfo::new(0, "you", 40, 0, 100, RandomRange::new(1, 2, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_new_creature_starts_healthy() {
        let c = Creature::new(CreatureId(3), goblin_info(), Pos::new(4, 4));
        assert_eq!(c.current_hp, 15);
        assert_eq!(c.movement_duration, 100);
        assert!(!c.is_dying());
        assert!(c.is_in_class(MonsterClass::Goblin));
        assert!(!c.is_in_class(MonsterClass::Ogre));
    }

    #[test]
    fn test_flying_creature_levitates() {
        let info = CreatureInfo::new(5, "bat", 18, 20, 100, RandomRange::new(2, 6, 1))
            .with_behaviors(BehaviorFlags::FLIES | BehaviorFlags::FLITS);
        let c = Creature::new(CreatureId(1), info, Pos::new(1, 1));
        assert!(c.is_levitating());
    }

    #[test]
    fn test_effective_defense_floors_at_zero() {
        let mut c = Creature::new(CreatureId(1), goblin_info(), Pos::new(1, 1));
        c.weakness_amount = 1;
        assert_eq!(c.effective_defense(), 0);
    }

    #[test]
    fn test_dying_flags() {
        let mut c = Creature::new(CreatureId(1), jelly_info(), Pos::new(1, 1));
        c.bookkeeping |= BookkeepingFlags::IS_DYING;
        assert!(c.is_dying());
        assert!(!c.has_died());
        assert_eq!(CreatureId(9).to_string(), "#9");
    }
}
