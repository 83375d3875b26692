//! Simulation constants

/// Dungeon width in cells
pub const DCOLS: i32 = 79;

/// Dungeon height in cells
pub const DROWS: i32 = 29;

/// Longest path a bolt can follow, reflections included
pub const MAX_BOLT_LENGTH: usize = (DCOLS as usize) * 10;

/// Turns for a creature with no regeneration bonus to fully heal
pub const TURNS_FOR_FULL_REGEN: i64 = 300;

/// Base accuracy of the player before weapon enchantment
pub const PLAYER_BASE_ACCURACY: i32 = 100;

/// Normal speed, in ticks per action
pub const NORMAL_SPEED: i32 = 100;

/// Ticks a creature released from a dead carrier waits before acting
pub const RELEASED_CREATURE_DELAY: i32 = 200;

/// Shield points per point of absorbed damage
pub const SHIELD_POINTS_PER_DAMAGE: i32 = 10;

/// Longest monster name that keeps its own name on a spectral copy
pub const SPECTRAL_NAME_LIMIT: usize = 6;

/// Flat accuracy granted per point of net enchantment to spectral images
pub const SPECTRAL_ACCURACY_PER_ENCHANT: i32 = 5;

/// Duration of an innate status that never wears off
pub const PERMANENT_STATUS: i32 = 1000;

/// Probability decrement of the obstruction forcefield at magnitude zero
pub const FORCEFIELD_BASE_DECREMENT: i64 = 75;

/// Multiplicity armor trigger chance in melee
pub const ARMOR_MULTIPLICITY_CHANCE: i32 = 33;

/// Burden armor trigger chance
pub const ARMOR_BURDEN_CHANCE: i32 = 10;

/// Immolation armor trigger chance
pub const ARMOR_IMMOLATION_CHANCE: i32 = 10;

/// Minimum burn duration when a creature catches fire
pub const BURN_DURATION: i32 = 7;

/// Weakness never exceeds this many points
pub const MAX_WEAKNESS: i32 = 10;

/// Defense lost per point of weakness for monsters
pub const DEFENSE_PER_WEAKNESS: i32 = 25;

/// Lowest enchantment an item can be degraded to by acid
pub const MIN_DEGRADE_ENCHANT: i32 = -10;

/// Hit verbs a creature kind may list
pub const MAX_ATTACK_VERBS: usize = 5;

/// Longest weapon name that a spectral weapon image is named after
pub const SPECTRAL_WEAPON_NAME_LIMIT: usize = 8;

/// Creature kind of spectral blades and weapon images
pub const SPECTRAL_BLADE_KIND: u16 = u16::MAX;
