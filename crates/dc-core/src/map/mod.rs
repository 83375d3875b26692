//! Terrain queries
//!
//! The simulation never owns the dungeon. It reads terrain flags and player
//! visibility through [`DungeonMap`] and changes terrain only by asking the
//! map to spawn a dungeon feature, expose a cell to fire, or tunnel through
//! an obstruction.

mod grid;

pub use grid::{GridMap, SpawnRecord};

use core::any::Any;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::geom::Pos;

bitflags! {
    /// Terrain properties of a cell, merged over all its layers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TerrainFlags: u32 {
        const OBSTRUCTS_PASSABILITY = 1 << 0;
        const OBSTRUCTS_VISION = 1 << 1;
        const OBSTRUCTS_ITEMS = 1 << 2;
        const OBSTRUCTS_SURFACE_EFFECTS = 1 << 3;
        const OBSTRUCTS_GAS = 1 << 4;
        const IS_DEEP_WATER = 1 << 5;
        const LAVA_INSTA_DEATH = 1 << 6;
        const AUTO_DESCENT = 1 << 7;
        const IS_DF_TRAP = 1 << 8;
        const IS_FIRE = 1 << 9;
        const IS_FLAMMABLE = 1 << 10;
        const SPONTANEOUSLY_IGNITES = 1 << 11;
        const ENTANGLES = 1 << 12;
        const ALLOWS_SUBMERGING = 1 << 13;
        const REFLECTS_BOLTS = 1 << 14;
        const STAND_IN_TILE = 1 << 15;
        const IMPREGNABLE = 1 << 16;
        const CAUSES_DAMAGE = 1 << 17;
        const OBSTRUCTS_DIAGONAL_MOVEMENT = 1 << 18;

        /// Anything a wall-hugging creature would refuse to walk into
        const PATHING_BLOCKER = Self::OBSTRUCTS_PASSABILITY.bits()
            | Self::AUTO_DESCENT.bits()
            | Self::IS_DF_TRAP.bits()
            | Self::LAVA_INSTA_DEATH.bits()
            | Self::IS_DEEP_WATER.bits()
            | Self::SPONTANEOUSLY_IGNITES.bits();

        /// Terrain that hurts whatever stands in it
        const HARMFUL = Self::IS_FIRE.bits() | Self::CAUSES_DAMAGE.bits();

        /// Cells a bolt or line of sight cannot pass
        const OBSTRUCTS_BOLTS = Self::OBSTRUCTS_PASSABILITY.bits()
            | Self::OBSTRUCTS_VISION.bits();

        /// A solid wall
        const WALL = Self::OBSTRUCTS_BOLTS.bits()
            | Self::OBSTRUCTS_DIAGONAL_MOVEMENT.bits();
    }
}

impl_bits_serde!(TerrainFlags, u32);

/// Dungeon features the simulation can ask the map to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum DungeonFeature {
    RedBlood,
    GreenBlood,
    PurpleBlood,
    WormBlood,
    AcidBlood,
    AshBlood,
    EctoplasmBlood,
    RubbleBlood,
    RotGasPuff,
    BloatDeath,
    MutationExplosion,
    Forcefield,
    SpiderwebSmall,
    SpiderwebLarge,
    ObsidianPath,
    SpiritGrass,
    SpiritVines,
    ArmorImmolation,
    Incineration,
}

/// Read access to terrain plus the few mutations a bolt can cause.
///
/// `Any` is a supertrait so owners of a boxed map can downcast back to the
/// concrete type.
pub trait DungeonMap: Any {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    fn in_bounds(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width() && p.y < self.height()
    }

    /// Union of the terrain flags at `p`; empty when out of bounds.
    fn terrain_flags(&self, p: Pos) -> TerrainFlags;

    /// Whether any flag in `mask` is present at `p`
    fn cell_has_terrain_flag(&self, p: Pos, mask: TerrainFlags) -> bool {
        self.terrain_flags(p).intersects(mask)
    }

    /// Whether a diagonal step from `from` to `to` would cut a corner that
    /// forbids it. Orthogonal steps are never blocked.
    fn diagonal_blocked(&self, from: Pos, to: Pos) -> bool {
        if from.x == to.x || from.y == to.y {
            return false;
        }
        [Pos::new(from.x, to.y), Pos::new(to.x, from.y)]
            .into_iter()
            .any(|corner| self.cell_has_terrain_flag(corner, TerrainFlags::OBSTRUCTS_DIAGONAL_MOVEMENT))
    }

    /// Whether the player can currently see `p`
    fn player_can_see(&self, p: Pos) -> bool;

    /// Spawn a feature at `p`. `probability_decrement` overrides the
    /// feature's own spread: the falloff of a forcefield, or the start
    /// probability (in percent of the catalog value) of a blood splatter.
    fn spawn_feature(&mut self, p: Pos, feature: DungeonFeature, probability_decrement: Option<i32>);

    /// Expose `p` to fire; returns true if something there ignited.
    fn expose_to_fire(&mut self, p: Pos, always_ignite: bool) -> bool;

    /// Dissolve an obstruction at `p`. Returns true only if something was
    /// actually removed; impregnable and open cells return false.
    fn tunnelize(&mut self, p: Pos) -> bool;

    /// What a creature knocked into `p` slams against
    fn describe(&self, p: Pos) -> String {
        if self.cell_has_terrain_flag(p, TerrainFlags::OBSTRUCTS_PASSABILITY) {
            "the wall".to_string()
        } else {
            "the ground".to_string()
        }
    }
}
