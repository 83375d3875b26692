//! dc-core: deterministic simulation core for a roguelike dungeon crawler
//!
//! Combat resolution, the item and enchantment model, and bolt physics,
//! driven by an explicit [`Sim`] context. The crate performs no I/O:
//! terrain comes in through the [`DungeonMap`] trait and outcomes go out as
//! messages, [`SimEvent`]s and optional telemetry.
//!
//! Every gameplay draw comes from the substantive stream of [`GameRng`], so
//! the same seed and the same sequence of calls reproduce the same game.

/// Serialize a bitflags type through its raw bits.
macro_rules! impl_bits_serde {
    ($ty:ty, $bits:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.bits().serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bits = <$bits as serde::Deserialize>::deserialize(deserializer)?;
                Ok(<$ty>::from_bits_truncate(bits))
            }
        }
    };
}

pub mod bolt;
pub mod combat;
pub mod config;
pub mod consts;
pub mod creature;
pub mod errors;
pub mod events;
pub mod fixed;
pub mod geom;
pub mod item;
pub mod map;
pub mod messages;
pub mod rng;
pub mod sim;
pub mod telemetry;
pub mod trajectory;

pub use config::SimConfig;
pub use creature::{Creature, CreatureId, CreatureInfo};
pub use errors::{CatalogError, ConfigError, RosterError, SimError, SimResult};
pub use events::SimEvent;
pub use fixed::Fixed;
pub use geom::Pos;
pub use item::{Item, ItemId};
pub use map::{DungeonMap, GridMap, TerrainFlags};
pub use rng::{GameRng, RandomRange, RngStream};
pub use sim::Sim;
