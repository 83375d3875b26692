//! Typed outcome events
//!
//! Every state change a presentation layer might want to animate or log is
//! appended to [`Sim::events`](crate::sim::Sim) in the order it happened.
//! Events are a record only; nothing in the simulation reads them back.

use serde::{Deserialize, Serialize};

use crate::creature::{CreatureId, StatusKind};
use crate::geom::Pos;
use crate::item::ItemId;
use crate::map::DungeonFeature;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Hit points removed after shields
    Damage {
        attacker: Option<CreatureId>,
        defender: CreatureId,
        amount: i32,
    },
    Heal {
        creature: CreatureId,
        amount: i32,
    },
    Death {
        creature: CreatureId,
        administrative: bool,
    },
    PlayerDied {
        killed_by: String,
    },
    StatusChange {
        creature: CreatureId,
        status: StatusKind,
        value: i32,
    },
    Split {
        original: CreatureId,
        clone: CreatureId,
    },
    Clone {
        original: CreatureId,
        clone: CreatureId,
    },
    Teleport {
        creature: CreatureId,
        from: Pos,
        to: Pos,
    },
    Reflection {
        at: Pos,
        by: Option<CreatureId>,
    },
    FeatureSpawned {
        at: Pos,
        feature: DungeonFeature,
    },
    ItemStolen {
        thief: CreatureId,
        item: ItemId,
    },
    ItemIdentified {
        item: ItemId,
    },
}

impl SimEvent {
    /// The creature most directly affected, if any
    pub fn subject(&self) -> Option<CreatureId> {
        match self {
            SimEvent::Damage { defender, .. } => Some(*defender),
            SimEvent::Heal { creature, .. }
            | SimEvent::Death { creature, .. }
            | SimEvent::StatusChange { creature, .. }
            | SimEvent::Teleport { creature, .. } => Some(*creature),
            SimEvent::Split { original, .. } | SimEvent::Clone { original, .. } => Some(*original),
            SimEvent::ItemStolen { thief, .. } => Some(*thief),
            SimEvent::Reflection { by, .. } => *by,
            SimEvent::PlayerDied { .. }
            | SimEvent::FeatureSpawned { .. }
            | SimEvent::ItemIdentified { .. } => None,
        }
    }
}
