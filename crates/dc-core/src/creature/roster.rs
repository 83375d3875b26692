//! Creature arena with ordered membership lists

use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{BehaviorFlags, BookkeepingFlags, Creature, CreatureId, CreatureInfo};
use crate::errors::RosterError;
use crate::geom::Pos;

/// Owns every creature on the level, the player included.
///
/// Order matters for message phrasing and for which creature wins ties, so
/// new arrivals are prepended to the active list, and the dead are
/// prepended to the graveyard or purgatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    creatures: HashMap<CreatureId, Creature>,
    player: Option<CreatureId>,
    active: VecDeque<CreatureId>,
    graveyard: VecDeque<CreatureId>,
    purgatory: VecDeque<CreatureId>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id
    pub fn allocate_id(&mut self) -> CreatureId {
        let id = CreatureId(self.next_id);
        self.next_id += 1;
        id
    }

    fn admit(&mut self, creature: Creature) -> Result<CreatureId, RosterError> {
        let id = creature.id;
        if self.creatures.contains_key(&id) {
            return Err(RosterError::Duplicate(id));
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.creatures.insert(id, creature);
        Ok(id)
    }

    /// Register the player. The player is never on the active list.
    pub fn insert_player(&mut self, player: Creature) -> Result<CreatureId, RosterError> {
        let id = self.admit(player)?;
        self.player = Some(id);
        Ok(id)
    }

    /// Add a monster at the head of the active list.
    pub fn add(&mut self, creature: Creature) -> Result<CreatureId, RosterError> {
        let id = self.admit(creature)?;
        self.active.push_front(id);
        Ok(id)
    }

    /// Create a monster from a template at the head of the active list.
    pub fn spawn(&mut self, info: CreatureInfo, pos: Pos) -> CreatureId {
        let id = self.allocate_id();
        self.creatures.insert(id, Creature::new(id, info, pos));
        self.active.push_front(id);
        id
    }

    pub fn player_id(&self) -> Option<CreatureId> {
        self.player
    }

    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn contains(&self, id: CreatureId) -> bool {
        self.creatures.contains_key(&id)
    }

    pub fn is_active(&self, id: CreatureId) -> bool {
        self.active.contains(&id)
    }

    /// Active monster ids, newest first
    pub fn active_ids(&self) -> Vec<CreatureId> {
        self.active.iter().copied().collect()
    }

    /// Active monsters, newest first
    pub fn monsters(&self) -> impl Iterator<Item = &Creature> + '_ {
        self.active.iter().filter_map(|id| self.creatures.get(id))
    }

    pub fn graveyard(&self) -> impl Iterator<Item = &Creature> + '_ {
        self.graveyard.iter().filter_map(|id| self.creatures.get(id))
    }

    pub fn purgatory(&self) -> impl Iterator<Item = &Creature> + '_ {
        self.purgatory.iter().filter_map(|id| self.creatures.get(id))
    }

    /// The living creature standing at `p`, checking the player first
    pub fn creature_at(&self, p: Pos) -> Option<CreatureId> {
        if let Some(player) = self.player.and_then(|id| self.creatures.get(&id))
            && player.pos == p
            && !player.has_died()
        {
            return Some(player.id);
        }
        self.monsters()
            .find(|c| c.pos == p && !c.has_died())
            .map(|c| c.id)
    }

    /// Move every dead monster off the active list.
    ///
    /// Allies of the player with a soul go to purgatory (and lose their
    /// death marker so they can come back); everything else is buried in
    /// the graveyard.
    pub fn remove_dead_monsters(&mut self) {
        let player = self.player;
        let dead: Vec<CreatureId> = self
            .active
            .iter()
            .copied()
            .filter(|id| self.creatures.get(id).is_some_and(|c| c.has_died()))
            .collect();
        for id in dead {
            self.active.retain(|&a| a != id);
            let Some(c) = self.creatures.get_mut(&id) else {
                continue;
            };
            let resurrectable = c.leader.is_some()
                && c.leader == player
                && !c.has_bookkeeping(
                    BookkeepingFlags::DOES_NOT_RESURRECT | BookkeepingFlags::ADMINISTRATIVE_DEATH,
                )
                && !c.has_behavior(BehaviorFlags::INANIMATE)
                && c.has_bookkeeping(BookkeepingFlags::HAS_SOUL);
            if resurrectable {
                c.bookkeeping.remove(BookkeepingFlags::HAS_DIED);
                self.purgatory.push_front(id);
            } else {
                self.graveyard.push_front(id);
            }
        }
    }

    /// Return the purgatory ally with the most accumulated power (ties go to
    /// the most recently fallen) to the head of the active list.
    pub fn take_from_purgatory(&mut self) -> Option<CreatureId> {
        let mut best: Option<(CreatureId, i32)> = None;
        for &id in &self.purgatory {
            let Some(c) = self.creatures.get(&id) else {
                continue;
            };
            if best.is_none_or(|(_, power)| c.total_power_count > power) {
                best = Some((id, c.total_power_count));
            }
        }
        let (id, _) = best?;
        self.purgatory.retain(|&p| p != id);
        self.active.push_front(id);
        Some(id)
    }

    /// Drop a creature entirely, wherever it is listed.
    pub fn remove(&mut self, id: CreatureId) -> Result<Creature, RosterError> {
        let creature = self.creatures.remove(&id).ok_or(RosterError::Missing(id))?;
        self.active.retain(|&a| a != id);
        self.graveyard.retain(|&a| a != id);
        self.purgatory.retain(|&a| a != id);
        if self.player == Some(id) {
            self.player = None;
        }
        Ok(creature)
    }

    /// Number of living allies of the player on the active list
    pub fn allied_count(&self) -> usize {
        self.monsters()
            .filter(|c| c.is_ally() && !c.is_dying())
            .count()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}
