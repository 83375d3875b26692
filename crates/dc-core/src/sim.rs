//! The simulation context
//!
//! [`Sim`] owns everything a combat or bolt resolution touches: the random
//! number generator, a handle to the dungeon map, the creature roster, the
//! player's pack and bonuses, the message log and the outcome record.
//! Operations elsewhere in the crate take `&mut Sim` and creature handles.

use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::creature::{
    BookkeepingFlags, Creature, CreatureId, CreatureInfo, CreatureState, Roster, StatusKind,
};
use crate::errors::{CatalogError, SimResult};
use crate::events::SimEvent;
use crate::fixed::Fixed;
use crate::geom::{NB_DIRS, Pos};
use crate::item::{FloorItem, Item, ItemCategory, ItemFlags, ItemId, Pack, RingKind, net_enchant};
use crate::map::{DungeonFeature, DungeonMap, TerrainFlags};
use crate::messages::{MessageColor, MessageFlags, MessageLog};
use crate::rng::{GameRng, RandomRange};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Damage of an unarmed player
pub const UNARMED_DAMAGE: RandomRange = RandomRange::new(1, 2, 1);

/// Player attributes that live outside the creature record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub strength: i32,
    /// Ring bonuses, summed over equipped rings
    pub clairvoyance: i32,
    pub stealth_bonus: i32,
    pub regeneration_bonus: i32,
    pub transference: i32,
    pub light_multiplier: i32,
    pub awareness_bonus: i32,
    pub wisdom_bonus: i32,
    pub reaping: i32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            strength: 12,
            clairvoyance: 0,
            stealth_bonus: 0,
            regeneration_bonus: 0,
            transference: 0,
            light_multiplier: 1,
            awareness_bonus: 0,
            wisdom_bonus: 0,
            reaping: 0,
        }
    }
}

pub struct Sim {
    pub rng: GameRng,
    pub map: Box<dyn DungeonMap>,
    pub roster: Roster,
    player: CreatureId,
    pub rogue: PlayerState,
    pub pack: Pack,
    pub floor: Vec<FloorItem>,
    pub messages: MessageLog,
    pub events: Vec<SimEvent>,
    pub config: SimConfig,
    /// Monster kinds available to polymorph and hallucination
    pub catalog: Vec<CreatureInfo>,
    /// "You hear combat in the distance" has been shown this turn
    pub heard_combat_this_turn: bool,
    /// Set once the player dies, with the cause of death
    pub game_over: Option<String>,
    pub depth: i32,
    telemetry: Option<Box<dyn TelemetrySink>>,
    next_item_id: u32,
}

impl Sim {
    /// Build a context around a map with the player standing at `at`.
    pub fn new(
        config: SimConfig,
        map: Box<dyn DungeonMap>,
        seed: u64,
        player: CreatureInfo,
        at: Pos,
    ) -> SimResult<Self> {
        config.validate()?;
        let mut roster = Roster::new();
        let id = roster.allocate_id();
        let mut you = Creature::new(id, player, at);
        you.state = CreatureState::Ally;
        roster.insert_player(you)?;
        let rng = GameRng::new(seed);
        info!(seed = rng.seed(), "simulation created");
        Ok(Self {
            rng,
            map,
            roster,
            player: id,
            rogue: PlayerState::default(),
            pack: Pack::new(),
            floor: Vec::new(),
            messages: MessageLog::new(),
            events: Vec::new(),
            config,
            catalog: Vec::new(),
            heard_combat_this_turn: false,
            game_over: None,
            depth: 1,
            telemetry: None,
            next_item_id: 1,
        })
    }

    pub fn with_catalog(mut self, catalog: Vec<CreatureInfo>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn set_telemetry(&mut self, sink: Box<dyn TelemetrySink>) {
        self.telemetry = Some(sink);
    }

    pub fn monster_by_name(&self, name: &str) -> Result<&CreatureInfo, CatalogError> {
        self.catalog
            .iter()
            .find(|info| info.name == name)
            .ok_or_else(|| CatalogError::UnknownMonster(name.to_string()))
    }

    // ---- creatures --------------------------------------------------------

    pub fn player_id(&self) -> CreatureId {
        self.player
    }

    pub fn is_player(&self, id: CreatureId) -> bool {
        id == self.player
    }

    pub fn player(&self) -> Option<&Creature> {
        self.roster.get(self.player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Creature> {
        self.roster.get_mut(self.player)
    }

    pub fn player_pos(&self) -> Pos {
        self.player().map(|p| p.pos).unwrap_or(Pos::INVALID)
    }

    pub fn player_status(&self, kind: StatusKind) -> i32 {
        self.player().map(|p| p.status(kind)).unwrap_or(0)
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        let c = self.roster.get(id);
        if c.is_none() {
            stale_handle(id);
        }
        c
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        let c = self.roster.get_mut(id);
        if c.is_none() {
            stale_handle(id);
        }
        c
    }

    /// The creature standing at `p`, the player first
    pub fn monster_at(&self, p: Pos) -> Option<CreatureId> {
        self.roster.creature_at(p)
    }

    /// Add a monster to the head of the roster
    pub fn spawn_monster(&mut self, info: CreatureInfo, at: Pos) -> CreatureId {
        let id = self.roster.spawn(info, at);
        debug!(%id, %at, "monster spawned");
        id
    }

    // ---- visibility -------------------------------------------------------

    pub fn player_can_see(&self, p: Pos) -> bool {
        self.map.player_can_see(p)
    }

    /// Known to the player regardless of line of sight
    pub fn monster_revealed(&self, id: CreatureId) -> bool {
        if self.is_player(id) {
            return false;
        }
        let Some(c) = self.roster.get(id) else {
            return false;
        };
        c.has_bookkeeping(BookkeepingFlags::TELEPATHICALLY_REVEALED)
            || c.status(StatusKind::Entranced) > 0
            || (self.player_status(StatusKind::Telepathic) > 0 && !c.is_inanimate())
    }

    /// Whether `observer` (or nobody in particular) fails to notice `id`
    pub fn monster_is_hidden(&self, id: CreatureId, observer: Option<CreatureId>) -> bool {
        let Some(c) = self.roster.get(id) else {
            return true;
        };
        if c.has_bookkeeping(BookkeepingFlags::IS_DORMANT) {
            return true;
        }
        if let Some(o) = observer
            && crate::creature::relations::monsters_are_teammates(self, id, o)
        {
            return false;
        }
        if c.status(StatusKind::Invisible) > 0 {
            return true;
        }
        if c.is_submerged() {
            let observer_in_water = observer.and_then(|o| self.roster.get(o)).is_some_and(|o| {
                self.map.cell_has_terrain_flag(o.pos, TerrainFlags::IS_DEEP_WATER) && !o.is_levitating()
            });
            return !observer_in_water;
        }
        false
    }

    /// Full knowledge of where a creature is and what it is
    pub fn can_see_monster(&self, id: CreatureId) -> bool {
        if self.is_player(id) {
            return true;
        }
        let Some(c) = self.roster.get(id) else {
            return false;
        };
        !self.monster_is_hidden(id, Some(self.player))
            && (self.player_can_see(c.pos) || self.monster_revealed(id))
    }

    /// Line of sight only, ignoring telepathy
    pub fn can_directly_see_monster(&self, id: CreatureId) -> bool {
        if self.is_player(id) {
            return true;
        }
        let Some(c) = self.roster.get(id) else {
            return false;
        };
        self.player_can_see(c.pos) && !self.monster_is_hidden(id, Some(self.player))
    }

    // ---- equipment --------------------------------------------------------

    pub fn weapon(&self) -> Option<&Item> {
        self.pack.equipped(ItemCategory::Weapon)
    }

    pub fn weapon_mut(&mut self) -> Option<&mut Item> {
        self.pack.equipped_mut(ItemCategory::Weapon)
    }

    pub fn armor(&self) -> Option<&Item> {
        self.pack.equipped(ItemCategory::Armor)
    }

    pub fn armor_mut(&mut self) -> Option<&mut Item> {
        self.pack.equipped_mut(ItemCategory::Armor)
    }

    /// Strength after weakness
    pub fn effective_strength(&self) -> i32 {
        self.rogue.strength - self.player().map(|p| p.weakness_amount).unwrap_or(0)
    }

    /// Net enchantment of an item in the player's hands
    pub fn net_enchant(&self, item: &Item) -> Fixed {
        net_enchant(item, self.effective_strength())
    }

    pub fn allocate_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    /// Put an item in the pack, or hand it back when the pack is full
    ///
    /// An unidentified weapon that has never counted a kill starts its
    /// countdown from the configured number of kills.
    pub fn add_to_pack(&mut self, mut item: Item) -> Result<ItemId, Item> {
        self.next_item_id = self.next_item_id.max(item.id.0 + 1);
        if item.is_weapon()
            && !item.has_flag(ItemFlags::IDENTIFIED)
            && item.charges == crate::item::WEAPON_KILLS_TO_AUTO_ID
        {
            item.charges = self.config.weapon_kills_to_auto_id;
        }
        self.pack.add(item)
    }

    pub fn drop_item_at(&mut self, item: Item, at: Pos) {
        debug!(item = item.id.0, %at, "item dropped");
        self.floor.push(FloorItem { pos: at, item });
    }

    /// Equip an item from the pack, displacing anything of the same
    /// category. Returns false if the item is not in the pack or cannot be
    /// equipped.
    pub fn equip(&mut self, id: ItemId) -> bool {
        let Some(category) = self.pack.get(id).map(|i| i.category) else {
            return false;
        };
        match category {
            ItemCategory::Weapon | ItemCategory::Armor => {
                if let Some(current) = self.pack.equipped_mut(category) {
                    current.flags.remove(ItemFlags::EQUIPPED);
                }
            }
            ItemCategory::Ring => {
                if self.pack.equipped_all(ItemCategory::Ring).count() >= 2 {
                    return false;
                }
            }
            _ => return false,
        }
        if let Some(item) = self.pack.get_mut(id) {
            item.flags |= ItemFlags::EQUIPPED;
        }
        self.recalculate_equipment_bonuses();
        true
    }

    /// Derive player defense, damage and ring bonuses from what is worn.
    pub fn recalculate_equipment_bonuses(&mut self) {
        let defense = match self.armor() {
            Some(armor) => {
                let donning = self.player_status(StatusKind::Donning) as i64;
                let enchant = self.net_enchant(armor) - Fixed::from_int(donning);
                (Fixed::from_int(armor.armor as i64) + enchant * 10).trunc().max(0) as i32
            }
            None => 0,
        };
        let damage = self.weapon().map(|w| w.damage).unwrap_or(UNARMED_DAMAGE);

        let mut bonuses = PlayerState {
            strength: self.rogue.strength,
            light_multiplier: 1,
            ..PlayerState::default()
        };
        for ring in self.pack.equipped_all(ItemCategory::Ring) {
            let enchant = ring.enchant1;
            match RingKind::from_index(ring.kind) {
                Some(RingKind::Clairvoyance) => bonuses.clairvoyance += enchant,
                Some(RingKind::Stealth) => bonuses.stealth_bonus += enchant,
                Some(RingKind::Regeneration) => bonuses.regeneration_bonus += enchant,
                Some(RingKind::Transference) => bonuses.transference += enchant,
                Some(RingKind::Light) => bonuses.light_multiplier += enchant,
                Some(RingKind::Awareness) => bonuses.awareness_bonus += enchant,
                Some(RingKind::Wisdom) => bonuses.wisdom_bonus += enchant,
                Some(RingKind::Reaping) => bonuses.reaping += enchant,
                None => {}
            }
        }
        self.rogue = bonuses;

        if let Some(player) = self.player_mut() {
            player.info.defense = defense;
            player.info.damage = damage;
        }
    }

    // ---- outcomes ---------------------------------------------------------

    pub fn emit(&mut self, event: SimEvent) {
        tracing::trace!(?event, "sim event");
        self.events.push(event);
    }

    /// Hand the accumulated events to the caller, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn telemetry(&mut self, event: TelemetryEvent) {
        if let Some(sink) = self.telemetry.as_mut() {
            sink.record(event);
        }
    }

    pub fn message(&mut self, text: &str, flags: MessageFlags) {
        self.messages.message(text, flags);
    }

    pub fn combat_message(&mut self, text: &str, color: MessageColor) {
        self.messages.combat_message(text, color);
    }

    pub fn spawn_feature(&mut self, at: Pos, feature: DungeonFeature, probability_decrement: Option<i32>) {
        self.map.spawn_feature(at, feature, probability_decrement);
        self.emit(SimEvent::FeatureSpawned { at, feature });
    }

    /// End the game. Only the first cause of death is kept.
    pub fn game_over(&mut self, killed_by: &str) {
        if self.game_over.is_some() {
            return;
        }
        info!(killed_by, "player died");
        if let Some(player) = self.player_mut() {
            player.current_hp = player.current_hp.min(0);
            player.bookkeeping |= BookkeepingFlags::HAS_DIED;
        }
        self.game_over = Some(killed_by.to_string());
        self.messages.display_combat_text();
        self.emit(SimEvent::PlayerDied {
            killed_by: killed_by.to_string(),
        });
        self.telemetry(TelemetryEvent::PlayerDied {
            killed_by: killed_by.to_string(),
        });
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    /// Close out a player turn: flush combat text, report newly noticed
    /// monsters and sweep the dead off the active list.
    pub fn end_turn(&mut self) {
        self.messages.display_combat_text();
        self.messages.next_turn();
        self.heard_combat_this_turn = false;
        self.notice_monsters();
        self.roster.remove_dead_monsters();
    }

    fn notice_monsters(&mut self) {
        let fresh: Vec<CreatureId> = self
            .roster
            .monsters()
            .filter(|c| !c.has_bookkeeping(BookkeepingFlags::ALREADY_SEEN) && !c.is_dying())
            .map(|c| c.id)
            .collect();
        for id in fresh {
            if !self.can_see_monster(id) {
                continue;
            }
            let Some(c) = self.roster.get_mut(id) else {
                continue;
            };
            c.bookkeeping |= BookkeepingFlags::ALREADY_SEEN;
            let monster_name = c.info.name.clone();
            self.telemetry(TelemetryEvent::MonsterEncountered {
                monster_name,
                first_encounter: true,
            });
        }
    }

    /// Swap in the map of a new level. Only the player and allies that
    /// follow the player are kept.
    pub fn enter_level(&mut self, depth: i32, map: Box<dyn DungeonMap>, at: Pos) {
        self.messages.display_combat_text();
        let player = self.player;
        let left_behind: Vec<CreatureId> = self
            .roster
            .monsters()
            .filter(|c| !(c.is_ally() && c.leader == Some(player)))
            .map(|c| c.id)
            .collect();
        for id in left_behind {
            if let Err(e) = self.roster.remove(id) {
                warn!(%e, "could not clear monster from previous level");
            }
        }
        self.map = map;
        self.depth = depth;
        self.floor.clear();
        if let Some(p) = self.player_mut() {
            p.pos = at;
        }
        let followers: Vec<(CreatureId, TerrainFlags)> = self
            .roster
            .monsters()
            .map(|c| (c.id, c.info.avoided_terrain()))
            .collect();
        for (id, avoid) in followers {
            let spot = self.qualifying_loc_near(at, avoid, true).unwrap_or(Pos::INVALID);
            if let Some(c) = self.roster.get_mut(id) {
                c.pos = spot;
            }
        }
        info!(depth, "entered level");
        self.telemetry(TelemetryEvent::NewLevel { depth });
    }

    /// Bring back the most powerful ally from purgatory, fully healed, next
    /// to the player.
    pub fn resurrect_ally(&mut self) -> Option<CreatureId> {
        let id = self.roster.take_from_purgatory()?;
        let avoid = self.roster.get(id)?.info.avoided_terrain();
        let player_pos = self.player_pos();
        let spot = self.qualifying_loc_near(player_pos, avoid, false).unwrap_or(player_pos);
        let player = self.player;
        let c = self.roster.get_mut(id)?;
        c.pos = spot;
        c.bookkeeping.remove(
            BookkeepingFlags::IS_DYING
                | BookkeepingFlags::HAS_DIED
                | BookkeepingFlags::IS_FALLING
                | BookkeepingFlags::CAPTIVE
                | BookkeepingFlags::SEIZED
                | BookkeepingFlags::SEIZING,
        );
        c.bookkeeping |= BookkeepingFlags::FOLLOWER;
        c.state = CreatureState::Ally;
        c.leader = Some(player);
        c.status = c.info.innate_statuses();
        c.poison_amount = 0;
        c.weakness_amount = 0;
        c.movement_duration = c.info.movement_duration;
        c.attack_duration = c.info.attack_duration;
        c.ticks_until_turn = 101;
        c.heal_fully();
        info!(%id, name = %c.info.name, "ally resurrected");
        Some(id)
    }

    // ---- placement --------------------------------------------------------

    /// In the map, not obstructed or avoided, and unoccupied
    pub fn cell_is_free(&self, p: Pos, avoid: TerrainFlags) -> bool {
        self.map.in_bounds(p)
            && !self
                .map
                .cell_has_terrain_flag(p, avoid | TerrainFlags::OBSTRUCTS_PASSABILITY)
            && self.monster_at(p).is_none()
    }

    /// Nearest free cell by walking distance from `origin`.
    ///
    /// `origin` itself is returned when free. Otherwise the cells at the
    /// least walking distance are collected in column-major order and one
    /// is picked: the middle one when `deterministic`, a random one
    /// otherwise. The player's cell blocks the walk.
    pub fn qualifying_loc_near(&mut self, origin: Pos, avoid: TerrainFlags, deterministic: bool) -> Option<Pos> {
        if self.cell_is_free(origin, avoid) {
            return Some(origin);
        }
        let distance = self.walking_distances(origin, avoid & TerrainFlags::PATHING_BLOCKER);

        let best = distance
            .iter()
            .filter(|&(p, d)| *d > 0 && self.cell_is_free(*p, avoid))
            .map(|(_, d)| *d)
            .min();
        let candidates: Vec<Pos> = match best {
            Some(best) => self
                .column_major()
                .filter(|p| distance.get(p) == Some(&best) && self.cell_is_free(*p, avoid))
                .collect(),
            None => {
                // nothing reachable; fall back to the nearest free cell as the crow flies
                let nearest = self
                    .column_major()
                    .filter(|p| self.cell_is_free(*p, avoid))
                    .map(|p| crate::geom::distance_between(p, origin))
                    .min()?;
                self.column_major()
                    .filter(|p| {
                        self.cell_is_free(*p, avoid)
                            && crate::geom::distance_between(*p, origin) == nearest
                    })
                    .collect()
            }
        };
        if candidates.is_empty() {
            return None;
        }
        let index = if deterministic {
            candidates.len() / 2
        } else {
            self.rng.uniform_range(0, candidates.len() as i32 - 1) as usize
        };
        candidates.get(index).copied()
    }

    /// Walking distance from `origin` to every reachable cell.
    ///
    /// Steps are eight-way; walls, `blocking` terrain and the player's cell
    /// stop the walk. Unreachable cells are absent from the result.
    pub fn walking_distances(&self, origin: Pos, blocking: TerrainFlags) -> HashMap<Pos, i32> {
        let blocking = blocking | TerrainFlags::OBSTRUCTS_PASSABILITY;
        let player_pos = self.player_pos();
        let mut distance: HashMap<Pos, i32> = HashMap::new();
        let mut queue = VecDeque::from([origin]);
        distance.insert(origin, 0);
        while let Some(p) = queue.pop_front() {
            let d = distance.get(&p).copied().unwrap_or(0);
            for (dx, dy) in NB_DIRS {
                let n = p.offset(dx, dy);
                if !self.map.in_bounds(n)
                    || distance.contains_key(&n)
                    || n == player_pos
                    || self.map.cell_has_terrain_flag(n, blocking)
                {
                    continue;
                }
                distance.insert(n, d + 1);
                queue.push_back(n);
            }
        }
        distance
    }

    /// Every cell of the map, x outer and y inner
    pub fn column_major(&self) -> impl Iterator<Item = Pos> + use<> {
        let (w, h) = (self.map.width(), self.map.height());
        (0..w).flat_map(move |x| (0..h).map(move |y| Pos::new(x, y)))
    }
}

/// Report a creature handle that no longer resolves
pub(crate) fn stale_handle(id: CreatureId) {
    warn!(%id, "stale creature handle");
    debug_assert!(false, "stale creature handle {}", id);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::creature::test_support::player_info;
    use crate::map::GridMap;

    /// A 20x12 walled, fully visible room with the player at (5, 5)
    pub fn sim() -> Sim {
        sim_with_seed(12345)
    }

    pub fn sim_with_seed(seed: u64) -> Sim {
        let map = GridMap::walled(20, 12);
        Sim::new(SimConfig::default(), Box::new(map), seed, player_info(), Pos::new(5, 5))
            .expect("default config is valid")
    }

    pub fn grid(sim: &mut Sim) -> &mut GridMap {
        let any: &mut dyn core::any::Any = sim.map.as_mut();
        any.downcast_mut::<GridMap>().expect("test sims use a GridMap")
    }

    pub fn creature(sim: &Sim, id: CreatureId) -> &Creature {
        sim.roster.get(id).expect("creature exists")
    }

    pub fn creature_mut(sim: &mut Sim, id: CreatureId) -> &mut Creature {
        sim.roster.get_mut(id).expect("creature exists")
    }

    /// Give the player an item and equip it
    pub fn wield(sim: &mut Sim, item: Item) -> ItemId {
        let id = sim.add_to_pack(item).expect("pack has room");
        assert!(sim.equip(id));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::creature::test_support::goblin_info;
    use crate::item::{ArmorKind, WeaponKind};
    use crate::telemetry::VecSink;

    #[test]
    fn test_new_sim_places_player() {
        let sim = sim();
        assert_eq!(sim.player_pos(), Pos::new(5, 5));
        assert_eq!(sim.monster_at(Pos::new(5, 5)), Some(sim.player_id()));
        assert!(sim.can_see_monster(sim.player_id()));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SimConfig {
            map_width: 0,
            ..SimConfig::default()
        };
        let result = Sim::new(
            config,
            Box::new(crate::map::GridMap::new(3, 3)),
            1,
            crate::creature::test_support::player_info(),
            Pos::new(1, 1),
        );
        assert!(matches!(result, Err(crate::errors::SimError::Config(_))));
    }

    #[test]
    fn test_unknown_monster_name() {
        let sim = sim().with_catalog(vec![goblin_info()]);
        assert!(sim.monster_by_name("goblin").is_ok());
        assert_eq!(
            sim.monster_by_name("dragon").unwrap_err(),
            CatalogError::UnknownMonster("dragon".into())
        );
    }

    #[test]
    fn test_visibility_respects_map_and_invisibility() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        assert!(sim.can_see_monster(g));
        grid(&mut sim).set_visible(Pos::new(8, 5), false);
        assert!(!sim.can_see_monster(g));
        grid(&mut sim).set_visible(Pos::new(8, 5), true);
        creature_mut(&mut sim, g).status.set_both(StatusKind::Invisible, 10);
        assert!(!sim.can_directly_see_monster(g));
    }

    #[test]
    fn test_equipment_bonuses() {
        let mut sim = sim();
        let armor = Item::armor(ItemId(10), ArmorKind::ChainMail).with_enchant(1);
        wield(&mut sim, armor);
        // chain mail needs 13 strength, the player has 12: 1 - 2.5 = -1.5
        assert_eq!(sim.player().unwrap().info.defense, 50 - 15);
        let sword = Item::weapon(ItemId(11), WeaponKind::Sword);
        wield(&mut sim, sword);
        assert_eq!(sim.player().unwrap().info.damage, RandomRange::new(7, 9, 1));
        let ring = Item::ring(ItemId(12), RingKind::Reaping, 3);
        wield(&mut sim, ring);
        assert_eq!(sim.rogue.reaping, 3);
    }

    #[test]
    fn test_new_weapons_count_configured_kills() {
        let mut sim = sim();
        sim.config.weapon_kills_to_auto_id = 5;
        let id = sim.add_to_pack(Item::weapon(ItemId(1), WeaponKind::Sword)).unwrap();
        assert_eq!(sim.pack.get(id).unwrap().charges, 5);
    }

    #[test]
    fn test_drain_events_empties_the_log() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        crate::combat::inflict_damage(&mut sim, None, g, 3, false);
        let drained = sim.drain_events();
        assert_eq!(drained.len(), 1);
        assert!(sim.events.is_empty());
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_qualifying_loc_near_skips_occupied() {
        let mut sim = sim();
        let at = Pos::new(8, 5);
        sim.spawn_monster(goblin_info(), at);
        let spot = sim.qualifying_loc_near(at, TerrainFlags::empty(), true).unwrap();
        assert_ne!(spot, at);
        assert_eq!(crate::geom::distance_between(spot, at), 1);
        assert!(sim.cell_is_free(spot, TerrainFlags::empty()));
    }

    #[test]
    fn test_game_over_keeps_first_cause() {
        let mut sim = sim();
        sim.set_telemetry(Box::new(VecSink::default()));
        sim.game_over("killed by a goblin");
        sim.game_over("drowned");
        assert_eq!(sim.game_over.as_deref(), Some("killed by a goblin"));
        assert_eq!(
            sim.events
                .iter()
                .filter(|e| matches!(e, SimEvent::PlayerDied { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_resurrect_ally_heals_and_places() {
        let mut sim = sim();
        let player = sim.player_id();
        let ally = sim.spawn_monster(goblin_info(), Pos::new(9, 9));
        {
            let c = creature_mut(&mut sim, ally);
            c.state = CreatureState::Ally;
            c.leader = Some(player);
            c.current_hp = 0;
            c.bookkeeping |= BookkeepingFlags::HAS_SOUL | BookkeepingFlags::HAS_DIED | BookkeepingFlags::IS_DYING;
        }
        sim.end_turn();
        assert!(!sim.roster.is_active(ally));
        assert_eq!(sim.resurrect_ally(), Some(ally));
        let c = creature(&sim, ally);
        assert_eq!(c.current_hp, 15);
        assert!(!c.is_dying());
        assert_eq!(crate::geom::distance_between(c.pos, Pos::new(5, 5)), 1);
        assert_eq!(sim.resurrect_ally(), None);
    }
}
