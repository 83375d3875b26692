//! Allegiance, leadership and the status effects other modules inflict
//!
//! Everything here takes the simulation context plus creature handles and
//! mutates in place. A handle that no longer resolves is reported and the
//! call does nothing.

use tracing::{debug, warn};

use super::{
    AbilityFlags, BehaviorFlags, BookkeepingFlags, Creature, CreatureId, CreatureMode, CreatureState,
    StatusKind,
};
use crate::bolt::{BoltFlags, bolt_catalog};
use crate::combat::kill_creature;
use crate::consts::{BURN_DURATION, DCOLS, MAX_WEAKNESS, PERMANENT_STATUS};
use crate::events::SimEvent;
use crate::geom::{Pos, distance_between};
use crate::map::TerrainFlags;
use crate::messages::{MessageColor, MessageFlags, color_for_victim, monster_name};
use crate::sim::{Sim, stale_handle};

// ---- allegiance queries ---------------------------------------------------

/// Whether two creatures fight on the same side: one follows the other,
/// both follow the same leader, or both belong to the player's team.
pub fn monsters_are_teammates(sim: &Sim, a: CreatureId, b: CreatureId) -> bool {
    let (Some(m1), Some(m2)) = (sim.roster.get(a), sim.roster.get(b)) else {
        return false;
    };
    let follows = |f: &Creature, l: CreatureId| f.has_bookkeeping(BookkeepingFlags::FOLLOWER) && f.leader == Some(l);
    follows(m1, b)
        || follows(m2, a)
        || (m1.is_ally() && sim.is_player(b))
        || (sim.is_player(a) && m2.is_ally())
        || (m1.is_ally() && m2.is_ally())
        || (m1.has_bookkeeping(BookkeepingFlags::FOLLOWER)
            && m2.has_bookkeeping(BookkeepingFlags::FOLLOWER)
            && m1.leader == m2.leader)
}

pub fn monsters_are_enemies(sim: &Sim, a: CreatureId, b: CreatureId) -> bool {
    let (Some(m1), Some(m2)) = (sim.roster.get(a), sim.roster.get(b)) else {
        return false;
    };
    if (m1.bookkeeping | m2.bookkeeping).contains(BookkeepingFlags::CAPTIVE) || a == b {
        return false;
    }
    if m1.status(StatusKind::Discordant) > 0 || m2.status(StatusKind::Discordant) > 0 {
        return true;
    }
    // liquid-bound hunters attack anything swimming in their water
    let hunts_in_water = |hunter: &Creature, prey: &Creature| {
        hunter.has_behavior(BehaviorFlags::RESTRICTED_TO_LIQUID)
            && !prey.has_behavior(BehaviorFlags::IMMUNE_TO_WATER)
            && !prey.is_levitating()
            && sim.map.cell_has_terrain_flag(prey.pos, TerrainFlags::IS_DEEP_WATER)
    };
    if hunts_in_water(m1, m2) || hunts_in_water(m2, m1) {
        return true;
    }
    (m1.is_ally() || sim.is_player(a)) != (m2.is_ally() || sim.is_player(b))
}

/// Whether `attacker` is willing to attack `defender`, considering discord,
/// entrancement, confusion and allegiance. Terrain is not considered.
pub fn monster_will_attack_target(sim: &Sim, attacker: CreatureId, defender: CreatureId) -> bool {
    let (Some(att), Some(def)) = (sim.roster.get(attacker), sim.roster.get(defender)) else {
        return false;
    };
    if attacker == defender || def.has_bookkeeping(BookkeepingFlags::IS_DYING) {
        return false;
    }
    if sim.is_player(attacker) && def.is_ally() {
        return def.status(StatusKind::Discordant) > 0;
    }
    if att.status(StatusKind::Entranced) > 0 && !def.is_ally() {
        return true;
    }
    if att.is_ally() && !sim.is_player(attacker) && def.status(StatusKind::Entranced) > 0 {
        return false;
    }
    if def.is_captive() {
        return false;
    }
    if att.status(StatusKind::Discordant) > 0
        || def.status(StatusKind::Discordant) > 0
        || att.status(StatusKind::Confused) > 0
    {
        return true;
    }
    monsters_are_enemies(sim, attacker, defender) && !monsters_are_teammates(sim, attacker, defender)
}

// ---- state changes --------------------------------------------------------

/// Put a monster on the player's trail, or to flight if it is a permanent
/// fleer.
pub fn alert_monster(sim: &mut Sim, id: CreatureId) {
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    m.state = if m.mode == CreatureMode::PermFleeing {
        CreatureState::Fleeing
    } else {
        CreatureState::TrackingScent
    };
}

/// Wake a monster and rouse its teammates.
pub fn wake_up(sim: &mut Sim, id: CreatureId) {
    let Some(m) = sim.roster.get(id) else {
        return stale_handle(id);
    };
    let is_ally = m.is_ally();
    if !is_ally {
        alert_monster(sim, id);
    }
    if let Some(m) = sim.roster.get_mut(id) {
        m.ticks_until_turn = 100;
    }
    let teammates: Vec<CreatureId> = sim
        .roster
        .active_ids()
        .into_iter()
        .filter(|&t| t != id && monsters_are_teammates(sim, id, t))
        .collect();
    for t in teammates {
        let Some(mate) = sim.roster.get_mut(t) else {
            continue;
        };
        if mate.mode != CreatureMode::Normal {
            continue;
        }
        if matches!(mate.state, CreatureState::Sleeping | CreatureState::Wandering) {
            mate.ticks_until_turn = mate.ticks_until_turn.max(100);
        }
        if !is_ally {
            mate.state = CreatureState::TrackingScent;
        }
    }
}

/// Break an ally's bond with the player.
pub fn un_ally(sim: &mut Sim, id: CreatureId) {
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    if m.is_ally() {
        m.state = CreatureState::TrackingScent;
        m.bookkeeping
            .remove(BookkeepingFlags::FOLLOWER | BookkeepingFlags::TELEPATHICALLY_REVEALED);
        m.leader = None;
        debug!(%id, "ally turned");
    }
}

fn befriend(player: CreatureId, m: &mut Creature) {
    m.state = CreatureState::Ally;
    m.bookkeeping |= BookkeepingFlags::FOLLOWER;
    m.leader = Some(player);
    m.bookkeeping
        .remove(BookkeepingFlags::CAPTIVE | BookkeepingFlags::SEIZED);
    if let Some(inner) = m.carried_monster.as_deref_mut() {
        befriend(player, inner);
    }
}

/// Make a monster follow the player. A carried item is dropped, and a
/// carried creature is befriended too.
pub fn become_ally_with(sim: &mut Sim, id: CreatureId) {
    if !sim.roster.contains(id) {
        return stale_handle(id);
    }
    demote_from_leadership(sim, id);
    let player = sim.player_id();
    let Some(m) = sim.roster.get_mut(id) else {
        return;
    };
    let dropped = m.carried_item.take().map(|item| (item, m.pos));
    befriend(player, m);
    if let Some((item, at)) = dropped {
        sim.drop_item_at(item, at);
    }
}

pub fn free_captive(sim: &mut Sim, id: CreatureId) {
    become_ally_with(sim, id);
    let name = monster_name(sim, id, false);
    sim.message(
        &format!("you free the grateful {} and gain a faithful ally.", name),
        MessageFlags::empty(),
    );
}

/// Strip leadership from `id` and hand its followers to a successor.
///
/// Followers bound to the leader are cut loose (they expire on their own).
/// The first unbound follower becomes the new leader of the rest.
pub fn demote_from_leadership(sim: &mut Sim, id: CreatureId) {
    if let Some(m) = sim.roster.get_mut(id) {
        m.bookkeeping.remove(BookkeepingFlags::LEADER);
    }
    let mut new_leader: Option<CreatureId> = None;
    let mut new_followers = false;
    for f in sim.roster.active_ids() {
        if f == id {
            continue;
        }
        let Some(follower) = sim.roster.get_mut(f) else {
            continue;
        };
        if follower.leader != Some(id) {
            continue;
        }
        if follower.has_bookkeeping(BookkeepingFlags::BOUND_TO_LEADER) {
            follower.leader = None;
            follower.bookkeeping.remove(BookkeepingFlags::FOLLOWER);
        } else if let Some(leader) = new_leader {
            follower.leader = Some(leader);
            new_followers = true;
        } else {
            follower.bookkeeping |= BookkeepingFlags::LEADER;
            follower.bookkeeping.remove(BookkeepingFlags::FOLLOWER);
            follower.leader = None;
            new_leader = Some(f);
        }
    }
    if let Some(leader) = new_leader
        && !new_followers
        && let Some(m) = sim.roster.get_mut(leader)
    {
        m.bookkeeping.remove(BookkeepingFlags::LEADER);
    }
}

/// Drop the leader flag if nobody follows `id` any more.
pub fn check_for_continued_leadership(sim: &mut Sim, id: CreatureId) {
    let keeps = sim.roster.get(id).is_some_and(|m| m.has_bookkeeping(BookkeepingFlags::LEADER))
        && sim
            .roster
            .monsters()
            .any(|f| f.id != id && f.leader == Some(id));
    if !keeps && let Some(m) = sim.roster.get_mut(id) {
        m.bookkeeping.remove(BookkeepingFlags::LEADER);
    }
}

// ---- cloning and transformation -------------------------------------------

/// Copy a creature into a new follower at the head of the roster.
///
/// The clone follows the original's leader, or the original itself, which
/// then becomes a leader. Cloning a captive yields an ally. With `place`
/// the clone is put on the nearest free cell; otherwise it has no position
/// until the caller gives it one.
pub fn clone_monster(sim: &mut Sim, id: CreatureId, announce: bool, place: bool) -> Option<CreatureId> {
    let Some(mut clone) = sim.roster.get(id).cloned() else {
        stale_handle(id);
        return None;
    };
    let source_leader = clone.leader;
    let source_is_ally = clone.is_ally();
    let source_is_captive = clone.is_captive();
    let source_pos = clone.pos;
    let clone_id = sim.roster.allocate_id();

    clone.id = clone_id;
    clone.carried_monster = None;
    clone.carried_item = None;
    clone
        .bookkeeping
        .remove(BookkeepingFlags::LEADER | BookkeepingFlags::CAPTIVE | BookkeepingFlags::HAS_SOUL);
    clone.bookkeeping |= BookkeepingFlags::FOLLOWER;
    clone.ticks_until_turn = 101;
    if !source_is_ally {
        clone.bookkeeping.remove(BookkeepingFlags::TELEPATHICALLY_REVEALED);
    }
    match source_leader {
        Some(leader) => clone.leader = Some(leader),
        None => {
            clone.leader = Some(id);
            if let Some(m) = sim.roster.get_mut(id) {
                m.bookkeeping |= BookkeepingFlags::LEADER;
            }
        }
    }
    if sim.is_player(id) {
        clone.info.damage = crate::sim::UNARMED_DAMAGE;
        clone.info.defense = 0;
        clone.info.name = "clone".to_string();
        clone.state = CreatureState::Ally;
    }
    clone.pos = Pos::INVALID;
    let avoid = clone.info.avoided_terrain();

    if let Err(e) = sim.roster.add(clone) {
        warn!(%e, "clone rejected by roster");
        return None;
    }
    if source_is_captive {
        become_ally_with(sim, clone_id);
    }

    if place {
        match sim.qualifying_loc_near(source_pos, avoid, false) {
            Some(spot) => {
                if let Some(c) = sim.roster.get_mut(clone_id) {
                    c.pos = spot;
                }
            }
            None => {
                warn!(%id, "no room for clone, burying it");
                kill_creature(sim, clone_id, true);
                return None;
            }
        }
        if announce && sim.can_see_monster(clone_id) {
            let name = monster_name(sim, clone_id, false);
            sim.message(&format!("another {} appears!", name), MessageFlags::empty());
        }
    }
    sim.emit(SimEvent::Clone {
        original: id,
        clone: clone_id,
    });
    Some(clone_id)
}

/// Permanently strengthen a monster and heal it completely.
pub fn empower_monster(sim: &mut Sim, id: CreatureId) {
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    m.info.max_hp += 12;
    m.info.defense += 10;
    m.info.accuracy += 10;
    m.info.damage.lower += (m.info.damage.lower / 10).max(1);
    m.info.damage.upper += (m.info.damage.upper / 10).max(1);
    m.new_power_count += 1;
    m.total_power_count += 1;
    heal(sim, id, 100, true);
    if sim.can_see_monster(id) {
        let name = monster_name(sim, id, true);
        sim.combat_message(&format!("{} looks stronger", name), MessageColor::Good);
    }
}

/// Whether negation would change anything about this creature
pub fn monster_is_negatable(sim: &Sim, id: CreatureId) -> bool {
    let Some(m) = sim.roster.get(id) else {
        return false;
    };
    if m.is_invulnerable() {
        return false;
    }
    if !(m.info.abilities - AbilityFlags::NON_NEGATABLE).is_empty()
        || m.has_bookkeeping(BookkeepingFlags::SEIZING)
        || m.has_behavior(BehaviorFlags::DIES_IF_NEGATED | BehaviorFlags::NEGATABLE_TRAITS)
        || m.status(StatusKind::ImmuneToFire) > 0
    {
        return true;
    }
    if m.has_behavior(BehaviorFlags::FIERY) && m.status(StatusKind::Burning) > 0 {
        return true;
    }
    if m.status.active().any(|(kind, _)| kind.negation_residue().is_some()) {
        return true;
    }
    if m.movement_duration != m.info.movement_duration || m.attack_duration != m.info.attack_duration {
        return true;
    }
    let catalog = bolt_catalog();
    m.info
        .bolts
        .iter()
        .any(|b| !catalog[*b as usize].flags.contains(BoltFlags::NOT_NEGATABLE))
}

/// Strip magical traits, abilities and statuses. Creatures that exist only
/// through magic die. Returns whether anything changed.
pub fn negate(sim: &mut Sim, id: CreatureId) -> bool {
    let Some(m) = sim.roster.get(id) else {
        stale_handle(id);
        return false;
    };
    if m.has_behavior(BehaviorFlags::DIES_IF_NEGATED) {
        if sim.can_see_monster(id) {
            let levitating = m.is_levitating();
            let name = monster_name(sim, id, true);
            let text = if levitating {
                format!("{} dissipates into thin air", name)
            } else {
                format!("{} falls to the ground, lifeless", name)
            };
            let color = color_for_victim(sim, id);
            sim.combat_message(&text, color);
        }
        kill_creature(sim, id, false);
        return true;
    }
    if m.is_invulnerable() {
        return false;
    }

    let is_player = sim.is_player(id);
    let keeps_bolt = {
        let catalog = bolt_catalog();
        move |b: &crate::bolt::BoltKind| catalog[*b as usize].flags.contains(BoltFlags::NOT_NEGATABLE)
    };
    let Some(m) = sim.roster.get_mut(id) else {
        return false;
    };
    let mut negated = false;

    let kept = m.info.abilities & AbilityFlags::NON_NEGATABLE;
    if kept != m.info.abilities {
        m.info.abilities = kept;
        negated = true;
    }
    if m.has_bookkeeping(BookkeepingFlags::SEIZING) {
        m.bookkeeping.remove(BookkeepingFlags::SEIZING);
        negated = true;
    }
    let was_fiery = m.has_behavior(BehaviorFlags::FIERY);
    if m.has_behavior(BehaviorFlags::NEGATABLE_TRAITS) {
        m.info.behaviors.remove(BehaviorFlags::NEGATABLE_TRAITS);
        negated = true;
    }
    let active: Vec<(StatusKind, i32)> = m.status.active().collect();
    for (kind, _) in active {
        if let Some(residue) = kind.negation_residue() {
            let value = if is_player { residue } else { 0 };
            m.status.set(kind, value);
            if !is_player {
                m.status.set_max(kind, 0);
            }
            negated = true;
        }
    }
    if !is_player {
        if m.movement_duration != m.info.movement_duration || m.attack_duration != m.info.attack_duration {
            negated = true;
        }
        m.movement_duration = m.info.movement_duration;
        m.attack_duration = m.info.attack_duration;
        let before = m.info.bolts.len();
        m.info.bolts.retain(keeps_bolt);
        negated |= m.info.bolts.len() != before;
    }
    if was_fiery && m.status(StatusKind::Burning) > 0 {
        m.status.clear(StatusKind::Burning);
        negated = true;
    }
    if is_player {
        sim.recalculate_equipment_bonuses();
    }
    debug!(%id, negated, "negation");
    negated
}

/// Turn a monster into a random different kind from the catalog, keeping
/// its proportion of health. The player, inanimate and invulnerable
/// creatures are unaffected.
pub fn polymorph(sim: &mut Sim, id: CreatureId) -> bool {
    let Some(m) = sim.roster.get(id) else {
        stale_handle(id);
        return false;
    };
    if sim.is_player(id) || m.has_behavior(BehaviorFlags::INANIMATE | BehaviorFlags::INVULNERABLE) {
        return false;
    }
    let old_kind = m.info.kind;
    let eligible = |k: usize, sim: &Sim| {
        sim.catalog.get(k).is_some_and(|info| {
            !info
                .behaviors
                .intersects(BehaviorFlags::INANIMATE | BehaviorFlags::NO_POLYMORPH)
                && info.kind != old_kind
        })
    };
    if !(1..sim.catalog.len()).any(|k| eligible(k, sim)) {
        debug!(%id, "no kind to polymorph into");
        return false;
    }
    let visible = sim.can_see_monster(id);
    let old_name = monster_name(sim, id, true);

    if let Some(m) = sim.roster.get_mut(id)
        && m.state == CreatureState::Fleeing
        && (m.has_behavior(BehaviorFlags::MAINTAINS_DISTANCE | BehaviorFlags::FLEES_NEAR_DEATH)
            || m.has_ability(AbilityFlags::HIT_STEAL_FLEE))
    {
        m.state = CreatureState::TrackingScent;
        m.mode = CreatureMode::Normal;
    }
    un_ally(sim, id);

    let last = sim.catalog.len() as i32 - 1;
    let new_index = loop {
        let k = sim.rng.uniform_range(1, last) as usize;
        if eligible(k, sim) {
            break k;
        }
    };
    let new_info = sim.catalog[new_index].clone();

    let was_captive = sim.roster.get(id).is_some_and(|m| m.is_captive());
    if was_captive {
        demote_from_leadership(sim, id);
    }
    let Some(m) = sim.roster.get_mut(id) else {
        return false;
    };
    m.carried_monster = None;
    let health_fraction = m.current_hp * 1000 / m.info.max_hp.max(1);
    let damage_taken = m.info.max_hp - m.current_hp;
    m.info = new_info;
    m.current_hp = (health_fraction * m.info.max_hp / 1000)
        .max(m.info.max_hp - damage_taken)
        .max(1);
    m.movement_duration = m.info.movement_duration;
    m.attack_duration = m.info.attack_duration;
    if was_captive {
        m.state = CreatureState::TrackingScent;
        m.bookkeeping.remove(BookkeepingFlags::CAPTIVE);
    }
    m.bookkeeping
        .remove(BookkeepingFlags::SEIZING | BookkeepingFlags::SEIZED);
    m.ticks_until_turn = m.ticks_until_turn.max(101);
    for (flag, status) in [
        (BehaviorFlags::FLIES, StatusKind::Levitating),
        (BehaviorFlags::INVISIBLE, StatusKind::Invisible),
    ] {
        if m.has_behavior(flag) {
            m.status.set_both(status, PERMANENT_STATUS);
        } else if m.status(status) == PERMANENT_STATUS {
            m.status.clear(status);
        }
    }
    if m.is_submerged() && !m.has_behavior(BehaviorFlags::SUBMERGES) {
        m.bookkeeping.remove(BookkeepingFlags::SUBMERGED);
    }
    let new_name = m.info.name.clone();
    debug!(%id, into = %new_name, "polymorphed");
    if visible {
        sim.message(
            &format!("{} turns into {}!", old_name, with_article(&new_name)),
            MessageFlags::empty(),
        );
    }
    true
}

fn with_article(name: &str) -> String {
    let article = if name.starts_with(['a', 'e', 'i', 'o', 'u']) { "an" } else { "a" };
    format!("{} {}", article, name)
}

// ---- movement -------------------------------------------------------------

/// Move a creature, surfacing it if the new cell does not allow submerging.
pub fn set_monster_location(sim: &mut Sim, id: CreatureId, to: Pos) {
    let allows_submerging = sim.map.cell_has_terrain_flag(to, TerrainFlags::ALLOWS_SUBMERGING);
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    m.pos = to;
    if m.is_submerged() && !allows_submerging {
        m.bookkeeping.remove(BookkeepingFlags::SUBMERGED);
    }
}

/// Teleport a creature to `destination`, or to a random distant free cell.
///
/// Random destinations prefer cells more than half a map width away on
/// foot, and for monsters cells the player cannot see. Terrain the
/// creature cannot (or, with `respect_preferences`, will not) enter is
/// never chosen. Returns false if no destination qualified.
pub fn teleport(sim: &mut Sim, id: CreatureId, destination: Option<Pos>, respect_preferences: bool) -> bool {
    let Some(m) = sim.roster.get(id) else {
        stale_handle(id);
        return false;
    };
    let from = m.pos;
    let forbidden = if respect_preferences {
        m.info.avoided_terrain()
    } else {
        m.info.forbidden_terrain()
    } | TerrainFlags::OBSTRUCTS_PASSABILITY;
    let liquid_only = m.has_behavior(BehaviorFlags::RESTRICTED_TO_LIQUID);
    let is_player = sim.is_player(id);

    let target = match destination {
        Some(p) => sim.qualifying_loc_near(p, forbidden, false),
        None => {
            let distance = sim.walking_distances(from, forbidden & TerrainFlags::PATHING_BLOCKER);
            let allowed = |sim: &Sim, p: Pos| {
                sim.cell_is_free(p, forbidden)
                    && (!liquid_only || sim.map.cell_has_terrain_flag(p, TerrainFlags::ALLOWS_SUBMERGING))
            };
            let far = |p: &Pos| distance.get(p).is_none_or(|&d| d > DCOLS / 2);
            let mut cells: Vec<Pos> = sim
                .column_major()
                .filter(|p| far(p) && allowed(sim, *p) && (is_player || !sim.player_can_see(*p)))
                .collect();
            if cells.is_empty() {
                cells = sim.column_major().filter(|p| allowed(sim, *p) && *p != from).collect();
            }
            if cells.is_empty() {
                None
            } else {
                let pick = sim.rng.uniform_range(1, cells.len() as i32) as usize;
                cells.get(pick - 1).copied()
            }
        }
    };
    let Some(to) = target else {
        debug!(%id, "teleport found no destination");
        return false;
    };
    if let Some(m) = sim.roster.get_mut(id) {
        m.status.clear(StatusKind::Stuck);
        m.bookkeeping
            .remove(BookkeepingFlags::SEIZED | BookkeepingFlags::SEIZING);
    }
    set_monster_location(sim, id, to);
    sim.emit(SimEvent::Teleport { creature: id, from, to });
    true
}

// ---- inflicted statuses ---------------------------------------------------

/// Restore `percent` of maximum health. A panacea also cures hallucination,
/// confusion, nausea, slowness, weakness, poison and darkness.
pub fn heal(sim: &mut Sim, id: CreatureId, percent: i32, panacea: bool) {
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    let before = m.current_hp;
    m.current_hp = m.info.max_hp.min(m.current_hp + percent * m.info.max_hp / 100);
    let gained = m.current_hp - before;
    let mut weakness_cured = false;
    if panacea {
        for kind in [
            StatusKind::Hallucinating,
            StatusKind::Confused,
            StatusKind::Nauseous,
            StatusKind::Slowed,
        ] {
            if m.status(kind) > 1 {
                m.status.set(kind, 1);
            }
        }
        if m.status(StatusKind::Weakened) > 1 {
            m.weakness_amount = 0;
            m.status.clear(StatusKind::Weakened);
            weakness_cured = true;
        }
        if m.status(StatusKind::Poisoned) > 0 {
            m.poison_amount = 0;
            m.status.clear(StatusKind::Poisoned);
        }
        if m.status(StatusKind::Darkened) > 0 {
            m.status.clear(StatusKind::Darkened);
        }
    }
    if weakness_cured && sim.is_player(id) {
        sim.recalculate_equipment_bonuses();
    }
    if gained > 0 {
        sim.emit(SimEvent::Heal { creature: id, amount: gained });
    }
}

/// Halve a creature's speed for `turns`, cancelling haste.
pub fn slow(sim: &mut Sim, id: CreatureId, turns: i32) {
    let is_player = sim.is_player(id);
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    if m.has_behavior(BehaviorFlags::INANIMATE | BehaviorFlags::INVULNERABLE) {
        return;
    }
    m.status.set_both(StatusKind::Slowed, turns);
    m.status.set(StatusKind::Hasted, 0);
    m.movement_duration = m.info.movement_duration * 2;
    m.attack_duration = m.info.attack_duration * 2;
    sim.emit(SimEvent::StatusChange {
        creature: id,
        status: StatusKind::Slowed,
        value: turns,
    });
    if is_player {
        sim.message("you feel yourself slow down.", MessageFlags::empty());
    }
}

/// Double a creature's speed for `turns`, cancelling slowness.
pub fn haste(sim: &mut Sim, id: CreatureId, turns: i32) {
    let is_player = sim.is_player(id);
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    if m.has_behavior(BehaviorFlags::INANIMATE | BehaviorFlags::INVULNERABLE) {
        return;
    }
    m.status.set(StatusKind::Slowed, 0);
    m.status.set_both(StatusKind::Hasted, turns);
    m.movement_duration = m.info.movement_duration / 2;
    m.attack_duration = m.info.attack_duration / 2;
    sim.emit(SimEvent::StatusChange {
        creature: id,
        status: StatusKind::Hasted,
        value: turns,
    });
    if is_player {
        sim.message("you feel yourself speed up.", MessageFlags::empty());
    }
}

/// One more point of weakness (up to the cap), lasting at least
/// `max_duration`.
pub fn weaken(sim: &mut Sim, id: CreatureId, max_duration: i32) {
    let Some(m) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    if m.weakness_amount < MAX_WEAKNESS {
        m.weakness_amount += 1;
    }
    let value = m.status(StatusKind::Weakened).max(max_duration);
    m.status.set(StatusKind::Weakened, value);
    m.status
        .set_max(StatusKind::Weakened, m.status.max(StatusKind::Weakened).max(max_duration));
    sim.emit(SimEvent::StatusChange {
        creature: id,
        status: StatusKind::Weakened,
        value,
    });
    if sim.is_player(id) {
        sim.messages.message_colored(
            "your muscles weaken as an enervating toxin fills your veins.",
            MessageColor::Bad,
            MessageFlags::empty(),
        );
        sim.recalculate_equipment_bonuses();
    }
}

/// Add poison: `duration` more turns at `concentration` more damage per turn.
pub fn add_poison(sim: &mut Sim, id: CreatureId, duration: i32, concentration: i32) {
    if duration <= 0 {
        return;
    }
    let is_player = sim.is_player(id);
    let Some(m) = sim.roster.get(id) else {
        return stale_handle(id);
    };
    if is_player && m.status(StatusKind::Poisoned) == 0 {
        sim.combat_message("scalding poison fills your veins", MessageColor::Bad);
    }
    let Some(m) = sim.roster.get_mut(id) else {
        return;
    };
    if m.status(StatusKind::Poisoned) == 0 {
        m.status.set_max(StatusKind::Poisoned, 0);
    }
    m.poison_amount += concentration;
    if m.poison_amount == 0 {
        m.poison_amount = 1;
    }
    m.status.add(StatusKind::Poisoned, duration);
    m.status.set_max(StatusKind::Poisoned, m.info.max_hp / m.poison_amount);
    let value = m.status(StatusKind::Poisoned);
    sim.emit(SimEvent::StatusChange {
        creature: id,
        status: StatusKind::Poisoned,
        value,
    });
}

/// Set a creature alight unless it is immune, submerged or standing in
/// deep water.
pub fn expose_creature_to_fire(sim: &mut Sim, id: CreatureId) {
    let Some(m) = sim.roster.get(id) else {
        return stale_handle(id);
    };
    let doused = !m.is_levitating() && sim.map.cell_has_terrain_flag(m.pos, TerrainFlags::IS_DEEP_WATER);
    if m.has_bookkeeping(BookkeepingFlags::IS_DYING)
        || m.is_immune_to_fire()
        || m.is_invulnerable()
        || m.is_submerged()
        || doused
    {
        return;
    }
    if m.status(StatusKind::Burning) == 0 {
        if sim.is_player(id) {
            sim.combat_message("you catch fire", MessageColor::Bad);
        } else if sim.can_directly_see_monster(id) {
            let name = monster_name(sim, id, true);
            let color = color_for_victim(sim, id);
            sim.combat_message(&format!("{} catches fire", name), color);
        }
    }
    let Some(m) = sim.roster.get_mut(id) else {
        return;
    };
    let value = m.status(StatusKind::Burning).max(BURN_DURATION);
    m.status.set_both(StatusKind::Burning, value);
    sim.emit(SimEvent::StatusChange {
        creature: id,
        status: StatusKind::Burning,
        value,
    });
}

/// Chebyshev distance between two creatures, or `None` for a stale handle
pub fn distance_between_creatures(sim: &Sim, a: CreatureId, b: CreatureId) -> Option<i32> {
    Some(distance_between(sim.roster.get(a)?.pos, sim.roster.get(b)?.pos))
}
