//! Splitting monsters (jellies)

use hashbrown::HashSet;
use tracing::debug;

use crate::consts::PERMANENT_STATUS;
use crate::creature::relations::{clone_monster, monsters_are_teammates};
use crate::creature::{AbilityFlags, BehaviorFlags, CreatureId, StatusKind};
use crate::events::SimEvent;
use crate::geom::{Pos, distance_between};
use crate::messages::{MessageFlags, monster_name};
use crate::sim::Sim;

const CARDINALS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A creature that clones itself when struck splits its remaining health
/// with a copy placed next to its group.
///
/// The group is the monster plus every teammate reachable through
/// orthogonally adjacent cells; an adjacent attacker's cell counts as part
/// of it. The copy lands on a random free cell orthogonally next to the
/// group. Nothing happens when there is no such cell or when the monster
/// already has the configured number of same-kind teammates.
pub fn split_monster(sim: &mut Sim, id: CreatureId, attacker: CreatureId) {
    let Some(m) = sim.roster.get(id) else {
        return;
    };
    if !m.has_ability(AbilityFlags::CLONE_SELF_ON_DEFEND) || m.current_hp <= 0 || m.is_dying() {
        return;
    }
    let kind = m.info.kind;
    let origin = m.pos;
    let avoid = m.info.avoided_terrain();

    let others = allied_clone_count(sim, id, kind);
    if others >= sim.config.max_allied_clones {
        debug!(%id, others, "too many clones to split");
        return;
    }

    let mut group: HashSet<Pos> = HashSet::new();
    if let Some(a) = sim.roster.get(attacker)
        && distance_between(a.pos, origin) <= 1
    {
        group.insert(a.pos);
    }
    let mut frontier = vec![origin];
    group.insert(origin);
    while let Some(p) = frontier.pop() {
        for (dx, dy) in CARDINALS {
            let n = p.offset(dx, dy);
            if !sim.map.in_bounds(n) || group.contains(&n) {
                continue;
            }
            if sim.monster_at(n).is_some_and(|other| monsters_are_teammates(sim, id, other)) {
                group.insert(n);
                frontier.push(n);
            }
        }
    }

    let eligible: HashSet<Pos> = group
        .iter()
        .flat_map(|p| CARDINALS.map(|(dx, dy)| p.offset(dx, dy)))
        .filter(|n| !group.contains(n) && sim.cell_is_free(*n, avoid))
        .collect();
    if eligible.is_empty() {
        return;
    }
    let pick = sim.rng.uniform_range(1, eligible.len() as i32) as usize;
    let Some(spot) = sim.column_major().filter(|p| eligible.contains(p)).nth(pick - 1) else {
        return;
    };

    let name = monster_name(sim, id, true);
    if let Some(m) = sim.roster.get_mut(id) {
        m.current_hp = (m.current_hp + 1) / 2;
    }
    let Some(clone) = clone_monster(sim, id, false, false) else {
        return;
    };
    let base = sim.catalog.iter().find(|info| info.kind == kind).cloned();
    if let Some(c) = sim.roster.get_mut(clone) {
        // acquired traits are not inherited
        if let Some(base) = base {
            c.info.behaviors &= base.behaviors;
            c.info.abilities &= base.abilities;
            c.info.bolts = base.bolts;
        }
        if !c.has_behavior(BehaviorFlags::FLIES) && c.status(StatusKind::Levitating) == PERMANENT_STATUS {
            c.status.clear(StatusKind::Levitating);
        }
        c.pos = spot;
        c.ticks_until_turn = c.ticks_until_turn.max(101);
    }
    debug!(%id, %clone, at = %spot, "split");
    if sim.can_directly_see_monster(id) {
        sim.message(&format!("{} splits in two!", name), MessageFlags::empty());
    }
    sim.emit(SimEvent::Split { original: id, clone });
}

/// Living teammates of the same kind, not counting `id` itself
fn allied_clone_count(sim: &Sim, id: CreatureId, kind: u16) -> usize {
    sim.roster
        .monsters()
        .filter(|c| c.id != id && c.info.kind == kind && !c.is_dying())
        .filter(|c| monsters_are_teammates(sim, c.id, id))
        .count()
}
