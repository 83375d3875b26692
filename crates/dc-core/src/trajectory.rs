//! Line tracing and target selection
//!
//! Lines are traced with a fixed-point stepper so every platform produces
//! the same cells. The longer axis advances exactly one cell per step and
//! the shorter axis accumulates fractional error, stepping once the error
//! passes one half.

use crate::bolt::{Bolt, BoltEffect, BoltFlags};
use crate::consts::MAX_BOLT_LENGTH;
use crate::creature::relations::{monsters_are_enemies, monsters_are_teammates};
use crate::creature::CreatureId;
use crate::fixed::FP_FACTOR;
use crate::geom::{Pos, distance_between};
use crate::map::{DungeonMap, TerrainFlags};
use crate::sim::Sim;

/// Cells from just past `origin` toward `target`, continuing to the edge of
/// the map. The origin is never included, and a line from a cell to itself
/// is empty.
///
/// A line is at most [`MAX_BOLT_LENGTH`] cells, or the map's longer side on
/// maps bigger than that, so it always reaches the edge.
pub fn line_coordinates(map: &dyn DungeonMap, origin: Pos, target: Pos) -> Vec<Pos> {
    if origin == target {
        return Vec::new();
    }
    let limit = MAX_BOLT_LENGTH.max(map.width().max(map.height()).max(0) as usize);
    let delta = [(target.x - origin.x) as i64, (target.y - origin.y) as i64];
    let sign = delta.map(i64::signum);
    let magnitude = delta.map(|d| d.abs() * FP_FACTOR);
    let larger = magnitude[0].max(magnitude[1]);
    // one axis steps exactly one cell per iteration; the other in [0, 1]
    let step = magnitude.map(|m| m * FP_FACTOR / larger);

    let mut travelled = [0i64; 2];
    let mut error = [0i64; 2];
    let mut cells = Vec::new();
    loop {
        let mut axis = [0i64; 2];
        for i in 0..2 {
            travelled[i] += step[i] / FP_FACTOR;
            if step[i] != FP_FACTOR {
                error[i] += step[i] % FP_FACTOR;
            }
            if error[i] >= FP_FACTOR / 2 {
                travelled[i] += 1;
                error[i] -= FP_FACTOR;
            }
            axis[i] = sign[i] * travelled[i];
        }
        let cell = Pos::new(origin.x + axis[0] as i32, origin.y + axis[1] as i32);
        if !map.in_bounds(cell) || cells.len() >= limit {
            break;
        }
        cells.push(cell);
    }
    cells
}

/// Where a bolt fired from `origin` at `target` would stop, as far as the
/// creature at `origin` knows.
///
/// The walk stops at the first creature visible to the shooter (and not
/// submerged) or at vision- or movement-blocking terrain, within
/// `max_distance` cells. With `return_last_empty` the cell before the
/// obstacle is returned instead (the origin if the obstacle is adjacent).
pub fn impact_loc(sim: &Sim, origin: Pos, target: Pos, max_distance: usize, return_last_empty: bool) -> Pos {
    let coords = line_coordinates(sim.map.as_ref(), origin, target);
    let n = coords.len().min(max_distance);
    if n == 0 {
        return origin;
    }
    let shooter = sim.monster_at(origin);
    let mut i = 0;
    while i < n {
        let cell = coords[i];
        let blocks_creature = sim.monster_at(cell).is_some_and(|id| {
            !sim.monster_is_hidden(id, shooter) && sim.creature(id).is_some_and(|c| !c.is_submerged())
        });
        if blocks_creature
            || sim
                .map
                .cell_has_terrain_flag(cell, TerrainFlags::OBSTRUCTS_VISION | TerrainFlags::OBSTRUCTS_PASSABILITY)
        {
            break;
        }
        i += 1;
    }
    if i == n {
        coords[n - 1]
    } else if return_last_empty {
        if i == 0 { origin } else { coords[i - 1] }
    } else {
        coords[i]
    }
}

/// Whether nothing stands between two cells
pub fn open_path_between(sim: &Sim, from: Pos, to: Pos) -> bool {
    let steps = distance_between(from, to) as usize;
    impact_loc(sim, from, to, steps, false) == to
}

/// How many leading cells of `path` a targeting display should highlight.
///
/// Highlighting stops after the first visible creature (unless the bolt
/// passes through creatures) or blocking terrain, and before the first
/// cell the player cannot see. Tunneling bolts highlight through both
/// unseen cells and terrain.
pub fn highlight_trajectory(sim: &Sim, path: &[Pos], bolt: Option<&Bolt>) -> usize {
    let tunnels = bolt.is_some_and(|b| b.effect == BoltEffect::Tunneling);
    let passes = bolt.is_some_and(|b| b.has_flag(BoltFlags::PASSES_THRU_CREATURES));
    let player = sim.player_id();
    for (i, &cell) in path.iter().enumerate() {
        let seen = sim.player_can_see(cell);
        if !seen {
            if tunnels {
                continue;
            }
            return i;
        }
        if !passes
            && let Some(id) = sim.monster_at(cell)
            && id != player
            && !sim.monster_is_hidden(id, Some(player))
            && sim.creature(id).is_some_and(|c| !c.is_submerged())
        {
            return i + 1;
        }
        if !tunnels
            && sim
                .map
                .cell_has_terrain_flag(cell, TerrainFlags::OBSTRUCTS_VISION | TerrainFlags::OBSTRUCTS_PASSABILITY)
        {
            return i + 1;
        }
    }
    path.len()
}

/// Which creatures auto-targeting cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    Enemies,
    Allies,
    #[default]
    All,
}

impl TargetMode {
    /// The natural targets of a bolt
    pub fn for_bolt(bolt: &Bolt) -> Self {
        if bolt.has_flag(BoltFlags::TARGET_ALLIES) {
            TargetMode::Allies
        } else if bolt.has_flag(BoltFlags::TARGET_ENEMIES) {
            TargetMode::Enemies
        } else {
            TargetMode::All
        }
    }
}

/// The next creature after `current` (in roster order, wrapping, backwards
/// with `reverse`) that the player can see, has an open line to, and that
/// matches `mode`.
pub fn next_target_after(sim: &Sim, current: Option<Pos>, mode: TargetMode, reverse: bool) -> Option<Pos> {
    let player = sim.player_id();
    let origin = sim.player_pos();
    let mut candidates: Vec<CreatureId> = sim.roster.active_ids();
    if reverse {
        candidates.reverse();
    }
    let start = current
        .and_then(|p| sim.monster_at(p))
        .and_then(|id| candidates.iter().position(|&c| c == id))
        .map_or(0, |i| i + 1);

    let eligible = |id: CreatureId| {
        let Some(c) = sim.creature(id) else {
            return false;
        };
        let wanted = match mode {
            TargetMode::Enemies => monsters_are_enemies(sim, player, id) && !c.is_captive(),
            TargetMode::Allies => monsters_are_teammates(sim, player, id),
            TargetMode::All => true,
        };
        wanted
            && !c.is_dying()
            && !c.is_submerged()
            && sim.can_see_monster(id)
            && open_path_between(sim, origin, c.pos)
    };
    let n = candidates.len();
    (0..n)
        .map(|k| candidates[(start + k) % n])
        .find(|&id| eligible(id))
        .and_then(|id| sim.creature(id).map(|c| c.pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::test_support::goblin_info;
    use crate::map::GridMap;
    use crate::sim::test_support::*;

    #[test]
    fn test_horizontal_line_runs_to_edge() {
        let map = GridMap::new(10, 5);
        let line = line_coordinates(&map, Pos::new(2, 2), Pos::new(4, 2));
        let xs: Vec<i32> = line.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3, 4, 5, 6, 7, 8, 9]);
        assert!(line.iter().all(|p| p.y == 2));
    }

    #[test]
    fn test_line_crosses_a_map_wider_than_the_bolt_cap() {
        let map = GridMap::new(1000, 3);
        let line = line_coordinates(&map, Pos::new(0, 1), Pos::new(5, 1));
        assert_eq!(line.len(), 999);
        assert_eq!(line.last(), Some(&Pos::new(999, 1)));
    }

    #[test]
    fn test_diagonal_and_shallow_lines() {
        let map = GridMap::new(10, 10);
        let diag = line_coordinates(&map, Pos::new(0, 0), Pos::new(2, 2));
        assert_eq!(diag[..3], [Pos::new(1, 1), Pos::new(2, 2), Pos::new(3, 3)]);

        let shallow = line_coordinates(&map, Pos::new(0, 0), Pos::new(4, 2));
        assert_eq!(
            shallow[..4],
            [Pos::new(1, 1), Pos::new(2, 1), Pos::new(3, 2), Pos::new(4, 2)]
        );
    }

    #[test]
    fn test_line_to_self_is_empty() {
        let map = GridMap::new(10, 10);
        assert!(line_coordinates(&map, Pos::new(3, 3), Pos::new(3, 3)).is_empty());
    }

    #[test]
    fn test_line_goes_backwards_too() {
        let map = GridMap::new(10, 10);
        let line = line_coordinates(&map, Pos::new(5, 5), Pos::new(5, 3));
        assert_eq!(line, vec![Pos::new(5, 4), Pos::new(5, 3), Pos::new(5, 2), Pos::new(5, 1), Pos::new(5, 0)]);
    }

    #[test]
    fn test_impact_stops_at_creature_or_wall() {
        let mut sim = sim();
        let origin = sim.player_pos();
        let g = sim.spawn_monster(goblin_info(), Pos::new(9, 5));
        assert_eq!(impact_loc(&sim, origin, Pos::new(12, 5), 50, false), Pos::new(9, 5));
        assert_eq!(impact_loc(&sim, origin, Pos::new(12, 5), 50, true), Pos::new(8, 5));
        // range runs out first
        assert_eq!(impact_loc(&sim, origin, Pos::new(12, 5), 2, false), Pos::new(7, 5));

        sim.roster.remove(g).unwrap();
        assert_eq!(impact_loc(&sim, origin, Pos::new(12, 5), 50, false), Pos::new(19, 5));
        assert_eq!(impact_loc(&sim, origin, Pos::new(12, 5), 50, true), Pos::new(18, 5));
        assert!(open_path_between(&sim, origin, Pos::new(12, 5)));
    }

    #[test]
    fn test_highlight_stops_at_monster() {
        let mut sim = sim();
        sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let path = line_coordinates(sim.map.as_ref(), sim.player_pos(), Pos::new(8, 5));
        assert_eq!(highlight_trajectory(&sim, &path, None), 3);
        let lightning = crate::bolt::BoltKind::Lightning.bolt();
        // through the goblin up to the wall at x = 19
        assert_eq!(highlight_trajectory(&sim, &path, Some(&lightning)), 14);
    }

    #[test]
    fn test_target_cycling() {
        let mut sim = sim();
        let a = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let b = sim.spawn_monster(goblin_info(), Pos::new(5, 8));
        let pos_a = sim.creature(a).unwrap().pos;
        let pos_b = sim.creature(b).unwrap().pos;
        // b heads the roster
        let first = next_target_after(&sim, None, TargetMode::Enemies, false);
        assert_eq!(first, Some(pos_b));
        assert_eq!(next_target_after(&sim, first, TargetMode::Enemies, false), Some(pos_a));
        assert_eq!(next_target_after(&sim, Some(pos_a), TargetMode::Enemies, false), Some(pos_b));
        assert_eq!(next_target_after(&sim, None, TargetMode::Allies, false), None);
    }
}
