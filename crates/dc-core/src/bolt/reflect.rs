//! Bolt reflection

use tracing::trace;

use crate::consts::MAX_BOLT_LENGTH;
use crate::creature::relations::monsters_are_enemies;
use crate::creature::{AbilityFlags, BehaviorFlags, CreatureId};
use crate::fixed::Fixed;
use crate::geom::{PERIMETER_CELLS, Pos, perimeter_coords};
use crate::item::power::reflection_chance;
use crate::item::{ArmorRunic, ItemFlags};
use crate::map::TerrainFlags;
use crate::sim::Sim;
use crate::trajectory::line_coordinates;

/// Whether a projectile from `attacker` bounces off `defender`.
///
/// `defender` is `None` when asking about terrain, which never reflects on
/// its own account here. Armor of immunity always turns back projectiles
/// from a hostile member of its quarry; armor of reflection and reflective monsters roll.
pub fn projectile_reflects(sim: &mut Sim, attacker: Option<CreatureId>, defender: Option<CreatureId>) -> bool {
    let Some(defender) = defender else {
        return false;
    };
    let mut level = Fixed::ZERO;
    if sim.is_player(defender)
        && let Some(armor) = sim.armor()
        && armor.has_flag(ItemFlags::RUNIC)
    {
        match armor.armor_runic() {
            Some(ArmorRunic::Immunity)
                if attacker.is_some_and(|a| {
                    monsters_are_enemies(sim, defender, a)
                        && sim.roster.get(a).is_some_and(|a| armor.grants_immunity_to(a.info.classes))
                }) =>
            {
                return true;
            }
            Some(ArmorRunic::Reflection) => level = sim.net_enchant(armor),
            _ => {}
        }
    }
    let Some(def) = sim.roster.get(defender) else {
        return false;
    };
    if def.has_ability(AbilityFlags::REFLECT_100) {
        return true;
    }
    if def.has_behavior(BehaviorFlags::REFLECT_50) {
        level = level + Fixed::from_int(4);
    }
    if level <= Fixed::ZERO {
        return false;
    }
    let chance = reflection_chance(level);
    sim.rng.percent(chance)
}

/// Replace everything after `path[kink]` with a new leg.
///
/// With `retrace` the bolt first runs back along its own path to the start
/// and then continues past `target` (the caster's cell) by the same
/// vector it came in on. Otherwise it heads for `target`, or when there is
/// no target (or the target is the kink itself) for a random cell on the
/// perimeter around the kink, retrying until the first cell of the new leg
/// is open. Returns the new path length.
pub fn reflect_bolt(sim: &mut Sim, target: Option<Pos>, path: &mut Vec<Pos>, kink: usize, retrace: bool) -> usize {
    let Some(&kink_cell) = path.get(kink) else {
        return path.len();
    };
    path.truncate(kink + 1);
    let target = target.filter(|&t| t != kink_cell);

    match (retrace, target) {
        (true, Some(target)) => {
            for k in 1..=kink {
                path.push(path[kink - k]);
            }
            let restart = path[0];
            let beyond = Pos::new(2 * target.x - kink_cell.x, 2 * target.y - kink_cell.y);
            path.extend(line_coordinates(sim.map.as_ref(), restart, beyond));
        }
        (_, Some(target)) => {
            path.extend(line_coordinates(sim.map.as_ref(), kink_cell, target));
        }
        (_, None) => {
            let mut leg = Vec::new();
            for _ in 0..sim.config.reflection_tries {
                let offset = perimeter_coords(sim.rng.uniform_range(0, PERIMETER_CELLS - 1));
                let aim = kink_cell.offset(offset.x, offset.y);
                leg = line_coordinates(sim.map.as_ref(), kink_cell, aim);
                if leg
                    .first()
                    .is_some_and(|&p| !sim.map.cell_has_terrain_flag(p, TerrainFlags::OBSTRUCTS_BOLTS))
                {
                    break;
                }
            }
            path.extend(leg);
        }
    }
    path.truncate(MAX_BOLT_LENGTH);
    trace!(kink = %kink_cell, len = path.len(), retrace, "bolt reflected");
    path.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureState;
    use crate::creature::test_support::goblin_info;
    use crate::item::{ArmorKind, Item, ItemId};
    use crate::sim::test_support::*;

    #[test]
    fn test_terrain_and_plain_creatures_do_not_reflect() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let before = sim.rng.numbers_generated();
        assert!(!projectile_reflects(&mut sim, None, None));
        assert!(!projectile_reflects(&mut sim, None, Some(g)));
        assert_eq!(sim.rng.numbers_generated(), before);
    }

    #[test]
    fn test_perfect_reflector_always_reflects() {
        let mut sim = sim();
        let mirror = sim.spawn_monster(goblin_info().with_abilities(AbilityFlags::REFLECT_100), Pos::new(8, 5));
        assert!((0..20).all(|_| projectile_reflects(&mut sim, None, Some(mirror))));
    }

    #[test]
    fn test_immunity_armor_turns_back_its_quarry() {
        let mut sim = sim();
        let player = sim.player_id();
        let armor = Item::armor(ItemId(1), ArmorKind::LeatherArmor)
            .with_armor_runic(ArmorRunic::Immunity, Some(crate::creature::MonsterClass::Goblin));
        wield(&mut sim, armor);
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        assert!(projectile_reflects(&mut sim, Some(g), Some(player)));
        assert!(!projectile_reflects(&mut sim, None, Some(player)));
    }

    #[test]
    fn test_immunity_spares_friendly_quarry() {
        let mut sim = sim();
        let player = sim.player_id();
        let armor = Item::armor(ItemId(1), ArmorKind::LeatherArmor)
            .with_armor_runic(ArmorRunic::Immunity, Some(crate::creature::MonsterClass::Goblin));
        wield(&mut sim, armor);
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        creature_mut(&mut sim, g).state = CreatureState::Ally;
        // no reflection roll at all, let alone a certain one
        let before = sim.rng.numbers_generated();
        assert!(!projectile_reflects(&mut sim, Some(g), Some(player)));
        assert_eq!(sim.rng.numbers_generated(), before);
    }

    #[test]
    fn test_retrace_runs_back_through_the_caster() {
        let mut sim = sim();
        let caster = Pos::new(2, 5);
        let mut path = line_coordinates(sim.map.as_ref(), caster, Pos::new(10, 5));
        let len = reflect_bolt(&mut sim, Some(caster), &mut path, 3, true);
        assert_eq!(len, path.len());
        // out along 3..=6, back along 5..=3, then through the caster to the wall
        assert_eq!(&path[..7], &[
            Pos::new(3, 5),
            Pos::new(4, 5),
            Pos::new(5, 5),
            Pos::new(6, 5),
            Pos::new(5, 5),
            Pos::new(4, 5),
            Pos::new(3, 5),
        ]);
        assert_eq!(path[7], Pos::new(2, 5));
        assert_eq!(*path.last().unwrap(), Pos::new(0, 5));
    }

    #[test]
    fn test_random_reflection_leaves_the_kink() {
        let mut sim = sim();
        let mut path = line_coordinates(sim.map.as_ref(), Pos::new(5, 5), Pos::new(10, 5));
        reflect_bolt(&mut sim, None, &mut path, 2, false);
        assert_eq!(path[2], Pos::new(8, 5));
        assert!(path.len() > 3);
        assert!(!sim.map.cell_has_terrain_flag(path[3], TerrainFlags::OBSTRUCTS_BOLTS));
        assert_eq!(crate::geom::distance_between(path[2], path[3]), 1);
    }
}
