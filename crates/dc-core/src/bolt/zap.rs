//! Firing a bolt

use tracing::{debug, trace};

use super::catalog::{Bolt, BoltEffect, BoltFlags};
use super::effects::{bolt_target_at, update_bolt};
use super::reflect::{projectile_reflects, reflect_bolt};
use crate::combat::{auto_identify, kill_creature, spectral_info, summon_spectral};
use crate::consts::{DCOLS, DROWS, FORCEFIELD_BASE_DECREMENT, MAX_BOLT_LENGTH};
use crate::creature::relations::set_monster_location;
use crate::creature::{BookkeepingFlags, CreatureId};
use crate::events::SimEvent;
use crate::fixed::Fixed;
use crate::geom::Pos;
use crate::item::power::staff_blade_count;
use crate::item::{ArmorRunic, ItemFlags};
use crate::map::{DungeonFeature, TerrainFlags};
use crate::messages::{MessageColor, monster_name};
use crate::sim::Sim;
use crate::trajectory::line_coordinates;

/// Reflections are refused this close to the path length limit.
const REFLECTION_HEADROOM: usize = MAX_BOLT_LENGTH - (if DCOLS > DROWS { DCOLS } else { DROWS }) as usize;

/// State of one bolt in flight
#[derive(Debug, Clone)]
pub struct ZapContext {
    /// The bolt as it is now; tunneling and blinking wear the magnitude down
    pub bolt: Bolt,
    /// Whoever stood at the origin when the bolt was fired
    pub caster: Option<CreatureId>,
    pub already_reflected: bool,
    /// Set once the player has seen enough to know what the bolt was
    pub auto_id: bool,
}

/// Fire `bolt` from `origin` toward `target`.
///
/// The bolt walks its line cell by cell: creatures may deflect it, each
/// cell is resolved by [`update_bolt`], and walls stop it unless it tunnels
/// or bounces. Where it stops it detonates: a blinking caster lands there,
/// obstruction raises a forcefield, conjuration calls up blades, and any
/// target feature spawns. Returns whether the player learned what the bolt
/// was. A bolt aimed at its own origin does nothing.
pub fn zap(sim: &mut Sim, origin: Pos, target: Pos, bolt: &Bolt) -> bool {
    if origin == target {
        return false;
    }
    let mut path = line_coordinates(sim.map.as_ref(), origin, target);
    let Some(&first) = path.first() else {
        return false;
    };
    let mut ctx = ZapContext {
        bolt: *bolt,
        caster: sim.monster_at(origin),
        already_reflected: false,
        auto_id: false,
    };
    debug!(bolt = %bolt.kind, %origin, %target, magnitude = bolt.magnitude, "zap");

    let mut blink_distance = 0;
    if bolt.effect == BoltEffect::Blinking {
        let blocked = sim.map.cell_has_terrain_flag(first, TerrainFlags::OBSTRUCTS_BOLTS)
            || (bolt.has_flag(BoltFlags::HALTS_BEFORE_OBSTRUCTION) && bolt_target_at(sim, &ctx, first).is_some());
        if blocked {
            // point blank into a wall
            return false;
        }
        blink_distance = bolt.magnitude * 2 + 1;
    }

    let mut last = origin;
    let mut previous = None;
    let mut i = 0;
    while i < path.len() {
        let cell = path[i];
        previous = i.checked_sub(1).map(|j| path[j]);
        last = cell;

        if let Some(reflector) = bolt_target_at(sim, &ctx, cell)
            && !ctx.bolt.has_flag(BoltFlags::NEVER_REFLECTS)
            && i < REFLECTION_HEADROOM
            && projectile_reflects(sim, ctx.caster, Some(reflector))
        {
            // a second success sends it straight back at the caster
            if projectile_reflects(sim, ctx.caster, Some(reflector)) {
                let retrace = !ctx.already_reflected;
                reflect_bolt(sim, Some(origin), &mut path, i, retrace);
            } else {
                reflect_bolt(sim, None, &mut path, i, false);
            }
            ctx.already_reflected = true;
            announce_deflection(sim, &ctx, reflector, cell);
            i += 1;
            continue;
        }

        if update_bolt(sim, &mut ctx, cell) {
            break;
        }
        if sim.is_game_over() {
            return ctx.auto_id;
        }

        if ctx.bolt.effect == BoltEffect::Blinking {
            ctx.bolt.magnitude = (blink_distance - i as i32) / 2 + 1;
            if i as i32 + 1 >= blink_distance {
                break;
            }
        }

        if ctx.bolt.has_flag(BoltFlags::HALTS_BEFORE_OBSTRUCTION)
            && let Some(&next) = path.get(i + 1)
        {
            if sim.map.cell_has_terrain_flag(next, TerrainFlags::OBSTRUCTS_BOLTS) {
                break;
            }
            if !ctx.bolt.has_flag(BoltFlags::PASSES_THRU_CREATURES) && bolt_target_at(sim, &ctx, next).is_some() {
                break;
            }
        }

        if ctx.bolt.effect == BoltEffect::Tunneling && sim.map.tunnelize(cell) {
            ctx.auto_id = true;
            ctx.bolt.magnitude -= 1;
            trace!(at = %cell, left = ctx.bolt.magnitude, "tunneled");
            if ctx.bolt.magnitude <= 0 {
                return ctx.auto_id;
            }
        }

        if sim.map.cell_has_terrain_flag(cell, TerrainFlags::OBSTRUCTS_BOLTS) {
            break;
        }

        if !ctx.bolt.has_flag(BoltFlags::NEVER_REFLECTS)
            && i < REFLECTION_HEADROOM
            && let Some(&next) = path.get(i + 1)
            && sim.map.cell_has_terrain_flag(next, TerrainFlags::OBSTRUCTS_BOLTS)
            && (projectile_reflects(sim, ctx.caster, None)
                || sim.map.cell_has_terrain_flag(next, TerrainFlags::REFLECTS_BOLTS)
                || (ctx.bolt.effect == BoltEffect::Tunneling
                    && sim.map.cell_has_terrain_flag(next, TerrainFlags::IMPREGNABLE)))
        {
            if sim.player_can_see(cell) {
                let surface = sim.map.describe(next);
                sim.combat_message(&format!("the bolt reflects off of {}", surface), MessageColor::Plain);
            }
            sim.emit(SimEvent::Reflection { at: next, by: None });
            reflect_bolt(sim, None, &mut path, i, false);
        }
        i += 1;
    }

    detonate(sim, &mut ctx, origin, last, previous);
    ctx.auto_id
}

fn announce_deflection(sim: &mut Sim, ctx: &ZapContext, reflector: CreatureId, cell: Pos) {
    sim.emit(SimEvent::Reflection {
        at: cell,
        by: Some(reflector),
    });
    if sim.player_can_see(cell) {
        let name = monster_name(sim, reflector, true);
        let verb = if sim.is_player(reflector) { "deflect" } else { "deflects" };
        let what = if ctx.bolt.effect == BoltEffect::Damage { ctx.bolt.name } else { "bolt" };
        sim.combat_message(&format!("{} {} the {}", name, verb, what), MessageColor::Plain);
    }
    if sim.is_player(reflector)
        && let Some(armor) = sim.armor()
        && armor.armor_runic() == Some(ArmorRunic::Reflection)
        && !armor.has_flag(ItemFlags::RUNIC_IDENTIFIED)
    {
        let id = armor.id;
        auto_identify(sim, id);
    }
}

/// What happens where the bolt comes to rest. `previous` is the cell the
/// bolt passed just before `at`, used to widen diagonal tunnels.
fn detonate(sim: &mut Sim, ctx: &mut ZapContext, origin: Pos, at: Pos, previous: Option<Pos>) {
    match ctx.bolt.effect {
        BoltEffect::Blinking => {
            if let Some(blinker) = ctx.caster {
                land_blinker(sim, blinker, origin, at);
                ctx.auto_id = true;
            }
        }
        BoltEffect::Conjuration => {
            let count = staff_blade_count(Fixed::from_int(ctx.bolt.magnitude as i64));
            let allied = ctx
                .caster
                .is_some_and(|c| sim.is_player(c) || sim.roster.get(c).is_some_and(|m| m.is_ally()));
            let lifespan = sim.config.blade_lifespan;
            for _ in 0..count {
                let mut info = spectral_info("spectral blade");
                info.attack_duration /= 2;
                if summon_spectral(sim, info, at, ctx.caster, allied, lifespan).is_none() {
                    debug!(%at, "no room for a spectral blade");
                    break;
                }
            }
            ctx.auto_id = true;
        }
        BoltEffect::Obstruction => {
            let falloff = Fixed::ratio(4, 5).ipow(ctx.bolt.magnitude as i64) * FORCEFIELD_BASE_DECREMENT;
            let decrement = (falloff.trunc() as i32).max(1);
            sim.spawn_feature(at, DungeonFeature::Forcefield, Some(decrement));
            ctx.auto_id = true;
        }
        BoltEffect::Tunneling => {
            if sim.map.tunnelize(at) {
                ctx.auto_id = true;
            }
            // a diagonal breach is widened so it can be walked through
            if let Some(prev) = previous.filter(|p| *p != at && p.x != at.x && p.y != at.y) {
                let side = if sim.map.cell_has_terrain_flag(Pos::new(prev.x, at.y), TerrainFlags::IMPREGNABLE) {
                    Pos::new(at.x, prev.y)
                } else {
                    Pos::new(prev.x, at.y)
                };
                sim.map.tunnelize(side);
            }
        }
        _ => {}
    }
    if let Some(feature) = ctx.bolt.target_feature {
        sim.spawn_feature(at, feature, None);
    }
}

/// Put a blinking creature down at `at`. A hidden creature already there
/// is shoved to the nearest free cell, or buried if there is none.
fn land_blinker(sim: &mut Sim, blinker: CreatureId, origin: Pos, at: Pos) {
    if let Some(occupant) = sim.monster_at(at).filter(|&o| o != blinker) {
        let avoid = sim
            .roster
            .get(occupant)
            .map(|c| c.info.avoided_terrain())
            .unwrap_or_default();
        match sim.qualifying_loc_near(at, avoid, true) {
            Some(p) => set_monster_location(sim, occupant, p),
            None => {
                debug!(%occupant, %at, "blink landed on a creature with nowhere to go");
                kill_creature(sim, occupant, true);
            }
        }
    }
    if let Some(c) = sim.roster.get_mut(blinker) {
        c.bookkeeping.remove(BookkeepingFlags::SUBMERGED);
    }
    set_monster_location(sim, blinker, at);
    sim.emit(SimEvent::Teleport {
        creature: blinker,
        from: origin,
        to: at,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::BoltKind;
    use crate::creature::test_support::goblin_info;
    use crate::creature::{AbilityFlags, CreatureState, StatusKind};
    use crate::sim::test_support::*;

    #[test]
    fn test_zero_length_zap_is_a_no_op() {
        let mut sim = sim();
        let before = sim.rng.numbers_generated();
        assert!(!zap(&mut sim, Pos::new(5, 5), Pos::new(5, 5), &BoltKind::Fire.bolt()));
        assert_eq!(sim.rng.numbers_generated(), before);
        assert!(sim.events.is_empty());
    }

    #[test]
    fn test_player_blinks_and_stops_before_a_wall() {
        let mut sim = sim();
        let player = sim.player_id();
        let bolt = BoltKind::Blinking.bolt().with_magnitude(10);
        assert!(zap(&mut sim, Pos::new(5, 5), Pos::new(6, 5), &bolt));
        // the east wall of the room is at x = 19
        assert_eq!(creature(&sim, player).pos, Pos::new(18, 5));
    }

    #[test]
    fn test_blink_distance_follows_magnitude() {
        let mut sim = sim();
        let player = sim.player_id();
        let bolt = BoltKind::Blinking.bolt().with_magnitude(2);
        zap(&mut sim, Pos::new(5, 5), Pos::new(6, 5), &bolt);
        assert_eq!(creature(&sim, player).pos, Pos::new(10, 5));
    }

    #[test]
    fn test_blink_into_adjacent_wall_does_nothing() {
        let mut sim = sim();
        let player = sim.player_id();
        grid(&mut sim).add_wall(Pos::new(6, 5));
        assert!(!zap(&mut sim, Pos::new(5, 5), Pos::new(6, 5), &BoltKind::Blinking.bolt()));
        assert_eq!(creature(&sim, player).pos, Pos::new(5, 5));
    }

    #[test]
    fn test_blink_shoves_a_submerged_occupant_aside() {
        let mut sim = sim();
        let player = sim.player_id();
        let eel = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        creature_mut(&mut sim, eel).bookkeeping |= BookkeepingFlags::SUBMERGED;
        let bolt = BoltKind::Blinking.bolt().with_magnitude(1);
        zap(&mut sim, Pos::new(5, 5), Pos::new(6, 5), &bolt);
        assert_eq!(creature(&sim, player).pos, Pos::new(8, 5));
        let e = creature(&sim, eel);
        assert_ne!(e.pos, Pos::new(8, 5));
        assert!(!e.has_died());
        assert_eq!(crate::geom::distance_between(e.pos, Pos::new(8, 5)), 1);
    }

    #[test]
    fn test_firebolt_stops_at_first_creature() {
        let mut sim = sim();
        let near = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let far = sim.spawn_monster(goblin_info(), Pos::new(10, 5));
        for id in [near, far] {
            creature_mut(&mut sim, id).info.max_hp = 100;
            creature_mut(&mut sim, id).current_hp = 100;
        }
        assert!(zap(&mut sim, Pos::new(5, 5), Pos::new(10, 5), &BoltKind::Fire.bolt().with_magnitude(3)));
        assert!(creature(&sim, near).current_hp < 100);
        assert_eq!(creature(&sim, far).current_hp, 100);
    }

    #[test]
    fn test_lightning_passes_through_everyone() {
        let mut sim = sim();
        let ids: Vec<_> = [8, 10, 12]
            .iter()
            .map(|&x| sim.spawn_monster(goblin_info(), Pos::new(x, 5)))
            .collect();
        for &id in &ids {
            creature_mut(&mut sim, id).info.max_hp = 100;
            creature_mut(&mut sim, id).current_hp = 100;
        }
        zap(&mut sim, Pos::new(5, 5), Pos::new(8, 5), &BoltKind::Lightning.bolt().with_magnitude(2));
        assert!(ids.iter().all(|&id| creature(&sim, id).current_hp < 100));
    }

    #[test]
    fn test_tunneling_bores_until_spent() {
        let mut sim = sim();
        for x in 8..=12 {
            grid(&mut sim).add_wall(Pos::new(x, 5));
        }
        let bolt = BoltKind::Tunneling.bolt().with_magnitude(3);
        assert!(zap(&mut sim, Pos::new(5, 5), Pos::new(6, 5), &bolt));
        for x in 8..=10 {
            assert!(!sim.map.cell_has_terrain_flag(Pos::new(x, 5), TerrainFlags::OBSTRUCTS_PASSABILITY));
        }
        assert!(sim.map.cell_has_terrain_flag(Pos::new(11, 5), TerrainFlags::OBSTRUCTS_PASSABILITY));
    }

    #[test]
    fn test_obstruction_spawns_forcefield_short_of_target() {
        let mut sim = sim();
        sim.spawn_monster(goblin_info(), Pos::new(9, 5));
        let bolt = BoltKind::Obstruction.bolt().with_magnitude(2);
        zap(&mut sim, Pos::new(5, 5), Pos::new(9, 5), &bolt);
        let spawned = &grid(&mut sim).spawned;
        assert!(spawned.iter().any(|s| s.feature == DungeonFeature::Forcefield
            && s.pos == Pos::new(8, 5)
            && s.probability_decrement.is_some_and(|d| (47..=48).contains(&d))));
    }

    #[test]
    fn test_conjuration_summons_allied_blades() {
        let mut sim = sim();
        let player = sim.player_id();
        let bolt = BoltKind::Conjuration.bolt().with_magnitude(2);
        zap(&mut sim, Pos::new(5, 5), Pos::new(9, 5), &bolt);
        let blades: Vec<_> = sim.roster.monsters().filter(|c| c.info.name == "spectral blade").collect();
        assert_eq!(blades.len(), 3);
        for b in blades {
            assert_eq!(b.state, CreatureState::Ally);
            assert_eq!(b.leader, Some(player));
            assert_eq!(b.attack_duration, 50);
            assert_eq!(b.status(StatusKind::LifespanRemaining), sim.config.blade_lifespan);
        }
    }

    #[test]
    fn test_mirror_sends_the_bolt_back_at_the_caster() {
        let mut sim = sim();
        let player = sim.player_id();
        let mirror = sim.spawn_monster(goblin_info().with_abilities(AbilityFlags::REFLECT_100), Pos::new(9, 5));
        creature_mut(&mut sim, player).info.max_hp = 100;
        creature_mut(&mut sim, player).current_hp = 100;
        zap(&mut sim, Pos::new(5, 5), Pos::new(9, 5), &BoltKind::Spark.bolt());
        assert_eq!(creature(&sim, mirror).current_hp, 15);
        assert!(creature(&sim, player).current_hp < 100);
        assert!(sim.events.iter().any(|e| matches!(e, SimEvent::Reflection { by: Some(m), .. } if *m == mirror)));
        sim.messages.display_combat_text();
        assert!(sim.messages.contains("The goblin deflects the spark"));
    }

    #[test]
    fn test_arrows_never_reflect() {
        let mut sim = sim();
        let archer = sim.spawn_monster(goblin_info(), Pos::new(9, 5));
        creature_mut(&mut sim, archer).state = CreatureState::TrackingScent;
        let player = sim.player_id();
        creature_mut(&mut sim, player).info.behaviors |= crate::creature::BehaviorFlags::REFLECT_50;
        creature_mut(&mut sim, player).status.set_both(StatusKind::Paralyzed, 5);
        let before = creature(&sim, player).current_hp;
        zap(&mut sim, Pos::new(9, 5), Pos::new(5, 5), &BoltKind::Arrow.bolt());
        assert!(creature(&sim, player).current_hp < before);
        assert!(!sim.events.iter().any(|e| matches!(e, SimEvent::Reflection { .. })));
    }
}
