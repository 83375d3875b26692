//! What a bolt does to the creature in its way

use tracing::debug;

use super::catalog::{BoltEffect, BoltFlags, BoltKind};
use super::zap::{ZapContext, zap};
use crate::combat::{attack, inflict_damage, kill_creature, moral_attack, split_monster};
use crate::creature::relations::{
    add_poison, become_ally_with, clone_monster, empower_monster, expose_creature_to_fire, free_captive,
    haste, heal, negate, polymorph, slow, teleport, wake_up,
};
use crate::creature::{BehaviorFlags, CreatureId, CreatureMode, CreatureState, StatusKind};
use crate::events::SimEvent;
use crate::fixed::Fixed;
use crate::geom::{Pos, distance_between};
use crate::item::power::{
    staff_damage, staff_discord_duration, staff_entrancement_duration, staff_haste_duration,
    staff_poison, staff_protection, wand_dominate,
};
use crate::map::TerrainFlags;
use crate::messages::{MessageColor, MessageFlags, color_for_victim, monster_name};
use crate::sim::{Sim, stale_handle};

/// Duration of invisibility from a bolt
const BOLT_INVISIBILITY_DURATION: i32 = 150;

/// The creature a bolt meets at `cell`: not submerged, and never the
/// blinker itself while it is in flight.
pub(super) fn bolt_target_at(sim: &Sim, ctx: &ZapContext, cell: Pos) -> Option<CreatureId> {
    let id = sim.monster_at(cell)?;
    if ctx.bolt.effect == BoltEffect::Blinking && Some(id) == ctx.caster {
        return None;
    }
    sim.roster.get(id).filter(|c| !c.is_submerged()).map(|c| c.id)
}

/// Resolve the bolt at one cell of its path. Returns true when the bolt
/// stops here.
///
/// A creature in the cell takes the bolt's effect, and the bolt stops
/// unless it passes through creatures. The path feature is then spawned
/// and a fiery bolt sets the cell alight.
pub fn update_bolt(sim: &mut Sim, ctx: &mut ZapContext, cell: Pos) -> bool {
    let mut terminate = false;
    if let Some(target) = bolt_target_at(sim, ctx, cell) {
        if resolve_creature(sim, ctx, target, cell) {
            return true;
        }
        if !ctx.bolt.has_flag(BoltFlags::PASSES_THRU_CREATURES) {
            terminate = true;
        }
    }

    if let Some(feature) = ctx.bolt.path_feature {
        sim.spawn_feature(cell, feature, None);
    }
    if ctx.bolt.has_flag(BoltFlags::FIERY)
        && !sim.map.cell_has_terrain_flag(cell, TerrainFlags::OBSTRUCTS_PASSABILITY)
        && sim.map.expose_to_fire(cell, true)
    {
        ctx.auto_id = true;
    }
    terminate
}

/// Apply the bolt's effect to `target`. Returns true only when the bolt
/// killed the player, which ends everything.
fn resolve_creature(sim: &mut Sim, ctx: &mut ZapContext, target: CreatureId, cell: Pos) -> bool {
    let bolt = ctx.bolt;
    let caster = ctx.caster;
    let magnitude = Fixed::from_int(bolt.magnitude as i64);
    let name = monster_name(sim, target, true);
    let visible = sim.can_see_monster(target);
    let target_is_player = sim.is_player(target);
    let Some(c) = sim.roster.get(target) else {
        stale_handle(target);
        return false;
    };
    let immobile = c.has_behavior(BehaviorFlags::IMMOBILE);
    let unaffected = c.is_inanimate() || c.is_invulnerable();
    let captive = c.is_captive();
    debug!(bolt = %bolt.kind, %target, at = %cell, "bolt hits");

    match bolt.effect {
        BoltEffect::Attack => {
            let reachable = !sim.map.cell_has_terrain_flag(cell, TerrainFlags::OBSTRUCTS_PASSABILITY)
                || c.has_behavior(BehaviorFlags::ATTACKABLE_THRU_WALLS);
            if reachable && let Some(caster) = caster {
                attack(sim, caster, target, false);
                ctx.auto_id = true;
            }
        }
        BoltEffect::Damage => {
            ctx.auto_id = true;
            return damage_target(sim, ctx, target, &name, visible);
        }
        BoltEffect::Teleport => {
            if !immobile {
                if captive {
                    free_captive(sim, target);
                }
                teleport(sim, target, None, false);
            }
        }
        BoltEffect::Beckoning => {
            if let Some(caster_pos) = caster.and_then(|id| sim.roster.get(id)).map(|c| c.pos)
                && !immobile
                && distance_between(caster_pos, cell) > 1
            {
                if visible {
                    ctx.auto_id = true;
                }
                beckon(sim, target, caster_pos);
            }
        }
        BoltEffect::Slow => {
            slow(sim, target, bolt.magnitude * 5);
            ctx.auto_id = true;
        }
        BoltEffect::Haste => {
            haste(sim, target, staff_haste_duration(magnitude));
            ctx.auto_id = true;
        }
        BoltEffect::Polymorph => {
            if polymorph(sim, target) && sim.roster.get(target).is_some_and(|c| c.status(StatusKind::Invisible) == 0) {
                ctx.auto_id = true;
            }
        }
        BoltEffect::Invisibility => {
            if imbue_invisibility(sim, target, BOLT_INVISIBILITY_DURATION) {
                ctx.auto_id = true;
            }
        }
        BoltEffect::Domination => {
            if !target_is_player && !unaffected {
                let chance = sim.roster.get(target).map(wand_dominate).unwrap_or(0);
                if sim.rng.percent(chance) {
                    if let Some(c) = sim.roster.get_mut(target) {
                        c.status.clear(StatusKind::Discordant);
                    }
                    become_ally_with(sim, target);
                    if visible {
                        ctx.auto_id = true;
                        sim.message(&format!("{} is bound to your will!", name), MessageFlags::empty());
                    }
                } else if visible {
                    ctx.auto_id = true;
                    sim.message(&format!("{} resists the bolt of domination.", name), MessageFlags::empty());
                }
            }
        }
        BoltEffect::Negation => {
            negate(sim, target);
        }
        BoltEffect::Empowerment => {
            if !target_is_player && !unaffected {
                empower_monster(sim, target);
                ctx.auto_id = true;
            }
        }
        BoltEffect::Poison => {
            if !unaffected {
                add_poison(sim, target, staff_poison(magnitude), 1);
                if visible {
                    ctx.auto_id = true;
                    if !target_is_player {
                        let hallucinating = sim.player_status(StatusKind::Hallucinating) > 0;
                        let very = sim.roster.get(target).is_some_and(|c| {
                            c.status(StatusKind::Poisoned) * c.poison_amount >= c.current_hp
                        }) && !hallucinating;
                        let color = color_for_victim(sim, target);
                        sim.combat_message(
                            &format!("{} looks {}sick", name, if very { "very " } else { "" }),
                            color,
                        );
                    }
                }
            }
        }
        BoltEffect::Entrancement => {
            let duration = staff_entrancement_duration(magnitude);
            if target_is_player {
                if let Some(p) = sim.player_mut() {
                    p.status.set(StatusKind::Confused, duration);
                    let max = p.status.max(StatusKind::Confused).max(duration);
                    p.status.set_max(StatusKind::Confused, max);
                }
                sim.message(
                    "the bolt hits you and you suddenly feel disoriented.",
                    MessageFlags::REQUIRE_ACK,
                );
                ctx.auto_id = true;
            } else if !unaffected {
                if let Some(c) = sim.roster.get_mut(target) {
                    c.status.set_both(StatusKind::Entranced, duration);
                }
                wake_up(sim, target);
                if visible {
                    ctx.auto_id = true;
                    sim.message(&format!("{} is entranced!", name), MessageFlags::empty());
                }
            }
        }
        BoltEffect::Healing => {
            heal(sim, target, bolt.magnitude * 10, false);
            if visible {
                ctx.auto_id = true;
                sim.combat_message(&format!("{} looks healthier", name), MessageColor::Plain);
            }
        }
        BoltEffect::Plenty => {
            if !unaffected && let Some(clone) = clone_monster(sim, target, true, true) {
                let max_hp = sim.roster.get(target).map(|c| (c.info.max_hp + 1) / 2).unwrap_or(1);
                let hp = sim.roster.get(target).map(|c| c.current_hp.min(max_hp)).unwrap_or(1);
                for id in [target, clone] {
                    if let Some(c) = sim.roster.get_mut(id) {
                        c.info.max_hp = max_hp;
                        c.current_hp = hp;
                    }
                }
                ctx.auto_id = true;
            }
        }
        BoltEffect::Discord => {
            if !unaffected {
                let duration = staff_discord_duration(magnitude);
                if let Some(c) = sim.roster.get_mut(target) {
                    let value = duration.max(c.status(StatusKind::Discordant));
                    c.status.set_both(StatusKind::Discordant, value);
                }
                sim.emit(SimEvent::StatusChange {
                    creature: target,
                    status: StatusKind::Discordant,
                    value: duration,
                });
                if visible {
                    ctx.auto_id = true;
                }
            }
        }
        BoltEffect::Shielding => {
            let points = staff_protection(magnitude);
            if let Some(c) = sim.roster.get_mut(target) {
                c.status.add(StatusKind::Shielded, points);
                let now = c.status(StatusKind::Shielded);
                c.status.set_max(StatusKind::Shielded, now);
            }
            ctx.auto_id = true;
        }
        BoltEffect::None
        | BoltEffect::Tunneling
        | BoltEffect::Blinking
        | BoltEffect::Obstruction
        | BoltEffect::Conjuration => {}
    }
    false
}

fn damage_target(sim: &mut Sim, ctx: &ZapContext, target: CreatureId, name: &str, visible: bool) -> bool {
    let bolt = ctx.bolt;
    let caster = ctx.caster;
    let fiery = bolt.has_flag(BoltFlags::FIERY);
    let Some(c) = sim.roster.get(target) else {
        return false;
    };
    if (fiery && c.is_immune_to_fire()) || c.is_invulnerable() {
        if visible {
            let verb = if sim.is_player(target) { "ignore" } else { "ignores" };
            sim.combat_message(&format!("{} {} the {}", name, verb, bolt.name), MessageColor::Plain);
        }
        return false;
    }
    let inanimate = c.is_inanimate();
    let in_view = sim.player_can_see(c.pos);
    let amount = staff_damage(&mut sim.rng, Fixed::from_int(bolt.magnitude as i64));

    if inflict_damage(sim, caster, target, amount, false) {
        if sim.is_player(target) {
            kill_creature(sim, target, false);
            let killer = match caster {
                Some(id) if sim.is_player(id) => format!("a reflected {}", bolt.name),
                Some(id) => sim.roster.get(id).map(|c| c.info.name.clone()).unwrap_or_default(),
                None => bolt.name.to_string(),
            };
            sim.game_over(&killer);
            return true;
        }
        if in_view || visible {
            let verb = if inanimate { "destroys" } else { "kills" };
            let color = color_for_victim(sim, target);
            sim.combat_message(&format!("the {} {} {}", bolt.name, verb, name), color);
        } else {
            let what = if inanimate { "get destroyed" } else { "die" };
            sim.combat_message(&format!("you hear {} {}", name, what), MessageColor::Plain);
        }
        kill_creature(sim, target, false);
        return false;
    }

    if let Some(c) = sim.roster.get_mut(target)
        && c.mode != CreatureMode::PermFleeing
        && c.state != CreatureState::Ally
        && (c.state != CreatureState::Fleeing || c.status(StatusKind::MagicalFear) > 0)
    {
        c.state = CreatureState::TrackingScent;
        if c.status(StatusKind::MagicalFear) > 0 {
            c.status.set(StatusKind::MagicalFear, 1);
        }
    }
    if in_view {
        let color = color_for_victim(sim, target);
        sim.combat_message(&format!("the {} hits {}", bolt.name, name), color);
    }
    if fiery {
        expose_creature_to_fire(sim, target);
    }
    if let Some(caster) = caster
        && (!ctx.already_reflected || !sim.is_player(caster))
    {
        moral_attack(sim, caster, target);
        split_monster(sim, target, caster);
    }
    false
}

/// Pull a creature toward `toward` by blinking it most of the way there.
///
/// The creature then waits long enough that the one who beckoned it gets
/// the first swing.
pub fn beckon(sim: &mut Sim, id: CreatureId, toward: Pos) {
    let Some(c) = sim.roster.get(id) else {
        return stale_handle(id);
    };
    let from = c.pos;
    if c.is_captive() {
        free_captive(sim, id);
    }
    let magnitude = ((distance_between(toward, from) - 2) / 2).max(1);
    let bolt = BoltKind::Blinking.bolt().with_magnitude(magnitude);
    zap(sim, from, toward, &bolt);

    let floor = sim.player().map(|p| p.attack_duration + 1).unwrap_or(101);
    if let Some(c) = sim.roster.get_mut(id)
        && c.ticks_until_turn < floor
    {
        c.ticks_until_turn = floor;
    }
}

/// Turn a creature invisible for `duration` turns. Returns whether the
/// player would notice it happen.
pub fn imbue_invisibility(sim: &mut Sim, id: CreatureId, duration: i32) -> bool {
    let is_player = sim.is_player(id);
    let noticed = {
        let Some(c) = sim.roster.get(id) else {
            stale_handle(id);
            return false;
        };
        if c.has_behavior(BehaviorFlags::INANIMATE | BehaviorFlags::INVISIBLE | BehaviorFlags::INVULNERABLE) {
            return false;
        }
        is_player || c.is_ally() || (sim.can_see_monster(id) && sim.monster_revealed(id))
    };
    if let Some(c) = sim.roster.get_mut(id) {
        c.status.set_both(StatusKind::Invisible, duration);
    }
    sim.emit(SimEvent::StatusChange {
        creature: id,
        status: StatusKind::Invisible,
        value: duration,
    });
    noticed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::Bolt;
    use crate::creature::test_support::goblin_info;
    use crate::sim::test_support::*;

    fn context(bolt: Bolt, caster: Option<CreatureId>) -> ZapContext {
        ZapContext {
            bolt,
            caster,
            already_reflected: false,
            auto_id: false,
        }
    }

    #[test]
    fn test_lightning_passes_through_and_damages() {
        let mut sim = sim();
        let player = sim.player_id();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        creature_mut(&mut sim, g).info.max_hp = 100;
        creature_mut(&mut sim, g).current_hp = 100;
        let mut ctx = context(BoltKind::Lightning.bolt().with_magnitude(2), Some(player));
        assert!(!update_bolt(&mut sim, &mut ctx, Pos::new(8, 5)));
        assert!(ctx.auto_id);
        assert!(creature(&sim, g).current_hp < 100);
        sim.messages.display_combat_text();
        assert!(sim.messages.contains("The lightning hits the goblin"));
    }

    #[test]
    fn test_fire_ignored_by_the_fireproof() {
        let mut sim = sim();
        let player = sim.player_id();
        let salamander = sim.spawn_monster(
            goblin_info().with_behaviors(BehaviorFlags::IMMUNE_TO_FIRE),
            Pos::new(8, 5),
        );
        let mut ctx = context(BoltKind::Fire.bolt(), Some(player));
        assert!(update_bolt(&mut sim, &mut ctx, Pos::new(8, 5)));
        assert_eq!(creature(&sim, salamander).current_hp, 15);
        sim.messages.display_combat_text();
        assert!(sim.messages.contains("ignores the flame"));
    }

    #[test]
    fn test_bolt_kill_is_reported() {
        let mut sim = sim();
        let player = sim.player_id();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        creature_mut(&mut sim, g).current_hp = 1;
        let mut ctx = context(BoltKind::Spark.bolt(), Some(player));
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        assert!(creature(&sim, g).is_dying());
        sim.messages.display_combat_text();
        assert!(sim.messages.contains("The spark kills the goblin"));
    }

    #[test]
    fn test_reflected_bolt_can_kill_the_player() {
        let mut sim = sim();
        let player = sim.player_id();
        creature_mut(&mut sim, player).current_hp = 1;
        let mut ctx = context(BoltKind::Spark.bolt(), Some(player));
        ctx.already_reflected = true;
        assert!(update_bolt(&mut sim, &mut ctx, Pos::new(5, 5)));
        assert_eq!(sim.game_over.as_deref(), Some("a reflected spark"));
    }

    #[test]
    fn test_slow_and_haste() {
        let mut sim = sim();
        let player = sim.player_id();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let mut ctx = context(BoltKind::Slow.bolt(), Some(player));
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        assert_eq!(creature(&sim, g).status(StatusKind::Slowed), 50);
        assert_eq!(creature(&sim, g).movement_duration, 200);

        let mut ctx = context(BoltKind::Haste.bolt().with_magnitude(3), Some(player));
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        let c = creature(&sim, g);
        assert_eq!(c.status(StatusKind::Slowed), 0);
        assert!(c.status(StatusKind::Hasted) > 0);
    }

    #[test]
    fn test_shielding_stacks() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let bolt = BoltKind::Shielding.bolt().with_magnitude(2);
        let mut ctx = context(bolt, None);
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        let c = creature(&sim, g);
        assert_eq!(c.status(StatusKind::Shielded), 260);
        assert_eq!(c.status.max(StatusKind::Shielded), 260);
    }

    #[test]
    fn test_entrancement_confuses_the_player() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let mut ctx = context(BoltKind::Entrancement.bolt().with_magnitude(3), Some(g));
        update_bolt(&mut sim, &mut ctx, Pos::new(5, 5));
        assert_eq!(sim.player_status(StatusKind::Confused), 9);
        assert!(sim.messages.contains("suddenly feel disoriented"));
    }

    #[test]
    fn test_domination_of_a_nearly_dead_monster() {
        let mut sim = sim();
        let player = sim.player_id();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        creature_mut(&mut sim, g).current_hp = 1;
        let mut ctx = context(BoltKind::Domination.bolt(), Some(player));
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        assert!(creature(&sim, g).is_ally());
        assert!(sim.messages.contains("is bound to your will!"));
    }

    #[test]
    fn test_submerged_creatures_are_passed_over() {
        let mut sim = sim();
        let player = sim.player_id();
        let eel = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        creature_mut(&mut sim, eel).bookkeeping |= crate::creature::BookkeepingFlags::SUBMERGED;
        let mut ctx = context(BoltKind::Fire.bolt(), Some(player));
        assert!(!update_bolt(&mut sim, &mut ctx, Pos::new(8, 5)));
        assert_eq!(creature(&sim, eel).current_hp, 15);
    }

    #[test]
    fn test_invisibility_noticed_only_on_allies() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        assert!(!imbue_invisibility(&mut sim, g, 150));
        assert_eq!(creature(&sim, g).status(StatusKind::Invisible), 150);

        let friend = sim.spawn_monster(goblin_info(), Pos::new(9, 5));
        creature_mut(&mut sim, friend).state = CreatureState::Ally;
        assert!(imbue_invisibility(&mut sim, friend, 150));

        let statue = sim.spawn_monster(goblin_info().with_behaviors(BehaviorFlags::INANIMATE), Pos::new(10, 5));
        assert!(!imbue_invisibility(&mut sim, statue, 150));
        assert_eq!(creature(&sim, statue).status(StatusKind::Invisible), 0);
    }

    #[test]
    fn test_beckoning_pulls_a_monster_close() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(12, 5));
        let toward = sim.player_pos();
        beckon(&mut sim, g, toward);
        let c = creature(&sim, g);
        assert_eq!(c.pos, Pos::new(7, 5));
        assert_eq!(c.ticks_until_turn, 101);
    }

    #[test]
    fn test_plenty_halves_health_between_twins() {
        let mut sim = sim();
        sim.spawn_monster(goblin_info(), Pos::new(8, 5));
        let mut ctx = context(BoltKind::Plenty.bolt(), None);
        update_bolt(&mut sim, &mut ctx, Pos::new(8, 5));
        let twins: Vec<_> = sim.roster.monsters().filter(|c| c.info.kind == 1).collect();
        assert_eq!(twins.len(), 2);
        assert!(twins.iter().all(|c| c.info.max_hp == 8 && c.current_hp == 8));
    }
}
