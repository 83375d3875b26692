//! How being attacked changes a creature's mind

use crate::creature::relations::{alert_monster, un_ally};
use crate::creature::{AbilityFlags, CreatureId, StatusKind};
use crate::sim::{Sim, stale_handle};

/// Reactions to being struck: paralysis and entrancement break, magical
/// fear fades, corridor-avoiders fly into a rage, an ally the player hits
/// turns hostile, and an enemy hit by the player's side gives chase.
pub fn moral_attack(sim: &mut Sim, attacker: CreatureId, defender: CreatureId) {
    let attack_duration = sim.roster.get(attacker).map(|a| a.attack_duration).unwrap_or(100);
    let attacker_is_player = sim.is_player(attacker);
    let attacker_is_ally = sim.roster.get(attacker).is_some_and(|a| a.is_ally());
    let defender_is_player = sim.is_player(defender);
    let player_confused = sim.player_status(StatusKind::Confused) > 0;
    let player_dying = sim.player().is_none_or(|p| p.is_dying() || p.current_hp <= 0);

    let Some(def) = sim.roster.get_mut(defender) else {
        return stale_handle(defender);
    };
    if def.current_hp <= 0 || def.is_dying() {
        return;
    }
    if def.is_paralyzed() {
        def.status.set(StatusKind::Paralyzed, 0);
        // the blow wakes it just before the attacker can swing again
        def.ticks_until_turn = attack_duration.min(100) - 1;
    }
    if def.status(StatusKind::MagicalFear) > 0 {
        def.status.set(StatusKind::MagicalFear, 1);
    }
    def.status.set(StatusKind::Entranced, 0);
    if def.has_ability(AbilityFlags::AVOID_CORRIDORS) {
        def.status.set_both(StatusKind::Enraged, 4);
    }

    let defender_is_ally = def.is_ally();
    let discordant = def.status(StatusKind::Discordant) > 0;
    if attacker_is_player && defender_is_ally && !discordant && !player_confused && !player_dying {
        un_ally(sim, defender);
    }
    if (attacker_is_player || attacker_is_ally) && !defender_is_player && !defender_is_ally {
        alert_monster(sim, defender);
    }
}
