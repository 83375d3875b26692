//! Applying damage: shields, bleeding, transference and flight

use tracing::debug;

use crate::consts::SHIELD_POINTS_PER_DAMAGE;
use crate::creature::relations::wake_up;
use crate::creature::{AbilityFlags, BehaviorFlags, BookkeepingFlags, CreatureId, CreatureState, StatusKind};
use crate::events::SimEvent;
use crate::sim::{Sim, stale_handle};

/// Deal `damage` to `defender`; returns true if the blow is lethal.
///
/// The caller is responsible for calling [`kill_creature`] on a lethal
/// blow; the defender's hit points are left untouched in that case.
/// Unless `ignores_shield`, an active shield soaks up to one point of
/// damage per ten shield points first. Negative damage heals, up to the
/// creature's maximum.
///
/// [`kill_creature`]: super::kill_creature
pub fn inflict_damage(
    sim: &mut Sim,
    attacker: Option<CreatureId>,
    defender: CreatureId,
    damage: i32,
    ignores_shield: bool,
) -> bool {
    let Some(def) = sim.roster.get_mut(defender) else {
        stale_handle(defender);
        return false;
    };
    if damage == 0 || def.is_invulnerable() {
        return false;
    }

    let mut damage = damage;
    if !ignores_shield {
        let shield = def.status(StatusKind::Shielded);
        if shield > 0 {
            if shield > damage * SHIELD_POINTS_PER_DAMAGE {
                def.status.set(StatusKind::Shielded, shield - damage * SHIELD_POINTS_PER_DAMAGE);
                damage = 0;
            } else {
                damage -= (shield + SHIELD_POINTS_PER_DAMAGE - 1) / SHIELD_POINTS_PER_DAMAGE;
                def.status.set_both(StatusKind::Shielded, 0);
            }
        }
    }
    def.bookkeeping.remove(BookkeepingFlags::ABSORBING);

    let pos = def.pos;
    let hp = def.current_hp;
    let blood = def.info.blood;
    let asleep = def.state == CreatureState::Sleeping;
    let soulless = def.has_behavior(BehaviorFlags::INANIMATE | BehaviorFlags::INVULNERABLE);

    if damage > 0
        && let Some(blood) = blood
    {
        // bleed in proportion to the wound
        let intensity = 15 + damage.min(hp) * 3 / 2;
        sim.spawn_feature(pos, blood, Some(intensity));
    }
    if !sim.is_player(defender) && asleep {
        wake_up(sim, defender);
    }

    if let Some(att) = attacker
        && !soulless
        && transfer_life(sim, att, damage.min(hp))
    {
        return false;
    }

    if damage > 0
        && attacker.is_some()
        && let Some(def) = sim.roster.get_mut(defender)
    {
        def.last_attacker = attacker;
    }
    if damage != 0 {
        sim.emit(SimEvent::Damage {
            attacker,
            defender,
            amount: damage,
        });
    }

    let is_player = sim.is_player(defender);
    let Some(def) = sim.roster.get_mut(defender) else {
        return false;
    };
    if def.current_hp <= damage {
        return true;
    }
    if damage < 0 && def.current_hp - damage > def.info.max_hp {
        def.current_hp = def.current_hp.max(def.info.max_hp);
    } else {
        def.current_hp -= damage;
    }
    if !is_player
        && !def.is_ally()
        && def.has_behavior(BehaviorFlags::FLEES_NEAR_DEATH)
        && def.info.max_hp / 4 >= def.current_hp
    {
        def.state = CreatureState::Fleeing;
        debug!(%defender, hp = def.current_hp, "fleeing near death");
    }
    false
}

/// Move hit points from a victim to a transferring attacker. Returns true
/// if the transfer killed the player (a negative ring drains its wearer).
fn transfer_life(sim: &mut Sim, attacker: CreatureId, wound: i32) -> bool {
    let is_player = sim.is_player(attacker);
    let ratio = sim.config.player_transference_ratio;
    let transference = sim.rogue.transference;
    let Some(att) = sim.roster.get_mut(attacker) else {
        return false;
    };
    let amount = if is_player {
        if transference == 0 {
            return false;
        }
        match wound * transference / ratio {
            0 => transference.signum(),
            n => n,
        }
    } else if att.has_ability(AbilityFlags::TRANSFERENCE) {
        if att.is_ally() { wound * 4 / 10 } else { wound * 9 / 10 }
    } else {
        return false;
    };
    att.current_hp = (att.current_hp + amount).min(att.info.max_hp.max(att.current_hp));
    if amount != 0 {
        debug!(%attacker, amount, "life transferred");
    }
    if is_player && att.current_hp <= 0 {
        sim.game_over("Drained by a cursed ring");
        return true;
    }
    false
}

/// Damage equal to the defender's remaining health, bypassing shields
pub fn inflict_lethal_damage(sim: &mut Sim, attacker: Option<CreatureId>, defender: CreatureId) -> bool {
    let hp = sim.roster.get(defender).map(|c| c.current_hp).unwrap_or(0);
    inflict_damage(sim, attacker, defender, hp, true)
}
