//! Side effects of a monster's successful hit

use tracing::debug;

use super::attack::process_stagger_hit;
use super::hit::attack_hit;
use crate::consts::MIN_DEGRADE_ENCHANT;
use crate::creature::relations::{add_poison, expose_creature_to_fire, weaken};
use crate::creature::{AbilityFlags, CreatureId, CreatureMode, CreatureState, StatusKind};
use crate::events::SimEvent;
use crate::item::{Item, ItemFlags};
use crate::messages::{MessageColor, MessageFlags, monster_name};
use crate::sim::{Sim, stale_handle};

/// Apply the attacker's on-hit abilities. `damage` is the damage the blow
/// dealt, before any poison conversion.
///
/// Against the player these degrade armor, cause hallucination, set fire
/// or steal an item; armor of immunity to the attacker blocks all of it.
/// Poison, weakness and staggering apply to any living defender.
pub fn special_hit(sim: &mut Sim, attacker: CreatureId, defender: CreatureId, damage: i32) {
    let Some(att) = sim.roster.get(attacker) else {
        return stale_handle(attacker);
    };
    if !att.has_ability(AbilityFlags::SPECIAL_HIT) {
        return;
    }
    let abilities = att.info.abilities;
    let classes = att.info.classes;

    if sim.is_player(defender) {
        if sim.armor().is_some_and(|a| a.grants_immunity_to(classes)) {
            return;
        }
        if abilities.contains(AbilityFlags::HIT_DEGRADE_ARMOR) {
            degrade_armor(sim);
        }
        if abilities.contains(AbilityFlags::HIT_HALLUCINATE) {
            let hallucinating = sim.player_status(StatusKind::Hallucinating) > 0;
            if !hallucinating {
                sim.combat_message("you begin to hallucinate", MessageColor::Plain);
            }
            let bonus = sim.config.hallucination_on_hit;
            if let Some(p) = sim.player_mut() {
                if !hallucinating {
                    p.status.set_max(StatusKind::Hallucinating, 0);
                }
                p.status.add(StatusKind::Hallucinating, bonus);
                let now = p.status(StatusKind::Hallucinating);
                p.status
                    .set_max(StatusKind::Hallucinating, p.status.max(StatusKind::Hallucinating).max(now));
            }
        }
        if abilities.contains(AbilityFlags::HIT_BURN) && sim.player_status(StatusKind::ImmuneToFire) == 0 {
            expose_creature_to_fire(sim, defender);
        }
        if abilities.contains(AbilityFlags::HIT_STEAL_FLEE) {
            steal(sim, attacker, defender);
        }
    }

    let susceptible = sim
        .roster
        .get(defender)
        .is_some_and(|d| !d.is_inanimate() && !d.is_invulnerable());
    if damage > 0 && susceptible {
        if abilities.contains(AbilityFlags::POISONS) {
            add_poison(sim, defender, damage, 1);
        }
        if abilities.contains(AbilityFlags::CAUSES_WEAKNESS) {
            let duration = sim.config.weakness_on_hit;
            weaken(sim, defender, duration);
        }
    }
    if abilities.contains(AbilityFlags::ATTACKS_STAGGER) {
        process_stagger_hit(sim, attacker, defender);
    }
}

fn degrade_armor(sim: &mut Sim) {
    let Some(armor) = sim.armor_mut() else {
        return;
    };
    if armor.has_flag(ItemFlags::PROTECTED) || armor.enchant1 + armor.armor / 10 <= MIN_DEGRADE_ENCHANT {
        return;
    }
    armor.enchant1 -= 1;
    let name = armor.name(false);
    sim.recalculate_equipment_bonuses();
    sim.messages
        .message_colored(&format!("your {} weakens!", name), MessageColor::Bad, MessageFlags::empty());
}

/// A thief makes off with part of an unequipped stack: half of a bundle of
/// more than three weapons, one of any other stack, or the whole item.
fn steal(sim: &mut Sim, thief: CreatureId, victim: CreatureId) {
    let Some(t) = sim.roster.get(thief) else {
        return;
    };
    if t.carried_item.is_some()
        || sim.pack.is_empty()
        || t.current_hp <= 0
        || t.status(StatusKind::Confused) > 0
    {
        return;
    }
    if !attack_hit(sim, thief, victim) {
        return;
    }
    let candidates = sim.pack.unequipped();
    if candidates.is_empty() {
        return;
    }
    let pick = sim.rng.uniform_range(1, candidates.len() as i32) as usize;
    let id = candidates[pick - 1];
    let Some(item) = sim.pack.get(id) else {
        return;
    };
    let quantity = item.quantity;
    let taken = if item.is_weapon() {
        if quantity > 3 { (quantity + 1) / 2 } else { quantity }
    } else {
        1
    };

    let stolen: Item = if taken < quantity {
        let new_id = sim.allocate_item_id();
        let Some(item) = sim.pack.get_mut(id) else {
            return;
        };
        item.quantity -= taken;
        let mut part = item.clone();
        part.id = new_id;
        part.quantity = taken;
        part
    } else {
        match sim.pack.remove(id) {
            Some(item) => item,
            None => return,
        }
    };

    let item_id = stolen.id;
    let item_name = stolen.name(true);
    if let Some(t) = sim.roster.get_mut(thief) {
        t.carried_item = Some(stolen);
        t.mode = CreatureMode::PermFleeing;
        t.state = CreatureState::Fleeing;
    }
    debug!(%thief, item = item_id.0, "item stolen");
    let name = monster_name(sim, thief, true);
    sim.messages.message_colored(
        &format!("{} stole {}!", name, item_name),
        MessageColor::Bad,
        MessageFlags::empty(),
    );
    sim.emit(SimEvent::ItemStolen { thief, item: item_id });
}
