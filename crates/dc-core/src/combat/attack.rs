//! One melee attack from start to finish

use tracing::debug;

use super::damage::inflict_damage;
use super::death::kill_creature;
use super::hit::{attack_hit, monster_damage_adjustment};
use super::moral::moral_attack;
use super::runics::{apply_armor_runic_effect, decrement_weapon_auto_id_timer, magic_weapon_hit};
use super::special::special_hit;
use super::split::split_monster;
use crate::consts::{MAX_ATTACK_VERBS, MIN_DEGRADE_ENCHANT};
use crate::creature::relations::{monster_will_attack_target, set_monster_location};
use crate::creature::{
    AbilityFlags, BehaviorFlags, BookkeepingFlags, CreatureId, CreatureState, StatusKind,
};
use crate::fixed::Fixed;
use crate::geom::{CLOCKWISE_DIRS, NB_DIRS, distance_between};
use crate::item::{ItemFlags, WeaponRunic};
use crate::map::TerrainFlags;
use crate::messages::{MessageColor, MessageFlags, color_for_victim, monster_name, resolve_pronouns};
use crate::sim::{Sim, stale_handle};

/// Whether an attack on `defender` could not possibly do anything.
///
/// The player is always allowed to try, unless the defender is inside a
/// wall it cannot be reached through.
pub fn attack_would_be_futile(sim: &Sim, attacker: CreatureId, defender: CreatureId) -> bool {
    let (Some(att), Some(def)) = (sim.roster.get(attacker), sim.roster.get(defender)) else {
        return true;
    };
    if sim.map.cell_has_terrain_flag(def.pos, TerrainFlags::OBSTRUCTS_PASSABILITY)
        && !def.has_behavior(BehaviorFlags::ATTACKABLE_THRU_WALLS)
    {
        return true;
    }
    if sim.is_player(attacker) {
        return false;
    }
    if att.has_behavior(BehaviorFlags::RESTRICTED_TO_LIQUID) && !att.is_levitating() && def.is_levitating() {
        return true;
    }
    if def.is_invulnerable() {
        return true;
    }
    def.is_immune_to_weapons() && !att.has_ability(AbilityFlags::POISONS)
}

/// Who a blow from `attacker` aimed at `defender` lands on.
///
/// A plain attack hits only the defender, in slot 0. A sweeping attack
/// visits all eight neighbors of the attacker clockwise, starting from the
/// defender's direction, and keeps every creature the attacker is willing
/// to hit and can reach.
pub fn build_hit_list(
    sim: &Sim,
    attacker: CreatureId,
    defender: CreatureId,
    sweep: bool,
) -> [Option<CreatureId>; 8] {
    let mut hits = [None; 8];
    if !sweep {
        hits[0] = Some(defender);
        return hits;
    }
    let (Some(att), Some(def)) = (sim.roster.get(attacker), sim.roster.get(defender)) else {
        return hits;
    };
    let origin = att.pos;
    let delta = (def.pos.x - origin.x, def.pos.y - origin.y);
    // the starting index comes from the neighbor table but walks the clockwise one
    let start = NB_DIRS.iter().position(|&d| d == delta).unwrap_or(0);
    for (i, slot) in hits.iter_mut().enumerate() {
        let (dx, dy) = CLOCKWISE_DIRS[(start + i) % CLOCKWISE_DIRS.len()];
        let p = origin.offset(dx, dy);
        if !sim.map.in_bounds(p) {
            continue;
        }
        let Some(target) = sim.monster_at(p) else {
            continue;
        };
        let reachable = sim.roster.get(target).is_some_and(|t| {
            !sim.map.cell_has_terrain_flag(t.pos, TerrainFlags::OBSTRUCTS_PASSABILITY)
                || t.has_behavior(BehaviorFlags::ATTACKABLE_THRU_WALLS)
        });
        if reachable && monster_will_attack_target(sim, attacker, target) {
            *slot = Some(target);
        }
    }
    hits
}

/// Push `defender` one cell directly away from `attacker` if that cell is
/// open.
pub fn process_stagger_hit(sim: &mut Sim, attacker: CreatureId, defender: CreatureId) {
    let (Some(att), Some(def)) = (sim.roster.get(attacker), sim.roster.get(defender)) else {
        return;
    };
    if def.has_behavior(BehaviorFlags::INVULNERABLE | BehaviorFlags::IMMOBILE | BehaviorFlags::INANIMATE)
        || def.is_captive()
        || sim.map.cell_has_terrain_flag(def.pos, TerrainFlags::OBSTRUCTS_PASSABILITY)
    {
        return;
    }
    let (dx, dy) = def.pos.unit_away_from(att.pos);
    let to = def.pos.offset(dx, dy);
    if sim.map.in_bounds(to)
        && !sim.map.cell_has_terrain_flag(to, TerrainFlags::OBSTRUCTS_PASSABILITY)
        && sim.monster_at(to).is_none()
    {
        set_monster_location(sim, defender, to);
    }
}

/// How hard a surviving defender was hit, as a verb from the attacker's
/// list. `hit_percentile` places the damage within the attacker's range:
/// the list is split into equal bands and the band picks the verb.
fn attack_verb(sim: &Sim, attacker: CreatureId, hit_percentile: i32) -> String {
    let is_player = sim.is_player(attacker);
    if !is_player && (sim.player_status(StatusKind::Hallucinating) > 0 || !sim.can_see_monster(attacker)) {
        return "hits".to_string();
    }
    if is_player && sim.weapon().is_none() {
        return "punch".to_string();
    }
    let verbs = sim.roster.get(attacker).map(|a| a.info.attack_verbs.as_slice()).unwrap_or_default();
    let count = verbs.len().min(MAX_ATTACK_VERBS) as i32;
    if count == 0 {
        return (if is_player { "hit" } else { "hits" }).to_string();
    }
    let increment = 100 / count;
    let band = hit_percentile.clamp(0, increment * count - 1) / increment;
    resolve_pronouns(sim, &verbs[band as usize], attacker)
}

/// Where `damage` falls within the attacker's damage range, in percent
fn hit_percentile(sim: &Sim, attacker: CreatureId, damage: i32) -> i32 {
    let Some(range) = sim.roster.get(attacker).map(|a| a.info.damage) else {
        return 0;
    };
    let adjust = monster_damage_adjustment(sim, attacker);
    let lower = (Fixed::from_int(range.lower as i64) * adjust).trunc() as i32;
    let span = (Fixed::from_int((range.upper - range.lower) as i64) * adjust).trunc() as i32;
    (damage - lower).max(0) * 100 / span.max(1)
}

/// Resolve one melee attack. Returns true if the blow landed.
///
/// A hit rolls damage, applies the defender's armor runic when the
/// defender is the player, and then, in order: the kill or the hit report,
/// staggering, special abilities, the defender's reaction, the weapon
/// runic, splitting, weapon auto-identification and weapon wear. Sleeping,
/// paralyzed and unaware defenders are hit automatically for triple
/// damage, or five times with a sneak-attack weapon, as are lunges.
pub fn attack(sim: &mut Sim, attacker: CreatureId, defender: CreatureId, lunge: bool) -> bool {
    let attacker_is_player = sim.is_player(attacker);
    let defender_is_player = sim.is_player(defender);
    let (Some(att), Some(def)) = (sim.roster.get(attacker), sim.roster.get(defender)) else {
        stale_handle(if sim.roster.contains(attacker) { defender } else { attacker });
        return false;
    };

    if att.has_ability(AbilityFlags::KAMIKAZE) {
        kill_creature(sim, attacker, false);
        return true;
    }
    if def.is_levitating() && att.has_behavior(BehaviorFlags::RESTRICTED_TO_LIQUID) {
        return false;
    }

    let attacker_state = att.state;
    let att_damage = att.info.damage;
    let poisons = att.has_ability(AbilityFlags::POISONS);
    let seizes = att.has_ability(AbilityFlags::SEIZES);
    let already_seizing =
        att.has_bookkeeping(BookkeepingFlags::SEIZING) && def.has_bookkeeping(BookkeepingFlags::SEIZED);
    let adjacent = distance_between(att.pos, def.pos) == 1 && !sim.map.diagonal_blocked(att.pos, def.pos);
    let attacker_submerged = att.is_submerged();

    let (sneak_attack, defender_was_asleep, defender_was_paralyzed) = if def.is_inanimate() {
        (false, false, false)
    } else {
        (
            !defender_is_player
                && attacker_is_player
                && def.state == CreatureState::Wandering
                && !def.is_submerged(),
            !defender_is_player && def.state == CreatureState::Sleeping,
            def.is_paralyzed(),
        )
    };
    let defender_inanimate = def.is_inanimate();
    let defender_immune = def.is_immune_to_weapons() || def.is_invulnerable();
    let defender_stuck = def.status(StatusKind::Stuck) > 0 || def.is_captive();
    let degrades_weapon = def.has_behavior(BehaviorFlags::DEFEND_DEGRADE_WEAPON);
    let defender_classes = def.info.classes;

    let sight_unseen = !sim.can_see_monster(attacker) && !sim.can_see_monster(defender);

    if let Some(d) = sim.roster.get_mut(defender) {
        d.status.set(StatusKind::Entranced, 0);
        if d.status(StatusKind::MagicalFear) > 0 {
            d.status.set(StatusKind::MagicalFear, 1);
        }
    }
    if !attacker_is_player
        && defender_is_player
        && attacker_state == CreatureState::Wandering
        && let Some(a) = sim.roster.get_mut(attacker)
    {
        a.state = CreatureState::TrackingScent;
    }

    let attacker_name = monster_name(sim, attacker, true);
    let defender_name = monster_name(sim, defender, true);

    if seizes && !already_seizing && adjacent {
        if let Some(a) = sim.roster.get_mut(attacker) {
            a.bookkeeping |= BookkeepingFlags::SEIZING;
            if defender_is_player && attacker_submerged {
                a.bookkeeping.remove(BookkeepingFlags::SUBMERGED);
            }
        }
        if let Some(d) = sim.roster.get_mut(defender) {
            d.bookkeeping |= BookkeepingFlags::SEIZED;
        }
        if sim.can_see_monster(attacker) || sim.can_see_monster(defender) {
            let target = if defender_is_player { "your legs".to_string() } else { defender_name };
            sim.message(&format!("{} seizes {}!", attacker_name, target), MessageFlags::empty());
        }
        return false;
    }

    let unaware = sneak_attack || defender_was_asleep || defender_was_paralyzed;
    if !(unaware || lunge || attack_hit(sim, attacker, defender)) {
        report_miss(sim, &attacker_name, &defender_name, sight_unseen);
        return false;
    }

    let mut damage = if defender_immune {
        0
    } else {
        let roll = Fixed::from_int(sim.rng.clump(att_damage) as i64);
        (roll * monster_damage_adjustment(sim, attacker)).trunc() as i32
    };

    if unaware && !defender_is_player {
        // still flat-footed: no reply this turn
        if let Some(d) = sim.roster.get_mut(defender) {
            d.ticks_until_turn += d.movement_duration.max(d.attack_duration);
            if d.state != CreatureState::Ally {
                d.state = CreatureState::TrackingScent;
            }
        }
    }
    if unaware || lunge {
        let sneak_weapon =
            attacker_is_player && sim.weapon().is_some_and(|w| w.has_flag(ItemFlags::SNEAK_ATTACK_BONUS));
        damage *= if sneak_weapon { 5 } else { 3 };
    }

    let mut armor_report = String::new();
    if defender_is_player && sim.armor().is_some_and(|a| a.has_flag(ItemFlags::RUNIC)) {
        armor_report = apply_armor_runic_effect(sim, attacker, &mut damage, true);
    }

    if attacker_is_player && sim.rogue.reaping != 0 && !defender_inanimate && !defender_immune {
        let hp = sim.roster.get(defender).map(|d| d.current_hp).unwrap_or(0);
        let bound = damage.min(hp) * sim.rogue.reaping;
        let reaped = if sim.rogue.reaping > 0 {
            sim.rng.uniform_range(0, bound)
        } else {
            sim.rng.uniform_range(bound, 0)
        };
        if reaped != 0 {
            // staff recharging lives outside the simulation core
            debug!(reaped, "reaping");
        }
    }

    let explication = if damage == 0 {
        format!(" but {} no damage", if attacker_is_player { "do" } else { "does" })
    } else if lunge {
        " with a vicious lunge attack".to_string()
    } else if defender_was_paralyzed {
        format!(" while $HESHE {} paralyzed", if defender_is_player { "are" } else { "is" })
    } else if defender_was_asleep {
        " in $HISHER sleep".to_string()
    } else if sneak_attack {
        ", catching $HIMHER unaware".to_string()
    } else if defender_stuck {
        let who = if sim.can_see_monster(defender) { "$HESHE" } else { "it" };
        format!(" while {} dangle{} helplessly", who, if defender_is_player { "" } else { "s" })
    } else {
        String::new()
    };
    let explication = resolve_pronouns(sim, &explication, defender);

    let mut poison_damage = 0;
    if poisons && damage > 0 {
        poison_damage = damage;
        damage = 1;
    }

    if inflict_damage(sim, Some(attacker), defender, damage, false) {
        let verb = if defender_inanimate {
            "destroyed"
        } else if unaware || lunge {
            "dispatched"
        } else {
            "defeated"
        };
        if sight_unseen {
            let what = if defender_inanimate { "get destroyed" } else { "die" };
            sim.combat_message(&format!("you hear something {} in combat", what), MessageColor::Plain);
        } else {
            let color = if damage > 0 { color_for_victim(sim, defender) } else { MessageColor::Plain };
            sim.combat_message(
                &format!("{} {} {}{}", attacker_name, verb, defender_name, explication),
                color,
            );
        }
        kill_creature(sim, defender, false);
        if defender_is_player {
            let killer = sim.roster.get(attacker).map(|a| a.info.name.clone()).unwrap_or_default();
            sim.game_over(&killer);
            return true;
        }
    } else {
        if sim.can_see_monster(attacker) || sim.can_see_monster(defender) {
            let verb = attack_verb(sim, attacker, hit_percentile(sim, attacker, damage));
            sim.combat_message(
                &format!("{} {} {}{}", attacker_name, verb, defender_name, explication),
                color_for_victim(sim, defender),
            );
        } else if !sim.heard_combat_this_turn {
            sim.heard_combat_this_turn = true;
            sim.combat_message("you hear combat in the distance", MessageColor::Plain);
        }
        if attacker_is_player && sim.weapon().is_some_and(|w| w.has_flag(ItemFlags::ATTACKS_STAGGER)) {
            process_stagger_hit(sim, attacker, defender);
        }
        special_hit(sim, attacker, defender, if poisons { poison_damage } else { damage });
        if !armor_report.is_empty() {
            sim.message(&armor_report, MessageFlags::empty());
        }
    }

    moral_attack(sim, attacker, defender);

    if attacker_is_player && sim.weapon().is_some_and(|w| w.has_flag(ItemFlags::RUNIC)) {
        magic_weapon_hit(sim, defender, unaware);
    }

    split_monster(sim, defender, attacker);

    if attacker_is_player
        && sim
            .roster
            .get(defender)
            .is_some_and(|d| d.is_dying() && d.has_bookkeeping(BookkeepingFlags::HAS_SOUL))
    {
        decrement_weapon_auto_id_timer(sim);
    }

    if degrades_weapon && attacker_is_player {
        degrade_weapon(sim, defender_classes);
    }
    true
}

fn report_miss(sim: &mut Sim, attacker_name: &str, defender_name: &str, sight_unseen: bool) {
    if sight_unseen {
        if !sim.heard_combat_this_turn {
            sim.heard_combat_this_turn = true;
            sim.combat_message("you hear combat in the distance", MessageColor::Plain);
        }
        return;
    }
    sim.combat_message(&format!("{} missed {}", attacker_name, defender_name), MessageColor::Plain);
}

/// Acidic defenders eat away at the weapon that strikes them. A slaying
/// weapon is spared by its own quarry.
fn degrade_weapon(sim: &mut Sim, defender_classes: crate::creature::MonsterClasses) {
    let Some(weapon) = sim.weapon_mut() else {
        return;
    };
    if weapon.has_flag(ItemFlags::PROTECTED)
        || (weapon.weapon_runic() == Some(WeaponRunic::Slaying) && weapon.slays(defender_classes))
        || weapon.enchant1 < MIN_DEGRADE_ENCHANT
    {
        return;
    }
    weapon.enchant1 -= 1;
    let name = weapon.kind_name();
    sim.recalculate_equipment_bonuses();
    sim.messages
        .message_colored(&format!("your {} weakens!", name), MessageColor::Bad, MessageFlags::empty());
}
