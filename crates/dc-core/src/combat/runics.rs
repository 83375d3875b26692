//! Weapon and armor runics, and learning what an item is by using it

use tracing::{debug, info};

use super::damage::{inflict_damage, inflict_lethal_damage};
use super::death::kill_creature;
use super::moral::moral_attack;
use super::split::split_monster;
use crate::bolt::{BoltKind, zap};
use crate::consts::{
    ARMOR_BURDEN_CHANCE, ARMOR_IMMOLATION_CHANCE, ARMOR_MULTIPLICITY_CHANCE, SPECTRAL_ACCURACY_PER_ENCHANT,
    SPECTRAL_BLADE_KIND, SPECTRAL_NAME_LIMIT, SPECTRAL_WEAPON_NAME_LIMIT,
};
use crate::creature::relations::{clone_monster, heal, monsters_are_enemies, slow};
use crate::creature::{
    AbilityFlags, BehaviorFlags, BookkeepingFlags, CreatureId, CreatureInfo, CreatureState, StatusKind,
};
use crate::events::SimEvent;
use crate::fixed::Fixed;
use crate::geom::{NB_DIRS, Pos, distance_between};
use crate::item::power::{
    armor_absorption_max, armor_image_count, armor_reprisal_percent, runic_weapon_chance,
    weapon_confusion_duration, weapon_force_distance, weapon_image_count, weapon_image_duration,
    weapon_paralysis_duration, weapon_slow_duration,
};
use crate::item::{ArmorRunic, ItemFlags, ItemId, WeaponKind, WeaponRunic};
use crate::map::{DungeonFeature, TerrainFlags};
use crate::messages::{MessageColor, MessageFlags, color_for_victim, monster_name, resolve_pronouns};
use crate::rng::RandomRange;
use crate::sim::{Sim, stale_handle};
use crate::telemetry::TelemetryEvent;

/// Learn what an item in the pack is.
///
/// Runic weapons and armor reveal their runic; everything else becomes
/// identified. A message is printed when the item's name changes as a
/// result.
pub fn auto_identify(sim: &mut Sim, id: ItemId) {
    let Some(item) = sim.pack.get_mut(id) else {
        debug!(item = id.0, "identify: item is not in the pack");
        return;
    };
    let runic = (item.is_weapon() || item.is_armor()) && item.has_flag(ItemFlags::RUNIC);
    let hidden_runic = runic && !item.has_flag(ItemFlags::RUNIC_IDENTIFIED);
    // a known runic leaves the enchantment to the kill and wear countdowns
    if !hidden_runic && (runic || item.has_flag(ItemFlags::IDENTIFIED)) {
        return;
    }
    let old_name = item.name(false);
    if hidden_runic {
        item.flags |= ItemFlags::RUNIC_IDENTIFIED | ItemFlags::RUNIC_HINTED;
    } else {
        item.flags |= ItemFlags::IDENTIFIED;
    }
    let new_name = item.name(true);
    if item.name(false) != old_name {
        sim.message(&format!("(your {} must be {}.)", old_name, new_name), MessageFlags::empty());
    }
    announce_identified(sim, id);
}

fn announce_identified(sim: &mut Sim, id: ItemId) {
    let Some(item) = sim.pack.get(id) else {
        return;
    };
    let item_name = item.name(false);
    let category = item.category.to_string();
    info!(item = id.0, name = %item_name, "item identified");
    sim.emit(SimEvent::ItemIdentified { item: id });
    sim.telemetry(TelemetryEvent::ItemDiscovered { item_name, category });
}

/// Count down the wielded weapon's kills-to-identify. Called after the
/// player kills a creature with a soul.
pub fn decrement_weapon_auto_id_timer(sim: &mut Sim) {
    let Some(weapon) = sim.weapon_mut() else {
        return;
    };
    if weapon.has_flag(ItemFlags::IDENTIFIED) {
        return;
    }
    weapon.charges -= 1;
    if weapon.charges > 0 {
        return;
    }
    weapon.flags |= ItemFlags::IDENTIFIED;
    let id = weapon.id;
    let short = weapon.kind_name();
    let full = weapon.name(true);
    let pronoun = if weapon.quantity > 1 { "they are" } else { "it is" };

    sim.messages.message_colored(
        &format!("you are now familiar enough with your {} to identify it.", short),
        MessageColor::Good,
        MessageFlags::empty(),
    );
    sim.message(&format!("{} {}.", pronoun, full), MessageFlags::empty());
    announce_identified(sim, id);
}

/// A spectral blade: one hit point, flying, gone when negated.
pub(crate) fn spectral_info(name: &str) -> CreatureInfo {
    CreatureInfo::new(SPECTRAL_BLADE_KIND, name, 1, 0, 70, RandomRange::new(1, 1, 1))
        .with_behaviors(
            BehaviorFlags::INANIMATE
                | BehaviorFlags::NEVER_SLEEPS
                | BehaviorFlags::FLIES
                | BehaviorFlags::WILL_NOT_USE_STAIRS
                | BehaviorFlags::DIES_IF_NEGATED
                | BehaviorFlags::IMMUNE_TO_WEBS
                | BehaviorFlags::NOT_LISTED_IN_SIDEBAR,
        )
        .with_speed(50, 100)
}

/// Place a short-lived follower of `leader` on the nearest free cell to
/// `near`. Returns `None` when there is no room.
pub(crate) fn summon_spectral(
    sim: &mut Sim,
    info: CreatureInfo,
    near: Pos,
    leader: Option<CreatureId>,
    allied: bool,
    lifespan: i32,
) -> Option<CreatureId> {
    let spot = sim.qualifying_loc_near(near, info.avoided_terrain(), false)?;
    let id = sim.spawn_monster(info, spot);
    if let Some(c) = sim.roster.get_mut(id) {
        c.bookkeeping |=
            BookkeepingFlags::FOLLOWER | BookkeepingFlags::BOUND_TO_LEADER | BookkeepingFlags::DOES_NOT_TRACK_LEADER;
        c.leader = leader;
        c.state = if allied { CreatureState::Ally } else { CreatureState::TrackingScent };
        c.status.set_both(StatusKind::LifespanRemaining, lifespan);
    }
    Some(id)
}

/// Roll the wielded weapon's runic against `defender` after a hit.
///
/// `backstabbed` doubles the chance of a proc, up to halfway between the
/// normal chance and certainty. Dying defenders only trigger speed and
/// multiplicity.
pub fn magic_weapon_hit(sim: &mut Sim, defender: CreatureId, backstabbed: bool) {
    let Some(weapon) = sim.weapon() else {
        return;
    };
    let Some(runic) = weapon.weapon_runic() else {
        return;
    };
    let Some(def) = sim.roster.get(defender) else {
        return stale_handle(defender);
    };
    if def.is_dying() && !matches!(runic, WeaponRunic::Speed | WeaponRunic::Multiplicity) {
        return;
    }
    let weapon_id = weapon.id;
    let weapon_kind = WeaponKind::from_index(weapon.kind);
    let weapon_name = weapon.kind_name();
    let weapon_flags = weapon.flags;
    let enchant = sim.net_enchant(weapon);
    let chance = match runic {
        WeaponRunic::Slaying if weapon.slays(def.info.classes) => 100,
        WeaponRunic::Slaying => 0,
        _ if def.is_inanimate() || def.is_invulnerable() => 0,
        _ => {
            let chance = runic_weapon_chance(weapon, enchant);
            if backstabbed && chance < 100 {
                (chance * 2).min((chance + 100) / 2)
            } else {
                chance
            }
        }
    };
    let submerged = def.is_submerged();
    let inanimate = def.is_inanimate();
    if chance <= 0 || !sim.rng.percent(chance) {
        return;
    }
    debug!(%defender, %runic, chance, "weapon runic fired");

    let mut auto_id = !submerged;
    let name = monster_name(sim, defender, true);
    let color = color_for_victim(sim, defender);
    match runic {
        WeaponRunic::Speed => {
            if let Some(p) = sim.player_mut()
                && p.ticks_until_turn != -1
            {
                p.ticks_until_turn = -1;
                sim.message(
                    &format!("your {} trembles and time freezes for a moment", weapon_name),
                    MessageFlags::empty(),
                );
            }
        }
        WeaponRunic::Slaying | WeaponRunic::Quietus => {
            let player = sim.player_id();
            inflict_lethal_damage(sim, Some(player), defender);
            let verb = if inanimate { "shatters" } else { "dies" };
            sim.combat_message(&format!("{} suddenly {}", name, verb), color);
            kill_creature(sim, defender, false);
        }
        WeaponRunic::Paralysis => {
            let duration = weapon_paralysis_duration(enchant);
            if let Some(c) = sim.roster.get_mut(defender) {
                let value = c.status(StatusKind::Paralyzed).max(duration);
                c.status.set_both(StatusKind::Paralyzed, value);
                sim.emit(SimEvent::StatusChange {
                    creature: defender,
                    status: StatusKind::Paralyzed,
                    value,
                });
            }
            if sim.can_directly_see_monster(defender) {
                sim.combat_message(&format!("{} is frozen in place", name), color);
            }
        }
        WeaponRunic::Multiplicity => {
            let image_name = match weapon_kind {
                _ if weapon_name.len() <= SPECTRAL_WEAPON_NAME_LIMIT => weapon_name.clone(),
                Some(WeaponKind::Broadsword) => "sword".to_string(),
                Some(WeaponKind::WarHammer) => "hammer".to_string(),
                Some(WeaponKind::WarPike) => "pike".to_string(),
                Some(WeaponKind::WarAxe) => "axe".to_string(),
                _ => "weapon".to_string(),
            };
            let spawned = spawn_weapon_images(sim, defender, &image_name, weapon_flags, enchant);
            if spawned > 0 {
                let text = if spawned == 1 {
                    format!("your {} emits a flash of light, and a spectral duplicate appears!", weapon_name)
                } else {
                    format!("your {} emits a flash of light, and spectral duplicates appear!", weapon_name)
                };
                sim.message(&text, MessageFlags::empty());
            }
        }
        WeaponRunic::Slowing => {
            slow(sim, defender, weapon_slow_duration(enchant));
            if sim.can_directly_see_monster(defender) {
                sim.combat_message(&format!("{} slows down", name), color);
            }
        }
        WeaponRunic::Confusion => {
            let duration = weapon_confusion_duration(enchant);
            if let Some(c) = sim.roster.get_mut(defender) {
                let value = c.status(StatusKind::Confused).max(duration);
                c.status.set_both(StatusKind::Confused, value);
            }
            if sim.can_directly_see_monster(defender) {
                sim.combat_message(&format!("{} looks very confused", name), color);
            }
        }
        WeaponRunic::Force => {
            auto_id = force_weapon_hit(sim, defender);
        }
        WeaponRunic::Mercy => {
            let percent = sim.config.mercy_heal_percent;
            heal(sim, defender, percent, false);
        }
        WeaponRunic::Plenty => {
            clone_monster(sim, defender, true, true);
        }
    }
    if auto_id {
        auto_identify(sim, weapon_id);
    }
}

/// Allied images of the player's weapon around `defender`; returns how
/// many found room.
fn spawn_weapon_images(
    sim: &mut Sim,
    defender: CreatureId,
    weapon_name: &str,
    weapon_flags: ItemFlags,
    enchant: Fixed,
) -> i32 {
    let player = sim.player_id();
    let Some(p) = sim.player() else {
        return 0;
    };
    let accuracy = p.info.accuracy + SPECTRAL_ACCURACY_PER_ENCHANT * enchant.trunc() as i32;
    let damage = p.info.damage;
    let near = sim.roster.get(defender).map(|d| d.pos).unwrap_or(Pos::INVALID);
    let lifespan = weapon_image_duration(enchant);

    let mut spawned = 0;
    for _ in 0..weapon_image_count(enchant) {
        let mut info = spectral_info(&format!("spectral {}", weapon_name));
        info.accuracy = accuracy;
        info.damage = damage;
        if weapon_flags.contains(ItemFlags::ATTACKS_STAGGER) {
            info.attack_duration *= 2;
            info.abilities |= AbilityFlags::ATTACKS_STAGGER;
        }
        if weapon_flags.contains(ItemFlags::ATTACKS_QUICKLY) {
            info.attack_duration /= 2;
        }
        if weapon_flags.contains(ItemFlags::ATTACKS_PENETRATE) {
            info.abilities |= AbilityFlags::ATTACKS_PENETRATE;
        }
        if weapon_flags.contains(ItemFlags::ATTACKS_ALL_ADJACENT) {
            info.abilities |= AbilityFlags::ATTACKS_ALL_ADJACENT;
        }
        if weapon_flags.contains(ItemFlags::ATTACKS_EXTEND) {
            info.abilities |= AbilityFlags::ATTACKS_EXTEND;
        }
        let Some(image) = summon_spectral(sim, info, near, Some(player), true, lifespan) else {
            break;
        };
        if let Some(c) = sim.roster.get_mut(image) {
            c.bookkeeping |= BookkeepingFlags::TELEPATHICALLY_REVEALED;
            c.ticks_until_turn = 100;
        }
        spawned += 1;
    }
    spawned
}

/// Knock `defender` away from the player with a blink bolt. If it is
/// stopped short by a wall or another creature, both take damage equal to
/// the distance flown. Returns true if the player saw enough to recognize
/// the runic.
pub fn force_weapon_hit(sim: &mut Sim, defender: CreatureId) -> bool {
    let Some(weapon) = sim.weapon() else {
        return false;
    };
    let enchant = sim.net_enchant(weapon);
    let Some(def) = sim.roster.get(defender) else {
        stale_handle(defender);
        return false;
    };
    let old = def.pos;
    let (dx, dy) = old.unit_away_from(sim.player_pos());
    let launch = old.offset(dx, dy);
    let name = monster_name(sim, defender, true);
    let player = sim.player_id();
    let mut auto_id = false;

    if sim.can_directly_see_monster(defender)
        && !sim.map.cell_has_terrain_flag(launch, TerrainFlags::OBSTRUCTS_BOLTS)
        && sim.monster_at(launch).is_none()
    {
        sim.combat_message(
            &format!("you launch {} backward with the force of your blow", name),
            color_for_victim(sim, defender),
        );
        auto_id = true;
    }
    let bolt = BoltKind::Blinking.bolt().with_magnitude((enchant.trunc() as i32).max(1));
    zap(sim, old, launch, &bolt);

    let Some(def) = sim.roster.get(defender) else {
        return auto_id;
    };
    let landed = def.pos;
    let flown = distance_between(old, landed);
    if def.is_dying() || flown == 0 || flown >= weapon_force_distance(enchant) {
        return auto_id;
    }
    let immune = def.is_immune_to_weapons() || def.is_invulnerable();
    let inanimate = def.is_inanimate();
    let defender_kind_name = def.info.name.clone();
    let beyond = landed.offset(dx, dy);
    let other = sim.monster_at(beyond).filter(|&o| o != defender);
    if other.is_none() && !sim.map.cell_has_terrain_flag(beyond, TerrainFlags::OBSTRUCTS_PASSABILITY) {
        // stopped by something other than a collision
        return auto_id;
    }
    let obstacle = match other {
        Some(o) => monster_name(sim, o, true),
        None => sim.map.describe(beyond),
    };

    let mut first_died = false;
    if !immune && inflict_damage(sim, None, defender, flown, false) {
        if sim.can_directly_see_monster(defender) {
            first_died = true;
            let verb = if inanimate { "is destroyed" } else { "dies" };
            sim.combat_message(
                &format!("{} {} on impact with {}", name, verb, obstacle),
                color_for_victim(sim, defender),
            );
            auto_id = true;
        }
        kill_creature(sim, defender, false);
    } else if sim.can_directly_see_monster(defender) {
        sim.combat_message(
            &format!("{} slams against {}", name, obstacle),
            color_for_victim(sim, defender),
        );
        auto_id = true;
    }
    moral_attack(sim, player, defender);
    split_monster(sim, defender, player);

    let Some(other) = other else {
        return auto_id;
    };
    let Some(o) = sim.roster.get(other) else {
        return auto_id;
    };
    if o.is_immune_to_weapons() || o.is_invulnerable() {
        return auto_id;
    }
    let other_inanimate = o.is_inanimate();
    if inflict_damage(sim, None, other, flown, false) {
        if sim.can_directly_see_monster(other) {
            let text = format!(
                "{} {}{} when {} slams into $HIMHER",
                obstacle,
                if first_died { "also " } else { "" },
                if other_inanimate { "is destroyed" } else { "dies" },
                name
            );
            let text = resolve_pronouns(sim, &text, other);
            sim.combat_message(&text, color_for_victim(sim, other));
            auto_id = true;
        }
        kill_creature(sim, other, false);
        if sim.is_player(other) {
            sim.game_over(&format!("Killed by a flying {}", defender_kind_name));
        }
    }
    if !sim.roster.get(other).is_some_and(|o| o.is_ally()) && !sim.is_player(other) {
        moral_attack(sim, player, other);
        split_monster(sim, other, player);
    }
    auto_id
}

/// Apply the worn armor's runic to a blow against the player.
///
/// `damage` is adjusted in place. The returned text, possibly empty, is
/// shown after the hit is reported; immolation announces itself at once.
pub fn apply_armor_runic_effect(sim: &mut Sim, attacker: CreatureId, damage: &mut i32, melee: bool) -> String {
    let Some(armor) = sim.armor() else {
        return String::new();
    };
    let Some(runic) = armor.armor_runic() else {
        return String::new();
    };
    let armor_id = armor.id;
    let known = armor.has_flag(ItemFlags::RUNIC_IDENTIFIED);
    let armor_name = armor.kind_name();
    let vorpal = armor.vorpal_enemy;
    let enchant = sim.net_enchant(armor);
    let Some(att) = sim.roster.get(attacker) else {
        stale_handle(attacker);
        return String::new();
    };
    let unfeeling = att.is_inanimate() || att.is_invulnerable();
    let classes = att.info.classes;
    let attacker_name = monster_name(sim, attacker, true);
    let player = sim.player_id();

    let mut discovered = false;
    let mut report = String::new();
    match runic {
        ArmorRunic::Multiplicity => {
            if melee && !unfeeling && sim.rng.percent(ARMOR_MULTIPLICITY_CHANCE) {
                spawn_armor_images(sim, attacker, enchant);
                discovered = true;
                report = format!("your {} flashes, and spectral images of {} appear!", armor_name, attacker_name);
            }
        }
        ArmorRunic::Mutuality => {
            if *damage > 0 {
                let victims = adjacent_enemies(sim, attacker);
                if let Some(&first) = victims.first() {
                    let count = victims.len() as i32;
                    let shared = (*damage + count) / (count + 1);
                    let first_name = monster_name(sim, first, true);
                    for &v in &victims {
                        if sim.roster.get(v).is_none_or(|c| c.is_dying()) {
                            continue;
                        }
                        let victim_name = monster_name(sim, v, true);
                        let inanimate = sim.roster.get(v).is_some_and(|c| c.is_inanimate());
                        if inflict_damage(sim, Some(player), v, shared, true) {
                            if sim.can_see_monster(v) {
                                let verb = if inanimate { "is destroyed" } else { "dies" };
                                sim.combat_message(
                                    &format!("{} {}", victim_name, verb),
                                    color_for_victim(sim, v),
                                );
                            }
                            kill_creature(sim, v, false);
                        }
                    }
                    if !known {
                        let sharers = if count == 1 {
                            first_name
                        } else {
                            "the other adjacent enemies".to_string()
                        };
                        report = format!("your {} pulses, and the damage is shared with {}!", armor_name, sharers);
                    }
                    discovered = true;
                    *damage = shared;
                }
            }
        }
        ArmorRunic::Absorption => {
            *damage -= sim.rng.uniform_range(1, armor_absorption_max(enchant));
            if *damage <= 0 {
                *damage = 0;
                discovered = true;
                if !known {
                    report = format!("your {} pulses and absorbs the blow!", armor_name);
                }
            }
        }
        ArmorRunic::Reprisal => {
            if melee && !unfeeling {
                let reprisal = (armor_reprisal_percent(enchant) * *damage / 100).max(1);
                if inflict_damage(sim, Some(player), attacker, reprisal, true) {
                    if sim.can_see_monster(attacker) {
                        report = format!("your {} pulses and {} drops dead!", armor_name, attacker_name);
                        discovered = true;
                    }
                    kill_creature(sim, attacker, false);
                } else if !known && sim.can_see_monster(attacker) {
                    report = format!("your {} pulses and {} shudders in pain!", armor_name, attacker_name);
                    discovered = true;
                }
            }
        }
        ArmorRunic::Immunity => {
            if vorpal.is_some_and(|v| classes.has_class(v)) {
                *damage = 0;
                discovered = true;
            }
        }
        ArmorRunic::Burden => {
            if sim.rng.percent(ARMOR_BURDEN_CHANCE) {
                if let Some(a) = sim.armor_mut() {
                    a.strength_required += 1;
                }
                sim.recalculate_equipment_bonuses();
                report = format!("your {} suddenly feels heavier!", armor_name);
                discovered = true;
            }
        }
        ArmorRunic::Vulnerability => {
            *damage *= 2;
            if !known {
                report = format!("your {} pulses and you are wracked with pain!", armor_name);
                discovered = true;
            }
        }
        ArmorRunic::Immolation => {
            if sim.rng.percent(ARMOR_IMMOLATION_CHANCE) {
                let flags = if known { MessageFlags::empty() } else { MessageFlags::REQUIRE_ACK };
                sim.message(&format!("flames suddenly explode out of your {}!", armor_name), flags);
                let at = sim.player_pos();
                sim.spawn_feature(at, DungeonFeature::ArmorImmolation, None);
                discovered = true;
            }
        }
        ArmorRunic::Reflection | ArmorRunic::Respiration | ArmorRunic::Dampening => {}
    }
    if discovered && !known {
        auto_identify(sim, armor_id);
    }
    report
}

/// Enemies of the player standing next to it, other than `attacker`, that
/// a weapon could hurt
fn adjacent_enemies(sim: &Sim, attacker: CreatureId) -> Vec<CreatureId> {
    let player = sim.player_id();
    let origin = sim.player_pos();
    NB_DIRS
        .iter()
        .filter_map(|&(dx, dy)| sim.monster_at(origin.offset(dx, dy)))
        .filter(|&m| m != attacker && monsters_are_enemies(sim, player, m))
        .filter(|&m| {
            sim.roster
                .get(m)
                .is_some_and(|c| !c.is_immune_to_weapons() && !c.is_invulnerable() && !c.is_dying())
        })
        .collect()
}

/// One-hit-point allied copies of `attacker` that fade after a few turns
fn spawn_armor_images(sim: &mut Sim, attacker: CreatureId, enchant: Fixed) {
    let player = sim.player_id();
    let lifespan = sim.config.spectral_image_lifespan;
    for _ in 0..armor_image_count(enchant) {
        let Some(image) = clone_monster(sim, attacker, false, true) else {
            break;
        };
        let Some(c) = sim.roster.get_mut(image) else {
            continue;
        };
        c.bookkeeping |= BookkeepingFlags::FOLLOWER
            | BookkeepingFlags::BOUND_TO_LEADER
            | BookkeepingFlags::DOES_NOT_TRACK_LEADER
            | BookkeepingFlags::TELEPATHICALLY_REVEALED;
        c.bookkeeping
            .remove(BookkeepingFlags::JUST_SUMMONED | BookkeepingFlags::SEIZED | BookkeepingFlags::SEIZING);
        c.info.behaviors |= BehaviorFlags::DIES_IF_NEGATED;
        c.info.abilities.remove(AbilityFlags::CAST_SUMMON | AbilityFlags::DF_ON_DEATH);
        c.leader = Some(player);
        c.state = CreatureState::Ally;
        c.status.set_both(StatusKind::Discordant, 0);
        c.status.set_both(StatusKind::LifespanRemaining, lifespan);
        c.ticks_until_turn = 100;
        c.info.max_hp = 1;
        c.current_hp = 1;
        c.info.defense = 0;
        c.info.name = if c.info.name.len() <= SPECTRAL_NAME_LIMIT {
            format!("spectral {}", c.info.name)
        } else {
            "spectral clone".to_string()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::MonsterClass;
    use crate::creature::test_support::goblin_info;
    use crate::item::{ArmorKind, Item, ItemCategory, StaffKind};
    use crate::sim::test_support::*;
    use crate::telemetry::ChannelSink;

    fn runic_dagger(runic: WeaponRunic, enchant: i32) -> Item {
        Item::weapon(ItemId(1), WeaponKind::Dagger)
            .with_enchant(enchant)
            .with_weapon_runic(runic, None)
    }

    #[test]
    fn test_auto_identify_reveals_runic_once() {
        let mut sim = sim();
        let (sink, rx) = ChannelSink::new();
        sim.set_telemetry(Box::new(sink));
        let id = wield(&mut sim, runic_dagger(WeaponRunic::Paralysis, 2));
        auto_identify(&mut sim, id);
        auto_identify(&mut sim, id);

        let item = sim.pack.get(id).unwrap();
        assert!(item.has_flag(ItemFlags::RUNIC_IDENTIFIED));
        assert!(sim.messages.contains("(your dagger must be a dagger of paralysis.)"));
        let identified = sim
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::ItemIdentified { .. }))
            .count();
        assert_eq!(identified, 1);
        let got: Vec<TelemetryEvent> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![TelemetryEvent::ItemDiscovered {
                item_name: "dagger of paralysis".into(),
                category: ItemCategory::Weapon.to_string(),
            }]
        );
    }

    #[test]
    fn test_plain_items_identify_quietly_when_name_is_unchanged() {
        let mut sim = sim();
        let id = sim.add_to_pack(Item::staff(ItemId(3), StaffKind::Firebolt, 2)).unwrap();
        auto_identify(&mut sim, id);
        assert!(sim.pack.get(id).unwrap().has_flag(ItemFlags::IDENTIFIED));
        assert!(sim.messages.archive().is_empty());
    }

    #[test]
    fn test_weapon_identifies_after_enough_kills() {
        let mut sim = sim();
        let id = wield(&mut sim, Item::weapon(ItemId(1), WeaponKind::Sword));
        sim.pack.get_mut(id).unwrap().charges = 2;
        decrement_weapon_auto_id_timer(&mut sim);
        assert!(!sim.pack.get(id).unwrap().has_flag(ItemFlags::IDENTIFIED));
        decrement_weapon_auto_id_timer(&mut sim);
        assert!(sim.pack.get(id).unwrap().has_flag(ItemFlags::IDENTIFIED));
        assert!(sim.messages.contains("familiar enough with your sword"));
        assert!(sim.messages.contains("It is a +0 sword."));
    }

    #[test]
    fn test_quietus_kills_outright() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        // slaying never misses its class, so no roll is involved
        wield(
            &mut sim,
            Item::weapon(ItemId(1), WeaponKind::Dagger).with_weapon_runic(WeaponRunic::Slaying, Some(MonsterClass::Goblin)),
        );
        magic_weapon_hit(&mut sim, g, false);
        sim.messages.display_combat_text();
        assert!(creature(&sim, g).has_died());
        assert!(sim.messages.contains("The goblin suddenly dies"));
        assert!(sim.weapon().unwrap().has_flag(ItemFlags::RUNIC_IDENTIFIED));
    }

    #[test]
    fn test_slaying_ignores_other_classes() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        wield(
            &mut sim,
            Item::weapon(ItemId(1), WeaponKind::Dagger).with_weapon_runic(WeaponRunic::Slaying, Some(MonsterClass::Jelly)),
        );
        let before = sim.rng.numbers_generated();
        magic_weapon_hit(&mut sim, g, true);
        assert!(!creature(&sim, g).is_dying());
        assert_eq!(sim.rng.numbers_generated(), before);
    }

    #[test]
    fn test_inanimate_defenders_never_trigger_runics() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info().with_behaviors(BehaviorFlags::INANIMATE), Pos::new(6, 5));
        wield(&mut sim, runic_dagger(WeaponRunic::Paralysis, 10));
        let before = sim.rng.numbers_generated();
        magic_weapon_hit(&mut sim, g, false);
        assert_eq!(creature(&sim, g).status(StatusKind::Paralyzed), 0);
        assert_eq!(sim.rng.numbers_generated(), before);
    }

    #[test]
    fn test_paralysis_proc_eventually_fires() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        wield(&mut sim, runic_dagger(WeaponRunic::Paralysis, 3));
        for _ in 0..200 {
            magic_weapon_hit(&mut sim, g, true);
            if creature(&sim, g).is_paralyzed() {
                break;
            }
        }
        let c = creature(&sim, g);
        assert_eq!(c.status(StatusKind::Paralyzed), weapon_paralysis_duration(Fixed::from_int(3)));
        assert_eq!(c.status.max(StatusKind::Paralyzed), c.status(StatusKind::Paralyzed));
    }

    #[test]
    fn test_force_slams_defender_into_wall() {
        let mut sim = sim();
        wield(&mut sim, runic_dagger(WeaponRunic::Force, 3));
        grid(&mut sim).add_wall(Pos::new(10, 5));
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        assert!(force_weapon_hit(&mut sim, g));
        sim.messages.display_combat_text();

        let c = creature(&sim, g);
        assert_eq!(c.pos, Pos::new(9, 5));
        assert_eq!(c.current_hp, 12);
        assert!(sim.messages.contains("You launch the goblin backward"));
        assert!(sim.messages.contains("The goblin slams against the wall"));
    }

    #[test]
    fn test_force_collision_hurts_both() {
        let mut sim = sim();
        wield(&mut sim, runic_dagger(WeaponRunic::Force, 3));
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let h = sim.spawn_monster(goblin_info(), Pos::new(10, 5));
        creature_mut(&mut sim, h).current_hp = 2;
        force_weapon_hit(&mut sim, g);
        sim.messages.display_combat_text();

        assert_eq!(creature(&sim, g).pos, Pos::new(9, 5));
        assert_eq!(creature(&sim, g).current_hp, 12);
        assert!(creature(&sim, h).has_died());
        assert!(sim.messages.contains("dies when the goblin slams into"));
    }

    #[test]
    fn test_unobstructed_flight_does_no_damage() {
        let mut sim = sim();
        wield(&mut sim, runic_dagger(WeaponRunic::Force, 3));
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        force_weapon_hit(&mut sim, g);
        let c = creature(&sim, g);
        assert_eq!(c.pos, Pos::new(13, 5));
        assert_eq!(c.current_hp, 15);
    }

    fn runic_armor(sim: &mut Sim, runic: ArmorRunic, enchant: i32) -> ItemId {
        let armor = Item::armor(ItemId(2), ArmorKind::LeatherArmor)
            .with_enchant(enchant)
            .with_armor_runic(runic, Some(MonsterClass::Goblin));
        wield(sim, armor)
    }

    #[test]
    fn test_vulnerability_doubles_and_reveals() {
        let mut sim = sim();
        let armor = runic_armor(&mut sim, ArmorRunic::Vulnerability, 0);
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let mut damage = 4;
        let report = apply_armor_runic_effect(&mut sim, g, &mut damage, true);
        assert_eq!(damage, 8);
        assert_eq!(report, "your leather armor pulses and you are wracked with pain!");
        assert!(sim.pack.get(armor).unwrap().has_flag(ItemFlags::RUNIC_IDENTIFIED));

        // once known, the effect is silent
        let mut damage = 4;
        let report = apply_armor_runic_effect(&mut sim, g, &mut damage, true);
        assert_eq!(damage, 8);
        assert!(report.is_empty());
    }

    #[test]
    fn test_immunity_zeroes_damage_from_its_class() {
        let mut sim = sim();
        runic_armor(&mut sim, ArmorRunic::Immunity, 0);
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let mut damage = 9;
        apply_armor_runic_effect(&mut sim, g, &mut damage, true);
        assert_eq!(damage, 0);
    }

    #[test]
    fn test_mutuality_shares_with_neighbours() {
        let mut sim = sim();
        runic_armor(&mut sim, ArmorRunic::Mutuality, 0);
        let attacker = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let a = sim.spawn_monster(goblin_info(), Pos::new(4, 5));
        let b = sim.spawn_monster(goblin_info(), Pos::new(5, 4));
        let mut damage = 10;
        let report = apply_armor_runic_effect(&mut sim, attacker, &mut damage, true);
        assert_eq!(damage, 4);
        assert_eq!(creature(&sim, a).current_hp, 11);
        assert_eq!(creature(&sim, b).current_hp, 11);
        assert_eq!(creature(&sim, attacker).current_hp, 15);
        assert!(report.ends_with("shared with the other adjacent enemies!"));
    }

    #[test]
    fn test_reprisal_can_kill_the_attacker() {
        let mut sim = sim();
        runic_armor(&mut sim, ArmorRunic::Reprisal, 2);
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        creature_mut(&mut sim, g).current_hp = 1;
        let mut damage = 6;
        let report = apply_armor_runic_effect(&mut sim, g, &mut damage, true);
        assert_eq!(damage, 6);
        assert!(creature(&sim, g).has_died());
        assert_eq!(report, "your leather armor pulses and the goblin drops dead!");
    }

    #[test]
    fn test_reprisal_needs_melee() {
        let mut sim = sim();
        runic_armor(&mut sim, ArmorRunic::Reprisal, 2);
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let mut damage = 6;
        let report = apply_armor_runic_effect(&mut sim, g, &mut damage, false);
        assert!(report.is_empty());
        assert_eq!(creature(&sim, g).current_hp, 15);
    }

    #[test]
    fn test_spectral_blade_template() {
        let info = spectral_info("spectral blade");
        assert_eq!(info.kind, SPECTRAL_BLADE_KIND);
        assert_eq!(info.max_hp, 1);
        assert!(info.behaviors.contains(BehaviorFlags::DIES_IF_NEGATED | BehaviorFlags::FLIES));
        assert_eq!(info.movement_duration, 50);
    }
}
