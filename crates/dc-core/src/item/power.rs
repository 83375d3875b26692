//! Power tables: how enchantment scales every magical effect
//!
//! All of these are integer or fixed-point formulas. Gameplay never goes
//! through floating point, so recordings stay in sync across platforms.

use super::{CharmKind, Item, ItemFlags, WeaponKind, WeaponRunic};
use crate::consts::TURNS_FOR_FULL_REGEN;
use crate::creature::Creature;
use crate::fixed::Fixed;
use crate::rng::GameRng;

/// Chance in percent that a bad weapon runic fires
pub const BAD_RUNIC_CHANCE: i32 = 15;

fn fp(n: i64) -> Fixed {
    Fixed::from_int(n)
}

// Staffs

pub fn staff_damage_low(enchant: Fixed) -> i32 {
    (enchant + fp(2)).scale(3, 4).round() as i32
}

pub fn staff_damage_high(enchant: Fixed) -> i32 {
    enchant.scale(5, 2).round() as i32 + 4
}

/// Roll staff damage (firebolt, lightning)
pub fn staff_damage(rng: &mut GameRng, enchant: Fixed) -> i32 {
    let clump = 1 + (enchant / 3).round() as i32;
    rng.clumped_range(staff_damage_low(enchant), staff_damage_high(enchant), clump)
}

pub fn staff_blink_distance(enchant: Fixed) -> i32 {
    (enchant * 2).round() as i32 + 2
}

pub fn staff_haste_duration(enchant: Fixed) -> i32 {
    (enchant * 4).round() as i32 + 2
}

pub fn staff_blade_count(enchant: Fixed) -> i32 {
    enchant.scale(3, 2).round() as i32
}

pub fn staff_discord_duration(enchant: Fixed) -> i32 {
    (enchant * 4).round() as i32
}

pub fn staff_entrancement_duration(enchant: Fixed) -> i32 {
    (enchant * 3).round() as i32
}

/// Shield points: 130 * 1.4 ^ (round(enchant) - 2)
pub fn staff_protection(enchant: Fixed) -> i32 {
    (Fixed::ratio(14, 10).ipow(enchant.round() - 2) * 130).round() as i32
}

/// Poison per hit: 5 * 1.3 ^ (round(enchant) - 2)
pub fn staff_poison(enchant: Fixed) -> i32 {
    (Fixed::ratio(13, 10).ipow(enchant.round() - 2) * 5).round() as i32
}

// Wands

/// Domination chance. Certain below a fifth of max HP, otherwise in
/// proportion to missing health.
pub fn wand_dominate(monst: &Creature) -> i32 {
    let max_hp = monst.info.max_hp.max(1);
    if monst.current_hp * 5 < max_hp {
        100
    } else {
        (100 * (max_hp - monst.current_hp) / max_hp).max(0)
    }
}

// Rings

/// Charm recharge speed multiplier: 1.3 ^ min(27, round(enchant))
pub fn ring_wisdom_multiplier(enchant: Fixed) -> Fixed {
    Fixed::ratio(13, 10).ipow(enchant.round().min(27))
}

// Charms

/// Percent of max HP restored, 0..=100
pub fn charm_healing(enchant: Fixed) -> i32 {
    ((enchant * 20).round() as i32).clamp(0, 100)
}

pub fn charm_shattering(enchant: Fixed) -> i32 {
    enchant.round() as i32 + 4
}

pub fn charm_guardian_lifespan(enchant: Fixed) -> i32 {
    (enchant * 2).round() as i32 + 4
}

pub fn charm_negation_radius(enchant: Fixed) -> i32 {
    (enchant * 3).round() as i32 + 1
}

/// Shield points: 150 * 1.35 ^ (round(enchant) - 1)
pub fn charm_protection(enchant: Fixed) -> i32 {
    (Fixed::ratio(135, 100).ipow(enchant.round() - 1) * 150).round() as i32
}

/// Base duration and per-level growth of each charm's effect
fn charm_duration_table(kind: CharmKind) -> (i64, Fixed) {
    match kind {
        CharmKind::Health => (3, Fixed::ZERO),
        CharmKind::Protection => (20, Fixed::ZERO),
        CharmKind::Haste => (7, Fixed::ratio(120, 100)),
        CharmKind::FireImmunity => (10, Fixed::ratio(125, 100)),
        CharmKind::Invisibility => (5, Fixed::ratio(120, 100)),
        CharmKind::Telepathy => (25, Fixed::ratio(125, 100)),
        CharmKind::Levitation => (10, Fixed::ratio(125, 100)),
        CharmKind::Shattering => (0, Fixed::ZERO),
        CharmKind::Guardian => (18, Fixed::ZERO),
        CharmKind::Teleportation => (0, Fixed::ZERO),
        CharmKind::Recharging => (0, Fixed::ZERO),
        CharmKind::Negation => (0, Fixed::ZERO),
    }
}

/// Base delay and per-level decay of each charm's recharge
fn charm_recharge_table(kind: CharmKind) -> (i64, Fixed) {
    match kind {
        CharmKind::Health => (2500, Fixed::ratio(55, 100)),
        CharmKind::Protection => (1000, Fixed::ratio(60, 100)),
        CharmKind::Haste => (800, Fixed::ratio(65, 100)),
        CharmKind::FireImmunity => (800, Fixed::ratio(60, 100)),
        CharmKind::Invisibility => (800, Fixed::ratio(65, 100)),
        CharmKind::Telepathy => (800, Fixed::ratio(65, 100)),
        CharmKind::Levitation => (800, Fixed::ratio(65, 100)),
        CharmKind::Shattering => (2500, Fixed::ratio(60, 100)),
        CharmKind::Guardian => (700, Fixed::ratio(70, 100)),
        CharmKind::Teleportation => (920, Fixed::ratio(60, 100)),
        CharmKind::Recharging => (10000, Fixed::ratio(55, 100)),
        CharmKind::Negation => (2500, Fixed::ratio(60, 100)),
    }
}

/// Turns a charm's effect lasts at an integer enchantment
pub fn charm_effect_duration(kind: CharmKind, enchant: i32) -> i32 {
    let (duration, increment) = charm_duration_table(kind);
    (increment.ipow(enchant as i64) * duration).round() as i32
}

/// Turns before a used charm is ready again, at least one
pub fn charm_recharge_delay(kind: CharmKind, enchant: i32) -> i32 {
    let (duration, base) = charm_recharge_table(kind);
    let delay =
        charm_effect_duration(kind, enchant) + (base.ipow(enchant as i64) * duration).round() as i32;
    delay.max(1)
}

// Weapon runics

pub fn weapon_paralysis_duration(enchant: Fixed) -> i32 {
    ((enchant / 2).round() as i32 + 2).max(2)
}

pub fn weapon_confusion_duration(enchant: Fixed) -> i32 {
    (enchant.scale(3, 2).round() as i32).max(3)
}

pub fn weapon_force_distance(enchant: Fixed) -> i32 {
    ((enchant * 2).round() as i32 + 2).max(4)
}

pub fn weapon_slow_duration(enchant: Fixed) -> i32 {
    (((enchant + fp(2)).ipow(2) / 3).round() as i32).max(3)
}

pub fn weapon_image_count(enchant: Fixed) -> i32 {
    ((enchant / 3).round() as i32).clamp(1, 7)
}

pub fn weapon_image_duration(_enchant: Fixed) -> i32 {
    3
}

// Armor runics

pub fn armor_reprisal_percent(enchant: Fixed) -> i32 {
    ((enchant * 5).round() as i32).max(5)
}

pub fn armor_absorption_max(enchant: Fixed) -> i32 {
    (enchant.round() as i32).max(1)
}

pub fn armor_image_count(enchant: Fixed) -> i32 {
    ((enchant / 3).round() as i32).clamp(1, 5)
}

/// Bolt reflection chance: 100 - 100 * 0.85 ^ enchant, within 1..=100
pub fn reflection_chance(enchant: Fixed) -> i32 {
    let enchant = enchant.quantize(4);
    let kept = (Fixed::ratio(85, 100).pow(enchant) * 100).round() as i32;
    (100 - kept).clamp(1, 100)
}

/// Thousandths of a turn to regenerate fully with a regeneration bonus
pub fn turns_for_full_regen_thousandths(bonus: Fixed) -> i64 {
    let t = Fixed::ratio(75, 100).ipow(bonus.round());
    (t * 1000 * TURNS_FOR_FULL_REGEN).round() + 2000
}

/// Per-hit chance in percent that a weapon's runic fires.
///
/// Heavier weapons fire less often, staggering weapons get two rolls'
/// worth, quick weapons half of one. Slaying never rolls (it works on
/// every hit against its class), and bad runics fire at a flat 15%.
/// Non-runic items report zero.
pub fn runic_weapon_chance(item: &Item, enchant: Fixed) -> i32 {
    let Some(runic) = item.weapon_runic() else {
        return 0;
    };
    let base = match runic {
        WeaponRunic::Speed => Fixed::ratio(84, 100),
        WeaponRunic::Quietus => Fixed::ratio(94, 100),
        WeaponRunic::Paralysis => Fixed::ratio(93, 100),
        WeaponRunic::Multiplicity => Fixed::ratio(85, 100),
        WeaponRunic::Slowing => Fixed::ratio(86, 100),
        WeaponRunic::Confusion => Fixed::ratio(89, 100),
        WeaponRunic::Force => Fixed::ratio(85, 100),
        WeaponRunic::Slaying => return 0,
        WeaponRunic::Mercy | WeaponRunic::Plenty => return BAD_RUNIC_CHANCE,
    };

    let range = WeaponKind::from_index(item.kind)
        .map(|k| k.stats().damage)
        .unwrap_or(item.damage);
    let mut adjusted_base_damage = (range.lower + range.upper) / 2;
    if item.has_flag(ItemFlags::ATTACKS_STAGGER) {
        adjusted_base_damage /= 2;
    }
    let modifier = Fixed::ONE - Fixed::ratio(99, 100).min(fp(adjusted_base_damage as i64) / 18);

    let mut chance = if enchant.is_negative() {
        0
    } else {
        let expn = (enchant * modifier).clamp(Fixed::ZERO, fp(50)).quantize(4);
        100 - (base.pow(expn) * 100).round() as i32
    };

    if item.has_flag(ItemFlags::ATTACKS_STAGGER) {
        chance = 100 - (100 - chance) * (100 - chance) / 100;
    }
    if item.has_flag(ItemFlags::ATTACKS_QUICKLY) {
        let miss = Fixed::ONE - Fixed::ratio(chance as i64, 100);
        chance = ((Fixed::ONE - miss.sqrt()) * 100).round() as i32;
    }

    chance.clamp((enchant.round() as i32).max(1), 100)
}
