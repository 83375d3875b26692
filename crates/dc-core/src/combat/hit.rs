//! To-hit and damage adjustments

use crate::creature::{BookkeepingFlags, CreatureId, StatusKind};
use crate::fixed::Fixed;
use crate::item::{accuracy_fraction, damage_fraction, defense_fraction};
use crate::sim::{Sim, stale_handle};

/// Weakness counts one and a half points of negative enchantment.
fn weakness_penalty(weakness: i32) -> Fixed {
    Fixed::from_int(weakness as i64).scale(-3, 2)
}

/// Damage multiplier of an attacker. The player's weapon enchantment is
/// already folded into its damage range, so only monsters are scaled.
pub fn monster_damage_adjustment(sim: &Sim, id: CreatureId) -> Fixed {
    if sim.is_player(id) {
        return Fixed::ONE;
    }
    let weakness = sim.roster.get(id).map(|c| c.weakness_amount).unwrap_or(0);
    damage_fraction(weakness_penalty(weakness))
}

/// Defense after weakness. Player defense is kept current by the
/// equipment recalculation and is used as is.
pub fn monster_defense_adjusted(sim: &Sim, id: CreatureId) -> i32 {
    let Some(c) = sim.roster.get(id) else {
        return 0;
    };
    if sim.is_player(id) {
        c.info.defense
    } else {
        c.effective_defense()
    }
}

/// Accuracy after weakness, never negative
pub fn monster_accuracy_adjusted(sim: &Sim, id: CreatureId) -> i32 {
    let Some(c) = sim.roster.get(id) else {
        return 0;
    };
    let accuracy = Fixed::from_int(c.info.accuracy as i64) * accuracy_fraction(weakness_penalty(c.weakness_amount));
    (accuracy.trunc() as i32).max(0)
}

/// Percent chance that `attacker` hits `defender`, in `0..=100`.
///
/// Stuck and captive defenders, and a defender held by its attacker, are
/// always hit. A slaying weapon never misses its class.
pub fn hit_probability(sim: &Sim, attacker: CreatureId, defender: CreatureId) -> i32 {
    let (Some(att), Some(def)) = (sim.roster.get(attacker), sim.roster.get(defender)) else {
        stale_handle(if sim.roster.contains(attacker) { defender } else { attacker });
        return 0;
    };
    if def.status(StatusKind::Stuck) > 0 || def.is_captive() {
        return 100;
    }
    if def.has_bookkeeping(BookkeepingFlags::SEIZED) && att.has_bookkeeping(BookkeepingFlags::SEIZING) {
        return 100;
    }
    let mut accuracy = monster_accuracy_adjusted(sim, attacker);
    if sim.is_player(attacker)
        && let Some(weapon) = sim.weapon()
    {
        if weapon.slays(def.info.classes) {
            return 100;
        }
        let scaled = Fixed::from_int(att.info.accuracy as i64) * accuracy_fraction(sim.net_enchant(weapon));
        accuracy = scaled.trunc() as i32;
    }
    let defense = monster_defense_adjusted(sim, defender);
    let probability = Fixed::from_int(accuracy as i64) * defense_fraction(Fixed::from_int(defense as i64));
    (probability.trunc() as i32).clamp(0, 100)
}

/// Roll to hit. Stuck, paralyzed and captive defenders are hit without a
/// roll, so no random number is drawn for them.
pub fn attack_hit(sim: &mut Sim, attacker: CreatureId, defender: CreatureId) -> bool {
    let Some(def) = sim.roster.get(defender) else {
        stale_handle(defender);
        return false;
    };
    if def.status(StatusKind::Stuck) > 0 || def.is_paralyzed() || def.is_captive() {
        return true;
    }
    let p = hit_probability(sim, attacker, defender);
    sim.rng.percent(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::MonsterClass;
    use crate::creature::test_support::goblin_info;
    use crate::geom::Pos;
    use crate::item::{Item, ItemId, WeaponKind, WeaponRunic};
    use crate::sim::test_support::*;

    #[test]
    fn test_goblin_against_unarmored_player() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let player = sim.player_id();
        // no defense: accuracy passes straight through
        assert_eq!(hit_probability(&sim, g, player), 70);
        // ten defense is one step down the curve
        let p = hit_probability(&sim, player, g);
        assert!(p < 100 && p > 80, "{}", p);
    }

    #[test]
    fn test_captive_and_stuck_always_hit() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let player = sim.player_id();
        creature_mut(&mut sim, g).info.defense = 1000;
        assert_eq!(hit_probability(&sim, player, g), 0);
        creature_mut(&mut sim, g).bookkeeping |= BookkeepingFlags::CAPTIVE;
        assert_eq!(hit_probability(&sim, player, g), 100);
        creature_mut(&mut sim, g).bookkeeping.remove(BookkeepingFlags::CAPTIVE);
        creature_mut(&mut sim, g).status.set_both(StatusKind::Stuck, 3);
        assert_eq!(hit_probability(&sim, player, g), 100);
    }

    #[test]
    fn test_paralyzed_defender_hit_without_a_roll() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let player = sim.player_id();
        creature_mut(&mut sim, g).info.defense = 1000;
        creature_mut(&mut sim, g).status.set_both(StatusKind::Paralyzed, 5);
        let before = sim.rng.numbers_generated();
        assert!(attack_hit(&mut sim, player, g));
        assert_eq!(sim.rng.numbers_generated(), before);
    }

    #[test]
    fn test_slaying_weapon_never_misses_its_class() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        let player = sim.player_id();
        creature_mut(&mut sim, g).info.defense = 1000;
        let blade = Item::weapon(ItemId(1), WeaponKind::Sword)
            .with_weapon_runic(WeaponRunic::Slaying, Some(MonsterClass::Goblin));
        wield(&mut sim, blade);
        assert_eq!(hit_probability(&sim, player, g), 100);
    }

    #[test]
    fn test_weakness_lowers_monster_numbers() {
        let mut sim = sim();
        let g = sim.spawn_monster(goblin_info(), Pos::new(6, 5));
        assert_eq!(monster_accuracy_adjusted(&sim, g), 70);
        assert_eq!(monster_damage_adjustment(&sim, g), Fixed::ONE);
        creature_mut(&mut sim, g).weakness_amount = 2;
        assert!(monster_accuracy_adjusted(&sim, g) < 70);
        assert!(monster_damage_adjustment(&sim, g) < Fixed::ONE);
        assert_eq!(monster_defense_adjusted(&sim, g), 0);
        assert_eq!(monster_damage_adjustment(&sim, sim.player_id()), Fixed::ONE);
    }
}
