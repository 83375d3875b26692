//! Net enchantment and the enchantment-to-multiplier curves
//!
//! The curves are balance data. They are reproduced exactly so that recorded
//! games replay with identical outcomes.

use super::{Item, ItemCategory};
use crate::fixed::Fixed;

/// Lowest net enchantment, in whole points
pub const MIN_NET_ENCHANT: i64 = -20;

/// Highest net enchantment, in whole points
pub const MAX_NET_ENCHANT: i64 = 50;

/// Bonus or penalty from the wielder's strength relative to the item's
/// requirement.
///
/// `effective_strength` is strength minus weakness. Each point of surplus
/// is worth a quarter of an enchantment; each point of deficit costs two
/// and a half.
pub fn strength_modifier(item: &Item, effective_strength: i32) -> Fixed {
    let difference = (effective_strength - item.strength_required) as i64;
    if difference > 0 {
        Fixed::ratio(difference, 4)
    } else {
        Fixed::from_int(difference).scale(5, 2)
    }
}

/// Enchantment after the strength modifier, clamped to
/// [`MIN_NET_ENCHANT`, `MAX_NET_ENCHANT`].
pub fn net_enchant(item: &Item, effective_strength: i32) -> Fixed {
    let mut net = Fixed::from_int(item.enchant1 as i64);
    if matches!(item.category, ItemCategory::Weapon | ItemCategory::Armor) {
        net += strength_modifier(item, effective_strength);
    }
    net.clamp(
        Fixed::from_int(MIN_NET_ENCHANT),
        Fixed::from_int(MAX_NET_ENCHANT),
    )
}

/// Damage multiplier for a net enchantment: 1.065 ^ e, e in quarter steps
pub fn damage_fraction(net_enchant: Fixed) -> Fixed {
    Fixed::ratio(1065, 1000).pow(net_enchant.quantize(4))
}

/// Accuracy multiplier; the same curve as [`damage_fraction`]
pub fn accuracy_fraction(net_enchant: Fixed) -> Fixed {
    Fixed::ratio(1065, 1000).pow(net_enchant.quantize(4))
}

/// Hit-chance multiplier for a defense value: (701/799) ^ (d / 10)
///
/// Ten points of defense equal one point of armor enchantment, and each
/// such point cuts the attacker's accuracy by roughly 12.3%.
pub fn defense_fraction(net_defense: Fixed) -> Fixed {
    Fixed::ratio(701, 799).pow((net_defense / 10).quantize(4))
}
