//! Melee combat resolution
//!
//! [`attack`] is the entry point: it rolls to hit, applies damage through
//! [`inflict_damage`], kills through [`kill_creature`], and then fires the
//! side effects of a blow in a fixed order (morale, weapon runics,
//! splitting, auto-identification, weapon wear). The order matters for
//! replays, since each step may draw from the gameplay RNG.

mod attack;
mod damage;
mod death;
mod hit;
mod moral;
mod runics;
mod special;
mod split;

pub use attack::{attack, attack_would_be_futile, build_hit_list, process_stagger_hit};
pub use damage::{inflict_damage, inflict_lethal_damage};
pub use death::kill_creature;
pub use hit::{
    attack_hit, hit_probability, monster_accuracy_adjusted, monster_damage_adjustment,
    monster_defense_adjusted,
};
pub use moral::moral_attack;
pub use runics::{
    apply_armor_runic_effect, auto_identify, decrement_weapon_auto_id_timer, force_weapon_hit,
    magic_weapon_hit,
};
pub(crate) use runics::{spectral_info, summon_spectral};
pub use special::special_hit;
pub use split::split_monster;
