//! Bolts: the catalog, tracing a bolt along its path, and what it does to
//! each creature it meets
//!
//! [`zap`] drives a bolt cell by cell. Creatures are resolved by
//! [`update_bolt`]; reflections splice a new segment onto the path with
//! [`reflect_bolt`].

mod catalog;
mod effects;
mod reflect;
mod zap;

pub use catalog::{Bolt, BoltEffect, BoltFlags, BoltKind, bolt_by_name, bolt_catalog, bolt_for_item};
pub use effects::{beckon, imbue_invisibility, update_bolt};
pub use reflect::{projectile_reflects, reflect_bolt};
pub use zap::{ZapContext, zap};
