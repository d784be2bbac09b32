#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared damage-resolution pipeline and its diagnostic ring buffer.

mod log;
mod resolver;

pub use log::{DamageLog, DamageRecord};
pub use resolver::{CombatResolver, Damageable, Hit, Resolution, Strike};
