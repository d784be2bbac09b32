#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Layered status-effect engine.
//!
//! Each tick an agent's derived values are reset to baseline, every live
//! effect is applied in collection order, durations are decremented, and
//! expired effects run their remove hook before leaving the collection.
//! Damage over time goes straight to the agent's intake.

mod engine;

pub use engine::{AddOutcome, StatusEffectEngine, TickReport};
