/// Wall clock and time-of-day rules.
pub mod clock;
pub mod energy;
pub mod engine;
/// Per-tick equipment readings and counters.
pub mod equipment;
pub mod error;
/// Injectable randomness.
pub mod random;
pub mod shift;
pub mod types;
