//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};

use plant_sim::sim::clock::FixedClock;
use plant_sim::sim::engine::Engine;
use plant_sim::sim::random::StdRandom;
use plant_sim::tags::memory::StoreSeed;
use plant_sim::tags::{MemoryTagStore, TagPaths, TagValue};

pub type TestEngine = Engine<MemoryTagStore, StdRandom, FixedClock>;

/// Default tag root used by the production configuration.
pub fn default_paths() -> TagPaths {
    TagPaths::new("Plant_Energy_Monitoring")
}

/// A Monday in June at the given wall-clock time.
pub fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .and_then(|d| d.and_hms_opt(hour, min, 0))
        .expect("valid timestamp")
}

/// Freshly seeded store with the default seed (shift 1, 1500 kWh target).
pub fn seeded_store() -> MemoryTagStore {
    MemoryTagStore::seeded(&default_paths(), &StoreSeed::default())
}

/// Engine over a seeded store with a fixed clock at `now`.
pub fn engine_at(now: NaiveDateTime, seed: u64) -> TestEngine {
    Engine::new(
        &default_paths(),
        seeded_store(),
        StdRandom::seeded(seed),
        FixedClock::new(now),
    )
}

/// Reads a relative tag as `f64`, panicking if absent or non-numeric.
pub fn number(store: &MemoryTagStore, relative: &str) -> f64 {
    store
        .get(&default_paths().resolve(relative))
        .and_then(TagValue::as_f64)
        .unwrap_or_else(|| panic!("{relative} should hold a number"))
}
