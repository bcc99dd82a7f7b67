//! Tick orchestrator: energy sources, then equipment, then the shift ledger.

use tracing::{debug, error};

use crate::tags::{TagPaths, TagStore};

use super::clock::{Clock, TimeContext};
use super::energy::EnergySourceSimulator;
use super::equipment::EquipmentSimulator;
use super::error::{Stage, StageError};
use super::random::RandomSource;
use super::shift::ShiftAccountant;
use super::types::{StageFailure, TickReport};

/// Simulation engine owning the tag store, random source and clock.
///
/// Generic over all three collaborators for static dispatch; production uses
/// `MemoryTagStore`, `StdRandom` and `SystemClock`, tests swap in scripted
/// randomness and a fixed clock.
pub struct Engine<S: TagStore, R: RandomSource, C: Clock> {
    store: S,
    rng: R,
    clock: C,
    energy: EnergySourceSimulator,
    equipment: EquipmentSimulator,
    shift: ShiftAccountant,
    ticks: u64,
}

impl<S: TagStore, R: RandomSource, C: Clock> Engine<S, R, C> {
    /// Creates an engine whose stages address tags under `paths`.
    pub fn new(paths: &TagPaths, store: S, rng: R, clock: C) -> Self {
        Self {
            store,
            rng,
            clock,
            energy: EnergySourceSimulator::new(paths),
            equipment: EquipmentSimulator::new(paths),
            shift: ShiftAccountant::new(paths),
            ticks: 0,
        }
    }

    /// Executes one tick.
    ///
    /// The tick number is claimed before anything else runs, so a tick that
    /// panics still consumes its number.
    ///
    /// The clock is sampled once. Each stage runs regardless of how the
    /// previous one ended; a failed stage is logged and recorded in the
    /// report but never retried within the tick.
    pub fn tick(&mut self) -> TickReport {
        let tick = self.ticks;
        self.ticks += 1;
        let time = TimeContext::at(self.clock.now());
        let mut failures = Vec::new();

        let energy = isolate(
            Stage::EnergySources,
            self.energy.run(&time, &mut self.rng, &mut self.store),
            &mut failures,
        );
        let equipment = isolate(
            Stage::Equipment,
            self.equipment.run(&mut self.rng, &mut self.store),
            &mut failures,
        );
        let shift = isolate(
            Stage::Shift,
            self.shift.run(&time, &mut self.rng, &mut self.store),
            &mut failures,
        );

        let report = TickReport {
            tick,
            timestamp: time.now,
            hour: time.hour,
            day_factor: time.day_factor,
            energy,
            equipment,
            shift,
            failures,
        };
        debug!("{report}");
        report
    }

    /// Number of ticks started so far, including any that panicked.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Consumes the engine, handing back its store.
    pub fn into_store(self) -> S {
        self.store
    }
}

/// Logs and records a stage failure, passing successes through.
fn isolate<T>(
    stage: Stage,
    result: Result<T, StageError>,
    failures: &mut Vec<StageFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(%stage, error = %err, "simulation stage failed");
            failures.push(StageFailure { stage, error: err });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::*;
    use crate::sim::clock::FixedClock;
    use crate::sim::random::StdRandom;
    use crate::sim::types::{ShiftUpdate, TICK_HOURS};
    use crate::tags::memory::StoreSeed;
    use crate::tags::paths::{generator, grid, line_a, shift, totals};
    use crate::tags::{MemoryTagStore, StoreError, TagValue};

    fn paths() -> TagPaths {
        TagPaths::new("Plant")
    }

    fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .and_then(|d| d.and_hms_opt(hour, min, sec))
            .expect("valid timestamp")
    }

    fn engine_at(now: NaiveDateTime) -> Engine<MemoryTagStore, StdRandom, FixedClock> {
        let store = MemoryTagStore::seeded(&paths(), &StoreSeed::default());
        Engine::new(&paths(), store, StdRandom::seeded(42), FixedClock::new(now))
    }

    #[test]
    fn clean_tick_runs_all_stages() {
        let mut engine = engine_at(at(10, 0, 0));
        let report = engine.tick();
        assert!(report.is_clean());
        assert!(report.energy.is_some());
        assert!(report.equipment.is_some());
        assert!(report.shift.is_some());
        assert_eq!(report.tick, 0);
        assert_eq!(engine.tick_count(), 1);
    }

    #[test]
    fn shift_stage_sees_total_published_in_same_tick() {
        let mut engine = engine_at(at(10, 0, 0));
        let report = engine.tick();
        let total = report.energy.map(|e| e.total_power_kw).unwrap_or_default();
        let stored = engine
            .store()
            .get(&paths().resolve(totals::TOTAL_POWER_KW))
            .and_then(TagValue::as_f64);
        assert_eq!(stored, Some(total));
        match report.shift {
            Some(update) => assert_eq!(update.shift_energy_kwh(), total * TICK_HOURS),
            None => panic!("shift stage should succeed"),
        }
    }

    #[test]
    fn energy_failure_does_not_block_later_stages() {
        let mut engine = engine_at(at(10, 0, 0));
        engine.store_mut().remove(&paths().resolve(grid::ENERGY_KWH));
        let report = engine.tick();

        assert!(report.energy.is_none());
        assert!(report.equipment.is_some());
        assert!(report.shift.is_some());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::EnergySources);
    }

    #[test]
    fn every_stage_can_fail_independently() {
        let mut engine = engine_at(at(10, 0, 0));
        let store = engine.store_mut();
        store.remove(&paths().resolve(grid::ENERGY_KWH));
        store.remove(&paths().resolve(line_a::BOTTLES_PRODUCED));
        store.remove(&paths().resolve(shift::CURRENT_SHIFT));
        let report = engine.tick();

        let stages: Vec<Stage> = report.failures.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![Stage::EnergySources, Stage::Equipment, Stage::Shift]);
        assert_eq!(engine.tick_count(), 1);
    }

    /// Drops the last value of any read that starts at the generator run-hours
    /// counter, which only the energy stage asks for.
    struct ShortCounterStore(MemoryTagStore);

    impl TagStore for ShortCounterStore {
        fn read(&self, paths: &[String]) -> Result<Vec<TagValue>, StoreError> {
            let mut values = self.0.read(paths)?;
            if paths
                .first()
                .is_some_and(|p| p.ends_with(generator::RUN_HOURS))
            {
                values.pop();
            }
            Ok(values)
        }

        fn write(&mut self, paths: &[String], values: &[TagValue]) -> Result<(), StoreError> {
            self.0.write(paths, values)
        }
    }

    #[test]
    fn short_store_read_fails_only_its_stage() {
        let store = ShortCounterStore(MemoryTagStore::seeded(&paths(), &StoreSeed::default()));
        let mut engine = Engine::new(
            &paths(),
            store,
            StdRandom::seeded(42),
            FixedClock::new(at(10, 0, 0)),
        );
        let report = engine.tick();

        assert!(report.energy.is_none());
        assert!(report.equipment.is_some());
        assert!(report.shift.is_some());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].error,
            StageError::Read(StoreError::LengthMismatch {
                paths: 4,
                values: 3
            })
        );
    }

    /// Panics on every reading.
    struct BrokenClock;

    impl Clock for BrokenClock {
        fn now(&self) -> NaiveDateTime {
            panic!("clock source unavailable");
        }
    }

    #[test]
    fn panicking_tick_still_consumes_its_number() {
        let store = MemoryTagStore::seeded(&paths(), &StoreSeed::default());
        let mut engine = Engine::new(&paths(), store, StdRandom::seeded(1), BrokenClock);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| engine.tick()));
        assert!(outcome.is_err());
        assert_eq!(engine.tick_count(), 1);
    }

    #[test]
    fn shift_rolls_over_when_clock_crosses_boundary() {
        let mut engine = engine_at(at(13, 59, 58));
        engine.tick();
        engine.tick();
        let before = engine
            .store()
            .get(&paths().resolve(shift::SHIFT_ENERGY_KWH))
            .and_then(TagValue::as_f64)
            .unwrap_or_default();
        assert!(before > 0.0);

        engine.clock_mut().advance(Duration::seconds(2));
        let report = engine.tick();
        match report.shift {
            Some(ShiftUpdate::Rollover {
                from, to, archived_kwh, ..
            }) => {
                assert_eq!((from, to), (1, 2));
                assert_eq!(archived_kwh, before);
            }
            other => panic!("expected rollover, got {other:?}"),
        }
    }
}
