//! Three-shift energy ledger.
//!
//! The active shift is a pure function of the wall-clock hour. Each tick the
//! ledger either accumulates the plant's total power into the stored shift
//! total or, when the hour has crossed into a different shift, archives that
//! total and starts the new shift from zero.

use crate::tags::paths::{shift, totals};
use crate::tags::{TagPaths, TagStore, TagValue};

use super::clock::TimeContext;
use super::error::{StageError, read_numbers, write_batch};
use super::random::RandomSource;
use super::types::{ShiftUpdate, TICK_HOURS};

/// Range new shift targets are drawn from (kWh).
const TARGET_RANGE_KWH: (f64, f64) = (1000.0, 2000.0);

#[derive(Debug, Clone)]
pub struct ShiftAccountant {
    /// Total power, stored shift id, shift energy, shift target.
    reads: Vec<String>,
    rollover: Vec<String>,
    accumulate: Vec<String>,
}

impl ShiftAccountant {
    pub fn new(paths: &TagPaths) -> Self {
        Self {
            reads: paths.resolve_all(&[
                totals::TOTAL_POWER_KW,
                shift::CURRENT_SHIFT,
                shift::SHIFT_ENERGY_KWH,
                shift::SHIFT_TARGET_KWH,
            ]),
            rollover: paths.resolve_all(&[
                shift::CURRENT_SHIFT,
                shift::PREVIOUS_SHIFT_ENERGY_KWH,
                shift::SHIFT_ENERGY_KWH,
                shift::SHIFT_START_TIME,
                shift::SHIFT_TARGET_KWH,
            ]),
            accumulate: paths.resolve_all(&[shift::SHIFT_ENERGY_KWH]),
        }
    }

    /// Runs the ledger for one tick.
    ///
    /// Total power is read from the store, so a tick whose energy stage
    /// failed accumulates the last published total.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] if the ledger tags cannot be read, hold a
    /// non-integer shift id, or the write is rejected.
    pub fn run<S: TagStore, R: RandomSource>(
        &self,
        time: &TimeContext,
        rng: &mut R,
        store: &mut S,
    ) -> Result<ShiftUpdate, StageError> {
        let v = read_numbers(store, &self.reads)?;
        let (total_power_kw, stored_shift, shift_energy_kwh) = (v[0], v[1], v[2]);
        if stored_shift.fract() != 0.0 {
            return Err(StageError::Computation(format!(
                "stored shift id {stored_shift} is not an integer"
            )));
        }
        let stored_shift = stored_shift as i64;

        if i64::from(time.shift) != stored_shift {
            let target_kwh = rng.reading(TARGET_RANGE_KWH.0, TARGET_RANGE_KWH.1);
            write_batch(
                store,
                &self.rollover,
                vec![
                    TagValue::Int(i64::from(time.shift)),
                    shift_energy_kwh.into(),
                    0.0.into(),
                    time.now.into(),
                    target_kwh.into(),
                ],
            )?;
            Ok(ShiftUpdate::Rollover {
                from: stored_shift,
                to: time.shift,
                archived_kwh: shift_energy_kwh,
                target_kwh,
                started_at: time.now,
            })
        } else {
            let added_kwh = total_power_kw * TICK_HOURS;
            let total = shift_energy_kwh + added_kwh;
            write_batch(store, &self.accumulate, vec![total.into()])?;
            Ok(ShiftUpdate::Accumulated {
                shift: time.shift,
                added_kwh,
                shift_energy_kwh: total,
            })
        }
    }
}
