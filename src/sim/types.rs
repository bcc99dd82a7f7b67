//! Readings published by each stage and the per-tick report.

use std::fmt;

use chrono::NaiveDateTime;

use super::error::{Stage, StageError};
use super::random::round2;

/// Hours integrated by one tick (one second).
pub const TICK_HOURS: f64 = 1.0 / 3600.0;

/// Line current in amperes for a three-phase reading, `power*1000/voltage`
/// rounded to two decimals.
pub fn current_a(power_kw: f64, voltage_v: f64) -> f64 {
    round2(power_kw * 1000.0 / voltage_v)
}

/// Solar array reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarReading {
    pub power_kw: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    pub irradiance_wm2: f64,
    pub panel_temp_c: f64,
    pub efficiency_pct: f64,
}

/// Diesel backup generator reading.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorReading {
    pub running: bool,
    pub power_kw: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    pub fuel_level_pct: f64,
    pub rpm: i64,
    pub engine_temp_c: f64,
    /// Cumulative run-hours after this tick.
    pub run_hours: f64,
}

/// Grid feed reading.
#[derive(Debug, Clone, PartialEq)]
pub struct GridReading {
    pub power_kw: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    pub power_factor: f64,
    pub frequency_hz: f64,
}

/// Cumulative energy per source after this tick (kWh).
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCounters {
    pub solar_kwh: f64,
    pub generator_kwh: f64,
    pub grid_kwh: f64,
}

/// Everything the energy-source stage published in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySnapshot {
    pub solar: SolarReading,
    pub generator: GeneratorReading,
    pub grid: GridReading,
    /// Grid plus solar (kW).
    pub grid_plus_solar_kw: f64,
    /// Grid plus solar plus generator (kW).
    pub total_power_kw: f64,
    pub counters: EnergyCounters,
}

/// Filling line (line A) reading.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAReading {
    pub running: bool,
    pub power_kw: f64,
    /// Bottles per minute.
    pub speed_bpm: i64,
    pub bottles_produced: i64,
    pub efficiency_pct: f64,
    pub energy_kwh: f64,
    /// `energy_kwh*1000/bottles_produced`, or 0 before the first bottle.
    pub energy_per_bottle_wh: f64,
    pub alarm: bool,
}

/// Packaging line (line B) reading.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBReading {
    pub running: bool,
    pub power_kw: f64,
    /// Cases per minute.
    pub speed_cpm: i64,
    pub cases_packed: i64,
    pub efficiency_pct: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressorReading {
    pub running: bool,
    pub power_kw: f64,
    pub pressure_bar: f64,
    pub efficiency_pct: f64,
    pub motor_temp_c: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClimateReading {
    pub running: bool,
    pub power_kw: f64,
    pub room_temp_c: f64,
    pub setpoint_c: f64,
    pub efficiency_pct: f64,
    pub runtime_hours: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColdStorageReading {
    pub running: bool,
    pub power_kw: f64,
    pub temp_c: f64,
    pub setpoint_c: f64,
    pub pressure_bar: f64,
    pub efficiency_pct: f64,
    pub defrost_active: bool,
    pub energy_kwh: f64,
}

/// Everything the equipment stage published in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentSnapshot {
    pub line_a: LineAReading,
    pub line_b: LineBReading,
    pub compressor: CompressorReading,
    pub climate: ClimateReading,
    pub cold_storage: ColdStorageReading,
}

impl EquipmentSnapshot {
    /// Combined instantaneous draw of all five units (kW).
    pub fn total_power_kw(&self) -> f64 {
        self.line_a.power_kw
            + self.line_b.power_kw
            + self.compressor.power_kw
            + self.climate.power_kw
            + self.cold_storage.power_kw
    }
}

/// What the shift ledger did this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ShiftUpdate {
    /// Same shift as stored; energy accumulated.
    Accumulated {
        shift: u8,
        added_kwh: f64,
        shift_energy_kwh: f64,
    },
    /// A new shift started; the old total was archived.
    Rollover {
        from: i64,
        to: u8,
        archived_kwh: f64,
        target_kwh: f64,
        started_at: NaiveDateTime,
    },
}

impl ShiftUpdate {
    /// Active shift after the update.
    pub fn shift(&self) -> u8 {
        match self {
            ShiftUpdate::Accumulated { shift, .. } => *shift,
            ShiftUpdate::Rollover { to, .. } => *to,
        }
    }

    /// Cumulative energy of the active shift after the update.
    pub fn shift_energy_kwh(&self) -> f64 {
        match self {
            ShiftUpdate::Accumulated {
                shift_energy_kwh, ..
            } => *shift_energy_kwh,
            ShiftUpdate::Rollover { .. } => 0.0,
        }
    }
}

/// A stage that failed, with its error.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: StageError,
}

/// Outcome of one engine tick. Stages that failed have no snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Zero-based tick counter since the engine was built.
    pub tick: u64,
    pub timestamp: NaiveDateTime,
    pub hour: u32,
    pub day_factor: f64,
    pub energy: Option<EnergySnapshot>,
    pub equipment: Option<EquipmentSnapshot>,
    pub shift: Option<ShiftUpdate>,
    pub failures: Vec<StageFailure>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick={:>6} {} (x{:.1})",
            self.tick,
            self.timestamp.format("%H:%M:%S"),
            self.day_factor
        )?;
        if let Some(e) = &self.energy {
            write!(
                f,
                " | total={:>8.2} kW  solar={:>6.2}  dg={:>6.2}{}  grid={:>7.2}",
                e.total_power_kw,
                e.solar.power_kw,
                e.generator.power_kw,
                if e.generator.running { "*" } else { "" },
                e.grid.power_kw,
            )?;
        }
        if let Some(eq) = &self.equipment {
            write!(
                f,
                " | plant={:>7.2} kW  bottles={}",
                eq.total_power_kw(),
                eq.line_a.bottles_produced
            )?;
        }
        if let Some(s) = &self.shift {
            write!(f, " | shift={} {:.3} kWh", s.shift(), s.shift_energy_kwh())?;
        }
        if !self.failures.is_empty() {
            write!(f, " | failed={}", self.failures.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn current_is_rounded_to_two_decimals() {
        assert_eq!(current_a(200.0, 425.0), 470.59);
        assert_eq!(current_a(0.0, 400.0), 0.0);
    }

    #[test]
    fn rollover_reports_zero_energy() {
        let started_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(14, 0, 0))
            .expect("valid timestamp");
        let update = ShiftUpdate::Rollover {
            from: 1,
            to: 2,
            archived_kwh: 12.0,
            target_kwh: 1500.0,
            started_at,
        };
        assert_eq!(update.shift(), 2);
        assert_eq!(update.shift_energy_kwh(), 0.0);
    }

    #[test]
    fn report_display_does_not_panic() {
        let timestamp = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid timestamp");
        let report = TickReport {
            tick: 3,
            timestamp,
            hour: 9,
            day_factor: 1.0,
            energy: None,
            equipment: None,
            shift: Some(ShiftUpdate::Accumulated {
                shift: 1,
                added_kwh: 0.5,
                shift_energy_kwh: 10.5,
            }),
            failures: vec![StageFailure {
                stage: Stage::Equipment,
                error: StageError::Computation("boom".into()),
            }],
        };
        let s = format!("{report}");
        assert!(s.contains("shift=1"));
        assert!(s.contains("failed=1"));
        assert!(!report.is_clean());
    }
}
