//! Equipment stage: two production lines and three utilities.
//!
//! Each unit's running state is an independent draw per tick. Energy counters
//! accrue every tick at either the running or the idle power level;
//! production and runtime counters only move while a unit runs.

use crate::tags::paths::{climate, cold_storage, compressor, line_a, line_b};
use crate::tags::{TagPaths, TagStore, TagValue};

use super::error::{StageError, read_numbers, write_batch};
use super::random::RandomSource;
use super::types::{
    ClimateReading, ColdStorageReading, CompressorReading, EquipmentSnapshot, LineAReading,
    LineBReading, TICK_HOURS,
};

const LINE_A_DUTY: f64 = 0.8;
const LINE_B_DUTY: f64 = 0.85;
const COMPRESSOR_DUTY: f64 = 0.7;
const CLIMATE_DUTY: f64 = 0.8;
const COLD_STORAGE_DUTY: f64 = 0.9;
const DEFROST_CHANCE: f64 = 0.1;

/// Rated speed of line A (bottles/min).
const LINE_A_RATED_BPM: f64 = 600.0;
/// Line A power above which the alarm flag is raised (kW).
const LINE_A_ALARM_KW: f64 = 500.0;
/// Rated speed of line B (cases/min).
const LINE_B_RATED_CPM: f64 = 30.0;

const CLIMATE_SETPOINT_C: f64 = 24.0;
const COLD_STORAGE_SETPOINT_C: f64 = 5.0;

/// Synthesizes readings for the five process units and advances their counters.
#[derive(Debug, Clone)]
pub struct EquipmentSimulator {
    line_a_tags: Vec<String>,
    line_b_tags: Vec<String>,
    compressor_tags: Vec<String>,
    climate_tags: Vec<String>,
    cold_storage_tags: Vec<String>,
    counter_reads: Vec<String>,
}

/// Counters read back at the start of a tick, in `counter_reads` order.
struct Previous {
    bottles: f64,
    line_a_kwh: f64,
    cases: f64,
    line_b_kwh: f64,
    climate_runtime_h: f64,
    climate_kwh: f64,
    cold_storage_kwh: f64,
}

impl EquipmentSimulator {
    pub fn new(paths: &TagPaths) -> Self {
        Self {
            line_a_tags: paths.resolve_all(&[
                line_a::RUNNING,
                line_a::POWER_KW,
                line_a::SPEED_BPM,
                line_a::BOTTLES_PRODUCED,
                line_a::EFFICIENCY_PCT,
                line_a::ENERGY_KWH,
                line_a::ENERGY_PER_BOTTLE_WH,
                line_a::ALARM,
            ]),
            line_b_tags: paths.resolve_all(&[
                line_b::RUNNING,
                line_b::POWER_KW,
                line_b::SPEED_CPM,
                line_b::CASES_PACKED,
                line_b::EFFICIENCY_PCT,
                line_b::ENERGY_KWH,
            ]),
            compressor_tags: paths.resolve_all(&[
                compressor::RUNNING,
                compressor::POWER_KW,
                compressor::PRESSURE_BAR,
                compressor::EFFICIENCY_PCT,
                compressor::MOTOR_TEMP_C,
            ]),
            climate_tags: paths.resolve_all(&[
                climate::RUNNING,
                climate::POWER_KW,
                climate::ROOM_TEMP_C,
                climate::SETPOINT_C,
                climate::EFFICIENCY_PCT,
                climate::RUNTIME_HOURS,
                climate::ENERGY_KWH,
            ]),
            cold_storage_tags: paths.resolve_all(&[
                cold_storage::RUNNING,
                cold_storage::POWER_KW,
                cold_storage::TEMP_C,
                cold_storage::SETPOINT_C,
                cold_storage::PRESSURE_BAR,
                cold_storage::EFFICIENCY_PCT,
                cold_storage::DEFROST_ACTIVE,
                cold_storage::ENERGY_KWH,
            ]),
            counter_reads: paths.resolve_all(&[
                line_a::BOTTLES_PRODUCED,
                line_a::ENERGY_KWH,
                line_b::CASES_PACKED,
                line_b::ENERGY_KWH,
                climate::RUNTIME_HOURS,
                climate::ENERGY_KWH,
                cold_storage::ENERGY_KWH,
            ]),
        }
    }

    /// Runs the stage for one tick, one write batch per unit.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] if a counter cannot be read back or the store
    /// rejects a batch. Units written before the failure stay written.
    pub fn run<S: TagStore, R: RandomSource>(
        &self,
        rng: &mut R,
        store: &mut S,
    ) -> Result<EquipmentSnapshot, StageError> {
        let v = read_numbers(store, &self.counter_reads)?;
        let prev = Previous {
            bottles: v[0],
            line_a_kwh: v[1],
            cases: v[2],
            line_b_kwh: v[3],
            climate_runtime_h: v[4],
            climate_kwh: v[5],
            cold_storage_kwh: v[6],
        };

        let line_a = line_a_reading(&prev, rng);
        let line_b = line_b_reading(&prev, rng);
        let compressor = compressor_reading(rng);
        let climate = climate_reading(&prev, rng);
        let cold_storage = cold_storage_reading(&prev, rng);

        write_batch(
            store,
            &self.line_a_tags,
            vec![
                line_a.running.into(),
                line_a.power_kw.into(),
                TagValue::Int(line_a.speed_bpm),
                TagValue::Int(line_a.bottles_produced),
                line_a.efficiency_pct.into(),
                line_a.energy_kwh.into(),
                line_a.energy_per_bottle_wh.into(),
                line_a.alarm.into(),
            ],
        )?;
        write_batch(
            store,
            &self.line_b_tags,
            vec![
                line_b.running.into(),
                line_b.power_kw.into(),
                TagValue::Int(line_b.speed_cpm),
                TagValue::Int(line_b.cases_packed),
                line_b.efficiency_pct.into(),
                line_b.energy_kwh.into(),
            ],
        )?;
        write_batch(
            store,
            &self.compressor_tags,
            vec![
                compressor.running.into(),
                compressor.power_kw.into(),
                compressor.pressure_bar.into(),
                compressor.efficiency_pct.into(),
                compressor.motor_temp_c.into(),
            ],
        )?;
        write_batch(
            store,
            &self.climate_tags,
            vec![
                climate.running.into(),
                climate.power_kw.into(),
                climate.room_temp_c.into(),
                climate.setpoint_c.into(),
                climate.efficiency_pct.into(),
                climate.runtime_hours.into(),
                climate.energy_kwh.into(),
            ],
        )?;
        write_batch(
            store,
            &self.cold_storage_tags,
            vec![
                cold_storage.running.into(),
                cold_storage.power_kw.into(),
                cold_storage.temp_c.into(),
                cold_storage.setpoint_c.into(),
                cold_storage.pressure_bar.into(),
                cold_storage.efficiency_pct.into(),
                cold_storage.defrost_active.into(),
                cold_storage.energy_kwh.into(),
            ],
        )?;

        Ok(EquipmentSnapshot {
            line_a,
            line_b,
            compressor,
            climate,
            cold_storage,
        })
    }
}

fn line_a_reading<R: RandomSource>(prev: &Previous, rng: &mut R) -> LineAReading {
    let running = rng.bernoulli(LINE_A_DUTY);
    let power_kw = if running {
        rng.reading(200.0, 450.0)
    } else {
        rng.reading(30.0, 60.0)
    };
    let speed_bpm = if running {
        rng.uniform_int(400, 600)
    } else {
        0
    };

    let mut bottles_produced = prev.bottles as i64;
    if running {
        // Whole bottles completed in one second.
        bottles_produced += speed_bpm / 60;
    }
    let efficiency_pct = if running {
        speed_bpm as f64 / LINE_A_RATED_BPM * 100.0
    } else {
        0.0
    };
    let energy_kwh = prev.line_a_kwh + power_kw * TICK_HOURS;
    let energy_per_bottle_wh = if bottles_produced > 0 {
        energy_kwh * 1000.0 / bottles_produced as f64
    } else {
        0.0
    };

    LineAReading {
        running,
        power_kw,
        speed_bpm,
        bottles_produced,
        efficiency_pct,
        energy_kwh,
        energy_per_bottle_wh,
        alarm: power_kw > LINE_A_ALARM_KW,
    }
}

fn line_b_reading<R: RandomSource>(prev: &Previous, rng: &mut R) -> LineBReading {
    let running = rng.bernoulli(LINE_B_DUTY);
    let power_kw = if running {
        rng.reading(100.0, 250.0)
    } else {
        rng.reading(20.0, 40.0)
    };
    let speed_cpm = if running {
        rng.uniform_int(15, 30)
    } else {
        0
    };

    // Fractional cases are dropped when the count is stored as an integer.
    let cases_packed = if running {
        (prev.cases + speed_cpm as f64 / 60.0).trunc() as i64
    } else {
        prev.cases as i64
    };
    let efficiency_pct = if running {
        speed_cpm as f64 / LINE_B_RATED_CPM * 100.0
    } else {
        0.0
    };

    LineBReading {
        running,
        power_kw,
        speed_cpm,
        cases_packed,
        efficiency_pct,
        energy_kwh: prev.line_b_kwh + power_kw * TICK_HOURS,
    }
}

/// Pressure, efficiency and motor temperature are sampled whether or not the
/// compressor runs.
fn compressor_reading<R: RandomSource>(rng: &mut R) -> CompressorReading {
    let running = rng.bernoulli(COMPRESSOR_DUTY);
    let power_kw = if running {
        rng.reading(30.0, 60.0)
    } else {
        rng.reading(5.0, 10.0)
    };
    CompressorReading {
        running,
        power_kw,
        pressure_bar: rng.reading(6.0, 9.0),
        efficiency_pct: rng.reading(80.0, 95.0),
        motor_temp_c: rng.reading(50.0, 80.0),
    }
}

fn climate_reading<R: RandomSource>(prev: &Previous, rng: &mut R) -> ClimateReading {
    let running = rng.bernoulli(CLIMATE_DUTY);
    let power_kw = if running {
        rng.reading(20.0, 60.0)
    } else {
        rng.reading(5.0, 10.0)
    };
    let room_temp_c = if running {
        rng.reading(20.0, 26.0)
    } else {
        rng.reading(26.0, 30.0)
    };
    let runtime_hours = if running {
        prev.climate_runtime_h + TICK_HOURS
    } else {
        prev.climate_runtime_h
    };
    ClimateReading {
        running,
        power_kw,
        room_temp_c,
        setpoint_c: CLIMATE_SETPOINT_C,
        efficiency_pct: setpoint_efficiency(room_temp_c, CLIMATE_SETPOINT_C, 3.0, 70.0, 100.0),
        runtime_hours,
        energy_kwh: prev.climate_kwh + power_kw * TICK_HOURS,
    }
}

fn cold_storage_reading<R: RandomSource>(prev: &Previous, rng: &mut R) -> ColdStorageReading {
    let running = rng.bernoulli(COLD_STORAGE_DUTY);
    let power_kw = if running {
        rng.reading(100.0, 300.0)
    } else {
        rng.reading(20.0, 50.0)
    };
    let temp_c = if running {
        rng.reading(2.0, 8.0)
    } else {
        rng.reading(8.0, 15.0)
    };
    let pressure_bar = rng.reading(3.0, 10.0);
    let defrost_active = rng.bernoulli(DEFROST_CHANCE);
    ColdStorageReading {
        running,
        power_kw,
        temp_c,
        setpoint_c: COLD_STORAGE_SETPOINT_C,
        pressure_bar,
        efficiency_pct: setpoint_efficiency(temp_c, COLD_STORAGE_SETPOINT_C, 5.0, 70.0, 95.0),
        defrost_active,
        energy_kwh: prev.cold_storage_kwh + power_kw * TICK_HOURS,
    }
}

/// `100 - |temp - setpoint| * penalty`, clamped to `[floor, ceiling]`.
fn setpoint_efficiency(temp_c: f64, setpoint_c: f64, penalty: f64, floor: f64, ceiling: f64) -> f64 {
    (100.0 - (temp_c - setpoint_c).abs() * penalty).clamp(floor, ceiling)
}
