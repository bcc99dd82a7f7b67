//! Energy-source stage: solar array, diesel backup generator and grid feed.

use crate::tags::paths::{generator, grid, solar, totals};
use crate::tags::{TagPaths, TagStore, TagValue};

use super::clock::TimeContext;
use super::error::{StageError, read_numbers, write_batch};
use super::random::RandomSource;
use super::types::{
    EnergyCounters, EnergySnapshot, GeneratorReading, GridReading, SolarReading, TICK_HOURS,
    current_a,
};

/// Probability the backup generator is running in any given tick.
const GENERATOR_DUTY: f64 = 0.2;

/// Day factor above which the grid is drawn from its peak band.
const GRID_PEAK_FACTOR: f64 = 0.5;

/// Synthesizes one reading per source per tick and advances each source's
/// energy counter.
///
/// Generator running state is drawn fresh every tick; nothing about the
/// previous tick's state is carried over except the cumulative counters.
#[derive(Debug, Clone)]
pub struct EnergySourceSimulator {
    solar_tags: Vec<String>,
    generator_tags: Vec<String>,
    grid_tags: Vec<String>,
    totals_tags: Vec<String>,
    /// Read back at the start of the tick: run-hours, then the three kWh counters.
    counter_reads: Vec<String>,
    /// Written at the end: solar, generator, grid kWh.
    counter_writes: Vec<String>,
}

impl EnergySourceSimulator {
    pub fn new(paths: &TagPaths) -> Self {
        Self {
            solar_tags: paths.resolve_all(&[
                solar::POWER_KW,
                solar::VOLTAGE_V,
                solar::CURRENT_A,
                solar::IRRADIANCE_WM2,
                solar::PANEL_TEMP_C,
                solar::EFFICIENCY_PCT,
            ]),
            generator_tags: paths.resolve_all(&[
                generator::POWER_KW,
                generator::VOLTAGE_V,
                generator::CURRENT_A,
                generator::RUNNING,
                generator::FUEL_LEVEL_PCT,
                generator::RUN_HOURS,
                generator::RPM,
                generator::ENGINE_TEMP_C,
            ]),
            grid_tags: paths.resolve_all(&[
                grid::POWER_KW,
                grid::VOLTAGE_V,
                grid::CURRENT_A,
                grid::POWER_FACTOR,
                grid::FREQUENCY_HZ,
            ]),
            totals_tags: paths.resolve_all(&[totals::GRID_PLUS_SOLAR_KW, totals::TOTAL_POWER_KW]),
            counter_reads: paths.resolve_all(&[
                generator::RUN_HOURS,
                solar::ENERGY_KWH,
                generator::ENERGY_KWH,
                grid::ENERGY_KWH,
            ]),
            counter_writes: paths.resolve_all(&[
                solar::ENERGY_KWH,
                generator::ENERGY_KWH,
                grid::ENERGY_KWH,
            ]),
        }
    }

    /// Runs the stage for one tick.
    ///
    /// All counters are read before anything is written. Writes go out as
    /// one batch per source, then aggregates, then energy counters.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] if a counter cannot be read back or the store
    /// rejects a batch. Batches written before the failure stay written.
    pub fn run<S: TagStore, R: RandomSource>(
        &self,
        time: &TimeContext,
        rng: &mut R,
        store: &mut S,
    ) -> Result<EnergySnapshot, StageError> {
        let prev = read_numbers(store, &self.counter_reads)?;
        let (prev_run_hours, prev_solar, prev_generator, prev_grid) =
            (prev[0], prev[1], prev[2], prev[3]);

        let solar = solar_reading(time.day_factor, rng);
        let generator = generator_reading(prev_run_hours, rng);
        let grid = grid_reading(time.day_factor, rng);

        let grid_plus_solar_kw = grid.power_kw + solar.power_kw;
        let total_power_kw = grid_plus_solar_kw + generator.power_kw;

        let counters = EnergyCounters {
            solar_kwh: prev_solar + solar.power_kw * TICK_HOURS,
            generator_kwh: prev_generator + generator.power_kw * TICK_HOURS,
            grid_kwh: prev_grid + grid.power_kw * TICK_HOURS,
        };

        write_batch(
            store,
            &self.solar_tags,
            vec![
                solar.power_kw.into(),
                solar.voltage_v.into(),
                solar.current_a.into(),
                solar.irradiance_wm2.into(),
                solar.panel_temp_c.into(),
                solar.efficiency_pct.into(),
            ],
        )?;
        write_batch(
            store,
            &self.generator_tags,
            vec![
                generator.power_kw.into(),
                generator.voltage_v.into(),
                generator.current_a.into(),
                generator.running.into(),
                generator.fuel_level_pct.into(),
                generator.run_hours.into(),
                TagValue::Int(generator.rpm),
                generator.engine_temp_c.into(),
            ],
        )?;
        write_batch(
            store,
            &self.grid_tags,
            vec![
                grid.power_kw.into(),
                grid.voltage_v.into(),
                grid.current_a.into(),
                grid.power_factor.into(),
                grid.frequency_hz.into(),
            ],
        )?;
        write_batch(
            store,
            &self.totals_tags,
            vec![grid_plus_solar_kw.into(), total_power_kw.into()],
        )?;
        write_batch(
            store,
            &self.counter_writes,
            vec![
                counters.solar_kwh.into(),
                counters.generator_kwh.into(),
                counters.grid_kwh.into(),
            ],
        )?;

        Ok(EnergySnapshot {
            solar,
            generator,
            grid,
            grid_plus_solar_kw,
            total_power_kw,
            counters,
        })
    }
}

/// Output and irradiance both scale with the day factor.
fn solar_reading<R: RandomSource>(day_factor: f64, rng: &mut R) -> SolarReading {
    let power_kw = rng.reading(50.0, 300.0) * day_factor;
    let voltage_v = rng.reading(400.0, 450.0);
    let efficiency_pct = rng.reading(80.0, 95.0);
    let irradiance_wm2 = rng.reading(500.0, 1000.0) * day_factor;
    let panel_temp_c = rng.reading(30.0, 55.0);
    SolarReading {
        power_kw,
        voltage_v,
        current_a: current_a(power_kw, voltage_v),
        irradiance_wm2,
        panel_temp_c,
        efficiency_pct,
    }
}

fn generator_reading<R: RandomSource>(prev_run_hours: f64, rng: &mut R) -> GeneratorReading {
    let running = rng.bernoulli(GENERATOR_DUTY);
    let power_kw = if running {
        rng.reading(100.0, 800.0)
    } else {
        0.0
    };
    let voltage_v = rng.reading(380.0, 420.0);
    let fuel_level_pct = if running {
        rng.reading(20.0, 100.0)
    } else {
        rng.reading(50.0, 100.0)
    };
    let rpm = if running {
        rng.uniform_int(800, 1800)
    } else {
        0
    };
    let engine_temp_c = if running {
        rng.reading(60.0, 95.0)
    } else {
        rng.reading(30.0, 40.0)
    };
    let run_hours = if running {
        prev_run_hours + TICK_HOURS
    } else {
        prev_run_hours
    };
    GeneratorReading {
        running,
        power_kw,
        voltage_v,
        current_a: current_a(power_kw, voltage_v),
        fuel_level_pct,
        rpm,
        engine_temp_c,
        run_hours,
    }
}

/// Grid import runs higher while the day factor is high.
fn grid_reading<R: RandomSource>(day_factor: f64, rng: &mut R) -> GridReading {
    let power_kw = if day_factor > GRID_PEAK_FACTOR {
        rng.reading(1200.0, 1800.0)
    } else {
        rng.reading(800.0, 1600.0)
    };
    let voltage_v = rng.reading(415.0, 440.0);
    let power_factor = rng.reading(0.85, 0.98);
    let frequency_hz = rng.reading(49.8, 50.2);
    GridReading {
        power_kw,
        voltage_v,
        current_a: current_a(power_kw, voltage_v),
        power_factor,
        frequency_hz,
    }
}
