//! CSV telemetry export, one row per tick.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::sim::types::{EnergySnapshot, TickReport};

/// Column header for CSV telemetry export.
const HEADER: &str = "tick,timestamp,hour,day_factor,solar_kw,generator_kw,grid_kw,\
                       total_power_kw,generator_running,shift,shift_energy_kwh,failures";

/// Streams tick reports to a CSV destination.
///
/// Rows are flushed as they are written so a long-running process leaves a
/// readable file behind if it is killed.
pub struct TelemetryWriter<W: Write> {
    wtr: csv::Writer<W>,
    rows: u64,
}

impl TelemetryWriter<BufWriter<File>> {
    /// Creates (or truncates) a CSV file at `path` and writes the header.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if file creation or writing fails.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> TelemetryWriter<W> {
    /// Wraps any writer and emits the header row.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if writing the header fails.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);
        wtr.write_record(HEADER.split(',').map(str::trim))?;
        wtr.flush()?;
        Ok(Self { wtr, rows: 0 })
    }

    /// Appends one row for `report`. Columns owned by a failed stage are empty.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if writing fails.
    pub fn write_report(&mut self, report: &TickReport) -> io::Result<()> {
        let energy = report.energy.as_ref();

        self.wtr.write_record(&[
            report.tick.to_string(),
            report.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            report.hour.to_string(),
            format!("{:.1}", report.day_factor),
            kw(energy, |e| e.solar.power_kw),
            kw(energy, |e| e.generator.power_kw),
            kw(energy, |e| e.grid.power_kw),
            kw(energy, |e| e.total_power_kw),
            energy
                .map(|e| e.generator.running.to_string())
                .unwrap_or_default(),
            report
                .shift
                .as_ref()
                .map(|s| s.shift().to_string())
                .unwrap_or_default(),
            report
                .shift
                .as_ref()
                .map(|s| format!("{:.6}", s.shift_energy_kwh()))
                .unwrap_or_default(),
            report.failures.len().to_string(),
        ])?;
        self.wtr.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far (header excluded).
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the final flush fails.
    pub fn into_inner(self) -> io::Result<W> {
        self.wtr.into_inner().map_err(|e| e.into_error())
    }
}

fn kw(energy: Option<&EnergySnapshot>, field: impl Fn(&EnergySnapshot) -> f64) -> String {
    energy.map(|e| format!("{:.4}", field(e))).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::sim::error::{Stage, StageError};
    use crate::sim::types::{ShiftUpdate, StageFailure};

    fn make_report(tick: u64) -> TickReport {
        let timestamp = NaiveDate::from_ymd_opt(2024, 6, 3)
            .and_then(|d| d.and_hms_opt(10, 0, 5))
            .unwrap_or_default();
        TickReport {
            tick,
            timestamp,
            hour: 10,
            day_factor: 1.0,
            energy: None,
            equipment: None,
            shift: Some(ShiftUpdate::Accumulated {
                shift: 1,
                added_kwh: 0.5,
                shift_energy_kwh: 12.25,
            }),
            failures: vec![StageFailure {
                stage: Stage::EnergySources,
                error: StageError::Computation("boom".into()),
            }],
        }
    }

    fn render(reports: &[TickReport]) -> String {
        let mut writer = match TelemetryWriter::new(Vec::new()) {
            Ok(w) => w,
            Err(e) => panic!("header write failed: {e}"),
        };
        for r in reports {
            writer.write_report(r).ok();
        }
        let buf = writer.into_inner().unwrap_or_default();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_matches_column_layout() {
        let output = render(&[]);
        assert_eq!(
            output.lines().next().unwrap_or(""),
            "tick,timestamp,hour,day_factor,solar_kw,generator_kw,grid_kw,\
             total_power_kw,generator_running,shift,shift_energy_kwh,failures"
        );
    }

    #[test]
    fn row_count_matches_tick_count() {
        let reports: Vec<TickReport> = (0..5).map(make_report).collect();
        let output = render(&reports);
        assert_eq!(output.lines().count(), 6);
    }

    #[test]
    fn failed_stage_leaves_columns_empty() {
        let output = render(&[make_report(3)]);
        let row = output.lines().nth(1).unwrap_or("");
        assert_eq!(row, "3,2024-06-03T10:00:05,10,1.0,,,,,,1,12.250000,1");
    }

    #[test]
    fn rows_counter_tracks_writes() {
        let mut writer = match TelemetryWriter::new(Vec::new()) {
            Ok(w) => w,
            Err(e) => panic!("header write failed: {e}"),
        };
        writer.write_report(&make_report(0)).ok();
        writer.write_report(&make_report(1)).ok();
        assert_eq!(writer.rows(), 2);
    }

    #[test]
    fn create_writes_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("telemetry.csv");
        let mut writer = match TelemetryWriter::create(&path) {
            Ok(w) => w,
            Err(e) => panic!("create failed: {e}"),
        };
        writer.write_report(&make_report(0)).ok();
        drop(writer);
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(content.lines().count(), 2);
    }
}
