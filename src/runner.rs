//! Periodic tick driver.
//!
//! Fires the engine on a fixed interval until a tick limit is reached or a
//! shutdown signal arrives, streaming telemetry and snapshotting the tag
//! store along the way.

use std::any::Any;
use std::future::Future;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::io::TelemetryWriter;
use crate::sim::clock::Clock;
use crate::sim::engine::Engine;
use crate::sim::random::RandomSource;
use crate::tags::MemoryTagStore;

/// How the driver paces and persists a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interval: Duration,
    /// Stop after this many ticks; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
    /// Save every N ticks; 0 saves only at shutdown.
    pub snapshot_every: u64,
    pub state_file: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_ticks: None,
            snapshot_every: 60,
            state_file: None,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks attempted, including aborted ones. Matches the engine's
    /// `tick_count` and the `tick` numbering of telemetry rows.
    pub ticks: u64,
    /// Stage failures across all completed ticks.
    pub failed_stages: u64,
    /// Ticks aborted by a panic.
    pub aborted_ticks: u64,
    pub snapshots_saved: u64,
}

/// Runs until `max_ticks` or Ctrl-C.
pub async fn run<R, C, W>(
    engine: &mut Engine<MemoryTagStore, R, C>,
    opts: &RunOptions,
    telemetry: Option<&mut TelemetryWriter<W>>,
) -> RunSummary
where
    R: RandomSource,
    C: Clock,
    W: Write,
{
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for Ctrl-C; running until tick limit");
            std::future::pending::<()>().await;
        }
    };
    run_until(engine, opts, telemetry, shutdown).await
}

/// Runs until `max_ticks` or until `shutdown` resolves.
///
/// Shutdown is only observed between ticks. A tick that panics is logged
/// once and abandoned; the next interval proceeds normally.
pub async fn run_until<R, C, W, F>(
    engine: &mut Engine<MemoryTagStore, R, C>,
    opts: &RunOptions,
    mut telemetry: Option<&mut TelemetryWriter<W>>,
    shutdown: F,
) -> RunSummary
where
    R: RandomSource,
    C: Clock,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut interval = time::interval(opts.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut summary = RunSummary::default();

    info!(
        interval_ms = opts.interval.as_millis() as u64,
        max_ticks = ?opts.max_ticks,
        "simulation started"
    );

    loop {
        if opts.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = interval.tick() => {}
        }

        match panic::catch_unwind(AssertUnwindSafe(|| engine.tick())) {
            Ok(report) => {
                summary.failed_stages += report.failures.len() as u64;
                if let Some(writer) = telemetry.as_deref_mut() {
                    if let Err(err) = writer.write_report(&report) {
                        warn!(error = %err, tick = report.tick, "telemetry row dropped");
                    }
                }
            }
            Err(payload) => {
                summary.aborted_ticks += 1;
                error!(
                    tick = summary.ticks,
                    panic = %panic_message(payload.as_ref()),
                    "tick aborted"
                );
            }
        }
        summary.ticks += 1;

        if opts.snapshot_every > 0 && summary.ticks % opts.snapshot_every == 0 {
            save_state(engine.store(), opts, &mut summary);
        }
    }

    save_state(engine.store(), opts, &mut summary);
    info!(
        ticks = summary.ticks,
        failed_stages = summary.failed_stages,
        aborted_ticks = summary.aborted_ticks,
        "simulation stopped"
    );
    summary
}

fn save_state(store: &MemoryTagStore, opts: &RunOptions, summary: &mut RunSummary) {
    let Some(path) = opts.state_file.as_deref() else {
        return;
    };
    match store.save_json(path) {
        Ok(()) => {
            summary.snapshots_saved += 1;
            info!(path = %path.display(), tags = store.len(), "tag state saved");
        }
        Err(err) => error!(error = %err, "failed to save tag state"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
