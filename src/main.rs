//! Plant simulator entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use anyhow::{Context, bail};
use tracing::{info, warn};

use plant_sim::cli::{self, CliOptions};
use plant_sim::config::PlantConfig;
use plant_sim::io::TelemetryWriter;
use plant_sim::logging::init_tracing;
use plant_sim::runner::{self, RunOptions};
use plant_sim::sim::clock::SystemClock;
use plant_sim::sim::engine::Engine;
use plant_sim::sim::random::StdRandom;
use plant_sim::tags::{MemoryTagStore, TagPaths};
use plant_sim::tags::memory::StoreSeed;

fn main() {
    let cli = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };
    if cli.help {
        cli::print_usage();
        return;
    }

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: CliOptions) -> anyhow::Result<()> {
    let mut config = match cli.config.as_deref() {
        Some(path) => PlantConfig::from_toml_file(path)?,
        None => PlantConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.engine.seed = Some(seed);
    }
    if let Some(ticks) = cli.ticks {
        config.engine.max_ticks = Some(ticks);
    }
    if let Some(state) = cli.state {
        config.store.state_file = Some(state);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("{} configuration error(s)", errors.len());
    }

    init_tracing(&config.logging.filter);

    let paths = config.tag_paths();
    let store = open_store(&config, &paths)?;
    let mut telemetry = cli
        .telemetry_out
        .as_deref()
        .map(|path| {
            TelemetryWriter::create(path)
                .with_context(|| format!("cannot create telemetry file \"{}\"", path.display()))
        })
        .transpose()?;

    let mut engine = Engine::new(
        &paths,
        store,
        StdRandom::new(config.engine.seed),
        SystemClock,
    );
    let opts = RunOptions {
        interval: config.tick_interval(),
        max_ticks: config.engine.max_ticks,
        snapshot_every: config.engine.snapshot_every_ticks,
        state_file: config.store.state_file.clone(),
    };

    info!(base = paths.base(), seed = ?config.engine.seed, "plant simulator starting");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let summary = runtime.block_on(runner::run(&mut engine, &opts, telemetry.as_mut()));

    if let Some(path) = cli.telemetry_out.as_deref() {
        eprintln!("Telemetry written to {}", path.display());
    }
    if summary.aborted_ticks > 0 {
        warn!(aborted = summary.aborted_ticks, "some ticks were aborted");
    }
    Ok(())
}

/// Resumes from the state file when it exists, otherwise seeds a fresh store.
fn open_store(config: &PlantConfig, paths: &TagPaths) -> anyhow::Result<MemoryTagStore> {
    let seed: StoreSeed = config.store_seed();
    match config.store.state_file.as_deref() {
        Some(path) if path.exists() => resume(path, paths, &seed),
        _ => Ok(MemoryTagStore::seeded(paths, &seed)),
    }
}

fn resume(path: &Path, paths: &TagPaths, seed: &StoreSeed) -> anyhow::Result<MemoryTagStore> {
    let mut store = MemoryTagStore::load_json(path)
        .with_context(|| format!("cannot resume from \"{}\"", path.display()))?;
    let added = store.fill_missing(paths, seed);
    info!(path = %path.display(), tags = store.len(), added, "tag state restored");
    Ok(store)
}
