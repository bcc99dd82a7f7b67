use std::env;
use std::path::PathBuf;

/// Command-line overrides layered on top of the TOML configuration.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub ticks: Option<u64>,
    pub telemetry_out: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                if opts.seed.replace(seed).is_some() {
                    return Err("--seed provided more than once".to_string());
                }
            }
            "--ticks" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --ticks (expected a tick count)")?;
                let ticks = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("--ticks value \"{raw}\" is not a positive integer"))?;
                if opts.ticks.replace(ticks).is_some() {
                    return Err("--ticks provided more than once".to_string());
                }
            }
            "--telemetry-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --telemetry-out (expected a file path)",
                )?;
                if opts.telemetry_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--telemetry-out provided more than once".to_string());
                }
            }
            "--state" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --state (expected a JSON file path)")?;
                if opts.state.replace(PathBuf::from(path)).is_some() {
                    return Err("--state provided more than once".to_string());
                }
            }
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("plant-sim: synthetic plant energy and equipment tag generator");
    eprintln!();
    eprintln!("Usage: plant-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from a TOML file");
    eprintln!("  --seed <u64>             Override the random seed");
    eprintln!("  --ticks <n>              Stop after n ticks");
    eprintln!("  --telemetry-out <path>   Stream per-tick rows to CSV");
    eprintln!("  --state <path>           JSON tag state file to resume from and save to");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Without --ticks the simulator runs until interrupted (Ctrl-C).");
}
