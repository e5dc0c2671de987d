#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line batch driver for the bar salience stimulus generator.

mod batch;
mod sweep;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::batch::BalanceReport;

const DEFAULT_SEED: u64 = 0x6261_7273;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate every sweep and write one JSON batch per sweep
    Generate(GenerateArgs),
    /// Check that every config of every sweep is feasible without generating
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Directory receiving the batch files
    #[arg(long, default_value = "stimuli_range")]
    out_dir: PathBuf,

    /// Global seed every stimulus seed is derived from
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Sweep definitions in TOML; the built-in presets are used when omitted
    #[arg(long)]
    sweeps: Option<PathBuf>,

    /// Only run the named sweeps (repeatable)
    #[arg(long)]
    only: Vec<String>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Sweep definitions in TOML; the built-in presets are used when omitted
    #[arg(long)]
    sweeps: Option<PathBuf>,
}

/// Entry point for the bar salience command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Generate(args) => generate(&args),
        Command::Check(args) => check(&args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let sweeps = sweep::select(sweep::load(args.sweeps.as_deref())?, &args.only)?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    for sweep in &sweeps {
        let stimuli = batch::generate(sweep, args.seed)
            .with_context(|| format!("sweep `{}` could not be generated", sweep.name))?;

        let report = BalanceReport::tally(&stimuli);
        for (cues, count) in report.counts() {
            info!(sweep = %sweep.name, flags = ?cues.flags(), count, "condition balance");
        }
        if !report.is_balanced() {
            warn!(sweep = %sweep.name, "conditions are not evenly represented");
        }

        let path = args.out_dir.join(&sweep.output);
        batch::write(&path, sweep, args.seed, &stimuli)?;
        info!(
            sweep = %sweep.name,
            stimuli = stimuli.len(),
            path = %path.display(),
            "wrote batch"
        );
    }
    Ok(())
}

fn check(args: &CheckArgs) -> Result<()> {
    let sweeps = sweep::load(args.sweeps.as_deref())?;
    let mut infeasible = 0usize;
    for sweep in &sweeps {
        for (ordinal, config) in sweep.configs().iter().enumerate() {
            if let Err(error) = config.validate() {
                infeasible += 1;
                warn!(sweep = %sweep.name, ordinal, %error, "infeasible configuration");
            }
        }
        info!(sweep = %sweep.name, configs = sweep.configs().len(), "checked sweep");
    }

    if infeasible > 0 {
        bail!("{infeasible} configurations are infeasible");
    }
    Ok(())
}
