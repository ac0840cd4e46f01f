use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

mod cli;

use cli::Cli;
use cli::commands::Commands;
use repairloop::codec::{self, Encoder, Value};
use repairloop::config::Config;
use repairloop::domain::PatchRecord;
use repairloop::patch::{MatchPolicy, PatchApplier};

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repairloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("repairloop.log");

    // Setup env_logger with file output; RUST_LOG wins over the config level
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.unwrap_or("info")))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Encode { input } => handle_encode_command(input.as_deref(), config),
        Commands::Decode { input } => handle_decode_command(input.as_deref()),
        Commands::Apply {
            patch,
            no_backup,
            strict,
            base_dirs,
        } => handle_apply_command(patch, *no_backup, *strict, base_dirs, cli.is_verbose(), config),
    }
}

/// Read a file, or stdin when no path (or "-") is given.
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).context(format!("Failed to read {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn handle_encode_command(input: Option<&Path>, config: &Config) -> Result<()> {
    info!("Encoding JSON from {:?}", input);
    let text = read_input(input)?;
    let json: serde_json::Value = serde_json::from_str(&text).context("Input is not valid JSON")?;
    let value = Value::from(json);
    println!("{}", Encoder::with_indent(config.codec.indent).encode(&value));
    Ok(())
}

fn handle_decode_command(input: Option<&Path>) -> Result<()> {
    info!("Decoding wire text from {:?}", input);
    let text = read_input(input)?;
    let value = codec::decode(&text).context("Failed to decode wire text")?;
    let json = serde_json::Value::from(&value);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn handle_apply_command(
    patch_path: &Path,
    no_backup: bool,
    strict: bool,
    base_dirs: &[PathBuf],
    verbose: bool,
    config: &Config,
) -> Result<()> {
    info!("Applying patch from {}", patch_path.display());
    let text = read_input(Some(patch_path))?;
    let patch = PatchRecord::from_wire(&text).context("Failed to decode patch")?;

    let mut patch_config = config.patch.clone();
    if no_backup {
        patch_config.create_backups = false;
    }
    if strict {
        patch_config.match_policy = MatchPolicy::Strict;
    }
    if !base_dirs.is_empty() {
        patch_config.base_dirs = base_dirs.to_vec();
    }

    if verbose {
        eprintln!("{} {}", "Patch:".cyan(), patch);
    }

    let applier = PatchApplier::new(patch_config);
    let report = applier
        .apply(&patch)
        .context(format!("Failed to apply patch to {}", patch.file_path()))?;

    println!(
        "{} {} lines {}",
        "Applied:".green(),
        report.path.display(),
        report.applied_range
    );
    if report.relocated {
        println!(
            "  {} declared lines {} were stale",
            "Relocated:".yellow(),
            patch.line_range()
        );
    }
    if let Some(backup) = &report.backup {
        println!("  {} {}", "Backup:".cyan(), backup.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging at the configured level
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
