//! slidecase - reorganize slide images into per-case folders.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slidecase_core::{
    load_config, validate_config, CaseRegistry, Config, LedgerStore, Organizer, PlacementStatus,
    SqliteCaseRegistry, SqliteLedgerStore, SqliteSnapshotStore, TransferMode,
};

/// Command-line arguments for slidecase
#[derive(Parser, Debug)]
#[command(name = "slidecase")]
#[command(about = "Reorganize slide image downloads into per-case folders")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "slidecase.toml", env = "SLIDECASE_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the raw tree and save the raw index snapshot
    Index,

    /// Merge metadata sources and save the slide map snapshot
    Match,

    /// Plan and place every record (dry run unless --execute)
    Organize {
        /// Touch the filesystem
        #[arg(long)]
        execute: bool,

        /// Replace existing targets (copy) or place beside them (move)
        #[arg(long)]
        overwrite: bool,

        /// Transfer mode: copy or move
        #[arg(long)]
        mode: Option<TransferMode>,

        /// Write the audit report as JSON Lines
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List the case registry
    Cases,

    /// List recent runs
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

fn main() {
    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {:?}", cli.config);
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    if let Command::Organize {
        execute,
        overwrite,
        mode,
        ..
    } = &cli.command
    {
        apply_overrides(&mut config, *execute, *overwrite, *mode);
    }

    validate_config(&config).context("Configuration validation failed")?;
    info!("Database path: {:?}", config.database.path);

    match cli.command {
        Command::Index => index(&config),
        Command::Match => match_metadata(&config),
        Command::Organize { report, .. } => organize(&config, report.as_deref()),
        Command::Cases => cases(&config),
        Command::Runs { limit } => runs(&config, limit),
    }
}

/// Command line flags only ever loosen the config towards acting.
fn apply_overrides(config: &mut Config, execute: bool, overwrite: bool, mode: Option<TransferMode>) {
    if execute {
        config.organize.dry_run = false;
    }
    if overwrite {
        config.organize.overwrite = true;
    }
    if let Some(mode) = mode {
        config.organize.mode = mode;
    }
}

fn snapshot_store(config: &Config) -> Result<Arc<SqliteSnapshotStore>> {
    Ok(Arc::new(
        SqliteSnapshotStore::new(&config.database.path).context("Failed to open snapshot store")?,
    ))
}

fn index(config: &Config) -> Result<()> {
    let organizer = Organizer::from_settings(config.organizer_settings())
        .with_snapshot_store(snapshot_store(config)?);

    let index = organizer.index().context("Failed to index raw tree")?;
    println!(
        "Indexed {} files under {} ({} distinct names, {} duplicated, {} unreadable entries)",
        index.len(),
        index.root().display(),
        index.distinct_names(),
        index.duplicated_names(),
        index.unreadable_entries()
    );
    Ok(())
}

fn match_metadata(config: &Config) -> Result<()> {
    let organizer = Organizer::from_settings(config.organizer_settings())
        .with_snapshot_store(snapshot_store(config)?);

    let report = organizer
        .match_metadata()
        .context("Failed to match metadata")?;
    println!(
        "Matched {} records for {} cases ({} skipped, {} duplicates, {} missing sources)",
        report.records.len(),
        report.records.distinct_cases().len(),
        report.skipped.len(),
        report.duplicates.len(),
        report.missing_sources.len()
    );

    if report.has_failed_sources() {
        for failure in &report.failed_sources {
            eprintln!("source '{}' failed: {}", failure.label, failure.error);
        }
        bail!("{} metadata sources failed", report.failed_sources.len());
    }
    Ok(())
}

fn organize(config: &Config, report_path: Option<&Path>) -> Result<()> {
    let ledger_store: Arc<dyn LedgerStore> = Arc::new(
        SqliteLedgerStore::new(&config.database.path).context("Failed to open ledger store")?,
    );
    let registry: Arc<dyn CaseRegistry> = Arc::new(
        SqliteCaseRegistry::new(&config.database.path).context("Failed to open case registry")?,
    );

    let organizer = Organizer::from_settings(config.organizer_settings())
        .with_ledger_store(ledger_store)
        .with_registry(registry)
        .with_snapshot_store(snapshot_store(config)?);

    let report = organizer.run().context("Run failed")?;

    if let Some(path) = report_path {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file {:?}", path))?;
        report
            .ledger
            .write_report(BufWriter::new(file))
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Report written to {:?}", path);
    }

    println!(
        "Run {} ({}{}): {} rows, {} cases, {} newly registered",
        report.run_id,
        report.mode,
        if report.dry_run { ", dry run" } else { "" },
        report.summary.total,
        report.summary.distinct_cases,
        report.cases_registered
    );
    for status in PlacementStatus::ALL {
        let count = report.count(status);
        if count > 0 {
            println!("  {:<18} {}", status.as_str(), count);
        }
    }
    if report.skipped_items > 0 || report.duplicate_records > 0 {
        println!(
            "  metadata: {} items skipped, {} duplicate records dropped",
            report.skipped_items, report.duplicate_records
        );
    }
    if report.errors() > 0 {
        warn!("{} records failed to transfer, see the ledger", report.errors());
    }

    if report.has_failed_sources() {
        for failure in &report.failed_sources {
            eprintln!("source '{}' failed: {}", failure.label, failure.error);
        }
        bail!("{} metadata sources failed", report.failed_sources.len());
    }
    Ok(())
}

fn cases(config: &Config) -> Result<()> {
    let registry =
        SqliteCaseRegistry::new(&config.database.path).context("Failed to open case registry")?;

    for entry in registry.list().context("Failed to list cases")? {
        println!(
            "{}\t{}\t{}\t{}",
            entry.case_id,
            entry.label,
            entry.first_seen_at.to_rfc3339(),
            entry.first_run_id
        );
    }
    Ok(())
}

fn runs(config: &Config, limit: i64) -> Result<()> {
    let store =
        SqliteLedgerStore::new(&config.database.path).context("Failed to open ledger store")?;

    for run in store.runs(limit).context("Failed to list runs")? {
        let counts = serde_json::to_string(&run.counts).context("Failed to format counts")?;
        println!(
            "{}\t{}\t{}{}\t{}\t{}",
            run.run_id,
            run.started_at.to_rfc3339(),
            run.mode,
            if run.dry_run { " (dry run)" } else { "" },
            run.config_hash,
            counts
        );
    }
    Ok(())
}
