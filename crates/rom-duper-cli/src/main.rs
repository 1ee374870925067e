mod commands;
mod logging;
mod progress;
mod report;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use commands::{Cli, Commands, FindArgs};
use dotenv::dotenv;
use progress::CliReporter;
use rom_duper_core::analysis::{file_exists, find_missing_files, DeletionPlan};
use rom_duper_core::catalog::{CatalogSnapshot, VariableExpander};
use rom_duper_core::config::{load_configuration, EntrySource};
use rom_duper_core::fingerprint::normalize;
use rom_duper_core::platform::PlatformDirectory;
use rom_duper_core::{AppConfig, CancelToken, DuplicateEngine, Outcome};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let mut config = load_configuration(args.config.as_deref()).context("Error loading configuration")?;
    if let Some(catalog) = &args.catalog {
        config.catalog_path = catalog.to_string_lossy().into_owned();
    }

    let result = match args.command {
        Some(Commands::Find(find)) => run_find(&config, &find),
        None => run_find(&config, &FindArgs::default()),
        Some(Commands::Missing { source }) => run_missing(&config, source.into()),
        Some(Commands::Normalize { names }) => {
            for name in names {
                println!("{} -> {}", name, normalize(&name).bold());
            }
            Ok(())
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
    Ok(())
}

fn load_catalog(config: &AppConfig) -> Result<CatalogSnapshot> {
    if config.catalog_path.is_empty() {
        anyhow::bail!("No catalog configured; set catalog_path or pass --catalog");
    }
    let path = PathBuf::from(&config.catalog_path);
    CatalogSnapshot::load(&path).with_context(|| format!("Cannot read catalog '{}'", path.display()))
}

/// First Ctrl+C requests a cooperative stop, a second one exits immediately.
fn install_cancel_handler() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            eprintln!("\nForce shutdown requested. Exiting immediately...");
            process::exit(1);
        }
        handler_token.cancel();
        eprintln!("\nCancelling... (press Ctrl+C again to force quit)");
    })
    .context("Failed to set Ctrl+C handler")?;
    Ok(cancel)
}

fn run_find(config: &AppConfig, args: &FindArgs) -> Result<()> {
    let mut settings = config.comparison.clone();
    args.apply(&mut settings);

    let snapshot = load_catalog(config)?;
    let platforms = PlatformDirectory::from_snapshot(&snapshot);
    let expander = VariableExpander::new(&config.variables);
    let cancel = install_cancel_handler()?;

    let engine = DuplicateEngine::new(settings, platforms).with_worker_threads(config.worker_threads);
    let reporter = CliReporter::new();
    let report = match engine.run(&snapshot, &expander, &reporter, &cancel)? {
        Outcome::Completed(report) => report,
        Outcome::Cancelled => {
            warn!("Search cancelled, no results");
            return Ok(());
        }
    };
    drop(reporter);

    report::print_groups(&report.groups, engine.platforms());

    let stats = &report.stats;
    println!();
    info!(
        "Parse: {}, Compare: {}, Group: {}",
        format!("{:.2}s", stats.parse_duration.as_secs_f64()).green(),
        format!("{:.2}s", stats.compare_duration.as_secs_f64()).green(),
        format!("{:.2}s", stats.group_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files from {} entries, {} unresolvable, {} similar pairs",
        format!("{}", stats.items_parsed).cyan(),
        format!("{}", stats.entries_parsed).cyan(),
        format!("{}", stats.excluded_files).cyan(),
        format!("{}", stats.edges_stored).cyan(),
    );
    info!(
        "{} duplicate groups, {} files in groups, {} proposed for deletion",
        format!("{}", report.groups.len()).red(),
        format!("{}", report.duplicate_files()).red(),
        format!("{}", report.proposed_deletions()).red(),
    );

    if let Some(path) = &args.csv {
        report::write_csv(&report.groups, engine.platforms(), path)?;
        info!("Groups written to '{}'", path.display());
    }

    if let Some(dir) = &args.plan {
        let plan = DeletionPlan::from_groups(&report.groups, &snapshot);
        let path = report::write_plan(&plan, dir)?;
        info!(
            "Plan with {} files ({} entries removed) written to '{}'",
            plan.file_count(),
            plan.removed_entries().count(),
            path.display()
        );
    }

    Ok(())
}

fn run_missing(config: &AppConfig, source: EntrySource) -> Result<()> {
    let snapshot = load_catalog(config)?;
    let expander = VariableExpander::new(&config.variables);
    let cancel = install_cancel_handler()?;

    let entries = snapshot.entries_for(source);
    match find_missing_files(&entries, &expander, file_exists, &cancel) {
        Outcome::Completed(missing) if missing.is_empty() => {
            println!("{}", "No missing files".green());
        }
        Outcome::Completed(missing) => report::print_missing(&missing),
        Outcome::Cancelled => warn!("Check cancelled"),
    }
    Ok(())
}
