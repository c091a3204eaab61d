//! Soils EDD import
//!
//! Loads a laboratory soil chemistry deliverable (one spreadsheet, several
//! stacked tables) into the master soil chemistry dataset.
//!
//! Usage:
//!   `soils-etl run --layout layouts/csu_2022.yaml --migrate`
//!   `soils-etl run --layout layouts/csu_2021.yaml --dry-run --export-csv`
//!   `soils-etl check-layout --layout layouts/csu_2021.yaml`

mod common;
mod config;
mod layout;
mod services;

use crate::common::{errors::EtlError, logging, models::ProcessingStatus};
use crate::config::Config;
use crate::layout::DeliverableLayout;
use crate::services::processing::{
    excel_processor::{EddProcessor, EtlProcessingResult, ImportOptions},
    export::default_export_path,
    row_processing::melt_tables,
    structure::slice_tables,
    utils::load_sheet,
};
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for deliverables rejected by validation
const EXIT_VALIDATION: u8 = 2;

fn layout_arg() -> Arg {
    Arg::new("layout")
        .short('l')
        .long("layout")
        .value_name("FILE")
        .help("Deliverable layout (YAML)")
        .value_parser(value_parser!(PathBuf))
        .required(true)
}

fn cli() -> Command {
    Command::new("soils-etl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Imports laboratory soil chemistry EDDs into the soil chemistry dataset")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Validate a deliverable and append it to the dataset")
                .arg(layout_arg())
                .arg(
                    Arg::new("db-url")
                        .long("db-url")
                        .value_name("URL")
                        .help("Database URL, overrides DB_URL"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Run every validation, append nothing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("export-csv")
                        .long("export-csv")
                        .value_name("PATH")
                        .help("Write the pre-processed rows to CSV (default: <workspace>/<out_name>.csv)")
                        .num_args(0..=1)
                        .default_missing_value(""),
                )
                .arg(
                    Arg::new("migrate")
                        .long("migrate")
                        .help("Create the soils tables if they do not exist")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check-layout")
                .about("Slice and reshape a deliverable without touching the database")
                .arg(layout_arg()),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            let validation = e
                .downcast_ref::<EtlError>()
                .is_some_and(EtlError::is_validation);
            if validation {
                println!(
                    "{} Deliverable rejected, nothing was appended. Fix the lookups listed above and re-run.",
                    style("✗").red()
                );
                ExitCode::from(EXIT_VALIDATION)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("No subcommand given");
    };
    let layout_path = args
        .get_one::<PathBuf>("layout")
        .context("--layout is required")?;

    let layout = match DeliverableLayout::from_file(layout_path) {
        Ok(layout) => layout,
        Err(e) => {
            logging::init_tracing(None)?;
            return Err(e)
                .with_context(|| format!("Failed to load layout {}", layout_path.display()));
        }
    };

    match name {
        "run" => run_import(&layout, args).await,
        "check-layout" => check_layout(&layout),
        other => anyhow::bail!("Unknown subcommand '{other}'"),
    }
}

async fn run_import(layout: &DeliverableLayout, args: &ArgMatches) -> Result<ExitCode> {
    let today = Local::now().date_naive();
    let log_path = logging::init_run_logging(layout, today)?;

    let config = Config::with_db_url(args.get_one::<String>("db-url").cloned())?;
    tracing::info!(
        "{}: processing {} (log: {})",
        config.app_name,
        layout.input_file.display(),
        log_path.display()
    );

    let db: DatabaseConnection = Database::connect(config.db_url.as_str())
        .await
        .context("Failed to connect to the database")?;

    if args.get_flag("migrate") {
        Migrator::up(&db, None)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("DB migrations complete");
    }

    let options = ImportOptions {
        dry_run: args.get_flag("dry-run"),
        export_csv: args.get_one::<String>("export-csv").map(|path| {
            if path.is_empty() {
                default_export_path(layout)
            } else {
                PathBuf::from(path)
            }
        }),
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let result = EddProcessor::new(db)
        .process_deliverable(layout, &options, Some(&pb))
        .await;
    pb.finish_and_clear();

    let result = result?;
    print_summary(&result);

    Ok(match result.status {
        ProcessingStatus::Completed | ProcessingStatus::Validated => ExitCode::SUCCESS,
        ProcessingStatus::CompletedWithFailures => ExitCode::FAILURE,
    })
}

fn check_layout(layout: &DeliverableLayout) -> Result<ExitCode> {
    logging::init_tracing(None)?;

    let rows = load_sheet(&layout.input_file, &layout.sheet)
        .with_context(|| format!("Failed to read {}", layout.input_file.display()))?;
    let tables = slice_tables(&rows, layout)?;
    let records = melt_tables(&tables, layout.no_data_sentinel.as_deref());

    println!("{}", style(layout.input_file.display()).bold());
    for table in &tables {
        println!(
            "  {} row {:>4}: {:>3} records x {:>2} parameters",
            style(format!("[table {}]", table.index)).bold().dim(),
            table.anchor_row + 1,
            table.rows.len(),
            table.parameters.len()
        );
    }
    println!(
        "{} {} long-format records",
        style("✓").green(),
        style(records.len()).bold().green()
    );

    Ok(ExitCode::SUCCESS)
}

fn print_summary(result: &EtlProcessingResult) {
    let status = match result.status {
        ProcessingStatus::Completed => style("completed").green(),
        ProcessingStatus::Validated => style("validated (dry run)").cyan(),
        ProcessingStatus::CompletedWithFailures => style("completed with failures").yellow(),
    };

    println!("{} Import {status}", style("✓").green());
    println!(
        "   Tables: {}  Records: {}  Samples: {}",
        style(result.tables_sliced).bold(),
        style(result.records_melted).bold(),
        style(result.samples_resolved).bold()
    );
    println!(
        "   Appended: {}  Failed: {}",
        style(result.rows_appended).bold().green(),
        style(result.rows_failed).bold().red()
    );
    if let Some(path) = &result.export_path {
        println!("   Exported: {}", style(path.display()).cyan());
    }
    for error in &result.errors {
        println!("   {} {error}", style("!").yellow());
    }
}
