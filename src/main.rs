//! Command-line front end: pick a report, a job number and a vehicle type,
//! and fill in the job sheet.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use mcm_sheet_sync::config::{self, Settings};
use mcm_sheet_sync::{run_sync, SyncRequest, VehicleType};

/// Fill an Excel job sheet row from an MCM diagnostic report
#[derive(Parser)]
#[command(name = "mcm-sheet-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Label prefix in front of report keys (empty for bare labels)
    #[arg(long, global = true)]
    label_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a report into the next blank row of the job sheet
    Sync(SyncArgs),

    /// Print the fields found in a report as JSON
    Extract {
        /// HTML report to read
        #[arg(short, long)]
        report: PathBuf,
    },
}

#[derive(Args)]
struct SyncArgs {
    /// HTML report to read
    #[arg(short, long)]
    report: PathBuf,

    /// Job number (written to "Fixably No.")
    #[arg(short, long)]
    job: String,

    /// Truck, Bus, Off-Highway or International
    #[arg(long)]
    vehicle_type: VehicleType,

    /// Excel job sheet; defaults to the last one used
    #[arg(short, long)]
    workbook: Option<PathBuf>,

    /// Worksheet name; defaults to the first sheet
    #[arg(long)]
    sheet: Option<String>,

    /// JSON file with column header overrides
    #[arg(long)]
    column_map: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = Settings::from_env();
    if let Some(prefix) = cli.label_prefix {
        settings.label_prefix = prefix;
    }

    match cli.command {
        Commands::Sync(args) => sync(args, settings),
        Commands::Extract { report } => {
            let record = settings.extractor().extract_file(&report)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    }
}

fn sync(args: SyncArgs, mut settings: Settings) -> anyhow::Result<()> {
    if args.job.trim().is_empty() {
        bail!("job number must not be empty");
    }
    if args.sheet.is_some() {
        settings.sheet = args.sheet;
    }
    if args.column_map.is_some() {
        settings.column_map = args.column_map;
    }

    let remembered = config::last_workbook_file();
    let workbook = config::resolve_workbook(args.workbook, remembered.as_deref())?;

    let request = SyncRequest {
        document: args.report,
        job_number: args.job.trim().to_string(),
        vehicle_type: args.vehicle_type.label().to_string(),
        spreadsheet: workbook,
    };
    let reconciler = settings.reconciler()?;
    let outcome = run_sync(&request, &settings.extractor(), &reconciler)
        .with_context(|| format!("An error occurred updating {}", request.spreadsheet.display()))?;

    if let Some(file) = remembered {
        if let Err(e) = config::save_last_workbook(&file, &request.spreadsheet) {
            warn!("could not remember workbook: {}", e);
        }
    }

    println!(
        "Excel file updated successfully. (sheet '{}', row {})",
        outcome.sheet_name, outcome.target_row
    );
    Ok(())
}
