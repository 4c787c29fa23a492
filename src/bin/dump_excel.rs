//! Show where a sync would write in a job sheet, without modifying it.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use mcm_sheet_sync::config::Settings;
use mcm_sheet_sync::excel;
use mcm_sheet_sync::Field;

/// Print the header row, field columns and target row of a job sheet
#[derive(Parser)]
#[command(name = "dump_excel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Excel job sheet to inspect
    workbook: PathBuf,

    /// Worksheet name; defaults to MCM_SHEET, then the first sheet
    sheet: Option<String>,

    /// JSON file with column header overrides
    #[arg(long)]
    column_map: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
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
    if args.sheet.is_some() {
        settings.sheet = args.sheet;
    }
    if args.column_map.is_some() {
        settings.column_map = args.column_map;
    }

    let reconciler = settings.reconciler()?;
    let plan = reconciler.plan(&args.workbook)?;
    println!("sheet:      {}", plan.sheet_name);
    println!("header row: {}", plan.header.row);
    for field in Field::ALL {
        let header = reconciler.column_map().header_for(field).unwrap_or("-");
        let column = plan
            .header
            .column_of(header)
            .map(|c| excel::col_index_to_letter(c - 1))
            .unwrap_or_else(|| "?".to_string());
        println!("  {:<22} {:<18} {}", field.canonical_name(), header, column);
    }
    println!("target row: {}", plan.target_row);
    Ok(())
}
