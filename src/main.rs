use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod aggregate;
mod attributes;
mod brands;
mod classify;
mod config;
mod ingest;
mod links;
mod region;
mod render;
mod report;
mod snapshot;
mod stats;
mod types;
mod utils;

pub const DEFAULT_INPUT: &str = "data/watch_sales.csv";
pub const DEFAULT_REPORT: &str = "output/watch_report.html";
pub const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";

#[derive(Parser)]
#[command(name = "watch-report")]
#[command(about = "Secondhand watch sales report generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every listing of a CSV and write the attributes as CSV
    Attributes {
        /// Sales CSV (needs title and price columns)
        #[arg(value_name = "CSV")]
        input: PathBuf,
        /// Output CSV (default: <CSV stem>.attributes.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// CONL config file (default: watch-report.conl when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Generate the full HTML report
    Report {
        /// Sales CSV (needs title, price and quantity columns)
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,
        /// Output HTML file
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        output: PathBuf,
        /// CONL config file (default: watch-report.conl when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Regenerate one tab of an existing report in place
    RebuildTab {
        /// "overview", a brand name or a tab id (e.g. "seiko", "tab-casio")
        #[arg(value_name = "BRAND|overview")]
        target: String,
        /// Sales CSV
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,
        /// Report to update
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        report: PathBuf,
        /// CONL config file (default: watch-report.conl when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Save or check golden master snapshots of report tabs
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Save a tab of the report as the reference snapshot
    Save {
        /// Tab element id (e.g. "tab-casio")
        #[arg(value_name = "TAB_ID")]
        tab_id: String,
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        report: PathBuf,
        /// Snapshot directory
        #[arg(short, long, default_value = DEFAULT_SNAPSHOT_DIR)]
        dir: PathBuf,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Fail if a tab lost tables, rows or headings since its snapshot
    Check {
        /// Tab element id (e.g. "tab-casio")
        #[arg(value_name = "TAB_ID")]
        tab_id: String,
        #[arg(short, long, default_value = DEFAULT_REPORT)]
        report: PathBuf,
        /// Snapshot directory
        #[arg(short, long, default_value = DEFAULT_SNAPSHOT_DIR)]
        dir: PathBuf,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Attributes {
            input,
            output,
            config,
            quiet,
        } => attributes::run_attributes(&input, output.as_deref(), config.as_deref(), quiet),
        Commands::Report {
            input,
            output,
            config,
            quiet,
        } => report::run_report(&input, &output, config.as_deref(), quiet),
        Commands::RebuildTab {
            target,
            input,
            report,
            config,
            quiet,
        } => report::run_rebuild_tab(&target, &input, &report, config.as_deref(), quiet),
        Commands::Snapshot { action } => match action {
            SnapshotAction::Save {
                tab_id,
                report,
                dir,
                quiet,
            } => snapshot::run_snapshot_save(&tab_id, &report, &dir, quiet),
            SnapshotAction::Check {
                tab_id,
                report,
                dir,
                quiet,
            } => snapshot::run_snapshot_check(&tab_id, &report, &dir, quiet),
        },
    }
}
