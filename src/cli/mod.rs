pub mod generate;
pub mod init;
pub mod records;
pub mod report;
pub mod status;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::db::Store;
use crate::error::Result;
use crate::reports::ReportKind;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "spendview", about = "Generate synthetic expenses and report on spending.")]
pub struct Cli {
    /// Database file to use instead of <data_dir>/expenses.db
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the expense database.
    Init {
        /// Path for spendview data (default: ~/.local/share/spendview)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Generate random expenses and store them.
    Generate {
        /// Number of expenses to generate (1-1000)
        #[arg(long, allow_negative_numbers = true)]
        entries: Option<i64>,
        /// First date of the window: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<NaiveDate>,
        /// Last date of the window (inclusive): YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<NaiveDate>,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a report, or every report when no name is given.
    Report {
        /// Report name, e.g. category-totals, top-categories, channel-split
        name: Option<ReportKind>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List stored expenses.
    Records {
        /// Only expenses that earned cashback
        #[arg(long = "cashback-only")]
        cashback_only: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show the current database and summary statistics.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub(crate) fn resolve_db_path(db: Option<&Path>, settings: &Settings) -> PathBuf {
    db.map(Path::to_path_buf).unwrap_or_else(|| settings.db_path())
}

pub(crate) fn open_store(db: Option<&Path>, settings: &Settings) -> Result<Store> {
    Store::open_existing(&resolve_db_path(db, settings))
}
