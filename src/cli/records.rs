use std::path::Path;

use colored::Colorize;

use crate::cli::report::{print_table, record_row, write_csv, EMPTY_WARNING, RECORD_HEADERS};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::fmt::{money, plain};
use crate::reports::cashback_transactions;
use crate::settings::load_settings;

pub fn run(db: Option<&Path>, cashback_only: bool, format: OutputFormat) -> Result<()> {
    let settings = load_settings();
    let store = super::open_store(db, &settings)?;
    let records = if cashback_only {
        cashback_transactions(store.conn())?
    } else {
        store.all_records()?
    };

    match format {
        OutputFormat::Table => {
            if records.is_empty() {
                println!("{}", EMPTY_WARNING.yellow());
                return Ok(());
            }
            let rows: Vec<Vec<String>> = records.iter().map(|r| record_row(r, money)).collect();
            print_table(&format!("Expenses ({})", records.len()), &RECORD_HEADERS, &rows);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Csv => {
            let rows: Vec<Vec<String>> = records.iter().map(|r| record_row(r, plain)).collect();
            write_csv(std::io::stdout().lock(), &RECORD_HEADERS, &rows)?;
        }
    }
    Ok(())
}
