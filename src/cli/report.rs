use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::OutputFormat;
use crate::error::{Result, SpendError};
use crate::fmt::{money, pct, plain};
use crate::models::ExpenseRecord;
use crate::reports::{run_report, ChannelSplit, Report, ReportKind};
use crate::settings::load_settings;

pub const EMPTY_WARNING: &str = "No expenses found! Run `spendview generate` to add some.";

pub(crate) const RECORD_HEADERS: [&str; 6] =
    ["Date", "Category", "Payment Mode", "Description", "Amount", "Cashback"];

pub fn run(db: Option<&Path>, name: Option<ReportKind>, format: OutputFormat) -> Result<()> {
    let settings = load_settings();
    let store = super::open_store(db, &settings)?;
    let opts = settings.report_options();

    let kinds = match name {
        Some(kind) => vec![kind],
        None => ReportKind::ALL.to_vec(),
    };
    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        match run_report(&store, kind, &opts) {
            Ok(report) => reports.push(report),
            Err(SpendError::EmptyDataset) => {
                println!("{}", EMPTY_WARNING.yellow());
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }

    match format {
        OutputFormat::Table => {
            for report in &reports {
                let (headers, rows) = tabulate(report, true);
                print_table(report.kind().title(), &headers, &rows);
                println!();
            }
        }
        OutputFormat::Json => {
            let json = match reports.as_slice() {
                [single] => serde_json::to_string_pretty(single)?,
                all => serde_json::to_string_pretty(all)?,
            };
            println!("{json}");
        }
        OutputFormat::Csv => {
            let mut out = std::io::stdout().lock();
            for (i, report) in reports.iter().enumerate() {
                if reports.len() > 1 {
                    use std::io::Write;
                    if i > 0 {
                        writeln!(out)?;
                    }
                    writeln!(out, "# {}", report.kind())?;
                }
                let (headers, rows) = tabulate(report, false);
                write_csv(&mut out, &headers, &rows)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn print_table(title: &str, headers: &[&str], rows: &[Vec<String>]) {
    let mut table = Table::new();
    table.set_header(headers.to_vec());
    for row in rows {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    println!("{}\n{table}", title.bold());
}

pub(crate) fn write_csv<W: std::io::Write>(out: W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn record_row(r: &ExpenseRecord, amount: fn(f64) -> String) -> Vec<String> {
    vec![
        r.date.to_string(),
        r.category.to_string(),
        r.payment_mode.to_string(),
        r.description.clone(),
        amount(r.amount),
        amount(r.cashback),
    ]
}

/// Flatten a report into headers and string rows. `human` selects dollar
/// and percent decoration over bare two-decimal numbers.
pub(crate) fn tabulate(report: &Report, human: bool) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let amount: fn(f64) -> String = if human { money } else { plain };
    let share: fn(f64) -> String = if human { pct } else { plain };

    match report {
        Report::CategoryTotals(rows) | Report::TopCategories(rows) => (
            vec!["Category", "Amount"],
            rows.iter().map(|r| vec![r.key.to_string(), amount(r.total)]).collect(),
        ),
        Report::CategoryCashback(rows) => (
            vec!["Category", "Cashback"],
            rows.iter().map(|r| vec![r.key.to_string(), amount(r.total)]).collect(),
        ),
        Report::PaymentModeTotals(rows) | Report::TravelByPaymentMode(rows) => (
            vec!["Payment Mode", "Amount"],
            rows.iter().map(|r| vec![r.key.to_string(), amount(r.total)]).collect(),
        ),
        Report::CashbackTransactions(records) => (
            RECORD_HEADERS.to_vec(),
            records.iter().map(|r| record_row(r, amount)).collect(),
        ),
        Report::MonthlyTotals(rows) => (
            vec!["Month", "Amount"],
            rows.iter().map(|r| vec![r.key.clone(), amount(r.total)]).collect(),
        ),
        Report::MonthlyCashback(rows) => (
            vec!["Month", "Cashback"],
            rows.iter().map(|r| vec![r.key.clone(), amount(r.total)]).collect(),
        ),
        Report::HighlightMonths(rows) => (
            vec!["Month", "Category", "Amount"],
            rows.iter()
                .map(|r| vec![r.month.clone(), r.category.to_string(), amount(r.total)])
                .collect(),
        ),
        Report::CategoryCounts(rows) => (
            vec!["Category", "Transactions"],
            rows.iter().map(|r| vec![r.key.to_string(), r.count.to_string()]).collect(),
        ),
        Report::LowestSpendDay(day) | Report::HighestSpendDay(day) => (
            vec!["Date", "Transactions", "Amount"],
            vec![vec![day.date.to_string(), day.count.to_string(), amount(day.total)]],
        ),
        Report::DailyCounts(rows) => (
            vec!["Date", "Transactions"],
            rows.iter().map(|r| vec![r.key.to_string(), r.count.to_string()]).collect(),
        ),
        Report::MonthlyCounts(rows) => (
            vec!["Month", "Transactions"],
            rows.iter().map(|r| vec![r.key.clone(), r.count.to_string()]).collect(),
        ),
        Report::ChannelSplit(split) => {
            let rows = match split {
                ChannelSplit::Defined { online, cash, online_pct, cash_pct, .. } => vec![
                    vec!["Online".to_string(), online.to_string(), share(*online_pct)],
                    vec!["Cash".to_string(), cash.to_string(), share(*cash_pct)],
                ],
                ChannelSplit::DivisionUndefined => vec![
                    vec!["Online".to_string(), "0".to_string(), "n/a".to_string()],
                    vec!["Cash".to_string(), "0".to_string(), "n/a".to_string()],
                ],
            };
            (vec!["Channel", "Transactions", "Share"], rows)
        }
        Report::CashbackDistribution(bins) => (
            vec!["From", "To", "Count"],
            bins.iter()
                .map(|b| vec![amount(b.lower), amount(b.upper), b.count.to_string()])
                .collect(),
        ),
        Report::UtilitiesByDate(rows) => (
            vec!["Date", "Amount"],
            rows.iter().map(|r| vec![r.key.to_string(), amount(r.total)]).collect(),
        ),
    }
}
