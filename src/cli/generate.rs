use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Result, SpendError};
use crate::fmt::money;
use crate::generator::{generate_and_store, rng_from_seed};
use crate::settings::load_settings;

/// Largest batch accepted from the command line.
pub const MAX_ENTRIES_PER_BATCH: i64 = 1000;

pub fn run(
    db: Option<&Path>,
    entries: Option<i64>,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    seed: Option<u64>,
) -> Result<()> {
    let settings = load_settings();
    let entries = entries.unwrap_or(settings.default_entries);
    if entries > MAX_ENTRIES_PER_BATCH {
        return Err(SpendError::InvalidArgument(format!(
            "at most {MAX_ENTRIES_PER_BATCH} expenses per batch, got {entries}"
        )));
    }
    let start = from_date.unwrap_or(settings.window_start);
    let end = to_date.unwrap_or(settings.window_end);

    let mut store = super::open_store(db, &settings)?;
    let mut rng = rng_from_seed(seed.or(settings.seed));
    let records = generate_and_store(&mut store, &mut rng, entries, start, end)?;

    let total: f64 = records.iter().map(|r| r.amount).sum();
    let cashback: f64 = records.iter().map(|r| r.cashback).sum();
    println!("{} expenses added successfully!", records.len());
    println!("  Window:    {start} to {end}");
    println!("  Spent:     {}", money(total));
    println!("  Cashback:  {}", money(cashback));
    println!("  Stored:    {}", store.count()?);
    Ok(())
}
