//! Synthetic expense generation.
//!
//! Every field is sampled independently and uniformly: amount in
//! [1000, 10000], cashback as a 0-10% fraction of the amount, and a date
//! anywhere in the requested window.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::db::Store;
use crate::error::{Result, SpendError};
use crate::models::{round2, Category, ExpenseRecord, PaymentMode};

pub const MIN_AMOUNT: f64 = 1000.0;
pub const MAX_AMOUNT: f64 = 10000.0;
pub const MAX_CASHBACK_RATE: f64 = 0.1;

/// Seeded generators are reproducible; unseeded ones draw from OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    entries: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ExpenseRecord>> {
    if entries < 1 {
        return Err(SpendError::InvalidArgument(format!(
            "entries must be at least 1, got {entries}"
        )));
    }
    if start > end {
        return Err(SpendError::InvalidArgument(format!(
            "start date {start} is after end date {end}"
        )));
    }

    let span_days = (end - start).num_days();
    let records = (0..entries)
        .map(|_| sample_record(rng, start, span_days))
        .collect();
    Ok(records)
}

fn sample_record<R: Rng + ?Sized>(rng: &mut R, start: NaiveDate, span_days: i64) -> ExpenseRecord {
    let amount = round2(rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT));
    let category = *Category::ALL.choose(rng).unwrap_or(&Category::Groceries);
    let description = category
        .descriptions()
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string();
    let payment_mode = *PaymentMode::ALL.choose(rng).unwrap_or(&PaymentMode::Cash);
    let cashback = round2(rng.gen_range(0.0..MAX_CASHBACK_RATE) * amount);
    let date = start + Duration::days(rng.gen_range(0..=span_days));

    ExpenseRecord {
        date,
        category,
        payment_mode,
        description,
        amount,
        cashback,
    }
}

/// Generate `entries` records and append them to the store as one batch.
pub fn generate_and_store<R: Rng + ?Sized>(
    store: &mut Store,
    rng: &mut R,
    entries: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ExpenseRecord>> {
    let records = generate(rng, entries, start, end)?;
    store.insert_records(&records)?;
    log::info!("generated {entries} expenses between {start} and {end}");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn year_2024() -> (NaiveDate, NaiveDate) {
        (date("2024-01-01"), date("2024-12-31"))
    }

    #[test]
    fn test_generates_exact_count() {
        let (start, end) = year_2024();
        let mut rng = rng_from_seed(Some(1));
        assert_eq!(generate(&mut rng, 10, start, end).unwrap().len(), 10);
        assert_eq!(generate(&mut rng, 1, start, end).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_non_positive_entries() {
        let (start, end) = year_2024();
        let mut rng = rng_from_seed(Some(1));
        for entries in [0, -1, -100] {
            let err = generate(&mut rng, entries, start, end).err().unwrap();
            assert!(matches!(err, SpendError::InvalidArgument(_)), "entries={entries}");
        }
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut rng = rng_from_seed(Some(1));
        let err = generate(&mut rng, 5, date("2024-06-02"), date("2024-06-01"))
            .err()
            .unwrap();
        assert!(matches!(err, SpendError::InvalidArgument(_)));
    }

    #[test]
    fn test_records_respect_invariants() {
        let (start, end) = year_2024();
        let mut rng = rng_from_seed(Some(7));
        for r in generate(&mut rng, 2000, start, end).unwrap() {
            assert!(r.amount >= MIN_AMOUNT && r.amount <= MAX_AMOUNT, "amount {}", r.amount);
            assert!(r.cashback >= 0.0 && r.cashback <= r.amount, "cashback {}", r.cashback);
            assert!(r.cashback <= round2(r.amount * MAX_CASHBACK_RATE));
            assert!(r.date >= start && r.date <= end, "date {}", r.date);
            assert!(r.category.descriptions().contains(&r.description.as_str()));
            assert_eq!(round2(r.amount), r.amount);
            assert_eq!(round2(r.cashback), r.cashback);
        }
    }

    #[test]
    fn test_single_day_window() {
        let day = date("2024-02-29");
        let mut rng = rng_from_seed(None);
        let records = generate(&mut rng, 50, day, day).unwrap();
        assert!(records.iter().all(|r| r.date == day));
    }

    #[test]
    fn test_same_seed_same_records() {
        let (start, end) = year_2024();
        let a = generate(&mut rng_from_seed(Some(42)), 25, start, end).unwrap();
        let b = generate(&mut rng_from_seed(Some(42)), 25, start, end).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_covers_every_category_and_mode() {
        let (start, end) = year_2024();
        let records = generate(&mut rng_from_seed(Some(3)), 1000, start, end).unwrap();
        for c in Category::ALL {
            assert!(records.iter().any(|r| r.category == c), "missing {c}");
        }
        for m in PaymentMode::ALL {
            assert!(records.iter().any(|r| r.payment_mode == m), "missing {m}");
        }
    }

    #[test]
    fn test_generate_and_store_appends() {
        let (start, end) = year_2024();
        let mut store = Store::in_memory().unwrap();
        let mut rng = rng_from_seed(Some(9));
        generate_and_store(&mut store, &mut rng, 10, start, end).unwrap();
        generate_and_store(&mut store, &mut rng, 5, start, end).unwrap();
        assert_eq!(store.count().unwrap(), 15);
    }

    #[test]
    fn test_generate_and_store_invalid_writes_nothing() {
        let (start, end) = year_2024();
        let mut store = Store::in_memory().unwrap();
        let mut rng = rng_from_seed(Some(9));
        assert!(generate_and_store(&mut store, &mut rng, 0, start, end).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }
}
