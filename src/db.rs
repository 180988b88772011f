use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, SpendError};
use crate::models::ExpenseRecord;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    category TEXT NOT NULL CHECK (category IN (
        'Groceries', 'Utilities', 'Rent', 'Entertainment', 'Insurance', 'Travel', 'Subscription'
    )),
    payment_mode TEXT NOT NULL CHECK (payment_mode IN (
        'Paytm', 'Gpay', 'Credit_card', 'Debit_card', 'Cash', 'Paypal', 'Check', 'Bank_transfer', 'Visa'
    )),
    description TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    cashback REAL NOT NULL CHECK (cashback >= 0 AND cashback <= amount)
);

CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
";

const SELECT_RECORD: &str =
    "SELECT date, category, payment_mode, description, amount, cashback FROM expenses";

/// Owns the connection to the expense database. Dropping the store closes it.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `db_path` and apply the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            SpendError::StorageUnavailable(format!("{}: {e}", db_path.display()))
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.init()?;
        log::debug!("opened expense store at {}", db_path.display());
        Ok(store)
    }

    /// Open a database that `spendview init` has already created.
    pub fn open_existing(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(SpendError::StorageUnavailable(format!(
                "no database at {}. Run `spendview init` first.",
                db_path.display()
            )));
        }
        Self::open(db_path)
    }

    /// Open a database as-is: no schema, no pragmas. For inspecting files
    /// that may not be ours.
    pub fn open_as_is(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            SpendError::StorageUnavailable(format!("{}: {e}", db_path.display()))
        })?;
        Ok(Self { conn })
    }

    /// Whether the `expenses` table exists.
    pub fn has_schema(&self) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'expenses'",
                [],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Append records in a single transaction. Nothing is written if any
    /// record is invalid or any insert fails.
    pub fn insert_records(&mut self, records: &[ExpenseRecord]) -> Result<usize> {
        for record in records {
            record.validate()?;
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO expenses (date, category, payment_mode, description, amount, cashback) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in records {
                stmt.execute(rusqlite::params![
                    r.date,
                    r.category,
                    r.payment_mode,
                    r.description,
                    r.amount,
                    r.cashback
                ])?;
            }
        }
        tx.commit()?;
        log::info!("appended {} expense records", records.len());
        Ok(records.len())
    }

    pub fn count(&self) -> Result<i64> {
        let n = self
            .conn
            .query_row("SELECT count(*) FROM expenses", [], |r| r.get(0))?;
        Ok(n)
    }

    /// Earliest and latest record dates, if any records exist.
    pub fn date_span(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let span: Option<(Option<NaiveDate>, Option<NaiveDate>)> = self
            .conn
            .query_row("SELECT min(date), max(date) FROM expenses", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .optional()?;
        Ok(match span {
            Some((Some(first), Some(last))) => Some((first, last)),
            _ => None,
        })
    }

    /// Every record in date order, ties in insertion order.
    pub fn all_records(&self) -> Result<Vec<ExpenseRecord>> {
        query_records(&self.conn, &format!("{SELECT_RECORD} ORDER BY date, id"))
    }
}

pub(crate) fn query_records(conn: &Connection, sql: &str) -> Result<Vec<ExpenseRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ExpenseRecord {
                date: row.get(0)?,
                category: row.get(1)?,
                payment_mode: row.get(2)?,
                description: row.get(3)?,
                amount: row.get(4)?,
                cashback: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn select_records_where(clause: &str) -> String {
    format!("{SELECT_RECORD} WHERE {clause} ORDER BY date, id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PaymentMode};

    fn test_db() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn record(date: &str, amount: f64, cashback: f64) -> ExpenseRecord {
        ExpenseRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: Category::Utilities,
            payment_mode: PaymentMode::BankTransfer,
            description: "Water bill".to_string(),
            amount,
            cashback,
        }
    }

    #[test]
    fn test_init_creates_table() {
        let (_dir, store) = test_db();
        let tables: Vec<String> = store
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tables, vec!["expenses".to_string()]);
    }

    #[test]
    fn test_init_is_idempotent() {
        let (_dir, store) = test_db();
        store.init().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_open_existing_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Store::open_existing(&dir.path().join("missing.db")).err().unwrap();
        assert!(matches!(err, SpendError::StorageUnavailable(_)), "got: {err}");
    }

    #[test]
    fn test_open_in_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("dir").join("x.db");
        let err = Store::open(&path).err().unwrap();
        assert!(matches!(err, SpendError::StorageUnavailable(_)), "got: {err}");
    }

    #[test]
    fn test_insert_and_read_back() {
        let (_dir, mut store) = test_db();
        let records = vec![record("2024-02-10", 120.5, 3.25), record("2024-01-05", 80.0, 0.0)];
        assert_eq!(store.insert_records(&records).unwrap(), 2);
        let all = store.all_records().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], records[1]);
        assert_eq!(all[1], records[0]);
    }

    #[test]
    fn test_stored_text_forms() {
        let (_dir, mut store) = test_db();
        store.insert_records(&[record("2024-06-30", 10.0, 1.0)]).unwrap();
        let (date, mode): (String, String) = store
            .conn()
            .query_row("SELECT date, payment_mode FROM expenses", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(date, "2024-06-30");
        assert_eq!(mode, "Bank_transfer");
    }

    #[test]
    fn test_invalid_record_rolls_back_batch() {
        let (_dir, mut store) = test_db();
        let records = vec![record("2024-01-01", 50.0, 1.0), record("2024-01-02", 50.0, 60.0)];
        let err = store.insert_records(&records).err().unwrap();
        assert!(matches!(err, SpendError::InvalidArgument(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    fn raw_insert(store: &Store, category: &str, mode: &str) -> rusqlite::Result<usize> {
        store.conn().execute(
            "INSERT INTO expenses (date, category, payment_mode, description, amount, cashback) \
             VALUES ('2024-01-01', ?1, ?2, 'x', 10.0, 0.0)",
            [category, mode],
        )
    }

    #[test]
    fn test_schema_rejects_unknown_names() {
        let (_dir, store) = test_db();
        assert!(raw_insert(&store, "Property Taxes", "Cash").is_err());
        assert!(raw_insert(&store, "Rent", "Bitcoin").is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_schema_rejects_case_variants() {
        let (_dir, store) = test_db();
        assert!(raw_insert(&store, "rent", "Cash").is_err());
        assert!(raw_insert(&store, "Rent", "cash").is_err());
        assert!(raw_insert(&store, "Rent", "Cash").is_ok());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_schema_accepts_every_stored_name() {
        let (_dir, store) = test_db();
        for c in Category::ALL {
            raw_insert(&store, c.as_str(), "Cash").unwrap();
        }
        for m in PaymentMode::ALL {
            raw_insert(&store, "Rent", m.as_str()).unwrap();
        }
        assert_eq!(store.all_records().unwrap().len(), 16);
    }

    #[test]
    fn test_case_variant_in_legacy_table_is_an_error() {
        // A table created before the name constraints existed.
        let store = Store {
            conn: Connection::open_in_memory().unwrap(),
        };
        store
            .conn()
            .execute_batch(
                "CREATE TABLE expenses (id INTEGER PRIMARY KEY, date TEXT, category TEXT, \
                 payment_mode TEXT, description TEXT, amount REAL, cashback REAL);",
            )
            .unwrap();
        raw_insert(&store, "rent", "Cash").unwrap();
        assert!(store.all_records().is_err());
    }

    #[test]
    fn test_open_as_is_leaves_schema_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE notes (body TEXT);")
            .unwrap();

        let store = Store::open_as_is(&path).unwrap();
        assert!(!store.has_schema().unwrap());
        drop(store);

        let tables: i64 = Connection::open(&path)
            .unwrap()
            .query_row("SELECT count(*) FROM sqlite_master WHERE type = 'table'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_open_as_is_sees_records() {
        let (dir, mut store) = test_db();
        store.insert_records(&[record("2024-04-01", 5.0, 0.0)]).unwrap();
        drop(store);
        let store = Store::open_as_is(&dir.path().join("test.db")).unwrap();
        assert!(store.has_schema().unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_schema_rejects_cashback_over_amount() {
        let (_dir, store) = test_db();
        let result = store.conn().execute(
            "INSERT INTO expenses (date, category, payment_mode, description, amount, cashback) \
             VALUES ('2024-01-01', 'Rent', 'Cash', 'Rent', 10.0, 11.0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_date_span() {
        let (_dir, mut store) = test_db();
        assert!(store.date_span().unwrap().is_none());
        store
            .insert_records(&[record("2024-03-01", 1.0, 0.0), record("2024-11-20", 1.0, 0.0)])
            .unwrap();
        let (first, last) = store.date_span().unwrap().unwrap();
        assert_eq!(first.to_string(), "2024-03-01");
        assert_eq!(last.to_string(), "2024-11-20");
    }
}
