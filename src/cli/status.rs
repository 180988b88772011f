use std::path::Path;

use crate::db::Store;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::{load_settings, settings_path};

pub fn run(db: Option<&Path>) -> Result<()> {
    let settings = load_settings();
    let db_path = super::resolve_db_path(db, &settings);

    println!("Settings:   {}", settings_path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `spendview init` to set up.");
        return Ok(());
    }

    let store = Store::open_as_is(&db_path)?;
    if !store.has_schema()? {
        println!();
        println!("No expenses table in this database. Run `spendview init` to set up.");
        return Ok(());
    }
    let count = store.count()?;
    let (spent, cashback): (f64, f64) = store.conn().query_row(
        "SELECT COALESCE(SUM(amount), 0), COALESCE(SUM(cashback), 0) FROM expenses",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    println!();
    println!("Expenses:   {count}");
    if let Some((first, last)) = store.date_span()? {
        println!("Span:       {first} to {last}");
    }
    println!("Spent:      {}", money(spent));
    println!("Cashback:   {}", money(cashback));
    Ok(())
}
