use std::path::{Path, PathBuf};

use crate::db::Store;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(db: Option<&Path>, data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let db_path = super::resolve_db_path(db, &settings);
    let store = Store::open(&db_path)?;
    let count = store.count()?;

    println!("Initialized spendview at {}", db_path.display());
    if count > 0 {
        println!("  Existing expenses: {count}");
    }
    Ok(())
}
