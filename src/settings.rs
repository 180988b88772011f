use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};
use crate::models::Category;
use crate::reports::ReportOptions;

pub const DB_FILE: &str = "expenses.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_entries")]
    pub default_entries: i64,
    #[serde(default = "default_window_start")]
    pub window_start: NaiveDate,
    #[serde(default = "default_window_end")]
    pub window_end: NaiveDate,
    /// Category names compared by the highlight-months report.
    #[serde(default = "default_highlight")]
    pub highlight_categories: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_cashback_bins")]
    pub cashback_bins: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_entries() -> i64 {
    10
}

fn default_window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_window_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default()
}

fn default_highlight() -> Vec<String> {
    vec!["Travel".to_string(), "Entertainment".to_string()]
}

fn default_top_n() -> usize {
    5
}

fn default_cashback_bins() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_entries: default_entries(),
            window_start: default_window_start(),
            window_end: default_window_end(),
            highlight_categories: default_highlight(),
            top_n: default_top_n(),
            cashback_bins: default_cashback_bins(),
            seed: None,
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }

    /// Names outside the fixed category set are skipped with a warning.
    pub fn report_options(&self) -> ReportOptions {
        let highlight = self
            .highlight_categories
            .iter()
            .filter_map(|name| match name.parse::<Category>() {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("ignoring highlight category: {e}");
                    None
                }
            })
            .collect();
        ReportOptions {
            highlight,
            top_n: self.top_n,
            cashback_bins: self.cashback_bins,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendview")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("spendview")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        log::warn!("unreadable settings at {}: {e}; using defaults", path.display());
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SpendError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
