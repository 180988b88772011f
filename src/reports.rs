use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::db::{query_records, select_records_where, Store};
use crate::error::{Result, SpendError};
use crate::models::{round2, Category, Channel, ExpenseRecord, PaymentMode};

// ---------------------------------------------------------------------------
// Report menu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    CategoryTotals,
    PaymentModeTotals,
    CategoryCashback,
    TopCategories,
    TravelByPaymentMode,
    CashbackTransactions,
    MonthlyTotals,
    HighlightMonths,
    MonthlyCashback,
    CategoryCounts,
    LowestSpendDay,
    HighestSpendDay,
    DailyCounts,
    MonthlyCounts,
    ChannelSplit,
    CashbackDistribution,
    UtilitiesByDate,
}

impl ReportKind {
    pub const ALL: [ReportKind; 17] = [
        Self::CategoryTotals,
        Self::PaymentModeTotals,
        Self::CategoryCashback,
        Self::TopCategories,
        Self::TravelByPaymentMode,
        Self::CashbackTransactions,
        Self::MonthlyTotals,
        Self::HighlightMonths,
        Self::MonthlyCashback,
        Self::CategoryCounts,
        Self::LowestSpendDay,
        Self::HighestSpendDay,
        Self::DailyCounts,
        Self::MonthlyCounts,
        Self::ChannelSplit,
        Self::CashbackDistribution,
        Self::UtilitiesByDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryTotals => "category-totals",
            Self::PaymentModeTotals => "payment-mode-totals",
            Self::CategoryCashback => "category-cashback",
            Self::TopCategories => "top-categories",
            Self::TravelByPaymentMode => "travel-by-payment-mode",
            Self::CashbackTransactions => "cashback-transactions",
            Self::MonthlyTotals => "monthly-totals",
            Self::HighlightMonths => "highlight-months",
            Self::MonthlyCashback => "monthly-cashback",
            Self::CategoryCounts => "category-counts",
            Self::LowestSpendDay => "lowest-spend-day",
            Self::HighestSpendDay => "highest-spend-day",
            Self::DailyCounts => "daily-counts",
            Self::MonthlyCounts => "monthly-counts",
            Self::ChannelSplit => "channel-split",
            Self::CashbackDistribution => "cashback-distribution",
            Self::UtilitiesByDate => "utilities-by-date",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::CategoryTotals => "Total Expense by Category",
            Self::PaymentModeTotals => "Total Expense by Payment Mode",
            Self::CategoryCashback => "Total Cashback by Category",
            Self::TopCategories => "Most Expensive Categories",
            Self::TravelByPaymentMode => "Travel Spend by Payment Mode",
            Self::CashbackTransactions => "Transactions with Cashback",
            Self::MonthlyTotals => "Total Spending per Month",
            Self::HighlightMonths => "Highest Spending Months",
            Self::MonthlyCashback => "Cashback Earned per Month",
            Self::CategoryCounts => "Transactions per Category",
            Self::LowestSpendDay => "Lowest Spend Day",
            Self::HighestSpendDay => "Highest Spend Day",
            Self::DailyCounts => "Transactions per Day",
            Self::MonthlyCounts => "Transactions per Month",
            Self::ChannelSplit => "Online vs. Cash Transactions",
            Self::CashbackDistribution => "Distribution of Cashback Amounts",
            Self::UtilitiesByDate => "Utilities Spend by Date",
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown report: {s} (expected one of: {})", names.join(", "))
            })
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Categories compared by the highlight-months report.
    pub highlight: Vec<Category>,
    pub top_n: usize,
    pub cashback_bins: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            highlight: vec![Category::Travel, Category::Entertainment],
            top_n: 5,
            cashback_bins: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Result rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal<K> {
    pub key: K,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount<K> {
    pub key: K,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCategoryTotal {
    pub month: String,
    pub category: Category,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub count: i64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelSplit {
    Defined {
        total: i64,
        online: i64,
        cash: i64,
        online_pct: f64,
        cash_pct: f64,
    },
    /// No records, so no share can be computed.
    DivisionUndefined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashbackBin {
    pub lower: f64,
    pub upper: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", content = "rows", rename_all = "kebab-case")]
pub enum Report {
    CategoryTotals(Vec<GroupTotal<Category>>),
    PaymentModeTotals(Vec<GroupTotal<PaymentMode>>),
    CategoryCashback(Vec<GroupTotal<Category>>),
    TopCategories(Vec<GroupTotal<Category>>),
    TravelByPaymentMode(Vec<GroupTotal<PaymentMode>>),
    CashbackTransactions(Vec<ExpenseRecord>),
    MonthlyTotals(Vec<GroupTotal<String>>),
    HighlightMonths(Vec<MonthCategoryTotal>),
    MonthlyCashback(Vec<GroupTotal<String>>),
    CategoryCounts(Vec<GroupCount<Category>>),
    LowestSpendDay(DaySummary),
    HighestSpendDay(DaySummary),
    DailyCounts(Vec<GroupCount<NaiveDate>>),
    MonthlyCounts(Vec<GroupCount<String>>),
    ChannelSplit(ChannelSplit),
    CashbackDistribution(Vec<CashbackBin>),
    UtilitiesByDate(Vec<GroupTotal<NaiveDate>>),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::CategoryTotals(_) => ReportKind::CategoryTotals,
            Self::PaymentModeTotals(_) => ReportKind::PaymentModeTotals,
            Self::CategoryCashback(_) => ReportKind::CategoryCashback,
            Self::TopCategories(_) => ReportKind::TopCategories,
            Self::TravelByPaymentMode(_) => ReportKind::TravelByPaymentMode,
            Self::CashbackTransactions(_) => ReportKind::CashbackTransactions,
            Self::MonthlyTotals(_) => ReportKind::MonthlyTotals,
            Self::HighlightMonths(_) => ReportKind::HighlightMonths,
            Self::MonthlyCashback(_) => ReportKind::MonthlyCashback,
            Self::CategoryCounts(_) => ReportKind::CategoryCounts,
            Self::LowestSpendDay(_) => ReportKind::LowestSpendDay,
            Self::HighestSpendDay(_) => ReportKind::HighestSpendDay,
            Self::DailyCounts(_) => ReportKind::DailyCounts,
            Self::MonthlyCounts(_) => ReportKind::MonthlyCounts,
            Self::ChannelSplit(_) => ReportKind::ChannelSplit,
            Self::CashbackDistribution(_) => ReportKind::CashbackDistribution,
            Self::UtilitiesByDate(_) => ReportKind::UtilitiesByDate,
        }
    }
}

/// Run one report from the menu. An empty table yields `EmptyDataset`,
/// except for the channel split, which reports `DivisionUndefined`.
pub fn run_report(store: &Store, kind: ReportKind, opts: &ReportOptions) -> Result<Report> {
    let conn = store.conn();
    if kind != ReportKind::ChannelSplit && store.count()? == 0 {
        return Err(SpendError::EmptyDataset);
    }
    log::debug!("running report {kind}");

    let report = match kind {
        ReportKind::CategoryTotals => Report::CategoryTotals(category_totals(conn)?),
        ReportKind::PaymentModeTotals => Report::PaymentModeTotals(payment_mode_totals(conn)?),
        ReportKind::CategoryCashback => Report::CategoryCashback(category_cashback(conn)?),
        ReportKind::TopCategories => Report::TopCategories(top_categories(conn, opts.top_n)?),
        ReportKind::TravelByPaymentMode => {
            Report::TravelByPaymentMode(travel_by_payment_mode(conn)?)
        }
        ReportKind::CashbackTransactions => {
            Report::CashbackTransactions(cashback_transactions(conn)?)
        }
        ReportKind::MonthlyTotals => Report::MonthlyTotals(monthly_totals(conn)?),
        ReportKind::HighlightMonths => {
            Report::HighlightMonths(highlight_months(conn, &opts.highlight)?)
        }
        ReportKind::MonthlyCashback => Report::MonthlyCashback(monthly_cashback(conn)?),
        ReportKind::CategoryCounts => Report::CategoryCounts(category_counts(conn)?),
        ReportKind::LowestSpendDay => Report::LowestSpendDay(
            spend_day(conn, SpendDay::Lowest)?.ok_or(SpendError::EmptyDataset)?,
        ),
        ReportKind::HighestSpendDay => Report::HighestSpendDay(
            spend_day(conn, SpendDay::Highest)?.ok_or(SpendError::EmptyDataset)?,
        ),
        ReportKind::DailyCounts => Report::DailyCounts(daily_counts(conn)?),
        ReportKind::MonthlyCounts => Report::MonthlyCounts(monthly_counts(conn)?),
        ReportKind::ChannelSplit => Report::ChannelSplit(channel_split(conn)?),
        ReportKind::CashbackDistribution => {
            Report::CashbackDistribution(cashback_distribution(conn, opts.cashback_bins)?)
        }
        ReportKind::UtilitiesByDate => Report::UtilitiesByDate(utilities_by_date(conn)?),
    };
    Ok(report)
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

fn query_totals<K: rusqlite::types::FromSql>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<GroupTotal<K>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(GroupTotal {
                key: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_counts<K: rusqlite::types::FromSql>(conn: &Connection, sql: &str) -> Result<Vec<GroupCount<K>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GroupCount {
                key: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

pub fn category_totals(conn: &Connection) -> Result<Vec<GroupTotal<Category>>> {
    query_totals(
        conn,
        "SELECT category, ROUND(SUM(amount), 2) FROM expenses \
         GROUP BY category ORDER BY category",
        &[],
    )
}

pub fn payment_mode_totals(conn: &Connection) -> Result<Vec<GroupTotal<PaymentMode>>> {
    query_totals(
        conn,
        "SELECT payment_mode, ROUND(SUM(amount), 2) FROM expenses \
         GROUP BY payment_mode ORDER BY payment_mode",
        &[],
    )
}

pub fn category_cashback(conn: &Connection) -> Result<Vec<GroupTotal<Category>>> {
    query_totals(
        conn,
        "SELECT category, ROUND(SUM(cashback), 2) FROM expenses \
         GROUP BY category ORDER BY category",
        &[],
    )
}

/// The `n` categories with the largest spend. Equal totals sort by name.
pub fn top_categories(conn: &Connection, n: usize) -> Result<Vec<GroupTotal<Category>>> {
    let limit = i64::try_from(n).unwrap_or(i64::MAX);
    query_totals(
        conn,
        "SELECT category, ROUND(SUM(amount), 2) AS total FROM expenses \
         GROUP BY category ORDER BY total DESC, category ASC LIMIT ?1",
        &[&limit],
    )
}

pub fn travel_by_payment_mode(conn: &Connection) -> Result<Vec<GroupTotal<PaymentMode>>> {
    query_totals(
        conn,
        "SELECT payment_mode, ROUND(SUM(amount), 2) FROM expenses \
         WHERE category = ?1 GROUP BY payment_mode ORDER BY payment_mode",
        &[&Category::Travel],
    )
}

pub fn utilities_by_date(conn: &Connection) -> Result<Vec<GroupTotal<NaiveDate>>> {
    query_totals(
        conn,
        "SELECT date, ROUND(SUM(amount), 2) FROM expenses \
         WHERE category = ?1 GROUP BY date ORDER BY date",
        &[&Category::Utilities],
    )
}

// ---------------------------------------------------------------------------
// Cashback
// ---------------------------------------------------------------------------

pub fn cashback_transactions(conn: &Connection) -> Result<Vec<ExpenseRecord>> {
    query_records(conn, &select_records_where("cashback > 0"))
}

pub fn monthly_cashback(conn: &Connection) -> Result<Vec<GroupTotal<String>>> {
    query_totals(
        conn,
        "SELECT substr(date, 1, 7) AS month, ROUND(SUM(cashback), 2) FROM expenses \
         WHERE cashback > 0 GROUP BY month ORDER BY month",
        &[],
    )
}

/// Histogram of non-zero cashback values in `bins` equal-width buckets
/// spanning the observed minimum to maximum. The top edge is inclusive.
pub fn cashback_distribution(conn: &Connection, bins: usize) -> Result<Vec<CashbackBin>> {
    let values: Vec<f64> = cashback_transactions(conn)?
        .into_iter()
        .map(|r| r.cashback)
        .collect();
    Ok(histogram(&values, bins))
}

fn histogram(values: &[f64], bins: usize) -> Vec<CashbackBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![CashbackBin {
            lower: min,
            upper: max,
            count: values.len() as i64,
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0i64; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| CashbackBin {
            lower: round2(min + width * i as f64),
            upper: round2(if i + 1 == bins { max } else { min + width * (i + 1) as f64 }),
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly trends
// ---------------------------------------------------------------------------

pub fn monthly_totals(conn: &Connection) -> Result<Vec<GroupTotal<String>>> {
    query_totals(
        conn,
        "SELECT substr(date, 1, 7) AS month, ROUND(SUM(amount), 2) FROM expenses \
         GROUP BY month ORDER BY month",
        &[],
    )
}

/// Spend per (month, category) for the given categories, biggest first.
pub fn highlight_months(conn: &Connection, categories: &[Category]) -> Result<Vec<MonthCategoryTotal>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders: Vec<String> = (1..=categories.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT substr(date, 1, 7) AS month, category, ROUND(SUM(amount), 2) AS total \
         FROM expenses WHERE category IN ({}) \
         GROUP BY month, category ORDER BY total DESC, month ASC, category ASC",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> =
        categories.iter().map(|c| c as &dyn rusqlite::ToSql).collect();
    let rows = stmt
        .query_map(params.as_slice(), |row| {
            Ok(MonthCategoryTotal {
                month: row.get(0)?,
                category: row.get(1)?,
                total: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

pub fn category_counts(conn: &Connection) -> Result<Vec<GroupCount<Category>>> {
    query_counts(
        conn,
        "SELECT category, COUNT(*) AS n FROM expenses \
         GROUP BY category ORDER BY n DESC, category ASC",
    )
}

pub fn daily_counts(conn: &Connection) -> Result<Vec<GroupCount<NaiveDate>>> {
    query_counts(
        conn,
        "SELECT date, COUNT(*) FROM expenses GROUP BY date ORDER BY date",
    )
}

pub fn monthly_counts(conn: &Connection) -> Result<Vec<GroupCount<String>>> {
    query_counts(
        conn,
        "SELECT substr(date, 1, 7) AS month, COUNT(*) FROM expenses \
         GROUP BY month ORDER BY month",
    )
}

#[derive(Debug, Clone, Copy)]
pub enum SpendDay {
    Lowest,
    Highest,
}

/// The day with the smallest or largest total spend. Ties go to the
/// earliest date. `None` when the table is empty.
pub fn spend_day(conn: &Connection, which: SpendDay) -> Result<Option<DaySummary>> {
    let direction = match which {
        SpendDay::Lowest => "ASC",
        SpendDay::Highest => "DESC",
    };
    let sql = format!(
        "SELECT date, COUNT(*), ROUND(SUM(amount), 2) AS total FROM expenses \
         GROUP BY date ORDER BY total {direction}, date ASC LIMIT 1"
    );
    let day = conn
        .query_row(&sql, [], |row| {
            Ok(DaySummary {
                date: row.get(0)?,
                count: row.get(1)?,
                total: row.get(2)?,
            })
        })
        .optional()?;
    Ok(day)
}

// ---------------------------------------------------------------------------
// Online vs cash
// ---------------------------------------------------------------------------

pub fn channel_split(conn: &Connection) -> Result<ChannelSplit> {
    let per_mode: Vec<GroupCount<PaymentMode>> = query_counts(
        conn,
        "SELECT payment_mode, COUNT(*) FROM expenses GROUP BY payment_mode",
    )?;

    let (mut online, mut cash) = (0i64, 0i64);
    for row in &per_mode {
        match row.key.channel() {
            Channel::Online => online += row.count,
            Channel::Cash => cash += row.count,
        }
    }
    let total = online + cash;
    if total == 0 {
        return Ok(ChannelSplit::DivisionUndefined);
    }

    Ok(ChannelSplit::Defined {
        total,
        online,
        cash,
        online_pct: round2(online as f64 / total as f64 * 100.0),
        cash_pct: round2(cash as f64 / total as f64 * 100.0),
    })
}
