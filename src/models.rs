use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};

/// Expense category. Stored as its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    Utilities,
    Rent,
    Entertainment,
    Insurance,
    Travel,
    Subscription,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Self::Groceries,
        Self::Utilities,
        Self::Rent,
        Self::Entertainment,
        Self::Insurance,
        Self::Travel,
        Self::Subscription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Utilities => "Utilities",
            Self::Rent => "Rent",
            Self::Entertainment => "Entertainment",
            Self::Insurance => "Insurance",
            Self::Travel => "Travel",
            Self::Subscription => "Subscription",
        }
    }

    /// Descriptions a generated record of this category may carry.
    pub fn descriptions(&self) -> &'static [&'static str] {
        match self {
            Self::Groceries => &["Monthly groceries"],
            Self::Utilities => &["Electricity bill", "Water bill", "Internet bill"],
            Self::Rent => &["Monthly house rent"],
            Self::Entertainment => &["Went to movies", "Tour", "Day off"],
            Self::Insurance => &["Life", "Car"],
            Self::Travel => &["Flight", "Accommodation", "Transportation"],
            Self::Subscription => &["Netflix", "Amazon Prime"],
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment was routed, for the online vs cash split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Online,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentMode {
    Paytm,
    Gpay,
    #[serde(rename = "Credit_card")]
    CreditCard,
    #[serde(rename = "Debit_card")]
    DebitCard,
    Cash,
    Paypal,
    Check,
    #[serde(rename = "Bank_transfer")]
    BankTransfer,
    Visa,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 9] = [
        Self::Paytm,
        Self::Gpay,
        Self::CreditCard,
        Self::DebitCard,
        Self::Cash,
        Self::Paypal,
        Self::Check,
        Self::BankTransfer,
        Self::Visa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paytm => "Paytm",
            Self::Gpay => "Gpay",
            Self::CreditCard => "Credit_card",
            Self::DebitCard => "Debit_card",
            Self::Cash => "Cash",
            Self::Paypal => "Paypal",
            Self::Check => "Check",
            Self::BankTransfer => "Bank_transfer",
            Self::Visa => "Visa",
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Cash | Self::Check => Channel::Cash,
            _ => Channel::Online,
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown payment mode: {s}"))
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored text must be exactly one of the canonical names; the lenient
/// `FromStr` is for user input only.
fn parse_column<T: Copy>(
    value: ValueRef<'_>,
    all: &[T],
    name: fn(&T) -> &'static str,
    what: &str,
) -> FromSqlResult<T> {
    let text = value.as_str()?;
    all.iter()
        .find(|v| name(v) == text)
        .copied()
        .ok_or_else(|| FromSqlError::Other(format!("Unknown stored {what}: {text:?}").into()))
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_column(value, &Self::ALL, Self::as_str, "category")
    }
}

impl ToSql for PaymentMode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentMode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        parse_column(value, &Self::ALL, Self::as_str, "payment mode")
    }
}

/// One expense transaction, as stored in the `expenses` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub category: Category,
    pub payment_mode: PaymentMode,
    pub description: String,
    pub amount: f64,
    pub cashback: f64,
}

impl ExpenseRecord {
    /// Check the amount/cashback invariants. Category and payment mode are
    /// closed by construction.
    pub fn validate(&self) -> Result<()> {
        if !(self.amount > 0.0) {
            return Err(SpendError::InvalidArgument(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if !(self.cashback >= 0.0 && self.cashback <= self.amount) {
            return Err(SpendError::InvalidArgument(format!(
                "cashback {} must lie between 0 and amount {}",
                self.cashback, self.amount
            )));
        }
        Ok(())
    }
}

/// Round to cents.
pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64, cashback: f64) -> ExpenseRecord {
        ExpenseRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: Category::Rent,
            payment_mode: PaymentMode::Cash,
            description: "Monthly house rent".to_string(),
            amount,
            cashback,
        }
    }

    #[test]
    fn test_category_parse_and_display() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
            assert_eq!(c.to_string(), c.as_str());
        }
        assert_eq!("travel".parse::<Category>().unwrap(), Category::Travel);
        assert!("Gifts".parse::<Category>().is_err());
        assert!("Property Taxes".parse::<Category>().is_err());
    }

    #[test]
    fn test_payment_mode_stored_names() {
        assert_eq!(PaymentMode::CreditCard.as_str(), "Credit_card");
        assert_eq!("Bank_transfer".parse::<PaymentMode>().unwrap(), PaymentMode::BankTransfer);
        assert!("Bitcoin".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_column_read_is_exact() {
        let read = |s: &'static str| Category::column_result(ValueRef::Text(s.as_bytes()));
        assert_eq!(read("Rent").unwrap(), Category::Rent);
        assert!(read("rent").is_err());
        assert!(read(" Rent").is_err());
        let mode = |s: &'static str| PaymentMode::column_result(ValueRef::Text(s.as_bytes()));
        assert_eq!(mode("Credit_card").unwrap(), PaymentMode::CreditCard);
        assert!(mode("cash").is_err());
        assert!(mode("credit_card").is_err());
    }

    #[test]
    fn test_channel_partition() {
        let cash: Vec<_> = PaymentMode::ALL
            .into_iter()
            .filter(|m| m.channel() == Channel::Cash)
            .collect();
        assert_eq!(cash, vec![PaymentMode::Cash, PaymentMode::Check]);
        let online = PaymentMode::ALL
            .into_iter()
            .filter(|m| m.channel() == Channel::Online)
            .count();
        assert_eq!(online, 7);
    }

    #[test]
    fn test_serde_uses_stored_names() {
        let json = serde_json::to_string(&PaymentMode::DebitCard).unwrap();
        assert_eq!(json, "\"Debit_card\"");
        let rec = record(100.0, 5.0);
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["date"], "2024-03-01");
        assert_eq!(value["category"], "Rent");
    }

    #[test]
    fn test_every_category_has_descriptions() {
        for c in Category::ALL {
            assert!(!c.descriptions().is_empty(), "{c} has no descriptions");
        }
        assert_eq!(Category::Groceries.descriptions(), &["Monthly groceries"]);
    }

    #[test]
    fn test_validate() {
        assert!(record(100.0, 0.0).validate().is_ok());
        assert!(record(100.0, 100.0).validate().is_ok());
        assert!(record(0.0, 0.0).validate().is_err());
        assert!(record(-5.0, 0.0).validate().is_err());
        assert!(record(100.0, -0.01).validate().is_err());
        assert!(record(100.0, 100.01).validate().is_err());
        assert!(record(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1234.5678), 1234.57);
        assert_eq!(round2(0.004), 0.0);
    }
}
