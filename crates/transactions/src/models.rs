use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Format of the display date stored next to the numeric date parts, e.g. `05 Mar 2024`.
pub const DISPLAY_DATE_FORMAT: &str = "%d %b %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Value stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("Unknown transaction type '{}'", other)),
        }
    }
}

/// A persisted income or expense entry.
///
/// `id` and `kind` never change once the store has assigned them. An `id` of `0`
/// marks a transaction the store has not seen yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Transaction {
    pub id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub date: String, // display only, e.g. '05 Mar 2024'
    #[validate(range(min = 1, max = 31))]
    pub day: u32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    pub year: i32,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Checks the fields a caller is allowed to change.
    pub fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        check_amount(self.amount)?;
        self.validate().map_err(|e| e.to_string())
    }

    /// Returns a copy with a new name and amount, the only two fields the edit
    /// dialog touches.
    pub fn edited(&self, name: &str, amount: f64) -> Result<Self, String> {
        let updated = Transaction {
            name: name.trim().to_string(),
            amount,
            ..self.clone()
        };
        updated.check()?;
        Ok(updated)
    }
}

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, Validate)]
pub struct NewTransaction {
    #[validate(length(min = 1))]
    name: String,
    #[validate(range(min = 0.0))]
    amount: f64,
    date: String,
    #[validate(range(min = 1, max = 31))]
    day: u32,
    #[validate(range(min = 1, max = 12))]
    month: u32,
    year: i32,
    kind: TransactionType,
}

impl NewTransaction {
    /// Builds an entry dated `date`. The day/month/year parts and the display
    /// string are both derived from it.
    pub fn on(
        name: &str,
        amount: f64,
        kind: TransactionType,
        date: NaiveDate,
    ) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        check_amount(amount)?;

        let req = Self {
            name: name.to_string(),
            amount,
            date: display_date(date),
            day: date.day(),
            month: date.month(),
            year: date.year(),
            kind,
        };
        req.validate().map_err(|e| e.to_string())?;
        Ok(req)
    }

    /// Builds an entry dated with the local calendar day.
    pub fn today(name: &str, amount: f64, kind: TransactionType) -> Result<Self, String> {
        Self::on(name, amount, kind, Local::now().date_naive())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The not-yet-persisted form handed to the store, carrying the `0` id sentinel.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: 0,
            name: self.name,
            amount: self.amount,
            date: self.date,
            day: self.day,
            month: self.month,
            year: self.year,
            kind: self.kind,
        }
    }
}

/// Amount as typed by a user: either a JSON number or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn parse(&self) -> Result<f64, String> {
        match self {
            AmountInput::Number(n) => check_amount(*n).map(|_| *n),
            AmountInput::Text(text) => parse_amount(text),
        }
    }
}

#[derive(Deserialize)]
pub struct RawTransactionRequest {
    pub name: String,
    pub amount: AmountInput,
}

#[derive(Deserialize)]
pub struct DeleteSelectedRequest {
    pub ids: Vec<i64>,
}

pub fn parse_amount(text: &str) -> Result<f64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("Amount cannot be empty".to_string());
    }
    let amount: f64 = text
        .parse()
        .map_err(|_| format!("Invalid amount '{}'", text))?;
    check_amount(amount)?;
    Ok(amount)
}

fn check_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() {
        return Err("Amount must be a finite number".to_string());
    }
    if amount < 0.0 {
        return Err("Amount cannot be negative".to_string());
    }
    Ok(())
}

pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_new_transaction_derives_date_parts() {
        let req = NewTransaction::on("Salary", 50000.0, TransactionType::Income, march(5)).unwrap();
        let t = req.into_transaction();
        assert_eq!(t.id, 0);
        assert_eq!((t.day, t.month, t.year), (5, 3, 2024));
        assert_eq!(t.date, "05 Mar 2024");
        assert_eq!(t.kind, TransactionType::Income);
    }

    #[test]
    fn test_new_transaction_trims_name() {
        let req = NewTransaction::on("  Rent ", 10.0, TransactionType::Expense, march(1)).unwrap();
        assert_eq!(req.name(), "Rent");
    }

    #[test]
    fn test_new_transaction_rejects_blank_name() {
        assert!(NewTransaction::on("   ", 10.0, TransactionType::Expense, march(1)).is_err());
    }

    #[test]
    fn test_new_transaction_rejects_negative_or_nan_amount() {
        assert!(NewTransaction::on("x", -1.0, TransactionType::Expense, march(1)).is_err());
        assert!(NewTransaction::on("x", f64::NAN, TransactionType::Expense, march(1)).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.50 ").unwrap(), 12.5);
        assert_eq!(parse_amount("0").unwrap(), 0.0);
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_amount_input_accepts_number_and_text() {
        let n: AmountInput = serde_json::from_str("250").unwrap();
        let s: AmountInput = serde_json::from_str("\"250.5\"").unwrap();
        assert_eq!(n.parse().unwrap(), 250.0);
        assert_eq!(s.parse().unwrap(), 250.5);
    }

    #[test]
    fn test_edited_keeps_identity_and_date() {
        let mut t = NewTransaction::on("Lunch", 100.0, TransactionType::Expense, march(9))
            .unwrap()
            .into_transaction();
        t.id = 7;

        let updated = t.edited("Dinner", 250.0).unwrap();
        assert_eq!(updated.id, 7);
        assert_eq!(updated.kind, TransactionType::Expense);
        assert_eq!(updated.date, t.date);
        assert_eq!(updated.name, "Dinner");
        assert_eq!(updated.amount, 250.0);

        assert!(t.edited("", 1.0).is_err());
        assert!(t.edited("Dinner", -1.0).is_err());
    }

    #[test]
    fn test_check_rejects_out_of_range_month() {
        let mut t = NewTransaction::on("x", 1.0, TransactionType::Income, march(1))
            .unwrap()
            .into_transaction();
        t.month = 13;
        assert!(t.check().is_err());
    }

    #[test]
    fn test_transaction_type_round_trips_through_str() {
        for kind in [TransactionType::Income, TransactionType::Expense] {
            assert_eq!(kind.as_str().parse::<TransactionType>().unwrap(), kind);
        }
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let t = NewTransaction::on("x", 1.0, TransactionType::Income, march(1))
            .unwrap()
            .into_transaction();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "income");
    }
}
