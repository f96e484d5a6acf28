use crate::models::{Transaction, display_date};
use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which transactions a list or total covers.
///
/// A month of `0` is the "no month selected" sentinel and behaves like `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    ByDay { day: u32, month: u32, year: i32 },
    ByMonth { month: u32, year: i32 },
    ByYear { year: i32 },
}

impl Filter {
    pub fn by_month(month: u32, year: i32) -> Self {
        if month == 0 {
            Filter::All
        } else {
            Filter::ByMonth { month, year }
        }
    }

    pub fn on(date: NaiveDate) -> Self {
        Filter::ByDay {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        match *self {
            Filter::All | Filter::ByMonth { month: 0, .. } => true,
            Filter::ByDay { day, month, year } => t.day == day && t.month == month && t.year == year,
            Filter::ByMonth { month, year } => t.month == month && t.year == year,
            Filter::ByYear { year } => t.year == year,
        }
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect()
    }

    /// Heading shown above the totals for this filter.
    pub fn title(&self) -> String {
        match *self {
            Filter::All | Filter::ByMonth { month: 0, .. } => "Overall Summary".to_string(),
            Filter::ByDay { day, month, year } => match NaiveDate::from_ymd_opt(year, month, day) {
                Some(date) => format!("{} Summary", display_date(date)),
                None => format!("{:02}/{:02}/{} Summary", day, month, year),
            },
            Filter::ByMonth { month, year } => {
                match u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok()) {
                    Some(name) => format!("{} {} Summary", name.name(), year),
                    None => format!("{:02}/{} Summary", month, year),
                }
            }
            Filter::ByYear { year } => format!("{} Summary", year),
        }
    }
}

/// Sum of `amount` over `transactions`; zero when empty.
pub fn total(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(|t| t.amount).sum()
}

/// Sum of `amount` over the transactions `filter` selects.
pub fn filtered_total(transactions: &[Transaction], filter: &Filter) -> f64 {
    transactions
        .iter()
        .filter(|t| filter.matches(t))
        .map(|t| t.amount)
        .sum()
}

/// Period buttons on the tracker screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Today,
    All,
    Monthly,
    Yearly,
}

impl Period {
    /// Turns the period and its raw inputs into a filter. Missing or
    /// unparsable month/year inputs widen the filter to `All`.
    pub fn resolve(self, month: Option<&str>, year: Option<&str>, today: NaiveDate) -> Filter {
        let month = month.and_then(|m| m.trim().parse::<u32>().ok());
        let year = year.and_then(|y| y.trim().parse::<i32>().ok());

        match (self, month, year) {
            (Period::Today, _, _) => Filter::on(today),
            (Period::All, _, _) => Filter::All,
            (Period::Monthly, Some(month), Some(year)) => Filter::by_month(month, year),
            (Period::Yearly, _, Some(year)) => Filter::ByYear { year },
            _ => Filter::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub title: String,
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

impl Summary {
    pub fn of(income: &[Transaction], expense: &[Transaction], filter: &Filter) -> Self {
        let total_income = filtered_total(income, filter);
        let total_expense = filtered_total(expense, filter);

        Self {
            title: filter.title(),
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTransaction, TransactionType};

    fn entry(amount: f64, kind: TransactionType, (y, m, d): (i32, u32, u32)) -> Transaction {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        NewTransaction::on("entry", amount, kind, date).unwrap().into_transaction()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            entry(10.0, TransactionType::Income, (2024, 3, 5)),
            entry(20.0, TransactionType::Income, (2024, 3, 20)),
            entry(40.0, TransactionType::Income, (2024, 4, 5)),
            entry(80.0, TransactionType::Income, (2023, 3, 5)),
        ]
    }

    #[test]
    fn test_all_returns_everything() {
        let list = sample();
        assert_eq!(Filter::All.apply(&list), list);
        assert_eq!(total(&list), 150.0);
    }

    #[test]
    fn test_by_year() {
        let list = sample();
        let filtered = Filter::ByYear { year: 2024 }.apply(&list);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|t| t.year == 2024));
        assert_eq!(total(&filtered), 70.0);
    }

    #[test]
    fn test_by_month_and_by_day() {
        let list = sample();
        assert_eq!(filtered_total(&list, &Filter::by_month(3, 2024)), 30.0);
        assert_eq!(filtered_total(&list, &Filter::ByDay { day: 5, month: 3, year: 2024 }), 10.0);
    }

    #[test]
    fn test_empty_selection_sums_to_zero() {
        let list = sample();
        let filtered = Filter::ByYear { year: 1999 }.apply(&list);
        assert!(filtered.is_empty());
        assert_eq!(total(&filtered), 0.0);
        assert_eq!(total(&[]), 0.0);
    }

    #[test]
    fn test_month_zero_means_all() {
        let list = sample();
        assert_eq!(Filter::by_month(0, 2024), Filter::All);
        assert_eq!(Filter::ByMonth { month: 0, year: 2024 }.apply(&list).len(), list.len());
        assert_eq!(Filter::ByMonth { month: 0, year: 2024 }.title(), "Overall Summary");
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let list = sample();
        let before = list.clone();
        let _ = Filter::ByYear { year: 2023 }.apply(&list);
        assert_eq!(list, before);
    }

    #[test]
    fn test_titles() {
        assert_eq!(Filter::All.title(), "Overall Summary");
        assert_eq!(Filter::by_month(3, 2024).title(), "March 2024 Summary");
        assert_eq!(Filter::ByYear { year: 2024 }.title(), "2024 Summary");
        assert_eq!(
            Filter::on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).title(),
            "05 Mar 2024 Summary"
        );
    }

    #[test]
    fn test_period_resolution() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(Period::Today.resolve(None, None, today), Filter::on(today));
        assert_eq!(Period::All.resolve(Some("3"), Some("2024"), today), Filter::All);
        assert_eq!(
            Period::Monthly.resolve(Some("3"), Some("2024"), today),
            Filter::ByMonth { month: 3, year: 2024 }
        );
        assert_eq!(Period::Monthly.resolve(Some("x"), Some("2024"), today), Filter::All);
        assert_eq!(Period::Yearly.resolve(None, Some("2023"), today), Filter::ByYear { year: 2023 });
        assert_eq!(Period::Yearly.resolve(None, None, today), Filter::All);
    }

    #[test]
    fn test_summary_balance_for_a_day() {
        let day = (2024, 5, 1);
        let income = vec![entry(1000.0, TransactionType::Income, day)];
        let expense = vec![
            entry(400.0, TransactionType::Expense, day),
            entry(900.0, TransactionType::Expense, (2024, 5, 2)),
        ];

        let summary = Summary::of(&income, &expense, &Filter::ByDay { day: 1, month: 5, year: 2024 });
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expense, 400.0);
        assert_eq!(summary.balance, 600.0);
    }
}
