//! Period aggregation over a transaction snapshot.
//!
//! Everything here is a pure function of its inputs: summaries are
//! recomputed on every read and never cached or maintained incrementally.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::period::Period;
use crate::transaction::Transaction;

/// Top category reported when the period has no transactions
pub const NO_DATA: &str = "No data";

/// Sum of amounts for one category (or merchant) within a period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
}

/// Derived view of one period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub period: Period,
    /// Signed sum of every amount in the period
    pub total: f64,
    /// Sum of negative amounts (<= 0)
    pub debits: f64,
    /// Sum of positive amounts (>= 0)
    pub credits: f64,
    /// Sorted by absolute total descending, then name
    pub by_category: Vec<CategoryTotal>,
    /// Category with the largest absolute total, or [`NO_DATA`]
    pub top_category: String,
    pub transaction_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl PeriodSummary {
    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }

    /// Money spent in the period as a positive number
    pub fn spending(&self) -> f64 {
        self.debits.abs()
    }
}

/// Summarize the transactions that fall within `period`.
pub fn summarize(transactions: &[Transaction], period: Period) -> PeriodSummary {
    let in_period: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| period.contains(t.date))
        .collect();

    let total: f64 = in_period.iter().map(|t| t.amount).sum();
    let debits: f64 = in_period.iter().filter(|t| t.is_debit()).map(|t| t.amount).sum();
    let credits: f64 = in_period.iter().filter(|t| t.is_credit()).map(|t| t.amount).sum();

    let by_category = group_totals(in_period.iter().map(|t| (t.category.as_str(), t.amount)));
    let top_category = by_category
        .first()
        .map(|c| c.category.clone())
        .unwrap_or_else(|| NO_DATA.to_string());

    PeriodSummary {
        period,
        total,
        debits,
        credits,
        by_category,
        top_category,
        transaction_count: in_period.len(),
        first_date: in_period.iter().map(|t| t.date).min(),
        last_date: in_period.iter().map(|t| t.date).max(),
    }
}

/// Per-merchant totals for `period`, ordered like category totals
pub fn merchant_totals(transactions: &[Transaction], period: Period) -> Vec<CategoryTotal> {
    group_totals(
        transactions
            .iter()
            .filter(|t| period.contains(t.date))
            .map(|t| (t.merchant.as_str(), t.amount)),
    )
}

/// Distinct categories across the whole snapshot, sorted
pub fn categories(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .map(|t| t.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The `n` most recent transactions, newest first. Equal dates keep input order.
pub fn recent(transactions: &[Transaction], n: usize) -> Vec<Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.into_iter().take(n).cloned().collect()
}

/// Period of the newest transaction, if any
pub fn latest_period(transactions: &[Transaction]) -> Option<Period> {
    transactions.iter().map(|t| t.date).max().map(Period::of)
}

/// A merchant that charges the same amount in more than one month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recurring {
    pub merchant: String,
    pub category: String,
    /// Signed amount of each charge
    pub amount: f64,
    /// Number of distinct months the charge appears in
    pub months: usize,
    pub last_date: NaiveDate,
}

/// Detect repeating charges: same merchant and amount (to the penny) in at
/// least two distinct months. Sorted by absolute amount descending.
pub fn recurring_merchants(transactions: &[Transaction]) -> Vec<Recurring> {
    let mut groups: HashMap<(String, i64), Vec<&Transaction>> = HashMap::new();
    for t in transactions.iter().filter(|t| t.is_debit()) {
        let cents = (t.amount * 100.0).round() as i64;
        groups
            .entry((t.merchant.to_lowercase(), cents))
            .or_default()
            .push(t);
    }

    let mut out: Vec<Recurring> = groups
        .into_values()
        .filter_map(|items| {
            let months: BTreeSet<Period> = items.iter().map(|t| Period::of(t.date)).collect();
            if months.len() < 2 {
                return None;
            }
            let latest = items.iter().max_by_key(|t| t.date)?;
            Some(Recurring {
                merchant: latest.merchant.clone(),
                category: latest.category.clone(),
                amount: latest.amount,
                months: months.len(),
                last_date: latest.date,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.amount
            .abs()
            .total_cmp(&a.amount.abs())
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    out
}

fn group_totals<'a>(items: impl Iterator<Item = (&'a str, f64)>) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (key, amount) in items {
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();

    // BTreeMap already yields names ascending; a stable sort keeps that as the tie-break
    totals.sort_by(|a, b| b.total.abs().total_cmp(&a.total.abs()));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn july() -> Period {
        "2025-07".parse().unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new(d(2025, 7, 12), "Tesco", "Groceries", -47.83),
            Transaction::new(d(2025, 7, 5), "Tesco", "Groceries", -23.45),
            Transaction::new(d(2025, 6, 28), "Tesco", "Groceries", -89.20),
            Transaction::new(d(2025, 7, 11), "Amazon", "Shopping", -45.99),
            Transaction::new(d(2025, 7, 1), "Netflix", "Entertainment", -15.99),
            Transaction::new(d(2025, 6, 1), "Netflix", "Entertainment", -15.99),
            Transaction::new(d(2025, 7, 25), "ACME Ltd", "Income", 2100.00),
        ]
    }

    #[test]
    fn test_coffee_and_income_scenario() {
        let txns = vec![
            Transaction::new(d(2025, 7, 1), "Pret", "Coffee", -4.50),
            Transaction::new(d(2025, 7, 4), "ACME Ltd", "Income", 2500.00),
        ];
        let s = summarize(&txns, july());
        assert!((s.total - 2495.50).abs() < 1e-9);
        assert_eq!(s.top_category, "Income");
        assert_eq!(s.transaction_count, 2);
        assert!((s.debits + 4.50).abs() < 1e-9);
        assert!((s.credits - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_period_yields_sentinel() {
        let s = summarize(&sample(), "2024-01".parse().unwrap());
        assert_eq!(s.total, 0.0);
        assert_eq!(s.top_category, NO_DATA);
        assert!(s.by_category.is_empty());
        assert!(s.is_empty());
        assert_eq!(s.first_date, None);

        let s = summarize(&[], july());
        assert_eq!(s.top_category, NO_DATA);
        assert_eq!(s.spending(), 0.0);
    }

    #[test]
    fn test_category_totals_sum_to_total() {
        let s = summarize(&sample(), july());
        let sum: f64 = s.by_category.iter().map(|c| c.total).sum();
        assert!((sum - s.total).abs() < 1e-9);
        let count: usize = s.by_category.iter().map(|c| c.count).sum();
        assert_eq!(count, s.transaction_count);
    }

    #[test]
    fn test_filters_by_month() {
        let s = summarize(&sample(), july());
        assert_eq!(s.transaction_count, 5);
        assert_eq!(s.first_date, Some(d(2025, 7, 1)));
        assert_eq!(s.last_date, Some(d(2025, 7, 25)));

        let june = summarize(&sample(), "2025-06".parse().unwrap());
        assert_eq!(june.transaction_count, 2);
        assert_eq!(june.top_category, "Groceries");
    }

    #[test]
    fn test_breakdown_order() {
        let s = summarize(&sample(), july());
        let names: Vec<&str> = s.by_category.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Income", "Groceries", "Shopping", "Entertainment"]);
    }

    #[test]
    fn test_tie_breaks_by_name() {
        let txns = vec![
            Transaction::new(d(2025, 7, 2), "B", "Zoo", -10.0),
            Transaction::new(d(2025, 7, 3), "A", "Art", -10.0),
        ];
        assert_eq!(summarize(&txns, july()).top_category, "Art");
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let txns = sample();
        assert_eq!(summarize(&txns, july()), summarize(&txns, july()));
    }

    #[test]
    fn test_merchant_totals() {
        let m = merchant_totals(&sample(), july());
        let tesco = m.iter().find(|c| c.category == "Tesco").unwrap();
        assert!((tesco.total + 71.28).abs() < 1e-9);
        assert_eq!(tesco.count, 2);
    }

    #[test]
    fn test_categories_sorted_distinct() {
        assert_eq!(
            categories(&sample()),
            vec!["Entertainment", "Groceries", "Income", "Shopping"]
        );
    }

    #[test]
    fn test_recent_newest_first() {
        let r = recent(&sample(), 3);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0].merchant, "ACME Ltd");
        assert_eq!(r[1].date, d(2025, 7, 12));
        assert_eq!(r[2].date, d(2025, 7, 11));
        assert_eq!(recent(&sample(), 100).len(), 7);
    }

    #[test]
    fn test_latest_period() {
        assert_eq!(latest_period(&sample()), Some(july()));
        assert_eq!(latest_period(&[]), None);
    }

    #[test]
    fn test_recurring_detects_subscription() {
        let r = recurring_merchants(&sample());
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].merchant, "Netflix");
        assert_eq!(r[0].months, 2);
        assert_eq!(r[0].last_date, d(2025, 7, 1));
    }

    #[test]
    fn test_recurring_ignores_same_month_repeats() {
        let txns = vec![
            Transaction::new(d(2025, 7, 1), "Pret", "Coffee", -3.20),
            Transaction::new(d(2025, 7, 2), "Pret", "Coffee", -3.20),
        ];
        assert!(recurring_merchants(&txns).is_empty());
    }
}
