//! Structured transaction facts handed to the model.
//!
//! [`ChatContext`] is a fixed-field struct so malformed payloads are caught
//! at compile time; [`ChatContext::to_lines`] flattens it into the
//! `- key: value` text block that goes into the instruction set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::prompts::CONTEXT_HEADER;
use crate::summary::{CategoryTotal, PeriodSummary};
use crate::transaction::Transaction;

/// Maximum number of transaction records carried in a context
pub const RECENT_LIMIT: usize = 10;

/// Maximum number of category totals rendered
const CATEGORY_TOTALS_LIMIT: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl From<&Transaction> for RecentTransaction {
    fn from(t: &Transaction) -> Self {
        Self {
            date: t.date,
            merchant: t.merchant.clone(),
            category: t.category.clone(),
            amount: t.amount,
            currency: t.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatContext {
    /// Period label, e.g. "2025-07"
    pub period: String,
    /// First and last transaction dates inside the period
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Signed period total (same value as `PeriodSummary::total`)
    pub total_spent: f64,
    /// Money out, as a positive number
    pub spending: f64,
    /// Money in
    pub income: f64,
    pub transaction_count: usize,
    pub top_category: String,
    /// Every category known in the snapshot
    pub categories: Vec<String>,
    pub category_totals: Vec<CategoryTotal>,
    /// Newest first, at most [`RECENT_LIMIT`]
    pub recent_transactions: Vec<RecentTransaction>,
}

impl ChatContext {
    pub fn build(
        summary: &PeriodSummary,
        recent_transactions: &[Transaction],
        categories: &[String],
    ) -> Self {
        let date_range = match (summary.first_date, summary.last_date) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        };

        Self {
            period: summary.period.to_string(),
            date_range,
            total_spent: summary.total,
            spending: summary.spending(),
            income: summary.credits,
            transaction_count: summary.transaction_count,
            top_category: summary.top_category.clone(),
            categories: categories.to_vec(),
            category_totals: summary
                .by_category
                .iter()
                .take(CATEGORY_TOTALS_LIMIT)
                .cloned()
                .collect(),
            recent_transactions: recent_transactions
                .iter()
                .take(RECENT_LIMIT)
                .map(RecentTransaction::from)
                .collect(),
        }
    }

    /// Key/value pairs in render order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("period", self.period.clone()),
            (
                "date range",
                match self.date_range {
                    Some((a, b)) => format!("{a} to {b}"),
                    None => "no transactions in period".to_string(),
                },
            ),
            ("total spent", format!("{:.2}", self.total_spent)),
            ("spending", format!("{:.2}", self.spending)),
            ("income", format!("{:.2}", self.income)),
            ("transaction count", self.transaction_count.to_string()),
            ("top category", self.top_category.clone()),
            ("categories", self.categories.join(", ")),
        ];

        if !self.category_totals.is_empty() {
            let totals = self
                .category_totals
                .iter()
                .map(|c| format!("{} {:.2} ({} txns)", c.category, c.total, c.count))
                .collect::<Vec<_>>()
                .join("; ");
            out.push(("category totals", totals));
        }

        if !self.recent_transactions.is_empty() {
            let recent = self
                .recent_transactions
                .iter()
                .map(|t| {
                    let currency = t.currency.as_deref().map(|c| format!(" {c}")).unwrap_or_default();
                    format!("{} {} [{}] {:.2}{}", t.date, t.merchant, t.category, t.amount, currency)
                })
                .collect::<Vec<_>>()
                .join("; ");
            out.push(("recent transactions", recent));
        }

        out
    }

    /// Flatten into the text block appended to the instruction set
    pub fn to_lines(&self) -> String {
        let mut lines = vec![CONTEXT_HEADER.to_string()];
        for (key, value) in self.entries() {
            lines.push(format!("- {key}: {value}"));
        }
        lines.join("\n")
    }

    /// Re-extract a rendered value by key from [`to_lines`](Self::to_lines) output
    pub fn field(rendered: &str, key: &str) -> Option<String> {
        let prefix = format!("- {key}: ");
        rendered
            .lines()
            .find_map(|l| l.strip_prefix(prefix.as_str()))
            .map(|v| v.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{categories, recent, summarize};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txns() -> Vec<Transaction> {
        vec![
            Transaction::new(d(2025, 7, 1), "Pret", "Coffee", -4.50).with_currency("GBP"),
            Transaction::new(d(2025, 7, 4), "ACME Ltd", "Income", 2500.00),
            Transaction::new(d(2025, 6, 20), "Amazon", "Shopping", -89.99),
        ]
    }

    #[test]
    fn test_total_spent_round_trip() {
        let t = txns();
        let summary = summarize(&t, "2025-07".parse().unwrap());
        let ctx = ChatContext::build(&summary, &recent(&t, RECENT_LIMIT), &categories(&t));
        let rendered = ctx.to_lines();

        let total: f64 = ChatContext::field(&rendered, "total spent").unwrap().parse().unwrap();
        assert!((total - summary.total).abs() < 0.005);
        assert_eq!(ctx.total_spent, summary.total);
    }

    #[test]
    fn test_rendered_block() {
        let t = txns();
        let summary = summarize(&t, "2025-07".parse().unwrap());
        let ctx = ChatContext::build(&summary, &recent(&t, RECENT_LIMIT), &categories(&t));
        let rendered = ctx.to_lines();

        assert!(rendered.starts_with(CONTEXT_HEADER));
        assert_eq!(ChatContext::field(&rendered, "period").as_deref(), Some("2025-07"));
        assert_eq!(
            ChatContext::field(&rendered, "date range").as_deref(),
            Some("2025-07-01 to 2025-07-04")
        );
        assert_eq!(ChatContext::field(&rendered, "top category").as_deref(), Some("Income"));
        assert_eq!(
            ChatContext::field(&rendered, "categories").as_deref(),
            Some("Coffee, Income, Shopping")
        );
        assert_eq!(ChatContext::field(&rendered, "spending").as_deref(), Some("4.50"));
        assert!(rendered.contains("2025-07-01 Pret [Coffee] -4.50 GBP"));
        assert!(ChatContext::field(&rendered, "missing").is_none());
    }

    #[test]
    fn test_recent_is_capped() {
        let many: Vec<Transaction> = (1..=25)
            .map(|day| Transaction::new(d(2025, 7, day), "Shop", "Misc", -1.0))
            .collect();
        let summary = summarize(&many, "2025-07".parse().unwrap());
        let ctx = ChatContext::build(&summary, &recent(&many, 25), &categories(&many));
        assert_eq!(ctx.recent_transactions.len(), RECENT_LIMIT);
        assert_eq!(ctx.recent_transactions[0].date, d(2025, 7, 25));
    }

    #[test]
    fn test_empty_summary_context() {
        let summary = summarize(&[], "2025-07".parse().unwrap());
        let ctx = ChatContext::build(&summary, &[], &[]);
        let rendered = ctx.to_lines();
        assert_eq!(ChatContext::field(&rendered, "total spent").as_deref(), Some("0.00"));
        assert_eq!(ChatContext::field(&rendered, "top category").as_deref(), Some("No data"));
        assert!(ChatContext::field(&rendered, "recent transactions").is_none());
    }

    #[test]
    fn test_serializes_to_json() {
        let t = txns();
        let summary = summarize(&t, "2025-07".parse().unwrap());
        let ctx = ChatContext::build(&summary, &recent(&t, 2), &categories(&t));
        let v = serde_json::to_value(&ctx).unwrap();
        assert_eq!(v["period"], "2025-07");
        assert_eq!(v["recent_transactions"].as_array().unwrap().len(), 2);
    }
}
