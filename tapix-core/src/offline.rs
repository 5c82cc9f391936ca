//! Deterministic backend that answers from the snapshot without any network
//! call. Useful for demos and when no API key is available.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::dispatch::{ChatBackend, CompletionRequest};
use crate::error::LlmResult;
use crate::format::format_money;
use crate::period::Period;
use crate::prompts::SUGGESTED_QUESTIONS;
use crate::summary::{self, recurring_merchants};
use crate::transaction::Transaction;

pub struct OfflineBackend {
    transactions: Arc<[Transaction]>,
    period: Period,
    currency_symbol: String,
}

impl OfflineBackend {
    pub fn new(transactions: Arc<[Transaction]>, period: Period, currency_symbol: impl Into<String>) -> Self {
        Self {
            transactions,
            period,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Rule-based answer for one question
    pub fn answer(&self, question: &str) -> String {
        let q = question.to_lowercase();

        if let Some(merchant) = self.mentioned(&q, |t| &t.merchant) {
            return self.merchant_overview(&merchant);
        }
        if q.contains("subscription") || q.contains("recurring") {
            return self.recurring_overview();
        }
        if let Some(category) = self.mentioned(&q, |t| &t.category) {
            return self.category_overview(&category);
        }
        help_text()
    }

    /// Longest merchant/category name (3+ chars) that appears in the question
    fn mentioned(&self, q: &str, key: impl Fn(&Transaction) -> &String) -> Option<String> {
        self.transactions
            .iter()
            .map(|t| key(t).clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|name| name.chars().count() >= 3 && q.contains(&name.to_lowercase()))
            .max_by_key(|name| name.len())
    }

    fn money(&self, amount: f64) -> String {
        format_money(&self.currency_symbol, amount)
    }

    fn merchant_overview(&self, merchant: &str) -> String {
        let own: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.merchant == merchant)
            .cloned()
            .collect();

        let this_period = summary::merchant_totals(&self.transactions, self.period)
            .into_iter()
            .find(|m| m.category == merchant)
            .map(|m| m.total)
            .unwrap_or(0.0);
        let average = own.iter().map(|t| t.abs_amount()).sum::<f64>() / own.len().max(1) as f64;

        let mut out = format!("{merchant} overview\n");
        for t in summary::recent(&own, 3) {
            let note = t.description.as_deref().map(|d| format!(" - {d}")).unwrap_or_default();
            out.push_str(&format!(
                "- {} on {}{}\n",
                self.money(t.abs_amount()),
                t.date.format("%d %b"),
                note
            ));
        }
        out.push_str(&format!(
            "{}: {} across {} transactions in total.\nAverage transaction: {}",
            self.period.label(),
            self.money(this_period.abs()),
            own.len(),
            self.money(average)
        ));
        out
    }

    fn recurring_overview(&self) -> String {
        let recurring = recurring_merchants(&self.transactions);
        if recurring.is_empty() {
            return "I couldn't find any charges that repeat across months.".to_string();
        }

        let mut out = String::from("Recurring payments\n");
        for r in &recurring {
            out.push_str(&format!(
                "- {} ({}): {} / month, seen in {} months, last on {}\n",
                r.merchant,
                r.category,
                self.money(r.amount.abs()),
                r.months,
                r.last_date
            ));
        }
        let monthly: f64 = recurring.iter().map(|r| r.amount.abs()).sum();
        out.push_str(&format!(
            "Total monthly: {}\nConsider reviewing these to make sure you still need them.",
            self.money(monthly)
        ));
        out
    }

    fn category_overview(&self, category: &str) -> String {
        let s = summary::summarize(&self.transactions, self.period);
        match s.by_category.iter().find(|c| c.category == category) {
            Some(c) => format!(
                "{category} in {}: {} across {} transactions.",
                self.period.label(),
                self.money(c.total.abs()),
                c.count
            ),
            None => format!("No {category} transactions in {}.", self.period.label()),
        }
    }
}

fn help_text() -> String {
    let mut out = String::from("I can help you analyse your spending. Try questions like:\n");
    for q in SUGGESTED_QUESTIONS {
        out.push_str(&format!("- '{q}'\n"));
    }
    out.trim_end().to_string()
}

impl ChatBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline assistant"
    }

    fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        Ok(self.answer(request.last_user_text().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn backend() -> OfflineBackend {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let txns: Vec<Transaction> = vec![
            Transaction::new(d(7, 12), "Tesco", "Groceries", -47.83).with_description("Weekly shop"),
            Transaction::new(d(7, 5), "Tesco", "Groceries", -23.45).with_description("Quick shop"),
            Transaction::new(d(6, 28), "Tesco", "Groceries", -89.20),
            Transaction::new(d(7, 1), "Netflix", "Entertainment", -15.99),
            Transaction::new(d(6, 1), "Netflix", "Entertainment", -15.99),
        ];
        OfflineBackend::new(txns.into(), "2025-07".parse().unwrap(), "£")
    }

    #[test]
    fn test_merchant_question() {
        let a = backend().answer("How much did I spend at TESCO this month?");
        assert!(a.starts_with("Tesco overview"));
        assert!(a.contains("£47.83 on 12 Jul - Weekly shop"));
        assert!(a.contains("July 2025: £71.28"));
        assert!(a.contains("Average transaction: £53.49"));
    }

    #[test]
    fn test_subscription_question() {
        let a = backend().answer("What are my recurring subscriptions?");
        assert!(a.contains("Netflix (Entertainment): £15.99 / month"));
        assert!(a.contains("Total monthly: £15.99"));
    }

    #[test]
    fn test_category_question() {
        let a = backend().answer("what about groceries");
        assert_eq!(a, "Groceries in July 2025: £71.28 across 2 transactions.");
    }

    #[test]
    fn test_fallback_lists_suggestions() {
        let a = backend().answer("hello?");
        for q in SUGGESTED_QUESTIONS {
            assert!(a.contains(q));
        }
    }

    #[test]
    fn test_empty_snapshot_does_not_panic() {
        let b = OfflineBackend::new(Vec::<Transaction>::new().into(), "2025-07".parse().unwrap(), "£");
        assert!(b.answer("recurring?").contains("couldn't find"));
        assert!(b.answer("tesco").starts_with("I can help"));
    }
}
