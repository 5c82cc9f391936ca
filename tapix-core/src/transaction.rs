//! Transaction records held in a session snapshot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Category assigned when neither the source row nor the category rules name one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single money movement.
///
/// Sign convention: negative = debit (money spent), positive = credit
/// (income, refunds). Loaders that read positive-spend exports must flip
/// amounts explicitly before constructing records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Booking date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Counterparty as shown to the user
    pub merchant: String,
    /// Spending category (e.g. Groceries)
    pub category: String,
    /// Signed amount, negative = debit
    pub amount: f64,
    /// ISO currency code, when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Free-text note ("Weekly shop")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Transaction {
    /// Create a transaction with no currency, description or tags
    pub fn new(
        date: NaiveDate,
        merchant: impl Into<String>,
        category: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            date,
            merchant: merchant.into(),
            category: category.into(),
            amount,
            currency: None,
            description: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Returns true if money left the account
    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }

    /// Returns true if money came in
    pub fn is_credit(&self) -> bool {
        self.amount > 0.0
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }
}
