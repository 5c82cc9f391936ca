//! Per-user session state, passed explicitly to whoever drives the UI.
//!
//! The transaction snapshot is immutable and shared; the conversation is
//! owned by the session and only ever appended to.

use log::info;
use std::sync::Arc;

use crate::context::ChatContext;
use crate::conversation::{Conversation, ConversationMessage, Role};
use crate::dispatch::{ChatBackend, GenerationOptions, respond};
use crate::period::Period;
use crate::prompts::SUGGESTED_QUESTIONS;
use crate::summary::{self, PeriodSummary};
use crate::transaction::Transaction;

/// Numbers shown in the metrics panel
#[derive(Debug, Clone, PartialEq)]
pub struct QuickStats {
    pub period: Period,
    pub period_total: f64,
    pub period_spending: f64,
    pub top_category: String,
    pub transaction_count: usize,
}

pub struct Session {
    transactions: Arc<[Transaction]>,
    period: Period,
    conversation: Conversation,
    options: GenerationOptions,
    recent_limit: usize,
}

impl Session {
    pub fn new(transactions: impl Into<Arc<[Transaction]>>, period: Period, options: GenerationOptions) -> Self {
        Self {
            transactions: transactions.into(),
            period,
            conversation: Conversation::new(),
            options,
            recent_limit: crate::context::RECENT_LIMIT,
        }
    }

    /// Cap on transaction records placed in the context (never above [`crate::context::RECENT_LIMIT`])
    pub fn with_recent_limit(mut self, n: usize) -> Self {
        self.recent_limit = n.min(crate::context::RECENT_LIMIT);
        self
    }

    pub fn transactions(&self) -> &Arc<[Transaction]> {
        &self.transactions
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        self.conversation.messages()
    }

    /// Recomputed from the full snapshot on every call
    pub fn summary(&self) -> PeriodSummary {
        summary::summarize(&self.transactions, self.period)
    }

    pub fn context(&self) -> ChatContext {
        ChatContext::build(
            &self.summary(),
            &summary::recent(&self.transactions, self.recent_limit),
            &summary::categories(&self.transactions),
        )
    }

    pub fn stats(&self) -> QuickStats {
        let s = self.summary();
        QuickStats {
            period: self.period,
            period_total: s.total,
            period_spending: s.spending(),
            top_category: s.top_category,
            transaction_count: s.transaction_count,
        }
    }

    /// One turn: append the user message, dispatch, append the reply.
    /// A blank prompt is ignored and returns `None` without touching history.
    pub fn ask(&mut self, backend: &dyn ChatBackend, prompt: &str) -> Option<&ConversationMessage> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }
        info!("turn {}: {} chars", self.conversation.count(Role::User) + 1, prompt.len());
        self.conversation.push_user(prompt);

        let context = self.context();
        let reply = respond(backend, self.conversation.messages(), &context, &self.options);
        Some(self.conversation.push_assistant(reply))
    }

    /// Same as typing `SUGGESTED_QUESTIONS[index]`; `None` for an unknown index
    pub fn ask_suggestion(&mut self, backend: &dyn ChatBackend, index: usize) -> Option<&ConversationMessage> {
        let question = SUGGESTED_QUESTIONS.get(index)?;
        self.ask(backend, question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmError, LlmResult};
    use crate::dispatch::CompletionRequest;
    use crate::prompts::MISSING_CREDENTIAL_ADVISORY;
    use chrono::NaiveDate;

    struct NoKey;

    impl ChatBackend for NoKey {
        fn name(&self) -> &str {
            "OpenAI"
        }
        fn has_credential(&self) -> bool {
            false
        }
        fn complete(&self, _: &CompletionRequest) -> LlmResult<String> {
            panic!("must not be called without a credential");
        }
    }

    struct Broken;

    impl ChatBackend for Broken {
        fn name(&self) -> &str {
            "OpenAI"
        }
        fn complete(&self, _: &CompletionRequest) -> LlmResult<String> {
            Err(LlmError::Transport("dns lookup failed".to_string()))
        }
    }

    struct Echo;

    impl ChatBackend for Echo {
        fn name(&self) -> &str {
            "Echo"
        }
        fn complete(&self, req: &CompletionRequest) -> LlmResult<String> {
            Ok(format!("echo: {}", req.last_user_text().unwrap_or_default()))
        }
    }

    fn session() -> Session {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let txns = vec![
            Transaction::new(d(7, 1), "Pret", "Coffee", -4.50),
            Transaction::new(d(7, 4), "ACME Ltd", "Income", 2500.00),
        ];
        Session::new(txns, "2025-07".parse().unwrap(), GenerationOptions::default())
    }

    #[test]
    fn test_no_credential_adds_one_advisory_reply() {
        let mut s = session();
        let before = s.conversation().count(Role::Assistant);
        let reply = s.ask(&NoKey, "What did I spend?").unwrap().content.clone();
        assert_eq!(reply, MISSING_CREDENTIAL_ADVISORY);
        assert_eq!(s.conversation().count(Role::Assistant), before + 1);
        assert_eq!(s.messages().len(), 3);
    }

    #[test]
    fn test_transport_error_adds_one_apology() {
        let mut s = session();
        let before = s.messages().len();
        let reply = s.ask(&Broken, "What did I spend?").unwrap().content.clone();
        assert!(!reply.is_empty());
        assert!(reply.contains("dns lookup failed"));
        assert_eq!(s.messages().len(), before + 2);
        assert_eq!(s.conversation().count(Role::Assistant), 2);

        // still usable
        s.ask(&Echo, "again");
        assert_eq!(s.messages().len(), before + 4);
    }

    #[test]
    fn test_suggestion_behaves_like_typed_input() {
        let mut typed = session();
        typed.ask(&Echo, SUGGESTED_QUESTIONS[4]);
        let mut clicked = session();
        clicked.ask_suggestion(&Echo, 4).unwrap();
        assert_eq!(typed.messages(), clicked.messages());
        assert!(clicked.ask_suggestion(&Echo, 99).is_none());
    }

    #[test]
    fn test_blank_prompt_is_ignored() {
        let mut s = session();
        let before = s.messages().to_vec();
        // NoKey panics if dispatched, Broken would append an apology
        assert!(s.ask(&NoKey, "").is_none());
        assert!(s.ask(&Broken, "   \t\n").is_none());
        assert_eq!(s.messages(), before.as_slice());
        assert_eq!(s.conversation().count(Role::User), 0);
    }

    #[test]
    fn test_stats_and_context() {
        let s = session();
        let stats = s.stats();
        assert!((stats.period_total - 2495.50).abs() < 1e-9);
        assert_eq!(stats.top_category, "Income");
        assert_eq!(stats.transaction_count, 2);
        assert!((stats.period_spending - 4.50).abs() < 1e-9);

        let ctx = s.context();
        assert_eq!(ctx.total_spent, stats.period_total);
        assert_eq!(ctx.recent_transactions.len(), 2);
    }

    #[test]
    fn test_recent_limit_is_capped() {
        let s = session().with_recent_limit(1);
        assert_eq!(s.context().recent_transactions.len(), 1);
    }
}
