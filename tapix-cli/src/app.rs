//! Wires the loaded table, config and backend into one chat session

use log::info;
use std::path::Path;

use tapix_core::{ChatBackend, ConversationMessage, Period, SUGGESTED_QUESTIONS, Session, latest_period};
use tapix_ingest::{DataSource, load_table};

use crate::auth::AuthState;
use crate::config::Config;
use crate::llm::build_backend;
use crate::ui::SessionView;

pub struct App {
    pub session: Session,
    pub backend: Box<dyn ChatBackend>,
    pub source: DataSource,
    /// Shown once when the UI starts (fallback data, skipped rows)
    pub notice: Option<String>,
    pub currency_symbol: String,
}

impl App {
    /// `csv` falls back to `[data] csv`; `period` falls back to the month of the latest transaction
    pub fn open(
        config: &Config,
        auth: &AuthState,
        env: impl Fn(&str) -> Option<String> + Copy,
        csv: Option<&Path>,
        period: Option<Period>,
    ) -> Self {
        let path = csv.or(config.data.csv.as_deref());
        let table = load_table(path, &config.load_options());

        let period = period
            .or_else(|| latest_period(&table.transactions))
            .unwrap_or_else(Period::current);
        info!(
            "session over {} transactions from {} for {period}",
            table.transactions.len(),
            table.source
        );

        let session = Session::new(table.transactions, period, config.generation_options(env))
            .with_recent_limit(config.chat.recent_transactions);
        let backend = build_backend(config, auth, env, session.transactions().clone(), period);

        Self {
            session,
            backend,
            source: table.source,
            notice: table.notice,
            currency_symbol: config.data.currency_symbol.clone(),
        }
    }

    /// Put startup problems (ignored config, unreadable key store) ahead of the data notice
    pub fn with_notices(mut self, notices: impl IntoIterator<Item = Option<String>>) -> Self {
        let mut all: Vec<String> = notices.into_iter().flatten().collect();
        all.extend(self.notice.take());
        if !all.is_empty() {
            self.notice = Some(all.join(" "));
        }
        self
    }

    pub fn ask(&mut self, question: &str) -> Option<&ConversationMessage> {
        self.session.ask(self.backend.as_ref(), question)
    }

    pub fn ask_suggestion(&mut self, index: usize) -> Option<&ConversationMessage> {
        self.session.ask_suggestion(self.backend.as_ref(), index)
    }

    pub fn view<'a>(&'a self, status: Option<&'a str>, input: &'a str) -> SessionView<'a> {
        let summary = self.session.summary();
        SessionView {
            title: format!("Tapix · {} · {}", self.session.period().label(), self.source),
            stats: self.session.stats(),
            breakdown: summary.by_category,
            messages: self.session.messages(),
            suggestions: &SUGGESTED_QUESTIONS,
            notice: self.notice.as_deref(),
            status,
            input,
            currency_symbol: &self.currency_symbol,
            backend_name: self.backend.name(),
        }
    }
}
