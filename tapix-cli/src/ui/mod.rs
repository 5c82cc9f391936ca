//! Presentation layer. Both front ends render the same [`SessionView`].

pub mod plain;
pub mod theme;
pub mod tui;

use anyhow::Result;

use tapix_core::{CategoryTotal, ConversationMessage, QuickStats, format_money};

pub use theme::Theme;

/// Borrowed snapshot of everything a front end draws
pub struct SessionView<'a> {
    pub title: String,
    pub stats: QuickStats,
    /// Per-category totals, largest first
    pub breakdown: Vec<CategoryTotal>,
    pub messages: &'a [ConversationMessage],
    pub suggestions: &'a [&'static str],
    pub notice: Option<&'a str>,
    /// Transient line such as "Thinking…"
    pub status: Option<&'a str>,
    pub input: &'a str,
    pub currency_symbol: &'a str,
    pub backend_name: &'a str,
}

pub trait Renderer {
    fn render(&mut self, view: &SessionView<'_>) -> Result<()>;
}

/// Label/value rows of the metrics panel
pub fn metrics_rows(view: &SessionView<'_>) -> Vec<(&'static str, String)> {
    let s = &view.stats;
    vec![
        ("Period", s.period.label()),
        ("Net total", format_money(view.currency_symbol, s.period_total)),
        ("Spending", format_money(view.currency_symbol, s.period_spending)),
        ("Top category", s.top_category.clone()),
        ("Transactions", s.transaction_count.to_string()),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub amount: String,
    /// Cells filled out of the bar width
    pub filled: usize,
}

/// Bars scaled to the largest absolute category total
pub fn breakdown_rows(breakdown: &[CategoryTotal], symbol: &str, width: usize) -> Vec<BarRow> {
    let max = breakdown.iter().map(|c| c.total.abs()).fold(0.0_f64, f64::max);
    breakdown
        .iter()
        .map(|c| {
            let filled = if max > 0.0 && c.total != 0.0 {
                ((c.total.abs() / max) * width as f64).round().max(1.0) as usize
            } else {
                0
            };
            BarRow {
                label: c.category.clone(),
                amount: format_money(symbol, c.total),
                filled: filled.min(width),
            }
        })
        .collect()
}

pub fn bar(filled: usize, width: usize) -> String {
    let mut s = "█".repeat(filled);
    s.push_str(&"░".repeat(width.saturating_sub(filled)));
    s
}

/// Metrics panel and breakdown as plain text (used by `tapix stats` and `/stats`)
pub fn stats_text(view: &SessionView<'_>) -> String {
    const WIDTH: usize = 20;
    let mut out = String::new();
    for (label, value) in metrics_rows(view) {
        out.push_str(&format!("{label:<14}{value}\n"));
    }
    let rows = breakdown_rows(&view.breakdown, view.currency_symbol, WIDTH);
    if rows.is_empty() {
        out.push_str("\nNo transactions in this period.\n");
        return out;
    }
    out.push_str("\nBy category\n");
    let label_width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
    for r in rows {
        out.push_str(&format!(
            "  {:<label_width$}  {}  {}\n",
            r.label,
            bar(r.filled, WIDTH),
            r.amount
        ));
    }
    out
}
