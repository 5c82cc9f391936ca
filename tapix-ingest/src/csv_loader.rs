//! Load a delimited transaction table into typed [`Transaction`]s.
//!
//! Expected header (case-insensitive, any order):
//! `date,merchant,category,amount[,currency][,description][,tags]`
//!
//! Rows that cannot be parsed are skipped with a warning and recorded in the
//! [`LoadReport`]; they never abort the load.

use chrono::NaiveDate;
use csv::StringRecord;
use log::{info, warn};
use regex::Regex;
use std::io::Read;
use std::path::Path;

use crate::category_rules::infer_category;
use crate::error::{IngestError, Result};
use tapix_core::{Transaction, UNCATEGORIZED};

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Field delimiter; sniffed from the header line when `None`
    pub delimiter: Option<u8>,
    /// Flip every amount (for positive-spend exports)
    pub invert_amounts: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the source
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}

struct HeaderIndex {
    date: usize,
    merchant: usize,
    category: Option<usize>,
    amount: usize,
    currency: Option<usize>,
    description: Option<usize>,
    tags: Option<usize>,
}

fn find(headers: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|n| headers.iter().position(|h| h == n))
}

fn parse_header_index(headers: &StringRecord) -> Result<HeaderIndex> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let date = find(&headers, &["date", "transaction date", "trans date", "booking date"])
        .ok_or_else(|| IngestError::MissingColumn("date".to_string()))?;
    let amount = find(&headers, &["amount", "value"])
        .ok_or_else(|| IngestError::MissingColumn("amount".to_string()))?;
    let explicit_merchant = find(&headers, &["merchant", "payee", "counterparty", "name"]);
    let description = find(&headers, &["description", "note", "memo", "items"]);

    // Without a merchant column the description names the counterparty
    let (merchant, description) = match (explicit_merchant, description) {
        (Some(m), d) => (m, d),
        (None, Some(d)) => (d, None),
        (None, None) => return Err(IngestError::MissingColumn("merchant".to_string())),
    };

    Ok(HeaderIndex {
        date,
        merchant,
        category: find(&headers, &["category"]),
        amount,
        currency: find(&headers, &["currency"]),
        description,
        tags: find(&headers, &["tags", "labels"]),
    })
}

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and `DD/MM/YYYY`, optionally followed by a time
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day_part = s.split(['T', ' ']).next().unwrap_or(s);
    ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day_part, fmt).ok())
}

/// Strict amount grammar: an optional sign or surrounding parentheses, an
/// optional currency symbol or three-letter code on either side, then digits.
/// Thousands groups must be well formed (`2,500.00`, `1.234,56`). A comma
/// followed by exactly two trailing digits is the decimal point (`-15,99`).
/// Anything else (`1e3`, `-4.50 (2 items)`, `1,234,56`) is rejected.
pub struct AmountParser {
    re: Regex,
}

impl AmountParser {
    pub fn new() -> Result<Self> {
        let re = Regex::new(concat!(
            r"^(?P<lead>[-+])?\s*",
            r"(?:[£$€¥]|[A-Za-z]{3})?\s*",
            r"(?P<sign>[-+])?\s*",
            r"(?:(?P<grouped>\d{1,3}(?:,\d{3})+(?:\.\d+)?)",
            r"|(?P<dotted>\d{1,3}(?:\.\d{3})+,\d{2})",
            r"|(?P<comma>\d+,\d{2})",
            r"|(?P<plain>\d+(?:\.\d+)?|\.\d+))",
            r"\s*(?:[£$€¥]|[A-Za-z]{3})?$",
        ))?;
        Ok(Self { re })
    }

    pub fn parse(&self, s: &str) -> Option<f64> {
        let s = s.trim();
        let (s, parenthesized) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            Some(inner) => (inner.trim(), true),
            None => (s, false),
        };
        let caps = self.re.captures(s)?;

        let signs: Vec<&str> = ["lead", "sign"]
            .iter()
            .filter_map(|n| caps.name(n).map(|m| m.as_str()))
            .collect();
        if signs.len() > 1 {
            return None;
        }

        let digits = if let Some(m) = caps.name("grouped") {
            m.as_str().replace(',', "")
        } else if let Some(m) = caps.name("dotted") {
            m.as_str().replace('.', "").replace(',', ".")
        } else if let Some(m) = caps.name("comma") {
            m.as_str().replace(',', ".")
        } else {
            caps.name("plain")?.as_str().to_string()
        };
        let value: f64 = digits.parse().ok()?;

        let negative = parenthesized || signs.first() == Some(&"-");
        Some(if negative { -value } else { value })
    }
}

/// One-off convenience over [`AmountParser`]
pub fn parse_amount(s: &str) -> Option<f64> {
    AmountParser::new().ok()?.parse(s)
}

fn sniff_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .max_by_key(|d| header_line.bytes().filter(|b| *b == *d).count())
        .filter(|d| header_line.as_bytes().contains(d))
        .unwrap_or(b',')
}

fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_row(
    record: &StringRecord,
    idx: &HeaderIndex,
    amounts: &AmountParser,
    opts: &LoadOptions,
) -> std::result::Result<Transaction, String> {
    let raw_date = field(record, Some(idx.date)).ok_or("missing date")?;
    let date = parse_date(raw_date).ok_or_else(|| format!("unparseable date '{raw_date}'"))?;

    let merchant = field(record, Some(idx.merchant)).ok_or("missing merchant")?;

    let raw_amount = field(record, Some(idx.amount)).ok_or("missing amount")?;
    let mut amount = amounts
        .parse(raw_amount).ok_or_else(|| format!("unparseable amount '{raw_amount}'"))?;
    if opts.invert_amounts {
        amount = -amount;
    }

    let description = field(record, idx.description);
    let category = field(record, idx.category)
        .map(str::to_string)
        .or_else(|| infer_category(merchant, description).map(str::to_string))
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    let mut txn = Transaction::new(date, merchant, category, amount);
    if let Some(c) = field(record, idx.currency) {
        txn = txn.with_currency(c.to_uppercase());
    }
    if let Some(d) = description {
        txn = txn.with_description(d);
    }
    if let Some(tags) = field(record, idx.tags) {
        for tag in tags.split([';', '|']).map(str::trim).filter(|t| !t.is_empty()) {
            txn = txn.with_tag(tag);
        }
    }
    Ok(txn)
}

/// Parse a table from any reader
pub fn read_transactions(mut reader: impl Read, opts: &LoadOptions) -> Result<LoadReport> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.trim_start_matches('\u{feff}');

    let delimiter = opts
        .delimiter
        .unwrap_or_else(|| sniff_delimiter(text.lines().next().unwrap_or("")));

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let idx = parse_header_index(rdr.headers()?)?;
    let amounts = AmountParser::new()?;
    let mut report = LoadReport::default();

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!("skipping line {line}: {e}");
                report.skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        match parse_row(&record, &idx, &amounts, opts) {
            Ok(txn) => report.transactions.push(txn),
            Err(reason) => {
                warn!("skipping line {line}: {reason}");
                report.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    info!(
        "loaded {} transactions ({} skipped)",
        report.transactions.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Parse a table from a file on disk
pub fn load_csv(path: impl AsRef<Path>, opts: &LoadOptions) -> Result<LoadReport> {
    let path = path.as_ref();
    info!("reading transactions from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_transactions(file, opts)
}
