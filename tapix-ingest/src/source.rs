//! Session data source: a user file when available, the bundled sample
//! otherwise. Loading never fails; problems degrade to a notice.

use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::csv_loader::{LoadOptions, SkippedRow, load_csv, read_transactions};
use tapix_core::Transaction;

const SAMPLE_CSV: &str = include_str!("../data/sample_transactions.csv");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Sample,
    /// The file existed but could not be read
    Empty,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(p) => write!(f, "{}", p.display()),
            DataSource::Sample => f.write_str("bundled sample"),
            DataSource::Empty => f.write_str("no data"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub transactions: Vec<Transaction>,
    pub source: DataSource,
    /// Informational message for the user, if anything degraded
    pub notice: Option<String>,
    pub skipped: Vec<SkippedRow>,
}

/// The demo table shipped with the binary
pub fn sample_transactions() -> Vec<Transaction> {
    match read_transactions(SAMPLE_CSV.as_bytes(), &LoadOptions::default()) {
        Ok(report) => report.transactions,
        Err(e) => {
            warn!("bundled sample failed to parse: {e}");
            Vec::new()
        }
    }
}

fn sample(notice: String) -> LoadedTable {
    LoadedTable {
        transactions: sample_transactions(),
        source: DataSource::Sample,
        notice: Some(notice),
        skipped: Vec::new(),
    }
}

/// Load `path`, falling back to the sample table when no file is given or it does not exist
pub fn load_table(path: Option<&Path>, opts: &LoadOptions) -> LoadedTable {
    let Some(path) = path else {
        return sample("No transaction file configured; using the bundled sample data.".to_string());
    };

    if !path.exists() {
        info!("{} not found; falling back to sample data", path.display());
        return sample(format!(
            "No transaction file at {}; using the bundled sample data.",
            path.display()
        ));
    }

    match load_csv(path, opts) {
        Ok(report) => {
            let notice = if report.transactions.is_empty() && report.skipped.is_empty() {
                Some(format!("{} contains no transactions.", path.display()))
            } else if !report.skipped.is_empty() {
                Some(format!(
                    "Skipped {} malformed row(s) in {} (first at line {}).",
                    report.skipped.len(),
                    path.display(),
                    report.skipped[0].line
                ))
            } else {
                None
            };
            LoadedTable {
                transactions: report.transactions,
                source: DataSource::File(path.to_path_buf()),
                notice,
                skipped: report.skipped,
            }
        }
        Err(e) => {
            warn!("could not load {}: {e}", path.display());
            LoadedTable {
                transactions: Vec::new(),
                source: DataSource::Empty,
                notice: Some(format!(
                    "Could not read {}: {e}. Continuing with no transactions.",
                    path.display()
                )),
                skipped: Vec::new(),
            }
        }
    }
}
