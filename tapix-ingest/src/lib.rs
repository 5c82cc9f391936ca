//! tapix-ingest: transaction table loading, bundled sample data and category rules

pub mod category_rules;
pub mod csv_loader;
pub mod error;
pub mod source;

pub use category_rules::infer_category;
pub use csv_loader::{AmountParser, LoadOptions, LoadReport, SkippedRow, load_csv, parse_amount, parse_date, read_transactions};
pub use error::IngestError;
pub use source::{DataSource, LoadedTable, load_table, sample_transactions};
