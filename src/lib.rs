/*!
 * # medcat: CNSS medication catalog builder
 *
 * Converts the CNOPS medication reference spreadsheet into a JSON catalog
 * annotated with the reimbursement rate each medication gets under the CNSS
 * scheme.
 *
 * ## Features
 *
 * - **Lenient row handling**: a malformed row is logged and skipped, never fatal
 * - **Fixed CNSS rule**: 0% stays 0%, 70% stays 70%, 80% and above becomes 90%,
 *   anything else is 70%
 * - **CSV and workbook sources**: CSV always, `.xlsx`/`.xls`/`.ods` with the
 *   `excel` feature
 * - **Deterministic output**: the same source always produces the same bytes
 *
 * ## Quick Start
 *
 * ```no_run
 * use medcat::prelude::*;
 * use std::path::Path;
 *
 * # fn main() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .csv_delimiter(';')
 *     .progress_bar(false)
 *     .build();
 *
 * let report = medcat::pipeline::run(
 *     Path::new("data/ref-des-medicaments-cnops-2014.csv"),
 *     Path::new("src/data/medications-cnss.json"),
 *     &config,
 * )?;
 * report.print_summary(config.sample_size);
 * # Ok(())
 * # }
 * ```
 *
 * ## Working with a catalog
 *
 * ```no_run
 * # use medcat::prelude::*;
 * # fn main() -> Result<()> {
 * let catalog = Catalog::load("src/data/medications-cnss.json")?;
 * for record in catalog.search("paracetamol", 10) {
 *     println!("{} -> {}", record.name, record.derived_rate);
 * }
 *
 * CatalogStats::from_records(&catalog.records, 0).print_summary();
 * # Ok(())
 * # }
 * ```
 *
 * ## Single rows
 *
 * ```
 * use medcat::prelude::*;
 *
 * let row = SourceRow {
 *     name: CellValue::Text("Paracetamol".into()),
 *     public_price: CellValue::Text("12.50".into()),
 *     base_reimbursement_price: CellValue::Text("10.00".into()),
 *     reference_rate_raw: CellValue::Text("70%".into()),
 *     ..Default::default()
 * };
 *
 * match transform_row(0, &row) {
 *     RowOutcome::Accepted(record) => {
 *         assert_eq!(record.derived_rate, RateTier::Standard);
 *         assert_eq!(record.patient_share, 5.5);
 *     }
 *     other => panic!("unexpected outcome: {other:?}"),
 * }
 * ```
 */

// Re-export error types from root
pub use error::{MedcatError, Result, ErrorContext, ExportFormat};

// Public modules
pub mod data_types;
pub mod schema;
pub mod reader;
pub mod rates;
pub mod transform;
pub mod error;
pub mod analytics;
pub mod export;
pub mod catalog;
pub mod pipeline;
pub mod config;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use medcat::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::reader::{SourceReader, SourceKind};
    pub use crate::schema::{SourceSchema, ColumnMap};
    pub use crate::rates::{derive_rate, parse_percentage};
    pub use crate::transform::{transform_row, RowOutcome, RejectReason, Transformer, TransformResult};
    pub use crate::error::{MedcatError, Result};
    pub use crate::analytics::CatalogStats;
    pub use crate::export::{CatalogExporter, JsonExporter};
    pub use crate::catalog::Catalog;
    pub use crate::pipeline::{PipelineBuilder, RunReport};
    pub use crate::config::{ConfigBuilder, MedcatConfig};
    pub use crate::ExportFormat;
}

/// Catalog constants
pub mod constants {
    /// Insurance scheme every record is tagged with
    pub const SCHEME_TAG: &str = "CNSS";

    /// Currency of all prices and amounts
    pub const CURRENCY: &str = "MAD";

    /// Records listed after the summary by default
    pub const DEFAULT_SAMPLE_SIZE: usize = 5;

    /// Search results returned by default
    pub const DEFAULT_SEARCH_LIMIT: usize = 50;

    /// Workbook extensions readable with the `excel` feature
    pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
}
