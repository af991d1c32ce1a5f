/*!
 * End-to-end conversion: source spreadsheet to catalog file
 *
 * Reading the source and writing the catalog are the only fatal steps; every
 * row problem in between is absorbed by the transformer.
 */

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::{Result, MedcatError};
use crate::analytics::CatalogStats;
use crate::config::MedcatConfig;
use crate::data_types::{MedicationRecord, SourceTable};
use crate::export::{CatalogExporter, JsonExporter};
use crate::reader::SourceReader;
use crate::transform::{RowFailure, TransformResult, Transformer};

/// What a conversion run produced
#[derive(Debug)]
pub struct RunReport {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Catalog records, as written
    pub records: Vec<MedicationRecord>,
    /// Source rows read
    pub total_rows: usize,
    /// Rows dropped by the acceptance gate
    pub rejected: usize,
    /// Rows dropped because a cell could not be converted
    pub failures: Vec<RowFailure>,
    pub stats: CatalogStats,
    pub elapsed: Duration,
}

impl RunReport {
    /// Print the summary and a sample of the catalog
    pub fn print_summary(&self, sample_size: usize) {
        println!("Processed {} source rows from {}", self.total_rows, self.source.display());
        println!("Successfully processed {} medications for CNSS", self.records.len());
        println!("Skipped {} invalid entries", self.stats.skipped_rows);
        if !self.failures.is_empty() {
            println!("  of which {} could not be read", self.failures.len());
        }
        println!("Data saved to: {}", self.output.display());
        println!();
        self.stats.print_summary();
        crate::analytics::print_sample(&self.records, sample_size);
    }
}

/// Build the transformer a configuration asks for
fn transformer_for(config: &MedcatConfig) -> Transformer {
    let transformer = Transformer::new().with_parallel(config.parallel && cfg!(feature = "parallel"));

    #[cfg(feature = "progress")]
    let transformer = transformer.with_progress_bar(config.enable_progress_bar);

    transformer
}

/// Transform an already-loaded table
pub fn convert(table: &SourceTable, config: &MedcatConfig) -> TransformResult {
    transformer_for(config).transform(table)
}

/// Read `source`, transform every row, and write the catalog to `output`.
pub fn run(source: &Path, output: &Path, config: &MedcatConfig) -> Result<RunReport> {
    config.validate()?;
    let start_time = Instant::now();

    let table = SourceReader::new()
        .with_delimiter(config.delimiter_byte())
        .with_sheet_index(config.sheet_index)
        .load(source)?;

    log::info!("Processing {} medications for the CNSS catalog", table.len());
    let result = convert(&table, config);

    JsonExporter::for_format(config.export_format, config.pretty_print)
        .export(&result.records, output)?;

    let stats = CatalogStats::from_records(&result.records, result.skipped());
    Ok(RunReport {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        total_rows: result.total_rows,
        rejected: result.rejected,
        records: result.records,
        failures: result.failures,
        stats,
        elapsed: start_time.elapsed(),
    })
}

/// Builder for a conversion run
///
/// # Example
/// ```no_run
/// # use medcat::pipeline::PipelineBuilder;
/// let report = PipelineBuilder::new()
///     .source("data/ref-des-medicaments-cnops-2014.csv")
///     .output("medications-cnss.json")
///     .run()?;
/// println!("{} records", report.records.len());
/// # Ok::<(), medcat::MedcatError>(())
/// ```
pub struct PipelineBuilder {
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    config: MedcatConfig,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self {
            source: None,
            output: None,
            config: MedcatConfig::default(),
        }
    }

    /// Set the source spreadsheet
    pub fn source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the catalog destination
    pub fn output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the configuration
    pub fn config(mut self, config: MedcatConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the conversion
    pub fn run(self) -> Result<RunReport> {
        let source = self.source.ok_or_else(|| MedcatError::Custom {
            message: "Source spreadsheet path not specified".to_string(),
            suggestion: Some("Use .source() to specify the medication reference file".to_string()),
        })?;
        let output = self.output.ok_or_else(|| MedcatError::Custom {
            message: "Output catalog path not specified".to_string(),
            suggestion: Some("Use .output() to specify where the catalog is written".to_string()),
        })?;

        run(&source, &output, &self.config)
    }
}
