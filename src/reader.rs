/*!
 * Source reader for the medication reference spreadsheet
 *
 * Loads a CSV export (always available) or a workbook (`excel` feature) into
 * a `SourceTable`. The header row is resolved by column name before any data
 * row is read; a missing column aborts the load.
 */

use std::path::Path;
use std::fs::File;
use std::time::Instant;
use csv::ReaderBuilder;

use crate::{
    Result, MedcatError, ErrorContext,
    constants::WORKBOOK_EXTENSIONS,
    data_types::*,
    schema::*,
};

/// Kind of tabular source, decided from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Workbook,
}

impl SourceKind {
    /// Detect the source kind from a path's extension
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceKind::Csv),
            ext if WORKBOOK_EXTENSIONS.contains(&ext) => Ok(SourceKind::Workbook),
            _ => Err(MedcatError::unsupported_source(path.to_path_buf())),
        }
    }
}

/// Reader for reference spreadsheets
pub struct SourceReader {
    /// Field delimiter for CSV sources
    delimiter: u8,
    /// Worksheet to read from workbook sources
    sheet_index: usize,
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader {
    /// Create a reader for comma-separated files and the first worksheet
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            sheet_index: 0,
        }
    }

    /// Set the CSV field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the worksheet index for workbook sources
    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = index;
        self
    }

    /// Load a source table, choosing the format from the file extension
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<SourceTable> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MedcatError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let start_time = Instant::now();
        let table = match SourceKind::detect(path)? {
            SourceKind::Csv => self.load_csv(path)?,
            SourceKind::Workbook => self.load_workbook(path)?,
        };

        log::info!(
            "Loaded {} source rows from {} in {:.2}s",
            table.len(),
            path.display(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(table)
    }

    /// Load a CSV export with a header row
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<SourceTable> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let columns = SourceSchema::validate_headers(&headers)?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let csv_record = result.map_err(|e| MedcatError::CsvParse {
                message: e.to_string(),
                line: Some(idx + 2), // +2 for header and 0-based index
                context: ErrorContext {
                    file_path: Some(path.to_path_buf()),
                    line_number: Some(idx + 2),
                    row_index: Some(idx),
                    ..Default::default()
                },
            })?;

            let cells: Vec<CellValue> = csv_record.iter().map(CellValue::from_text).collect();
            rows.push(columns.extract(&cells));
        }

        Ok(SourceTable::new(rows))
    }

    /// Load the configured worksheet of a workbook; the first row is the header
    #[cfg(feature = "excel")]
    pub fn load_workbook<P: AsRef<Path>>(&self, path: P) -> Result<SourceTable> {
        use calamine::{open_workbook_auto, Reader};

        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(self.sheet_index)
            .ok_or_else(|| MedcatError::Workbook {
                message: format!("workbook has no worksheet at index {}", self.sheet_index),
                context: ErrorContext {
                    file_path: Some(path.to_path_buf()),
                    ..Default::default()
                },
            })??;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .map(|header| header.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default();
        let columns = SourceSchema::validate_headers(&headers)?;

        let rows = sheet_rows
            .map(|row| {
                let cells: Vec<CellValue> = row.iter().map(workbook_cell).collect();
                columns.extract(&cells)
            })
            .collect();

        Ok(SourceTable::new(rows))
    }

    #[cfg(not(feature = "excel"))]
    pub fn load_workbook<P: AsRef<Path>>(&self, _path: P) -> Result<SourceTable> {
        Err(MedcatError::feature_required("excel"))
    }
}

/// Map a workbook cell; booleans and dates become numbers
#[cfg(feature = "excel")]
fn workbook_cell(data: &calamine::Data) -> CellValue {
    use calamine::Data;

    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from_text(s),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}
