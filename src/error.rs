/*!
 * Error handling for catalog conversion
 *
 * Provides detailed error types with context, suggestions, and recovery guidance.
 * Cell conversion errors are caught by the transformer and never abort a
 * batch; everything else is fatal to the run that produced it.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Catalog library result type
pub type Result<T> = std::result::Result<T, MedcatError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum MedcatError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        context: ErrorContext,
    },

    /// Source file not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Required source columns are missing from the header row
    #[error("Schema mismatch: missing column(s) {}", .missing_columns.join(", "))]
    SchemaMismatch {
        missing_columns: Vec<String>,
        found_columns: Vec<String>,
    },

    /// A cell is present but cannot be converted to the field's type
    #[error("Cannot convert column {column} value '{value}': {reason}")]
    CellConversion {
        column: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },

    /// Source file extension is not a supported tabular format
    #[error("Unsupported source format: {path}")]
    UnsupportedSource {
        path: PathBuf,
        supported: Vec<String>,
    },

    /// Workbook could not be opened or read
    #[error("Workbook error: {message}")]
    Workbook {
        message: String,
        context: ErrorContext,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
        suggestion: Option<String>,
    },

    /// Feature not enabled error
    #[error("Feature '{feature}' is not enabled")]
    FeatureNotEnabled {
        feature: String,
        enable_instruction: String,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub column_name: Option<String>,
    pub row_index: Option<usize>,
}

/// Catalog output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// A single JSON array
    #[default]
    Json,
    /// One JSON record per line
    JsonLines,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
        }
    }
}

impl MedcatError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let lossy = path.to_string_lossy().to_lowercase();
        let suggestion = if lossy.contains("cnops") || lossy.contains("medicament") {
            format!(
                "Check if the reference list exists at '{}'. The source is the CNOPS medication \
                reference spreadsheet (exported to CSV, or read directly with the 'excel' feature).",
                path.display()
            )
        } else if lossy.ends_with(".json") {
            format!(
                "Check if the catalog exists at '{}'. Catalogs are produced by 'medcat convert'.",
                path.display()
            )
        } else {
            format!(
                "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
                path.display()
            )
        };

        Self::FileNotFound { path, suggestion }
    }

    /// Create a schema mismatch error listing the absent columns
    pub fn missing_columns(missing: Vec<String>, found: &[String]) -> Self {
        Self::SchemaMismatch {
            missing_columns: missing,
            found_columns: found.to_vec(),
        }
    }

    /// Create a cell conversion error for one row
    pub fn cell_conversion(column: &str, value: &str, reason: &str, row_index: usize) -> Self {
        Self::CellConversion {
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
            context: ErrorContext {
                column_name: Some(column.to_string()),
                row_index: Some(row_index),
                ..Default::default()
            },
        }
    }

    /// Create an unsupported source error listing the accepted extensions
    pub fn unsupported_source(path: PathBuf) -> Self {
        let mut supported = vec!["csv".to_string()];
        if cfg!(feature = "excel") {
            supported.extend(
                crate::constants::WORKBOOK_EXTENSIONS.iter().map(|ext| ext.to_string())
            );
        }
        Self::UnsupportedSource { path, supported }
    }

    /// Create a feature not enabled error
    pub fn feature_required(feature: &str) -> Self {
        let enable_instruction = match feature {
            "excel" => "Rebuild with 'cargo install medcat --features excel' to read .xlsx/.xls/.ods sources directly",
            _ => "Enable the required feature in your Cargo.toml",
        };

        Self::FeatureNotEnabled {
            feature: feature.to_string(),
            enable_instruction: enable_instruction.to_string(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::SchemaMismatch { found_columns, .. } => {
                format!(
                    "{}\n\nExpected columns: {}\nFound columns: {}",
                    self,
                    crate::schema::SourceSchema::column_names().join(", "),
                    found_columns.join(", ")
                )
            }
            Self::UnsupportedSource { supported, .. } => {
                format!("{}\n\nSupported extensions: {}", self, supported.join(", "))
            }
            Self::FeatureNotEnabled { enable_instruction, .. } => {
                format!("{}\n\nTo enable: {}", self, enable_instruction)
            }
            Self::Configuration { suggestion: Some(sug), .. }
            | Self::Export { suggestion: Some(sug), .. }
            | Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for MedcatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for MedcatError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line() as usize);

        Self::CsvParse {
            message: err.to_string(),
            line,
            context: ErrorContext {
                line_number: line,
                ..Default::default()
            },
        }
    }
}

impl From<serde_json::Error> for MedcatError {
    fn from(err: serde_json::Error) -> Self {
        MedcatError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
            suggestion: Some("Check that the catalog file is a JSON array of medication records.".to_string()),
        }
    }
}

#[cfg(feature = "excel")]
impl From<calamine::Error> for MedcatError {
    fn from(err: calamine::Error) -> Self {
        MedcatError::Workbook {
            message: err.to_string(),
            context: ErrorContext::default(),
        }
    }
}
