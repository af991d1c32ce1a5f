/*!
 * Configuration support for catalog conversion
 *
 * Provides runtime configuration options for customizing conversion behavior.
 * Source and output paths are not part of the configuration: they are passed
 * to `pipeline::run` explicitly.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SAMPLE_SIZE, DEFAULT_SEARCH_LIMIT};
use crate::{ExportFormat, MedcatError};

/// Configuration for conversion runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedcatConfig {
    /// Whether to show progress bars during long operations
    #[serde(default = "default_true")]
    pub enable_progress_bar: bool,

    /// Whether to transform rows on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Field delimiter for CSV sources
    #[serde(default = "default_delimiter")]
    pub csv_delimiter: char,

    /// Worksheet index for workbook sources
    #[serde(default)]
    pub sheet_index: usize,

    /// Output format
    #[serde(default)]
    pub export_format: ExportFormat,

    /// Whether to indent JSON array output
    #[serde(default = "default_true")]
    pub pretty_print: bool,

    /// Number of records listed after the summary
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Maximum number of search results
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for MedcatConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: true,
            parallel: true,
            csv_delimiter: default_delimiter(),
            sheet_index: 0,
            export_format: ExportFormat::Json,
            pretty_print: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl MedcatConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay environment variables on this configuration
    ///
    /// Supported environment variables:
    /// - `MEDCAT_PROGRESS_BAR`: "true" or "false"
    /// - `MEDCAT_PARALLEL`: "true" or "false"
    /// - `MEDCAT_CSV_DELIMITER`: a single character, or "tab"
    /// - `MEDCAT_SHEET_INDEX`: number
    /// - `MEDCAT_EXPORT_FORMAT`: "json" or "json-lines"
    /// - `MEDCAT_PRETTY_PRINT`: "true" or "false"
    /// - `MEDCAT_SAMPLE_SIZE`: number
    /// - `MEDCAT_SEARCH_LIMIT`: number
    ///
    /// Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        let var = |key: &str| std::env::var(key).ok();

        if let Some(val) = var("MEDCAT_PROGRESS_BAR").as_deref().and_then(parse_bool) {
            self.enable_progress_bar = val;
        }

        if let Some(val) = var("MEDCAT_PARALLEL").as_deref().and_then(parse_bool) {
            self.parallel = val;
        }

        if let Some(val) = var("MEDCAT_CSV_DELIMITER") {
            if let Ok(delimiter) = parse_delimiter(&val) {
                self.csv_delimiter = delimiter;
            }
        }

        if let Some(val) = var("MEDCAT_SHEET_INDEX").and_then(|v| v.parse().ok()) {
            self.sheet_index = val;
        }

        if let Some(val) = var("MEDCAT_EXPORT_FORMAT") {
            match val.to_lowercase().as_str() {
                "json" => self.export_format = ExportFormat::Json,
                "json-lines" | "jsonl" => self.export_format = ExportFormat::JsonLines,
                _ => {}
            }
        }

        if let Some(val) = var("MEDCAT_PRETTY_PRINT").as_deref().and_then(parse_bool) {
            self.pretty_print = val;
        }

        if let Some(val) = var("MEDCAT_SAMPLE_SIZE").and_then(|v| v.parse().ok()) {
            self.sample_size = val;
        }

        if let Some(val) = var("MEDCAT_SEARCH_LIMIT").and_then(|v| v.parse().ok()) {
            self.search_limit = val;
        }

        self
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MedcatError::file_not_found_with_suggestion(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| MedcatError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| MedcatError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check values the types alone cannot enforce
    pub fn validate(&self) -> crate::Result<()> {
        if !self.csv_delimiter.is_ascii() {
            return Err(MedcatError::Configuration {
                message: format!("CSV delimiter '{}' is not a single-byte character", self.csv_delimiter),
                suggestion: Some("Use an ASCII delimiter such as ',', ';' or a tab".to_string()),
            });
        }
        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        // validate() rejects non-ASCII delimiters
        if self.csv_delimiter.is_ascii() {
            self.csv_delimiter as u8
        } else {
            b','
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/medcat/config.toml` on Unix-like systems
    /// or `%APPDATA%\medcat\config\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "medcat")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location and the environment
    ///
    /// Priority order (highest first):
    /// 1. Environment variables
    /// 2. Default config file (if it exists and parses)
    /// 3. Built-in defaults
    pub fn load() -> Self {
        let base = Self::default_config_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("Ignoring config file {}: {}", path.display(), e);
                    None
                }
            })
            .unwrap_or_default();

        base.with_env()
    }

    /// Load an explicit config file, then overlay the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Ok(Self::from_file(path)?.with_env())
    }
}

/// Parse a delimiter argument: one character, or the word "tab"
pub fn parse_delimiter(value: &str) -> crate::Result<char> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(MedcatError::Configuration {
            message: format!("Invalid CSV delimiter '{}'", value),
            suggestion: Some("Use a single ASCII character such as ',' or ';', or 'tab'".to_string()),
        }),
    }
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: MedcatConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: MedcatConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: MedcatConfig) -> Self {
        Self { config }
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Set parallel row transformation
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// Set the CSV delimiter
    pub fn csv_delimiter(mut self, delimiter: char) -> Self {
        self.config.csv_delimiter = delimiter;
        self
    }

    /// Set the worksheet index
    pub fn sheet_index(mut self, index: usize) -> Self {
        self.config.sheet_index = index;
        self
    }

    /// Set the output format
    pub fn export_format(mut self, format: ExportFormat) -> Self {
        self.config.export_format = format;
        self
    }

    /// Set pretty printing
    pub fn pretty_print(mut self, pretty: bool) -> Self {
        self.config.pretty_print = pretty;
        self
    }

    /// Set the number of sample records printed after the summary
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Set the search result limit
    pub fn search_limit(mut self, limit: usize) -> Self {
        self.config.search_limit = limit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> MedcatConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MedcatConfig::default();
        assert!(config.enable_progress_bar);
        assert!(config.parallel);
        assert_eq!(config.csv_delimiter, ',');
        assert_eq!(config.export_format, ExportFormat::Json);
        assert_eq!(config.sample_size, 5);
        assert_eq!(config.search_limit, 50);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .progress_bar(false)
            .parallel(false)
            .csv_delimiter(';')
            .export_format(ExportFormat::JsonLines)
            .sample_size(0)
            .build();

        assert!(!config.enable_progress_bar);
        assert!(!config.parallel);
        assert_eq!(config.delimiter_byte(), b';');
        assert_eq!(config.export_format, ExportFormat::JsonLines);
        assert_eq!(config.sample_size, 0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = MedcatConfig::from_toml("csv_delimiter = \";\"\nexport_format = \"json-lines\"\n").unwrap();
        assert_eq!(config.csv_delimiter, ';');
        assert_eq!(config.export_format, ExportFormat::JsonLines);
        assert!(config.pretty_print);
        assert_eq!(config.search_limit, 50);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            MedcatConfig::from_toml("parallel = \"maybe\""),
            Err(MedcatError::Configuration { .. })
        ));
        assert!(MedcatConfig::from_toml("csv_delimiter = \"é\"").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ConfigBuilder::new().csv_delimiter('\t').sheet_index(2).build();

        config.save(&path).unwrap();
        assert_eq!(MedcatConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("tab").unwrap(), '\t');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
