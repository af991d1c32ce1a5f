/*!
 * Catalog export
 *
 * The catalog is written as one JSON array (2-space indentation, non-ASCII
 * text kept as-is) or as JSON Lines. The whole record list is in memory
 * before anything is written.
 */

use std::path::Path;
use std::fs::File;
use std::io::{Write, BufWriter};

use crate::{Result, MedcatError, ErrorContext, ExportFormat};
use crate::data_types::MedicationRecord;

/// Trait for implementing catalog exporters
pub trait CatalogExporter {
    /// Write the records to `writer`
    fn write_to<W: Write>(&self, records: &[MedicationRecord], writer: W) -> Result<()>
    where
        Self: Sized;

    /// Export the records to a file
    fn export(&self, records: &[MedicationRecord], path: &Path) -> Result<()>;

    /// Get the export format
    fn format(&self) -> ExportFormat;
}

/// JSON exporter for the catalog
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to export as JSON Lines (one record per line)
    pub json_lines: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            json_lines: false,
        }
    }
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an exporter for a configured format
    pub fn for_format(format: ExportFormat, pretty_print: bool) -> Self {
        match format {
            ExportFormat::Json => Self::new().with_pretty_print(pretty_print),
            ExportFormat::JsonLines => Self::new().as_json_lines(),
        }
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set JSON Lines format
    pub fn as_json_lines(mut self) -> Self {
        self.json_lines = true;
        self.pretty_print = false; // JSON Lines shouldn't be pretty printed
        self
    }

    /// Render the catalog to a string
    pub fn render(&self, records: &[MedicationRecord]) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(records, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MedcatError::Export {
            message: e.to_string(),
            format: self.format(),
            suggestion: None,
        })
    }
}

impl CatalogExporter for JsonExporter {
    fn write_to<W: Write>(&self, records: &[MedicationRecord], mut writer: W) -> Result<()> {
        if self.json_lines {
            for record in records {
                let json = serde_json::to_string(record)?;
                writeln!(writer, "{}", json)?;
            }
        } else if self.pretty_print {
            serde_json::to_writer_pretty(&mut writer, records)?;
        } else {
            serde_json::to_writer(&mut writer, records)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn export(&self, records: &[MedicationRecord], path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| MedcatError::Io {
            message: format!("cannot create {}: {}", path.display(), e),
            source: e,
            context: ErrorContext {
                file_path: Some(path.to_path_buf()),
                ..Default::default()
            },
        })?;
        self.write_to(records, BufWriter::new(file))?;

        log::info!("Wrote {} records to {} ({})", records.len(), path.display(), self.format());
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        if self.json_lines {
            ExportFormat::JsonLines
        } else {
            ExportFormat::Json
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{ProductKind, RateTier};

    fn record() -> MedicationRecord {
        MedicationRecord {
            sequence_id: 3,
            name: "ASPÉGIC".to_string(),
            active_ingredient: "ACIDE ACÉTYLSALICYLIQUE".to_string(),
            dosage: "1000 MG".to_string(),
            form: "POUDRE".to_string(),
            presentation: "BOITE DE 20 SACHETS".to_string(),
            public_price: 18.4,
            base_reimbursement_price: 15.0,
            derived_rate: RateTier::Standard,
            reference_rate: 70,
            reimbursement_amount: 10.5,
            patient_share: 7.9,
            product_kind: ProductKind::Equivalent,
            scheme_tag: "CNSS".to_string(),
        }
    }

    #[test]
    fn test_pretty_json_layout() {
        let json = JsonExporter::new().render(&[record()]).unwrap();

        assert!(json.starts_with("[\n  {\n    \"id\": 3,\n    \"name\": \"ASPÉGIC\","));
        assert!(json.contains("\"taux_remb\": 70,"));
        assert!(json.contains("\"cnops_taux_remb\": 70,"));
        assert!(json.contains("\"type\": \"Générique\","));
        assert!(json.contains("\"insurance\": \"CNSS\""));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_json_lines() {
        let exporter = JsonExporter::new().as_json_lines();
        let out = exporter.render(&[record(), record()]).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert_eq!(exporter.format(), ExportFormat::JsonLines);

        let parsed: MedicationRecord = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(parsed, record());
    }

    #[test]
    fn test_empty_catalog_is_empty_array() {
        let json = JsonExporter::new().render(&[]).unwrap();
        assert_eq!(json, "[]");
    }
}
