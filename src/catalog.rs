/*!
 * Reading and searching a produced catalog
 */

use std::path::Path;

use crate::{Result, MedcatError, ErrorContext};
use crate::data_types::MedicationRecord;

/// A catalog loaded back from its JSON (or JSON Lines) form
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub records: Vec<MedicationRecord>,
}

impl Catalog {
    pub fn new(records: Vec<MedicationRecord>) -> Self {
        Self { records }
    }

    /// Load a catalog file; a leading `[` means a JSON array, anything else JSON Lines
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MedcatError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| MedcatError::Io {
            message: format!("cannot read {}: {}", path.display(), e),
            source: e,
            context: ErrorContext {
                file_path: Some(path.to_path_buf()),
                ..Default::default()
            },
        })?;

        let catalog = Self::parse(&contents)?;
        log::info!("Loaded {} catalog records from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse catalog text in either layout
    pub fn parse(contents: &str) -> Result<Self> {
        let trimmed = contents.trim_start();
        let records: Vec<MedicationRecord> = if trimmed.is_empty() {
            Vec::new()
        } else if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else {
            trimmed
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line))
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by its sequence id
    pub fn get(&self, sequence_id: usize) -> Option<&MedicationRecord> {
        self.records.iter().find(|r| r.sequence_id == sequence_id)
    }

    /// Case-insensitive substring search over name and DCI, in catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&MedicationRecord> {
        let needle = query.to_lowercase();

        self.records
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.active_ingredient.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }
}
