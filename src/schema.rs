/*!
 * Schema definition for the medication reference spreadsheet
 *
 * The source is matched by column name, not position: the header row is
 * resolved once into a `ColumnMap`, and every data row is then read through it.
 */

use crate::data_types::{CellValue, SourceRow};
use crate::MedcatError;

pub const COL_NAME: &str = "NOM";
pub const COL_ACTIVE_INGREDIENT: &str = "DCI1";
pub const COL_DOSAGE_VALUE: &str = "DOSAGE1";
pub const COL_DOSAGE_UNIT: &str = "UNITE_DOSAGE1";
pub const COL_FORM: &str = "FORME";
pub const COL_PRESENTATION: &str = "PRESENTATION";
pub const COL_PUBLIC_PRICE: &str = "PPV";
pub const COL_BASE_PRICE: &str = "PRIX_BR";
pub const COL_REFERENCE_RATE: &str = "TAUX_REMBOURSEMENT";
pub const COL_PRODUCT_KIND: &str = "PRINCEPS_GENERIQUE";

/// Reference spreadsheet schema
pub struct SourceSchema;

impl SourceSchema {
    /// All required column names
    pub fn column_names() -> Vec<&'static str> {
        vec![
            COL_NAME,
            COL_ACTIVE_INGREDIENT,
            COL_DOSAGE_VALUE,
            COL_DOSAGE_UNIT,
            COL_FORM,
            COL_PRESENTATION,
            COL_PUBLIC_PRICE,
            COL_BASE_PRICE,
            COL_REFERENCE_RATE,
            COL_PRODUCT_KIND,
        ]
    }

    /// Number of required columns
    pub fn column_count() -> usize {
        Self::column_names().len()
    }

    /// Resolve a header row into column positions.
    ///
    /// Header names are compared after trimming. Extra columns are ignored;
    /// any missing required column is reported in a single error.
    pub fn validate_headers(headers: &[String]) -> Result<ColumnMap, MedcatError> {
        let position = |column: &str| headers.iter().position(|h| h.trim() == column);

        let missing: Vec<String> = Self::column_names()
            .into_iter()
            .filter(|column| position(*column).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(MedcatError::missing_columns(missing, headers));
        }

        log::debug!(
            "Resolved {} required columns from {} header fields",
            Self::column_count(),
            headers.len()
        );

        // All present, checked above
        let index = |column: &str| position(column).unwrap_or_default();
        Ok(ColumnMap {
            name: index(COL_NAME),
            active_ingredient: index(COL_ACTIVE_INGREDIENT),
            dosage_value: index(COL_DOSAGE_VALUE),
            dosage_unit: index(COL_DOSAGE_UNIT),
            form: index(COL_FORM),
            presentation: index(COL_PRESENTATION),
            public_price: index(COL_PUBLIC_PRICE),
            base_reimbursement_price: index(COL_BASE_PRICE),
            reference_rate_raw: index(COL_REFERENCE_RATE),
            product_kind_flag: index(COL_PRODUCT_KIND),
        })
    }
}

/// Positions of the required columns within a source row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub active_ingredient: usize,
    pub dosage_value: usize,
    pub dosage_unit: usize,
    pub form: usize,
    pub presentation: usize,
    pub public_price: usize,
    pub base_reimbursement_price: usize,
    pub reference_rate_raw: usize,
    pub product_kind_flag: usize,
}

impl ColumnMap {
    /// Pick the required cells out of a full row; short rows yield missing cells
    pub fn extract(&self, cells: &[CellValue]) -> SourceRow {
        let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();

        SourceRow {
            name: cell(self.name),
            active_ingredient: cell(self.active_ingredient),
            dosage_value: cell(self.dosage_value),
            dosage_unit: cell(self.dosage_unit),
            form: cell(self.form),
            presentation: cell(self.presentation),
            public_price: cell(self.public_price),
            base_reimbursement_price: cell(self.base_reimbursement_price),
            reference_rate_raw: cell(self.reference_rate_raw),
            product_kind_flag: cell(self.product_kind_flag),
        }
    }
}
