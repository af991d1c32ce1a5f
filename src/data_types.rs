/*!
 * Data type definitions for medication reference rows and catalog records
 *
 * Source rows hold raw cells exactly as the spreadsheet delivered them;
 * catalog records are the normalized, rate-annotated output. The JSON field
 * names of `MedicationRecord` are the catalog format read by the front-end.
 */

use serde::{Deserialize, Serialize};

use crate::constants::SCHEME_TAG;

/// A raw spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing marker (empty cell)
    #[default]
    Empty,
    /// Numeric cell (workbook numbers, booleans and dates)
    Number(f64),
    /// Text cell, untrimmed
    Text(String),
    /// Spreadsheet error marker such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Build a cell from delimited text; blank text is the missing marker
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Whether the cell carries the missing marker
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render the cell as trimmed text, `""` for missing cells
    pub fn to_trimmed_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) | CellValue::Error(s) => s.trim().to_string(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Text(s) | CellValue::Error(s) => write!(f, "{}", s),
        }
    }
}

/// Integral numbers render without a fractional part ("500", not "500.0")
// Integral values print as "500", not "500.0"; this intentionally differs
// from a float-to-string rendering of workbook cells.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One row of the reference spreadsheet, keyed by the source column contract
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceRow {
    /// `NOM`
    pub name: CellValue,
    /// `DCI1`
    pub active_ingredient: CellValue,
    /// `DOSAGE1`
    pub dosage_value: CellValue,
    /// `UNITE_DOSAGE1`
    pub dosage_unit: CellValue,
    /// `FORME`
    pub form: CellValue,
    /// `PRESENTATION`
    pub presentation: CellValue,
    /// `PPV`
    pub public_price: CellValue,
    /// `PRIX_BR`
    pub base_reimbursement_price: CellValue,
    /// `TAUX_REMBOURSEMENT`
    pub reference_rate_raw: CellValue,
    /// `PRINCEPS_GENERIQUE`
    pub product_kind_flag: CellValue,
}

/// The source table: rows in file order, header already resolved
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn new(rows: Vec<SourceRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Originator vs. equivalent product (`PRINCEPS_GENERIQUE` flag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    #[serde(rename = "Princeps")]
    Originator,
    #[serde(rename = "Générique")]
    Equivalent,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ProductKind {
    /// Map the source flag; exact match only
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "P" => ProductKind::Originator,
            "G" => ProductKind::Equivalent,
            _ => ProductKind::Unknown,
        }
    }

    /// Label used in the catalog
    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Originator => "Princeps",
            ProductKind::Equivalent => "Générique",
            ProductKind::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// CNSS reimbursement tier; the only rates the derivation rule can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RateTier {
    /// 0%, not reimbursed
    NonReimbursable,
    /// 70%, standard private-sector rate
    Standard,
    /// 90%, serious or chronic conditions
    Chronic,
}

impl RateTier {
    pub const ALL: [RateTier; 3] = [RateTier::NonReimbursable, RateTier::Standard, RateTier::Chronic];

    pub fn percent(&self) -> u32 {
        match self {
            RateTier::NonReimbursable => 0,
            RateTier::Standard => 70,
            RateTier::Chronic => 90,
        }
    }

    pub fn is_reimbursed(&self) -> bool {
        *self != RateTier::NonReimbursable
    }
}

impl From<RateTier> for u32 {
    fn from(tier: RateTier) -> Self {
        tier.percent()
    }
}

impl TryFrom<u32> for RateTier {
    type Error = String;

    fn try_from(percent: u32) -> std::result::Result<Self, Self::Error> {
        match percent {
            0 => Ok(RateTier::NonReimbursable),
            70 => Ok(RateTier::Standard),
            90 => Ok(RateTier::Chronic),
            other => Err(format!("{}% is not a CNSS reimbursement tier (expected 0, 70 or 90)", other)),
        }
    }
}

impl std::fmt::Display for RateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    /// 1-based position of the source row, skipped rows included
    #[serde(rename = "id")]
    pub sequence_id: usize,
    pub name: String,
    #[serde(rename = "dci")]
    pub active_ingredient: String,
    pub dosage: String,
    #[serde(rename = "forme")]
    pub form: String,
    pub presentation: String,
    #[serde(rename = "ppv")]
    pub public_price: f64,
    #[serde(rename = "prix_br")]
    pub base_reimbursement_price: f64,
    #[serde(rename = "taux_remb")]
    pub derived_rate: RateTier,
    /// Source (CNOPS) rate kept for comparison
    #[serde(rename = "cnops_taux_remb")]
    pub reference_rate: i64,
    pub reimbursement_amount: f64,
    #[serde(rename = "patient_pays")]
    pub patient_share: f64,
    #[serde(rename = "type")]
    pub product_kind: ProductKind,
    #[serde(rename = "insurance")]
    pub scheme_tag: String,
}

impl MedicationRecord {
    /// Derived rate is 90% while the source rate was below 90%
    pub fn upgraded_to_chronic(&self) -> bool {
        self.derived_rate == RateTier::Chronic && self.reference_rate < 90
    }

    /// Whether the record carries the scheme tag this crate produces
    pub fn is_cnss(&self) -> bool {
        self.scheme_tag == SCHEME_TAG
    }

    /// One-line description used by the command line
    pub fn display_line(&self) -> String {
        let mut line = self.name.clone();
        if !self.dosage.is_empty() {
            line.push(' ');
            line.push_str(&self.dosage);
        }
        if !self.active_ingredient.is_empty() {
            line.push_str(&format!(" ({})", self.active_ingredient));
        }
        line
    }
}
