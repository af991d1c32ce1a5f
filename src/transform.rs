/*!
 * Row transformation: field normalization, acceptance gate, and the batch driver
 *
 * Each source row is turned into a catalog record independently of every
 * other row. A row is either accepted, rejected (no name or no public price),
 * or failed (a cell that cannot be converted). Neither rejection nor failure
 * stops the batch.
 */

use std::time::Instant;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    Result, MedcatError,
    constants::SCHEME_TAG,
    data_types::*,
    rates::{derive_rate, parse_percentage, patient_share, reimbursement_amount, round2},
    schema::{COL_BASE_PRICE, COL_PUBLIC_PRICE},
};

/// Why a row produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `NOM` missing or blank
    MissingName,
    /// `PPV` missing or zero
    MissingPublicPrice,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingName => write!(f, "missing name"),
            RejectReason::MissingPublicPrice => write!(f, "missing or zero public price"),
        }
    }
}

/// Result of transforming one row
#[derive(Debug)]
pub enum RowOutcome {
    Accepted(MedicationRecord),
    Rejected(RejectReason),
    Failed(MedcatError),
}

/// A row that could not be extracted
#[derive(Debug)]
pub struct RowFailure {
    /// 0-based index of the source row
    pub row_index: usize,
    pub error: MedcatError,
}

/// Outcome of a whole batch
#[derive(Debug, Default)]
pub struct TransformResult {
    /// Accepted records in source order
    pub records: Vec<MedicationRecord>,
    /// Number of source rows read
    pub total_rows: usize,
    /// Rows dropped by the acceptance gate
    pub rejected: usize,
    /// Rows dropped because a cell could not be converted
    pub failures: Vec<RowFailure>,
}

impl TransformResult {
    /// Rows that produced no record, rejected and failed alike
    pub fn skipped(&self) -> usize {
        self.total_rows - self.records.len()
    }
}

/// Transform one source row; `row_index` is its 0-based position in the source.
pub fn transform_row(row_index: usize, row: &SourceRow) -> RowOutcome {
    match normalize_row(row_index, row) {
        Ok(Some(record)) => RowOutcome::Accepted(record),
        Ok(None) if row.name.to_trimmed_text().is_empty() => {
            RowOutcome::Rejected(RejectReason::MissingName)
        }
        Ok(None) => RowOutcome::Rejected(RejectReason::MissingPublicPrice),
        Err(e) => RowOutcome::Failed(e),
    }
}

/// Extract every field, then apply the acceptance gate.
///
/// Price cells are converted before the gate runs, so a malformed price fails
/// the row even when the row would have been rejected anyway.
fn normalize_row(row_index: usize, row: &SourceRow) -> Result<Option<MedicationRecord>> {
    let name = row.name.to_trimmed_text();
    let active_ingredient = row.active_ingredient.to_trimmed_text();
    let dosage_value = row.dosage_value.to_trimmed_text();
    let dosage_unit = row.dosage_unit.to_trimmed_text();
    let form = row.form.to_trimmed_text();
    let presentation = row.presentation.to_trimmed_text();

    let public_price = price_value(&row.public_price, COL_PUBLIC_PRICE, row_index)?.unwrap_or(0.0);
    let base_price = price_value(&row.base_reimbursement_price, COL_BASE_PRICE, row_index)?
        .unwrap_or(public_price);

    let reference_rate = parse_percentage(&row.reference_rate_raw);
    let product_kind = ProductKind::from_flag(&row.product_kind_flag.to_trimmed_text());

    if public_price == 0.0 || name.is_empty() {
        return Ok(None);
    }

    let derived_rate = derive_rate(reference_rate);
    let reimbursement = reimbursement_amount(base_price, derived_rate);
    let share = patient_share(public_price, reimbursement);

    let dosage = if !dosage_value.is_empty() && !dosage_unit.is_empty() {
        format!("{} {}", dosage_value, dosage_unit)
    } else {
        String::new()
    };

    Ok(Some(MedicationRecord {
        sequence_id: row_index + 1,
        name,
        active_ingredient,
        dosage,
        form,
        presentation,
        public_price: round2(public_price),
        base_reimbursement_price: round2(base_price),
        derived_rate,
        reference_rate,
        reimbursement_amount: round2(reimbursement),
        patient_share: round2(share),
        product_kind,
        scheme_tag: SCHEME_TAG.to_string(),
    }))
}

/// Convert a price cell; `None` for the missing marker.
fn price_value(cell: &CellValue, column: &str, row_index: usize) -> Result<Option<f64>> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) if n.is_finite() => Ok(Some(*n)),
        CellValue::Number(n) => Err(MedcatError::cell_conversion(
            column, &n.to_string(), "not a finite number", row_index,
        )),
        CellValue::Text(text) => {
            let trimmed = text.trim();
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| {
                    MedcatError::cell_conversion(column, trimmed, "not a decimal number", row_index)
                })
        }
        CellValue::Error(marker) => Err(MedcatError::cell_conversion(
            column, marker, "spreadsheet error value", row_index,
        )),
    }
}

/// Batch driver over a whole source table
pub struct Transformer {
    /// Whether to map rows on the rayon pool
    parallel: bool,
    /// Whether to show a progress bar
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer {
    /// Create a sequential transformer with progress reporting
    pub fn new() -> Self {
        Self {
            parallel: false,
            #[cfg(feature = "progress")]
            show_progress_bar: true,
        }
    }

    /// Enable or disable the parallel map stage
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Transform every row of `table`, keeping source order.
    pub fn transform(&self, table: &SourceTable) -> TransformResult {
        let start_time = Instant::now();

        #[cfg(feature = "progress")]
        let progress_bar = if self.show_progress_bar {
            let pb = ProgressBar::new(table.len() as u64);
            pb.set_style(
                ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-")
            );
            Some(pb)
        } else {
            None
        };

        let step = |(index, row): (usize, &SourceRow)| {
            let outcome = transform_row(index, row);
            #[cfg(feature = "progress")]
            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
            outcome
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<RowOutcome> = if self.parallel {
            table.rows.par_iter().enumerate().map(step).collect()
        } else {
            table.rows.iter().enumerate().map(step).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<RowOutcome> = table.rows.iter().enumerate().map(step).collect();

        #[cfg(feature = "progress")]
        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        let mut result = TransformResult {
            total_rows: table.len(),
            ..Default::default()
        };

        for (row_index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                RowOutcome::Accepted(record) => result.records.push(record),
                RowOutcome::Rejected(reason) => {
                    log::debug!("Skipping row {}: {}", row_index, reason);
                    result.rejected += 1;
                }
                RowOutcome::Failed(error) => {
                    log::warn!("Error processing row {}: {}", row_index, error);
                    result.failures.push(RowFailure { row_index, error });
                }
            }
        }

        log::info!(
            "Transformed {} rows into {} records in {:.2}s ({} skipped)",
            result.total_rows,
            result.records.len(),
            start_time.elapsed().as_secs_f64(),
            result.skipped()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn paracetamol() -> SourceRow {
        SourceRow {
            name: text(" Paracetamol "),
            active_ingredient: text("PARACETAMOL"),
            dosage_value: text("500"),
            dosage_unit: text("MG"),
            form: text("COMPRIME"),
            presentation: text("BOITE DE 20"),
            public_price: text("12.50"),
            base_reimbursement_price: text("10.00"),
            reference_rate_raw: text("70%"),
            product_kind_flag: text("G"),
        }
    }

    fn accepted(outcome: RowOutcome) -> MedicationRecord {
        match outcome {
            RowOutcome::Accepted(record) => record,
            other => panic!("expected an accepted row, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_rate_row() {
        let record = accepted(transform_row(0, &paracetamol()));

        assert_eq!(record.sequence_id, 1);
        assert_eq!(record.name, "Paracetamol");
        assert_eq!(record.dosage, "500 MG");
        assert_eq!(record.derived_rate, RateTier::Standard);
        assert_eq!(record.reference_rate, 70);
        assert_eq!(record.reimbursement_amount, 7.0);
        assert_eq!(record.patient_share, 5.5);
        assert_eq!(record.product_kind, ProductKind::Equivalent);
        assert_eq!(record.scheme_tag, "CNSS");
    }

    #[test]
    fn test_chronic_rate_row() {
        let row = SourceRow {
            public_price: text("22.00"),
            base_reimbursement_price: text("20.00"),
            reference_rate_raw: text("85%"),
            ..paracetamol()
        };
        let record = accepted(transform_row(4, &row));

        assert_eq!(record.sequence_id, 5);
        assert_eq!(record.derived_rate, RateTier::Chronic);
        assert_eq!(record.reimbursement_amount, 18.0);
        assert_eq!(record.patient_share, 4.0);
        assert!(record.upgraded_to_chronic());
    }

    #[test]
    fn test_amounts_round_on_exact_value() {
        let row = SourceRow {
            base_reimbursement_price: text("20.35"),
            ..paracetamol()
        };
        let record = accepted(transform_row(0, &row));
        assert_eq!(record.reimbursement_amount, 14.24);
    }

    #[test]
    fn test_out_of_range_rates() {
        let row = SourceRow {
            reference_rate_raw: text("99999999999999999999%"),
            ..paracetamol()
        };
        assert_eq!(accepted(transform_row(0, &row)).derived_rate, RateTier::Chronic);

        let row = SourceRow {
            reference_rate_raw: CellValue::Number(-5.0),
            ..paracetamol()
        };
        let record = accepted(transform_row(0, &row));
        assert_eq!(record.reference_rate, -5);
        assert_eq!(record.derived_rate, RateTier::Standard);
        assert_eq!(record.reimbursement_amount, 7.0);
    }

    #[test]
    fn test_base_price_defaults_to_public_price() {
        let row = SourceRow {
            base_reimbursement_price: CellValue::Empty,
            public_price: CellValue::Number(30.0),
            ..paracetamol()
        };
        let record = accepted(transform_row(0, &row));
        assert_eq!(record.base_reimbursement_price, 30.0);
        assert_eq!(record.reimbursement_amount, 21.0);
        assert_eq!(record.patient_share, 9.0);
    }

    #[test]
    fn test_zero_or_missing_price_rejected() {
        for price in [CellValue::Empty, text("0"), CellValue::Number(0.0), text("0,00")] {
            let row = SourceRow { public_price: price, ..paracetamol() };
            assert!(matches!(
                transform_row(0, &row),
                RowOutcome::Rejected(RejectReason::MissingPublicPrice)
            ));
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        for name in [CellValue::Empty, text("   ")] {
            let row = SourceRow { name, ..paracetamol() };
            assert!(matches!(
                transform_row(0, &row),
                RowOutcome::Rejected(RejectReason::MissingName)
            ));
        }
    }

    #[test]
    fn test_unconvertible_price_fails_row() {
        let row = SourceRow { public_price: text("sur demande"), ..paracetamol() };
        match transform_row(3, &row) {
            RowOutcome::Failed(MedcatError::CellConversion { column, context, .. }) => {
                assert_eq!(column, "PPV");
                assert_eq!(context.row_index, Some(3));
            }
            other => panic!("expected a failed row, got {other:?}"),
        }

        let row = SourceRow {
            base_reimbursement_price: CellValue::Error("#VALUE!".to_string()),
            ..paracetamol()
        };
        assert!(matches!(transform_row(0, &row), RowOutcome::Failed(_)));
    }

    #[test]
    fn test_dosage_needs_value_and_unit() {
        let row = SourceRow { dosage_unit: text("  "), ..paracetamol() };
        assert_eq!(accepted(transform_row(0, &row)).dosage, "");

        let row = SourceRow { dosage_value: CellValue::Empty, ..paracetamol() };
        assert_eq!(accepted(transform_row(0, &row)).dosage, "");

        let row = SourceRow { dosage_value: CellValue::Number(1.0), dosage_unit: text("G"), ..paracetamol() };
        assert_eq!(accepted(transform_row(0, &row)).dosage, "1 G");
    }

    #[test]
    fn test_patient_share_never_negative() {
        let row = SourceRow {
            public_price: text("10"),
            base_reimbursement_price: text("50"),
            reference_rate_raw: text("100%"),
            ..paracetamol()
        };
        let record = accepted(transform_row(0, &row));
        assert_eq!(record.reimbursement_amount, 45.0);
        assert_eq!(record.patient_share, 0.0);
    }

    #[test]
    fn test_batch_keeps_positions() {
        let table = SourceTable::new(vec![
            paracetamol(),
            SourceRow { public_price: CellValue::Empty, ..paracetamol() },
            paracetamol(),
            SourceRow { public_price: text("n/a"), ..paracetamol() },
        ]);
        let result = Transformer::new().transform(&table);

        let ids: Vec<usize> = result.records.iter().map(|r| r.sequence_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(result.total_rows, 4);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].row_index, 3);
        assert_eq!(result.skipped(), 2);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let rows: Vec<SourceRow> = (0..500)
            .map(|i| SourceRow {
                public_price: CellValue::Number(if i % 7 == 0 { 0.0 } else { 10.0 + i as f64 }),
                reference_rate_raw: CellValue::Number((i % 101) as f64),
                ..paracetamol()
            })
            .collect();
        let table = SourceTable::new(rows);

        let sequential = Transformer::new().transform(&table);
        let parallel = Transformer::new().with_parallel(true).transform(&table);

        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.rejected, parallel.rejected);
    }
}
