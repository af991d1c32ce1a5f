/*!
 * Summary statistics over a produced catalog
 *
 * Statistics are a fold over already-produced records. Means are `None` when
 * their denominator is zero and print as "N/A".
 */

use crate::constants::CURRENCY;
use crate::data_types::*;

/// Aggregate statistics for a catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
    /// Records in the catalog
    pub total_records: usize,
    /// Source rows that produced no record
    pub skipped_rows: usize,
    /// Mean public price over all records
    pub average_public_price: Option<f64>,
    /// Records at 70%
    pub standard_rate_count: usize,
    /// Records at 90%
    pub chronic_rate_count: usize,
    /// Records at 0%
    pub non_reimbursable_count: usize,
    /// Records moved to 90% from a source rate below 90%
    pub upgraded_to_chronic: usize,
    /// Mean reimbursement among reimbursed records
    pub average_reimbursement: Option<f64>,
}

impl CatalogStats {
    /// Compute statistics; `skipped_rows` comes from the run that produced the records
    pub fn from_records(records: &[MedicationRecord], skipped_rows: usize) -> Self {
        let mut stats = CatalogStats {
            total_records: records.len(),
            skipped_rows,
            average_public_price: None,
            standard_rate_count: 0,
            chronic_rate_count: 0,
            non_reimbursable_count: 0,
            upgraded_to_chronic: 0,
            average_reimbursement: None,
        };

        let mut public_price_sum = 0.0;
        let mut reimbursement_sum = 0.0;
        let mut reimbursed_count = 0usize;

        for record in records {
            public_price_sum += record.public_price;

            match record.derived_rate {
                RateTier::NonReimbursable => stats.non_reimbursable_count += 1,
                RateTier::Standard => stats.standard_rate_count += 1,
                RateTier::Chronic => stats.chronic_rate_count += 1,
            }

            if record.upgraded_to_chronic() {
                stats.upgraded_to_chronic += 1;
            }

            if record.derived_rate.is_reimbursed() {
                reimbursement_sum += record.reimbursement_amount;
                reimbursed_count += 1;
            }
        }

        stats.average_public_price = mean(public_price_sum, records.len());
        stats.average_reimbursement = mean(reimbursement_sum, reimbursed_count);
        stats
    }

    /// Count of records at a given tier
    pub fn count_for(&self, tier: RateTier) -> usize {
        match tier {
            RateTier::NonReimbursable => self.non_reimbursable_count,
            RateTier::Standard => self.standard_rate_count,
            RateTier::Chronic => self.chronic_rate_count,
        }
    }

    /// Print a formatted summary of the statistics
    pub fn print_summary(&self) {
        println!("=== CNSS Catalog Statistics ===");
        println!("Total medications: {}", self.total_records);
        if self.skipped_rows > 0 {
            println!("Skipped invalid entries: {}", self.skipped_rows);
        }
        println!("Average PPV: {}", format_amount(self.average_public_price));
        println!("Medications with 70% reimbursement: {}", self.standard_rate_count);
        println!("Medications with 90% reimbursement: {}", self.chronic_rate_count);
        println!("Medications with 0% reimbursement: {}", self.non_reimbursable_count);
        println!();
        println!("=== Comparison: CNSS vs CNOPS ===");
        println!("Medications upgraded to 90%: {}", self.upgraded_to_chronic);
        println!("Average CNSS reimbursement: {}", format_amount(self.average_reimbursement));
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

/// Format an optional amount in the catalog currency
pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format!("{:.2} {}", value, CURRENCY),
        None => "N/A".to_string(),
    }
}

/// Print the first `limit` records with their rate comparison
pub fn print_sample(records: &[MedicationRecord], limit: usize) {
    if limit == 0 || records.is_empty() {
        return;
    }

    println!();
    println!("=== Sample CNSS Medications ===");
    for (i, record) in records.iter().take(limit).enumerate() {
        println!();
        println!("{}. {}", i + 1, record.name);
        println!("   DCI: {}", record.active_ingredient);
        println!("   PPV: {:.2} {}", record.public_price, CURRENCY);
        println!(
            "   CNOPS rate: {}% → CNSS rate: {}",
            record.reference_rate, record.derived_rate
        );
        println!("   Reimbursement: {:.2} {}", record.reimbursement_amount, CURRENCY);
        println!("   Patient pays: {:.2} {}", record.patient_share, CURRENCY);
    }
}
