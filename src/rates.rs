/*!
 * Reimbursement rate parsing and CNSS rate derivation
 *
 * Source rates arrive as numbers or as descriptive text ("70%", "Taux 80 %").
 * Parsing is best-effort and never fails: anything without a usable number
 * is a 0% rate.
 */

use crate::data_types::{CellValue, RateTier};

/// Extract an integer percentage from a raw cell.
///
/// - missing or error cell: 0
/// - text: the first run of ASCII digits, or 0 when there is none;
///   a run too long for `i64` saturates
/// - number: truncated toward zero, sign kept; non-finite values give 0
pub fn parse_percentage(cell: &CellValue) -> i64 {
    match cell {
        CellValue::Empty | CellValue::Error(_) => 0,
        CellValue::Text(text) => first_digit_run(text)
            .map(|digits| digits.parse().unwrap_or(i64::MAX))
            .unwrap_or(0),
        CellValue::Number(n) if n.is_finite() => {
            // `as` saturates at the i64 bounds
            n.trunc() as i64
        }
        CellValue::Number(_) => 0,
    }
}

fn first_digit_run(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Derive the CNSS rate from the source (CNOPS) rate.
///
/// Breakpoints are 0, 70 and 80: 0 stays non-reimbursable, 80 and above
/// moves to the chronic tier, every other rate (71..=79 and negatives too)
/// is standard.
pub fn derive_rate(reference_rate: i64) -> RateTier {
    match reference_rate {
        0 => RateTier::NonReimbursable,
        70 => RateTier::Standard,
        r if r >= 80 => RateTier::Chronic,
        _ => RateTier::Standard,
    }
}

/// Amount reimbursed on `base_price` at `rate`
pub fn reimbursement_amount(base_price: f64, rate: RateTier) -> f64 {
    base_price * f64::from(rate.percent()) / 100.0
}

/// Out-of-pocket share, never negative
pub fn patient_share(public_price: f64, reimbursement: f64) -> f64 {
    (public_price - reimbursement).max(0.0)
}

/// Round to 2 decimal places.
///
/// Rounds the exact decimal expansion of `value`, ties to even, so 14.245
/// (stored as 14.24499...) gives 14.24. Scaling by 100 first would round
/// the already-inexact product instead.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_parse_percentage_text() {
        assert_eq!(parse_percentage(&text("70%")), 70);
        assert_eq!(parse_percentage(&text("Taux 80 %")), 80);
        assert_eq!(parse_percentage(&text("100")), 100);
        assert_eq!(parse_percentage(&text("12.5%")), 12);
        assert_eq!(parse_percentage(&text("non remboursable")), 0);
        assert_eq!(parse_percentage(&text("%")), 0);
    }

    #[test]
    fn test_parse_percentage_never_fails() {
        assert_eq!(parse_percentage(&CellValue::Empty), 0);
        assert_eq!(parse_percentage(&CellValue::Error("#N/A".to_string())), 0);
        assert_eq!(parse_percentage(&CellValue::Number(f64::NAN)), 0);
        assert_eq!(parse_percentage(&CellValue::Number(f64::INFINITY)), 0);
    }

    #[test]
    fn test_parse_percentage_out_of_range() {
        let huge = parse_percentage(&text("99999999999999999999%"));
        assert_eq!(huge, i64::MAX);
        assert_eq!(derive_rate(huge), RateTier::Chronic);

        let huge = parse_percentage(&CellValue::Number(1e20));
        assert_eq!(derive_rate(huge), RateTier::Chronic);

        let negative = parse_percentage(&CellValue::Number(-5.0));
        assert_eq!(negative, -5);
        assert_eq!(derive_rate(negative), RateTier::Standard);
    }

    #[test]
    fn test_parse_percentage_number_truncates() {
        assert_eq!(parse_percentage(&CellValue::Number(70.0)), 70);
        assert_eq!(parse_percentage(&CellValue::Number(79.9)), 79);
        assert_eq!(parse_percentage(&CellValue::Number(0.4)), 0);
    }

    #[test]
    fn test_derive_rate_breakpoints() {
        assert_eq!(derive_rate(0), RateTier::NonReimbursable);
        assert_eq!(derive_rate(70), RateTier::Standard);
        assert_eq!(derive_rate(75), RateTier::Standard);
        assert_eq!(derive_rate(79), RateTier::Standard);
        assert_eq!(derive_rate(80), RateTier::Chronic);
        assert_eq!(derive_rate(100), RateTier::Chronic);
        assert_eq!(derive_rate(1), RateTier::Standard);
        assert_eq!(derive_rate(69), RateTier::Standard);
        assert_eq!(derive_rate(-1), RateTier::Standard);
    }

    #[test]
    fn test_derive_rate_only_produces_tiers() {
        for rate in 0..=150 {
            let percent = derive_rate(rate).percent();
            assert!([0, 70, 90].contains(&percent), "rate {rate} derived {percent}");
        }
    }

    #[test]
    fn test_amounts() {
        let reimbursed = reimbursement_amount(10.0, RateTier::Standard);
        assert_eq!(round2(reimbursed), 7.0);
        assert_eq!(round2(patient_share(12.5, reimbursed)), 5.5);

        let reimbursed = reimbursement_amount(20.0, RateTier::Chronic);
        assert_eq!(round2(reimbursed), 18.0);
        assert_eq!(round2(patient_share(22.0, reimbursed)), 4.0);

        // base price above the public price
        let reimbursed = reimbursement_amount(100.0, RateTier::Chronic);
        assert_eq!(patient_share(50.0, reimbursed), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_round2_uses_exact_value() {
        // 20.35 * 70 / 100 is stored just below 14.245
        assert_eq!(round2(reimbursement_amount(20.35, RateTier::Standard)), 14.24);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(reimbursement_amount(10.15, RateTier::Standard)), 7.11);
        // exact binary ties go to even
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-1.005), -1.0);
    }
}
