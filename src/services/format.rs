//! Display formatting for evaluator output
//!
//! All precision decisions live in one policy table instead of being
//! re-derived at each render site.

use crate::types::{Analysis, Filter};

/// Event numbers rendered emphasized when the event-number filter is active.
pub const MILESTONES: [u32; 14] = [
    50, 100, 150, 200, 250, 300, 400, 500, 600, 700, 750, 800, 900, 1000,
];

/// Whether an event number lands on a celebrated milestone.
pub fn is_milestone(value: f64) -> bool {
    if value.fract() != 0.0 || value < 0.0 {
        return false;
    }
    MILESTONES.contains(&(value as u32))
}

/// Decimal places for percentage and averaged-count display, keyed by the
/// (analysis, filter) pair. %Total always shows one decimal; the small
/// super-tourist cohort gets one decimal everywhere; ages keep one decimal;
/// everything else rounds to whole numbers.
pub fn display_decimals(analysis: Analysis, filter: Filter) -> usize {
    match (analysis, filter) {
        (Analysis::PctTotal, _) => 1,
        (Analysis::Age, _) => 1,
        (_, Filter::SuperTourists) => 1,
        _ => 0,
    }
}

/// Format a number with a fixed number of decimals. Non-finite → empty.
pub fn format_decimals(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    format!("{:.*}", decimals, value)
}

/// Format a percentage value (already ×100) with the given decimals.
pub fn format_percent(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    format!("{:.*}%", decimals, value)
}

/// Format a duration in seconds as `mm:ss`. Non-finite or negative → empty.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return String::new();
    }
    let total = seconds.round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a signed delta with an explicit `+` prefix, fixed 2 decimals.
pub fn format_signed(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value > 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Format a seasonal-hardness coefficient as a percent delta from 1.0:
/// 1.0432 → "4.32%", 1.0 → "0%". Trailing zeros are trimmed.
pub fn format_coeff(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let pct = (value - 1.0) * 100.0;
    if pct == 0.0 {
        return "0%".to_string();
    }
    let rendered = format!("{:.2}", pct);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{}%", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Coefficient ==========

    #[test]
    fn test_coeff_exact_one_is_zero_percent() {
        assert_eq!(format_coeff(1.0), "0%");
    }

    #[test]
    fn test_coeff_positive_delta() {
        assert_eq!(format_coeff(1.0432), "4.32%");
    }

    #[test]
    fn test_coeff_trims_trailing_zeros() {
        assert_eq!(format_coeff(1.05), "5%");
        assert_eq!(format_coeff(1.1), "10%");
    }

    #[test]
    fn test_coeff_negative_delta() {
        assert_eq!(format_coeff(0.97), "-3%");
    }

    #[test]
    fn test_coeff_rounding_to_zero_stays_zero() {
        assert_eq!(format_coeff(1.00001), "0%");
        assert_eq!(format_coeff(0.99999), "0%");
    }

    #[test]
    fn test_coeff_non_finite_is_blank() {
        assert_eq!(format_coeff(f64::NAN), "");
    }

    // ========== Times ==========

    #[test]
    fn test_format_time_basic() {
        assert_eq!(format_time(1713.0), "28:33");
        assert_eq!(format_time(59.0), "0:59");
        assert_eq!(format_time(60.0), "1:00");
    }

    #[test]
    fn test_format_time_rounds_seconds() {
        assert_eq!(format_time(89.6), "1:30");
    }

    #[test]
    fn test_format_time_invalid_is_blank() {
        assert_eq!(format_time(f64::NAN), "");
        assert_eq!(format_time(-5.0), "");
    }

    // ========== Signed deltas ==========

    #[test]
    fn test_format_signed_positive_has_plus() {
        assert_eq!(format_signed(1.5), "+1.50");
    }

    #[test]
    fn test_format_signed_negative_and_zero() {
        assert_eq!(format_signed(-0.25), "-0.25");
        assert_eq!(format_signed(0.0), "0.00");
    }

    // ========== Precision policy ==========

    #[test]
    fn test_pct_total_always_one_decimal() {
        assert_eq!(display_decimals(Analysis::PctTotal, Filter::All), 1);
        assert_eq!(display_decimals(Analysis::PctTotal, Filter::Tourists), 1);
    }

    #[test]
    fn test_super_tourists_get_one_decimal() {
        assert_eq!(
            display_decimals(Analysis::PctParticipants, Filter::SuperTourists),
            1
        );
        assert_eq!(
            display_decimals(Analysis::Participants, Filter::SuperTourists),
            1
        );
    }

    #[test]
    fn test_default_is_whole_numbers() {
        assert_eq!(display_decimals(Analysis::PctParticipants, Filter::Tourists), 0);
        assert_eq!(display_decimals(Analysis::Participants, Filter::All), 0);
    }

    // ========== Milestones ==========

    #[test]
    fn test_milestones() {
        assert!(is_milestone(50.0));
        assert!(is_milestone(250.0));
        assert!(is_milestone(1000.0));
        assert!(!is_milestone(350.0));
        assert!(!is_milestone(250.5));
        assert!(!is_milestone(-250.0));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(45.0, 0), "45%");
        assert_eq!(format_percent(45.25, 1), "45.2%");
        assert_eq!(format_percent(f64::NAN, 1), "");
    }
}
