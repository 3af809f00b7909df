// 📊 Financing - Installment calculator
//
// Pure amortization math for the storefront. Listing cards show a default
// monthly payment (20% down, 36 months, 5.9% APR); the detail page lets
// the buyer vary the term through FinancingOptions.

use crate::currency::{round_half_up, Amount};
use crate::schema::ValidationError;

/// Share of the list price covered by the minimum down payment
pub const DOWN_PAYMENT_RATE: f64 = 0.20;

/// Default financing term for listing-card payments
pub const DEFAULT_TERM_MONTHS: u32 = 36;

/// Default annual interest rate (percent)
pub const DEFAULT_ANNUAL_RATE: f64 = 5.9;

/// Term lengths offered by the installment calculator
pub const TERM_OPTIONS: [u32; 5] = [12, 24, 36, 48, 60];

/// Compute the fixed monthly payment for an amortized loan.
///
/// `annual_rate_percent` is the yearly rate in percent (5.9 means 5.9%).
/// The result is rounded to the nearest minor unit, halves up.
///
/// A zero rate degenerates to straight division: the rate-based formula
/// would divide by zero.
pub fn compute_monthly_payment(
    principal: Amount,
    annual_rate_percent: f64,
    term_months: u32,
) -> Result<Amount, ValidationError> {
    if principal < 0 {
        return Err(ValidationError::new(
            "Financing",
            "principal",
            "Principal cannot be negative",
        ));
    }
    if term_months == 0 {
        return Err(ValidationError::new(
            "Financing",
            "term_months",
            "Term must be at least one month",
        ));
    }
    if annual_rate_percent.is_nan() || annual_rate_percent < 0.0 {
        return Err(ValidationError::new(
            "Financing",
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }

    // A positive principal owes at least one minor unit per month; tiny
    // loans would otherwise round down to a free loan.
    let floor = if principal > 0 { 1 } else { 0 };

    if annual_rate_percent == 0.0 {
        return Ok(round_half_up(principal as f64 / term_months as f64).max(floor));
    }

    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let growth = (1.0 + monthly_rate).powi(term_months as i32);
    let payment = principal as f64 * monthly_rate * growth / (growth - 1.0);

    Ok(round_half_up(payment).max(floor))
}

/// Default monthly payment shown on a listing: 80% of the list price
/// financed over 36 months at 5.9% APR.
pub fn default_monthly_payment(price: Amount) -> Result<Amount, ValidationError> {
    if price <= 0 {
        return Err(ValidationError::new(
            "Financing",
            "price",
            "Price must be greater than zero",
        ));
    }

    let principal = round_half_up(price as f64 * (1.0 - DOWN_PAYMENT_RATE));
    compute_monthly_payment(principal, DEFAULT_ANNUAL_RATE, DEFAULT_TERM_MONTHS)
}

/// Financing parameters the detail-page calculator works from
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FinancingOptions {
    /// Minimum down payment (20% of the list price)
    pub down_payment_min: Amount,
    pub term_options: [u32; 5],
    /// Annual interest rate in percent
    pub interest_rate: f64,
}

impl FinancingOptions {
    pub fn for_price(price: Amount) -> Self {
        FinancingOptions {
            down_payment_min: round_half_up(price as f64 * DOWN_PAYMENT_RATE),
            term_options: TERM_OPTIONS,
            interest_rate: DEFAULT_ANNUAL_RATE,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference amortization formula, kept separate from the production
    /// path so the two can disagree
    fn reference_payment(principal: f64, annual_rate_percent: f64, term_months: u32) -> f64 {
        let r = annual_rate_percent / 100.0 / 12.0;
        let f = (1.0 + r).powi(term_months as i32);
        principal * r * f / (f - 1.0)
    }

    #[test]
    fn test_zero_rate_falls_back_to_straight_division() {
        let payment = compute_monthly_payment(1_000_000, 0.0, 36).unwrap();
        assert_eq!(payment, round_half_up(1_000_000.0 / 36.0));
        assert_eq!(payment, 27_778);
    }

    #[test]
    fn test_standard_quote_matches_formula() {
        // 3,200,000 DA car: 80% financed over 36 months at 5.9%
        let payment = compute_monthly_payment(2_560_000, 5.9, 36).unwrap();
        let expected = round_half_up(reference_payment(2_560_000.0, 5.9, 36));
        assert_eq!(payment, expected);

        // Sanity band: the quote is in the tens of thousands, not off by 10x
        assert!(payment > 70_000 && payment < 85_000, "payment = {}", payment);
    }

    #[test]
    fn test_positive_and_monotonic_in_principal() {
        for &term in &TERM_OPTIONS {
            let mut previous = 0;
            for principal in [1, 50_000, 800_000, 2_560_000, 10_000_000] {
                let payment = compute_monthly_payment(principal, 5.9, term).unwrap();
                assert!(payment > 0);
                assert!(payment >= previous, "payment dropped as principal grew");
                previous = payment;
            }
        }
    }

    #[test]
    fn test_longer_terms_cost_less_per_month() {
        let mut previous = Amount::MAX;
        for &term in &TERM_OPTIONS {
            let payment = compute_monthly_payment(2_560_000, 5.9, term).unwrap();
            assert!(payment < previous);
            previous = payment;
        }
    }

    #[test]
    fn test_tiny_principal_still_charges_something() {
        // Rounding alone would quote 0/month for these
        assert_eq!(compute_monthly_payment(1, 5.9, 12).unwrap(), 1);
        assert_eq!(compute_monthly_payment(1, 0.0, 60).unwrap(), 1);
        assert_eq!(compute_monthly_payment(10, 5.9, 60).unwrap(), 1);

        // Zero principal is still a free loan
        assert_eq!(compute_monthly_payment(0, 5.9, 36).unwrap(), 0);
        assert_eq!(compute_monthly_payment(0, 0.0, 36).unwrap(), 0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(compute_monthly_payment(-1, 5.9, 36).is_err());
        assert!(compute_monthly_payment(1_000_000, 5.9, 0).is_err());
        assert!(compute_monthly_payment(1_000_000, -0.1, 36).is_err());
        assert!(compute_monthly_payment(1_000_000, f64::NAN, 36).is_err());

        // Zero principal is a valid degenerate quote
        assert_eq!(compute_monthly_payment(0, 5.9, 36).unwrap(), 0);
    }

    #[test]
    fn test_default_listing_payment() {
        let payment = default_monthly_payment(3_200_000).unwrap();
        let expected = round_half_up(reference_payment(2_560_000.0, 5.9, 36));
        assert_eq!(payment, expected);

        assert!(default_monthly_payment(0).is_err());
        assert!(default_monthly_payment(-3_200_000).is_err());
    }

    #[test]
    fn test_financing_options_for_price() {
        let options = FinancingOptions::for_price(3_200_000);
        assert_eq!(options.down_payment_min, 640_000);
        assert_eq!(options.term_options, [12, 24, 36, 48, 60]);
        assert_eq!(options.interest_rate, 5.9);
    }
}
