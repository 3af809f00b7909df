// 💰 Currency helpers - minor units, rounding, display formatting
//
// All amounts in the system are integer minor units (whole dinars).
// Formatting is a display concern only: grouped digits + currency suffix,
// never fractional units.

/// Currency amount in integer minor units
pub type Amount = i64;

/// Currency suffix appended to every displayed amount
pub const CURRENCY_SUFFIX: &str = "DA";

/// Round a computed amount to the nearest minor unit, halves up.
///
/// Amounts in this system are non-negative, so "half up" and
/// "half away from zero" coincide.
///
/// Example: 77764.5 → 77765
pub fn round_half_up(value: f64) -> Amount {
    (value + 0.5).floor() as Amount
}

/// Format an amount as grouped digits with the currency suffix.
///
/// Example: 3200000 → "3,200,000 DA"
pub fn format_amount(amount: Amount) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);

    let first_group = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - first_group) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-{} {}", grouped, CURRENCY_SUFFIX)
    } else {
        format!("{} {}", grouped, CURRENCY_SUFFIX)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(0.0), 0);
        assert_eq!(round_half_up(77764.4), 77764);
        assert_eq!(round_half_up(77764.5), 77765);
        assert_eq!(round_half_up(77764.9), 77765);
        assert_eq!(round_half_up(5000.0), 5000);
    }

    #[test]
    fn test_format_amount_grouping() {
        assert_eq!(format_amount(0), "0 DA");
        assert_eq!(format_amount(999), "999 DA");
        assert_eq!(format_amount(1000), "1,000 DA");
        assert_eq!(format_amount(45000), "45,000 DA");
        assert_eq!(format_amount(3200000), "3,200,000 DA");
        assert_eq!(format_amount(1234567890), "1,234,567,890 DA");
    }

    #[test]
    fn test_format_amount_negative() {
        // Negative amounts never reach the UI, but the formatter
        // should not garble them either
        assert_eq!(format_amount(-45000), "-45,000 DA");
    }
}
