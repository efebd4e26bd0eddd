//! Lenient numeric coercion for extracted field values.
//!
//! Extractors write measurements the way reports print them ("12 cm",
//! "3.5cm", "Not Mentioned"). Coercion reads the leading decimal literal and
//! ignores whatever follows it. A value with no numeric prefix becomes `None`,
//! never zero.

/// Coerce an extracted string to a number.
///
/// Leading whitespace is skipped, then the longest prefix of the form
/// `[+-]digits[.digits][e[+-]digits]` is parsed. Returns `None` for a missing
/// value, a value without a numeric prefix, or a non-finite result.
pub fn coerce_number(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim_start();
    let literal = numeric_prefix(text)?;
    literal.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Longest leading slice of `text` that is a decimal literal.
fn numeric_prefix(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    Some(&text[..end])
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_decimal() {
        assert_eq!(coerce_number(Some("12.5")), Some(12.5));
    }

    #[test]
    fn test_negative_integer() {
        assert_eq!(coerce_number(Some("-3")), Some(-3.0));
    }

    #[test]
    fn test_explicit_plus_sign() {
        assert_eq!(coerce_number(Some("+4.25")), Some(4.25));
    }

    #[test]
    fn test_missing_is_absent() {
        assert_eq!(coerce_number(None), None);
    }

    #[test]
    fn test_empty_is_absent() {
        assert_eq!(coerce_number(Some("")), None);
        assert_eq!(coerce_number(Some("   ")), None);
    }

    #[test]
    fn test_non_numeric_is_absent_not_zero() {
        assert_eq!(coerce_number(Some("N/A")), None);
        assert_eq!(coerce_number(Some("Not Mentioned")), None);
        assert_eq!(coerce_number(Some("cm 12")), None);
    }

    #[test]
    fn test_unit_suffix_is_ignored() {
        assert_eq!(coerce_number(Some("12 cm")), Some(12.0));
        assert_eq!(coerce_number(Some("3.5cm")), Some(3.5));
        assert_eq!(coerce_number(Some("  7.0 mm")), Some(7.0));
    }

    #[test]
    fn test_leading_or_trailing_dot() {
        assert_eq!(coerce_number(Some(".5")), Some(0.5));
        assert_eq!(coerce_number(Some("5.")), Some(5.0));
        assert_eq!(coerce_number(Some(".")), None);
        assert_eq!(coerce_number(Some("-")), None);
    }

    #[test]
    fn test_exponent() {
        assert_eq!(coerce_number(Some("1.5e2")), Some(150.0));
        assert_eq!(coerce_number(Some("2E-1 cm")), Some(0.2));
    }

    #[test]
    fn test_dangling_exponent_is_dropped() {
        assert_eq!(coerce_number(Some("4e")), Some(4.0));
        assert_eq!(coerce_number(Some("4e+cm")), Some(4.0));
    }

    #[test]
    fn test_dimension_string_takes_first_number() {
        assert_eq!(coerce_number(Some("3.2 x 2.1 x 1.0 cm")), Some(3.2));
    }

    #[test]
    fn test_non_finite_is_absent() {
        assert_eq!(coerce_number(Some("1e999")), None);
        assert_eq!(coerce_number(Some("Infinity")), None);
        assert_eq!(coerce_number(Some("NaN")), None);
    }
}
