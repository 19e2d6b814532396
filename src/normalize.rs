//! Field normalizers: raw extracted text into canonical field values.
//!
//! Both functions are pure and total. Empty input yields an empty string.

/// Collapses whitespace runs to a single space and truncates at the first
/// comma, dropping trailing descriptive suffixes.
pub fn normalize_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.split(',').next().unwrap_or_default().to_string()
}

/// Strips every non-digit character.
///
/// Lossy for decimal fractions ("19.99" becomes "1999"); price strings are not
/// arithmetic-comparable across currency formats and callers must not treat
/// them as numbers.
pub fn normalize_price(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_empty() {
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_title_collapses_whitespace() {
        assert_eq!(normalize_title("Blue   Widget\t Deluxe"), "Blue Widget Deluxe");
    }

    #[test]
    fn test_title_truncates_at_first_comma() {
        assert_eq!(normalize_title("Widget,  blue"), "Widget");
        assert_eq!(normalize_title("Widget, blue, large"), "Widget");
    }

    #[test]
    fn test_title_trims_edges() {
        assert_eq!(normalize_title("  Widget  "), "Widget");
    }

    #[test]
    fn test_price_empty() {
        assert_eq!(normalize_price(""), "");
    }

    #[test]
    fn test_price_strips_non_digits() {
        assert_eq!(normalize_price("$1,299.00"), "129900");
        assert_eq!(normalize_price("1 299 kr"), "1299");
    }

    #[test]
    fn test_price_no_digits() {
        assert_eq!(normalize_price("call for price"), "");
    }

    #[test]
    fn test_price_collapses_decimals() {
        assert_eq!(normalize_price("19.99"), "1999");
    }
}
