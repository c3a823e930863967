//! Issue number normalization.
//!
//! Source numbers arrive as free text: `"001"`, `"12AU"`, `"0.5"`, `"½"`.
//! Normalization strips leading zeros from the numeric prefix (keeping a
//! bare zero) and preserves any fractional part and alpha suffix verbatim.

pub fn normalize_issue_number(number: &str) -> String {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        // No numeric prefix at all ("½", "Annual"); pass through as-is.
        return trimmed.to_string();
    }

    let (integer_part, rest) = trimmed.split_at(digits_end);
    let stripped = integer_part.trim_start_matches('0');
    let integer_part = if stripped.is_empty() { "0" } else { stripped };

    let (fraction, suffix) = match rest.strip_prefix('.') {
        Some(after_dot) => {
            let fraction_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            if fraction_end > 0 {
                (Some(&after_dot[..fraction_end]), &after_dot[fraction_end..])
            } else {
                (None, rest)
            }
        }
        None => (None, rest),
    };

    let mut normalized = String::with_capacity(trimmed.len());
    normalized.push_str(integer_part);
    if let Some(fraction) = fraction {
        normalized.push('.');
        normalized.push_str(fraction);
    }
    normalized.push_str(suffix);
    normalized
}

#[cfg(test)]
mod tests {
    use super::normalize_issue_number;

    #[test]
    fn test_leading_zeros_are_stripped() {
        assert_eq!(normalize_issue_number("001"), "1");
        assert_eq!(normalize_issue_number("010"), "10");
        assert_eq!(normalize_issue_number("0"), "0");
        assert_eq!(normalize_issue_number("000"), "0");
    }

    #[test]
    fn test_suffix_and_fraction_preserved() {
        assert_eq!(normalize_issue_number("12AU"), "12AU");
        assert_eq!(normalize_issue_number("012AU"), "12AU");
        assert_eq!(normalize_issue_number("0.5"), "0.5");
        assert_eq!(normalize_issue_number("00.5"), "0.5");
        assert_eq!(normalize_issue_number("3.1B"), "3.1B");
    }

    #[test]
    fn test_non_numeric_input_passes_through() {
        assert_eq!(normalize_issue_number("½"), "½");
        assert_eq!(normalize_issue_number("Annual"), "Annual");
        assert_eq!(normalize_issue_number("  7 "), "7");
        assert_eq!(normalize_issue_number(""), "");
    }
}
