//! Input validation for track codes and calculator values.

use crate::errors::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

// Codes are matched after uppercasing, so the lowercase range is not needed.
static TRACK_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\-_]{5,}$").expect("track code pattern is valid"));

/// Normalize one candidate line into a track code.
///
/// Returns `None` for anything that does not look like a track code after
/// trimming and uppercasing; callers skip those lines silently.
pub fn normalize_track_code(line: &str) -> Option<String> {
    let code = line.trim().to_uppercase();
    if TRACK_CODE_RE.is_match(&code) {
        Some(code)
    } else {
        None
    }
}

/// Extract all valid track codes from a multi-line submission, in input order.
pub fn extract_track_codes(text: &str) -> Vec<String> {
    text.lines().filter_map(normalize_track_code).collect()
}

/// Parse a calculator value, accepting the comma decimal separator common in
/// the bot's audience ("1,5" means 1.5).
pub fn parse_decimal(input: &str) -> AppResult<f64> {
    let normalized = input.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AppError::Validation(format!("'{}' is not a number", input.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_track_code() {
        assert_eq!(
            normalize_track_code("  ab-12_3  "),
            Some("AB-12_3".to_string())
        );
        assert_eq!(normalize_track_code("CD-5678"), Some("CD-5678".to_string()));

        // Too short, empty, or containing other characters
        assert_eq!(normalize_track_code("AB12"), None);
        assert_eq!(normalize_track_code(""), None);
        assert_eq!(normalize_track_code("   "), None);
        assert_eq!(normalize_track_code("AB12,3"), None);
        assert_eq!(normalize_track_code("AB 123"), None);
    }

    #[test]
    fn test_extract_track_codes_skips_invalid_lines() {
        let codes = extract_track_codes("AB12,3\nshort\nCD-5678\nAB12,3");
        assert_eq!(codes, vec!["SHORT".to_string(), "CD-5678".to_string()]);
    }

    #[test]
    fn test_extract_track_codes_preserves_input_order() {
        let codes = extract_track_codes("ZZ999\n\nAA111\n");
        assert_eq!(codes, vec!["ZZ999".to_string(), "AA111".to_string()]);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1.5").unwrap(), 1.5);
        assert_eq!(parse_decimal("1,5").unwrap(), 1.5);
        assert_eq!(parse_decimal(" 30 ").unwrap(), 30.0);

        assert!(parse_decimal("abc").is_err());
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("inf").is_err());
    }
}
