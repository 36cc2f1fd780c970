//! Validation utilities and regex patterns

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use validator::ValidationError;

/// Regex pattern for validating hex color codes (e.g., #FFFFFF, #FF0000)
pub static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid hex color regex pattern")
});

/// Palette names understood by the renderer
pub const PALETTE_NAMES: [&str; 6] = ["default", "dark", "light", "vibrant", "monochrome", "custom"];

/// Validate a `#RRGGBB` color string
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_REGEX.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_hex_color"))
    }
}

/// Validate a palette name (case-insensitive)
pub fn validate_palette_name(name: &str) -> Result<(), ValidationError> {
    if PALETTE_NAMES.iter().any(|p| p.eq_ignore_ascii_case(name)) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_palette"))
    }
}

/// Validate that both dates parse as `YYYY-MM-DD` and `start` is not after `end`
pub fn validate_date_range(start: &str, end: &str) -> Result<(), ValidationError> {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d");

    match (parse(start), parse(end)) {
        (Ok(s), Ok(e)) if s <= e => Ok(()),
        (Ok(_), Ok(_)) => Err(ValidationError::new("start_after_end")),
        _ => Err(ValidationError::new("invalid_date_format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_regex() {
        assert!(HEX_COLOR_REGEX.is_match("#FFFFFF"));
        assert!(HEX_COLOR_REGEX.is_match("#1f77b4"));

        assert!(!HEX_COLOR_REGEX.is_match("FFFFFF"));
        assert!(!HEX_COLOR_REGEX.is_match("#FFF"));
        assert!(!HEX_COLOR_REGEX.is_match("#GGGGGG"));
    }

    #[test]
    fn test_palette_names() {
        assert!(validate_palette_name("default").is_ok());
        assert!(validate_palette_name("Vibrant").is_ok());
        assert!(validate_palette_name("rainbow").is_err());
    }

    #[test]
    fn test_date_range() {
        assert!(validate_date_range("2015-01-01", "2026-01-15").is_ok());
        assert!(validate_date_range("2020-01-01", "2020-01-01").is_ok());
        assert_eq!(
            validate_date_range("2021-01-01", "2020-01-01").unwrap_err().code,
            "start_after_end"
        );
        assert_eq!(
            validate_date_range("01/01/2020", "2020-01-01").unwrap_err().code,
            "invalid_date_format"
        );
    }
}
