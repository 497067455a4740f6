//! Centralized limits and default values.

use crate::error::{Error, Result};

/// Maximum length (in characters) of short text columns: tag titles, note
/// subjects, type names and doc type titles.
pub const MAX_SHORT_TEXT_LEN: usize = 255;

/// Maximum length of a stored document filename.
pub const MAX_FILENAME_LEN: usize = 255;

/// Validate a required short text field (trimmed, non-empty, bounded).
pub fn validate_short_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    let len = value.chars().count();
    if len > MAX_SHORT_TEXT_LEN {
        return Err(Error::InvalidInput(format!(
            "{} must be {} characters or less (got {})",
            field, MAX_SHORT_TEXT_LEN, len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_short_text_accepts_boundary() {
        let value = "a".repeat(MAX_SHORT_TEXT_LEN);
        assert!(validate_short_text("title", &value).is_ok());
    }

    #[test]
    fn test_validate_short_text_rejects_blank() {
        let err = validate_short_text("title", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: title must not be empty");
    }

    #[test]
    fn test_validate_short_text_rejects_too_long() {
        let value = "é".repeat(MAX_SHORT_TEXT_LEN + 1);
        let err = validate_short_text("subject", &value).unwrap_err();
        assert!(err.to_string().contains("subject must be 255 characters or less"));
    }
}
