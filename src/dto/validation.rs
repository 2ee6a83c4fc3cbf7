//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted team or player name.
const MAX_DISPLAY_NAME: usize = 64;

/// Validates that a display name is non-blank and of reasonable length.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_DISPLAY_NAME {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("name must be at most {MAX_DISPLAY_NAME} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_display_name("Sharks").is_ok());
        assert!(validate_display_name("Ana Souza").is_ok());
    }

    #[test]
    fn rejects_blank_names() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn rejects_oversized_names() {
        let long = "x".repeat(MAX_DISPLAY_NAME + 1);
        assert!(validate_display_name(&long).is_err());
    }
}
