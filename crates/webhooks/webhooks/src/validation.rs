//! Input validation for webhook subscriptions.

use crate::error::{WebhookError, WebhookResult};

/// Maximum length of a webhook name.
pub const MAX_NAME_LEN: usize = 40;

/// Validate a webhook name.
///
/// Names start with a lowercase letter and contain only lowercase letters,
/// digits or dashes, with at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> WebhookResult<()> {
    if name.is_empty() {
        return Err(WebhookError::Validation(
            "webhook name must not be empty".to_string(),
        ));
    }

    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_valid = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if !starts_with_letter || !rest_valid || name.len() > MAX_NAME_LEN {
        return Err(WebhookError::Validation(format!(
            "Invalid name, name should have at most {MAX_NAME_LEN} characters, containing only lower case letters, numbers or dashes, starting with a letter."
        )));
    }

    Ok(())
}

/// Validate a webhook delivery URL.
///
/// The URL must be present and parse as an absolute URL.
pub fn validate_url(url: &str) -> WebhookResult<()> {
    if url.is_empty() {
        return Err(WebhookError::Validation(
            "webhook url must not be empty".to_string(),
        ));
    }
    url::Url::parse(url)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("a").is_ok());
        assert!(validate_name("deploy-hook").is_ok());
        assert!(validate_name("hook2").is_ok());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "1hook", "-hook", "Hook", "my_hook", "my hook", "hóok"] {
            let err = validate_name(name).unwrap_err();
            assert!(err.is_validation(), "expected validation error for {name:?}");
        }
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url("https://example.com/hook").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());

        assert!(validate_url("").unwrap_err().is_validation());
        assert!(validate_url("://missing-scheme").unwrap_err().is_validation());
        assert!(validate_url("/relative/path").unwrap_err().is_validation());
    }
}
