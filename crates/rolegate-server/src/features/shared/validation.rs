//! Shared validation utilities
//!
//! Input checks reused by the user, role and permission commands.

use thiserror::Error;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors that can occur during email validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    #[error("Email is required")]
    Required,

    #[error("Email must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Email address is malformed")]
    InvalidFormat,
}

/// Validate a name field
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed max_length characters
pub fn validate_name(name: &str, max_length: usize) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::Required);
    }

    if name.chars().count() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }

    Ok(())
}

/// Validate an email address
///
/// Only the shape `local@domain.tld` is checked; deliverability is not.
pub fn validate_email(email: &str, max_length: usize) -> Result<(), EmailValidationError> {
    if email.trim().is_empty() {
        return Err(EmailValidationError::Required);
    }

    if email.len() > max_length {
        return Err(EmailValidationError::TooLong { max_length });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(EmailValidationError::InvalidFormat);
    };

    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));

    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) || !domain_ok
    {
        return Err(EmailValidationError::InvalidFormat);
    }

    Ok(())
}

/// Validate a lowercase identifier such as a permission resource or action
///
/// Letters, digits, `_`, `-` and `.` are allowed.
pub fn is_valid_identifier(value: &str, max_length: usize) -> bool {
    !value.is_empty()
        && value.len() <= max_length
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Alice", 100).is_ok());
        assert_eq!(validate_name("   ", 100), Err(NameValidationError::Required));
        assert_eq!(
            validate_name(&"a".repeat(101), 100),
            Err(NameValidationError::TooLong { max_length: 100 })
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com", 255).is_ok());
        assert!(validate_email("first.last@mail.example.org", 255).is_ok());

        assert_eq!(validate_email("", 255), Err(EmailValidationError::Required));
        for bad in ["ax.com", "@x.com", "a@x", "a@.com", "a@x.", "a b@x.com", "a@b@x.com"] {
            assert_eq!(
                validate_email(bad, 255),
                Err(EmailValidationError::InvalidFormat),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_identifier() {
        assert!(is_valid_identifier("user", 50));
        assert!(is_valid_identifier("audit_log.read", 50));
        assert!(!is_valid_identifier("", 50));
        assert!(!is_valid_identifier("User", 50));
        assert!(!is_valid_identifier("a b", 50));
    }
}
