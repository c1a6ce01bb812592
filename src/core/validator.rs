use crate::domain::submission::{SubmissionInput, ValidSubmission};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const MAX_NAME_CHARS: usize = 256;
pub const MAX_EMAIL_CHARS: usize = 320;
pub const MAX_MESSAGE_CHARS: usize = 5000;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Message,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Blank,
    TooLong,
    Malformed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub reason: Reason,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl ValidationError {
    const fn new(field: Field, reason: Reason) -> Self {
        Self { field, reason }
    }

    /// Corrective message shown next to the offending field.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match (self.field, self.reason) {
            (Field::Name, Reason::Blank) => "Please enter your name",
            (Field::Email, Reason::Blank) => "Please enter your email address",
            (Field::Message, Reason::Blank) => "Please enter a message",
            (Field::Name, Reason::TooLong) => "Name is too long",
            (Field::Email, Reason::TooLong) => "Email address is too long",
            (Field::Message, Reason::TooLong) => "Message is too long",
            (_, Reason::Malformed) => "Please enter a valid email address",
        }
    }
}

fn require(field: Field, value: &str, max_chars: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, Reason::Blank));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(field, Reason::TooLong));
    }
    Ok(trimmed.to_string())
}

/// Checks a submission before any I/O happens.
///
/// Rules run in a fixed order (name, email, message, then the email pattern) and the
/// first failure wins.
///
/// # Errors
/// Returns the first [`ValidationError`] encountered.
pub fn validate(input: &SubmissionInput) -> Result<ValidSubmission, ValidationError> {
    let name = require(Field::Name, &input.name, MAX_NAME_CHARS)?;
    let email = require(Field::Email, &input.email, MAX_EMAIL_CHARS)?;
    let message = require(Field::Message, &input.message, MAX_MESSAGE_CHARS)?;

    if !EMAIL_PATTERN.is_match(&email) {
        return Err(ValidationError::new(Field::Email, Reason::Malformed));
    }

    Ok(ValidSubmission::new_unchecked(name, email, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str, message: &str) -> SubmissionInput {
        SubmissionInput::new(name, email, message)
    }

    #[test]
    fn test_validate_success_trims_fields() {
        let valid = validate(&input("  Alex ", " alex@test.com ", "Hi\n")).unwrap();
        assert_eq!(valid.name(), "Alex");
        assert_eq!(valid.email(), "alex@test.com");
        assert_eq!(valid.message(), "Hi");
    }

    #[test]
    fn test_validate_blank_name() {
        let err = validate(&input("", "x@test.com", "Hi")).unwrap_err();
        assert_eq!(err, ValidationError { field: Field::Name, reason: Reason::Blank });
    }

    #[test]
    fn test_validate_whitespace_only_counts_as_blank() {
        let err = validate(&input("Alex", "alex@test.com", " \t\n ")).unwrap_err();
        assert_eq!(err.field, Field::Message);
        assert_eq!(err.reason, Reason::Blank);
    }

    #[test]
    fn test_validate_reports_first_failure_only() {
        // Every field is wrong; name is checked first.
        let err = validate(&input(" ", "", "")).unwrap_err();
        assert_eq!(err.field, Field::Name);

        // Blank message outranks a malformed email.
        let err = validate(&input("Alex", "not-an-email", "")).unwrap_err();
        assert_eq!(err, ValidationError { field: Field::Message, reason: Reason::Blank });
    }

    #[test]
    fn test_validate_malformed_emails() {
        for email in ["alex", "alex@", "@test.com", "alex@test", "al ex@test.com", "alex@@test.com"] {
            let err = validate(&input("Alex", email, "Hi")).unwrap_err();
            assert_eq!(
                err,
                ValidationError { field: Field::Email, reason: Reason::Malformed },
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_accepts_common_addresses() {
        for email in ["alex@test.com", "first.last+tag@sub.example.co.uk", "a@b.io"] {
            assert!(validate(&input("Alex", email, "Hi")).is_ok(), "{email} should be accepted");
        }
    }

    #[test]
    fn test_validate_too_long() {
        let err = validate(&input("Alex", "alex@test.com", &"x".repeat(MAX_MESSAGE_CHARS + 1))).unwrap_err();
        assert_eq!(err, ValidationError { field: Field::Message, reason: Reason::TooLong });

        assert!(validate(&input("Alex", "alex@test.com", &"x".repeat(MAX_MESSAGE_CHARS))).is_ok());
    }

    #[test]
    fn test_validation_error_message() {
        let err = validate(&input("Alex", "alex", "Hi")).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address");
    }
}
