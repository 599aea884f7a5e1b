//! Field-level validation for request payloads.
//!
//! Request bodies are deserialized into payload structs where every field is
//! optional, then checked with a [Validator] that collects every problem so the
//! client can fix them all at once.

use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// A problem with a single field in a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// The name of the offending field as the client sent it, e.g. "paymentMethod".
    pub field: String,
    /// A human readable explanation.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }
}

/// Collects [FieldError]s while a payload is checked.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `field`.
    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Record an error if `condition` is false.
    pub fn check(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.push(field, message);
        }
    }

    /// Returns the value, recording an error if it is missing.
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, &format!("{field} is required"));
        }

        value
    }

    /// Returns the trimmed string, recording an error if it is missing or blank.
    pub fn require_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|text| text.trim().to_owned()) {
            Some(text) if !text.is_empty() => Some(text),
            _ => {
                self.push(field, &format!("{field} is required"));
                None
            }
        }
    }

    /// Parse a required enum value, recording an error if it is missing or not one of `allowed`.
    pub fn require_one_of<T: FromStr>(
        &mut self,
        field: &str,
        value: Option<String>,
        allowed: &[&str],
    ) -> Option<T> {
        match value {
            Some(value) => self.parse_one_of(field, &value, allowed),
            None => {
                self.push(field, &format!("{field} is required"));
                None
            }
        }
    }

    /// Parse an optional enum value, falling back to `default` when it is absent.
    pub fn one_of_or<T: FromStr>(
        &mut self,
        field: &str,
        value: Option<String>,
        allowed: &[&str],
        default: T,
    ) -> Option<T> {
        match value {
            Some(value) => self.parse_one_of(field, &value, allowed),
            None => Some(default),
        }
    }

    fn parse_one_of<T: FromStr>(&mut self, field: &str, value: &str, allowed: &[&str]) -> Option<T> {
        match value.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.push(
                    field,
                    &format!("{field} must be one of: {}", allowed.join(", ")),
                );
                None
            }
        }
    }

    /// Returns a [Error::Validation] if any errors were recorded.
    pub fn finish(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}

/// Validate and normalize a three letter ISO 4217 currency code.
///
/// Returns the upper case code or `None` if `code` is not three ASCII letters.
pub fn normalize_currency_code(code: &str) -> Option<String> {
    let code = code.trim();

    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}
