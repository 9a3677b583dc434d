use std::collections::HashMap;

use uuid::Uuid;

use crate::error::ApiError;

/// Collects per-field problems so a single 422 can report all of them.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, problem: impl Into<String>) {
        // First problem per field wins
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| problem.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Trimmed text that must be present and within `min..=max` characters.
    pub fn required_text(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) -> Option<String> {
        match value {
            Some(raw) => self.text(field, raw.trim(), min, max),
            None => {
                self.add(field, "is required");
                None
            }
        }
    }

    /// Like `required_text`, but absence is fine.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) -> Option<String> {
        value.and_then(|raw| self.text(field, raw.trim(), min, max))
    }

    pub fn required_email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let email = self.required_text(field, value, 1, 140)?;
        self.email(field, email)
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let email = self.optional_text(field, value, 1, 140)?;
        self.email(field, email)
    }

    /// Passwords are taken verbatim; surrounding whitespace is part of the secret.
    pub fn required_password(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value {
            Some(raw) => self.password(field, raw),
            None => {
                self.add(field, "is required");
                None
            }
        }
    }

    pub fn optional_password(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        value.and_then(|raw| self.password(field, raw))
    }

    /// Canonical hyphenated form of a UUID reference.
    pub fn required_uuid(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value {
            Some(raw) => self.uuid(field, raw),
            None => {
                self.add(field, "is required");
                None
            }
        }
    }

    pub fn optional_uuid(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        value.and_then(|raw| self.uuid(field, raw))
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid request", self.errors))
        }
    }

    fn text(&mut self, field: &str, value: &str, min: usize, max: usize) -> Option<String> {
        let len = value.chars().count();
        if len == 0 {
            self.add(field, "must not be blank");
            return None;
        }
        if len < min || len > max {
            self.add(field, format!("must be between {} and {} characters", min, max));
            return None;
        }
        Some(value.to_string())
    }

    fn email(&mut self, field: &str, email: String) -> Option<String> {
        if is_valid_email(&email) {
            Some(normalize_email(&email))
        } else {
            self.add(field, "is not a valid email address");
            None
        }
    }

    fn password(&mut self, field: &str, value: &str) -> Option<String> {
        let len = value.chars().count();
        if len == 0 || len > 128 {
            self.add(field, "must be between 1 and 128 characters");
            return None;
        }
        Some(value.to_string())
    }

    fn uuid(&mut self, field: &str, value: &str) -> Option<String> {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => Some(id.to_string()),
            Err(_) => {
                self.add(field, "must be a valid UUID");
                None
            }
        }
    }
}

/// Domains are case-insensitive, so store them lowercased. The local part is kept as given.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Structural check: one `@`, a non-empty local part, and a dotted domain
/// made of non-empty labels. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}
