//! Aggregate validation of merged options and translation into [`ServerConfig`].

use crate::model::{JWT_KEY_KEY, SERVER_MODE_KEY};
use crate::{ServerConfig, ServerMode, ServerOptions};
use std::fmt;
use std::time::Duration;

/// Minimum accepted length of the JWT signing key, in characters.
pub const MIN_JWT_KEY_LEN: usize = 6;

/// A single failed check on one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Option key that failed the check.
    pub field: &'static str,
    /// Human readable reason.
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Violations in the order the checks ran.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether `field` has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|violation| violation.field == field)
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.as_slice() {
            [single] => write!(f, "{single}"),
            many => {
                let reasons: Vec<String> = many.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", reasons.join(", "))
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Options that passed validation, with the server mode already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOptions {
    server_mode: ServerMode,
    jwt_key: String,
    expiration: Duration,
}

impl ValidatedOptions {
    /// Translate into the runtime configuration handed to server construction.
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            server_mode: self.server_mode,
            jwt_key: self.jwt_key,
            expiration: self.expiration,
        }
    }
}

impl ServerOptions {
    /// Check every option and collect all violations.
    ///
    /// All checks run even when an earlier one fails, so the error lists
    /// everything that needs fixing at once.
    pub fn validate(self) -> Result<ValidatedOptions, ValidationErrors> {
        let mut violations = Vec::new();

        let server_mode = match self.server_mode.parse::<ServerMode>() {
            Ok(mode) => Some(mode),
            Err(_) => {
                violations.push(FieldViolation {
                    field: SERVER_MODE_KEY,
                    reason: format!(
                        "invalid server mode: must be one of {}",
                        ServerMode::available()
                    ),
                });
                None
            }
        };

        if self.jwt_key.chars().count() < MIN_JWT_KEY_LEN {
            violations.push(FieldViolation {
                field: JWT_KEY_KEY,
                reason: format!("{JWT_KEY_KEY} must be at least {MIN_JWT_KEY_LEN} characters long"),
            });
        }

        match server_mode {
            Some(server_mode) if violations.is_empty() => Ok(ValidatedOptions {
                server_mode,
                jwt_key: self.jwt_key,
                expiration: self.expiration,
            }),
            _ => Err(ValidationErrors { violations }),
        }
    }
}
