//! Domain records for the maintenance store.
//!
//! # Responsibility
//! - Define the record shapes read from storage and the input shapes
//!   accepted by repository writes.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a repository-generated UUID v4.
//! - Timestamps are RFC 3339 UTC strings with millisecond precision.
//! - Blank optional text is normalized to `None` before persistence.

use chrono::{DateTime, SecondsFormat, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod checklist_item;
pub mod employee;
pub mod equipment;
pub mod maintenance_type;
pub mod order_response;
pub mod service_order;

/// Field-level validation failure for repository inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is absent or blank after trim.
    MissingField(&'static str),
    /// Field is present but its value breaks a domain rule.
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidField { field, message } => {
                write!(f, "invalid value for `{field}`: {message}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Formats a timestamp the way every `created_at`/`updated_at` column stores it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current UTC time in storage format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Maps blank optional text to `None`.
pub(crate) fn normalize_optional(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
