use thiserror::Error;

/// Failures surfaced by domain validation and invariants, before any I/O.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("field `{field}` {problem}")]
    InvalidField {
        field: &'static str,
        problem: &'static str,
    },
    #[error("validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// A required field that is missing or empty after trimming.
    pub fn missing(field: &'static str) -> Self {
        Self::InvalidField {
            field,
            problem: "is required and must not be empty",
        }
    }

    pub fn invalid(field: &'static str, problem: &'static str) -> Self {
        Self::InvalidField { field, problem }
    }
}

/// Reject blank required fields at the service boundary.
pub fn require_nonempty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::missing(field))
    } else {
        Ok(())
    }
}
