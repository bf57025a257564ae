/// Client-side validation for HPA and node pool edits
///
/// Every check returns structured errors instead of failing, so a form can
/// render all problems next to their fields at once.
pub mod hpa;
pub mod limits;
pub mod quantity;

pub use hpa::{validate_hpa_update, HpaUpdate};
pub use limits::{validate_node_pool, validate_replicas, validate_target_percentage};
pub use quantity::{parse_cpu_millicores, parse_memory_bytes, validate_cpu, validate_memory};

use serde::{Deserialize, Serialize};

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {message} (value: {value})")]
pub struct ValidationError {
    /// Logical form field, in the API's snake_case naming
    pub field: String,

    /// Raw offending input
    pub value: String,

    /// Human-readable explanation
    pub message: String,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Re-attribute the error to another field, keeping value and message
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

/// Accumulated outcome of several independent checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; the result becomes invalid
    pub fn add_error(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(ValidationError::new(field, value, message));
    }

    pub fn push(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Append all errors of another result, preserving order
    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.push(error);
        }
    }

    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Render errors one per line as `field: message`
pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|err| format!("{}: {}", err.field, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}
