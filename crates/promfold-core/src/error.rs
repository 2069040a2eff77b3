//! Error types for mapping construction.

use thiserror::Error;

use crate::mapping::LabelRole;

/// Structural problems in a mapping table, raised once at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("metric {metric:?} has an empty target field path")]
    EmptyTargetField { metric: String },

    #[error("metric {metric:?} is declared more than once")]
    DuplicateMetric { metric: String },

    #[error("label {label:?} declared as both {first} and {second}")]
    ConflictingLabelRole {
        label: String,
        first: LabelRole,
        second: LabelRole,
    },

    #[error("metric {metric:?} has an invalid operation: {reason}")]
    InvalidOperation { metric: String, reason: String },
}
