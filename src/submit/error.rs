//! # Submit Error Handling
//!
//! Errors raised while preparing a change set. Every variant is fatal to the
//! invocation that raised it: preparation stops at the first failing item and
//! nothing is retried.

use crate::schema::SchemaError;
use std::fmt;
use thiserror::Error;

/// Why an Update or Remove item could not be matched to a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// No entity with the given key exists.
    NotFound,
    /// An entity with the given key exists but the supplied original values
    /// no longer match it.
    PreconditionFailed,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionFailure::NotFound => write!(f, "not found"),
            ResolutionFailure::PreconditionFailed => write!(f, "precondition failed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SubmitError {
    /// The item's action is undefined, or a key-based operation was asked
    /// for an Insert item.
    #[error("Unsupported action {action} for {operation}")]
    UnsupportedAction { action: String, operation: String },

    #[error("Missing entity key for an item in entity set {entity_set}")]
    MissingKey { entity_set: String },

    /// A supplied value cannot be coerced, or names an unknown property.
    #[error("Invalid value for property {property}: {reason}")]
    ValuePredicate { property: String, reason: String },

    #[error("Could not resolve entity {key} in {entity_set}: {failure}")]
    EntityResolution {
        entity_set: String,
        key: String,
        failure: ResolutionFailure,
    },

    #[error("Key {key} matched {count} entities in {entity_set}")]
    MultipleEntitiesFound {
        entity_set: String,
        key: String,
        count: usize,
    },

    /// A full replace names a runtime type other than the stored entity's.
    #[error("Entity {key} in {entity_set} is a {actual}, not a {expected}")]
    EntityTypeMismatch {
        entity_set: String,
        key: String,
        expected: String,
        actual: String,
    },

    /// The change set names an entity set or type the model does not know.
    #[error("Schema error: {0}")]
    Schema(SchemaError),

    #[error("Store operation failed: {operation} - {reason}")]
    Store { operation: String, reason: String },

    #[error("Invalid processing stage transition: {event} from {from}")]
    InvalidStageTransition { from: String, event: String },

    #[error("Change set preparation was cancelled")]
    Cancelled,
}

impl SubmitError {
    pub fn store(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is attributable to the caller's input rather than to
    /// server state or the store.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAction { .. }
                | Self::MissingKey { .. }
                | Self::ValuePredicate { .. }
                | Self::EntityTypeMismatch { .. }
                | Self::Schema(_)
        )
    }
}

impl From<SchemaError> for SubmitError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::UnknownProperty {
                entity_type,
                property,
            } => SubmitError::ValuePredicate {
                reason: format!("entity type {} has no such property", entity_type),
                property,
            },
            SchemaError::InvalidValue { property, reason } => {
                SubmitError::ValuePredicate { property, reason }
            }
            other => SubmitError::Schema(other),
        }
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;
