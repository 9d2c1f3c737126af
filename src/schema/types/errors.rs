use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    NotFound(String),
    UnknownProperty { entity_type: String, property: String },
    InvalidValue { property: String, reason: String },
    InvalidModel(String),
}

impl SchemaError {
    pub(crate) fn invalid_value(property: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidValue {
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchemaError::NotFound(msg) => write!(f, "Schema element not found: {}", msg),
            SchemaError::UnknownProperty {
                entity_type,
                property,
            } => write!(f, "Entity type {} has no property {}", entity_type, property),
            SchemaError::InvalidValue { property, reason } => {
                write!(f, "Invalid value for property {}: {}", property, reason)
            }
            SchemaError::InvalidModel(msg) => write!(f, "Invalid model: {}", msg),
        }
    }
}

impl std::error::Error for SchemaError {}
