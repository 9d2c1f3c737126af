use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const UNIX_EPOCH_RFC3339: &str = "1970-01-01T00:00:00+00:00";

/// Statically declared type of an entity property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Boolean,
    Int32,
    Int64,
    Double,
    String,
    Guid,
    /// RFC 3339 timestamp, normalized to UTC.
    DateTimeOffset,
    /// Enumeration stored by member name; ordinals follow declaration order.
    Enum(Vec<String>),
}

impl PropertyType {
    /// Value a non-nullable property takes when it is reset.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            PropertyType::Boolean => Value::Bool(false),
            PropertyType::Int32 | PropertyType::Int64 => Value::from(0),
            PropertyType::Double => Value::from(0.0),
            PropertyType::String => Value::String(String::new()),
            PropertyType::Guid => Value::String(uuid::Uuid::nil().hyphenated().to_string()),
            PropertyType::DateTimeOffset => Value::String(UNIX_EPOCH_RFC3339.to_string()),
            PropertyType::Enum(members) => members
                .first()
                .map_or(Value::Null, |member| Value::String(member.clone())),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Boolean => write!(f, "Boolean"),
            PropertyType::Int32 => write!(f, "Int32"),
            PropertyType::Int64 => write!(f, "Int64"),
            PropertyType::Double => write!(f, "Double"),
            PropertyType::String => write!(f, "String"),
            PropertyType::Guid => write!(f, "Guid"),
            PropertyType::DateTimeOffset => write!(f, "DateTimeOffset"),
            PropertyType::Enum(members) => write!(f, "Enum({})", members.join("|")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub nullable: bool,
}

impl PropertyDef {
    #[must_use]
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            nullable: false,
        }
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn default_value(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            self.property_type.default_value()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_nullability() {
        let age = PropertyDef::new("Age", PropertyType::Int32);
        assert_eq!(age.default_value(), Value::from(0));

        let middle = PropertyDef::new("MiddleName", PropertyType::String).nullable();
        assert_eq!(middle.default_value(), Value::Null);
    }

    #[test]
    fn enum_default_is_first_member() {
        let feature = PropertyType::Enum(vec!["Feature1".into(), "Feature2".into()]);
        assert_eq!(feature.default_value(), Value::String("Feature1".into()));
    }
}
