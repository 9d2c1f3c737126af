//! Conversion of loosely typed JSON values into the declared type of a property.
//!
//! Values arrive from the protocol layer as plain JSON: keys parsed out of a
//! URL are often strings, enum members may be sent by name or ordinal. Every
//! value is normalized here before it is compared or stored, so that two
//! values of the same property compare equal exactly when they denote the
//! same thing.

use crate::schema::types::{PropertyDef, PropertyType, SchemaError};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Coerces `value` to the type declared by `def`.
pub fn coerce_value(def: &PropertyDef, value: &Value) -> Result<Value, SchemaError> {
    if value.is_null() {
        return if def.nullable {
            Ok(Value::Null)
        } else {
            Err(SchemaError::invalid_value(
                &def.name,
                "null is not allowed for a non-nullable property",
            ))
        };
    }

    match &def.property_type {
        PropertyType::Boolean => coerce_bool(def, value),
        PropertyType::Int32 => {
            coerce_integer(def, value, i64::from(i32::MIN), i64::from(i32::MAX))
        }
        PropertyType::Int64 => coerce_integer(def, value, i64::MIN, i64::MAX),
        PropertyType::Double => coerce_double(def, value),
        PropertyType::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(mismatch(def, value)),
        },
        PropertyType::Guid => match value {
            Value::String(s) => uuid::Uuid::parse_str(s.trim())
                .map(|id| Value::String(id.hyphenated().to_string()))
                .map_err(|e| SchemaError::invalid_value(&def.name, e.to_string())),
            _ => Err(mismatch(def, value)),
        },
        PropertyType::DateTimeOffset => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|ts| Value::String(ts.with_timezone(&Utc).to_rfc3339()))
                .map_err(|e| SchemaError::invalid_value(&def.name, e.to_string())),
            _ => Err(mismatch(def, value)),
        },
        PropertyType::Enum(members) => coerce_enum(def, members, value),
    }
}

fn coerce_bool(def: &PropertyDef, value: &Value) -> Result<Value, SchemaError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(mismatch(def, value)),
    }
}

fn coerce_integer(
    def: &PropertyDef,
    value: &Value,
    min: i64,
    max: i64,
) -> Result<Value, SchemaError> {
    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= min as f64 && *f <= max as f64)
                .map(|f| f as i64),
        },
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(i) if i >= min && i <= max => Ok(Value::from(i)),
        Some(i) => Err(SchemaError::invalid_value(
            &def.name,
            format!("{} is out of range for {}", i, def.property_type),
        )),
        None => Err(mismatch(def, value)),
    }
}

fn coerce_double(def: &PropertyDef, value: &Value) -> Result<Value, SchemaError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(Value::from(f)),
        _ => Err(mismatch(def, value)),
    }
}

fn coerce_enum(def: &PropertyDef, members: &[String], value: &Value) -> Result<Value, SchemaError> {
    match value {
        Value::String(s) if members.iter().any(|m| m == s) => Ok(Value::String(s.clone())),
        Value::Number(n) => n
            .as_u64()
            .and_then(|ordinal| usize::try_from(ordinal).ok())
            .and_then(|ordinal| members.get(ordinal))
            .map(|member| Value::String(member.clone()))
            .ok_or_else(|| mismatch(def, value)),
        _ => Err(mismatch(def, value)),
    }
}

fn mismatch(def: &PropertyDef, value: &Value) -> SchemaError {
    SchemaError::invalid_value(
        &def.name,
        format!("cannot convert {} to {}", value, def.property_type),
    )
}
