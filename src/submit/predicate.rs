//! Filter predicates built from a change item's key and original values.

use crate::schema::{Entity, EntityType, PropertyAccess};
use crate::submit::change_set::{
    DataModificationAction, DataModificationItem, PropertyValues, IF_NONE_MATCH_KEY,
};
use crate::submit::error::{SubmitError, SubmitResult};
use serde_json::Value;
use std::fmt;

/// Boolean filter over the properties of one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Constant(bool),
    Equal { property: String, value: Value },
    And(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn equal(property: impl Into<String>, value: Value) -> Self {
        Predicate::Equal {
            property: property.into(),
            value,
        }
    }

    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluates the predicate; `And` short-circuits left to right. A property
    /// the entity does not declare never compares equal.
    pub fn evaluate(&self, entity: &Entity) -> bool {
        match self {
            Predicate::Constant(b) => *b,
            Predicate::Equal { property, value } => entity
                .get_property(property)
                .map_or(false, |current| current == value),
            Predicate::And(left, right) => left.evaluate(entity) && right.evaluate(entity),
            Predicate::Not(inner) => !inner.evaluate(entity),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Constant(b) => write!(f, "{}", b),
            Predicate::Equal { property, value } => match value {
                Value::String(s) => write!(f, "{} eq '{}'", property, s.replace('\'', "''")),
                other => write!(f, "{} eq {}", property, other),
            },
            Predicate::And(left, right) => write!(f, "{} and {}", left, right),
            Predicate::Not(inner) => write!(f, "not ({})", inner),
        }
    }
}

/// A filtered read over one entity set, handed to the store for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    pub entity_set: String,
    pub filter: Option<Predicate>,
}

impl EntityQuery {
    pub fn new(entity_set: impl Into<String>) -> Self {
        Self {
            entity_set: entity_set.into(),
            filter: None,
        }
    }

    /// Adds `predicate` to the filter, conjoined with any existing one.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.filter.as_ref().map_or(true, |p| p.evaluate(entity))
    }
}

impl fmt::Display for EntityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}?$filter={}", self.entity_set, filter),
            None => write!(f, "{}", self.entity_set),
        }
    }
}

/// Equality conjunction over `values`, each coerced to its property's type.
fn conjunction<'a, I>(entity_type: &EntityType, values: I) -> SubmitResult<Option<Predicate>>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut predicate: Option<Predicate> = None;
    for (name, value) in values {
        let coerced = entity_type.coerce(name, value)?;
        let equal = Predicate::equal(name.clone(), coerced);
        predicate = Some(match predicate {
            Some(existing) => existing.and(equal),
            None => equal,
        });
    }
    Ok(predicate)
}

/// Builds the predicate selecting the entity an Update or Remove targets.
pub fn build_key_predicate(item: &DataModificationItem) -> SubmitResult<Predicate> {
    if item.action() == DataModificationAction::Insert {
        return Err(SubmitError::UnsupportedAction {
            action: item.action().to_string(),
            operation: "entity key lookup".to_string(),
        });
    }

    let key: &PropertyValues = item
        .entity_key()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| SubmitError::MissingKey {
            entity_set: item.entity_set_name().to_string(),
        })?;

    conjunction(item.expected_entity_type(), key)?.ok_or_else(|| SubmitError::MissingKey {
        entity_set: item.entity_set_name().to_string(),
    })
}

/// Builds the optimistic-concurrency predicate from the item's original
/// values, or `None` when there is nothing to check.
///
/// Keys starting with `@` are annotations and never become conjuncts. When
/// [`IF_NONE_MATCH_KEY`] is present the conjunction is negated; with no other
/// original values the conjunction is `true`, so the result matches nothing.
pub fn build_concurrency_predicate(item: &DataModificationItem) -> SubmitResult<Option<Predicate>> {
    let original_values = match item.original_values() {
        Some(values) if !values.is_empty() => values,
        _ => return Ok(None),
    };

    let values = original_values
        .iter()
        .filter(|(name, _)| !name.starts_with('@'));
    let predicate = conjunction(item.expected_entity_type(), values)?;

    if original_values.contains_key(IF_NONE_MATCH_KEY) {
        Ok(Some(predicate.unwrap_or(Predicate::Constant(true)).negate()))
    } else {
        Ok(predicate)
    }
}
