use crate::schema::coercion::coerce_value;
use crate::schema::types::{PropertyDef, SchemaError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Metadata for one entity type.
///
/// The name → position table is built once when the type is constructed so
/// property access by name never scans the property list.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    namespace: String,
    name: String,
    properties: Vec<PropertyDef>,
    key: Vec<String>,
    index: HashMap<String, usize>,
}

impl EntityType {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        properties: Vec<PropertyDef>,
        key: Vec<String>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut index = HashMap::with_capacity(properties.len());
        for (position, property) in properties.iter().enumerate() {
            if index.insert(property.name.clone(), position).is_some() {
                return Err(SchemaError::InvalidModel(format!(
                    "Duplicate property {} on entity type {}",
                    property.name, name
                )));
            }
        }
        if let Some(missing) = key.iter().find(|k| !index.contains_key(*k)) {
            return Err(SchemaError::InvalidModel(format!(
                "Key property {} is not declared on entity type {}",
                missing, name
            )));
        }
        Ok(Self {
            namespace: namespace.into(),
            name,
            properties,
            key,
            index,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn key(&self) -> &[String] {
        &self.key
    }

    pub fn position_of(&self, property: &str) -> Option<usize> {
        self.index.get(property).copied()
    }

    pub fn property(&self, property: &str) -> Result<&PropertyDef, SchemaError> {
        self.position_of(property)
            .map(|position| &self.properties[position])
            .ok_or_else(|| SchemaError::UnknownProperty {
                entity_type: self.name.clone(),
                property: property.to_string(),
            })
    }

    /// Coerces `value` to the declared type of `property`.
    pub fn coerce(&self, property: &str, value: &Value) -> Result<Value, SchemaError> {
        coerce_value(self.property(property)?, value)
    }
}

/// Dynamic property access on an entity instance.
pub trait PropertyAccess {
    fn get_property(&self, name: &str) -> Result<&Value, SchemaError>;
    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), SchemaError>;
}

/// An entity instance whose values are stored positionally against its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    entity_type: Arc<EntityType>,
    values: Vec<Value>,
}

impl Entity {
    /// Creates a blank instance: every property holds its type default.
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        let values = entity_type
            .properties()
            .iter()
            .map(PropertyDef::default_value)
            .collect();
        Self {
            entity_type,
            values,
        }
    }

    /// Creates an instance and applies `values` over the defaults.
    pub fn with_values<'a, I>(entity_type: Arc<EntityType>, values: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut entity = Self::new(entity_type);
        for (name, value) in values {
            entity.set_property(name, &value)?;
        }
        Ok(entity)
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Copies every property of `other` onto this instance.
    ///
    /// Both instances must share the same entity type.
    pub fn copy_from(&mut self, other: &Entity) -> Result<(), SchemaError> {
        if self.entity_type.full_name() != other.entity_type.full_name() {
            return Err(SchemaError::InvalidModel(format!(
                "Cannot copy values of {} onto {}",
                other.entity_type.full_name(),
                self.entity_type.full_name()
            )));
        }
        self.values.clone_from(&other.values);
        Ok(())
    }

    /// Property values keyed by name.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entity_type
            .properties()
            .iter()
            .zip(self.values.iter())
            .map(|(def, value)| (def.name.clone(), value.clone()))
            .collect();
        Value::Object(map)
    }
}

impl PropertyAccess for Entity {
    fn get_property(&self, name: &str) -> Result<&Value, SchemaError> {
        let position = self
            .entity_type
            .position_of(name)
            .ok_or_else(|| SchemaError::UnknownProperty {
                entity_type: self.entity_type.name().to_string(),
                property: name.to_string(),
            })?;
        Ok(&self.values[position])
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), SchemaError> {
        let coerced = self.entity_type.coerce(name, value)?;
        // coerce() already resolved the name, so the position exists
        if let Some(position) = self.entity_type.position_of(name) {
            self.values[position] = coerced;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::PropertyType;
    use serde_json::json;

    fn person() -> Arc<EntityType> {
        Arc::new(
            EntityType::new(
                "Trippin",
                "Person",
                vec![
                    PropertyDef::new("Id", PropertyType::Int32),
                    PropertyDef::new("Name", PropertyType::String),
                    PropertyDef::new("Age", PropertyType::Int32),
                ],
                vec!["Id".to_string()],
            )
            .unwrap(),
        )
    }

    #[test]
    fn blank_instance_holds_defaults() {
        let entity = Entity::new(person());
        assert_eq!(entity.to_json(), json!({"Id": 0, "Name": "", "Age": 0}));
    }

    #[test]
    fn set_property_coerces_and_rejects_unknown_names() {
        let mut entity = Entity::new(person());
        entity.set_property("Age", &json!("30")).unwrap();
        assert_eq!(entity.get_property("Age").unwrap(), &json!(30));

        let err = entity.set_property("Nickname", &json!("x")).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownProperty { .. }));
    }

    #[test]
    fn duplicate_properties_are_rejected() {
        let result = EntityType::new(
            "Trippin",
            "Broken",
            vec![
                PropertyDef::new("Id", PropertyType::Int32),
                PropertyDef::new("Id", PropertyType::String),
            ],
            vec!["Id".to_string()],
        );
        assert!(matches!(result, Err(SchemaError::InvalidModel(_))));
    }
}
