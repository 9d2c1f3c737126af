use crate::schema::types::{EntityType, SchemaError};
use std::collections::HashMap;
use std::sync::Arc;

/// Entity types and the entity sets exposed over them.
///
/// Built once when the model is loaded and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EntityModel {
    types: HashMap<String, Arc<EntityType>>,
    entity_sets: HashMap<String, Arc<EntityType>>,
}

impl EntityModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type under both its short and qualified name.
    pub fn add_type(&mut self, entity_type: EntityType) -> Result<Arc<EntityType>, SchemaError> {
        let full_name = entity_type.full_name();
        if self.types.contains_key(&full_name) {
            return Err(SchemaError::InvalidModel(format!(
                "Entity type {} is already registered",
                full_name
            )));
        }
        let entity_type = Arc::new(entity_type);
        self.types
            .insert(entity_type.name().to_string(), Arc::clone(&entity_type));
        self.types.insert(full_name, Arc::clone(&entity_type));
        Ok(entity_type)
    }

    pub fn add_entity_set(
        &mut self,
        entity_set: impl Into<String>,
        element_type: &str,
    ) -> Result<(), SchemaError> {
        let element_type = self.entity_type(element_type)?;
        self.entity_sets.insert(entity_set.into(), element_type);
        Ok(())
    }

    pub fn entity_type(&self, name: &str) -> Result<Arc<EntityType>, SchemaError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(format!("entity type {}", name)))
    }

    pub fn entity_set_type(&self, entity_set: &str) -> Result<Arc<EntityType>, SchemaError> {
        self.entity_sets
            .get(entity_set)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(format!("entity set {}", entity_set)))
    }

    pub fn entity_sets(&self) -> impl Iterator<Item = (&str, &Arc<EntityType>)> {
        self.entity_sets.iter().map(|(name, ty)| (name.as_str(), ty))
    }
}
