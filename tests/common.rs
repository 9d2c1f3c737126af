//! Shared fixtures for the integration tests: a small travel model with a
//! `People` entity set backed by an in-memory store.

#![allow(dead_code)]

use fold_domain::schema::{Entity, EntityModel, EntityType, PropertyDef, PropertyType};
use fold_domain::submit::{InMemoryEntityStore, PropertyValues};
use serde_json::Value;
use std::sync::Arc;

pub struct TestFixture {
    pub model: EntityModel,
    pub person: Arc<EntityType>,
    pub store: Arc<InMemoryEntityStore>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_store(InMemoryEntityStore::new())
    }

    pub fn with_store(store: InMemoryEntityStore) -> Self {
        let mut model = EntityModel::new();
        let person = model
            .add_type(
                EntityType::new(
                    "Trippin",
                    "Person",
                    vec![
                        PropertyDef::new("Id", PropertyType::Int32),
                        PropertyDef::new("Name", PropertyType::String).nullable(),
                        PropertyDef::new("Age", PropertyType::Int32),
                    ],
                    vec!["Id".to_string()],
                )
                .expect("valid person type"),
            )
            .expect("person type registered");
        model
            .add_entity_set("People", "Person")
            .expect("people set registered");
        store.add_entity_set("People").expect("people set created");

        Self {
            model,
            person,
            store: Arc::new(store),
        }
    }

    /// Stores a person directly, outside change tracking.
    pub fn seed_person(&self, id: i64, name: &str, age: i64) {
        let entity = Entity::with_values(
            Arc::clone(&self.person),
            [
                ("Id", Value::from(id)),
                ("Name", Value::from(name)),
                ("Age", Value::from(age)),
            ],
        )
        .expect("valid person");
        self.store.seed("People", entity).expect("person seeded");
    }

    pub fn people(&self) -> Vec<Entity> {
        self.store
            .entities("People")
            .expect("people set exists")
            .iter()
            .map(|entity| entity.snapshot())
            .collect()
    }
}

pub fn values(pairs: &[(&str, Value)]) -> PropertyValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
