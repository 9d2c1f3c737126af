//! In-memory [`EntityStore`] with pending-change tracking.

use crate::schema::{Entity, EntityType, PropertyAccess};
use crate::submit::error::{SubmitError, SubmitResult};
use crate::submit::predicate::EntityQuery;
use crate::submit::store::{EntityRef, EntityStore};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum PendingChange {
    Added { entity_set: String, entity: EntityRef },
    Removed { entity_set: String, entity: EntityRef },
    /// `property` is `None` when every property was reset. `previous` is the
    /// instance as it was before the change, restored on discard.
    Modified {
        entity: EntityRef,
        property: Option<String>,
        previous: Entity,
    },
}

#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    sets: RwLock<HashMap<String, Vec<EntityRef>>>,
    pending: Mutex<Vec<PendingChange>>,
    query_latency: Option<Duration>,
}

impl InMemoryEntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every query, which makes in-flight cancellation observable.
    #[must_use]
    pub fn with_query_latency(mut self, latency: Duration) -> Self {
        self.query_latency = Some(latency);
        self
    }

    /// Declares an empty entity set.
    pub fn add_entity_set(&self, entity_set: &str) -> SubmitResult<()> {
        let mut sets = self.sets.write().map_err(|_| lock_error("add_entity_set"))?;
        sets.entry(entity_set.to_string()).or_default();
        Ok(())
    }

    /// Stores `entity` directly, bypassing change tracking.
    pub fn seed(&self, entity_set: &str, entity: Entity) -> SubmitResult<EntityRef> {
        let entity = EntityRef::new(entity);
        let mut sets = self.sets.write().map_err(|_| lock_error("seed"))?;
        sets.entry(entity_set.to_string())
            .or_default()
            .push(entity.clone());
        Ok(entity)
    }

    pub fn entities(&self, entity_set: &str) -> SubmitResult<Vec<EntityRef>> {
        let sets = self.sets.read().map_err(|_| lock_error("entities"))?;
        Ok(sets.get(entity_set).cloned().unwrap_or_default())
    }

    pub fn pending_changes(&self) -> SubmitResult<Vec<PendingChange>> {
        let pending = self.pending.lock().map_err(|_| lock_error("pending_changes"))?;
        Ok(pending.clone())
    }

    /// Applies pending additions and removals to the entity sets and clears
    /// the pending list. Returns the number of changes applied.
    pub fn save_changes(&self) -> SubmitResult<usize> {
        let drained: Vec<PendingChange> = {
            let mut pending = self.pending.lock().map_err(|_| lock_error("save_changes"))?;
            pending.drain(..).collect()
        };
        let mut sets = self.sets.write().map_err(|_| lock_error("save_changes"))?;

        for change in &drained {
            match change {
                PendingChange::Added { entity_set, entity } => {
                    sets.entry(entity_set.clone())
                        .or_default()
                        .push(entity.clone());
                }
                PendingChange::Removed { entity_set, entity } => {
                    if let Some(entities) = sets.get_mut(entity_set) {
                        entities.retain(|existing| !existing.ptr_eq(entity));
                    }
                }
                // values were written in place when the change was recorded
                PendingChange::Modified { .. } => {}
            }
        }
        debug!("Saved {} pending changes", drained.len());
        Ok(drained.len())
    }

    /// Drops every pending change and restores modified entities to the
    /// values they had before. Returns the number of changes discarded.
    pub fn discard_changes(&self) -> SubmitResult<usize> {
        let drained: Vec<PendingChange> = {
            let mut pending = self.pending.lock().map_err(|_| lock_error("discard_changes"))?;
            pending.drain(..).collect()
        };
        // newest first, so the oldest snapshot of an entity is restored last
        for change in drained.iter().rev() {
            if let PendingChange::Modified {
                entity, previous, ..
            } = change
            {
                *entity.write() = previous.clone();
            }
        }
        debug!("Discarded {} pending changes", drained.len());
        Ok(drained.len())
    }

    fn record(&self, change: PendingChange) -> SubmitResult<()> {
        let mut pending = self.pending.lock().map_err(|_| lock_error("record"))?;
        pending.push(change);
        Ok(())
    }
}

fn lock_error(operation: &str) -> SubmitError {
    SubmitError::store(operation, "Failed to acquire store lock")
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn execute_query(&self, query: &EntityQuery) -> SubmitResult<Vec<EntityRef>> {
        if let Some(latency) = self.query_latency {
            tokio::time::sleep(latency).await;
        }

        let sets = self.sets.read().map_err(|_| lock_error("execute_query"))?;
        let entities = sets.get(&query.entity_set).ok_or_else(|| {
            SubmitError::store(
                "execute_query",
                format!("Unknown entity set {}", query.entity_set),
            )
        })?;

        let matches: Vec<EntityRef> = entities
            .iter()
            .filter(|entity| query.matches(&entity.read()))
            .cloned()
            .collect();
        debug!("Query {} matched {} entities", query, matches.len());
        Ok(matches)
    }

    fn create_attached_instance(&self, entity_type: &Arc<EntityType>) -> SubmitResult<EntityRef> {
        Ok(EntityRef::new(Entity::new(Arc::clone(entity_type))))
    }

    fn mark_for_addition(&self, entity_set: &str, entity: &EntityRef) -> SubmitResult<()> {
        self.record(PendingChange::Added {
            entity_set: entity_set.to_string(),
            entity: entity.clone(),
        })
    }

    fn mark_for_removal(&self, entity_set: &str, entity: &EntityRef) -> SubmitResult<()> {
        self.record(PendingChange::Removed {
            entity_set: entity_set.to_string(),
            entity: entity.clone(),
        })
    }

    fn set_current_value(
        &self,
        entity: &EntityRef,
        property: &str,
        value: &Value,
    ) -> SubmitResult<()> {
        let previous = {
            let mut current = entity.write();
            let previous = current.clone();
            current.set_property(property, value)?;
            previous
        };
        self.record(PendingChange::Modified {
            entity: entity.clone(),
            property: Some(property.to_string()),
            previous,
        })
    }

    fn reset_all_properties(&self, entity: &EntityRef, source: &Entity) -> SubmitResult<()> {
        let previous = {
            let mut current = entity.write();
            let previous = current.clone();
            current.copy_from(source)?;
            previous
        };
        self.record(PendingChange::Modified {
            entity: entity.clone(),
            property: None,
            previous,
        })
    }

    fn discard_changes(&self) -> SubmitResult<()> {
        InMemoryEntityStore::discard_changes(self).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDef, PropertyType};
    use crate::submit::predicate::Predicate;
    use serde_json::json;

    fn airport() -> Arc<EntityType> {
        Arc::new(
            EntityType::new(
                "Trippin",
                "Airport",
                vec![
                    PropertyDef::new("Code", PropertyType::String),
                    PropertyDef::new("Name", PropertyType::String),
                ],
                vec!["Code".to_string()],
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn query_filters_by_predicate() {
        let store = InMemoryEntityStore::new();
        for code in ["KSFO", "KLAX"] {
            let entity = Entity::with_values(airport(), [("Code", json!(code))]).unwrap();
            store.seed("Airports", entity).unwrap();
        }

        let query = EntityQuery::new("Airports").filter(Predicate::equal("Code", json!("KLAX")));
        let found = store.execute_query(&query).await.unwrap();
        assert_eq!(found.len(), 1);

        let unknown = store.execute_query(&EntityQuery::new("Flights")).await;
        assert!(matches!(unknown, Err(SubmitError::Store { .. })));
    }

    #[tokio::test]
    async fn save_changes_applies_additions_and_removals() {
        let store = InMemoryEntityStore::new();
        let existing = store
            .seed("Airports", Entity::with_values(airport(), [("Code", json!("KSFO"))]).unwrap())
            .unwrap();

        let created = store.create_attached_instance(&airport()).unwrap();
        store.set_current_value(&created, "Code", &json!("KLAX")).unwrap();
        store.mark_for_addition("Airports", &created).unwrap();
        store.mark_for_removal("Airports", &existing).unwrap();

        assert_eq!(store.pending_changes().unwrap().len(), 3);
        assert_eq!(store.save_changes().unwrap(), 3);

        let remaining = store.entities("Airports").unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ptr_eq(&created));
        assert!(store.pending_changes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn discard_restores_modified_entities() {
        let store = InMemoryEntityStore::new();
        let existing = store
            .seed(
                "Airports",
                Entity::with_values(airport(), [("Code", json!("KSFO")), ("Name", json!("SFO"))])
                    .unwrap(),
            )
            .unwrap();

        store.set_current_value(&existing, "Name", &json!("San Francisco")).unwrap();
        store.set_current_value(&existing, "Name", &json!("Frisco")).unwrap();
        store.mark_for_removal("Airports", &existing).unwrap();
        let created = store.create_attached_instance(&airport()).unwrap();
        store.mark_for_addition("Airports", &created).unwrap();

        assert_eq!(store.discard_changes().unwrap(), 4);
        assert!(store.pending_changes().unwrap().is_empty());
        assert_eq!(existing.read().get_property("Name").unwrap(), &json!("SFO"));

        assert_eq!(store.save_changes().unwrap(), 0);
        let remaining = store.entities("Airports").unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ptr_eq(&existing));
    }
}
