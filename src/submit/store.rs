//! The storage capability the preparer depends on.

use crate::schema::{Entity, EntityType, PropertyAccess};
use crate::submit::change_set::PropertyValues;
use crate::submit::error::{SubmitError, SubmitResult};
use crate::submit::predicate::EntityQuery;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle to an entity instance tracked by a store.
///
/// Clones refer to the same instance; once a change item records one it is
/// the authoritative copy for the rest of the submission.
#[derive(Debug, Clone)]
pub struct EntityRef(Arc<RwLock<Entity>>);

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        Self(Arc::new(RwLock::new(entity)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Entity> {
        // a panicked writer leaves whole values behind, never a torn one
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Entity> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of the instance as it is right now.
    pub fn snapshot(&self) -> Entity {
        self.read().clone()
    }

    /// Current values keyed by property name.
    pub fn values(&self) -> PropertyValues {
        let entity = self.read();
        entity
            .entity_type()
            .properties()
            .iter()
            .filter_map(|def| {
                entity
                    .get_property(&def.name)
                    .ok()
                    .map(|value| (def.name.clone(), value.clone()))
            })
            .collect()
    }
}

/// Query execution and change tracking provided by the backing store.
///
/// Only [`execute_query`](EntityStore::execute_query) performs I/O. The
/// mutation primitives only record pending work; persisting it is the store's
/// business and happens outside change-set preparation. Pending work of a
/// preparation that fails is rolled back through
/// [`discard_changes`](EntityStore::discard_changes).
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Runs `query` and returns every matching tracked entity.
    async fn execute_query(&self, query: &EntityQuery) -> SubmitResult<Vec<EntityRef>>;

    /// Creates a new instance of `entity_type` that the store tracks.
    fn create_attached_instance(&self, entity_type: &Arc<EntityType>) -> SubmitResult<EntityRef>;

    fn mark_for_addition(&self, entity_set: &str, entity: &EntityRef) -> SubmitResult<()>;

    fn mark_for_removal(&self, entity_set: &str, entity: &EntityRef) -> SubmitResult<()>;

    fn set_current_value(
        &self,
        entity: &EntityRef,
        property: &str,
        value: &Value,
    ) -> SubmitResult<()> {
        entity
            .write()
            .set_property(property, value)
            .map_err(SubmitError::from)
    }

    /// Overwrites every property of `entity` with the values of `source`.
    fn reset_all_properties(&self, entity: &EntityRef, source: &Entity) -> SubmitResult<()> {
        entity.write().copy_from(source).map_err(SubmitError::from)
    }

    /// Abandons all pending work: marks are dropped and modified entities get
    /// their previous values back.
    fn discard_changes(&self) -> SubmitResult<()>;
}
