//! Resolution of change set items to tracked entity instances.
//!
//! Items are processed strictly in change-set order: a later item may refer
//! to an entity an earlier one created or changed. The first failing item
//! aborts the whole call and the store's pending work is discarded, so no
//! part of a failed change set is left behind to be saved.

use crate::schema::{Entity, PropertyAccess};
use crate::submit::cancellation::CancellationSignal;
use crate::submit::change_set::{
    ChangeSet, ChangeSetItem, DataModificationAction, DataModificationItem,
};
use crate::submit::error::{ResolutionFailure, SubmitError, SubmitResult};
use crate::submit::predicate::{build_concurrency_predicate, build_key_predicate, EntityQuery};
use crate::submit::store::{EntityRef, EntityStore};
use log::{debug, info, warn};
use std::sync::Arc;

pub struct ChangeSetPreparer {
    store: Arc<dyn EntityStore>,
}

impl ChangeSetPreparer {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Resolves every item of `change_set` and records the resulting entity
    /// on it, marking additions and removals in the store as it goes.
    pub async fn prepare(
        &self,
        change_set: &mut ChangeSet,
        cancellation: &CancellationSignal,
    ) -> SubmitResult<()> {
        let result = self.prepare_items(change_set, cancellation).await;
        if let Err(err) = &result {
            warn!("Change set preparation failed, discarding pending changes: {}", err);
            if let Err(discard_err) = self.store.discard_changes() {
                warn!("Failed to discard pending changes: {}", discard_err);
            }
        }
        result
    }

    async fn prepare_items(
        &self,
        change_set: &mut ChangeSet,
        cancellation: &CancellationSignal,
    ) -> SubmitResult<()> {
        let total = change_set.len();
        for (position, item) in change_set.items_mut().iter_mut().enumerate() {
            if cancellation.is_cancelled() {
                warn!("Change set preparation cancelled at item {} of {}", position + 1, total);
                return Err(SubmitError::Cancelled);
            }
            match item {
                ChangeSetItem::DataModification(item) => {
                    debug!(
                        "Preparing item {} of {}: {} {}{}",
                        position + 1,
                        total,
                        item.action(),
                        item.entity_set_name(),
                        item.describe_key()
                    );
                    self.prepare_item(item, cancellation).await?;
                }
            }
        }
        info!("Prepared change set with {} items", total);
        Ok(())
    }

    async fn prepare_item(
        &self,
        item: &mut DataModificationItem,
        cancellation: &CancellationSignal,
    ) -> SubmitResult<()> {
        let entity = match item.action() {
            DataModificationAction::Insert => {
                let entity = self
                    .store
                    .create_attached_instance(item.actual_entity_type())?;
                if let Some(local_values) = item.local_values() {
                    let mut instance = entity.write();
                    for (name, value) in local_values {
                        instance.set_property(name, value)?;
                    }
                }
                self.store
                    .mark_for_addition(item.entity_set_name(), &entity)?;
                entity
            }
            DataModificationAction::Remove => {
                let entity = self.find_entity(item, cancellation).await?;
                self.store
                    .mark_for_removal(item.entity_set_name(), &entity)?;
                entity
            }
            DataModificationAction::Update => {
                let entity = self.find_entity(item, cancellation).await?;
                item.set_server_values(entity.values());
                self.apply_update(item, &entity)?;
                entity
            }
        };
        item.set_entity(entity);
        Ok(())
    }

    /// Writes an update's values onto the tracked entity.
    ///
    /// A full replace builds a blank instance, applies the key and then the
    /// local values to it, and copies the whole instance over the tracked
    /// one, so every property the caller did not supply reverts to its
    /// default. Otherwise only the supplied properties are touched. Either
    /// way every value is coerced before the tracked entity is written, so a
    /// bad value leaves it untouched.
    fn apply_update(&self, item: &DataModificationItem, entity: &EntityRef) -> SubmitResult<()> {
        let stored_type = Arc::clone(entity.read().entity_type());

        if item.is_full_replace() {
            let actual_type = item.actual_entity_type();
            if stored_type.full_name() != actual_type.full_name() {
                return Err(SubmitError::EntityTypeMismatch {
                    entity_set: item.entity_set_name().to_string(),
                    key: item.describe_key(),
                    expected: actual_type.full_name(),
                    actual: stored_type.full_name(),
                });
            }
            let mut replacement = Entity::new(Arc::clone(actual_type));
            let supplied = item
                .entity_key()
                .into_iter()
                .chain(item.local_values())
                .flatten();
            for (name, value) in supplied {
                replacement.set_property(name, value)?;
            }
            self.store.reset_all_properties(entity, &replacement)
        } else {
            let mut coerced = Vec::new();
            for (name, value) in item.local_values().into_iter().flatten() {
                coerced.push((name, stored_type.coerce(name, value)?));
            }
            for (name, value) in &coerced {
                self.store.set_current_value(entity, name, value)?;
            }
            Ok(())
        }
    }

    /// Finds the single stored entity an Update or Remove item targets.
    ///
    /// The lookup filters by key and, when original values were supplied, by
    /// the concurrency predicate. If nothing matches in the latter case a
    /// key-only probe tells a vanished entity apart from a stale precondition.
    async fn find_entity(
        &self,
        item: &DataModificationItem,
        cancellation: &CancellationSignal,
    ) -> SubmitResult<EntityRef> {
        let key_predicate = build_key_predicate(item)?;
        let concurrency_predicate = build_concurrency_predicate(item)?;

        let mut query = EntityQuery::new(item.entity_set_name()).filter(key_predicate.clone());
        if let Some(predicate) = &concurrency_predicate {
            query = query.filter(predicate.clone());
        }

        let mut results = self.execute(&query, cancellation).await?;
        match results.len() {
            1 => Ok(results.remove(0)),
            0 => {
                let failure = if concurrency_predicate.is_some() {
                    let probe = EntityQuery::new(item.entity_set_name()).filter(key_predicate);
                    if self.execute(&probe, cancellation).await?.is_empty() {
                        ResolutionFailure::NotFound
                    } else {
                        ResolutionFailure::PreconditionFailed
                    }
                } else {
                    ResolutionFailure::NotFound
                };
                warn!(
                    "Could not resolve {}{}: {}",
                    item.entity_set_name(),
                    item.describe_key(),
                    failure
                );
                Err(SubmitError::EntityResolution {
                    entity_set: item.entity_set_name().to_string(),
                    key: item.describe_key(),
                    failure,
                })
            }
            count => Err(SubmitError::MultipleEntitiesFound {
                entity_set: item.entity_set_name().to_string(),
                key: item.describe_key(),
                count,
            }),
        }
    }

    async fn execute(
        &self,
        query: &EntityQuery,
        cancellation: &CancellationSignal,
    ) -> SubmitResult<Vec<EntityRef>> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(SubmitError::Cancelled),
            result = self.store.execute_query(query) => result,
        }
    }
}
