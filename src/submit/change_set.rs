//! Change sets and the data modification items they carry.

use crate::schema::{EntityModel, EntityType};
use crate::submit::error::{SubmitError, SubmitResult};
use crate::submit::store::EntityRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Original-values key that turns the concurrency check into an
/// "if-none-match" precondition.
pub const IF_NONE_MATCH_KEY: &str = "@IfNoneMatchKey";

/// Property name → value. Iteration order is the key order, which keeps
/// generated predicates stable.
pub type PropertyValues = BTreeMap<String, Value>;

/// The modification requested for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataModificationAction {
    Insert,
    Update,
    Remove,
}

impl DataModificationAction {
    /// Maps the protocol's numeric action code (0 = Undefined, 1 = Update,
    /// 2 = Insert, 3 = Remove).
    pub fn from_code(code: u8) -> SubmitResult<Self> {
        match code {
            1 => Ok(Self::Update),
            2 => Ok(Self::Insert),
            3 => Ok(Self::Remove),
            other => Err(SubmitError::UnsupportedAction {
                action: if other == 0 {
                    "Undefined".to_string()
                } else {
                    format!("code {}", other)
                },
                operation: "change set item".to_string(),
            }),
        }
    }
}

impl fmt::Display for DataModificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "Insert"),
            Self::Update => write!(f, "Update"),
            Self::Remove => write!(f, "Remove"),
        }
    }
}

impl FromStr for DataModificationAction {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "remove" | "delete" => Ok(Self::Remove),
            _ => Err(SubmitError::UnsupportedAction {
                action: s.to_string(),
                operation: "change set item".to_string(),
            }),
        }
    }
}

/// Where a change set item is in the validation / pre-event cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    Initialized,
    Validated,
    PreEventing,
    /// Modified by its own pre-event handler: it must be validated again, but
    /// that handler must not run a second time.
    ChangedWithinOwnPreEventing,
    PreEvented,
}

/// Transitions driven by the validation and eventing collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    Validate,
    BeginPreEvent,
    ChangedInPreEvent,
    Revalidate,
    CompletePreEvent,
}

impl ProcessingStage {
    pub fn has_changed(self) -> bool {
        matches!(self, Self::Initialized | Self::ChangedWithinOwnPreEventing)
    }

    pub fn next(self, event: StageEvent) -> SubmitResult<Self> {
        use ProcessingStage::*;
        match (self, event) {
            (Initialized, StageEvent::Validate) => Ok(Validated),
            (Validated, StageEvent::BeginPreEvent) => Ok(PreEventing),
            (PreEventing, StageEvent::ChangedInPreEvent) => Ok(ChangedWithinOwnPreEventing),
            (ChangedWithinOwnPreEventing, StageEvent::Revalidate) => Ok(PreEventing),
            (PreEventing, StageEvent::CompletePreEvent) => Ok(PreEvented),
            (from, event) => Err(SubmitError::InvalidStageTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }
}

/// One insert, update or remove within a change set.
#[derive(Debug, Clone)]
pub struct DataModificationItem {
    entity_set_name: String,
    expected_entity_type: Arc<EntityType>,
    actual_entity_type: Arc<EntityType>,
    action: DataModificationAction,
    entity_key: Option<PropertyValues>,
    original_values: Option<PropertyValues>,
    local_values: Option<PropertyValues>,
    is_full_replace: bool,
    server_values: Option<PropertyValues>,
    entity: Option<EntityRef>,
    stage: ProcessingStage,
}

impl DataModificationItem {
    pub fn new(
        entity_set_name: impl Into<String>,
        expected_entity_type: Arc<EntityType>,
        action: DataModificationAction,
    ) -> Self {
        Self {
            entity_set_name: entity_set_name.into(),
            actual_entity_type: Arc::clone(&expected_entity_type),
            expected_entity_type,
            action,
            entity_key: None,
            original_values: None,
            local_values: None,
            is_full_replace: false,
            server_values: None,
            entity: None,
            stage: ProcessingStage::Initialized,
        }
    }

    /// Sets the runtime type when it is derived from the entity set's type.
    pub fn with_actual_type(mut self, actual_entity_type: Arc<EntityType>) -> Self {
        self.actual_entity_type = actual_entity_type;
        self
    }

    pub fn with_key(mut self, entity_key: PropertyValues) -> Self {
        self.entity_key = Some(entity_key);
        self
    }

    pub fn with_original_values(mut self, original_values: PropertyValues) -> Self {
        self.original_values = Some(original_values);
        self
    }

    pub fn with_local_values(mut self, local_values: PropertyValues) -> Self {
        self.local_values = Some(local_values);
        self
    }

    pub fn with_full_replace(mut self, is_full_replace: bool) -> Self {
        self.is_full_replace = is_full_replace;
        self
    }

    pub fn entity_set_name(&self) -> &str {
        &self.entity_set_name
    }

    pub fn expected_entity_type(&self) -> &Arc<EntityType> {
        &self.expected_entity_type
    }

    pub fn actual_entity_type(&self) -> &Arc<EntityType> {
        &self.actual_entity_type
    }

    pub fn action(&self) -> DataModificationAction {
        self.action
    }

    pub fn entity_key(&self) -> Option<&PropertyValues> {
        self.entity_key.as_ref()
    }

    pub fn original_values(&self) -> Option<&PropertyValues> {
        self.original_values.as_ref()
    }

    pub fn local_values(&self) -> Option<&PropertyValues> {
        self.local_values.as_ref()
    }

    pub fn is_full_replace(&self) -> bool {
        self.is_full_replace
    }

    /// Values of the stored entity before an update was applied. Unset for
    /// inserts and removals, and until the change set has been prepared.
    pub fn server_values(&self) -> Option<&PropertyValues> {
        self.server_values.as_ref()
    }

    /// The tracked entity this item resolved to. Unset until prepared.
    pub fn entity(&self) -> Option<&EntityRef> {
        self.entity.as_ref()
    }

    pub(crate) fn set_entity(&mut self, entity: EntityRef) {
        self.entity = Some(entity);
    }

    pub(crate) fn set_server_values(&mut self, values: PropertyValues) {
        self.server_values = Some(values);
    }

    /// Key rendered for error messages, e.g. `(Id=5)`.
    pub fn describe_key(&self) -> String {
        let parts: Vec<String> = self
            .entity_key
            .iter()
            .flatten()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        format!("({})", parts.join(","))
    }

    pub fn processing_stage(&self) -> ProcessingStage {
        self.stage
    }

    pub fn has_changed(&self) -> bool {
        self.stage.has_changed()
    }

    pub fn advance(&mut self, event: StageEvent) -> SubmitResult<ProcessingStage> {
        self.stage = self.stage.next(event)?;
        Ok(self.stage)
    }
}

#[derive(Debug, Clone)]
pub enum ChangeSetItem {
    DataModification(DataModificationItem),
}

impl ChangeSetItem {
    pub fn as_data_modification(&self) -> Option<&DataModificationItem> {
        match self {
            ChangeSetItem::DataModification(item) => Some(item),
        }
    }

    pub fn has_changed(&self) -> bool {
        match self {
            ChangeSetItem::DataModification(item) => item.has_changed(),
        }
    }

    pub fn advance(&mut self, event: StageEvent) -> SubmitResult<ProcessingStage> {
        match self {
            ChangeSetItem::DataModification(item) => item.advance(event),
        }
    }
}

impl From<DataModificationItem> for ChangeSetItem {
    fn from(item: DataModificationItem) -> Self {
        ChangeSetItem::DataModification(item)
    }
}

/// An ordered batch of modifications submitted together.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    items: Vec<ChangeSetItem>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<ChangeSetItem>) {
        self.items.push(item.into());
    }

    pub fn items(&self) -> &[ChangeSetItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [ChangeSetItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn data_modifications(&self) -> impl Iterator<Item = &DataModificationItem> {
        self.items.iter().filter_map(ChangeSetItem::as_data_modification)
    }

    /// Builds a change set from its wire description, resolving entity sets
    /// and types against `model`.
    pub fn from_request(request: ChangeSetRequest, model: &EntityModel) -> SubmitResult<Self> {
        let mut change_set = ChangeSet::new();
        for entry in request.items {
            let action: DataModificationAction = entry.action.parse()?;
            let expected = model.entity_set_type(&entry.entity_set)?;
            let actual = match entry.entity_type.as_deref() {
                Some(name) => model.entity_type(name)?,
                None => Arc::clone(&expected),
            };

            let mut item = DataModificationItem::new(entry.entity_set, expected, action)
                .with_actual_type(actual)
                .with_full_replace(entry.full_replace);
            item.entity_key = entry.key;
            item.original_values = entry.original_values;
            item.local_values = entry.local_values;
            change_set.push(item);
        }
        Ok(change_set)
    }
}

/// Wire description of a change set as handed over by the protocol layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSetRequest {
    pub items: Vec<DataModificationRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataModificationRequest {
    pub entity_set: String,
    /// Runtime type name when it differs from the entity set's type.
    #[serde(default)]
    pub entity_type: Option<String>,
    pub action: String,
    #[serde(default)]
    pub key: Option<PropertyValues>,
    #[serde(default)]
    pub original_values: Option<PropertyValues>,
    #[serde(default)]
    pub local_values: Option<PropertyValues>,
    #[serde(default)]
    pub full_replace: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_changed_only_when_initialized_or_changed_in_pre_event() {
        assert!(ProcessingStage::Initialized.has_changed());
        assert!(ProcessingStage::ChangedWithinOwnPreEventing.has_changed());
        assert!(!ProcessingStage::Validated.has_changed());
        assert!(!ProcessingStage::PreEventing.has_changed());
        assert!(!ProcessingStage::PreEvented.has_changed());
    }

    #[test]
    fn stage_cycle_through_pre_event_change() {
        let stage = ProcessingStage::Initialized
            .next(StageEvent::Validate)
            .and_then(|s| s.next(StageEvent::BeginPreEvent))
            .and_then(|s| s.next(StageEvent::ChangedInPreEvent))
            .and_then(|s| s.next(StageEvent::Revalidate))
            .and_then(|s| s.next(StageEvent::CompletePreEvent))
            .unwrap();
        assert_eq!(stage, ProcessingStage::PreEvented);
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let err = ProcessingStage::Initialized
            .next(StageEvent::CompletePreEvent)
            .unwrap_err();
        assert!(matches!(err, SubmitError::InvalidStageTransition { .. }));

        let err = ProcessingStage::PreEvented.next(StageEvent::Validate).unwrap_err();
        assert!(matches!(err, SubmitError::InvalidStageTransition { .. }));
    }

    #[test]
    fn undefined_action_is_unsupported() {
        assert!(matches!(
            DataModificationAction::from_code(0),
            Err(SubmitError::UnsupportedAction { .. })
        ));
        assert!(matches!(
            "Undefined".parse::<DataModificationAction>(),
            Err(SubmitError::UnsupportedAction { .. })
        ));
        assert_eq!(
            DataModificationAction::from_code(2).unwrap(),
            DataModificationAction::Insert
        );
    }
}
