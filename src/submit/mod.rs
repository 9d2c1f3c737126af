//! # Change Set Submission
//!
//! Turns a batch of pending inserts, updates and removals into tracked entity
//! instances ready to be persisted by the backing store.

pub mod cancellation;
pub mod change_set;
pub mod error;
pub mod memory_store;
pub mod predicate;
pub mod preparer;
pub mod store;

pub use cancellation::CancellationSignal;
pub use change_set::{
    ChangeSet, ChangeSetItem, ChangeSetRequest, DataModificationAction, DataModificationItem,
    DataModificationRequest, ProcessingStage, PropertyValues, StageEvent, IF_NONE_MATCH_KEY,
};
pub use error::{ResolutionFailure, SubmitError, SubmitResult};
pub use memory_store::{InMemoryEntityStore, PendingChange};
pub use predicate::{build_concurrency_predicate, build_key_predicate, EntityQuery, Predicate};
pub use preparer::ChangeSetPreparer;
pub use store::{EntityRef, EntityStore};
