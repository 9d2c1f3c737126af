//! # Fold Domain
//!
//! Service core for a queryable data service: prepares client change sets
//! against an entity store and authorizes model introspection and queries
//! with role-based permission statements.

pub mod config;
pub mod error;
pub mod logging;
pub mod permissions;
pub mod schema;
pub mod submit;

pub use config::{ConfigError, DomainConfig, DomainConfiguration, PermissionEntry};
pub use error::{FoldDomainError, FoldDomainResult};
pub use logging::{LoggingError, LoggingSystem};
pub use permissions::{
    AuthorizationContext, AuthorizationError, ContainerElement, ContainerElementKind,
    ModelReference, ModelVisibilityFilter, PermissionEffect, PermissionEvaluator, PermissionKind,
    PermissionStatement, QueryExpressionContext, QueryExpressionInspector, RoleBasedAuthorization,
    RoleMembership, SchemaElement, SchemaElementKind, SecurableScope, StaticRoleMembership,
};
pub use schema::{Entity, EntityModel, EntityType, PropertyAccess, PropertyDef, PropertyType, SchemaError};
pub use submit::{
    CancellationSignal, ChangeSet, ChangeSetItem, ChangeSetPreparer, ChangeSetRequest,
    DataModificationAction, DataModificationItem, EntityRef, EntityStore, InMemoryEntityStore,
    ResolutionFailure, SubmitError, SubmitResult,
};
