// permissions module

pub mod error;
pub mod evaluator;
pub mod role_based;
pub mod types;

pub use error::AuthorizationError;
pub use evaluator::{
    AuthorizationContext, NoRoleMembership, PermissionEvaluator, RoleMembership,
    StaticRoleMembership,
};
pub use role_based::{
    ContainerElement, ContainerElementKind, ModelReference, ModelVisibilityFilter,
    QueryExpressionContext, QueryExpressionInspector, RoleBasedAuthorization, SchemaElement,
    SchemaElementKind,
};
pub use types::{PermissionEffect, PermissionKind, PermissionStatement, SecurableScope};
