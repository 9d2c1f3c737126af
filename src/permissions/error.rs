use crate::permissions::types::PermissionKind;
use thiserror::Error;

/// A permission check denied access. Fatal to the request that triggered it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Not authorized for {permission}: {securable}")]
pub struct AuthorizationError {
    pub permission: PermissionKind,
    pub securable: String,
}

impl AuthorizationError {
    pub fn new(permission: PermissionKind, securable: impl Into<String>) -> Self {
        Self {
            permission,
            securable: securable.into(),
        }
    }
}
