pub mod policy;
pub use policy::{PermissionEffect, PermissionKind, PermissionStatement, SecurableScope};
