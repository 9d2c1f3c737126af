use crate::permissions::types::{PermissionKind, PermissionStatement};
use log::debug;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Ambient role membership of the current caller, e.g. from the principal
/// established by the authentication layer.
pub trait RoleMembership: Send + Sync {
    fn is_in_role(&self, role: &str) -> bool;
}

/// Membership for callers without an authenticated principal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRoleMembership;

impl RoleMembership for NoRoleMembership {
    fn is_in_role(&self, _role: &str) -> bool {
        false
    }
}

/// Fixed set of role names.
#[derive(Debug, Default, Clone)]
pub struct StaticRoleMembership {
    roles: HashSet<String>,
}

impl StaticRoleMembership {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl RoleMembership for StaticRoleMembership {
    fn is_in_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Per-request authorization state: the roles the request asserts on top of
/// ambient membership, and the process-wide permission statements.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    permissions: Arc<[PermissionStatement]>,
    asserted_roles: Vec<String>,
}

impl AuthorizationContext {
    pub fn new(permissions: Arc<[PermissionStatement]>) -> Self {
        Self {
            permissions,
            asserted_roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_asserted_role(mut self, role: impl Into<String>) -> Self {
        self.assert_role(role);
        self
    }

    pub fn assert_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        if !self.asserted_roles.contains(&role) {
            self.asserted_roles.push(role);
        }
    }

    pub fn asserted_roles(&self) -> &[String] {
        &self.asserted_roles
    }

    pub fn has_asserted_role(&self, role: &str) -> bool {
        self.asserted_roles.iter().any(|r| r == role)
    }

    pub fn permissions(&self) -> &[PermissionStatement] {
        &self.permissions
    }
}

/// Decides whether a permission is granted on a securable.
///
/// The decision is fail-closed and deny-overrides-grant:
/// 1. Only statements for the requested kind (or `All`), without a child,
///    whose scope is global or names exactly the requested securable apply.
/// 2. Of those, only statements for everyone, for a role the caller is a
///    member of, or for a role the request asserts are kept.
/// 3. No statement left denies; any deny among them denies; otherwise the
///    permission is granted.
#[derive(Clone)]
pub struct PermissionEvaluator {
    membership: Arc<dyn RoleMembership>,
}

impl PermissionEvaluator {
    pub fn new(membership: Arc<dyn RoleMembership>) -> Self {
        Self { membership }
    }

    /// Evaluator for callers without ambient role membership.
    #[must_use]
    pub fn without_membership() -> Self {
        Self::new(Arc::new(NoRoleMembership))
    }

    /// Checks `kind` on the securable `(namespace, securable)`. A `None`
    /// namespace addresses an entity container element.
    #[must_use]
    pub fn is_granted(
        &self,
        context: &AuthorizationContext,
        kind: PermissionKind,
        namespace: Option<&str>,
        securable: &str,
    ) -> bool {
        let applicable = context
            .permissions()
            .iter()
            .filter(|statement| {
                statement.covers_kind(kind)
                    && statement.scope().child.is_none()
                    && statement.scope().covers(namespace, securable)
            })
            .filter(|statement| match statement.role() {
                None => true,
                Some(role) => self.membership.is_in_role(role) || context.has_asserted_role(role),
            });

        let mut matched = false;
        for statement in applicable {
            matched = true;
            if statement.is_deny() {
                debug!("{} on {} denied by: {}", kind, securable, statement);
                return false;
            }
        }

        if !matched {
            debug!("{} on {} denied: no applicable statement", kind, securable);
        }
        matched
    }
}

impl fmt::Debug for PermissionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionEvaluator").finish_non_exhaustive()
    }
}
