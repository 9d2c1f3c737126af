use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of access a permission statement grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    /// Inspect the model definition of a securable element.
    Inspect,
    /// Create entities in an entity set.
    Create,
    /// Read entities from an entity set.
    Read,
    /// Update entities in an entity set.
    Update,
    /// Delete entities from an entity set.
    Delete,
    /// Invoke a function or action.
    Invoke,
    /// Statement-side wildcard matching every requested kind.
    All,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionKind::Inspect => "Inspect",
            PermissionKind::Create => "Create",
            PermissionKind::Read => "Read",
            PermissionKind::Update => "Update",
            PermissionKind::Delete => "Delete",
            PermissionKind::Invoke => "Invoke",
            PermissionKind::All => "All",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionEffect {
    Grant,
    Deny,
}

/// The securable element a statement applies to.
///
/// Without a namespace the securable names an entity container element
/// (entity set, singleton, operation import); with one it names an element
/// of that schema namespace. All components unset means every securable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurableScope {
    pub namespace: Option<String>,
    pub securable: Option<String>,
    /// Sub-element of the securable, such as a property.
    pub child: Option<String>,
}

impl SecurableScope {
    /// Every securable element.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// An entity container element.
    pub fn container(securable: impl Into<String>) -> Self {
        Self {
            namespace: None,
            securable: Some(securable.into()),
            child: None,
        }
    }

    /// A schema element within `namespace`.
    pub fn schema(namespace: impl Into<String>, securable: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            securable: Some(securable.into()),
            child: None,
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: impl Into<String>) -> Self {
        self.child = Some(child.into());
        self
    }

    pub fn is_global(&self) -> bool {
        self.namespace.is_none() && self.securable.is_none()
    }

    /// Whether this scope covers the securable `(namespace, securable)`.
    ///
    /// A global scope covers everything; otherwise both the namespace and
    /// the securable name must be equal. The child is not considered here.
    pub fn covers(&self, namespace: Option<&str>, securable: &str) -> bool {
        self.is_global()
            || (self.namespace.as_deref() == namespace
                && self.securable.as_deref() == Some(securable))
    }
}

impl fmt::Display for SecurableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() && self.child.is_none() {
            return write!(f, "*");
        }
        if let Some(namespace) = &self.namespace {
            write!(f, "{}.", namespace)?;
        }
        write!(f, "{}", self.securable.as_deref().unwrap_or("*"))?;
        if let Some(child) = &self.child {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

/// An immutable grant or deny of one permission kind to a role on a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionStatement {
    effect: PermissionEffect,
    kind: PermissionKind,
    role: Option<String>,
    scope: SecurableScope,
}

impl PermissionStatement {
    /// Grants `kind` on `scope` to `role`, or to every caller when `role` is `None`.
    pub fn grant(kind: PermissionKind, role: Option<&str>, scope: SecurableScope) -> Self {
        Self {
            effect: PermissionEffect::Grant,
            kind,
            role: role.map(str::to_string),
            scope,
        }
    }

    /// Denies `kind` on `scope` to `role`, or to every caller when `role` is `None`.
    pub fn deny(kind: PermissionKind, role: Option<&str>, scope: SecurableScope) -> Self {
        Self {
            effect: PermissionEffect::Deny,
            kind,
            role: role.map(str::to_string),
            scope,
        }
    }

    pub fn effect(&self) -> PermissionEffect {
        self.effect
    }

    pub fn is_grant(&self) -> bool {
        self.effect == PermissionEffect::Grant
    }

    pub fn is_deny(&self) -> bool {
        self.effect == PermissionEffect::Deny
    }

    pub fn kind(&self) -> PermissionKind {
        self.kind
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn scope(&self) -> &SecurableScope {
        &self.scope
    }

    /// Whether the statement speaks about `requested`, directly or through `All`.
    pub fn covers_kind(&self, requested: PermissionKind) -> bool {
        self.kind == requested || self.kind == PermissionKind::All
    }
}

impl fmt::Display for PermissionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effect = match self.effect {
            PermissionEffect::Grant => "grant",
            PermissionEffect::Deny => "deny",
        };
        write!(
            f,
            "{} {} on {} to {}",
            effect,
            self.kind,
            self.scope,
            self.role.as_deref().unwrap_or("everyone")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_set_exactly_one_effect() {
        let grant = PermissionStatement::grant(PermissionKind::Read, None, SecurableScope::all());
        assert!(grant.is_grant() && !grant.is_deny());

        let deny = PermissionStatement::deny(PermissionKind::Read, Some("Guest"), SecurableScope::all());
        assert!(deny.is_deny() && !deny.is_grant());
        assert_eq!(deny.role(), Some("Guest"));
    }

    #[test]
    fn scope_matching_is_exact_unless_global() {
        assert!(SecurableScope::all().covers(None, "People"));
        assert!(SecurableScope::all().covers(Some("Trippin"), "GetNearestAirport"));

        let people = SecurableScope::container("People");
        assert!(people.covers(None, "People"));
        assert!(!people.covers(None, "Airports"));
        assert!(!people.covers(Some("Trippin"), "People"));

        let function = SecurableScope::schema("Trippin", "GetNearestAirport");
        assert!(function.covers(Some("Trippin"), "GetNearestAirport"));
        assert!(!function.covers(None, "GetNearestAirport"));

        // a namespace alone never acts as a wildcard
        let namespace_only = SecurableScope {
            namespace: Some("Trippin".to_string()),
            securable: None,
            child: None,
        };
        assert!(!namespace_only.covers(Some("Trippin"), "People"));
    }

    #[test]
    fn all_covers_every_kind() {
        let all = PermissionStatement::grant(PermissionKind::All, None, SecurableScope::all());
        assert!(all.covers_kind(PermissionKind::Inspect));
        assert!(all.covers_kind(PermissionKind::Read));

        let read = PermissionStatement::grant(PermissionKind::Read, None, SecurableScope::all());
        assert!(!read.covers_kind(PermissionKind::Inspect));
    }

    #[test]
    fn display_is_readable() {
        let statement = PermissionStatement::deny(
            PermissionKind::Read,
            Some("Guest"),
            SecurableScope::container("People"),
        );
        assert_eq!(statement.to_string(), "deny Read on People to Guest");
    }
}
