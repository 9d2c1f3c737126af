use crate::permissions::error::AuthorizationError;
use crate::permissions::evaluator::{AuthorizationContext, PermissionEvaluator};
use crate::permissions::types::PermissionKind;
use log::warn;

/// What kind of schema-level element is being exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaElementKind {
    /// Entity, complex, enum or type-definition types.
    Type,
    /// Functions and actions.
    Operation,
    Term,
}

/// An element declared in a schema namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    pub kind: SchemaElementKind,
    pub namespace: String,
    pub name: String,
}

impl SchemaElement {
    pub fn new(kind: SchemaElementKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerElementKind {
    EntitySet,
    Singleton,
    OperationImport,
}

/// An element of the entity container. Container elements have no namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerElement {
    pub kind: ContainerElementKind,
    pub name: String,
}

impl ContainerElement {
    pub fn new(kind: ContainerElementKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// The modeled element a query reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReference {
    EntitySet(String),
    Singleton(String),
    /// A property reached from another reference.
    Property {
        source: Box<ModelReference>,
        property: String,
    },
}

/// A query about to be executed, as seen by inspectors.
#[derive(Debug, Clone)]
pub struct QueryExpressionContext<'a> {
    pub model_reference: Option<ModelReference>,
    pub authorization: &'a AuthorizationContext,
}

/// Decides which model elements are exposed to introspection.
pub trait ModelVisibilityFilter: Send + Sync {
    fn is_schema_element_visible(&self, context: &AuthorizationContext, element: &SchemaElement) -> bool;

    fn is_container_element_visible(
        &self,
        context: &AuthorizationContext,
        element: &ContainerElement,
    ) -> bool;
}

/// Gates query execution. An `Err` is fatal to the query.
pub trait QueryExpressionInspector: Send + Sync {
    fn inspect(&self, context: &QueryExpressionContext<'_>) -> Result<(), AuthorizationError>;
}

/// Role-based authorization over configured permission statements: `Inspect`
/// gates model visibility and `Read` gates queries against entity sets.
#[derive(Debug, Clone)]
pub struct RoleBasedAuthorization {
    evaluator: PermissionEvaluator,
}

impl RoleBasedAuthorization {
    pub fn new(evaluator: PermissionEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    fn is_visible(
        &self,
        context: &AuthorizationContext,
        namespace: Option<&str>,
        securable: &str,
    ) -> bool {
        self.evaluator
            .is_granted(context, PermissionKind::Inspect, namespace, securable)
    }
}

impl Default for RoleBasedAuthorization {
    fn default() -> Self {
        Self::new(PermissionEvaluator::without_membership())
    }
}

impl ModelVisibilityFilter for RoleBasedAuthorization {
    fn is_schema_element_visible(&self, context: &AuthorizationContext, element: &SchemaElement) -> bool {
        // TODO: gate types once property-level (child) permissions are evaluated
        if element.kind == SchemaElementKind::Type {
            return true;
        }
        self.is_visible(context, Some(&element.namespace), &element.name)
    }

    fn is_container_element_visible(
        &self,
        context: &AuthorizationContext,
        element: &ContainerElement,
    ) -> bool {
        self.is_visible(context, None, &element.name)
    }
}

impl QueryExpressionInspector for RoleBasedAuthorization {
    fn inspect(&self, context: &QueryExpressionContext<'_>) -> Result<(), AuthorizationError> {
        let entity_set = match &context.model_reference {
            Some(ModelReference::EntitySet(name)) => name,
            _ => return Ok(()),
        };

        if self
            .evaluator
            .is_granted(context.authorization, PermissionKind::Read, None, entity_set)
        {
            Ok(())
        } else {
            warn!("Read denied on entity set {}", entity_set);
            Err(AuthorizationError::new(PermissionKind::Read, entity_set.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::types::{PermissionStatement, SecurableScope};

    fn context(statements: Vec<PermissionStatement>) -> AuthorizationContext {
        AuthorizationContext::new(statements.into())
    }

    #[test]
    fn types_are_always_visible() {
        let authz = RoleBasedAuthorization::default();
        let ctx = context(Vec::new());
        let person = SchemaElement::new(SchemaElementKind::Type, "Trippin", "Person");
        assert!(authz.is_schema_element_visible(&ctx, &person));

        let function = SchemaElement::new(SchemaElementKind::Operation, "Trippin", "GetNearestAirport");
        assert!(!authz.is_schema_element_visible(&ctx, &function));
    }

    #[test]
    fn schema_elements_use_their_namespace() {
        let authz = RoleBasedAuthorization::default();
        let ctx = context(vec![PermissionStatement::grant(
            PermissionKind::Inspect,
            None,
            SecurableScope::schema("Trippin", "GetNearestAirport"),
        )]);

        let function = SchemaElement::new(SchemaElementKind::Operation, "Trippin", "GetNearestAirport");
        assert!(authz.is_schema_element_visible(&ctx, &function));

        let import = ContainerElement::new(ContainerElementKind::OperationImport, "GetNearestAirport");
        assert!(!authz.is_container_element_visible(&ctx, &import));
    }

    #[test]
    fn queries_without_entity_set_are_allowed() {
        let authz = RoleBasedAuthorization::default();
        let ctx = context(Vec::new());

        let unbound = QueryExpressionContext {
            model_reference: None,
            authorization: &ctx,
        };
        assert!(authz.inspect(&unbound).is_ok());

        let singleton = QueryExpressionContext {
            model_reference: Some(ModelReference::Singleton("Me".to_string())),
            authorization: &ctx,
        };
        assert!(authz.inspect(&singleton).is_ok());
    }

    #[test]
    fn denied_read_names_the_entity_set() {
        let authz = RoleBasedAuthorization::default();
        let ctx = context(vec![PermissionStatement::grant(
            PermissionKind::Inspect,
            None,
            SecurableScope::all(),
        )]);
        let query = QueryExpressionContext {
            model_reference: Some(ModelReference::EntitySet("People".to_string())),
            authorization: &ctx,
        };

        let err = authz.inspect(&query).unwrap_err();
        assert_eq!(err, AuthorizationError::new(PermissionKind::Read, "People"));
        assert_eq!(err.to_string(), "Not authorized for Read: People");
    }
}
