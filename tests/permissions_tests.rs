use fold_domain::config::DomainConfig;
use fold_domain::permissions::{
    AuthorizationContext, AuthorizationError, ContainerElement, ContainerElementKind,
    ModelReference, ModelVisibilityFilter, PermissionEvaluator, PermissionKind,
    PermissionStatement, QueryExpressionContext, QueryExpressionInspector, RoleBasedAuthorization,
    SchemaElement, SchemaElementKind, SecurableScope, StaticRoleMembership,
};
use std::sync::Arc;

const TRAVEL_PERMISSIONS: &str = r#"
log_level = "warn"

[[permissions]]
effect = "grant"
permission = "Inspect"

[[permissions]]
effect = "grant"
permission = "Read"
securable = "People"

[[permissions]]
effect = "deny"
permission = "Read"
role = "Guest"
securable = "People"

[[permissions]]
effect = "grant"
permission = "All"
role = "Admin"

[[permissions]]
effect = "deny"
permission = "Inspect"
namespace = "Trippin"
securable = "ResetDataSource"
"#;

fn load_travel_config() -> AuthorizationContext {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("permissions.toml");
    std::fs::write(&path, TRAVEL_PERMISSIONS).unwrap();

    let config = DomainConfig::load(&path).expect("config loads");
    config.build().unwrap().authorization_context()
}

fn read_query<'a>(context: &'a AuthorizationContext, entity_set: &str) -> QueryExpressionContext<'a> {
    QueryExpressionContext {
        model_reference: Some(ModelReference::EntitySet(entity_set.to_string())),
        authorization: context,
    }
}

#[test]
fn test_configured_statements_gate_queries() {
    let authz = RoleBasedAuthorization::default();
    let context = load_travel_config();

    assert!(authz.inspect(&read_query(&context, "People")).is_ok());
    assert_eq!(
        authz.inspect(&read_query(&context, "Airports")).unwrap_err(),
        AuthorizationError::new(PermissionKind::Read, "Airports")
    );
}

#[test]
fn test_asserted_role_deny_overrides_grant() {
    let authz = RoleBasedAuthorization::default();
    let guest = load_travel_config().with_asserted_role("Guest");

    let err = authz.inspect(&read_query(&guest, "People")).unwrap_err();
    assert_eq!(err.to_string(), "Not authorized for Read: People");
}

#[test]
fn test_ambient_admin_membership_grants_everything() {
    let authz = RoleBasedAuthorization::new(PermissionEvaluator::new(Arc::new(
        StaticRoleMembership::new(["Admin"]),
    )));
    let context = load_travel_config();

    assert!(authz.inspect(&read_query(&context, "Airports")).is_ok());
    let import = ContainerElement::new(ContainerElementKind::OperationImport, "GetNearestAirport");
    assert!(authz.is_container_element_visible(&context, &import));
}

#[test]
fn test_visibility_follows_inspect_statements() {
    let authz = RoleBasedAuthorization::default();
    let context = load_travel_config();

    let reset = SchemaElement::new(SchemaElementKind::Operation, "Trippin", "ResetDataSource");
    assert!(!authz.is_schema_element_visible(&context, &reset));

    let nearest = SchemaElement::new(SchemaElementKind::Operation, "Trippin", "GetNearestAirport");
    assert!(authz.is_schema_element_visible(&context, &nearest));

    let people = ContainerElement::new(ContainerElementKind::EntitySet, "People");
    assert!(authz.is_container_element_visible(&context, &people));
}

#[test]
fn test_nothing_is_visible_without_statements() {
    let authz = RoleBasedAuthorization::default();
    let context = AuthorizationContext::new(Vec::<PermissionStatement>::new().into());

    let people = ContainerElement::new(ContainerElementKind::EntitySet, "People");
    assert!(!authz.is_container_element_visible(&context, &people));
    let me = ContainerElement::new(ContainerElementKind::Singleton, "Me");
    assert!(!authz.is_container_element_visible(&context, &me));

    let person = SchemaElement::new(SchemaElementKind::Type, "Trippin", "Person");
    assert!(authz.is_schema_element_visible(&context, &person));

    assert!(authz.inspect(&read_query(&context, "People")).is_err());
}

#[test]
fn test_property_navigation_is_not_checked() {
    let authz = RoleBasedAuthorization::default();
    let context = AuthorizationContext::new(
        vec![PermissionStatement::grant(
            PermissionKind::Read,
            None,
            SecurableScope::container("People").with_child("Friends"),
        )]
        .into(),
    );

    let navigation = QueryExpressionContext {
        model_reference: Some(ModelReference::Property {
            source: Box::new(ModelReference::EntitySet("People".to_string())),
            property: "Friends".to_string(),
        }),
        authorization: &context,
    };
    assert!(authz.inspect(&navigation).is_ok());
    assert!(authz.inspect(&read_query(&context, "People")).is_err());
}
