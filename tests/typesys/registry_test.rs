//! Integration tests for the type registry and its relationship forest.

use std::sync::Arc;

use heartwood::config::Config;
use heartwood::sample::ValueSample;
use heartwood::typesys::{InferenceFn, LogicalType, StorageKind, TypeSystem};
use heartwood::SchemaError;

fn never_matches() -> InferenceFn {
    Arc::new(|_: &dyn ValueSample, _: &Config| false)
}

#[test]
fn test_baseline_contains_defaults() {
    let ts = TypeSystem::default();
    for name in [
        "Unknown",
        "Boolean",
        "Integer",
        "Double",
        "Datetime",
        "Categorical",
        "Ordinal",
        "NaturalLanguage",
        "EmailAddress",
    ] {
        assert!(ts.is_registered(name), "missing built-in {}", name);
    }
    assert_eq!(ts.parent_of("Integer"), Some("Double"));
}

#[test]
fn test_add_and_remove_user_type() {
    let mut ts = TypeSystem::default();
    ts.add_type(
        LogicalType::new("CustomerTier", StorageKind::Categorical)
            .with_standard_tags(["category"]),
        Some(never_matches()),
        Some("Categorical"),
    )
    .unwrap();
    assert!(ts.is_registered("CustomerTier"));
    assert_eq!(ts.parent_of("CustomerTier"), Some("Categorical"));
    assert_eq!(ts.depth_of("CustomerTier"), Some(1));

    ts.remove_type("CustomerTier").unwrap();
    assert!(!ts.is_registered("CustomerTier"));
    // Still resolvable for already-applied schemas.
    assert!(ts.get("CustomerTier").is_some());

    let err = ts.remove_type("CustomerTier").unwrap_err();
    assert!(matches!(err, SchemaError::UnknownType(_)));
}

#[test]
fn test_readding_removed_type_reregisters() {
    let mut ts = TypeSystem::default();
    ts.remove_type("PostalCode").unwrap();
    ts.add_type(
        LogicalType::new("PostalCode", StorageKind::Categorical),
        None,
        Some("Categorical"),
    )
    .unwrap();
    assert!(ts.is_registered("PostalCode"));
    assert_eq!(ts.parent_of("PostalCode"), Some("Categorical"));
}

#[test]
fn test_remove_reparents_children_to_grandparent() {
    let mut ts = TypeSystem::default();
    ts.add_type(
        LogicalType::new("Severity", StorageKind::Categorical),
        None,
        Some("Ordinal"),
    )
    .unwrap();
    assert_eq!(ts.depth_of("Severity"), Some(2));

    ts.remove_type("Ordinal").unwrap();
    assert_eq!(ts.parent_of("Severity"), Some("Categorical"));
    assert_eq!(ts.depth_of("Severity"), Some(1));
}

#[test]
fn test_remove_root_makes_children_roots() {
    let mut ts = TypeSystem::default();
    ts.remove_type("Double").unwrap();
    assert_eq!(ts.parent_of("Integer"), None);
    assert_eq!(ts.depth_of("Integer"), Some(0));
}

#[test]
fn test_update_relationship_to_root_and_back() {
    let mut ts = TypeSystem::default();
    ts.update_relationship("Integer", None).unwrap();
    assert_eq!(ts.parent_of("Integer"), None);

    ts.update_relationship("Integer", Some("Double")).unwrap();
    assert_eq!(ts.parent_of("Integer"), Some("Double"));
}

#[test]
fn test_update_relationship_rejects_unregistered_parent() {
    let mut ts = TypeSystem::default();
    ts.remove_type("PostalCode").unwrap();
    let err = ts
        .update_relationship("Ordinal", Some("PostalCode"))
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownParent(_)));
    assert_eq!(ts.parent_of("Ordinal"), Some("Categorical"));
}

#[test]
fn test_cycle_detection_across_levels() {
    let mut ts = TypeSystem::default();
    ts.add_type(
        LogicalType::new("Severity", StorageKind::Categorical),
        None,
        Some("Ordinal"),
    )
    .unwrap();
    // Categorical -> Ordinal -> Severity; closing the loop must fail.
    let err = ts
        .update_relationship("Categorical", Some("Severity"))
        .unwrap_err();
    assert!(matches!(err, SchemaError::RelationshipCycle(_)));
}

#[test]
fn test_reset_defaults_is_idempotent() {
    let mut ts = TypeSystem::default();
    ts.add_type(
        LogicalType::new("CustomerTier", StorageKind::Categorical),
        None,
        None,
    )
    .unwrap();
    ts.remove_type("PostalCode").unwrap();
    ts.update_relationship("Integer", None).unwrap();

    ts.reset_defaults();
    let once: Vec<String> = ts
        .registered_types()
        .iter()
        .map(|lt| lt.name.clone())
        .collect();
    ts.reset_defaults();
    let twice: Vec<String> = ts
        .registered_types()
        .iter()
        .map(|lt| lt.name.clone())
        .collect();

    assert_eq!(once, twice);
    assert!(!ts.is_registered("CustomerTier"));
    assert!(ts.is_registered("PostalCode"));
    assert_eq!(ts.parent_of("Integer"), Some("Double"));

    let fresh: Vec<String> = TypeSystem::default()
        .registered_types()
        .iter()
        .map(|lt| lt.name.clone())
        .collect();
    assert_eq!(once, fresh);
}

#[test]
fn test_resolve_normalizes_names() {
    let ts = TypeSystem::default();
    assert_eq!(ts.resolve("email_address").unwrap().name, "EmailAddress");
    assert_eq!(ts.resolve("natural_language").unwrap().name, "NaturalLanguage");
    assert_eq!(ts.resolve("Integer").unwrap().name, "Integer");
    assert!(ts.resolve("no_such_type").is_err());
}
