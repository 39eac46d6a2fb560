//! Integration tests for table-level schema operations.

use std::collections::{BTreeSet, HashMap};

use heartwood::config::Config;
use heartwood::mem::{MemColumn, MemTable};
use heartwood::schema::{ColumnSchema, SchemaInit, TableSchema};
use heartwood::typesys::{StorageKind, TypeSystem};
use heartwood::value::Value;
use heartwood::SchemaError;

fn int_col(values: &[i64]) -> MemColumn {
    MemColumn::new(
        StorageKind::Int64,
        values.iter().map(|&i| Value::Int(i)).collect(),
    )
}

fn str_col(values: &[&str]) -> MemColumn {
    MemColumn::new(
        StorageKind::Utf8,
        values.iter().map(|s| Value::Str(s.to_string())).collect(),
    )
}

fn orders_table() -> MemTable {
    let mut table = MemTable::new();
    table.push_column("id", int_col(&[1, 2, 3, 4, 5]));
    table.push_column(
        "placed_at",
        str_col(&[
            "2021-01-01",
            "2021-01-02",
            "2021-01-03",
            "2021-01-04",
            "2021-01-05",
        ]),
    );
    table.push_column("status", str_col(&["gold", "gold", "silver", "gold", "silver"]));
    table
}

fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_from_data_infers_and_honors_overrides() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();

    let init = SchemaInit {
        name: Some("orders".into()),
        index: Some("id".into()),
        logical_types: HashMap::from([(
            "status".to_string(),
            ts.resolve("Categorical").unwrap().clone(),
        )]),
        ..Default::default()
    };
    let schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();

    assert_eq!(schema.column_names(), vec!["id", "placed_at", "status"]);
    assert_eq!(schema.column("id").unwrap().logical_type().name, "Integer");
    assert_eq!(
        schema.column("placed_at").unwrap().logical_type().name,
        "Datetime"
    );
    assert_eq!(
        schema.column("status").unwrap().logical_type().name,
        "Categorical"
    );
    assert_eq!(schema.index(), Some("id"));
    assert!(schema.column("id").unwrap().is_index());
}

#[test]
fn test_from_data_rejects_incompatible_explicit_type() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();

    let init = SchemaInit {
        logical_types: HashMap::from([(
            "status".to_string(),
            ts.resolve("Integer").unwrap().clone(),
        )]),
        ..Default::default()
    };
    let err = TableSchema::from_data(&ts, &config, &data, &init).unwrap_err();
    assert!(matches!(err, SchemaError::TypeMismatch { .. }));
}

#[test]
fn test_from_data_rejects_duplicate_index_values() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let mut data = MemTable::new();
    data.push_column("id", int_col(&[1, 1, 2]));

    let init = SchemaInit {
        index: Some("id".into()),
        ..Default::default()
    };
    let err = TableSchema::from_data(&ts, &config, &data, &init).unwrap_err();
    assert!(matches!(err, SchemaError::IndexNotUnique(_)));
}

#[test]
fn test_from_data_rejects_unknown_override_column() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();

    let init = SchemaInit {
        semantic_tags: HashMap::from([("missing".to_string(), tags(&["tier"]))]),
        ..Default::default()
    };
    let err = TableSchema::from_data(&ts, &config, &data, &init).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownColumn(_)));
}

#[test]
fn test_switching_index_restores_standard_tags() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let mut data = MemTable::new();
    data.push_column("id", int_col(&[1, 2, 3]));
    data.push_column("other", int_col(&[10, 20, 30]));

    let init = SchemaInit {
        index: Some("id".into()),
        ..Default::default()
    };
    let mut schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();
    // Standard tags are suppressed on the index column.
    assert_eq!(schema.column("id").unwrap().semantic_tags(), tags(&["index"]));
    assert_eq!(
        schema.column("other").unwrap().semantic_tags(),
        tags(&["numeric"])
    );

    schema.set_index(Some("other"), Some(&data)).unwrap();
    let tagged_index: Vec<&str> = schema
        .columns()
        .filter(|(_, c)| c.semantic_tags().contains("index"))
        .map(|(n, _)| n)
        .collect();
    assert_eq!(tagged_index, vec!["other"]);
    // The old index column regains the standard tags its type defines.
    assert_eq!(schema.column("id").unwrap().semantic_tags(), tags(&["numeric"]));

    schema.set_index(None, None).unwrap();
    assert_eq!(schema.index(), None);
    assert_eq!(
        schema.column("other").unwrap().semantic_tags(),
        tags(&["numeric"])
    );
}

#[test]
fn test_time_index_accepts_numeric_and_temporal_only() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();
    let init = SchemaInit {
        time_index: Some("placed_at".into()),
        ..Default::default()
    };
    let mut schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();
    assert_eq!(schema.time_index(), Some("placed_at"));
    assert!(schema.column("placed_at").unwrap().is_time_index());

    // Numeric columns qualify as well.
    schema.set_time_index(Some("id")).unwrap();
    assert_eq!(schema.time_index(), Some("id"));
    assert!(!schema.column("placed_at").unwrap().is_time_index());

    let init = SchemaInit {
        logical_types: HashMap::from([(
            "status".to_string(),
            ts.resolve("Categorical").unwrap().clone(),
        )]),
        ..Default::default()
    };
    let mut schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();
    let err = schema.set_time_index(Some("status")).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidTimeIndex { .. }));
}

#[test]
fn test_set_types_batched_and_atomic() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();
    let mut schema = TableSchema::from_data(&ts, &config, &data, &SchemaInit::default()).unwrap();

    // A reserved tag anywhere in the batch fails the whole call.
    let bad_tags = HashMap::from([
        ("id".to_string(), tags(&["verified"])),
        ("status".to_string(), tags(&["index"])),
    ]);
    let err = schema
        .set_types(&HashMap::new(), &bad_tags, Some(&data))
        .unwrap_err();
    assert!(matches!(err, SchemaError::ReservedTag(_)));
    assert!(schema.column("id").unwrap().semantic_tags().len() == 1);

    let types = HashMap::from([(
        "status".to_string(),
        ts.resolve("Categorical").unwrap().clone(),
    )]);
    let good_tags = HashMap::from([("id".to_string(), tags(&["verified"]))]);
    schema.set_types(&types, &good_tags, Some(&data)).unwrap();
    assert_eq!(
        schema.column("status").unwrap().logical_type().name,
        "Categorical"
    );
    assert_eq!(
        schema.column("id").unwrap().semantic_tags(),
        tags(&["numeric", "verified"])
    );
}

#[test]
fn test_set_types_rejects_tag_update_on_index_column() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();
    let init = SchemaInit {
        index: Some("id".into()),
        ..Default::default()
    };
    let mut schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();

    let updates = HashMap::from([("id".to_string(), tags(&["verified"]))]);
    let err = schema
        .set_types(&HashMap::new(), &updates, Some(&data))
        .unwrap_err();
    assert!(matches!(err, SchemaError::ReservedTag(_)));
}

#[test]
fn test_rename_repoints_designations() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();
    let init = SchemaInit {
        index: Some("id".into()),
        time_index: Some("placed_at".into()),
        ..Default::default()
    };
    let mut schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();

    let mapping = HashMap::from([
        ("id".to_string(), "order_id".to_string()),
        ("placed_at".to_string(), "ordered_at".to_string()),
    ]);
    schema.rename(&mapping).unwrap();
    assert_eq!(schema.index(), Some("order_id"));
    assert_eq!(schema.time_index(), Some("ordered_at"));
    assert_eq!(schema.column_names(), vec!["order_id", "ordered_at", "status"]);

    let err = schema
        .rename(&HashMap::from([(
            "status".to_string(),
            "order_id".to_string(),
        )]))
        .unwrap_err();
    assert!(matches!(err, SchemaError::RenameCollision(_)));
}

#[test]
fn test_select_keeps_designations_of_selected_columns() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();
    let init = SchemaInit {
        index: Some("id".into()),
        time_index: Some("placed_at".into()),
        ..Default::default()
    };
    let schema = TableSchema::from_data(&ts, &config, &data, &init).unwrap();

    let numeric = schema.select(&["integer"]);
    assert_eq!(numeric.column_names(), vec!["id"]);
    assert_eq!(numeric.index(), Some("id"));
    assert_eq!(numeric.time_index(), None);

    let temporal = schema.select(&["time_index"]);
    assert_eq!(temporal.column_names(), vec!["placed_at"]);
    assert_eq!(temporal.time_index(), Some("placed_at"));
}

#[test]
fn test_schema_equality_is_structural() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let data = orders_table();
    let init = SchemaInit {
        name: Some("orders".into()),
        index: Some("id".into()),
        ..Default::default()
    };

    let a = TableSchema::from_data(&ts, &config, &data, &init).unwrap();
    let b = TableSchema::from_data(&ts, &config, &data, &init).unwrap();
    assert_eq!(a, b);

    let mut c = b.clone();
    c.column_mut("status")
        .unwrap()
        .add_semantic_tags(["tier"])
        .unwrap();
    assert_ne!(a, c);

    let mut d = b.clone();
    d.set_name(Some("other".into()));
    assert_ne!(a, d);
}

#[test]
fn test_manual_schema_construction() {
    let ts = TypeSystem::default();
    let mut schema = TableSchema::new(Some("manual".into()), true);
    schema
        .add_column(
            "id",
            ColumnSchema::new(ts.resolve("Integer").unwrap().clone(), true),
        )
        .unwrap();
    let dropped = schema.drop_column("id").unwrap();
    assert_eq!(dropped.logical_type().name, "Integer");
    assert!(schema.is_empty());
    assert!(matches!(
        schema.drop_column("id").unwrap_err(),
        SchemaError::UnknownColumn(_)
    ));
}
