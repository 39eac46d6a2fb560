//! Integration tests for schema validation against live data.

use heartwood::config::Config;
use heartwood::mem::{MemColumn, MemTable};
use heartwood::sample::ValueSample;
use heartwood::schema::{SchemaInit, TableSchema};
use heartwood::typesys::{StorageKind, TypeSystem};
use heartwood::validate::{explain_invalid, is_valid, DataHandle};
use heartwood::value::Value;

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

fn indexed_table() -> MemTable {
    let mut table = MemTable::new();
    table.push_column("id", int_col(&[3, 1, 2]));
    table.push_column("status", str_col(&["gold", "silver", "gold"]));
    table.sync_labels_to("id");
    table
}

fn indexed_schema(ts: &TypeSystem, data: &MemTable) -> TableSchema {
    let config = Config::default();
    let init = SchemaInit {
        name: Some("accounts".into()),
        index: Some("id".into()),
        ..Default::default()
    };
    TableSchema::from_data(ts, &config, data, &init).unwrap()
}

#[test]
fn test_fresh_schema_is_valid() {
    let ts = TypeSystem::default();
    let data = indexed_table();
    let schema = indexed_schema(&ts, &data);
    assert_eq!(explain_invalid(&schema, &data), None);
    assert!(is_valid(&schema, &data));
}

#[test]
fn test_storage_swap_reports_dtype_mismatch() {
    let ts = TypeSystem::default();
    let mut data = indexed_table();
    let schema = indexed_schema(&ts, &data);

    data.column_mut("id").unwrap().set_storage(StorageKind::Utf8);
    assert!(!is_valid(&schema, &data));
    let message = explain_invalid(&schema, &data).unwrap();
    assert!(message.contains("dtype mismatch"), "{}", message);
    assert!(message.contains("'id'"), "{}", message);
}

#[test]
fn test_row_reordering_stays_valid() {
    let ts = TypeSystem::default();
    let mut data = indexed_table();
    let schema = indexed_schema(&ts, &data);

    data.reorder_rows(&[2, 0, 1]);
    assert!(is_valid(&schema, &data));
}

#[test]
fn test_out_of_sync_labels_reported() {
    let ts = TypeSystem::default();
    let mut data = indexed_table();
    let schema = indexed_schema(&ts, &data);

    // An operation that bypassed the schema-aware path reset the labels.
    data.reset_positional_labels();
    let message = explain_invalid(&schema, &data).unwrap();
    assert!(message.contains("out of sync"), "{}", message);
}

#[test]
fn test_duplicate_index_values_reported() {
    let ts = TypeSystem::default();
    let mut data = indexed_table();
    let schema = indexed_schema(&ts, &data);

    *data.column_mut("id").unwrap() = int_col(&[1, 1, 2]);
    data.sync_labels_to("id");
    let message = explain_invalid(&schema, &data).unwrap();
    assert!(message.contains("duplicate"), "{}", message);
}

#[test]
fn test_column_set_mismatch_reported_in_both_directions() {
    let ts = TypeSystem::default();
    let data = indexed_table();
    let schema = indexed_schema(&ts, &data);

    let mut extra = indexed_table();
    extra.push_column("balance", int_col(&[10, 20, 30]));
    let message = explain_invalid(&schema, &extra).unwrap();
    assert!(message.contains("not described by the schema"), "{}", message);

    let config = Config::default();
    let wider = TableSchema::from_data(&ts, &config, &extra, &SchemaInit::default()).unwrap();
    let message = explain_invalid(&wider, &data).unwrap();
    assert!(message.contains("missing from the data"), "{}", message);
}

/// Wrapper reporting the primary representation as unsupported, forcing the
/// backup path.
struct NoBoolBackend<'a> {
    inner: &'a MemTable,
}

impl DataHandle for NoBoolBackend<'_> {
    fn column_names(&self) -> Vec<String> {
        self.inner.column_names()
    }

    fn storage(&self, column: &str) -> Option<StorageKind> {
        self.inner.storage(column)
    }

    fn has_duplicates(&self, column: &str) -> bool {
        self.inner.has_duplicates(column)
    }

    fn row_labels_synced(&self, column: &str) -> bool {
        self.inner.row_labels_synced(column)
    }

    fn sample(&self, column: &str) -> Option<&dyn ValueSample> {
        self.inner.sample(column)
    }

    fn supports(&self, storage: StorageKind) -> bool {
        storage != StorageKind::Bool
    }
}

#[test]
fn test_backup_representation_accepted_when_primary_unsupported() {
    let ts = TypeSystem::default();
    let config = Config::default();
    let mut data = MemTable::new();
    // Boolean's primary representation is bool with an object backup.
    data.push_column(
        "active",
        MemColumn::new(StorageKind::Object, vec![Value::Bool(true), Value::Bool(false)]),
    );

    let schema = TableSchema::from_data(&ts, &config, &data, &SchemaInit::default()).unwrap();
    assert_eq!(schema.column("active").unwrap().logical_type().name, "Boolean");

    // A backend that can hold bools must use the primary representation.
    let message = explain_invalid(&schema, &data).unwrap();
    assert!(message.contains("dtype mismatch"), "{}", message);

    // One that cannot is allowed to fall back to the backup.
    let constrained = NoBoolBackend { inner: &data };
    assert!(is_valid(&schema, &constrained));
}
