//! Validation of a table schema against live column data.
//!
//! Verdicts are advisory: a failed check produces a diagnostic message, not
//! an error, and the caller decides whether to discard the schema. Checks
//! run in a fixed order and the first failure short-circuits.

use std::collections::HashSet;

use crate::sample::ValueSample;
use crate::schema::TableSchema;
use crate::typesys::StorageKind;

/// Capability interface the validator (and schema initialization) requires
/// from a storage backend.
pub trait DataHandle {
    /// Column names in column order.
    fn column_names(&self) -> Vec<String>;

    /// The representation the backend currently holds a column in.
    fn storage(&self, column: &str) -> Option<StorageKind>;

    /// Backend uniqueness query: whether a column holds any value twice.
    fn has_duplicates(&self, column: &str) -> bool;

    /// Whether the backend's row labels are consistent with a column's
    /// values. Detects data mutated outside the schema-aware path.
    fn row_labels_synced(&self, column: &str) -> bool;

    /// A bounded, representative sample of a column's values.
    fn sample(&self, column: &str) -> Option<&dyn ValueSample>;

    /// Whether the backend can hold data in the given representation. Used
    /// to accept a logical type's backup representation.
    fn supports(&self, _storage: StorageKind) -> bool {
        true
    }
}

/// Whether the schema still matches the data. Strict AND of all checks.
pub fn is_valid(schema: &TableSchema, data: &dyn DataHandle) -> bool {
    explain_invalid(schema, data).is_none()
}

/// The first failing check's diagnostic, or `None` when the schema is valid.
///
/// Checks, in order: column-name sets match, storage representations match
/// the declared logical types, a declared index is duplicate-free, and a
/// declared index is in sync with the row labels.
pub fn explain_invalid(schema: &TableSchema, data: &dyn DataHandle) -> Option<String> {
    let data_columns = data.column_names();
    let data_set: HashSet<&str> = data_columns.iter().map(String::as_str).collect();

    for name in schema.column_names() {
        if !data_set.contains(name) {
            return Some(format!(
                "column '{}' is described by the schema but missing from the data",
                name
            ));
        }
    }
    for name in &data_columns {
        if schema.column(name).is_none() {
            return Some(format!(
                "data column '{}' is not described by the schema",
                name
            ));
        }
    }

    for (name, column) in schema.columns() {
        let ltype = column.logical_type();
        let actual = match data.storage(name) {
            Some(storage) => storage,
            None => {
                return Some(format!(
                    "data reports no storage representation for column '{}'",
                    name
                ));
            }
        };
        let accepted = actual == ltype.primary
            || (ltype.backup == Some(actual) && !data.supports(ltype.primary));
        if !accepted {
            return Some(format!(
                "dtype mismatch for column '{}': schema expects {}, data has {}",
                name, ltype.primary, actual
            ));
        }
    }

    if let Some(index) = schema.index() {
        if data.has_duplicates(index) {
            return Some(format!(
                "index column '{}' contains duplicate values",
                index
            ));
        }
        if !data.row_labels_synced(index) {
            return Some(format!(
                "index column '{}' is out of sync with the row labels",
                index
            ));
        }
    }

    None
}
