//! Minimal in-memory backend implementing the sampling and data-handle
//! capability interfaces.
//!
//! This is the reference collaborator used by the integration tests and by
//! examples; a real deployment would put a storage engine behind the same
//! traits.

use std::collections::HashSet;

use crate::sample::ValueSample;
use crate::typesys::StorageKind;
use crate::validate::DataHandle;
use crate::value::Value;

/// One column of values held in a declared storage representation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemColumn {
    storage: StorageKind,
    values: Vec<Value>,
}

impl MemColumn {
    pub fn new(storage: StorageKind, values: Vec<Value>) -> Self {
        Self { storage, values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Change the declared representation without touching the values, the
    /// way an out-of-band cast would.
    pub fn set_storage(&mut self, storage: StorageKind) {
        self.storage = storage;
    }
}

impl ValueSample for MemColumn {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn storage(&self) -> StorageKind {
        self.storage
    }

    fn non_null(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        Box::new(self.values.iter().filter(|v| !v.is_null()))
    }
}

/// An ordered set of named columns plus row labels.
///
/// Row labels default to positional integers; [`MemTable::sync_labels_to`]
/// mirrors what setting a dataframe's index does. Mutating a column without
/// going through the schema-aware path leaves the labels behind, which the
/// validator's sync check then reports.
#[derive(Debug, Clone, Default)]
pub struct MemTable {
    columns: Vec<(String, MemColumn)>,
    row_labels: Vec<Value>,
}

impl MemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. The first column decides the row count and seeds
    /// positional labels.
    pub fn push_column(&mut self, name: impl Into<String>, column: MemColumn) {
        if self.columns.is_empty() && self.row_labels.is_empty() {
            self.row_labels = (0..column.values.len() as i64).map(Value::Int).collect();
        }
        self.columns.push((name.into(), column));
    }

    pub fn column(&self, name: &str) -> Option<&MemColumn> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut MemColumn> {
        self.columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn row_labels(&self) -> &[Value] {
        &self.row_labels
    }

    /// Adopt a column's values as the row labels. Returns false when the
    /// column does not exist.
    pub fn sync_labels_to(&mut self, name: &str) -> bool {
        match self.column(name) {
            Some(column) => {
                self.row_labels = column.values.clone();
                true
            }
            None => false,
        }
    }

    /// Restore positional integer labels, detaching them from any column.
    pub fn reset_positional_labels(&mut self) {
        let rows = self
            .columns
            .first()
            .map(|(_, c)| c.values.len())
            .unwrap_or(0);
        self.row_labels = (0..rows as i64).map(Value::Int).collect();
    }

    /// Permute every column and the row labels by the given order.
    pub fn reorder_rows(&mut self, order: &[usize]) {
        for (_, column) in &mut self.columns {
            column.values = order.iter().map(|&i| column.values[i].clone()).collect();
        }
        self.row_labels = order.iter().map(|&i| self.row_labels[i].clone()).collect();
    }
}

impl DataHandle for MemTable {
    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    fn storage(&self, column: &str) -> Option<StorageKind> {
        self.column(column).map(|c| c.storage)
    }

    fn has_duplicates(&self, column: &str) -> bool {
        match self.column(column) {
            Some(column) => {
                let mut seen = HashSet::new();
                column.values.iter().any(|v| !seen.insert(v))
            }
            None => false,
        }
    }

    fn row_labels_synced(&self, column: &str) -> bool {
        match self.column(column) {
            Some(column) => column.values == self.row_labels,
            None => false,
        }
    }

    fn sample(&self, column: &str) -> Option<&dyn ValueSample> {
        self.column(column).map(|c| c as &dyn ValueSample)
    }
}
