//! Table-level schema: an ordered collection of column schemas plus the
//! index and time-index designations.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::sample::ValueSample;
use crate::typesys::{LogicalType, TypeSystem};
use crate::validate::DataHandle;

use super::column::{ColumnSchema, ReservedRole, INDEX_TAG, TIME_INDEX_TAG};

/// Options for typing a table from live data.
#[derive(Debug, Clone)]
pub struct SchemaInit {
    pub name: Option<String>,
    pub index: Option<String>,
    pub time_index: Option<String>,
    /// Explicit types for named columns; everything else is inferred.
    pub logical_types: HashMap<String, LogicalType>,
    /// Extra user tags for named columns.
    pub semantic_tags: HashMap<String, BTreeSet<String>>,
    pub use_standard_tags: bool,
}

impl Default for SchemaInit {
    fn default() -> Self {
        Self {
            name: None,
            index: None,
            time_index: None,
            logical_types: HashMap::new(),
            semantic_tags: HashMap::new(),
            use_standard_tags: true,
        }
    }
}

/// Ordered mapping from column name to [`ColumnSchema`], plus table-level
/// state. Column order is insertion order.
///
/// Equality is defined purely on schema, never on underlying data values.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub(crate) name: Option<String>,
    pub(crate) columns: Vec<(String, ColumnSchema)>,
    pub(crate) index: Option<String>,
    pub(crate) time_index: Option<String>,
    pub(crate) use_standard_tags: bool,
    pub(crate) metadata: BTreeMap<String, serde_json::Value>,
}

impl TableSchema {
    pub fn new(name: Option<String>, use_standard_tags: bool) -> Self {
        Self {
            name,
            columns: Vec::new(),
            index: None,
            time_index: None,
            use_standard_tags,
            metadata: BTreeMap::new(),
        }
    }

    /// Type a table from live data: explicit types are checked against the
    /// column samples, everything else is inferred, then index designations
    /// are applied.
    pub fn from_data(
        type_system: &TypeSystem,
        config: &Config,
        data: &dyn DataHandle,
        init: &SchemaInit,
    ) -> Result<TableSchema> {
        let names = data.column_names();
        for key in init.logical_types.keys().chain(init.semantic_tags.keys()) {
            if !names.iter().any(|n| n == key) {
                return Err(SchemaError::UnknownColumn(key.clone()));
            }
        }

        let mut schema = TableSchema::new(init.name.clone(), init.use_standard_tags);
        for name in &names {
            let sample = data
                .sample(name)
                .ok_or_else(|| SchemaError::UnknownColumn(name.clone()))?;
            let ltype = match init.logical_types.get(name) {
                Some(ltype) => {
                    check_compatible(name, sample, ltype)?;
                    ltype.clone()
                }
                None => type_system.infer(sample, config),
            };
            let mut column = ColumnSchema::new(ltype, init.use_standard_tags);
            if let Some(tags) = init.semantic_tags.get(name) {
                column.add_semantic_tags(tags.iter().cloned())?;
            }
            schema.add_column(name.clone(), column)?;
        }

        if let Some(time_index) = &init.time_index {
            schema.set_time_index(Some(time_index))?;
        }
        if let Some(index) = &init.index {
            schema.set_index(Some(index), Some(data))?;
        }
        Ok(schema)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn use_standard_tags(&self) -> bool {
        self.use_standard_tags
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    pub fn time_index(&self) -> Option<&str> {
        self.time_index.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, serde_json::Value> {
        &mut self.metadata
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnSchema> {
        self.columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnSchema)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn add_column(&mut self, name: impl Into<String>, column: ColumnSchema) -> Result<()> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(SchemaError::DuplicateColumn(name));
        }
        self.columns.push((name, column));
        Ok(())
    }

    /// Drop a column, clearing the index or time-index designation when the
    /// dropped column held it.
    pub fn drop_column(&mut self, name: &str) -> Result<ColumnSchema> {
        let position = self
            .columns
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))?;
        if self.index.as_deref() == Some(name) {
            self.index = None;
        }
        if self.time_index.as_deref() == Some(name) {
            self.time_index = None;
        }
        Ok(self.columns.remove(position).1)
    }

    /// Batched type/tag update. Fails atomically: every named column must
    /// exist and every requested assignment must be valid before anything
    /// is applied.
    pub fn set_types(
        &mut self,
        logical_types: &HashMap<String, LogicalType>,
        semantic_tags: &HashMap<String, BTreeSet<String>>,
        data: Option<&dyn DataHandle>,
    ) -> Result<()> {
        for name in logical_types.keys().chain(semantic_tags.keys()) {
            if self.column(name).is_none() {
                return Err(SchemaError::UnknownColumn(name.clone()));
            }
        }

        for (name, tags) in semantic_tags {
            for tag in tags {
                if tag == INDEX_TAG || tag == TIME_INDEX_TAG {
                    return Err(SchemaError::ReservedTag(tag.clone()));
                }
            }
            let column = self.column(name).ok_or_else(|| {
                SchemaError::UnknownColumn(name.clone())
            })?;
            if let Some(role) = column.role() {
                let tag = if role == ReservedRole::Index {
                    INDEX_TAG
                } else {
                    TIME_INDEX_TAG
                };
                return Err(SchemaError::ReservedTag(tag.to_string()));
            }
        }

        for (name, ltype) in logical_types {
            if self.time_index.as_deref() == Some(name.as_str())
                && !(ltype.is_temporal() || ltype.is_numeric())
            {
                return Err(SchemaError::InvalidTimeIndex {
                    column: name.clone(),
                    storage: ltype.primary,
                });
            }
            if let Some(data) = data {
                let sample = data
                    .sample(name)
                    .ok_or_else(|| SchemaError::UnknownColumn(name.clone()))?;
                check_compatible(name, sample, ltype)?;
            }
        }

        for (name, ltype) in logical_types {
            if let Some(column) = self.column_mut(name) {
                column.set_type(ltype.clone());
            }
        }
        for (name, tags) in semantic_tags {
            if let Some(column) = self.column_mut(name) {
                column.replace_user_tags(tags.clone());
            }
        }
        Ok(())
    }

    /// Designate (or clear) the index column.
    ///
    /// The previous index column regains its standard tags; the new one must
    /// pass the backend's uniqueness check when a data handle is supplied,
    /// and has its standard tags suppressed.
    pub fn set_index(&mut self, name: Option<&str>, data: Option<&dyn DataHandle>) -> Result<()> {
        if let Some(name) = name {
            if self.column(name).is_none() {
                return Err(SchemaError::UnknownColumn(name.to_string()));
            }
            if self.time_index.as_deref() == Some(name) {
                return Err(SchemaError::ReservedTag(TIME_INDEX_TAG.to_string()));
            }
            if let Some(data) = data {
                if data.has_duplicates(name) {
                    return Err(SchemaError::IndexNotUnique(name.to_string()));
                }
            }
        }

        if let Some(previous) = self.index.take() {
            if let Some(column) = self.column_mut(&previous) {
                column.set_role(None);
            }
        }
        if let Some(name) = name {
            if let Some(column) = self.column_mut(name) {
                column.set_role(Some(ReservedRole::Index));
            }
            self.index = Some(name.to_string());
        }
        Ok(())
    }

    /// Designate (or clear) the time index column. The column's logical type
    /// must have a temporal or numeric representation.
    pub fn set_time_index(&mut self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            let column = self
                .column(name)
                .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))?;
            if self.index.as_deref() == Some(name) {
                return Err(SchemaError::ReservedTag(INDEX_TAG.to_string()));
            }
            let ltype = column.logical_type();
            if !(ltype.is_temporal() || ltype.is_numeric()) {
                return Err(SchemaError::InvalidTimeIndex {
                    column: name.to_string(),
                    storage: ltype.primary,
                });
            }
        }

        if let Some(previous) = self.time_index.take() {
            if let Some(column) = self.column_mut(&previous) {
                column.set_role(None);
            }
        }
        if let Some(name) = name {
            if let Some(column) = self.column_mut(name) {
                column.set_role(Some(ReservedRole::TimeIndex));
            }
            self.time_index = Some(name.to_string());
        }
        Ok(())
    }

    /// Rename columns, re-pointing index designations. Fails on unknown
    /// columns and on any collision among the final names.
    pub fn rename(&mut self, mapping: &HashMap<String, String>) -> Result<()> {
        for old in mapping.keys() {
            if self.column(old).is_none() {
                return Err(SchemaError::UnknownColumn(old.clone()));
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for (name, _) in &self.columns {
            let finish = mapping.get(name).unwrap_or(name);
            if !seen.insert(finish.as_str()) {
                return Err(SchemaError::RenameCollision(finish.clone()));
            }
        }

        for (name, _) in &mut self.columns {
            if let Some(new_name) = mapping.get(name) {
                *name = new_name.clone();
            }
        }
        let renamed_index = self.index.as_ref().and_then(|i| mapping.get(i)).cloned();
        if renamed_index.is_some() {
            self.index = renamed_index;
        }
        let renamed_time_index = self
            .time_index
            .as_ref()
            .and_then(|t| mapping.get(t))
            .cloned();
        if renamed_time_index.is_some() {
            self.time_index = renamed_time_index;
        }
        Ok(())
    }

    /// Sub-schema of the columns matching any criterion: a logical type name
    /// (case/format-normalized) or a semantic tag.
    pub fn select(&self, criteria: &[&str]) -> TableSchema {
        let wanted_types: Vec<String> = criteria
            .iter()
            .map(|c| crate::typesys::normalize_type_name(c))
            .collect();

        let mut selected = TableSchema::new(self.name.clone(), self.use_standard_tags);
        selected.metadata = self.metadata.clone();
        for (name, column) in &self.columns {
            let type_name = crate::typesys::normalize_type_name(&column.logical_type().name);
            let tags = column.semantic_tags();
            let matched = wanted_types.iter().any(|t| *t == type_name)
                || criteria.iter().any(|c| tags.contains(*c));
            if matched {
                selected.columns.push((name.clone(), column.clone()));
            }
        }
        if let Some(index) = &self.index {
            if selected.column(index).is_some() {
                selected.index = Some(index.clone());
            }
        }
        if let Some(time_index) = &self.time_index {
            if selected.column(time_index).is_some() {
                selected.time_index = Some(time_index.clone());
            }
        }
        selected
    }
}

/// Whether a sample can be stored under a logical type's representation.
/// The conversion itself is requested from the backend; this only decides
/// if the request would be honored.
fn check_compatible(column: &str, sample: &dyn ValueSample, ltype: &LogicalType) -> Result<()> {
    let storage = sample.storage();
    if storage == ltype.primary || Some(storage) == ltype.backup {
        return Ok(());
    }
    if sample.non_null().all(|v| v.coercible_to(ltype.primary)) {
        return Ok(());
    }
    Err(SchemaError::TypeMismatch {
        column: column.to_string(),
        ltype: ltype.name.clone(),
        reason: format!(
            "values stored as {} cannot be converted to {}",
            storage, ltype.primary
        ),
    })
}
