//! The persisted schema record: the canonical interchange form produced and
//! consumed by serialization collaborators.
//!
//! Round-tripping a [`TableSchema`] through its record reproduces an equal
//! schema, including index designations and type parameters such as an
//! ordinal's explicit order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::typesys::{TypeParams, TypeSystem};

use super::column::{ColumnSchema, INDEX_TAG, TIME_INDEX_TAG};
use super::table::TableSchema;

/// Version written into new records. Records with a different major version
/// are rejected.
pub const SCHEMA_VERSION: &str = "1.0";

/// Per-column typing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRecord {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<TypeParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub name: String,
    pub logical_type: TypeRecord,
    #[serde(default)]
    pub semantic_tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// The full persisted schema form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub schema_version: String,
    pub name: Option<String>,
    pub index: Option<String>,
    pub time_index: Option<String>,
    pub columns: Vec<ColumnRecord>,
    pub use_standard_tags: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TableSchema {
    /// The persisted form of this schema. Reserved tags are not written into
    /// the per-column tag sets; the index designations carry them.
    pub fn to_record(&self) -> SchemaRecord {
        let columns = self
            .columns()
            .map(|(name, column)| {
                let mut semantic_tags = column.semantic_tags();
                semantic_tags.remove(INDEX_TAG);
                semantic_tags.remove(TIME_INDEX_TAG);
                ColumnRecord {
                    name: name.to_string(),
                    logical_type: TypeRecord {
                        name: column.logical_type().name.clone(),
                        params: column.logical_type().params.clone(),
                    },
                    semantic_tags,
                    description: column.description().map(str::to_string),
                    metadata: column.metadata().clone(),
                }
            })
            .collect();

        SchemaRecord {
            schema_version: SCHEMA_VERSION.to_string(),
            name: self.name().map(str::to_string),
            index: self.index().map(str::to_string),
            time_index: self.time_index().map(str::to_string),
            columns,
            use_standard_tags: self.use_standard_tags(),
            metadata: self.metadata().clone(),
        }
    }

    /// Rebuild a schema from its persisted form. Type names resolve against
    /// the live registry; unknown names fail.
    pub fn from_record(type_system: &TypeSystem, record: &SchemaRecord) -> Result<TableSchema> {
        let major = record.schema_version.split('.').next().unwrap_or_default();
        let supported = SCHEMA_VERSION.split('.').next().unwrap_or_default();
        if major != supported {
            return Err(SchemaError::UnsupportedSchemaVersion(
                record.schema_version.clone(),
            ));
        }

        let mut schema = TableSchema::new(record.name.clone(), record.use_standard_tags);
        schema.metadata = record.metadata.clone();

        for column_record in &record.columns {
            if column_record.semantic_tags.contains(INDEX_TAG)
                || column_record.semantic_tags.contains(TIME_INDEX_TAG)
            {
                return Err(SchemaError::ReservedTag(
                    "a persisted tag set may not carry index tags".to_string(),
                ));
            }

            let mut ltype = type_system.resolve(&column_record.logical_type.name)?.clone();
            if let Some(params) = &column_record.logical_type.params {
                ltype.params = Some(params.clone());
            }
            let standard = if record.use_standard_tags {
                ltype.standard_tags.clone()
            } else {
                BTreeSet::new()
            };

            let mut column = ColumnSchema::new(ltype, record.use_standard_tags);
            let removed: Vec<String> = standard
                .difference(&column_record.semantic_tags)
                .cloned()
                .collect();
            if !removed.is_empty() {
                column.remove_semantic_tags(removed)?;
            }
            let added: Vec<String> = column_record
                .semantic_tags
                .difference(&standard)
                .cloned()
                .collect();
            if !added.is_empty() {
                column.add_semantic_tags(added)?;
            }
            column.set_description(column_record.description.clone());
            *column.metadata_mut() = column_record.metadata.clone();

            schema.add_column(column_record.name.clone(), column)?;
        }

        if let Some(time_index) = &record.time_index {
            schema.set_time_index(Some(time_index))?;
        }
        if let Some(index) = &record.index {
            schema.set_index(Some(index), None)?;
        }
        Ok(schema)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(type_system: &TypeSystem, json: &str) -> Result<TableSchema> {
        let record: SchemaRecord = serde_json::from_str(json)?;
        Self::from_record(type_system, &record)
    }
}
