//! Column-level schema: a logical type plus partitioned semantic tags.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SchemaError};
use crate::typesys::LogicalType;

/// Reserved tag marking the table's index column.
pub const INDEX_TAG: &str = "index";

/// Reserved tag marking the table's time index column.
pub const TIME_INDEX_TAG: &str = "time_index";

/// Index designation held by a column. Settable only through the owning
/// table schema, never by direct tag mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReservedRole {
    Index,
    TimeIndex,
}

impl ReservedRole {
    fn tag(&self) -> &'static str {
        match self {
            ReservedRole::Index => INDEX_TAG,
            ReservedRole::TimeIndex => TIME_INDEX_TAG,
        }
    }
}

/// Typing unit for a single column.
///
/// Semantic tags are partitioned: standard tags come from the logical type
/// and are suppressed while the column is an index; user tags are free-form;
/// the reserved `index`/`time_index` tags are managed by the owning
/// [`TableSchema`](super::TableSchema).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    logical_type: LogicalType,
    use_standard_tags: bool,
    standard_tags: BTreeSet<String>,
    user_tags: BTreeSet<String>,
    role: Option<ReservedRole>,
    nullable: bool,
    description: Option<String>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl ColumnSchema {
    pub fn new(logical_type: LogicalType, use_standard_tags: bool) -> Self {
        let standard_tags = if use_standard_tags {
            logical_type.standard_tags.clone()
        } else {
            BTreeSet::new()
        };
        let nullable = logical_type.primary.is_nullable();
        Self {
            logical_type,
            use_standard_tags,
            standard_tags,
            user_tags: BTreeSet::new(),
            role: None,
            nullable,
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// Whether the column's storage representation admits missing values.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn use_standard_tags(&self) -> bool {
        self.use_standard_tags
    }

    pub fn is_index(&self) -> bool {
        self.role == Some(ReservedRole::Index)
    }

    pub fn is_time_index(&self) -> bool {
        self.role == Some(ReservedRole::TimeIndex)
    }

    /// The full semantic tag set: standard, user, and reserved tags.
    pub fn semantic_tags(&self) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self.standard_tags.clone();
        tags.extend(self.user_tags.iter().cloned());
        if let Some(role) = self.role {
            tags.insert(role.tag().to_string());
        }
        tags
    }

    /// Replace the logical type, recomputing standard tags and nullability.
    /// User tags are kept.
    pub fn set_type(&mut self, logical_type: LogicalType) {
        self.nullable = logical_type.primary.is_nullable();
        self.standard_tags = if self.use_standard_tags && self.role != Some(ReservedRole::Index) {
            logical_type.standard_tags.clone()
        } else {
            BTreeSet::new()
        };
        self.logical_type = logical_type;
    }

    /// Add user tags. Reserved tags are rejected, as is any tag mutation on
    /// a column currently designated index/time-index.
    pub fn add_semantic_tags<I, S>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.check_mutable(&tags)?;
        for tag in tags {
            // A tag the type already applies stays a standard tag, so the
            // partition reconstructs exactly from the flat persisted set.
            if !self.standard_tags.contains(&tag) {
                self.user_tags.insert(tag);
            }
        }
        Ok(())
    }

    /// Remove tags from the standard or user set. Unknown tags fail.
    pub fn remove_semantic_tags<I, S>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.check_mutable(&tags)?;
        for tag in &tags {
            if !self.standard_tags.contains(tag) && !self.user_tags.contains(tag) {
                return Err(SchemaError::UnknownTag(tag.clone()));
            }
        }
        for tag in &tags {
            self.standard_tags.remove(tag);
            self.user_tags.remove(tag);
        }
        Ok(())
    }

    /// Clear user tags and reapply the type's standard tags if enabled.
    pub fn reset_semantic_tags(&mut self) {
        self.user_tags.clear();
        self.standard_tags = if self.use_standard_tags && self.role != Some(ReservedRole::Index) {
            self.logical_type.standard_tags.clone()
        } else {
            BTreeSet::new()
        };
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, serde_json::Value> {
        &mut self.metadata
    }

    pub(crate) fn role(&self) -> Option<ReservedRole> {
        self.role
    }

    /// Set or clear the index designation. Index columns have their standard
    /// tags suppressed; leaving the designation reinstates them.
    pub(crate) fn set_role(&mut self, role: Option<ReservedRole>) {
        self.role = role;
        self.standard_tags = if self.use_standard_tags && role != Some(ReservedRole::Index) {
            self.logical_type.standard_tags.clone()
        } else {
            BTreeSet::new()
        };
    }

    /// Replace the user tag set wholesale; used by batched table updates.
    pub(crate) fn replace_user_tags(&mut self, tags: BTreeSet<String>) {
        self.user_tags = tags
            .into_iter()
            .filter(|t| !self.standard_tags.contains(t))
            .collect();
    }

    fn check_mutable(&self, tags: &[String]) -> Result<()> {
        for tag in tags {
            if tag == INDEX_TAG || tag == TIME_INDEX_TAG {
                return Err(SchemaError::ReservedTag(tag.clone()));
            }
        }
        if let Some(role) = self.role {
            return Err(SchemaError::ReservedTag(role.tag().to_string()));
        }
        Ok(())
    }
}
