//! Logical type descriptors and storage representations.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical storage representation for column data.
///
/// A logical type mandates one primary representation; the backend is asked
/// to coerce column data into it. The optional backup representation is used
/// when the backend cannot hold the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Bool,
    Int64,
    Float64,
    Utf8,
    Categorical,
    Datetime,
    Timedelta,
    /// Untyped fallback representation.
    Object,
}

impl StorageKind {
    /// Whether the representation admits missing values.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, StorageKind::Bool | StorageKind::Int64)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, StorageKind::Int64 | StorageKind::Float64)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, StorageKind::Datetime)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageKind::Bool => "bool",
            StorageKind::Int64 => "int64",
            StorageKind::Float64 => "float64",
            StorageKind::Utf8 => "utf8",
            StorageKind::Categorical => "categorical",
            StorageKind::Datetime => "datetime",
            StorageKind::Timedelta => "timedelta",
            StorageKind::Object => "object",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-type parameters carried by a logical type instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeParams {
    /// Explicit value ordering for an ordinal type.
    Ordinal { order: Vec<String> },
}

/// A registered logical type descriptor.
///
/// Plain data: the inference function associated with a type lives in the
/// registry, not here, so descriptors can be cloned freely into column
/// schemas and persisted records.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalType {
    /// Unique name among registered types.
    pub name: String,
    /// Representation column data is coerced to.
    pub primary: StorageKind,
    /// Representation used when the backend cannot hold the primary one.
    pub backup: Option<StorageKind>,
    /// Tags applied automatically to columns of this type.
    pub standard_tags: BTreeSet<String>,
    pub params: Option<TypeParams>,
}

impl LogicalType {
    pub fn new(name: impl Into<String>, primary: StorageKind) -> Self {
        Self {
            name: name.into(),
            primary,
            backup: None,
            standard_tags: BTreeSet::new(),
            params: None,
        }
    }

    pub fn with_backup(mut self, backup: StorageKind) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn with_standard_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.standard_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params(mut self, params: TypeParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn is_numeric(&self) -> bool {
        self.primary.is_numeric()
    }

    pub fn is_temporal(&self) -> bool {
        self.primary.is_temporal()
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
