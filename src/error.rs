//! Unified error type for registry, schema, and config operations.
//!
//! Validator verdicts are not errors: they are advisory diagnostics returned
//! as plain messages (see [`crate::validate`]). Everything here is a
//! synchronous, validate-then-apply rejection that leaves the mutated
//! structure unchanged.

use std::path::PathBuf;

use crate::typesys::StorageKind;

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Error type covering registry, schema, serialization, and config failures.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("logical type '{0}' is already registered")]
    DuplicateType(String),

    #[error("unknown logical type: '{0}'")]
    UnknownType(String),

    #[error("unknown parent type: '{0}'")]
    UnknownParent(String),

    #[error("relationship cycle: {}", .0.join(" -> "))]
    RelationshipCycle(Vec<String>),

    #[error("the fallback type '{0}' cannot be removed or reparented")]
    ReservedType(String),

    #[error("unknown column: '{0}'")]
    UnknownColumn(String),

    #[error("duplicate column name: '{0}'")]
    DuplicateColumn(String),

    /// Direct mutation of the `index`/`time_index` tags, or any tag mutation
    /// on a column currently designated as an index.
    #[error("semantic tag '{0}' is reserved and only settable through the table schema index operations")]
    ReservedTag(String),

    #[error("semantic tag '{0}' is not present on the column")]
    UnknownTag(String),

    #[error("cannot assign type '{ltype}' to column '{column}': {reason}")]
    TypeMismatch {
        column: String,
        ltype: String,
        reason: String,
    },

    #[error("index column '{0}' contains duplicate values")]
    IndexNotUnique(String),

    #[error("time index column '{column}' must have a temporal or numeric representation, found {storage}")]
    InvalidTimeIndex {
        column: String,
        storage: StorageKind,
    },

    #[error("rename collision: '{0}'")]
    RenameCollision(String),

    #[error("unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    #[error("invalid inference pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("schema record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
