//! Column- and table-level schema containers.

mod column;
mod serialize;
mod table;

pub use column::{ColumnSchema, INDEX_TAG, TIME_INDEX_TAG};
pub use serialize::{ColumnRecord, SchemaRecord, TypeRecord, SCHEMA_VERSION};
pub use table::{SchemaInit, TableSchema};
