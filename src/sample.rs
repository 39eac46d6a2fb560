//! Capability interface over a column value sample.
//!
//! Inference functions are defined against this trait so the core stays
//! agnostic to which backend produced the sample. A backend hands the core
//! a bounded, representative sample; how it was obtained (full scan,
//! partition head, reservoir) is not the core's concern.

use std::collections::HashSet;

use crate::typesys::StorageKind;
use crate::value::Value;

/// A bounded sample of one column's values.
pub trait ValueSample {
    /// Total number of sampled values, nulls included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The storage representation the backend currently holds this column in.
    fn storage(&self) -> StorageKind;

    /// Iterate the non-null values in the sample.
    fn non_null(&self) -> Box<dyn Iterator<Item = &Value> + '_>;

    fn non_null_count(&self) -> usize {
        self.non_null().count()
    }

    /// Number of distinct non-null values.
    fn unique_count(&self) -> usize {
        self.non_null().collect::<HashSet<_>>().len()
    }
}

/// A sample backed by a plain vector of values.
#[derive(Debug, Clone, PartialEq)]
pub struct VecSample {
    storage: StorageKind,
    values: Vec<Value>,
}

impl VecSample {
    pub fn new(storage: StorageKind, values: Vec<Value>) -> Self {
        Self { storage, values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl ValueSample for VecSample {
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
