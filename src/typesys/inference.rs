//! Breadth-first inference of the most specific matching logical type.

use petgraph::graph::NodeIndex;
use tracing::warn;

use crate::config::Config;
use crate::sample::ValueSample;

use super::builtins;
use super::logical_type::{LogicalType, StorageKind};
use super::registry::TypeSystem;

impl TypeSystem {
    /// Determine the most specific registered type matching a value sample.
    ///
    /// Walks the relationship forest breadth-first from the roots. At each
    /// level the inference functions of the frontier types are evaluated;
    /// matching types gate descent into their children, and the last level
    /// that produced at least one match decides the result. Within a level
    /// the first match in registration order wins; a level with several
    /// matches is reported as a configuration smell via `tracing::warn!`.
    ///
    /// Never fails: an empty or unmatched sample infers the fallback type.
    pub fn infer(&self, sample: &dyn ValueSample, config: &Config) -> LogicalType {
        if sample.non_null_count() == 0 {
            return self.fallback();
        }

        let mut frontier = self.roots();
        let mut last_matches: Vec<NodeIndex> = Vec::new();
        while !frontier.is_empty() {
            let mut matches: Vec<NodeIndex> = Vec::new();
            for &ix in &frontier {
                let entry = &self.graph[ix];
                if let Some(inference) = &entry.inference {
                    if inference(sample, config) {
                        matches.push(ix);
                    }
                }
            }
            if matches.is_empty() {
                break;
            }

            let mut next: Vec<NodeIndex> = matches
                .iter()
                .flat_map(|&ix| self.child_indices(ix))
                .collect();
            next.sort_by_key(|&ix| self.graph[ix].seq);
            next.dedup();

            last_matches = matches;
            frontier = next;
        }

        match last_matches.as_slice() {
            [] => self.fallback(),
            [winner] => self.graph[*winner].ltype.clone(),
            several => {
                let names: Vec<&str> = several
                    .iter()
                    .map(|&ix| self.graph[ix].ltype.name.as_str())
                    .collect();
                warn!(
                    candidates = ?names,
                    "ambiguous inference: multiple types matched at the same depth, \
                     keeping the first registered"
                );
                self.graph[several[0]].ltype.clone()
            }
        }
    }

    fn fallback(&self) -> LogicalType {
        self.get(builtins::UNKNOWN)
            .cloned()
            .unwrap_or_else(|| LogicalType::new(builtins::UNKNOWN, StorageKind::Utf8))
    }
}
