//! The logical type registry and its relationship forest.
//!
//! Types are nodes in a directed graph with parent -> child edges; a child
//! is a more specific version of its parent, and that ordering drives
//! inference. Unregistering a type never removes its node (already-applied
//! schemas keep resolving it); it drops the node's edges and clears its
//! registered flag. Node indices therefore stay valid for the lifetime of
//! the registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use inflector::Inflector;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::sample::ValueSample;

use super::builtins;
use super::logical_type::LogicalType;

/// Predicate deciding whether a logical type matches a value sample.
pub type InferenceFn = Arc<dyn Fn(&dyn ValueSample, &Config) -> bool + Send + Sync>;

pub(crate) struct TypeEntry {
    pub(crate) ltype: LogicalType,
    pub(crate) registered: bool,
    /// Registration sequence number; the inference tie-break order.
    pub(crate) seq: u64,
    pub(crate) inference: Option<InferenceFn>,
}

/// Registry of logical types plus their relationship forest.
pub struct TypeSystem {
    pub(crate) graph: DiGraph<TypeEntry, ()>,
    by_name: HashMap<String, NodeIndex>,
    next_seq: u64,
}

impl TypeSystem {
    /// An empty registry. Only the built-in baseline constructor uses this;
    /// everyone else starts from [`TypeSystem::default`].
    pub(crate) fn empty() -> Self {
        Self {
            graph: DiGraph::new(),
            by_name: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Register a new logical type.
    ///
    /// Re-adding a previously removed type re-registers it with a fresh
    /// sequence number. Fails with [`SchemaError::DuplicateType`] when the
    /// name is currently registered and [`SchemaError::UnknownParent`] when
    /// `parent` does not name a registered type.
    pub fn add_type(
        &mut self,
        ltype: LogicalType,
        inference: Option<InferenceFn>,
        parent: Option<&str>,
    ) -> Result<()> {
        let parent_ix = match parent {
            Some(p) => Some(
                self.registered_index(p)
                    .ok_or_else(|| SchemaError::UnknownParent(p.to_string()))?,
            ),
            None => None,
        };

        if let Some(&ix) = self.by_name.get(&ltype.name) {
            if self.graph[ix].registered {
                return Err(SchemaError::DuplicateType(ltype.name));
            }
            let seq = self.bump_seq();
            let entry = &mut self.graph[ix];
            entry.ltype = ltype;
            entry.registered = true;
            entry.seq = seq;
            entry.inference = inference;
            if let Some(p) = parent_ix {
                self.graph.add_edge(p, ix, ());
            }
            return Ok(());
        }

        let seq = self.bump_seq();
        let name = ltype.name.clone();
        let ix = self.graph.add_node(TypeEntry {
            ltype,
            registered: true,
            seq,
            inference,
        });
        self.by_name.insert(name, ix);
        if let Some(p) = parent_ix {
            self.graph.add_edge(p, ix, ());
        }
        Ok(())
    }

    /// Mark a type unregistered, reparenting its children to its former
    /// parent so the remaining hierarchy keeps its depth ordering.
    pub fn remove_type(&mut self, name: &str) -> Result<()> {
        let ix = self
            .registered_index(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        if name == builtins::UNKNOWN {
            return Err(SchemaError::ReservedType(name.to_string()));
        }

        let parent = self.parent_index(ix);
        let children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(ix, Direction::Outgoing)
            .collect();

        self.graph.retain_edges(|g, e| match g.edge_endpoints(e) {
            Some((a, b)) => a != ix && b != ix,
            None => true,
        });
        if let Some(p) = parent {
            for child in children {
                self.graph.add_edge(p, child, ());
            }
        }
        self.graph[ix].registered = false;
        Ok(())
    }

    /// Change a type's parent. `None` makes it a root.
    pub fn update_relationship(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        let ix = self
            .registered_index(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        if name == builtins::UNKNOWN {
            return Err(SchemaError::ReservedType(name.to_string()));
        }

        let parent_ix = match parent {
            Some(p) => Some(
                self.registered_index(p)
                    .ok_or_else(|| SchemaError::UnknownParent(p.to_string()))?,
            ),
            None => None,
        };

        // Walking up from the proposed parent must not reach the type itself.
        if let Some(start) = parent_ix {
            let mut path = vec![name.to_string()];
            let mut cursor = Some(start);
            while let Some(cur) = cursor {
                path.push(self.graph[cur].ltype.name.clone());
                if cur == ix {
                    return Err(SchemaError::RelationshipCycle(path));
                }
                cursor = self.parent_index(cur);
            }
        }

        if let Some(old_parent) = self.parent_index(ix) {
            if let Some(edge) = self.graph.find_edge(old_parent, ix) {
                self.graph.remove_edge(edge);
            }
        }
        if let Some(p) = parent_ix {
            self.graph.add_edge(p, ix, ());
        }
        Ok(())
    }

    /// Replace the inference predicate for a type. `None` disables automatic
    /// matching; the type stays assignable explicitly.
    pub fn update_inference_function(
        &mut self,
        name: &str,
        inference: Option<InferenceFn>,
    ) -> Result<()> {
        let ix = self
            .registered_index(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        self.graph[ix].inference = inference;
        Ok(())
    }

    /// Restore the built-in baseline: user-added types are gone, removed
    /// built-ins are back, relationships and inference functions reset.
    /// Idempotent.
    pub fn reset_defaults(&mut self) {
        *self = builtins::default_type_system();
    }

    /// Look up a type by exact name. Resolves removed types too.
    pub fn get(&self, name: &str) -> Option<&LogicalType> {
        self.by_name.get(name).map(|&ix| &self.graph[ix].ltype)
    }

    /// Look up a registered type by user-facing name, tolerating case and
    /// separator differences ("email_address" resolves `EmailAddress`).
    pub fn resolve(&self, name: &str) -> Result<&LogicalType> {
        if let Some(ix) = self.registered_index(name) {
            return Ok(&self.graph[ix].ltype);
        }
        let wanted = normalize_type_name(name);
        self.graph
            .node_indices()
            .find(|&ix| {
                self.graph[ix].registered
                    && normalize_type_name(&self.graph[ix].ltype.name) == wanted
            })
            .map(|ix| &self.graph[ix].ltype)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered_index(name).is_some()
    }

    /// Registered types in registration order.
    pub fn registered_types(&self) -> Vec<&LogicalType> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&ix| self.graph[ix].registered)
            .collect();
        nodes.sort_by_key(|&ix| self.graph[ix].seq);
        nodes.into_iter().map(|ix| &self.graph[ix].ltype).collect()
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        let ix = self.registered_index(name)?;
        self.parent_index(ix)
            .map(|p| self.graph[p].ltype.name.as_str())
    }

    /// Registered children of a type, in registration order.
    pub fn children_of(&self, name: &str) -> Vec<&str> {
        match self.registered_index(name) {
            Some(ix) => self
                .child_indices(ix)
                .into_iter()
                .map(|c| self.graph[c].ltype.name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Depth of a registered type in the forest; roots are depth 0.
    pub fn depth_of(&self, name: &str) -> Option<usize> {
        let mut depth = 0;
        let mut cursor = self.registered_index(name)?;
        while let Some(parent) = self.parent_index(cursor) {
            depth += 1;
            cursor = parent;
        }
        Some(depth)
    }

    /// Registered root types in registration order.
    pub(crate) fn roots(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&ix| self.graph[ix].registered && self.parent_index(ix).is_none())
            .collect();
        nodes.sort_by_key(|&ix| self.graph[ix].seq);
        nodes
    }

    /// Registered child node indices, in registration order.
    pub(crate) fn child_indices(&self, ix: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(ix, Direction::Outgoing)
            .filter(|&c| self.graph[c].registered)
            .collect();
        children.sort_by_key(|&c| self.graph[c].seq);
        children
    }

    fn registered_index(&self, name: &str) -> Option<NodeIndex> {
        self.by_name
            .get(name)
            .copied()
            .filter(|&ix| self.graph[ix].registered)
    }

    fn parent_index(&self, ix: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(ix, Direction::Incoming)
            .next()
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        builtins::default_type_system()
    }
}

impl fmt::Debug for TypeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&str, Option<&str>)> = Vec::new();
        for lt in self.registered_types() {
            entries.push((lt.name.as_str(), self.parent_of(&lt.name)));
        }
        f.debug_struct("TypeSystem")
            .field("registered", &entries)
            .finish()
    }
}

/// Case/format-normalized type name: "EmailAddress", "email_address", and
/// "emailAddress" all normalize identically.
pub(crate) fn normalize_type_name(name: &str) -> String {
    name.to_snake_case().replace('_', "")
}
