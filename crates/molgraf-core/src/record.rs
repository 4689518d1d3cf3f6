//! A single graph as a mapping of role-tagged attribute arrays.
//!
//! Attribute names carry their role in a fixed prefix: `node_`, `edge_`,
//! `graph_`, `range_` and `angle_`. The role is parsed and validated once
//! on assignment instead of being re-matched on every access. Range
//! attributes are geometric (distance-based) connections, kept separate
//! from topological bond edges so both can coexist on one graph.
//!
//! The record enforces no schema beyond the role prefix; which attributes
//! must exist and how they relate is the responsibility of the topology
//! operations in [`crate::topology`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::value::GraphValue;

/// Role of a graph attribute, encoded as its key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrRole {
    /// Per-node data (`node_*`).
    Node,
    /// Topological edge data (`edge_*`).
    Edge,
    /// Whole-graph data (`graph_*`).
    Graph,
    /// Geometric range-connection data (`range_*`).
    Range,
    /// Angle-triple data (`angle_*`).
    Angle,
}

impl AttrRole {
    /// All roles, in prefix order.
    pub const ALL: [AttrRole; 5] = [
        AttrRole::Node,
        AttrRole::Edge,
        AttrRole::Graph,
        AttrRole::Range,
        AttrRole::Angle,
    ];

    /// Key prefix for this role.
    pub fn prefix(self) -> &'static str {
        match self {
            AttrRole::Node => "node_",
            AttrRole::Edge => "edge_",
            AttrRole::Graph => "graph_",
            AttrRole::Range => "range_",
            AttrRole::Angle => "angle_",
        }
    }

    /// Parse the role of an attribute key from its prefix.
    pub fn of_key(key: &str) -> Option<AttrRole> {
        AttrRole::ALL
            .into_iter()
            .find(|role| key.starts_with(role.prefix()))
    }

    /// Key of the index array for this role, e.g. `edge_indices`.
    pub fn indices_key(self) -> String {
        format!("{}indices", self.prefix())
    }
}

/// One graph: named, role-tagged attribute arrays.
///
/// Values are always array-typed ([`GraphValue`] coerces scalars and
/// vectors on the way in). Any attribute name is accepted as long as it
/// carries a known role prefix; overwriting is allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    attrs: BTreeMap<String, GraphValue>,
}

impl GraphRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a raw attribute map, validating every key.
    pub fn from_attrs(attrs: BTreeMap<String, GraphValue>) -> Result<Self> {
        for key in attrs.keys() {
            if AttrRole::of_key(key).is_none() {
                return Err(GraphError::UnknownRole(key.clone()));
            }
        }
        Ok(Self { attrs })
    }

    /// Store `value` under `key`. Overwrites silently.
    ///
    /// The key must carry a role prefix; the value is coerced into an
    /// array on the way in.
    pub fn assign(&mut self, key: &str, value: impl Into<GraphValue>) -> Result<()> {
        if AttrRole::of_key(key).is_none() {
            return Err(GraphError::UnknownRole(key.to_string()));
        }
        self.attrs.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Store `value` under `key` if present; `None` is a no-op.
    pub fn assign_opt(&mut self, key: &str, value: Option<GraphValue>) -> Result<()> {
        match value {
            Some(v) => self.assign(key, v),
            None => Ok(()),
        }
    }

    /// Look up an attribute. Absence is a valid query result, not an error.
    pub fn get(&self, key: &str) -> Option<&GraphValue> {
        self.attrs.get(key)
    }

    /// Whether the attribute exists.
    pub fn contains(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Remove an attribute, returning it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<GraphValue> {
        self.attrs.remove(key)
    }

    /// Iterate over all attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GraphValue)> {
        self.attrs.iter()
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether the record holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Clone out the raw attribute map (used by persistence).
    pub fn to_attrs(&self) -> BTreeMap<String, GraphValue> {
        self.attrs.clone()
    }

    /// The 2-column index array of a role, e.g. `edge_indices`.
    ///
    /// Fails with [`GraphError::MissingIndices`] when absent; this is the
    /// precondition of every topology operation.
    pub fn indices(&self, role: AttrRole) -> Result<ndarray::Array2<i64>> {
        let key = role.indices_key();
        let value = self.attrs.get(&key).ok_or_else(|| GraphError::MissingIndices {
            prefix: role.prefix().to_string(),
        })?;
        value.to_index2(&key)
    }

    /// Node coordinates `(n, dim)`, if assigned.
    ///
    /// Missing coordinates are a soft condition (geometry operations log
    /// and skip); a present but malformed array is a hard error.
    pub fn coordinates(&self) -> Result<Option<ndarray::Array2<f32>>> {
        match self.attrs.get("node_coordinates") {
            None => Ok(None),
            Some(v) => v.to_float2("node_coordinates").map(Some),
        }
    }

    /// All keys carrying `role`, with the index key first.
    ///
    /// Operations that reorder or extend index rows apply the identical
    /// change to every key returned here, preserving row correspondence.
    pub fn keys_with_role(&self, role: AttrRole) -> Vec<String> {
        let indices_key = role.indices_key();
        let mut keys: Vec<String> = Vec::new();
        if self.attrs.contains_key(&indices_key) {
            keys.push(indices_key.clone());
        }
        keys.extend(
            self.attrs
                .keys()
                .filter(|k| AttrRole::of_key(k) == Some(role) && **k != indices_key)
                .cloned(),
        );
        keys
    }
}
