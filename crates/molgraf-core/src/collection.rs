//! An ordered, in-memory collection of graph records.
//!
//! Insertion order is significant: it defines the sample index. Records
//! are held behind shared handles so that a selection is a view onto the
//! same graphs, not a copy; the core is single-threaded by design and the
//! handles are never sent across threads.
//!
//! The whole dataset lives in process memory. There is no eviction or
//! streaming; this is a stated design limitation, not a bug.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use tracing::{info, warn};

use crate::error::{GraphError, Result};
use crate::record::GraphRecord;
use crate::topology::GraphOp;
use crate::value::GraphValue;

/// Shared handle to one graph record.
pub type GraphHandle = Rc<RefCell<GraphRecord>>;

/// How to select records from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single record by position.
    Index(usize),
    /// A contiguous range of positions.
    Range(Range<usize>),
    /// An explicit list of positions, in order, repeats allowed.
    List(Vec<usize>),
}

/// Ordered list of graph records with bulk property access.
#[derive(Debug, Clone, Default)]
pub struct GraphCollection {
    graphs: Vec<GraphHandle>,
}

impl GraphCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the collection to `length` blank records.
    pub fn empty(&mut self, length: usize) {
        self.graphs = (0..length)
            .map(|_| Rc::new(RefCell::new(GraphRecord::new())))
            .collect();
    }

    /// Append a record.
    pub fn push(&mut self, record: GraphRecord) {
        self.graphs.push(Rc::new(RefCell::new(record)));
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Shared handle to the record at `index`.
    pub fn get(&self, index: usize) -> Option<GraphHandle> {
        self.graphs.get(index).cloned()
    }

    /// Iterate over record handles in order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphHandle> {
        self.graphs.iter()
    }

    /// Assign one value per record under `key`. A `None` entry skips
    /// its record.
    ///
    /// An empty collection is first initialized to `values.len()` blank
    /// records. Against a non-empty collection the lengths must match;
    /// otherwise nothing is assigned.
    pub fn assign(&mut self, key: &str, values: Vec<Option<GraphValue>>) -> Result<()> {
        if self.graphs.is_empty() {
            self.empty(values.len());
        }
        if self.graphs.len() != values.len() {
            return Err(GraphError::LengthMismatch {
                expected: self.graphs.len(),
                got: values.len(),
            });
        }
        for (handle, value) in self.graphs.iter().zip(values) {
            handle.borrow_mut().assign_opt(key, value)?;
        }
        Ok(())
    }

    /// Collect each record's value for `key`, `None` where absent.
    ///
    /// Returns `None` (with a logged warning) when the property is set
    /// on no record at all; callers must treat "entirely unset"
    /// differently from "some records missing it".
    pub fn retrieve(&self, key: &str) -> Option<Vec<Option<GraphValue>>> {
        let values: Vec<Option<GraphValue>> = self
            .graphs
            .iter()
            .map(|g| g.borrow().get(key).cloned())
            .collect();
        if values.iter().all(Option::is_none) {
            warn!(key, "property is not set on any graph");
            return None;
        }
        Some(values)
    }

    /// A new collection sharing the selected records.
    ///
    /// Mutation through the returned view mutates the originals.
    pub fn select(&self, selector: &Selector) -> Result<GraphCollection> {
        let pick = |i: usize| -> Result<GraphHandle> {
            self.graphs
                .get(i)
                .cloned()
                .ok_or_else(|| GraphError::UnsupportedSelector(format!(
                    "index {} out of range for collection of length {}",
                    i,
                    self.graphs.len()
                )))
        };
        let graphs = match selector {
            Selector::Index(i) => vec![pick(*i)?],
            Selector::Range(range) => range.clone().map(pick).collect::<Result<Vec<_>>>()?,
            Selector::List(indices) => indices.iter().map(|&i| pick(i)).collect::<Result<Vec<_>>>()?,
        };
        Ok(GraphCollection { graphs })
    }

    /// Apply a topology operation to every record in order.
    ///
    /// The first failing record stops the pass and the error propagates;
    /// there is no partial-success continuation. Callers needing
    /// robustness pre-[`clean`](Self::clean) the collection.
    pub fn map_each(&self, op: &GraphOp) -> Result<()> {
        for handle in &self.graphs {
            op.apply(&mut handle.borrow_mut())?;
        }
        Ok(())
    }

    /// Remove records invalid for any of the `required` keys.
    ///
    /// A record is invalid for a key when the value is absent or has
    /// zero rows. The union of invalid indices over all keys is removed
    /// in descending order, so earlier removals do not shift later ones.
    /// Returns the removed indices (descending).
    pub fn clean(&mut self, required: &[&str]) -> Vec<usize> {
        let mut invalid: Vec<usize> = Vec::new();
        for &key in required {
            let Some(values) = self.retrieve(key) else {
                warn!(key, "can not clean property, it is not assigned to any graph");
                continue;
            };
            for (i, value) in values.iter().enumerate() {
                match value {
                    None => {
                        info!(key, graph = i, "property not defined for graph");
                        invalid.push(i);
                    }
                    Some(v) if v.rows() == 0 => {
                        info!(key, graph = i, "property has zero length for graph");
                        invalid.push(i);
                    }
                    Some(_) => {}
                }
            }
        }
        invalid.sort_unstable();
        invalid.dedup();
        invalid.reverse();
        if !invalid.is_empty() {
            warn!(removed = ?invalid, "removing invalid graphs from collection");
        }
        for &i in &invalid {
            self.graphs.remove(i);
        }
        invalid
    }
}
