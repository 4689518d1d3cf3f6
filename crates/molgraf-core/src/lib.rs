#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! In-memory graph containers and disjoint batching for molecular GNN data.
//!
//! This crate holds the framework-independent data layer of a molecular
//! graph-learning pipeline:
//!
//! - [`GraphRecord`] - one graph as named, role-tagged attribute arrays
//!   (`node_*`, `edge_*`, `graph_*`, `range_*`, `angle_*`)
//! - topology operations ([`topology`]) - reverse-edge maps, undirected
//!   completion, self-loops, index sorting, symmetric weight rescaling,
//!   distance-based range connections and angle enumeration
//! - [`GraphCollection`] - an ordered in-memory list of records with bulk
//!   assignment, shared-view selection, mapping and cleaning
//! - [`DisjointBatcher`] - variable-sized graphs batched as one combined
//!   graph via node-id offsetting, no padding
//!
//! # Example
//!
//! ```rust
//! use molgraf_core::{AttrRole, GraphCollection, GraphOp, GraphRecord};
//! use ndarray::array;
//!
//! let mut graph = GraphRecord::new();
//! graph.assign("edge_indices", array![[0i64, 1], [1, 2]])?;
//! graph.assign("node_coordinates", array![[0.0f32, 0.0, 0.0],
//!                                          [1.0, 0.0, 0.0],
//!                                          [2.0, 0.0, 0.0]])?;
//!
//! let mut data = GraphCollection::new();
//! data.push(graph);
//! data.map_each(&GraphOp::MakeUndirectedEdges {
//!     role: AttrRole::Edge,
//!     remove_duplicates: true,
//!     sort: true,
//! })?;
//! data.map_each(&GraphOp::SetRange {
//!     max_distance: 1.5,
//!     max_neighbours: 10,
//!     do_invert_distance: false,
//!     self_loops: false,
//!     exclusive: true,
//! })?;
//! # Ok::<(), molgraf_core::GraphError>(())
//! ```

pub mod batch;
pub mod collection;
pub mod error;
pub mod record;
pub mod topology;
pub mod value;

pub use batch::{DisjointBatch, DisjointBatcher, EpochIter, TensorRole, TensorSpec};
pub use collection::{GraphCollection, GraphHandle, Selector};
pub use error::{GraphError, Result};
pub use record::{AttrRole, GraphRecord};
pub use topology::GraphOp;
pub use value::{DType, GraphValue};
