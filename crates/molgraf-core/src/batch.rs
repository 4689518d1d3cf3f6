//! Disjoint batching: many variable-sized graphs as one combined graph.
//!
//! A batch of graphs is represented without padding by concatenating all
//! node (and edge) arrays along the row axis and offsetting every edge
//! index pair by the cumulative node count of the preceding graphs. The
//! local edge `(i, j)` of graph `g` becomes `(i + offset(g), j + offset(g))`
//! in the combined node array; this offset rewrite is the correctness-
//! critical transform of the whole layer.
//!
//! Alongside the concatenated tensors each batch carries bookkeeping
//! arrays: per-graph counts, a batch-id per row (which graph the row came
//! from) and a local id per row (position within its graph).

use ndarray::{concatenate, Array1, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use crate::collection::{GraphCollection, GraphHandle};
use crate::error::{GraphError, Result};
use crate::value::{DType, GraphValue};

/// Axis role of a batched tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorRole {
    /// One row per node; rows are concatenated across the batch.
    Node,
    /// One row per edge; rows are concatenated across the batch.
    Edge,
    /// One row per graph; rows are stacked, never offset.
    Graph,
}

/// Descriptor of one named attribute in the batch schema.
///
/// The schema is supplied by the model definition: attribute name,
/// element type, per-sample shape (excluding the batch/row axis), the
/// axis role, and whether this descriptor holds the edge/range index
/// pairs to be offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    /// Attribute key on each graph record.
    pub name: String,
    /// Axis role.
    pub role: TensorRole,
    /// Expected element type.
    pub dtype: DType,
    /// Per-sample shape without the leading row axis; `None` marks a
    /// dimension of variable size.
    pub shape: Vec<Option<usize>>,
    /// Whether this attribute holds index pairs to be offset.
    pub is_indices: bool,
}

impl TensorSpec {
    /// Node-level float attribute.
    pub fn node(name: impl Into<String>, shape: Vec<Option<usize>>) -> Self {
        Self {
            name: name.into(),
            role: TensorRole::Node,
            dtype: DType::F32,
            shape,
            is_indices: false,
        }
    }

    /// Edge-level float attribute.
    pub fn edge(name: impl Into<String>, shape: Vec<Option<usize>>) -> Self {
        Self {
            name: name.into(),
            role: TensorRole::Edge,
            dtype: DType::F32,
            shape,
            is_indices: false,
        }
    }

    /// Graph-level float attribute.
    pub fn graph(name: impl Into<String>, shape: Vec<Option<usize>>) -> Self {
        Self {
            name: name.into(),
            role: TensorRole::Graph,
            dtype: DType::F32,
            shape,
            is_indices: false,
        }
    }

    /// The edge/range index-pair attribute.
    pub fn indices(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: TensorRole::Edge,
            dtype: DType::I64,
            shape: vec![Some(2)],
            is_indices: true,
        }
    }

    /// Same descriptor with integer element type.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }
}

/// One training-ready batch. Ephemeral: derived per call, never persisted.
#[derive(Debug, Clone)]
pub struct DisjointBatch {
    /// Batched input tensors, in schema order.
    pub inputs: Vec<GraphValue>,
    /// Batched output (label) tensors, in schema order.
    pub outputs: Vec<GraphValue>,
    /// Graph position within the batch, repeated per node row.
    pub batch_id_node: Option<Array1<i64>>,
    /// Graph position within the batch, repeated per edge row.
    pub batch_id_edge: Option<Array1<i64>>,
    /// Node position within its own graph, restarting per graph.
    pub node_id: Option<Array1<i64>>,
    /// Edge position within its own graph, restarting per graph.
    pub edge_id: Option<Array1<i64>>,
    /// Node count per graph.
    pub count_nodes: Option<Array1<i64>>,
    /// Edge count per graph.
    pub count_edges: Option<Array1<i64>>,
    /// Collection indices of the samples composing this batch.
    pub sample_indices: Vec<usize>,
}

/// Converts collection slices into disjoint batches.
#[derive(Debug, Clone)]
pub struct DisjointBatcher {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
}

impl DisjointBatcher {
    /// Create a batcher over the given input/output schema.
    pub fn new(inputs: Vec<TensorSpec>, outputs: Vec<TensorSpec>) -> Self {
        Self {
            inputs,
            outputs,
            batch_size: 32,
            shuffle: false,
            seed: 42,
        }
    }

    /// Samples per batch; remainder samples form a final short batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Randomize sample order once per pass over the collection.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Seed for the shuffle permutation (reproducible epochs).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// One pass over the collection as an iterator of batches.
    pub fn epoch<'a>(&'a self, collection: &'a GraphCollection) -> EpochIter<'a> {
        self.epoch_with_seed(collection, self.seed)
    }

    /// One pass with an explicit shuffle seed (e.g. the epoch number).
    pub fn epoch_with_seed<'a>(&'a self, collection: &'a GraphCollection, seed: u64) -> EpochIter<'a> {
        let mut order: Vec<usize> = (0..collection.len()).collect();
        if self.shuffle {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }
        EpochIter {
            batcher: self,
            collection,
            order,
            cursor: 0,
        }
    }

    /// Assemble one batch from the given samples.
    pub fn build_batch(
        &self,
        collection: &GraphCollection,
        sample_indices: &[usize],
    ) -> Result<DisjointBatch> {
        let records: Vec<GraphHandle> = sample_indices
            .iter()
            .map(|&i| {
                collection.get(i).ok_or_else(|| {
                    GraphError::UnsupportedSelector(format!(
                        "batch sample index {} out of range",
                        i
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Gather raw per-graph values for every input spec.
        let mut gathered: Vec<Vec<GraphValue>> = Vec::with_capacity(self.inputs.len());
        for spec in &self.inputs {
            gathered.push(gather(&records, sample_indices, spec)?);
        }

        // Derive counts and id arrays from the first spec of each role.
        let mut count_nodes: Option<Vec<usize>> = None;
        let mut count_edges: Option<Vec<usize>> = None;
        for (spec, values) in self.inputs.iter().zip(&gathered) {
            let counts: Vec<usize> = values.iter().map(GraphValue::rows).collect();
            match spec.role {
                TensorRole::Node if count_nodes.is_none() => count_nodes = Some(counts),
                TensorRole::Edge if count_edges.is_none() => count_edges = Some(counts),
                _ => {}
            }
        }

        let has_indices = self.inputs.iter().any(|s| s.is_indices);
        if has_indices && count_nodes.is_none() {
            return Err(GraphError::BadSchema(
                "an indices descriptor requires at least one node-level descriptor".to_string(),
            ));
        }

        // Cumulative node offsets per graph.
        let offsets: Vec<i64> = count_nodes
            .as_ref()
            .map(|counts| {
                counts
                    .iter()
                    .scan(0i64, |acc, &c| {
                        let here = *acc;
                        *acc += c as i64;
                        Some(here)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut inputs = Vec::with_capacity(self.inputs.len());
        for (spec, values) in self.inputs.iter().zip(gathered) {
            let batched = if spec.is_indices {
                offset_and_concat(&values, &offsets, &spec.name)?
            } else {
                match spec.role {
                    TensorRole::Node | TensorRole::Edge => concat_rows(&values, &spec.name)?,
                    TensorRole::Graph => stack_rows(&values, &spec.name)?,
                }
            };
            if batched.dtype() != spec.dtype {
                return Err(GraphError::DTypeMismatch {
                    name: spec.name.clone(),
                    expected: spec.dtype.name(),
                });
            }
            inputs.push(batched);
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for spec in &self.outputs {
            let values = gather(&records, sample_indices, spec)?;
            let batched = match spec.role {
                TensorRole::Graph => stack_rows(&values, &spec.name)?,
                TensorRole::Node | TensorRole::Edge => concat_rows(&values, &spec.name)?,
            };
            outputs.push(batched);
        }

        let (batch_id_node, node_id, count_nodes) = id_arrays(count_nodes);
        let (batch_id_edge, edge_id, count_edges) = id_arrays(count_edges);

        Ok(DisjointBatch {
            inputs,
            outputs,
            batch_id_node,
            batch_id_edge,
            node_id,
            edge_id,
            count_nodes,
            count_edges,
            sample_indices: sample_indices.to_vec(),
        })
    }
}

/// Iterator over the batches of one pass.
pub struct EpochIter<'a> {
    batcher: &'a DisjointBatcher,
    collection: &'a GraphCollection,
    order: Vec<usize>,
    cursor: usize,
}

impl Iterator for EpochIter<'_> {
    type Item = Result<DisjointBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batcher.batch_size).min(self.order.len());
        let window = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        Some(self.batcher.build_batch(self.collection, &window))
    }
}

fn gather(
    records: &[GraphHandle],
    sample_indices: &[usize],
    spec: &TensorSpec,
) -> Result<Vec<GraphValue>> {
    records
        .iter()
        .zip(sample_indices)
        .map(|(handle, &index)| {
            handle
                .borrow()
                .get(&spec.name)
                .cloned()
                .ok_or_else(|| GraphError::MissingAttribute {
                    name: spec.name.clone(),
                    index,
                })
        })
        .collect()
}

/// Concatenate per-graph arrays along the row axis, in batch order.
fn concat_rows(values: &[GraphValue], name: &str) -> Result<GraphValue> {
    match values.first() {
        Some(GraphValue::Float(_)) => {
            let parts: Vec<_> = values
                .iter()
                .map(|v| v.as_float().map(|a| a.view()))
                .collect::<Option<_>>()
                .ok_or_else(|| mixed_dtype(name))?;
            Ok(GraphValue::Float(
                concatenate(Axis(0), &parts).map_err(|e| shape_error(name, &e))?,
            ))
        }
        Some(GraphValue::Int(_)) => {
            let parts: Vec<_> = values
                .iter()
                .map(|v| v.as_int().map(|a| a.view()))
                .collect::<Option<_>>()
                .ok_or_else(|| mixed_dtype(name))?;
            Ok(GraphValue::Int(
                concatenate(Axis(0), &parts).map_err(|e| shape_error(name, &e))?,
            ))
        }
        Some(GraphValue::Str(_)) => {
            let mut out = Vec::new();
            for v in values {
                out.extend(v.as_str_column().ok_or_else(|| mixed_dtype(name))?.iter().cloned());
            }
            Ok(GraphValue::Str(out))
        }
        None => Err(GraphError::BadSchema(format!(
            "can not batch '{}' from an empty sample window",
            name
        ))),
    }
}

/// Stack per-graph arrays into one row per graph (graph-level tensors).
fn stack_rows(values: &[GraphValue], name: &str) -> Result<GraphValue> {
    match values.first() {
        Some(GraphValue::Float(_)) => {
            let expanded: Vec<_> = values
                .iter()
                .map(|v| v.as_float().map(|a| a.clone().insert_axis(Axis(0))))
                .collect::<Option<_>>()
                .ok_or_else(|| mixed_dtype(name))?;
            let views: Vec<_> = expanded.iter().map(|a| a.view()).collect();
            Ok(GraphValue::Float(
                concatenate(Axis(0), &views).map_err(|e| shape_error(name, &e))?,
            ))
        }
        Some(GraphValue::Int(_)) => {
            let expanded: Vec<_> = values
                .iter()
                .map(|v| v.as_int().map(|a| a.clone().insert_axis(Axis(0))))
                .collect::<Option<_>>()
                .ok_or_else(|| mixed_dtype(name))?;
            let views: Vec<_> = expanded.iter().map(|a| a.view()).collect();
            Ok(GraphValue::Int(
                concatenate(Axis(0), &views).map_err(|e| shape_error(name, &e))?,
            ))
        }
        Some(GraphValue::Str(_)) => concat_rows(values, name),
        None => Err(GraphError::BadSchema(format!(
            "can not batch '{}' from an empty sample window",
            name
        ))),
    }
}

/// Offset each graph's index pairs by its node-block offset, then concat.
fn offset_and_concat(values: &[GraphValue], offsets: &[i64], name: &str) -> Result<GraphValue> {
    let mut shifted = Vec::with_capacity(values.len());
    for (value, &offset) in values.iter().zip(offsets) {
        let idx = value.to_index2(name)?;
        shifted.push(GraphValue::Int(idx.mapv(|v| v + offset).into_dyn()));
    }
    concat_rows(&shifted, name)
}

/// Expand per-graph counts into (batch_id, local_id, counts) arrays.
fn id_arrays(
    counts: Option<Vec<usize>>,
) -> (Option<Array1<i64>>, Option<Array1<i64>>, Option<Array1<i64>>) {
    match counts {
        None => (None, None, None),
        Some(counts) => {
            let total: usize = counts.iter().sum();
            let mut batch_id = Vec::with_capacity(total);
            let mut local_id = Vec::with_capacity(total);
            for (g, &c) in counts.iter().enumerate() {
                batch_id.extend(std::iter::repeat(g as i64).take(c));
                local_id.extend(0..c as i64);
            }
            (
                Some(Array1::from(batch_id)),
                Some(Array1::from(local_id)),
                Some(Array1::from(counts.iter().map(|&c| c as i64).collect::<Vec<_>>())),
            )
        }
    }
}

fn mixed_dtype(name: &str) -> GraphError {
    GraphError::DTypeMismatch {
        name: name.to_string(),
        expected: "uniform dtype across batch",
    }
}

fn shape_error(name: &str, err: &ndarray::ShapeError) -> GraphError {
    GraphError::ShapeMismatch {
        name: name.to_string(),
        expected: "matching trailing dimensions".to_string(),
        got: err.to_string(),
    }
}
