//! Topology and geometry operations on a single [`GraphRecord`].
//!
//! All operations work through the `<prefix>_indices` family: the index
//! array is the anchor, and whenever rows are reordered, extended or
//! dropped, the identical change is applied to every attribute sharing
//! the prefix, so row correspondence is never broken.
//!
//! Every operation requires the index array of its role to be assigned
//! and fails with [`GraphError::MissingIndices`] otherwise. The failure
//! aborts only that operation; no other attribute is touched.

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayD, Axis, IxDyn};
use tracing::warn;

use crate::error::{GraphError, Result};
use crate::record::{AttrRole, GraphRecord};

/// Pairwise Euclidean distance matrix of `(n, dim)` coordinates.
pub fn distance_matrix(xyz: &Array2<f32>) -> Array2<f32> {
    let n = xyz.nrows();
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let mut sq = 0.0f32;
            for k in 0..xyz.ncols() {
                let d = xyz[[i, k]] - xyz[[j, k]];
                sq += d * d;
            }
            let d = sq.sqrt();
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }
    out
}

/// Safe elementwise inverse: `1/d`, with zero distances mapped to zero.
pub fn invert_distance(dist: &mut ArrayD<f32>) {
    dist.mapv_inplace(|d| if d == 0.0 { 0.0 } else { 1.0 / d });
}

/// Angle in radians at vertex `b` between vectors `b -> a` and `b -> c`.
fn vertex_angle(xyz: &Array2<f32>, a: usize, b: usize, c: usize) -> f32 {
    let dim = xyz.ncols();
    let mut dot = 0.0f32;
    let mut n1 = 0.0f32;
    let mut n2 = 0.0f32;
    for k in 0..dim {
        let v1 = xyz[[a, k]] - xyz[[b, k]];
        let v2 = xyz[[c, k]] - xyz[[b, k]];
        dot += v1 * v2;
        n1 += v1 * v1;
        n2 += v2 * v2;
    }
    let denom = n1.sqrt() * n2.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0).acos()
}

impl GraphRecord {
    /// Apply a row selection (permutation or subset) to every attribute
    /// carrying `role`.
    fn apply_row_selection(&mut self, role: AttrRole, rows: &[usize]) -> Result<()> {
        for key in self.keys_with_role(role) {
            let selected = self.get(&key).map(|v| v.take_rows(rows));
            self.assign_opt(&key, selected)?;
        }
        Ok(())
    }

    /// Drop exact duplicate index rows, keeping the first occurrence,
    /// and apply the same filter to every co-prefixed attribute.
    fn dedup_index_rows(&mut self, role: AttrRole) -> Result<()> {
        let idx = self.indices(role)?;
        let mut seen = HashSet::with_capacity(idx.nrows());
        let mut keep = Vec::with_capacity(idx.nrows());
        for r in 0..idx.nrows() {
            if seen.insert((idx[[r, 0]], idx[[r, 1]])) {
                keep.push(r);
            }
        }
        if keep.len() != idx.nrows() {
            self.apply_row_selection(role, &keep)?;
        }
        Ok(())
    }

    /// Compute the reverse-edge row map for `role`.
    ///
    /// For each directed pair `(i, j)` the map holds the row of `(j, i)`
    /// in the same index array, or `NaN` when no reverse exists. When
    /// multiple candidates exist, the first row in storage order wins.
    /// Stored as `<prefix>indices_reverse`, one value per edge.
    ///
    /// The map is not recomputed when indices are later sorted or
    /// redefined; re-run this operation after such changes.
    pub fn set_edge_indices_reverse(&mut self, role: AttrRole) -> Result<()> {
        let idx = self.indices(role)?;
        let mut first_row: HashMap<(i64, i64), usize> = HashMap::with_capacity(idx.nrows());
        for r in 0..idx.nrows() {
            first_row.entry((idx[[r, 0]], idx[[r, 1]])).or_insert(r);
        }
        let mut reverse = Array2::<f32>::zeros((idx.nrows(), 1));
        for r in 0..idx.nrows() {
            let pair = (idx[[r, 1]], idx[[r, 0]]);
            reverse[[r, 0]] = match first_row.get(&pair) {
                Some(&rev) => rev as f32,
                None => f32::NAN,
            };
        }
        self.assign(&format!("{}indices_reverse", role.prefix()), reverse)
    }

    /// Add the reverse edge `(j, i)` for every `(i, j)` that lacks one.
    ///
    /// Co-prefixed attribute rows are duplicated from the forward edge
    /// onto the new row. `remove_duplicates` additionally drops exact
    /// duplicate index rows, including duplicates created within the set
    /// of added reverse edges. `sort` requests a final ordering pass as
    /// in [`GraphRecord::sort_edge_indices`].
    pub fn make_undirected_edges(
        &mut self,
        role: AttrRole,
        remove_duplicates: bool,
        sort: bool,
    ) -> Result<()> {
        let idx = self.indices(role)?;
        let existing: HashSet<(i64, i64)> =
            (0..idx.nrows()).map(|r| (idx[[r, 0]], idx[[r, 1]])).collect();

        let mut source_rows = Vec::new();
        let mut added_pairs = Vec::new();
        for r in 0..idx.nrows() {
            let rev = (idx[[r, 1]], idx[[r, 0]]);
            if !existing.contains(&rev) {
                source_rows.push(r);
                added_pairs.push(rev);
            }
        }

        if !added_pairs.is_empty() {
            let mut new_idx = Array2::<i64>::zeros((idx.nrows() + added_pairs.len(), 2));
            for r in 0..idx.nrows() {
                new_idx[[r, 0]] = idx[[r, 0]];
                new_idx[[r, 1]] = idx[[r, 1]];
            }
            for (k, &(i, j)) in added_pairs.iter().enumerate() {
                new_idx[[idx.nrows() + k, 0]] = i;
                new_idx[[idx.nrows() + k, 1]] = j;
            }
            let indices_key = role.indices_key();
            for key in self.keys_with_role(role) {
                if key == indices_key {
                    continue;
                }
                let appended = self.get(&key).map(|v| v.append_rows(&source_rows));
                self.assign_opt(&key, appended)?;
            }
            self.assign(&indices_key, new_idx)?;
        }

        if remove_duplicates {
            self.dedup_index_rows(role)?;
        }
        if sort {
            self.sort_edge_indices(role)?;
        }
        Ok(())
    }

    /// Add a self-loop `(v, v)` for every node id appearing in the index
    /// array, where absent. Co-prefixed attribute rows for the new loops
    /// are filled with `fill_value`.
    pub fn add_edge_self_loops(
        &mut self,
        role: AttrRole,
        remove_duplicates: bool,
        sort: bool,
        fill_value: f64,
    ) -> Result<()> {
        let idx = self.indices(role)?;
        let existing: HashSet<(i64, i64)> =
            (0..idx.nrows()).map(|r| (idx[[r, 0]], idx[[r, 1]])).collect();

        let mut nodes: Vec<i64> = idx.iter().copied().collect();
        nodes.sort_unstable();
        nodes.dedup();

        let loops: Vec<i64> = nodes
            .into_iter()
            .filter(|&v| !existing.contains(&(v, v)))
            .collect();

        if !loops.is_empty() {
            let mut new_idx = Array2::<i64>::zeros((idx.nrows() + loops.len(), 2));
            for r in 0..idx.nrows() {
                new_idx[[r, 0]] = idx[[r, 0]];
                new_idx[[r, 1]] = idx[[r, 1]];
            }
            for (k, &v) in loops.iter().enumerate() {
                new_idx[[idx.nrows() + k, 0]] = v;
                new_idx[[idx.nrows() + k, 1]] = v;
            }
            let indices_key = role.indices_key();
            for key in self.keys_with_role(role) {
                if key == indices_key {
                    continue;
                }
                let filled = self.get(&key).map(|v| v.append_fill(loops.len(), fill_value));
                self.assign_opt(&key, filled)?;
            }
            self.assign(&indices_key, new_idx)?;
        }

        if remove_duplicates {
            self.dedup_index_rows(role)?;
        }
        if sort {
            self.sort_edge_indices(role)?;
        }
        Ok(())
    }

    /// Sort index rows by first column, ties broken by second column,
    /// and apply the identical permutation to every co-prefixed
    /// attribute. The sort is stable with respect to further columns of
    /// co-prefixed data: one permutation, not independent sorts.
    pub fn sort_edge_indices(&mut self, role: AttrRole) -> Result<()> {
        let idx = self.indices(role)?;
        let mut perm: Vec<usize> = (0..idx.nrows()).collect();
        perm.sort_by_key(|&r| (idx[[r, 0]], idx[[r, 1]]));
        self.apply_row_selection(role, &perm)
    }

    /// Symmetric degree normalization of `<prefix>weights`.
    ///
    /// Initializes weights to a ones column `(E, 1)` when absent. The
    /// node degree is the weight sum over the first index column, and
    /// each weight is rescaled as `w(i,j) * D[i]^-0.5 * D[j]^-0.5`.
    ///
    /// Zero-degree nodes produce `inf`/`nan` weights; isolated nodes are
    /// the caller's responsibility to pre-filter.
    pub fn normalize_edge_weights_sym(&mut self, role: AttrRole) -> Result<()> {
        let idx = self.indices(role)?;
        let weights_key = format!("{}weights", role.prefix());
        if !self.contains(&weights_key) {
            self.assign(&weights_key, Array2::<f32>::ones((idx.nrows(), 1)))?;
        }
        let mut weights = self
            .get(&weights_key)
            .and_then(|v| v.as_float())
            .cloned()
            .ok_or_else(|| GraphError::DTypeMismatch {
                name: weights_key.clone(),
                expected: "f32",
            })?;

        let mut degree: HashMap<i64, f32> = HashMap::new();
        for r in 0..idx.nrows() {
            let w = weights.index_axis(Axis(0), r).sum();
            *degree.entry(idx[[r, 0]]).or_insert(0.0) += w;
        }
        for r in 0..idx.nrows() {
            let di = *degree.get(&idx[[r, 0]]).unwrap_or(&0.0);
            let dj = *degree.get(&idx[[r, 1]]).unwrap_or(&0.0);
            let factor = di.powf(-0.5) * dj.powf(-0.5);
            weights
                .index_axis_mut(Axis(0), r)
                .mapv_inplace(|w| w * factor);
        }
        self.assign(&weights_key, weights)
    }

    /// Copy `edge_indices` into an independent `range_indices` and
    /// compute the Euclidean distance per pair as `range_attributes`.
    ///
    /// With `do_invert_distance` the safe inverse `1/d` (zero stays
    /// zero) replaces the raw distance. When coordinates are absent the
    /// indices copy is still written, an advisory is logged and the
    /// distances are skipped.
    pub fn set_range_from_edges(&mut self, do_invert_distance: bool) -> Result<()> {
        let idx = self.indices(AttrRole::Edge)?;
        self.assign("range_indices", idx.clone())?;

        let xyz = match self.coordinates()? {
            Some(xyz) => xyz,
            None => {
                warn!("node coordinates are not set; skipping range attributes");
                return Ok(());
            }
        };
        let mut dist = ArrayD::<f32>::zeros(IxDyn(&[idx.nrows(), 1]));
        for r in 0..idx.nrows() {
            let i = idx[[r, 0]] as usize;
            let j = idx[[r, 1]] as usize;
            let mut sq = 0.0f32;
            for k in 0..xyz.ncols() {
                let d = xyz[[i, k]] - xyz[[j, k]];
                sq += d * d;
            }
            dist[[r, 0]] = sq.sqrt();
        }
        if do_invert_distance {
            invert_distance(&mut dist);
        }
        self.assign("range_attributes", dist)
    }

    /// Define geometric range connections from a distance cutoff and a
    /// nearest-neighbour limit.
    ///
    /// With `exclusive` both constraints must hold (a neighbour must be
    /// within `max_distance` and among the `max_neighbours` nearest);
    /// otherwise either suffices. `self_loops` controls whether the
    /// zero-distance self pair is a candidate. Produces `range_indices`
    /// (directed pairs) and `range_attributes` (distances, one feature
    /// column, optionally inverted).
    ///
    /// Previously computed angles are not recomputed; re-run
    /// [`GraphRecord::set_angle`] after redefining ranges.
    pub fn set_range(
        &mut self,
        max_distance: f32,
        max_neighbours: usize,
        do_invert_distance: bool,
        self_loops: bool,
        exclusive: bool,
    ) -> Result<()> {
        let xyz = match self.coordinates()? {
            Some(xyz) => xyz,
            None => {
                warn!("node coordinates are not set; can not define range connections");
                return Ok(());
            }
        };
        let n = xyz.nrows();
        let dist = distance_matrix(&xyz);

        let mut pairs: Vec<(usize, usize)> = Vec::new();
        let mut dists: Vec<f32> = Vec::new();
        for i in 0..n {
            let eligible: Vec<usize> = (0..n).filter(|&j| self_loops || j != i).collect();
            // k nearest among eligible, ties broken by node id.
            let mut by_dist = eligible.clone();
            by_dist.sort_by(|&a, &b| {
                dist[[i, a]]
                    .partial_cmp(&dist[[i, b]])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
            let nearest: HashSet<usize> = by_dist.into_iter().take(max_neighbours).collect();

            for j in eligible {
                let in_cutoff = dist[[i, j]] <= max_distance;
                let in_nearest = nearest.contains(&j);
                let selected = if exclusive {
                    in_cutoff && in_nearest
                } else {
                    in_cutoff || in_nearest
                };
                if selected {
                    pairs.push((i, j));
                    dists.push(dist[[i, j]]);
                }
            }
        }

        let mut indices = Array2::<i64>::zeros((pairs.len(), 2));
        for (r, &(i, j)) in pairs.iter().enumerate() {
            indices[[r, 0]] = i as i64;
            indices[[r, 1]] = j as i64;
        }
        let mut attributes = ArrayD::<f32>::zeros(IxDyn(&[dists.len(), 1]));
        for (r, &d) in dists.iter().enumerate() {
            attributes[[r, 0]] = d;
        }
        if do_invert_distance {
            invert_distance(&mut attributes);
        }
        self.assign("range_indices", indices)?;
        self.assign("range_attributes", attributes)
    }

    /// Enumerate angle triples over the index array of `role` (typically
    /// range connections).
    ///
    /// A triple is an ordered pair of edge rows `(e1, e2)` with
    /// `dst(e1) == src(e2)`, i.e. two connections sharing a middle node.
    /// `allow_multi_edges = false` excludes back-tracking triples whose
    /// outer nodes coincide (`a == c`), which form geometrically
    /// meaningless zero-degree angles. Produces `angle_indices` (rows of
    /// the source index array) and `angle_indices_nodes` (node triples).
    /// With `compute_angles` and coordinates present, also
    /// `angle_attributes`: the angle in radians at the middle vertex.
    pub fn set_angle(
        &mut self,
        role: AttrRole,
        allow_multi_edges: bool,
        compute_angles: bool,
    ) -> Result<()> {
        let idx = self.indices(role)?;
        let e = idx.nrows();

        let mut edge_rows: Vec<(i64, i64)> = Vec::with_capacity(e);
        for r in 0..e {
            edge_rows.push((idx[[r, 0]], idx[[r, 1]]));
        }
        // Group incoming rows by source node for the second leg.
        let mut by_src: HashMap<i64, Vec<usize>> = HashMap::new();
        for (r, &(src, _)) in edge_rows.iter().enumerate() {
            by_src.entry(src).or_default().push(r);
        }

        let mut index_pairs: Vec<(usize, usize)> = Vec::new();
        let mut node_triples: Vec<(i64, i64, i64)> = Vec::new();
        for (r1, &(a, b)) in edge_rows.iter().enumerate() {
            if let Some(candidates) = by_src.get(&b) {
                for &r2 in candidates {
                    if r1 == r2 {
                        continue;
                    }
                    let c = edge_rows[r2].1;
                    if !allow_multi_edges && a == c {
                        continue;
                    }
                    index_pairs.push((r1, r2));
                    node_triples.push((a, b, c));
                }
            }
        }

        let mut angle_indices = Array2::<i64>::zeros((index_pairs.len(), 2));
        for (r, &(e1, e2)) in index_pairs.iter().enumerate() {
            angle_indices[[r, 0]] = e1 as i64;
            angle_indices[[r, 1]] = e2 as i64;
        }
        let mut angle_nodes = Array2::<i64>::zeros((node_triples.len(), 3));
        for (r, &(a, b, c)) in node_triples.iter().enumerate() {
            angle_nodes[[r, 0]] = a;
            angle_nodes[[r, 1]] = b;
            angle_nodes[[r, 2]] = c;
        }
        self.assign("angle_indices", angle_indices)?;
        self.assign("angle_indices_nodes", angle_nodes)?;

        if compute_angles {
            let xyz = match self.coordinates()? {
                Some(xyz) => xyz,
                None => {
                    warn!("node coordinates are not set; skipping angle attributes");
                    return Ok(());
                }
            };
            let mut angles = Array2::<f32>::zeros((node_triples.len(), 1));
            for (r, &(a, b, c)) in node_triples.iter().enumerate() {
                angles[[r, 0]] = vertex_angle(&xyz, a as usize, b as usize, c as usize);
            }
            self.assign("angle_attributes", angles)?;
        }
        Ok(())
    }
}

/// A topology operation with its parameters, as a closed set.
///
/// This is the unit of collection-wide mapping
/// ([`crate::GraphCollection::map_each`]): one variant per operation,
/// dispatched explicitly instead of by attribute-name lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    /// See [`GraphRecord::set_edge_indices_reverse`].
    SetEdgeIndicesReverse { role: AttrRole },
    /// See [`GraphRecord::make_undirected_edges`].
    MakeUndirectedEdges {
        role: AttrRole,
        remove_duplicates: bool,
        sort: bool,
    },
    /// See [`GraphRecord::add_edge_self_loops`].
    AddEdgeSelfLoops {
        role: AttrRole,
        remove_duplicates: bool,
        sort: bool,
        fill_value: f64,
    },
    /// See [`GraphRecord::sort_edge_indices`].
    SortEdgeIndices { role: AttrRole },
    /// See [`GraphRecord::normalize_edge_weights_sym`].
    NormalizeEdgeWeightsSym { role: AttrRole },
    /// See [`GraphRecord::set_range_from_edges`].
    SetRangeFromEdges { do_invert_distance: bool },
    /// See [`GraphRecord::set_range`].
    SetRange {
        max_distance: f32,
        max_neighbours: usize,
        do_invert_distance: bool,
        self_loops: bool,
        exclusive: bool,
    },
    /// See [`GraphRecord::set_angle`].
    SetAngle {
        role: AttrRole,
        allow_multi_edges: bool,
        compute_angles: bool,
    },
}

impl GraphOp {
    /// Apply the operation to one record.
    pub fn apply(&self, graph: &mut GraphRecord) -> Result<()> {
        match *self {
            GraphOp::SetEdgeIndicesReverse { role } => graph.set_edge_indices_reverse(role),
            GraphOp::MakeUndirectedEdges {
                role,
                remove_duplicates,
                sort,
            } => graph.make_undirected_edges(role, remove_duplicates, sort),
            GraphOp::AddEdgeSelfLoops {
                role,
                remove_duplicates,
                sort,
                fill_value,
            } => graph.add_edge_self_loops(role, remove_duplicates, sort, fill_value),
            GraphOp::SortEdgeIndices { role } => graph.sort_edge_indices(role),
            GraphOp::NormalizeEdgeWeightsSym { role } => graph.normalize_edge_weights_sym(role),
            GraphOp::SetRangeFromEdges { do_invert_distance } => {
                graph.set_range_from_edges(do_invert_distance)
            }
            GraphOp::SetRange {
                max_distance,
                max_neighbours,
                do_invert_distance,
                self_loops,
                exclusive,
            } => graph.set_range(
                max_distance,
                max_neighbours,
                do_invert_distance,
                self_loops,
                exclusive,
            ),
            GraphOp::SetAngle {
                role,
                allow_multi_edges,
                compute_angles,
            } => graph.set_angle(role, allow_multi_edges, compute_angles),
        }
    }
}
