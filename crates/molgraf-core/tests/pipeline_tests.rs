//! Integration tests: a full container -> topology -> batch pipeline,
//! as a training loader would drive it.

use molgraf_core::{
    AttrRole, DisjointBatcher, GraphCollection, GraphOp, GraphRecord, Selector, TensorSpec,
};
use ndarray::array;

/// A water-like triangle: 3 nodes, bonds 0-1 and 0-2.
fn triangle() -> GraphRecord {
    let mut g = GraphRecord::new();
    g.assign("edge_indices", array![[0i64, 1], [0, 2]]).unwrap();
    g.assign("node_number", vec![8i64, 1, 1]).unwrap();
    g.assign(
        "node_coordinates",
        array![[0.0f32, 0.0, 0.0], [0.96, 0.0, 0.0], [-0.24, 0.93, 0.0]],
    )
    .unwrap();
    g.assign("node_attributes", array![[8.0f32], [1.0], [1.0]]).unwrap();
    g.assign("graph_labels", vec![-0.5f32]).unwrap();
    g
}

/// A two-node fragment with one bond.
fn fragment() -> GraphRecord {
    let mut g = GraphRecord::new();
    g.assign("edge_indices", array![[0i64, 1]]).unwrap();
    g.assign("node_number", vec![6i64, 8]).unwrap();
    g.assign(
        "node_coordinates",
        array![[0.0f32, 0.0, 0.0], [1.2, 0.0, 0.0]],
    )
    .unwrap();
    g.assign("node_attributes", array![[6.0f32], [8.0]]).unwrap();
    g.assign("graph_labels", vec![1.25f32]).unwrap();
    g
}

#[test]
fn topology_pass_then_disjoint_batching() {
    let mut data = GraphCollection::new();
    data.push(triangle());
    data.push(fragment());

    data.map_each(&GraphOp::MakeUndirectedEdges {
        role: AttrRole::Edge,
        remove_duplicates: true,
        sort: true,
    })
    .unwrap();
    data.map_each(&GraphOp::SetEdgeIndicesReverse { role: AttrRole::Edge })
        .unwrap();
    data.map_each(&GraphOp::SetRange {
        max_distance: 2.0,
        max_neighbours: 8,
        do_invert_distance: false,
        self_loops: false,
        exclusive: true,
    })
    .unwrap();
    data.map_each(&GraphOp::SetAngle {
        role: AttrRole::Range,
        allow_multi_edges: false,
        compute_angles: true,
    })
    .unwrap();

    // Every record now carries the derived families.
    for handle in data.iter() {
        let g = handle.borrow();
        assert!(g.get("edge_indices_reverse").is_some());
        assert!(g.get("range_indices").is_some());
        assert!(g.get("range_attributes").is_some());
        assert!(g.get("angle_indices").is_some());
        assert!(g.get("angle_attributes").is_some());
    }

    let batcher = DisjointBatcher::new(
        vec![
            TensorSpec::node("node_attributes", vec![Some(1)]),
            TensorSpec::edge("range_attributes", vec![Some(1)]),
            TensorSpec::indices("range_indices"),
        ],
        vec![TensorSpec::graph("graph_labels", vec![Some(1)])],
    )
    .with_batch_size(2);

    let batches: Vec<_> = batcher.epoch(&data).map(Result::unwrap).collect();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];

    // All range indices must stay within the combined node block and the
    // second graph's block must start at the first graph's node count.
    let idx = batch.inputs[2].as_int().unwrap();
    let total_nodes: i64 = batch.count_nodes.as_ref().unwrap().sum();
    assert_eq!(total_nodes, 5);
    for &v in idx.iter() {
        assert!(v >= 0 && v < total_nodes);
    }
    let count_edges = batch.count_edges.as_ref().unwrap();
    let first_graph_edges = count_edges[0] as usize;
    for r in first_graph_edges..idx.shape()[0] {
        assert!(idx[[r, 0]] >= 3);
        assert!(idx[[r, 1]] >= 3);
    }

    let labels = batch.outputs[0].as_float().unwrap();
    assert_eq!(labels.shape(), &[2, 1]);
}

#[test]
fn clean_then_select_then_batch() {
    let mut data = GraphCollection::new();
    data.push(triangle());
    data.push(GraphRecord::new()); // invalid: nothing assigned
    data.push(fragment());

    let removed = data.clean(&["node_attributes", "edge_indices"]);
    assert_eq!(removed, vec![1]);
    assert_eq!(data.len(), 2);

    let view = data.select(&Selector::Range(0..2)).unwrap();
    assert_eq!(view.len(), 2);

    let batcher = DisjointBatcher::new(
        vec![
            TensorSpec::node("node_attributes", vec![Some(1)]),
            TensorSpec::indices("edge_indices"),
        ],
        vec![TensorSpec::graph("graph_labels", vec![Some(1)])],
    );
    let batch = batcher.build_batch(&view, &[0, 1]).unwrap();
    assert_eq!(batch.count_nodes.as_ref().unwrap().to_vec(), vec![3, 2]);
}

#[test]
fn shared_views_feed_topology_results_back() {
    let mut data = GraphCollection::new();
    data.push(triangle());
    data.push(fragment());

    // Run the topology pass through a view; originals must see it.
    let view = data.select(&Selector::List(vec![1])).unwrap();
    view.map_each(&GraphOp::SortEdgeIndices { role: AttrRole::Edge })
        .unwrap();
    view.map_each(&GraphOp::SetEdgeIndicesReverse { role: AttrRole::Edge })
        .unwrap();

    assert!(data
        .get(1)
        .unwrap()
        .borrow()
        .get("edge_indices_reverse")
        .is_some());
    assert!(data
        .get(0)
        .unwrap()
        .borrow()
        .get("edge_indices_reverse")
        .is_none());
}
