//! Property-based tests for the graph container invariants:
//! - sorting is a permutation shared by all co-prefixed attributes
//! - undirected completion is idempotent
//! - reverse maps are involutive where a reverse exists

use molgraf_core::{AttrRole, GraphRecord};
use ndarray::Array2;
use proptest::prelude::*;

/// Arbitrary small directed edge lists over up to 8 nodes.
fn arb_edges() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..8, 0i64..8), 1..24)
}

fn record_from(edges: &[(i64, i64)]) -> GraphRecord {
    let mut idx = Array2::<i64>::zeros((edges.len(), 2));
    let mut attr = Array2::<f32>::zeros((edges.len(), 1));
    for (r, &(i, j)) in edges.iter().enumerate() {
        idx[[r, 0]] = i;
        idx[[r, 1]] = j;
        // Tag each row so permutations can be tracked.
        attr[[r, 0]] = (i * 100 + j) as f32;
    }
    let mut g = GraphRecord::new();
    g.assign("edge_indices", idx).unwrap();
    g.assign("edge_attributes", attr).unwrap();
    g
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sort_keeps_row_correspondence(edges in arb_edges()) {
        let mut g = record_from(&edges);
        g.sort_edge_indices(AttrRole::Edge).unwrap();

        let idx = g.indices(AttrRole::Edge).unwrap();
        let attr = g.get("edge_attributes").unwrap().as_float().unwrap().clone();

        // Sorted lexicographically.
        for r in 1..idx.nrows() {
            let prev = (idx[[r - 1, 0]], idx[[r - 1, 1]]);
            let here = (idx[[r, 0]], idx[[r, 1]]);
            prop_assert!(prev <= here);
        }
        // Every attribute row still tags its own index pair.
        for r in 0..idx.nrows() {
            let expect = (idx[[r, 0]] * 100 + idx[[r, 1]]) as f32;
            prop_assert_eq!(attr[[r, 0]], expect);
        }
    }

    #[test]
    fn make_undirected_is_idempotent(edges in arb_edges()) {
        let mut g = record_from(&edges);
        g.make_undirected_edges(AttrRole::Edge, true, true).unwrap();
        let once = g.indices(AttrRole::Edge).unwrap();
        g.make_undirected_edges(AttrRole::Edge, true, true).unwrap();
        let twice = g.indices(AttrRole::Edge).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn undirected_set_contains_both_directions(edges in arb_edges()) {
        let mut g = record_from(&edges);
        g.make_undirected_edges(AttrRole::Edge, true, true).unwrap();
        let idx = g.indices(AttrRole::Edge).unwrap();
        let set: std::collections::HashSet<(i64, i64)> = (0..idx.nrows())
            .map(|r| (idx[[r, 0]], idx[[r, 1]]))
            .collect();
        for &(i, j) in set.clone().iter() {
            prop_assert!(set.contains(&(j, i)));
        }
        // Deduplicated: set size equals row count.
        prop_assert_eq!(set.len(), idx.nrows());
    }

    #[test]
    fn reverse_map_is_involutive_where_defined(edges in arb_edges()) {
        let mut g = record_from(&edges);
        // Dedup so that reverse rows are unique and the involution is exact.
        g.make_undirected_edges(AttrRole::Edge, true, true).unwrap();
        g.set_edge_indices_reverse(AttrRole::Edge).unwrap();

        let idx = g.indices(AttrRole::Edge).unwrap();
        let rev = g.get("edge_indices_reverse").unwrap().as_float().unwrap().clone();
        for r in 0..idx.nrows() {
            let m = rev[[r, 0]];
            prop_assert!(m.is_finite());
            let back = rev[[m as usize, 0]];
            prop_assert_eq!(back as usize, r);
            // The mapped row really is the swapped pair.
            prop_assert_eq!(idx[[m as usize, 0]], idx[[r, 1]]);
            prop_assert_eq!(idx[[m as usize, 1]], idx[[r, 0]]);
        }
    }

    #[test]
    fn self_loops_cover_every_node_once(edges in arb_edges()) {
        let mut g = record_from(&edges);
        g.add_edge_self_loops(AttrRole::Edge, true, true, 0.0).unwrap();
        let idx = g.indices(AttrRole::Edge).unwrap();
        let mut nodes: Vec<i64> = edges.iter().flat_map(|&(i, j)| [i, j]).collect();
        nodes.sort_unstable();
        nodes.dedup();
        for v in nodes {
            let loops = (0..idx.nrows())
                .filter(|&r| idx[[r, 0]] == v && idx[[r, 1]] == v)
                .count();
            prop_assert_eq!(loops, 1);
        }
    }
}
