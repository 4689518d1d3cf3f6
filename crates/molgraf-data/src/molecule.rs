//! The chemistry-collaborator boundary.
//!
//! Molecule parsing, sanitization and conformer generation live in an
//! external cheminformatics toolkit. This library consumes only the
//! small exchange surface below and exposes nothing back: the boundary
//! is one-directional.

use ndarray::{Array1, Array2};

/// The per-sample output of the chemistry collaborator.
///
/// `node_coordinates` is `None` when no conformer could be generated;
/// the dataset layer decides whether such samples are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeGraph {
    /// Element symbol per atom.
    pub node_symbols: Vec<String>,
    /// Atomic number per atom.
    pub node_numbers: Vec<i64>,
    /// 3D conformer coordinates `(n_atoms, 3)`, if available.
    pub node_coordinates: Option<Array2<f32>>,
    /// Directed bond index pairs `(n_bonds, 2)`.
    pub edge_indices: Array2<i64>,
    /// Bond order/type code per bond, parallel to `edge_indices`.
    pub bond_orders: Array1<i64>,
}

impl MoleculeGraph {
    /// Number of atoms.
    pub fn num_nodes(&self) -> usize {
        self.node_numbers.len()
    }

    /// Number of directed bonds.
    pub fn num_edges(&self) -> usize {
        self.edge_indices.nrows()
    }
}

/// Converts molecule descriptors (e.g. SMILES strings) into graphs.
///
/// Implemented by the external chemistry toolkit wrapper. `None` means
/// the descriptor could not be converted; the dataset layer logs and
/// skips such samples.
pub trait MoleculeProvider {
    /// Convert one descriptor into a molecule graph.
    fn molecule_graph(&self, descriptor: &str) -> Option<MoleculeGraph>;
}
