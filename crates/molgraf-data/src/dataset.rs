//! An in-memory graph dataset with a location on disk.
//!
//! A dataset couples a [`GraphCollection`] with a name, a data directory
//! and a table file. Ingestion runs in two steps, mirroring the usual
//! molecular pipeline: read the table, convert each descriptor through
//! the chemistry collaborator into a [`MoleculeGraph`], and store the
//! resulting arrays per record. Derived feature attributes are produced
//! afterwards from the stored symbols and bond orders via one-hot
//! encoders.
//!
//! Persistence is a single binary blob of the per-graph attribute maps,
//! keyed by dataset name. No schema versioning, no partial load; the
//! round trip reproduces every array bit-for-bit, NaN sentinels
//! included.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use tracing::{info, warn};

use molgraf_core::{GraphCollection, GraphError, GraphRecord, GraphValue};

use crate::encoder::OneHotEncoder;
use crate::error::{DataError, Result};
use crate::molecule::MoleculeProvider;
use crate::table::TableFile;

/// Encoders used to derive feature attributes from stored molecule data.
///
/// Defaults follow common molecular-featurization practice: element
/// symbols over the organic subset plus a catch-all slot, bond orders
/// over {single, double, triple, aromatic} without one.
#[derive(Debug, Clone)]
pub struct AttributeEncoders {
    /// Element-symbol encoder feeding `node_attributes`.
    pub symbol: OneHotEncoder,
    /// Bond-order encoder feeding `edge_attributes`.
    pub bond_order: OneHotEncoder,
    /// Append the raw atomic number as one extra node feature column.
    pub include_atomic_number: bool,
}

impl Default for AttributeEncoders {
    fn default() -> Self {
        Self {
            symbol: OneHotEncoder::from_strs(
                &[
                    "B", "C", "N", "O", "F", "Si", "P", "S", "Cl", "As", "Se", "Br", "Te", "I",
                    "At",
                ],
                true,
            ),
            bond_order: OneHotEncoder::from_ints(&[1, 2, 3, 12], false),
            include_atomic_number: false,
        }
    }
}

/// A named graph dataset held in memory.
#[derive(Debug, Clone, Default)]
pub struct GraphDataset {
    /// Dataset name, used for default file naming.
    pub dataset_name: String,
    /// Directory holding the table file and the persisted blob.
    pub data_directory: Option<PathBuf>,
    /// Name of the table file inside `data_directory`.
    pub file_name: Option<String>,
    graphs: GraphCollection,
    table: Option<TableFile>,
}

impl GraphDataset {
    /// Create an empty dataset with a name.
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            ..Self::default()
        }
    }

    /// Set the data directory.
    pub fn with_data_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_directory = Some(dir.into());
        self
    }

    /// Set the table file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// The graph collection.
    pub fn graphs(&self) -> &GraphCollection {
        &self.graphs
    }

    /// Mutable access to the graph collection.
    pub fn graphs_mut(&mut self) -> &mut GraphCollection {
        &mut self.graphs
    }

    /// The loaded table, if `read_in_table_file` ran.
    pub fn table(&self) -> Option<&TableFile> {
        self.table.as_ref()
    }

    fn directory(&self) -> Result<&Path> {
        self.data_directory
            .as_deref()
            .ok_or_else(|| DataError::MissingDirectory(self.dataset_name.clone()))
    }

    /// Full path of the table file.
    pub fn file_path(&self) -> Result<PathBuf> {
        let dir = self.directory()?;
        let name = self
            .file_name
            .as_deref()
            .ok_or_else(|| DataError::MissingTable(self.dataset_name.clone()))?;
        Ok(dir.join(name))
    }

    /// Default path of the persisted blob:
    /// `<data_directory>/<dataset_name>.molgraf.bin`.
    pub fn default_blob_path(&self) -> Result<PathBuf> {
        Ok(self
            .directory()?
            .join(format!("{}.molgraf.bin", self.dataset_name)))
    }

    /// Read the CSV table file into memory.
    pub fn read_in_table_file(&mut self) -> Result<&TableFile> {
        let path = self.file_path()?;
        info!(path = %path.display(), "reading table file");
        self.table = Some(TableFile::read(path)?);
        Ok(self.table.as_ref().expect("just set"))
    }

    /// Build the collection from molecule descriptors.
    ///
    /// One descriptor and one label row per sample; a label/descriptor
    /// count mismatch is rejected up front. Samples the provider can not
    /// convert, samples with zero edges and (when `require_conformers`)
    /// samples without coordinates are skipped with a logged advisory.
    /// Returns the number of graphs kept.
    pub fn from_molecules(
        &mut self,
        provider: &dyn MoleculeProvider,
        descriptors: &[String],
        labels: &Array2<f32>,
        require_conformers: bool,
    ) -> Result<usize> {
        if labels.nrows() != descriptors.len() {
            return Err(GraphError::LengthMismatch {
                expected: descriptors.len(),
                got: labels.nrows(),
            }
            .into());
        }
        if descriptors.is_empty() {
            warn!(dataset = %self.dataset_name, "received an empty descriptor list");
        }
        let mut collection = GraphCollection::new();
        for (i, descriptor) in descriptors.iter().enumerate() {
            let Some(mol) = provider.molecule_graph(descriptor) else {
                info!(sample = i, "skipping molecule, descriptor could not be converted");
                continue;
            };
            if mol.num_edges() == 0 {
                info!(sample = i, "skipping molecule with zero edges");
                continue;
            }
            if require_conformers && mol.node_coordinates.is_none() {
                info!(sample = i, "skipping molecule without a conformer");
                continue;
            }

            let mut g = GraphRecord::new();
            g.assign("node_symbol", mol.node_symbols.clone())?;
            g.assign("node_number", Array1::from(mol.node_numbers.clone()))?;
            if let Some(xyz) = &mol.node_coordinates {
                g.assign("node_coordinates", xyz.clone())?;
            }
            g.assign("edge_indices", mol.edge_indices.clone())?;
            g.assign("edge_number", mol.bond_orders.clone())?;
            g.assign("graph_labels", labels.row(i).to_owned())?;
            g.assign("graph_size", mol.num_nodes() as i64)?;
            collection.push(g);
        }
        info!(
            dataset = %self.dataset_name,
            kept = collection.len(),
            total = descriptors.len(),
            "molecule ingestion done"
        );
        self.graphs = collection;
        Ok(self.graphs.len())
    }

    /// Derive feature attributes from the stored symbols and bond orders.
    ///
    /// `node_attributes` and `edge_attributes` are one-hot encoded;
    /// `graph_attributes` is the single global feature available without
    /// the chemistry collaborator, the atom count (richer molecule-level
    /// descriptors come from the label table).
    ///
    /// Requires `node_symbol` and `edge_number` on every record (they
    /// are written by [`from_molecules`](Self::from_molecules)). After
    /// the pass the encoders' `found_values` report the categories
    /// encountered.
    pub fn set_attributes(&mut self, encoders: &mut AttributeEncoders) -> Result<()> {
        for (index, handle) in self.graphs.iter().enumerate() {
            let mut g = handle.borrow_mut();

            let symbols: Vec<String> = g
                .get("node_symbol")
                .and_then(|v| v.as_str_column().map(<[String]>::to_vec))
                .ok_or_else(|| GraphError::MissingAttribute {
                    name: "node_symbol".to_string(),
                    index,
                })?;
            let numbers: Vec<i64> = g
                .get("node_number")
                .and_then(|v| v.as_int().map(|a| a.iter().copied().collect()))
                .ok_or_else(|| GraphError::MissingAttribute {
                    name: "node_number".to_string(),
                    index,
                })?;
            let orders: Vec<i64> = g
                .get("edge_number")
                .and_then(|v| v.as_int().map(|a| a.iter().copied().collect()))
                .ok_or_else(|| GraphError::MissingAttribute {
                    name: "edge_number".to_string(),
                    index,
                })?;

            let node_width =
                encoders.symbol.width() + usize::from(encoders.include_atomic_number);
            let mut node_attributes = Array2::<f32>::zeros((symbols.len(), node_width));
            for (r, symbol) in symbols.iter().enumerate() {
                let one_hot = encoders.symbol.encode_str(symbol);
                for (c, v) in one_hot.into_iter().enumerate() {
                    node_attributes[[r, c]] = v;
                }
                if encoders.include_atomic_number {
                    node_attributes[[r, node_width - 1]] = numbers[r] as f32;
                }
            }

            let mut edge_attributes =
                Array2::<f32>::zeros((orders.len(), encoders.bond_order.width()));
            for (r, &order) in orders.iter().enumerate() {
                let one_hot = encoders.bond_order.encode_int(order);
                for (c, v) in one_hot.into_iter().enumerate() {
                    edge_attributes[[r, c]] = v;
                }
            }

            g.assign("node_attributes", node_attributes)?;
            g.assign("edge_attributes", edge_attributes)?;
            g.assign("graph_attributes", vec![symbols.len() as f32])?;
        }
        info!(
            symbols = ?encoders.symbol.found_values(),
            bond_orders = ?encoders.bond_order.found_values(),
            "attribute generation done"
        );
        Ok(())
    }

    /// Persist all graph attribute maps as one binary blob.
    ///
    /// Defaults to [`default_blob_path`](Self::default_blob_path).
    /// Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.default_blob_path()?,
        };
        info!(path = %path.display(), "saving dataset");
        let maps: Vec<BTreeMap<String, GraphValue>> = self
            .graphs
            .iter()
            .map(|g| g.borrow().to_attrs())
            .collect();
        let file = std::fs::File::create(&path)?;
        bincode::serialize_into(BufWriter::new(file), &maps)?;
        Ok(path)
    }

    /// Load graph attribute maps from a binary blob, replacing the
    /// collection. Returns the number of graphs loaded.
    pub fn load(&mut self, path: Option<&Path>) -> Result<usize> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.default_blob_path()?,
        };
        info!(path = %path.display(), "loading dataset");
        let file = std::fs::File::open(&path)?;
        let maps: Vec<BTreeMap<String, GraphValue>> =
            bincode::deserialize_from(BufReader::new(file))?;
        let mut collection = GraphCollection::new();
        for map in maps {
            collection.push(GraphRecord::from_attrs(map)?);
        }
        self.graphs = collection;
        Ok(self.graphs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::MoleculeGraph;
    use ndarray::array;

    /// A provider with two tiny hard-coded molecules and one failure.
    struct StubProvider;

    impl MoleculeProvider for StubProvider {
        fn molecule_graph(&self, descriptor: &str) -> Option<MoleculeGraph> {
            match descriptor {
                "CO" => Some(MoleculeGraph {
                    node_symbols: vec!["C".into(), "O".into()],
                    node_numbers: vec![6, 8],
                    node_coordinates: Some(array![[0.0f32, 0.0, 0.0], [1.4, 0.0, 0.0]]),
                    edge_indices: array![[0i64, 1], [1, 0]],
                    bond_orders: array![1i64, 1],
                }),
                "N#N" => Some(MoleculeGraph {
                    node_symbols: vec!["N".into(), "N".into()],
                    node_numbers: vec![7, 7],
                    node_coordinates: None,
                    edge_indices: array![[0i64, 1], [1, 0]],
                    bond_orders: array![3i64, 3],
                }),
                _ => None,
            }
        }
    }

    fn descriptors(items: &[&str]) -> Vec<String> {
        items.iter().map(|&s| s.to_string()).collect()
    }

    #[test]
    fn ingestion_skips_unconvertible_and_counts_kept() {
        let mut ds = GraphDataset::new("stub");
        let labels = array![[0.1f32], [0.2], [0.3]];
        let kept = ds
            .from_molecules(&StubProvider, &descriptors(&["CO", "bad", "N#N"]), &labels, false)
            .unwrap();
        assert_eq!(kept, 2);
        // Labels follow the surviving samples.
        let g1 = ds.graphs().get(1).unwrap();
        let labels1 = g1.borrow().get("graph_labels").unwrap().as_float().unwrap().clone();
        assert!((labels1[[0]] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn ingestion_rejects_label_row_shortfall() {
        let mut ds = GraphDataset::new("stub");
        // Three descriptors but only two label rows.
        let labels = array![[0.1f32], [0.2]];
        let err = ds
            .from_molecules(&StubProvider, &descriptors(&["CO", "bad", "N#N"]), &labels, false)
            .unwrap_err();
        assert!(matches!(
            err,
            DataError::Graph(GraphError::LengthMismatch { expected: 3, got: 2 })
        ));
        assert!(ds.graphs().is_empty());
    }

    #[test]
    fn conformer_requirement_drops_samples_without_coordinates() {
        let mut ds = GraphDataset::new("stub");
        let labels = array![[0.1f32], [0.2]];
        let kept = ds
            .from_molecules(&StubProvider, &descriptors(&["CO", "N#N"]), &labels, true)
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[test]
    fn set_attributes_builds_encoded_features() {
        let mut ds = GraphDataset::new("stub");
        let labels = array![[0.1f32], [0.2]];
        ds.from_molecules(&StubProvider, &descriptors(&["CO", "N#N"]), &labels, false)
            .unwrap();

        let mut encoders = AttributeEncoders {
            include_atomic_number: true,
            ..AttributeEncoders::default()
        };
        ds.set_attributes(&mut encoders).unwrap();

        let g = ds.graphs().get(0).unwrap();
        let g = g.borrow();
        let nodes = g.get("node_attributes").unwrap().as_float().unwrap().clone();
        // 15 symbols + unknown slot + atomic number column.
        assert_eq!(nodes.shape(), &[2, 17]);
        assert_eq!(nodes[[0, 16]], 6.0);
        let edges = g.get("edge_attributes").unwrap().as_float().unwrap().clone();
        assert_eq!(edges.shape(), &[2, 4]);
        assert_eq!(edges[[0, 0]], 1.0); // single bond slot

        assert!(!encoders.symbol.found_values().is_empty());
    }

    #[test]
    fn save_and_load_round_trip_is_exact() {
        let mut ds = GraphDataset::new("roundtrip");
        let labels = array![[0.5f32], [1.5]];
        ds.from_molecules(&StubProvider, &descriptors(&["CO", "N#N"]), &labels, false)
            .unwrap();
        // Include a NaN sentinel to prove exact binary round-tripping.
        ds.graphs()
            .get(0)
            .unwrap()
            .borrow_mut()
            .set_edge_indices_reverse(molgraf_core::AttrRole::Edge)
            .unwrap();

        let path = std::env::temp_dir().join(format!(
            "molgraf-roundtrip-{}.bin",
            std::process::id()
        ));
        ds.save(Some(&path)).unwrap();

        let mut loaded = GraphDataset::new("roundtrip");
        let count = loaded.load(Some(&path)).unwrap();
        assert_eq!(count, 2);
        for i in 0..count {
            let original = ds.graphs().get(i).unwrap();
            let restored = loaded.graphs().get(i).unwrap();
            // NaN != NaN under PartialEq for floats inside arrays, so
            // compare attribute maps key by key with a NaN-aware check.
            let a = original.borrow().to_attrs();
            let b = restored.borrow().to_attrs();
            assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
            for (key, va) in &a {
                let vb = &b[key];
                match (va, vb) {
                    (molgraf_core::GraphValue::Float(x), molgraf_core::GraphValue::Float(y)) => {
                        assert_eq!(x.shape(), y.shape());
                        for (p, q) in x.iter().zip(y.iter()) {
                            assert_eq!(p.to_bits(), q.to_bits(), "attribute {key}");
                        }
                    }
                    _ => assert_eq!(va, vb, "attribute {key}"),
                }
            }
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn default_paths_require_a_directory() {
        let ds = GraphDataset::new("nodir");
        assert!(matches!(
            ds.save(None).unwrap_err(),
            DataError::MissingDirectory(_)
        ));
    }
}
