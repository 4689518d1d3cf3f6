#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Dataset ingestion and persistence for molecular graph collections.
//!
//! Built on top of [`molgraf_core`], this crate turns tabular molecule
//! sources into [`molgraf_core::GraphCollection`]s:
//!
//! - [`TableFile`] - CSV tables with a descriptor column and label
//!   columns ([`LabelSpec`])
//! - [`MoleculeProvider`] - the one-directional boundary to an external
//!   cheminformatics toolkit, exchanging [`MoleculeGraph`] values
//! - [`GraphDataset`] - a named collection with table reading, molecule
//!   ingestion, one-hot attribute generation and binary save/load
//! - [`DatasetRegistry`] - a closed registry mapping [`DatasetKind`]
//!   tags to loader functions

pub mod dataset;
pub mod encoder;
pub mod error;
pub mod molecule;
pub mod registry;
pub mod table;

pub use dataset::{AttributeEncoders, GraphDataset};
pub use encoder::{Category, OneHotEncoder};
pub use error::{DataError, Result};
pub use molecule::{MoleculeGraph, MoleculeProvider};
pub use registry::{DatasetConfig, DatasetKind, DatasetRegistry};
pub use table::{LabelSpec, TableFile};
