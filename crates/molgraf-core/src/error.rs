//! Error types for molgraf-core.

use thiserror::Error;

/// Error type for graph container and batching operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A topology operation was invoked before the required index attribute was set.
    #[error("can not operate on '{prefix}', as '{prefix}indices' is not defined")]
    MissingIndices {
        /// Attribute prefix of the missing index array, e.g. `edge_`.
        prefix: String,
    },

    /// Bulk assignment length disagrees with collection length.
    #[error("can only assign graph attributes from a list of matching length: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Collection indexing with an unrecognized or out-of-range selector.
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),

    /// A batched attribute is absent on one of the graphs.
    #[error("attribute '{name}' missing on graph {index}")]
    MissingAttribute { name: String, index: usize },

    /// An attribute does not have the shape a typed view requires.
    #[error("attribute '{name}' has shape {got}, expected {expected}")]
    ShapeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// An attribute does not have the element type a typed view requires.
    #[error("attribute '{name}' is not of dtype {expected}")]
    DTypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// An attribute key without a recognized role prefix.
    #[error("key '{0}' does not start with a known role prefix (node_, edge_, graph_, range_, angle_)")]
    UnknownRole(String),

    /// The batch schema is inconsistent, e.g. an indices descriptor without node descriptors.
    #[error("invalid batch schema: {0}")]
    BadSchema(String),
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
