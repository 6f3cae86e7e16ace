//! Error types for network evaluation and training
//!
//! Every fallible operation in the crate returns [`Result`]. Shape mismatches on
//! the forward and backward passes surface here instead of as empty vectors, and
//! an infeasible minibatch is reported explicitly rather than silently ignored.
//! Budget exhaustion is not an error: optimizers return `Ok` with a report.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Input vector length differs from the network's input width
    #[error("input has {actual} values but the network expects {expected}")]
    InputShape { expected: usize, actual: usize },

    /// Expected-output vector length differs from the network's output width
    #[error("expected output has {actual} values but the network produces {expected}")]
    OutputShape { expected: usize, actual: usize },

    /// Replacement weight set has the wrong number of matrices
    #[error("weight set has {actual} matrices but the topology requires {expected}")]
    WeightCount { expected: usize, actual: usize },

    /// Replacement weight matrix has the wrong shape
    #[error("weight matrix {index} has shape {actual:?} but the topology requires {expected:?}")]
    WeightShape {
        index: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Inputs and expected outputs are not paired one to one
    #[error("{inputs} inputs cannot be paired with {expecteds} expected outputs")]
    DatasetMismatch { inputs: usize, expecteds: usize },

    /// Training or evaluation set has no pairs
    #[error("training set is empty")]
    EmptyDataset,

    /// Minibatch cannot be drawn without replacement
    #[error("batch size {batch_size} exceeds the {dataset_size} available training pairs")]
    BatchTooLarge {
        batch_size: usize,
        dataset_size: usize,
    },

    /// Layer widths cannot form a network
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Hyperparameter or distribution parameter out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration document failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
