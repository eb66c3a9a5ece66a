//! This module defines the single, unified error type for the entire grainpipe
//! library. It uses the `thiserror` crate to provide ergonomic, context-aware
//! error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrainpipeError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Data container '{0}' does not exist in the data structure")]
    MissingDataContainer(String),

    #[error("Attribute matrix '{path}' does not exist in data container '{container}'")]
    MissingAttributeMatrix { container: String, path: String },

    #[error("Required array '{path}' is not usable: {cause}")]
    PrerequisiteMissing { path: String, cause: PrereqFailure },

    #[error(
        "Array '{array}' has {array_tuples} tuples but attribute matrix '{matrix}' holds {matrix_tuples}"
    )]
    AllocationShapeConflict {
        matrix: String,
        array: String,
        matrix_tuples: usize,
        array_tuples: usize,
    },

    #[error("Filter parameter error: {0}")]
    ParameterError(String),

    #[error("Pipeline document does not name a registered filter: '{0}'")]
    UnknownFilter(String),

    #[error("Statistics artifact serialization/deserialization failed: {0}")]
    StatsFormatError(String),

    #[error("Pipeline execution was cancelled")]
    Cancelled,

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically during pipeline-document
    /// serialization.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error
}

/// The concrete reason a prerequisite array lookup failed. Filters translate
/// these into their own negative error codes; the store never guesses codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrereqFailure {
    Absent,
    WrongScalarType { expected: String, actual: String },
    WrongComponentCount { expected: usize, actual: usize },
}

impl std::fmt::Display for PrereqFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrereqFailure::Absent => write!(f, "the array does not exist"),
            PrereqFailure::WrongScalarType { expected, actual } => {
                write!(f, "expected scalar type {}, found {}", expected, actual)
            }
            PrereqFailure::WrongComponentCount { expected, actual } => {
                write!(
                    f,
                    "expected {} component(s) per tuple, found {}",
                    expected, actual
                )
            }
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for GrainpipeError {
    fn from(err: bytemuck::PodCastError) -> Self {
        GrainpipeError::PodCast(err.to_string())
    }
}
