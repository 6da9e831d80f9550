//! Error types for polygonal map generation

use thiserror::Error;

/// Errors that can occur during map generation or graph queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// Configuration validation failed; raised before any generation pass runs
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The point set cannot be turned into a graph (too few or degenerate points)
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    /// A structural invariant of the Center/Corner/Edge graph does not hold
    #[error("graph invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result type alias for map operations
pub type Result<T> = std::result::Result<T, MapError>;
