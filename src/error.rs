//! Error types for world construction, queries and the supporting math.
//!
//! Per-tick simulation never fails; every error here is raised at construction,
//! configuration or query time and points at a caller mistake or an unsolvable
//! input configuration.

use thiserror::Error;

use crate::body::BodyHandle;

/// Errors raised by [`Matrix`](crate::fixed_math::Matrix) and
/// [`Transform2D`](crate::fixed_math::Transform2D) algebra.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// A matrix was requested with a zero row or column count.
    #[error("matrix dimensions must be positive, got {rows}x{cols}")]
    InvalidDimensions {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },

    /// Operand sizes are incompatible for the requested operation.
    #[error("cannot {op} a {lhs_rows}x{lhs_cols} matrix with a {rhs_rows}x{rhs_cols} matrix")]
    DimensionMismatch {
        /// Operation name ("add", "multiply").
        op: &'static str,
        /// Left operand rows.
        lhs_rows: usize,
        /// Left operand columns.
        lhs_cols: usize,
        /// Right operand rows.
        rhs_rows: usize,
        /// Right operand columns.
        rhs_cols: usize,
    },

    /// Inversion was requested on a non-square matrix.
    #[error("only square matrices can be inverted, got {rows}x{cols}")]
    NotSquare {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// The matrix is square but linearly dependent (zero or near-zero pivot).
    #[error("matrix is singular and cannot be inverted")]
    Singular,
}

/// Errors raised by the physics world.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// Shape geometry cannot produce a valid area, normal or radius.
    #[error("degenerate shape: {0}")]
    DegenerateShape(&'static str),

    /// Polygon vertices were supplied in clockwise order.
    #[error("polygon vertices must wind counter-clockwise")]
    InvalidWinding,

    /// A body definition carried no shapes.
    #[error("a body needs at least one shape")]
    EmptyBody,

    /// The handle does not refer to a live body (destroyed or never created).
    #[error("body {0:?} does not exist in this world")]
    BodyNotFound(BodyHandle),

    /// A historical query asked for more ticks than the world retains.
    #[error("requested {requested} ticks behind but only {retained} are retained")]
    HistoryOutOfRange {
        /// Requested offset in ticks.
        requested: usize,
        /// Configured history length.
        retained: usize,
    },

    /// A direction that must be non-zero had zero length.
    #[error("zero-length vector: {0}")]
    ZeroLengthVector(&'static str),

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read config {path}: {message}")]
    ConfigIo {
        /// Path that failed.
        path: String,
        /// Underlying IO error text.
        message: String,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(String),

    /// A snapshot could not be encoded, decoded or applied.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Underlying matrix algebra failed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
