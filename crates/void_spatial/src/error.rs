//! Error types for spatial math
//!
//! Numeric degeneracy (zero-length axes, antiparallel directions, vanishing
//! norms) is never reported here. Those cases resolve through fallback
//! branches or propagate as NaN/infinity. Only caller mistakes that have no
//! numeric interpretation become errors.

use thiserror::Error;

/// Spatial math errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// Component index outside the type's valid range
    #[error("Component index {index} out of range for a {len}-component value")]
    ComponentOutOfRange { index: usize, len: usize },

    /// Matrix element outside the column/row range
    #[error("Matrix element ({column}, {row}) out of range for a {columns}x{rows} matrix")]
    ElementOutOfRange {
        column: usize,
        row: usize,
        columns: usize,
        rows: usize,
    },

    /// Weighted interpolation over an empty sequence
    #[error("Cannot interpolate an empty quaternion sequence")]
    EmptySequence,

    /// Weighted interpolation with one weight per quaternion missing
    #[error("Weight count mismatch: {quaternions} quaternions, {weights} weights")]
    WeightCountMismatch { quaternions: usize, weights: usize },
}

/// Result type for spatial operations
pub type Result<T> = std::result::Result<T, SpatialError>;
