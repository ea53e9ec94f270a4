//! Error types for grid warping operations.

use thiserror::Error;

/// Errors that can occur during grid construction or deformation.
///
/// All errors are detected synchronously at call entry, before any grid
/// mutation takes place. Floating-point edge cases (a vertex coinciding with
/// a control point, a vanishing fit vector) are handled by clamping inside
/// the algorithm and never surface as errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WarpError {
    /// A geometric argument is NaN or infinite.
    #[error("argument '{name}' is not a finite number: {value}")]
    NonFiniteArgument {
        /// The name of the offending parameter.
        name: &'static str,
        /// The value that was passed.
        value: f64,
    },

    /// A dimension that must be strictly positive is zero or negative.
    #[error("argument '{name}' must be strictly positive, got {value}")]
    NonPositiveDimension {
        /// The name of the offending parameter.
        name: &'static str,
        /// The value that was passed.
        value: f64,
    },

    /// No control points were provided.
    #[error("no control points provided (deformation needs at least one)")]
    NoControlPoints,

    /// Base and current control point slices differ in length.
    #[error("control point slices differ in length: {base} base vs {current} current")]
    ControlPointMismatch {
        /// Number of base (rest pose) control points.
        base: usize,
        /// Number of current (deformed pose) control points.
        current: usize,
    },

    /// An interleaved coordinate buffer has an odd number of values.
    #[error("interleaved coordinate buffer has odd length {len}")]
    OddCoordinateCount {
        /// The length of the buffer.
        len: usize,
    },
}

/// Result type for warping operations.
pub type WarpResult<T> = Result<T, WarpError>;
