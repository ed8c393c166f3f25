//! Error types for lamina.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh and mapping operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// An element index is outside its valid range.
    #[error("{kind} index {index} out of bounds (len {len})")]
    OutOfBounds {
        /// What kind of element was addressed (vertex, face, edge, ...).
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// The number of valid elements.
        len: usize,
    },

    /// A seed face-edge passed to a vertex-fan query is not incident to
    /// the queried vertex.
    #[error("seed face-edge ({face}, {edge}) is not incident to vertex {vertex}")]
    SeedMismatch {
        /// The queried vertex.
        vertex: usize,
        /// Face of the seed face-edge.
        face: usize,
        /// Edge ordinal of the seed face-edge.
        edge: usize,
    },

    /// Two buffers or mappings that must agree in length do not.
    #[error("length mismatch: {upstream} != {downstream}")]
    LengthMismatch {
        /// Length on the upstream (left) side.
        upstream: usize,
        /// Length on the downstream (right) side.
        downstream: usize,
    },

    /// A buffer whose length must be a multiple of three is not.
    #[error("{what} length {len} is not a multiple of 3")]
    ShapeMismatch {
        /// Which buffer or element failed the check.
        what: &'static str,
        /// The offending length.
        len: usize,
    },

    /// A subdivision method identifier outside the supported enumeration.
    #[error("unknown subdivision method id {id}")]
    UnknownMethod {
        /// The unrecognized method id.
        id: u32,
    },

    /// A face has fewer than three corners or a zero-length edge.
    #[error("face {face} is degenerate")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// An index sequence supplied as a permutation maps two elements to
    /// the same target.
    #[error("index sequence is not a permutation: target {target} appears more than once")]
    InvalidPermutation {
        /// The duplicated target index.
        target: usize,
    },

    /// A correspondence transform could not be inverted.
    #[error("transform at entry {index} is singular")]
    SingularTransform {
        /// Position of the non-invertible matrix.
        index: usize,
    },
}
