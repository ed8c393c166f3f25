//! Bidirectional index mappings with per-correspondence transforms.
//!
//! A geometry map relates the elements of a *derived* space (the `self`
//! space of a derived mesh) to the elements of its *base* space, in both
//! directions, with a 4×4 transform attached to every correspondence.
//! Maps are what let downstream consumers translate vertex and face
//! indices, and their local-frame changes, across triangulation and
//! subdivision passes; [`compile`] fuses the maps of adjacent passes
//! into one.
//!
//! # Shapes
//!
//! | Kind | Cardinality | Storage |
//! |------|-------------|---------|
//! | [`IdentityMap`] | 1↔1, `i` ↔ `i` | just the length |
//! | [`SymmetricMap`] | 1↔1 permutation | both directions, one derived from the other at construction |
//! | [`ArrayMap`] | many↔many | CSR offsets + indices + transforms, both directions |
//!
//! # Transform convention
//!
//! The transform attached to a query result always maps the **queried**
//! element's local frame to the **result** element's frame. The two
//! directions of one correspondence therefore carry mutually inverse
//! matrices; [`SymmetricMap`] enforces this by construction, and
//! [`ArrayMap`] producers are expected to uphold it.
//!
//! Query results own their buffers: a [`MapEntry`] copies the indices
//! and transforms out of the map, so it stays valid however long the
//! caller keeps it.

mod array;
mod compile;
mod identity;
mod symmetric;

pub use array::{ArrayMap, MapHalf};
pub use compile::{compile, compile_chain};
pub use identity::IdentityMap;
pub use symmetric::SymmetricMap;

use nalgebra::Matrix4;

use crate::error::Result;

/// The sizes of a map's two index spaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapLengths {
    /// Number of elements in the base space.
    pub base: usize,
    /// Number of elements in the derived (`self`) space.
    pub derived: usize,
}

/// One query result: the corresponding indices in the opposite space and
/// one transform per index.
#[derive(Clone, Debug, PartialEq)]
pub struct MapEntry {
    /// Corresponding element indices.
    pub indices: Vec<usize>,
    /// One 4×4 transform per index, in the same order.
    pub transforms: Vec<Matrix4<f64>>,
}

impl MapEntry {
    /// An empty entry.
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            transforms: Vec::new(),
        }
    }
}

/// Common query interface of all map shapes.
pub trait IndexMap {
    /// The sizes of the two index spaces.
    fn lengths(&self) -> MapLengths;

    /// Elements of the derived space corresponding to base element
    /// `index`, with transforms.
    fn from_base(&self, index: usize) -> Result<MapEntry>;

    /// Elements of the base space corresponding to derived element
    /// `index`, with transforms.
    fn to_base(&self, index: usize) -> Result<MapEntry>;
}

/// A map of any shape, as stored by geometries.
#[derive(Clone, Debug)]
pub enum GeometryMap {
    /// The identity map.
    Identity(IdentityMap),
    /// A bijective (permutation) map.
    Symmetric(SymmetricMap),
    /// A general many-to-many map.
    Array(ArrayMap),
}

impl IndexMap for GeometryMap {
    fn lengths(&self) -> MapLengths {
        match self {
            GeometryMap::Identity(m) => m.lengths(),
            GeometryMap::Symmetric(m) => m.lengths(),
            GeometryMap::Array(m) => m.lengths(),
        }
    }

    fn from_base(&self, index: usize) -> Result<MapEntry> {
        match self {
            GeometryMap::Identity(m) => m.from_base(index),
            GeometryMap::Symmetric(m) => m.from_base(index),
            GeometryMap::Array(m) => m.from_base(index),
        }
    }

    fn to_base(&self, index: usize) -> Result<MapEntry> {
        match self {
            GeometryMap::Identity(m) => m.to_base(index),
            GeometryMap::Symmetric(m) => m.to_base(index),
            GeometryMap::Array(m) => m.to_base(index),
        }
    }
}

impl From<IdentityMap> for GeometryMap {
    fn from(m: IdentityMap) -> Self {
        GeometryMap::Identity(m)
    }
}

impl From<SymmetricMap> for GeometryMap {
    fn from(m: SymmetricMap) -> Self {
        GeometryMap::Symmetric(m)
    }
}

impl From<ArrayMap> for GeometryMap {
    fn from(m: ArrayMap) -> Self {
        GeometryMap::Array(m)
    }
}
