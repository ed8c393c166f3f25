//! Mesh subdivision.
//!
//! This module provides Catmull–Clark subdivision for polygonal meshes
//! (Catmull & Clark, 1978). Unlike a plain refinement pass, the
//! subdivision here also emits the vertex and face maps relating the
//! refined mesh back to its base, so index references and local-frame
//! transforms can be translated across refinement levels.
//!
//! # Creases and boundaries
//!
//! Edges flagged as creased on the input mesh resist smoothing: their
//! edge points sit at the plain midpoint, and the vertex rules switch to
//! the crease and corner formulas depending on how many sharp edges meet
//! at a vertex. Mesh boundaries are treated as implicit creases when
//! [`SubdivideOptions::boundary_as_crease`] is set (the default).
//!
//! # Example
//!
//! ```
//! use lamina::algo::subdivide::{subdivide, SubdivideOptions};
//! use lamina::mesh::PolyMesh;
//!
//! let cube = PolyMesh::unit_cube();
//! let result = subdivide(&cube, &SubdivideOptions::new(1)).unwrap();
//! assert_eq!(result.mesh.num_vertices(), 26);
//! assert_eq!(result.mesh.num_faces(), 24);
//! ```
//!
//! # References
//!
//! - Catmull, E. & Clark, J. (1978). "Recursively generated B-spline
//!   surfaces on arbitrary topological meshes." Computer-Aided Design,
//!   10(6), 350-355.

mod catmull_clark;

pub use catmull_clark::catmull_clark;

use crate::error::{MeshError, Result};
use crate::map::GeometryMap;
use crate::mesh::PolyMesh;

/// The supported subdivision schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubdivideMethod {
    /// Catmull–Clark subdivision.
    #[default]
    CatmullClark,
}

impl SubdivideMethod {
    /// Resolve a host-supplied method identifier.
    ///
    /// Id 0 is Catmull–Clark; anything else fails with
    /// [`MeshError::UnknownMethod`].
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(SubdivideMethod::CatmullClark),
            _ => Err(MeshError::UnknownMethod { id }),
        }
    }
}

/// Options for subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,

    /// Whether one-sided (boundary) edges are treated as creases.
    pub boundary_as_crease: bool,

    /// Which subdivision scheme to run.
    pub method: SubdivideMethod,
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            boundary_as_crease: true,
            method: SubdivideMethod::CatmullClark,
        }
    }

    /// Set whether boundaries are treated as creases.
    pub fn with_boundary_as_crease(mut self, boundary_as_crease: bool) -> Self {
        self.boundary_as_crease = boundary_as_crease;
        self
    }

    /// Set the subdivision scheme.
    pub fn with_method(mut self, method: SubdivideMethod) -> Self {
        self.method = method;
        self
    }
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Result of a subdivision pass: the refined mesh plus the maps relating
/// it to the original base, across all iterations.
#[derive(Clone, Debug)]
pub struct Subdivision {
    /// The refined mesh.
    pub mesh: PolyMesh,
    /// Base vertices ↔ refined vertices.
    pub vertex_map: GeometryMap,
    /// Base faces ↔ refined faces.
    pub face_map: GeometryMap,
}

/// Subdivide `mesh` with the scheme selected in `options`.
pub fn subdivide(mesh: &PolyMesh, options: &SubdivideOptions) -> Result<Subdivision> {
    match options.method {
        SubdivideMethod::CatmullClark => catmull_clark(mesh, options),
    }
}
