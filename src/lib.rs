//! # Lamina
//!
//! A mesh-processing core for polygonal surfaces with composable
//! geometric functions that each derive a new mesh from a base mesh
//! while tracking a bidirectional vertex-and-face correspondence with
//! local-frame transforms.
//!
//! ## Features
//!
//! - **Packed polygonal meshes**: structure-of-arrays storage for mixed
//!   triangle/quad/n-gon meshes with creased-edge flags
//! - **Topology queries**: adjacent-face-across-edge lookup and the
//!   ordered fan of faces around a vertex, with open/closed detection
//! - **Index mappings**: identity, bijective and many-to-many maps with
//!   a 4×4 transform per correspondence, and an associative composition
//!   operator to fuse derivation chains
//! - **Catmull–Clark subdivision**: creases, implicit boundary creases,
//!   and per-level maps composed back to the original base
//! - **Triangulation**: n-gon fans with face maps
//!
//! ## Quick Start
//!
//! ```
//! use lamina::prelude::*;
//!
//! let cube = PolyMesh::unit_cube();
//!
//! // One Catmull-Clark pass.
//! let result = subdivide(&cube, &SubdivideOptions::new(1)).unwrap();
//! assert_eq!(result.mesh.num_vertices(), 26);
//! assert_eq!(result.mesh.num_faces(), 24);
//!
//! // Where did base face 2 go?
//! let quads = result.face_map.from_base(2).unwrap();
//! assert_eq!(quads.indices.len(), 4);
//! ```
//!
//! ## Derivation chains
//!
//! Derived geometries can be chained; the per-level maps compose into a
//! single effective map back to the root:
//!
//! ```
//! use std::rc::Rc;
//! use lamina::prelude::*;
//!
//! let base = Rc::new(MeshGeometry::new(PolyMesh::unit_cube()));
//! let smooth = Rc::new(
//!     DerivedGeometry::new(base, MeshFunction::Subdivide(SubdivideOptions::new(1))).unwrap(),
//! );
//! let triangles = DerivedGeometry::new(smooth, MeshFunction::Triangulate).unwrap();
//!
//! let (vertex_map, face_map) = maps_to_root(&triangles).unwrap();
//! assert_eq!(face_map.from_base(0).unwrap().indices.len(), 8);
//! # let _ = vertex_map;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod interop;
pub mod map;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use lamina::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::subdivide::{
        subdivide, SubdivideMethod, SubdivideOptions, Subdivision,
    };
    pub use crate::algo::triangulate::{triangulate, Triangulation};
    pub use crate::error::{MeshError, Result};
    pub use crate::geometry::{
        maps_to_ancestor, maps_to_root, DerivedGeometry, Geometry, MeshFunction, MeshGeometry,
    };
    pub use crate::interop::{build_from_triangle_list, HostBuffers, SubdivisionSurface};
    pub use crate::map::{
        compile, compile_chain, ArrayMap, GeometryMap, IdentityMap, IndexMap, MapEntry,
        MapLengths, SymmetricMap,
    };
    pub use crate::mesh::{EdgeKey, FaceEdge, FaceView, MeshBuilder, PolyMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
