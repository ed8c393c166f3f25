//! Core mesh data structures and topology queries.
//!
//! This module provides the packed polygonal mesh representation and the
//! shared-edge topology queries built on top of it.
//!
//! # Overview
//!
//! The primary type is [`PolyMesh`], a structure-of-arrays mesh storing
//! vertex positions as three parallel coordinate arrays and faces of
//! arbitrary degree as a packed vertex-index buffer with 1-based end
//! offsets. [`MeshBuilder`] is its growable counterpart, used while a
//! refinement pass assembles its output.
//!
//! Topology queries address directed edges as [`FaceEdge`] pairs and
//! answer three questions: which face lies across an edge
//! ([`PolyMesh::face_adjacent`]), which edges touch a vertex
//! ([`PolyMesh::edges_with`]), and what is the ordered fan of faces
//! around a vertex ([`PolyMesh::vertex_neighbors`]).
//!
//! # Construction
//!
//! ```
//! use lamina::mesh::MeshBuilder;
//!
//! let mut builder = MeshBuilder::new();
//! builder.push_vertex(0.0, 0.0, 0.0);
//! builder.push_vertex(1.0, 0.0, 0.0);
//! builder.push_vertex(0.5, 1.0, 0.0);
//! builder.push_face(&[0, 1, 2]);
//!
//! let mesh = builder.freeze().unwrap();
//! assert_eq!(mesh.num_faces(), 1);
//! ```

mod store;
mod topology;

pub use store::{EdgeKey, FaceView, MeshBuilder, PolyMesh};
pub use topology::{FaceEdge, OrientedFaceEdge, Orientation, VertexFan, VertexNeighbor};
