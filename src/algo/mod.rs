//! Mesh-derivation algorithms.
//!
//! This module contains the geometric functions that derive a new mesh
//! from a base mesh while emitting the index maps relating the two:
//!
//! - **Triangulation**: n-gon faces fanned into triangles
//! - **Subdivision**: Catmull–Clark refinement with creases
//!
//! Both passes leave the base mesh untouched and return the derived mesh
//! together with a vertex map and a face map.

pub mod subdivide;
pub mod triangulate;
