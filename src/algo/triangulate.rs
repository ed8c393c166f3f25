//! Fan triangulation of polygonal faces.

use nalgebra::Matrix4;

use crate::error::Result;
use crate::map::{ArrayMap, GeometryMap, IdentityMap, MapHalf};
use crate::mesh::PolyMesh;

/// Result of a triangulation pass: the triangle mesh plus the maps
/// relating it to the input.
///
/// Vertices are shared with the input, so the vertex map is the
/// identity. The face map relates each input face to the contiguous run
/// of triangles fanned out of it, with identity transforms.
#[derive(Clone, Debug)]
pub struct Triangulation {
    /// The derived all-triangle mesh.
    pub mesh: PolyMesh,
    /// Identity over the shared vertices.
    pub vertex_map: GeometryMap,
    /// Input face ↔ output triangles.
    pub face_map: GeometryMap,
}

/// Fan-triangulate every face of the mesh.
///
/// A face of degree `d` becomes the `d − 2` triangles
/// `(v0, v1, v2), (v0, v2, v3), …`, emitted in face order; triangles of
/// the input pass through unchanged. Creased edges survive (every
/// original edge is still an edge of some triangle); the fan diagonals
/// are never creased.
pub fn triangulate(mesh: &PolyMesh) -> Result<Triangulation> {
    let num_faces = mesh.num_faces();
    // Worst case for a single n-gon; the buffers shrink to the true
    // count when frozen.
    let upper = mesh.indices().len().saturating_sub(num_faces + 1).max(1);

    let mut builder = mesh.to_builder_positions_only();
    let mut from_base = MapHalf::with_capacity(num_faces, upper);
    let mut to_base = MapHalf::with_capacity(upper, upper);

    for face in mesh.faces() {
        let v0 = face.vertex(0) as u32;
        for i in 1..face.degree() - 1 {
            let tri = builder.push_face(&[v0, face.vertex(i) as u32, face.vertex(i + 1) as u32]);
            from_base.push_entry(tri, Matrix4::identity());
            to_base.push_entry(face.index(), Matrix4::identity());
            to_base.finish_row();
        }
        from_base.finish_row();
    }

    for key in mesh.creased_edges() {
        let (a, b) = key.endpoints();
        builder.crease(a, b);
    }

    let out = builder.freeze()?;
    let num_vertices = out.num_vertices();
    Ok(Triangulation {
        mesh: out,
        vertex_map: GeometryMap::Identity(IdentityMap::new(num_vertices)),
        face_map: GeometryMap::Array(ArrayMap::new(from_base, to_base)?),
    })
}
