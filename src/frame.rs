//! Local orthonormal frames on mesh elements.
//!
//! A [`Frame`] attaches an origin and a right-handed orthonormal basis
//! ⟨tangent, bitangent, normal⟩ to a face or vertex. Frames express the
//! rigid change of position and orientation between a parent element and
//! one of its refinement children; the resulting 4×4 matrices are what
//! the geometry maps carry per correspondence.
//!
//! Face frames sit at the face centroid with the normal averaged over
//! the face's triangle fan and the tangent along the first edge. Vertex
//! frames sit at the vertex with the normal averaged over incident faces
//! and the tangent along the first incident edge. Both tangents are
//! projected into the plane orthogonal to the normal; degenerate inputs
//! fall back to the +z normal and +x tangent.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::mesh::PolyMesh;

/// Minimum squared length for a direction to count as non-vanishing.
const DEGENERATE_EPS: f64 = 1e-24;

/// An origin plus a right-handed orthonormal basis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    /// Where the frame is anchored.
    pub origin: Point3<f64>,
    /// First basis vector (projected edge direction).
    pub tangent: Vector3<f64>,
    /// Second basis vector, `normal × tangent`.
    pub bitangent: Vector3<f64>,
    /// Third basis vector (surface normal estimate).
    pub normal: Vector3<f64>,
}

impl Frame {
    /// Build a frame from raw (possibly unnormalized, possibly
    /// degenerate) normal and tangent directions.
    ///
    /// The tangent is projected into the plane orthogonal to the normal
    /// and re-normalized. A vanishing normal falls back to (0, 0, 1); a
    /// tangent that vanishes after projection falls back to (1, 0, 0)
    /// projected the same way.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>, tangent: Vector3<f64>) -> Self {
        let normal = if normal.norm_squared() > DEGENERATE_EPS {
            normal.normalize()
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        };

        let mut t = tangent - normal * tangent.dot(&normal);
        if t.norm_squared() <= DEGENERATE_EPS {
            let fallback = Vector3::new(1.0, 0.0, 0.0);
            t = fallback - normal * fallback.dot(&normal);
            if t.norm_squared() <= DEGENERATE_EPS {
                // Normal is ±x; any perpendicular direction works.
                t = Vector3::new(0.0, 1.0, 0.0);
            }
        }
        let tangent = t.normalize();
        let bitangent = normal.cross(&tangent);

        Self {
            origin,
            tangent,
            bitangent,
            normal,
        }
    }

    /// The basis as a column matrix `[t b n]`.
    #[inline]
    pub fn basis(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.tangent, self.bitangent, self.normal])
    }

    /// The rigid motion carrying this frame onto `to`: its rotation takes
    /// this basis to the target basis and its translation takes this
    /// origin to the target origin.
    pub fn matrix_to(&self, to: &Frame) -> Matrix4<f64> {
        let rotation = to.basis() * self.basis().transpose();
        let translation = to.origin.coords - rotation * self.origin.coords;
        let mut m = rotation.to_homogeneous();
        m[(0, 3)] = translation.x;
        m[(1, 3)] = translation.y;
        m[(2, 3)] = translation.z;
        m
    }
}

/// Frame of one face: centroid origin, mean triangle-fan normal, first
/// edge as tangent.
pub fn face_frame(mesh: &PolyMesh, f: usize) -> Frame {
    let face = mesh.face_view(f);
    let degree = face.degree();
    let p0 = mesh.point(face.vertex(0));

    let mut normal = Vector3::zeros();
    for i in 1..degree - 1 {
        let e1 = mesh.point(face.vertex(i)) - p0;
        let e2 = mesh.point(face.vertex(i + 1)) - p0;
        normal += e1.cross(&e2);
    }
    normal /= (degree - 2) as f64;

    let tangent = mesh.point(face.vertex(1)) - p0;
    Frame::new(mesh.face_centroid(f), normal, tangent)
}

/// Frames of every face of the mesh, in face order.
pub fn face_frames(mesh: &PolyMesh) -> Vec<Frame> {
    (0..mesh.num_faces()).map(|f| face_frame(mesh, f)).collect()
}

/// Frames of every vertex of the mesh, in vertex order.
///
/// Each vertex frame uses the mean of the incident faces' normal
/// estimates and the direction of the vertex's first incident edge
/// (face/corner scan order), pointing away from the vertex. Isolated
/// vertices get the degenerate fallbacks.
pub fn vertex_frames(mesh: &PolyMesh) -> Vec<Frame> {
    let n = mesh.num_vertices();
    let mut normal_sum = vec![Vector3::zeros(); n];
    let mut face_count = vec![0u32; n];
    let mut first_edge: Vec<Option<Vector3<f64>>> = vec![None; n];

    for face in mesh.faces() {
        let normal = mesh.face_normal(face.index());
        for corner in 0..face.degree() {
            let a = face.vertex(corner);
            let b = face.vertex(corner + 1);
            normal_sum[a] += normal;
            face_count[a] += 1;
            if first_edge[a].is_none() {
                first_edge[a] = Some(mesh.point(b) - mesh.point(a));
            }
            if first_edge[b].is_none() {
                first_edge[b] = Some(mesh.point(a) - mesh.point(b));
            }
        }
    }

    (0..n)
        .map(|v| {
            let normal = if face_count[v] > 0 {
                normal_sum[v] / face_count[v] as f64
            } else {
                Vector3::zeros()
            };
            let tangent = first_edge[v].unwrap_or_else(Vector3::zeros);
            Frame::new(mesh.point(v), normal, tangent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    #[test]
    fn test_frame_is_orthonormal() {
        let frame = Frame::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(0.3, -0.2, 0.9),
            Vector3::new(1.0, 1.0, 0.2),
        );
        assert!((frame.tangent.norm() - 1.0).abs() < 1e-12);
        assert!((frame.bitangent.norm() - 1.0).abs() < 1e-12);
        assert!((frame.normal.norm() - 1.0).abs() < 1e-12);
        assert!(frame.tangent.dot(&frame.normal).abs() < 1e-12);
        assert!(frame.tangent.dot(&frame.bitangent).abs() < 1e-12);
        // Right-handed.
        assert!((frame.tangent.cross(&frame.bitangent) - frame.normal).norm() < 1e-12);
    }

    #[test]
    fn test_frame_fallbacks() {
        let degenerate = Frame::new(Point3::origin(), Vector3::zeros(), Vector3::zeros());
        assert_eq!(degenerate.normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(degenerate.tangent, Vector3::new(1.0, 0.0, 0.0));

        // Tangent parallel to the normal: projection vanishes.
        let parallel = Frame::new(
            Point3::origin(),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(0.0, 0.0, -5.0),
        );
        assert_eq!(parallel.tangent, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_matrix_to_carries_origin_and_basis() {
        let from = Frame::new(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
        );
        let to = Frame::new(
            Point3::new(2.0, 1.0, -1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        let m = from.matrix_to(&to);

        // Origin maps to origin.
        let p = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((p.xyz() - to.origin.coords).norm() < 1e-12);

        // Basis maps to basis.
        let t = m * Vector4::new(from.tangent.x, from.tangent.y, from.tangent.z, 0.0);
        assert!((t.xyz() - to.tangent).norm() < 1e-12);
        let n = m * Vector4::new(from.normal.x, from.normal.y, from.normal.z, 0.0);
        assert!((n.xyz() - to.normal).norm() < 1e-12);
    }

    #[test]
    fn test_matrix_to_inverse_composes_to_identity() {
        let a = Frame::new(
            Point3::new(1.0, 0.0, 2.0),
            Vector3::new(0.2, 0.9, 0.1),
            Vector3::new(1.0, 0.0, 0.0),
        );
        let b = Frame::new(
            Point3::new(-3.0, 4.0, 0.5),
            Vector3::new(0.0, 1.0, 1.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let m = b.matrix_to(&a) * a.matrix_to(&b);
        assert!((m - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_cube_face_frame() {
        let cube = PolyMesh::unit_cube();
        let frame = face_frame(&cube, 0);
        assert!((frame.origin - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
        assert!((frame.normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        // First edge of face 0 runs +x.
        assert!((frame.tangent - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_vertex_frames_cover_all_vertices() {
        let cube = PolyMesh::unit_cube();
        let frames = vertex_frames(&cube);
        assert_eq!(frames.len(), 8);
        for (v, frame) in frames.iter().enumerate() {
            assert!((frame.origin - cube.point(v)).norm() < 1e-12);
            assert!((frame.normal.norm() - 1.0).abs() < 1e-12);
        }
    }
}
