//! Packed polygonal mesh storage.
//!
//! This module provides the structure-of-arrays mesh representation used
//! throughout the library: three parallel coordinate arrays for vertex
//! positions, a packed vertex-index buffer for faces of arbitrary degree,
//! and a set of creased (sharp) edges.
//!
//! # Face addressing
//!
//! Faces are addressed through a 1-based end-offset sequence: face `f`
//! occupies the half-open index range `[offset1[f - 1], offset1[f])`, with
//! `offset1[-1]` taken to be zero. Degrees may mix freely: triangles,
//! quads and general n-gons can coexist in one mesh.
//!
//! # Packed vs. modifiable
//!
//! [`PolyMesh`] is the packed, immutable flavor used by all topology
//! queries and hot loops. [`MeshBuilder`] is the growable flavor used
//! while a refinement pass assembles its output; [`MeshBuilder::freeze`]
//! validates the buffers and packs them. The two are semantically the
//! same mesh in different storage.
//!
//! ```
//! use lamina::mesh::PolyMesh;
//!
//! let cube = PolyMesh::unit_cube();
//! assert_eq!(cube.num_vertices(), 8);
//! assert_eq!(cube.num_faces(), 6);
//! assert_eq!(cube.face(0).unwrap().vertices(), &[0, 1, 2, 3]);
//! ```

use std::collections::HashSet;
use std::fmt::{self, Debug};

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};

/// Canonical key for an undirected edge.
///
/// The smaller endpoint is packed into the high 32 bits, so the key is a
/// pure function of the unordered vertex pair and orders edges
/// lexicographically by (min, max).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(u64);

impl EdgeKey {
    /// Create the canonical key for the undirected edge `{a, b}`.
    #[inline]
    pub fn new(a: u32, b: u32) -> Self {
        let (min, max) = if a < b { (a, b) } else { (b, a) };
        EdgeKey(((min as u64) << 32) | max as u64)
    }

    /// The two endpoints, smaller first.
    #[inline]
    pub fn endpoints(self) -> (u32, u32) {
        ((self.0 >> 32) as u32, self.0 as u32)
    }

    /// Given one endpoint, return the other.
    #[inline]
    pub fn other(self, vertex: u32) -> u32 {
        let (a, b) = self.endpoints();
        if vertex == a {
            b
        } else {
            a
        }
    }
}

impl Debug for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.endpoints();
        write!(f, "E({}, {})", a, b)
    }
}

/// A read-only view of one face of a [`PolyMesh`].
///
/// The vertex slice borrows the mesh's packed index buffer directly; no
/// copy is made. The borrow ties the view's lifetime to the mesh, so a
/// view can never outlive or observe a mutation of its storage.
#[derive(Copy, Clone, Debug)]
pub struct FaceView<'a> {
    index: usize,
    start: usize,
    end: usize,
    vertices: &'a [u32],
}

impl<'a> FaceView<'a> {
    /// Index of this face in the mesh.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of corners (and edges) of this face.
    #[inline]
    pub fn degree(&self) -> usize {
        self.end - self.start
    }

    /// The face's vertex indices, in winding order.
    #[inline]
    pub fn vertices(&self) -> &'a [u32] {
        self.vertices
    }

    /// Vertex index at the given corner, wrapping modulo the degree.
    #[inline]
    pub fn vertex(&self, corner: usize) -> usize {
        self.vertices[corner % self.degree()] as usize
    }

    /// The face's `[start, end)` range in the packed index buffer.
    #[inline]
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// A packed polygonal mesh.
///
/// Positions are stored as three parallel coordinate arrays; faces as a
/// packed vertex-index buffer plus 1-based end offsets (see the module
/// docs). A `PolyMesh` is immutable once built: construct one through
/// [`MeshBuilder`], [`crate::interop::build_from_triangle_list`], or an
/// example constructor such as [`PolyMesh::unit_cube`].
#[derive(Debug, Clone)]
pub struct PolyMesh {
    x: Box<[f64]>,
    y: Box<[f64]>,
    z: Box<[f64]>,
    indices: Box<[u32]>,
    offset1: Box<[u32]>,
    creased: HashSet<EdgeKey>,
}

impl PolyMesh {
    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.offset1.len()
    }

    /// The packed face vertex-index buffer.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The 1-based face end offsets; the last element equals
    /// `indices().len()`.
    #[inline]
    pub fn offset1(&self) -> &[u32] {
        &self.offset1
    }

    /// Position of vertex `i`, bounds-checked.
    pub fn vertex(&self, i: usize) -> Result<Point3<f64>> {
        if i >= self.num_vertices() {
            return Err(MeshError::OutOfBounds {
                kind: "vertex",
                index: i,
                len: self.num_vertices(),
            });
        }
        Ok(self.point(i))
    }

    /// View of face `i`, bounds-checked.
    pub fn face(&self, i: usize) -> Result<FaceView<'_>> {
        if i >= self.num_faces() {
            return Err(MeshError::OutOfBounds {
                kind: "face",
                index: i,
                len: self.num_faces(),
            });
        }
        Ok(self.face_view(i))
    }

    /// Iterate over all faces as views.
    pub fn faces(&self) -> impl Iterator<Item = FaceView<'_>> + '_ {
        (0..self.num_faces()).map(|f| self.face_view(f))
    }

    /// Position of a vertex known to be in range.
    #[inline]
    pub(crate) fn point(&self, i: usize) -> Point3<f64> {
        Point3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Start of face `f` in the packed index buffer (`offset1[f - 1]`).
    #[inline]
    fn face_start(&self, f: usize) -> usize {
        if f == 0 {
            0
        } else {
            self.offset1[f - 1] as usize
        }
    }

    #[inline]
    pub(crate) fn face_view(&self, f: usize) -> FaceView<'_> {
        let start = self.face_start(f);
        let end = self.offset1[f] as usize;
        FaceView {
            index: f,
            start,
            end,
            vertices: &self.indices[start..end],
        }
    }

    // ==================== Creased edges ====================

    /// Whether the undirected edge `key` is flagged as creased.
    #[inline]
    pub fn is_creased(&self, key: EdgeKey) -> bool {
        self.creased.contains(&key)
    }

    /// Iterate over the creased-edge keys (unordered).
    pub fn creased_edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.creased.iter().copied()
    }

    /// Number of creased edges.
    #[inline]
    pub fn num_creased_edges(&self) -> usize {
        self.creased.len()
    }

    // ==================== Conversion ====================

    /// Deep-copy the positions into a builder with no faces and no
    /// creases, for passes that rebuild connectivity from scratch.
    pub fn to_builder_positions_only(&self) -> MeshBuilder {
        MeshBuilder {
            x: self.x.to_vec(),
            y: self.y.to_vec(),
            z: self.z.to_vec(),
            indices: Vec::new(),
            offset1: Vec::new(),
            creased: HashSet::new(),
        }
    }

    /// Deep-copy into the modifiable flavor.
    pub fn to_builder(&self) -> MeshBuilder {
        MeshBuilder {
            x: self.x.to_vec(),
            y: self.y.to_vec(),
            z: self.z.to_vec(),
            indices: self.indices.to_vec(),
            offset1: self.offset1.to_vec(),
            creased: self.creased.clone(),
        }
    }

    // ==================== Aggregates ====================

    /// Centroid of face `f` (mean of its corner positions).
    pub fn face_centroid(&self, f: usize) -> Point3<f64> {
        let face = self.face_view(f);
        let mut sum = Vector3::zeros();
        for &v in face.vertices() {
            sum += self.point(v as usize).coords;
        }
        Point3::from(sum / face.degree() as f64)
    }

    /// Unnormalized normal estimate for face `f`: the cross product of
    /// the 0→1 and 0→2 edges.
    pub fn face_normal(&self, f: usize) -> Vector3<f64> {
        let face = self.face_view(f);
        let p0 = self.point(face.vertex(0));
        let e1 = self.point(face.vertex(1)) - p0;
        let e2 = self.point(face.vertex(2)) - p0;
        e1.cross(&e2)
    }

    /// Mean of the per-face centroids over a set of faces.
    ///
    /// Returns the origin for an empty set.
    pub fn mean_centroid(&self, faces: &[u32]) -> Point3<f64> {
        if faces.is_empty() {
            return Point3::origin();
        }
        let mut sum = Vector3::zeros();
        for &f in faces {
            sum += self.face_centroid(f as usize).coords;
        }
        Point3::from(sum / faces.len() as f64)
    }

    /// Mean of the per-face normal estimates over a set of faces.
    ///
    /// Returns the zero vector for an empty set.
    pub fn mean_normal(&self, faces: &[u32]) -> Vector3<f64> {
        if faces.is_empty() {
            return Vector3::zeros();
        }
        let mut sum = Vector3::zeros();
        for &f in faces {
            sum += self.face_normal(f as usize);
        }
        sum / faces.len() as f64
    }

    // ==================== Examples ====================

    /// A unit cube: 8 vertices, 6 quad faces, no creases.
    ///
    /// Face 0 is `[0, 1, 2, 3]` (the z = 0 face); the remaining faces are
    /// wound consistently with it so every interior edge is traversed
    /// once in each direction.
    pub fn unit_cube() -> PolyMesh {
        const POSITIONS: [[f64; 3]; 8] = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        const FACES: [[u32; 4]; 6] = [
            [0, 1, 2, 3],
            [5, 4, 7, 6],
            [1, 0, 4, 5],
            [3, 2, 6, 7],
            [2, 1, 5, 6],
            [0, 3, 7, 4],
        ];

        let mut builder = MeshBuilder::with_capacity(8, 6, 24);
        for p in POSITIONS {
            builder.push_vertex(p[0], p[1], p[2]);
        }
        for f in FACES {
            builder.push_face(&f);
        }
        builder.freeze().expect("unit cube is a valid mesh")
    }
}

/// The modifiable mesh flavor: the same triple of position, index and
/// creased-edge data as [`PolyMesh`], held in growable buffers.
///
/// Refinement passes accumulate their output here and call
/// [`MeshBuilder::freeze`] to validate and pack the result before
/// publishing it.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    indices: Vec<u32>,
    offset1: Vec<u32>,
    creased: HashSet<EdgeKey>,
}

impl MeshBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with pre-allocated capacity.
    ///
    /// `corners` is the expected total length of the packed index buffer
    /// (the sum of all face degrees).
    pub fn with_capacity(vertices: usize, faces: usize, corners: usize) -> Self {
        Self {
            x: Vec::with_capacity(vertices),
            y: Vec::with_capacity(vertices),
            z: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(corners),
            offset1: Vec::with_capacity(faces),
            creased: HashSet::new(),
        }
    }

    /// Number of vertices pushed so far.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }

    /// Number of faces pushed so far.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.offset1.len()
    }

    /// Append a vertex and return its index.
    #[inline]
    pub fn push_vertex(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
        self.x.len() - 1
    }

    /// Append a vertex from a point and return its index.
    #[inline]
    pub fn push_point(&mut self, p: Point3<f64>) -> usize {
        self.push_vertex(p.x, p.y, p.z)
    }

    /// Append a face given its corner vertex indices, in winding order.
    /// Returns the face index. Validation happens at [`freeze`](Self::freeze).
    pub fn push_face(&mut self, corners: &[u32]) -> usize {
        self.indices.extend_from_slice(corners);
        self.offset1.push(self.indices.len() as u32);
        self.offset1.len() - 1
    }

    /// Flag the undirected edge `{a, b}` as creased.
    ///
    /// Keys that do not match an edge of any face by the time the builder
    /// is frozen are dropped.
    #[inline]
    pub fn crease(&mut self, a: u32, b: u32) {
        self.creased.insert(EdgeKey::new(a, b));
    }

    /// Validate and pack into a [`PolyMesh`].
    ///
    /// Checks that every face index is in range, that every face has at
    /// least three corners, and that no face has a zero-length edge
    /// (consecutive equal vertices, including the closing edge). Creased
    /// keys whose endpoints are not consecutive vertices of any face are
    /// discarded.
    pub fn freeze(self) -> Result<PolyMesh> {
        let num_vertices = self.x.len();
        let mut start = 0usize;
        let mut face_edges: HashSet<EdgeKey> = HashSet::new();

        for (f, &end) in self.offset1.iter().enumerate() {
            let end = end as usize;
            let degree = end - start;
            if degree < 3 {
                return Err(MeshError::DegenerateFace { face: f });
            }
            for i in start..end {
                let v = self.indices[i] as usize;
                if v >= num_vertices {
                    return Err(MeshError::OutOfBounds {
                        kind: "vertex",
                        index: v,
                        len: num_vertices,
                    });
                }
                let next = if i + 1 == end { start } else { i + 1 };
                let w = self.indices[next];
                if self.indices[i] == w {
                    return Err(MeshError::DegenerateFace { face: f });
                }
                face_edges.insert(EdgeKey::new(self.indices[i], w));
            }
            start = end;
        }

        let mut creased = self.creased;
        creased.retain(|key| face_edges.contains(key));

        Ok(PolyMesh {
            x: self.x.into_boxed_slice(),
            y: self.y.into_boxed_slice(),
            z: self.z.into_boxed_slice(),
            indices: self.indices.into_boxed_slice(),
            offset1: self.offset1.into_boxed_slice(),
            creased,
        })
    }
}
