//! Topology queries on packed meshes.
//!
//! This module walks the shared-edge structure of a [`PolyMesh`]: finding
//! the face on the other side of an edge, collecting the edges incident
//! to a vertex, and assembling the ordered fan of face-neighbors around a
//! vertex, including detection of open (boundary) fans.
//!
//! All queries address edges as [`FaceEdge`] pairs: a face index plus an
//! edge ordinal `e`, selecting the directed edge from corner `e` to
//! corner `(e + 1) % degree` of that face.

use crate::error::{MeshError, Result};

use super::store::{EdgeKey, PolyMesh};

/// Address of one directed edge of one face.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FaceEdge {
    /// The face index.
    pub face: usize,
    /// The edge ordinal within the face, in `[0, degree)`.
    pub edge: usize,
}

impl FaceEdge {
    /// Create a face-edge address.
    #[inline]
    pub fn new(face: usize, edge: usize) -> Self {
        Self { face, edge }
    }
}

/// Direction tag relating a face-edge to a referenced undirected edge or
/// vertex.
///
/// `Forward` means the face-edge runs in the referenced order (it starts
/// at the queried vertex, or traverses the queried edge v0→v1);
/// `Reverse` means it runs the other way.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Orientation {
    /// Same direction as the reference (v0→v1).
    Forward,
    /// Opposite direction to the reference (v1→v0).
    Reverse,
}

/// A face-edge together with its direction tag.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OrientedFaceEdge {
    /// The addressed face-edge.
    pub face_edge: FaceEdge,
    /// Its direction relative to the reference.
    pub orientation: Orientation,
}

/// One face of the ordered fan around a vertex: the face together with
/// its two edges touching the vertex, ordered {incoming, outgoing} in the
/// fan's rotational direction.
#[derive(Clone, Debug)]
pub struct VertexNeighbor {
    /// The neighboring face.
    pub face: usize,
    /// The face's two incident edges at the vertex: `[incoming, outgoing]`.
    pub edges: [OrientedFaceEdge; 2],
}

/// The ordered fan of face-neighbors around a vertex.
///
/// For a closed (interior) vertex, consecutive neighbors share an
/// undirected edge and the last neighbor's outgoing edge closes back to
/// the first neighbor's incoming edge. For a boundary vertex the fan is
/// open: the two fan ends are boundary edges.
#[derive(Clone, Debug)]
pub struct VertexFan {
    /// The neighbors, in rotational order around the vertex.
    pub neighbors: Vec<VertexNeighbor>,
    /// Whether the fan closes on itself.
    pub continuous: bool,
    /// Position of the continuity marker: `neighbors.len()` for a closed
    /// fan, otherwise the boundary between the backward and forward
    /// partial walks (the fan's open ends sit at the sequence ends).
    pub seam: usize,
}

impl PolyMesh {
    /// Endpoints of a directed face-edge, bounds-checked.
    fn face_edge_endpoints(&self, fe: FaceEdge) -> Result<(u32, u32)> {
        let face = self.face(fe.face)?;
        if fe.edge >= face.degree() {
            return Err(MeshError::OutOfBounds {
                kind: "edge",
                index: fe.edge,
                len: face.degree(),
            });
        }
        Ok((face.vertex(fe.edge) as u32, face.vertex(fe.edge + 1) as u32))
    }

    /// Find the face-edge on the other face sharing the same undirected
    /// edge, or `None` if the edge is a boundary.
    ///
    /// Scans the other faces in index order and reports the first match.
    /// The orientation tag is relative to the input: `Forward` when the
    /// found face-edge traverses the edge in the same direction.
    pub fn face_adjacent(&self, face_edge: FaceEdge) -> Result<Option<OrientedFaceEdge>> {
        let (i0, i1) = self.face_edge_endpoints(face_edge)?;
        for face in self.faces() {
            if face.index() == face_edge.face {
                continue;
            }
            for e in 0..face.degree() {
                let j0 = face.vertex(e) as u32;
                let j1 = face.vertex(e + 1) as u32;
                if (j0, j1) == (i0, i1) {
                    return Ok(Some(OrientedFaceEdge {
                        face_edge: FaceEdge::new(face.index(), e),
                        orientation: Orientation::Forward,
                    }));
                }
                if (j1, j0) == (i0, i1) {
                    return Ok(Some(OrientedFaceEdge {
                        face_edge: FaceEdge::new(face.index(), e),
                        orientation: Orientation::Reverse,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// All oriented face-edges incident to `vertex`, in face/corner scan
    /// order.
    ///
    /// A face-edge starting at the vertex is tagged `Forward`, one ending
    /// at it `Reverse`.
    pub fn edges_with(&self, vertex: usize) -> Result<Vec<OrientedFaceEdge>> {
        if vertex >= self.num_vertices() {
            return Err(MeshError::OutOfBounds {
                kind: "vertex",
                index: vertex,
                len: self.num_vertices(),
            });
        }
        let v = vertex as u32;
        let mut out = Vec::new();
        for face in self.faces() {
            for e in 0..face.degree() {
                let a = face.vertex(e) as u32;
                let b = face.vertex(e + 1) as u32;
                if a == v {
                    out.push(OrientedFaceEdge {
                        face_edge: FaceEdge::new(face.index(), e),
                        orientation: Orientation::Forward,
                    });
                } else if b == v {
                    out.push(OrientedFaceEdge {
                        face_edge: FaceEdge::new(face.index(), e),
                        orientation: Orientation::Reverse,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Assemble the ordered fan of face-neighbors around `vertex`.
    ///
    /// The walk starts from an arbitrary incident edge and follows edge
    /// twins from face to face. If the walk hits a boundary, a second
    /// walk runs in the opposite rotational direction from the start edge
    /// and is prepended, so an open fan is still emitted in one
    /// consistent rotational order, boundary edge to boundary edge.
    ///
    /// If `seed` is given, the fan is rotated (and mirrored when the
    /// seed matches a neighbor's outgoing edge) so that it begins at the
    /// seed. A seed that matches no neighbor yields
    /// [`MeshError::SeedMismatch`].
    pub fn vertex_neighbors(&self, vertex: usize, seed: Option<FaceEdge>) -> Result<VertexFan> {
        let mut pool: Vec<(OrientedFaceEdge, EdgeKey)> = Vec::new();
        for ofe in self.edges_with(vertex)? {
            let (a, b) = self.face_edge_endpoints(ofe.face_edge)?;
            pool.push((ofe, EdgeKey::new(a, b)));
        }

        if pool.is_empty() {
            if let Some(s) = seed {
                return Err(MeshError::SeedMismatch {
                    vertex,
                    face: s.face,
                    edge: s.edge,
                });
            }
            return Ok(VertexFan {
                neighbors: Vec::new(),
                continuous: true,
                seam: 0,
            });
        }

        let start = pool.remove(0);
        let start_key = start.1;

        let mut forward = Vec::new();
        let mut last_key = start_key;
        let mut cur = start;
        loop {
            // The face contributes exactly two incident edges at the
            // vertex; the one that is not `cur` is its partner.
            let Some(pos) = pool
                .iter()
                .position(|(o, _)| o.face_edge.face == cur.0.face_edge.face)
            else {
                break;
            };
            let partner = pool.remove(pos);
            last_key = partner.1;
            forward.push(VertexNeighbor {
                face: cur.0.face_edge.face,
                edges: [cur.0, partner.0],
            });
            match pool.iter().position(|(_, k)| *k == partner.1) {
                Some(twin) => cur = pool.remove(twin),
                None => break,
            }
        }

        // A closed fan consumes the pool AND wraps back onto the start
        // edge (the last partner is the twin of the removed start). A
        // walk that consumed everything but ended elsewhere ran from one
        // boundary edge to another.
        let continuous = pool.is_empty() && last_key == start_key;

        let mut backward = Vec::new();
        if !continuous {
            if let Some(twin) = pool.iter().position(|(_, k)| *k == start_key) {
                let mut cur = pool.remove(twin);
                loop {
                    let Some(pos) = pool
                        .iter()
                        .position(|(o, _)| o.face_edge.face == cur.0.face_edge.face)
                    else {
                        break;
                    };
                    let partner = pool.remove(pos);
                    backward.push(VertexNeighbor {
                        face: cur.0.face_edge.face,
                        edges: [partner.0, cur.0],
                    });
                    match pool.iter().position(|(_, k)| *k == partner.1) {
                        Some(twin) => cur = pool.remove(twin),
                        None => break,
                    }
                }
            }
        }

        let split = backward.len();
        backward.reverse();
        let mut neighbors = backward;
        neighbors.append(&mut forward);

        let mut fan = VertexFan {
            seam: if continuous { neighbors.len() } else { split },
            neighbors,
            continuous,
        };

        if let Some(seed_edge) = seed {
            align_fan(&mut fan, seed_edge, vertex)?;
        }
        Ok(fan)
    }
}

/// Rotate (and mirror if needed) `fan` so it begins at `seed`.
fn align_fan(fan: &mut VertexFan, seed: FaceEdge, vertex: usize) -> Result<()> {
    let mut found = None;
    for (i, n) in fan.neighbors.iter().enumerate() {
        if n.edges[0].face_edge == seed {
            found = Some((i, 0));
            break;
        }
        if n.edges[1].face_edge == seed {
            found = Some((i, 1));
            break;
        }
    }
    let Some((mut at, slot)) = found else {
        return Err(MeshError::SeedMismatch {
            vertex,
            face: seed.face,
            edge: seed.edge,
        });
    };

    if slot == 1 {
        // The seed is an outgoing edge: mirror the fan so it leads.
        for n in fan.neighbors.iter_mut() {
            n.edges.swap(0, 1);
        }
        fan.neighbors.reverse();
        if !fan.continuous {
            fan.seam = fan.neighbors.len() - fan.seam;
        }
        at = fan.neighbors.len() - 1 - at;
    }

    fan.neighbors.rotate_left(at);
    if fan.continuous {
        fan.seam = fan.neighbors.len();
    } else if !fan.neighbors.is_empty() {
        fan.seam = (fan.seam + fan.neighbors.len() - at) % fan.neighbors.len();
    }
    Ok(())
}
