//! The host boundary: triangle-list ingest, buffer publishing, and
//! change notifications.
//!
//! The core exchanges exactly two things with a host scene graph: an
//! indexed triangle list coming in (interleaved positions plus a flat
//! index buffer) and an indexed triangle list going out. Everything else
//! (file formats, UI, rendering) stays on the host side.
//!
//! [`SubdivisionSurface`] is the ready-made adapter: it owns a base
//! mesh, subdivision options and reusable output buffers, and its
//! [`refresh`](SubdivisionSurface::refresh) runs the
//! subdivide-then-triangulate pipeline, compiles the two per-pass maps
//! into base-relative maps, and republishes the host buffers.
//!
//! ```
//! use lamina::algo::subdivide::SubdivideOptions;
//! use lamina::interop::SubdivisionSurface;
//! use lamina::mesh::PolyMesh;
//!
//! let mut surface =
//!     SubdivisionSurface::new(PolyMesh::unit_cube(), SubdivideOptions::new(1));
//! surface.refresh().unwrap();
//! // 24 quads, fanned into 48 triangles.
//! assert_eq!(surface.buffers().indices().len(), 48 * 3);
//! ```

use std::fmt;

use crate::algo::subdivide::{subdivide, SubdivideOptions};
use crate::algo::triangulate::triangulate;
use crate::error::{MeshError, Result};
use crate::map::{compile_chain, GeometryMap, IdentityMap};
use crate::mesh::{MeshBuilder, PolyMesh};

/// Build a mesh from the host's indexed triangle list.
///
/// `positions` holds interleaved x, y, z coordinates (3 floats per
/// vertex); `indices` holds 3 vertex indices per triangle. Either buffer
/// with a length that is not a multiple of three fails with
/// [`MeshError::ShapeMismatch`]; out-of-range indices fail with
/// [`MeshError::OutOfBounds`].
pub fn build_from_triangle_list(positions: &[f64], indices: &[u32]) -> Result<PolyMesh> {
    if positions.len() % 3 != 0 {
        return Err(MeshError::ShapeMismatch {
            what: "position buffer",
            len: positions.len(),
        });
    }
    if indices.len() % 3 != 0 {
        return Err(MeshError::ShapeMismatch {
            what: "triangle index buffer",
            len: indices.len(),
        });
    }

    let mut builder = MeshBuilder::with_capacity(positions.len() / 3, indices.len() / 3, indices.len());
    for triple in positions.chunks_exact(3) {
        builder.push_vertex(triple[0], triple[1], triple[2]);
    }
    for triangle in indices.chunks_exact(3) {
        builder.push_face(triangle);
    }
    builder.freeze()
}

/// Reusable interleaved output buffers in the host's triangle-list
/// convention.
///
/// [`write`](Self::write) replaces the contents but reuses the
/// allocations, growing them only when the required length exceeds the
/// current capacity.
#[derive(Debug, Clone, Default)]
pub struct HostBuffers {
    positions: Vec<f64>,
    indices: Vec<u32>,
}

impl HostBuffers {
    /// Empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The interleaved positions of the last published mesh.
    #[inline]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// The flat triangle indices of the last published mesh.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Re-interleave `mesh` into the buffers.
    ///
    /// The mesh must consist of triangles only; a higher-degree face
    /// fails with [`MeshError::ShapeMismatch`] before anything is
    /// written.
    pub fn write(&mut self, mesh: &PolyMesh) -> Result<()> {
        for face in mesh.faces() {
            if face.degree() != 3 {
                return Err(MeshError::ShapeMismatch {
                    what: "published face",
                    len: face.degree(),
                });
            }
        }

        self.positions.clear();
        for v in 0..mesh.num_vertices() {
            let p = mesh.point(v);
            self.positions.extend_from_slice(&[p.x, p.y, p.z]);
        }

        self.indices.clear();
        self.indices.extend_from_slice(mesh.indices());
        Ok(())
    }
}

/// The boundary notifications a host can subscribe to.
///
/// These are one-shot fire-and-forget signals with no payload; the core
/// never depends on them being observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A new base mesh was assigned.
    GeometryReassigned,
    /// The derived geometry was recomputed.
    DerivedGeometryUpdated,
    /// The host buffers hold new contents.
    HostBuffersRewritten,
}

/// A callback receiving [`HostEvent`]s.
pub struct HostNotifier {
    callback: Box<dyn Fn(HostEvent) + Send + Sync>,
}

impl HostNotifier {
    /// Create a notifier with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(HostEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op notifier that discards all events.
    pub fn none() -> Self {
        Self::new(|_| {})
    }

    /// Fire an event.
    #[inline]
    pub fn notify(&self, event: HostEvent) {
        (self.callback)(event);
    }
}

impl Default for HostNotifier {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for HostNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostNotifier").finish_non_exhaustive()
    }
}

/// Host-facing adapter tying a base mesh, subdivision options, output
/// buffers and a notifier together.
#[derive(Debug)]
pub struct SubdivisionSurface {
    base: PolyMesh,
    options: SubdivideOptions,
    buffers: HostBuffers,
    notifier: HostNotifier,
    vertex_map: GeometryMap,
    face_map: GeometryMap,
}

impl SubdivisionSurface {
    /// Create a surface over `base`. The maps start out as identities;
    /// call [`refresh`](Self::refresh) to derive and publish.
    pub fn new(base: PolyMesh, options: SubdivideOptions) -> Self {
        let vertex_map = GeometryMap::Identity(IdentityMap::new(base.num_vertices()));
        let face_map = GeometryMap::Identity(IdentityMap::new(base.num_faces()));
        Self {
            base,
            options,
            buffers: HostBuffers::new(),
            notifier: HostNotifier::none(),
            vertex_map,
            face_map,
        }
    }

    /// Attach a notifier.
    pub fn with_notifier(mut self, notifier: HostNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the base mesh from a host triangle list.
    pub fn set_base(&mut self, positions: &[f64], indices: &[u32]) -> Result<()> {
        self.base = build_from_triangle_list(positions, indices)?;
        self.notifier.notify(HostEvent::GeometryReassigned);
        Ok(())
    }

    /// Replace the subdivision options.
    pub fn set_options(&mut self, options: SubdivideOptions) {
        self.options = options;
    }

    /// Subdivide, triangulate, recompile the maps, and republish the
    /// host buffers.
    ///
    /// Fails before touching any published state, so the buffers and
    /// maps always describe one consistent derivation.
    pub fn refresh(&mut self) -> Result<()> {
        let subdivided = subdivide(&self.base, &self.options)?;
        let triangulated = triangulate(&subdivided.mesh)?;

        let vertex_map = compile_chain(
            &[&subdivided.vertex_map, &triangulated.vertex_map],
            self.base.num_vertices(),
        )?;
        let face_map = compile_chain(
            &[&subdivided.face_map, &triangulated.face_map],
            self.base.num_faces(),
        )?;

        self.vertex_map = vertex_map;
        self.face_map = face_map;
        self.notifier.notify(HostEvent::DerivedGeometryUpdated);

        self.buffers.write(&triangulated.mesh)?;
        self.notifier.notify(HostEvent::HostBuffersRewritten);
        Ok(())
    }

    /// The current base mesh.
    pub fn base(&self) -> &PolyMesh {
        &self.base
    }

    /// The published output buffers.
    pub fn buffers(&self) -> &HostBuffers {
        &self.buffers
    }

    /// Base vertices ↔ published vertices, across both passes.
    pub fn vertex_map(&self) -> &GeometryMap {
        &self.vertex_map
    }

    /// Base faces ↔ published triangles, across both passes.
    pub fn face_map(&self) -> &GeometryMap {
        &self.face_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::IndexMap;
    use std::sync::{Arc, Mutex};

    /// A single triangle as the host would hand it over.
    fn triangle_buffers() -> (Vec<f64>, Vec<u32>) {
        (
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 1.0, 0.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_build_from_triangle_list() {
        let (positions, indices) = triangle_buffers();
        let mesh = build_from_triangle_list(&positions, &indices).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face(0).unwrap().degree(), 3);
    }

    #[test]
    fn test_build_rejects_bad_shapes() {
        let (positions, indices) = triangle_buffers();
        assert!(matches!(
            build_from_triangle_list(&positions[..8], &indices),
            Err(MeshError::ShapeMismatch {
                what: "position buffer",
                ..
            })
        ));
        assert!(matches!(
            build_from_triangle_list(&positions, &indices[..2]),
            Err(MeshError::ShapeMismatch {
                what: "triangle index buffer",
                ..
            })
        ));
        assert!(matches!(
            build_from_triangle_list(&positions, &[0, 1, 9]),
            Err(MeshError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_host_buffers_roundtrip() {
        let (positions, indices) = triangle_buffers();
        let mesh = build_from_triangle_list(&positions, &indices).unwrap();

        let mut buffers = HostBuffers::new();
        buffers.write(&mesh).unwrap();
        assert_eq!(buffers.positions(), positions.as_slice());
        assert_eq!(buffers.indices(), indices.as_slice());
    }

    #[test]
    fn test_host_buffers_reject_quads() {
        let mut buffers = HostBuffers::new();
        assert!(matches!(
            buffers.write(&PolyMesh::unit_cube()),
            Err(MeshError::ShapeMismatch {
                what: "published face",
                len: 4,
            })
        ));
        // Nothing was published.
        assert!(buffers.positions().is_empty());
    }

    #[test]
    fn test_host_buffers_reuse_allocation() {
        let (positions, indices) = triangle_buffers();
        let mesh = build_from_triangle_list(&positions, &indices).unwrap();

        let mut buffers = HostBuffers::new();
        buffers.write(&mesh).unwrap();
        let capacity = buffers.positions.capacity();
        buffers.write(&mesh).unwrap();
        assert_eq!(buffers.positions.capacity(), capacity);
    }

    #[test]
    fn test_surface_refresh_counts() {
        let mut surface =
            SubdivisionSurface::new(PolyMesh::unit_cube(), SubdivideOptions::new(1));
        surface.refresh().unwrap();

        assert_eq!(surface.buffers().positions().len(), 26 * 3);
        assert_eq!(surface.buffers().indices().len(), 48 * 3);

        // Maps span both passes: each base quad ends up as 8 triangles.
        for f in 0..6 {
            let run = surface.face_map().from_base(f).unwrap();
            assert_eq!(run.indices.len(), 8);
            for &t in &run.indices {
                assert_eq!(surface.face_map().to_base(t).unwrap().indices, vec![f]);
            }
        }
        let lengths = surface.vertex_map().lengths();
        assert_eq!(lengths.base, 8);
        assert_eq!(lengths.derived, 26);
    }

    #[test]
    fn test_surface_events_fire_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let notifier = HostNotifier::new(move |event| sink.lock().unwrap().push(event));

        let mut surface =
            SubdivisionSurface::new(PolyMesh::unit_cube(), SubdivideOptions::new(1))
                .with_notifier(notifier);

        let (positions, indices) = triangle_buffers();
        surface.set_base(&positions, &indices).unwrap();
        surface.refresh().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                HostEvent::GeometryReassigned,
                HostEvent::DerivedGeometryUpdated,
                HostEvent::HostBuffersRewritten,
            ]
        );
    }
}
