//! The geometry graph: meshes derived from meshes, with maps back to
//! their base.
//!
//! A [`Geometry`] bundles a mesh with the two maps relating it to its
//! base geometry. [`MeshGeometry`] is the leaf of a derivation chain: it
//! is its own base, with identity maps. [`DerivedGeometry`] holds a
//! shared reference to its base plus the [`MeshFunction`] that derives
//! its mesh; [`DerivedGeometry::update`] re-runs the function and
//! repopulates the cached mesh and maps.
//!
//! Chains of derived geometries form a tree rooted at a single
//! [`MeshGeometry`]. [`maps_to_root`] (or [`maps_to_ancestor`]) walks
//! the base pointers and compiles the per-level maps into one effective
//! vertex map and one effective face map.
//!
//! ```
//! use std::rc::Rc;
//! use lamina::geometry::{DerivedGeometry, Geometry, MeshFunction, MeshGeometry, maps_to_root};
//! use lamina::mesh::PolyMesh;
//!
//! let base = Rc::new(MeshGeometry::new(PolyMesh::unit_cube()));
//! let tri = DerivedGeometry::new(base, MeshFunction::Triangulate).unwrap();
//! assert_eq!(tri.mesh().num_faces(), 12);
//!
//! let (_, face_map) = maps_to_root(&tri).unwrap();
//! # let _ = face_map;
//! ```

use std::rc::Rc;

use crate::algo::subdivide::{subdivide, SubdivideOptions};
use crate::algo::triangulate::triangulate;
use crate::error::Result;
use crate::map::{compile_chain, GeometryMap, IdentityMap};
use crate::mesh::PolyMesh;

/// A mesh with maps relating it to a base geometry.
pub trait Geometry {
    /// The geometry's mesh.
    fn mesh(&self) -> &PolyMesh;

    /// The base geometry, or `None` at the root of a chain.
    fn base(&self) -> Option<&dyn Geometry>;

    /// Base vertices ↔ this geometry's vertices.
    fn vertex_map(&self) -> &GeometryMap;

    /// Base faces ↔ this geometry's faces.
    fn face_map(&self) -> &GeometryMap;
}

/// The leaf geometry: a plain mesh that is its own base.
#[derive(Clone, Debug)]
pub struct MeshGeometry {
    mesh: PolyMesh,
    vertex_map: GeometryMap,
    face_map: GeometryMap,
}

impl MeshGeometry {
    /// Wrap a mesh as a root geometry with identity maps.
    pub fn new(mesh: PolyMesh) -> Self {
        let vertex_map = GeometryMap::Identity(IdentityMap::new(mesh.num_vertices()));
        let face_map = GeometryMap::Identity(IdentityMap::new(mesh.num_faces()));
        Self {
            mesh,
            vertex_map,
            face_map,
        }
    }
}

impl Geometry for MeshGeometry {
    fn mesh(&self) -> &PolyMesh {
        &self.mesh
    }

    fn base(&self) -> Option<&dyn Geometry> {
        None
    }

    fn vertex_map(&self) -> &GeometryMap {
        &self.vertex_map
    }

    fn face_map(&self) -> &GeometryMap {
        &self.face_map
    }
}

/// The derivation a [`DerivedGeometry`] applies to its base mesh.
#[derive(Clone, Debug)]
pub enum MeshFunction {
    /// Fan-triangulate every face.
    Triangulate,
    /// Catmull–Clark subdivision with the given options.
    Subdivide(SubdivideOptions),
}

impl MeshFunction {
    fn run(&self, base: &PolyMesh) -> Result<(PolyMesh, GeometryMap, GeometryMap)> {
        match self {
            MeshFunction::Triangulate => {
                let t = triangulate(base)?;
                Ok((t.mesh, t.vertex_map, t.face_map))
            }
            MeshFunction::Subdivide(options) => {
                let s = subdivide(base, options)?;
                Ok((s.mesh, s.vertex_map, s.face_map))
            }
        }
    }
}

/// A geometry derived from a base geometry by a [`MeshFunction`].
///
/// The derived mesh and maps are cached; [`update`](Self::update)
/// recomputes them. The base is shared read-only and never mutated.
pub struct DerivedGeometry {
    base: Rc<dyn Geometry>,
    function: MeshFunction,
    mesh: PolyMesh,
    vertex_map: GeometryMap,
    face_map: GeometryMap,
}

impl DerivedGeometry {
    /// Derive a new geometry from `base`, running the function once.
    pub fn new(base: Rc<dyn Geometry>, function: MeshFunction) -> Result<Self> {
        let (mesh, vertex_map, face_map) = function.run(base.mesh())?;
        Ok(Self {
            base,
            function,
            mesh,
            vertex_map,
            face_map,
        })
    }

    /// Re-run the derivation, replacing the cached mesh and maps.
    ///
    /// Holders of views into the previous mesh must not keep them across
    /// this call; the buffers are replaced wholesale.
    pub fn update(&mut self) -> Result<()> {
        let (mesh, vertex_map, face_map) = self.function.run(self.base.mesh())?;
        self.mesh = mesh;
        self.vertex_map = vertex_map;
        self.face_map = face_map;
        Ok(())
    }

    /// Swap the derivation function and update.
    pub fn set_function(&mut self, function: MeshFunction) -> Result<()> {
        self.function = function;
        self.update()
    }

    /// The derivation function.
    pub fn function(&self) -> &MeshFunction {
        &self.function
    }
}

impl Geometry for DerivedGeometry {
    fn mesh(&self) -> &PolyMesh {
        &self.mesh
    }

    fn base(&self) -> Option<&dyn Geometry> {
        Some(self.base.as_ref())
    }

    fn vertex_map(&self) -> &GeometryMap {
        &self.vertex_map
    }

    fn face_map(&self) -> &GeometryMap {
        &self.face_map
    }
}

/// Compile the effective vertex and face maps from `geometry` up to (and
/// excluding) `ancestor`.
///
/// Walks the base pointers; returns `None` when `ancestor` is not on the
/// chain. When `geometry` *is* the ancestor the maps are identities over
/// its element counts.
pub fn maps_to_ancestor(
    geometry: &dyn Geometry,
    ancestor: &dyn Geometry,
) -> Result<Option<(GeometryMap, GeometryMap)>> {
    let mut vertex_maps: Vec<&GeometryMap> = Vec::new();
    let mut face_maps: Vec<&GeometryMap> = Vec::new();

    let mut cur = geometry;
    loop {
        if same_geometry(cur, ancestor) {
            // Maps were collected child-first; the chain compiler wants
            // them base-outward.
            vertex_maps.reverse();
            face_maps.reverse();
            let vertex = compile_chain(&vertex_maps, ancestor.mesh().num_vertices())?;
            let face = compile_chain(&face_maps, ancestor.mesh().num_faces())?;
            return Ok(Some((vertex, face)));
        }
        vertex_maps.push(cur.vertex_map());
        face_maps.push(cur.face_map());
        match cur.base() {
            Some(base) => cur = base,
            None => return Ok(None),
        }
    }
}

/// Compile the effective vertex and face maps from `geometry` down to
/// the root of its chain.
pub fn maps_to_root(geometry: &dyn Geometry) -> Result<(GeometryMap, GeometryMap)> {
    let mut root = geometry;
    while let Some(base) = root.base() {
        root = base;
    }
    // The root is always its own ancestor.
    Ok(maps_to_ancestor(geometry, root)?.expect("root is on every chain"))
}

/// Identity comparison for geometries behind `dyn` references.
#[inline]
fn same_geometry(a: &dyn Geometry, b: &dyn Geometry) -> bool {
    std::ptr::eq(a as *const dyn Geometry as *const u8, b as *const dyn Geometry as *const u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{IndexMap, MapLengths};

    #[test]
    fn test_mesh_geometry_is_root() {
        let geometry = MeshGeometry::new(PolyMesh::unit_cube());
        assert!(geometry.base().is_none());
        assert_eq!(
            geometry.vertex_map().lengths(),
            MapLengths { base: 8, derived: 8 }
        );
        assert_eq!(geometry.vertex_map().from_base(5).unwrap().indices, vec![5]);
    }

    #[test]
    fn test_derived_geometry_update() {
        let base = Rc::new(MeshGeometry::new(PolyMesh::unit_cube()));
        let mut derived = DerivedGeometry::new(base, MeshFunction::Triangulate).unwrap();
        assert_eq!(derived.mesh().num_faces(), 12);

        derived
            .set_function(MeshFunction::Subdivide(SubdivideOptions::new(1)))
            .unwrap();
        assert_eq!(derived.mesh().num_faces(), 24);
        assert_eq!(derived.mesh().num_vertices(), 26);
    }

    #[test]
    fn test_maps_to_root_chain() {
        let base = Rc::new(MeshGeometry::new(PolyMesh::unit_cube()));
        let subdivided = Rc::new(
            DerivedGeometry::new(
                base,
                MeshFunction::Subdivide(SubdivideOptions::new(1)),
            )
            .unwrap(),
        );
        let triangulated =
            DerivedGeometry::new(subdivided.clone(), MeshFunction::Triangulate).unwrap();

        let (vertex_map, face_map) = maps_to_root(&triangulated).unwrap();
        assert_eq!(
            vertex_map.lengths(),
            MapLengths {
                base: 8,
                derived: 26
            }
        );
        assert_eq!(
            face_map.lengths(),
            MapLengths {
                base: 6,
                derived: 48
            }
        );

        // Each base quad becomes 4 quads, each fanned into 2 triangles.
        for f in 0..6 {
            let run = face_map.from_base(f).unwrap();
            assert_eq!(run.indices.len(), 8);
            for &t in &run.indices {
                assert_eq!(face_map.to_base(t).unwrap().indices, vec![f]);
            }
        }
    }

    #[test]
    fn test_maps_to_ancestor() {
        let base = Rc::new(MeshGeometry::new(PolyMesh::unit_cube()));
        let derived = DerivedGeometry::new(base.clone(), MeshFunction::Triangulate).unwrap();

        // The derived geometry's own maps come back unchanged in shape.
        let (vertex_map, _) = maps_to_ancestor(&derived, base.as_ref())
            .unwrap()
            .unwrap();
        assert_eq!(
            vertex_map.lengths(),
            MapLengths { base: 8, derived: 8 }
        );

        // A geometry is trivially its own ancestor.
        let (self_vertex, _) = maps_to_ancestor(&derived, &derived).unwrap().unwrap();
        assert_eq!(self_vertex.from_base(2).unwrap().indices, vec![2]);

        // Unrelated geometries are not ancestors.
        let stranger = MeshGeometry::new(PolyMesh::unit_cube());
        assert!(maps_to_ancestor(&derived, &stranger).unwrap().is_none());
    }
}
