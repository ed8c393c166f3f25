//! Catmull–Clark subdivision with vertex and face mappings.

use std::collections::{HashMap, HashSet};

use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::Result;
use crate::frame::{face_frames, vertex_frames};
use crate::map::{compile, ArrayMap, GeometryMap, IdentityMap, MapHalf};
use crate::mesh::{EdgeKey, MeshBuilder, PolyMesh};

use super::{SubdivideOptions, Subdivision};

/// Perform Catmull–Clark subdivision.
///
/// Runs `options.iterations` refinement passes. Every pass emits the
/// vertex and face maps relating its output to its input; the maps of
/// successive passes are composed, so the returned maps always relate
/// the final mesh to the original base. Zero iterations return a copy of
/// the input with identity maps.
///
/// # Algorithm
///
/// Each pass:
/// 1. Emits a *face point* at every face centroid.
/// 2. Emits an *edge point* per undirected edge: the midpoint for sharp
///    edges, otherwise the average of the endpoints and the two incident
///    face points. Edges with one incident face are sharp when
///    `boundary_as_crease` is set; edges with three or more fall back to
///    the midpoint silently.
/// 3. Repositions the original vertices by the smooth, crease, or corner
///    rule depending on how many sharp edges meet there.
/// 4. Replaces every degree-d face with d quads around its face point.
///
/// Creased input edges stay creased across passes: each one splits into
/// two creased halves through its edge point.
pub fn catmull_clark(mesh: &PolyMesh, options: &SubdivideOptions) -> Result<Subdivision> {
    let mut current = mesh.clone();
    let mut vertex_map: Option<GeometryMap> = None;
    let mut face_map: Option<GeometryMap> = None;

    for _ in 0..options.iterations {
        let step = refine_once(&current, options.boundary_as_crease)?;
        vertex_map = Some(match vertex_map {
            None => GeometryMap::Array(step.vertex_map),
            Some(acc) => GeometryMap::Array(compile(&acc, &step.vertex_map)?),
        });
        face_map = Some(match face_map {
            None => GeometryMap::Array(step.face_map),
            Some(acc) => GeometryMap::Array(compile(&acc, &step.face_map)?),
        });
        current = step.mesh;
    }

    Ok(Subdivision {
        vertex_map: vertex_map
            .unwrap_or_else(|| GeometryMap::Identity(IdentityMap::new(mesh.num_vertices()))),
        face_map: face_map
            .unwrap_or_else(|| GeometryMap::Identity(IdentityMap::new(mesh.num_faces()))),
        mesh: current,
    })
}

/// Output of one refinement pass, maps relative to the pass input.
struct Refinement {
    mesh: PolyMesh,
    vertex_map: ArrayMap,
    face_map: ArrayMap,
}

/// Edge and vertex incidence of one refinement level.
///
/// Edges are numbered in first-encounter order (faces scanned in index
/// order, corners in winding order); that ordinal also numbers the edge
/// points of the pass.
struct Adjacency {
    edge_keys: Vec<EdgeKey>,
    edge_ordinal: HashMap<EdgeKey, u32>,
    /// Incident faces per edge, parallel to `edge_keys`.
    edge_faces: Vec<Vec<u32>>,
    /// Incident faces per vertex, deduplicated.
    vertex_faces: Vec<Vec<u32>>,
    /// Incident edge ordinals per vertex, deduplicated.
    vertex_edges: Vec<Vec<u32>>,
    /// User creases, plus boundary edges when requested.
    sharp: HashSet<EdgeKey>,
}

impl Adjacency {
    fn build(mesh: &PolyMesh, boundary_as_crease: bool) -> Self {
        let mut edge_keys: Vec<EdgeKey> = Vec::new();
        let mut edge_ordinal: HashMap<EdgeKey, u32> = HashMap::new();
        let mut edge_faces: Vec<Vec<u32>> = Vec::new();
        let mut vertex_faces: Vec<Vec<u32>> = vec![Vec::new(); mesh.num_vertices()];
        let mut vertex_edges: Vec<Vec<u32>> = vec![Vec::new(); mesh.num_vertices()];

        for face in mesh.faces() {
            let f = face.index() as u32;
            for corner in 0..face.degree() {
                let a = face.vertex(corner);
                let b = face.vertex(corner + 1);

                if !vertex_faces[a].contains(&f) {
                    vertex_faces[a].push(f);
                }

                let key = EdgeKey::new(a as u32, b as u32);
                let ordinal = *edge_ordinal.entry(key).or_insert_with(|| {
                    edge_keys.push(key);
                    edge_faces.push(Vec::new());
                    (edge_keys.len() - 1) as u32
                });
                let incident = &mut edge_faces[ordinal as usize];
                if !incident.contains(&f) {
                    incident.push(f);
                }
                if !vertex_edges[a].contains(&ordinal) {
                    vertex_edges[a].push(ordinal);
                }
                if !vertex_edges[b].contains(&ordinal) {
                    vertex_edges[b].push(ordinal);
                }
            }
        }

        let mut sharp: HashSet<EdgeKey> = mesh.creased_edges().collect();
        if boundary_as_crease {
            for (ordinal, key) in edge_keys.iter().enumerate() {
                if edge_faces[ordinal].len() == 1 {
                    sharp.insert(*key);
                }
            }
        }

        Self {
            edge_keys,
            edge_ordinal,
            edge_faces,
            vertex_faces,
            vertex_edges,
            sharp,
        }
    }

    #[inline]
    fn ordinal(&self, a: usize, b: usize) -> u32 {
        self.edge_ordinal[&EdgeKey::new(a as u32, b as u32)]
    }
}

fn refine_once(mesh: &PolyMesh, boundary_as_crease: bool) -> Result<Refinement> {
    let adjacency = Adjacency::build(mesh, boundary_as_crease);
    let num_vertices = mesh.num_vertices();
    let num_faces = mesh.num_faces();
    let num_edges = adjacency.edge_keys.len();

    // New vertex layout: repositioned originals, then face points in
    // face order, then edge points in edge-ordinal order.
    let face_point = |f: usize| num_vertices + f;
    let edge_point = |ordinal: u32| num_vertices + num_faces + ordinal as usize;

    // Step 1: face points.
    let face_points: Vec<Point3<f64>> =
        (0..num_faces).map(|f| mesh.face_centroid(f)).collect();

    // Step 2: edge points.
    let edge_points: Vec<Point3<f64>> = adjacency
        .edge_keys
        .iter()
        .enumerate()
        .map(|(ordinal, key)| {
            let (u, v) = key.endpoints();
            let pu = mesh.point(u as usize).coords;
            let pv = mesh.point(v as usize).coords;
            let incident = &adjacency.edge_faces[ordinal];
            if adjacency.sharp.contains(key) || incident.len() != 2 {
                // Sharp edge, or a non-manifold edge falling back to the
                // midpoint.
                Point3::from((pu + pv) * 0.5)
            } else {
                let f0 = face_points[incident[0] as usize].coords;
                let f1 = face_points[incident[1] as usize].coords;
                Point3::from((pu + pv + f0 + f1) / 4.0)
            }
        })
        .collect();

    // Step 3: reposition the original vertices.
    let repositioned: Vec<Point3<f64>> = (0..num_vertices)
        .map(|v| reposition(mesh, &adjacency, &face_points, v))
        .collect();

    // Step 4: rebuild faces, one quad per corner of each base face.
    let mut builder = MeshBuilder::with_capacity(
        num_vertices + num_faces + num_edges,
        mesh.indices().len(),
        mesh.indices().len() * 4,
    );
    for p in &repositioned {
        builder.push_point(*p);
    }
    for p in &face_points {
        builder.push_point(*p);
    }
    for p in &edge_points {
        builder.push_point(*p);
    }

    for face in mesh.faces() {
        let d = face.degree();
        let fp = face_point(face.index()) as u32;
        for corner in 0..d {
            let v = face.vertex(corner);
            let next = face.vertex(corner + 1);
            let prev = face.vertex(corner + d - 1);
            builder.push_face(&[
                v as u32,
                edge_point(adjacency.ordinal(v, next)) as u32,
                fp,
                edge_point(adjacency.ordinal(prev, v)) as u32,
            ]);
        }
    }

    // Creases survive refinement: each creased edge splits into two
    // creased halves through its edge point. Boundary-derived sharpness
    // is re-detected per pass instead.
    for key in mesh.creased_edges() {
        let ep = edge_point(adjacency.edge_ordinal[&key]) as u32;
        let (u, v) = key.endpoints();
        builder.crease(u, ep);
        builder.crease(ep, v);
    }

    let refined = builder.freeze()?;

    // Local frames on both levels; the maps carry the frame deltas.
    let face_frames_before = face_frames(mesh);
    let vertex_frames_before = vertex_frames(mesh);
    let quad_frames = face_frames(&refined);
    let vertex_frames_after = vertex_frames(&refined);

    // Vertex map. Each original vertex corresponds to itself (with its
    // frame delta) and, with identity transforms, to the face and edge
    // points it contributed to.
    let mut v_from_base = MapHalf::with_capacity(num_vertices, num_vertices * 7);
    for v in 0..num_vertices {
        v_from_base.push_entry(
            v,
            vertex_frames_before[v].matrix_to(&vertex_frames_after[v]),
        );
        for &f in &adjacency.vertex_faces[v] {
            v_from_base.push_entry(face_point(f as usize), Matrix4::identity());
        }
        for &e in &adjacency.vertex_edges[v] {
            v_from_base.push_entry(edge_point(e), Matrix4::identity());
        }
        v_from_base.finish_row();
    }

    let mut v_to_base = MapHalf::with_capacity(refined.num_vertices(), refined.num_vertices() * 2);
    for v in 0..num_vertices {
        v_to_base.push_entry(
            v,
            vertex_frames_after[v].matrix_to(&vertex_frames_before[v]),
        );
        v_to_base.finish_row();
    }
    for f in 0..num_faces {
        let face = mesh.face_view(f);
        let mut seen: Vec<usize> = Vec::with_capacity(face.degree());
        for corner in 0..face.degree() {
            let v = face.vertex(corner);
            if !seen.contains(&v) {
                seen.push(v);
                v_to_base.push_entry(v, Matrix4::identity());
            }
        }
        v_to_base.finish_row();
    }
    for key in &adjacency.edge_keys {
        let (u, v) = key.endpoints();
        v_to_base.push_entry(u as usize, Matrix4::identity());
        v_to_base.push_entry(v as usize, Matrix4::identity());
        v_to_base.finish_row();
    }

    // Face map. Quads are emitted in base-face order, so each base face
    // owns a contiguous run of quad indices.
    let mut f_from_base = MapHalf::with_capacity(num_faces, refined.num_faces());
    let mut f_to_base = MapHalf::with_capacity(refined.num_faces(), refined.num_faces());
    let mut quad = 0usize;
    for f in 0..num_faces {
        for _ in 0..mesh.face_view(f).degree() {
            f_from_base.push_entry(quad, face_frames_before[f].matrix_to(&quad_frames[quad]));
            f_to_base.push_entry(f, quad_frames[quad].matrix_to(&face_frames_before[f]));
            f_to_base.finish_row();
            quad += 1;
        }
        f_from_base.finish_row();
    }

    Ok(Refinement {
        mesh: refined,
        vertex_map: ArrayMap::new(v_from_base, v_to_base)?,
        face_map: ArrayMap::new(f_from_base, f_to_base)?,
    })
}

/// Apply the vertex rule for one original vertex.
fn reposition(
    mesh: &PolyMesh,
    adjacency: &Adjacency,
    face_points: &[Point3<f64>],
    v: usize,
) -> Point3<f64> {
    let p = mesh.point(v);
    let edges = &adjacency.vertex_edges[v];
    let n = edges.len();
    if n == 0 {
        return p;
    }

    let sharp: Vec<u32> = edges
        .iter()
        .copied()
        .filter(|&e| adjacency.sharp.contains(&adjacency.edge_keys[e as usize]))
        .collect();

    match sharp.len() {
        // Smooth rule; a single sharp edge (dart) smooths too.
        0 | 1 => {
            let faces = &adjacency.vertex_faces[v];
            if faces.is_empty() {
                return p;
            }
            let mut face_mean = Vector3::zeros();
            for &f in faces {
                face_mean += face_points[f as usize].coords;
            }
            face_mean /= faces.len() as f64;

            let mut edge_mean = Vector3::zeros();
            for &e in edges {
                let (a, b) = adjacency.edge_keys[e as usize].endpoints();
                edge_mean +=
                    (mesh.point(a as usize).coords + mesh.point(b as usize).coords) * 0.5;
            }
            edge_mean /= n as f64;

            let n = n as f64;
            Point3::from((face_mean + 2.0 * edge_mean + (n - 3.0) * p.coords) / n)
        }
        // Crease: the two sharp neighbors pull the vertex along the
        // crease curve.
        2 => {
            let a = adjacency.edge_keys[sharp[0] as usize].other(v as u32);
            let b = adjacency.edge_keys[sharp[1] as usize].other(v as u32);
            Point3::from(
                (mesh.point(a as usize).coords
                    + 6.0 * p.coords
                    + mesh.point(b as usize).coords)
                    / 8.0,
            )
        }
        // Corner: three or more sharp edges pin the vertex.
        _ => p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::IndexMap;

    fn creased_cube() -> PolyMesh {
        let cube = PolyMesh::unit_cube();
        let mut builder = cube.to_builder();
        for face in cube.faces() {
            for corner in 0..face.degree() {
                builder.crease(face.vertex(corner) as u32, face.vertex(corner + 1) as u32);
            }
        }
        builder.freeze().unwrap()
    }

    fn single_quad() -> PolyMesh {
        let mut b = MeshBuilder::new();
        b.push_vertex(0.0, 0.0, 0.0);
        b.push_vertex(1.0, 0.0, 0.0);
        b.push_vertex(1.0, 1.0, 0.0);
        b.push_vertex(0.0, 1.0, 0.0);
        b.push_face(&[0, 1, 2, 3]);
        b.freeze().unwrap()
    }

    #[test]
    fn test_creased_cube_counts() {
        let result = catmull_clark(&creased_cube(), &SubdivideOptions::new(1)).unwrap();
        // 8 originals + 6 face points + 12 edge points.
        assert_eq!(result.mesh.num_vertices(), 26);
        assert_eq!(result.mesh.num_faces(), 24);
        for face in result.mesh.faces() {
            assert_eq!(face.degree(), 4);
        }
    }

    #[test]
    fn test_creased_cube_positions() {
        let mesh = creased_cube();
        let result = catmull_clark(&mesh, &SubdivideOptions::new(1)).unwrap();

        // Every original vertex has three sharp edges: corner rule.
        for v in 0..8 {
            let before = mesh.vertex(v).unwrap();
            let after = result.mesh.vertex(v).unwrap();
            assert!((before - after).norm() < 1e-12);
        }
        // Sharp edge points sit at the midpoints; face points at the
        // centroids. Edge (0, 1) is the first edge encountered.
        let ep = result.mesh.vertex(8 + 6).unwrap();
        assert!((ep - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        let fp = result.mesh.vertex(8).unwrap();
        assert!((fp - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_smooth_cube_positions() {
        let result = catmull_clark(&PolyMesh::unit_cube(), &SubdivideOptions::new(1)).unwrap();
        assert_eq!(result.mesh.num_vertices(), 26);

        // Smooth rule at an interior valence-3 vertex of the unit cube.
        let v0 = result.mesh.vertex(0).unwrap();
        let expected = Point3::new(2.0 / 9.0, 2.0 / 9.0, 2.0 / 9.0);
        assert!((v0 - expected).norm() < 1e-12);

        // Smooth edge point of edge (0, 1): endpoints plus the two
        // incident face points, averaged.
        let ep = result.mesh.vertex(8 + 6).unwrap();
        assert!((ep - Point3::new(0.5, 0.125, 0.125)).norm() < 1e-12);
    }

    #[test]
    fn test_quad_emission_order() {
        let result = catmull_clark(&PolyMesh::unit_cube(), &SubdivideOptions::new(1)).unwrap();
        // First quad of face 0, corner 0: the corner vertex, the edge
        // point of (0,1), the face point, the edge point of (3,0).
        let first = result.mesh.face(0).unwrap();
        assert_eq!(first.vertices(), &[0, 14, 8, 17]);
    }

    #[test]
    fn test_boundary_as_crease_quad() {
        let result = catmull_clark(&single_quad(), &SubdivideOptions::new(1)).unwrap();
        // 4 originals + 1 face point + 4 edge points.
        assert_eq!(result.mesh.num_vertices(), 9);
        assert_eq!(result.mesh.num_faces(), 4);

        // All four edges are boundary creases, so every corner follows
        // the crease rule: (a + 6p + b) / 8.
        let v0 = result.mesh.vertex(0).unwrap();
        assert!((v0 - Point3::new(0.125, 0.125, 0.0)).norm() < 1e-12);

        // Boundary edge points are midpoints.
        let ep = result.mesh.vertex(4 + 1).unwrap();
        assert!((ep - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_boundary_smoothing_disabled() {
        let options = SubdivideOptions::new(1).with_boundary_as_crease(false);
        let result = catmull_clark(&single_quad(), &options).unwrap();
        assert_eq!(result.mesh.num_vertices(), 9);
        // Without the implicit crease the corner is pulled toward the
        // face centroid by the smooth rule.
        let v0 = result.mesh.vertex(0).unwrap();
        assert!((v0 - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_non_manifold_edge_falls_back_to_midpoint() {
        // Three quads share the edge (0, 1).
        let mut b = MeshBuilder::new();
        b.push_vertex(0.0, 0.0, 0.0); // 0
        b.push_vertex(1.0, 0.0, 0.0); // 1
        b.push_vertex(1.0, 1.0, 0.0); // 2
        b.push_vertex(0.0, 1.0, 0.0); // 3
        b.push_vertex(1.0, 0.0, 1.0); // 4
        b.push_vertex(0.0, 0.0, 1.0); // 5
        b.push_vertex(1.0, -1.0, 0.0); // 6
        b.push_vertex(0.0, -1.0, 0.0); // 7
        b.push_face(&[0, 1, 2, 3]);
        b.push_face(&[1, 0, 5, 4]);
        b.push_face(&[0, 1, 6, 7]);
        let mesh = b.freeze().unwrap();

        let options = SubdivideOptions::new(1).with_boundary_as_crease(false);
        let result = catmull_clark(&mesh, &options).unwrap();
        // Edge (0, 1) has ordinal 0; its point degrades to the midpoint.
        let ep = result.mesh.vertex(8 + 3).unwrap();
        assert!((ep - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_vertex_map_entries() {
        let result = catmull_clark(&PolyMesh::unit_cube(), &SubdivideOptions::new(1)).unwrap();
        let entry = result.vertex_map.from_base(0).unwrap();
        // Itself, three incident face points, three incident edge points.
        assert_eq!(entry.indices.len(), 7);
        assert_eq!(entry.indices[0], 0);

        // Round trip: every derived correspondent points back at 0.
        for &derived in &entry.indices {
            let back = result.vertex_map.to_base(derived).unwrap();
            assert!(back.indices.contains(&0));
        }

        // Face and edge points carry identity transforms.
        for (i, transform) in entry.transforms.iter().enumerate().skip(1) {
            assert_eq!(*transform, Matrix4::identity(), "entry {}", i);
        }
    }

    #[test]
    fn test_face_map_entries() {
        let result = catmull_clark(&PolyMesh::unit_cube(), &SubdivideOptions::new(1)).unwrap();
        for f in 0..6 {
            let run = result.face_map.from_base(f).unwrap();
            assert_eq!(run.indices, vec![4 * f, 4 * f + 1, 4 * f + 2, 4 * f + 3]);
            for (k, &quad) in run.indices.iter().enumerate() {
                let back = result.face_map.to_base(quad).unwrap();
                assert_eq!(back.indices, vec![f]);
                // The two directions of one correspondence are inverse
                // rigid motions.
                let composed = back.transforms[0] * run.transforms[k];
                assert!((composed - Matrix4::identity()).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn test_two_iterations_compose() {
        let result = catmull_clark(&PolyMesh::unit_cube(), &SubdivideOptions::new(2)).unwrap();
        assert_eq!(result.mesh.num_vertices(), 98);
        assert_eq!(result.mesh.num_faces(), 96);

        let lengths = result.face_map.lengths();
        assert_eq!(lengths.base, 6);
        assert_eq!(lengths.derived, 96);
        for f in 0..6 {
            let run = result.face_map.from_base(f).unwrap();
            assert_eq!(run.indices.len(), 16);
            for &quad in &run.indices {
                assert_eq!(result.face_map.to_base(quad).unwrap().indices, vec![f]);
            }
        }

        let vlengths = result.vertex_map.lengths();
        assert_eq!(vlengths.base, 8);
        assert_eq!(vlengths.derived, 98);
    }

    #[test]
    fn test_creases_propagate_across_iterations() {
        let result = catmull_clark(&creased_cube(), &SubdivideOptions::new(2)).unwrap();
        assert_eq!(result.mesh.num_vertices(), 98);
        // The original corners keep three sharp edges at every level, so
        // they never move.
        for v in 0..8 {
            let after = result.mesh.vertex(v).unwrap();
            let before = PolyMesh::unit_cube().vertex(v).unwrap();
            assert!((after - before).norm() < 1e-12);
        }
    }

    #[test]
    fn test_zero_iterations() {
        let cube = PolyMesh::unit_cube();
        let result = catmull_clark(&cube, &SubdivideOptions::new(0)).unwrap();
        assert_eq!(result.mesh.num_vertices(), 8);
        assert_eq!(result.mesh.num_faces(), 6);
        assert_eq!(result.vertex_map.from_base(3).unwrap().indices, vec![3]);
        assert_eq!(result.face_map.to_base(5).unwrap().indices, vec![5]);
    }
}
