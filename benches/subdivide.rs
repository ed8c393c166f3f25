//! Benchmarks for subdivision and mapping operations.

use criterion::{criterion_group, criterion_main, Criterion};
use lamina::prelude::*;

fn create_grid_mesh(n: usize) -> PolyMesh {
    let mut builder = MeshBuilder::with_capacity((n + 1) * (n + 1), n * n, n * n * 4);

    for j in 0..=n {
        for i in 0..=n {
            builder.push_vertex(i as f64, j as f64, 0.0);
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = (j * (n + 1) + i) as u32;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1) as u32;
            let v11 = v01 + 1;
            builder.push_face(&[v00, v10, v11, v01]);
        }
    }

    builder.freeze().unwrap()
}

fn bench_subdivide(c: &mut Criterion) {
    let grid = create_grid_mesh(16);

    c.bench_function("catmull_clark_16x16_1_iter", |b| {
        let options = SubdivideOptions::new(1);
        b.iter(|| subdivide(&grid, &options).unwrap())
    });

    c.bench_function("catmull_clark_16x16_2_iters", |b| {
        let options = SubdivideOptions::new(2);
        b.iter(|| subdivide(&grid, &options).unwrap())
    });
}

fn bench_triangulate(c: &mut Criterion) {
    let grid = create_grid_mesh(32);

    c.bench_function("triangulate_32x32", |b| {
        b.iter(|| triangulate(&grid).unwrap())
    });
}

fn bench_map_compile(c: &mut Criterion) {
    let grid = create_grid_mesh(16);
    let subdivided = subdivide(&grid, &SubdivideOptions::new(1)).unwrap();
    let triangulated = triangulate(&subdivided.mesh).unwrap();

    c.bench_function("compile_face_maps_16x16", |b| {
        b.iter(|| compile(&subdivided.face_map, &triangulated.face_map).unwrap())
    });
}

fn bench_vertex_neighbors(c: &mut Criterion) {
    let grid = create_grid_mesh(16);
    let center = 8 * 17 + 8;

    c.bench_function("vertex_neighbors_grid_interior", |b| {
        b.iter(|| grid.vertex_neighbors(center, None).unwrap())
    });
}

criterion_group!(
    benches,
    bench_subdivide,
    bench_triangulate,
    bench_map_compile,
    bench_vertex_neighbors
);
criterion_main!(benches);
