//! Benchmarks for hull smoothing.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{Point3, Vector3};
use ripple::prelude::*;

/// Generate a coarse sphere-like hull: an octahedron refined once by plain
/// midpoint splitting and pushed onto the unit sphere. 32 triangles, the
/// size of a typical droplet hull.
fn create_sphere_hull() -> (Vec<HullVertex>, Vec<u32>) {
    let mut positions = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces: Vec<[u32; 3]> = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];

    let mut midpoints = std::collections::HashMap::new();
    let mut split = |a: u32, b: u32, positions: &mut Vec<Point3<f32>>| -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        *midpoints.entry(key).or_insert_with(|| {
            let m = (positions[a as usize].coords + positions[b as usize].coords).normalize();
            positions.push(Point3::from(m));
            (positions.len() - 1) as u32
        })
    };

    let mut indices = Vec::new();
    for [a, b, c] in faces {
        let ab = split(a, b, &mut positions);
        let bc = split(b, c, &mut positions);
        let ca = split(c, a, &mut positions);
        indices.extend_from_slice(&[a, ab, ca, b, bc, ab, c, ca, bc, ab, bc, ca]);
    }

    let vertices = positions
        .into_iter()
        .map(|p| HullVertex::new(p, Vector3::zeros()))
        .collect();
    (vertices, indices)
}

fn bench_smooth_levels(c: &mut Criterion) {
    let (vertices, indices) = create_sphere_hull();

    for level in 1..=3u16 {
        c.bench_function(&format!("smooth_sphere_level_{level}"), |b| {
            let mut smoother = LoopSmoother::new(level);
            let mut out_vertices = Vec::new();
            let mut out_indices = Vec::new();

            // Warm the pools so the measurement reflects the steady state.
            smoother
                .smooth(&vertices, &indices, &mut out_vertices, &mut out_indices)
                .unwrap();

            b.iter(|| {
                smoother
                    .smooth(&vertices, &indices, &mut out_vertices, &mut out_indices)
                    .unwrap();
                out_indices.len()
            });
        });
    }
}

fn bench_refine_levels(c: &mut Criterion) {
    let (vertices, indices) = create_sphere_hull();

    for refine in [1u16, 3] {
        c.bench_function(&format!("smooth_sphere_refine_{refine}"), |b| {
            let mut smoother = LoopSmoother::new(2);
            smoother.set_smooth_level(2, refine);
            let mut out_vertices = Vec::new();
            let mut out_indices = Vec::new();

            smoother
                .smooth(&vertices, &indices, &mut out_vertices, &mut out_indices)
                .unwrap();

            b.iter(|| {
                smoother
                    .smooth(&vertices, &indices, &mut out_vertices, &mut out_indices)
                    .unwrap();
                out_indices.len()
            });
        });
    }
}

criterion_group!(benches, bench_smooth_levels, bench_refine_levels);
criterion_main!(benches);
