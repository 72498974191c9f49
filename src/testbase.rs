//! Common utilities shared by unit tests.
#![cfg(test)]

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bvh::{Bvh, Hit};
use crate::intersect::{intersect_triangle, IntersectOptions};
use crate::ray::Ray;
use crate::triangle::{Triangle, TriangleStore};
use crate::{Point3, Real, Vector3};

/// A vector represented as a tuple
pub type TupleVec = (Real, Real, Real);

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e10 to 10e10
/// A small enough range to prevent most floating point errors from breaking certain tests
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (-10e10..10e10, -10e10..10e10, -10e10..10e10)
}

/// Generate a `TupleVec` inside the cube `[-1, 1]^3`.
pub fn tuplevec_unit_strategy() -> impl Strategy<Value = TupleVec> {
    (-1.0..1.0, -1.0..1.0, -1.0..1.0)
}

/// Convert a `TupleVec` to a [`Point3`].
pub fn tuple_to_point(tpl: &TupleVec) -> Point3 {
    Point3::new(tpl.0, tpl.1, tpl.2)
}

/// Convert a `TupleVec` to a [`Vector3`].
pub fn tuple_to_vector(tpl: &TupleVec) -> Vector3 {
    Vector3::new(tpl.0, tpl.1, tpl.2)
}

/// A unit right triangle in the plane `z = z`, with its corner at `(x, y)`. Its normal points
/// towards +z.
pub fn unit_triangle_at(x: Real, y: Real, z: Real) -> Triangle {
    Triangle::new(
        Point3::new(x, y, z),
        Point3::new(x + 1.0, y, z),
        Point3::new(x, y + 1.0, z),
    )
}

/// `n` unit triangles stacked along the z axis at `z = 0, 1, .., n - 1`, listed in an
/// order that is not sorted by height.
pub fn stacked_triangles(n: usize) -> Vec<Triangle> {
    let mut heights = (0..n).collect::<Vec<_>>();
    heights.reverse();
    heights.rotate_left(n / 3);
    heights
        .into_iter()
        .map(|z| unit_triangle_at(0.0, 0.0, z as Real))
        .collect()
}

/// A flat `size` x `size` grid of quads in the `z = 0` plane, two triangles per quad.
pub fn grid_mesh(size: usize) -> Vec<Triangle> {
    let mut triangles = Vec::with_capacity(size * size * 2);
    for i in 0..size {
        for j in 0..size {
            let (x, y) = (i as Real, j as Real);
            triangles.push(Triangle::new(
                Point3::new(x, y, 0.0),
                Point3::new(x + 1.0, y, 0.0),
                Point3::new(x, y + 1.0, 0.0),
            ));
            triangles.push(Triangle::new(
                Point3::new(x + 1.0, y, 0.0),
                Point3::new(x + 1.0, y + 1.0, 0.0),
                Point3::new(x, y + 1.0, 0.0),
            ));
        }
    }
    triangles
}

/// `n` copies of the same triangle.
pub fn coincident_triangles(n: usize) -> Vec<Triangle> {
    vec![unit_triangle_at(2.0, 2.0, 2.0); n]
}

/// `n` seeded random triangles of moderate size inside the cube `[-50, 50]^3`.
pub fn random_triangles(n: usize, seed: u64) -> Vec<Triangle> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let center = Point3::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            let mut corner = || {
                center
                    + Vector3::new(
                        rng.random_range(-3.0..3.0),
                        rng.random_range(-3.0..3.0),
                        rng.random_range(-3.0..3.0),
                    )
            };
            let (a, b, c) = (corner(), corner(), corner());
            Triangle::new(a, b, c)
        })
        .collect()
}

/// `n` seeded random rays starting outside `[-50, 50]^3` and aimed into it.
pub fn random_rays(n: usize, seed: u64) -> Vec<Ray> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let origin = Point3::new(
                rng.random_range(-80.0..80.0),
                rng.random_range(-80.0..80.0),
                100.0,
            );
            let target = Point3::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            Ray::new(origin, target - origin).expect("origin and target never coincide")
        })
        .collect()
}

/// Tests every triangle of `store` against `ray`, without any acceleration structure.
/// Returns `(triangle_index, t)` pairs ordered by distance.
pub fn brute_force_hits(
    store: &TriangleStore,
    ray: &Ray,
    options: &IntersectOptions,
) -> Vec<(usize, Real)> {
    let mut hits = store
        .iter()
        .enumerate()
        .filter_map(|(index, triangle)| {
            intersect_triangle(ray, &triangle, options).map(|hit| (index, hit.t))
        })
        .collect::<Vec<_>>();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    hits
}

/// Projects hits onto `(triangle_index, t)` for comparison with [`brute_force_hits`].
pub fn hit_pairs(hits: &[Hit]) -> Vec<(usize, Real)> {
    hits.iter().map(|hit| (hit.triangle_index, hit.t)).collect()
}

/// Builds a [`Bvh`] over `triangles` with the given leaf size.
pub fn build_bvh(triangles: &[Triangle], max_leaf_size: usize) -> Bvh {
    Bvh::from_triangles(triangles, max_leaf_size).expect("valid leaf size")
}
