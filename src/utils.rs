//! Utilities module.

use crate::aabb::Aabb;
use crate::triangle::TriangleStore;

/// `if x < y { x } else { y }`. Returns `y` when either argument is NaN, so a NaN slab
/// distance passed as `x` never replaces the running bound passed as `y`.
#[inline(always)]
pub fn fast_min<T: Copy + PartialOrd>(x: T, y: T) -> T {
    if x < y {
        x
    } else {
        y
    }
}

/// `if x > y { x } else { y }`. Same NaN behavior as [`fast_min`].
#[inline(always)]
pub fn fast_max<T: Copy + PartialOrd>(x: T, y: T) -> T {
    if x > y {
        x
    } else {
        y
    }
}

/// Returns the joint [`Aabb`] of the triangles at `indices`, and the [`Aabb`] of their
/// centroids.
pub fn joint_aabb_of_triangles(indices: &[usize], store: &TriangleStore) -> (Aabb, Aabb) {
    let mut aabb = Aabb::empty();
    let mut centroid = Aabb::empty();
    for &index in indices {
        aabb.join_mut(&store.aabb(index));
        centroid.grow_mut(&store.centroid(index));
    }
    (aabb, centroid)
}
