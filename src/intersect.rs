//! Ray/triangle intersection.

use crate::ray::Ray;
use crate::triangle::Triangle;
use crate::{Real, EPSILON};

/// Options for [`intersect_triangle`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectOptions {
    /// Hits closer to the ray origin than this are discarded. Raise it slightly above zero
    /// to keep rays cast from a surface from hitting that same surface. Values below zero
    /// act as zero: hits behind the origin are never reported.
    pub t_min: Real,

    /// Skip triangles whose front face points away from the ray.
    pub backface_culling: bool,
}

impl Default for IntersectOptions {
    fn default() -> IntersectOptions {
        IntersectOptions {
            t_min: 0.0,
            backface_culling: false,
        }
    }
}

/// A struct which is returned by [`intersect_triangle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance from the ray origin to the intersection point.
    pub t: Real,

    /// Barycentric weight of the triangle's `b` corner.
    pub u: Real,

    /// Barycentric weight of the triangle's `c` corner.
    pub v: Real,
}

impl TriangleHit {
    /// Barycentric weight of the triangle's `a` corner.
    pub fn w(&self) -> Real {
        1.0 - self.u - self.v
    }
}

/// Implementation of the
/// [Möller-Trumbore triangle/ray intersection algorithm](https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm).
///
/// Returns the distance to the intersection and its barycentric coordinates, or `None` when
/// the ray is parallel to the triangle's plane, the hit lies outside the triangle, or the hit
/// lies before `options.t_min`. Every rejection test admits the same [`EPSILON`] slack, so
/// a ray through an edge shared by two triangles hits both rather than slipping through.
/// Degenerate triangles and NaN coordinates never hit.
///
/// # Examples
/// ```
/// use tri_bvh::intersect::{intersect_triangle, IntersectOptions};
/// use tri_bvh::ray::Ray;
/// use tri_bvh::triangle::Triangle;
/// use tri_bvh::{Point3, Vector3};
///
/// let triangle = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
/// let ray = Ray::new(Point3::new(0.25, 0.25, 2.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
///
/// let hit = intersect_triangle(&ray, &triangle, &IntersectOptions::default()).unwrap();
/// assert!((hit.t - 2.0).abs() < 1e-9);
/// ```
#[allow(clippy::many_single_char_names)]
pub fn intersect_triangle(
    ray: &Ray,
    triangle: &Triangle,
    options: &IntersectOptions,
) -> Option<TriangleHit> {
    let a_to_b = triangle.b - triangle.a;
    let a_to_c = triangle.c - triangle.a;

    // Begin calculating determinant - also used to calculate u parameter
    // u_vec lies in view plane
    let u_vec = ray.direction.cross(&a_to_c);

    // det = dir . (a_to_b x a_to_c), so |det| / |normal| is the cosine between the ray and
    // the normal. Near zero means the ray lies in the plane of the triangle.
    let det = a_to_b.dot(&u_vec);
    let normal_length = a_to_b.cross(&a_to_c).norm();
    if !(det.abs() > EPSILON * normal_length) {
        return None;
    }

    // A negative determinant means the ray travels along the normal and sees the back face.
    if options.backface_culling && det < 0.0 {
        return None;
    }

    let inv_det = 1.0 / det;

    // Vector from point a to ray origin
    let a_to_origin = ray.origin - triangle.a;

    // Calculate u parameter and test bounds
    let u = a_to_origin.dot(&u_vec) * inv_det;
    if !(u >= -EPSILON && u <= 1.0 + EPSILON) {
        return None;
    }

    // Prepare to test v parameter
    let v_vec = a_to_origin.cross(&a_to_b);

    // Calculate v parameter and test bound
    let v = ray.direction.dot(&v_vec) * inv_det;
    if !(v >= -EPSILON && u + v <= 1.0 + EPSILON) {
        return None;
    }

    let t = a_to_c.dot(&v_vec) * inv_det;
    if !(t >= options.t_min.max(0.0)) {
        return None;
    }

    Some(TriangleHit { t, u, v })
}
