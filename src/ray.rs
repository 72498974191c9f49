//! This module defines a Ray structure and the slab test against axis aligned bounding boxes.
//! The ray/triangle test lives in [`crate::intersect`].

use crate::aabb::Aabb;
use crate::axis::Axis;
use crate::error::{BvhError, Result};
use crate::utils::{fast_max, fast_min};
use crate::{Point3, Real, Vector3};

/// A struct which defines a ray and some of its cached values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The ray origin.
    pub origin: Point3,

    /// The ray direction. Always of unit length.
    pub direction: Vector3,

    /// Inverse (1/x) ray direction. Cached for use in [`Aabb`] intersections.
    pub inv_direction: Vector3,
}

impl Ray {
    /// Creates a new [`Ray`] from an `origin` and a `direction`.
    /// `direction` will be normalized.
    ///
    /// Fails with [`BvhError::DegenerateRay`] if `direction` has zero length or any
    /// non-finite component.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::ray::Ray;
    /// use tri_bvh::{Point3, Vector3};
    ///
    /// let origin = Point3::new(0.0, 0.0, 0.0);
    /// let direction = Vector3::new(2.0, 0.0, 0.0);
    /// let ray = Ray::new(origin, direction).unwrap();
    ///
    /// assert_eq!(ray.origin, origin);
    /// assert_eq!(ray.direction, Vector3::new(1.0, 0.0, 0.0));
    ///
    /// assert!(Ray::new(origin, Vector3::zeros()).is_err());
    /// ```
    pub fn new(origin: Point3, direction: Vector3) -> Result<Ray> {
        if !direction.iter().all(|x| x.is_finite()) {
            return Err(BvhError::DegenerateRay);
        }
        // Scale to a largest component of one first, so the norm can neither underflow
        // nor overflow.
        let largest = direction.amax();
        if !(largest > 0.0) {
            return Err(BvhError::DegenerateRay);
        }
        let direction = (direction / largest).normalize();
        Ok(Ray {
            origin,
            direction,
            inv_direction: direction.map(|x| 1.0 / x),
        })
    }

    /// Returns true if the direction is zero or not finite. [`Ray::new`] never produces such
    /// a ray, but the fields are public.
    pub fn is_degenerate(&self) -> bool {
        !self.direction.iter().all(|x| x.is_finite()) || self.direction == Vector3::zeros()
    }

    /// Returns the point at distance `t` along the ray.
    pub fn at(&self, t: Real) -> Point3 {
        self.origin + self.direction * t
    }

    /// Tests the intersection of a [`Ray`] with an [`Aabb`] using the slab test.
    /// Box boundaries are inclusive, so flat boxes (such as the box of an axis aligned
    /// triangle) are hit as well.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    /// use tri_bvh::ray::Ray;
    /// use tri_bvh::{Point3, Vector3};
    ///
    /// let origin = Point3::new(0.0, 0.0, 0.0);
    /// let direction = Vector3::new(1.0, 0.0, 0.0);
    /// let ray = Ray::new(origin, direction).unwrap();
    ///
    /// let point1 = Point3::new(99.9, -1.0, -1.0);
    /// let point2 = Point3::new(100.1, 1.0, 1.0);
    /// let aabb = Aabb::with_bounds(point1, point2);
    ///
    /// assert!(ray.intersects_aabb(&aabb));
    /// ```
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.intersection_slice_for_aabb(aabb).is_some()
    }

    /// Intersects the [`Ray`] with an [`Aabb`] and returns the parametric range
    /// `(entry, exit)` along the ray which lies inside the box.
    ///
    /// `entry` is clamped to zero, so it is `0` when the origin lies inside the box.
    /// Returns `None` if the ray misses the box or the box lies behind the origin.
    pub fn intersection_slice_for_aabb(&self, aabb: &Aabb) -> Option<(Real, Real)> {
        let mut entry: Real = 0.0;
        let mut exit = Real::INFINITY;

        for axis in Axis::ALL {
            let origin = self.origin[axis];
            let (min, max) = (aabb.min[axis], aabb.max[axis]);

            if self.direction[axis] == 0.0 {
                // Parallel to this slab, the origin has to lie between its planes.
                if !(origin >= min && origin <= max) {
                    return None;
                }
                continue;
            }

            let inv = self.inv_direction[axis];
            let t1 = (min - origin) * inv;
            let t2 = (max - origin) * inv;

            entry = fast_max(fast_min(t1, t2), entry);
            exit = fast_min(fast_max(t1, t2), exit);

            if !(entry <= exit) {
                return None;
            }
        }

        Some((entry, exit))
    }
}
