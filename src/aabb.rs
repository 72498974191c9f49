//! Axis Aligned Bounding Boxes.

use crate::axis::Axis;
use crate::{Point3, Real, Vector3};
use std::fmt;
use std::ops::Index;

/// Aabb struct.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum coordinates
    pub min: Point3,

    /// Maximum coordinates
    pub max: Point3,
}

impl fmt::Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Min bound: ({}, {}, {}); Max bound: ({}, {}, {})",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
pub trait Bounded {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::{Aabb, Bounded};
    /// use tri_bvh::Point3;
    ///
    /// struct Something;
    ///
    /// impl Bounded for Something {
    ///     fn aabb(&self) -> Aabb {
    ///         let point1 = Point3::new(0.0, 0.0, 0.0);
    ///         let point2 = Point3::new(1.0, 1.0, 1.0);
    ///         Aabb::with_bounds(point1, point2)
    ///     }
    /// }
    ///
    /// let something = Something;
    /// let aabb = something.aabb();
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
    /// ```
    fn aabb(&self) -> Aabb;
}

impl Aabb {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    /// use tri_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.min.x, -1.0);
    /// assert_eq!(aabb.max.z, 1.0);
    /// ```
    pub fn with_bounds(min: Point3, max: Point3) -> Aabb {
        Aabb { min, max }
    }

    /// Creates an [`Aabb`] of zero size around a single point.
    pub fn from_point(point: Point3) -> Aabb {
        Aabb::with_bounds(point, point)
    }

    /// Creates a new empty [`Aabb`].
    ///
    /// The empty box has `min = +inf` and `max = -inf`, which makes it the identity of
    /// [`Aabb::join`] and [`Aabb::grow`].
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    ///
    /// let aabb = Aabb::empty();
    /// assert!(aabb.is_empty());
    /// ```
    pub fn empty() -> Aabb {
        Aabb {
            min: Point3::new(Real::INFINITY, Real::INFINITY, Real::INFINITY),
            max: Point3::new(Real::NEG_INFINITY, Real::NEG_INFINITY, Real::NEG_INFINITY),
        }
    }

    /// Returns true if the [`Point3`] is inside the [`Aabb`]. Boundaries are inclusive.
    pub fn contains(&self, p: &Point3) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }

    /// Returns true if the [`Point3`] is approximately inside the [`Aabb`]
    /// with respect to some `epsilon`.
    pub fn approx_contains_eps(&self, p: &Point3, epsilon: Real) -> bool {
        Axis::ALL.iter().all(|&axis| {
            (p[axis] - self.min[axis]) > -epsilon && (p[axis] - self.max[axis]) < epsilon
        })
    }

    /// Returns true if the `other` [`Aabb`] is approximately inside this [`Aabb`]
    /// with respect to some `epsilon`.
    pub fn approx_contains_aabb_eps(&self, other: &Aabb, epsilon: Real) -> bool {
        self.approx_contains_eps(&other.min, epsilon)
            && self.approx_contains_eps(&other.max, epsilon)
    }

    /// Returns true if the `other` [`Aabb`] is approximately equal to this [`Aabb`]
    /// with respect to some `epsilon`.
    pub fn relative_eq(&self, other: &Aabb, epsilon: Real) -> bool {
        Axis::ALL.iter().all(|&axis| {
            (self.min[axis] - other.min[axis]).abs() < epsilon
                && (self.max[axis] - other.max[axis]).abs() < epsilon
        })
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    /// use tri_bvh::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0, 0.0, 0.0), Point3::new(-100.0, 1.0, 1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert!(joint.contains(&Point3::new(0.0, 0.5, 0.5)));
    /// ```
    pub fn join(&self, other: &Aabb) -> Aabb {
        Aabb::with_bounds(
            Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Mutable version of [`Aabb::join`].
    pub fn join_mut(&mut self, other: &Aabb) {
        *self = self.join(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point3`].
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    /// use tri_bvh::Point3;
    ///
    /// let point1 = Point3::new(0.0, 0.0, 0.0);
    /// let point2 = Point3::new(1.0, 1.0, 1.0);
    /// let aabb = Aabb::empty().grow(&point1).grow(&point2);
    ///
    /// assert!(aabb.contains(&Point3::new(0.5, 0.5, 0.5)));
    /// ```
    pub fn grow(&self, other: &Point3) -> Aabb {
        self.join(&Aabb::from_point(*other))
    }

    /// Mutable version of [`Aabb::grow`].
    pub fn grow_mut(&mut self, other: &Point3) {
        *self = self.grow(other);
    }

    /// Returns the size of this [`Aabb`] in all three dimensions.
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Returns the center [`Point3`] of the [`Aabb`].
    pub fn center(&self) -> Point3 {
        self.min + (self.size() / 2.0)
    }

    /// An empty [`Aabb`] is one whose `min` exceeds its `max` along some axis.
    pub fn is_empty(&self) -> bool {
        Axis::ALL
            .iter()
            .any(|&axis| self.min[axis] > self.max[axis])
    }

    /// Returns true if the box has no width along any axis, i.e. everything inside it
    /// coincides. Empty boxes count as well.
    pub fn has_zero_extent(&self) -> bool {
        let size = self.size();
        Axis::ALL.iter().all(|&axis| !(size[axis] > 0.0))
    }

    /// Grows the box on every side by `factor` times the length of its diagonal.
    /// Empty boxes are returned unchanged.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    /// use tri_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::origin(), Point3::new(3.0, 4.0, 0.0));
    /// let padded = aabb.grow_relative(0.1);
    ///
    /// assert!((padded.min.z + 0.5).abs() < 1e-12);
    /// assert!((padded.max.x - 3.5).abs() < 1e-12);
    /// ```
    pub fn grow_relative(&self, factor: Real) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let pad = Vector3::repeat(self.size().norm() * factor);
        Aabb::with_bounds(self.min - pad, self.max + pad)
    }

    /// Returns the total surface area of this [`Aabb`].
    pub fn surface_area(&self) -> Real {
        let size = self.size();
        2.0 * (size.x * size.y + size.x * size.z + size.y * size.z)
    }

    /// Radius of the sphere around [`Aabb::center`] that encloses the whole box.
    pub fn bounding_sphere_radius(&self) -> Real {
        self.size().norm() / 2.0
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    /// Ties go to the lowest axis, x before y before z.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::aabb::Aabb;
    /// use tri_bvh::axis::Axis;
    /// use tri_bvh::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 2.0));
    /// assert_eq!(aabb.largest_axis(), Axis::Y);
    /// ```
    pub fn largest_axis(&self) -> Axis {
        let size = self.size();
        let mut largest = Axis::X;
        for axis in [Axis::Y, Axis::Z] {
            if size[axis] > size[largest] {
                largest = axis;
            }
        }
        largest
    }
}

/// Default instance for [`Aabb`]s. Returns an [`Aabb`] which is [`empty()`].
///
/// [`empty()`]: #method.empty
impl Default for Aabb {
    fn default() -> Aabb {
        Aabb::empty()
    }
}

/// Make [`Aabb`]s indexable. `aabb[0]` gives a reference to the minimum bound.
/// All other indices return a reference to the maximum bound.
impl Index<usize> for Aabb {
    type Output = Point3;

    fn index(&self, index: usize) -> &Point3 {
        if index == 0 {
            &self.min
        } else {
            &self.max
        }
    }
}

/// Implementation of [`Bounded`] for [`Aabb`].
impl Bounded for Aabb {
    fn aabb(&self) -> Aabb {
        *self
    }
}

/// Implementation of [`Bounded`] for [`Point3`].
impl Bounded for Point3 {
    fn aabb(&self) -> Aabb {
        Aabb::from_point(*self)
    }
}
