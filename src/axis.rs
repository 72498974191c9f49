//! Axis enum for indexing three-dimensional structures.

use crate::{Point3, Real, Vector3};
use std::fmt::{Display, Formatter, Result};
use std::ops::Index;

/// An `Axis` in a three-dimensional coordinate system.
/// Used to access `Vector3`/`Point3` structs via index.
///
/// # Examples
/// ```
/// use tri_bvh::axis::Axis;
///
/// let position = [1.0, 0.5, 42.0];
///
/// assert_eq!(position[Axis::Y], 0.5);
/// ```
///
/// [`Point3`] and [`Vector3`] are also indexable using `Axis`.
///
/// ```
/// use tri_bvh::axis::Axis;
/// use tri_bvh::Point3;
///
/// let position = Point3::new(1.0, 2.0, 3.0);
///
/// assert_eq!(position[Axis::Z], 3.0);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Index of the X axis.
    X = 0,

    /// Index of the Y axis.
    Y = 1,

    /// Index of the Z axis.
    Z = 2,
}

impl Axis {
    /// All axes, lowest index first. Ties between axes are broken in this order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Display implementation for `Axis`.
impl Display for Axis {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "{}",
            match *self {
                Axis::X => "x",
                Axis::Y => "y",
                Axis::Z => "z",
            }
        )
    }
}

/// Make slices indexable by `Axis`.
impl Index<Axis> for [Real] {
    type Output = Real;

    fn index(&self, axis: Axis) -> &Real {
        &self[axis as usize]
    }
}

/// Make `Point3` indexable by `Axis`.
impl Index<Axis> for Point3 {
    type Output = Real;

    fn index(&self, axis: Axis) -> &Real {
        &self.coords[axis as usize]
    }
}

/// Make `Vector3` indexable by `Axis`.
impl Index<Axis> for Vector3 {
    type Output = Real;

    fn index(&self, axis: Axis) -> &Real {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}
