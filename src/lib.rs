//! A bounding volume hierarchy over static triangle soups, built for ray picking.
//!
//! ## About
//!
//! Viewers that highlight the triangle under the cursor cast one or more rays per frame
//! against a mesh. Testing every triangle is O(n) per ray; this crate partitions the
//! triangles once into a binary tree of axis-aligned bounding boxes (a BVH), so that a
//! ray only has to be tested against the few triangles whose boxes it actually crosses.
//!
//! The hierarchy is built with a median split along the axis of greatest extent, is
//! immutable after construction and can be shared between threads for concurrent queries.
//!
//! ## Example
//!
//! ```
//! use tri_bvh::bvh::Bvh;
//! use tri_bvh::{Point3, Vector3};
//!
//! // Two triangles in the z = 0 plane, nine floats each.
//! let vertices = vec![
//!     0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, 1000.0, 1000.0, 0.0,
//!     0.0, 0.0, 0.0, 2000.0, 0.0, 0.0, 2000.0, 1000.0, 0.0,
//! ];
//! let bvh = Bvh::build(vertices, 7).unwrap();
//!
//! let origin = Point3::new(1500.0, 3.0, 1000.0);
//! let direction = Vector3::new(0.0, 0.0, -1.0);
//! let hits = bvh.intersect_ray(origin, direction, true).unwrap();
//!
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].triangle_index, 1);
//! ```
//!
//! ## Features
//!
//! - `rayon` (default **enabled**) - builds large subtrees in parallel
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for
//!   the tree, its nodes, triangles, hits and option structs
//! - `cli` (default **disabled**) - builds the `tri-bvh` demo binary
//!

/// Float type used by this crate.
pub type Real = f64;

/// Point math type used by this crate. Type alias for [`nalgebra::Point3`].
pub type Point3 = nalgebra::Point3<Real>;

/// Vector math type used by this crate. Type alias for [`nalgebra::Vector3`].
pub type Vector3 = nalgebra::Vector3<Real>;

/// The tolerance shared by the ray/triangle rejection tests and the degenerate-box checks.
pub const EPSILON: Real = 1e-6;

pub mod aabb;
pub mod axis;
pub mod bvh;
pub mod error;
pub mod intersect;
pub mod ray;
pub mod triangle;
mod utils;

#[cfg(test)]
mod testbase;

pub use crate::error::{BvhError, Result};
