//! This module defines [`Triangle`] and the [`TriangleStore`] which owns the vertex data
//! a [`Bvh`] is built over.
//!
//! [`Bvh`]: crate::bvh::Bvh

use crate::aabb::{Aabb, Bounded};
use crate::error::{BvhError, Result};
use crate::{Point3, Real, Vector3, EPSILON};

/// Number of floats describing one triangle: three vertices with three coordinates each.
pub const FLOATS_PER_TRIANGLE: usize = 9;

/// A triangle struct. Its front face is the one around which `a`, `b`, `c` wind
/// counter clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    /// First point on the triangle
    pub a: Point3,
    /// Second point on the triangle
    pub b: Point3,
    /// Third point on the triangle
    pub c: Point3,
}

impl Triangle {
    /// Creates a new triangle given a counter clockwise set of points
    pub fn new(a: Point3, b: Point3, c: Point3) -> Triangle {
        Triangle { a, b, c }
    }

    /// Creates a triangle from nine consecutive coordinates `[ax, ay, az, bx, .., cz]`.
    pub fn from_slice(v: &[Real; FLOATS_PER_TRIANGLE]) -> Triangle {
        Triangle::new(
            Point3::new(v[0], v[1], v[2]),
            Point3::new(v[3], v[4], v[5]),
            Point3::new(v[6], v[7], v[8]),
        )
    }

    /// Inverse of [`Triangle::from_slice`].
    pub fn to_array(&self) -> [Real; FLOATS_PER_TRIANGLE] {
        [
            self.a.x, self.a.y, self.a.z, self.b.x, self.b.y, self.b.z, self.c.x, self.c.y,
            self.c.z,
        ]
    }

    /// The mean of the three corners.
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// The unnormalized face normal `(b - a) x (c - a)`. Its length is twice the area.
    pub fn normal(&self) -> Vector3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn area(&self) -> Real {
        self.normal().norm() / 2.0
    }

    /// Zero-area triangles (collinear or coincident corners) never report intersections.
    pub fn is_degenerate(&self) -> bool {
        !(self.area() > EPSILON * EPSILON)
    }
}

impl Bounded for Triangle {
    fn aabb(&self) -> Aabb {
        Aabb::from_point(self.a).grow(&self.b).grow(&self.c)
    }
}

/// Flat storage of triangle vertex data.
///
/// Triangle `i` is made of the floats `9 * i .. 9 * i + 9` of the vertex array; its index is
/// stable for the lifetime of the store. Per-triangle bounds and centroids are computed once
/// on construction.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleStore {
    vertices: Vec<Real>,
    aabbs: Vec<Aabb>,
    centroids: Vec<Point3>,
}

impl TriangleStore {
    /// Creates a store from a flat vertex array, one triangle per nine floats.
    ///
    /// Fails with [`BvhError::MalformedInput`] unless the length is a positive multiple
    /// of nine. Coordinates are not validated otherwise: triangles with NaN or infinite
    /// corners are kept and simply never intersect anything.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::triangle::TriangleStore;
    ///
    /// let store = TriangleStore::from_vertex_array(vec![
    ///     0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
    /// ]).unwrap();
    /// assert_eq!(store.len(), 1);
    ///
    /// assert!(TriangleStore::from_vertex_array(vec![0.0; 10]).is_err());
    /// assert!(TriangleStore::from_vertex_array(vec![]).is_err());
    /// ```
    pub fn from_vertex_array(vertices: Vec<Real>) -> Result<TriangleStore> {
        if vertices.is_empty() || vertices.len() % FLOATS_PER_TRIANGLE != 0 {
            return Err(BvhError::MalformedInput {
                len: vertices.len(),
            });
        }
        Ok(TriangleStore::from_valid_vertices(vertices))
    }

    /// Creates a store from a list of triangles, preserving their order.
    /// Unlike [`TriangleStore::from_vertex_array`], an empty list is accepted.
    pub fn from_triangles(triangles: &[Triangle]) -> TriangleStore {
        let vertices = triangles
            .iter()
            .flat_map(|triangle| triangle.to_array())
            .collect();
        TriangleStore::from_valid_vertices(vertices)
    }

    fn from_valid_vertices(vertices: Vec<Real>) -> TriangleStore {
        let (aabbs, centroids) = vertices
            .chunks_exact(FLOATS_PER_TRIANGLE)
            .map(|chunk| {
                let mut v = [0.0; FLOATS_PER_TRIANGLE];
                v.copy_from_slice(chunk);
                let triangle = Triangle::from_slice(&v);
                (triangle.aabb(), triangle.centroid())
            })
            .unzip();
        TriangleStore {
            vertices,
            aabbs,
            centroids,
        }
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.aabbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aabbs.is_empty()
    }

    /// Returns the triangle at `index`, or `None` if it is out of range.
    pub fn get(&self, index: usize) -> Option<Triangle> {
        let start = index.checked_mul(FLOATS_PER_TRIANGLE)?;
        let end = start.checked_add(FLOATS_PER_TRIANGLE)?;
        let chunk = self.vertices.get(start..end)?;
        let mut v = [0.0; FLOATS_PER_TRIANGLE];
        v.copy_from_slice(chunk);
        Some(Triangle::from_slice(&v))
    }

    /// Iterates over all triangles in index order.
    pub fn iter(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// The bounding box of the triangle at `index`.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn aabb(&self, index: usize) -> Aabb {
        self.aabbs[index]
    }

    /// The centroid of the triangle at `index`.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn centroid(&self, index: usize) -> Point3 {
        self.centroids[index]
    }

    /// The raw vertex array the store was built from.
    pub fn vertex_array(&self) -> &[Real] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::error::BvhError;
    use crate::triangle::{Triangle, TriangleStore};
    use crate::{Point3, Real, EPSILON};
    use float_eq::assert_float_eq;

    #[test]
    fn test_rejects_malformed_lengths() {
        for len in [0, 1, 8, 10, 17, 19] {
            assert_eq!(
                TriangleStore::from_vertex_array(vec![0.0; len]),
                Err(BvhError::MalformedInput { len })
            );
        }
    }

    #[test]
    fn test_preserves_input_order() {
        let vertices: Vec<Real> = (0..27).map(|x| x as Real).collect();
        let store = TriangleStore::from_vertex_array(vertices.clone()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.vertex_array(), vertices.as_slice());
        let second = store.get(1).unwrap();
        assert_eq!(second.a, Point3::new(9.0, 10.0, 11.0));
        assert_eq!(second.c, Point3::new(15.0, 16.0, 17.0));
        assert_eq!(store.get(3), None);
        assert_eq!(store.get(usize::MAX), None);
    }

    #[test]
    fn test_from_triangles_round_trips_vertices() {
        let triangles = [
            Triangle::new(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ),
            Triangle::new(
                Point3::new(5.0, 5.0, 5.0),
                Point3::new(6.0, 5.0, 5.0),
                Point3::new(5.0, 6.0, 7.0),
            ),
        ];
        let store = TriangleStore::from_triangles(&triangles);
        assert_eq!(store.iter().collect::<Vec<_>>(), triangles);
        assert_eq!(store.aabb(1), triangles[1].aabb());
        assert_eq!(store.centroid(0), triangles[0].centroid());

        assert!(TriangleStore::from_triangles(&[]).is_empty());
    }

    #[test]
    fn test_nan_coordinates_pass_through() {
        let mut vertices = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        vertices[4] = Real::NAN;
        let store = TriangleStore::from_vertex_array(vertices).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(0).unwrap().b.y.is_nan());
    }

    #[test]
    fn test_triangle_geometry() {
        let triangle = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        assert_float_eq!(triangle.area(), 2.0, abs <= EPSILON);
        assert_eq!(triangle.normal().z, 4.0);
        assert!(!triangle.is_degenerate());

        let aabb = triangle.aabb();
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(2.0, 2.0, 0.0));

        let collinear = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        );
        assert!(collinear.is_degenerate());
    }
}
