//! Ray queries against a [`Bvh`].

use crate::bvh::{Bvh, BvhNode};
use crate::error::{BvhError, Result};
use crate::intersect::{intersect_triangle, IntersectOptions};
use crate::ray::Ray;
use crate::triangle::Triangle;
use crate::{Point3, Real, Vector3, EPSILON};

/// Options for [`Bvh::intersect_ray_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueryOptions {
    /// Return every hit ordered by distance. Otherwise only the nearest hit is returned.
    pub find_all: bool,

    /// Options passed on to every ray/triangle test.
    pub intersect: IntersectOptions,

    /// Upper bound on node visits plus triangle tests. A query that needs more fails with
    /// [`BvhError::QueryBudgetExceeded`]. `None` means unbounded.
    pub max_steps: Option<usize>,
}

impl Default for QueryOptions {
    fn default() -> QueryOptions {
        QueryOptions {
            find_all: true,
            intersect: IntersectOptions::default(),
            max_steps: None,
        }
    }
}

impl QueryOptions {
    /// Every hit, nearest first.
    pub fn all() -> QueryOptions {
        QueryOptions::default()
    }

    /// Only the nearest hit.
    pub fn nearest() -> QueryOptions {
        QueryOptions {
            find_all: false,
            ..Default::default()
        }
    }
}

/// A ray/triangle intersection found by a [`Bvh`] query. Owns a copy of the triangle, so
/// it stays valid independently of the [`Bvh`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hit {
    /// Index of the triangle in the [`TriangleStore`](crate::triangle::TriangleStore).
    pub triangle_index: usize,

    pub triangle: Triangle,

    /// Distance along the ray.
    pub t: Real,

    /// The intersection point, `origin + t * direction`.
    pub point: Point3,

    /// Barycentric weight of the triangle's `b` corner.
    pub u: Real,

    /// Barycentric weight of the triangle's `c` corner.
    pub v: Real,
}

impl Hit {
    /// Barycentric weight of the triangle's `a` corner.
    pub fn w(&self) -> Real {
        1.0 - self.u - self.v
    }

    /// Nearest first, ties broken by triangle index.
    fn is_before(&self, other: &Hit) -> bool {
        self.t < other.t || (self.t == other.t && self.triangle_index < other.triangle_index)
    }
}

/// The intersector admits hits a few [`EPSILON`] (in units of the triangle's edges) outside
/// a triangle. Node boxes are padded by this factor of their diagonal before the slab test,
/// so no such hit is pruned away.
const BOX_SLACK: Real = 4.0 * EPSILON;

/// Slab test of `ray` against the padded box of `node`.
fn node_slice(ray: &Ray, node: &BvhNode) -> Option<(Real, Real)> {
    ray.intersection_slice_for_aabb(&node.aabb().grow_relative(BOX_SLACK))
}

/// Counts the work done by a single query.
struct StepBudget {
    max_steps: Option<usize>,
    steps: usize,
}

impl StepBudget {
    fn new(max_steps: Option<usize>) -> StepBudget {
        StepBudget {
            max_steps,
            steps: 0,
        }
    }

    fn step(&mut self) -> Result<()> {
        self.steps += 1;
        match self.max_steps {
            Some(max_steps) if self.steps > max_steps => {
                Err(BvhError::QueryBudgetExceeded { max_steps })
            }
            _ => Ok(()),
        }
    }
}

impl Bvh {
    /// Casts a ray from `origin` along `direction` and returns the triangles it hits.
    ///
    /// With `find_all` every hit is returned, ordered by ascending distance (and by
    /// triangle index among equal distances). Otherwise the result holds at most one hit:
    /// the nearest. A ray through an edge shared by two triangles hits both.
    ///
    /// Fails with [`BvhError::DegenerateRay`] if `direction` is zero or not finite.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::bvh::Bvh;
    /// use tri_bvh::{BvhError, Point3, Vector3};
    ///
    /// let bvh = Bvh::build(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 7).unwrap();
    /// let origin = Point3::new(0.2, 0.2, 5.0);
    ///
    /// let hits = bvh.intersect_ray(origin, Vector3::new(0.0, 0.0, -2.0), false).unwrap();
    /// assert_eq!(hits.len(), 1);
    /// assert!((hits[0].t - 5.0).abs() < 1e-9);
    ///
    /// let missed = bvh.intersect_ray(origin, Vector3::new(0.0, 0.0, 1.0), true).unwrap();
    /// assert!(missed.is_empty());
    ///
    /// assert_eq!(
    ///     bvh.intersect_ray(origin, Vector3::zeros(), true),
    ///     Err(BvhError::DegenerateRay)
    /// );
    /// ```
    pub fn intersect_ray(
        &self,
        origin: Point3,
        direction: Vector3,
        find_all: bool,
    ) -> Result<Vec<Hit>> {
        let ray = Ray::new(origin, direction)?;
        let options = QueryOptions {
            find_all,
            ..Default::default()
        };
        self.intersect_ray_with(&ray, &options)
    }

    /// Like [`Bvh::intersect_ray`], with full control over the query.
    pub fn intersect_ray_with(&self, ray: &Ray, options: &QueryOptions) -> Result<Vec<Hit>> {
        if ray.is_degenerate() {
            return Err(BvhError::DegenerateRay);
        }

        let mut budget = StepBudget::new(options.max_steps);
        let hits = if options.find_all {
            self.find_all(ray, options, &mut budget)?
        } else {
            self.find_nearest(ray, options, &mut budget)?
                .into_iter()
                .collect()
        };

        log::trace!(
            "ray from {} towards {}: {} hits in {} steps",
            ray.origin,
            ray.direction,
            hits.len(),
            budget.steps
        );
        Ok(hits)
    }

    /// Depth first over every node whose box the ray crosses.
    fn find_all(
        &self,
        ray: &Ray,
        options: &QueryOptions,
        budget: &mut StepBudget,
    ) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        let mut stack = Vec::new();
        if node_slice(ray, self.root()).is_some() {
            stack.push(0);
        }

        while let Some(index) = stack.pop() {
            budget.step()?;
            match self.nodes()[index] {
                BvhNode::Internal { left, right, .. } => {
                    if node_slice(ray, &self.nodes()[right]).is_some() {
                        stack.push(right);
                    }
                    if node_slice(ray, &self.nodes()[left]).is_some() {
                        stack.push(left);
                    }
                }
                BvhNode::Leaf { .. } => {
                    for &triangle_index in self.leaf_triangles(&self.nodes()[index]) {
                        budget.step()?;
                        hits.extend(self.hit_triangle(ray, triangle_index, &options.intersect));
                    }
                }
            }
        }

        hits.sort_by(|a, b| {
            a.t.total_cmp(&b.t)
                .then(a.triangle_index.cmp(&b.triangle_index))
        });
        Ok(hits)
    }

    /// Depth first, nearer child first, skipping subtrees that start beyond the best hit
    /// so far.
    fn find_nearest(
        &self,
        ray: &Ray,
        options: &QueryOptions,
        budget: &mut StepBudget,
    ) -> Result<Option<Hit>> {
        let mut best: Option<Hit> = None;
        let mut stack: Vec<(usize, Real)> = Vec::new();
        if let Some((entry, _)) = node_slice(ray, self.root()) {
            stack.push((0, entry));
        }

        while let Some((index, entry)) = stack.pop() {
            // Boxes starting within rounding distance of the best hit may still hold a hit
            // at the same distance with a lower index.
            if let Some(best) = &best {
                if entry > best.t + EPSILON * best.t.abs().max(1.0) {
                    continue;
                }
            }

            budget.step()?;
            match self.nodes()[index] {
                BvhNode::Internal { left, right, .. } => {
                    let left = node_slice(ray, &self.nodes()[left]).map(|(entry, _)| (left, entry));
                    let right =
                        node_slice(ray, &self.nodes()[right]).map(|(entry, _)| (right, entry));
                    match (left, right) {
                        (Some(left), Some(right)) => {
                            let (near, far) = if right.1 < left.1 {
                                (right, left)
                            } else {
                                (left, right)
                            };
                            stack.push(far);
                            stack.push(near);
                        }
                        (Some(child), None) | (None, Some(child)) => stack.push(child),
                        (None, None) => {}
                    }
                }
                BvhNode::Leaf { .. } => {
                    for &triangle_index in self.leaf_triangles(&self.nodes()[index]) {
                        budget.step()?;
                        let Some(hit) = self.hit_triangle(ray, triangle_index, &options.intersect)
                        else {
                            continue;
                        };
                        if best.as_ref().map_or(true, |best| hit.is_before(best)) {
                            best = Some(hit);
                        }
                    }
                }
            }
        }

        Ok(best)
    }

    fn hit_triangle(
        &self,
        ray: &Ray,
        triangle_index: usize,
        options: &IntersectOptions,
    ) -> Option<Hit> {
        let triangle = self.store().get(triangle_index)?;
        intersect_triangle(ray, &triangle, options).map(|hit| Hit {
            triangle_index,
            triangle,
            t: hit.t,
            point: ray.at(hit.t),
            u: hit.u,
            v: hit.v,
        })
    }
}
