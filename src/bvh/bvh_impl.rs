//! This module defines the [`Bvh`] itself: how it is built from a triangle soup, and how
//! its shape can be inspected and checked.

use std::fmt;

use crate::aabb::Aabb;
use crate::bvh::BvhNode;
use crate::error::{BvhError, Result};
use crate::triangle::{Triangle, TriangleStore};
use crate::utils::joint_aabb_of_triangles;
use crate::{Point3, Real, EPSILON};

/// Tunables of the [`Bvh`] builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildOptions {
    /// Maximum number of triangles in a leaf. Runs of triangles whose bounds collapse to
    /// a point become a leaf regardless. Must be at least `1`.
    pub max_leaf_size: usize,

    /// Subtrees over more triangles than this are built on the rayon thread pool when the
    /// `rayon` feature is enabled. The tree is the same either way.
    pub parallel_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> BuildOptions {
        BuildOptions {
            max_leaf_size: 7,
            parallel_threshold: 1024,
        }
    }
}

impl BuildOptions {
    /// Checks the options before any build work starts.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_size < 1 {
            return Err(BvhError::InvalidConfig {
                max_leaf_size: self.max_leaf_size,
            });
        }
        Ok(())
    }
}

/// Summary of the shape of a [`Bvh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BvhStats {
    pub triangle_count: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    /// Depth of the deepest node. A tree that is a single leaf has depth `0`.
    pub max_depth: u32,
    /// Number of triangles in the most populated leaf.
    pub max_leaf_population: usize,
}

/// The [`Bvh`] data structure. Owns its [`TriangleStore`] and is immutable once built, so
/// it can be shared between threads and queried concurrently.
///
/// The nodes live in one flat `Vec` with the root at index `0`. Leaves own a run of the
/// `indices` array, which is a permutation of `0..store.len()`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bvh {
    store: TriangleStore,
    nodes: Vec<BvhNode>,
    indices: Vec<usize>,
    options: BuildOptions,
}

impl Bvh {
    /// Builds a [`Bvh`] over a flat vertex array of nine floats per triangle.
    ///
    /// Fails with [`BvhError::InvalidConfig`] if `max_leaf_size` is `0`, and with
    /// [`BvhError::MalformedInput`] if the length of `vertices` is not a positive
    /// multiple of nine.
    ///
    /// # Examples
    /// ```
    /// use tri_bvh::bvh::Bvh;
    /// use tri_bvh::BvhError;
    ///
    /// let bvh = Bvh::build(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 4).unwrap();
    /// assert_eq!(bvh.store().len(), 1);
    ///
    /// assert_eq!(
    ///     Bvh::build(vec![0.0; 9], 0),
    ///     Err(BvhError::InvalidConfig { max_leaf_size: 0 })
    /// );
    /// ```
    pub fn build(vertices: Vec<Real>, max_leaf_size: usize) -> Result<Bvh> {
        let options = BuildOptions {
            max_leaf_size,
            ..Default::default()
        };
        options.validate()?;
        let store = TriangleStore::from_vertex_array(vertices)?;
        Bvh::build_with(store, &options)
    }

    /// Builds a [`Bvh`] over a list of triangles. The position of a triangle in the list
    /// becomes its index. An empty list yields a [`Bvh`] whose queries never hit anything.
    pub fn from_triangles(triangles: &[Triangle], max_leaf_size: usize) -> Result<Bvh> {
        let options = BuildOptions {
            max_leaf_size,
            ..Default::default()
        };
        options.validate()?;
        Bvh::build_with(TriangleStore::from_triangles(triangles), &options)
    }

    /// Builds a [`Bvh`] over an existing [`TriangleStore`].
    pub fn build_with(store: TriangleStore, options: &BuildOptions) -> Result<Bvh> {
        options.validate()?;

        let mut indices = (0..store.len()).collect::<Vec<_>>();
        let nodes = if store.is_empty() {
            vec![BvhNode::Leaf {
                aabb: Aabb::from_point(Point3::origin()),
                start: 0,
                end: 0,
                depth: 0,
            }]
        } else {
            BvhNode::build(&store, options, &mut indices, 0, 0)
        };

        let bvh = Bvh {
            store,
            nodes,
            indices,
            options: *options,
        };
        let stats = bvh.stats();
        log::debug!(
            "built bvh over {} triangles: {} nodes, {} leaves, depth {}",
            stats.triangle_count,
            stats.node_count,
            stats.leaf_count,
            stats.max_depth
        );
        Ok(bvh)
    }

    /// The triangles this [`Bvh`] was built over.
    pub fn store(&self) -> &TriangleStore {
        &self.store
    }

    /// All nodes in pre-order. The root is at index `0`.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    /// The permutation of triangle indices that leaf runs refer to.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Indices of the triangles held by `node`. Empty for internal nodes.
    pub fn leaf_triangles(&self, node: &BvhNode) -> &[usize] {
        node.triangle_range()
            .and_then(|range| self.indices.get(range))
            .unwrap_or(&[])
    }

    /// Depth of the deepest node.
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(BvhNode::depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Collects a [`BvhStats`] summary in one pass over the nodes.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            triangle_count: self.store.len(),
            node_count: self.nodes.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            stats.max_depth = stats.max_depth.max(node.depth());
            if let Some(range) = node.triangle_range() {
                stats.leaf_count += 1;
                stats.max_leaf_population = stats.max_leaf_population.max(range.len());
            }
        }
        stats
    }

    /// Checks the structural invariants of the tree:
    /// - every node is reachable from the root exactly once, and children sit one level
    ///   below their parent,
    /// - every node's [`Aabb`] is the tight union of what lies below it,
    /// - every triangle index appears in exactly one leaf.
    ///
    /// Box tightness is compared with [`EPSILON`] tolerance, so trees over triangles with
    /// NaN corners are not considered consistent.
    pub fn is_consistent(&self) -> bool {
        if self.nodes.is_empty() || self.indices.len() != self.store.len() {
            return false;
        }
        if self.store.is_empty() {
            return self.nodes.len() == 1 && self.root().triangle_range() == Some(0..0);
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut seen = vec![false; self.store.len()];
        let mut stack = vec![(0, 0)];

        while let Some((index, expected_depth)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                return false;
            };
            if visited[index] || node.depth() != expected_depth {
                return false;
            }
            visited[index] = true;

            match *node {
                BvhNode::Internal {
                    aabb, left, right, ..
                } => {
                    let (Some(left_node), Some(right_node)) =
                        (self.nodes.get(left), self.nodes.get(right))
                    else {
                        return false;
                    };
                    if !aabb.relative_eq(&left_node.aabb().join(right_node.aabb()), EPSILON) {
                        return false;
                    }
                    stack.push((right, expected_depth + 1));
                    stack.push((left, expected_depth + 1));
                }
                BvhNode::Leaf {
                    aabb, start, end, ..
                } => {
                    let Some(run) = self.indices.get(start..end) else {
                        return false;
                    };
                    if run.is_empty() {
                        return false;
                    }
                    for &triangle in run {
                        match seen.get_mut(triangle) {
                            Some(flag) if !*flag => *flag = true,
                            _ => return false,
                        }
                    }
                    let (tight, _) = joint_aabb_of_triangles(run, &self.store);
                    if !aabb.relative_eq(&tight, EPSILON) {
                        return false;
                    }
                }
            }
        }

        visited.iter().all(|&v| v) && seen.iter().all(|&s| s)
    }

    fn fmt_node(&self, f: &mut fmt::Formatter, index: usize) -> fmt::Result {
        let node = &self.nodes[index];
        let padding = " ".repeat(node.depth() as usize);
        match *node {
            BvhNode::Internal {
                aabb, left, right, ..
            } => {
                writeln!(f, "{}node={} {}", padding, index, aabb)?;
                self.fmt_node(f, left)?;
                self.fmt_node(f, right)
            }
            BvhNode::Leaf { aabb, .. } => {
                writeln!(
                    f,
                    "{}leaf={} {} triangles={:?}",
                    padding,
                    index,
                    aabb,
                    self.leaf_triangles(node)
                )
            }
        }
    }
}

/// Prints the tree, one node per line, indented by depth.
impl fmt::Display for Bvh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_node(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::bvh::{BuildOptions, Bvh, BvhNode};
    use crate::error::BvhError;
    use crate::testbase::{
        build_bvh, coincident_triangles, grid_mesh, random_triangles, stacked_triangles,
        unit_triangle_at,
    };
    use crate::triangle::{Triangle, TriangleStore};
    use crate::Point3;

    #[test]
    /// Tests whether building a `Bvh` over a grid mesh succeeds and yields a sound tree.
    fn test_build_bvh() {
        let bvh = build_bvh(&grid_mesh(10), 7);
        assert!(bvh.is_consistent());
        assert_eq!(bvh.store().len(), 200);
    }

    #[test]
    fn test_every_index_in_exactly_one_leaf() {
        for leaf_size in [1, 2, 7, 64] {
            let bvh = build_bvh(&random_triangles(500, 7), leaf_size);
            assert!(bvh.is_consistent());

            let mut counts = vec![0; bvh.store().len()];
            for node in bvh.nodes() {
                for &index in bvh.leaf_triangles(node) {
                    counts[index] += 1;
                }
            }
            assert!(counts.iter().all(|&count| count == 1));
        }
    }

    #[test]
    fn test_leaves_respect_max_size() {
        let bvh = build_bvh(&random_triangles(300, 3), 5);
        let stats = bvh.stats();
        assert!(stats.max_leaf_population <= 5);
        assert_eq!(stats.leaf_count, bvh.leaf_count());
        assert_eq!(stats.node_count, 2 * stats.leaf_count - 1);
        assert_eq!(stats.max_depth, bvh.depth());
    }

    #[test]
    fn test_build_is_deterministic() {
        let triangles = random_triangles(1000, 11);
        let first = build_bvh(&triangles, 4);
        let second = build_bvh(&triangles, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let store = TriangleStore::from_triangles(&random_triangles(3000, 5));
        let sequential = Bvh::build_with(
            store.clone(),
            &BuildOptions {
                max_leaf_size: 3,
                parallel_threshold: usize::MAX,
            },
        )
        .unwrap();
        let parallel = Bvh::build_with(
            store,
            &BuildOptions {
                max_leaf_size: 3,
                parallel_threshold: 1,
            },
        )
        .unwrap();
        assert_eq!(sequential.nodes(), parallel.nodes());
        assert_eq!(sequential.indices(), parallel.indices());
    }

    #[test]
    fn test_depth_is_logarithmic() {
        let bvh = build_bvh(&stacked_triangles(1024), 1);
        assert_eq!(bvh.depth(), 10);
        assert_eq!(bvh.leaf_count(), 1024);
    }

    #[test]
    fn test_coincident_triangles_terminate() {
        let bvh = build_bvh(&coincident_triangles(5000), 1);
        assert!(bvh.is_consistent());
        assert!(bvh.depth() <= 13);
    }

    #[test]
    fn test_point_triangles_become_single_leaf() {
        let point = Point3::new(1.0, 2.0, 3.0);
        let triangles = vec![Triangle::new(point, point, point); 50];
        let bvh = build_bvh(&triangles, 1);
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.leaf_triangles(bvh.root()).len(), 50);
        assert!(bvh.is_consistent());
    }

    #[test]
    fn test_small_scale_mesh_still_splits() {
        // 64 disjoint triangles spread over 8e-9 along x.
        let size = 1e-10;
        let triangles = (0..64)
            .map(|i| {
                let x = i as f64 * 1.25e-10;
                Triangle::new(
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + size, 0.0, 0.0),
                    Point3::new(x, size, 0.0),
                )
            })
            .collect::<Vec<_>>();
        let bvh = build_bvh(&triangles, 2);
        let stats = bvh.stats();
        assert!(stats.max_leaf_population <= 2);
        assert_eq!(stats.leaf_count, 32);
        assert!(bvh.is_consistent());

        // The lower half of the mesh ends up on the left.
        let (left, _) = bvh.root().children().unwrap();
        let left_box = bvh.nodes()[left].aabb();
        assert!(left_box.max.x < 32.0 * 1.25e-10);
    }

    #[test]
    fn test_collinear_centroids_fall_back_to_index_split() {
        // Long thin triangles along x whose centroids all sit at the same x.
        let triangles = (0..16)
            .map(|i| {
                let y = i as f64 * 0.01;
                Triangle::new(
                    Point3::new(-100.0, y, 0.0),
                    Point3::new(100.0, y, 0.0),
                    Point3::new(0.0, y + 0.001, 0.0),
                )
            })
            .collect::<Vec<_>>();
        let bvh = build_bvh(&triangles, 8);
        assert_eq!(bvh.nodes().len(), 3);
        assert_eq!(bvh.indices(), (0..16).collect::<Vec<_>>().as_slice());
        assert!(bvh.is_consistent());
    }

    #[test]
    fn test_split_axis_ties_go_to_x() {
        // Four unit triangles at the corners of a square in the z = 0 plane.
        let triangles = [
            unit_triangle_at(10.0, 10.0, 0.0),
            unit_triangle_at(0.0, 0.0, 0.0),
            unit_triangle_at(10.0, 0.0, 0.0),
            unit_triangle_at(0.0, 10.0, 0.0),
        ];
        let bvh = build_bvh(&triangles, 2);
        let (left, _) = bvh.root().children().unwrap();
        let mut lower = bvh.leaf_triangles(&bvh.nodes()[left]).to_vec();
        lower.sort_unstable();
        assert_eq!(lower, vec![1, 3]);
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = build_bvh(&[], 7);
        assert!(bvh.is_consistent());
        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.leaf_triangles(bvh.root()).is_empty());
        assert_eq!(bvh.depth(), 0);
    }

    #[test]
    fn test_invalid_leaf_size() {
        assert_eq!(
            Bvh::from_triangles(&grid_mesh(2), 0),
            Err(BvhError::InvalidConfig { max_leaf_size: 0 })
        );
        // The configuration is checked before the input.
        assert_eq!(
            Bvh::build(vec![0.0; 4], 0),
            Err(BvhError::InvalidConfig { max_leaf_size: 0 })
        );
        assert_eq!(
            Bvh::build(vec![0.0; 4], 1),
            Err(BvhError::MalformedInput { len: 4 })
        );
    }

    #[test]
    fn test_tampered_tree_is_inconsistent() {
        let bvh = build_bvh(&grid_mesh(4), 2);
        let mut nodes = bvh.nodes().to_vec();
        let leaf = nodes.iter().position(BvhNode::is_leaf).unwrap();
        if let BvhNode::Leaf { ref mut aabb, .. } = nodes[leaf] {
            aabb.max.z += 1.0;
        }
        let tampered = Bvh { nodes, ..bvh };
        assert!(!tampered.is_consistent());
    }

    #[test]
    fn test_display_lists_every_node() {
        let bvh = build_bvh(&stacked_triangles(8), 2);
        let printed = bvh.to_string();
        assert_eq!(printed.lines().count(), bvh.nodes().len());
        assert!(printed.starts_with("node=0"));
        assert_eq!(printed.matches("leaf=").count(), 4);
    }
}
