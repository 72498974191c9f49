use std::ops::Range;

use crate::aabb::Aabb;
use crate::axis::Axis;
use crate::bvh::BuildOptions;
use crate::triangle::TriangleStore;
use crate::utils::joint_aabb_of_triangles;

/// The [`BvhNode`] enum that describes a node in a [`Bvh`].
/// It's either a leaf node and references a run of triangle indices, or an internal node
/// that has two child nodes. Both store the [`Aabb`] enclosing everything below them.
///
/// Children are referenced by their index in [`Bvh::nodes`]; a child never refers back to its
/// parent.
///
/// [`Bvh`]: crate::bvh::Bvh
/// [`Bvh::nodes`]: crate::bvh::Bvh::nodes
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BvhNode {
    /// Leaf node.
    Leaf {
        /// The joint [`Aabb`] of the leaf's triangles.
        aabb: Aabb,

        /// First position of the leaf's run in the permuted triangle-index array.
        start: usize,

        /// One past the last position of the run.
        end: usize,

        /// Distance from the root. The root has depth `0`.
        depth: u32,
    },
    /// Internal node.
    Internal {
        /// The joint [`Aabb`] of both children.
        aabb: Aabb,

        /// Index of the left subtree's root node.
        left: usize,

        /// Index of the right subtree's root node.
        right: usize,

        /// Distance from the root. The root has depth `0`.
        depth: u32,
    },
}

impl BvhNode {
    /// Returns the [`Aabb`] of this node.
    pub fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    /// Returns the depth of the node. The root node has depth `0`.
    pub fn depth(&self) -> u32 {
        match *self {
            BvhNode::Leaf { depth, .. } | BvhNode::Internal { depth, .. } => depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    /// Returns the indices of the left and right child, or `None` for leaves.
    pub fn children(&self) -> Option<(usize, usize)> {
        match *self {
            BvhNode::Internal { left, right, .. } => Some((left, right)),
            BvhNode::Leaf { .. } => None,
        }
    }

    /// Returns the leaf's run in the permuted triangle-index array, or `None` for internal
    /// nodes.
    pub fn triangle_range(&self) -> Option<Range<usize>> {
        match *self {
            BvhNode::Leaf { start, end, .. } => Some(start..end),
            BvhNode::Internal { .. } => None,
        }
    }

    /// Moves a node that was built at the front of a subtree's node list to `by` positions
    /// later.
    fn shifted(self, by: usize) -> BvhNode {
        match self {
            BvhNode::Internal {
                aabb,
                left,
                right,
                depth,
            } => BvhNode::Internal {
                aabb,
                left: left + by,
                right: right + by,
                depth,
            },
            leaf => leaf,
        }
    }

    /// Builds the subtree over `indices` by recursive median splits and returns its nodes
    /// in pre-order, with the subtree root first and child indices relative to it.
    ///
    /// `offset` is the position of `indices[0]` in the full triangle-index array, which
    /// leaves record their runs against. `indices` is reordered in place so that every
    /// leaf's triangles end up contiguous.
    pub(crate) fn build(
        store: &TriangleStore,
        options: &BuildOptions,
        indices: &mut [usize],
        offset: usize,
        depth: u32,
    ) -> Vec<BvhNode> {
        let (aabb, centroid_bounds) = joint_aabb_of_triangles(indices, store);

        // Small runs, and runs of triangles that all coincide, are not worth splitting.
        if indices.len() <= options.max_leaf_size || aabb.has_zero_extent() {
            return vec![BvhNode::Leaf {
                aabb,
                start: offset,
                end: offset + indices.len(),
                depth,
            }];
        }

        let split_axis = aabb.largest_axis();
        let split_axis_size = centroid_bounds.max[split_axis] - centroid_bounds.min[split_axis];
        let mid = indices.len() / 2;

        if split_axis_size > 0.0 {
            BvhNode::median_split(store, indices, split_axis, mid);
        } else {
            // All centroids share one coordinate along the split axis, so ordering by them
            // would not separate anything. Split the run in half in index order instead.
            log::trace!(
                "centroids coincide along {} for {} triangles at depth {}, splitting by index",
                split_axis,
                indices.len(),
                depth
            );
            indices.sort_unstable();
        }

        let parallel = indices.len() > options.parallel_threshold;
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let (left, right) = join(
            parallel,
            || BvhNode::build(store, options, left_indices, offset, depth + 1),
            || BvhNode::build(store, options, right_indices, offset + mid, depth + 1),
        );

        // Both lists start with their subtree root.
        let aabb = left[0].aabb().join(right[0].aabb());
        let left_index = 1;
        let right_index = left_index + left.len();

        let mut nodes = Vec::with_capacity(1 + left.len() + right.len());
        nodes.push(BvhNode::Internal {
            aabb,
            left: left_index,
            right: right_index,
            depth,
        });
        nodes.extend(left.into_iter().map(|node| node.shifted(left_index)));
        nodes.extend(right.into_iter().map(|node| node.shifted(right_index)));
        nodes
    }

    /// Reorders `indices` so that the `mid` triangles with the smallest centroids along
    /// `axis` come first. Equal centroids are ordered by triangle index, which keeps the
    /// partition deterministic.
    fn median_split(store: &TriangleStore, indices: &mut [usize], axis: Axis, mid: usize) {
        indices.select_nth_unstable_by(mid, |&a, &b| {
            store.centroid(a)[axis]
                .total_cmp(&store.centroid(b)[axis])
                .then(a.cmp(&b))
        });
    }
}

/// Runs both subtree builds, on the rayon pool when `parallel` is set.
#[cfg(feature = "rayon")]
fn join<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

#[cfg(not(feature = "rayon"))]
fn join<A, B, RA, RB>(_parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}
