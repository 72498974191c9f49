//! Errors reported at the API boundary of the triangle store, builder and query engine.

use thiserror::Error;

/// Everything that can go wrong when building or querying a [`Bvh`].
///
/// All variants are detected before any build or traversal work starts, except
/// [`BvhError::QueryBudgetExceeded`], which aborts a traversal that ran out of steps.
/// Numerically marginal cases (near-parallel rays, flat boxes) are never errors; they
/// just produce no hit.
///
/// [`Bvh`]: crate::bvh::Bvh
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// The vertex array length is not a positive multiple of nine.
    #[error("vertex array of length {len} is not a positive multiple of 9")]
    MalformedInput { len: usize },

    /// The builder was configured with a leaf size below one.
    #[error("max leaf size must be at least 1, got {max_leaf_size}")]
    InvalidConfig { max_leaf_size: usize },

    /// The ray direction has zero length or non-finite components.
    #[error("ray direction must be finite and non-zero")]
    DegenerateRay,

    /// A query visited more nodes and triangles than its step budget allows.
    #[error("query exceeded its budget of {max_steps} steps")]
    QueryBudgetExceeded { max_steps: usize },
}

pub type Result<T> = std::result::Result<T, BvhError>;

#[cfg(test)]
mod tests {
    use crate::error::BvhError;

    #[test]
    fn test_messages_name_offending_values() {
        let err = BvhError::MalformedInput { len: 10 };
        assert_eq!(
            err.to_string(),
            "vertex array of length 10 is not a positive multiple of 9"
        );

        let err = BvhError::InvalidConfig { max_leaf_size: 0 };
        assert!(err.to_string().contains("got 0"));

        let err = BvhError::QueryBudgetExceeded { max_steps: 16 };
        assert!(err.to_string().contains("16"));
    }
}
