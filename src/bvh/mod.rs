//! This module defines the [`Bvh`] over a triangle soup, its [`BvhNode`]s and the ray
//! queries it answers.

mod bvh_impl;
mod bvh_node;
mod traverse;

pub use self::bvh_impl::*;
pub use self::bvh_node::*;
pub use self::traverse::*;
