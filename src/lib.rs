//! # tribvh
//!
//! Bounding volume hierarchy over static triangle lists, for ray tracers that
//! upload their acceleration structure to a GPU.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (Aabb, Vec3, errors)
//! - [`geometry`] - Triangle access and per-triangle bounds/centroids
//! - [`bvh`] - Builder, split strategies, compact nodes, hierarchy files
//!
//! ## Example
//!
//! ```ignore
//! use tribvh::prelude::*;
//!
//! let bvh = Bvh::build(&triangles, SplitMode::Sah)?;
//! println!("{}", bvh.metrics().unwrap().report(SplitMode::Sah));
//!
//! bvh.export("scene.bvh")?;
//! let cached = Bvh::load("scene.bvh", &triangles)?;
//! assert_eq!(cached.nodes(), bvh.nodes());
//! ```

pub mod util;
pub mod geometry;
pub mod bvh;

// Re-export commonly used types
pub use util::{Aabb, Error, Result, Vec3};
pub use geometry::{Primitive, Triangle};
pub use bvh::{Bvh, BvhConfig, CompactNode, SplitMode};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Aabb, Error, Result, Vec3};
    pub use crate::geometry::{GeometryView, Primitive, Triangle};
    pub use crate::bvh::{
        BuildMetrics, BuildNode, Bvh, BvhConfig, CompactNode, SahParams, SplitMode, TreeSummary,
    };
}
