//! Bounding volume hierarchy over a static triangle list.
//!
//! ## Architecture
//! ```text
//! triangles ─▶ GeometryView ─▶ build (split strategies) ─▶ BuildNode[] ─┬─▶ compact ─▶ CompactNode[]
//!                                                                        │
//!                        hierarchy file ◀─ export ─┘   import ─▶ BuildNode[] ─┘
//! ```
//!
//! [`Bvh`] owns the index permutation and both node arrays. It only borrows
//! the triangles while building; the finished hierarchy is self-contained.

pub mod build;
pub mod compact;
pub mod config;
pub mod io;
pub mod metrics;
pub mod node;
pub mod partition;
pub mod split;
pub mod validate;

use std::path::Path;
use std::time::Instant;

pub use compact::compact;
pub use config::{BvhConfig, SahParams, SplitMode, DEFAULT_LEAF_SIZE};
pub use metrics::{BuildMetrics, TreeSummary};
pub use node::{BuildNode, CompactNode, MAX_COMPACT_LEAF};
pub use partition::IndexPartition;
pub use split::SplitDecision;

use crate::geometry::{GeometryView, Primitive};
use crate::util::{Aabb, Error, Result};

/// A finished hierarchy: permutation, build nodes and compact nodes.
#[derive(Debug, Clone)]
pub struct Bvh {
    indices: Vec<u32>,
    build_nodes: Vec<BuildNode>,
    nodes: Vec<CompactNode>,
    /// Present for built hierarchies, absent for imported ones.
    metrics: Option<BuildMetrics>,
    split_mode: Option<SplitMode>,
}

impl Bvh {
    /// Build with the default configuration and the given split mode.
    pub fn build<T: Primitive>(triangles: &[T], mode: SplitMode) -> Result<Self> {
        Self::build_with(triangles, &BvhConfig::new(mode))
    }

    /// Build with an explicit configuration.
    pub fn build_with<T: Primitive>(triangles: &[T], config: &BvhConfig) -> Result<Self> {
        let started = Instant::now();
        let geom = GeometryView::new(triangles);
        let out = build::build_hierarchy(&geom, config)?;
        let nodes = compact(&out.nodes)?;

        let m = &out.metrics;
        tracing::info!(
            mode = %config.split_mode,
            splits = m.splits,
            bad_split_pct = m.bad_split_percent() as u32,
            depth = m.max_depth,
            leaves = m.leaves,
            sah_vetoes = m.sah_vetoes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "BVH built"
        );

        Ok(Self {
            indices: out.indices.into_vec(),
            build_nodes: out.nodes,
            nodes,
            metrics: Some(out.metrics),
            split_mode: Some(config.split_mode),
        })
    }

    /// Assemble from an already decoded permutation and node array.
    fn from_parts(indices: Vec<u32>, build_nodes: Vec<BuildNode>) -> Result<Self> {
        let nodes = compact(&build_nodes)?;
        tracing::debug!(
            indices = indices.len(),
            nodes = build_nodes.len(),
            "hierarchy imported"
        );
        Ok(Self {
            indices,
            build_nodes,
            nodes,
            metrics: None,
            split_mode: None,
        })
    }

    /// Import a hierarchy file written by [`Bvh::export`].
    pub fn import(path: impl AsRef<Path>) -> Result<Self> {
        let (indices, build_nodes) = io::import_from(path)?;
        Self::from_parts(indices, build_nodes)
    }

    /// Import from an in-memory buffer in the file format.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (indices, build_nodes) = io::decode(data)?;
        Self::from_parts(indices, build_nodes)
    }

    /// Import a hierarchy file and check it was built for `triangles`.
    pub fn load<T: Primitive>(path: impl AsRef<Path>, triangles: &[T]) -> Result<Self> {
        let bvh = Self::import(path)?;
        if bvh.indices.len() != triangles.len() {
            return Err(Error::malformed(format!(
                "hierarchy was built for {} triangles, scene has {}",
                bvh.indices.len(),
                triangles.len()
            )));
        }
        Ok(bvh)
    }

    /// Reuse the hierarchy cached at `path`, or build and cache a new one.
    ///
    /// Only unusable-file errors trigger a rebuild; anything else (including
    /// a failed re-export) is returned.
    pub fn load_or_build<T: Primitive>(
        path: impl AsRef<Path>,
        triangles: &[T],
        config: &BvhConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path, triangles) {
            Ok(bvh) => {
                tracing::info!(path = %path.display(), "reusing cached BVH");
                return Ok(bvh);
            }
            Err(Error::FileNotFound(_)) => {
                tracing::info!(path = %path.display(), "no cached BVH, building");
            }
            Err(e) if e.is_malformed_input() => {
                tracing::warn!(path = %path.display(), error = %e, "cached BVH unusable, rebuilding");
            }
            Err(e) => return Err(e),
        }

        let bvh = Self::build_with(triangles, config)?;
        bvh.export(path)?;
        Ok(bvh)
    }

    /// Write the permutation and build nodes to `path`.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        io::export_to(path, &self.indices, &self.build_nodes)
    }

    /// The file-format encoding of this hierarchy.
    pub fn to_bytes(&self) -> Vec<u8> {
        io::encode(&self.indices, &self.build_nodes)
    }

    /// Triangle index permutation; leaves reference ranges of it.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn build_nodes(&self) -> &[BuildNode] {
        &self.build_nodes
    }

    /// Runtime nodes, one per build node.
    #[inline]
    pub fn nodes(&self) -> &[CompactNode] {
        &self.nodes
    }

    /// Runtime nodes as raw bytes for buffer upload.
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    #[inline]
    pub fn metrics(&self) -> Option<&BuildMetrics> {
        self.metrics.as_ref()
    }

    #[inline]
    pub fn split_mode(&self) -> Option<SplitMode> {
        self.split_mode
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Bounds of the whole scene (root box).
    pub fn scene_bounds(&self) -> Aabb {
        self.build_nodes.first().map_or(Aabb::EMPTY, |root| root.aabb)
    }

    /// Length of the scene diagonal, the longest segment inside the scene.
    pub fn scene_diag_len(&self) -> f32 {
        self.scene_bounds().diagonal_len()
    }

    /// Half the scene diagonal.
    pub fn world_radius(&self) -> f32 {
        self.scene_diag_len() * 0.5
    }

    /// Shape statistics computed from the nodes.
    pub fn summary(&self) -> TreeSummary {
        TreeSummary::from_nodes(&self.build_nodes)
    }

    /// Check tree shape and permutation.
    pub fn validate(&self) -> Result<()> {
        validate::validate_structure(&self.indices, &self.build_nodes)
    }

    /// Check tree shape and that every node box encloses its triangles.
    pub fn validate_against<T: Primitive>(&self, triangles: &[T]) -> Result<()> {
        self.validate()?;
        validate::validate_bounds(&self.indices, &self.build_nodes, triangles)
    }
}
