//! Top-down hierarchy construction.
//!
//! Nodes are laid out depth-first: a node's left subtree immediately follows
//! it, then its right subtree. The recursion is driven by an explicit work
//! stack so stack usage does not depend on tree depth.

use smallvec::{smallvec, SmallVec};

use super::config::BvhConfig;
use super::metrics::BuildMetrics;
use super::node::BuildNode;
use super::partition::IndexPartition;
use super::split::{split_node, SplitDecision};
use crate::geometry::{GeometryView, Primitive};
use crate::util::{Error, Result};

/// Largest triangle count whose node array still fits the signed 32-bit
/// right-child field (a full binary tree has `2n - 1` nodes).
pub const MAX_TRIANGLES: usize = 1 << 30;

/// Index permutation, node array and counters of a finished build.
#[derive(Debug, Clone)]
pub(crate) struct BuildOutput {
    pub indices: IndexPartition,
    pub nodes: Vec<BuildNode>,
    pub metrics: BuildMetrics,
}

enum Task {
    /// Bound the node, then make it a leaf or split it.
    Visit { node: usize, depth: u32 },
    /// Append the right child of `parent` once its left subtree is complete.
    Right { parent: usize, start: u32, end: u32, depth: u32 },
}

/// Build the node array for every triangle in `geom`.
#[tracing::instrument(skip_all, fields(tri_count = geom.len(), mode = %config.split_mode))]
pub(crate) fn build_hierarchy<T: Primitive>(
    geom: &GeometryView<'_, T>,
    config: &BvhConfig,
) -> Result<BuildOutput> {
    config.validate()?;

    let n = geom.len();
    if n == 0 {
        return Err(Error::EmptyGeometry);
    }
    if n > MAX_TRIANGLES {
        return Err(Error::TooManyTriangles(n));
    }

    let mut indices = IndexPartition::identity(n as u32);
    let mut nodes: Vec<BuildNode> = Vec::with_capacity(2 * n - 1);
    let mut metrics = BuildMetrics::default();

    nodes.push(BuildNode::new(0, n as u32 - 1));

    let mut stack: SmallVec<[Task; 64]> = smallvec![Task::Visit { node: 0, depth: 0 }];

    while let Some(task) = stack.pop() {
        match task {
            Task::Right { parent, start, end, depth } => {
                let pos = nodes.len();
                nodes.push(BuildNode::new(start, end));
                nodes[parent].right_child = Some(pos as u32);
                stack.push(Task::Visit { node: pos, depth });
            }
            Task::Visit { node, depth } => {
                let (start, end) = (nodes[node].start, nodes[node].end);
                nodes[node].aabb = geom.bounds_of(indices.range(start, end));
                metrics.max_depth = metrics.max_depth.max(depth);

                if nodes[node].spanned() <= config.leaf_size {
                    metrics.leaves += 1;
                    continue;
                }

                let decision = split_node(
                    config.split_mode,
                    geom,
                    &mut indices,
                    &nodes[node],
                    &config.sah,
                    &mut metrics,
                );

                match decision {
                    SplitDecision::Veto => {
                        metrics.leaves += 1;
                    }
                    SplitDecision::Split(split) => {
                        debug_assert!(split > start && split <= end);
                        metrics.splits += 1;

                        // right goes under left so the left subtree is laid out first
                        stack.push(Task::Right { parent: node, start: split, end, depth: depth + 1 });

                        let left = nodes.len();
                        debug_assert_eq!(left, node + 1);
                        nodes.push(BuildNode::new(start, split - 1));
                        stack.push(Task::Visit { node: left, depth: depth + 1 });
                    }
                }
            }
        }
    }

    tracing::debug!(nodes = nodes.len(), leaves = metrics.leaves, "hierarchy built");

    Ok(BuildOutput { indices, nodes, metrics })
}
