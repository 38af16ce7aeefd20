//! Build-node to runtime-node conversion.

use super::node::{BuildNode, CompactNode, MAX_COMPACT_LEAF};
use crate::util::{Error, Result};

/// Convert build nodes one-to-one into compact nodes.
///
/// Fails on the first leaf whose triangle count does not fit the 8-bit
/// count field.
pub fn compact(nodes: &[BuildNode]) -> Result<Vec<CompactNode>> {
    nodes
        .iter()
        .enumerate()
        .map(|(p, node)| match node.right_child {
            None => {
                let count = node.spanned();
                if count > MAX_COMPACT_LEAF {
                    return Err(Error::CapacityExceeded {
                        node: p,
                        count,
                        max: MAX_COMPACT_LEAF,
                    });
                }
                Ok(CompactNode::leaf(&node.aabb, node.start, count as u8))
            }
            Some(right) => Ok(CompactNode::internal(&node.aabb, right)),
        })
        .collect()
}
