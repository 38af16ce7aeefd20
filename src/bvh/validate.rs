//! Structural and geometric checks on a node array.
//!
//! Import runs [`validate_structure`] so that a corrupted file can never send
//! a consumer indexing out of range.

use super::node::BuildNode;
use super::partition::is_permutation;
use crate::geometry::Primitive;
use crate::util::{Error, Result};

/// Check the permutation and the tree shape.
///
/// - `indices` is a permutation of `0..N`, `N > 0`
/// - the root covers `[0, N - 1]`, every node has `start <= end < N`
/// - an internal node at `p` has its left child at `p + 1`, its right child
///   after that, and the two children split its range exactly
/// - every node is reachable from the root exactly once
pub fn validate_structure(indices: &[u32], nodes: &[BuildNode]) -> Result<()> {
    let n = indices.len();
    if n == 0 {
        return Err(Error::malformed("empty index permutation"));
    }
    if !is_permutation(indices) {
        return Err(Error::malformed("index list is not a permutation of 0..N"));
    }

    let root = nodes
        .first()
        .ok_or_else(|| Error::malformed("hierarchy has no nodes"))?;
    if root.start != 0 || root.end as usize != n - 1 {
        return Err(Error::malformed(format!(
            "root covers [{}, {}] but there are {} indices",
            root.start, root.end, n
        )));
    }

    for (p, node) in nodes.iter().enumerate() {
        if node.start > node.end || node.end as usize >= n {
            return Err(Error::malformed(format!(
                "node {p} has invalid range [{}, {}]",
                node.start, node.end
            )));
        }
    }

    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![0usize];
    while let Some(p) = stack.pop() {
        if std::mem::replace(&mut visited[p], true) {
            return Err(Error::malformed(format!("node {p} is referenced twice")));
        }
        let node = &nodes[p];
        let Some(right) = node.right_child else {
            continue;
        };
        let right = right as usize;
        let left = p + 1;
        if right <= left || right >= nodes.len() {
            return Err(Error::malformed(format!(
                "node {p} has right child {right} outside ({left}, {})",
                nodes.len()
            )));
        }
        let (l, r) = (&nodes[left], &nodes[right]);
        if l.start != node.start || r.end != node.end || l.end as u64 + 1 != r.start as u64 {
            return Err(Error::malformed(format!(
                "children of node {p} do not partition [{}, {}]",
                node.start, node.end
            )));
        }
        stack.push(right);
        stack.push(left);
    }

    if let Some(orphan) = visited.iter().position(|v| !v) {
        return Err(Error::malformed(format!("node {orphan} is unreachable from the root")));
    }
    Ok(())
}

/// Check that every node box encloses the boxes of its triangles.
pub fn validate_bounds<T: Primitive>(
    indices: &[u32],
    nodes: &[BuildNode],
    triangles: &[T],
) -> Result<()> {
    if indices.len() != triangles.len() {
        return Err(Error::malformed(format!(
            "hierarchy indexes {} triangles, list has {}",
            indices.len(),
            triangles.len()
        )));
    }
    for (p, node) in nodes.iter().enumerate() {
        for &i in &indices[node.start as usize..=node.end as usize] {
            if !node.aabb.contains(&triangles[i as usize].aabb()) {
                return Err(Error::malformed(format!(
                    "node {p} box {:?} does not contain triangle {i}",
                    node.aabb
                )));
            }
        }
    }
    Ok(())
}
