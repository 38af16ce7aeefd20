//! Build counters and tree summaries.

use serde::Serialize;
use std::fmt;

use super::config::SplitMode;
use super::node::BuildNode;

/// Counters accumulated by one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BuildMetrics {
    /// Accepted splits (= internal nodes).
    pub splits: u32,
    /// Splits that needed a fallback or an inward nudge.
    pub bad_splits: u32,
    /// Deepest node, root = 0.
    pub max_depth: u32,
    pub leaves: u32,
    /// Leaves created because SAH judged splitting too expensive.
    pub sah_vetoes: u32,
}

impl BuildMetrics {
    /// Share of bad splits in percent; 0 when nothing was split.
    pub fn bad_split_percent(&self) -> f32 {
        if self.splits == 0 {
            0.0
        } else {
            self.bad_splits as f32 / self.splits as f32 * 100.0
        }
    }

    /// Human-readable report block for a finished build.
    pub fn report(&self, mode: SplitMode) -> String {
        format!("{mode}\n{self}")
    }
}

impl fmt::Display for BuildMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Splits: {} ({}% bad)",
            self.splits,
            self.bad_split_percent() as u32
        )?;
        writeln!(f, "Depth: {}", self.max_depth)?;
        write!(f, "Leaves: {}", self.leaves)?;
        if self.sah_vetoes > 0 {
            write!(f, " ({} by SAH veto)", self.sah_vetoes)?;
        }
        Ok(())
    }
}

/// Shape of an existing hierarchy, computed from its nodes alone.
///
/// Imported hierarchies carry no build counters; this is what they report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TreeSummary {
    pub nodes: usize,
    pub leaves: usize,
    pub internal: usize,
    pub max_depth: u32,
    pub largest_leaf: usize,
    pub mean_leaf_size: f32,
    pub triangles: usize,
}

impl TreeSummary {
    /// Walk `nodes` from the root. Expects a structurally valid tree.
    pub fn from_nodes(nodes: &[BuildNode]) -> Self {
        let mut summary = Self {
            nodes: nodes.len(),
            leaves: 0,
            internal: 0,
            max_depth: 0,
            largest_leaf: 0,
            mean_leaf_size: 0.0,
            triangles: nodes.first().map_or(0, BuildNode::spanned),
        };
        if nodes.is_empty() {
            return summary;
        }

        let mut leaf_total = 0usize;
        let mut stack = vec![(0usize, 0u32)];
        while let Some((p, depth)) = stack.pop() {
            let node = &nodes[p];
            summary.max_depth = summary.max_depth.max(depth);
            match node.right_child {
                None => {
                    summary.leaves += 1;
                    leaf_total += node.spanned();
                    summary.largest_leaf = summary.largest_leaf.max(node.spanned());
                }
                Some(right) => {
                    summary.internal += 1;
                    stack.push((right as usize, depth + 1));
                    stack.push((p + 1, depth + 1));
                }
            }
        }
        summary.mean_leaf_size = leaf_total as f32 / summary.leaves as f32;
        summary
    }
}

impl fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Triangles: {}", self.triangles)?;
        writeln!(f, "Nodes: {} ({} internal, {} leaves)", self.nodes, self.internal, self.leaves)?;
        writeln!(f, "Depth: {}", self.max_depth)?;
        write!(
            f,
            "Leaf size: max {}, mean {:.2}",
            self.largest_leaf, self.mean_leaf_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_split_percent() {
        let m = BuildMetrics { splits: 4, bad_splits: 1, ..Default::default() };
        assert_eq!(m.bad_split_percent(), 25.0);
        assert_eq!(BuildMetrics::default().bad_split_percent(), 0.0);
    }

    #[test]
    fn test_report_format() {
        let m = BuildMetrics { splits: 3, bad_splits: 0, max_depth: 2, leaves: 4, sah_vetoes: 0 };
        let report = m.report(SplitMode::ObjectMedian);
        assert!(report.starts_with("Object Median\n"));
        assert!(report.contains("Splits: 3 (0% bad)"));
        assert!(report.contains("Depth: 2"));
        assert!(report.contains("Leaves: 4"));
        assert!(!report.contains("veto"));
    }

    #[test]
    fn test_summary_of_three_node_tree() {
        let mut root = BuildNode::new(0, 4);
        root.right_child = Some(2);
        let nodes = vec![root, BuildNode::new(0, 1), BuildNode::new(2, 4)];
        let s = TreeSummary::from_nodes(&nodes);
        assert_eq!(s.nodes, 3);
        assert_eq!(s.leaves, 2);
        assert_eq!(s.internal, 1);
        assert_eq!(s.max_depth, 1);
        assert_eq!(s.largest_leaf, 3);
        assert_eq!(s.mean_leaf_size, 2.5);
        assert_eq!(s.triangles, 5);
    }
}
