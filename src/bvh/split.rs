//! Split strategies.
//!
//! Every strategy receives a node whose range holds more triangles than the
//! leaf threshold, reorders that range in the index permutation and answers
//! with the first slot of the right half. Only SAH may refuse to split.

use super::config::{SahParams, SplitMode};
use super::metrics::BuildMetrics;
use super::node::BuildNode;
use super::partition::IndexPartition;
use crate::geometry::{GeometryView, Primitive};
use crate::util::Aabb;

/// Outcome of a split attempt on `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDecision {
    /// Left child gets `[start, s - 1]`, right child `[s, end]`; `start < s <= end`.
    Split(u32),
    /// Splitting costs more than keeping the node as a leaf.
    Veto,
}

/// Dispatch to the strategy selected by `mode`.
pub(crate) fn split_node<T: Primitive>(
    mode: SplitMode,
    geom: &GeometryView<'_, T>,
    indices: &mut IndexPartition,
    node: &BuildNode,
    sah: &SahParams,
    metrics: &mut BuildMetrics,
) -> SplitDecision {
    debug_assert!(node.end > node.start, "cannot split a single-triangle range");
    match mode {
        SplitMode::Sah => sah_split(geom, indices, node, sah, metrics),
        SplitMode::ObjectMedian => {
            let axis = node.aabb.longest_axis();
            SplitDecision::Split(object_median(geom, indices, node.start, node.end, axis))
        }
        SplitMode::SpatialMedian => {
            SplitDecision::Split(spatial_median(geom, indices, node, metrics))
        }
    }
}

/// Sort `[start, end]` along `axis` and cut at the middle slot.
pub(crate) fn object_median<T: Primitive>(
    geom: &GeometryView<'_, T>,
    indices: &mut IndexPartition,
    start: u32,
    end: u32,
    axis: usize,
) -> u32 {
    indices.sort_by_centroid(geom, start, end, axis);
    start + (end - start + 1) / 2
}

/// Midpoint of the centroid extent along `axis` over `[start, end]`.
fn centroid_midpoint<T: Primitive>(
    geom: &GeometryView<'_, T>,
    indices: &IndexPartition,
    start: u32,
    end: u32,
    axis: usize,
) -> f32 {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &i in indices.range(start, end) {
        let c = geom.centroid_axis(i, axis);
        lo = lo.min(c);
        hi = hi.max(c);
    }
    0.5 * (lo + hi)
}

/// Partition around the centroid midpoint of the longest axis.
///
/// A partition leaving one side empty counts as a bad split and is redone as
/// an object median on the same axis. A lone triangle on either side is a
/// valid split.
pub(crate) fn spatial_median<T: Primitive>(
    geom: &GeometryView<'_, T>,
    indices: &mut IndexPartition,
    node: &BuildNode,
    metrics: &mut BuildMetrics,
) -> u32 {
    let (start, end) = (node.start, node.end);
    let axis = node.aabb.longest_axis();
    let mid = centroid_midpoint(geom, indices, start, end, axis);

    let split = indices.partition_by(start, end, |i| geom.centroid_axis(i, axis) < mid);

    if split <= start || split > end {
        metrics.bad_splits += 1;
        return object_median(geom, indices, start, end, axis);
    }
    split
}

/// SAH cost of a candidate partition.
#[inline]
fn sah_cost(
    params: &SahParams,
    n_left: usize,
    area_left: f32,
    n_right: usize,
    area_right: f32,
    inv_parent_area: f32,
) -> f32 {
    let weighted = (n_left as f32 * area_left + n_right as f32 * area_right) * inv_parent_area;
    2.0 * params.cost_box + params.cost_tri * weighted
}

/// True when the centroids on both sides of slot `s` differ along `axis`.
fn separates<T: Primitive>(
    geom: &GeometryView<'_, T>,
    indices: &IndexPartition,
    s: u32,
    axis: usize,
) -> bool {
    let sorted = indices.as_slice();
    let (a, b) = (sorted[s as usize], sorted[s as usize + 1]);
    geom.centroid_axis(a, axis) != geom.centroid_axis(b, axis)
}

/// Full sweep over every slot on every axis.
///
/// Candidate `s` puts `[start, s]` left and `[s + 1, end]` right. Ties keep
/// the earliest axis and slot. A parent without surface area gives SAH
/// nothing to weigh, so it is split as an object median and counted as bad.
pub(crate) fn sah_split<T: Primitive>(
    geom: &GeometryView<'_, T>,
    indices: &mut IndexPartition,
    node: &BuildNode,
    params: &SahParams,
    metrics: &mut BuildMetrics,
) -> SplitDecision {
    let (start, end) = (node.start, node.end);
    let span = node.spanned();

    let parent_area = node.aabb.area();
    if parent_area <= 0.0 || parent_area.is_nan() {
        metrics.bad_splits += 1;
        let axis = node.aabb.longest_axis();
        return SplitDecision::Split(object_median(geom, indices, start, end, axis));
    }
    let inv_parent_area = 1.0 / parent_area;
    let leaf_cost = params.cost_box + span as f32 * params.cost_tri;

    let mut best_cost = f32::INFINITY;
    let mut best_axis = 0usize;
    let mut best_slot = start;

    // right_areas[k] = area of the box around the last k + 1 triangles
    let mut right_areas: Vec<f32> = Vec::with_capacity(span);

    for axis in 0..3 {
        indices.sort_by_centroid(geom, start, end, axis);

        right_areas.clear();
        let mut sweep = Aabb::EMPTY;
        for &i in indices.range(start, end).iter().rev() {
            sweep.expand_by_box(geom.aabb(i));
            right_areas.push(sweep.area());
        }

        let mut left = Aabb::EMPTY;
        for s in start..end {
            left.expand_by_box(geom.aabb(indices.as_slice()[s as usize]));
            let n_left = (s - start + 1) as usize;
            let n_right = span - n_left;
            let cost = sah_cost(
                params,
                n_left,
                left.area(),
                n_right,
                right_areas[n_right - 1],
                inv_parent_area,
            );
            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_slot = s;
            }
        }
    }

    if best_cost > leaf_cost {
        metrics.sah_vetoes += 1;
        return SplitDecision::Veto;
    }

    // z was sorted last
    if best_axis != 2 {
        indices.sort_by_centroid(geom, start, end, best_axis);
    }

    // a lone triangle cut off between equal centroids is a tie artifact, not a separation
    let at_edge = best_slot == start || best_slot == end - 1;
    if span > 2 && at_edge && !separates(geom, indices, best_slot, best_axis) {
        metrics.bad_splits += 1;
        if best_slot == start {
            best_slot += 1;
        } else {
            best_slot -= 1;
        }
    }

    SplitDecision::Split(best_slot + 1)
}
