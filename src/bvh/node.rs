//! Build-time and runtime node layouts.
//!
//! Both arrays are addressed by position, root at 0. An internal node's left
//! child is always the next entry (`p + 1`); only the right child is stored.

use bytemuck::{Pod, Zeroable};

use crate::util::Aabb;

/// Largest triangle count a [`CompactNode`] leaf can hold.
pub const MAX_COMPACT_LEAF: usize = u8::MAX as usize;

/// Verbose node used while building, importing and exporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildNode {
    /// Bounds of every triangle in `[start, end]`.
    pub aabb: Aabb,
    /// First index-permutation slot (inclusive).
    pub start: u32,
    /// Last index-permutation slot (inclusive).
    pub end: u32,
    /// Right child position; `None` marks a leaf.
    pub right_child: Option<u32>,
}

impl BuildNode {
    /// Fresh node over `[start, end]` with no bounds and no children yet.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            aabb: Aabb::EMPTY,
            start,
            end,
            right_child: None,
        }
    }

    /// Number of triangles in the node's range.
    #[inline]
    pub fn spanned(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.right_child.is_none()
    }

    /// Right child as the signed file field (`-1` for leaves).
    #[inline]
    pub fn right_child_raw(&self) -> i32 {
        self.right_child.map_or(-1, |c| c as i32)
    }
}

/// GPU-friendly node (32 bytes).
///
/// Leaf: `index` = first permutation slot, `prim_count` > 0.
/// Internal: `index` = right child position, `prim_count` = 0, left child is
/// the next node.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompactNode {
    pub aabb_min: [f32; 3],
    pub index: u32,
    pub aabb_max: [f32; 3],
    pub prim_count: u8,
    pub _pad: [u8; 3],
}

impl CompactNode {
    pub fn leaf(aabb: &Aabb, start: u32, count: u8) -> Self {
        Self {
            aabb_min: aabb.min.to_array(),
            index: start,
            aabb_max: aabb.max.to_array(),
            prim_count: count,
            _pad: [0; 3],
        }
    }

    pub fn internal(aabb: &Aabb, right_child: u32) -> Self {
        Self {
            aabb_min: aabb.min.to_array(),
            index: right_child,
            aabb_max: aabb.max.to_array(),
            prim_count: 0,
            _pad: [0; 3],
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.prim_count != 0
    }

    /// Bounds as an [`Aabb`].
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.aabb_min.into(), self.aabb_max.into())
    }
}
