//! Index permutation over the triangle list.
//!
//! Nodes never copy triangles; each one owns the inclusive range
//! `[start, end]` of this array. Split strategies reorder ranges in place and
//! never drop or duplicate an entry.

use crate::geometry::{GeometryView, Primitive};

/// Mutable permutation of triangle indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexPartition {
    indices: Vec<u32>,
}

impl IndexPartition {
    /// Identity permutation `0..n`.
    pub fn identity(n: u32) -> Self {
        Self { indices: (0..n).collect() }
    }

    /// Wrap an already-permuted index list.
    pub fn from_vec(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.indices
    }

    /// Inclusive sub-range `[start, end]`.
    #[inline]
    pub fn range(&self, start: u32, end: u32) -> &[u32] {
        &self.indices[start as usize..=end as usize]
    }

    #[inline]
    fn range_mut(&mut self, start: u32, end: u32) -> &mut [u32] {
        &mut self.indices[start as usize..=end as usize]
    }

    /// Sort `[start, end]` by centroid along `axis`.
    ///
    /// Equal centroids fall back to the triangle index, so the order only
    /// depends on the set of indices in the range, never on their prior order.
    pub fn sort_by_centroid<T: Primitive>(
        &mut self,
        geom: &GeometryView<'_, T>,
        start: u32,
        end: u32,
        axis: usize,
    ) {
        self.range_mut(start, end).sort_unstable_by(|&a, &b| {
            geom.centroid_axis(a, axis)
                .total_cmp(&geom.centroid_axis(b, axis))
                .then(a.cmp(&b))
        });
    }

    /// Move every index satisfying `pred` to the front of `[start, end]`.
    ///
    /// Returns the absolute position of the first index that failed the
    /// predicate (`end + 1` when all passed). Relative order is not kept.
    pub fn partition_by<F>(&mut self, start: u32, end: u32, pred: F) -> u32
    where
        F: Fn(u32) -> bool,
    {
        let slice = self.range_mut(start, end);
        let mut left = 0;
        let mut right = slice.len();
        while left < right {
            if pred(slice[left]) {
                left += 1;
            } else {
                right -= 1;
                slice.swap(left, right);
            }
        }
        start + left as u32
    }

    /// True when the array holds every value of `0..len` exactly once.
    pub fn is_permutation(&self) -> bool {
        is_permutation(&self.indices)
    }
}

/// True when `indices` holds every value of `0..indices.len()` exactly once.
pub fn is_permutation(indices: &[u32]) -> bool {
    let n = indices.len();
    let mut seen = vec![false; n];
    for &i in indices {
        let i = i as usize;
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::util::Vec3;

    fn tri_at(x: f32) -> Triangle {
        Triangle::new(
            Vec3::new(x - 0.5, 0.0, 0.0),
            Vec3::new(x + 0.5, 0.0, 0.0),
            Vec3::new(x, 1.0, 0.0),
        )
    }

    #[test]
    fn test_identity() {
        let p = IndexPartition::identity(4);
        assert_eq!(p.as_slice(), &[0, 1, 2, 3]);
        assert!(p.is_permutation());
        assert!(IndexPartition::identity(0).is_permutation());
    }

    #[test]
    fn test_sort_sub_range_only() {
        let tris: Vec<Triangle> = [4.0, 3.0, 2.0, 1.0, 0.0].iter().map(|&x| tri_at(x)).collect();
        let geom = GeometryView::new(&tris);
        let mut p = IndexPartition::identity(5);
        p.sort_by_centroid(&geom, 1, 3, 0);
        // index 0 and 4 untouched, inclusive end sorted
        assert_eq!(p.as_slice(), &[0, 3, 2, 1, 4]);
    }

    #[test]
    fn test_sort_ties_use_index() {
        let tris = vec![tri_at(1.0); 4];
        let geom = GeometryView::new(&tris);
        let mut p = IndexPartition::from_vec(vec![3, 1, 2, 0]);
        p.sort_by_centroid(&geom, 0, 3, 0);
        assert_eq!(p.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_partition_by() {
        let mut p = IndexPartition::identity(8);
        let split = p.partition_by(2, 7, |i| i % 2 == 0);
        assert_eq!(split, 5);
        assert!(p.range(2, 4).iter().all(|i| i % 2 == 0));
        assert!(p.range(5, 7).iter().all(|i| i % 2 == 1));
        assert_eq!(&p.as_slice()[..2], &[0, 1]);
        assert!(p.is_permutation());

        assert_eq!(p.partition_by(0, 3, |_| true), 4);
        assert_eq!(p.partition_by(0, 3, |_| false), 0);
    }

    #[test]
    fn test_not_permutation() {
        assert!(!IndexPartition::from_vec(vec![0, 0, 1]).is_permutation());
        assert!(!IndexPartition::from_vec(vec![0, 3, 1]).is_permutation());
    }
}
