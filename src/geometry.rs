//! Triangle input and the read-only geometry view used during builds.
//!
//! The hierarchy never owns or mutates triangles. [`GeometryView`] borrows the
//! caller's list and caches one box and one centroid per triangle, which is
//! all the split strategies ever look at.

use crate::util::{Aabb, Vec3};

/// Anything that can be treated as a triangle by the builder.
pub trait Primitive {
    /// The three vertex positions.
    fn vertices(&self) -> [Vec3; 3];

    /// Bounding box of the three vertices.
    fn aabb(&self) -> Aabb {
        let mut b = Aabb::EMPTY;
        b.expand_by_triangle(&self.vertices());
        b
    }

    /// Mean of the three vertices.
    fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.vertices();
        (a + b + c) / 3.0
    }
}

/// Plain triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    pub const fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }
}

impl Primitive for Triangle {
    #[inline]
    fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }
}

impl Primitive for [Vec3; 3] {
    #[inline]
    fn vertices(&self) -> [Vec3; 3] {
        *self
    }
}

impl Primitive for [[f32; 3]; 3] {
    #[inline]
    fn vertices(&self) -> [Vec3; 3] {
        [
            Vec3::from_array(self[0]),
            Vec3::from_array(self[1]),
            Vec3::from_array(self[2]),
        ]
    }
}

/// Read-only view over an externally owned triangle list.
pub struct GeometryView<'a, T: Primitive> {
    triangles: &'a [T],
    aabbs: Vec<Aabb>,
    centroids: Vec<Vec3>,
}

impl<'a, T: Primitive> GeometryView<'a, T> {
    /// Borrow `triangles` and pre-compute boxes and centroids.
    pub fn new(triangles: &'a [T]) -> Self {
        let aabbs = triangles.iter().map(Primitive::aabb).collect();
        let centroids = triangles.iter().map(Primitive::centroid).collect();
        Self { triangles, aabbs, centroids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The borrowed triangle list.
    #[inline]
    pub fn triangles(&self) -> &'a [T] {
        self.triangles
    }

    /// Bounding box of triangle `i`.
    #[inline]
    pub fn aabb(&self, i: u32) -> &Aabb {
        &self.aabbs[i as usize]
    }

    /// Centroid of triangle `i`.
    #[inline]
    pub fn centroid(&self, i: u32) -> Vec3 {
        self.centroids[i as usize]
    }

    /// Centroid coordinate of triangle `i` along `axis`.
    #[inline]
    pub fn centroid_axis(&self, i: u32, axis: usize) -> f32 {
        self.centroids[i as usize][axis]
    }

    /// Box enclosing every triangle referenced by `indices`.
    pub fn bounds_of(&self, indices: &[u32]) -> Aabb {
        let mut b = Aabb::EMPTY;
        for &i in indices {
            b.expand_by_box(self.aabb(i));
        }
        b
    }
}
