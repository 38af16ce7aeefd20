//! Integration tests for hierarchy construction and compaction.

use tribvh::bvh::{compact, DEFAULT_LEAF_SIZE, MAX_COMPACT_LEAF};
use tribvh::prelude::*;

fn cube(center: Vec3) -> Vec<Triangle> {
    let c = |x: f32, y: f32, z: f32| center + Vec3::new(x, y, z) * 0.5;
    let p = [
        c(-1.0, -1.0, -1.0),
        c(1.0, -1.0, -1.0),
        c(1.0, 1.0, -1.0),
        c(-1.0, 1.0, -1.0),
        c(-1.0, -1.0, 1.0),
        c(1.0, -1.0, 1.0),
        c(1.0, 1.0, 1.0),
        c(-1.0, 1.0, 1.0),
    ];
    let faces = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [1, 2, 6, 5],
        [3, 0, 4, 7],
    ];
    faces
        .iter()
        .flat_map(|q| {
            [
                Triangle::new(p[q[0]], p[q[1]], p[q[2]]),
                Triangle::new(p[q[0]], p[q[2]], p[q[3]]),
            ]
        })
        .collect()
}

fn cube_row(count: usize) -> Vec<Triangle> {
    (0..count)
        .flat_map(|i| cube(Vec3::new(i as f32 * 10.0, 0.0, 0.0)))
        .collect()
}

/// Small deterministic generator so scenes are reproducible.
struct XorShift(u32);

impl XorShift {
    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 >> 8) as f32 / (1u32 << 24) as f32
    }

    fn vec3(&mut self, scale: f32) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32()) * scale
    }
}

fn random_scene(count: usize, seed: u32) -> Vec<Triangle> {
    let mut rng = XorShift(seed);
    (0..count)
        .map(|_| {
            let base = rng.vec3(100.0);
            Triangle::new(base, base + rng.vec3(3.0), base + rng.vec3(3.0))
        })
        .collect()
}

/// Properties every finished build must satisfy.
fn check_invariants(bvh: &Bvh, tris: &[Triangle], mode: SplitMode) {
    bvh.validate_against(tris).unwrap();

    let mut sorted = bvh.indices().to_vec();
    sorted.sort_unstable();
    assert!(sorted.iter().enumerate().all(|(i, &v)| v as usize == i));

    let nodes = bvh.build_nodes();
    for (p, node) in nodes.iter().enumerate() {
        if let Some(right) = node.right_child {
            let (l, r) = (&nodes[p + 1], &nodes[right as usize]);
            assert_eq!(l.start, node.start);
            assert_eq!(l.end + 1, r.start);
            assert_eq!(r.end, node.end);
            assert!(node.aabb.contains(&l.aabb) && node.aabb.contains(&r.aabb));
        }
    }

    let metrics = bvh.metrics().unwrap();
    let vetoed = mode == SplitMode::Sah && metrics.sah_vetoes > 0;
    for node in nodes.iter().filter(|n| n.is_leaf()) {
        assert!(node.spanned() <= DEFAULT_LEAF_SIZE || vetoed);
    }
    assert_eq!(metrics.leaves as usize, nodes.iter().filter(|n| n.is_leaf()).count());
    assert_eq!(metrics.splits as usize, nodes.len() - metrics.leaves as usize);

    // compact nodes mirror build nodes
    for (node, c) in nodes.iter().zip(bvh.nodes()) {
        assert_eq!(c.aabb(), node.aabb);
        match node.right_child {
            Some(right) => {
                assert_eq!(c.prim_count, 0);
                assert_eq!(c.index, right);
            }
            None => {
                assert_eq!(c.prim_count as usize, node.spanned());
                assert_eq!(c.index, node.start);
            }
        }
    }
}

#[test]
fn test_all_modes_random_scene() {
    let tris = random_scene(500, 0x9e37_79b9);
    for mode in SplitMode::ALL {
        let bvh = Bvh::build(&tris, mode).unwrap();
        check_invariants(&bvh, &tris, mode);
    }
}

#[test]
fn test_two_triangles_single_leaf() {
    let tris = random_scene(2, 7);
    for mode in SplitMode::ALL {
        let bvh = Bvh::build(&tris, mode).unwrap();
        let m = bvh.metrics().unwrap();
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(m.leaves, 1);
        assert_eq!(m.splits, 0);
        assert_eq!(m.max_depth, 0);
        assert_eq!(bvh.nodes()[0].prim_count, 2);
    }
}

#[test]
fn test_cube_row_sah() {
    let tris = cube_row(20);
    let bvh = Bvh::build(&tris, SplitMode::Sah).unwrap();
    let m = bvh.metrics().unwrap();

    assert_eq!(m.bad_splits, 0);
    assert!(m.splits >= 2);
    assert_eq!(m.sah_vetoes, 0);
    assert!(bvh.summary().largest_leaf <= 8);
    check_invariants(&bvh, &tris, SplitMode::Sah);

    // no leaf straddles two cubes
    for node in bvh.build_nodes().iter().filter(|n| n.is_leaf()) {
        let cubes: std::collections::BTreeSet<u32> = bvh.indices()
            [node.start as usize..=node.end as usize]
            .iter()
            .map(|&i| i / 12)
            .collect();
        assert_eq!(cubes.len(), 1);
    }
}

#[test]
fn test_cube_row_bounds() {
    let tris = cube_row(20);
    let bvh = Bvh::build(&tris, SplitMode::ObjectMedian).unwrap();
    let b = bvh.scene_bounds();
    assert_eq!(b.min, Vec3::splat(-0.5));
    assert_eq!(b.max, Vec3::new(190.5, 0.5, 0.5));
    approx::assert_relative_eq!(bvh.scene_diag_len(), (191.0f32 * 191.0 + 2.0).sqrt(), epsilon = 1e-3);
    approx::assert_relative_eq!(bvh.world_radius(), bvh.scene_diag_len() * 0.5);
}

#[test]
fn test_identical_centroids_spatial_median() {
    let tri = Triangle::new(
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    );
    let tris = vec![tri; 40];
    let bvh = Bvh::build(&tris, SplitMode::SpatialMedian).unwrap();
    let m = bvh.metrics().unwrap();
    assert!(m.bad_splits >= 1);
    assert_eq!(m.bad_splits, m.splits);
    check_invariants(&bvh, &tris, SplitMode::SpatialMedian);
}

#[test]
fn test_object_median_shape() {
    let tris = random_scene(128, 42);
    let bvh = Bvh::build(&tris, SplitMode::ObjectMedian).unwrap();
    let m = bvh.metrics().unwrap();
    // 128 -> 16 leaves of 8
    assert_eq!(m.leaves, 16);
    assert_eq!(m.splits, 15);
    assert_eq!(m.max_depth, 4);
    assert_eq!(m.bad_splits, 0);
}

#[test]
fn test_build_is_deterministic() {
    let tris = random_scene(300, 1234);
    for mode in SplitMode::ALL {
        let a = Bvh::build(&tris, mode).unwrap();
        let b = Bvh::build(&tris, mode).unwrap();
        assert_eq!(a.indices(), b.indices());
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_eq!(a.metrics(), b.metrics());
    }
}

#[test]
fn test_compaction_idempotent() {
    let tris = random_scene(200, 99);
    let bvh = Bvh::build(&tris, SplitMode::Sah).unwrap();
    let again = compact(bvh.build_nodes()).unwrap();
    assert_eq!(again.as_slice(), bvh.nodes());
    assert_eq!(compact(bvh.build_nodes()).unwrap(), again);
}

#[test]
fn test_sah_veto_can_exceed_compact_limit() {
    let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
    let tris = vec![tri; MAX_COMPACT_LEAF + 1];
    match Bvh::build(&tris, SplitMode::Sah) {
        Err(Error::CapacityExceeded { count, max, .. }) => {
            assert_eq!(count, MAX_COMPACT_LEAF + 1);
            assert_eq!(max, MAX_COMPACT_LEAF);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other.map(|b| b.nodes().len())),
    }

    // at the limit the veto leaf still fits
    let tris = vec![tri; MAX_COMPACT_LEAF];
    let bvh = Bvh::build(&tris, SplitMode::Sah).unwrap();
    assert_eq!(bvh.nodes().len(), 1);
    assert_eq!(bvh.nodes()[0].prim_count as usize, MAX_COMPACT_LEAF);
    assert_eq!(bvh.metrics().unwrap().sah_vetoes, 1);
}

#[test]
fn test_custom_config() {
    let tris = random_scene(100, 5);
    let config = BvhConfig::new(SplitMode::ObjectMedian).with_leaf_size(1);
    let bvh = Bvh::build_with(&tris, &config).unwrap();
    assert_eq!(bvh.summary().largest_leaf, 1);
    assert_eq!(bvh.metrics().unwrap().leaves, 100);

    // two-triangle ranges must still split cleanly under SAH
    let config = BvhConfig::new(SplitMode::Sah).with_leaf_size(1);
    let bvh = Bvh::build_with(&tris, &config).unwrap();
    bvh.validate_against(&tris).unwrap();

    let json = r#"{"split_mode":"spatial-median","leaf_size":4}"#;
    let config = BvhConfig::from_json(json).unwrap();
    assert_eq!(config.split_mode, SplitMode::SpatialMedian);
    let bvh = Bvh::build_with(&tris, &config).unwrap();
    assert!(bvh.summary().largest_leaf <= 4);
}

#[test]
fn test_config_errors() {
    let tris = random_scene(10, 3);
    let zero_leaf = BvhConfig::default().with_leaf_size(0);
    assert!(matches!(Bvh::build_with(&tris, &zero_leaf), Err(Error::InvalidConfig(_))));

    let empty: Vec<Triangle> = Vec::new();
    assert!(matches!(Bvh::build(&empty, SplitMode::Sah), Err(Error::EmptyGeometry)));

    assert!(matches!(SplitMode::try_from(3u32), Err(Error::UnsupportedSplitMode(_))));
    assert!(matches!("octree".parse::<SplitMode>(), Err(Error::UnsupportedSplitMode(_))));
}

#[test]
fn test_collinear_sah_stays_shallow() {
    // every triangle lies on the x axis, so every node box has zero area
    let tris: Vec<Triangle> = (0..2000)
        .map(|i| {
            let x = i as f32;
            Triangle::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 0.5, 0.0, 0.0), Vec3::new(x + 0.25, 0.0, 0.0))
        })
        .collect();
    let bvh = Bvh::build(&tris, SplitMode::Sah).unwrap();
    let m = bvh.metrics().unwrap();
    // 2000 / 2^8 < 8
    assert!(m.max_depth <= 9, "depth {}", m.max_depth);
    assert_eq!(m.bad_splits, m.splits);
    check_invariants(&bvh, &tris, SplitMode::Sah);
}

#[test]
fn test_far_triangle_gets_own_leaf() {
    let mut tris = random_scene(40, 77);
    tris.push(Triangle::new(
        Vec3::new(-5000.0, 0.0, 0.0),
        Vec3::new(-4999.0, 0.0, 0.0),
        Vec3::new(-5000.0, 1.0, 0.0),
    ));
    let far = (tris.len() - 1) as u32;
    let bvh = Bvh::build(&tris, SplitMode::Sah).unwrap();
    let root = bvh.build_nodes()[0];
    let left = bvh.build_nodes()[1];
    // x sorts the far triangle first, and cutting it off is the cheapest split
    assert_eq!(root.right_child, Some(2));
    assert_eq!((left.start, left.end), (0, 0));
    assert_eq!(bvh.indices()[0], far);
    check_invariants(&bvh, &tris, SplitMode::Sah);
}
