use std::cell::Cell;

use kurbo::Affine;
use proptest::prelude::*;
use trakem2_core::tree::{LayerId, ProjectionParams, Radius, Segment, Tree};
use trakem2_test_utils::builders::{chain, layer_z, random_tree, star, TreeBuilder};

fn sorted(mut segs: Vec<Segment>) -> Vec<Segment> {
    let key = |s: &Segment| [s.parent.x, s.parent.y, s.parent.z, s.child.x, s.child.y, s.child.z];
    segs.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap());
    segs
}

fn params() -> ProjectionParams {
    ProjectionParams::new(Affine::translate((3.0, -2.0)), 0.5, 0.25, -1.0, 2.0)
}

fn assert_equivalent(tree: &Tree<Radius>) {
    let fast = tree.project_to_segments(&params(), layer_z);
    let naive = tree.project_to_segments_naive(&params(), layer_z);
    assert_eq!(fast.len(), naive.len());
    assert_eq!(sorted(fast), sorted(naive));
}

#[test]
fn single_node_has_no_segments() {
    let tree = TreeBuilder::new(1.0, 1.0, Radius(1.0)).build();
    assert!(tree.project_to_segments(&params(), layer_z).is_empty());
}

#[test]
fn long_chain_matches_reference() {
    let tree = chain(10_000);
    assert_equivalent(&tree);
    assert_eq!(tree.project_to_segments(&params(), layer_z).len(), 9_999);
}

#[test]
fn wide_star_matches_reference() {
    let tree = star(100);
    assert_equivalent(&tree);
}

#[test]
fn calibration_and_depth_sign_apply() {
    let tree = TreeBuilder::new(0.0, 0.0, Radius(1.0))
        .child(0, 2.0, 4.0, trakem2_core::tree::LayerId(3), Radius(1.0))
        .build();
    let segs = tree.project_to_segments(&params(), layer_z);
    let s = segs[0];
    // (0 + 3) * 0.5 * 2, (0 - 2) * 0.25 * 2, z = 2 * 0.5 * 2 * -1
    assert_eq!((s.parent.x, s.parent.y, s.parent.z), (3.0, -1.0, -2.0));
    assert_eq!((s.child.x, s.child.y, s.child.z), (5.0, 1.0, -6.0));
}

/// Number of `layer_z` lookups one projection of `tree` performs.
fn lookups(tree: &Tree<Radius>) -> usize {
    let calls = Cell::new(0usize);
    let segments = tree.project_to_segments(&params(), |layer: LayerId| {
        calls.set(calls.get() + 1);
        layer_z(layer)
    });
    assert_eq!(segments.len(), tree.len().saturating_sub(1));
    calls.get()
}

#[test]
fn each_node_is_projected_once() {
    let wide = star(100);
    assert_eq!(lookups(&wide), wide.collect_all().len());

    let deep = chain(10_000);
    assert_eq!(lookups(&deep), deep.collect_all().len());

    let single = TreeBuilder::new(0.0, 0.0, Radius(1.0)).build();
    assert_eq!(lookups(&single), 1);
}

proptest! {
    #[test]
    fn random_trees_match_reference(picks in proptest::collection::vec(any::<usize>(), 0..200)) {
        let (tree, _) = random_tree(&picks);
        let fast = tree.project_to_segments(&params(), layer_z);
        let naive = tree.project_to_segments_naive(&params(), layer_z);
        prop_assert_eq!(sorted(fast), sorted(naive));
    }
}
