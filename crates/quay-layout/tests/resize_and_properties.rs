//! Whole-tree resizes, the drop-rect preview, and randomized invariant
//! properties.

use std::collections::BTreeMap;

use proptest::prelude::*;
use quay_layout::{
    AddingOption, ChildrenResizeStrategy, DefaultSizeMode, DropCandidate, ItemId, ItemTree,
    Location, Rect, Size,
};

fn tree_1000x600() -> ItemTree {
    let mut tree = ItemTree::new();
    tree.set_size_recursive(Size::new(1000, 600), ChildrenResizeStrategy::Percentage);
    tree
}

fn insert(tree: &mut ItemTree, loc: Location) -> ItemId {
    let leaf = tree.new_leaf();
    let root = tree.root();
    tree.insert_item(root, leaf, loc, DefaultSizeMode::Fair, AddingOption::None);
    leaf
}

fn geo(tree: &ItemTree, id: ItemId) -> Rect {
    tree.item(id).expect("item exists").sizing().geometry
}

fn nested_three_pane_tree() -> (ItemTree, Vec<ItemId>) {
    let mut tree = tree_1000x600();
    let a = insert(&mut tree, Location::Left);
    let b = insert(&mut tree, Location::Right);
    let c = tree.new_leaf();
    tree.insert_item_relative(c, b, Location::Bottom, DefaultSizeMode::Fair);
    (tree, vec![a, b, c])
}

fn rects_close(a: Rect, b: Rect, tolerance: i32) -> bool {
    (a.x - b.x).abs() <= tolerance
        && (a.y - b.y).abs() <= tolerance
        && (a.width - b.width).abs() <= tolerance
        && (a.height - b.height).abs() <= tolerance
}

// --- whole-tree resize ---

#[test]
fn percentage_resize_preserves_shares() {
    let (mut tree, leaves) = nested_three_pane_tree();
    tree.set_size_recursive(Size::new(2000, 1200), ChildrenResizeStrategy::Percentage);

    // Everything roughly doubles.
    let a = geo(&tree, leaves[0]);
    assert!((a.width - 994).abs() <= 2, "a doubled: {a:?}");
    assert_eq!(a.height, 1200);
    assert!(tree.check_sanity());
}

#[test]
fn resize_down_then_up_is_reversible_within_a_pixel() {
    let (mut tree, leaves) = nested_three_pane_tree();
    let before: Vec<Rect> = leaves.iter().map(|&id| geo(&tree, id)).collect();

    tree.set_size_recursive(Size::new(1400, 900), ChildrenResizeStrategy::Percentage);
    tree.set_size_recursive(Size::new(1000, 600), ChildrenResizeStrategy::Percentage);

    for (&leaf, &original) in leaves.iter().zip(&before) {
        let now = geo(&tree, leaf);
        assert!(rects_close(now, original, 1), "{now:?} vs {original:?}");
    }
    assert!(tree.check_sanity());
}

#[test]
fn resize_below_the_minimum_is_rejected() {
    let (mut tree, leaves) = nested_three_pane_tree();
    let before: Vec<Rect> = leaves.iter().map(|&id| geo(&tree, id)).collect();

    tree.set_size_recursive(Size::new(100, 100), ChildrenResizeStrategy::Percentage);

    let after: Vec<Rect> = leaves.iter().map(|&id| geo(&tree, id)).collect();
    assert_eq!(before, after);
    assert!(tree.check_sanity());
}

#[test]
fn squeezing_to_the_minimum_keeps_every_leaf_legal() {
    let (mut tree, leaves) = nested_three_pane_tree();
    let min = tree.min_size(tree.root());
    tree.set_size_recursive(min, ChildrenResizeStrategy::Percentage);

    for &leaf in &leaves {
        let item = tree.item(leaf).expect("leaf exists");
        let size = item.sizing().geometry.size();
        let min = item.sizing().min_size;
        assert!(size.width >= min.width && size.height >= min.height);
    }
    assert!(tree.check_sanity());
}

#[test]
fn growing_leaf_min_size_relayouts_the_neighbours() {
    let mut tree = tree_1000x600();
    let l1 = insert(&mut tree, Location::Left);
    let l2 = insert(&mut tree, Location::Right);
    tree.request_separator_move(tree.separators(tree.root())[0].id, 300);
    assert_eq!(geo(&tree, l2).width, 198);

    // l2 now demands more than it has; l1 must give the space back.
    tree.set_min_size(l2, Size::new(250, 90));

    assert!(geo(&tree, l2).width >= 250);
    assert!(geo(&tree, l1).width <= 745);
    assert!(tree.check_sanity());
}

// --- drop-rect preview ---

#[test]
fn preview_matches_the_real_drop() {
    let (tree, leaves) = nested_three_pane_tree();
    let candidate = DropCandidate::new(Size::new(400, 300), Size::new(80, 90));

    let preview = tree.suggested_drop_rect(&candidate, Some(leaves[0]), Location::Bottom);

    // Perform the drop for real on a clone and compare.
    let mut real = ItemTree::new();
    real.fill_from_variant_map(tree.to_variant_map(), &BTreeMap::new())
        .expect("clone should deserialize");
    let a_copy = real
        .item_from_path(&tree.path_from_root(leaves[0]))
        .expect("anchor resolves");
    let dropped = real.new_leaf();
    real.set_geometry(dropped, Rect::from_size(Size::new(400, 300)));
    real.insert_item_relative(dropped, a_copy, Location::Bottom, DefaultSizeMode::FairButFloor);

    assert_eq!(
        preview,
        real.map_to_root_rect(dropped, Rect::from_size(geo(&real, dropped).size()))
    );
    assert!(!preview.is_empty());
}

#[test]
fn preview_does_not_mutate_the_tree() {
    let (tree, leaves) = nested_three_pane_tree();
    let before = tree.to_variant_map();
    let candidate = DropCandidate::new(Size::new(200, 200), Size::new(80, 90));

    let _ = tree.suggested_drop_rect(&candidate, Some(leaves[1]), Location::Right);
    let _ = tree.suggested_drop_rect(&candidate, None, Location::Left);

    assert_eq!(tree.to_variant_map(), before);
}

#[test]
fn preview_at_the_window_edge_carves_from_that_edge() {
    let mut tree = tree_1000x600();
    insert(&mut tree, Location::Left);
    insert(&mut tree, Location::Right);
    let candidate = DropCandidate::new(Size::new(200, 600), Size::new(80, 90));

    let rect = tree.suggested_drop_rect(&candidate, None, Location::Left);

    assert_eq!(rect, Rect::new(0, 0, 200, 600));
}

#[test]
fn drop_rects_keep_their_relative_order() {
    let (tree, leaves) = nested_three_pane_tree();
    let candidate = DropCandidate::new(Size::new(0, 0), Size::new(80, 90));

    for &anchor in &leaves {
        let left = tree.suggested_drop_rect(&candidate, Some(anchor), Location::Left);
        let right = tree.suggested_drop_rect(&candidate, Some(anchor), Location::Right);
        let top = tree.suggested_drop_rect(&candidate, Some(anchor), Location::Top);
        let bottom = tree.suggested_drop_rect(&candidate, Some(anchor), Location::Bottom);

        for rect in [left, right, top, bottom] {
            assert!(!rect.is_empty());
            assert!(tree.rect_of(tree.root()).contains_rect(&rect));
        }
        assert!(right.x > left.x, "{right:?} vs {left:?}");
        assert!(bottom.y > top.y, "{bottom:?} vs {top:?}");
    }
}

// --- randomized properties ---

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(u8),
    InsertRelative(u8, u8),
    SoftRemove(u8),
    HardRemove(u8),
    Restore(u8),
    DragSeparator(u8, i16),
    Resize(u16, u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Insert),
        (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::InsertRelative(a, b)),
        any::<u8>().prop_map(Op::SoftRemove),
        any::<u8>().prop_map(Op::HardRemove),
        any::<u8>().prop_map(Op::Restore),
        (any::<u8>(), any::<i16>()).prop_map(|(a, d)| Op::DragSeparator(a, d)),
        (0u16..800, 0u16..500).prop_map(|(w, h)| Op::Resize(w, h)),
    ]
}

fn location_for(raw: u8) -> Location {
    match raw % 4 {
        0 => Location::Left,
        1 => Location::Top,
        2 => Location::Right,
        _ => Location::Bottom,
    }
}

fn apply_op(tree: &mut ItemTree, op: Op) {
    let root = tree.root();
    match op {
        Op::Insert(loc) => {
            let leaf = tree.new_leaf();
            tree.insert_item(
                root,
                leaf,
                location_for(loc),
                DefaultSizeMode::Fair,
                AddingOption::None,
            );
        }
        Op::InsertRelative(pick, loc) => {
            let leaves = tree.items_recursive(root);
            let visible: Vec<ItemId> = leaves
                .into_iter()
                .filter(|&l| tree.is_visible(l, false))
                .collect();
            if visible.is_empty() {
                return;
            }
            let anchor = visible[pick as usize % visible.len()];
            let leaf = tree.new_leaf();
            tree.insert_item_relative(leaf, anchor, location_for(loc), DefaultSizeMode::Fair);
        }
        Op::SoftRemove(pick) => {
            let leaves = tree.items_recursive(root);
            if leaves.is_empty() {
                return;
            }
            let victim = leaves[pick as usize % leaves.len()];
            tree.remove_item(victim, false);
        }
        Op::HardRemove(pick) => {
            let leaves = tree.items_recursive(root);
            if leaves.is_empty() {
                return;
            }
            let victim = leaves[pick as usize % leaves.len()];
            tree.remove_item(victim, true);
        }
        Op::Restore(pick) => {
            let hidden: Vec<ItemId> = tree
                .items_recursive(root)
                .into_iter()
                .filter(|&l| tree.is_placeholder(l))
                .collect();
            if hidden.is_empty() {
                return;
            }
            let leaf = hidden[pick as usize % hidden.len()];
            tree.restore(leaf, format!("guest-{}", leaf.get()));
        }
        Op::DragSeparator(pick, delta) => {
            let separators = tree.separators_recursive(root);
            if separators.is_empty() {
                return;
            }
            let separator = separators[pick as usize % separators.len()].id;
            tree.request_separator_move(separator, i32::from(delta) % 400);
        }
        Op::Resize(extra_w, extra_h) => {
            let min = tree.min_size(root);
            let new = Size::new(
                (min.width + i32::from(extra_w)).max(200),
                (min.height + i32::from(extra_h)).max(200),
            );
            tree.set_size_recursive(new, ChildrenResizeStrategy::Percentage);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Any sequence of public operations leaves the tree sane, with every
    /// visible leaf at or above its minimum.
    #[test]
    fn random_operations_keep_the_tree_sane(ops in prop::collection::vec(op_strategy(), 1..14)) {
        let mut tree = tree_1000x600();
        for op in ops {
            apply_op(&mut tree, op);

            prop_assert!(tree.check_sanity());
            for leaf in tree.items_recursive(tree.root()) {
                if tree.is_visible(leaf, false) {
                    let item = tree.item(leaf).expect("leaf exists");
                    let size = item.sizing().geometry.size();
                    let min = item.sizing().min_size;
                    prop_assert!(size.width >= min.width, "{size:?} < {min:?}");
                    prop_assert!(size.height >= min.height, "{size:?} < {min:?}");
                }
            }
        }
    }

    /// Serialization round-trips: rebuilding from the map reproduces the
    /// exact same map and a sane tree.
    #[test]
    fn random_trees_round_trip(ops in prop::collection::vec(op_strategy(), 1..10)) {
        let mut tree = tree_1000x600();
        for op in ops {
            apply_op(&mut tree, op);
        }

        let map = tree.to_variant_map();
        let guests: BTreeMap<String, String> = tree
            .items_recursive(tree.root())
            .into_iter()
            .filter_map(|l| tree.item(l).and_then(|i| i.guest().map(str::to_owned)))
            .map(|g| (g.clone(), g))
            .collect();

        let mut restored = ItemTree::new();
        restored
            .fill_from_variant_map(map.clone(), &guests)
            .expect("round trip should succeed");
        prop_assert_eq!(restored.to_variant_map(), map);
        prop_assert!(restored.check_sanity());
    }
}
