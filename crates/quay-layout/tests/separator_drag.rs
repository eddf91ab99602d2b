//! Separator dragging: local absorption, clamping at minima, upward
//! propagation and the equalize shortcut.

use quay_layout::{
    AddingOption, ChildrenResizeStrategy, DefaultSizeMode, ItemId, ItemTree, Location, Rect,
    SeparatorId, Size,
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

fn root_separator(tree: &ItemTree, index: usize) -> SeparatorId {
    tree.separators(tree.root())[index].id
}

#[test]
fn drag_moves_the_boundary_between_the_neighbours() {
    let mut tree = tree_1000x600();
    let l1 = insert(&mut tree, Location::Left);
    let l2 = insert(&mut tree, Location::Right);

    tree.request_separator_move(root_separator(&tree, 0), 100);

    assert_eq!(geo(&tree, l1), Rect::new(0, 0, 597, 600));
    assert_eq!(geo(&tree, l2), Rect::new(602, 0, 398, 600));
    assert_eq!(tree.separators(tree.root())[0].position, 597);
    assert!(tree.check_sanity());
}

#[test]
fn drag_beyond_the_minimum_applies_the_reachable_part() {
    let mut tree = tree_1000x600();
    let l1 = insert(&mut tree, Location::Left);
    let l2 = insert(&mut tree, Location::Right);

    // l1 can only give up 497 - 80 = 417 of the requested 450.
    tree.request_separator_move(root_separator(&tree, 0), -450);

    assert_eq!(geo(&tree, l1), Rect::new(0, 0, 80, 600));
    assert_eq!(geo(&tree, l2), Rect::new(85, 0, 915, 600));
    assert_eq!(tree.separators(tree.root())[0].position, 80);
    assert!(tree.check_sanity());
}

#[test]
fn drag_keeps_identity_of_the_separator() {
    let mut tree = tree_1000x600();
    insert(&mut tree, Location::Left);
    insert(&mut tree, Location::Right);

    let before = root_separator(&tree, 0);
    tree.request_separator_move(before, 150);
    tree.request_separator_move(before, -50);

    assert_eq!(root_separator(&tree, 0), before);
    assert_eq!(tree.separators(tree.root())[0].position, 497 + 100);
    assert!(tree.check_sanity());
}

#[test]
fn drag_is_local_when_immediate_neighbours_can_absorb() {
    let mut tree = tree_1000x600();
    let a = insert(&mut tree, Location::Left);
    let b = insert(&mut tree, Location::Right);
    let c = insert(&mut tree, Location::Right);
    let c_before = geo(&tree, c);
    let a_before = geo(&tree, a);
    let b_before = geo(&tree, b);

    // The separator between a and b; both can absorb 10px.
    tree.request_separator_move(root_separator(&tree, 0), 10);

    assert_eq!(geo(&tree, a).width, a_before.width + 10);
    assert_eq!(geo(&tree, b).width, b_before.width - 10);
    assert_eq!(geo(&tree, c), c_before, "unrelated sibling must not move");
    assert!(tree.check_sanity());
}

#[test]
fn zero_delta_is_a_no_op() {
    let mut tree = tree_1000x600();
    insert(&mut tree, Location::Left);
    insert(&mut tree, Location::Right);
    let before = tree.to_variant_map();

    tree.request_separator_move(root_separator(&tree, 0), 0);

    assert_eq!(tree.to_variant_map(), before);
}

#[test]
fn exhausted_neighbour_propagates_to_the_outer_separator() {
    // a | (b over (c | d)): dragging the c/d separator left past c's
    // minimum pushes the remainder onto the root separator, shrinking a.
    let mut tree = tree_1000x600();
    let a = insert(&mut tree, Location::Left);
    let b = insert(&mut tree, Location::Right);
    let c = tree.new_leaf();
    tree.insert_item_relative(c, b, Location::Bottom, DefaultSizeMode::Fair);
    let d = tree.new_leaf();
    tree.insert_item_relative(d, c, Location::Right, DefaultSizeMode::Fair);

    let inner = tree
        .item(c)
        .expect("leaf exists")
        .parent()
        .expect("c sits in the innermost container");
    assert_eq!(tree.separators(inner).len(), 1);
    let inner_sep = tree.separators(inner)[0].id;

    let a_before = geo(&tree, a).width;
    let d_before = geo(&tree, d).width;
    let sep_before = tree.separators(inner)[0].position;
    let c_available = geo(&tree, c).width - 80;
    tree.request_separator_move(inner_sep, -(c_available + 30));

    assert_eq!(
        geo(&tree, a).width,
        a_before - 30,
        "the remainder must come out of the outer neighbour"
    );
    assert_eq!(geo(&tree, c).width, 80, "c is pinned at its minimum");
    assert_eq!(geo(&tree, d).width, d_before + c_available + 30);
    assert_eq!(
        tree.separators(inner)[0].position,
        sep_before - c_available - 30,
        "the dragged separator lands where the user put it"
    );
    assert!(tree.check_sanity());
}

#[test]
fn equalize_balances_the_two_neighbours() {
    let mut tree = tree_1000x600();
    let l1 = insert(&mut tree, Location::Left);
    let l2 = insert(&mut tree, Location::Right);
    tree.request_separator_move(root_separator(&tree, 0), 100);

    tree.request_equal_size(root_separator(&tree, 0));

    let w1 = geo(&tree, l1).width;
    let w2 = geo(&tree, l2).width;
    assert!((w1 - w2).abs() <= 1, "{w1} vs {w2}");
    assert!(tree.check_sanity());
}

#[test]
fn separator_bounds_are_exposed_in_local_and_root_coordinates() {
    let mut tree = tree_1000x600();
    insert(&mut tree, Location::Left);
    insert(&mut tree, Location::Right);
    let root = tree.root();

    assert_eq!(tree.min_pos_for_separator_global(root, 0), 80);
    assert_eq!(tree.max_pos_for_separator_global(root, 0), 915);
    // The root's frame is the root coordinate system.
    assert_eq!(tree.min_pos_for_separator(root, 0), 80);
    assert_eq!(tree.max_pos_for_separator(root, 0), 915);
}

#[test]
fn stale_separator_id_is_rejected() {
    let mut tree = tree_1000x600();
    insert(&mut tree, Location::Left);
    let l2 = insert(&mut tree, Location::Right);
    let stale = root_separator(&tree, 0);

    // Removing the second leaf destroys the separator.
    tree.remove_item(l2, true);
    let before = tree.to_variant_map();

    tree.request_separator_move(stale, 50);

    assert_eq!(tree.to_variant_map(), before);
    assert!(tree.separators(tree.root()).is_empty());
    assert!(tree.check_sanity());
}
