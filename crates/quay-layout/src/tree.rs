//! The item arena: ownership, navigation, leaf operations and events.
//!
//! [`ItemTree`] owns every node of one layout tree in a `BTreeMap` keyed by
//! [`ItemId`]. Downward edges are ordered child-id lists, upward edges plain
//! parent ids, so the structure is a strict tree with no shared ownership.
//!
//! Mutation entry points live in two places: leaf-level operations
//! (guests, ref-counting, min sizes, placeholders) here, and the container
//! layout protocol (insert/remove/restore/resize/separators) in the
//! `layout` module's `impl ItemTree` block.

use std::collections::BTreeMap;
use std::rc::Rc;

use quay_core::{Point, Rect, Size};
use tracing::warn;

use crate::event::Observer;
use crate::item::{Item, ItemKind};
use crate::{
    HARD_MIN_SIZE, Host, ItemId, LayoutEvent, Orientation, SEPARATOR_THICKNESS, SeparatorId, Side,
    length_along,
};

/// An arena-backed multi-splitter tree.
///
/// A fresh tree holds a single empty root container. Leaves are created
/// detached with [`ItemTree::new_leaf`] and enter the layout through the
/// insertion protocol; see the crate docs for the guarantees upheld by
/// every mutation.
pub struct ItemTree {
    pub(crate) nodes: BTreeMap<ItemId, Item>,
    pub(crate) root: ItemId,
    next_id: ItemId,
    pub(crate) next_separator_id: SeparatorId,
    pub(crate) separator_thickness: i32,
    pub(crate) host: Option<Rc<dyn Host>>,
    observer: Option<Observer>,
    pending_events: Vec<LayoutEvent>,
    pub(crate) check_sanity_scheduled: bool,
}

impl std::fmt::Debug for ItemTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("separator_thickness", &self.separator_thickness)
            .finish_non_exhaustive()
    }
}

impl ItemTree {
    /// Create a hostless tree (geometry only, nothing is published).
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a tree publishing guest geometry and visibility to `host`.
    #[must_use]
    pub fn with_host(host: Rc<dyn Host>) -> Self {
        Self::build(Some(host))
    }

    fn build(host: Option<Rc<dyn Host>>) -> Self {
        let root = ItemId::MIN;
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Item::new_container(None, Orientation::Vertical));
        Self {
            nodes,
            root,
            next_id: root.next(),
            next_separator_id: SeparatorId::MIN,
            separator_thickness: SEPARATOR_THICKNESS,
            host,
            observer: None,
            pending_events: Vec::new(),
            check_sanity_scheduled: false,
        }
    }

    /// Separator thickness used by this tree.
    #[inline]
    #[must_use]
    pub const fn separator_thickness(&self) -> i32 {
        self.separator_thickness
    }

    /// Change the separator thickness. Must be called before any item is
    /// inserted; later calls are rejected.
    pub fn set_separator_thickness(&mut self, thickness: i32) {
        if self.num_children(self.root) > 0 {
            warn!(thickness, "separator thickness can only change on an empty tree");
            return;
        }
        self.separator_thickness = thickness;
    }

    /// The root container.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> ItemId {
        self.root
    }

    /// Whether `id` is the root container.
    #[inline]
    #[must_use]
    pub fn is_root(&self, id: ItemId) -> bool {
        id == self.root
    }

    /// Look up a node. `None` for ids that were removed or never existed.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.nodes.get(&id)
    }

    /// Register the single observer receiving [`LayoutEvent`]s. Replaces any
    /// previous observer.
    pub fn set_observer(&mut self, observer: Observer) {
        self.observer = Some(observer);
    }

    // --- internal arena access -------------------------------------------

    pub(crate) fn node(&self, id: ItemId) -> &Item {
        &self.nodes[&id]
    }

    pub(crate) fn node_mut(&mut self, id: ItemId) -> &mut Item {
        self.nodes
            .get_mut(&id)
            .expect("item id points into this arena")
    }

    pub(crate) fn alloc_leaf(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.nodes.insert(id, Item::new_leaf(None));
        id
    }

    pub(crate) fn alloc_container(
        &mut self,
        parent: Option<ItemId>,
        orientation: Orientation,
    ) -> ItemId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.nodes.insert(id, Item::new_container(parent, orientation));
        id
    }

    /// Create a detached leaf; it joins the layout via the insert protocol.
    pub fn new_leaf(&mut self) -> ItemId {
        self.alloc_leaf()
    }

    pub(crate) fn remove_subtree_from_arena(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(item) = self.nodes.remove(&current)
                && let ItemKind::Container { state, .. } = item.kind
            {
                stack.extend(state.children);
            }
        }
    }

    // --- events ----------------------------------------------------------

    pub(crate) fn push_event(&mut self, event: LayoutEvent) {
        self.pending_events.push(event);
    }

    pub(crate) fn flush_events(&mut self) {
        if self.pending_events.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending_events);
        if let Some(mut observer) = self.observer.take() {
            for event in &events {
                observer(event);
            }
            self.observer = Some(observer);
        }
    }

    /// Drain queued events and run a deferred sanity pass if one was
    /// scheduled. Every public mutation funnels through here before
    /// returning.
    pub(crate) fn finish_mutation(&mut self) {
        #[cfg(debug_assertions)]
        if self.check_sanity_scheduled {
            self.check_sanity_scheduled = false;
            if !self.check_sanity() {
                warn!("layout failed its deferred sanity check");
            }
        }
        #[cfg(not(debug_assertions))]
        {
            self.check_sanity_scheduled = false;
        }
        self.flush_events();
    }

    // --- basic geometry --------------------------------------------------

    /// The node's geometry in parent coordinates. Empty while the node is
    /// being inserted.
    #[must_use]
    pub fn geometry(&self, id: ItemId) -> Rect {
        let item = self.node(id);
        if item.sizing.is_being_inserted {
            Rect::default()
        } else {
            item.sizing.geometry
        }
    }

    /// The node's rectangle at its own origin.
    #[must_use]
    pub fn rect_of(&self, id: ItemId) -> Rect {
        Rect::from_size(self.node(id).sizing.size())
    }

    /// Current size of the node.
    #[must_use]
    pub fn size_of(&self, id: ItemId) -> Size {
        self.node(id).sizing.size()
    }

    /// Minimum size: a leaf's own constraint, or the aggregate of a
    /// container's visible (or being-inserted) children plus separator
    /// waste.
    #[must_use]
    pub fn min_size(&self, id: ItemId) -> Size {
        let item = self.node(id);
        let Some((state, orientation)) = item.container() else {
            return item.sizing.min_size;
        };

        let mut min_w = 0;
        let mut min_h = 0;
        let mut num_visible = 0;
        for &child in &state.children {
            let child_item = self.node(child);
            if !(self.is_visible(child, false) || child_item.sizing.is_being_inserted) {
                continue;
            }
            num_visible += 1;
            let child_min = self.min_size(child);
            match orientation {
                Orientation::Vertical => {
                    min_w = min_w.max(child_min.width);
                    min_h += child_min.height;
                }
                Orientation::Horizontal => {
                    min_h = min_h.max(child_min.height);
                    min_w += child_min.width;
                }
            }
        }

        let separator_waste = ((num_visible - 1) * self.separator_thickness).max(0);
        match orientation {
            Orientation::Vertical => min_h += separator_waste,
            Orientation::Horizontal => min_w += separator_waste,
        }
        Size::new(min_w, min_h)
    }

    /// Advisory maximum size; aggregated for containers, never enforced.
    #[must_use]
    pub fn max_size(&self, id: ItemId) -> Size {
        let item = self.node(id);
        let Some((_, orientation)) = item.container() else {
            return item.sizing.max_size;
        };

        let children = self.visible_children(id, false);
        if children.is_empty() {
            return crate::HARD_MAX_SIZE;
        }

        let mut along = 0;
        let mut across = i32::MAX;
        for &child in &children {
            let child_max = self.max_size(child);
            along += length_along(child_max, orientation);
            across = across.min(length_along(child_max, orientation.opposite()));
        }
        along += (children.len() as i32 - 1) * self.separator_thickness;

        match orientation {
            Orientation::Horizontal => Size::new(along, across),
            Orientation::Vertical => Size::new(across, along),
        }
    }

    /// Size still missing for `id` to reach its minimum.
    pub(crate) fn missing_size(&self, id: ItemId) -> Size {
        let missing = self.min_size(id) - self.size_of(id);
        Size::new(missing.width.max(0), missing.height.max(0))
    }

    /// Minimum length of `id` along `o`.
    #[must_use]
    pub fn min_length(&self, id: ItemId, o: Orientation) -> i32 {
        length_along(self.min_size(id), o)
    }

    /// Set the node's geometry, emitting change events and republishing
    /// guest rectangles. The new rectangle must honour the node's minimum;
    /// violations are logged.
    pub fn set_geometry(&mut self, id: ItemId, rect: Rect) {
        let old = self.node(id).sizing.geometry;
        if rect == old {
            return;
        }

        self.node_mut(id).sizing.geometry = rect;

        if rect.is_empty() {
            let item = self.node(id);
            if item.is_container() {
                if self.has_visible_children(id, false) {
                    warn!(?id, "container with visible children got an empty rect\n{}", self.dump_layout());
                    debug_assert!(false, "empty rect on a populated container");
                }
            } else {
                warn!(?id, "leaf got an empty rect");
            }
        }

        let min = self.min_size(id);
        if rect.width < min.width || rect.height < min.height {
            warn!(
                ?id,
                size = ?rect.size(),
                ?min,
                "size constraints not honoured\n{}",
                self.dump_layout()
            );
        }

        self.push_event(LayoutEvent::GeometryChanged(id));
        if old.x != rect.x {
            self.push_event(LayoutEvent::XChanged(id));
        }
        if old.y != rect.y {
            self.push_event(LayoutEvent::YChanged(id));
        }
        if old.width != rect.width {
            self.push_event(LayoutEvent::WidthChanged(id));
        }
        if old.height != rect.height {
            self.push_event(LayoutEvent::HeightChanged(id));
        }

        self.publish_guest_geometries(id);
    }

    /// Push current root-coordinate rectangles of `id`'s guests to the host.
    pub(crate) fn publish_guest_geometries(&mut self, id: ItemId) {
        let Some(host) = self.host.clone() else {
            return;
        };
        match &self.node(id).kind {
            ItemKind::Leaf { guest: Some(guest) } => {
                if !self.node(id).sizing.is_being_inserted {
                    let rect = self.map_to_root_rect(id, self.rect_of(id));
                    host.set_guest_geometry(guest, rect);
                }
            }
            ItemKind::Leaf { guest: None } => {}
            ItemKind::Container { state, .. } => {
                for child in state.children.clone() {
                    self.publish_guest_geometries(child);
                }
            }
        }
    }

    pub(crate) fn set_size(&mut self, id: ItemId, sz: Size) {
        let geo = self.node(id).sizing.geometry.with_size(sz);
        self.set_geometry(id, geo);
    }

    pub(crate) fn set_pos(&mut self, id: ItemId, pos: Point) {
        let geo = self.node(id).sizing.geometry.moved_to(pos);
        self.set_geometry(id, geo);
    }

    /// Set the length along `o`, padding the opposite axis up to the hard
    /// minimum if the node never had a real size.
    pub(crate) fn set_length(&mut self, id: ItemId, length: i32, o: Orientation) {
        debug_assert!(length > 0, "length must be positive");
        let size = self.size_of(id);
        let new = match o {
            Orientation::Vertical => Size::new(size.width.max(HARD_MIN_SIZE.width), length),
            Orientation::Horizontal => Size::new(length, size.height.max(HARD_MIN_SIZE.height)),
        };
        self.set_size(id, new);
    }

    /// Length of `id` along `o`.
    #[must_use]
    pub fn length_of(&self, id: ItemId, o: Orientation) -> i32 {
        self.node(id).sizing.length(o)
    }

    // --- coordinate mapping ----------------------------------------------

    /// Map a point in `id`'s coordinates to root coordinates.
    #[must_use]
    pub fn map_to_root(&self, id: ItemId, p: Point) -> Point {
        let mut acc = p;
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            acc = acc + self.node(current).sizing.pos();
            current = parent;
        }
        acc
    }

    /// Map a rectangle in `id`'s coordinates to root coordinates.
    #[must_use]
    pub fn map_to_root_rect(&self, id: ItemId, r: Rect) -> Rect {
        r.moved_to(self.map_to_root(id, r.top_left()))
    }

    /// Map a coordinate along `o` in `id`'s frame to root coordinates.
    #[must_use]
    pub fn map_to_root_coord(&self, id: ItemId, p: i32, o: Orientation) -> i32 {
        match o {
            Orientation::Vertical => self.map_to_root(id, Point::new(0, p)).y,
            Orientation::Horizontal => self.map_to_root(id, Point::new(p, 0)).x,
        }
    }

    /// Map a root-coordinate point into `id`'s frame.
    #[must_use]
    pub fn map_from_root(&self, id: ItemId, p: Point) -> Point {
        let mut acc = p;
        let mut current = Some(id);
        while let Some(c) = current {
            acc = acc - self.node(c).sizing.pos();
            current = self.node(c).parent;
        }
        acc
    }

    /// Map a root-coordinate rectangle into `id`'s frame.
    #[must_use]
    pub fn map_from_root_rect(&self, id: ItemId, r: Rect) -> Rect {
        r.moved_to(self.map_from_root(id, r.top_left()))
    }

    /// Map a root coordinate along `o` into `id`'s frame.
    #[must_use]
    pub fn map_from_root_coord(&self, id: ItemId, p: i32, o: Orientation) -> i32 {
        match o {
            Orientation::Vertical => self.map_from_root(id, Point::new(0, p)).y,
            Orientation::Horizontal => self.map_from_root(id, Point::new(p, 0)).x,
        }
    }

    /// Map a point in the parent's frame into `id`'s frame.
    #[must_use]
    pub fn map_from_parent(&self, id: ItemId, p: Point) -> Point {
        if self.node(id).parent.is_none() {
            p
        } else {
            p - self.node(id).sizing.pos()
        }
    }

    // --- navigation ------------------------------------------------------

    /// Child indices from the root down to `id`; empty for the root itself.
    #[must_use]
    pub fn path_from_root(&self, id: ItemId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let (state, _) = self.node(parent).container().expect("parent is a container");
            if let Some(index) = state.children.iter().position(|&c| c == current) {
                path.push(index);
            }
            current = parent;
        }
        path.reverse();
        path
    }

    /// Resolve a `path_from_root` result back to an id.
    #[must_use]
    pub fn item_from_path(&self, path: &[usize]) -> Option<ItemId> {
        let mut current = self.root;
        for (i, &index) in path.iter().enumerate() {
            let Some((state, _)) = self.node(current).container() else {
                warn!(?path, "path descends into a leaf");
                return None;
            };
            let Some(&child) = state.children.get(index) else {
                warn!(?path, index, "invalid child index in path");
                return None;
            };
            if i == path.len() - 1 {
                return Some(child);
            }
            current = child;
        }
        Some(current)
    }

    /// Number of direct children.
    #[must_use]
    pub fn num_children(&self, id: ItemId) -> usize {
        self.node(id)
            .container()
            .map_or(0, |(state, _)| state.children.len())
    }

    /// Number of direct children that are visible.
    #[must_use]
    pub fn num_visible_children(&self, id: ItemId) -> usize {
        self.node(id).container().map_or(0, |(state, _)| {
            state
                .children
                .iter()
                .filter(|&&c| self.is_visible(c, false))
                .count()
        })
    }

    /// Whether any direct child is visible.
    #[must_use]
    pub fn has_visible_children(&self, id: ItemId, exclude_being_inserted: bool) -> bool {
        self.node(id).container().is_some_and(|(state, _)| {
            state
                .children
                .iter()
                .any(|&c| self.is_visible(c, exclude_being_inserted))
        })
    }

    /// Visible children in order. With `include_being_inserted`, items mid
    /// insertion are kept; otherwise they are filtered out.
    #[must_use]
    pub fn visible_children(&self, id: ItemId, include_being_inserted: bool) -> Vec<ItemId> {
        let Some((state, _)) = self.node(id).container() else {
            return Vec::new();
        };
        state
            .children
            .iter()
            .copied()
            .filter(|&c| {
                let being_inserted = self.node(c).sizing.is_being_inserted;
                if include_being_inserted {
                    self.is_visible(c, false) || being_inserted
                } else {
                    self.is_visible(c, false) && !being_inserted
                }
            })
            .collect()
    }

    /// Whether `child` is a direct child of `container`.
    #[must_use]
    pub fn contains(&self, container: ItemId, child: ItemId) -> bool {
        self.node(container)
            .container()
            .is_some_and(|(state, _)| state.children.contains(&child))
    }

    /// Whether `descendant` lives anywhere under `container`.
    #[must_use]
    pub fn contains_recursive(&self, container: ItemId, descendant: ItemId) -> bool {
        let mut current = self.node(descendant).parent;
        while let Some(p) = current {
            if p == container {
                return true;
            }
            current = self.node(p).parent;
        }
        false
    }

    /// Number of leaves in the subtree.
    #[must_use]
    pub fn count_recursive(&self, id: ItemId) -> usize {
        match self.node(id).container() {
            None => 1,
            Some((state, _)) => state
                .children
                .iter()
                .map(|&c| self.count_recursive(c))
                .sum(),
        }
    }

    /// Number of visible leaves in the subtree.
    #[must_use]
    pub fn visible_count_recursive(&self, id: ItemId) -> usize {
        match self.node(id).container() {
            None => usize::from(self.is_visible(id, false)),
            Some((state, _)) => state
                .children
                .iter()
                .map(|&c| self.visible_count_recursive(c))
                .sum(),
        }
    }

    /// All leaves of the subtree, in layout order.
    #[must_use]
    pub fn items_recursive(&self, id: ItemId) -> Vec<ItemId> {
        match self.node(id).container() {
            None => vec![id],
            Some((state, _)) => state
                .children
                .iter()
                .flat_map(|&c| self.items_recursive(c))
                .collect(),
        }
    }

    /// The visible direct child containing `p` (parent coordinates).
    #[must_use]
    pub fn item_at(&self, container: ItemId, p: Point) -> Option<ItemId> {
        let (state, _) = self.node(container).container()?;
        state
            .children
            .iter()
            .copied()
            .find(|&c| self.is_visible(c, false) && self.node(c).sizing.geometry.contains(p))
    }

    /// The visible leaf containing `p`, descending through containers.
    #[must_use]
    pub fn item_at_recursive(&self, container: ItemId, p: Point) -> Option<ItemId> {
        let hit = self.item_at(container, p)?;
        if self.node(hit).is_container() {
            self.item_at_recursive(hit, self.map_from_parent(hit, p))
        } else {
            Some(hit)
        }
    }

    /// The leaf currently hosting `guest`.
    #[must_use]
    pub fn item_for_guest(&self, guest: &str) -> Option<ItemId> {
        self.items_recursive(self.root)
            .into_iter()
            .find(|&id| self.node(id).guest() == Some(guest))
    }

    /// The nearest visible sibling of `id` on `side`. Considers the full
    /// child list so hidden placeholders are skipped, not miscounted.
    #[must_use]
    pub fn visible_neighbour_for(&self, id: ItemId, side: Side) -> Option<ItemId> {
        let parent = self.node(id).parent?;
        let (state, _) = self.node(parent).container()?;
        let index = state.children.iter().position(|&c| c == id)?;
        match side {
            Side::Side1 => state.children[..index]
                .iter()
                .rev()
                .copied()
                .find(|&c| self.is_visible(c, false)),
            Side::Side2 => state.children[index + 1..]
                .iter()
                .copied()
                .find(|&c| self.is_visible(c, false)),
        }
    }

    // --- visibility ------------------------------------------------------

    /// Whether the node is visible. Containers are visible when they have a
    /// visible child; a leaf mid-insertion counts as hidden when
    /// `exclude_being_inserted` is set.
    #[must_use]
    pub fn is_visible(&self, id: ItemId, exclude_being_inserted: bool) -> bool {
        let item = self.node(id);
        if item.is_container() {
            self.has_visible_children(id, exclude_being_inserted)
        } else {
            item.visible && !(exclude_being_inserted && item.sizing.is_being_inserted)
        }
    }

    /// A hidden leaf kept in the tree for later restoration.
    #[must_use]
    pub fn is_placeholder(&self, id: ItemId) -> bool {
        !self.is_visible(id, false)
    }

    pub(crate) fn set_is_visible(&mut self, id: ItemId, visible: bool) {
        if self.node(id).is_container() {
            // Container visibility is derived from the children.
            return;
        }

        if visible != self.node(id).visible {
            self.node_mut(id).visible = visible;
            if !visible {
                // A placeholder holds no share of its parent.
                self.node_mut(id).sizing.percentage_within_parent = 0.0;
            }
            self.push_event(LayoutEvent::VisibleChanged(id, visible));
            if let Some(parent) = self.node(id).parent {
                self.on_child_visible_changed(parent, visible);
            }
        }

        if visible
            && let ItemKind::Leaf { guest: Some(guest) } = &self.node(id).kind
        {
            let guest = guest.clone();
            if let Some(host) = self.host.clone() {
                host.set_guest_geometry(&guest, self.map_to_root_rect(id, self.rect_of(id)));
                host.set_guest_visible(&guest, true);
            }
        }

        self.update_object_name(id);
    }

    /// A child of `container` flipped visibility; bubble container-level
    /// visibility transitions upward.
    pub(crate) fn on_child_visible_changed(&mut self, container: ItemId, visible: bool) {
        let Some((state, _)) = self.node(container).container() else {
            return;
        };
        if state.deserializing {
            return;
        }

        let num_visible = self.num_visible_children(container);
        let transition = if visible && num_visible == 1 {
            Some(true)
        } else if !visible && num_visible == 0 {
            Some(false)
        } else {
            None
        };
        if let Some(now_visible) = transition {
            self.push_event(LayoutEvent::VisibleChanged(container, now_visible));
            if let Some(parent) = self.node(container).parent {
                self.on_child_visible_changed(parent, now_visible);
            }
        }
    }

    pub(crate) fn set_being_inserted(&mut self, id: ItemId, is: bool) {
        self.node_mut(id).sizing.is_being_inserted = is;

        // Trickle up: an ancestor hidden for lack of visible children is
        // also mid-insertion while this item settles.
        if let Some(parent) = self.node(id).parent {
            if is {
                if !self.has_visible_children(parent, false) {
                    self.set_being_inserted(parent, true);
                }
            } else {
                self.set_being_inserted(parent, false);
            }
        }
    }

    pub(crate) fn update_object_name(&mut self, id: ItemId) {
        if self.node(id).is_container() {
            return;
        }
        let name = match &self.node(id).kind {
            ItemKind::Leaf { guest: Some(guest) } if !guest.is_empty() => guest.clone(),
            ItemKind::Leaf { guest: Some(_) } => String::from("widget"),
            ItemKind::Leaf { guest: None } if !self.node(id).visible => String::from("hidden"),
            ItemKind::Leaf { guest: None } => String::from("null"),
            ItemKind::Container { .. } => unreachable!(),
        };
        self.node_mut(id).name = name;
    }

    // --- guests and constraints ------------------------------------------

    /// Attach or detach a guest on a leaf. Attaching pulls the minimum size
    /// from the host; a leaf that never had a geometry adopts the guest's
    /// current rectangle, expanded to the hard minimum.
    pub fn set_guest(&mut self, id: ItemId, guest: Option<String>) {
        let ItemKind::Leaf { guest: current } = &self.node(id).kind else {
            warn!(?id, "containers cannot hold guests");
            return;
        };
        if guest.is_some() && current.is_some() {
            warn!(?id, "leaf already has a guest");
            return;
        }

        let ItemKind::Leaf { guest: slot } = &mut self.node_mut(id).kind else {
            unreachable!()
        };
        *slot = guest.clone();

        if let Some(guest) = guest
            && let Some(host) = self.host.clone()
        {
            let min = host.guest_min_size(&guest).expanded_to(HARD_MIN_SIZE);
            self.set_min_size(id, min);

            if self.node(id).sizing.geometry.is_empty() {
                let mut geo = host.guest_geometry(&guest);
                geo = geo.with_size(geo.size().expanded_to(HARD_MIN_SIZE));
                let local = self.map_from_root_rect(id, geo);
                self.set_geometry(id, local);
            } else {
                self.publish_guest_geometries(id);
            }
        }

        self.update_object_name(id);
    }

    /// Update a node's minimum size, growing it to fit and re-laying the
    /// parent as needed.
    pub fn set_min_size(&mut self, id: ItemId, sz: Size) {
        if sz == self.node(id).sizing.min_size {
            return;
        }
        self.node_mut(id).sizing.min_size = sz;
        self.push_event(LayoutEvent::MinSizeChanged(id));
        if let Some(parent) = self.node(id).parent {
            self.on_child_min_size_changed(parent, id);
        }
        let grown = self.size_of(id).expanded_to(sz);
        self.set_size_recursive_with(id, grown, crate::ChildrenResizeStrategy::Percentage);
        self.finish_mutation();
    }

    /// Record an advisory maximum size on a leaf.
    pub fn set_max_size(&mut self, id: ItemId, sz: Size) {
        if self.node(id).is_container() {
            warn!(?id, "max size is per leaf");
            return;
        }
        self.node_mut(id).sizing.max_size = sz;
    }

    // --- reference counting ----------------------------------------------

    /// Take a reference on a leaf, keeping it in the tree as a placeholder
    /// while hidden.
    pub fn ref_item(&mut self, id: ItemId) {
        self.node_mut(id).ref_count += 1;
    }

    /// Drop a reference; the leaf is removed when the count reaches zero.
    pub fn unref_item(&mut self, id: ItemId) {
        let count = self.node(id).ref_count;
        if count == 0 {
            warn!(?id, "unref on an unreferenced item");
            return;
        }
        self.node_mut(id).ref_count = count - 1;
        if count == 1 && !self.is_root(id) {
            let parent = self.node(id).parent;
            if let Some(parent) = parent {
                self.remove_item_impl(parent, id, true);
            }
            self.finish_mutation();
        }
    }

    // --- placeholders and guest lifetime ---------------------------------

    /// Hide a leaf without destroying it; the space is reclaimed by its
    /// neighbours and the leaf can later be restored in place.
    pub fn turn_into_placeholder(&mut self, id: ItemId) {
        if self.node(id).is_container() {
            warn!(?id, "containers cannot turn into placeholders");
            return;
        }
        let Some(parent) = self.node(id).parent else {
            warn!(?id, "detached leaf cannot turn into placeholder");
            return;
        };
        self.remove_item_impl(parent, id, false);
        self.finish_mutation();
    }

    /// Re-attach `guest` to a hidden, guestless leaf and give it back its
    /// space, squeezing the immediate neighbours first so repeated
    /// hide/show cycles land in the same place.
    pub fn restore(&mut self, id: ItemId, guest: String) {
        if self.node(id).is_container() {
            warn!(?id, "containers can't be restored");
            return;
        }
        if self.is_visible(id, false) || self.node(id).guest().is_some() {
            warn!(?id, "restore needs a hidden, guestless leaf");
            return;
        }
        self.set_guest(id, Some(guest));
        if let Some(parent) = self.node(id).parent {
            self.restore_child(parent, id, crate::NeighbourSqueezeStrategy::ImmediateNeighboursFirst);
        }
        self.finish_mutation();
    }

    /// The host reports that a guest surface was destroyed. Referenced
    /// leaves become placeholders; unreferenced ones leave the tree.
    pub fn on_guest_destroyed(&mut self, guest: &str) {
        let Some(id) = self.item_for_guest(guest) else {
            warn!(guest, "destroyed guest is not hosted here");
            return;
        };
        if self.node(id).ref_count > 0 {
            self.turn_into_placeholder(id);
        } else if !self.is_root(id) {
            let parent = self.node(id).parent;
            if let Some(parent) = parent {
                self.remove_item_impl(parent, id, true);
            }
            self.finish_mutation();
        } else {
            self.set_guest(id, None);
        }
    }

    // --- diagnostics ------------------------------------------------------

    /// Human-readable dump of the whole tree, used by every sanity failure.
    #[must_use]
    pub fn dump_layout(&self) -> String {
        let mut out = String::new();
        self.dump_item(self.root, 0, &mut out);
        out
    }

    fn dump_item(&self, id: ItemId, level: usize, out: &mut String) {
        use std::fmt::Write as _;

        let indent = " ".repeat(level * 2);
        let item = self.node(id);
        let flags = format!(
            "{}{}",
            if item.sizing.is_being_inserted {
                " ;beingInserted;"
            } else {
                ""
            },
            if self.is_visible(id, false) { "" } else { " ;hidden;" },
        );

        match item.container() {
            Some((state, orientation)) => {
                let kind = if self.is_root(id) { "Root" } else { "Layout" };
                let _ = writeln!(
                    out,
                    "{indent}* {kind}: {orientation:?} {:?}; min={:?};{flags} %={:?}",
                    item.sizing.geometry,
                    self.min_size(id),
                    self.child_percentages(id),
                );
                let mut visible_index = 0;
                for &child in &state.children {
                    self.dump_item(child, level + 1, out);
                    if self.is_visible(child, false) {
                        if let Some(sep) = state.separators.get(visible_index) {
                            let _ = writeln!(
                                out,
                                "{indent}  - Separator: pos={} geo={:?}",
                                sep.position, sep.geometry
                            );
                        }
                        visible_index += 1;
                    }
                }
            }
            None => {
                let _ = writeln!(
                    out,
                    "{indent}- Item: {} {:?}; min={:?};{flags} guest={:?}",
                    item.name,
                    item.sizing.geometry,
                    item.sizing.min_size,
                    item.guest(),
                );
            }
        }
    }
}

impl Default for ItemTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tree_has_empty_root_container() {
        let tree = ItemTree::new();
        let root = tree.root();
        assert!(tree.is_root(root));
        assert_eq!(tree.num_children(root), 0);
        assert_eq!(tree.count_recursive(root), 0);
        assert!(!tree.has_visible_children(root, false));
    }

    #[test]
    fn detached_leaf_starts_hidden_and_guestless() {
        let mut tree = ItemTree::new();
        let leaf = tree.new_leaf();
        assert!(!tree.is_visible(leaf, false));
        assert!(tree.item(leaf).expect("leaf exists").guest().is_none());
        assert_eq!(tree.path_from_root(leaf), Vec::<usize>::new());
    }

    #[test]
    fn separator_thickness_locked_after_insert() {
        let mut tree = ItemTree::new();
        tree.set_separator_thickness(7);
        assert_eq!(tree.separator_thickness(), 7);

        let leaf = tree.new_leaf();
        tree.insert_item(
            tree.root(),
            leaf,
            crate::Location::Left,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        tree.set_separator_thickness(9);
        assert_eq!(tree.separator_thickness(), 7);
    }

    #[test]
    fn min_size_aggregates_children_with_separator_waste() {
        let mut tree = ItemTree::new();
        tree.set_size_recursive(Size::new(1000, 600), crate::ChildrenResizeStrategy::Percentage);
        let a = tree.new_leaf();
        let b = tree.new_leaf();
        tree.insert_item(
            tree.root(),
            a,
            crate::Location::Left,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        tree.insert_item(
            tree.root(),
            b,
            crate::Location::Right,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        // Two 80x90 minima side by side plus one separator.
        assert_eq!(tree.min_size(tree.root()), Size::new(80 + 80 + 5, 90));
    }

    #[test]
    fn map_to_root_accumulates_ancestor_positions() {
        let mut tree = ItemTree::new();
        tree.set_size_recursive(Size::new(1000, 600), crate::ChildrenResizeStrategy::Percentage);
        let a = tree.new_leaf();
        let b = tree.new_leaf();
        let c = tree.new_leaf();
        tree.insert_item(
            tree.root(),
            a,
            crate::Location::Left,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        tree.insert_item(
            tree.root(),
            b,
            crate::Location::Right,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        tree.insert_item_relative(c, b, crate::Location::Bottom, crate::DefaultSizeMode::Fair);

        let c_root = tree.map_to_root(c, Point::new(0, 0));
        let c_geo = tree.item(c).expect("leaf exists").sizing().geometry;
        let parent = tree.item(c).expect("leaf exists").parent().expect("parent");
        let parent_geo = tree.item(parent).expect("container").sizing().geometry;
        assert_eq!(c_root, Point::new(parent_geo.x + c_geo.x, parent_geo.y + c_geo.y));

        // Round trip.
        assert_eq!(tree.map_from_root(c, c_root), Point::new(0, 0));
    }

    #[test]
    fn path_round_trips_through_item_from_path() {
        let mut tree = ItemTree::new();
        tree.set_size_recursive(Size::new(1000, 600), crate::ChildrenResizeStrategy::Percentage);
        let a = tree.new_leaf();
        let b = tree.new_leaf();
        let c = tree.new_leaf();
        tree.insert_item(
            tree.root(),
            a,
            crate::Location::Left,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        tree.insert_item(
            tree.root(),
            b,
            crate::Location::Right,
            crate::DefaultSizeMode::Fair,
            crate::AddingOption::None,
        );
        tree.insert_item_relative(c, b, crate::Location::Bottom, crate::DefaultSizeMode::Fair);

        for id in tree.items_recursive(tree.root()) {
            let path = tree.path_from_root(id);
            assert_eq!(tree.item_from_path(&path), Some(id));
        }
        assert_eq!(tree.item_from_path(&[]), Some(tree.root()));
    }

    #[test]
    fn visible_neighbour_skips_placeholders() {
        let mut tree = ItemTree::new();
        tree.set_size_recursive(Size::new(1000, 600), crate::ChildrenResizeStrategy::Percentage);
        let a = tree.new_leaf();
        let b = tree.new_leaf();
        let c = tree.new_leaf();
        for (leaf, loc) in [
            (a, crate::Location::Left),
            (b, crate::Location::Right),
            (c, crate::Location::Right),
        ] {
            tree.insert_item(
                tree.root(),
                leaf,
                loc,
                crate::DefaultSizeMode::Fair,
                crate::AddingOption::None,
            );
        }
        tree.remove_item(b, false);
        assert_eq!(tree.visible_neighbour_for(c, Side::Side1), Some(a));
        assert_eq!(tree.visible_neighbour_for(a, Side::Side2), Some(c));
    }
}
