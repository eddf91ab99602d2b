//! Container layout algorithms: insertion, removal, restoration, growth,
//! squeezing, resize strategies, separator derivation and dragging, and the
//! drop-rect preview.
//!
//! Everything here works in two phases: mutations first update a working
//! buffer of [`SizingInfo`]s for the container's visible children, then the
//! buffer is applied to the real nodes and separators are re-derived.

use quay_core::{Point, Rect, Size};
use tracing::warn;

use crate::item::{ContainerState, ItemKind, Separator};
use crate::{
    AddingOption, ChildrenResizeStrategy, DefaultSizeMode, GrowthStrategy, ItemId, ItemTree,
    LayoutEvent, LengthOnSide, Location, NeighbourSqueezeStrategy, Orientation, SeparatorId, Side,
    SizingInfo, length_along,
};

/// The essentials of an item that is about to be dropped into the layout:
/// its current size and its minimum. Used by the drop-rect preview, which
/// must not mutate the live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropCandidate {
    pub size: Size,
    pub min_size: Size,
}

impl DropCandidate {
    /// A candidate with no size yet; it will receive the fair share.
    #[must_use]
    pub const fn new(size: Size, min_size: Size) -> Self {
        Self { size, min_size }
    }
}

impl ItemTree {
    // --- container basics -------------------------------------------------

    /// Layout orientation of a container.
    #[must_use]
    pub fn orientation(&self, id: ItemId) -> Orientation {
        match &self.node(id).kind {
            ItemKind::Container { orientation, .. } => *orientation,
            ItemKind::Leaf { .. } => {
                debug_assert!(false, "orientation queried on a leaf");
                Orientation::Vertical
            }
        }
    }

    pub(crate) fn container_state_mut(&mut self, id: ItemId) -> &mut ContainerState {
        self.node_mut(id)
            .container_mut()
            .expect("id refers to a container")
    }

    pub(crate) fn set_orientation(&mut self, id: ItemId, o: Orientation) {
        let ItemKind::Container { orientation, .. } = &mut self.node_mut(id).kind else {
            return;
        };
        if *orientation != o {
            *orientation = o;
            self.update_separators_recursive(id);
        }
    }

    /// Whether an insertion at `loc` fits this container's orientation.
    /// Containers with at most one child are orientation-free.
    #[must_use]
    pub fn has_orientation_for(&self, id: ItemId, loc: Location) -> bool {
        self.num_children(id) <= 1 || self.orientation(id) == loc.orientation()
    }

    /// Length of the container along its orientation.
    #[must_use]
    pub fn container_length(&self, id: ItemId) -> i32 {
        self.length_of(id, self.orientation(id))
    }

    /// Length across the container's orientation.
    #[must_use]
    pub fn opposite_length(&self, id: ItemId) -> i32 {
        self.length_of(id, self.orientation(id).opposite())
    }

    /// Container length minus the space consumed by separators.
    #[must_use]
    pub fn usable_length(&self, id: ItemId) -> i32 {
        let num_visible = self.visible_children(id, false).len() as i32;
        if num_visible <= 1 {
            self.container_length(id)
        } else {
            self.container_length(id) - self.separator_thickness * (num_visible - 1)
        }
    }

    /// Size minus the aggregated minimum: what the container can still give
    /// up. Components can be negative when the container is squeezed.
    #[must_use]
    pub fn available_size(&self, id: ItemId) -> Size {
        self.size_of(id) - self.min_size(id)
    }

    /// `available_size` along the container's orientation.
    #[must_use]
    pub fn available_length(&self, id: ItemId) -> i32 {
        length_along(self.available_size(id), self.orientation(id))
    }

    /// Whether exactly one child is visible.
    #[must_use]
    pub fn has_single_visible_item(&self, id: ItemId) -> bool {
        self.num_visible_children(id) == 1
    }

    pub(crate) fn schedule_check_sanity(&mut self) {
        self.check_sanity_scheduled = true;
    }

    // --- insertion --------------------------------------------------------

    /// Insert `item` into `container` at `loc`.
    ///
    /// Orientation-free containers adopt the required orientation; a root
    /// whose orientation conflicts wraps its current children into a
    /// sub-container and flips. The inserted item receives a default length
    /// per `mode` and carves its space out of the neighbours.
    pub fn insert_item(
        &mut self,
        container: ItemId,
        item: ItemId,
        loc: Location,
        mode: DefaultSizeMode,
        option: AddingOption,
    ) {
        self.insert_item_inner(container, item, loc, mode, option);
        self.finish_mutation();
    }

    fn insert_item_inner(
        &mut self,
        container: ItemId,
        item: ItemId,
        loc: Location,
        mode: DefaultSizeMode,
        option: AddingOption,
    ) {
        if !self.node(container).is_container() {
            warn!(?container, "insertion target must be a container");
            return;
        }
        if container == item || self.contains(container, item) {
            warn!(?item, "item already exists");
            return;
        }

        let start_hidden = option == AddingOption::StartHidden;
        self.set_is_visible(item, !start_hidden);
        debug_assert!(
            !(start_hidden && self.node(item).is_container()),
            "containers cannot start hidden"
        );

        if self.has_orientation_for(container, loc) {
            if self.num_children(container) <= 1 {
                self.set_orientation(container, loc.orientation());
            }
            let index = if loc.side() == Side::Side1 {
                0
            } else {
                self.num_children(container)
            };
            self.insert_item_at(container, item, index, mode);
        } else {
            // Inserting orthogonally directly into a container: root only.
            debug_assert!(self.is_root(container), "only the root re-orients itself");
            let current = self.orientation(container);
            let wrapper = self.alloc_container(Some(container), current);
            let rect = self.rect_of(container);
            self.set_geometry(wrapper, rect);

            let children = std::mem::take(&mut self.container_state_mut(container).children);
            for &child in &children {
                self.node_mut(child).parent = Some(wrapper);
            }
            self.container_state_mut(wrapper).children = children;

            self.set_orientation(container, current.opposite());
            self.insert_item_at(container, wrapper, 0, DefaultSizeMode::None);

            // Now the orientation matches; insert for real.
            self.insert_item_inner(container, item, loc, mode, option);

            if !self.has_visible_children(wrapper, false) {
                self.set_geometry(wrapper, Rect::default());
            }
        }

        self.update_separators_recursive(container);
        self.schedule_check_sanity();
    }

    /// Insert `item` next to `relative_to` (an item already in the tree) at
    /// `loc`. If the anchor's container has the wrong orientation the anchor
    /// is first wrapped into a sub-container.
    pub fn insert_item_relative(
        &mut self,
        item: ItemId,
        relative_to: ItemId,
        loc: Location,
        mode: DefaultSizeMode,
    ) {
        self.insert_item_relative_inner(item, relative_to, loc, mode, AddingOption::None);
        self.finish_mutation();
    }

    fn insert_item_relative_inner(
        &mut self,
        item: ItemId,
        relative_to: ItemId,
        loc: Location,
        mode: DefaultSizeMode,
        option: AddingOption,
    ) {
        if item == relative_to {
            warn!(?item, "cannot insert an item relative to itself");
            return;
        }
        let Some(parent) = self.node(relative_to).parent else {
            warn!(?relative_to, "anchor is not in the tree");
            return;
        };

        let start_hidden = option == AddingOption::StartHidden;
        self.set_is_visible(item, !start_hidden);

        if self.has_orientation_for(parent, loc) {
            let Some(mut index) = self
                .node(parent)
                .container()
                .and_then(|(state, _)| state.children.iter().position(|&c| c == relative_to))
            else {
                warn!(?relative_to, "anchor not found in its parent");
                return;
            };
            if loc.side() == Side::Side2 {
                index += 1;
            }

            let o = loc.orientation();
            if o != self.orientation(parent) {
                // One visible child: the container is ambidextrous and now
                // commits to an orientation.
                debug_assert_eq!(self.visible_children(parent, false).len(), 1);
                self.set_orientation(parent, o);
            }
            self.insert_item_at(parent, item, index, mode);
            self.schedule_check_sanity();
        } else {
            let Some(sub) = self.convert_child_to_container(parent, relative_to) else {
                return;
            };
            self.insert_item_inner(sub, item, loc, mode, option);
        }
    }

    /// Insert `item` as the `index`-th child, sizing it per `mode` first.
    /// Visible items immediately receive space via `restore_child`.
    pub fn insert_item_at(
        &mut self,
        container: ItemId,
        item: ItemId,
        index: usize,
        mode: DefaultSizeMode,
    ) {
        if !self.node(container).is_container() {
            warn!(?container, "insertion target must be a container");
            return;
        }
        if mode != DefaultSizeMode::None {
            let o = self.orientation(container);
            let suggested = self.default_length_for(container, item, mode);
            if suggested > 0 {
                self.set_length_recursive(item, suggested, o);
            }
        }

        self.container_state_mut(container).children.insert(index, item);
        self.node_mut(item).parent = Some(container);
        let visible = self.is_visible(item, false);
        self.on_child_visible_changed(container, visible);
        self.publish_guest_geometries(item);

        self.push_event(LayoutEvent::ItemsChanged(container));

        let converting = self
            .node(container)
            .container()
            .is_some_and(|(state, _)| state.converting_child_to_container);
        if !converting && visible {
            self.restore_child(container, item, NeighbourSqueezeStrategy::AllNeighbours);
        }

        if !self.node(item).is_container() {
            if self.is_visible(item, false) {
                let count = self.num_visible_children(self.root);
                self.push_event(LayoutEvent::NumVisibleItemsChanged(count));
            }
            self.push_event(LayoutEvent::NumItemsChanged);
        }
    }

    /// Pick a nice length for `item` being added to `container`.
    pub(crate) fn default_length_for(
        &self,
        container: ItemId,
        item: ItemId,
        mode: DefaultSizeMode,
    ) -> i32 {
        let o = self.orientation(container);
        let result = match mode {
            DefaultSizeMode::None => 0,
            DefaultSizeMode::Fair => self.fair_length_for(container),
            DefaultSizeMode::FairButFloor => self
                .fair_length_for(container)
                .min(self.length_of(item, o)),
            DefaultSizeMode::ItemSize => self.length_of(item, o),
            DefaultSizeMode::SizePolicy => {
                warn!("SizePolicy default size mode is reserved and not implemented");
                0
            }
        };

        result.max(self.min_length(item, o))
    }

    /// Equal share for one more child: `usable / (n + 1)`, rounded half up
    /// so the incoming item receives the rounding pixel.
    fn fair_length_for(&self, container: ItemId) -> i32 {
        let num_visible = self.num_visible_children(container) as i32 + 1;
        let usable =
            self.container_length(container) - self.separator_thickness * (num_visible - 1);
        if usable <= 0 {
            return 0;
        }
        (usable + num_visible / 2) / num_visible
    }

    /// Wrap `leaf` into a fresh one-child container occupying its slot and
    /// geometry, so an orthogonal split can happen inside.
    pub fn convert_child_to_container(&mut self, container: ItemId, leaf: ItemId) -> Option<ItemId> {
        let Some(index) = self
            .node(container)
            .container()
            .and_then(|(state, _)| state.children.iter().position(|&c| c == leaf))
        else {
            warn!(?leaf, "not a child of this container");
            return None;
        };

        let state = self.container_state_mut(container);
        let was_converting = state.converting_child_to_container;
        state.converting_child_to_container = true;

        let sub = self.alloc_container(Some(container), Orientation::Vertical);
        self.insert_item_at(container, sub, index, DefaultSizeMode::None);
        self.container_state_mut(container)
            .children
            .retain(|&c| c != leaf);
        let leaf_geo = self.node(leaf).sizing.geometry;
        self.set_geometry(sub, leaf_geo);
        self.insert_item_inner(
            sub,
            leaf,
            Location::Top,
            DefaultSizeMode::None,
            AddingOption::None,
        );

        self.push_event(LayoutEvent::ItemsChanged(container));
        self.update_separators_recursive(container);
        self.container_state_mut(container).converting_child_to_container = was_converting;

        Some(sub)
    }

    // --- removal ----------------------------------------------------------

    /// Remove `item` from the tree. `hard` destroys the node; otherwise it
    /// is hidden in place as a placeholder. Freed space goes to the visible
    /// neighbours, half and half when both sides exist.
    pub fn remove_item(&mut self, item: ItemId, hard: bool) {
        if !self.nodes.contains_key(&item) {
            warn!(?item, "unknown item");
            return;
        }
        let Some(parent) = self.node(item).parent else {
            warn!(?item, "cannot remove the root or a detached item");
            return;
        };
        self.remove_item_impl(parent, item, hard);
        self.finish_mutation();
    }

    pub(crate) fn remove_item_impl(&mut self, container: ItemId, item: ItemId, hard: bool) {
        if self.is_root(item) {
            warn!("cannot remove the root container");
            return;
        }
        if !self.contains(container, item) {
            // Not ours, forward to the actual parent.
            if let Some(actual) = self.node(item).parent {
                self.remove_item_impl(actual, item, hard);
            } else {
                warn!(?item, "item is not in the tree");
            }
            return;
        }

        let side1 = self.visible_neighbour_for(item, Side::Side1);
        let side2 = self.visible_neighbour_for(item, Side::Side2);
        let is_container = self.node(item).is_container();
        let was_visible = !is_container && self.is_visible(item, false);

        if hard {
            self.container_state_mut(container)
                .children
                .retain(|&c| c != item);
            self.remove_subtree_from_arena(item);
            if !is_container {
                self.push_event(LayoutEvent::NumItemsChanged);
            }
        } else {
            self.set_is_visible(item, false);
            if !is_container {
                self.set_guest(item, None);
                if !was_visible {
                    // Was already hidden.
                    return;
                }
            }
        }

        if was_visible {
            let count = self.num_visible_children(self.root);
            self.push_event(LayoutEvent::NumVisibleItemsChanged(count));
        }

        if self.num_children(container) == 0 {
            // An empty non-root container is useless.
            if let Some(parent) = self.node(container).parent {
                self.remove_item_impl(parent, container, true);
            }
        } else if !hard && !self.has_visible_children(container, false) {
            // All children hidden: the container hides too, and only the
            // root keeps a rect without visible children.
            if let Some(parent) = self.node(container).parent {
                self.remove_item_impl(parent, container, false);
                self.set_geometry(container, Rect::default());
            }
        } else {
            self.grow_neighbours(container, side1, side2);
            self.push_event(LayoutEvent::ItemsChanged(container));
            self.update_size_constraints(container);
            self.update_separators_recursive(container);
        }
    }

    /// Remove every child of `container`, destroying the subtrees.
    pub fn clear(&mut self, container: ItemId) {
        let children = std::mem::take(&mut self.container_state_mut(container).children);
        for child in children {
            self.remove_subtree_from_arena(child);
        }
        self.container_state_mut(container).separators.clear();
        self.push_event(LayoutEvent::ItemsChanged(container));
        self.finish_mutation();
    }

    /// Grow the recorded neighbours of a removed item over its freed space:
    /// half and half when both exist, full expansion otherwise.
    pub(crate) fn grow_neighbours(
        &mut self,
        container: ItemId,
        side1: Option<ItemId>,
        side2: Option<ItemId>,
    ) {
        let o = self.orientation(container);
        let st = self.separator_thickness;

        match (side1, side2) {
            (None, None) => {}
            (Some(side1), Some(side2)) => {
                let s1 = self.node(side1).sizing;
                let s2 = self.node(side2).sizing;
                let end1 = s1.position(o) + s1.length(o);
                let pos2 = s2.position(o);

                // One separator remains between them; the extra pixel keeps
                // parity with the historic inclusive-edge arithmetic.
                let free = pos2 - end1 + 1 - st;
                let give1 = free / 2;

                let mut geo1 = s1;
                geo1.increment_length(give1, o);
                let new_pos2 = geo1.position(o) + geo1.length(o) + st;

                let mut geo2 = s2;
                let end2 = s2.position(o) + s2.length(o);
                geo2.set_pos(new_pos2, o);
                geo2.set_length(end2 - new_pos2, o);

                self.set_geometry_recursive(side1, geo1.geometry);
                self.set_geometry_recursive(side2, geo2.geometry);
            }
            (Some(side1), None) => {
                // Grow all the way to the trailing edge.
                let mut geo = self.node(side1).sizing;
                let len = self.container_length(container) - geo.position(o);
                geo.set_length(len, o);
                self.set_geometry_recursive(side1, geo.geometry);
            }
            (None, Some(side2)) => {
                // Grow all the way to the leading edge.
                let mut geo = self.node(side2).sizing;
                let grown = geo.length(o) + geo.position(o);
                geo.set_pos(0, o);
                geo.set_length(grown, o);
                self.set_geometry_recursive(side2, geo.geometry);
            }
        }
    }

    // --- restore ----------------------------------------------------------

    /// Make an already-parented, hidden `item` visible and give it space:
    /// bubbling the restore upward if this container was itself hidden,
    /// growing the root when minima demand it, and squeezing neighbours per
    /// `strategy`.
    pub fn restore_child(
        &mut self,
        container: ItemId,
        item: ItemId,
        strategy: NeighbourSqueezeStrategy,
    ) {
        if !self.contains(container, item) {
            warn!(?item, "restore target is not a child of this container");
            return;
        }

        let had_visible_children = self.has_visible_children(container, true);
        self.set_is_visible(item, true);
        self.set_being_inserted(item, true);

        if !had_visible_children {
            // This container was hidden and is restored along with the
            // child; a decent starting size is the child's own.
            if let Some(parent) = self.node(container).parent {
                let child_size = self.size_of(item);
                self.set_size(container, child_size);
                self.restore_child(parent, container, strategy);
            }
        }

        // Make sure the root is big enough for every minimum.
        self.update_size_constraints(container);

        self.set_being_inserted(item, false);

        if self.num_visible_children(container) == 1 {
            // Alone in the layout: occupy everything.
            let rect = self.rect_of(container);
            self.set_geometry_recursive(item, rect);
            self.update_separators_recursive(container);
            return;
        }

        let o = self.orientation(container);
        let available = self.available_on_side(container, item, Side::Side1)
            + self.available_on_side(container, item, Side::Side2)
            - self.separator_thickness;
        let min = self.min_length(item, o);
        let proposed = self.length_of(item, o);
        let new_length = min.max(available.min(proposed));

        debug_assert!(self.is_visible(item, false));

        // The item grows by exactly what it steals, so start from zero.
        self.node_mut(item).sizing.set_length(0, o);
        self.grow_item(
            item,
            new_length,
            GrowthStrategy::BothSidesEqually,
            strategy,
            true,
            ChildrenResizeStrategy::Percentage,
        );
        self.update_separators_recursive(container);
    }

    // --- size constraints --------------------------------------------------

    /// Re-check the container against its aggregated minimum; the root
    /// grows to fit, inner containers bubble the change upward.
    pub(crate) fn update_size_constraints(&mut self, container: ItemId) {
        let missing = self.missing_size(container);
        if !missing.is_null() && self.is_root(container) {
            let new = self.size_of(container) + missing;
            self.set_size_recursive_with(container, new, ChildrenResizeStrategy::Percentage);
        }

        self.push_event(LayoutEvent::MinSizeChanged(container));
        if let Some(parent) = self.node(container).parent {
            self.on_child_min_size_changed(parent, container);
        }
    }

    /// A child's minimum grew or shrank; re-derive our constraints and give
    /// the child any length it is now missing.
    pub(crate) fn on_child_min_size_changed(&mut self, container: ItemId, child: ItemId) {
        let Some((state, _)) = self.node(container).container() else {
            return;
        };
        if state.converting_child_to_container
            || state.deserializing
            || !self.is_visible(child, false)
        {
            return;
        }

        self.update_size_constraints(container);

        if self.node(child).sizing.is_being_inserted {
            return;
        }

        if self.num_visible_children(container) == 1 {
            // Alone in the layout, occupies everything.
            let rect = self.rect_of(container);
            self.set_geometry(child, rect);
            self.update_child_percentages(container);
            return;
        }

        let missing = self.missing_size(child);
        if !missing.is_null() {
            let o = self.orientation(container);
            self.grow_item(
                child,
                length_along(missing, o),
                GrowthStrategy::BothSidesEqually,
                NeighbourSqueezeStrategy::AllNeighbours,
                false,
                ChildrenResizeStrategy::Percentage,
            );
        }

        self.update_child_percentages(container);
    }

    // --- working buffers ----------------------------------------------------

    /// Snapshot the visible children's `SizingInfo`s, refreshing the cached
    /// minimum of container children on the way.
    pub(crate) fn collect_sizes(
        &mut self,
        container: ItemId,
        include_being_inserted: bool,
    ) -> Vec<SizingInfo> {
        let children = self.visible_children(container, include_being_inserted);
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            if self.node(child).is_container() {
                let min = self.min_size(child);
                self.node_mut(child).sizing.min_size = min;
            }
            out.push(self.node(child).sizing);
        }
        out
    }

    /// Summed length and minimum of the run of entries on `side` of
    /// `from_index` (inclusive).
    pub(crate) fn length_on_side(
        &self,
        sizes: &[SizingInfo],
        from_index: i32,
        side: Side,
        o: Orientation,
    ) -> LengthOnSide {
        if from_index < 0 || from_index >= sizes.len() as i32 {
            return LengthOnSide::default();
        }
        let from_index = from_index as usize;
        let range = match side {
            Side::Side1 => 0..=from_index,
            Side::Side2 => from_index..=sizes.len() - 1,
        };

        let mut result = LengthOnSide::default();
        for size in &sizes[range] {
            result.length += size.length(o);
            result.min_length += size.min_length(o);
        }
        result
    }

    /// Total length of the visible siblings on `side` of `item`, along `o`.
    /// Zero when `o` is not this container's axis.
    #[must_use]
    pub fn neighbours_length_for(
        &self,
        container: ItemId,
        item: ItemId,
        side: Side,
        o: Orientation,
    ) -> i32 {
        let children = self.visible_children(container, false);
        let Some(index) = children.iter().position(|&c| c == item) else {
            warn!(?item, "item not found among visible children");
            return 0;
        };
        if o != self.orientation(container) {
            // No neighbours in the other orientation; containers are
            // bidimensional.
            return 0;
        }

        let run: &[ItemId] = match side {
            Side::Side1 => &children[..index],
            Side::Side2 => &children[index + 1..],
        };
        run.iter().map(|&c| self.length_of(c, o)).sum()
    }

    /// As `neighbours_length_for`, accumulated over the ancestors.
    #[must_use]
    pub fn neighbours_length_for_recursive(
        &self,
        container: ItemId,
        item: ItemId,
        side: Side,
        o: Orientation,
    ) -> i32 {
        let local = self.neighbours_length_for(container, item, side, o);
        match self.node(container).parent {
            None => local,
            Some(parent) => {
                local + self.neighbours_length_for_recursive(parent, container, side, o)
            }
        }
    }

    /// Total minimum length of the visible siblings on `side` of `item`.
    #[must_use]
    pub fn neighbours_min_length_for(
        &self,
        container: ItemId,
        item: ItemId,
        side: Side,
        o: Orientation,
    ) -> i32 {
        let children = self.visible_children(container, false);
        let Some(index) = children.iter().position(|&c| c == item) else {
            warn!(?item, "item not found among visible children");
            return 0;
        };
        if o != self.orientation(container) {
            return 0;
        }

        let run: &[ItemId] = match side {
            Side::Side1 => &children[..index],
            Side::Side2 => &children[index + 1..],
        };
        run.iter().map(|&c| self.min_length(c, o)).sum()
    }

    /// Length the visible siblings on `side` of `child` can donate before
    /// hitting their minima.
    #[must_use]
    pub fn available_on_side(&self, container: ItemId, child: ItemId, side: Side) -> i32 {
        let o = self.orientation(container);
        let length = self.neighbours_length_for(container, child, side, o);
        let min = self.neighbours_min_length_for(container, child, side, o);
        let available = length - min;
        if available < 0 {
            warn!(available, "neighbours are below their minimum\n{}", self.dump_layout());
            debug_assert!(false, "negative availability");
            return 0;
        }
        available
    }

    /// As `available_on_side`, accumulated over every ancestor laying out
    /// along `o`.
    #[must_use]
    pub fn available_on_side_recursive(
        &self,
        container: ItemId,
        child: ItemId,
        side: Side,
        o: Orientation,
    ) -> i32 {
        if o == self.orientation(container) {
            let available = self.available_on_side(container, child, side);
            match self.node(container).parent {
                None => available,
                Some(parent) => {
                    available + self.available_on_side_recursive(parent, container, side, o)
                }
            }
        } else {
            match self.node(container).parent {
                None => 0,
                Some(parent) => self.available_on_side_recursive(parent, container, side, o),
            }
        }
    }

    // --- grow / shrink / squeeze -------------------------------------------

    /// Grow `item` by `amount`, stealing the space from its neighbours, and
    /// apply the result to the real nodes with `child_strategy`.
    pub(crate) fn grow_item(
        &mut self,
        item: ItemId,
        amount: i32,
        growth: GrowthStrategy,
        squeeze: NeighbourSqueezeStrategy,
        account_for_new_separator: bool,
        child_strategy: ChildrenResizeStrategy,
    ) {
        let Some(container) = self.node(item).parent else {
            warn!(?item, "grow target has no parent");
            return;
        };
        let children = self.visible_children(container, false);
        let Some(index) = children.iter().position(|&c| c == item) else {
            warn!(?item, "grow target is not a visible child");
            return;
        };
        let mut sizes = self.collect_sizes(container, false);
        self.grow_item_in(
            container,
            index,
            &mut sizes,
            amount,
            growth,
            squeeze,
            account_for_new_separator,
        );
        self.apply_geometries(container, &sizes, child_strategy);
    }

    /// Buffer-level growth: entry `index` grows by `missing`, the other
    /// entries shrink by the same total (plus a separator's worth when one
    /// is about to appear).
    pub(crate) fn grow_item_in(
        &mut self,
        container: ItemId,
        index: usize,
        sizes: &mut [SizingInfo],
        missing: i32,
        growth: GrowthStrategy,
        squeeze: NeighbourSqueezeStrategy,
        account_for_new_separator: bool,
    ) {
        let o = self.orientation(container);
        let mut to_steal = missing
            + if account_for_new_separator {
                self.separator_thickness
            } else {
                0
            };
        if to_steal == 0 {
            return;
        }

        // #1 grow our item.
        let opposite_len = self.opposite_length(container);
        {
            let sizing = &mut sizes[index];
            sizing.set_length(sizing.length(o) + missing, o);
            sizing.set_opposite_length(opposite_len, o);
        }

        let mut side1_growth = 0;
        let mut side2_growth = 0;

        match growth {
            GrowthStrategy::BothSidesEqually => {
                if sizes.len() == 1 {
                    // No neighbours to push; nothing to steal.
                    return;
                }

                // #2 calculate how much to shrink from each side.
                let side1 = self.length_on_side(sizes, index as i32 - 1, Side::Side1, o);
                let side2 = self.length_on_side(sizes, index as i32 + 1, Side::Side2, o);
                let mut available1 = side1.available();
                let mut available2 = side2.available();

                if to_steal > available1 + available2 {
                    warn!(
                        to_steal,
                        available1,
                        available2,
                        "growth exceeds what the neighbours can donate\n{}",
                        self.dump_layout()
                    );
                    debug_assert!(false, "over-stealing from neighbours");
                    to_steal = available1 + available2;
                }

                while to_steal > 0 {
                    if available1 == 0 {
                        debug_assert!(available2 >= to_steal);
                        side2_growth += to_steal;
                        break;
                    }
                    if available2 == 0 {
                        debug_assert!(available1 >= to_steal);
                        side1_growth += to_steal;
                        break;
                    }

                    let to_take = (to_steal / 2).max(1);
                    let took1 = to_take.min(available1);
                    to_steal -= took1;
                    available1 -= took1;
                    side1_growth += took1;
                    if to_steal == 0 {
                        break;
                    }

                    let took2 = to_take.min(available2);
                    to_steal -= took2;
                    available2 -= took2;
                    side2_growth += took2;
                }
            }
            GrowthStrategy::Side1Only => side1_growth = missing,
            GrowthStrategy::Side2Only => side2_growth = missing,
        }

        if side1_growth > 0 || side2_growth > 0 {
            self.shrink_neighbours(container, index, sizes, side1_growth, side2_growth, squeeze);
        }
    }

    /// Shrink the entries on each side of `index` by the given totals.
    pub(crate) fn shrink_neighbours(
        &mut self,
        container: ItemId,
        index: usize,
        sizes: &mut [SizingInfo],
        side1_amount: i32,
        side2_amount: i32,
        strategy: NeighbourSqueezeStrategy,
    ) {
        debug_assert!(side1_amount > 0 || side2_amount > 0);
        debug_assert!(side1_amount >= 0 && side2_amount >= 0);
        let o = self.orientation(container);

        if side1_amount > 0 {
            // Walk from the immediate neighbour outwards, which for the
            // side-1 run means starting at the end of the slice.
            let reversed = strategy == NeighbourSqueezeStrategy::ImmediateNeighboursFirst;
            let squeezes =
                self.calculate_squeezes(&sizes[..index], side1_amount, strategy, reversed, o);
            for (i, squeeze) in squeezes.into_iter().enumerate() {
                sizes[i].increment_length(-squeeze, o);
            }
        }

        if side2_amount > 0 {
            let squeezes =
                self.calculate_squeezes(&sizes[index + 1..], side2_amount, strategy, false, o);
            for (i, squeeze) in squeezes.into_iter().enumerate() {
                sizes[index + 1 + i].increment_length(-squeeze, o);
            }
        }
    }

    /// How much each donor gives up to cover `needed`.
    ///
    /// `AllNeighbours` spreads the squeeze proportionally over everyone with
    /// availability; `ImmediateNeighboursFirst` drains donors one by one
    /// (`reversed` walks the run from its far end, i.e. from the immediate
    /// neighbour when the run sits on side 1).
    pub(crate) fn calculate_squeezes(
        &self,
        donors: &[SizingInfo],
        needed: i32,
        strategy: NeighbourSqueezeStrategy,
        reversed: bool,
        o: Orientation,
    ) -> Vec<i32> {
        let mut availabilities: Vec<i32> = donors.iter().map(|d| d.available_length(o)).collect();
        let count = availabilities.len();
        let mut squeezes = vec![0; count];
        let mut missing = needed;

        match strategy {
            NeighbourSqueezeStrategy::AllNeighbours => {
                while missing > 0 {
                    let num_donors = availabilities.iter().filter(|&&a| a > 0).count() as i32;
                    if num_donors == 0 {
                        warn!(missing, "no donors left\n{}", self.dump_layout());
                        debug_assert!(false, "squeeze ran out of donors");
                        return squeezes;
                    }

                    let mut to_take = missing / num_donors;
                    if to_take == 0 {
                        to_take = missing;
                    }

                    for i in 0..count {
                        let available = availabilities[i];
                        if available == 0 {
                            continue;
                        }
                        let took = missing.min(to_take.min(available));
                        availabilities[i] -= took;
                        missing -= took;
                        squeezes[i] += took;
                        if missing == 0 {
                            break;
                        }
                    }
                }
            }
            NeighbourSqueezeStrategy::ImmediateNeighboursFirst => {
                for i in 0..count {
                    let index = if reversed { count - 1 - i } else { i };
                    let available = availabilities[index];
                    if available > 0 {
                        let took = missing.min(available);
                        missing -= took;
                        squeezes[index] += took;
                    }
                    if missing == 0 {
                        break;
                    }
                }
            }
        }

        if missing < 0 {
            warn!(missing, "squeeze overshot");
        }

        squeezes
    }

    // --- applying buffers ---------------------------------------------------

    /// Apply a working buffer's sizes to the real children, then position
    /// everything and re-derive separators.
    pub(crate) fn apply_geometries(
        &mut self,
        container: ItemId,
        sizes: &[SizingInfo],
        strategy: ChildrenResizeStrategy,
    ) {
        let items = self.visible_children(container, false);
        debug_assert_eq!(items.len(), sizes.len());
        for (i, &item) in items.iter().enumerate() {
            self.set_size_recursive_with(item, sizes[i].size(), strategy);
        }
        self.position_items(container);
    }

    /// Sequentially position the visible children and refresh separators.
    pub(crate) fn position_items(&mut self, container: ItemId) {
        let mut sizes = self.collect_sizes(container, false);
        self.position_items_buf(container, &mut sizes);
        self.apply_positions(container, &sizes);
        self.update_separators_recursive(container);
    }

    /// Lay the buffer entries out along the axis with separator gaps; across
    /// the axis they span the container from 0.
    pub(crate) fn position_items_buf(&mut self, container: ItemId, sizes: &mut [SizingInfo]) {
        let o = self.orientation(container);
        let opposite = o.opposite();
        let opposite_length = self.length_of(container, opposite);
        let st = self.separator_thickness;

        let mut next_pos = 0;
        for sizing in sizes.iter_mut() {
            if sizing.is_being_inserted {
                next_pos += st;
                continue;
            }

            sizing.set_length(opposite_length, opposite);
            sizing.set_pos(0, opposite);
            sizing.set_pos(next_pos, o);
            next_pos += sizing.length(o) + st;
        }
    }

    /// Push buffer positions and opposite-axis lengths onto the real nodes.
    pub(crate) fn apply_positions(&mut self, container: ItemId, sizes: &[SizingInfo]) {
        let items = self.visible_children(container, false);
        debug_assert_eq!(items.len(), sizes.len());
        let opposite = self.orientation(container).opposite();

        for (i, &item) in items.iter().enumerate() {
            let sizing = &sizes[i];
            if sizing.is_being_inserted {
                continue;
            }
            self.set_length_recursive(item, sizing.length(opposite), opposite);
            self.set_pos(item, sizing.geometry.top_left());
        }
    }

    // --- resize -------------------------------------------------------------

    /// Resize the whole tree. The new size must honour the root's minimum.
    pub fn set_size_recursive(&mut self, new_size: Size, strategy: ChildrenResizeStrategy) {
        self.set_size_recursive_with(self.root, new_size, strategy);
        self.finish_mutation();
    }

    /// Resize any node; containers re-lay their children in three phases:
    /// resize per `strategy`, position, then fix whoever fell below its
    /// minimum.
    pub(crate) fn set_size_recursive_with(
        &mut self,
        id: ItemId,
        new_size: Size,
        strategy: ChildrenResizeStrategy,
    ) {
        if !self.node(id).is_container() {
            self.set_size(id, new_size);
            return;
        }

        let min = self.min_size(id);
        if new_size.width < min.width || new_size.height < min.height {
            warn!(
                ?new_size,
                ?min,
                "new size doesn't respect size constraints\n{}",
                self.dump_layout()
            );
            return;
        }
        let old_size = self.size_of(id);
        if new_size == old_size {
            return;
        }

        // Percentages must not be recomputed from intermediate geometries.
        let was_blocked = {
            let state = self.container_state_mut(id);
            let prev = state.block_update_percentages;
            state.block_update_percentages = true;
            prev
        };

        self.set_size(id, new_size);

        let mut sizes = self.collect_sizes(id, false);

        // #1 resize the children in the working buffer.
        self.resize_children(id, old_size, new_size, &mut sizes, strategy);

        // ... and position them so availabilities line up for #2.
        self.position_items_buf(id, &mut sizes);

        // #2 give every child at least its minimum back.
        let o = self.orientation(id);
        for i in 0..sizes.len() {
            let missing = sizes[i].missing_length(o);
            if missing > 0 {
                self.grow_item_in(
                    id,
                    i,
                    &mut sizes,
                    missing,
                    GrowthStrategy::BothSidesEqually,
                    NeighbourSqueezeStrategy::AllNeighbours,
                    false,
                );
            }
        }

        // #3 sizes are now correct; apply them to the real nodes.
        self.apply_geometries(id, &sizes, strategy);

        self.container_state_mut(id).block_update_percentages = was_blocked;
    }

    /// Move and resize a node in one go.
    pub fn set_geometry_recursive(&mut self, id: ItemId, rect: Rect) {
        if !self.node(id).is_container() {
            self.set_geometry(id, rect);
            return;
        }
        self.set_pos(id, rect.top_left());
        self.set_size_recursive_with(id, rect.size(), ChildrenResizeStrategy::Percentage);
    }

    /// Resize one axis of a node.
    pub(crate) fn set_length_recursive(&mut self, id: ItemId, length: i32, o: Orientation) {
        if self.node(id).is_container() {
            let mut size = self.size_of(id);
            match o {
                Orientation::Vertical => size.height = length,
                Orientation::Horizontal => size.width = length,
            }
            self.set_size_recursive_with(id, size, ChildrenResizeStrategy::Percentage);
        } else {
            self.set_length(id, length, o);
        }
    }

    /// Distribute a container resize over the working buffer.
    pub(crate) fn resize_children(
        &mut self,
        container: ItemId,
        old_size: Size,
        new_size: Size,
        sizes: &mut [SizingInfo],
        strategy: ChildrenResizeStrategy,
    ) {
        let o = self.orientation(container);
        let count = sizes.len();

        match strategy {
            ChildrenResizeStrategy::Percentage => {
                // Each child keeps its relative share of the usable length;
                // the last child absorbs the rounding.
                let percentages = self.child_percentages(container);
                debug_assert_eq!(percentages.len(), count);
                let width_changed = old_size.width != new_size.width;
                let height_changed = old_size.height != new_size.height;
                let length_changed = match o {
                    Orientation::Vertical => height_changed,
                    Orientation::Horizontal => width_changed,
                };
                let total_new_length = self.usable_length(container);
                let container_size = self.size_of(container);

                let mut remaining = total_new_length;
                for i in 0..count {
                    let is_last = i == count - 1;
                    let new_item_length = if length_changed {
                        if is_last {
                            remaining
                        } else {
                            (percentages[i] * f64::from(total_new_length)) as i32
                        }
                    } else {
                        sizes[i].length(o)
                    };

                    if new_item_length <= 0 {
                        warn!(
                            new_item_length,
                            "invalid resize\n{}",
                            self.dump_layout()
                        );
                        debug_assert!(false, "resize produced a non-positive length");
                        return;
                    }

                    remaining -= new_item_length;
                    match o {
                        Orientation::Vertical => {
                            sizes[i].set_size(Size::new(container_size.width, new_item_length));
                        }
                        Orientation::Horizontal => {
                            sizes[i].set_size(Size::new(new_item_length, container_size.height));
                        }
                    }
                }
            }
            ChildrenResizeStrategy::Side1SeparatorMove
            | ChildrenResizeStrategy::Side2SeparatorMove => {
                let delta = length_along(new_size - old_size, o);
                let is_growing = delta > 0;
                let mut remaining = delta.abs();

                // When growing, the side opposite the moving separator
                // absorbs the new space; when shrinking, the side holding
                // the separator gives it up. Both orders leave the
                // children nearest a propagated drag pinned where the user
                // put them.
                let resize_head_first = strategy == ChildrenResizeStrategy::Side2SeparatorMove;

                for i in 0..count {
                    let index = if resize_head_first { i } else { count - 1 - i };
                    if is_growing {
                        // Max sizes are advisory, so the first child can
                        // take everything.
                        sizes[index].increment_length(remaining, o);
                        remaining = 0;
                    } else {
                        let available = sizes[index].available_length(o);
                        let took = available.min(remaining);
                        sizes[index].increment_length(-took, o);
                        remaining -= took;
                    }
                    if remaining == 0 {
                        break;
                    }
                }
            }
        }
    }

    // --- percentages --------------------------------------------------------

    /// Stored shares of the visible, settled children.
    #[must_use]
    pub fn child_percentages(&self, container: ItemId) -> Vec<f64> {
        let Some((state, _)) = self.node(container).container() else {
            return Vec::new();
        };
        state
            .children
            .iter()
            .filter(|&&c| self.is_visible(c, false) && !self.node(c).sizing.is_being_inserted)
            .map(|&c| self.node(c).sizing.percentage_within_parent)
            .collect()
    }

    /// Refresh every child's `percentage_within_parent` from the current
    /// geometry.
    pub(crate) fn update_child_percentages(&mut self, container: ItemId) {
        let Some((state, _)) = self.node(container).container() else {
            return;
        };
        if state.block_update_percentages {
            return;
        }

        let o = self.orientation(container);
        let usable = self.usable_length(container);
        let children: Vec<ItemId> = state.children.clone();
        for child in children {
            let settled =
                self.is_visible(child, false) && !self.node(child).sizing.is_being_inserted;
            let percentage = if settled && usable > 0 {
                f64::from(self.length_of(child, o)) / f64::from(usable)
            } else {
                0.0
            };
            self.node_mut(child).sizing.percentage_within_parent = percentage;

            if settled && (percentage.abs() < 1e-9 || percentage > 1.0) {
                warn!(percentage, ?child, "invalid percentage\n{}", self.dump_layout());
            }
        }
    }

    pub(crate) fn update_child_percentages_recursive(&mut self, container: ItemId) {
        self.update_child_percentages(container);
        let Some((state, _)) = self.node(container).container() else {
            return;
        };
        for child in state.children.clone() {
            if self.node(child).is_container() {
                self.update_child_percentages_recursive(child);
            }
        }
    }

    // --- separators ---------------------------------------------------------

    /// The container's separators, in layout order.
    #[must_use]
    pub fn separators(&self, container: ItemId) -> &[Separator] {
        self.node(container)
            .container()
            .map_or(&[][..], |(state, _)| state.separators.as_slice())
    }

    /// Every separator of the subtree.
    #[must_use]
    pub fn separators_recursive(&self, container: ItemId) -> Vec<Separator> {
        let Some((state, _)) = self.node(container).container() else {
            return Vec::new();
        };
        let mut out = state.separators.clone();
        for &child in &state.children {
            out.extend(self.separators_recursive(child));
        }
        out
    }

    pub(crate) fn find_separator(&self, separator: SeparatorId) -> Option<(ItemId, usize)> {
        for (&id, item) in &self.nodes {
            if let Some((state, _)) = item.container()
                && let Some(index) = state.separators.iter().position(|s| s.id == separator)
            {
                return Some((id, index));
            }
        }
        None
    }

    /// Root-coordinate positions every separator of this container must sit
    /// at: one per visible child except the last, at its trailing edge.
    pub(crate) fn required_separator_positions(&self, container: ItemId) -> Vec<i32> {
        let o = self.orientation(container);
        let num_separators = self.num_visible_children(container).saturating_sub(1);
        let Some((state, _)) = self.node(container).container() else {
            return Vec::new();
        };

        let mut positions = Vec::with_capacity(num_separators);
        for &child in &state.children {
            if positions.len() == num_separators {
                break;
            }
            if self.is_visible(child, false) {
                let sizing = &self.node(child).sizing;
                let local = sizing.position(o) + sizing.length(o);
                positions.push(self.map_to_root_coord(container, local, o));
            }
        }
        positions
    }

    /// Re-derive this container's separators from the current geometry.
    ///
    /// When the count changes, existing separators are reconciled by
    /// position rather than index: one already at a wanted position keeps
    /// its identity, surplus ones are dropped and missing ones created.
    pub(crate) fn update_separators(&mut self, container: ItemId) {
        let positions = self.required_separator_positions(container);
        let o = self.orientation(container);
        let strip_orientation = o.opposite();
        let origin = self.map_to_root(container, Point::new(0, 0));
        let opposite_pos = match o {
            Orientation::Vertical => origin.x,
            Orientation::Horizontal => origin.y,
        };
        let opposite_length = self.opposite_length(container);
        let thickness = self.separator_thickness;

        let current_count = self
            .node(container)
            .container()
            .map_or(0, |(state, _)| state.separators.len());

        if positions.len() != current_count {
            let mut pool = std::mem::take(&mut self.container_state_mut(container).separators);
            let mut separators = Vec::with_capacity(positions.len());
            for &position in &positions {
                let separator = if let Some(i) = pool.iter().position(|s| s.position == position) {
                    pool.remove(i)
                } else {
                    let id = self.next_separator_id;
                    self.next_separator_id = self.next_separator_id.next();
                    Separator {
                        id,
                        orientation: strip_orientation,
                        position,
                        geometry: Rect::default(),
                    }
                };
                separators.push(separator);
            }
            self.container_state_mut(container).separators = separators;
        }

        let state = self.container_state_mut(container);
        for (separator, &position) in state.separators.iter_mut().zip(&positions) {
            separator.orientation = strip_orientation;
            separator.set_geometry(position, opposite_pos, opposite_length, thickness);
        }

        self.update_child_percentages(container);
    }

    /// Refresh separators of this container and every visible descendant.
    pub(crate) fn update_separators_recursive(&mut self, container: ItemId) {
        if !self.node(container).is_container() {
            return;
        }
        self.update_separators(container);
        for child in self.visible_children(container, false) {
            if self.node(child).is_container() {
                self.update_separators_recursive(child);
            }
        }
    }

    /// The separator bordering `item` on `side` along `o`, looked up through
    /// the ancestors when this container's axis doesn't match.
    pub(crate) fn neighbour_separator(
        &self,
        container: ItemId,
        item: ItemId,
        side: Side,
        o: Orientation,
    ) -> Option<SeparatorId> {
        let children = self.visible_children(container, false);
        let Some(index) = children.iter().position(|&c| c == item) else {
            warn!(?item, "item not found\n{}", self.dump_layout());
            return None;
        };

        if o != self.orientation(container) {
            return match self.node(container).parent {
                None => None,
                Some(parent) => self.neighbour_separator(parent, container, side, o),
            };
        }

        let separator_index = match side {
            Side::Side1 => index.checked_sub(1)?,
            Side::Side2 => index,
        };
        let (state, _) = self.node(container).container()?;
        match state.separators.get(separator_index) {
            Some(separator) => Some(separator.id),
            // The edge of this container: the bordering separator, if any,
            // belongs to an ancestor.
            None => match self.node(container).parent {
                None => None,
                Some(parent) => self.neighbour_separator(parent, container, side, o),
            },
        }
    }

    /// Smallest root coordinate the separator can reach, limited by how much
    /// its side-2 neighbour can grow.
    #[must_use]
    pub fn min_pos_for_separator_global(&self, container: ItemId, index: usize) -> i32 {
        let children = self.visible_children(container, false);
        debug_assert!(index + 1 < children.len());
        let item = children[index + 1];
        let o = self.orientation(container);
        let available1 = self.available_on_side_recursive(container, item, Side::Side1, o);
        self.separators(container)[index].position - available1
    }

    /// Largest root coordinate the separator can reach.
    #[must_use]
    pub fn max_pos_for_separator_global(&self, container: ItemId, index: usize) -> i32 {
        let children = self.visible_children(container, false);
        debug_assert!(index < children.len());
        let item = children[index];
        let o = self.orientation(container);
        let available2 = self.available_on_side_recursive(container, item, Side::Side2, o);
        self.separators(container)[index].position + available2
    }

    /// `min_pos_for_separator_global` in this container's coordinates.
    #[must_use]
    pub fn min_pos_for_separator(&self, container: ItemId, index: usize) -> i32 {
        let global = self.min_pos_for_separator_global(container, index);
        self.map_from_root_coord(container, global, self.orientation(container))
    }

    /// `max_pos_for_separator_global` in this container's coordinates.
    #[must_use]
    pub fn max_pos_for_separator(&self, container: ItemId, index: usize) -> i32 {
        let global = self.max_pos_for_separator_global(container, index);
        self.map_from_root_coord(container, global, self.orientation(container))
    }

    // --- separator dragging --------------------------------------------------

    /// Drag `separator` by `delta` pixels (negative toward side 1).
    ///
    /// The delta is clamped to what the tree can absorb; the immediate
    /// neighbours take as much as they can and the remainder propagates to
    /// the next same-orientation separator up the tree.
    pub fn request_separator_move(&mut self, separator: SeparatorId, delta: i32) {
        let Some((container, index)) = self.find_separator(separator) else {
            warn!(?separator, "unknown separator\n{}", self.dump_layout());
            return;
        };
        self.request_separator_move_in(container, index, delta);
        self.finish_mutation();
    }

    fn request_separator_move_in(&mut self, container: ItemId, index: usize, delta: i32) {
        if delta == 0 {
            return;
        }

        let children = self.visible_children(container, false);
        if children.len() <= index + 1 {
            warn!(index, "not enough children for separator\n{}", self.dump_layout());
            return;
        }

        let pos = self.separators(container)[index].position;
        let min = self.min_pos_for_separator_global(container, index);
        let max = self.max_pos_for_separator_global(container, index);

        let clamped_pos = (pos + delta).clamp(min, max);
        if clamped_pos != pos + delta {
            warn!(delta, min, max, "separator move clamped to its bounds");
        }
        let delta = clamped_pos - pos;
        if delta == 0 {
            return;
        }

        let move_direction = if delta < 0 { Side::Side1 } else { Side::Side2 };
        let mut remaining_to_take = delta.abs();
        let took_locally;

        match move_direction {
            Side::Side1 => {
                // Separator moving left/up: its side-2 neighbour grows.
                let side2_neighbour = children[index + 1];
                let available1 = self.available_on_side(container, side2_neighbour, Side::Side1);
                took_locally = available1.min(remaining_to_take);
                if took_locally != 0 {
                    self.grow_item(
                        side2_neighbour,
                        took_locally,
                        GrowthStrategy::Side1Only,
                        NeighbourSqueezeStrategy::ImmediateNeighboursFirst,
                        false,
                        ChildrenResizeStrategy::Side1SeparatorMove,
                    );
                }
            }
            Side::Side2 => {
                // Separator moving right/down: its side-1 neighbour grows.
                let side1_neighbour = children[index];
                let available2 = self.available_on_side(container, side1_neighbour, Side::Side2);
                took_locally = available2.min(remaining_to_take);
                if took_locally != 0 {
                    self.grow_item(
                        side1_neighbour,
                        took_locally,
                        GrowthStrategy::Side2Only,
                        NeighbourSqueezeStrategy::ImmediateNeighboursFirst,
                        false,
                        ChildrenResizeStrategy::Side2SeparatorMove,
                    );
                }
            }
        }

        remaining_to_take -= took_locally;
        if remaining_to_take > 0 {
            if self.is_root(container) {
                warn!(remaining_to_take, "not enough space to move separator");
                return;
            }
            let o = self.orientation(container);
            let Some(parent) = self.node(container).parent else {
                return;
            };
            let Some(next) = self.neighbour_separator(parent, container, move_direction, o) else {
                warn!(remaining_to_take, "no separator to propagate the move to");
                return;
            };
            let Some((owner, owner_index)) = self.find_separator(next) else {
                return;
            };
            let remaining_delta = match move_direction {
                Side::Side1 => -remaining_to_take,
                Side::Side2 => remaining_to_take,
            };
            self.request_separator_move_in(owner, owner_index, remaining_delta);
        }
    }

    /// Move `separator` so its two neighbours end up (nearly) the same
    /// length; a 1px difference is left alone since it can't be split.
    pub fn request_equal_size(&mut self, separator: SeparatorId) {
        let Some((container, index)) = self.find_separator(separator) else {
            warn!(?separator, "unknown separator");
            return;
        };

        let children = self.visible_children(container, false);
        if children.len() <= index + 1 {
            warn!(index, "not enough children for separator");
            return;
        }

        let o = self.orientation(container);
        let length1 = self.length_of(children[index], o);
        let length2 = self.length_of(children[index + 1], o);
        if (length1 - length2).abs() <= 1 {
            return;
        }

        let new_length = (length1 + length2) / 2;
        let mut delta = 0;
        if length1 < new_length {
            // Move the separator toward side 2.
            delta = new_length - length1;
        } else if length2 < new_length {
            // Or toward side 1.
            delta = -(new_length - length2);
        }

        let pos = self.separators(container)[index].position;
        let min = self.min_pos_for_separator_global(container, index);
        let max = self.max_pos_for_separator_global(container, index);
        delta = (pos + delta).clamp(min, max) - pos;

        if delta != 0 {
            self.request_separator_move_in(container, index, delta);
        }
        self.finish_mutation();
    }

    // --- drop rect preview ----------------------------------------------------

    /// The rectangle `candidate` would occupy if dropped at `loc` relative
    /// to `relative_to` (or to the whole window when `None`).
    ///
    /// Computed by round-tripping the tree through its snapshot into a
    /// hostless clone and performing the insertion there, so the answer is
    /// exactly what a real drop would produce. Falls back to plain geometry
    /// carving when the window would have to grow.
    #[must_use]
    pub fn suggested_drop_rect(
        &self,
        candidate: &DropCandidate,
        relative_to: Option<ItemId>,
        loc: Location,
    ) -> Rect {
        let relative_to = relative_to.filter(|&r| !self.is_root(r));
        if let Some(rel) = relative_to {
            if !self.nodes.contains_key(&rel) || self.node(rel).parent.is_none() {
                warn!(?rel, "relative-to item is not in the tree");
                return Rect::default();
            }
            if !self.is_visible(rel, false) {
                warn!(?rel, "relative-to item isn't visible");
                return Rect::default();
            }
        }

        let available = self.available_size(self.root);
        let min = candidate.min_size;
        let is_empty = !self.has_visible_children(self.root, false);
        let extra_width = if is_empty || loc.is_vertical() {
            0
        } else {
            self.separator_thickness
        };
        let extra_height = if is_empty || !loc.is_vertical() {
            0
        } else {
            self.separator_thickness
        };
        let window_needs_growing = available.width < min.width + extra_width
            || available.height < min.height + extra_height;
        if window_needs_growing {
            return self.suggested_drop_rect_fallback(candidate, relative_to, loc);
        }

        let serialized = self.to_variant_map();
        let mut copy = ItemTree::new();
        copy.separator_thickness = self.separator_thickness;
        if let Err(err) = copy.fill_from_variant_map(serialized, &Default::default()) {
            warn!(%err, "could not clone the layout for previewing");
            return self.suggested_drop_rect_fallback(candidate, relative_to, loc);
        }

        let relative_copy =
            relative_to.and_then(|rel| copy.item_from_path(&self.path_from_root(rel)));

        let item_copy = copy.new_leaf();
        {
            let sizing = &mut copy.node_mut(item_copy).sizing;
            sizing.geometry = Rect::from_size(candidate.size);
            sizing.min_size = candidate.min_size;
        }

        match relative_copy {
            Some(rel) => {
                copy.insert_item_relative(item_copy, rel, loc, DefaultSizeMode::FairButFloor);
            }
            None => {
                let root = copy.root();
                copy.insert_item(
                    root,
                    item_copy,
                    loc,
                    DefaultSizeMode::FairButFloor,
                    AddingOption::None,
                );
            }
        }

        if copy.size_of(copy.root()) != self.size_of(self.root) {
            // Doesn't happen; the growth check above should have caught it.
            warn!("the layout clone grew during preview");
            return self.suggested_drop_rect_fallback(candidate, relative_to, loc);
        }

        copy.map_to_root_rect(item_copy, copy.rect_of(item_copy))
    }

    fn suggested_drop_rect_fallback(
        &self,
        candidate: &DropCandidate,
        relative_to: Option<ItemId>,
        loc: Location,
    ) -> Rect {
        if let Some(rel) = relative_to {
            // Carve half of the anchor toward the chosen side.
            let rel_geo = self.node(rel).sizing.geometry;
            let loc_orientation = loc.orientation();
            let suggested_length = self.length_of(rel, loc_orientation) / 2;
            let suggested_pos = match loc {
                Location::Left => rel_geo.x,
                Location::Top => rel_geo.y,
                Location::Right => rel_geo.right() - suggested_length,
                Location::Bottom => rel_geo.bottom() - suggested_length,
            };

            let rect = match loc_orientation {
                Orientation::Vertical => {
                    Rect::new(rel_geo.x, suggested_pos, rel_geo.width, suggested_length)
                }
                Orientation::Horizontal => {
                    Rect::new(suggested_pos, rel_geo.y, suggested_length, rel_geo.height)
                }
            };

            let parent = self.node(rel).parent.unwrap_or(self.root);
            return self.map_to_root_rect(parent, rect);
        }

        // Relative to the window itself: carve from the chosen edge.
        let root = self.root;
        let o = self.orientation(root);
        let item_min = length_along(candidate.min_size, o);
        let available = self.available_length(root) - self.separator_thickness;
        let one_third = self.container_length(root) / 3;
        let suggested_length = item_min.max(available.min(one_third));

        let mut rect = self.rect_of(root);
        match loc {
            Location::Left => rect.width = suggested_length,
            Location::Top => rect.height = suggested_length,
            Location::Right => {
                rect.x = rect.width - suggested_length;
                rect.width = suggested_length;
            }
            Location::Bottom => {
                rect.y = rect.height - suggested_length;
                rect.height = suggested_length;
            }
        }
        rect
    }
}
