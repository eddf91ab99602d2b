//! The layout invariant oracle.
//!
//! `check_sanity` walks the tree and verifies every structural invariant:
//! minima honoured, children tiling their container exactly, percentages
//! summing to one, separators counted and positioned at the child edges and
//! inside their reachable bounds. Failures log the offending check together
//! with a full tree dump and return `false`; nothing is mutated.

use tracing::warn;

use crate::{ItemId, ItemTree, Orientation, pos_along};

const PERCENTAGE_TOLERANCE: f64 = 1e-6;

impl ItemTree {
    /// Verify the whole tree. Returns `true` when every invariant holds.
    pub fn check_sanity(&mut self) -> bool {
        self.check_sanity_scheduled = false;
        self.check_item_sanity(self.root)
    }

    fn check_item_sanity(&self, id: ItemId) -> bool {
        let item = self.node(id);
        let min = self.min_size(id);
        let size = item.sizing.size();
        if min.width > size.width || min.height > size.height {
            warn!(
                ?id,
                ?min,
                ?size,
                "size constraints not honoured\n{}",
                self.dump_layout()
            );
            return false;
        }

        let Some((state, orientation)) = item.container() else {
            return self.check_leaf_sanity(id);
        };

        if state.children.is_empty() && !self.is_root(id) {
            warn!(?id, "container is empty, should have been deleted");
            return false;
        }

        let opposite = orientation.opposite();
        let container_opposite_length = self.length_of(id, opposite);

        // Children tile the container: sequential along the axis with
        // separator gaps, full extent across it, inside our rect.
        let mut expected_pos = 0;
        for &child in &state.children {
            let child_item = self.node(child);
            if child_item.parent != Some(id) {
                warn!(?child, ?id, "invalid parent link");
                return false;
            }
            if !self.is_visible(child, false) {
                continue;
            }

            let pos = child_item.sizing.position(orientation);
            if pos != expected_pos {
                warn!(
                    ?child,
                    pos,
                    expected_pos,
                    "unexpected child position\n{}",
                    self.dump_layout()
                );
                return false;
            }
            expected_pos = pos + child_item.sizing.length(orientation) + self.separator_thickness;

            let child_opposite_length = child_item.sizing.length(opposite);
            if child_opposite_length != container_opposite_length {
                warn!(
                    ?child,
                    child_opposite_length,
                    container_opposite_length,
                    "child doesn't span the container\n{}",
                    self.dump_layout()
                );
                return false;
            }

            if !self.rect_of(id).contains_rect(&child_item.sizing.geometry) {
                warn!(
                    ?child,
                    geometry = ?child_item.sizing.geometry,
                    container = ?self.rect_of(id),
                    "child geometry out of bounds\n{}",
                    self.dump_layout()
                );
                return false;
            }
        }

        for &child in &state.children {
            if !self.check_item_sanity(child) {
                return false;
            }
        }

        let visible_children = self.visible_children(id, false);
        let is_empty_root = self.is_root(id) && visible_children.is_empty();
        if !is_empty_root {
            let mut occupied =
                (self.separator_thickness * (visible_children.len() as i32 - 1)).max(0);
            for &child in &visible_children {
                occupied += self.length_of(child, orientation);
            }
            if occupied != self.container_length(id) {
                warn!(
                    ?id,
                    occupied,
                    length = self.container_length(id),
                    "children don't add up to the container length\n{}",
                    self.dump_layout()
                );
                return false;
            }

            let total_percentage: f64 = self.child_percentages(id).iter().sum();
            let expected = if visible_children.is_empty() { 0.0 } else { 1.0 };
            if (total_percentage - expected).abs() > PERCENTAGE_TOLERANCE {
                warn!(
                    ?id,
                    total_percentage,
                    "percentages don't add up\n{}",
                    self.dump_layout()
                );
                return false;
            }
        }

        self.check_separator_sanity(id, orientation, &visible_children)
    }

    fn check_separator_sanity(
        &self,
        id: ItemId,
        orientation: Orientation,
        visible_children: &[ItemId],
    ) -> bool {
        let separators = self.separators(id);
        let expected_count = visible_children.len().saturating_sub(1);
        if separators.len() != expected_count {
            warn!(
                ?id,
                count = separators.len(),
                expected_count,
                "unexpected number of separators\n{}",
                self.dump_layout()
            );
            return false;
        }

        let opposite = orientation.opposite();
        let origin = self.map_to_root(id, quay_core::Point::new(0, 0));
        let expected_opposite_pos = pos_along(origin, opposite);
        let expected_thickness = self.separator_thickness;
        let expected_span = self.opposite_length(id);

        for (i, separator) in separators.iter().enumerate() {
            let child = visible_children[i];
            let sizing = &self.node(child).sizing;
            let expected_pos =
                self.map_to_root_coord(id, sizing.position(orientation) + sizing.length(orientation), orientation);

            if separator.position != expected_pos {
                warn!(
                    ?id,
                    position = separator.position,
                    expected_pos,
                    "unexpected separator position\n{}",
                    self.dump_layout()
                );
                return false;
            }

            let (span, thickness) = match orientation {
                Orientation::Vertical => (separator.geometry.width, separator.geometry.height),
                Orientation::Horizontal => (separator.geometry.height, separator.geometry.width),
            };
            if span != expected_span || thickness != expected_thickness {
                warn!(
                    ?id,
                    span,
                    thickness,
                    expected_span,
                    expected_thickness,
                    "unexpected separator geometry\n{}",
                    self.dump_layout()
                );
                return false;
            }

            let opposite_pos = pos_along(separator.geometry.top_left(), opposite);
            if opposite_pos != expected_opposite_pos {
                warn!(
                    ?id,
                    opposite_pos,
                    expected_opposite_pos,
                    "separator not aligned with its container\n{}",
                    self.dump_layout()
                );
                return false;
            }

            let min_pos = self.min_pos_for_separator_global(id, i);
            let max_pos = self.max_pos_for_separator_global(id, i);
            if separator.position < min_pos
                || separator.position > max_pos
                || min_pos <= 0
                || max_pos <= 0
            {
                warn!(
                    ?id,
                    position = separator.position,
                    min_pos,
                    max_pos,
                    "invalid bounds for separator\n{}",
                    self.dump_layout()
                );
                return false;
            }
        }

        true
    }

    /// Visibility consistency for a leaf: placeholders carry no guest and no
    /// layout share, visible leaves have a real geometry.
    fn check_leaf_sanity(&self, id: ItemId) -> bool {
        let item = self.node(id);
        if !self.is_visible(id, false) {
            if item.guest().is_some() {
                warn!(?id, "hidden leaf still holds a guest");
                return false;
            }
            if item.sizing.percentage_within_parent != 0.0 {
                warn!(
                    ?id,
                    percentage = item.sizing.percentage_within_parent,
                    "hidden leaf still has a layout share"
                );
                return false;
            }
        } else if item.parent.is_some() && item.sizing.geometry.is_empty() {
            warn!(?id, "visible leaf with an empty geometry\n{}", self.dump_layout());
            return false;
        }

        true
    }
}
