//! Arena records: items, containers and separators.

use quay_core::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::{Orientation, SizingInfo};

/// Stable identifier for tree nodes.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Lowest valid item ID; the root container of a fresh tree.
    pub const MIN: Self = Self(1);

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Stable identifier for separators.
///
/// Separator records are re-derived after every layout change; ids let the
/// reconciliation keep the identity of a separator that stays at the same
/// position, so hosts can track handles across re-layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeparatorId(u64);

impl SeparatorId {
    pub const MIN: Self = Self(1);

    /// Raw numeric value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// The divider between two adjacent visible children of a container.
///
/// Owned by its container. `position` is the coordinate of the strip along
/// the container's layout axis, in root coordinates; `geometry` is the full
/// strip rectangle in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separator {
    pub id: SeparatorId,
    /// The strip's long axis: opposite to the owning container's layout axis.
    pub orientation: Orientation,
    /// Root coordinate along the owning container's layout axis.
    pub position: i32,
    /// Full strip rectangle in root coordinates.
    pub geometry: Rect,
}

impl Separator {
    /// Lay the strip at `position` along the container axis, `opposite_pos`
    /// across it, spanning `opposite_length` with `thickness`.
    pub(crate) fn set_geometry(
        &mut self,
        position: i32,
        opposite_pos: i32,
        opposite_length: i32,
        thickness: i32,
    ) {
        self.position = position;
        self.geometry = match self.orientation {
            // Horizontal strip: separates vertically stacked children.
            Orientation::Horizontal => {
                Rect::new(opposite_pos, position, opposite_length, thickness)
            }
            // Vertical strip: separates side-by-side children.
            Orientation::Vertical => Rect::new(position, opposite_pos, thickness, opposite_length),
        };
    }
}

/// Container-only state.
#[derive(Debug, Clone, Default)]
pub struct ContainerState {
    pub children: Vec<ItemId>,
    pub separators: Vec<Separator>,
    /// Set while a leaf is being wrapped into a sub-container; suppresses
    /// the space-carving normally done on child insertion.
    pub converting_child_to_container: bool,
    /// Set while this container is being rebuilt from a snapshot.
    pub deserializing: bool,
    /// Set while a resize is in flight so percentages are not recomputed
    /// from intermediate geometries.
    pub block_update_percentages: bool,
}

/// Payload distinguishing leaves from containers.
#[derive(Debug, Clone)]
pub enum ItemKind {
    /// A leaf hosting at most one guest surface, identified by an opaque
    /// key the host resolves.
    Leaf { guest: Option<String> },
    /// An interior node laying its children out along `orientation`.
    Container {
        orientation: Orientation,
        state: ContainerState,
    },
}

/// One node of the layout tree.
#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) parent: Option<ItemId>,
    pub(crate) sizing: SizingInfo,
    pub(crate) visible: bool,
    pub(crate) ref_count: u32,
    pub(crate) name: String,
    pub(crate) kind: ItemKind,
}

impl Item {
    pub(crate) fn new_leaf(parent: Option<ItemId>) -> Self {
        Self {
            parent,
            sizing: SizingInfo::default(),
            visible: false,
            ref_count: 0,
            name: String::from("null"),
            kind: ItemKind::Leaf { guest: None },
        }
    }

    pub(crate) fn new_container(parent: Option<ItemId>, orientation: Orientation) -> Self {
        Self {
            parent,
            sizing: SizingInfo {
                // Containers have no intrinsic minimum; theirs is derived
                // from their visible children.
                min_size: Size::new(0, 0),
                ..SizingInfo::default()
            },
            visible: false,
            ref_count: 0,
            name: String::new(),
            kind: ItemKind::Container {
                orientation,
                state: ContainerState::default(),
            },
        }
    }

    /// Parent container, `None` for the root.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// Cached geometry and constraints.
    #[inline]
    #[must_use]
    pub const fn sizing(&self) -> &SizingInfo {
        &self.sizing
    }

    /// Reference count of the leaf (see `ItemTree::ref_item`).
    #[inline]
    #[must_use]
    pub const fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Object name used in dumps and serialization.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leaf/container payload.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &ItemKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.kind, ItemKind::Container { .. })
    }

    /// Guest key, for leaves holding one.
    #[must_use]
    pub fn guest(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Leaf { guest } => guest.as_deref(),
            ItemKind::Container { .. } => None,
        }
    }

    pub(crate) fn container(&self) -> Option<(&ContainerState, Orientation)> {
        match &self.kind {
            ItemKind::Container { orientation, state } => Some((state, *orientation)),
            ItemKind::Leaf { .. } => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut ContainerState> {
        match &mut self.kind {
            ItemKind::Container { state, .. } => Some(state),
            ItemKind::Leaf { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SEPARATOR_THICKNESS;

    #[test]
    fn item_id_ordering_and_next() {
        assert_eq!(ItemId::MIN.get(), 1);
        assert!(ItemId::MIN < ItemId::MIN.next());
    }

    #[test]
    fn separator_geometry_vertical_strip() {
        let mut sep = Separator {
            id: SeparatorId::MIN,
            orientation: Orientation::Vertical,
            position: 0,
            geometry: Rect::default(),
        };
        sep.set_geometry(497, 0, 600, SEPARATOR_THICKNESS);
        assert_eq!(sep.position, 497);
        assert_eq!(sep.geometry, Rect::new(497, 0, SEPARATOR_THICKNESS, 600));
    }

    #[test]
    fn separator_geometry_horizontal_strip() {
        let mut sep = Separator {
            id: SeparatorId::MIN,
            orientation: Orientation::Horizontal,
            position: 0,
            geometry: Rect::default(),
        };
        sep.set_geometry(297, 502, 498, SEPARATOR_THICKNESS);
        assert_eq!(sep.geometry, Rect::new(502, 297, 498, SEPARATOR_THICKNESS));
    }

    #[test]
    fn leaf_and_container_records() {
        let leaf = Item::new_leaf(None);
        assert!(!leaf.is_container());
        assert_eq!(leaf.guest(), None);
        assert_eq!(leaf.name(), "null");

        let container = Item::new_container(Some(ItemId::MIN), Orientation::Horizontal);
        assert!(container.is_container());
        assert_eq!(container.sizing().min_size, Size::new(0, 0));
        let (state, orientation) = container.container().expect("container state");
        assert!(state.children.is_empty());
        assert_eq!(orientation, Orientation::Horizontal);
    }
}
