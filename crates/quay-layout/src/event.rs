//! Change notifications delivered to the host.

use crate::ItemId;

/// A change to the tree, delivered in order to the registered observer
/// before the mutating call returns.
///
/// The tree is the only emitter and the host the only intended observer;
/// observers must not assume they can re-enter the tree while a batch is
/// being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEvent {
    /// The node's x position changed.
    XChanged(ItemId),
    /// The node's y position changed.
    YChanged(ItemId),
    /// The node's width changed.
    WidthChanged(ItemId),
    /// The node's height changed.
    HeightChanged(ItemId),
    /// The node's geometry changed (always accompanies the per-component
    /// events above).
    GeometryChanged(ItemId),
    /// The node was shown or hidden.
    VisibleChanged(ItemId, bool),
    /// The node's minimum size changed.
    MinSizeChanged(ItemId),
    /// The container's child list changed.
    ItemsChanged(ItemId),
    /// A leaf entered or left the tree.
    NumItemsChanged,
    /// The number of visible children of the root changed.
    NumVisibleItemsChanged(usize),
}

/// Observer callback type; see [`crate::ItemTree::set_observer`].
pub type Observer = Box<dyn FnMut(&LayoutEvent)>;
