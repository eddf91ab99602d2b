#![forbid(unsafe_code)]

//! Multi-splitter layout tree for dockable panels.
//!
//! This crate implements the layout core of a docking system: a recursive
//! tree of containers whose leaves host opaque guest surfaces. Containers lay
//! their visible children out along one axis, separated by fixed-thickness
//! separators, and guarantee that:
//!
//! - every visible leaf keeps at least its minimum size,
//! - children tile their container exactly (no gaps, no overlaps),
//! - relative proportions survive resizes,
//! - separator drags are absorbed locally and propagate up the tree only
//!   when the immediate neighbours are exhausted.
//!
//! The tree is an arena: [`ItemTree`] owns every node in a map keyed by
//! [`ItemId`], children are ordered id lists and parent links are plain ids,
//! so no shared-ownership primitives are involved. Hosts integrate through
//! the [`Host`] trait and the [`LayoutEvent`] observer; see the module docs
//! of [`tree`] for the mutation entry points.

pub mod event;
pub mod host;
pub mod item;
pub mod sanity;
pub mod sizing;
pub mod snapshot;
pub mod tree;

mod layout;

pub use event::LayoutEvent;
pub use host::Host;
pub use item::{ItemId, ItemKind, Separator, SeparatorId};
pub use quay_core::{Point, Rect, Size};
pub use sizing::{LengthOnSide, SizingInfo};
pub use layout::DropCandidate;
pub use snapshot::SnapshotError;
pub use tree::ItemTree;

use serde::{Deserialize, Serialize};

/// Default thickness of a separator, in pixels.
pub const SEPARATOR_THICKNESS: i32 = 5;

/// No guest can report a minimum size smaller than this.
pub const HARD_MIN_SIZE: Size = Size::new(80, 90);

/// Advisory upper bound for item sizes. Stored and serialized, never
/// enforced during layout.
pub const HARD_MAX_SIZE: Size = Size::new(16_777_215, 16_777_215);

/// The axis along which a container lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The perpendicular axis.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Docking location relative to an anchor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Left,
    Top,
    Right,
    Bottom,
}

impl Location {
    /// The container orientation required to honour this location.
    #[inline]
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Location::Left | Location::Right => Orientation::Horizontal,
            Location::Top | Location::Bottom => Orientation::Vertical,
        }
    }

    /// The side of the anchor the new item lands on.
    #[inline]
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Location::Left | Location::Top => Side::Side1,
            Location::Right | Location::Bottom => Side::Side2,
        }
    }

    /// True for `Top`/`Bottom`.
    #[inline]
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Location::Top | Location::Bottom)
    }
}

/// The low-coordinate side (`Side1` = left or top) or the high-coordinate
/// side (`Side2` = right or bottom) of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Side1,
    Side2,
}

/// How a growing item distributes the space it steals between its two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStrategy {
    BothSidesEqually,
    Side1Only,
    Side2Only,
}

/// How the squeeze is distributed between the neighbours that donate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighbourSqueezeStrategy {
    /// The squeeze is spread between all neighbours, not just immediate ones.
    AllNeighbours,
    /// The first neighbour takes as much squeeze as it can, only then the
    /// next neighbour is squeezed, and so forth.
    ImmediateNeighboursFirst,
}

/// How a container distributes a size change among its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenResizeStrategy {
    /// Every child keeps its percentage of the container.
    Percentage,
    /// The container is resizing because the separator on its side-1 edge
    /// moved; children nearest that edge absorb the change first.
    Side1SeparatorMove,
    /// Same, for the side-2 edge.
    Side2SeparatorMove,
}

/// How to pick a length for an item being added to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSizeMode {
    /// Use the item's current length. The actually used length may be
    /// smaller if the layout is not big enough.
    ItemSize,
    /// Give the item an equal share alongside the existing children.
    Fair,
    /// Equal to `Fair`, but an item already smaller than the fair share
    /// keeps its small length.
    FairButFloor,
    /// Reserved: would use the guest's size policy. Not implemented.
    SizePolicy,
    /// Don't do any sizing.
    None,
}

/// Options applied while adding an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddingOption {
    #[default]
    None,
    /// Insert as a hidden placeholder; no space is carved out until the
    /// item is restored.
    StartHidden,
}

/// Length of `size` along `o`.
#[inline]
#[must_use]
pub(crate) const fn length_along(size: Size, o: Orientation) -> i32 {
    match o {
        Orientation::Horizontal => size.width,
        Orientation::Vertical => size.height,
    }
}

/// Coordinate of `p` along `o`.
#[inline]
#[must_use]
pub(crate) const fn pos_along(p: Point, o: Orientation) -> i32 {
    match o {
        Orientation::Horizontal => p.x,
        Orientation::Vertical => p.y,
    }
}
