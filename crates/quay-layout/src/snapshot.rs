//! Key-value map serialization.
//!
//! A tree serializes to a nested map (`serde_json::Value`), one entry per
//! node:
//!
//! ```json
//! { "sizingInfo": { "geometry": {"x":0,"y":0,"width":497,"height":600},
//!                   "minSize": {"width":80,"height":90},
//!                   "maxSize": {"width":16777215,"height":16777215} },
//!   "isVisible": true, "isContainer": false, "objectName": "editor",
//!   "guestId": "editor" }
//! ```
//!
//! Containers additionally carry `"orientation"` (0 = horizontal,
//! 1 = vertical) and `"children"`. Percentages, separators and size
//! constraints are not serialized; they are recomputed after the tree is
//! rebuilt.

use std::collections::BTreeMap;
use std::fmt;

use quay_core::{Rect, Size};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::item::{Item, ItemKind};
use crate::{ItemId, ItemTree, LayoutEvent, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SizingSnapshot {
    geometry: Rect,
    #[serde(rename = "minSize")]
    min_size: Size,
    #[serde(rename = "maxSize")]
    max_size: Size,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ItemSnapshot {
    #[serde(rename = "sizingInfo")]
    sizing_info: SizingSnapshot,
    #[serde(rename = "isVisible")]
    is_visible: bool,
    #[serde(rename = "isContainer")]
    is_container: bool,
    #[serde(rename = "objectName", default)]
    object_name: String,
    #[serde(rename = "guestId", default, skip_serializing_if = "Option::is_none")]
    guest_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orientation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<ItemSnapshot>>,
}

/// Why a serialized map could not be turned back into a tree.
///
/// After an error the tree contents are unspecified; rebuild from a known
/// good snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// The value doesn't have the expected shape.
    Decode(serde_json::Error),
    /// The top-level entry must describe a container.
    RootMustBeContainer,
    /// A container entry carries no `"orientation"`.
    MissingOrientation,
    /// `"orientation"` is neither 0 (horizontal) nor 1 (vertical).
    InvalidOrientation(i32),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "malformed layout map: {err}"),
            Self::RootMustBeContainer => write!(f, "top-level entry must be a container"),
            Self::MissingOrientation => write!(f, "container entry without an orientation"),
            Self::InvalidOrientation(raw) => {
                write!(f, "orientation {raw} is out of range (expected 0 or 1)")
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

const ORIENTATION_HORIZONTAL: i32 = 0;
const ORIENTATION_VERTICAL: i32 = 1;

fn orientation_to_raw(o: Orientation) -> i32 {
    match o {
        Orientation::Horizontal => ORIENTATION_HORIZONTAL,
        Orientation::Vertical => ORIENTATION_VERTICAL,
    }
}

fn orientation_from_raw(raw: i32) -> Result<Orientation, SnapshotError> {
    match raw {
        ORIENTATION_HORIZONTAL => Ok(Orientation::Horizontal),
        ORIENTATION_VERTICAL => Ok(Orientation::Vertical),
        other => Err(SnapshotError::InvalidOrientation(other)),
    }
}

impl ItemTree {
    /// Serialize the whole tree to a nested key-value map.
    #[must_use]
    pub fn to_variant_map(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot_item(self.root)).unwrap_or(serde_json::Value::Null)
    }

    fn snapshot_item(&self, id: ItemId) -> ItemSnapshot {
        let item = self.node(id);
        let sizing_info = SizingSnapshot {
            geometry: item.sizing.geometry,
            min_size: item.sizing.min_size,
            max_size: item.sizing.max_size,
        };

        match item.container() {
            None => ItemSnapshot {
                sizing_info,
                is_visible: item.visible,
                is_container: false,
                object_name: item.name.clone(),
                guest_id: item.guest().map(str::to_owned),
                orientation: None,
                children: None,
            },
            Some((state, orientation)) => ItemSnapshot {
                sizing_info,
                is_visible: item.visible,
                is_container: true,
                object_name: item.name.clone(),
                guest_id: None,
                orientation: Some(orientation_to_raw(orientation)),
                children: Some(
                    state
                        .children
                        .iter()
                        .map(|&child| self.snapshot_item(child))
                        .collect(),
                ),
            },
        }
    }

    /// Rebuild the tree from a map produced by [`ItemTree::to_variant_map`].
    ///
    /// `guests` maps serialized `guestId`s to live guest keys; unresolved
    /// ids leave hidden placeholders (a warning is logged when a host is
    /// attached). Percentages, separators and size constraints are
    /// recomputed once the tree stands.
    pub fn fill_from_variant_map(
        &mut self,
        map: serde_json::Value,
        guests: &BTreeMap<String, String>,
    ) -> Result<(), SnapshotError> {
        let snapshot: ItemSnapshot = serde_json::from_value(map).map_err(SnapshotError::Decode)?;
        if !snapshot.is_container {
            return Err(SnapshotError::RootMustBeContainer);
        }

        // Start over from a single empty root, keeping the id counters
        // monotonic so stale ids never resurface.
        let root = self.root;
        self.nodes.clear();
        self.nodes
            .insert(root, Item::new_container(None, Orientation::Vertical));

        self.fill_item(root, &snapshot, guests)?;

        self.update_child_percentages_recursive(root);
        self.update_separators_recursive(root);
        self.publish_restored_guests(root);
        self.push_event(LayoutEvent::MinSizeChanged(root));

        #[cfg(debug_assertions)]
        if !self.check_sanity() {
            warn!("deserialized layout is invalid");
        }

        self.finish_mutation();
        Ok(())
    }

    fn fill_item(
        &mut self,
        id: ItemId,
        snapshot: &ItemSnapshot,
        guests: &BTreeMap<String, String>,
    ) -> Result<(), SnapshotError> {
        {
            let item = self.node_mut(id);
            item.sizing.geometry = snapshot.sizing_info.geometry;
            item.sizing.min_size = snapshot.sizing_info.min_size;
            item.sizing.max_size = snapshot.sizing_info.max_size;
            item.sizing.percentage_within_parent = 0.0;
            item.sizing.is_being_inserted = false;
            item.visible = snapshot.is_visible;
            item.name = snapshot.object_name.clone();
        }

        if !snapshot.is_container {
            if let Some(guest_id) = &snapshot.guest_id {
                if let Some(live) = guests.get(guest_id) {
                    self.set_guest(id, Some(live.clone()));
                } else if self.host.is_some() {
                    warn!(%guest_id, "couldn't find a guest to restore");
                }
            }
            return Ok(());
        }

        let orientation = snapshot
            .orientation
            .ok_or(SnapshotError::MissingOrientation)
            .and_then(orientation_from_raw)?;
        let ItemKind::Container {
            orientation: o,
            state,
        } = &mut self.node_mut(id).kind
        else {
            unreachable!("container snapshots are filled into container nodes")
        };
        *o = orientation;
        state.deserializing = true;

        let result = (|| {
            for child_snapshot in snapshot.children.as_deref().unwrap_or(&[]) {
                let child = if child_snapshot.is_container {
                    self.alloc_container(Some(id), Orientation::Vertical)
                } else {
                    let leaf = self.alloc_leaf();
                    self.node_mut(leaf).parent = Some(id);
                    leaf
                };
                self.container_state_mut(id).children.push(child);
                self.fill_item(child, child_snapshot, guests)?;
            }
            Ok(())
        })();

        if let Some(state) = self.node_mut(id).container_mut() {
            state.deserializing = false;
        }
        result
    }

    /// Push restored geometry and visibility out to the host, like a fresh
    /// layout pass would.
    fn publish_restored_guests(&mut self, id: ItemId) {
        let Some(host) = self.host.clone() else {
            return;
        };
        for leaf in self.items_recursive(id) {
            if !self.is_visible(leaf, false) {
                continue;
            }
            match self.node(leaf).guest() {
                Some(guest) => {
                    let guest = guest.to_owned();
                    host.set_guest_geometry(&guest, self.map_to_root_rect(leaf, self.rect_of(leaf)));
                    host.set_guest_visible(&guest, true);
                }
                None => warn!(?leaf, "visible item doesn't have a guest"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddingOption, ChildrenResizeStrategy, DefaultSizeMode, Location};

    fn sample_tree() -> (ItemTree, Vec<ItemId>) {
        let mut tree = ItemTree::new();
        tree.set_size_recursive(Size::new(1000, 600), ChildrenResizeStrategy::Percentage);
        let a = tree.new_leaf();
        let b = tree.new_leaf();
        let c = tree.new_leaf();
        let root = tree.root();
        tree.insert_item(root, a, Location::Left, DefaultSizeMode::Fair, AddingOption::None);
        tree.insert_item(root, b, Location::Right, DefaultSizeMode::Fair, AddingOption::None);
        tree.insert_item_relative(c, b, Location::Bottom, DefaultSizeMode::Fair);
        tree.set_guest(a, Some("editor".into()));
        (tree, vec![a, b, c])
    }

    fn leaf_geometries(tree: &ItemTree) -> Vec<Rect> {
        tree.items_recursive(tree.root())
            .into_iter()
            .map(|id| tree.item(id).expect("leaf exists").sizing().geometry)
            .collect()
    }

    #[test]
    fn map_uses_the_stable_key_names() {
        let (tree, _) = sample_tree();
        let map = tree.to_variant_map();
        assert_eq!(map["isContainer"], serde_json::json!(true));
        assert_eq!(map["orientation"], serde_json::json!(0));
        let child = &map["children"][0];
        assert!(child.get("sizingInfo").is_some());
        assert!(child["sizingInfo"].get("minSize").is_some());
        assert!(child["sizingInfo"].get("maxSize").is_some());
        assert_eq!(child["sizingInfo"]["geometry"]["width"], 497);
        assert_eq!(child["guestId"], serde_json::json!("editor"));
    }

    #[test]
    fn round_trip_preserves_structure_and_geometry() {
        let (tree, _) = sample_tree();
        let map = tree.to_variant_map();

        let mut guests = BTreeMap::new();
        guests.insert(String::from("editor"), String::from("editor"));
        let mut restored = ItemTree::new();
        restored
            .fill_from_variant_map(map.clone(), &guests)
            .expect("round trip should succeed");

        assert_eq!(leaf_geometries(&tree), leaf_geometries(&restored));
        assert_eq!(restored.to_variant_map(), map);
        assert!(restored.check_sanity());
    }

    #[test]
    fn round_trip_recomputes_percentages() {
        let (tree, _) = sample_tree();
        let mut restored = ItemTree::new();
        restored
            .fill_from_variant_map(tree.to_variant_map(), &BTreeMap::new())
            .expect("round trip should succeed");

        let original: f64 = tree.child_percentages(tree.root()).iter().sum();
        let recomputed: f64 = restored.child_percentages(restored.root()).iter().sum();
        assert!((original - 1.0).abs() < 1e-6);
        assert!((recomputed - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unresolved_guest_leaves_a_placeholder_key() {
        let (tree, leaves) = sample_tree();
        let mut restored = ItemTree::new();
        restored
            .fill_from_variant_map(tree.to_variant_map(), &BTreeMap::new())
            .expect("round trip should succeed");

        // The guest key is not re-attached without a mapping entry, but the
        // leaf survives with its geometry.
        let a_path = tree.path_from_root(leaves[0]);
        let restored_a = restored.item_from_path(&a_path).expect("leaf restored");
        assert_eq!(restored.item(restored_a).expect("leaf").guest(), None);
    }

    #[test]
    fn guests_reattach_through_the_mapping() {
        let (tree, leaves) = sample_tree();
        let mut guests = BTreeMap::new();
        guests.insert(String::from("editor"), String::from("editor"));

        let mut restored = ItemTree::new();
        restored
            .fill_from_variant_map(tree.to_variant_map(), &guests)
            .expect("round trip should succeed");

        let a_path = tree.path_from_root(leaves[0]);
        let restored_a = restored.item_from_path(&a_path).expect("leaf restored");
        assert_eq!(restored.item(restored_a).expect("leaf").guest(), Some("editor"));
    }

    #[test]
    fn malformed_maps_are_rejected() {
        let mut tree = ItemTree::new();
        let err = tree
            .fill_from_variant_map(serde_json::json!({"bogus": true}), &BTreeMap::new())
            .expect_err("missing fields must fail");
        assert!(matches!(err, SnapshotError::Decode(_)));

        let mut leaf_root = ItemTree::new();
        let err = leaf_root
            .fill_from_variant_map(
                serde_json::json!({
                    "sizingInfo": {
                        "geometry": {"x": 0, "y": 0, "width": 0, "height": 0},
                        "minSize": {"width": 80, "height": 90},
                        "maxSize": {"width": 16_777_215, "height": 16_777_215},
                    },
                    "isVisible": false,
                    "isContainer": false,
                    "objectName": "null",
                }),
                &BTreeMap::new(),
            )
            .expect_err("leaf at top level must fail");
        assert!(matches!(err, SnapshotError::RootMustBeContainer));
    }

    #[test]
    fn orientation_values_are_validated() {
        let (tree, _) = sample_tree();
        let mut map = tree.to_variant_map();
        map["orientation"] = serde_json::json!(7);
        let mut restored = ItemTree::new();
        let err = restored
            .fill_from_variant_map(map, &BTreeMap::new())
            .expect_err("orientation 7 must fail");
        assert!(matches!(err, SnapshotError::InvalidOrientation(7)));
    }
}
