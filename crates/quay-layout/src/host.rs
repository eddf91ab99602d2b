//! The narrow seam between the layout core and the surface toolkit.

use quay_core::{Rect, Size};

/// Everything the layout core needs from the embedding toolkit.
///
/// The core owns no pixels: it computes rectangles in root coordinates and
/// publishes them through this trait. Guests are identified by opaque keys;
/// the host resolves them to whatever surface object it manages.
///
/// Guest destruction flows the other way: the host calls
/// [`crate::ItemTree::on_guest_destroyed`] when a surface goes away.
pub trait Host {
    /// The guest's minimum size. The core clamps the result up to
    /// [`crate::HARD_MIN_SIZE`].
    fn guest_min_size(&self, guest: &str) -> Size;

    /// Publish a new rectangle for the guest, in root coordinates.
    fn set_guest_geometry(&self, guest: &str, rect: Rect);

    /// Show or hide the guest surface.
    fn set_guest_visible(&self, guest: &str, visible: bool);

    /// The guest's current rectangle in root coordinates, used to seed the
    /// geometry of a leaf attached before any layout ran. Hosts that don't
    /// track free-floating geometry can keep the default.
    fn guest_geometry(&self, guest: &str) -> Rect {
        let _ = guest;
        Rect::default()
    }
}
