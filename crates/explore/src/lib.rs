//! The explore view: a pointer-locked first-person walk around the floating
//! island.
//!
//! The host (a desktop window, a headless driver) owns the event loop and
//! forwards key, mouse, resize and lock events to [`MapView`], then calls
//! [`MapView::animate_frame`] once per display refresh.
//!
//! # Invariants
//! - All view state lives in one `MapView`; handlers never touch globals.
//! - The overlay is visible exactly when the pointer is unlocked.
//! - Mouse look only applies while locked; keyboard movement always applies.

pub mod config;
pub mod error;
pub mod map_view;
pub mod overlay;
pub mod page;

pub use config::{ConfigError, ExploreConfig, MovementConfig};
pub use error::ExploreError;
pub use map_view::{MapView, launch_map_view};
pub use overlay::Overlay;
pub use page::{PageHost, wire_explore_button};

pub fn crate_info() -> &'static str {
    concat!("skyisle-explore v", env!("CARGO_PKG_VERSION"))
}
