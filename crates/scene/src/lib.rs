//! Scene and view: what is drawn and from where.
//!
//! # Invariants
//! - Renderers read the scene and camera; they never mutate either.
//! - The camera rig moves only on its horizontal axes.
//! - Camera pitch stays strictly inside ±90°.

mod camera;
mod renderer;
mod scene;

pub use camera::{CameraConfig, FirstPersonCamera};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{DirectionalLight, Fog, HemisphereLight, Material, Mesh, SceneDescription, Shape};

pub fn crate_info() -> &'static str {
    concat!("skyisle-scene v", env!("CARGO_PKG_VERSION"))
}
