//! wgpu render backend for the explore view.
//!
//! Renders the scene's boxes and planes with hemisphere + directional
//! lighting and fog that ramps with a smoothstep between its near and far
//! distances, cleared to the scene background.
//!
//! # Invariants
//! - Renderer never mutates the scene or the camera.
//! - Scene geometry is uploaded once; only uniforms change per frame.
//! - The depth buffer always matches the surface size.

mod gpu;
mod shaders;
mod surface;

pub use gpu::WgpuRenderer;
pub use surface::{GpuError, SurfaceRenderer};
