use std::fmt::Write as _;

use skyisle_common::Viewport;

use crate::camera::FirstPersonCamera;
use crate::scene::{SceneDescription, Shape};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer owns its output target and its size. It reads the scene and
/// camera but never mutates them.
pub trait Renderer {
    /// The output type produced by one frame.
    type Output;

    /// Current output size.
    fn viewport(&self) -> Viewport;

    /// Resize the output target.
    fn resize(&mut self, viewport: Viewport);

    /// Render one frame of the scene from the camera.
    fn render(&mut self, scene: &SceneDescription, camera: &FirstPersonCamera) -> Self::Output;
}

/// Produces a human-readable description of each frame.
///
/// Useful for CLI output, logging, and testing without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    viewport: Viewport,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn render(&mut self, scene: &SceneDescription, camera: &FirstPersonCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames,
            self.viewport.width(),
            self.viewport.height()
        );
        let p = camera.position;
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) yaw={:.1} pitch={:.1} fov={:.0} aspect={:.3}",
            p.x,
            p.y,
            p.z,
            camera.yaw.to_degrees(),
            camera.pitch.to_degrees(),
            camera.fov.to_degrees(),
            camera.aspect
        );
        let _ = writeln!(
            out,
            "Background: #{:06X}  Fog: {:.0}..{:.0}",
            scene.background.to_hex(),
            scene.fog.near,
            scene.fog.far
        );
        let _ = writeln!(out, "Meshes: {}", scene.meshes.len());
        for mesh in &scene.meshes {
            let kind = match mesh.shape {
                Shape::Box { .. } => "box",
                Shape::Plane { .. } => "plane",
            };
            let s = mesh.shape.scale();
            let t = mesh.transform.position;
            let _ = writeln!(
                out,
                "  [{}] {kind} {:.0}x{:.0}x{:.0} at ({:.1}, {:.1}, {:.1}) #{:06X} dist={:.1}",
                mesh.name,
                s.x,
                s.y,
                s.z,
                t.x,
                t.y,
                t.z,
                mesh.material.color.to_hex(),
                t.distance(p)
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_renderer_describes_scene() {
        let scene = SceneDescription::floating_island();
        let camera = FirstPersonCamera::default();
        let mut renderer = DebugTextRenderer::new(Viewport::new(800, 600));
        let output = renderer.render(&scene, &camera);

        assert!(output.contains("Frame 1 (800x600)"));
        assert!(output.contains("Meshes: 2"));
        assert!(output.contains("[island] box 30x5x30"));
        assert!(output.contains("[ground] plane"));
        assert!(output.contains("#87CEEB"));
    }

    #[test]
    fn resize_changes_output_size() {
        let scene = SceneDescription::floating_island();
        let camera = FirstPersonCamera::default();
        let mut renderer = DebugTextRenderer::default();
        renderer.resize(Viewport::new(320, 200));
        assert_eq!(renderer.viewport(), Viewport::new(320, 200));
        assert!(renderer.render(&scene, &camera).contains("(320x200)"));
        assert_eq!(renderer.frames(), 1);
    }
}
