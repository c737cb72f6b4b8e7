use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use skyisle_common::Viewport;

/// Pitch limit, just short of straight up/down so the view basis never
/// degenerates.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 1.0e-3;

/// Camera projection and look tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub start_position: Vec3,
    /// Radians of rotation per pixel of mouse movement.
    pub look_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 1.0,
            far: 1000.0,
            start_position: Vec3::new(0.0, 10.0, 0.0),
            look_sensitivity: 0.002,
        }
    }
}

/// First-person camera rig: position plus yaw/pitch.
///
/// Yaw 0 looks down −Z; positive yaw turns left. Translation helpers move
/// along the horizontal plane only, so looking up while walking forward does
/// not lift the rig.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), Viewport::default())
    }
}

impl FirstPersonCamera {
    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            position: config.start_position,
            yaw: 0.0,
            pitch: 0.0,
            fov: config.fov_degrees.to_radians(),
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
            sensitivity: config.look_sensitivity,
        }
    }

    /// Full look direction, including pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Look direction flattened onto the ground plane.
    pub fn horizontal_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.horizontal_forward() * distance;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right() * distance;
    }

    /// Apply a mouse delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
