use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use skyisle_common::{Color, Transform};

/// Distance fog, ramping with a smoothstep from `near` to `far`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Fog amount in `0.0..=1.0` at the given view distance.
    pub fn factor(&self, distance: f32) -> f32 {
        if self.far <= self.near {
            return if distance >= self.far { 1.0 } else { 0.0 };
        }
        let t = ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}

/// Sky/ground gradient light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereLight {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
    pub position: Vec3,
}

/// Parallel light shining from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the surface toward the light.
    pub fn to_light(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box centered on the origin.
    Box { width: f32, height: f32, depth: f32 },
    /// Rectangle in the XY plane facing +Z.
    Plane { width: f32, height: f32 },
}

impl Shape {
    /// Scale that maps the unit mesh of this shape onto its dimensions.
    pub fn scale(&self) -> Vec3 {
        match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth),
            Shape::Plane { width, height } => Vec3::new(width, height, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub double_sided: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub shape: Shape,
    pub material: Material,
    pub transform: Transform,
}

impl Mesh {
    /// Model matrix for the unit mesh of this shape: shape size, then the
    /// transform.
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix() * Mat4::from_scale(self.shape.scale())
    }
}

/// Everything a renderer needs besides the camera. Built once on entry and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub background: Color,
    pub fog: Fog,
    pub hemisphere: HemisphereLight,
    pub directional: DirectionalLight,
    pub meshes: Vec<Mesh>,
}

const SKY: u32 = 0x87CEEB;
const ISLAND_GREEN: u32 = 0x228B22;
const WATER_BLUE: u32 = 0x1E90FF;

impl SceneDescription {
    /// The floating island over a wide ground plane.
    pub fn floating_island() -> Self {
        let island = Mesh {
            name: "island".into(),
            shape: Shape::Box {
                width: 30.0,
                height: 5.0,
                depth: 30.0,
            },
            material: Material {
                color: Color::from_hex(ISLAND_GREEN),
                double_sided: false,
            },
            transform: Transform::from_position(Vec3::new(0.0, -2.5, -50.0)),
        };

        let ground = Mesh {
            name: "ground".into(),
            shape: Shape::Plane {
                width: 1000.0,
                height: 1000.0,
            },
            material: Material {
                color: Color::from_hex(WATER_BLUE),
                double_sided: true,
            },
            transform: Transform::from_position(Vec3::new(0.0, -10.0, 0.0))
                .with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        };

        Self {
            background: Color::from_hex(SKY),
            fog: Fog {
                color: Color::from_hex(SKY),
                near: 0.0,
                far: 750.0,
            },
            hemisphere: HemisphereLight {
                sky: Color::WHITE,
                ground: Color::from_hex(0x444444),
                intensity: 1.0,
                position: Vec3::new(0.0, 200.0, 0.0),
            },
            directional: DirectionalLight {
                color: Color::WHITE,
                intensity: 0.8,
                position: Vec3::new(50.0, 200.0, 100.0),
            },
            meshes: vec![island, ground],
        }
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }
}
