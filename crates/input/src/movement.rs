use glam::Vec3;

use crate::action::MoveKey;

/// The four held/released movement flags, sampled once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: MoveKey, held: bool) {
        match key {
            MoveKey::Forward => self.forward = held,
            MoveKey::Backward => self.backward = held,
            MoveKey::Left => self.left = held,
            MoveKey::Right => self.right = held,
        }
    }

    pub fn is_held(&self, key: MoveKey) -> bool {
        match key {
            MoveKey::Forward => self.forward,
            MoveKey::Backward => self.backward,
            MoveKey::Left => self.left,
            MoveKey::Right => self.right,
        }
    }

    /// Forward or backward is held.
    pub fn longitudinal(&self) -> bool {
        self.forward || self.backward
    }

    /// Left or right is held.
    pub fn lateral(&self) -> bool {
        self.left || self.right
    }

    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    /// Normalized movement direction in rig space.
    ///
    /// `z` is forward minus backward, `x` is right minus left. Opposing keys
    /// cancel to zero; diagonals are normalized so they are never faster than
    /// a single axis.
    pub fn direction(&self) -> Vec3 {
        let z = f32::from(u8::from(self.forward)) - f32::from(u8::from(self.backward));
        let x = f32::from(u8::from(self.right)) - f32::from(u8::from(self.left));
        Vec3::new(x, 0.0, z).normalize_or_zero()
    }
}
