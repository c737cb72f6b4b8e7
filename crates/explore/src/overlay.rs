/// Instruction text shown on the click-to-lock overlay.
pub const INSTRUCTIONS: &str = "Click to lock pointer and start moving";

/// Backdrop opacity behind the instructions.
pub const BACKDROP_ALPHA: f32 = 0.5;

/// The translucent click-to-lock layer covering the map view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    visible: bool,
    instructions: &'static str,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            visible: true,
            instructions: INSTRUCTIONS,
        }
    }
}

impl Overlay {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn instructions(&self) -> &'static str {
        self.instructions
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
