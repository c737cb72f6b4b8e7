use serde::{Deserialize, Serialize};

/// One of the four movement intents a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
}

impl MoveKey {
    pub const ALL: [MoveKey; 4] = [
        MoveKey::Forward,
        MoveKey::Backward,
        MoveKey::Left,
        MoveKey::Right,
    ];
}

/// Physical key codes bound to each movement intent.
///
/// Codes are physical key names (`KeyW`, `ArrowUp`, ...), independent of the
/// keyboard layout. A code may appear under at most one intent; the first
/// match in `Forward, Backward, Left, Right` order wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: vec!["KeyW".into(), "ArrowUp".into()],
            backward: vec!["KeyS".into(), "ArrowDown".into()],
            left: vec!["KeyA".into(), "ArrowLeft".into()],
            right: vec!["KeyD".into(), "ArrowRight".into()],
        }
    }
}

impl KeyBindings {
    pub fn codes(&self, key: MoveKey) -> &[String] {
        match key {
            MoveKey::Forward => &self.forward,
            MoveKey::Backward => &self.backward,
            MoveKey::Left => &self.left,
            MoveKey::Right => &self.right,
        }
    }

    /// Resolve a physical key code to its movement intent, if bound.
    pub fn lookup(&self, code: &str) -> Option<MoveKey> {
        MoveKey::ALL
            .into_iter()
            .find(|key| self.codes(*key).iter().any(|c| c == code))
    }

    /// Returns true when no intent has any key bound.
    pub fn is_empty(&self) -> bool {
        MoveKey::ALL.iter().all(|k| self.codes(*k).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_wasd_and_arrows() {
        let b = KeyBindings::default();
        assert_eq!(b.lookup("KeyW"), Some(MoveKey::Forward));
        assert_eq!(b.lookup("ArrowUp"), Some(MoveKey::Forward));
        assert_eq!(b.lookup("KeyS"), Some(MoveKey::Backward));
        assert_eq!(b.lookup("ArrowDown"), Some(MoveKey::Backward));
        assert_eq!(b.lookup("KeyA"), Some(MoveKey::Left));
        assert_eq!(b.lookup("ArrowLeft"), Some(MoveKey::Left));
        assert_eq!(b.lookup("KeyD"), Some(MoveKey::Right));
        assert_eq!(b.lookup("ArrowRight"), Some(MoveKey::Right));
    }

    #[test]
    fn unbound_codes_resolve_to_nothing() {
        let b = KeyBindings::default();
        assert_eq!(b.lookup("Space"), None);
        assert_eq!(b.lookup("KeyQ"), None);
        assert_eq!(b.lookup("keyw"), None);
        assert_eq!(b.lookup(""), None);
    }

    #[test]
    fn first_intent_wins_on_duplicate_code() {
        let b = KeyBindings {
            forward: vec!["KeyX".into()],
            left: vec!["KeyX".into()],
            ..KeyBindings::default()
        };
        assert_eq!(b.lookup("KeyX"), Some(MoveKey::Forward));
    }

    #[test]
    fn empty_bindings() {
        let b = KeyBindings {
            forward: vec![],
            backward: vec![],
            left: vec![],
            right: vec![],
        };
        assert!(b.is_empty());
        assert!(!KeyBindings::default().is_empty());
    }
}
