//! Pointer-lock ownership for mouse look.

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

/// What the host (window system) is asked to do with the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRequest {
    /// Grab and hide the cursor.
    Lock,
    /// Release and show the cursor.
    Unlock,
}

/// Two-state pointer lock: the component only ever *requests* a change, the
/// host reports back whether it happened via `on_locked` / `on_unlocked`.
#[derive(Debug, Clone, Default)]
pub struct PointerLock {
    state: LockState,
    pending: Option<LockRequest>,
}

impl PointerLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    pub fn pending(&self) -> Option<LockRequest> {
        self.pending
    }

    /// Ask for the pointer to be locked. Returns `None` if already locked.
    pub fn request_lock(&mut self) -> Option<LockRequest> {
        if self.is_locked() {
            return None;
        }
        self.pending = Some(LockRequest::Lock);
        Some(LockRequest::Lock)
    }

    /// Ask for the pointer to be released. Returns `None` if not locked.
    pub fn request_unlock(&mut self) -> Option<LockRequest> {
        if !self.is_locked() {
            return None;
        }
        self.pending = Some(LockRequest::Unlock);
        Some(LockRequest::Unlock)
    }

    /// Host granted the lock. Returns true if the state changed.
    pub fn on_locked(&mut self) -> bool {
        self.pending = None;
        if self.is_locked() {
            return false;
        }
        self.state = LockState::Locked;
        info!(target: "controls", to = ?self.state, "pointer locked");
        true
    }

    /// Host released the lock (explicit request, Escape, focus loss).
    /// Returns true if the state changed.
    pub fn on_unlocked(&mut self) -> bool {
        self.pending = None;
        if !self.is_locked() {
            return false;
        }
        self.state = LockState::Unlocked;
        info!(target: "controls", to = ?self.state, "pointer unlocked");
        true
    }

    /// Host could not grab the cursor; stay unlocked.
    pub fn on_lock_failed(&mut self, reason: &str) {
        self.pending = None;
        warn!(target: "controls", reason, "pointer lock refused");
    }
}
