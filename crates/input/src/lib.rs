//! Desktop input mapped to movement intent and mouse-look ownership.
//!
//! # Invariants
//! - Only bound keys change movement flags; everything else is ignored.
//! - Movement direction is unit length or zero.
//! - Pointer lock has exactly two states and only the host grants a lock.

pub mod action;
pub mod movement;
pub mod pointer_lock;

pub use action::{KeyBindings, MoveKey};
pub use movement::MovementFlags;
pub use pointer_lock::{LockRequest, LockState, PointerLock};
