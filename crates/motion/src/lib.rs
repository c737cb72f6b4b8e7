//! Movement integration: exponential velocity damping driven by held movement keys.
//!
//! # Invariants
//! - Stepping is pure with respect to (flags, params, dt).
//! - With no keys held, speed never increases between steps.
//! - Frame deltas are never negative.

pub mod clock;
pub mod integrator;

pub use clock::FrameClock;
pub use integrator::{Displacement, Kinematics, MotionParams};
