//! Shared value types used across the skyisle crates.

pub mod types;

pub use types::{Color, Transform, Viewport};
