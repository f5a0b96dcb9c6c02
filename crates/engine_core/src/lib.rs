//! Core types shared by the floating island crates.
//!
//! This crate provides the foundational pieces every other crate leans on:
//! - Frame clock driving the per-frame tick
//! - Transforms and picking primitives
//! - Color helpers for theme and configuration values

pub mod color;
pub mod picking;
pub mod time;
pub mod transform;

pub use color::*;
pub use picking::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
