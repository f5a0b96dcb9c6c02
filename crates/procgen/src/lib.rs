//! Procedural generation for the island: the ambient particle field and tree scattering.

pub mod particle_field;
pub mod scatter;

pub use particle_field::*;
pub use scatter::*;
