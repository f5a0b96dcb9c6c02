//! CPU meshes, glTF model decoding, and the GPU sink the scene writes into each frame.

pub mod asset;
pub mod mesh;
pub mod model;
pub mod sink;
pub mod vertex;

pub use asset::*;
pub use mesh::*;
pub use model::*;
pub use sink::*;
pub use vertex::*;
