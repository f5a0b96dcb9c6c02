//! Floating island diorama: theme bundles, hover tracking, dwelling asset slot,
//! and the scene that ties them to the particle field.

pub mod asset_state;
pub mod config;
pub mod float_anim;
pub mod hover;
pub mod scene;
pub mod spring;
pub mod theme;

pub use asset_state::{AssetLoadState, DwellingVisual, ModelAssetState};
pub use config::{IslandConfig, ParticleSettings};
pub use hover::{HoverState, ObjectId, TooltipPayload};
pub use scene::{IslandScene, SceneInstance, SceneMesh, SceneMeshes};
pub use theme::ThemeParameters;
