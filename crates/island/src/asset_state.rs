//! Dwelling model lifecycle: Loading → Loaded | Error, exactly once per mount.

use crossbeam_channel::{Receiver, TryRecvError};
use glam::Vec3;
use renderer::{load_model, AssetError, ModelData};
use std::path::{Path, PathBuf};

/// Radius of the wireframe sphere shown while loading.
pub const PLACEHOLDER_RADIUS: f32 = 0.5;
/// Latitude/longitude subdivisions of the placeholder sphere.
pub const PLACEHOLDER_SEGMENTS: u32 = 16;
/// Uniform scale applied to the loaded model.
pub const MODEL_SCALE: f32 = 0.2;
/// Color of the unit cube that stands in for a failed model.
pub const ERROR_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);

#[derive(Debug)]
pub enum AssetLoadState {
    Loading,
    Loaded(ModelData),
    Error(String),
}

/// Messages from the background loader.
#[derive(Debug)]
pub enum LoadEvent {
    Progress { loaded: u64, total: u64 },
    Finished(Result<ModelData, AssetError>),
}

/// What the dwelling slot should draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DwellingVisual<'a> {
    /// Wireframe sphere in the theme's placeholder color.
    Placeholder { color: Vec3 },
    /// Solid red unit cube.
    ErrorIndicator,
    Model { model: &'a ModelData, scale: f32 },
}

/// Owns one load attempt. Dropping it abandons the worker's result; the worker
/// itself runs to completion since there is no way to cancel a load in flight.
#[derive(Debug)]
pub struct ModelAssetState {
    path: PathBuf,
    state: AssetLoadState,
    events: Option<Receiver<LoadEvent>>,
    progress: Option<(u64, u64)>,
}

impl ModelAssetState {
    /// Start loading `path` on a worker thread. Returns immediately in `Loading`.
    pub fn begin_load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker_path = path.clone();

        let spawned = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let progress_tx = tx.clone();
                let result = load_model(&worker_path, |loaded, total| {
                    // The receiver may already be gone after a remount.
                    let _ = progress_tx.send(LoadEvent::Progress { loaded, total });
                });
                let _ = tx.send(LoadEvent::Finished(result));
            });

        log::info!("Loading model {:?}", path);
        let mut slot = Self::pending(path);
        match spawned {
            Ok(_) => slot.events = Some(rx),
            Err(source) => {
                let path = slot.path.clone();
                slot.resolve(Err(AssetError::Io { path, source }));
            }
        }
        slot
    }

    /// A slot in `Loading` with no worker attached; resolved by [`ModelAssetState::resolve`].
    pub fn pending(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: AssetLoadState::Loading,
            events: None,
            progress: None,
        }
    }

    /// Drain worker messages without blocking. Returns true if the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = self.events.take() else {
            return false;
        };
        loop {
            match rx.try_recv() {
                Ok(LoadEvent::Progress { loaded, total }) => {
                    log::debug!("Model {:?}: {}/{} bytes", self.path, loaded, total);
                    self.progress = Some((loaded, total));
                }
                Ok(LoadEvent::Finished(result)) => return self.resolve(result),
                Err(TryRecvError::Empty) => {
                    self.events = Some(rx);
                    return false;
                }
                Err(TryRecvError::Disconnected) => {
                    return self.resolve_message("model loader stopped before reporting a result".into());
                }
            }
        }
    }

    /// Apply a load result. Only the first resolution out of `Loading` has any effect.
    pub fn resolve(&mut self, result: Result<ModelData, AssetError>) -> bool {
        if !self.is_loading() {
            return false;
        }
        match result {
            Ok(model) => {
                log::info!("Model {:?} loaded", self.path);
                self.state = AssetLoadState::Loaded(model);
                self.events = None;
                true
            }
            Err(e) => self.resolve_message(format!("Failed to load model: {}", e)),
        }
    }

    fn resolve_message(&mut self, message: String) -> bool {
        if !self.is_loading() {
            return false;
        }
        log::error!("{} ({:?})", message, self.path);
        self.state = AssetLoadState::Error(message);
        self.events = None;
        true
    }

    pub fn state(&self) -> &AssetLoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AssetLoadState::Loading)
    }

    pub fn model(&self) -> Option<&ModelData> {
        match &self.state {
            AssetLoadState::Loaded(model) => Some(model),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AssetLoadState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Fraction of bytes read so far, if the loader has reported any.
    pub fn progress(&self) -> Option<f32> {
        self.progress
            .map(|(loaded, total)| if total == 0 { 1.0 } else { loaded as f32 / total as f32 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn visual(&self, placeholder_color: Vec3) -> DwellingVisual<'_> {
        match &self.state {
            AssetLoadState::Loading => DwellingVisual::Placeholder { color: placeholder_color },
            AssetLoadState::Error(_) => DwellingVisual::ErrorIndicator,
            AssetLoadState::Loaded(model) => DwellingVisual::Model { model, scale: MODEL_SCALE },
        }
    }
}
