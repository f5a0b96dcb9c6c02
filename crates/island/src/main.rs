//! Floating island: a hovering diorama with drifting particles, day/night themes,
//! and hover feedback, driven by a fixed 60 Hz frame loop.

use anyhow::{Context, Result};
use engine_core::{FrameClock, Ray};
use glam::Vec3;
use island::{AssetLoadState, IslandConfig, IslandScene, ObjectId, SceneMesh, SceneMeshes};
use renderer::{InstanceData, MeshHandle, RenderError, RenderSink};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const FRAME_RATE: f32 = 60.0;
/// Where the simulated pointer rays start.
const CAMERA_POSITION: Vec3 = Vec3::new(8.0, 5.0, 8.0);
/// The simulated pointer moves to its next target this often.
const POINTER_DWELL_SECONDS: f32 = 1.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = IslandConfig::load();
    log::info!(
        "Starting floating island ({} theme, {:.1}s run)",
        if config.night { "night" } else { "day" },
        config.run_seconds()
    );

    let mut sink = if config.headless {
        log::info!("Headless run, skipping GPU setup");
        None
    } else {
        Some(acquire_render_sink(config.render_retries)?)
    };

    let meshes = SceneMeshes::build();
    let mut handles: HashMap<SceneMesh, Vec<MeshHandle>> = HashMap::new();
    if let Some(sink) = sink.as_mut() {
        for mesh in [SceneMesh::Island, SceneMesh::Tree, SceneMesh::Placeholder, SceneMesh::ErrorCube] {
            if let Some(data) = meshes.get(mesh) {
                handles.insert(mesh, vec![sink.upload_mesh(data)]);
            }
        }
        log::info!("Uploaded {} static meshes to {}", sink.mesh_count(), sink.adapter_name());
    }

    let mut scene = IslandScene::new(&config);
    let mut clock = FrameClock::new();
    let frame_budget = Duration::from_secs_f32(1.0 / FRAME_RATE);
    let mut points = Vec::new();
    let mut next_flip = config.theme_period();
    let mut next_status = 1.0;
    let mut last_target = None;
    let mut frame_primitives = 0;

    while clock.elapsed_seconds() < config.run_seconds() {
        let frame_start = Instant::now();
        clock.advance(1.0 / FRAME_RATE);
        let elapsed = clock.elapsed_seconds();

        if let (Some(at), Some(period)) = (next_flip, config.theme_period()) {
            if elapsed >= at {
                scene.set_night(!scene.is_night());
                next_flip = Some(at + period);
            }
        }

        let target = scene.pointer_ray(simulated_pointer(&scene, elapsed));
        if target != last_target {
            log::debug!("Pointer over {:?}", target);
            last_target = target;
        }

        scene.update(elapsed, clock.delta_seconds());

        if let Some(sink) = sink.as_mut() {
            if let (Some(model), false) = (scene.asset().model(), handles.contains_key(&SceneMesh::Model)) {
                let uploaded = model.baked_meshes().iter().map(|m| sink.upload_mesh(m)).collect();
                handles.insert(SceneMesh::Model, uploaded);
            }

            scene.write_points(&mut points);
            sink.write_points(&points);
            let mut primitives = 0;
            let instances: Vec<InstanceData> = scene
                .instances()
                .into_iter()
                .filter_map(|instance| {
                    let uploaded = handles.get(&instance.mesh)?;
                    primitives += uploaded
                        .iter()
                        .filter_map(|handle| sink.mesh(*handle))
                        .map(|mesh| mesh.topology.primitive_count(mesh.num_indices))
                        .sum::<u32>();
                    Some(instance.data)
                })
                .collect();
            sink.write_instances(&instances);
            frame_primitives = primitives;
            sink.submit();
        }

        if elapsed >= next_status {
            log_status(&scene, &clock, sink.as_ref(), frame_primitives);
            next_status += 1.0;
        }

        std::thread::sleep(frame_budget.saturating_sub(frame_start.elapsed()));
    }

    log::info!(
        "Finished after {} frames, {} particles recycled",
        clock.frame_count(),
        scene.particles().recycled_count()
    );
    Ok(())
}

/// Create the GPU sink, retrying while no context is available.
///
/// Running out of retries is fatal for the whole diorama, so the error goes to the caller.
fn acquire_render_sink(retries: u32) -> Result<RenderSink> {
    let mut attempt = 0;
    loop {
        match RenderSink::new_blocking() {
            Ok(sink) => return Ok(sink),
            Err(RenderError::ContextUnavailable(reason)) if attempt < retries => {
                attempt += 1;
                log::warn!("Render context unavailable ({}), retry {}/{}", reason, attempt, retries);
                std::thread::sleep(Duration::from_millis(500));
            }
            Err(e) => {
                log::error!("The island can't be displayed: {}", e);
                eprintln!("The floating island needs a GPU context and none could be created. Run again to retry, or set `headless: true` in island.ron.");
                return Err(e).context("creating render context");
            }
        }
    }
}

/// Pointer ray for this frame: cycles through every object, then off the island.
fn simulated_pointer(scene: &IslandScene, elapsed: f32) -> Option<Ray> {
    let targets: Vec<ObjectId> = ObjectId::all().collect();
    let slot = (elapsed / POINTER_DWELL_SECONDS) as usize % (targets.len() + 1);
    let target = targets.get(slot)?;
    Ray::towards(CAMERA_POSITION, scene.object_center(*target)?)
}

fn log_status(scene: &IslandScene, clock: &FrameClock, sink: Option<&RenderSink>, primitives: u32) {
    let asset = match scene.asset().state() {
        AssetLoadState::Loading => match scene.asset().progress() {
            Some(p) => format!("loading {:.0}%", p * 100.0),
            None => "loading".to_string(),
        },
        AssetLoadState::Loaded(_) => "loaded".to_string(),
        AssetLoadState::Error(message) => format!("error: {}", message),
    };
    let tooltip = scene.hover().tooltip().map_or("-", |t| t.label);
    log::info!(
        "t={:.1}s fps={:.0} {} particles={} tooltip={} dwelling={} gpu={}pts/{}inst/{}prims",
        clock.elapsed_seconds(),
        clock.fps(),
        if scene.is_night() { "night" } else { "day" },
        scene.particles().active_count(),
        tooltip,
        asset,
        sink.map_or(0, |s| s.point_count()),
        sink.map_or(0, |s| s.instance_count()),
        primitives,
    );
}
