//! The island diorama: scene objects in a hecs world plus the particle field,
//! hover state, and dwelling asset slot, advanced once per frame.

use crate::asset_state::{
    DwellingVisual, ModelAssetState, ERROR_COLOR, PLACEHOLDER_RADIUS, PLACEHOLDER_SEGMENTS,
};
use crate::config::{IslandConfig, ParticleSettings, MAX_PARTICLES};
use crate::float_anim::FloatAnimation;
use crate::hover::{HoverState, ObjectId, TREE_COUNT};
use crate::spring::ScaleSpring;
use crate::theme::ThemeParameters;
use engine_core::{rgb_u32, PickSphere, Ray, Transform};
use glam::{Mat4, Vec3};
use hecs::World;
use procgen::{scatter_trees, ParticleField};
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::{InstanceData, MeshData, PointVertex};

/// Radius of the grassy island top.
pub const ISLAND_RADIUS: f32 = 2.0;
/// Depth of the rocky cone under the island.
pub const ISLAND_DEPTH: f32 = 1.8;
/// Trees are scattered in this annulus around the dwelling.
pub const TREE_RING: (f32, f32) = (1.2, 1.6);
/// Height of the dwelling's center above the island top.
pub const DWELLING_HEIGHT: f32 = 0.5;

/// Tags an entity as a pointer-reactive scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneObject(pub ObjectId);

/// Pick sphere in the object's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickVolume(pub PickSphere);

/// Which static mesh an instance is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneMesh {
    Island,
    Tree,
    Placeholder,
    ErrorCube,
    Model,
}

/// One object to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneInstance {
    pub id: ObjectId,
    pub mesh: SceneMesh,
    pub data: InstanceData,
}

/// Hand-built low-poly geometry, uploaded once.
#[derive(Debug, Clone)]
pub struct SceneMeshes {
    pub island: MeshData,
    pub tree: MeshData,
    pub placeholder: MeshData,
    pub error_cube: MeshData,
}

impl SceneMeshes {
    pub fn build() -> Self {
        let color = |hex: u32| rgb_u32(hex).extend(1.0).to_array();
        Self {
            island: MeshData::island_base(ISLAND_RADIUS, ISLAND_DEPTH, 12, color(0x4ade80), color(0x57534e)),
            tree: MeshData::tree(color(0x78350f), color(0x166534)),
            placeholder: MeshData::wire_sphere(PLACEHOLDER_RADIUS, PLACEHOLDER_SEGMENTS, PLACEHOLDER_SEGMENTS),
            error_cube: MeshData::cube(),
        }
    }

    pub fn get(&self, mesh: SceneMesh) -> Option<&MeshData> {
        match mesh {
            SceneMesh::Island => Some(&self.island),
            SceneMesh::Tree => Some(&self.tree),
            SceneMesh::Placeholder => Some(&self.placeholder),
            SceneMesh::ErrorCube => Some(&self.error_cube),
            SceneMesh::Model => None,
        }
    }
}

pub struct IslandScene {
    world: World,
    particles: ParticleField,
    hover: HoverState,
    asset: ModelAssetState,
    float: FloatAnimation,
    /// Bob-and-sway pose of the whole island group.
    group: Transform,
    /// Object the pointer is currently over, as last resolved by picking.
    pointer_target: Option<ObjectId>,
    is_night: bool,
    settings: ParticleSettings,
}

impl IslandScene {
    /// Build the scene and start loading the dwelling in the background.
    pub fn new(config: &IslandConfig) -> Self {
        let asset = ModelAssetState::begin_load(&config.asset_path);
        Self::with_asset(config, asset)
    }

    /// Build the scene around an existing asset slot.
    pub fn with_asset(config: &IslandConfig, asset: ModelAssetState) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Building island (seed {})", seed);

        let theme = ThemeParameters::for_night(config.night);
        let settings = config.particles.clone();
        let particles = ParticleField::with_capacity(
            MAX_PARTICLES,
            settings.resolve_count(&theme),
            settings.to_particle_config(&theme),
            seed,
        );

        let mut world = World::new();
        world.spawn((
            SceneObject(ObjectId::IslandBase),
            Transform::default(),
            PickVolume(PickSphere::new(Vec3::new(0.0, -1.5, 0.0), 1.8)),
            ScaleSpring::new(1.0),
        ));
        world.spawn((
            SceneObject(ObjectId::Dwelling),
            Transform::from_position(Vec3::Y * DWELLING_HEIGHT),
            PickVolume(PickSphere::new(Vec3::ZERO, 0.6)),
            ScaleSpring::new(1.0),
        ));

        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        let trees = scatter_trees(&mut rng, TREE_COUNT, TREE_RING.0, TREE_RING.1);
        for (i, tree) in trees.into_iter().enumerate() {
            world.spawn((
                SceneObject(ObjectId::Tree(i)),
                Transform::from_position_yaw(tree.position, tree.yaw).with_uniform_scale(tree.scale),
                PickVolume(PickSphere::new(Vec3::new(0.0, 0.55, 0.0), 0.45)),
                ScaleSpring::new(1.0),
            ));
        }

        Self {
            world,
            particles,
            hover: HoverState::new(),
            asset,
            float: FloatAnimation::default(),
            group: Transform::default(),
            pointer_target: None,
            is_night: config.night,
            settings,
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, elapsed: f32, dt: f32) {
        self.asset.poll();

        let pose = self.float.sample(elapsed);
        self.group = Transform::from_position_yaw(Vec3::Y * pose.y_offset, pose.yaw);

        self.particles.tick(elapsed, dt);

        for (_, (object, spring)) in self.world.query_mut::<(&SceneObject, &mut ScaleSpring)>() {
            spring.set_target(self.hover.target_scale(object.0));
            spring.update(dt);
        }
    }

    /// Switch theme. Particle positions are kept; only count and spawn parameters change.
    pub fn set_night(&mut self, is_night: bool) -> bool {
        if self.is_night == is_night {
            return false;
        }
        self.is_night = is_night;
        self.refresh_particles();
        log::info!(
            "Theme switched to {} ({} particles)",
            if is_night { "night" } else { "day" },
            self.particles.active_count()
        );
        true
    }

    /// Replace the particle tunables without restarting anything.
    pub fn apply_particle_settings(&mut self, settings: ParticleSettings) {
        self.settings = settings;
        self.refresh_particles();
    }

    fn refresh_particles(&mut self) {
        let theme = self.theme();
        self.particles.reconfigure(self.settings.to_particle_config(&theme));
        self.particles.set_active_count(self.settings.resolve_count(&theme));
    }

    /// Restart the dwelling load from scratch. Any load still in flight is abandoned.
    pub fn remount_asset(&mut self) {
        let path = self.asset.path().to_path_buf();
        self.asset = ModelAssetState::begin_load(path);
    }

    /// Feed the pointer ray for this frame, or `None` when the pointer left the view.
    ///
    /// Only the nearest hit is forwarded to hover tracking, and only on transitions,
    /// so each change of target produces one leave and one enter.
    pub fn pointer_ray(&mut self, ray: Option<Ray>) -> Option<ObjectId> {
        let hit = ray.and_then(|ray| self.pick(&ray));
        let next = hit.map(|(id, _)| id);
        if next == self.pointer_target {
            return next;
        }
        if let Some(previous) = self.pointer_target.take() {
            self.hover.on_pointer_leave(previous);
        }
        if let Some((id, point)) = hit {
            self.hover.on_pointer_enter(id, point);
        }
        self.pointer_target = next;
        next
    }

    /// Nearest object along `ray` and the world-space hit point.
    pub fn pick(&self, ray: &Ray) -> Option<(ObjectId, Vec3)> {
        self.pick_volumes()
            .into_iter()
            .filter_map(|(id, sphere)| sphere.intersect(ray).map(|d| (id, d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, d)| (id, ray.point_at(d)))
    }

    /// World-space pick spheres, including the group pose and current hover scale.
    fn pick_volumes(&self) -> Vec<(ObjectId, PickSphere)> {
        self.world
            .query::<(&SceneObject, &Transform, &PickVolume, &ScaleSpring)>()
            .iter()
            .map(|(_, (object, placement, volume, spring))| {
                let world = self.group.mul_transform(&scaled(placement, spring.value));
                let center = world.transform_point(volume.0.center);
                (object.0, PickSphere::new(center, volume.0.radius * world.scale.max_element()))
            })
            .collect()
    }

    /// World-space center of an object's pick volume, for aiming pointer rays.
    pub fn object_center(&self, id: ObjectId) -> Option<Vec3> {
        self.pick_volumes()
            .into_iter()
            .find(|(object, _)| *object == id)
            .map(|(_, sphere)| sphere.center)
    }

    pub fn scale_of(&self, id: ObjectId) -> Option<f32> {
        self.world
            .query::<(&SceneObject, &ScaleSpring)>()
            .iter()
            .find(|(_, (object, _))| object.0 == id)
            .map(|(_, (_, spring))| spring.value)
    }

    /// Particle points for this frame, in world space.
    pub fn write_points(&self, out: &mut Vec<PointVertex>) {
        out.clear();
        let field = self.particles.transform();
        out.extend(self.particles.particles().map(|p| {
            PointVertex::new(
                field.transform_point(p.position).to_array(),
                p.size,
                p.color.extend(p.opacity).to_array(),
            )
        }));
    }

    /// Draw list for the island, trees, and whatever stands in for the dwelling.
    pub fn instances(&self) -> Vec<SceneInstance> {
        let theme = self.theme();
        let mut instances: Vec<SceneInstance> = self
            .world
            .query::<(&SceneObject, &Transform, &ScaleSpring)>()
            .iter()
            .map(|(_, (object, placement, spring))| {
                let matrix = self.group.mul_transform(&scaled(placement, spring.value)).to_matrix();
                let (mesh, color, extra) = match object.0 {
                    ObjectId::IslandBase => (SceneMesh::Island, Vec3::ONE, 1.0),
                    ObjectId::Tree(_) => (SceneMesh::Tree, Vec3::ONE, 1.0),
                    ObjectId::Dwelling => match self.asset.visual(theme.placeholder_color) {
                        DwellingVisual::Placeholder { color } => (SceneMesh::Placeholder, color, 1.0),
                        DwellingVisual::ErrorIndicator => (SceneMesh::ErrorCube, ERROR_COLOR, 1.0),
                        DwellingVisual::Model { scale, .. } => (SceneMesh::Model, Vec3::ONE, scale),
                    },
                };
                SceneInstance {
                    id: object.0,
                    mesh,
                    data: InstanceData::new(
                        (matrix * Mat4::from_scale(Vec3::splat(extra))).to_cols_array_2d(),
                        color.extend(1.0).to_array(),
                    ),
                }
            })
            .collect();
        instances.sort_by_key(|instance| instance.id);
        instances
    }

    pub fn theme(&self) -> ThemeParameters {
        ThemeParameters::for_night(self.is_night)
    }

    pub fn is_night(&self) -> bool {
        self.is_night
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn asset(&self) -> &ModelAssetState {
        &self.asset
    }

    pub fn group(&self) -> &Transform {
        &self.group
    }

    pub fn settings(&self) -> &ParticleSettings {
        &self.settings
    }
}

fn scaled(placement: &Transform, factor: f32) -> Transform {
    Transform {
        scale: placement.scale * factor,
        ..*placement
    }
}
