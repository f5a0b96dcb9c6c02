//! CPU-side scene graph for a decoded model, plus material normalization.

use crate::mesh::MeshData;
use glam::{Mat4, Vec3, Vec4};

/// Dampening applied to lit material colors when converting them to unlit,
/// so an imported model sits next to the hand-built low-poly pieces.
pub const UNLIT_COLOR_DAMPEN: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Physically based, light-dependent.
    Standard,
    /// Flat color (optionally textured), ignores scene lighting.
    Basic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub kind: MaterialKind,
    /// Linear RGBA base color.
    pub color: Vec4,
    /// Index of the base color texture in the source document.
    pub texture: Option<usize>,
    pub transparent: bool,
    pub opacity: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            kind: MaterialKind::Standard,
            color: Vec4::ONE,
            texture: None,
            transparent: false,
            opacity: 1.0,
            double_sided: false,
        }
    }
}

impl Material {
    /// Convert a standard material to a basic one with dampened color.
    ///
    /// Transparency, opacity, texture, and sidedness are preserved. Basic materials
    /// pass through untouched, so normalizing twice is a no-op.
    pub fn normalized(&self) -> Material {
        match self.kind {
            MaterialKind::Basic => self.clone(),
            MaterialKind::Standard => {
                let rgb = self.color.truncate() * UNLIT_COLOR_DAMPEN;
                Material {
                    kind: MaterialKind::Basic,
                    color: rgb.extend(self.color.w),
                    ..self.clone()
                }
            }
        }
    }
}

/// One drawable piece of a model: geometry, its material slot, and world placement.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrimitive {
    pub mesh: MeshData,
    pub material: usize,
    /// Node transform accumulated from the scene root.
    pub transform: Mat4,
}

/// A fully decoded model, ready to hand to the render sink.
///
/// Never mutated after load; the material pass runs once inside the loader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    pub name: Option<String>,
    pub primitives: Vec<ModelPrimitive>,
    pub materials: Vec<Material>,
}

impl ModelData {
    /// Replace every material with its normalized form.
    pub fn normalize_materials(&mut self) {
        for material in &mut self.materials {
            *material = material.normalized();
        }
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.mesh.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.mesh.indices.len() / 3).sum()
    }

    /// One mesh per primitive with its node transform applied and its material color
    /// multiplied into the vertex colors, ready for [`crate::RenderSink::upload_mesh`].
    pub fn baked_meshes(&self) -> Vec<MeshData> {
        self.primitives
            .iter()
            .map(|p| {
                let tint = self.material(p.material).map_or(Vec4::ONE, |m| m.color);
                let mut mesh = p.mesh.clone().transformed(p.transform);
                for v in &mut mesh.vertices {
                    v.color = (Vec4::from(v.color) * tint).to_array();
                }
                mesh
            })
            .collect()
    }

    /// Axis-aligned bounds of all primitives after their transforms.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.primitives.iter().flat_map(|p| {
            p.mesh
                .vertices
                .iter()
                .map(move |v| p.transform.transform_point3(Vec3::from(v.position)))
        });
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), q| (lo.min(q), hi.max(q))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_material_becomes_dampened_basic() {
        let lit = Material {
            name: Some("Outline".into()),
            color: Vec4::new(1.0, 0.5, 0.2, 0.4),
            texture: Some(2),
            transparent: true,
            opacity: 0.4,
            double_sided: true,
            ..Default::default()
        };
        let flat = lit.normalized();
        assert_eq!(flat.kind, MaterialKind::Basic);
        assert!((flat.color - Vec4::new(0.7, 0.35, 0.14, 0.4)).length() < 1e-6);
        assert_eq!(flat.texture, Some(2));
        assert!(flat.transparent);
        assert_eq!(flat.opacity, 0.4);
        assert!(flat.double_sided);
        assert_eq!(flat.name.as_deref(), Some("Outline"));
    }

    #[test]
    fn normalizing_is_idempotent() {
        let mut model = ModelData {
            materials: vec![Material::default()],
            ..Default::default()
        };
        model.normalize_materials();
        let once = model.materials[0].clone();
        model.normalize_materials();
        assert_eq!(model.materials[0], once);
    }

    #[test]
    fn bounds_apply_primitive_transforms() {
        let model = ModelData {
            primitives: vec![ModelPrimitive {
                mesh: MeshData::cube(),
                material: 0,
                transform: Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            }],
            ..Default::default()
        };
        let (lo, hi) = model.bounds().unwrap();
        assert!((lo - Vec3::new(-0.5, 1.5, -0.5)).length() < 1e-6);
        assert!((hi - Vec3::new(0.5, 2.5, 0.5)).length() < 1e-6);
        assert_eq!(model.triangle_count(), 12);
        assert!(ModelData::default().bounds().is_none());
    }

    #[test]
    fn baked_meshes_carry_transform_and_color() {
        let model = ModelData {
            primitives: vec![ModelPrimitive {
                mesh: MeshData::cube(),
                material: 0,
                transform: Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)),
            }],
            materials: vec![Material {
                color: Vec4::new(0.5, 0.25, 0.1, 1.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let meshes = model.baked_meshes();
        assert_eq!(meshes.len(), 1);
        assert!(meshes[0].vertices.iter().all(|v| v.position[0] >= 2.5 && v.color == [0.5, 0.25, 0.1, 1.0]));
    }
}
