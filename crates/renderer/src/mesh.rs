//! Mesh data structures and primitive generation.

use crate::vertex::Vertex;
use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};
use wgpu::util::DeviceExt;

/// How the index buffer is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    Triangles,
    /// Index pairs; used for wireframe placeholders.
    Lines,
}

impl Topology {
    /// Number of primitives drawn from `indices` indices.
    pub fn primitive_count(self, indices: u32) -> u32 {
        match self {
            Topology::Triangles => indices / 3,
            Topology::Lines => indices / 2,
        }
    }
}

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub topology: Topology,
}

impl Mesh {
    /// Create a mesh from vertex and index data.
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32], topology: Topology) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
            topology,
        }
    }
}

/// Mesh data before GPU upload (for procedural generation).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshData {
    pub fn upload(&self, device: &wgpu::Device) -> Mesh {
        Mesh::new(device, &self.vertices, &self.indices, self.topology)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append another mesh of the same topology, offsetting its indices.
    pub fn append(&mut self, other: &MeshData) {
        debug_assert_eq!(self.topology, other.topology);
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Apply a matrix to every position and normal.
    pub fn transformed(mut self, matrix: Mat4) -> Self {
        let normal_matrix = matrix.inverse().transpose();
        for v in &mut self.vertices {
            v.position = matrix.transform_point3(Vec3::from(v.position)).into();
            let n = normal_matrix.transform_vector3(Vec3::from(v.normal));
            v.normal = n.normalize_or_zero().into();
        }
        self
    }

    /// Set every vertex color.
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        for v in &mut self.vertices {
            v.color = color;
        }
        self
    }

    /// Radius of the smallest origin-centered sphere containing every vertex.
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| Vec3::from(v.position).length())
            .fold(0.0, f32::max)
    }

    /// Unit cube centered at origin. Doubles as the asset error indicator.
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            Vertex::new([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
            // Back face
            Vertex::new([0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 1.0]),
            Vertex::new([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
            Vertex::new([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 0.0]),
            Vertex::new([0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
            // Top face
            Vertex::new([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex::new([0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0]),
            // Bottom face
            Vertex::new([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
            Vertex::new([0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [1.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
            Vertex::new([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [0.0, 0.0]),
            // Right face
            Vertex::new([0.5, -0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
            Vertex::new([0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 1.0]),
            Vertex::new([0.5, 0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
            Vertex::new([0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 0.0]),
            // Left face
            Vertex::new([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
            Vertex::new([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 1.0]),
            Vertex::new([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 0.0]),
        ];

        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0,       // Front
            4, 5, 6, 6, 7, 4,       // Back
            8, 9, 10, 10, 11, 8,    // Top
            12, 13, 14, 14, 15, 12, // Bottom
            16, 17, 18, 18, 19, 16, // Right
            20, 21, 22, 22, 23, 20, // Left
        ];

        Self { vertices, indices, topology: Topology::Triangles }
    }

    /// UV sphere vertices shared by the solid and wireframe variants.
    fn sphere_vertices(radius: f32, segments: u32, rings: u32) -> Vec<Vertex> {
        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = radius * phi.cos();
            let ring_radius = radius * phi.sin();

            for segment in 0..=segments {
                let theta = TAU * segment as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let normal = Vec3::new(x, y, z).normalize_or_zero();
                let uv = [segment as f32 / segments as f32, ring as f32 / rings as f32];
                vertices.push(Vertex::new([x, y, z], normal.into(), uv));
            }
        }
        vertices
    }

    /// Create a UV sphere.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let (segments, rings) = (segments.max(3), rings.max(2));
        let vertices = Self::sphere_vertices(radius, segments, rings);
        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, next, current + 1]);
                indices.extend_from_slice(&[current + 1, next, next + 1]);
            }
        }

        Self { vertices, indices, topology: Topology::Triangles }
    }

    /// Wireframe UV sphere (latitude and longitude lines). The loading placeholder.
    pub fn wire_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let (segments, rings) = (segments.max(3), rings.max(2));
        let vertices = Self::sphere_vertices(radius, segments, rings);
        let mut indices = Vec::new();

        for ring in 0..=rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                // Latitude line; the pole rings collapse to a point so skip them.
                if ring > 0 && ring < rings {
                    indices.extend_from_slice(&[current, current + 1]);
                }
                // Longitude line down to the next ring.
                if ring < rings {
                    indices.extend_from_slice(&[current, current + segments + 1]);
                }
            }
        }

        Self { vertices, indices, topology: Topology::Lines }
    }

    /// Open-bottomed cone with its apex at `+height` and base ring at y = 0.
    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        Self::frustum(radius, 0.0, height, segments)
    }

    /// Capped cylinder from y = 0 to y = height.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let mut mesh = Self::frustum(radius, radius, height, segments);
        mesh.append(&Self::disk(radius, height, segments, true));
        mesh.append(&Self::disk(radius, 0.0, segments, false));
        mesh
    }

    /// Side wall between a bottom ring (y = 0) and a top ring (y = height).
    fn frustum(bottom_radius: f32, top_radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let slope = (bottom_radius - top_radius) / height.abs().max(f32::EPSILON);
        let mut vertices = Vec::with_capacity(((segments + 1) * 2) as usize);
        for i in 0..=segments {
            let theta = TAU * i as f32 / segments as f32;
            let (s, c) = theta.sin_cos();
            let normal = Vec3::new(c, slope, s).normalize_or_zero().into();
            let u = i as f32 / segments as f32;
            vertices.push(Vertex::new([c * bottom_radius, 0.0, s * bottom_radius], normal, [u, 1.0]));
            vertices.push(Vertex::new([c * top_radius, height, s * top_radius], normal, [u, 0.0]));
        }
        let mut indices = Vec::with_capacity((segments * 6) as usize);
        for i in 0..segments {
            let b0 = i * 2;
            let t0 = b0 + 1;
            let b1 = b0 + 2;
            let t1 = b0 + 3;
            indices.extend_from_slice(&[b0, t0, b1, b1, t0, t1]);
        }
        Self { vertices, indices, topology: Topology::Triangles }
    }

    /// Flat disk at height `y`, facing up or down.
    pub fn disk(radius: f32, y: f32, segments: u32, facing_up: bool) -> Self {
        let segments = segments.max(3);
        let normal = if facing_up { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
        let mut vertices = vec![Vertex::new([0.0, y, 0.0], normal, [0.5, 0.5])];
        for i in 0..=segments {
            let theta = TAU * i as f32 / segments as f32;
            let (s, c) = theta.sin_cos();
            vertices.push(Vertex::new(
                [c * radius, y, s * radius],
                normal,
                [0.5 + c * 0.5, 0.5 + s * 0.5],
            ));
        }
        let mut indices = Vec::with_capacity((segments * 3) as usize);
        for i in 1..=segments {
            if facing_up {
                indices.extend_from_slice(&[0, i + 1, i]);
            } else {
                indices.extend_from_slice(&[0, i, i + 1]);
            }
        }
        Self { vertices, indices, topology: Topology::Triangles }
    }

    /// Floating island landmass: a grassy top disk over an inverted rocky cone.
    pub fn island_base(radius: f32, depth: f32, segments: u32, top: [f32; 4], rock: [f32; 4]) -> Self {
        let mut mesh = Self::disk(radius, 0.0, segments, true).with_color(top);
        let underside = Self::cone(radius, depth, segments)
            .transformed(Mat4::from_rotation_x(PI))
            .with_color(rock);
        mesh.append(&underside);
        mesh
    }

    /// Low-poly tree: cylinder trunk plus a cone canopy, base at the origin.
    pub fn tree(trunk: [f32; 4], canopy: [f32; 4]) -> Self {
        let mut mesh = Self::cylinder(0.08, 0.4, 8).with_color(trunk);
        let crown = Self::cone(0.35, 0.8, 10)
            .transformed(Mat4::from_translation(Vec3::new(0.0, 0.3, 0.0)))
            .with_color(canopy);
        mesh.append(&crown);
        mesh.append(&Self::disk(0.35, 0.3, 10, false).with_color(canopy));
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(mesh: &MeshData) -> bool {
        mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len())
    }

    #[test]
    fn cube_is_unit_sized() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(indices_in_range(&cube));
        assert!((cube.bounding_radius() - 0.75_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn wire_sphere_is_a_line_list() {
        let sphere = MeshData::wire_sphere(0.5, 16, 16);
        assert_eq!(sphere.topology, Topology::Lines);
        assert_eq!(sphere.indices.len() % 2, 0);
        assert!(indices_in_range(&sphere));
        assert!((sphere.bounding_radius() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn primitive_count_follows_topology() {
        let cube = MeshData::cube();
        assert_eq!(cube.topology.primitive_count(cube.indices.len() as u32), 12);
        let wire = MeshData::wire_sphere(0.5, 16, 16);
        assert_eq!(wire.topology.primitive_count(wire.indices.len() as u32) as usize, wire.indices.len() / 2);
    }

    #[test]
    fn solid_sphere_triangle_count() {
        let sphere = MeshData::sphere(1.0, 8, 4);
        assert_eq!(sphere.indices.len(), 8 * 4 * 6);
        assert!(indices_in_range(&sphere));
    }

    #[test]
    fn island_hangs_below_its_top() {
        let island = MeshData::island_base(2.5, 1.8, 24, [0.3, 0.6, 0.3, 1.0], [0.4, 0.3, 0.25, 1.0]);
        assert!(indices_in_range(&island));
        let lowest = island.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert!((lowest + 1.8).abs() < 1e-4);
        assert!(island.vertices.iter().all(|v| v.position[1] <= 1e-5));
    }

    #[test]
    fn append_offsets_indices() {
        let mut a = MeshData::cube();
        let b = MeshData::cube();
        a.append(&b);
        assert_eq!(a.vertices.len(), 48);
        assert_eq!(a.indices[36], 24);
        assert!(indices_in_range(&a));
    }

    #[test]
    fn tree_is_colored_and_in_range() {
        let tree = MeshData::tree([0.4, 0.25, 0.1, 1.0], [0.2, 0.6, 0.3, 1.0]);
        assert!(indices_in_range(&tree));
        assert!(tree.vertices.iter().any(|v| v.color == [0.2, 0.6, 0.3, 1.0]));
        let top = tree.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!((top - 1.1).abs() < 1e-4);
    }
}
