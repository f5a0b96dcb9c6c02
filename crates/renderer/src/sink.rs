//! Headless GPU sink: owns the device and the buffers the scene rewrites each frame.

use crate::mesh::{Mesh, MeshData};
use crate::vertex::{InstanceData, PointVertex};
use thiserror::Error;

/// Smallest allocation for a per-frame buffer, in bytes.
const MIN_DYNAMIC_BUFFER: u64 = 4 * 1024;

/// Failures that take down the whole visual subsystem rather than a single object.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no usable GPU context: {0}")]
    ContextUnavailable(String),
    #[error("GPU device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Index of a mesh uploaded to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

/// A vertex buffer that is rewritten every frame and grows on demand.
struct DynamicBuffer {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    len: u32,
}

impl DynamicBuffer {
    fn new(label: &'static str) -> Self {
        Self { label, buffer: None, capacity: 0, len: 0 }
    }

    fn write<T: bytemuck::Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        let needed = bytes.len() as u64;
        if needed > self.capacity || self.buffer.is_none() {
            self.capacity = grown_capacity(self.capacity, needed);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: self.capacity,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            log::debug!("{} resized to {} bytes", self.label, self.capacity);
        }
        if let (Some(buffer), false) = (&self.buffer, bytes.is_empty()) {
            queue.write_buffer(buffer, 0, bytes);
        }
        self.len = items.len() as u32;
    }
}

/// Next buffer size able to hold `needed` bytes: powers of two, never below the minimum.
pub fn grown_capacity(current: u64, needed: u64) -> u64 {
    if needed <= current {
        return current;
    }
    needed.max(MIN_DYNAMIC_BUFFER).next_power_of_two()
}

/// GPU device plus the buffers the scene streams into.
pub struct RenderSink {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    meshes: Vec<Mesh>,
    points: DynamicBuffer,
    instances: DynamicBuffer,
}

impl RenderSink {
    /// Acquire an adapter and device. No window is needed.
    pub async fn new() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::ContextUnavailable("no compatible GPU adapter".into()))?;

        let adapter_name = adapter.get_info().name;
        log::info!("Using GPU: {:?}", adapter_name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Island Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            device,
            queue,
            adapter_name,
            meshes: Vec::new(),
            points: DynamicBuffer::new("Particle Points"),
            instances: DynamicBuffer::new("Scene Instances"),
        })
    }

    /// Blocking variant of [`RenderSink::new`] for the frame-loop thread.
    pub fn new_blocking() -> Result<Self, RenderError> {
        pollster::block_on(Self::new())
    }

    /// Upload static geometry once; the returned handle stays valid for the sink's lifetime.
    pub fn upload_mesh(&mut self, mesh: &MeshData) -> MeshHandle {
        self.meshes.push(mesh.upload(&self.device));
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0)
    }

    /// Replace this frame's particle points.
    pub fn write_points(&mut self, points: &[PointVertex]) {
        self.points.write(&self.device, &self.queue, points);
    }

    /// Replace this frame's per-object instance data.
    pub fn write_instances(&mut self, instances: &[InstanceData]) {
        self.instances.write(&self.device, &self.queue, instances);
    }

    /// Flush queued buffer writes.
    pub fn submit(&self) {
        self.queue.submit(std::iter::empty());
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn point_count(&self) -> u32 {
        self.points.len
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_grows_in_powers_of_two() {
        assert_eq!(grown_capacity(0, 10), MIN_DYNAMIC_BUFFER);
        assert_eq!(grown_capacity(4096, 4097), 8192);
        assert_eq!(grown_capacity(8192, 100), 8192);
        let points = 500 * std::mem::size_of::<PointVertex>() as u64;
        assert_eq!(grown_capacity(0, points), 16384);
    }

    #[test]
    fn context_error_message_names_the_reason() {
        let e = RenderError::ContextUnavailable("no compatible GPU adapter".into());
        assert_eq!(e.to_string(), "no usable GPU context: no compatible GPU adapter");
    }
}
