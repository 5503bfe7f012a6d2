//! `wgpu` implementation of the GPU buffer primitive.
//!
//! Every uploaded mesh stream gets its own vertex and index buffer, created with
//! `DeviceExt::create_buffer_init`. Draws issued during a frame are recorded and
//! replayed into a render pass by `EngineState::render_into`, so the world never
//! has to hold a pass.

use std::collections::HashMap;

use log::{info, warn};
use thiserror::Error;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, Queue};

use crate::engine_state::buffer_state::{
    stream_size, BufferAnalytics, DrawCall, GpuBackend, MeshHandle,
};

use super::Vertex;

/// Failure to bring up a `wgpu` device.
#[derive(Debug, Error)]
pub enum GpuInitError {
    /// No adapter matched the request.
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    /// The adapter refused to create a device.
    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Buffers backing one uploaded mesh stream.
struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    size: u64,
}

/// GPU backend writing real `wgpu` buffers.
pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    meshes: HashMap<MeshHandle, GpuMesh>,
    frame_draws: Vec<DrawCall>,
    frame_draw_count: usize,
    next_handle: u64,
    analytics: BufferAnalytics,
}

impl WgpuBackend {
    /// Wraps an existing device and queue.
    pub fn new(device: Device, queue: Queue) -> Self {
        Self {
            device,
            queue,
            meshes: HashMap::new(),
            frame_draws: Vec::new(),
            frame_draw_count: 0,
            next_handle: 0,
            analytics: BufferAnalytics::default(),
        }
    }

    /// Requests a device without a surface, blocking on the adapter and device futures.
    pub fn request_headless() -> Result<Self, GpuInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        ))?;
        info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Voxel Device"),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                ..Default::default()
            },
        ))?;

        Ok(Self::new(device, queue))
    }

    /// The device buffers are created on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The queue used for uniform writes and submissions.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Replays and clears the draws recorded this frame.
    ///
    /// The caller owns the pipeline and bind groups; this only binds the mesh
    /// buffers and issues `draw_indexed`.
    pub fn replay(&mut self, render_pass: &mut wgpu::RenderPass<'_>) {
        for draw in std::mem::take(&mut self.frame_draws) {
            let Some(mesh) = self.meshes.get(&draw.handle) else {
                continue;
            };
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn upload(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Chunk Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Chunk Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let size = stream_size(vertices, indices);
        self.analytics.record_upload(size);
        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                size,
            },
        );

        handle
    }

    fn release(&mut self, handle: MeshHandle) {
        match self.meshes.remove(&handle) {
            Some(mesh) => {
                mesh.vertex_buffer.destroy();
                mesh.index_buffer.destroy();
                self.analytics.record_release(mesh.size);
            }
            None => warn!("Release of unknown {}", handle),
        }
    }

    fn draw(&mut self, handle: MeshHandle, index_count: u32) {
        if self.meshes.contains_key(&handle) {
            self.frame_draws.push(DrawCall {
                handle,
                index_count,
            });
            self.frame_draw_count += 1;
        }
    }

    fn analytics(&self) -> BufferAnalytics {
        self.analytics
    }

    fn finish_frame(&mut self) -> usize {
        self.frame_draws.clear();
        std::mem::take(&mut self.frame_draw_count)
    }
}
