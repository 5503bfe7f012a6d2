//! # Buffer State Module
//!
//! This module defines the GPU buffer primitive the voxel world talks to, and the
//! in-memory implementation used when no device is available.
//!
//! ## Architecture
//!
//! The world never owns a device. Every call that touches GPU memory receives a
//! `&mut dyn GpuBackend`, which exposes three buffer operations:
//!
//! * `upload`: copies one vertex/index stream pair into GPU memory and returns a handle
//! * `release`: frees the buffers behind a handle
//! * `draw`: records one indexed draw of a handle
//!
//! Recorded draws stay on the backend until the host consumes them or calls
//! `finish_frame`.
//!
//! Both backends keep `BufferAnalytics` so memory use can be logged and asserted on.
//!
//! ## Implementations
//!
//! * `HeadlessBackend` (this module): keeps byte counts and a draw log, no device
//! * `WgpuBackend` (`rendering::wgpu_backend`): real `wgpu` vertex and index buffers

use std::collections::HashMap;
use std::fmt;

use log::warn;

use crate::engine_state::rendering::Vertex;

/// Opaque handle to a vertex/index buffer pair living on a GPU backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u64);

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// One recorded draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    /// The mesh that was drawn
    pub handle: MeshHandle,
    /// Number of indices drawn
    pub index_count: u32,
}

/// The GPU buffer primitive consumed by chunks and the world.
pub trait GpuBackend {
    /// Uploads one mesh stream and returns a handle to it.
    fn upload(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle;

    /// Frees the buffers behind `handle`. Unknown handles are ignored.
    fn release(&mut self, handle: MeshHandle);

    /// Issues one indexed draw of `index_count` indices from `handle`.
    fn draw(&mut self, handle: MeshHandle, index_count: u32);

    /// Memory statistics for the buffers currently alive.
    fn analytics(&self) -> BufferAnalytics;

    /// Ends the current frame, discarding any draws nobody consumed, and
    /// returns how many draws the frame recorded.
    fn finish_frame(&mut self) -> usize;
}

/// Analytics data for the GPU buffers of a backend
///
/// Tracks memory allocation and write operations to help spot leaks and churn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferAnalytics {
    /// Memory currently allocated, in bytes
    pub allocated_memory: u64,
    /// Highest value `allocated_memory` has reached
    pub peak_memory: u64,
    /// Number of meshes currently alive
    pub live_meshes: u64,
    /// Number of uploads performed so far
    pub times_written: u64,
}

impl BufferAnalytics {
    /// Records an upload of `bytes` bytes.
    pub fn record_upload(&mut self, bytes: u64) {
        self.allocated_memory += bytes;
        self.peak_memory = self.peak_memory.max(self.allocated_memory);
        self.live_meshes += 1;
        self.times_written += 1;
    }

    /// Records the release of a mesh of `bytes` bytes.
    pub fn record_release(&mut self, bytes: u64) {
        self.allocated_memory = self.allocated_memory.saturating_sub(bytes);
        self.live_meshes = self.live_meshes.saturating_sub(1);
    }
}

/// Size in bytes of one uploaded stream pair.
pub fn stream_size(vertices: &[Vertex], indices: &[u32]) -> u64 {
    (std::mem::size_of_val(vertices) + std::mem::size_of_val(indices)) as u64
}

/// A GPU backend that keeps everything in memory.
///
/// Uploads are accounted for but not stored; draws are appended to a log that
/// the caller may drain during the frame. Whatever is left is dropped by
/// `finish_frame`.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    live: HashMap<MeshHandle, u64>,
    draws: Vec<DrawCall>,
    frame_draw_count: usize,
    releases: u64,
    analytics: BufferAnalytics,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `handle` refers to a mesh that has not been released.
    pub fn is_live(&self, handle: MeshHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Number of meshes currently alive.
    pub fn live_meshes(&self) -> usize {
        self.live.len()
    }

    /// Total number of uploads performed.
    pub fn uploads(&self) -> u64 {
        self.analytics.times_written
    }

    /// Total number of successful releases performed.
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// Draw calls recorded since the last `take_draws`.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Drains the draw log.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }
}

impl GpuBackend for HeadlessBackend {
    fn upload(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;

        let size = stream_size(vertices, indices);
        self.live.insert(handle, size);
        self.analytics.record_upload(size);

        handle
    }

    fn release(&mut self, handle: MeshHandle) {
        match self.live.remove(&handle) {
            Some(size) => {
                self.analytics.record_release(size);
                self.releases += 1;
            }
            None => warn!("Release of unknown {}", handle),
        }
    }

    fn draw(&mut self, handle: MeshHandle, index_count: u32) {
        if !self.live.contains_key(&handle) {
            warn!("Draw of released {}", handle);
            return;
        }
        self.draws.push(DrawCall {
            handle,
            index_count,
        });
        self.frame_draw_count += 1;
    }

    fn analytics(&self) -> BufferAnalytics {
        self.analytics
    }

    fn finish_frame(&mut self) -> usize {
        self.draws.clear();
        std::mem::take(&mut self.frame_draw_count)
    }
}
