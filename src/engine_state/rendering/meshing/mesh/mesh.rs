//! Mesh data structures for voxel rendering.
//!
//! A chunk produces two independent streams: one for opaque blocks and one for
//! water. Each stream is a plain vertex list plus a `u32` index list, ready to be
//! handed to a `GpuBackend`.

use crate::engine_state::rendering::Vertex;

use super::face::{Face, QUAD_INDICES};

/// One vertex/index stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshStream {
    /// The vertex data for this stream
    pub vertices: Vec<Vertex>,
    /// The index data for this stream, four vertices per quad
    pub indices: Vec<u32>,
}

impl MeshStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one quad, offsetting its indices by the current vertex count.
    pub fn add_face(&mut self, face: &Face) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&face.vertices());
        self.indices.extend(QUAD_INDICES.iter().map(|i| i + base));
    }

    /// Number of vertices in the stream.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Number of indices in the stream.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Number of quads in the stream.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// `true` if the stream has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// The complete mesh of a chunk: opaque blocks and water, drawn in separate passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    /// Faces of every opaque block
    pub opaque: MeshStream,
    /// Faces of water blocks, drawn after the opaque pass
    pub water: MeshStream,
}

impl ChunkMesh {
    /// Creates a mesh with two empty streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertices across both streams.
    pub fn num_vertices(&self) -> u32 {
        self.opaque.vertex_count() + self.water.vertex_count()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::block::BlockSide;

    #[test]
    fn test_indices_are_offset_per_face() {
        let mut stream = MeshStream::new();
        stream.add_face(&Face::new(Point3::new(0.0, 0.0, 0.0), 2, BlockSide::TOP));
        stream.add_face(&Face::new(Point3::new(0.0, 0.0, 0.0), 2, BlockSide::LEFT));

        assert_eq!(stream.vertex_count(), 8);
        assert_eq!(stream.face_count(), 2);
        assert_eq!(stream.indices, vec![0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
    }
}
