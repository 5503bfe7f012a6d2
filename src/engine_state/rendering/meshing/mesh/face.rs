use cgmath::{Point3, Vector3};

use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::block::{BlockSide, BlockTypeSize};

/// Triangle pattern of one quad, relative to its first vertex.
///
/// Both triangles wind counter-clockwise when the face is seen from outside the block.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// Unit-cube face templates, in `BlockSide` order.
///
/// Each face lists its corners as lower-left, lower-right, upper-left, upper-right
/// (seen from outside), with 8 floats per corner: xyz offset, normal, uv.
#[rustfmt::skip]
pub const FACE_TEMPLATES: [[[f32; 8]; 4]; 6] = [
    // RIGHT (+X)
    [
        [1.0, 0.0, 1.0,  1.0, 0.0, 0.0,  0.0, 1.0],
        [1.0, 0.0, 0.0,  1.0, 0.0, 0.0,  1.0, 1.0],
        [1.0, 1.0, 1.0,  1.0, 0.0, 0.0,  0.0, 0.0],
        [1.0, 1.0, 0.0,  1.0, 0.0, 0.0,  1.0, 0.0],
    ],
    // LEFT (-X)
    [
        [0.0, 0.0, 0.0, -1.0, 0.0, 0.0,  0.0, 1.0],
        [0.0, 0.0, 1.0, -1.0, 0.0, 0.0,  1.0, 1.0],
        [0.0, 1.0, 0.0, -1.0, 0.0, 0.0,  0.0, 0.0],
        [0.0, 1.0, 1.0, -1.0, 0.0, 0.0,  1.0, 0.0],
    ],
    // TOP (+Y)
    [
        [0.0, 1.0, 1.0,  0.0, 1.0, 0.0,  0.0, 1.0],
        [1.0, 1.0, 1.0,  0.0, 1.0, 0.0,  1.0, 1.0],
        [0.0, 1.0, 0.0,  0.0, 1.0, 0.0,  0.0, 0.0],
        [1.0, 1.0, 0.0,  0.0, 1.0, 0.0,  1.0, 0.0],
    ],
    // BOTTOM (-Y)
    [
        [0.0, 0.0, 0.0,  0.0, -1.0, 0.0,  0.0, 1.0],
        [1.0, 0.0, 0.0,  0.0, -1.0, 0.0,  1.0, 1.0],
        [0.0, 0.0, 1.0,  0.0, -1.0, 0.0,  0.0, 0.0],
        [1.0, 0.0, 1.0,  0.0, -1.0, 0.0,  1.0, 0.0],
    ],
    // FRONT (+Z)
    [
        [0.0, 0.0, 1.0,  0.0, 0.0, 1.0,  0.0, 1.0],
        [1.0, 0.0, 1.0,  0.0, 0.0, 1.0,  1.0, 1.0],
        [0.0, 1.0, 1.0,  0.0, 0.0, 1.0,  0.0, 0.0],
        [1.0, 1.0, 1.0,  0.0, 0.0, 1.0,  1.0, 0.0],
    ],
    // BACK (-Z)
    [
        [1.0, 0.0, 0.0,  0.0, 0.0, -1.0,  0.0, 1.0],
        [0.0, 0.0, 0.0,  0.0, 0.0, -1.0,  1.0, 1.0],
        [1.0, 1.0, 0.0,  0.0, 0.0, -1.0,  0.0, 0.0],
        [0.0, 1.0, 0.0,  0.0, 0.0, -1.0,  1.0, 0.0],
    ],
];

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner vertices (lower-left, lower-right, upper-left,
/// upper-right) in world space, produced from a unit-cube template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner
    pub ll: Vertex,
    /// Lower-right corner
    pub lr: Vertex,
    /// Upper-left corner
    pub ul: Vertex,
    /// Upper-right corner
    pub ur: Vertex,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face `block_side` of the block whose minimum corner sits at
    /// `block_origin` (world space).
    pub fn new(block_origin: Point3<f32>, block_id: BlockTypeSize, block_side: BlockSide) -> Self {
        let template = &FACE_TEMPLATES[block_side as usize];
        let corner = |i: usize| {
            let [x, y, z, nx, ny, nz, u, v] = template[i];
            Vertex::new(
                block_origin + Vector3::new(x, y, z),
                Vector3::new(nx, ny, nz),
                u,
                v,
                block_id,
            )
        };

        Face {
            ll: corner(0),
            lr: corner(1),
            ul: corner(2),
            ur: corner(3),
            block_side,
        }
    }

    /// The four corners in emission order.
    pub fn vertices(&self) -> [Vertex; 4] {
        [self.ll, self.lr, self.ul, self.ur]
    }
}
