//! Offscreen render target for running the `wgpu` backend without a window.
//!
//! Owns a colour and a depth texture, a camera uniform and the voxel pipeline.
//! Each frame it writes the camera, opens a render pass on its textures, lets
//! the engine replay its draws into the pass, and submits the encoder.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, Buffer, Device, RenderPipeline, TextureView};

use crate::engine_state::EngineState;

use super::{Vertex, WgpuBackend};

/// Converts the OpenGL clip-space depth range [-1, 1] into wgpu's [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Colour format of the offscreen target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// Depth format of the offscreen target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VOXEL_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};
@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
    @location(3) block_id: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) shade: f32,
    @location(1) block_id: f32,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(in.position, 1.0);
    let light = normalize(vec3<f32>(0.3, 1.0, 0.5));
    out.shade = 0.6 + 0.4 * max(dot(in.normal, light), 0.0);
    out.block_id = in.block_id;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let tint = fract(vec3<f32>(0.37, 0.61, 0.83) * in.block_id);
    return vec4<f32>(tint * in.shade, 1.0);
}
"#;

/// Packed camera data for the voxel shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// View-projection matrix of a camera at `eye` looking along `look`.
pub fn view_projection(eye: Point3<f32>, look: Vector3<f32>, aspect: f32) -> Matrix4<f32> {
    let look = if look.magnitude2() > 0.0 {
        look.normalize()
    } else {
        -Vector3::unit_y()
    };
    // look_to_rh degenerates when looking straight up or down.
    let up = if look.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };

    let view = Matrix4::look_to_rh(eye, look, up);
    OPENGL_TO_WGPU_MATRIX * perspective(Deg(70.0), aspect, 0.1, 1000.0) * view
}

/// An offscreen colour and depth target with the voxel pipeline.
pub struct OffscreenTarget {
    width: u32,
    height: u32,
    color_view: TextureView,
    depth_view: TextureView,
    pipeline: RenderPipeline,
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,
}

impl OffscreenTarget {
    /// Creates a `width` x `height` target on `device`.
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_proj: Matrix4::identity().into(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Voxel Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Voxel Shader"),
            source: wgpu::ShaderSource::Wgsl(VOXEL_SHADER.into()),
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Voxel Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Water surfaces are seen from below too.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            width,
            height,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            pipeline,
            camera_buffer,
            camera_bind_group,
        }
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Renders one frame of `engine` as seen from its viewer along `look`.
    ///
    /// Returns the number of draws replayed into the pass.
    pub fn draw_frame(&self, engine: &mut EngineState<WgpuBackend>, look: Vector3<f32>) -> usize {
        let uniform = CameraUniform {
            view_proj: view_projection(engine.viewer(), look, self.aspect()).into(),
        };
        engine
            .gpu()
            .queue()
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let mut encoder = engine
            .gpu()
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Encoder"),
            });
        let draws = {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Offscreen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            engine.render_into(&mut render_pass)
        };

        engine.gpu().queue().submit([encoder.finish()]);
        draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Transform, Vector4};

    #[test]
    fn test_point_ahead_lands_inside_the_depth_range() {
        let eye = Point3::new(8.0, 80.0, 8.0);
        let matrix = view_projection(eye, Vector3::new(1.0, 0.0, 0.0), 1.0);

        let clip = matrix * Vector4::new(20.0, 80.0, 8.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!((0.0..=1.0).contains(&depth), "depth {}", depth);
        assert!((clip.x / clip.w).abs() < 1e-4);
    }

    #[test]
    fn test_looking_straight_down_is_well_formed() {
        let eye = Point3::new(0.0, 100.0, 0.0);
        let matrix = view_projection(eye, Vector3::new(0.0, -1.0, 0.0), 16.0 / 9.0);

        let below = matrix.transform_point(Point3::new(0.0, 50.0, 0.0));
        assert!(below.x.is_finite() && below.y.is_finite());
        assert!((0.0..=1.0).contains(&below.z));
    }

    #[test]
    fn test_zero_look_falls_back_to_down() {
        let eye = Point3::new(0.0, 100.0, 0.0);
        let fallback = view_projection(eye, Vector3::new(0.0, 0.0, 0.0), 1.0);
        let down = view_projection(eye, Vector3::new(0.0, -1.0, 0.0), 1.0);
        assert_eq!(fallback, down);
    }
}
