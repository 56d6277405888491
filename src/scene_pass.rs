//! HDR scene rendering with depth testing.
//!
//! [`ScenePass`] draws the whole scene into an `Rgba16Float` target in three
//! pipelines sharing one uniform bind group:
//!
//! - **Lines**: tube wireframe and box edges, per-vertex color
//! - **Knots**: instanced torus knots, no culling
//! - **Glow points**: instanced billboards with additive blending and no depth write
//!
//! Geometry never changes after placement, so every buffer except the
//! uniforms is uploaded once in [`ScenePass::new`].
//!
//! # Depth Buffer
//!
//! The pass owns its depth buffer. Call [`ScenePass::ensure_depth_size`]
//! before rendering if the window may have been resized.

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::mesh::{GlowPoint, KnotInstance, LineVertex, Mesh, Vertex3d};
use crate::render_graph::HDR_FORMAT;
use crate::scene::SceneContext;

/// Diameter of a glow sprite in pixels.
pub const GLOW_POINT_SIZE: f32 = 10.0;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame uniforms shared by all scene pipelines.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    /// Combined view-projection matrix for transforming world positions to clip space.
    pub view_proj: [[f32; 4]; 4],
    /// Camera position in world space.
    pub camera_pos: [f32; 3],
    /// Glow time in seconds.
    pub time: f32,
    /// Framebuffer size in pixels, for pixel-sized sprites.
    pub viewport: [f32; 2],
    pub fog_density: f32,
    pub point_size: f32,
    pub glow_color: [f32; 4],
}

impl SceneUniforms {
    pub fn from_scene(scene: &SceneContext, width: u32, height: u32) -> Self {
        Self {
            view_proj: scene.camera.view_projection().to_cols_array_2d(),
            camera_pos: scene.camera.position.to_array(),
            time: scene.glow.time,
            viewport: [width.max(1) as f32, height.max(1) as f32],
            fog_density: scene.fog_density,
            point_size: GLOW_POINT_SIZE,
            glow_color: scene.glow.color.to_array(),
        }
    }
}

pub struct ScenePass {
    line_pipeline: wgpu::RenderPipeline,
    knot_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    line_buffer: wgpu::Buffer,
    line_vertex_count: u32,
    knot_mesh: Mesh,
    knot_instances: wgpu::Buffer,
    knot_count: u32,
    glow_buffer: wgpu::Buffer,
    glow_count: u32,
    pub(crate) depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl ScenePass {
    pub fn new(gpu: &GpuContext, scene: &SceneContext) -> Self {
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let line_pipeline = create_pipeline(
            gpu,
            &layout,
            PipelineDesc {
                label: "Line Pipeline",
                source: include_str!("shaders/lines.wgsl"),
                buffers: &[LineVertex::LAYOUT],
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );

        let knot_pipeline = create_pipeline(
            gpu,
            &layout,
            PipelineDesc {
                label: "Knot Pipeline",
                source: include_str!("shaders/knot.wgsl"),
                buffers: &[Vertex3d::LAYOUT, KnotInstance::LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let glow_pipeline = create_pipeline(
            gpu,
            &layout,
            PipelineDesc {
                label: "Glow Point Pipeline",
                source: include_str!("shaders/glow_points.wgsl"),
                buffers: &[GlowPoint::LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: additive,
                depth_write: false,
            },
        );

        let lines = scene.line_vertices();
        let line_buffer = create_vertex_buffer(gpu, "Scene Line Buffer", &lines);

        let knot_mesh = Mesh::from_geometry(gpu, &SceneContext::knot_geometry());
        let knots = scene.knot_instances();
        let knot_instances = create_vertex_buffer(gpu, "Knot Instance Buffer", &knots);

        let glow: Vec<GlowPoint> = scene
            .glow_points()
            .iter()
            .map(|p| GlowPoint {
                position: p.to_array(),
            })
            .collect();
        let glow_buffer = create_vertex_buffer(gpu, "Glow Point Buffer", &glow);

        tracing::debug!(
            line_vertices = lines.len(),
            knots = knots.len(),
            glow_points = glow.len(),
            "uploaded scene buffers"
        );

        let depth_view = Self::create_depth_view(gpu);

        Self {
            line_pipeline,
            knot_pipeline,
            glow_pipeline,
            uniform_buffer,
            uniform_bind_group,
            line_buffer,
            line_vertex_count: lines.len() as u32,
            knot_mesh,
            knot_instances,
            knot_count: knots.len() as u32,
            glow_buffer,
            glow_count: glow.len() as u32,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width().max(1),
                height: gpu.height().max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Uploads this frame's uniforms and records all draws.
    pub fn render(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        scene: &SceneContext,
    ) {
        let uniforms = SceneUniforms::from_scene(scene, gpu.width(), gpu.height());
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

        if self.line_vertex_count > 0 {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
            render_pass.draw(0..self.line_vertex_count, 0..1);
        }

        if self.knot_count > 0 {
            render_pass.set_pipeline(&self.knot_pipeline);
            render_pass.set_vertex_buffer(0, self.knot_mesh.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.knot_instances.slice(..));
            render_pass.set_index_buffer(
                self.knot_mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            render_pass.draw_indexed(0..self.knot_mesh.index_count, 0, 0..self.knot_count);
        }

        // Additive sprites go last so they never occlude solid geometry
        if self.glow_count > 0 {
            render_pass.set_pipeline(&self.glow_pipeline);
            render_pass.set_vertex_buffer(0, self.glow_buffer.slice(..));
            render_pass.draw(0..6, 0..self.glow_count);
        }
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    desc: PipelineDesc,
) -> wgpu::RenderPipeline {
    let shader = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });

    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: desc.buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(desc.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: desc.depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

fn create_vertex_buffer<T: bytemuck::Pod>(gpu: &GpuContext, label: &str, data: &[T]) -> wgpu::Buffer {
    // Zero-sized vertex buffers are invalid, so keep at least one element's worth
    if data.is_empty() {
        return gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<T>().max(4) as u64,
            usage: wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });
    }
    gpu.device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 112);
    }
}
