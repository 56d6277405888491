//! Bloom post-processing.
//!
//! Pass 1: bright pass (scene → half A)
//! Pass 2: horizontal blur (half A → half B)
//! Pass 3: vertical blur (half B → half A)
//! Pass 4: composite `scene + strength * bloom`, ACES tone map (→ output)
//!
//! Blur targets are half resolution `Rgba16Float`.

use serde::Deserialize;

use crate::gpu::GpuContext;
use crate::render_graph::{HDR_FORMAT, RenderTarget};

const HALF_A: &str = "Bloom Half A";
const HALF_B: &str = "Bloom Half B";

/// Bloom configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Luminance above which pixels start to bloom.
    pub threshold: f32,
    /// Bloom brightness multiplier.
    pub strength: f32,
    /// Blur spread in `[0, 1]`.
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.002,
            strength: 3.5,
            radius: 0.0,
        }
    }
}

impl BloomSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(format!("bloom.threshold must be >= 0, got {}", self.threshold));
        }
        if !self.strength.is_finite() || self.strength < 0.0 {
            return Err(format!("bloom.strength must be >= 0, got {}", self.strength));
        }
        if !(0.0..=1.0).contains(&self.radius) {
            return Err(format!("bloom.radius must be in [0, 1], got {}", self.radius));
        }
        Ok(())
    }
}

/// Uniforms for every bloom pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniforms {
    /// 1.0 / blur_width, 1.0 / blur_height.
    pub texel_size: [f32; 2],
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub _padding: [f32; 3],
}

impl BloomUniforms {
    pub fn new(settings: &BloomSettings, blur_width: u32, blur_height: u32) -> Self {
        Self {
            texel_size: [
                1.0 / blur_width.max(1) as f32,
                1.0 / blur_height.max(1) as f32,
            ],
            threshold: settings.threshold,
            strength: settings.strength,
            radius: settings.radius,
            _padding: [0.0; 3],
        }
    }
}

/// Size of the blur targets for a given output size.
pub fn half_extent(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

pub struct BloomPass {
    bright_pipeline: wgpu::RenderPipeline,
    blur_h_pipeline: wgpu::RenderPipeline,
    blur_v_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    half_a: RenderTarget,
    half_b: RenderTarget,
    pub settings: BloomSettings,
}

impl BloomPass {
    pub fn new(gpu: &GpuContext, settings: BloomSettings) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bloom.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bloom Uniforms"),
            size: std::mem::size_of::<BloomUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<BloomUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                // Primary input
                texture_entry(1),
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Blurred bloom, read by the composite
                texture_entry(3),
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, entry: &str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let bright_pipeline = pipeline("Bloom Bright Pipeline", "fs_bright", HDR_FORMAT);
        let blur_h_pipeline = pipeline("Bloom Blur H Pipeline", "fs_blur_h", HDR_FORMAT);
        let blur_v_pipeline = pipeline("Bloom Blur V Pipeline", "fs_blur_v", HDR_FORMAT);
        let composite_pipeline =
            pipeline("Bloom Composite Pipeline", "fs_composite", gpu.config.format);

        let (w, h) = half_extent(gpu.width(), gpu.height());

        Self {
            bright_pipeline,
            blur_h_pipeline,
            blur_v_pipeline,
            composite_pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
            half_a: RenderTarget::new(gpu, HALF_A, HDR_FORMAT, w, h),
            half_b: RenderTarget::new(gpu, HALF_B, HDR_FORMAT, w, h),
            settings,
        }
    }

    /// Resizes the blur targets to half the surface size.
    pub fn ensure_size(&mut self, gpu: &GpuContext) {
        let (w, h) = half_extent(gpu.width(), gpu.height());
        self.half_a.ensure_size(gpu, HALF_A, w, h);
        self.half_b.ensure_size(gpu, HALF_B, w, h);
    }

    fn bind_group(
        &self,
        gpu: &GpuContext,
        primary: &wgpu::TextureView,
        bloom: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(primary),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bloom),
                },
            ],
        })
    }

    /// Records the four bloom passes, reading the HDR `scene` and writing the
    /// tone-mapped result to `target`.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        scene: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) {
        let uniforms =
            BloomUniforms::new(&self.settings, self.half_a.width(), self.half_a.height());
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let a = &self.half_a.view;
        let b = &self.half_b.view;
        let steps = [
            ("Bloom Bright Pass", &self.bright_pipeline, scene, scene, a),
            ("Bloom Blur H Pass", &self.blur_h_pipeline, a, a, b),
            ("Bloom Blur V Pass", &self.blur_v_pipeline, b, b, a),
            ("Bloom Composite Pass", &self.composite_pipeline, scene, a, target),
        ];

        for (label, pipeline, primary, bloom, output) in steps {
            let bind_group = self.bind_group(gpu, primary, bloom);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_uniforms_size_is_32_bytes() {
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 32);
    }

    #[test]
    fn bloom_settings_default() {
        let s = BloomSettings::default();
        assert!((s.threshold - 0.002).abs() < f32::EPSILON);
        assert!((s.strength - 3.5).abs() < f32::EPSILON);
        assert_eq!(s.radius, 0.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn bloom_settings_rejects_out_of_range() {
        let bad = [
            BloomSettings { threshold: -0.1, ..Default::default() },
            BloomSettings { strength: f32::NAN, ..Default::default() },
            BloomSettings { radius: 1.5, ..Default::default() },
        ];
        for s in bad {
            assert!(s.validate().is_err(), "{s:?} should be rejected");
        }
    }

    #[test]
    fn half_extent_never_zero() {
        assert_eq!(half_extent(1280, 720), (640, 360));
        assert_eq!(half_extent(1, 1), (1, 1));
        assert_eq!(half_extent(0, 0), (1, 1));
    }

    #[test]
    fn uniforms_use_blur_texel_size() {
        let u = BloomUniforms::new(&BloomSettings::default(), 640, 360);
        assert_eq!(u.texel_size, [1.0 / 640.0, 1.0 / 360.0]);
        assert_eq!(u.strength, 3.5);
    }
}
