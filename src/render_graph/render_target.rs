//! Render targets and execution context for the render graph.

use crate::gpu::GpuContext;
use crate::scene::SceneContext;

/// Format of intermediate targets. Scene colors exceed 1.0 before tone mapping.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// An off-screen render target used for intermediate pass results.
///
/// Render targets can be both rendered to and sampled from, which enables
/// ping-pong rendering where one pass writes to target A while reading from
/// target B, then the next pass reverses the roles.
pub struct RenderTarget {
    /// A view into the texture, used for render pass attachments and shader sampling.
    pub view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Creates a target of `width` x `height` pixels (clamped to at least 1).
    pub fn new(
        gpu: &GpuContext,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            format,
            width,
            height,
        }
    }

    /// Creates a full-screen HDR target matching the current surface size.
    pub fn screen_sized(gpu: &GpuContext, label: &str) -> Self {
        Self::new(gpu, label, HDR_FORMAT, gpu.width(), gpu.height())
    }

    /// Recreates the texture if its size differs from `width` x `height`.
    pub fn ensure_size(&mut self, gpu: &GpuContext, label: &str, width: u32, height: u32) {
        if self.width != width.max(1) || self.height != height.max(1) {
            *self = Self::new(gpu, label, self.format, width, height);
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Execution context passed to each render node during graph traversal.
///
/// Created fresh for each frame; the `'a` lifetime keeps nodes from holding
/// onto resources beyond the current frame.
pub struct RenderContext<'a> {
    /// GPU context providing access to device, queue, and configuration.
    pub gpu: &'a GpuContext,
    /// Command encoder for recording render pass commands.
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// The scene being drawn, including its camera.
    pub scene: &'a SceneContext,
}
