use crate::bloom::{BloomPass, BloomSettings};
use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode};

/// Render node that blooms and tone maps the previous pass's HDR output.
///
/// Requires a previous pass. Without an input it records nothing.
pub struct BloomNode {
    pub pass: BloomPass,
}

impl BloomNode {
    pub fn new(gpu: &GpuContext, settings: BloomSettings) -> Self {
        Self {
            pass: BloomPass::new(gpu, settings),
        }
    }
}

impl RenderNode for BloomNode {
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    ) {
        let Some(scene) = input else {
            tracing::warn!("bloom node has no input, skipping");
            return;
        };
        self.pass.render(ctx.gpu, ctx.encoder, scene, target);
    }

    fn prepare(&mut self, gpu: &GpuContext) {
        self.pass.ensure_size(gpu);
    }
}
