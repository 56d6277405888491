use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode};
use crate::scene::SceneContext;
use crate::scene_pass::ScenePass;

/// Render node that draws the scene into an HDR target.
///
/// Meant to be the first node in the graph: it clears its target to black
/// (the fog color) and ignores any input.
pub struct SceneNode {
    pub pass: ScenePass,
}

impl SceneNode {
    pub fn new(gpu: &GpuContext, scene: &SceneContext) -> Self {
        Self {
            pass: ScenePass::new(gpu, scene),
        }
    }
}

impl RenderNode for SceneNode {
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        _input: Option<&wgpu::TextureView>,
    ) {
        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.pass.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.pass.render(ctx.gpu, &mut render_pass, ctx.scene);
    }

    fn prepare(&mut self, gpu: &GpuContext) {
        self.pass.ensure_depth_size(gpu);
    }
}
