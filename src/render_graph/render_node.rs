//! The core render node trait for the render graph.

use crate::gpu::GpuContext;
use crate::render_graph::RenderContext;

/// Trait for render graph nodes that can execute rendering operations.
///
/// Each node receives the previous pass's output (if any) and writes to a
/// target texture view.
///
/// # Execution Flow
///
/// 1. `prepare()` is called once per frame for all nodes
/// 2. `execute()` is called in sequence, with ping-pong buffer management
/// 3. The final node renders directly to the screen
pub trait RenderNode {
    /// Executes this node's rendering operations.
    ///
    /// * `ctx` - Render context with GPU access, encoder, time, and scene
    /// * `target` - Texture view to render into (either intermediate buffer or screen)
    /// * `input` - Previous pass output, or `None` for the first node in the graph
    ///
    /// Nodes that need an input draw nothing when given `None`.
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    );

    /// Called once per frame before `execute()`, with mutable access.
    ///
    /// Nodes resize their own attachments here after the window changes size.
    /// The default implementation does nothing.
    fn prepare(&mut self, _gpu: &GpuContext) {}
}
