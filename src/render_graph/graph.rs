//! The main render graph and builder for composing render pipelines.

use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode, RenderTarget};
use crate::scene::SceneContext;

const TARGET_A: &str = "RenderGraph Target A";
const TARGET_B: &str = "RenderGraph Target B";

/// Builder for constructing render graphs with a fluent API.
///
/// Nodes execute in insertion order. The first node receives no input
/// (`input` is `None`), while subsequent nodes receive the previous
/// node's output. The final node renders to the frame target.
///
/// ```ignore
/// let graph = RenderGraph::builder()
///     .node(SceneNode::new(&gpu, &scene))
///     .node(BloomNode::new(&gpu, scene.bloom))
///     .build(&gpu);
/// ```
pub struct RenderGraphBuilder {
    nodes: Vec<Box<dyn RenderNode>>,
}

impl RenderGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Adds a render node to the graph.
    pub fn node<N: RenderNode + 'static>(mut self, node: N) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Builds the render graph, allocating the two HDR ping-pong targets at
    /// the current surface size.
    pub fn build(self, gpu: &GpuContext) -> RenderGraph {
        RenderGraph {
            nodes: self.nodes,
            target_a: RenderTarget::screen_sized(gpu, TARGET_A),
            target_b: RenderTarget::screen_sized(gpu, TARGET_B),
        }
    }
}

impl Default for RenderGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A linear chain of render passes.
///
/// For multi-pass rendering, the graph alternates between two intermediate
/// targets, with the final pass writing to the frame target:
///
/// ```text
/// Pass 0: None → Target A
/// Pass 1: Target A → Target B
/// Pass 2: Target B → Screen
/// ```
///
/// For single-node graphs, no intermediate buffers are used.
pub struct RenderGraph {
    nodes: Vec<Box<dyn RenderNode>>,
    target_a: RenderTarget,
    target_b: RenderTarget,
}

impl RenderGraph {
    pub fn builder() -> RenderGraphBuilder {
        RenderGraphBuilder::new()
    }

    /// Lets every node update its own resources, and matches the ping-pong
    /// targets to the surface size.
    pub fn prepare(&mut self, gpu: &GpuContext) {
        for node in &mut self.nodes {
            node.prepare(gpu);
        }
        self.target_a
            .ensure_size(gpu, TARGET_A, gpu.width(), gpu.height());
        self.target_b
            .ensure_size(gpu, TARGET_B, gpu.width(), gpu.height());
    }

    /// Records every node into a new encoder, with the last node writing to
    /// `target`, and submits it. Presenting is left to the caller.
    pub fn execute_to_target(
        &mut self,
        gpu: &GpuContext,
        scene: &SceneContext,
        target: &wgpu::TextureView,
    ) {
        self.prepare(gpu);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RenderGraph Encoder"),
            });

        let node_count = self.nodes.len();

        {
            let mut ctx = RenderContext {
                gpu,
                encoder: &mut encoder,
                scene,
            };

            let mut current_input: Option<&wgpu::TextureView> = None;

            for (i, node) in self.nodes.iter().enumerate() {
                let is_last = i + 1 == node_count;

                let node_target = if is_last {
                    target
                } else if i % 2 == 0 {
                    &self.target_a.view
                } else {
                    &self.target_b.view
                };

                node.execute(&mut ctx, node_target, current_input);

                if !is_last {
                    current_input = Some(node_target);
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
