//! Render graph for the multi-pass scene pipeline.
//!
//! A linear chain of nodes with automatic ping-pong buffer management. Each
//! pass reads the previous pass's output and writes to its own target; the
//! last pass writes to the frame.
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  SceneNode  │───▶│  BloomNode  │───▶│   Screen    │
//! │   (HDR)     │    │ (tone map)  │    │  (Final)    │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!       │
//!       ▼
//!   Target A
//! ```
//!
//! - [`SceneNode`]: lines, torus knots and glow points with depth testing
//! - [`BloomNode`]: bright pass, blur, composite and tone map

mod bloom_node;
mod graph;
mod render_node;
mod render_target;
mod scene_node;

pub use bloom_node::BloomNode;
pub use graph::RenderGraph;
pub use render_node::RenderNode;
pub use render_target::{HDR_FORMAT, RenderContext, RenderTarget};
pub use scene_node::SceneNode;
