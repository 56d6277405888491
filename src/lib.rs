//! # Flythrough
//!
//! **A camera flight through a glowing spline tube.**
//!
//! A closed Catmull-Rom path is swept into a tube whose edges are drawn as
//! lines. Wireframe boxes and pink torus knots are scattered along it, a
//! field of pulsing glow points sits on the tube's vertices, and the whole
//! frame goes through an HDR bloom pass before it reaches the screen.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flythrough::{AppConfig, SceneConfig};
//!
//! fn main() -> Result<(), flythrough::Error> {
//!     let scene = SceneConfig::from_env()?;
//!     flythrough::run(AppConfig::default().title("Tube"), scene)
//! }
//! ```
//!
//! ## Configuration
//!
//! [`SceneConfig::from_env`] reads a TOML file named by the
//! `FLYTHROUGH_CONFIG` environment variable. Every key is optional:
//!
//! ```toml
//! seed = 7
//! box_count = 55
//! fog_density = 0.3
//!
//! [bloom]
//! threshold = 0.002
//! strength = 3.5
//!
//! [flight]
//! loop_duration_ms = 10000.0
//! ```
//!
//! ## Headless use
//!
//! Everything up to the GPU is plain data. [`SceneContext`] can be built and
//! advanced without a window, and [`frame_loop::run`] drives any
//! [`FrameSink`](frame_loop::FrameSink), which is how the frame cycle is
//! tested.

mod app;
mod bloom;
mod camera;
mod color;
mod config;
mod error;
mod flight;
pub mod frame_loop;
mod geometry;
mod gpu;
mod mesh;
mod path;
mod populate;
mod render_graph;
mod scene;
mod scene_pass;

pub use app::{Renderer, run};
pub use bloom::BloomSettings;
pub use camera::Camera;
pub use color::Color;
pub use config::{AppConfig, CONFIG_ENV_VAR, ConfigError, SceneConfig};
pub use error::{Error, GpuError, RenderError};
pub use flight::{CameraPose, FlightPlan};
pub use geometry::{LineGeometry, RawGeometry, TorusKnotParams, TubeParams};
pub use gpu::GpuContext;
pub use mesh::{Transform, Vertex3d};
pub use path::{ClosedPath, PathError};
pub use populate::{Decoration, DecorationKind};
pub use scene::SceneContext;

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec3};
