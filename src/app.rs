use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::{AppConfig, SceneConfig};
use crate::error::{Error, GpuError, RenderError};
use crate::frame_loop::{self, FrameSink, FrameTick};
use crate::gpu::GpuContext;
use crate::render_graph::{BloomNode, RenderGraph, SceneNode};
use crate::scene::SceneContext;

/// GPU context plus the render graph that draws the scene to the window.
pub struct Renderer {
    pub gpu: GpuContext,
    graph: RenderGraph,
}

impl Renderer {
    pub fn new(window: Arc<Window>, scene: &SceneContext) -> Result<Self, GpuError> {
        let gpu = GpuContext::new(window)?;
        let graph = RenderGraph::builder()
            .node(SceneNode::new(&gpu, scene))
            .node(BloomNode::new(&gpu, scene.bloom))
            .build(&gpu);
        Ok(Self { gpu, graph })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }
}

impl FrameSink for Renderer {
    type Error = RenderError;

    fn render(&mut self, scene: &SceneContext) -> Result<(), RenderError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(wgpu::SurfaceError::OutOfMemory.into());
            }
            Err(e) => {
                warn!(error = %e, "skipping frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.graph.execute_to_target(&self.gpu, scene, &view);
        output.present();
        Ok(())
    }
}

enum FlythroughApp {
    Pending {
        config: AppConfig,
        scene: Option<SceneContext>,
    },
    Running {
        window: Arc<Window>,
        renderer: Renderer,
        scene: SceneContext,
        start_time: Instant,
        frame_index: u64,
    },
    Failed(Error),
}

impl FlythroughApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        error!(error = %err, "stopping");
        *self = FlythroughApp::Failed(err);
        event_loop.exit();
    }
}

fn create_window(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Arc<Window>, Error> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
    Ok(Arc::new(event_loop.create_window(window_attrs)?))
}

impl ApplicationHandler for FlythroughApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let FlythroughApp::Pending { config, scene } = self else {
            return;
        };
        let Some(mut scene) = scene.take() else {
            return;
        };

        let started = create_window(event_loop, config).and_then(|window| {
            let renderer = Renderer::new(window.clone(), &scene)?;
            Ok((window, renderer))
        });

        match started {
            Ok((window, renderer)) => {
                let size = window.inner_size();
                scene.resize(size.width, size.height);
                info!(width = size.width, height = size.height, "window ready");
                window.request_redraw();

                *self = FlythroughApp::Running {
                    window,
                    renderer,
                    scene,
                    start_time: Instant::now(),
                    frame_index: 0,
                };
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let FlythroughApp::Running {
            window,
            renderer,
            scene,
            start_time,
            frame_index,
        } = self
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!(frames = *frame_index, "close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                renderer.resize(size.width, size.height);
                scene.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let tick = FrameTick {
                    elapsed_ms: start_time.elapsed().as_secs_f64() * 1000.0,
                    index: *frame_index,
                };

                match frame_loop::step(scene, renderer, tick) {
                    Ok(()) => {
                        *frame_index += 1;
                        window.request_redraw();
                    }
                    Err(err) => self.fail(event_loop, err.into()),
                }
            }
            _ => {}
        }
    }
}

/// Builds the scene and flies through it in a window until it is closed.
///
/// Decorations are placed with `scene_config.seed`, or a random seed that is
/// logged so a run can be reproduced.
pub fn run(app_config: AppConfig, scene_config: SceneConfig) -> Result<(), Error> {
    scene_config.validate()?;
    let seed = scene_config.seed.unwrap_or_else(rand::random);
    info!(seed, "placing decorations");
    let mut rng = StdRng::seed_from_u64(seed);
    let scene = SceneContext::build(&scene_config, &mut rng)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FlythroughApp::Pending {
        config: app_config,
        scene: Some(scene),
    };
    event_loop.run_app(&mut app)?;

    match app {
        FlythroughApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}
