//! The per-frame update/render cycle.
//!
//! A [`FrameHost`] paces frames and decides when to stop; a [`FrameSink`]
//! draws the scene. The winit app drives [`step`] from its redraw events,
//! while [`run`] drives any host that can block for the next frame.

use tracing::trace;

use crate::scene::SceneContext;

/// One frame's timing, supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Milliseconds since the animation started.
    pub elapsed_ms: f64,
    /// Sequence number of this frame, starting at 0.
    pub index: u64,
}

/// Source of frame ticks. Returning `None` ends the loop.
pub trait FrameHost {
    fn wait_for_next_frame(&mut self) -> Option<FrameTick>;
}

/// Renders the scene once per frame.
pub trait FrameSink {
    type Error;

    fn render(&mut self, scene: &SceneContext) -> Result<(), Self::Error>;
}

/// Updates the scene for `tick` and renders it.
pub fn step<S: FrameSink>(
    scene: &mut SceneContext,
    sink: &mut S,
    tick: FrameTick,
) -> Result<(), S::Error> {
    scene.update(tick.elapsed_ms);
    trace!(frame = tick.index, elapsed_ms = tick.elapsed_ms, "frame");
    sink.render(scene)
}

/// Runs frames until the host shuts down, returning how many were rendered.
///
/// A render error stops the loop and is returned.
pub fn run<H: FrameHost, S: FrameSink>(
    host: &mut H,
    scene: &mut SceneContext,
    sink: &mut S,
) -> Result<u64, S::Error> {
    let mut frames = 0;
    while let Some(tick) = host.wait_for_next_frame() {
        step(scene, sink, tick)?;
        frames += 1;
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Scripted {
        times: std::vec::IntoIter<f64>,
        index: u64,
    }

    impl Scripted {
        fn new(times: Vec<f64>) -> Self {
            Self {
                times: times.into_iter(),
                index: 0,
            }
        }
    }

    impl FrameHost for Scripted {
        fn wait_for_next_frame(&mut self) -> Option<FrameTick> {
            let elapsed_ms = self.times.next()?;
            let tick = FrameTick {
                elapsed_ms,
                index: self.index,
            };
            self.index += 1;
            Some(tick)
        }
    }

    #[derive(Default)]
    struct Recorder {
        positions: Vec<Vec3>,
        glow_times: Vec<f32>,
        fail_after: Option<usize>,
    }

    impl FrameSink for Recorder {
        type Error = &'static str;

        fn render(&mut self, scene: &SceneContext) -> Result<(), Self::Error> {
            if self.fail_after == Some(self.positions.len()) {
                return Err("device lost");
            }
            self.positions.push(scene.camera.position);
            self.glow_times.push(scene.glow.time);
            Ok(())
        }
    }

    fn scene() -> SceneContext {
        SceneContext::build(&SceneConfig::default(), &mut StdRng::seed_from_u64(0)).unwrap()
    }

    #[test]
    fn renders_every_scripted_frame_then_stops() {
        let mut scene = scene();
        let mut host = Scripted::new(vec![0.0, 16.0, 33.0, 50.0]);
        let mut sink = Recorder::default();

        let frames = run(&mut host, &mut scene, &mut sink).unwrap();
        assert_eq!(frames, 4);
        assert_eq!(sink.positions.len(), 4);
        assert!((sink.glow_times[3] - 0.05).abs() < 1e-6);
    }

    #[test]
    fn empty_host_renders_nothing() {
        let mut scene = scene();
        let mut sink = Recorder::default();
        let frames = run(&mut Scripted::new(vec![]), &mut scene, &mut sink).unwrap();
        assert_eq!(frames, 0);
        assert!(sink.positions.is_empty());
    }

    #[test]
    fn camera_is_updated_before_render() {
        let mut scene = scene();
        let mut sink = Recorder::default();
        run(&mut Scripted::new(vec![50_000.0]), &mut scene, &mut sink).unwrap();
        assert_eq!(sink.positions[0], scene.path.point_at(0.5));
    }

    #[test]
    fn render_error_stops_the_loop() {
        let mut scene = scene();
        let mut sink = Recorder {
            fail_after: Some(2),
            ..Default::default()
        };
        let mut host = Scripted::new(vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(run(&mut host, &mut scene, &mut sink), Err("device lost"));
        assert_eq!(sink.positions.len(), 2);
    }
}
