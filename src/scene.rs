//! Scene state shared by the frame loop, the resize handler and the renderer.
//!
//! Decorations live in a `hecs` world as `(Transform, DecorationKind, Color)`
//! entities. They never move after placement; per frame only the camera and
//! the glow uniform change.

use glam::Vec3;
use hecs::World;
use rand::Rng;
use tracing::info;

use crate::bloom::BloomSettings;
use crate::camera::Camera;
use crate::color::Color;
use crate::config::SceneConfig;
use crate::flight::{FlightPlan, glow_time};
use crate::geometry::{RawGeometry, TorusKnotParams};
use crate::mesh::{KnotInstance, LineVertex, Transform};
use crate::path::{ClosedPath, PathError};
use crate::populate::{
    Decoration, DecorationKind, EDGE_THRESHOLD_DEGREES, TubeSkin, scatter_boxes, scatter_knots,
};

pub const BOX_SIZE: f32 = 0.075;
pub const TUBE_EDGE_COLOR: u32 = 0x3d85c6;
pub const GLOW_COLOR: u32 = 0x8e7cc3;

/// Values fed to the glow-point shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowUniform {
    /// Seconds since start.
    pub time: f32,
    pub color: Color,
}

pub struct SceneContext {
    pub path: ClosedPath,
    pub world: World,
    pub skin: TubeSkin,
    pub camera: Camera,
    pub flight: FlightPlan,
    pub glow: GlowUniform,
    pub fog_density: f32,
    pub bloom: BloomSettings,
}

impl SceneContext {
    /// Builds the path, the tube skin and the decorations.
    pub fn build<R: Rng + ?Sized>(config: &SceneConfig, rng: &mut R) -> Result<Self, PathError> {
        let path = config.path()?;
        let skin = TubeSkin::build(&path, config.tube);

        let mut world = World::new();
        let boxes = scatter_boxes(&path, config.box_count, rng);
        let knots = scatter_knots(&path, config.knot_count, rng);
        world.spawn_batch(boxes.into_iter().chain(knots).map(decoration_entity));

        info!(
            path_length = path.length(),
            boxes = config.box_count,
            knots = config.knot_count,
            "scene populated"
        );

        let mut scene = Self {
            path,
            world,
            skin,
            camera: Camera::new(),
            flight: config.flight,
            glow: GlowUniform {
                time: 0.0,
                color: Color::from_hex(GLOW_COLOR),
            },
            fog_density: config.fog_density,
            bloom: config.bloom,
        };
        scene.update(0.0);
        Ok(scene)
    }

    /// Advances the camera and glow uniform to `elapsed_ms` since start.
    pub fn update(&mut self, elapsed_ms: f64) {
        let pose = self.flight.pose_at(&self.path, elapsed_ms);
        self.camera.position = pose.position;
        self.camera.look_at(pose.look_at);
        self.glow.time = glow_time(elapsed_ms);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    pub fn count(&self, kind: DecorationKind) -> usize {
        self.world
            .query::<&DecorationKind>()
            .iter()
            .filter(|(_, k)| **k == kind)
            .count()
    }

    /// Tube wireframe plus one cube wireframe per box, as a line list.
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        let mut vertices = Vec::new();
        self.skin
            .edges
            .append_vertices(Color::from_hex(TUBE_EDGE_COLOR), &mut vertices);

        let cube_edges = RawGeometry::cube(BOX_SIZE).edges(EDGE_THRESHOLD_DEGREES);
        for (_, (transform, kind, color)) in self
            .world
            .query::<(&Transform, &DecorationKind, &Color)>()
            .iter()
        {
            if *kind == DecorationKind::Box {
                cube_edges
                    .transformed(transform.matrix())
                    .append_vertices(*color, &mut vertices);
            }
        }
        vertices
    }

    pub fn knot_instances(&self) -> Vec<KnotInstance> {
        self.world
            .query::<(&Transform, &DecorationKind, &Color)>()
            .iter()
            .filter(|(_, (_, kind, _))| **kind == DecorationKind::TorusKnot)
            .map(|(_, (transform, _, color))| KnotInstance::new(transform.matrix(), color.to_array()))
            .collect()
    }

    pub fn knot_geometry() -> RawGeometry {
        RawGeometry::torus_knot(TorusKnotParams::default())
    }

    pub fn glow_points(&self) -> &[Vec3] {
        &self.skin.glow_points
    }
}

fn decoration_entity(d: Decoration) -> (Transform, DecorationKind, Color) {
    let transform = Transform::from_position(d.position).euler_xyz(d.rotation);
    (transform, d.kind, d.color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scene(seed: u64) -> SceneContext {
        let config = SceneConfig {
            seed: Some(seed),
            ..Default::default()
        };
        SceneContext::build(&config, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn build_spawns_every_decoration() {
        let scene = scene(1);
        assert_eq!(scene.count(DecorationKind::Box), 55);
        assert_eq!(scene.count(DecorationKind::TorusKnot), 25);
        assert_eq!(scene.world.len(), 80);
        assert_eq!(scene.knot_instances().len(), 25);
    }

    #[test]
    fn lines_cover_tube_and_boxes() {
        let scene = scene(2);
        let expected = scene.skin.edges.segments.len() * 2 + 55 * 12 * 2;
        assert_eq!(scene.line_vertices().len(), expected);
    }

    #[test]
    fn update_moves_camera_along_path() {
        let mut scene = scene(3);
        scene.update(0.0);
        assert_eq!(scene.camera.position, scene.path.point_at(0.0));

        scene.update(25_000.0);
        let expected = scene.path.point_at(0.25);
        assert!(scene.camera.position.distance(expected) < 1e-4);
        let ahead = (scene.path.point_at(0.28) - expected).normalize();
        assert!(scene.camera.forward.dot(ahead) > 0.999);
        assert!((scene.glow.time - 25.0).abs() < 1e-6);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut scene = scene(4);
        scene.resize(800, 400);
        assert_eq!(scene.camera.aspect, 2.0);
        scene.resize(0, 0);
        assert_eq!(scene.camera.aspect, 2.0);
    }

    #[test]
    fn knots_carry_their_flat_emissive_color() {
        let scene = scene(6);
        let pink = Color::from_hex(0xff69b4).to_array();
        assert!(scene.knot_instances().iter().all(|k| k.color == pink));
    }

    #[test]
    fn glow_color_is_violet() {
        let scene = scene(5);
        assert_eq!(scene.glow.color, Color::from_hex(GLOW_COLOR));
    }

    #[test]
    fn bad_control_points_fail_to_build() {
        let config = SceneConfig {
            control_points: Some(vec![[0.0; 3]]),
            ..Default::default()
        };
        let err = SceneContext::build(&config, &mut StdRng::seed_from_u64(0));
        assert!(matches!(err, Err(PathError::TooFewPoints(1))));
    }
}
