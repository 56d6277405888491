//! Placement of the decorations that line the tube.
//!
//! Boxes are spread evenly along the path with a little jitter in both the
//! parameter and the horizontal plane; torus knots land anywhere on the path.
//! The tube skin itself is deterministic and built by [`TubeSkin::build`].

use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;

use crate::color::{Color, wrap_hue};
use crate::geometry::{LineGeometry, RawGeometry, TubeParams};
use crate::path::{ClosedPath, wrap_unit};

pub const BOX_COUNT: usize = 55;
pub const KNOT_COUNT: usize = 25;

/// Hue of the first box; hue falls off as boxes advance along the path.
const BOX_BASE_HUE: f32 = 0.7;
const KNOT_COLOR: u32 = 0xff69b4;
/// Edge angle threshold, in degrees, used for every wireframe in the scene.
pub const EDGE_THRESHOLD_DEGREES: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Box,
    TorusKnot,
}

/// One decorative instance placed near the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub position: Vec3,
    /// Euler XYZ angles in radians. Always zero for torus knots.
    pub rotation: Vec3,
    /// Path parameter the decoration was placed at.
    pub param: f32,
    pub color: Color,
}

/// Hue of a box placed at path parameter `p`.
pub fn box_hue(p: f32) -> f32 {
    wrap_hue(BOX_BASE_HUE - p)
}

/// Horizontal offset of a box from the path, each axis in `[-0.4, 0.6)`.
pub fn box_jitter<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    (rng.r#gen::<f32>() - 0.4, rng.r#gen::<f32>() - 0.4)
}

pub fn scatter_boxes<R: Rng + ?Sized>(
    path: &ClosedPath,
    count: usize,
    rng: &mut R,
) -> Vec<Decoration> {
    (0..count)
        .map(|i| {
            let p = wrap_unit(i as f32 / count as f32 + rng.r#gen::<f32>() * 0.1);
            let (dx, dz) = box_jitter(rng);
            let rotation = Vec3::new(
                rng.r#gen::<f32>() * PI,
                rng.r#gen::<f32>() * PI,
                rng.r#gen::<f32>() * PI,
            );
            Decoration {
                kind: DecorationKind::Box,
                position: path.point_at(p) + Vec3::new(dx, 0.0, dz),
                rotation,
                param: p,
                color: Color::from_hsl(box_hue(p), 1.0, 0.5),
            }
        })
        .collect()
}

pub fn scatter_knots<R: Rng + ?Sized>(
    path: &ClosedPath,
    count: usize,
    rng: &mut R,
) -> Vec<Decoration> {
    let color = Color::from_hex(KNOT_COLOR);
    (0..count)
        .map(|_| {
            let p = wrap_unit(rng.r#gen::<f32>());
            let dx = (rng.r#gen::<f32>() - 0.5) * 2.0;
            let dz = (rng.r#gen::<f32>() - 0.5) * 2.0;
            Decoration {
                kind: DecorationKind::TorusKnot,
                position: path.point_at(p) + Vec3::new(dx, 0.0, dz),
                rotation: Vec3::ZERO,
                param: p,
                color,
            }
        })
        .collect()
}

/// The tube wrapped around the path: its mesh, wireframe and glow sprites.
#[derive(Clone, Debug)]
pub struct TubeSkin {
    pub geometry: RawGeometry,
    pub edges: LineGeometry,
    pub glow_points: Vec<Vec3>,
}

impl TubeSkin {
    pub fn build(path: &ClosedPath, params: TubeParams) -> Self {
        let geometry = RawGeometry::tube(path, params);
        let edges = geometry.edges(EDGE_THRESHOLD_DEGREES);
        let glow_points = geometry
            .vertices
            .iter()
            .map(|v| Vec3::from(v.position))
            .collect();
        tracing::debug!(
            vertices = geometry.vertices.len(),
            edges = edges.segments.len(),
            "built tube skin"
        );
        Self {
            geometry,
            edges,
            glow_points,
        }
    }
}
