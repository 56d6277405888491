//! Procedural geometry built on the CPU before GPU upload.
//!
//! Everything in the scene is generated here: the tube swept along the flight
//! path, the small boxes and torus knots that decorate it, and the edge
//! wireframes extracted from them.
//!
//! # Quick Start
//!
//! ```
//! use flythrough::{ClosedPath, RawGeometry, TubeParams};
//!
//! let path = ClosedPath::default_loop();
//! let tube = RawGeometry::tube(&path, TubeParams::default());
//! let wireframe = tube.edges(0.2);
//! assert!(!wireframe.segments.is_empty());
//! ```

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

use crate::color::Color;
use crate::mesh::{LineVertex, Vertex3d};
use crate::path::ClosedPath;

/// Decimal places used when matching vertex positions during edge extraction.
const EDGE_PRECISION: f32 = 1e4;

/// Shape of the tube swept along the path.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct TubeParams {
    pub tubular_segments: usize,
    pub radius: f32,
    pub radial_segments: usize,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            tubular_segments: 222,
            radius: 0.65,
            radial_segments: 16,
        }
    }
}

/// Shape of a `(p, q)` torus knot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorusKnotParams {
    pub radius: f32,
    pub tube: f32,
    pub tubular_segments: usize,
    pub radial_segments: usize,
    pub p: u32,
    pub q: u32,
}

impl Default for TorusKnotParams {
    fn default() -> Self {
        Self {
            radius: 0.03,
            tube: 0.01,
            tubular_segments: 50,
            radial_segments: 8,
            p: 2,
            q: 3,
        }
    }
}

/// Raw triangle geometry before GPU upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    /// Creates raw geometry from vertices and indices.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// An axis-aligned cube of edge `size` centered at the origin.
    ///
    /// Each face has its own four vertices so normals stay flat.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        #[rustfmt::skip]
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([ 0.0,  0.0,  1.0], [[-h, -h,  h], [ h, -h,  h], [ h,  h,  h], [-h,  h,  h]]),
            ([ 0.0,  0.0, -1.0], [[ h, -h, -h], [-h, -h, -h], [-h,  h, -h], [ h,  h, -h]]),
            ([ 0.0,  1.0,  0.0], [[-h,  h,  h], [ h,  h,  h], [ h,  h, -h], [-h,  h, -h]]),
            ([ 0.0, -1.0,  0.0], [[-h, -h, -h], [ h, -h, -h], [ h, -h,  h], [-h, -h,  h]]),
            ([ 1.0,  0.0,  0.0], [[ h, -h,  h], [ h, -h, -h], [ h,  h, -h], [ h,  h,  h]]),
            ([-1.0,  0.0,  0.0], [[-h, -h, -h], [-h, -h,  h], [-h,  h,  h], [-h,  h, -h]]),
        ];
        const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = vertices.len() as u32;
            for (corner, uv) in corners.into_iter().zip(UVS) {
                vertices.push(Vertex3d::new(corner, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// Sweeps a circle of `params.radius` along `path`.
    ///
    /// The tube is closed: the last ring duplicates the first, so there are
    /// `(tubular_segments + 1) * (radial_segments + 1)` vertices.
    pub fn tube(path: &ClosedPath, params: TubeParams) -> Self {
        let tubular = params.tubular_segments.max(3);
        let radial = params.radial_segments.max(3);
        let frames = path.frenet_frames(tubular);

        let mut vertices = Vec::with_capacity((tubular + 1) * (radial + 1));
        for i in 0..=tubular {
            // The closing ring reuses the first frame and center
            let ring = if i == tubular { 0 } else { i };
            let center = path.point_at(ring as f32 / tubular as f32);
            let n = frames.normals[ring];
            let b = frames.binormals[ring];

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let normal = (n * -v.cos() + b * v.sin()).normalize_or_zero();
                let position = center + normal * params.radius;
                vertices.push(Vertex3d::new(
                    position.into(),
                    normal.into(),
                    [i as f32 / tubular as f32, j as f32 / radial as f32],
                ));
            }
        }

        Self::new(vertices, grid_indices(tubular, radial))
    }

    /// A `(p, q)` torus knot centered at the origin.
    pub fn torus_knot(params: TorusKnotParams) -> Self {
        let tubular = params.tubular_segments.max(3);
        let radial = params.radial_segments.max(3);
        let (p, q) = (params.p.max(1) as f32, params.q as f32);

        let mut vertices = Vec::with_capacity((tubular + 1) * (radial + 1));
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * p * TAU;
            let p1 = knot_curve(u, p, q, params.radius);
            let p2 = knot_curve(u + 0.01, p, q, params.radius);

            let t = p2 - p1;
            let mut n = p2 + p1;
            let b = t.cross(n);
            n = b.cross(t);
            let b = b.normalize_or_zero();
            let n = n.normalize_or_zero();

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let cx = -params.tube * v.cos();
                let cy = params.tube * v.sin();
                let position = p1 + n * cx + b * cy;
                let normal = (position - p1).normalize_or_zero();
                vertices.push(Vertex3d::new(
                    position.into(),
                    normal.into(),
                    [i as f32 / tubular as f32, j as f32 / radial as f32],
                ));
            }
        }

        Self::new(vertices, grid_indices(tubular, radial))
    }

    /// Extracts feature edges as line segments.
    ///
    /// An edge shared by two triangles is kept when the angle between their
    /// normals exceeds `threshold_degrees`. Edges used by only one triangle
    /// are always kept. Vertices are matched by position, so faces that
    /// duplicate vertices (flat-shaded cubes, tube seams) still connect.
    pub fn edges(&self, threshold_degrees: f32) -> LineGeometry {
        type Key = (i64, i64, i64);
        struct Pending {
            from: Vec3,
            to: Vec3,
            normal: Vec3,
        }

        let threshold_dot = threshold_degrees.to_radians().cos();
        let key = |p: Vec3| -> Key {
            (
                (p.x * EDGE_PRECISION).round() as i64,
                (p.y * EDGE_PRECISION).round() as i64,
                (p.z * EDGE_PRECISION).round() as i64,
            )
        };

        let mut segments = Vec::new();
        let mut order: Vec<(Key, Key)> = Vec::new();
        let mut pending: HashMap<(Key, Key), Option<Pending>> = HashMap::new();

        for tri in self.indices.chunks_exact(3) {
            let corners = [
                Vec3::from(self.vertices[tri[0] as usize].position),
                Vec3::from(self.vertices[tri[1] as usize].position),
                Vec3::from(self.vertices[tri[2] as usize].position),
            ];
            let keys = corners.map(key);
            if keys[0] == keys[1] || keys[1] == keys[2] || keys[2] == keys[0] {
                continue;
            }

            let normal = (corners[2] - corners[1])
                .cross(corners[0] - corners[1])
                .normalize_or_zero();

            for j in 0..3 {
                let next = (j + 1) % 3;
                let forward = (keys[j], keys[next]);
                let reverse = (keys[next], keys[j]);

                if let Some(slot) = pending.get_mut(&reverse).filter(|s| s.is_some()) {
                    if let Some(other) = slot.take() {
                        if normal.dot(other.normal) <= threshold_dot {
                            segments.push([corners[j], corners[next]]);
                        }
                    }
                } else if !pending.contains_key(&forward) {
                    pending.insert(
                        forward,
                        Some(Pending {
                            from: corners[j],
                            to: corners[next],
                            normal,
                        }),
                    );
                    order.push(forward);
                }
            }
        }

        // Unmatched edges border a single triangle
        for k in order {
            if let Some(Some(edge)) = pending.remove(&k) {
                segments.push([edge.from, edge.to]);
            }
        }

        LineGeometry { segments }
    }
}

/// A list of independent line segments.
#[derive(Clone, Debug, Default)]
pub struct LineGeometry {
    pub segments: Vec<[Vec3; 2]>,
}

impl LineGeometry {
    /// Returns a copy with every endpoint transformed by `matrix`.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|[a, b]| [matrix.transform_point3(*a), matrix.transform_point3(*b)])
                .collect(),
        }
    }

    /// Appends this geometry as line-list vertices of a single color.
    pub fn append_vertices(&self, color: Color, out: &mut Vec<LineVertex>) {
        let color = color.to_array();
        out.reserve(self.segments.len() * 2);
        for [a, b] in &self.segments {
            out.push(LineVertex::new(a.to_array(), color));
            out.push(LineVertex::new(b.to_array(), color));
        }
    }
}

/// Quad-grid indices shared by swept surfaces with `(rows + 1) * (cols + 1)` vertices.
fn grid_indices(rows: usize, cols: usize) -> Vec<u32> {
    let stride = (cols + 1) as u32;
    let mut indices = Vec::with_capacity(rows * cols * 6);
    for j in 1..=rows as u32 {
        for i in 1..=cols as u32 {
            let a = stride * (j - 1) + (i - 1);
            let b = stride * j + (i - 1);
            let c = stride * j + i;
            let d = stride * (j - 1) + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    indices
}

fn knot_curve(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let cu = u.cos();
    let su = u.sin();
    let cs = (q / p * u).cos();
    Vec3::new(
        radius * (2.0 + cs) * 0.5 * cu,
        radius * (2.0 + cs) * su * 0.5,
        radius * (q / p * u).sin() * 0.5,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn cube_has_flat_faces() {
        let cube = RawGeometry::cube(0.075);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);

        let (min, max) = cube.bounds();
        assert!((max - min - Vec3::splat(0.075)).length() < 1e-6);
    }

    #[test]
    fn cube_wireframe_has_twelve_edges() {
        let edges = RawGeometry::cube(0.075).edges(0.2);
        assert_eq!(edges.segments.len(), 12);
        for [a, b] in &edges.segments {
            assert!((a.distance(*b) - 0.075).abs() < 1e-5);
        }
    }

    #[test]
    fn single_triangle_keeps_its_border() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex3d::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        ];
        let edges = RawGeometry::new(vertices, vec![0, 1, 2]).edges(0.2);
        assert_eq!(edges.segments.len(), 3);
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex3d::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        ];
        let edges = RawGeometry::new(vertices, vec![0, 1, 2]).edges(0.2);
        assert!(edges.segments.is_empty());
    }

    #[test]
    fn tube_vertex_layout() {
        let path = ClosedPath::default_loop();
        let params = TubeParams::default();
        let tube = RawGeometry::tube(&path, params);
        assert_eq!(tube.vertices.len(), 223 * 17);
        assert_eq!(tube.indices.len(), 222 * 16 * 6);
    }

    #[test]
    fn tube_wraps_the_path_at_its_radius() {
        let path = ClosedPath::default_loop();
        let params = TubeParams {
            tubular_segments: 40,
            radius: 0.65,
            radial_segments: 8,
        };
        let tube = RawGeometry::tube(&path, params);
        for i in 0..40 {
            let center = path.point_at(i as f32 / 40.0);
            for j in 0..=8 {
                let v = Vec3::from(tube.vertices[i * 9 + j].position);
                assert!((v.distance(center) - 0.65).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn tube_closing_ring_matches_first() {
        let path = ClosedPath::default_loop();
        let params = TubeParams {
            tubular_segments: 30,
            radius: 0.65,
            radial_segments: 6,
        };
        let tube = RawGeometry::tube(&path, params);
        let first = &tube.vertices[..7];
        let last = &tube.vertices[30 * 7..];
        for (a, b) in first.iter().zip(last) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.normal, b.normal);
        }
    }

    #[test]
    fn torus_knot_layout_and_size() {
        let knot = RawGeometry::torus_knot(TorusKnotParams::default());
        assert_eq!(knot.vertices.len(), 51 * 9);
        assert_eq!(knot.indices.len(), 50 * 8 * 6);

        let (min, max) = knot.bounds();
        // (2 + cos) * 0.5 * radius + tube bounds the knot
        let reach = 0.03 * 1.5 + 0.01 + 1e-4;
        assert!(min.min_element() >= -reach);
        assert!(max.max_element() <= reach);
    }

    #[test]
    fn transformed_lines_move_endpoints() {
        let lines = LineGeometry {
            segments: vec![[Vec3::ZERO, Vec3::X]],
        };
        let moved = lines.transformed(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(moved.segments[0], [Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 2.0, 0.0)]);

        let mut out = Vec::new();
        moved.append_vertices(Color::WHITE, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].position, [1.0, 2.0, 0.0]);
    }
}
