//! Closed spline path the camera flies along.
//!
//! [`ClosedPath`] is a centripetal Catmull-Rom spline through a fixed loop of
//! control points. It is sampled by a normalized parameter `p` that is
//! proportional to arc length, so equal steps in `p` cover equal distances on
//! the curve. Any real `p` is accepted and wrapped into `[0, 1)`; the curve is
//! continuous across the wrap because the spline is closed.
//!
//! ```
//! use flythrough::ClosedPath;
//!
//! let path = ClosedPath::default_loop();
//! let a = path.point_at(0.25);
//! let b = path.point_at(1.25);
//! assert!(a.distance(b) < 1e-3);
//! ```

use glam::{Mat3, Vec3};

/// Number of samples used to build the arc-length table.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

/// Knot spacing below which a segment is treated as degenerate.
const MIN_KNOT_SPACING: f32 = 1e-4;

/// Parameter offset used to estimate tangents by finite differences.
const TANGENT_DELTA: f32 = 1e-4;

/// The loop flown by default.
#[rustfmt::skip]
pub const DEFAULT_CONTROL_POINTS: [[f32; 3]; 15] = [
    [ 10.0, -1.4,  10.4],
    [  9.1,  0.1,   0.4],
    [  8.9,  1.3,  -8.5],
    [  1.5,  2.6,  -9.8],
    [ -4.3,  1.2, -12.5],
    [-10.6, -0.6,  -9.9],
    [-12.8, -1.9,  -2.5],
    [ -9.5,  0.4,   3.6],
    [ -3.2,  2.2,   1.1],
    [  1.8,  0.9,   5.3],
    [ -1.4, -1.1,  10.9],
    [ -7.9, -0.3,  12.7],
    [ -4.8,  1.7,  17.6],
    [  2.4,  2.9,  16.2],
    [  6.7,  0.8,  14.3],
];

/// Errors raised when building a path from control points.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathError {
    #[error("a closed path needs at least 2 control points, got {0}")]
    TooFewPoints(usize),
    #[error("control point {0} is not finite")]
    NonFinite(usize),
}

/// Orthonormal frames along the path, one per sample, for sweeping a tube.
#[derive(Clone, Debug)]
pub struct PathFrames {
    pub tangents: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub binormals: Vec<Vec3>,
}

/// An immutable closed centripetal Catmull-Rom spline.
#[derive(Clone, Debug)]
pub struct ClosedPath {
    points: Vec<Vec3>,
    /// Cumulative arc length at `ARC_LENGTH_DIVISIONS + 1` evenly spaced curve parameters.
    arc_lengths: Vec<f32>,
}

impl ClosedPath {
    /// Builds a closed path through `points`, in order.
    pub fn new(points: Vec<Vec3>) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewPoints(points.len()));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(PathError::NonFinite(i));
        }

        Ok(Self::from_points_unchecked(points))
    }

    /// Builds a path from plain `[x, y, z]` triples.
    pub fn from_arrays(points: &[[f32; 3]]) -> Result<Self, PathError> {
        Self::new(points.iter().copied().map(Vec3::from).collect())
    }

    /// The built-in flight loop.
    pub fn default_loop() -> Self {
        Self::from_points_unchecked(
            DEFAULT_CONTROL_POINTS.iter().copied().map(Vec3::from).collect(),
        )
    }

    /// Caller guarantees at least two finite points.
    fn from_points_unchecked(points: Vec<Vec3>) -> Self {
        let mut path = Self {
            points,
            arc_lengths: Vec::new(),
        };
        path.arc_lengths = path.measure(ARC_LENGTH_DIVISIONS);
        path
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    /// Total length of the loop.
    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Position at arc-length fraction `p`. `p` is wrapped into `[0, 1)`.
    pub fn point_at(&self, p: f32) -> Vec3 {
        self.point(self.arc_to_curve(wrap_unit(p)))
    }

    /// Unit tangent at arc-length fraction `p`.
    pub fn tangent_at(&self, p: f32) -> Vec3 {
        self.tangent(self.arc_to_curve(wrap_unit(p)))
    }

    /// `divisions + 1` points evenly spaced along the arc, first and last coinciding.
    pub fn points(&self, divisions: usize) -> Vec<Vec3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point_at_unwrapped(i as f32 / divisions as f32))
            .collect()
    }

    /// Position at raw curve parameter `t`, where each control point owns an
    /// equal share of `[0, 1)` regardless of segment length.
    pub fn point(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        let scaled = n as f32 * wrap_unit(t);
        let segment = (scaled.floor() as usize).min(n - 1);
        let weight = scaled - segment as f32;

        let p0 = self.points[(segment + n - 1) % n];
        let p1 = self.points[segment];
        let p2 = self.points[(segment + 1) % n];
        let p3 = self.points[(segment + 2) % n];

        // Centripetal parameterization: knot spacing is sqrt of chord length
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let m1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let m2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        hermite(p1, p2, m1, m2, weight)
    }

    /// Parallel-transport frames at `segments + 1` evenly spaced arc positions,
    /// twisted so the final frame lines up with the first.
    pub fn frenet_frames(&self, segments: usize) -> PathFrames {
        let segments = segments.max(1);
        let tangents: Vec<Vec3> = (0..=segments)
            .map(|i| self.tangent(self.arc_to_curve(i as f32 / segments as f32)))
            .collect();

        let mut normals = Vec::with_capacity(segments + 1);
        let mut binormals = Vec::with_capacity(segments + 1);

        // Seed the first normal from the axis the tangent is least aligned with
        let t0 = tangents[0];
        let abs = t0.abs();
        let mut min = f32::MAX;
        let mut axis = Vec3::X;
        if abs.x <= min {
            min = abs.x;
            axis = Vec3::X;
        }
        if abs.y <= min {
            min = abs.y;
            axis = Vec3::Y;
        }
        if abs.z <= min {
            axis = Vec3::Z;
        }
        let side = t0.cross(axis).normalize_or_zero();
        let n0 = t0.cross(side);
        normals.push(n0);
        binormals.push(t0.cross(n0));

        for i in 1..=segments {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(tangents[i]);
            if axis.length() > f32::EPSILON {
                let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = Mat3::from_axis_angle(axis.normalize(), theta) * normal;
            }
            normals.push(normal);
            binormals.push(tangents[i].cross(normal));
        }

        // Spread the residual twist over the loop so the seam closes
        let mut theta = normals[0].dot(normals[segments]).clamp(-1.0, 1.0).acos() / segments as f32;
        if tangents[0].dot(normals[0].cross(normals[segments])) > 0.0 {
            theta = -theta;
        }
        for i in 1..=segments {
            normals[i] = Mat3::from_axis_angle(tangents[i], theta * i as f32) * normals[i];
            binormals[i] = tangents[i].cross(normals[i]);
        }

        PathFrames {
            tangents,
            normals,
            binormals,
        }
    }

    /// Like [`point_at`](Self::point_at) but maps `p = 1.0` to the end of the
    /// loop instead of wrapping, so sampled polylines close explicitly.
    fn point_at_unwrapped(&self, p: f32) -> Vec3 {
        self.point(self.arc_to_curve(p.clamp(0.0, 1.0)))
    }

    fn tangent(&self, t: f32) -> Vec3 {
        let a = self.point(t - TANGENT_DELTA);
        let b = self.point(t + TANGENT_DELTA);
        (b - a).normalize_or(Vec3::Z)
    }

    fn measure(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for i in 1..=divisions {
            let current = self.point(i as f32 / divisions as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    /// Maps an arc-length fraction in `[0, 1]` to the curve parameter.
    fn arc_to_curve(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let last = lengths.len() - 1;
        let total = lengths[last];
        if total <= 0.0 {
            return u;
        }

        let target = u * total;
        // Largest index whose cumulative length does not exceed the target
        let i = lengths
            .partition_point(|&l| l <= target)
            .saturating_sub(1)
            .min(last);

        if i == last || lengths[i] == target {
            return i as f32 / last as f32;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f32 + fraction) / last as f32
    }
}

/// Wraps any real number into `[0, 1)`. Non-finite input maps to 0.
pub fn wrap_unit(p: f32) -> f32 {
    if !p.is_finite() {
        return 0.0;
    }
    let wrapped = p.rem_euclid(1.0);
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

fn hermite(p1: Vec3, p2: Vec3, m1: Vec3, m2: Vec3, t: f32) -> Vec3 {
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2;
    let c3 = 2.0 * p1 - 2.0 * p2 + m1 + m2;
    p1 + m1 * t + c2 * (t * t) + c3 * (t * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_points() {
        assert_eq!(
            ClosedPath::new(vec![Vec3::ZERO]).unwrap_err(),
            PathError::TooFewPoints(1)
        );
        assert_eq!(
            ClosedPath::new(Vec::new()).unwrap_err(),
            PathError::TooFewPoints(0)
        );
    }

    #[test]
    fn rejects_non_finite_points() {
        let err = ClosedPath::new(vec![Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE])
            .unwrap_err();
        assert_eq!(err, PathError::NonFinite(1));
    }

    #[test]
    fn passes_through_control_points() {
        let path = ClosedPath::default_loop();
        let n = DEFAULT_CONTROL_POINTS.len();
        for (i, p) in DEFAULT_CONTROL_POINTS.iter().enumerate() {
            let on_curve = path.point(i as f32 / n as f32);
            assert!(on_curve.distance(Vec3::from(*p)) < 1e-4, "point {i}");
        }
    }

    #[test]
    fn point_at_is_periodic() {
        let path = ClosedPath::default_loop();
        for i in 0..50 {
            let p = i as f32 / 50.0;
            let base = path.point_at(p);
            for shift in [1.0, -1.0, 3.0] {
                let shifted = path.point_at(p + shift);
                assert!(
                    base.distance(shifted) < 1e-2,
                    "p = {p}, shift = {shift}: {base} vs {shifted}"
                );
            }
        }
    }

    #[test]
    fn point_at_is_continuous() {
        let path = ClosedPath::default_loop();
        let steps = 5000;
        let step = 1.0 / steps as f32;
        // An arc-length step should move roughly step * length
        let bound = path.length() * step * 2.0;
        for i in 0..=steps {
            let p = i as f32 * step;
            let a = path.point_at(p);
            let b = path.point_at(p + step);
            assert!(a.distance(b) < bound, "jump at p = {p}");
        }
    }

    #[test]
    fn seam_is_continuous() {
        let path = ClosedPath::default_loop();
        let before = path.point_at(-1e-4);
        let after = path.point_at(1e-4);
        assert!(before.distance(after) < 0.05);
        assert!(path.point_at(0.0).distance(path.point_at(1.0)) < 1e-5);
    }

    #[test]
    fn arc_length_parameter_is_uniform() {
        let path = ClosedPath::default_loop();
        let samples = path.points(100);
        let expected = path.length() / 100.0;
        for pair in samples.windows(2) {
            let d = pair[0].distance(pair[1]);
            assert!((d - expected).abs() < expected * 0.1, "{d} vs {expected}");
        }
    }

    #[test]
    fn points_close_the_loop() {
        let path = ClosedPath::default_loop();
        let samples = path.points(64);
        assert_eq!(samples.len(), 65);
        assert!(samples[0].distance(samples[64]) < 1e-4);
    }

    #[test]
    fn tangents_are_unit_and_forward() {
        let path = ClosedPath::default_loop();
        for i in 0..20 {
            let p = i as f32 / 20.0;
            let t = path.tangent_at(p);
            assert!((t.length() - 1.0).abs() < 1e-4);
            let ahead = path.point_at(p + 0.001) - path.point_at(p);
            assert!(t.dot(ahead) > 0.0);
        }
    }

    #[test]
    fn frames_are_orthonormal_and_closed() {
        let path = ClosedPath::default_loop();
        let frames = path.frenet_frames(120);
        assert_eq!(frames.tangents.len(), 121);
        for i in 0..=120 {
            let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
            assert!(t.dot(n).abs() < 1e-2, "frame {i}");
            assert!((n.length() - 1.0).abs() < 1e-2);
            assert!((b.length() - 1.0).abs() < 1e-2);
        }
        assert!(frames.normals[0].distance(frames.normals[120]) < 1e-2);
    }

    #[test]
    fn coincident_points_do_not_produce_nan() {
        let path = ClosedPath::new(vec![Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::Y]).unwrap();
        for i in 0..10 {
            assert!(path.point_at(i as f32 / 10.0).is_finite());
        }
    }

    #[test]
    fn default_loop_matches_checked_construction() {
        let built = ClosedPath::from_arrays(&DEFAULT_CONTROL_POINTS).unwrap();
        let default = ClosedPath::default_loop();
        assert_eq!(built.control_points(), default.control_points());
        assert_eq!(built.length(), default.length());
        assert_eq!(built.point_at(0.37), default.point_at(0.37));
    }

    #[test]
    fn wrap_unit_handles_edges() {
        assert_eq!(wrap_unit(1.0), 0.0);
        assert_eq!(wrap_unit(f32::NAN), 0.0);
        assert_eq!(wrap_unit(f32::INFINITY), 0.0);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-6);
        assert!(wrap_unit(-1e-9) < 1.0);
    }
}
