//! Camera flight along the path.
//!
//! Time since start is scaled and folded into a loop, giving a path parameter
//! `p`; the camera sits at `p` and looks slightly ahead of it.

use glam::Vec3;
use serde::Deserialize;

use crate::path::{ClosedPath, wrap_unit};

/// Constants of the camera flight.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlightPlan {
    /// Multiplier applied to elapsed milliseconds.
    pub time_scale: f64,
    /// Scaled milliseconds for one full lap.
    pub loop_duration_ms: f64,
    /// Path-parameter distance between the camera and its look target.
    pub look_ahead: f32,
}

impl Default for FlightPlan {
    fn default() -> Self {
        Self {
            time_scale: 0.1,
            loop_duration_ms: 10_000.0,
            look_ahead: 0.03,
        }
    }
}

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl FlightPlan {
    /// Path parameter in `[0, 1)` for `t_ms` milliseconds since start.
    ///
    /// Computed in `f64` so long-running sessions keep their precision.
    /// Non-finite times are treated as the start.
    pub fn param_at(&self, t_ms: f64) -> f32 {
        if !t_ms.is_finite() || self.loop_duration_ms <= 0.0 {
            return 0.0;
        }
        let time = t_ms * self.time_scale;
        let p = time.rem_euclid(self.loop_duration_ms) / self.loop_duration_ms;
        let p = p as f32;
        if p >= 1.0 { 0.0 } else { p }
    }

    pub fn look_ahead_param(&self, p: f32) -> f32 {
        wrap_unit(p + self.look_ahead)
    }

    pub fn pose_at(&self, path: &ClosedPath, t_ms: f64) -> CameraPose {
        let p = self.param_at(t_ms);
        CameraPose {
            position: path.point_at(p),
            look_at: path.point_at(self.look_ahead_param(p)),
        }
    }
}

/// Value of the glow shader's time uniform, in seconds.
pub fn glow_time(t_ms: f64) -> f32 {
    if t_ms.is_finite() {
        (t_ms * 0.001) as f32
    } else {
        0.0
    }
}
