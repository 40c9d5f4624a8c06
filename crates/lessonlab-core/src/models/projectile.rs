//! # Projectile Motion
//!
//! Ballistic flight over flat ground with no drag. The lab's twist
//! variable is gravity: the same launch on the Moon or Mars shifts every
//! output through the single `gravity_mps2` parameter.

use serde::{Deserialize, Serialize};

use super::check_range;
use crate::primitives::MAX_MODEL_SAMPLES;
use crate::types::LessonError;

/// Standard Earth surface gravity, m/s².
pub const EARTH_GRAVITY_MPS2: f64 = 9.81;

/// Launch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileParams {
    /// Launch speed, m/s. Range 0–500.
    pub speed_mps: f64,
    /// Launch angle above horizontal, degrees. Range 0–90.
    pub angle_deg: f64,
    /// Surface gravity, m/s². Range 0.1–100 (Moon ≈ 1.62, Jupiter ≈ 24.8).
    pub gravity_mps2: f64,
    /// Number of trajectory sample points to return. Range 2–512.
    pub samples: usize,
}

impl Default for ProjectileParams {
    fn default() -> Self {
        Self {
            speed_mps: 30.0,
            angle_deg: 45.0,
            gravity_mps2: EARTH_GRAVITY_MPS2,
            samples: 64,
        }
    }
}

/// Computed flight characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileOutput {
    /// Horizontal distance to landing, m.
    pub range_m: f64,
    /// Peak height, m.
    pub apex_m: f64,
    /// Time of flight, s.
    pub flight_time_s: f64,
    /// `(x, y)` positions sampled uniformly in time over the flight, m.
    pub trajectory: Vec<(f64, f64)>,
}

/// Evaluate the closed-form flight equations.
pub fn evaluate(params: &ProjectileParams) -> Result<ProjectileOutput, LessonError> {
    check_range("speed_mps", params.speed_mps, 0.0, 500.0)?;
    check_range("angle_deg", params.angle_deg, 0.0, 90.0)?;
    check_range("gravity_mps2", params.gravity_mps2, 0.1, 100.0)?;
    if params.samples < 2 || params.samples > MAX_MODEL_SAMPLES {
        return Err(LessonError::InvalidParameter {
            name: "samples",
            reason: "outside documented range",
        });
    }

    let theta = params.angle_deg.to_radians();
    let v = params.speed_mps;
    let g = params.gravity_mps2;

    let vx = v * theta.cos();
    let vy = v * theta.sin();

    let flight_time_s = 2.0 * vy / g;
    let range_m = vx * flight_time_s;
    let apex_m = vy * vy / (2.0 * g);

    let n = params.samples;
    let trajectory = (0..n)
        .map(|i| {
            let t = flight_time_s * (i as f64) / ((n - 1) as f64);
            // Clamp tiny negative altitude at the endpoints to exact zero
            (vx * t, (vy * t - 0.5 * g * t * t).max(0.0))
        })
        .collect();

    Ok(ProjectileOutput {
        range_m,
        apex_m,
        flight_time_s,
        trajectory,
    })
}
