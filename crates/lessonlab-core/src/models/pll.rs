//! # Phase-Locked-Loop Lock Dynamics
//!
//! Linearized second-order PLL approximations: how fast the loop settles
//! onto a reference and how large a frequency step it can capture. The
//! lab's twist variable is the damping ratio — underdamped loops ring,
//! overdamped loops crawl.

use serde::{Deserialize, Serialize};

use super::check_range;
use crate::primitives::MAX_MODEL_SAMPLES;
use crate::types::LessonError;

const TAU: f64 = std::f64::consts::TAU;

/// Loop parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PllParams {
    /// Loop natural frequency, Hz. Range 1 Hz – 10 MHz.
    pub natural_frequency_hz: f64,
    /// Damping ratio ζ. Range 0.05–5 (0.707 is the classic choice).
    pub damping_ratio: f64,
    /// Initial frequency offset between VCO and reference, Hz.
    /// Range 0 – 100 MHz.
    pub frequency_step_hz: f64,
    /// Number of phase-error envelope samples to return. Range 2–512.
    pub samples: usize,
}

impl Default for PllParams {
    fn default() -> Self {
        Self {
            natural_frequency_hz: 1000.0,
            damping_ratio: std::f64::consts::FRAC_1_SQRT_2,
            frequency_step_hz: 500.0,
            samples: 64,
        }
    }
}

/// Computed lock characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PllOutput {
    /// Time for the phase-error envelope to settle within 1%, s.
    pub lock_time_s: f64,
    /// Approximate one-shot capture range, Hz (2ζωₙ expressed in Hz).
    pub capture_range_hz: f64,
    /// Whether the requested frequency step falls inside the capture
    /// range (lock without cycle slips).
    pub captures_step: bool,
    /// Normalized phase-error envelope `e^(−ζωₙt)` sampled uniformly over
    /// the lock time: `(t_seconds, envelope)` pairs.
    pub error_envelope: Vec<(f64, f64)>,
}

/// Evaluate the linearized lock approximations.
pub fn evaluate(params: &PllParams) -> Result<PllOutput, LessonError> {
    check_range(
        "natural_frequency_hz",
        params.natural_frequency_hz,
        1.0,
        1.0e7,
    )?;
    check_range("damping_ratio", params.damping_ratio, 0.05, 5.0)?;
    check_range("frequency_step_hz", params.frequency_step_hz, 0.0, 1.0e8)?;
    if params.samples < 2 || params.samples > MAX_MODEL_SAMPLES {
        return Err(LessonError::InvalidParameter {
            name: "samples",
            reason: "outside documented range",
        });
    }

    let omega_n = TAU * params.natural_frequency_hz;
    let zeta = params.damping_ratio;

    // Envelope decays as e^(−ζωₙt); 1% settling takes ln(100) time
    // constants.
    let lock_time_s = (100.0_f64).ln() / (zeta * omega_n);

    // Gardner's rule of thumb for the lock-in (no cycle slip) range.
    let capture_range_hz = 2.0 * zeta * params.natural_frequency_hz;
    let captures_step = params.frequency_step_hz <= capture_range_hz;

    let n = params.samples;
    let error_envelope = (0..n)
        .map(|i| {
            let t = lock_time_s * (i as f64) / ((n - 1) as f64);
            (t, (-zeta * omega_n * t).exp())
        })
        .collect();

    Ok(PllOutput {
        lock_time_s,
        capture_range_hz,
        captures_step,
        error_envelope,
    })
}
