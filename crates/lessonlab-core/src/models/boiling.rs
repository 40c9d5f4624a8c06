//! # Boiling Point vs Pressure
//!
//! Clausius–Clapeyron relation integrated between a known reference
//! boiling point and an arbitrary ambient pressure:
//!
//! ```text
//! 1/T = 1/T₀ − (R/ΔH_vap) · ln(P/P₀)
//! ```
//!
//! Defaults describe water (100 °C at one standard atmosphere). The lab's
//! twist swaps the working fluid by changing the vaporization enthalpy and
//! reference point.

use serde::{Deserialize, Serialize};

use super::check_range;
use crate::types::LessonError;

/// Universal gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314_462_618;

/// Standard atmospheric pressure, kPa.
pub const STANDARD_PRESSURE_KPA: f64 = 101.325;

/// Water's boiling point at standard pressure, K.
pub const WATER_BOILING_K: f64 = 373.15;

/// Water's molar enthalpy of vaporization near boiling, J/mol.
pub const WATER_ENTHALPY_J_PER_MOL: f64 = 40_660.0;

/// Fluid and ambient parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoilingParams {
    /// Ambient pressure, kPa. Range 1–1000 (Everest ≈ 34, pressure
    /// cooker ≈ 200).
    pub pressure_kpa: f64,
    /// Reference boiling point at `reference_pressure_kpa`, K.
    /// Range 100–700.
    pub reference_boiling_k: f64,
    /// Reference pressure for the known boiling point, kPa. Range 1–1000.
    pub reference_pressure_kpa: f64,
    /// Molar enthalpy of vaporization, J/mol. Range 5000–120000.
    pub enthalpy_j_per_mol: f64,
}

impl Default for BoilingParams {
    fn default() -> Self {
        Self {
            pressure_kpa: STANDARD_PRESSURE_KPA,
            reference_boiling_k: WATER_BOILING_K,
            reference_pressure_kpa: STANDARD_PRESSURE_KPA,
            enthalpy_j_per_mol: WATER_ENTHALPY_J_PER_MOL,
        }
    }
}

/// Computed boiling point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoilingOutput {
    /// Boiling point at the ambient pressure, K.
    pub boiling_point_k: f64,
    /// Boiling point at the ambient pressure, °C.
    pub boiling_point_c: f64,
    /// Shift relative to the reference boiling point, K (negative below
    /// the reference pressure).
    pub shift_k: f64,
}

/// Evaluate the integrated Clausius–Clapeyron relation.
pub fn evaluate(params: &BoilingParams) -> Result<BoilingOutput, LessonError> {
    check_range("pressure_kpa", params.pressure_kpa, 1.0, 1000.0)?;
    check_range(
        "reference_boiling_k",
        params.reference_boiling_k,
        100.0,
        700.0,
    )?;
    check_range(
        "reference_pressure_kpa",
        params.reference_pressure_kpa,
        1.0,
        1000.0,
    )?;
    check_range(
        "enthalpy_j_per_mol",
        params.enthalpy_j_per_mol,
        5000.0,
        120_000.0,
    )?;

    let ln_ratio = (params.pressure_kpa / params.reference_pressure_kpa).ln();
    let inv_t = 1.0 / params.reference_boiling_k
        - (GAS_CONSTANT / params.enthalpy_j_per_mol) * ln_ratio;

    // A pressure low enough to drive 1/T non-positive is outside the
    // relation's validity.
    if inv_t <= 0.0 {
        return Err(LessonError::InvalidParameter {
            name: "pressure_kpa",
            reason: "outside documented range",
        });
    }

    let boiling_point_k = 1.0 / inv_t;
    Ok(BoilingOutput {
        boiling_point_k,
        boiling_point_c: boiling_point_k - 273.15,
        shift_k: boiling_point_k - params.reference_boiling_k,
    })
}
