//! # Lesson Models
//!
//! The closed-form formulas behind each lesson family's interactive lab,
//! as pure parameter→output evaluations behind one tagged union.
//!
//! Every parameter is validated (finite, within its documented range)
//! before any arithmetic; a bad input is a typed error, never a NaN that
//! leaks into a visualization.

pub mod boiling;
pub mod estimate;
pub mod overlay;
pub mod pll;
pub mod projectile;

use serde::{Deserialize, Serialize};

use crate::types::LessonError;

// =============================================================================
// MODEL KIND
// =============================================================================

/// Which closed-form model a lesson family drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Ballistic flight over flat ground.
    Projectile,
    /// Second-order phase-locked-loop lock dynamics.
    PllLock,
    /// Boiling point vs ambient pressure (Clausius–Clapeyron).
    BoilingPoint,
    /// Lithography overlay error budget.
    OverlayError,
    /// Assumption-tracked engineering estimate.
    Estimate,
}

impl ModelKind {
    /// Stable snake_case wire key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            ModelKind::Projectile => "projectile",
            ModelKind::PllLock => "pll_lock",
            ModelKind::BoilingPoint => "boiling_point",
            ModelKind::OverlayError => "overlay_error",
            ModelKind::Estimate => "estimate",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// EVALUATION UNION
// =============================================================================

/// One model evaluation request (tagged union).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelRequest {
    Projectile(projectile::ProjectileParams),
    PllLock(pll::PllParams),
    BoilingPoint(boiling::BoilingParams),
    OverlayError(overlay::OverlayParams),
    Estimate(estimate::EstimateParams),
}

impl ModelRequest {
    /// The model this request targets.
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelRequest::Projectile(_) => ModelKind::Projectile,
            ModelRequest::PllLock(_) => ModelKind::PllLock,
            ModelRequest::BoilingPoint(_) => ModelKind::BoilingPoint,
            ModelRequest::OverlayError(_) => ModelKind::OverlayError,
            ModelRequest::Estimate(_) => ModelKind::Estimate,
        }
    }
}

/// One model evaluation result (tagged union).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelResponse {
    Projectile(projectile::ProjectileOutput),
    PllLock(pll::PllOutput),
    BoilingPoint(boiling::BoilingOutput),
    OverlayError(overlay::OverlayOutput),
    Estimate(estimate::EstimateOutput),
}

/// Evaluate one request against its model.
pub fn evaluate(request: &ModelRequest) -> Result<ModelResponse, LessonError> {
    match request {
        ModelRequest::Projectile(params) => {
            projectile::evaluate(params).map(ModelResponse::Projectile)
        }
        ModelRequest::PllLock(params) => pll::evaluate(params).map(ModelResponse::PllLock),
        ModelRequest::BoilingPoint(params) => {
            boiling::evaluate(params).map(ModelResponse::BoilingPoint)
        }
        ModelRequest::OverlayError(params) => {
            overlay::evaluate(params).map(ModelResponse::OverlayError)
        }
        ModelRequest::Estimate(params) => estimate::evaluate(params).map(ModelResponse::Estimate),
    }
}

// =============================================================================
// PARAMETER VALIDATION HELPERS
// =============================================================================

/// Reject non-finite or out-of-range parameters before any arithmetic.
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), LessonError> {
    if !value.is_finite() {
        return Err(LessonError::InvalidParameter {
            name,
            reason: "must be finite",
        });
    }
    if value < min || value > max {
        return Err(LessonError::InvalidParameter {
            name,
            reason: "outside documented range",
        });
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_model_tag() {
        let request = ModelRequest::BoilingPoint(boiling::BoilingParams {
            pressure_kpa: 70.0,
            ..boiling::BoilingParams::default()
        });
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["model"], "boiling_point");
        assert_eq!(json["pressure_kpa"], 70.0);
    }

    #[test]
    fn evaluate_dispatches_to_matching_model() {
        let request = ModelRequest::Projectile(projectile::ProjectileParams::default());
        let response = evaluate(&request).expect("evaluate");
        assert!(matches!(response, ModelResponse::Projectile(_)));
    }

    #[test]
    fn check_range_rejects_nan_and_bounds() {
        assert!(check_range("x", f64::NAN, 0.0, 1.0).is_err());
        assert!(check_range("x", f64::INFINITY, 0.0, 1.0).is_err());
        assert!(check_range("x", -0.5, 0.0, 1.0).is_err());
        assert!(check_range("x", 0.5, 0.0, 1.0).is_ok());
    }
}
