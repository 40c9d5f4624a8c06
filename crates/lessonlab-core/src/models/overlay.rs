//! # Lithography Overlay Error
//!
//! Overlay budget arithmetic for a stepper field: translation, rotation,
//! and magnification terms combine root-sum-square into a worst-case
//! edge-of-field residual, compared against the layer's overlay budget.
//! The alignment-mark visualization shows two circles whose overlap
//! fraction shrinks as the residual grows.

use serde::{Deserialize, Serialize};

use super::check_range;
use crate::types::LessonError;

/// Per-field alignment errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayParams {
    /// Field translation error in x, nm. Range −500–500.
    pub translation_x_nm: f64,
    /// Field translation error in y, nm. Range −500–500.
    pub translation_y_nm: f64,
    /// Field rotation error, microradians. Range −50–50.
    pub rotation_urad: f64,
    /// Magnification error, parts per million. Range −50–50.
    pub magnification_ppm: f64,
    /// Field radius where rotation/magnification bite hardest, mm.
    /// Range 1–20.
    pub field_radius_mm: f64,
    /// Layer overlay budget (alignment-circle radius), nm. Range 1–500.
    pub budget_nm: f64,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            translation_x_nm: 5.0,
            translation_y_nm: 5.0,
            rotation_urad: 1.0,
            magnification_ppm: 1.0,
            field_radius_mm: 13.0,
            budget_nm: 30.0,
        }
    }
}

/// Computed overlay residual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayOutput {
    /// Edge-of-field rotation contribution, nm.
    pub rotation_nm: f64,
    /// Edge-of-field magnification contribution, nm.
    pub magnification_nm: f64,
    /// Root-sum-square residual at the field edge, nm.
    pub residual_nm: f64,
    /// Whether the residual fits the layer budget.
    pub within_budget: bool,
    /// Overlap fraction (0–1) of two budget-radius alignment circles
    /// offset by the residual.
    pub overlap_fraction: f64,
}

/// Evaluate the overlay budget.
pub fn evaluate(params: &OverlayParams) -> Result<OverlayOutput, LessonError> {
    check_range("translation_x_nm", params.translation_x_nm, -500.0, 500.0)?;
    check_range("translation_y_nm", params.translation_y_nm, -500.0, 500.0)?;
    check_range("rotation_urad", params.rotation_urad, -50.0, 50.0)?;
    check_range("magnification_ppm", params.magnification_ppm, -50.0, 50.0)?;
    check_range("field_radius_mm", params.field_radius_mm, 1.0, 20.0)?;
    check_range("budget_nm", params.budget_nm, 1.0, 500.0)?;

    // 1 µrad over 1 mm displaces 1 nm; same for 1 ppm. The mm→nm and
    // µ→abs factors cancel exactly.
    let rotation_nm = params.rotation_urad.abs() * params.field_radius_mm;
    let magnification_nm = params.magnification_ppm.abs() * params.field_radius_mm;

    let residual_nm = (params.translation_x_nm * params.translation_x_nm
        + params.translation_y_nm * params.translation_y_nm
        + rotation_nm * rotation_nm
        + magnification_nm * magnification_nm)
        .sqrt();

    Ok(OverlayOutput {
        rotation_nm,
        magnification_nm,
        residual_nm,
        within_budget: residual_nm <= params.budget_nm,
        overlap_fraction: circle_overlap_fraction(params.budget_nm, residual_nm),
    })
}

/// Fraction of one circle's area shared by another of equal radius `r`
/// whose center is offset by `d` (standard lens formula).
fn circle_overlap_fraction(r: f64, d: f64) -> f64 {
    if d >= 2.0 * r {
        return 0.0;
    }
    if d <= 0.0 {
        return 1.0;
    }
    let half = d / 2.0;
    let lens = 2.0 * r * r * (half / r).acos() - half * (4.0 * r * r - d * d).sqrt();
    lens / (std::f64::consts::PI * r * r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_alignment_fully_overlaps() {
        let out = evaluate(&OverlayParams {
            translation_x_nm: 0.0,
            translation_y_nm: 0.0,
            rotation_urad: 0.0,
            magnification_ppm: 0.0,
            ..OverlayParams::default()
        })
        .expect("evaluate");
        assert!(out.residual_nm.abs() < 1e-12);
        assert!(out.within_budget);
        assert!((out.overlap_fraction - 1.0).abs() < 1e-12);
    }

    #[test]
    fn translation_only_residual_is_euclidean() {
        let out = evaluate(&OverlayParams {
            translation_x_nm: 3.0,
            translation_y_nm: 4.0,
            rotation_urad: 0.0,
            magnification_ppm: 0.0,
            ..OverlayParams::default()
        })
        .expect("evaluate");
        assert!((out.residual_nm - 5.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_scales_with_field_radius() {
        let narrow = evaluate(&OverlayParams {
            field_radius_mm: 5.0,
            ..OverlayParams::default()
        })
        .expect("narrow");
        let wide = evaluate(&OverlayParams {
            field_radius_mm: 20.0,
            ..OverlayParams::default()
        })
        .expect("wide");
        assert!(wide.rotation_nm > narrow.rotation_nm);
        assert!(wide.residual_nm > narrow.residual_nm);
    }

    #[test]
    fn blown_budget_flags_and_shrinks_overlap() {
        let out = evaluate(&OverlayParams {
            translation_x_nm: 100.0,
            budget_nm: 30.0,
            ..OverlayParams::default()
        })
        .expect("evaluate");
        assert!(!out.within_budget);
        assert!(out.overlap_fraction < 0.1);
    }

    #[test]
    fn overlap_fraction_edge_cases() {
        assert!((circle_overlap_fraction(10.0, 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(circle_overlap_fraction(10.0, 20.0), 0.0);
        assert_eq!(circle_overlap_fraction(10.0, 25.0), 0.0);
        // Halfway offset overlaps somewhere between 0 and 1
        let f = circle_overlap_fraction(10.0, 10.0);
        assert!(f > 0.3 && f < 0.5);
    }

    #[test]
    fn out_of_range_rotation_rejected() {
        let params = OverlayParams {
            rotation_urad: 80.0,
            ..OverlayParams::default()
        };
        assert!(evaluate(&params).is_err());
    }
}
