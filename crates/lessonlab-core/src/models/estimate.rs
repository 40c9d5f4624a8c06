//! # Assumption-Tracked Estimation
//!
//! Fermi-style engineering estimates: a point value built as a product of
//! assumption factors, each carrying its own uncertainty. The lesson's
//! point is that the *combination rule* matters — worst-case interval
//! stacking explodes while independent errors add root-sum-square.

use serde::{Deserialize, Serialize};

use super::check_range;
use crate::types::LessonError;

/// Maximum number of assumption factors in one estimate.
const MAX_FACTORS: usize = 16;

/// One assumption in the estimate chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    /// Short label ("commute distance", "cars per household").
    pub name: String,
    /// Point value of the factor. Range 1e-9–1e12, strictly positive.
    pub value: f64,
    /// Relative uncertainty, percent. Range 0–90.
    pub uncertainty_percent: f64,
}

/// The estimate chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateParams {
    /// Assumption factors; the estimate is their product.
    pub assumptions: Vec<Assumption>,
}

impl Default for EstimateParams {
    fn default() -> Self {
        Self {
            assumptions: vec![
                Assumption {
                    name: "population".into(),
                    value: 1.0e6,
                    uncertainty_percent: 10.0,
                },
                Assumption {
                    name: "fraction affected".into(),
                    value: 0.3,
                    uncertainty_percent: 30.0,
                },
                Assumption {
                    name: "events per person".into(),
                    value: 2.0,
                    uncertainty_percent: 20.0,
                },
            ],
        }
    }
}

/// Computed estimate with both error-combination rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateOutput {
    /// Product of all assumption values.
    pub estimate: f64,
    /// Lower bound with every assumption at its pessimistic extreme.
    pub worst_case_low: f64,
    /// Upper bound with every assumption at its optimistic extreme.
    pub worst_case_high: f64,
    /// Root-sum-square relative uncertainty, percent.
    pub rss_percent: f64,
    /// Name of the assumption contributing the most uncertainty.
    pub dominant_assumption: String,
}

/// Evaluate the estimate chain.
pub fn evaluate(params: &EstimateParams) -> Result<EstimateOutput, LessonError> {
    if params.assumptions.is_empty() || params.assumptions.len() > MAX_FACTORS {
        return Err(LessonError::LimitExceeded("estimate assumptions"));
    }

    let mut estimate = 1.0;
    let mut worst_case_low = 1.0;
    let mut worst_case_high = 1.0;
    let mut sum_squares = 0.0;
    let mut dominant: (&str, f64) = ("", -1.0);

    for assumption in &params.assumptions {
        check_range("value", assumption.value, 1.0e-9, 1.0e12)?;
        check_range(
            "uncertainty_percent",
            assumption.uncertainty_percent,
            0.0,
            90.0,
        )?;

        let u = assumption.uncertainty_percent / 100.0;
        estimate *= assumption.value;
        worst_case_low *= assumption.value * (1.0 - u);
        worst_case_high *= assumption.value * (1.0 + u);
        sum_squares += u * u;

        if assumption.uncertainty_percent > dominant.1 {
            dominant = (&assumption.name, assumption.uncertainty_percent);
        }
    }

    Ok(EstimateOutput {
        estimate,
        worst_case_low,
        worst_case_high,
        rss_percent: sum_squares.sqrt() * 100.0,
        dominant_assumption: dominant.0.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(value: f64, uncertainty: f64) -> EstimateParams {
        EstimateParams {
            assumptions: vec![Assumption {
                name: "only".into(),
                value,
                uncertainty_percent: uncertainty,
            }],
        }
    }

    #[test]
    fn single_factor_is_identity() {
        let out = evaluate(&single(42.0, 10.0)).expect("evaluate");
        assert!((out.estimate - 42.0).abs() < 1e-12);
        assert!((out.worst_case_low - 37.8).abs() < 1e-9);
        assert!((out.worst_case_high - 46.2).abs() < 1e-9);
        assert!((out.rss_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rss_is_tighter_than_worst_case() {
        let out = evaluate(&EstimateParams::default()).expect("evaluate");
        // Worst-case relative spread
        let worst_spread = (out.worst_case_high - out.worst_case_low) / out.estimate;
        // RSS of 10/30/20 percent = sqrt(0.01+0.09+0.04) ≈ 37.4%
        assert!((out.rss_percent - 37.416_573_867_739_41).abs() < 1e-6);
        assert!(worst_spread * 100.0 > 2.0 * out.rss_percent);
    }

    #[test]
    fn dominant_assumption_is_largest_uncertainty() {
        let out = evaluate(&EstimateParams::default()).expect("evaluate");
        assert_eq!(out.dominant_assumption, "fraction affected");
    }

    #[test]
    fn bounds_bracket_the_estimate() {
        let out = evaluate(&EstimateParams::default()).expect("evaluate");
        assert!(out.worst_case_low < out.estimate);
        assert!(out.estimate < out.worst_case_high);
    }

    #[test]
    fn empty_and_invalid_chains_rejected() {
        assert!(evaluate(&EstimateParams { assumptions: vec![] }).is_err());
        assert!(evaluate(&single(-1.0, 10.0)).is_err());
        assert!(evaluate(&single(1.0, 95.0)).is_err());
    }
}
