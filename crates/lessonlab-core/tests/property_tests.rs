//! # Property-Based Tests
//!
//! Verification tests using proptest.
//!
//! These tests ensure determinism and correctness invariants of the stage
//! sequence, the controller, the models, and the snapshot format.

use std::sync::Arc;

use lessonlab_core::formats::{snapshot_from_bytes, snapshot_to_bytes};
use lessonlab_core::models::projectile::{self, ProjectileParams};
use lessonlab_core::models::{boiling, estimate, overlay, pll};
use lessonlab_core::{
    ALL_STAGES, ControllerConfig, JumpPolicy, ManualClock, MemorySink, PhaseController, Stage,
    TransitionOutcome,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_stage() -> impl Strategy<Value = Stage> {
    (0..ALL_STAGES.len()).prop_map(|i| ALL_STAGES[i])
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Resume hints round-trip for every stage key, and everything else
    /// resolves to hook.
    #[test]
    fn resume_hint_round_trip_or_hook(stage in arb_stage(), junk in ".{0,20}") {
        prop_assert_eq!(Stage::from_resume_hint(Some(stage.key())), stage);

        let resolved = Stage::from_resume_hint(Some(&junk));
        if Stage::parse_key(&junk).is_none() {
            prop_assert_eq!(resolved, Stage::Hook);
        }
    }

    /// The current stage always stays inside the fixed set and the visited
    /// set always contains it, whatever request sequence arrives.
    #[test]
    fn controller_never_leaves_the_stage_set(
        targets in vec(arb_stage(), 1..50),
        debounce_ms in 0u64..1000,
        visited_only in any::<bool>(),
    ) {
        let clock = Arc::new(ManualClock::new());
        let config = ControllerConfig {
            debounce_ms,
            jump_policy: if visited_only {
                JumpPolicy::VisitedOnly
            } else {
                JumpPolicy::Unrestricted
            },
        };
        let mut ctrl =
            PhaseController::with_clock(config, None, Box::new(Arc::clone(&clock)));
        let mut sink = MemorySink::new();

        for target in targets {
            ctrl.go_to(target, &mut sink);
            clock.advance(37);
            prop_assert!(ALL_STAGES.contains(&ctrl.current()));
            prop_assert!(ctrl.visited().contains(&ctrl.current()));
        }
    }

    /// Exactly one event is emitted per committed transition: event count
    /// equals commit count, whatever the request mix.
    #[test]
    fn one_event_per_commit(
        targets in vec(arb_stage(), 1..50),
        advances in vec(any::<u64>(), 1..50),
    ) {
        let clock = Arc::new(ManualClock::new());
        let config = ControllerConfig::default();
        let mut ctrl =
            PhaseController::with_clock(config, None, Box::new(Arc::clone(&clock)));
        let mut sink = MemorySink::new();

        let mut commits = 0usize;
        for (target, advance) in targets.iter().zip(advances.iter()) {
            if ctrl.go_to(*target, &mut sink) == TransitionOutcome::Committed {
                commits += 1;
            }
            clock.advance(advance % 700);
        }
        prop_assert_eq!(sink.len(), commits);
    }

    /// Within a debounce window at most one transition commits.
    #[test]
    fn debounce_window_commits_at_most_once(
        targets in vec(arb_stage(), 2..20),
        debounce_ms in 100u64..2000,
    ) {
        let clock = Arc::new(ManualClock::new());
        let config = ControllerConfig {
            debounce_ms,
            jump_policy: JumpPolicy::Unrestricted,
        };
        let mut ctrl =
            PhaseController::with_clock(config, None, Box::new(Arc::clone(&clock)));
        let mut sink = MemorySink::new();

        // All requests arrive inside one window (the clock never advances)
        let commits = targets
            .iter()
            .filter(|t| ctrl.go_to(**t, &mut sink) == TransitionOutcome::Committed)
            .count();
        prop_assert!(commits <= 1);
    }

    /// Projectile range is symmetric around 45 degrees and flight stays
    /// non-negative.
    #[test]
    fn projectile_range_symmetric_about_45(
        speed in 1.0f64..200.0,
        delta in 0.0f64..40.0,
    ) {
        let low = projectile::evaluate(&ProjectileParams {
            speed_mps: speed,
            angle_deg: 45.0 - delta,
            ..ProjectileParams::default()
        })
        .expect("low angle");
        let high = projectile::evaluate(&ProjectileParams {
            speed_mps: speed,
            angle_deg: 45.0 + delta,
            ..ProjectileParams::default()
        })
        .expect("high angle");

        let scale = low.range_m.abs().max(1.0);
        prop_assert!((low.range_m - high.range_m).abs() / scale < 1e-9);
        prop_assert!(low.range_m >= 0.0);
        prop_assert!(low.apex_m >= 0.0);
    }

    /// Boiling point rises monotonically with pressure for any valid fluid.
    #[test]
    fn boiling_point_monotonic_in_pressure(
        p1 in 5.0f64..900.0,
        dp in 1.0f64..100.0,
        enthalpy in 20_000.0f64..80_000.0,
    ) {
        let base = boiling::BoilingParams {
            enthalpy_j_per_mol: enthalpy,
            ..boiling::BoilingParams::default()
        };
        let lower = boiling::evaluate(&boiling::BoilingParams {
            pressure_kpa: p1,
            ..base
        })
        .expect("lower pressure");
        let higher = boiling::evaluate(&boiling::BoilingParams {
            pressure_kpa: p1 + dp,
            ..base
        })
        .expect("higher pressure");
        prop_assert!(higher.boiling_point_k > lower.boiling_point_k);
    }

    /// PLL lock time shrinks as natural frequency grows, damping fixed.
    #[test]
    fn pll_lock_time_monotonic(
        f1 in 10.0f64..1.0e5,
        factor in 1.5f64..100.0,
        zeta in 0.1f64..3.0,
    ) {
        let slow = pll::evaluate(&pll::PllParams {
            natural_frequency_hz: f1,
            damping_ratio: zeta,
            ..pll::PllParams::default()
        })
        .expect("slow");
        let fast = pll::evaluate(&pll::PllParams {
            natural_frequency_hz: f1 * factor,
            damping_ratio: zeta,
            ..pll::PllParams::default()
        })
        .expect("fast");
        prop_assert!(fast.lock_time_s < slow.lock_time_s);
    }

    /// Overlay residual never shrinks when any single contributor grows.
    #[test]
    fn overlay_residual_monotonic_in_translation(
        tx in 0.0f64..400.0,
        grow in 1.0f64..100.0,
    ) {
        let base = overlay::evaluate(&overlay::OverlayParams {
            translation_x_nm: tx,
            ..overlay::OverlayParams::default()
        })
        .expect("base");
        let grown = overlay::evaluate(&overlay::OverlayParams {
            translation_x_nm: tx + grow,
            ..overlay::OverlayParams::default()
        })
        .expect("grown");
        prop_assert!(grown.residual_nm >= base.residual_nm);
    }

    /// Worst-case estimate bounds always bracket the point estimate.
    #[test]
    fn estimate_bounds_bracket(
        values in vec(0.1f64..1000.0, 1..8),
        uncertainties in vec(1.0f64..80.0, 1..8),
    ) {
        let assumptions: Vec<_> = values
            .iter()
            .zip(uncertainties.iter())
            .map(|(v, u)| estimate::Assumption {
                name: "factor".to_string(),
                value: *v,
                uncertainty_percent: *u,
            })
            .collect();
        let out = estimate::evaluate(&estimate::EstimateParams { assumptions })
            .expect("evaluate");
        prop_assert!(out.worst_case_low < out.estimate);
        prop_assert!(out.estimate < out.worst_case_high);
    }

    /// Snapshot bytes round-trip for arbitrary controller positions.
    #[test]
    fn snapshot_round_trips_any_position(
        stage in arb_stage(),
        slider_values in vec(0.0f64..100.0, 0..10),
    ) {
        use lessonlab_core::{ChoiceIndex, LessonId, QuizState, SessionSnapshot};

        let snapshot = SessionSnapshot {
            lesson_id: LessonId::new("pll_lock"),
            stage,
            visited: ALL_STAGES.iter().copied().filter(|s| *s <= stage).collect(),
            config: ControllerConfig::default(),
            sliders: slider_values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("s{i}"), *v))
                .collect(),
            prediction: Some(ChoiceIndex::new(1)),
            twist_prediction: None,
            quiz_state: QuizState::new(),
            quiz_outcome: None,
            viewed_applications: [0u8, 2].into_iter().collect(),
        };

        let bytes = snapshot_to_bytes(&snapshot).expect("serialize");
        let restored = snapshot_from_bytes(&bytes).expect("deserialize");
        prop_assert_eq!(restored, snapshot);
    }
}
