//! # Lesson Catalog
//!
//! The five lesson families as data: identity, copy for the hook,
//! prediction prompts for the predict and twist_predict stages, the
//! scored quiz, the model kind the lab drives, and the transfer-stage
//! application gallery.
//!
//! The catalog is fixed at compile time; hosts list it and address
//! entries by id.

use serde::{Deserialize, Serialize};

use crate::models::ModelKind;
use crate::quiz::{Question, Quiz};
use crate::types::{ChoiceIndex, LessonError, LessonId};

// =============================================================================
// DESCRIPTOR TYPES
// =============================================================================

/// A fixed-choice prediction prompt (predict or twist_predict stage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionPrompt {
    /// Prompt text.
    pub question: String,
    /// Choices, in display order.
    pub choices: Vec<String>,
    /// Index of the choice the review stage vindicates.
    pub correct: ChoiceIndex,
}

impl PredictionPrompt {
    /// Whether a choice index is valid for this prompt.
    pub fn validate_choice(&self, choice: ChoiceIndex) -> Result<bool, LessonError> {
        if usize::from(choice.value()) >= self.choices.len() {
            return Err(LessonError::ChoiceOutOfRange {
                context: "prediction",
                choice: choice.value(),
                len: self.choices.len(),
            });
        }
        Ok(self.correct == choice)
    }
}

/// One transfer-gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Short title.
    pub title: String,
    /// One-line description of where the concept shows up.
    pub blurb: String,
}

/// A complete lesson family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDescriptor {
    /// Stable id.
    pub id: LessonId,
    /// Display title.
    pub title: String,
    /// The single concept the lesson teaches.
    pub concept: String,
    /// Hook-stage scenario copy.
    pub hook: String,
    /// Model the play/twist_play labs drive.
    pub model: ModelKind,
    /// Predict-stage prompt.
    pub predict: PredictionPrompt,
    /// Twist-predict-stage prompt.
    pub twist_predict: PredictionPrompt,
    /// Test-stage quiz.
    pub quiz: Quiz,
    /// Transfer-stage gallery.
    pub applications: Vec<Application>,
}

impl LessonDescriptor {
    /// The prediction prompt for a given stage, if that stage has one.
    #[must_use]
    pub fn prompt_for(&self, stage: crate::stage::Stage) -> Option<&PredictionPrompt> {
        match stage {
            crate::stage::Stage::Predict => Some(&self.predict),
            crate::stage::Stage::TwistPredict => Some(&self.twist_predict),
            _ => None,
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Build the full fixed catalog.
pub fn catalog() -> Result<Vec<LessonDescriptor>, LessonError> {
    Ok(vec![
        assumption_audit()?,
        pll_lock()?,
        overlay_error()?,
        boiling_point()?,
        projectile_motion()?,
    ])
}

/// Look up one lesson by id.
pub fn find(id: &str) -> Result<LessonDescriptor, LessonError> {
    catalog()?
        .into_iter()
        .find(|lesson| lesson.id.as_str() == id)
        .ok_or_else(|| LessonError::UnknownLesson(id.to_string()))
}

fn prompt(question: &str, choices: &[&str], correct: u8) -> PredictionPrompt {
    PredictionPrompt {
        question: question.to_string(),
        choices: choices.iter().map(|c| (*c).to_string()).collect(),
        correct: ChoiceIndex::new(correct),
    }
}

fn application(title: &str, blurb: &str) -> Application {
    Application {
        title: title.to_string(),
        blurb: blurb.to_string(),
    }
}

fn assumption_audit() -> Result<LessonDescriptor, LessonError> {
    Ok(LessonDescriptor {
        id: LessonId::new("assumption_audit"),
        title: "The Assumption Audit".to_string(),
        concept: "Every estimate is a chain of assumptions; the loosest link dominates."
            .to_string(),
        hook: "Your team just quoted a bridge retrofit at $4M. Six assumptions went into \
               that number. How wrong could it be?"
            .to_string(),
        model: ModelKind::Estimate,
        predict: prompt(
            "Three factors each carry 20% uncertainty. Roughly how uncertain is their product?",
            &["About 20%", "About 35%", "About 60%", "Exactly 60%"],
            1,
        ),
        twist_predict: prompt(
            "Now one factor's uncertainty jumps to 50%. What happens to the combined uncertainty?",
            &[
                "It roughly averages out",
                "The 50% factor dominates the total",
                "All factors still contribute equally",
            ],
            1,
        ),
        quiz: Quiz::new(vec![
            Question::new(
                "Independent relative errors combine by",
                vec![
                    "adding directly".into(),
                    "root-sum-square".into(),
                    "multiplying".into(),
                ],
                1,
                "Independent errors add in quadrature: the total is the square root of the \
                 sum of squares.",
            )?,
            Question::new(
                "Worst-case interval stacking compared with RSS is",
                vec![
                    "always tighter".into(),
                    "always wider or equal".into(),
                    "identical".into(),
                ],
                1,
                "Worst case assumes every error conspires in the same direction, so the \
                 bound can only be wider.",
            )?,
            Question::new(
                "The fastest way to tighten an estimate is to",
                vec![
                    "refine the most uncertain assumption".into(),
                    "refine the largest-valued assumption".into(),
                    "add more assumptions".into(),
                ],
                0,
                "Uncertainty combines in quadrature, so the largest term dominates the total.",
            )?,
        ])?,
        applications: vec![
            application(
                "Construction bids",
                "Cost engineers carry an assumption register and attack the loosest line item first.",
            ),
            application(
                "Drake equation",
                "Astronomers' estimate of communicating civilizations is a textbook assumption chain.",
            ),
            application(
                "Startup sizing",
                "Market-size decks multiply five assumptions; investors probe the shakiest one.",
            ),
        ],
    })
}

fn pll_lock() -> Result<LessonDescriptor, LessonError> {
    Ok(LessonDescriptor {
        id: LessonId::new("pll_lock"),
        title: "Locked In".to_string(),
        concept: "A phase-locked loop trades lock speed against stability through its \
                  damping ratio."
            .to_string(),
        hook: "Your radio retunes in a blink of static, then holds a station rock-steady \
               for hours. The same little loop does both jobs."
            .to_string(),
        model: ModelKind::PllLock,
        predict: prompt(
            "If you raise a PLL's natural frequency, its lock time will",
            &["grow", "shrink", "stay the same"],
            1,
        ),
        twist_predict: prompt(
            "Cranking the damping ratio far above 1 makes the loop",
            &[
                "ring violently before locking",
                "settle sluggishly without overshoot",
                "lose lock entirely",
            ],
            1,
        ),
        quiz: Quiz::new(vec![
            Question::new(
                "The phase-error envelope of a second-order loop decays like",
                vec![
                    "1/t".into(),
                    "e^(−ζωₙt)".into(),
                    "a constant until lock".into(),
                ],
                1,
                "The linearized loop is a damped second-order system; its envelope is a \
                 decaying exponential.",
            )?,
            Question::new(
                "A frequency step larger than the capture range causes",
                vec![
                    "instant lock".into(),
                    "cycle slips before lock".into(),
                    "permanent damage".into(),
                ],
                1,
                "Outside the lock-in range the loop slips cycles and pulls in slowly, if at all.",
            )?,
            Question::new(
                "ζ = 0.707 is a common design choice because it",
                vec![
                    "maximizes capture range".into(),
                    "balances settling speed against overshoot".into(),
                    "minimizes power".into(),
                ],
                1,
                "Critical-ish damping gives near-fastest settling with modest overshoot.",
            )?,
        ])?,
        applications: vec![
            application(
                "Clock recovery",
                "Every serial link regenerates its bit clock with a PLL locked to data edges.",
            ),
            application(
                "Frequency synthesis",
                "Your phone's radio derives gigahertz carriers from one crystal via PLL multiplication.",
            ),
            application(
                "Motor control",
                "Spindle controllers phase-lock rotor position to a reference for constant speed.",
            ),
        ],
    })
}

fn overlay_error() -> Result<LessonDescriptor, LessonError> {
    Ok(LessonDescriptor {
        id: LessonId::new("overlay_error"),
        title: "Nanometer Alignment".to_string(),
        concept: "Chip layers must align within nanometers; rotation and magnification \
                  errors grow with field radius."
            .to_string(),
        hook: "A modern chip stacks over sixty patterned layers. Each must land on the \
               last with an error smaller than a virus."
            .to_string(),
        model: ModelKind::OverlayError,
        predict: prompt(
            "Doubling a field's rotation error affects the edge-of-field overlay by",
            &["nothing", "doubling it", "quadrupling it"],
            1,
        ),
        twist_predict: prompt(
            "Shrinking the exposure field radius while keeping the same rotation error",
            &[
                "shrinks the rotation contribution",
                "grows the rotation contribution",
                "changes nothing",
            ],
            0,
        ),
        quiz: Quiz::new(vec![
            Question::new(
                "Rotation and magnification errors hurt most",
                vec![
                    "at the field center".into(),
                    "at the field edge".into(),
                    "uniformly everywhere".into(),
                ],
                1,
                "Both terms scale linearly with distance from the field center.",
            )?,
            Question::new(
                "Independent overlay contributors are combined by",
                vec![
                    "taking the maximum".into(),
                    "root-sum-square".into(),
                    "simple addition".into(),
                ],
                1,
                "Uncorrelated error terms add in quadrature in the overlay budget.",
            )?,
            Question::new(
                "A 1 µrad rotation over a 10 mm field radius displaces the edge by about",
                vec!["0.1 nm".into(), "10 nm".into(), "1000 nm".into()],
                1,
                "Displacement = angle × radius = 1e-6 × 10 mm = 10 nm.",
            )?,
        ])?,
        applications: vec![
            application(
                "EUV lithography",
                "Sub-3nm nodes budget overlay at a couple of nanometers across a 26×33 mm field.",
            ),
            application(
                "Display manufacturing",
                "OLED color layers carry the same translation/rotation/mag budget at larger scales.",
            ),
            application(
                "PCB stackups",
                "Multilayer boards align drill and copper layers with the same error taxonomy.",
            ),
        ],
    })
}

fn boiling_point() -> Result<LessonDescriptor, LessonError> {
    Ok(LessonDescriptor {
        id: LessonId::new("boiling_point"),
        title: "Boiling Under Pressure".to_string(),
        concept: "Boiling happens when vapor pressure meets ambient pressure; change the \
                  ambient and the boiling point moves."
            .to_string(),
        hook: "On Everest your tea boils tepid at 71 °C. In a pressure cooker, dinner \
               cooks at 120 °C. Same water, different skies."
            .to_string(),
        model: ModelKind::BoilingPoint,
        predict: prompt(
            "Halving the ambient pressure makes water boil",
            &["hotter", "cooler", "at the same temperature"],
            1,
        ),
        twist_predict: prompt(
            "A fluid with a much smaller heat of vaporization responds to a pressure drop with",
            &[
                "a larger boiling-point shift",
                "a smaller boiling-point shift",
                "no shift",
            ],
            0,
        ),
        quiz: Quiz::new(vec![
            Question::new(
                "Water boils when",
                vec![
                    "it reaches 100 °C".into(),
                    "its vapor pressure equals ambient pressure".into(),
                    "dissolved air escapes".into(),
                ],
                1,
                "100 °C is only special at one standard atmosphere.",
            )?,
            Question::new(
                "The Clausius–Clapeyron relation links boiling point to",
                vec![
                    "ln of the pressure ratio".into(),
                    "the square of pressure".into(),
                    "the fluid's color".into(),
                ],
                0,
                "1/T shifts in proportion to ln(P/P₀) scaled by R/ΔH_vap.",
            )?,
            Question::new(
                "A pressure cooker cooks faster because",
                vec![
                    "pressure itself tenderizes food".into(),
                    "water stays liquid above 100 °C".into(),
                    "steam carries more air".into(),
                ],
                1,
                "Raised pressure raises the boiling point, so the liquid water runs hotter.",
            )?,
        ])?,
        applications: vec![
            application(
                "High-altitude cooking",
                "Recipes add time at altitude because the water ceiling drops ~1 °C per 300 m.",
            ),
            application(
                "Vacuum distillation",
                "Refineries boil heavy fractions at low pressure to avoid thermal cracking.",
            ),
            application(
                "Power plant condensers",
                "Turbine exhaust condenses near vacuum, setting the cycle's cold-end temperature.",
            ),
        ],
    })
}

fn projectile_motion() -> Result<LessonDescriptor, LessonError> {
    Ok(LessonDescriptor {
        id: LessonId::new("projectile_motion"),
        title: "Launch Angle".to_string(),
        concept: "Range follows v²·sin(2θ)/g — speed counts twice, and 45° is the \
                  flat-ground sweet spot."
            .to_string(),
        hook: "A water-balloon catapult, one afternoon, and a bet: your friend swears \
               steeper always means farther. Does it?"
            .to_string(),
        model: ModelKind::Projectile,
        predict: prompt(
            "At fixed launch speed on flat ground, which angle lands farthest?",
            &["30°", "45°", "60°", "75°"],
            1,
        ),
        twist_predict: prompt(
            "Take the same launch to the Moon (g ≈ 1.6 m/s²). The range",
            &[
                "shrinks — less gravity, less push",
                "grows about sixfold",
                "is unchanged",
            ],
            1,
        ),
        quiz: Quiz::new(vec![
            Question::new(
                "Doubling launch speed multiplies flat-ground range by",
                vec!["2".into(), "4".into(), "8".into()],
                1,
                "Range scales with v²: both flight time and horizontal speed double.",
            )?,
            Question::new(
                "30° and 60° launches at the same speed land",
                vec![
                    "at different distances".into(),
                    "at the same distance".into(),
                    "depends on the mass".into(),
                ],
                1,
                "sin(2·30°) = sin(2·60°); complementary angles share a range.",
            )?,
            Question::new(
                "Ignoring drag, the horizontal velocity during flight",
                vec![
                    "decays steadily".into(),
                    "stays constant".into(),
                    "grows until apex".into(),
                ],
                1,
                "No horizontal force acts, so vx is constant; only vy changes.",
            )?,
        ])?,
        applications: vec![
            application(
                "Sports trajectories",
                "Long jump, golf, and basketball all trade launch angle against speed and spin.",
            ),
            application(
                "Irrigation design",
                "Sprinkler throw radius is a projectile-range problem solved per nozzle angle.",
            ),
            application(
                "Planetary landers",
                "Hop trajectories on low-g bodies reuse the same closed-form ballistics.",
            ),
        ],
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_five_lessons_with_unique_ids() {
        let lessons = catalog().expect("catalog");
        assert_eq!(lessons.len(), 5);

        let ids: std::collections::BTreeSet<_> =
            lessons.iter().map(|l| l.id.as_str().to_string()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn find_known_and_unknown() {
        let lesson = find("projectile_motion").expect("find");
        assert_eq!(lesson.model, ModelKind::Projectile);
        assert!(find("underwater_basket_weaving").is_err());
    }

    #[test]
    fn every_lesson_is_complete() {
        for lesson in catalog().expect("catalog") {
            assert!(!lesson.title.is_empty());
            assert!(!lesson.hook.is_empty());
            assert!(lesson.quiz.len() >= 3);
            assert!(lesson.applications.len() >= 3);
            assert!(lesson.predict.choices.len() >= 2);
            assert!(lesson.twist_predict.choices.len() >= 2);
        }
    }

    #[test]
    fn prediction_correct_indices_in_range() {
        for lesson in catalog().expect("catalog") {
            for p in [&lesson.predict, &lesson.twist_predict] {
                assert!(usize::from(p.correct.value()) < p.choices.len());
            }
        }
    }

    #[test]
    fn prompt_for_maps_predict_stages_only() {
        let lesson = find("pll_lock").expect("find");
        assert!(lesson.prompt_for(crate::stage::Stage::Predict).is_some());
        assert!(
            lesson
                .prompt_for(crate::stage::Stage::TwistPredict)
                .is_some()
        );
        assert!(lesson.prompt_for(crate::stage::Stage::Play).is_none());
    }

    #[test]
    fn validate_choice_bounds() {
        let lesson = find("boiling_point").expect("find");
        assert!(lesson.predict.validate_choice(ChoiceIndex::new(1)).expect("valid"));
        assert!(lesson.predict.validate_choice(ChoiceIndex::new(9)).is_err());
    }
}
