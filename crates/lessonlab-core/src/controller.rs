//! # Phase Controller
//!
//! Serializes stage transitions for one lesson widget: validates and
//! debounces every request, guards against reentrant commits, and notifies
//! the host sink of each committed transition.
//!
//! The controller is deliberately permissive about *where* a jump may land
//! (see [`JumpPolicy`]); pedagogical gating ("no advancing past predict
//! without a prediction") belongs to the session layer, which owns the
//! lesson state the gate needs.
//!
//! ## Time
//!
//! The debounce rule needs a time source, but the engine stays pure: time
//! arrives through the [`Clock`] trait. Production hosts use
//! [`MonotonicClock`]; tests drive a manual clock.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::event::{EventKind, EventPayload, EventSink, LessonEvent};
use crate::primitives::{DEFAULT_DEBOUNCE_MS, MAX_DEBOUNCE_MS};
use crate::stage::Stage;
use crate::types::TimestampMs;

// =============================================================================
// CLOCK
// =============================================================================

/// Millisecond time source for the debounce rule.
///
/// Implementations must be monotonic: `now_ms` never decreases.
/// `Send + Sync` because hosts hold controllers behind shared locks.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed on this clock.
    fn now_ms(&self) -> TimestampMs;
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> TimestampMs {
        C::now_ms(self)
    }
}

/// Production clock: milliseconds since construction, via `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> TimestampMs {
        TimestampMs::new(self.origin.elapsed().as_millis() as u64)
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    /// Create a clock at t = 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        TimestampMs::new(self.now.load(std::sync::atomic::Ordering::SeqCst))
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Restriction policy for direct jumps (`go_to`).
///
/// Widget families disagree here: some let progress-dot navigation reach
/// any stage, others only stages already seen. The policy is an explicit
/// parameter rather than a hard-coded choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JumpPolicy {
    /// Any stage in the set is a valid jump target.
    #[default]
    Unrestricted,
    /// Jump targets must already be visited, or be the immediate next
    /// stage (otherwise forward progress would be impossible).
    VisitedOnly,
}

/// Controller tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Minimum milliseconds between two committed transitions.
    /// Clamped to `[0, MAX_DEBOUNCE_MS]`; 0 disables debouncing.
    pub debounce_ms: u64,
    /// Restriction policy for direct jumps.
    pub jump_policy: JumpPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            jump_policy: JumpPolicy::default(),
        }
    }
}

// =============================================================================
// TRANSITION OUTCOME
// =============================================================================

/// Result of a transition request.
///
/// Dropping a rejected request silently would leave the host guessing;
/// the engine reports the reason as a value instead. Only
/// [`TransitionOutcome::Committed`] changes state or emits an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The transition was committed and one event was emitted.
    Committed,
    /// Dropped: a transition was committed within the debounce window.
    Debounced,
    /// Dropped: a commit was already in progress.
    Locked,
    /// Dropped: the jump policy rejected the target.
    PolicyDenied,
    /// Dropped: the target equals the current stage.
    AlreadyCurrent,
    /// Dropped: no adjacent stage in the requested direction
    /// (`go_next` at mastery, `go_back` at hook).
    AtBoundary,
}

impl TransitionOutcome {
    /// Whether the request changed the current stage.
    #[must_use]
    pub fn is_committed(self) -> bool {
        matches!(self, TransitionOutcome::Committed)
    }
}

// =============================================================================
// PHASE CONTROLLER
// =============================================================================

/// Holds the current stage and serializes transitions.
///
/// Created when a widget mounts (optionally seeded from a host resume
/// hint) and discarded when it unmounts; no state crosses instances.
pub struct PhaseController {
    current: Stage,
    visited: BTreeSet<Stage>,
    last_transition: Option<TimestampMs>,
    navigation_locked: bool,
    config: ControllerConfig,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseController")
            .field("current", &self.current)
            .field("visited", &self.visited)
            .field("last_transition", &self.last_transition)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PhaseController {
    /// Create a controller at the resolved resume stage with the
    /// production clock.
    #[must_use]
    pub fn new(config: ControllerConfig, resume_hint: Option<&str>) -> Self {
        Self::with_clock(config, resume_hint, Box::new(MonotonicClock::new()))
    }

    /// Create a controller with an injected clock.
    #[must_use]
    pub fn with_clock(
        config: ControllerConfig,
        resume_hint: Option<&str>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let start = Stage::from_resume_hint(resume_hint);

        // Resuming mid-lesson implies every earlier stage was seen.
        let mut visited = BTreeSet::new();
        for stage in crate::stage::ALL_STAGES {
            visited.insert(stage);
            if stage == start {
                break;
            }
        }

        let config = ControllerConfig {
            debounce_ms: config.debounce_ms.min(MAX_DEBOUNCE_MS),
            jump_policy: config.jump_policy,
        };

        Self {
            current: start,
            visited,
            last_transition: None,
            navigation_locked: false,
            config,
            clock,
        }
    }

    /// Rebuild a controller from snapshotted parts.
    ///
    /// The current stage is always folded into the visited set; the
    /// debounce window restarts empty.
    #[must_use]
    pub fn from_parts(
        config: ControllerConfig,
        current: Stage,
        mut visited: BTreeSet<Stage>,
        clock: Box<dyn Clock>,
    ) -> Self {
        visited.insert(current);
        let config = ControllerConfig {
            debounce_ms: config.debounce_ms.min(MAX_DEBOUNCE_MS),
            jump_policy: config.jump_policy,
        };
        Self {
            current,
            visited,
            last_transition: None,
            navigation_locked: false,
            config,
            clock,
        }
    }

    /// The current stage.
    #[must_use]
    pub fn current(&self) -> Stage {
        self.current
    }

    /// Stages visited so far (always contains the current stage).
    #[must_use]
    pub fn visited(&self) -> &BTreeSet<Stage> {
        &self.visited
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    /// Current time on the controller's clock.
    #[must_use]
    pub fn now_ms(&self) -> TimestampMs {
        self.clock.now_ms()
    }

    /// Evaluate the guard chain for a prospective transition without
    /// committing anything.
    ///
    /// Returns the outcome [`PhaseController::go_to`] would produce right
    /// now: `Committed` means the request would go through. Callers that
    /// layer their own checks on top (session gates) consult this first,
    /// so a request the guard chain drops reports its drop reason instead
    /// of tripping a gate.
    #[must_use]
    pub fn check_go_to(&self, target: Stage) -> TransitionOutcome {
        if self.navigation_locked {
            TransitionOutcome::Locked
        } else if target == self.current {
            TransitionOutcome::AlreadyCurrent
        } else if self.is_debounced() {
            TransitionOutcome::Debounced
        } else if !self.jump_allowed(target) {
            TransitionOutcome::PolicyDenied
        } else {
            TransitionOutcome::Committed
        }
    }

    /// Like [`PhaseController::check_go_to`] for the adjacent next stage.
    #[must_use]
    pub fn check_go_next(&self) -> TransitionOutcome {
        match self.current.next() {
            Some(next) => self.check_go_to(next),
            None => TransitionOutcome::AtBoundary,
        }
    }

    /// Request a transition to an arbitrary stage in the set.
    ///
    /// Guard order: reentrancy lock, self-transition, debounce window,
    /// jump policy. On commit, updates the current stage, marks it
    /// visited, and emits exactly one `stage_changed` event.
    pub fn go_to(&mut self, target: Stage, sink: &mut dyn EventSink) -> TransitionOutcome {
        match self.check_go_to(target) {
            TransitionOutcome::Committed => {
                self.commit(target, EventKind::StageChanged, sink);
                TransitionOutcome::Committed
            }
            dropped => dropped,
        }
    }

    /// Advance to the adjacent next stage. No-op at mastery.
    pub fn go_next(&mut self, sink: &mut dyn EventSink) -> TransitionOutcome {
        match self.current.next() {
            Some(next) => self.go_to(next, sink),
            None => TransitionOutcome::AtBoundary,
        }
    }

    /// Step back to the adjacent previous stage. No-op at hook.
    pub fn go_back(&mut self, sink: &mut dyn EventSink) -> TransitionOutcome {
        match self.current.previous() {
            Some(previous) => self.go_to(previous, sink),
            None => TransitionOutcome::AtBoundary,
        }
    }

    /// Explicit host re-synchronization to a resume stage.
    ///
    /// Replaces the implicit "watch the resume prop and snap to it"
    /// pattern: the host calls this when its saved stage diverges from the
    /// controller. Same guard chain as [`PhaseController::go_to`], but the
    /// emitted event is `state_synced` so journals can tell host snaps
    /// from learner navigation.
    pub fn sync_external(&mut self, target: Stage, sink: &mut dyn EventSink) -> TransitionOutcome {
        match self.check_go_to(target) {
            TransitionOutcome::Committed => {
                self.commit(target, EventKind::StateSynced, sink);
                TransitionOutcome::Committed
            }
            dropped => dropped,
        }
    }

    fn is_debounced(&self) -> bool {
        match self.last_transition {
            Some(last) => self.clock.now_ms().since(last) < self.config.debounce_ms,
            None => false,
        }
    }

    fn jump_allowed(&self, target: Stage) -> bool {
        match self.config.jump_policy {
            JumpPolicy::Unrestricted => true,
            JumpPolicy::VisitedOnly => {
                self.visited.contains(&target) || self.current.next() == Some(target)
            }
        }
    }

    fn commit(&mut self, target: Stage, kind: EventKind, sink: &mut dyn EventSink) {
        // Reentrancy window: locked for the synchronous span of the sink
        // callback.
        self.navigation_locked = true;

        let from = self.current;
        let now = self.clock.now_ms();
        self.current = target;
        self.visited.insert(target);
        self.last_transition = Some(now);

        sink.emit(&LessonEvent::new(
            kind,
            target,
            EventPayload::Transition { from, to: target },
            now,
        ));

        self.navigation_locked = false;
    }
}

// =============================================================================
// TESTS
// =============================================================================
