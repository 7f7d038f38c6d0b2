//! Live training session state machine.
//!
//! A session walks a plan step by step and set by set:
//!
//! ```text
//! Working --complete_set--> Resting --ticks--> AwaitingConfirmation
//!    ^                                          |        |
//!    +---------------- proceed -----------------+   extend_rest --> Resting
//!
//! Working (last set of last step) --complete_set--> Finished
//! ```
//!
//! The session never sleeps. The driver asks for a [`TickToken`] with
//! [`TrainingSession::pending_tick`], waits one tick, and hands the token back
//! to [`TrainingSession::tick`]. Tokens are bound to a countdown epoch that
//! advances on every tick and on every transition out of `Resting`, so a late
//! or duplicated tick is ignored instead of decrementing a rest that is over.

use crate::{Action, Error, Result, WorkoutActionStep, WorkoutPlan, WorkoutRecord};
use chrono::Local;
use std::collections::HashMap;
use uuid::Uuid;

/// Display name for a step whose action no longer exists
pub const UNKNOWN_ACTION: &str = "unknown action";

/// Rest guaranteed by [`TrainingSession::extend_rest`]
pub const MIN_EXTENDED_REST: u32 = 10;

// ============================================================================
// Collaborators
// ============================================================================

/// Points at which the session asks for an audible cue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    SetComplete,
    RestOver,
    PlanFinished,
}

/// Fire-and-forget cue player. Implementations swallow their own failures.
pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

/// Cue sink that plays nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentCue;

impl CueSink for SilentCue {
    fn play(&mut self, _cue: Cue) {}
}

/// Record sink trait for persisting completed sessions
pub trait RecordSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()>;
}

impl RecordSink for Vec<WorkoutRecord> {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        self.insert(0, record.clone());
        Ok(())
    }
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        (**self).append(record)
    }
}

impl<T: CueSink + ?Sized> CueSink for &mut T {
    fn play(&mut self, cue: Cue) {
        (**self).play(cue)
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Working,
    Resting,
    AwaitingConfirmation,
    Finished,
}

/// Current step (0-based) and set within it (1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub step_index: usize,
    pub set_number: u32,
}

/// Permission to apply one countdown tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickToken {
    epoch: u64,
}

/// Epoch counter backing the rest countdown
#[derive(Clone, Debug, Default)]
struct RestCountdown {
    epoch: u64,
}

impl RestCountdown {
    fn token(&self) -> TickToken {
        TickToken { epoch: self.epoch }
    }

    /// Consume a token; true only for the current epoch
    fn redeem(&mut self, token: TickToken) -> bool {
        if token.epoch != self.epoch {
            return false;
        }
        self.epoch += 1;
        true
    }

    /// Invalidate every outstanding token
    fn cancel(&mut self) {
        self.epoch += 1;
    }
}

/// An action as seen by the presentation layer
#[derive(Clone, Debug, PartialEq)]
pub enum ActionRef {
    Known(Action),
    Unknown { action_id: String },
}

impl ActionRef {
    pub fn name(&self) -> &str {
        match self {
            ActionRef::Known(action) => &action.name,
            ActionRef::Unknown { .. } => UNKNOWN_ACTION,
        }
    }

    pub fn target_part(&self) -> Option<&str> {
        match self {
            ActionRef::Known(action) => Some(&action.target_part),
            ActionRef::Unknown { .. } => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            ActionRef::Known(action) => action.image_url.as_deref(),
            ActionRef::Unknown { .. } => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ActionRef::Known(_))
    }
}

/// What follows the current step
#[derive(Clone, Debug, PartialEq)]
pub enum NextUp {
    Step {
        step: WorkoutActionStep,
        action: ActionRef,
    },
    PlanComplete,
}

/// Everything the presentation layer needs to render one frame
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub plan_id: String,
    pub plan_name: String,
    pub phase: Phase,
    pub position: Position,
    pub step_count: usize,
    pub current_step: Option<WorkoutActionStep>,
    pub current_action: Option<ActionRef>,
    pub next: NextUp,
    pub is_last_set: bool,
    pub is_last_step: bool,
    pub rest_remaining: u32,
    pub rest_display: String,
}

// ============================================================================
// Session
// ============================================================================

/// One live run of a plan
pub struct TrainingSession<R: RecordSink, C: CueSink> {
    plan: WorkoutPlan,
    actions: HashMap<String, Action>,
    phase: Phase,
    position: Position,
    rest_remaining: u32,
    countdown: RestCountdown,
    record: Option<WorkoutRecord>,
    records: R,
    cue: C,
}

impl<R: RecordSink, C: CueSink> TrainingSession<R, C> {
    /// Start a session at the first set of the first step.
    ///
    /// `actions` only drives display; steps whose action is missing still run.
    pub fn start(
        plan: WorkoutPlan,
        actions: impl IntoIterator<Item = Action>,
        records: R,
        cue: C,
    ) -> Self {
        let actions: HashMap<String, Action> =
            actions.into_iter().map(|a| (a.id.clone(), a)).collect();

        let dangling = plan
            .actions
            .iter()
            .filter(|s| !actions.contains_key(&s.action_id))
            .count();
        if dangling > 0 {
            tracing::debug!("Plan {} has {} steps with unknown actions", plan.id, dangling);
        }
        tracing::info!(
            "Starting session for plan {:?} ({} steps)",
            plan.name,
            plan.actions.len()
        );

        Self {
            plan,
            actions,
            phase: Phase::Working,
            position: Position {
                step_index: 0,
                set_number: 1,
            },
            rest_remaining: 0,
            countdown: RestCountdown::default(),
            record: None,
            records,
            cue,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    /// Record produced on finishing, whether or not it was persisted
    pub fn record(&self) -> Option<&WorkoutRecord> {
        self.record.as_ref()
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn cue_sink(&self) -> &C {
        &self.cue
    }

    pub fn current_step(&self) -> Option<&WorkoutActionStep> {
        self.plan.actions.get(self.position.step_index)
    }

    pub fn is_last_set(&self) -> bool {
        self.current_step()
            .map_or(true, |step| self.position.set_number >= step.sets)
    }

    pub fn is_last_step(&self) -> bool {
        self.position.step_index + 1 >= self.plan.actions.len()
    }

    /// "Complete set" event, accepted while working
    pub fn complete_set(&mut self) -> Result<Phase> {
        self.expect_phase(Phase::Working, "complete a set")?;

        if self.is_last_set() && self.is_last_step() {
            self.finish();
            return Ok(self.phase);
        }

        self.cue.play(Cue::SetComplete);
        let rest = self.current_step().map_or(0, |s| s.rest_seconds);
        tracing::debug!(
            "Set {} of step {} complete, resting {}s",
            self.position.set_number,
            self.position.step_index,
            rest
        );
        self.begin_rest(rest);
        Ok(self.phase)
    }

    /// Token for the next countdown tick, if the session is counting down
    pub fn pending_tick(&self) -> Option<TickToken> {
        (self.phase == Phase::Resting).then(|| self.countdown.token())
    }

    /// Apply one elapsed second. Returns false when the token is stale or the
    /// session is not resting, in which case nothing changes.
    pub fn tick(&mut self, token: TickToken) -> bool {
        if self.phase != Phase::Resting || !self.countdown.redeem(token) {
            tracing::trace!("Ignoring stale countdown tick");
            return false;
        }

        self.rest_remaining = self.rest_remaining.saturating_sub(1);
        if self.rest_remaining == 0 {
            self.rest_over();
        }
        true
    }

    /// "Extend rest" event: back to resting with at least ten seconds left
    pub fn extend_rest(&mut self) -> Result<Phase> {
        self.expect_phase(Phase::AwaitingConfirmation, "extend rest")?;
        self.rest_remaining = self.rest_remaining.max(MIN_EXTENDED_REST);
        self.phase = Phase::Resting;
        tracing::debug!("Rest extended to {}s", self.rest_remaining);
        Ok(self.phase)
    }

    /// "Proceed" event: advance to the next set or step and resume work
    pub fn confirm_proceed(&mut self) -> Result<Phase> {
        self.expect_phase(Phase::AwaitingConfirmation, "proceed")?;

        if self.is_last_set() {
            self.position.step_index += 1;
            self.position.set_number = 1;
        } else {
            self.position.set_number += 1;
        }
        self.rest_remaining = 0;
        self.leave_rest();
        self.phase = Phase::Working;

        tracing::debug!(
            "Working step {} set {}",
            self.position.step_index,
            self.position.set_number
        );
        Ok(self.phase)
    }

    /// Stop counting down (leaving the session). Outstanding tokens go stale.
    pub fn stop(&mut self) {
        self.countdown.cancel();
        tracing::debug!("Session stopped in {:?}", self.phase);
    }

    pub fn action_for(&self, step: &WorkoutActionStep) -> ActionRef {
        match self.actions.get(&step.action_id) {
            Some(action) => ActionRef::Known(action.clone()),
            None => ActionRef::Unknown {
                action_id: step.action_id.clone(),
            },
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let current_step = self.current_step().cloned();
        let current_action = current_step.as_ref().map(|s| self.action_for(s));
        let next = match self.plan.actions.get(self.position.step_index + 1) {
            Some(step) => NextUp::Step {
                step: step.clone(),
                action: self.action_for(step),
            },
            None => NextUp::PlanComplete,
        };

        SessionSnapshot {
            plan_id: self.plan.id.clone(),
            plan_name: self.plan.name.clone(),
            phase: self.phase,
            position: self.position,
            step_count: self.plan.actions.len(),
            current_step,
            current_action,
            next,
            is_last_set: self.is_last_set(),
            is_last_step: self.is_last_step(),
            rest_remaining: self.rest_remaining,
            rest_display: format_rest(self.rest_remaining),
        }
    }

    fn expect_phase(&self, expected: Phase, event: &str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::State(format!(
                "cannot {} while {:?}",
                event, self.phase
            )))
        }
    }

    fn begin_rest(&mut self, seconds: u32) {
        self.rest_remaining = seconds;
        self.phase = Phase::Resting;
        if seconds == 0 {
            self.rest_over();
        }
    }

    fn rest_over(&mut self) {
        self.leave_rest();
        self.phase = Phase::AwaitingConfirmation;
        self.cue.play(Cue::RestOver);
        tracing::debug!("Rest over, awaiting confirmation");
    }

    fn leave_rest(&mut self) {
        self.countdown.cancel();
    }

    fn finish(&mut self) {
        self.leave_rest();
        self.phase = Phase::Finished;
        if self.record.is_some() {
            return;
        }

        let record = WorkoutRecord {
            id: Uuid::new_v4().to_string(),
            plan_id: self.plan.id.clone(),
            plan_name: self.plan.name.clone(),
            date: Local::now().date_naive(),
        };
        match self.records.append(&record) {
            Ok(()) => tracing::info!("Saved record {} for plan {:?}", record.id, record.plan_name),
            Err(e) => tracing::warn!("Failed to save record for plan {:?}: {}", record.plan_name, e),
        }
        self.record = Some(record);
        self.cue.play(Cue::PlanFinished);
    }
}

/// Render seconds as `MM:SS`
pub fn format_rest(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
