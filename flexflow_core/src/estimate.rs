//! Plan duration estimate shown in plan listings and detail views.

use crate::{WorkoutActionStep, WorkoutPlan};

const SECONDS_PER_REP: u64 = 3;
const SETUP_SECONDS_PER_SET: u64 = 20;

/// Floor applied to every estimate
pub const MIN_ESTIMATE_MINUTES: u64 = 10;

/// Estimated time to complete a plan, in whole minutes.
///
/// Each set costs `reps * 3s + 20s` of setup; rest is counted between sets of
/// a step but not after its last set. The total is rounded to the nearest
/// minute and never reported below ten minutes. Action references are not
/// consulted, so plans with deleted actions still estimate.
pub fn estimate_minutes(plan: &WorkoutPlan) -> u64 {
    let total_seconds = plan
        .actions
        .iter()
        .map(step_seconds)
        .fold(0u64, u64::saturating_add);
    let minutes = total_seconds.saturating_add(30) / 60;
    minutes.max(MIN_ESTIMATE_MINUTES)
}

fn step_seconds(step: &WorkoutActionStep) -> u64 {
    let sets = step.sets as u64;
    let per_set = step
        .rep_count()
        .saturating_mul(SECONDS_PER_REP)
        .saturating_add(SETUP_SECONDS_PER_SET);
    let rests = sets.saturating_sub(1).saturating_mul(step.rest_seconds as u64);
    sets.saturating_mul(per_set).saturating_add(rests)
}
