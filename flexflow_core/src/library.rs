//! Action library and plan list operations.
//!
//! These work on in-memory lists; callers load and save the slots through
//! [`crate::Store`]. Deleting an action never touches plans, so steps may end
//! up pointing at ids that no longer resolve.

use crate::types::{coerce_reps, coerce_rest_seconds, coerce_sets, coerce_weight, DEFAULT_TARGET_PART};
use crate::{Action, Error, Result, WorkoutActionStep, WorkoutPlan};
use std::collections::HashMap;
use uuid::Uuid;

/// Fields of an action as entered by the user
#[derive(Clone, Debug, Default)]
pub struct ActionDraft {
    pub name: String,
    pub target_part: String,
    pub image_url: Option<String>,
}

impl ActionDraft {
    fn validated(&self) -> Result<(String, String, Option<String>)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("action name is required".into()));
        }
        let target_part = match self.target_part.trim() {
            "" => DEFAULT_TARGET_PART.to_string(),
            part => part.to_string(),
        };
        let image_url = self
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        Ok((name.to_string(), target_part, image_url))
    }
}

/// Build a new action with a fresh id
pub fn new_action(draft: &ActionDraft) -> Result<Action> {
    let (name, target_part, image_url) = draft.validated()?;
    Ok(Action {
        id: Uuid::new_v4().to_string(),
        name,
        target_part,
        image_url,
    })
}

/// Replace the editable fields of an existing action
pub fn update_action(actions: &mut [Action], id: &str, draft: &ActionDraft) -> Result<Action> {
    let (name, target_part, image_url) = draft.validated()?;
    let action = actions
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| Error::Other(format!("action not found: {}", id)))?;
    action.name = name;
    action.target_part = target_part;
    action.image_url = image_url;
    Ok(action.clone())
}

/// Remove an action from the library. Plans referencing it are left as-is.
pub fn delete_action(actions: &mut Vec<Action>, id: &str) -> Option<Action> {
    let index = actions.iter().position(|a| a.id == id)?;
    let removed = actions.remove(index);
    tracing::info!("Deleted action {} ({:?})", removed.id, removed.name);
    Some(removed)
}

pub fn actions_by_id(actions: &[Action]) -> HashMap<&str, &Action> {
    actions.iter().map(|a| (a.id.as_str(), a)).collect()
}

pub fn find_plan<'a>(plans: &'a [WorkoutPlan], id: &str) -> Result<&'a WorkoutPlan> {
    plans
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::PlanNotFound(id.to_string()))
}

pub fn delete_plan(plans: &mut Vec<WorkoutPlan>, id: &str) -> Result<WorkoutPlan> {
    let index = plans
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| Error::PlanNotFound(id.to_string()))?;
    let removed = plans.remove(index);
    tracing::info!("Deleted plan {} ({:?})", removed.id, removed.name);
    Ok(removed)
}

/// Add an imported plan at the front of the list.
///
/// The plan must already carry a fresh id (see [`crate::codec::with_fresh_id`]).
/// It goes through the same rules as an editor save: a blank name or an empty
/// step list is rejected, and step fields are coerced.
pub fn import_plan(plans: &mut Vec<WorkoutPlan>, plan: WorkoutPlan) -> Result<WorkoutPlan> {
    let plan = sanitize_import(plan)?;
    if plans.iter().any(|p| p.id == plan.id) {
        return Err(Error::Other(format!(
            "imported plan id {} collides with an existing plan",
            plan.id
        )));
    }
    tracing::info!("Imported plan {} ({:?})", plan.id, plan.name);
    plans.insert(0, plan.clone());
    Ok(plan)
}

fn sanitize_import(plan: WorkoutPlan) -> Result<WorkoutPlan> {
    let name = plan.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("shared plan has no name".into()));
    }
    if plan.actions.is_empty() {
        return Err(Error::Validation("shared plan has no actions".into()));
    }

    let actions = plan
        .actions
        .iter()
        .map(|step| WorkoutActionStep {
            action_id: step.action_id.clone(),
            weight: coerce_weight(&step.weight),
            reps: coerce_reps(&step.reps),
            sets: coerce_sets(Some(step.sets as i64)),
            rest_seconds: coerce_rest_seconds(Some(step.rest_seconds as i64)),
        })
        .collect();

    Ok(WorkoutPlan {
        id: plan.id,
        name: name.to_string(),
        actions,
    })
}
