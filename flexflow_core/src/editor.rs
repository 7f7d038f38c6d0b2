//! Plan editor buffer.
//!
//! Holds an unsaved plan name and step list. Steps carry a [`StepKey`] that is
//! unique within the editor, so updates and removals keep targeting the same
//! step after reordering. Numeric fields stay raw (`None` for a blank input)
//! until [`PlanEditor::save`] applies the coercion policy.

use crate::types::{coerce_reps, coerce_rest_seconds, coerce_sets, coerce_weight};
use crate::{Error, Result, WorkoutActionStep, WorkoutPlan};
use uuid::Uuid;

const NEW_STEP_REPS: &str = "12次";
const NEW_STEP_SETS: i64 = 3;
const NEW_STEP_REST: i64 = 60;

/// Editor-local step identity; never persisted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StepKey(u64);

/// A step as typed into the editor
#[derive(Clone, Debug, PartialEq)]
pub struct EditableStep {
    pub key: StepKey,
    pub action_id: String,
    pub weight: String,
    pub reps: String,
    pub sets: Option<i64>,
    pub rest_seconds: Option<i64>,
}

impl EditableStep {
    fn sanitized(&self) -> WorkoutActionStep {
        WorkoutActionStep {
            action_id: self.action_id.clone(),
            weight: coerce_weight(&self.weight),
            reps: coerce_reps(&self.reps),
            sets: coerce_sets(self.sets),
            rest_seconds: coerce_rest_seconds(self.rest_seconds),
        }
    }
}

/// Partial update for one step; `None` leaves a field unchanged.
///
/// For the numeric fields `Some(None)` clears the input.
#[derive(Clone, Debug, Default)]
pub struct StepPatch {
    pub weight: Option<String>,
    pub reps: Option<String>,
    pub sets: Option<Option<i64>>,
    pub rest_seconds: Option<Option<i64>>,
}

/// In-progress plan edit
#[derive(Clone, Debug, Default)]
pub struct PlanEditor {
    /// Id of the plan being edited; `None` creates a new plan on save
    editing: Option<String>,
    pub name: String,
    steps: Vec<EditableStep>,
    next_key: u64,
}

impl PlanEditor {
    /// Empty buffer for a new plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer pre-filled from an existing plan
    pub fn edit(plan: &WorkoutPlan) -> Self {
        let mut editor = Self {
            editing: Some(plan.id.clone()),
            name: plan.name.clone(),
            ..Self::default()
        };
        for step in &plan.actions {
            let key = editor.next_key();
            editor.steps.push(EditableStep {
                key,
                action_id: step.action_id.clone(),
                weight: step.weight.clone(),
                reps: step.reps.clone(),
                sets: Some(step.sets as i64),
                rest_seconds: Some(step.rest_seconds as i64),
            });
        }
        editor
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn steps(&self) -> &[EditableStep] {
        &self.steps
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a default step per action id, skipping ids already present.
    /// Returns the keys of the steps added.
    pub fn add_steps<I, S>(&mut self, action_ids: I) -> Vec<StepKey>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for action_id in action_ids {
            let action_id = action_id.into();
            if self.steps.iter().any(|s| s.action_id == action_id) {
                tracing::debug!("Action {} already in plan, skipping", action_id);
                continue;
            }
            let key = self.next_key();
            self.steps.push(EditableStep {
                key,
                action_id,
                weight: String::new(),
                reps: NEW_STEP_REPS.into(),
                sets: Some(NEW_STEP_SETS),
                rest_seconds: Some(NEW_STEP_REST),
            });
            added.push(key);
        }
        added
    }

    /// Apply a patch; false if no step has this key
    pub fn update_step(&mut self, key: StepKey, patch: StepPatch) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.key == key) else {
            return false;
        };
        if let Some(weight) = patch.weight {
            step.weight = weight;
        }
        if let Some(reps) = patch.reps {
            step.reps = reps;
        }
        if let Some(sets) = patch.sets {
            step.sets = sets;
        }
        if let Some(rest_seconds) = patch.rest_seconds {
            step.rest_seconds = rest_seconds;
        }
        true
    }

    pub fn remove_step(&mut self, key: StepKey) -> Option<EditableStep> {
        let index = self.steps.iter().position(|s| s.key == key)?;
        Some(self.steps.remove(index))
    }

    /// Move the step at `from` to `to`. No-op when equal or out of range.
    pub fn move_step(&mut self, from: usize, to: usize) {
        if from == to || from >= self.steps.len() || to >= self.steps.len() {
            return;
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
    }

    pub fn key_for_action(&self, action_id: &str) -> Option<StepKey> {
        self.steps
            .iter()
            .find(|s| s.action_id == action_id)
            .map(|s| s.key)
    }

    /// Validate and build the plan this buffer describes
    pub fn build(&self) -> Result<WorkoutPlan> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("plan name is required".into()));
        }
        if self.steps.is_empty() {
            return Err(Error::Validation("add at least one action".into()));
        }

        Ok(WorkoutPlan {
            id: self
                .editing
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: name.to_string(),
            actions: self.steps.iter().map(EditableStep::sanitized).collect(),
        })
    }

    /// Validate, then insert (new plan, at the front) or replace by id.
    ///
    /// On a validation error `plans` is left untouched.
    pub fn save(&self, plans: &mut Vec<WorkoutPlan>) -> Result<WorkoutPlan> {
        let plan = self.build()?;

        match plans.iter_mut().find(|p| self.editing.as_deref() == Some(p.id.as_str())) {
            Some(existing) => {
                *existing = plan.clone();
                tracing::info!("Updated plan {} ({:?})", plan.id, plan.name);
            }
            None => {
                if self.is_edit() {
                    tracing::warn!("Plan {} no longer stored, saving as new", plan.id);
                }
                plans.insert(0, plan.clone());
                tracing::info!("Created plan {} ({:?})", plan.id, plan.name);
            }
        }
        Ok(plan)
    }

    fn next_key(&mut self) -> StepKey {
        self.next_key += 1;
        StepKey(self.next_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_plans;

    fn action_ids(editor: &PlanEditor) -> Vec<&str> {
        editor.steps().iter().map(|s| s.action_id.as_str()).collect()
    }

    #[test]
    fn test_add_steps_uses_defaults() {
        let mut editor = PlanEditor::new();
        let keys = editor.add_steps(["act-bench"]);
        assert_eq!(keys.len(), 1);

        let step = &editor.steps()[0];
        assert_eq!(step.weight, "");
        assert_eq!(step.reps, "12次");
        assert_eq!(step.sets, Some(3));
        assert_eq!(step.rest_seconds, Some(60));
    }

    #[test]
    fn test_add_steps_skips_duplicates() {
        let mut editor = PlanEditor::new();
        editor.add_steps(["act-bench", "act-row"]);
        let added = editor.add_steps(["act-bench", "act-squat", "act-squat"]);

        assert_eq!(added.len(), 1);
        assert_eq!(action_ids(&editor), vec!["act-bench", "act-row", "act-squat"]);
    }

    #[test]
    fn test_keys_are_unique_and_stable_across_moves() {
        let mut editor = PlanEditor::new();
        let keys = editor.add_steps(["a", "b", "c"]);
        assert_eq!(keys.len(), 3);
        assert_ne!(keys[0], keys[1]);

        editor.move_step(0, 2);
        assert_eq!(action_ids(&editor), vec!["b", "c", "a"]);

        editor.update_step(
            keys[0],
            StepPatch {
                weight: Some("40kg".into()),
                ..StepPatch::default()
            },
        );
        assert_eq!(editor.steps()[2].weight, "40kg");

        let removed = editor.remove_step(keys[1]).unwrap();
        assert_eq!(removed.action_id, "b");
        assert_eq!(action_ids(&editor), vec!["c", "a"]);
        assert!(editor.remove_step(keys[1]).is_none());
    }

    #[test]
    fn test_move_step_noops() {
        let mut editor = PlanEditor::new();
        editor.add_steps(["a", "b", "c"]);
        editor.move_step(1, 1);
        editor.move_step(3, 0);
        editor.move_step(0, 7);
        assert_eq!(action_ids(&editor), vec!["a", "b", "c"]);

        editor.move_step(2, 0);
        assert_eq!(action_ids(&editor), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_update_unknown_key() {
        let mut editor = PlanEditor::new();
        editor.add_steps(["a"]);
        assert!(!editor.update_step(StepKey(999), StepPatch::default()));
    }

    #[test]
    fn test_save_applies_coercion() {
        let mut editor = PlanEditor::new();
        editor.set_name("  Push day  ");
        let keys = editor.add_steps(["act-bench"]);
        editor.update_step(
            keys[0],
            StepPatch {
                weight: Some(String::new()),
                reps: Some(String::new()),
                sets: Some(None),
                rest_seconds: Some(Some(5)),
            },
        );

        let mut plans = Vec::new();
        let plan = editor.save(&mut plans).unwrap();
        assert_eq!(plan.name, "Push day");
        assert!(!plan.id.is_empty());

        let step = &plan.actions[0];
        assert_eq!(step.weight, "—");
        assert_eq!(step.reps, "10次");
        assert_eq!(step.sets, 1);
        assert_eq!(step.rest_seconds, 10);
        assert_eq!(plans, vec![plan]);
    }

    #[test]
    fn test_save_inserts_new_plans_first() {
        let mut plans = seed_plans().to_vec();
        let mut editor = PlanEditor::new();
        editor.set_name("New");
        editor.add_steps(["act-row"]);

        let plan = editor.save(&mut plans).unwrap();
        assert_eq!(plans.len(), seed_plans().len() + 1);
        assert_eq!(plans[0].id, plan.id);
    }

    #[test]
    fn test_save_rejects_blank_name_without_touching_plans() {
        let mut plans = seed_plans().to_vec();
        let mut editor = PlanEditor::edit(&plans[0]);
        editor.set_name("   ");

        let result = editor.save(&mut plans);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(plans, seed_plans().to_vec());
    }

    #[test]
    fn test_save_rejects_empty_steps() {
        let mut editor = PlanEditor::new();
        editor.set_name("Empty");
        let mut plans = Vec::new();
        assert!(matches!(editor.save(&mut plans), Err(Error::Validation(_))));
        assert!(plans.is_empty());
    }

    #[test]
    fn test_edit_replaces_in_place() {
        let mut plans = seed_plans().to_vec();
        let original = plans[1].clone();

        let mut editor = PlanEditor::edit(&original);
        assert!(editor.is_edit());
        editor.set_name("Renamed");
        let key = editor.key_for_action(&original.actions[0].action_id).unwrap();
        editor.remove_step(key);

        let saved = editor.save(&mut plans).unwrap();
        assert_eq!(saved.id, original.id);
        assert_eq!(plans.len(), seed_plans().len());
        assert_eq!(plans[1].name, "Renamed");
        assert_eq!(plans[1].actions.len(), original.actions.len() - 1);
        assert_eq!(plans[1].actions[0], original.actions[1]);
    }

    #[test]
    fn test_edit_of_deleted_plan_saves_as_new() {
        let plan = seed_plans()[0].clone();
        let editor = PlanEditor::edit(&plan);
        let mut plans = Vec::new();

        editor.save(&mut plans).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, plan.id);
    }
}
