//! Built-in action library and starter plans.
//!
//! Written to the store the first time the actions or plans slot is read
//! empty, so a fresh install has something to train with.

use crate::types::*;
use once_cell::sync::Lazy;

static SEED_ACTIONS: Lazy<Vec<Action>> = Lazy::new(build_seed_actions);
static SEED_PLANS: Lazy<Vec<WorkoutPlan>> = Lazy::new(build_seed_plans);

/// Starter action library
pub fn seed_actions() -> &'static [Action] {
    &SEED_ACTIONS
}

/// Starter plans; every step references an action from [`seed_actions`]
pub fn seed_plans() -> &'static [WorkoutPlan] {
    &SEED_PLANS
}

fn action(id: &str, name: &str, target_part: &str, image: &str) -> Action {
    Action {
        id: id.into(),
        name: name.into(),
        target_part: target_part.into(),
        image_url: Some(format!("/action/{}.webp", image)),
    }
}

fn step(action_id: &str, weight: &str, reps: &str, sets: u32, rest_seconds: u32) -> WorkoutActionStep {
    WorkoutActionStep {
        action_id: action_id.into(),
        weight: weight.into(),
        reps: reps.into(),
        sets,
        rest_seconds,
    }
}

fn build_seed_actions() -> Vec<Action> {
    vec![
        action("act-bench", "杠铃卧推", "胸部", "卧推"),
        action("act-pushup", "俯卧撑", "胸部", "俯卧撑"),
        action("act-curl", "二头哑铃弯举", "手臂", "二头哑铃弯举"),
        action("act-row", "俯身哑铃划船", "背部", "俯身哑铃划船"),
        action("act-squat", "深蹲", "腿部", "深蹲"),
        action("act-deadlift", "硬拉", "全身", "硬拉"),
        action("act-plank", "仰卧卷腹", "核心", "仰卧卷腹"),
    ]
}

fn build_seed_plans() -> Vec<WorkoutPlan> {
    vec![
        WorkoutPlan {
            id: "plan-chest".into(),
            name: "周一胸部强化训练".into(),
            actions: vec![
                step("act-bench", "50kg", "12次", 4, 60),
                step("act-pushup", "自重", "15次", 3, 45),
                step("act-row", "20kg", "12次", 4, 60),
            ],
        },
        WorkoutPlan {
            id: "plan-legs-core".into(),
            name: "周三腿部与核心".into(),
            actions: vec![
                step("act-squat", "60kg", "10次", 4, 90),
                step("act-deadlift", "70kg", "8次", 3, 90),
                step("act-plank", PLACEHOLDER_WEIGHT, "20次", 3, 45),
            ],
        },
        WorkoutPlan {
            id: "plan-full".into(),
            name: "周五全身循环".into(),
            actions: vec![
                step("act-row", "22kg", "10次", 3, 60),
                step("act-curl", "12kg", "12次", 3, 45),
                step("act-squat", "55kg", "12次", 3, 75),
                step("act-plank", PLACEHOLDER_WEIGHT, "25次", 2, 45),
            ],
        },
    ]
}
