//! Core domain types for FlexFlow.
//!
//! This module defines the persisted records of the system:
//! - Actions (exercise definitions) in the action library
//! - Workout plans and their ordered steps
//! - Completed-session records
//! - The per-device user profile
//!
//! Field names on the wire are camelCase so exported data and share tokens
//! stay readable by earlier releases.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Target part used when an action is created without one
pub const DEFAULT_TARGET_PART: &str = "未设定";

/// Weight shown for a step saved with an empty weight
pub const PLACEHOLDER_WEIGHT: &str = "—";

/// Reps stored for a step saved with empty reps
pub const FALLBACK_REPS: &str = "10次";

/// Rep count assumed when `reps` carries no usable number
pub const DEFAULT_REP_COUNT: u64 = 10;

pub const MIN_SETS: u32 = 1;
pub const DEFAULT_SETS_ON_SAVE: u32 = 1;
pub const MIN_REST_SECONDS: u32 = 10;
pub const DEFAULT_REST_ON_SAVE: u32 = 30;

// ============================================================================
// Action Library
// ============================================================================

/// A named exercise definition (e.g. "bench press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub name: String,
    #[serde(default = "default_target_part")]
    pub target_part: String,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_target_part() -> String {
    DEFAULT_TARGET_PART.into()
}

// ============================================================================
// Plans
// ============================================================================

/// One entry in a plan binding an action to workout parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutActionStep {
    pub action_id: String,
    /// Free text, unit-agnostic ("50kg", "自重")
    pub weight: String,
    /// Free text containing a number ("12次")
    pub reps: String,
    pub sets: u32,
    pub rest_seconds: u32,
}

impl WorkoutActionStep {
    /// Numeric repetition count embedded in `reps`.
    ///
    /// All decimal digits are concatenated and parsed ("12次" → 12). When
    /// there are no digits or the value is zero, the count falls back to
    /// [`DEFAULT_REP_COUNT`]. Counts too large for a `u64` saturate.
    pub fn rep_count(&self) -> u64 {
        let digits: String = self.reps.chars().filter(|c| c.is_ascii_digit()).collect();
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return DEFAULT_REP_COUNT;
        }
        significant.parse::<u64>().unwrap_or(u64::MAX)
    }

    /// Label part of `reps` with the digits removed ("12次" → "次")
    pub fn rep_label(&self) -> String {
        self.reps
            .chars()
            .filter(|c| !c.is_ascii_digit())
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// An ordered list of steps; order defines execution sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    /// Replaced on import, so shared tokens may omit it
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub actions: Vec<WorkoutActionStep>,
}

impl WorkoutPlan {
    pub fn steps(&self) -> &[WorkoutActionStep] {
        &self.actions
    }

    /// Total number of sets across all steps
    pub fn total_sets(&self) -> u32 {
        self.actions
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.sets))
    }
}

// ============================================================================
// Records
// ============================================================================

/// A completed session, one per finished run of a plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    /// Not guaranteed to resolve; the plan may since have been deleted
    pub plan_id: String,
    /// Plan name at completion time
    pub plan_name: String,
    pub date: NaiveDate,
}

// ============================================================================
// Profile
// ============================================================================

/// Visual style tag stored with the profile
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThemeStyle {
    #[default]
    Default,
    Named(String),
}

impl From<String> for ThemeStyle {
    fn from(tag: String) -> Self {
        match tag.trim() {
            "" | "default" => ThemeStyle::Default,
            other => ThemeStyle::Named(other.to_string()),
        }
    }
}

impl From<ThemeStyle> for String {
    fn from(theme: ThemeStyle) -> Self {
        match theme {
            ThemeStyle::Default => "default".into(),
            ThemeStyle::Named(tag) => tag,
        }
    }
}

impl std::fmt::Display for ThemeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeStyle::Default => f.write_str("default"),
            ThemeStyle::Named(tag) => f.write_str(tag),
        }
    }
}

/// Per-device body metrics and preferences
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub theme: ThemeStyle,
}

// ============================================================================
// Save-time coercion
// ============================================================================

/// Coerce a raw `sets` field: blank or zero becomes 1, then floor at 1.
pub fn coerce_sets(raw: Option<i64>) -> u32 {
    let value = raw.filter(|v| *v != 0).unwrap_or(DEFAULT_SETS_ON_SAVE as i64);
    clamp_to_u32(value.max(MIN_SETS as i64))
}

/// Coerce a raw `restSeconds` field: blank or zero becomes 30, then floor at 10.
pub fn coerce_rest_seconds(raw: Option<i64>) -> u32 {
    let value = raw.filter(|v| *v != 0).unwrap_or(DEFAULT_REST_ON_SAVE as i64);
    clamp_to_u32(value.max(MIN_REST_SECONDS as i64))
}

/// Empty weight is shown as a dash
pub fn coerce_weight(raw: &str) -> String {
    if raw.is_empty() {
        PLACEHOLDER_WEIGHT.into()
    } else {
        raw.to_string()
    }
}

pub fn coerce_reps(raw: &str) -> String {
    if raw.is_empty() {
        FALLBACK_REPS.into()
    } else {
        raw.to_string()
    }
}

/// Parse a numeric input field. Blank or non-numeric text is `None`.
pub fn parse_field(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

fn clamp_to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}
