#![forbid(unsafe_code)]

//! Core domain model and business logic for FlexFlow workout planning.
//!
//! This crate provides:
//! - Domain types (actions, plans, steps, records, profile)
//! - Plan duration estimation
//! - Share-link encoding and decoding
//! - The live training session state machine
//! - The plan editor buffer
//! - Persistence (JSON slots, seeding) and the records calendar

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod estimate;
pub mod codec;
pub mod session;
pub mod editor;
pub mod library;
pub mod store;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{seed_actions, seed_plans};
pub use config::Config;
pub use estimate::estimate_minutes;
pub use codec::{decode, encode, import_from_link, share_link, token_from_link};
pub use session::{
    format_rest, ActionRef, Cue, CueSink, NextUp, Phase, Position, RecordSink, SessionSnapshot,
    SilentCue, TickToken, TrainingSession,
};
pub use editor::{EditableStep, PlanEditor, StepKey, StepPatch};
pub use store::Store;
