#![forbid(unsafe_code)]

//! Core domain model and scoring engine for the highcalc estimator.
//!
//! This crate provides:
//! - Domain types (sessions, categorical inputs, effect tiers, reports)
//! - The scoring engine (per-session score, aggregation, clamp, tiers)
//! - Exponential decay projections
//! - Configuration, persistence (session log, profile) and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod physiology;
pub mod scoring;
pub mod decay;
pub mod engine;
pub mod history;
pub mod wal;
pub mod profile;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, ScoringConstants};
pub use scoring::{aggregate_score, classify, normalize, score_session};
pub use decay::{apply_decay, current_level, time_until_saturation, time_until_zero};
pub use engine::evaluate;
pub use history::{load_recent_sessions, load_valid_sessions, SessionLog};
pub use profile::UserProfile;
pub use wal::{JsonlSink, SessionSink};
