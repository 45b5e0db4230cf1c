//! termguard: a safety policy engine for shell commands issued by agents.
//!
//! The engine classifies a command's risk and turns that into one of three
//! outcomes: allow, ask for confirmation, or block (see
//! [`eval::ValidationDecision`] and [`eval::Verdict`]). It never executes
//! anything; the host agent decides what to do with the verdict.
//!
//! # Architecture
//!
//! - **[`config`]**: typed policy document, fallback defaults, overlay merge.
//! - **[`rules`]**: ordered risk rules and the [`rules::RiskClassifier`].
//! - **[`guard`]**: protected directory and extension checks.
//! - **[`eval`]**: the [`eval::PolicyEngine`] that composes the verdict.
//! - **[`advisor`]**: safer alternatives and backup hints.
//! - **[`logging`]**: logger setup and the decision log.

/// Safer alternatives and backup suggestions.
pub mod advisor;
/// Policy document types, loading, and overlay merge.
pub mod config;
/// Policy engine: risk and decision types, validation.
pub mod eval;
/// Protected path checks.
pub mod guard;
/// Logger initialization and decision records.
pub mod logging;
/// Platform family selection.
pub mod platform;
/// Risk rules evaluated in priority order.
pub mod rules;

use config::PolicyConfig;
use eval::{PolicyEngine, RiskAssessment, ValidationDecision};

/// Classify a command against the embedded starter policy.
///
/// Convenient for tests and one-off checks; long-lived hosts should build a
/// [`PolicyEngine`] once and reuse it.
pub fn assess(command: &str) -> RiskAssessment {
    PolicyEngine::new(PolicyConfig::recommended()).assess(command)
}

/// Validate a command against the embedded starter policy.
pub fn validate(command: &str, working_dir: Option<&str>, safe_mode: bool) -> ValidationDecision {
    PolicyEngine::new(PolicyConfig::recommended()).validate(command, working_dir, safe_mode)
}
