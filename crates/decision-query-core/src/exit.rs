// crates/decision-query-core/src/exit.rs
// ============================================================================
// Module: Decision Query Exit Decider
// Description: Maps a query result and fail flags to an exit decision.
// Purpose: Turn definedness of the service answer into a CI-friendly signal.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A result is undefined when it is `null` or an empty array or object. Every
//! other value, including `false`, `0` and `""`, is defined.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a completed query.
///
/// # Invariants
/// - [`ExitDecision::NonZeroExit`] is not an error and must not be logged as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// Exit normally.
    Proceed,
    /// Request a non-zero process exit.
    NonZeroExit,
}

impl ExitDecision {
    /// Returns true when a non-zero exit is requested.
    #[must_use]
    pub const fn is_non_zero(self) -> bool {
        matches!(self, Self::NonZeroExit)
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Returns true when the result is undefined.
#[must_use]
pub fn is_undefined(result: &Value) -> bool {
    match result {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
    }
}

/// Decides the exit outcome; the two flags are evaluated independently.
#[must_use]
pub fn decide(result: &Value, fail_on_defined: bool, fail_on_undefined: bool) -> ExitDecision {
    let undefined = is_undefined(result);
    if fail_on_defined && !undefined {
        return ExitDecision::NonZeroExit;
    }
    if fail_on_undefined && undefined {
        return ExitDecision::NonZeroExit;
    }
    ExitDecision::Proceed
}
