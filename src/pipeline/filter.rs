//! The behavioral contract every pipeline filter satisfies, and the small
//! state capsule concrete filters embed instead of inheriting from a shared
//! mutable base.
//!
//! The two-phase contract: `data_check` validates every required array path
//! and declares (by creating) every array the filter will produce, identically
//! whether dry-run or real; `execute` re-runs `data_check(false)` so it stays
//! independently callable, then performs the transformation. Failures are
//! recorded as negative error codes plus messages, never panics.

use std::sync::atomic::AtomicBool;

use crate::containers::DataStructure;
use crate::error::GrainpipeError;

use super::message::MessageSink;
use super::params::{ParameterDescriptor, ParameterValue};

/// Where a filter currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPhase {
    #[default]
    Constructed,
    Configured,
    Preflighted,
    PreflightFailed,
    Executed,
    ExecutionFailed,
}

/// The per-filter bookkeeping every concrete filter embeds: the signed error
/// code (0 = success, negative = failure) and the lifecycle phase. Composed,
/// not inherited.
#[derive(Debug, Default)]
pub struct FilterCore {
    error_code: i32,
    phase: FilterPhase,
}

impl FilterCore {
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    pub fn phase(&self) -> FilterPhase {
        self.phase
    }

    /// Resets the error code at the start of every data-check/execute pass.
    pub fn reset(&mut self) {
        self.error_code = 0;
    }

    pub fn set_error(&mut self, code: i32) {
        self.error_code = code;
    }

    pub fn mark_configured(&mut self) {
        self.phase = FilterPhase::Configured;
    }

    /// Records the outcome of a data-check pass.
    pub fn finish_data_check(&mut self, preflight: bool) {
        if preflight {
            self.phase = if self.error_code < 0 {
                FilterPhase::PreflightFailed
            } else {
                FilterPhase::Preflighted
            };
        }
    }

    /// Records the outcome of an execute pass.
    pub fn finish_execute(&mut self) {
        self.phase = if self.error_code < 0 {
            FilterPhase::ExecutionFailed
        } else {
            FilterPhase::Executed
        };
    }
}

/// A polymorphic unit of pipeline work.
pub trait Filter {
    /// The stable class name used in pipeline documents.
    fn name(&self) -> &'static str;

    /// The label a user-facing surface shows.
    fn human_label(&self) -> &'static str;

    /// Declares the named, typed parameters this filter exposes.
    /// Side-effect-free; the descriptor list never changes after construction.
    fn parameters(&self) -> Vec<ParameterDescriptor>;

    /// The current value of one parameter, `None` for unknown names.
    fn parameter(&self, name: &str) -> Option<ParameterValue>;

    /// Sets one parameter. Unknown names and kind mismatches are errors.
    fn set_parameter(&mut self, name: &str, value: ParameterValue)
        -> Result<(), GrainpipeError>;

    /// Validates required arrays and declares produced arrays. Returns the
    /// resulting error code (also retrievable via `error_code`). Must be
    /// idempotent: two calls with no intervening state change produce the
    /// same code and the same declared shapes.
    fn data_check(
        &mut self,
        store: &mut DataStructure,
        preflight: bool,
        sink: &mut MessageSink,
    ) -> i32;

    /// Performs the transformation. Calls `data_check(false)` itself first;
    /// a failed check transitions straight to failure without running the
    /// body. Emits status at coarse progress milestones and polls `cancel`
    /// at the same cadence in expensive loops.
    fn execute(
        &mut self,
        store: &mut DataStructure,
        sink: &mut MessageSink,
        cancel: &AtomicBool,
    ) -> i32;

    fn error_code(&self) -> i32;

    fn phase(&self) -> FilterPhase;

    /// Clears the error code ahead of a fresh pipeline pass.
    fn reset_error(&mut self);
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_phase_transitions() {
        let mut core = FilterCore::default();
        assert_eq!(core.phase(), FilterPhase::Constructed);

        core.mark_configured();
        assert_eq!(core.phase(), FilterPhase::Configured);

        core.reset();
        core.finish_data_check(true);
        assert_eq!(core.phase(), FilterPhase::Preflighted);

        core.set_error(-305);
        core.finish_data_check(true);
        assert_eq!(core.phase(), FilterPhase::PreflightFailed);

        core.reset();
        core.finish_execute();
        assert_eq!(core.phase(), FilterPhase::Executed);

        core.set_error(-999);
        core.finish_execute();
        assert_eq!(core.phase(), FilterPhase::ExecutionFailed);
    }

    #[test]
    fn test_reset_clears_only_the_code() {
        let mut core = FilterCore::default();
        core.set_error(-302);
        core.finish_data_check(true);
        core.reset();
        assert_eq!(core.error_code(), 0);
        assert_eq!(core.phase(), FilterPhase::PreflightFailed);
    }
}
