//! The single source of truth for pipeline run configuration.
//!
//! A `PipelineConfig` is created once at the application boundary (e.g. from
//! a user's settings file) and shared read-only via `Arc` with every pipeline
//! that needs it. Centralizing the knobs here keeps them out of filter
//! constructors.

use serde::{Deserialize, Serialize};

/// Run-wide configuration shared by a pipeline and its filters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// How many units of work a filter processes between progress messages
    /// (and cancellation polls inside expensive loops).
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// If true, the pipeline logs per-filter wall time at debug level.
    #[serde(default = "default_true")]
    pub log_filter_timings: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            log_filter_timings: true,
        }
    }
}

/// Helper for `serde` to default the progress cadence.
fn default_progress_interval() -> usize {
    100
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}
