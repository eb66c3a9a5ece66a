//! The ordered filter sequence and its two-phase run protocol.
//!
//! Preflight is advisory and exhaustive: every filter is data-checked so a
//! caller can surface *all* configuration problems at once. Execute is strict
//! and short-circuiting: the first filter whose code goes negative aborts the
//! rest of the run, because downstream filters assume upstream invariants a
//! failed filter leaves violated. Cancellation is a cooperative flag polled
//! between filters; a distinct terminal state, not a failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::containers::DataStructure;

use super::filter::Filter;
use super::message::{MessageSink, PipelineObserver};

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Completed,
    /// The filter at `index` failed with `code`; later filters never ran.
    Failed { index: usize, code: i32 },
    /// The cancel flag was observed before the filter at `next_index` ran.
    Cancelled { next_index: usize },
}

/// The outcome of `FilterPipeline::execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    pub state: PipelineState,
    /// 0 on completion or cancellation; the failing filter's code otherwise.
    pub error_code: i32,
}

/// An ordered, owned sequence of filters plus the observers and cancel flag
/// shared across one run.
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
    observers: Vec<Box<dyn PipelineObserver>>,
    cancel: Arc<AtomicBool>,
    config: Arc<PipelineConfig>,
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("filters", &self.filters.len())
            .field("observers", &self.observers.len())
            .field("cancel", &self.cancel.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish()
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::with_config(Arc::new(PipelineConfig::default()))
    }

    pub fn with_config(config: Arc<PipelineConfig>) -> Self {
        Self {
            filters: Vec::new(),
            observers: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    //==============================================================================
    // Order maintenance
    //==============================================================================

    pub fn push_back(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn insert(&mut self, index: usize, filter: Box<dyn Filter>) {
        self.filters.insert(index, filter);
    }

    pub fn erase(&mut self, index: usize) -> Box<dyn Filter> {
        self.filters.remove(index)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filter(&self, index: usize) -> &dyn Filter {
        self.filters[index].as_ref()
    }

    pub fn filter_mut(&mut self, index: usize) -> &mut Box<dyn Filter> {
        &mut self.filters[index]
    }

    //==============================================================================
    // Observers & cancellation
    //==============================================================================

    pub fn add_observer(&mut self, observer: Box<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    /// The shared cooperative cancel flag. Callers set it from an observer
    /// callback or another handle; the pipeline polls it between filters.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn set_cancelled(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    //==============================================================================
    // Two-phase run protocol
    //==============================================================================

    /// Dry-runs `data_check(true)` on EVERY filter, in order, regardless of
    /// failures along the way. Error propagation here is per-filter, never
    /// pipeline-aborting: preflight exists purely to surface all
    /// configuration problems before a run.
    ///
    /// Returns the first failing filter's code, or 0 when none fail.
    pub fn preflight(&mut self, store: &mut DataStructure) -> i32 {
        info!("preflighting pipeline of {} filter(s)", self.filters.len());
        let mut first_error = 0;
        for (index, filter) in self.filters.iter_mut().enumerate() {
            filter.reset_error();
            let mut sink = MessageSink::new(
                filter.name(),
                filter.human_label(),
                index,
                self.config.progress_interval,
                &mut self.observers,
            );
            let code = filter.data_check(store, true, &mut sink);
            if code < 0 {
                debug!("preflight: filter {} ({}) failed with {}", index, filter.name(), code);
                if first_error == 0 {
                    first_error = code;
                }
            }
        }
        first_error
    }

    /// Runs the pipeline for real. Every filter's error code is reset, then
    /// each filter is data-checked and executed in order. The run aborts on
    /// the first negative code and reports the distinct cancelled state when
    /// the cooperative flag is observed between filters.
    pub fn execute(&mut self, store: &mut DataStructure) -> ExecutionReport {
        // A fresh run starts with a clean flag; cancellation only counts if
        // requested during this run.
        self.cancel.store(false, Ordering::Relaxed);
        for filter in self.filters.iter_mut() {
            filter.reset_error();
        }

        info!("executing pipeline of {} filter(s)", self.filters.len());
        for index in 0..self.filters.len() {
            if self.cancel.load(Ordering::Relaxed) {
                info!("pipeline cancelled before filter {}", index);
                return ExecutionReport {
                    state: PipelineState::Cancelled { next_index: index },
                    error_code: 0,
                };
            }

            let filter = &mut self.filters[index];
            let started = Instant::now();
            let mut sink = MessageSink::new(
                filter.name(),
                filter.human_label(),
                index,
                self.config.progress_interval,
                &mut self.observers,
            );

            let check_code = filter.data_check(store, false, &mut sink);
            if check_code < 0 {
                return ExecutionReport {
                    state: PipelineState::Failed {
                        index,
                        code: check_code,
                    },
                    error_code: check_code,
                };
            }

            let code = filter.execute(store, &mut sink, &self.cancel);
            if self.config.log_filter_timings {
                debug!(
                    "filter {} ({}) finished in {:?} with code {}",
                    index,
                    filter.name(),
                    started.elapsed(),
                    code
                );
            }
            if code < 0 {
                return ExecutionReport {
                    state: PipelineState::Failed { index, code },
                    error_code: code,
                };
            }
        }

        ExecutionReport {
            state: PipelineState::Completed,
            error_code: 0,
        }
    }
}
