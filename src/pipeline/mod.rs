//! This module serves as the public API for the filter pipeline engine.
//!
//! It defines the filter contract, the ordered pipeline with its two-phase
//! preflight/execute protocol, the message/observer channel, the typed
//! parameter registry, and document serialization.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// The filter trait and the per-filter state capsule.
pub mod filter;

/// The ordered filter sequence and run protocol.
pub mod core;

/// Status/warning/error messages and observers.
pub mod message;

/// Typed filter parameters.
pub mod params;

/// Pipeline documents and the filter registry.
pub mod serialize;


//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::core::{ExecutionReport, FilterPipeline, PipelineState};
pub use self::filter::{Filter, FilterCore, FilterPhase};
pub use self::message::{
    ConsoleObserver, MessageKind, MessageSink, PipelineMessage, PipelineObserver,
    RecordingObserver,
};
pub use self::params::{ParameterDescriptor, ParameterKind, ParameterValue};
pub use self::serialize::{FilterRegistry, PipelineDocument};
