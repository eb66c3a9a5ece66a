//! This file is the root of the `grainpipe` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`pipeline`,
//!     `containers`, `filters`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types every caller needs.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================

pub mod config;
pub mod containers;
pub mod filters;
pub mod pipeline;
pub mod stats;

mod error;
mod types;
mod utils;

pub use config::PipelineConfig;
pub use error::{GrainpipeError, PrereqFailure};
pub use types::{Primitive, ScalarType};

//==================================================================================
// 2. Logging
//==================================================================================

/// Turns on verbose logging for pipeline diagnostics. Safe to call more than
/// once; later calls are no-ops.
pub fn enable_verbose_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
