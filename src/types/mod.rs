//! This module defines the core, strongly-typed data representations used
//! throughout the grainpipe data structure and filter pipeline.
//!
//! It currently includes the canonical `ScalarType` enum which replaces
//! fragile string-based element types with a safe, serializable enum, and the
//! `Primitive` element trait bounding what a typed data array may hold.

pub mod scalar_type;

// Re-export the main type(s) for easier access.
pub use scalar_type::{Primitive, ScalarType};
