//! The explicit, typed parameter registry every filter exposes.
//!
//! Parameters are a tagged variant plus a descriptor list, so callers (GUIs,
//! pipeline documents, scripts) can enumerate and set a filter's knobs
//! without any string-keyed reflection over struct fields.

use serde::{Deserialize, Serialize};

use crate::containers::DataArrayPath;
use crate::error::GrainpipeError;

/// The value of one filter parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Path(DataArrayPath),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Int(_) => ParameterKind::Int,
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::Str(_) => ParameterKind::Str,
            ParameterValue::Bool(_) => ParameterKind::Bool,
            ParameterValue::Path(_) => ParameterKind::Path,
        }
    }

    /// Unwraps a string value or reports a kind mismatch for `name`.
    pub fn as_str(&self, name: &str) -> Result<&str, GrainpipeError> {
        match self {
            ParameterValue::Str(s) => Ok(s),
            other => Err(kind_mismatch(name, ParameterKind::Str, other)),
        }
    }

    pub fn as_path(&self, name: &str) -> Result<&DataArrayPath, GrainpipeError> {
        match self {
            ParameterValue::Path(p) => Ok(p),
            other => Err(kind_mismatch(name, ParameterKind::Path, other)),
        }
    }

    pub fn as_int(&self, name: &str) -> Result<i64, GrainpipeError> {
        match self {
            ParameterValue::Int(v) => Ok(*v),
            other => Err(kind_mismatch(name, ParameterKind::Int, other)),
        }
    }

    pub fn as_float(&self, name: &str) -> Result<f64, GrainpipeError> {
        match self {
            ParameterValue::Float(v) => Ok(*v),
            other => Err(kind_mismatch(name, ParameterKind::Float, other)),
        }
    }

    pub fn as_bool(&self, name: &str) -> Result<bool, GrainpipeError> {
        match self {
            ParameterValue::Bool(v) => Ok(*v),
            other => Err(kind_mismatch(name, ParameterKind::Bool, other)),
        }
    }
}

fn kind_mismatch(name: &str, expected: ParameterKind, got: &ParameterValue) -> GrainpipeError {
    GrainpipeError::ParameterError(format!(
        "parameter '{}' expects {:?}, got {:?}",
        name,
        expected,
        got.kind()
    ))
}

/// The type tag of a parameter, independent of any value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Int,
    Float,
    Str,
    Bool,
    Path,
}

/// Describes one parameter a filter exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub kind: ParameterKind,
}

impl ParameterDescriptor {
    pub fn new(name: &'static str, kind: ParameterKind) -> Self {
        Self { name, kind }
    }
}

/// The error every filter returns for a parameter name it does not expose.
pub fn unknown_parameter(filter: &str, name: &str) -> GrainpipeError {
    GrainpipeError::ParameterError(format!(
        "filter '{}' has no parameter named '{}'",
        filter, name
    ))
}
