//! Defines the self-describing binary format for persisted statistics.
//! This module is the single source of truth for serialization,
//! deserialization, and typed access to named datasets.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use crate::error::GrainpipeError;
use crate::types::{Primitive, ScalarType};
use crate::utils::{bytes_to_typed_vec, typed_slice_to_bytes};

//==================================================================================
// Format Constants
//==================================================================================
/// File magic for a stats artifact.
const ARTIFACT_MAGIC: &[u8; 4] = b"GPST";
/// Version of the artifact layout parsed by this module.
const ARTIFACT_FORMAT_VERSION: u16 = 1;
/// The minimum possible size of a valid artifact in bytes.
const MIN_ARTIFACT_SIZE: usize = 8; // magic(4) + ver(2) + dataset count(2)
/// A reasonable limit to prevent OOM from malformed name/payload lengths. (16MB)
const MAX_REASONABLE_LEN: usize = 16 * 1024 * 1024;

//==================================================================================
// Public Structs
//==================================================================================

/// One named dataset: a typed payload plus string attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsDataset {
    pub dtype: ScalarType,
    pub data: Vec<u8>,
    /// (key, value) pairs, kept in insertion order.
    pub attributes: Vec<(String, String)>,
}

/// An in-memory statistics artifact: a flat namespace of datasets keyed by
/// slash-separated paths (e.g. `Phase_1/BinNumber`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsArtifact {
    datasets: HashMap<String, StatsDataset>,
}

impl StatsArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    //==============================================================================
    // Typed access
    //==============================================================================

    pub fn set_scalar<T: Primitive>(&mut self, name: impl Into<String>, value: T) {
        self.set_vector(name, &[value]);
    }

    pub fn set_vector<T: Primitive>(&mut self, name: impl Into<String>, values: &[T]) {
        self.datasets.insert(
            name.into(),
            StatsDataset {
                dtype: T::SCALAR_TYPE,
                data: typed_slice_to_bytes(values),
                attributes: Vec::new(),
            },
        );
    }

    /// Attaches a string attribute to an existing dataset.
    pub fn set_attribute(
        &mut self,
        name: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), GrainpipeError> {
        let dataset = self.datasets.get_mut(name).ok_or_else(|| {
            GrainpipeError::StatsFormatError(format!(
                "cannot attach attribute to unknown dataset '{}'",
                name
            ))
        })?;
        dataset.attributes.push((key.into(), value.into()));
        Ok(())
    }

    pub fn vector<T: Primitive>(&self, name: &str) -> Result<Vec<T>, GrainpipeError> {
        let dataset = self.dataset(name)?;
        if dataset.dtype != T::SCALAR_TYPE {
            return Err(GrainpipeError::StatsFormatError(format!(
                "dataset '{}' holds {}, not {}",
                name,
                dataset.dtype,
                T::SCALAR_TYPE
            )));
        }
        bytes_to_typed_vec::<T>(&dataset.data)
    }

    pub fn scalar<T: Primitive>(&self, name: &str) -> Result<T, GrainpipeError> {
        let values = self.vector::<T>(name)?;
        match values.as_slice() {
            [single] => Ok(*single),
            other => Err(GrainpipeError::StatsFormatError(format!(
                "dataset '{}' holds {} values, expected exactly 1",
                name,
                other.len()
            ))),
        }
    }

    pub fn attribute(&self, name: &str, key: &str) -> Option<&str> {
        self.datasets.get(name).and_then(|d| {
            d.attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn dataset(&self, name: &str) -> Result<&StatsDataset, GrainpipeError> {
        self.datasets.get(name).ok_or_else(|| {
            GrainpipeError::StatsFormatError(format!("dataset '{}' does not exist", name))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Dataset names in canonical (sorted) order.
    pub fn dataset_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.datasets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    //==============================================================================
    // Serialization
    //==============================================================================

    /// Serializes the artifact into a canonical byte vector. Dataset order is
    /// sorted by name so the output is deterministic regardless of the
    /// HashMap's internal layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GrainpipeError> {
        let mut buf = Vec::new();
        buf.write_all(ARTIFACT_MAGIC).map_err(io_err)?;
        buf.write_all(&ARTIFACT_FORMAT_VERSION.to_le_bytes())
            .map_err(io_err)?;
        buf.write_all(&(self.datasets.len() as u16).to_le_bytes())
            .map_err(io_err)?;

        for name in self.dataset_names() {
            let dataset = &self.datasets[name];
            write_prefixed_string(&mut buf, name)?;
            buf.push(dtype_tag(dataset.dtype));
            buf.write_all(&(dataset.attributes.len() as u16).to_le_bytes())
                .map_err(io_err)?;
            for (key, value) in &dataset.attributes {
                write_prefixed_string(&mut buf, key)?;
                write_prefixed_string(&mut buf, value)?;
            }
            buf.write_all(&(dataset.data.len() as u64).to_le_bytes())
                .map_err(io_err)?;
            buf.write_all(&dataset.data).map_err(io_err)?;
        }
        Ok(buf)
    }

    /// Deserializes a full byte slice into a `StatsArtifact`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GrainpipeError> {
        if bytes.len() < MIN_ARTIFACT_SIZE {
            return Err(GrainpipeError::StatsFormatError(format!(
                "artifact is too small to be valid: minimum size {}, got {}",
                MIN_ARTIFACT_SIZE,
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).map_err(io_err)?;
        if magic != *ARTIFACT_MAGIC {
            return Err(GrainpipeError::StatsFormatError(
                "invalid artifact magic number".into(),
            ));
        }

        let mut u16_buf = [0u8; 2];
        cursor.read_exact(&mut u16_buf).map_err(io_err)?;
        let version = u16::from_le_bytes(u16_buf);
        if version != ARTIFACT_FORMAT_VERSION {
            return Err(GrainpipeError::StatsFormatError(format!(
                "unsupported artifact version: expected {}, got {}",
                ARTIFACT_FORMAT_VERSION, version
            )));
        }

        cursor.read_exact(&mut u16_buf).map_err(io_err)?;
        let dataset_count = u16::from_le_bytes(u16_buf);

        let mut datasets = HashMap::with_capacity(dataset_count as usize);
        for _ in 0..dataset_count {
            let name = read_prefixed_string(&mut cursor)?;

            let mut tag = [0u8; 1];
            cursor.read_exact(&mut tag).map_err(io_err)?;
            let dtype = dtype_from_tag(tag[0])?;

            cursor.read_exact(&mut u16_buf).map_err(io_err)?;
            let attr_count = u16::from_le_bytes(u16_buf);
            let mut attributes = Vec::with_capacity(attr_count as usize);
            for _ in 0..attr_count {
                let key = read_prefixed_string(&mut cursor)?;
                let value = read_prefixed_string(&mut cursor)?;
                attributes.push((key, value));
            }

            let mut u64_buf = [0u8; 8];
            cursor.read_exact(&mut u64_buf).map_err(io_err)?;
            let len = u64::from_le_bytes(u64_buf) as usize;
            if len > MAX_REASONABLE_LEN {
                return Err(GrainpipeError::StatsFormatError(format!(
                    "dataset '{}' declares a payload of {} bytes, exceeding the maximum {}",
                    name, len, MAX_REASONABLE_LEN
                )));
            }
            let mut data = vec![0u8; len];
            cursor.read_exact(&mut data).map_err(io_err)?;

            datasets.insert(
                name,
                StatsDataset {
                    dtype,
                    data,
                    attributes,
                },
            );
        }

        Ok(Self { datasets })
    }
}

//==================================================================================
// Private Helpers
//==================================================================================

fn io_err(e: std::io::Error) -> GrainpipeError {
    GrainpipeError::StatsFormatError(e.to_string())
}

fn dtype_tag(dtype: ScalarType) -> u8 {
    use ScalarType::*;
    match dtype {
        Int8 => 0,
        Int16 => 1,
        Int32 => 2,
        Int64 => 3,
        UInt8 => 4,
        UInt16 => 5,
        UInt32 => 6,
        UInt64 => 7,
        Float32 => 8,
        Float64 => 9,
        Boolean => 10,
    }
}

fn dtype_from_tag(tag: u8) -> Result<ScalarType, GrainpipeError> {
    use ScalarType::*;
    Ok(match tag {
        0 => Int8,
        1 => Int16,
        2 => Int32,
        3 => Int64,
        4 => UInt8,
        5 => UInt16,
        6 => UInt32,
        7 => UInt64,
        8 => Float32,
        9 => Float64,
        10 => Boolean,
        other => {
            return Err(GrainpipeError::StatsFormatError(format!(
                "unknown dataset type tag: {}",
                other
            )))
        }
    })
}

fn write_prefixed_string(buf: &mut Vec<u8>, s: &str) -> Result<(), GrainpipeError> {
    if s.len() > MAX_REASONABLE_LEN {
        return Err(GrainpipeError::StatsFormatError(format!(
            "string length ({}) exceeds maximum allowed size ({})",
            s.len(),
            MAX_REASONABLE_LEN
        )));
    }
    buf.write_all(&(s.len() as u16).to_le_bytes()).map_err(io_err)?;
    buf.write_all(s.as_bytes()).map_err(io_err)
}

fn read_prefixed_string(cursor: &mut Cursor<&[u8]>) -> Result<String, GrainpipeError> {
    let mut len_buf = [0u8; 2];
    cursor.read_exact(&mut len_buf).map_err(io_err)?;
    let len = u16::from_le_bytes(len_buf) as usize;
    let mut str_buf = vec![0u8; len];
    cursor.read_exact(&mut str_buf).map_err(io_err)?;
    String::from_utf8(str_buf).map_err(|e| GrainpipeError::StatsFormatError(e.to_string()))
}
