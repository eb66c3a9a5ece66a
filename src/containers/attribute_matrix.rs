//! A named table of arrays that share one tuple count.
//!
//! The shared tuple count is the alignment contract of the matrix: every
//! array inserted must agree with it. Violations are surfaced as
//! `AllocationShapeConflict` at insertion (i.e. data-check) time, never as a
//! runtime panic during a filter's inner loop.

use std::collections::HashMap;

use crate::error::GrainpipeError;

use super::array::IDataArray;

/// A named collection of arrays sharing a common tuple count.
pub struct AttributeMatrix {
    name: String,
    tuples: usize,
    arrays: HashMap<String, Box<dyn IDataArray>>,
}

impl std::fmt::Debug for AttributeMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeMatrix")
            .field("name", &self.name)
            .field("tuples", &self.tuples)
            .field("arrays", &self.arrays.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AttributeMatrix {
    pub fn new(name: impl Into<String>, tuples: usize) -> Self {
        Self {
            name: name.into(),
            tuples,
            arrays: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tuple count every contained array must match.
    pub fn tuples(&self) -> usize {
        self.tuples
    }

    /// Re-dimensions the matrix and every contained array to a new tuple
    /// count. Used when an upstream filter discovers the real feature count.
    pub fn resize_tuples(&mut self, tuples: usize) {
        self.tuples = tuples;
        for array in self.arrays.values_mut() {
            array.resize_tuples(tuples);
        }
    }

    /// Inserts an array, replacing any existing array with the same name.
    /// The array's tuple count must agree with the matrix's.
    pub fn insert(&mut self, array: Box<dyn IDataArray>) -> Result<(), GrainpipeError> {
        if array.tuples() != self.tuples {
            return Err(GrainpipeError::AllocationShapeConflict {
                matrix: self.name.clone(),
                array: array.name().to_string(),
                matrix_tuples: self.tuples,
                array_tuples: array.tuples(),
            });
        }
        self.arrays.insert(array.name().to_string(), array);
        Ok(())
    }

    pub fn array(&self, name: &str) -> Option<&dyn IDataArray> {
        self.arrays.get(name).map(|a| a.as_ref())
    }

    pub fn array_mut(&mut self, name: &str) -> Option<&mut Box<dyn IDataArray>> {
        self.arrays.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn IDataArray>> {
        self.arrays.remove(name)
    }

    /// Array names in sorted order, for deterministic reporting.
    pub fn array_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.arrays.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
