//! Defines the address triple used to locate an array inside the data
//! structure. Paths are cheap values passed around by the pipeline during
//! dependency resolution; they carry no ownership implications.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete or partial path to a data array, starting at the data
/// container level.
///
/// A path is *valid* only when all three components are non-empty. Partial
/// equality helpers are provided because dependency resolution frequently
/// asks "same container?" or "same matrix?" without caring about the leaf.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DataArrayPath {
    pub container: String,
    pub matrix: String,
    pub array: String,
}

impl DataArrayPath {
    pub fn new(
        container: impl Into<String>,
        matrix: impl Into<String>,
        array: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            matrix: matrix.into(),
            array: array.into(),
        }
    }

    /// True only when every component has a value.
    pub fn is_valid(&self) -> bool {
        !self.container.is_empty() && !self.matrix.is_empty() && !self.array.is_empty()
    }

    /// True when every component is empty. Note a path can be neither valid
    /// nor empty (a partial path), so this is not the negation of `is_valid`.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty() && self.matrix.is_empty() && self.array.is_empty()
    }

    /// Partial match: both paths address the same data container.
    pub fn same_container(&self, other: &DataArrayPath) -> bool {
        self.container == other.container
    }

    /// Partial match: both paths address the same attribute matrix.
    pub fn same_matrix_path(&self, other: &DataArrayPath) -> bool {
        self.container == other.container && self.matrix == other.matrix
    }

    /// Returns a sibling path addressing `array` in the same matrix.
    pub fn sibling(&self, array: impl Into<String>) -> Self {
        Self::new(self.container.clone(), self.matrix.clone(), array)
    }

    /// Serializes the path to a single delimited string.
    pub fn serialize(&self, delimiter: &str) -> String {
        format!(
            "{}{delim}{}{delim}{}",
            self.container,
            self.matrix,
            self.array,
            delim = delimiter
        )
    }

    /// Parses a path from a delimited string produced by `serialize`.
    /// Missing components are left empty rather than erroring, matching the
    /// partial-path semantics above.
    pub fn deserialize(s: &str, delimiter: &str) -> Self {
        let mut parts = s.splitn(3, delimiter);
        Self {
            container: parts.next().unwrap_or("").to_string(),
            matrix: parts.next().unwrap_or("").to_string(),
            array: parts.next().unwrap_or("").to_string(),
        }
    }
}

impl fmt::Display for DataArrayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serialize("/"))
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_requires_all_components() {
        assert!(DataArrayPath::new("dc", "am", "arr").is_valid());
        assert!(!DataArrayPath::new("dc", "", "arr").is_valid());
        assert!(!DataArrayPath::new("", "am", "arr").is_valid());
        assert!(!DataArrayPath::new("dc", "am", "").is_valid());
    }

    #[test]
    fn test_empty_is_not_the_negation_of_valid() {
        let partial = DataArrayPath::new("dc", "", "");
        assert!(!partial.is_valid());
        assert!(!partial.is_empty());
        assert!(DataArrayPath::default().is_empty());
    }

    #[test]
    fn test_partial_match_queries() {
        let a = DataArrayPath::new("dc", "CellFeatureData", "Centroids");
        let b = DataArrayPath::new("dc", "CellFeatureData", "Volumes");
        let c = DataArrayPath::new("dc", "CellData", "FeatureIds");

        assert!(a.same_container(&b));
        assert!(a.same_container(&c));
        assert!(a.same_matrix_path(&b));
        assert!(!a.same_matrix_path(&c));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let path = DataArrayPath::new("dc", "am", "arr");
        let s = path.serialize("|");
        assert_eq!(s, "dc|am|arr");
        assert_eq!(DataArrayPath::deserialize(&s, "|"), path);
    }

    #[test]
    fn test_deserialize_partial_leaves_components_empty() {
        let path = DataArrayPath::deserialize("dc|am", "|");
        assert_eq!(path.container, "dc");
        assert_eq!(path.matrix, "am");
        assert!(path.array.is_empty());
    }
}
