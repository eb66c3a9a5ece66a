//! The top-level data store shared by every filter in a pipeline run.
//!
//! Lookup methods fail with precise, typed errors; the prerequisite accessors
//! never allocate. Creation methods allocate through the owning attribute
//! matrix so the shared-tuple-count contract is enforced at exactly one seam.

use log::debug;

use crate::error::{GrainpipeError, PrereqFailure};
use crate::types::Primitive;

use super::array::{DataArray, IDataArray};
use super::attribute_matrix::AttributeMatrix;
use super::data_container::DataContainer;
use super::neighbor_list::NeighborList;
use super::path::DataArrayPath;

/// The top-level container array. Owns every data container for the lifetime
/// of a pipeline run.
#[derive(Default)]
pub struct DataStructure {
    containers: Vec<DataContainer>,
}

impl DataStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a container, replacing any existing container with the same name.
    pub fn insert_container(&mut self, container: DataContainer) {
        if let Some(slot) = self
            .containers
            .iter_mut()
            .find(|c| c.name() == container.name())
        {
            *slot = container;
        } else {
            self.containers.push(container);
        }
    }

    pub fn container(&self, name: &str) -> Result<&DataContainer, GrainpipeError> {
        self.containers
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| GrainpipeError::MissingDataContainer(name.to_string()))
    }

    pub fn container_mut(&mut self, name: &str) -> Result<&mut DataContainer, GrainpipeError> {
        self.containers
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| GrainpipeError::MissingDataContainer(name.to_string()))
    }

    /// Resolves a path down to its attribute matrix.
    pub fn attribute_matrix(&self, path: &DataArrayPath) -> Result<&AttributeMatrix, GrainpipeError> {
        let container = self.container(&path.container)?;
        container
            .matrix(&path.matrix)
            .ok_or_else(|| GrainpipeError::MissingAttributeMatrix {
                container: path.container.clone(),
                path: path.matrix.clone(),
            })
    }

    pub fn attribute_matrix_mut(
        &mut self,
        path: &DataArrayPath,
    ) -> Result<&mut AttributeMatrix, GrainpipeError> {
        let container = self.container_mut(&path.container)?;
        container
            .matrix_mut(&path.matrix)
            .ok_or_else(|| GrainpipeError::MissingAttributeMatrix {
                container: path.container.clone(),
                path: path.matrix.clone(),
            })
    }

    //==============================================================================
    // Prerequisite lookups (never allocate)
    //==============================================================================

    /// Typed, shape-checked lookup of an existing array. This is the accessor
    /// filters use during data-check for every input they require.
    pub fn prereq_array<T: Primitive>(
        &self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<&DataArray<T>, GrainpipeError> {
        let matrix = self.attribute_matrix(path)?;
        let erased = matrix.array(&path.array).ok_or_else(|| {
            GrainpipeError::PrerequisiteMissing {
                path: path.serialize("/"),
                cause: PrereqFailure::Absent,
            }
        })?;

        let array = erased
            .as_any()
            .downcast_ref::<DataArray<T>>()
            .ok_or_else(|| GrainpipeError::PrerequisiteMissing {
                path: path.serialize("/"),
                cause: PrereqFailure::WrongScalarType {
                    expected: T::SCALAR_TYPE.to_string(),
                    actual: erased
                        .scalar_type()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "NeighborList".to_string()),
                },
            })?;

        if array.components() != components {
            return Err(GrainpipeError::PrerequisiteMissing {
                path: path.serialize("/"),
                cause: PrereqFailure::WrongComponentCount {
                    expected: components,
                    actual: array.components(),
                },
            });
        }
        Ok(array)
    }

    /// Mutable variant of `prereq_array`, used by execute bodies that update
    /// arrays in place.
    pub fn prereq_array_mut<T: Primitive>(
        &mut self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<&mut DataArray<T>, GrainpipeError> {
        // Run the immutable checks first so the error detail is identical.
        self.prereq_array::<T>(path, components)?;
        let matrix = self.attribute_matrix_mut(path)?;
        let erased = matrix
            .array_mut(&path.array)
            .expect("checked above")
            .as_any_mut();
        Ok(erased
            .downcast_mut::<DataArray<T>>()
            .expect("checked above"))
    }

    pub fn prereq_neighbor_list(
        &self,
        path: &DataArrayPath,
    ) -> Result<&NeighborList, GrainpipeError> {
        let matrix = self.attribute_matrix(path)?;
        let erased = matrix.array(&path.array).ok_or_else(|| {
            GrainpipeError::PrerequisiteMissing {
                path: path.serialize("/"),
                cause: PrereqFailure::Absent,
            }
        })?;
        erased
            .as_any()
            .downcast_ref::<NeighborList>()
            .ok_or_else(|| GrainpipeError::PrerequisiteMissing {
                path: path.serialize("/"),
                cause: PrereqFailure::WrongScalarType {
                    expected: "NeighborList".to_string(),
                    actual: erased
                        .scalar_type()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "NeighborList".to_string()),
                },
            })
    }

    pub fn prereq_neighbor_list_mut(
        &mut self,
        path: &DataArrayPath,
    ) -> Result<&mut NeighborList, GrainpipeError> {
        self.prereq_neighbor_list(path)?;
        let matrix = self.attribute_matrix_mut(path)?;
        let erased = matrix
            .array_mut(&path.array)
            .expect("checked above")
            .as_any_mut();
        Ok(erased.downcast_mut::<NeighborList>().expect("checked above"))
    }

    //==============================================================================
    // Array creation (the declare side of data-check)
    //==============================================================================

    /// Allocates a new array at `path`, inserting or replacing. `tuples` must
    /// agree with the target matrix's tuple count; any prior array under the
    /// same name is replaced wholesale.
    pub fn create_array<T: Primitive>(
        &mut self,
        path: &DataArrayPath,
        components: usize,
        tuples: usize,
        init: T,
    ) -> Result<(), GrainpipeError> {
        debug!(
            "create_array {} ({} x {} {})",
            path,
            tuples,
            components,
            T::SCALAR_TYPE
        );
        let matrix = self.attribute_matrix_mut(path)?;
        let array = DataArray::<T>::new(path.array.clone(), components, tuples, init);
        matrix.insert(Box::new(array))
    }

    /// Allocates a neighbor-list array at `path`, inserting or replacing.
    pub fn create_neighbor_list(
        &mut self,
        path: &DataArrayPath,
        tuples: usize,
    ) -> Result<(), GrainpipeError> {
        debug!("create_neighbor_list {} ({} tuples)", path, tuples);
        let matrix = self.attribute_matrix_mut(path)?;
        let list = NeighborList::new(path.array.clone(), tuples);
        matrix.insert(Box::new(list))
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrereqFailure;

    fn store_with_feature_matrix(tuples: usize) -> DataStructure {
        let mut dc = DataContainer::new("ImageDataContainer");
        dc.insert_matrix(AttributeMatrix::new("CellFeatureData", tuples));
        let mut store = DataStructure::new();
        store.insert_container(dc);
        store
    }

    fn feature_path(array: &str) -> DataArrayPath {
        DataArrayPath::new("ImageDataContainer", "CellFeatureData", array)
    }

    #[test]
    fn test_missing_container_error() {
        let store = DataStructure::new();
        let err = store.container("Nope").unwrap_err();
        assert!(matches!(err, GrainpipeError::MissingDataContainer(_)));
    }

    #[test]
    fn test_missing_matrix_error() {
        let store = store_with_feature_matrix(4);
        let path = DataArrayPath::new("ImageDataContainer", "Nope", "X");
        let err = store.attribute_matrix(&path).unwrap_err();
        assert!(matches!(err, GrainpipeError::MissingAttributeMatrix { .. }));
    }

    #[test]
    fn test_prereq_absent() {
        let store = store_with_feature_matrix(4);
        let err = store
            .prereq_array::<f32>(&feature_path("Centroids"), 3)
            .unwrap_err();
        assert!(matches!(
            err,
            GrainpipeError::PrerequisiteMissing {
                cause: PrereqFailure::Absent,
                ..
            }
        ));
    }

    #[test]
    fn test_prereq_wrong_scalar_type() {
        let mut store = store_with_feature_matrix(4);
        store
            .create_array::<i32>(&feature_path("Centroids"), 3, 4, 0)
            .unwrap();
        let err = store
            .prereq_array::<f32>(&feature_path("Centroids"), 3)
            .unwrap_err();
        assert!(matches!(
            err,
            GrainpipeError::PrerequisiteMissing {
                cause: PrereqFailure::WrongScalarType { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_prereq_wrong_component_count() {
        let mut store = store_with_feature_matrix(4);
        store
            .create_array::<f32>(&feature_path("Centroids"), 1, 4, 0.0)
            .unwrap();
        let err = store
            .prereq_array::<f32>(&feature_path("Centroids"), 3)
            .unwrap_err();
        match err {
            GrainpipeError::PrerequisiteMissing {
                cause: PrereqFailure::WrongComponentCount { expected, actual },
                ..
            } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_create_array_tuple_conflict() {
        let mut store = store_with_feature_matrix(4);
        let err = store
            .create_array::<f32>(&feature_path("Centroids"), 3, 9, 0.0)
            .unwrap_err();
        assert!(matches!(err, GrainpipeError::AllocationShapeConflict { .. }));
    }

    #[test]
    fn test_create_then_prereq_roundtrip() {
        let mut store = store_with_feature_matrix(4);
        store
            .create_array::<f32>(&feature_path("EquivalentDiameters"), 1, 4, 1.0)
            .unwrap();
        let arr = store
            .prereq_array::<f32>(&feature_path("EquivalentDiameters"), 1)
            .unwrap();
        assert_eq!(arr.data(), &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_neighbor_list_create_and_lookup() {
        let mut store = store_with_feature_matrix(4);
        store
            .create_neighbor_list(&feature_path("NeighborhoodList"), 4)
            .unwrap();
        let nl = store
            .prereq_neighbor_list(&feature_path("NeighborhoodList"))
            .unwrap();
        assert_eq!(nl.tuples(), 4);
    }

    #[test]
    fn test_neighbor_list_lookup_on_scalar_array_fails() {
        let mut store = store_with_feature_matrix(4);
        store
            .create_array::<i32>(&feature_path("Neighborhoods"), 1, 4, 0)
            .unwrap();
        let err = store
            .prereq_neighbor_list(&feature_path("Neighborhoods"))
            .unwrap_err();
        assert!(matches!(err, GrainpipeError::PrerequisiteMissing { .. }));
    }

    #[test]
    fn test_insert_container_replaces_by_name() {
        let mut store = store_with_feature_matrix(4);
        let mut dc = DataContainer::new("ImageDataContainer");
        dc.insert_matrix(AttributeMatrix::new("CellData", 100));
        store.insert_container(dc);
        // The old CellFeatureData matrix is gone with the replaced container.
        let path = feature_path("X");
        assert!(store.attribute_matrix(&path).is_err());
        assert!(store
            .attribute_matrix(&DataArrayPath::new("ImageDataContainer", "CellData", "X"))
            .is_ok());
    }
}
