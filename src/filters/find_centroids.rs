//! Per-feature centroid positions, averaged over the voxels each feature
//! labels in the image geometry.

use std::sync::atomic::AtomicBool;

use crate::containers::{DataArrayPath, DataStructure};
use crate::error::GrainpipeError;
use crate::pipeline::filter::{Filter, FilterCore, FilterPhase};
use crate::pipeline::message::MessageSink;
use crate::pipeline::params::{
    unknown_parameter, ParameterDescriptor, ParameterKind, ParameterValue,
};

use super::names;

/// Computes the arithmetic-mean position of every feature's member voxels.
pub struct FindCentroids {
    core: FilterCore,
    cell_matrix_path: DataArrayPath,
    feature_ids_array_name: String,
    feature_matrix_name: String,
    centroids_array_name: String,
}

impl Default for FindCentroids {
    fn default() -> Self {
        Self::new()
    }
}

impl FindCentroids {
    pub fn new() -> Self {
        Self {
            core: FilterCore::default(),
            cell_matrix_path: DataArrayPath::new(names::DEFAULT_CONTAINER, names::CELL_MATRIX, ""),
            feature_ids_array_name: names::FEATURE_IDS.to_string(),
            feature_matrix_name: names::FEATURE_MATRIX.to_string(),
            centroids_array_name: names::CENTROIDS.to_string(),
        }
    }

    fn feature_ids_path(&self) -> DataArrayPath {
        self.cell_matrix_path.sibling(&self.feature_ids_array_name)
    }

    fn centroids_path(&self) -> DataArrayPath {
        DataArrayPath::new(
            self.cell_matrix_path.container.clone(),
            self.feature_matrix_name.clone(),
            self.centroids_array_name.clone(),
        )
    }

    fn feature_matrix_path(&self) -> DataArrayPath {
        DataArrayPath::new(
            self.cell_matrix_path.container.clone(),
            self.feature_matrix_name.clone(),
            "",
        )
    }

    fn fail(&mut self, sink: &mut MessageSink, code: i32, text: String) {
        self.core.set_error(code);
        sink.error(code, text);
    }

    fn find_centroids(
        &mut self,
        store: &mut DataStructure,
        sink: &mut MessageSink,
    ) -> Result<(), GrainpipeError> {
        let ids = store
            .prereq_array::<i32>(&self.feature_ids_path(), 1)?
            .data()
            .to_vec();
        let geometry = *store
            .container(&self.cell_matrix_path.container)?
            .geometry()
            .ok_or_else(|| {
                GrainpipeError::InternalError("geometry vanished after data check".to_string())
            })?;

        let feature_count = ids.iter().copied().max().unwrap_or(0).max(0) as usize + 1;
        sink.status(format!("Calculating centroids for {} feature(s)", feature_count - 1));

        // The feature matrix is re-dimensioned to the discovered feature
        // count; the outputs declared at data-check time resize with it.
        let matrix = store.attribute_matrix_mut(&self.feature_matrix_path())?;
        if matrix.tuples() != feature_count {
            matrix.resize_tuples(feature_count);
        }

        let mut sums = vec![[0f64; 3]; feature_count];
        let mut cells = vec![0u64; feature_count];
        for (voxel, &id) in ids.iter().enumerate() {
            if id <= 0 {
                continue;
            }
            let center = geometry.voxel_center(voxel);
            let slot = &mut sums[id as usize];
            slot[0] += center[0] as f64;
            slot[1] += center[1] as f64;
            slot[2] += center[2] as f64;
            cells[id as usize] += 1;
        }

        let centroids = store.prereq_array_mut::<f32>(&self.centroids_path(), 3)?;
        centroids.fill(0.0);
        for feature in 1..feature_count {
            if cells[feature] == 0 {
                continue;
            }
            let n = cells[feature] as f64;
            let tuple = centroids.tuple_mut(feature);
            tuple[0] = (sums[feature][0] / n) as f32;
            tuple[1] = (sums[feature][1] / n) as f32;
            tuple[2] = (sums[feature][2] / n) as f32;
        }
        Ok(())
    }
}

impl Filter for FindCentroids {
    fn name(&self) -> &'static str {
        "FindCentroids"
    }

    fn human_label(&self) -> &'static str {
        "Find Feature Centroids"
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::new("CellAttributeMatrixPath", ParameterKind::Path),
            ParameterDescriptor::new("FeatureIdsArrayName", ParameterKind::Str),
            ParameterDescriptor::new("FeatureAttributeMatrixName", ParameterKind::Str),
            ParameterDescriptor::new("CentroidsArrayName", ParameterKind::Str),
        ]
    }

    fn parameter(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "CellAttributeMatrixPath" => Some(ParameterValue::Path(self.cell_matrix_path.clone())),
            "FeatureIdsArrayName" => Some(ParameterValue::Str(self.feature_ids_array_name.clone())),
            "FeatureAttributeMatrixName" => {
                Some(ParameterValue::Str(self.feature_matrix_name.clone()))
            }
            "CentroidsArrayName" => Some(ParameterValue::Str(self.centroids_array_name.clone())),
            _ => None,
        }
    }

    fn set_parameter(
        &mut self,
        name: &str,
        value: ParameterValue,
    ) -> Result<(), GrainpipeError> {
        match name {
            "CellAttributeMatrixPath" => self.cell_matrix_path = value.as_path(name)?.clone(),
            "FeatureIdsArrayName" => {
                self.feature_ids_array_name = value.as_str(name)?.to_string();
            }
            "FeatureAttributeMatrixName" => {
                self.feature_matrix_name = value.as_str(name)?.to_string();
            }
            "CentroidsArrayName" => self.centroids_array_name = value.as_str(name)?.to_string(),
            _ => return Err(unknown_parameter(self.name(), name)),
        }
        self.core.mark_configured();
        Ok(())
    }

    fn data_check(
        &mut self,
        store: &mut DataStructure,
        preflight: bool,
        sink: &mut MessageSink,
    ) -> i32 {
        self.core.reset();

        match store.container(&self.cell_matrix_path.container) {
            Ok(container) => {
                if container.geometry().is_none() {
                    self.fail(
                        sink,
                        -385,
                        format!(
                            "Data container '{}' has no image geometry",
                            self.cell_matrix_path.container
                        ),
                    );
                }
            }
            Err(e) => {
                self.fail(sink, -999, e.to_string());
                self.core.finish_data_check(preflight);
                return self.core.error_code();
            }
        }

        if let Err(e) = store.prereq_array::<i32>(&self.feature_ids_path(), 1) {
            self.fail(sink, -301, e.to_string());
        }

        match store.attribute_matrix(&self.feature_matrix_path()) {
            Ok(matrix) => {
                let tuples = matrix.tuples();
                if let Err(e) = store.create_array::<f32>(&self.centroids_path(), 3, tuples, 0.0)
                {
                    self.fail(sink, -308, e.to_string());
                }
            }
            Err(e) => self.fail(sink, -307, e.to_string()),
        }

        self.core.finish_data_check(preflight);
        self.core.error_code()
    }

    fn execute(
        &mut self,
        store: &mut DataStructure,
        sink: &mut MessageSink,
        _cancel: &AtomicBool,
    ) -> i32 {
        self.core.reset();
        if let Err(e) = store.container(&self.cell_matrix_path.container) {
            self.fail(sink, -999, e.to_string());
            self.core.finish_execute();
            return self.core.error_code();
        }

        let code = self.data_check(store, false, sink);
        if code < 0 {
            self.core.finish_execute();
            return code;
        }

        match self.find_centroids(store, sink) {
            Ok(()) => sink.status("FindCentroids completed"),
            Err(e) => self.fail(sink, -1, e.to_string()),
        }
        self.core.finish_execute();
        self.core.error_code()
    }

    fn error_code(&self) -> i32 {
        self.core.error_code()
    }

    fn phase(&self) -> FilterPhase {
        self.core.phase()
    }

    fn reset_error(&mut self) {
        self.core.reset();
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{AttributeMatrix, DataContainer, ImageGeometry, IDataArray};

    /// A 4x1x1 grid with feature 1 on the left half and feature 2 on the right.
    fn two_feature_store() -> DataStructure {
        let mut dc = DataContainer::new(names::DEFAULT_CONTAINER);
        dc.set_geometry(ImageGeometry::new([4, 1, 1], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]));

        let mut cells = AttributeMatrix::new(names::CELL_MATRIX, 4);
        let mut ids = crate::containers::DataArray::<i32>::new(names::FEATURE_IDS, 1, 4, 0);
        ids.data_mut().copy_from_slice(&[1, 1, 2, 2]);
        cells.insert(Box::new(ids)).unwrap();
        dc.insert_matrix(cells);

        dc.insert_matrix(AttributeMatrix::new(names::FEATURE_MATRIX, 1));

        let mut store = DataStructure::new();
        store.insert_container(dc);
        store
    }

    #[test]
    fn test_centroids_of_two_features() {
        let mut store = two_feature_store();
        let mut filter = FindCentroids::new();
        let cancel = AtomicBool::new(false);
        let mut sink = MessageSink::detached("FindCentroids", "Find Feature Centroids");

        let code = filter.execute(&mut store, &mut sink, &cancel);
        assert_eq!(code, 0);

        let centroids = store
            .prereq_array::<f32>(
                &DataArrayPath::new(names::DEFAULT_CONTAINER, names::FEATURE_MATRIX, names::CENTROIDS),
                3,
            )
            .unwrap();
        assert_eq!(centroids.tuples(), 3);
        // Feature 1 spans voxel centers x = 0.5 and 1.5; feature 2 spans 2.5 and 3.5.
        assert_eq!(centroids.tuple(1), &[1.0, 0.5, 0.5]);
        assert_eq!(centroids.tuple(2), &[3.0, 0.5, 0.5]);
        assert_eq!(centroids.tuple(0), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_data_check_fails_without_feature_ids() {
        let mut store = two_feature_store();
        store
            .attribute_matrix_mut(&DataArrayPath::new(
                names::DEFAULT_CONTAINER,
                names::CELL_MATRIX,
                "",
            ))
            .unwrap()
            .remove(names::FEATURE_IDS);

        let mut filter = FindCentroids::new();
        let mut sink = MessageSink::detached("FindCentroids", "Find Feature Centroids");
        let code = filter.data_check(&mut store, true, &mut sink);
        assert_eq!(code, -301);
        assert_eq!(filter.phase(), FilterPhase::PreflightFailed);
    }

    #[test]
    fn test_data_check_fails_without_geometry() {
        let mut store = two_feature_store();
        let mut dc = DataContainer::new(names::DEFAULT_CONTAINER);
        dc.insert_matrix(AttributeMatrix::new(names::CELL_MATRIX, 4));
        dc.insert_matrix(AttributeMatrix::new(names::FEATURE_MATRIX, 1));
        store.insert_container(dc);

        let mut filter = FindCentroids::new();
        let mut sink = MessageSink::detached("FindCentroids", "Find Feature Centroids");
        let code = filter.data_check(&mut store, true, &mut sink);
        assert!(code < 0);
    }
}
