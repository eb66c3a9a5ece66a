//! Per-feature volumes, cell counts, and sphere-equivalent diameters from
//! labeled voxels.

use std::f64::consts::PI;
use std::sync::atomic::AtomicBool;

use crate::containers::{DataArrayPath, DataStructure};
use crate::error::GrainpipeError;
use crate::pipeline::filter::{Filter, FilterCore, FilterPhase};
use crate::pipeline::message::MessageSink;
use crate::pipeline::params::{
    unknown_parameter, ParameterDescriptor, ParameterKind, ParameterValue,
};

use super::names;

/// Computes each feature's physical volume and the diameter of the sphere of
/// equal volume.
pub struct FindSizes {
    core: FilterCore,
    cell_matrix_path: DataArrayPath,
    feature_ids_array_name: String,
    feature_matrix_name: String,
    volumes_array_name: String,
    equivalent_diameters_array_name: String,
    num_cells_array_name: String,
}

impl Default for FindSizes {
    fn default() -> Self {
        Self::new()
    }
}

impl FindSizes {
    pub fn new() -> Self {
        Self {
            core: FilterCore::default(),
            cell_matrix_path: DataArrayPath::new(names::DEFAULT_CONTAINER, names::CELL_MATRIX, ""),
            feature_ids_array_name: names::FEATURE_IDS.to_string(),
            feature_matrix_name: names::FEATURE_MATRIX.to_string(),
            volumes_array_name: names::VOLUMES.to_string(),
            equivalent_diameters_array_name: names::EQUIVALENT_DIAMETERS.to_string(),
            num_cells_array_name: names::NUM_CELLS.to_string(),
        }
    }

    fn feature_ids_path(&self) -> DataArrayPath {
        self.cell_matrix_path.sibling(&self.feature_ids_array_name)
    }

    fn feature_matrix_path(&self) -> DataArrayPath {
        DataArrayPath::new(
            self.cell_matrix_path.container.clone(),
            self.feature_matrix_name.clone(),
            "",
        )
    }

    fn feature_array_path(&self, array: &str) -> DataArrayPath {
        DataArrayPath::new(
            self.cell_matrix_path.container.clone(),
            self.feature_matrix_name.clone(),
            array,
        )
    }

    fn fail(&mut self, sink: &mut MessageSink, code: i32, text: String) {
        self.core.set_error(code);
        sink.error(code, text);
    }

    fn find_sizes(
        &mut self,
        store: &mut DataStructure,
        sink: &mut MessageSink,
    ) -> Result<(), GrainpipeError> {
        let ids = store
            .prereq_array::<i32>(&self.feature_ids_path(), 1)?
            .data()
            .to_vec();
        let voxel_volume = store
            .container(&self.cell_matrix_path.container)?
            .geometry()
            .map(|g| g.voxel_volume() as f64)
            .ok_or_else(|| {
                GrainpipeError::InternalError("geometry vanished after data check".to_string())
            })?;

        let feature_count = ids.iter().copied().max().unwrap_or(0).max(0) as usize + 1;
        sink.status(format!("Calculating sizes for {} feature(s)", feature_count - 1));

        let matrix = store.attribute_matrix_mut(&self.feature_matrix_path())?;
        if matrix.tuples() != feature_count {
            matrix.resize_tuples(feature_count);
        }

        let mut cells = vec![0u64; feature_count];
        for &id in &ids {
            if id > 0 {
                cells[id as usize] += 1;
            }
        }

        let num_cells = store
            .prereq_array_mut::<i32>(&self.feature_array_path(&self.num_cells_array_name), 1)?;
        for (feature, &count) in cells.iter().enumerate() {
            num_cells.data_mut()[feature] = count as i32;
        }

        let volumes_path = self.feature_array_path(&self.volumes_array_name);
        let volumes = store.prereq_array_mut::<f32>(&volumes_path, 1)?;
        for (feature, &count) in cells.iter().enumerate() {
            volumes.data_mut()[feature] = (count as f64 * voxel_volume) as f32;
        }

        let diameters_path = self.feature_array_path(&self.equivalent_diameters_array_name);
        let diameters = store.prereq_array_mut::<f32>(&diameters_path, 1)?;
        for (feature, &count) in cells.iter().enumerate() {
            let volume = count as f64 * voxel_volume;
            diameters.data_mut()[feature] = if count == 0 {
                0.0
            } else {
                (2.0 * (3.0 * volume / (4.0 * PI)).cbrt()) as f32
            };
        }
        Ok(())
    }
}

impl Filter for FindSizes {
    fn name(&self) -> &'static str {
        "FindSizes"
    }

    fn human_label(&self) -> &'static str {
        "Find Feature Sizes"
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::new("CellAttributeMatrixPath", ParameterKind::Path),
            ParameterDescriptor::new("FeatureIdsArrayName", ParameterKind::Str),
            ParameterDescriptor::new("FeatureAttributeMatrixName", ParameterKind::Str),
            ParameterDescriptor::new("VolumesArrayName", ParameterKind::Str),
            ParameterDescriptor::new("EquivalentDiametersArrayName", ParameterKind::Str),
            ParameterDescriptor::new("NumCellsArrayName", ParameterKind::Str),
        ]
    }

    fn parameter(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "CellAttributeMatrixPath" => Some(ParameterValue::Path(self.cell_matrix_path.clone())),
            "FeatureIdsArrayName" => Some(ParameterValue::Str(self.feature_ids_array_name.clone())),
            "FeatureAttributeMatrixName" => {
                Some(ParameterValue::Str(self.feature_matrix_name.clone()))
            }
            "VolumesArrayName" => Some(ParameterValue::Str(self.volumes_array_name.clone())),
            "EquivalentDiametersArrayName" => Some(ParameterValue::Str(
                self.equivalent_diameters_array_name.clone(),
            )),
            "NumCellsArrayName" => Some(ParameterValue::Str(self.num_cells_array_name.clone())),
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
            "VolumesArrayName" => self.volumes_array_name = value.as_str(name)?.to_string(),
            "EquivalentDiametersArrayName" => {
                self.equivalent_diameters_array_name = value.as_str(name)?.to_string();
            }
            "NumCellsArrayName" => self.num_cells_array_name = value.as_str(name)?.to_string(),
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
                let volumes_path = self.feature_array_path(&self.volumes_array_name);
                if let Err(e) = store.create_array::<f32>(&volumes_path, 1, tuples, 0.0) {
                    self.fail(sink, -308, e.to_string());
                }
                let diameters_path =
                    self.feature_array_path(&self.equivalent_diameters_array_name);
                if let Err(e) = store.create_array::<f32>(&diameters_path, 1, tuples, 0.0) {
                    self.fail(sink, -308, e.to_string());
                }
                let num_cells_path = self.feature_array_path(&self.num_cells_array_name);
                if let Err(e) = store.create_array::<i32>(&num_cells_path, 1, tuples, 0) {
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

        match self.find_sizes(store, sink) {
            Ok(()) => sink.status("FindSizes completed"),
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
    use crate::containers::{AttributeMatrix, DataArray, DataContainer, ImageGeometry};

    fn labeled_store(ids: &[i32], dims: [usize; 3], spacing: [f32; 3]) -> DataStructure {
        let mut dc = DataContainer::new(names::DEFAULT_CONTAINER);
        dc.set_geometry(ImageGeometry::new(dims, spacing, [0.0, 0.0, 0.0]));

        let mut cells = AttributeMatrix::new(names::CELL_MATRIX, ids.len());
        let mut id_array = DataArray::<i32>::new(names::FEATURE_IDS, 1, ids.len(), 0);
        id_array.data_mut().copy_from_slice(ids);
        cells.insert(Box::new(id_array)).unwrap();
        dc.insert_matrix(cells);
        dc.insert_matrix(AttributeMatrix::new(names::FEATURE_MATRIX, 1));

        let mut store = DataStructure::new();
        store.insert_container(dc);
        store
    }

    #[test]
    fn test_volumes_and_cell_counts() {
        let mut store = labeled_store(&[1, 1, 1, 2], [4, 1, 1], [2.0, 1.0, 1.0]);
        let mut filter = FindSizes::new();
        let cancel = AtomicBool::new(false);
        let mut sink = MessageSink::detached("FindSizes", "Find Feature Sizes");

        assert_eq!(filter.execute(&mut store, &mut sink, &cancel), 0);

        let volumes = store
            .prereq_array::<f32>(
                &DataArrayPath::new(names::DEFAULT_CONTAINER, names::FEATURE_MATRIX, names::VOLUMES),
                1,
            )
            .unwrap();
        assert_eq!(volumes.data(), &[0.0, 6.0, 2.0]);

        let num_cells = store
            .prereq_array::<i32>(
                &DataArrayPath::new(
                    names::DEFAULT_CONTAINER,
                    names::FEATURE_MATRIX,
                    names::NUM_CELLS,
                ),
                1,
            )
            .unwrap();
        assert_eq!(num_cells.data(), &[0, 3, 1]);
    }

    #[test]
    fn test_equivalent_diameter_matches_sphere_volume() {
        let mut store = labeled_store(&[1], [1, 1, 1], [1.0, 1.0, 1.0]);
        let mut filter = FindSizes::new();
        let cancel = AtomicBool::new(false);
        let mut sink = MessageSink::detached("FindSizes", "Find Feature Sizes");

        assert_eq!(filter.execute(&mut store, &mut sink, &cancel), 0);

        let diameters = store
            .prereq_array::<f32>(
                &DataArrayPath::new(
                    names::DEFAULT_CONTAINER,
                    names::FEATURE_MATRIX,
                    names::EQUIVALENT_DIAMETERS,
                ),
                1,
            )
            .unwrap();
        // Sphere of volume 1: d = 2 * (3 / (4 pi))^(1/3) ~= 1.2407.
        let d = diameters.data()[1];
        assert!((d - 1.2407).abs() < 1e-3, "got {}", d);
        // Round-tripping back through the sphere volume recovers 1.0.
        let v = PI / 6.0 * (d as f64).powi(3);
        assert!((v - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_feature_matrix_is_reported() {
        let mut store = labeled_store(&[1, 2], [2, 1, 1], [1.0, 1.0, 1.0]);
        let mut filter = FindSizes::new();
        filter
            .set_parameter(
                "FeatureAttributeMatrixName",
                ParameterValue::Str("NoSuchMatrix".into()),
            )
            .unwrap();
        let mut sink = MessageSink::detached("FindSizes", "Find Feature Sizes");
        assert_eq!(filter.data_check(&mut store, true, &mut sink), -307);
    }
}
