//! Pairwise geometric proximity classification over feature centroids.
//!
//! For N labeled features (index 0 is the reserved background and takes no
//! part), every unordered pair is tested against an axis-aligned box whose
//! half-width is the mean equivalent diameter: the pair are neighbors when
//! they sit closer than that mean on all three axes at once. Output is a
//! per-feature neighbor count plus the explicit index list, symmetric by
//! construction. The brute-force O(N²) sweep is the correctness baseline.

use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::ArrayView2;
use num_traits::ToPrimitive;

use crate::containers::{DataArrayPath, DataStructure, IDataArray};
use crate::error::GrainpipeError;
use crate::pipeline::filter::{Filter, FilterCore, FilterPhase};
use crate::pipeline::message::MessageSink;
use crate::pipeline::params::{
    unknown_parameter, ParameterDescriptor, ParameterKind, ParameterValue,
};

use super::names;

/// Computes per-feature neighbor counts and neighbor index lists.
pub struct FindNeighborhoods {
    core: FilterCore,
    feature_matrix_path: DataArrayPath,
    centroids_array_name: String,
    equivalent_diameters_array_name: String,
    phases_array_name: String,
    neighborhoods_array_name: String,
    neighborhood_list_array_name: String,
}

impl Default for FindNeighborhoods {
    fn default() -> Self {
        Self::new()
    }
}

impl FindNeighborhoods {
    pub fn new() -> Self {
        Self {
            core: FilterCore::default(),
            feature_matrix_path: DataArrayPath::new(
                names::DEFAULT_CONTAINER,
                names::FEATURE_MATRIX,
                "",
            ),
            centroids_array_name: names::CENTROIDS.to_string(),
            equivalent_diameters_array_name: names::EQUIVALENT_DIAMETERS.to_string(),
            phases_array_name: names::PHASES.to_string(),
            neighborhoods_array_name: names::NEIGHBORHOODS.to_string(),
            neighborhood_list_array_name: names::NEIGHBORHOOD_LIST.to_string(),
        }
    }

    fn centroids_path(&self) -> DataArrayPath {
        self.feature_matrix_path.sibling(&self.centroids_array_name)
    }

    fn diameters_path(&self) -> DataArrayPath {
        self.feature_matrix_path
            .sibling(&self.equivalent_diameters_array_name)
    }

    fn phases_path(&self) -> DataArrayPath {
        self.feature_matrix_path.sibling(&self.phases_array_name)
    }

    fn neighborhoods_path(&self) -> DataArrayPath {
        self.feature_matrix_path
            .sibling(&self.neighborhoods_array_name)
    }

    fn neighborhood_list_path(&self) -> DataArrayPath {
        self.feature_matrix_path
            .sibling(&self.neighborhood_list_array_name)
    }

    fn fail(&mut self, sink: &mut MessageSink, code: i32, text: String) {
        self.core.set_error(code);
        sink.error(code, text);
    }

    /// The O(N²) sweep, separated from store plumbing. Degenerate axes
    /// (`flat`) have their coordinates collapsed to zero before the distance
    /// test. Returns `None` when the cancel flag was observed.
    fn accumulate(
        centroids: ArrayView2<'_, f32>,
        avg_diam: f32,
        flat: [bool; 3],
        progress_interval: usize,
        cancel: &AtomicBool,
        sink: &mut MessageSink,
    ) -> Option<(Vec<i32>, Vec<Vec<i32>>)> {
        let total = centroids.nrows();
        let mut counts = vec![0i32; total];
        let mut lists: Vec<Vec<i32>> = vec![Vec::new(); total];

        for i in 1..total {
            if progress_interval > 0 && i % progress_interval == 0 {
                sink.status(format!("Working on feature {} of {}", i, total - 1));
                if cancel.load(Ordering::Relaxed) {
                    sink.status(format!("Cancelled at feature {} of {}", i, total - 1));
                    return None;
                }
            }
            let pick = |row: usize, axis: usize| -> f32 {
                if flat[axis] {
                    0.0
                } else {
                    centroids[[row, axis]]
                }
            };
            let (x, y, z) = (pick(i, 0), pick(i, 1), pick(i, 2));
            // A feature is never its own neighbor; the pair (i, j) is
            // considered exactly once.
            for j in (i + 1)..total {
                let dx = (x - pick(j, 0)).abs();
                let dy = (y - pick(j, 1)).abs();
                let dz = (z - pick(j, 2)).abs();
                if dx < avg_diam && dy < avg_diam && dz < avg_diam {
                    counts[i] += 1;
                    lists[i].push(j as i32);
                    counts[j] += 1;
                    lists[j].push(i as i32);
                }
            }
        }
        Some((counts, lists))
    }

    fn find_neighborhoods(
        &mut self,
        store: &mut DataStructure,
        sink: &mut MessageSink,
        cancel: &AtomicBool,
    ) -> Result<bool, GrainpipeError> {
        let centroids = store.prereq_array::<f32>(&self.centroids_path(), 3)?;
        let diameters = store.prereq_array::<f32>(&self.diameters_path(), 1)?;
        let total = centroids.tuples();

        // Local copies keep the store free for the mutable output borrows.
        let centroid_data = centroids.data().to_vec();
        let avg_diam = mean_equivalent_diameter(diameters.data());

        let flat = match store
            .container(&self.feature_matrix_path.container)?
            .geometry()
        {
            Some(geom) => [geom.is_flat(0), geom.is_flat(1), geom.is_flat(2)],
            None => [false, false, false],
        };

        let view = ArrayView2::from_shape((total, 3), centroid_data.as_slice())
            .map_err(|e| GrainpipeError::InternalError(e.to_string()))?;

        let Some((counts, lists)) = Self::accumulate(
            view,
            avg_diam,
            flat,
            sink.progress_interval(),
            cancel,
            sink,
        ) else {
            return Ok(false);
        };

        store
            .prereq_array_mut::<i32>(&self.neighborhoods_path(), 1)?
            .data_mut()
            .copy_from_slice(&counts);

        let neighbor_list = store.prereq_neighbor_list_mut(&self.neighborhood_list_path())?;
        for (index, list) in lists.into_iter().enumerate().skip(1) {
            neighbor_list.set_list(index, list);
        }
        Ok(true)
    }
}

/// Mean equivalent diameter over the real features (indices >= 1). The
/// reserved background index contributes to neither the sum nor the divisor.
/// Accumulates in f64 regardless of the stored element type.
fn mean_equivalent_diameter<T>(diameters: &[T]) -> f32
where
    T: ToPrimitive,
{
    if diameters.len() <= 1 {
        return 0.0;
    }
    let sum: f64 = diameters[1..]
        .iter()
        .map(|d| d.to_f64().unwrap_or(0.0))
        .sum();
    (sum / (diameters.len() - 1) as f64) as f32
}

impl Filter for FindNeighborhoods {
    fn name(&self) -> &'static str {
        "FindNeighborhoods"
    }

    fn human_label(&self) -> &'static str {
        "Find Neighborhoods"
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::new("FeatureAttributeMatrixPath", ParameterKind::Path),
            ParameterDescriptor::new("CentroidsArrayName", ParameterKind::Str),
            ParameterDescriptor::new("EquivalentDiametersArrayName", ParameterKind::Str),
            ParameterDescriptor::new("PhasesArrayName", ParameterKind::Str),
            ParameterDescriptor::new("NeighborhoodsArrayName", ParameterKind::Str),
            ParameterDescriptor::new("NeighborhoodListArrayName", ParameterKind::Str),
        ]
    }

    fn parameter(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "FeatureAttributeMatrixPath" => {
                Some(ParameterValue::Path(self.feature_matrix_path.clone()))
            }
            "CentroidsArrayName" => Some(ParameterValue::Str(self.centroids_array_name.clone())),
            "EquivalentDiametersArrayName" => Some(ParameterValue::Str(
                self.equivalent_diameters_array_name.clone(),
            )),
            "PhasesArrayName" => Some(ParameterValue::Str(self.phases_array_name.clone())),
            "NeighborhoodsArrayName" => {
                Some(ParameterValue::Str(self.neighborhoods_array_name.clone()))
            }
            "NeighborhoodListArrayName" => Some(ParameterValue::Str(
                self.neighborhood_list_array_name.clone(),
            )),
            _ => None,
        }
    }

    fn set_parameter(
        &mut self,
        name: &str,
        value: ParameterValue,
    ) -> Result<(), GrainpipeError> {
        match name {
            "FeatureAttributeMatrixPath" => {
                self.feature_matrix_path = value.as_path(name)?.clone();
            }
            "CentroidsArrayName" => self.centroids_array_name = value.as_str(name)?.to_string(),
            "EquivalentDiametersArrayName" => {
                self.equivalent_diameters_array_name = value.as_str(name)?.to_string();
            }
            "PhasesArrayName" => self.phases_array_name = value.as_str(name)?.to_string(),
            "NeighborhoodsArrayName" => {
                self.neighborhoods_array_name = value.as_str(name)?.to_string();
            }
            "NeighborhoodListArrayName" => {
                self.neighborhood_list_array_name = value.as_str(name)?.to_string();
            }
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

        let tuples = match store.attribute_matrix(&self.feature_matrix_path) {
            Ok(matrix) => matrix.tuples(),
            Err(e) => {
                self.fail(sink, -999, e.to_string());
                self.core.finish_data_check(preflight);
                return self.core.error_code();
            }
        };

        if let Err(e) = store.create_neighbor_list(&self.neighborhood_list_path(), tuples) {
            self.fail(sink, -308, e.to_string());
        }
        if let Err(e) = store.prereq_array::<f32>(&self.diameters_path(), 1) {
            self.fail(sink, -302, e.to_string());
        }
        if let Err(e) = store.prereq_array::<i32>(&self.phases_path(), 1) {
            self.fail(sink, -304, e.to_string());
        }
        if let Err(e) = store.prereq_array::<f32>(&self.centroids_path(), 3) {
            self.fail(sink, -305, e.to_string());
        }
        if let Err(e) = store.create_array::<i32>(&self.neighborhoods_path(), 1, tuples, 0) {
            self.fail(sink, -308, e.to_string());
        }

        self.core.finish_data_check(preflight);
        self.core.error_code()
    }

    fn execute(
        &mut self,
        store: &mut DataStructure,
        sink: &mut MessageSink,
        cancel: &AtomicBool,
    ) -> i32 {
        self.core.reset();
        if let Err(e) = store.container(&self.feature_matrix_path.container) {
            self.fail(sink, -999, e.to_string());
            self.core.finish_execute();
            return self.core.error_code();
        }

        let code = self.data_check(store, false, sink);
        if code < 0 {
            self.core.finish_execute();
            return code;
        }

        match self.find_neighborhoods(store, sink, cancel) {
            Ok(true) => sink.status("FindNeighborhoods completed"),
            Ok(false) => {
                // Cancelled mid-sweep: outputs untouched, not a failure.
            }
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
