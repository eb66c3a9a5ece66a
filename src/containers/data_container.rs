//! A named collection of attribute matrices, optionally carrying the voxel
//! grid geometry the contained data was sampled on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::attribute_matrix::AttributeMatrix;

/// A regular voxel grid: dimensions in voxels, physical spacing per axis,
/// and the physical position of the grid origin.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub dims: [usize; 3],
    pub spacing: [f32; 3],
    pub origin: [f32; 3],
}

impl ImageGeometry {
    pub fn new(dims: [usize; 3], spacing: [f32; 3], origin: [f32; 3]) -> Self {
        Self {
            dims,
            spacing,
            origin,
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// The physical volume of one voxel.
    pub fn voxel_volume(&self) -> f32 {
        self.spacing[0] * self.spacing[1] * self.spacing[2]
    }

    /// The physical center of the voxel at flat index `i`, with x varying
    /// fastest: `i = z * nx * ny + y * nx + x`.
    pub fn voxel_center(&self, i: usize) -> [f32; 3] {
        let nx = self.dims[0];
        let ny = self.dims[1];
        let x = i % nx;
        let y = (i / nx) % ny;
        let z = i / (nx * ny);
        [
            self.origin[0] + (x as f32 + 0.5) * self.spacing[0],
            self.origin[1] + (y as f32 + 0.5) * self.spacing[1],
            self.origin[2] + (z as f32 + 0.5) * self.spacing[2],
        ]
    }

    /// True when the grid is degenerate (a single voxel thick) along `axis`.
    pub fn is_flat(&self, axis: usize) -> bool {
        self.dims[axis] == 1
    }
}

/// A named collection of attribute matrices.
#[derive(Debug)]
pub struct DataContainer {
    name: String,
    geometry: Option<ImageGeometry>,
    matrices: HashMap<String, AttributeMatrix>,
}

impl DataContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            matrices: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_geometry(&mut self, geometry: ImageGeometry) {
        self.geometry = Some(geometry);
    }

    pub fn geometry(&self) -> Option<&ImageGeometry> {
        self.geometry.as_ref()
    }

    /// Inserts a matrix, replacing any existing matrix with the same name.
    pub fn insert_matrix(&mut self, matrix: AttributeMatrix) {
        self.matrices.insert(matrix.name().to_string(), matrix);
    }

    pub fn matrix(&self, name: &str) -> Option<&AttributeMatrix> {
        self.matrices.get(name)
    }

    pub fn matrix_mut(&mut self, name: &str) -> Option<&mut AttributeMatrix> {
        self.matrices.get_mut(name)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_center_x_fastest_ordering() {
        let geom = ImageGeometry::new([2, 2, 1], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert_eq!(geom.voxel_center(0), [0.5, 0.5, 0.5]);
        assert_eq!(geom.voxel_center(1), [1.5, 0.5, 0.5]);
        assert_eq!(geom.voxel_center(2), [0.5, 1.5, 0.5]);
    }

    #[test]
    fn test_voxel_volume_and_count() {
        let geom = ImageGeometry::new([4, 3, 2], [0.5, 0.5, 2.0], [0.0, 0.0, 0.0]);
        assert_eq!(geom.voxel_count(), 24);
        assert!((geom.voxel_volume() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_flat_axis_detection() {
        let geom = ImageGeometry::new([8, 8, 1], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert!(!geom.is_flat(0));
        assert!(geom.is_flat(2));
    }

    #[test]
    fn test_matrix_insert_and_lookup() {
        let mut dc = DataContainer::new("ImageDataContainer");
        dc.insert_matrix(AttributeMatrix::new("CellData", 64));
        assert!(dc.matrix("CellData").is_some());
        assert!(dc.matrix("CellFeatureData").is_none());
    }
}
