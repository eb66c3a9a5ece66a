//! Concrete analysis filters operating on segmented feature data.
//!
//! Each filter follows the same two-phase shape: `data_check` resolves its
//! required arrays through the data structure's prerequisite accessors and
//! declares its outputs, `execute` re-validates and then runs the numeric
//! body. The chain `FindCentroids` -> `FindSizes` -> `FindNeighborhoods`
//! takes a labeled voxel grid to per-feature adjacency lists.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Per-feature centroid positions from labeled voxels.
pub mod find_centroids;

/// Per-feature volumes and sphere-equivalent diameters.
pub mod find_sizes;

/// Pairwise proximity classification over feature centroids.
pub mod find_neighborhoods;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::find_centroids::FindCentroids;
pub use self::find_neighborhoods::FindNeighborhoods;
pub use self::find_sizes::FindSizes;

/// The conventional array and matrix names shared across filters. Callers may
/// override any of them per filter via parameters.
pub mod names {
    pub const FEATURE_IDS: &str = "FeatureIds";
    pub const CENTROIDS: &str = "Centroids";
    pub const EQUIVALENT_DIAMETERS: &str = "EquivalentDiameters";
    pub const PHASES: &str = "Phases";
    pub const VOLUMES: &str = "Volumes";
    pub const NUM_CELLS: &str = "NumCells";
    pub const NEIGHBORHOODS: &str = "Neighborhoods";
    pub const NEIGHBORHOOD_LIST: &str = "NeighborhoodList";

    pub const DEFAULT_CONTAINER: &str = "ImageDataContainer";
    pub const CELL_MATRIX: &str = "CellData";
    pub const FEATURE_MATRIX: &str = "CellFeatureData";
}
