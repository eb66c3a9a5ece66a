// In benches/neighborhoods_bench.rs

use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use grainpipe::containers::{
    AttributeMatrix, DataArray, DataArrayPath, DataContainer, DataStructure, ImageGeometry,
};
use grainpipe::filters::{names, FindNeighborhoods};
use grainpipe::pipeline::{Filter, MessageSink};

/// Builds a feature data structure with uniformly scattered centroids.
fn scattered_feature_store(feature_count: usize) -> DataStructure {
    let mut rng = StdRng::seed_from_u64(42);

    let mut dc = DataContainer::new(names::DEFAULT_CONTAINER);
    dc.set_geometry(ImageGeometry::new(
        [128, 128, 128],
        [1.0, 1.0, 1.0],
        [0.0, 0.0, 0.0],
    ));

    let tuples = feature_count + 1; // index 0 is the reserved background
    let mut features = AttributeMatrix::new(names::FEATURE_MATRIX, tuples);

    let mut centroids = DataArray::<f32>::new(names::CENTROIDS, 3, tuples, 0.0);
    for value in centroids.data_mut().iter_mut() {
        *value = rng.random_range(0.0..128.0);
    }
    features.insert(Box::new(centroids)).unwrap();

    let mut diameters = DataArray::<f32>::new(names::EQUIVALENT_DIAMETERS, 1, tuples, 0.0);
    for value in diameters.data_mut().iter_mut() {
        *value = rng.random_range(0.5..4.0);
    }
    features.insert(Box::new(diameters)).unwrap();

    features
        .insert(Box::new(DataArray::<i32>::new(names::PHASES, 1, tuples, 1)))
        .unwrap();

    dc.insert_matrix(features);
    let mut store = DataStructure::new();
    store.insert_container(dc);
    store
}

fn bench_find_neighborhoods(c: &mut Criterion) {
    let mut group = c.benchmark_group("FindNeighborhoods Sweep");

    for &feature_count in &[100usize, 500, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(feature_count),
            &feature_count,
            |b, &count| {
                let mut store = scattered_feature_store(count);
                let cancel = AtomicBool::new(false);
                b.iter(|| {
                    let mut filter = FindNeighborhoods::new();
                    let mut sink =
                        MessageSink::detached("FindNeighborhoods", "Find Neighborhoods");
                    let code = filter.execute(&mut store, &mut sink, &cancel);
                    assert_eq!(code, 0);
                    black_box(
                        store
                            .prereq_array::<i32>(
                                &DataArrayPath::new(
                                    names::DEFAULT_CONTAINER,
                                    names::FEATURE_MATRIX,
                                    names::NEIGHBORHOODS,
                                ),
                                1,
                            )
                            .unwrap()
                            .data()
                            .len(),
                    );
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_find_neighborhoods);
criterion_main!(benches);
