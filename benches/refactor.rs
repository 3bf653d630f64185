#[macro_use]
extern crate bencher;

extern crate mdr;
use mdr::prelude::*;

use bencher::Bencher;


fn test_array() -> Vec<f32> {
    (0_u64 .. 64 * 64 * 64)
        .map(|index| (index.wrapping_mul(2654435761) % 4096) as f32 / 2048.0 - 1.0)
        .collect()
}

fn refactor_uncompressed(bench: &mut Bencher) {
    let data = test_array();
    let pipeline = Refactor::new(
        HierarchicalDecomposer, DirectInterleaver,
        SignMagnitudeEncoder, NullLevelCompressor, MaxErrorEstimator,
    );

    bench.iter(|| {
        let refactored = pipeline.refactor(&data, &[64, 64, 64], 3, 16).unwrap();
        bencher::black_box(refactored);
    })
}

fn refactor_adaptive_compression(bench: &mut Bencher) {
    let data = test_array();
    let pipeline = Refactor::new(
        HierarchicalDecomposer, DirectInterleaver,
        NegaBinaryEncoder, AdaptiveLevelCompressor, SquaredErrorEstimator,
    );

    bench.iter(|| {
        let refactored = pipeline.refactor(&data, &[64, 64, 64], 3, 16).unwrap();
        bencher::black_box(refactored);
    })
}

fn reconstruct_coarse_tolerance(bench: &mut Bencher) {
    let data = test_array();
    let pipeline = Refactor::new(
        HierarchicalDecomposer, DirectInterleaver,
        SignMagnitudeEncoder, NullLevelCompressor, MaxErrorEstimator,
    );

    let (metadata, stream) = pipeline.refactor(&data, &[64, 64, 64], 3, 16).unwrap();
    let reconstructor = Reconstructor::new(
        HierarchicalDecomposer, DirectInterleaver, SignMagnitudeEncoder, NullLevelCompressor,
    );

    bench.iter(|| {
        let reconstructed: Vec<f32> = reconstructor.reconstruct(&metadata, &stream, 1e-2).unwrap();
        bencher::black_box(reconstructed);
    })
}

benchmark_group!(benches, refactor_uncompressed, refactor_adaptive_compression, reconstruct_coarse_tolerance);
benchmark_main!(benches);
