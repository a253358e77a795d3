//! Benchmarks for the TMz update loop and setup.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use tmz_fdtd::analysis::amplitude_spectrum;
use tmz_fdtd::fdtd::{AveragingMode, FieldState, Operator};
use tmz_fdtd::geometry::{DielectricRegion, Discretization, OverlapPolicy, SimulationDomain};

fn operator(cells: usize, regions: &[DielectricRegion], averaging: AveragingMode) -> Operator {
    let dx = 1e-3;
    let side = (cells as f64 + 0.5) * dx;
    let dt = 0.9 * Discretization::courant_limit(dx, dx);
    Operator::new(
        SimulationDomain::new(side, side, 100.5 * dt),
        Discretization::new(dx, dx, dt),
        regions,
        averaging,
        OverlapPolicy::Reject,
    )
    .unwrap()
}

fn slab(cells: usize) -> DielectricRegion {
    let side = cells as f64 * 1e-3;
    DielectricRegion::new(side / 2.0, 0.0, side / 2.0, side, 4.0)
}

fn bench_fdtd_step(c: &mut Criterion) {
    for cells in [100, 200, 400, 800] {
        let op = operator(cells, &[slab(cells)], AveragingMode::Averaged);
        let source = (cells / 4, cells / 2);
        let total_nodes = op.shape().num_nodes();

        let mut group = c.benchmark_group(format!("fdtd_{}x{}", cells + 1, cells + 1));
        group.throughput(Throughput::Elements(total_nodes as u64));
        group.sample_size(20);

        group.bench_function("step", |b| {
            let mut fields = FieldState::new(op.shape());
            b.iter(|| {
                fields.step(&op, source, black_box(1.0));
                black_box(&fields);
            });
        });

        group.bench_function("energy", |b| {
            let fields = FieldState::new(op.shape());
            b.iter(|| black_box(fields.energy(&op)));
        });

        group.finish();
    }
}

fn bench_setup(c: &mut Criterion) {
    let cells = 400;
    let regions: Vec<DielectricRegion> = (0..8)
        .map(|k| {
            let x = (k as f64 * 50.0 + 1.0) * 1e-3;
            DielectricRegion::new(x, 0.05, 0.04, 0.3, 2.0 + k as f64)
        })
        .collect();

    let mut group = c.benchmark_group("setup");
    for mode in [AveragingMode::Averaged, AveragingMode::Shifted] {
        group.bench_function(format!("operator_{mode:?}").to_lowercase(), |b| {
            b.iter(|| black_box(operator(cells, &regions, mode)));
        });
    }
    group.finish();
}

fn bench_spectrum(c: &mut Criterion) {
    let dt = 1e-12;
    let samples: Vec<f64> = (0..4000)
        .map(|n| {
            let t = n as f64 * dt - 4e-10;
            (-(t * t) / 2e-20).exp()
        })
        .collect();

    c.bench_function("amplitude_spectrum_10000", |b| {
        b.iter(|| black_box(amplitude_spectrum(&samples, dt, 10_000)));
    });
}

criterion_group!(benches, bench_fdtd_step, bench_setup, bench_spectrum);
criterion_main!(benches);
