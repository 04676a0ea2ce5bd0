//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use loopdeck::dsp::oscillator::Oscillator;

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let oscillators = [
            ("sine", Oscillator::sine()),
            ("saw", Oscillator::saw()),
            ("square", Oscillator::square()),
            ("noise", Oscillator::noise()),
        ];

        for (name, mut osc) in oscillators {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = osc.next_sample(black_box(440.0), SR);
                    }
                })
            });
        }
    }

    group.finish();
}
