//! Benchmarks for the voice pool.
//!
//! A block with a full kit hit, a chord and a metronome click is about the
//! worst the workstation produces from live input.

use std::collections::VecDeque;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use loopdeck::synth::{DrumKind, PolySynth, SynthMessage, TimedMessage};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

fn busy_block() -> VecDeque<TimedMessage> {
    let mut messages = VecDeque::new();
    for (i, kind) in [DrumKind::Kick, DrumKind::Snare, DrumKind::ClosedHat, DrumKind::Clap]
        .into_iter()
        .enumerate()
    {
        messages.push_back(TimedMessage {
            time: i as f64 * 0.0005,
            message: SynthMessage::Drum { kind, velocity: 110 },
        });
    }
    for note in [60, 64, 67, 71] {
        messages.push_back(TimedMessage {
            time: 0.0,
            message: SynthMessage::NoteOn { note, velocity: 90 },
        });
    }
    messages.push_back(TimedMessage {
        time: 0.0,
        message: SynthMessage::Click { accent: true },
    });
    messages
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === IDLE POOL ===
        // Baseline cost of a block with nothing sounding
        let mut idle = PolySynth::new(SR, 16, VecDeque::new());
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| idle.render_block(black_box(&mut buffer)))
        });

        // === HELD CHORD ===
        // Four lead voices in sustain
        let chord: VecDeque<_> = busy_block()
            .into_iter()
            .filter(|m| matches!(m.message, SynthMessage::NoteOn { .. }))
            .collect();
        let mut held = PolySynth::new(SR, 16, chord);
        held.render_block(&mut vec![0.0; 4_800]);
        group.bench_with_input(BenchmarkId::new("chord", size), &size, |b, _| {
            b.iter(|| held.render_block(black_box(&mut buffer)))
        });

        // === BUSY BLOCK ===
        // Fresh pool, kit + chord + click all starting inside the block
        group.bench_with_input(BenchmarkId::new("busy", size), &size, |b, _| {
            b.iter(|| {
                let mut synth = PolySynth::new(SR, 16, busy_block());
                synth.render_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
