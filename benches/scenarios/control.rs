//! Benchmarks for the control side: one driving-timer pass and a full
//! record/finalize cycle. Neither runs on the audio thread, but both share
//! it with the UI and should stay far below the 25 ms timer interval.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use loopdeck::clock::ManualClock;
use loopdeck::io::InputEvent;
use loopdeck::looper::{MemoryBus, MemoryPlayback};
use loopdeck::synth::TimedMessage;
use loopdeck::{Command, Config, Workstation};

type Ws = Workstation<ManualClock, Vec<TimedMessage>, MemoryBus, MemoryPlayback>;

fn workstation(bpm: f64) -> (Ws, ManualClock) {
    let mut config = Config::default();
    config.tempo.bpm = bpm;
    let clock = ManualClock::new(0.0);
    let ws = Workstation::new(
        &config,
        clock.clone(),
        Vec::new(),
        MemoryBus::new(),
        MemoryPlayback::default(),
    )
    .expect("default config is valid");
    (ws, clock)
}

pub fn bench_control(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/control");

    for bpm in [60.0, 240.0] {
        let (mut ws, clock) = workstation(bpm);
        ws.handle(Command::StartMetronome).expect("start");
        group.bench_with_input(BenchmarkId::new("metronome_pass", bpm as u32), &bpm, |b, _| {
            b.iter(|| {
                clock.advance(0.025);
                black_box(ws.fire_due_timers());
                ws.voices_mut().clear();
            })
        });
    }

    // Chunk size matches the default capture_chunk_frames in f32 PCM
    let chunk = vec![0u8; 4096 * 4];
    let (mut ws, _clock) = workstation(120.0);
    group.bench_function("record_cycle", |b| {
        b.iter(|| {
            ws.handle(Command::Input(InputEvent::RecordToggle(0))).expect("record");
            let session = ws
                .station()
                .slot(0)
                .and_then(|s| s.session())
                .expect("recording");
            for _ in 0..8 {
                ws.bus_mut().push_chunk(session, chunk.clone());
            }
            ws.handle(Command::Input(InputEvent::RecordToggle(0))).expect("stop");
            ws.pump_capture();
            ws.handle(Command::ClearLoop(0)).expect("clear");
            black_box(ws.drain_changes());
        })
    });

    group.finish();
}
