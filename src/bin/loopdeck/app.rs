//! Host wiring: audio streams, MIDI, terminal and the control loop

use std::io::stdout;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use crossterm::event::{
    self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use ratatui::DefaultTerminal;
use rtrb::{Consumer, Producer, RingBuffer};

use loopdeck::clock::{Clock, FrameClock};
use loopdeck::engine::{playback_channel, AudioEngine, RtPlayback, TapBus};
use loopdeck::io::InputEvent;
use loopdeck::looper::CaptureBus;
use loopdeck::synth::{PolySynth, TimedMessage};
use loopdeck::{Command, Config, Workstation, MAX_BLOCK_SIZE};

use crate::midi;
use crate::ui::{UiAction, UiApp};

type HostWorkstation = Workstation<FrameClock, Producer<TimedMessage>, TapBus, RtPlayback>;

// Tunables
const VOICE_QUEUE_LEN: usize = 256;
const MIXER_QUEUE_LEN: usize = 64;
const INPUT_RING_SECONDS: usize = 1;
const TAP_RING_SECONDS: usize = 2;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub fn run(config: Config, midi_port: Option<usize>) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let output_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = output_config.sample_rate().0 as f32;
    let channels = output_config.channels() as usize;
    log::info!("output: {sample_rate} Hz, {channels} channels");

    // --- Cross-thread rings ---
    let (clock, counter) = FrameClock::new(sample_rate as f64);
    let (voice_tx, voice_rx) = RingBuffer::<TimedMessage>::new(VOICE_QUEUE_LEN);
    let (playback, mixer_end) = playback_channel(MIXER_QUEUE_LEN);

    let synth = PolySynth::new(sample_rate, config.audio.max_voices, voice_rx);
    let mut engine = AudioEngine::new(synth, mixer_end, config.station.slots, counter);

    // --- Optional input stream; without it the capture bus refuses sessions ---
    let mut input_stream = None;
    let bus = if config.audio.input {
        match open_input(&host, sample_rate as usize * INPUT_RING_SECONDS) {
            Ok((stream, input_rx)) => {
                let (tap_tx, tap_rx) = RingBuffer::new(sample_rate as usize * TAP_RING_SECONDS);
                engine = engine.with_input(input_rx).with_tap(tap_tx);
                input_stream = Some(stream);
                TapBus::new(tap_rx, config.audio.capture_chunk_frames)
            }
            Err(err) => {
                log::warn!("no input stream, loop recording disabled: {err:#}");
                TapBus::unavailable()
            }
        }
    } else {
        TapBus::unavailable()
    };

    // --- Output stream ---
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
    let stream = device.build_output_stream(
        &output_config.into(),
        move |data: &mut [f32], _| {
            for out in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let frames = out.len() / channels;
                let block = &mut render_buf[..frames];
                engine.render(block);

                // Mono to all channels
                for (frame, &s) in out.chunks_mut(channels).zip(block.iter()) {
                    frame.fill(s);
                }
            }
        },
        |err| log::error!("audio output error: {err}"),
        None,
    )?;
    stream.play()?;
    if let Some(input) = &input_stream {
        input.play()?;
    }

    // --- MIDI ---
    let (midi_tx, midi_rx) = crossbeam_channel::unbounded();
    let _midi_connection = match midi_port {
        Some(port) => Some(midi::connect(port, midi_tx)?),
        None => None,
    };

    let workstation = Workstation::new(&config, clock, voice_tx, bus, playback)?;
    let input_available = workstation.bus().is_available();

    // --- Terminal ---
    let terminal = ratatui::init();
    let key_release = enable_key_release();

    let mut ui = UiApp::new(key_release, sample_rate);
    if !input_available {
        ui.set_status("no input device: loop recording unavailable");
    }
    let res = control_loop(terminal, workstation, ui, midi_rx);

    if key_release {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    ratatui::restore();
    res
}

/// Ask the terminal for key-release events. Without them computer-keyboard
/// notes are released after a fixed time.
fn enable_key_release() -> bool {
    if !matches!(supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(
        stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn open_input(host: &cpal::Host, capacity: usize) -> EyreResult<(cpal::Stream, Consumer<f32>)> {
    let device = host
        .default_input_device()
        .ok_or_else(|| eyre!("no default input device available"))?;
    let config = device
        .default_input_config()
        .wrap_err("failed to fetch default input config")?;
    let channels = config.channels() as usize;
    log::info!(
        "input: {} Hz, {channels} channels",
        config.sample_rate().0
    );

    let (mut tx, rx) = RingBuffer::<f32>::new(capacity);
    let stream = device.build_input_stream(
        &config.into(),
        move |data: &[f32], _| {
            for frame in data.chunks(channels) {
                let mono = frame.iter().sum::<f32>() / channels as f32;
                if tx.push(mono).is_err() {
                    break;
                }
            }
        },
        |err| log::error!("audio input error: {err}"),
        None,
    )?;
    Ok((stream, rx))
}

fn control_loop(
    mut terminal: DefaultTerminal,
    mut ws: HostWorkstation,
    mut ui: UiApp,
    midi_rx: Receiver<InputEvent>,
) -> EyreResult<()> {
    loop {
        ws.fire_due_timers();
        ws.pump_capture();
        ws.playback_mut().collect_retired();

        while let Ok(event) = midi_rx.try_recv() {
            apply(&mut ws, &mut ui, Command::Input(event));
        }
        for action in ui.expire_taps(Instant::now()) {
            if let UiAction::Command(command) = action {
                apply(&mut ws, &mut ui, command);
            }
        }
        for change in ws.drain_changes() {
            ui.push_change(change);
        }

        let snapshot = ws.snapshot();
        terminal.draw(|frame| ui.render(frame, &snapshot))?;

        if event::poll(poll_timeout(&mut ws, &ui))? {
            if let Event::Key(key) = event::read()? {
                match ui.on_key(key, &snapshot) {
                    Some(UiAction::Quit) => break,
                    Some(UiAction::Command(command)) => apply(&mut ws, &mut ui, command),
                    None => {}
                }
            }
        }
    }

    ws.handle(Command::StopAll)?;
    ws.handle(Command::StopMetronome)?;
    Ok(())
}

/// Errors from a single command are shown, never fatal
fn apply(ws: &mut HostWorkstation, ui: &mut UiApp, command: Command) {
    if let Err(err) = ws.handle(command) {
        log::warn!("{err}");
        ui.set_status(err.to_string());
    }
}

/// Sleep until the next driving timer, tap release or redraw, whichever is first
fn poll_timeout(ws: &mut HostWorkstation, ui: &UiApp) -> Duration {
    let mut timeout = FRAME_INTERVAL;
    if let Some(deadline) = ws.next_deadline() {
        let wait = (deadline - ws.clock().now()).max(0.0);
        timeout = timeout.min(Duration::from_secs_f64(wait));
    }
    if let Some(due) = ui.next_tap_release() {
        timeout = timeout.min(due.saturating_duration_since(Instant::now()));
    }
    timeout
}
