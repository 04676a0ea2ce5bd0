//! loopdeck - terminal workstation
//!
//! Run with: cargo run -- [--config loopdeck.toml]

mod app;
mod midi;
mod ui;

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};

use loopdeck::Config;

#[derive(Parser)]
#[command(name = "loopdeck")]
#[command(author, version, about = "Metronome, synth and loop station in the terminal", long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tempo override
    #[arg(short, long)]
    bpm: Option<f64>,

    /// Number of loop slots
    #[arg(long)]
    slots: Option<usize>,

    /// Do not open an input device; loop recording will be refused
    #[arg(long)]
    no_input: bool,

    /// MIDI input port index (see --list-midi)
    #[arg(long)]
    midi_port: Option<usize>,

    /// List MIDI input ports and exit
    #[arg(long)]
    list_midi: bool,

    /// Where log output goes while the TUI owns the terminal
    #[arg(long, default_value = "loopdeck.log")]
    log_file: PathBuf,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if cli.list_midi {
        for (index, name) in midi::list_ports()?.iter().enumerate() {
            println!("{index}: {name}");
        }
        return Ok(());
    }

    let log_file = File::create(&cli.log_file)
        .wrap_err_with(|| format!("failed to create log file {}", cli.log_file.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    // CLI overrides
    if let Some(bpm) = cli.bpm {
        config.tempo.bpm = bpm;
    }
    if let Some(slots) = cli.slots {
        config.station.slots = slots;
    }
    if cli.no_input {
        config.audio.input = false;
    }
    config.validate()?;

    app::run(config, cli.midi_port)
}
