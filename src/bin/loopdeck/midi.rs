//! MIDI keyboards, forwarded into the control loop over a channel

use color_eyre::eyre::{eyre, Result as EyreResult};
use crossbeam_channel::Sender;
use midir::{Ignore, MidiInput, MidiInputConnection};

use loopdeck::io::{InputEvent, MidiEvent};

const CLIENT_NAME: &str = "loopdeck";

pub fn list_ports() -> EyreResult<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| eyre!("failed to create MIDI input: {e}"))?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect())
}

/// Connect to one input port. The connection must be kept alive for events
/// to keep flowing.
pub fn connect(port_index: usize, tx: Sender<InputEvent>) -> EyreResult<MidiInputConnection<()>> {
    let mut midi_in =
        MidiInput::new(CLIENT_NAME).map_err(|e| eyre!("failed to create MIDI input: {e}"))?;
    midi_in.ignore(Ignore::All);

    let ports = midi_in.ports();
    let port = ports
        .get(port_index)
        .ok_or_else(|| eyre!("no MIDI input port {port_index} ({} available)", ports.len()))?;
    let name = midi_in.port_name(port).unwrap_or_else(|_| "unknown".into());

    let connection = midi_in
        .connect(
            port,
            "loopdeck-in",
            move |_stamp, message, _| {
                if let Some(event) = MidiEvent::parse(message) {
                    // Receiver gone means the app is shutting down
                    let _ = tx.send(event.into());
                }
            },
            (),
        )
        .map_err(|e| eyre!("failed to connect to MIDI port {name}: {e}"))?;

    log::info!("MIDI input connected: {name}");
    Ok(connection)
}
