//! Loop slot rows: state, gain meter and take size

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use loopdeck::looper::SlotState;
use loopdeck::WorkstationSnapshot;

const GAIN_METER_WIDTH: usize = 10;

fn state_color(state: SlotState) -> Color {
    match state {
        SlotState::Empty => Color::DarkGray,
        SlotState::Recording => Color::Red,
        SlotState::Finalizing => Color::Yellow,
        SlotState::Playing => Color::Green,
        SlotState::Stopped => Color::Blue,
    }
}

pub fn render_slots(
    frame: &mut Frame,
    area: Rect,
    snapshot: &WorkstationSnapshot,
    selected: usize,
    sample_rate: f32,
) {
    let block = Block::default().title(" Loops ").borders(Borders::ALL);

    let lines: Vec<Line> = snapshot
        .slots
        .iter()
        .map(|slot| {
            let filled = (slot.gain * GAIN_METER_WIDTH as f32).round() as usize;
            let meter = format!(
                "{}{}",
                "█".repeat(filled.min(GAIN_METER_WIDTH)),
                "░".repeat(GAIN_METER_WIDTH.saturating_sub(filled))
            );
            // f32 PCM, 4 bytes per frame
            let seconds = slot.bytes as f32 / 4.0 / sample_rate;

            let marker = if slot.index == selected { "▶" } else { " " };
            let name_style = if slot.index == selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Line::from(vec![
                Span::styled(format!(" {marker} {}  ", slot.index + 1), name_style),
                Span::styled(
                    format!("{:<10}", slot.state.label()),
                    Style::default().fg(state_color(slot.state)),
                ),
                Span::styled(meter, Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("  {:>3.0}%  ", slot.gain * 100.0),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(if slot.bytes > 0 {
                    format!("{seconds:.1}s")
                } else {
                    String::new()
                }),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
