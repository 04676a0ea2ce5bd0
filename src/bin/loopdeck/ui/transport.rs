//! Transport bar widget - tempo, metronome, meter, instrument and octave

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use loopdeck::WorkstationSnapshot;

pub fn render_transport(frame: &mut Frame, area: Rect, snapshot: &WorkstationSnapshot, octave: i8) {
    let block = Block::default().title(" loopdeck ").borders(Borders::ALL);

    let (click_symbol, click_color) = if snapshot.metronome {
        ("● click", Color::Green)
    } else {
        ("○ click", Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(
            format!(" BPM: {:.0}  ", snapshot.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{click_symbol}  "), Style::default().fg(click_color)),
        Span::styled(
            format!("{}/4  ", snapshot.beats_per_bar),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{}  ", snapshot.instrument.label()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(format!("oct {octave:+}  "), Style::default().fg(Color::DarkGray)),
    ];
    if let Some(slot) = snapshot.recording {
        spans.push(Span::styled(
            format!("REC slot {}", slot + 1),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
