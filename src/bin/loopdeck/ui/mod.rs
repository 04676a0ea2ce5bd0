//! TUI for loopdeck
//!
//! A read-only projection of the workstation plus the key bindings. The UI
//! never touches workstation state directly; it turns keys into actions
//! and the control loop applies them.

mod slots;
mod transport;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use loopdeck::io::{InputEvent, KeyMap};
use loopdeck::looper::SlotChange;
use loopdeck::{Command, WorkstationSnapshot};

use slots::render_slots;
use transport::render_transport;

/// How long a computer-keyboard note sounds when the terminal cannot report key releases
const TAP_NOTE_LENGTH: Duration = Duration::from_millis(300);

const BPM_STEP: f64 = 5.0;
const GAIN_STEP: f32 = 0.1;
const CHANGE_LOG_LEN: usize = 8;

pub enum UiAction {
    Quit,
    Command(Command),
}

pub struct UiApp {
    keys: KeyMap,
    /// Whether the terminal reports key releases
    key_release: bool,
    /// Pending automatic releases (key, due)
    tap_releases: Vec<(char, Instant)>,
    selected: usize,
    status: Option<String>,
    changes: VecDeque<SlotChange>,
    sample_rate: f32,
}

impl UiApp {
    pub fn new(key_release: bool, sample_rate: f32) -> Self {
        Self {
            keys: KeyMap::default(),
            key_release,
            tap_releases: Vec::new(),
            selected: 0,
            status: None,
            changes: VecDeque::with_capacity(CHANGE_LOG_LEN),
            sample_rate,
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn push_change(&mut self, change: SlotChange) {
        if self.changes.len() == CHANGE_LOG_LEN {
            self.changes.pop_front();
        }
        self.changes.push_back(change);
    }

    /// Note-offs for tap notes whose time is up
    pub fn expire_taps(&mut self, now: Instant) -> Vec<UiAction> {
        let mut actions = Vec::new();
        let keys = &mut self.keys;
        self.tap_releases.retain(|&(key, due)| {
            if due > now {
                return true;
            }
            if let Some(event) = keys.release(key) {
                actions.push(UiAction::Command(Command::Input(event)));
            }
            false
        });
        actions
    }

    /// Earliest pending tap release
    pub fn next_tap_release(&self) -> Option<Instant> {
        self.tap_releases.iter().map(|&(_, due)| due).min()
    }

    pub fn on_key(&mut self, key: KeyEvent, snapshot: &WorkstationSnapshot) -> Option<UiAction> {
        let slots = snapshot.slots.len();

        if key.kind == KeyEventKind::Release {
            let KeyCode::Char(c) = key.code else {
                return None;
            };
            return self
                .keys
                .release(c)
                .map(|event| UiAction::Command(Command::Input(event)));
        }

        let command = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Some(UiAction::Quit),
            KeyCode::Char(' ') => Command::ToggleMetronome,
            KeyCode::Char('+') | KeyCode::Char('=') => Command::SetBpm(snapshot.bpm + BPM_STEP),
            KeyCode::Char('-') => Command::SetBpm((snapshot.bpm - BPM_STEP).max(BPM_STEP)),
            KeyCode::Char('b') => Command::SetBeatsPerBar(snapshot.beats_per_bar % 7 + 1),
            KeyCode::Char('i') => Command::SetInstrument(snapshot.instrument.next()),
            KeyCode::Char('p') => Command::PlayAll,
            KeyCode::Char('o') => Command::StopAll,
            KeyCode::Char('n') => Command::AllNotesOff,
            KeyCode::Tab if slots > 0 => {
                self.selected = (self.selected + 1) % slots;
                return None;
            }
            KeyCode::BackTab if slots > 0 => {
                self.selected = (self.selected + slots - 1) % slots;
                return None;
            }
            KeyCode::Enter => Command::ToggleLoop(self.selected),
            KeyCode::Backspace | KeyCode::Delete => Command::ClearLoop(self.selected),
            KeyCode::Char('[') | KeyCode::Char(']') => {
                let gain = snapshot.slots.get(self.selected)?.gain;
                let step = if key.code == KeyCode::Char(']') { GAIN_STEP } else { -GAIN_STEP };
                Command::SetGain {
                    slot: self.selected,
                    gain: (gain + step).clamp(0.0, 1.0),
                }
            }
            KeyCode::Char(c) => {
                let event = self.keys.press(c)?;
                if let InputEvent::RecordToggle(slot) = event {
                    if slot < slots {
                        self.selected = slot;
                    }
                } else if !self.key_release {
                    self.tap_releases.push((c, Instant::now() + TAP_NOTE_LENGTH));
                }
                Command::Input(event)
            }
            _ => return None,
        };
        Some(UiAction::Command(command))
    }

    pub fn render(&self, frame: &mut Frame, snapshot: &WorkstationSnapshot) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                                  // Transport bar
                Constraint::Length(snapshot.slots.len() as u16 + 2),    // Slots
                Constraint::Min(4),                                     // Recent changes
                Constraint::Length(1),                                  // Status
                Constraint::Length(1),                                  // Help bar
            ])
            .split(area);

        render_transport(frame, chunks[0], snapshot, self.keys.octave());
        render_slots(frame, chunks[1], snapshot, self.selected, self.sample_rate);

        let items: Vec<ListItem> = self
            .changes
            .iter()
            .rev()
            .map(|c| {
                ListItem::new(format!(
                    " slot {}: {} → {}",
                    c.index + 1,
                    c.from.label(),
                    c.to.label()
                ))
            })
            .collect();
        let changes = List::new(items).block(Block::default().title(" Events ").borders(Borders::ALL));
        frame.render_widget(changes, chunks[2]);

        let status = Paragraph::new(Line::from(format!(
            " {}",
            self.status.as_deref().unwrap_or("")
        )))
        .style(Style::default().fg(Color::Yellow));
        frame.render_widget(status, chunks[3]);

        let instrument_hint = snapshot.instrument.label();
        let help = Paragraph::new(format!(
            " [Q] Quit  [Space] Click  [+/-] BPM  [B] Meter  [I] {instrument_hint}  [1-9] Rec  \
             [Tab] Select  [Enter] Play/Stop  [Del] Clear  [[ ]] Gain  [P/O] All  [Z/X] Octave"
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
