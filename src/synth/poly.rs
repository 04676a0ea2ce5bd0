use crate::synth::{
    message::{MessageReceiver, SynthMessage, TimedMessage},
    patch::Patch,
    voice::{Voice, VoiceState},
};

/// Messages held back because their time has not come yet. Anything past
/// this stays in the receiver until there is room.
const PENDING_CAPACITY: usize = 256;

/// Voice pool that honours trigger times to the sample.
///
/// Each message's `time` is converted to a frame on the synth's own frame
/// counter (which runs in lockstep with the audio clock), and the block is
/// split at that frame. Messages that arrive late sound at the start of the
/// next block.
pub struct PolySynth<R: MessageReceiver> {
    voices: Vec<Voice>,
    rx: R,
    pending: Vec<TimedMessage>,
    sample_rate: f32,
    frame_counter: u64,
}

impl<R: MessageReceiver> PolySynth<R> {
    pub fn new(sample_rate: f32, max_voices: usize, rx: R) -> Self {
        let voices = (0..max_voices).map(|_| Voice::new(sample_rate)).collect();

        Self {
            voices,
            rx,
            pending: Vec::with_capacity(PENDING_CAPACITY),
            sample_rate,
            frame_counter: 0,
        }
    }

    /// Frames rendered so far
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Render one block into `out` (overwrites)
    pub fn render_block(&mut self, out: &mut [f32]) {
        // Insert in time order; equal times keep arrival order
        while self.pending.len() < PENDING_CAPACITY {
            let Some(msg) = self.rx.pop() else {
                break;
            };
            let at = self
                .pending
                .partition_point(|m| m.time.total_cmp(&msg.time).is_le());
            self.pending.insert(at, msg);
        }

        out.fill(0.0);
        let block_start = self.frame_counter;
        let block_end = block_start + out.len() as u64;

        let mut cursor = 0usize;
        let mut consumed = 0usize;
        while consumed < self.pending.len() {
            let msg = self.pending[consumed];
            let frame = self.time_to_frame(msg.time);
            if frame >= block_end {
                break;
            }
            let offset = frame.saturating_sub(block_start) as usize;
            if offset > cursor {
                self.render_voices(&mut out[cursor..offset]);
                cursor = offset;
            }
            self.apply(msg.message, block_start + cursor as u64);
            consumed += 1;
        }
        self.pending.drain(..consumed);

        if cursor < out.len() {
            self.render_voices(&mut out[cursor..]);
        }
        self.frame_counter = block_end;
    }

    fn time_to_frame(&self, time: f64) -> u64 {
        (time.max(0.0) * self.sample_rate as f64).round() as u64
    }

    fn render_voices(&mut self, out: &mut [f32]) {
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.render(out);
            }
        }
    }

    fn apply(&mut self, message: SynthMessage, age: u64) {
        match message {
            SynthMessage::NoteOn { note, velocity } => {
                if let Some(voice) = self.allocate_voice() {
                    voice.start(Patch::Lead, note, velocity, age);
                }
            }
            SynthMessage::NoteOff { note } => {
                if let Some(voice) = self.find_held(note) {
                    voice.release();
                }
            }
            SynthMessage::Drum { kind, velocity } => {
                if let Some(voice) = self.allocate_voice() {
                    voice.start(Patch::Drum(kind), 0, velocity, age);
                }
            }
            SynthMessage::Click { accent } => {
                if let Some(voice) = self.allocate_voice() {
                    voice.start(Patch::Click { accent }, 0, 127, age);
                }
            }
            SynthMessage::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.release();
                }
            }
        }
    }

    fn allocate_voice(&mut self) -> Option<&mut Voice> {
        // First pass: free voice
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(&mut self.voices[idx]);
        }

        // Second pass: oldest releasing voice, then oldest of all
        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .or_else(|| self.voices.iter().enumerate().min_by_key(|(_, v)| v.age()))
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }

    fn find_held(&mut self, note: u8) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| {
            v.patch() == Patch::Lead && v.note() == note && v.state() == VoiceState::Active
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::synth::patch::DrumKind;

    const SR: f32 = 1_000.0;

    fn synth(messages: &[TimedMessage]) -> PolySynth<VecDeque<TimedMessage>> {
        PolySynth::new(SR, 4, messages.iter().copied().collect())
    }

    fn first_nonzero(buf: &[f32]) -> Option<usize> {
        buf.iter().position(|s| s.abs() > 0.0)
    }

    #[test]
    fn silent_without_messages() {
        let mut s = synth(&[]);
        let mut out = vec![1.0; 64];
        s.render_block(&mut out);
        assert!(out.iter().all(|&x| x == 0.0));
        assert_eq!(s.frame_counter(), 64);
    }

    #[test]
    fn trigger_starts_on_its_frame() {
        // 0.037 s at 1 kHz = frame 37
        let mut s = synth(&[TimedMessage {
            time: 0.037,
            message: SynthMessage::NoteOn { note: 69, velocity: 127 },
        }]);
        let mut out = vec![0.0; 64];
        s.render_block(&mut out);

        let onset = first_nonzero(&out).expect("note never sounded");
        assert!((37..=38).contains(&onset), "onset at {onset}");
        assert!(out[..37].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn future_message_waits_for_its_block() {
        let mut s = synth(&[TimedMessage {
            time: 0.1,
            message: SynthMessage::Drum { kind: DrumKind::Kick, velocity: 100 },
        }]);
        let mut out = vec![0.0; 64];
        s.render_block(&mut out);
        assert_eq!(s.active_voices(), 0);

        s.render_block(&mut out);
        assert_eq!(s.active_voices(), 1);
        let onset = first_nonzero(&out).unwrap();
        assert!(onset >= 100 - 64, "onset at {onset}");
    }

    #[test]
    fn note_off_releases_only_matching_note() {
        let mut s = synth(&[
            TimedMessage { time: 0.0, message: SynthMessage::NoteOn { note: 60, velocity: 100 } },
            TimedMessage { time: 0.0, message: SynthMessage::NoteOn { note: 64, velocity: 100 } },
            TimedMessage { time: 0.01, message: SynthMessage::NoteOff { note: 60 } },
        ]);
        let mut out = vec![0.0; 32];
        s.render_block(&mut out);

        let states: Vec<_> = s.voices().iter().map(|v| (v.note(), v.state())).collect();
        assert!(states.contains(&(60, VoiceState::Releasing)));
        assert!(states.contains(&(64, VoiceState::Active)));
    }

    #[test]
    fn full_pool_steals_oldest() {
        let messages: Vec<_> = (0..5)
            .map(|i| TimedMessage {
                time: i as f64 * 0.001,
                message: SynthMessage::NoteOn { note: 60 + i as u8, velocity: 100 },
            })
            .collect();
        let mut s = synth(&messages);
        let mut out = vec![0.0; 16];
        s.render_block(&mut out);

        let notes: Vec<u8> = s.voices().iter().map(|v| v.note()).collect();
        assert!(!notes.contains(&60), "oldest note should have been stolen");
        assert!(notes.contains(&64));
    }

    #[test]
    fn backlog_beyond_capacity_stays_in_the_receiver() {
        // Far in the future, so nothing is consumed
        let messages: Vec<_> = (0..PENDING_CAPACITY + 10)
            .map(|i| TimedMessage {
                time: 10.0 + i as f64,
                message: SynthMessage::NoteOff { note: 60 },
            })
            .collect();
        let mut s = synth(&messages);
        let mut out = vec![0.0; 16];
        s.render_block(&mut out);

        assert_eq!(s.pending.len(), PENDING_CAPACITY);
        assert_eq!(s.pending.capacity(), PENDING_CAPACITY);
        assert_eq!(s.rx.len(), 10);
        assert!(s.pending.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn out_of_order_arrivals_apply_in_time_order() {
        // The first note-off arrives before its note-on; the second pair
        // shares one time and must keep its arrival order
        let mut s = synth(&[
            TimedMessage { time: 0.01, message: SynthMessage::NoteOff { note: 60 } },
            TimedMessage { time: 0.0, message: SynthMessage::NoteOn { note: 60, velocity: 100 } },
            TimedMessage { time: 0.02, message: SynthMessage::NoteOn { note: 62, velocity: 100 } },
            TimedMessage { time: 0.02, message: SynthMessage::NoteOff { note: 62 } },
        ]);
        let mut out = vec![0.0; 32];
        s.render_block(&mut out);

        let states: Vec<_> = s.voices().iter().map(|v| (v.note(), v.state())).collect();
        assert!(states.contains(&(60, VoiceState::Releasing)));
        assert!(states.contains(&(62, VoiceState::Releasing)));
        assert!(!states.iter().any(|&(_, state)| state == VoiceState::Active));
    }
}
