use gemini_live_types::{Speaker, TranscriptTurn};

/// Ordered turn history for one session.
///
/// Append-only except for in-place text growth of the last open turn:
/// a streamed delta extends the most recent turn when it belongs to the
/// same speaker and is still open, and opens a new turn otherwise.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<TranscriptTurn>,
    next_sequence: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_delta(&mut self, speaker: Speaker, text: &str) {
        match self.turns.last_mut() {
            Some(last) if last.accepts_delta_from(speaker) => last.text.push_str(text),
            _ => self.push_turn(speaker, text, false),
        }
    }

    /// Closes every turn. Creates none; both speakers' open turns are
    /// finalized together.
    pub fn finalize_all(&mut self) {
        for turn in &mut self.turns {
            turn.is_final = true;
        }
    }

    /// Appends an already-final turn, e.g. the end-of-interview notice.
    pub fn push_final(&mut self, speaker: Speaker, text: &str) {
        self.push_turn(speaker, text, true);
    }

    fn push_turn(&mut self, speaker: Speaker, text: &str, is_final: bool) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.turns.push(TranscriptTurn {
            speaker,
            text: text.to_string(),
            is_final,
            sequence,
        });
    }

    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
