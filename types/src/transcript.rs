#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

/// One utterance, accumulated from streamed transcription deltas.
///
/// A turn stays open (`is_final == false`) while same-speaker deltas keep
/// arriving and becomes immutable once finalized. `sequence` is the turn's
/// identity: creation order within the session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TranscriptTurn {
    pub speaker: Speaker,
    pub text: String,
    pub is_final: bool,
    pub sequence: u64,
}

impl TranscriptTurn {
    /// An open turn may still grow; only same-speaker deltas extend it.
    pub fn accepts_delta_from(&self, speaker: Speaker) -> bool {
        self.speaker == speaker && !self.is_final
    }
}
