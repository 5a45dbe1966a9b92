use crate::audio::{Base64EncodedAudioBytes, INPUT_AUDIO_MIME_TYPE};
use crate::session::SessionConfig;

/// Frames sent to the service. Externally tagged so each serializes to the
/// wire envelope: `{"setup": ...}` or `{"realtimeInput": ...}`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ClientEvent {
    #[serde(rename = "setup")]
    Setup(SessionConfig),
    #[serde(rename = "realtimeInput")]
    RealtimeInput(RealtimeInput),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

impl RealtimeInput {
    pub fn single(chunk: MediaChunk) -> Self {
        Self {
            media_chunks: vec![chunk],
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub data: Base64EncodedAudioBytes,
    pub mime_type: String,
}

impl MediaChunk {
    /// A microphone chunk tagged with the fixed input codec descriptor.
    pub fn input_audio(data: Base64EncodedAudioBytes) -> Self {
        Self {
            data,
            mime_type: INPUT_AUDIO_MIME_TYPE.to_string(),
        }
    }
}

/// One inbound frame. Every field is optional; a single frame may carry
/// any combination of transcript deltas, control flags, and audio.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_complete: Option<SetupComplete>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_content: Option<ServerContent>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SetupComplete {}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_turn: Option<ModelTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_transcription: Option<Transcription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_transcription: Option<Transcription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<bool>,
}

impl ServerContent {
    /// Inline audio payload of this frame, if any. The service puts the
    /// chunk in the first part of the model turn.
    pub fn inline_audio(&self) -> Option<&str> {
        self.model_turn
            .as_ref()?
            .parts
            .first()?
            .inline_data
            .as_ref()
            .map(|d| d.data.as_str())
    }

    pub fn is_turn_complete(&self) -> bool {
        self.turn_complete.unwrap_or(false)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ModelTurn {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineData {
    pub data: Base64EncodedAudioBytes,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Transcription {
    pub text: String,
}

/// Channel-level view of the live session, delivered to the single
/// consumer in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The service acknowledged setup; the session is usable.
    Opened,
    Message(ServerMessage),
    Error(String),
    Closed { reason: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_input_frame_matches_wire_shape() {
        let event = ClientEvent::RealtimeInput(RealtimeInput::single(MediaChunk::input_audio(
            "AAAA".to_string(),
        )));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["realtimeInput"]["mediaChunks"][0]["data"], "AAAA");
        assert_eq!(
            json["realtimeInput"]["mediaChunks"][0]["mimeType"],
            "audio/pcm;rate=16000"
        );
    }

    #[test]
    fn parses_transcript_delta_frame() {
        let raw = r#"{"serverContent":{"outputTranscription":{"text":"Hello"}}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let content = msg.server_content.unwrap();
        assert_eq!(content.output_transcription.as_ref().unwrap().text, "Hello");
        assert!(!content.is_turn_complete());
    }

    #[test]
    fn parses_audio_frame_with_flags() {
        let raw = r#"{
            "serverContent": {
                "modelTurn": {
                    "parts": [{"inlineData": {"data": "UENN", "mimeType": "audio/pcm;rate=24000"}}]
                },
                "turnComplete": true
            }
        }"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let content = msg.server_content.unwrap();
        assert_eq!(content.inline_audio(), Some("UENN"));
        assert!(content.is_turn_complete());
        assert!(!content.is_interrupted());
    }

    #[test]
    fn parses_setup_complete_frame() {
        let raw = r#"{"setupComplete": {}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.setup_complete.is_some());
        assert!(msg.server_content.is_none());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let raw = r#"{"serverContent":{"interrupted":true,"usageMetadata":{"tokens":3}}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.server_content.unwrap().is_interrupted());
    }
}
