use crate::audio::Voice;

/// The `setup` payload sent as the first frame on a live session.
///
/// Mirrors the service's bidirectional-streaming setup message: model,
/// response modality, synthesis voice, system instruction, and the
/// both-direction transcription toggles.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Fully qualified model resource name, e.g. "models/...".
    model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,

    /// Persona instruction prepended to every model call.
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    /// Present (even when empty) to enable transcription of user speech.
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_transcription: Option<TranscriptionConfig>,

    /// Present (even when empty) to enable transcription of model speech.
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_transcription: Option<TranscriptionConfig>,
}

impl SessionConfig {
    pub fn new() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    response_modalities: Vec<Modality>,

    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Audio,
    Text,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    voice_name: Voice,
}

/// Empty on the wire today; kept as a struct so service-side options can
/// be added without changing the envelope.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TranscriptionConfig {}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TextPart {
    text: String,
}

impl Content {
    pub fn from_text(text: &str) -> Self {
        Self {
            parts: vec![TextPart {
                text: text.to_string(),
            }],
        }
    }
}

pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig {
                model: String::new(),
                generation_config: None,
                system_instruction: None,
                input_audio_transcription: None,
                output_audio_transcription: None,
            },
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    /// Audio-only responses with the given synthesis voice.
    pub fn with_audio_response(mut self, voice: Voice) -> Self {
        self.config.generation_config = Some(GenerationConfig {
            response_modalities: vec![Modality::Audio],
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig { voice_name: voice },
                },
            }),
        });
        self
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.config.system_instruction = Some(Content::from_text(instruction));
        self
    }

    pub fn with_input_transcription_enable(mut self) -> Self {
        self.config.input_audio_transcription = Some(TranscriptionConfig::default());
        self
    }

    pub fn with_output_transcription_enable(mut self) -> Self {
        self.config.output_audio_transcription = Some(TranscriptionConfig::default());
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
