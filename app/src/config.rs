//! Application configuration, loaded from environment variables.

use std::env;
use std::str::FromStr;

use gemini_live::types::audio::Voice;
use tracing::Level;

// --- Application Constants ---

/// Samples per block delivered by the microphone input stream.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// Samples per block requested by the audio output stream.
pub const OUTPUT_CHUNK_SIZE: usize = 1024;
/// Capacity of the playout ring buffer, in milliseconds of audio.
pub const OUTPUT_LATENCY_MS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

/// Holds all configuration loaded from the environment.
///
/// *   `GEMINI_API_KEY`: API credential. Required.
/// *   `INTERVIEW_MODEL`: (Optional) live model resource name.
/// *   `INTERVIEW_VOICE`: (Optional) synthesis voice. Defaults to Zephyr.
/// *   `RUST_LOG`: (Optional) logging level. Defaults to "INFO".
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub voice: Voice,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env for local development; ignored when absent.
        dotenvy::dotenv().ok();

        let api_key = env::var(gemini_live::GEMINI_API_KEY)
            .map_err(|_| ConfigError::MissingVar(gemini_live::GEMINI_API_KEY.to_string()))?;

        let model =
            env::var("INTERVIEW_MODEL").unwrap_or_else(|_| gemini_live::DEFAULT_MODEL.to_string());

        let voice = env::var("INTERVIEW_VOICE")
            .ok()
            .and_then(|v| Voice::from_str(&v).ok())
            .unwrap_or(Voice::Zephyr);

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            api_key,
            model,
            voice,
            log_level,
        })
    }
}
