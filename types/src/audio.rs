use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Sample rate of microphone audio sent to the service.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;
/// Sample rate of synthesized audio returned by the service.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;
/// Response audio is always mono.
pub const OUTPUT_CHANNELS: u16 = 1;

/// MIME tag carried on every outbound audio chunk.
pub const INPUT_AUDIO_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;

/// Prebuilt synthesis voices offered by the live service.
#[derive(Debug, Clone, PartialEq)]
pub enum Voice {
    Zephyr,
    Puck,
    Charon,
    Kore,
    Fenrir,
    Aoede,
    Custom(String),
}

impl Voice {
    pub fn as_str(&self) -> &str {
        match self {
            Voice::Zephyr => "Zephyr",
            Voice::Puck => "Puck",
            Voice::Charon => "Charon",
            Voice::Kore => "Kore",
            Voice::Fenrir => "Fenrir",
            Voice::Aoede => "Aoede",
            Voice::Custom(s) => s,
        }
    }
}

impl Serialize for Voice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Zephyr" => Voice::Zephyr,
            "Puck" => Voice::Puck,
            "Charon" => Voice::Charon,
            "Kore" => Voice::Kore,
            "Fenrir" => Voice::Fenrir,
            "Aoede" => Voice::Aoede,
            _ => Voice::Custom(s.to_string()),
        })
    }
}

impl<'de> Deserialize<'de> for Voice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Voice::from_str(&s).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_serializes_as_plain_name() {
        let json = serde_json::to_string(&Voice::Zephyr).unwrap();
        assert_eq!(json, "\"Zephyr\"");

        let json = serde_json::to_string(&Voice::Custom("Vega".to_string())).unwrap();
        assert_eq!(json, "\"Vega\"");
    }

    #[test]
    fn voice_round_trips() {
        let v: Voice = serde_json::from_str("\"Puck\"").unwrap();
        assert_eq!(v, Voice::Puck);

        let v: Voice = serde_json::from_str("\"Vega\"").unwrap();
        assert_eq!(v, Voice::Custom("Vega".to_string()));
    }
}
