mod client;
mod playback;
mod session;
mod transcript;

pub use gemini_live_types as types;
pub use gemini_live_utils as utils;

pub use client::{
    connect, connect_with_config, Client, ClientTx, Config, SessionRx, DEFAULT_MODEL,
    GEMINI_API_KEY,
};
pub use playback::{PlaybackScheduler, Scheduled};
pub use session::{InterviewSession, PlayoutCommand, END_OF_INTERVIEW_NOTICE};
pub use transcript::Transcript;
