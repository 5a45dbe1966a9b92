use std::fmt;

/// Lifecycle of one interview session. `Ended` and `Error` are terminal
/// until a new start is explicitly requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStatus {
    Idle,
    Connecting,
    Listening,
    Error,
    Ended,
}

impl InterviewStatus {
    /// States from which a new session may be started.
    pub fn can_start(self) -> bool {
        matches!(
            self,
            InterviewStatus::Idle | InterviewStatus::Ended | InterviewStatus::Error
        )
    }

    /// States holding live audio/network resources.
    pub fn is_live(self) -> bool {
        matches!(self, InterviewStatus::Connecting | InterviewStatus::Listening)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InterviewStatus::Ended | InterviewStatus::Error)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterviewStatus::Idle => "idle",
            InterviewStatus::Connecting => "connecting",
            InterviewStatus::Listening => "listening",
            InterviewStatus::Error => "error",
            InterviewStatus::Ended => "ended",
        };
        f.write_str(s)
    }
}
