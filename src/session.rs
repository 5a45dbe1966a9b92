use tokio::sync::mpsc;

use gemini_live_types::audio::OUTPUT_SAMPLE_RATE;
use gemini_live_types::{
    ClientEvent, InterviewStatus, MediaChunk, RealtimeInput, ServerMessage, SessionEvent, Speaker,
};
use gemini_live_utils::audio as codec;

use crate::playback::PlaybackScheduler;
use crate::transcript::Transcript;

/// Synthetic final turn appended by teardown.
pub const END_OF_INTERVIEW_NOTICE: &str = "Interview ended.";

/// Commands the orchestrator issues to the playout half of the audio
/// graph. Delivery is best-effort; a full channel drops the command the
/// same way a slow consumer drops late frames.
#[derive(Debug, Clone)]
pub enum PlayoutCommand {
    /// Schedule decoded mono samples to begin at `start` seconds on the
    /// output clock.
    Play { samples: Vec<f32>, start: f64 },
    /// Discard everything scheduled or currently playing.
    Flush,
}

/// Owner of one live interview: connection state machine, transcript
/// reconciliation, outbound capture streaming, and playback scheduling.
///
/// The orchestrator is wired to the transport and the audio graph through
/// channels, so the whole state machine runs against recorded event
/// sequences in tests. Teardown order: session channel, playback entries,
/// playout graph; every release is individually guarded so a missing
/// resource never skips the rest.
pub struct InterviewSession {
    status: InterviewStatus,
    last_error: Option<String>,
    transcript: Transcript,
    scheduler: PlaybackScheduler,
    output_sample_rate: u32,
    outbound: Option<mpsc::Sender<ClientEvent>>,
    playout: Option<mpsc::Sender<PlayoutCommand>>,
}

impl InterviewSession {
    pub fn new() -> Self {
        Self {
            status: InterviewStatus::Idle,
            last_error: None,
            transcript: Transcript::new(),
            scheduler: PlaybackScheduler::new(),
            output_sample_rate: OUTPUT_SAMPLE_RATE,
            outbound: None,
            playout: None,
        }
    }

    pub fn status(&self) -> InterviewStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    /// Starts a new session: valid from `Idle`, `Ended`, and `Error`.
    /// Clears the previous transcript and error, takes ownership of the
    /// playout channel, and moves to `Connecting`. The transport is wired
    /// separately once the connection resolves ([`Self::wire_transport`]).
    pub fn begin(&mut self, playout: mpsc::Sender<PlayoutCommand>) -> anyhow::Result<()> {
        if !self.status.can_start() {
            anyhow::bail!("cannot start while {}", self.status);
        }
        self.transcript.clear();
        self.last_error = None;
        self.scheduler.stop_all();
        self.playout = Some(playout);
        self.status = InterviewStatus::Connecting;
        Ok(())
    }

    /// Attaches the outbound half of a freshly opened connection. The
    /// open acknowledgement may already have moved the session to
    /// `Listening`, so any live state accepts the transport; a connect
    /// resolving after `stop()` finds the session torn down and is
    /// discarded, closing the connection again.
    pub fn wire_transport(&mut self, outbound: mpsc::Sender<ClientEvent>) {
        if self.status.is_live() {
            self.outbound = Some(outbound);
        }
    }

    /// Records a setup failure (microphone, audio graph, or transport
    /// open) and releases whatever was already held.
    pub fn fail_setup(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("failed to start interview: {}", message);
        self.last_error = Some(message);
        self.release_resources();
        self.status = InterviewStatus::Error;
    }

    /// User-initiated teardown into `Ended`. Idempotent: calling it in a
    /// terminal state does nothing and never errors.
    pub fn stop(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.release_resources();
        self.transcript
            .push_final(Speaker::Model, END_OF_INTERVIEW_NOTICE);
        self.status = InterviewStatus::Ended;
    }

    /// One session event from the transport. `now` is the current output
    /// clock reading in seconds.
    pub fn handle_event(&mut self, event: SessionEvent, now: f64) {
        match event {
            SessionEvent::Opened => {
                // A stop() racing the open wins; stay torn down.
                if self.status == InterviewStatus::Connecting {
                    tracing::info!("session open, streaming microphone audio");
                    self.status = InterviewStatus::Listening;
                }
            }
            SessionEvent::Message(msg) => self.handle_message(msg, now),
            SessionEvent::Error(reason) => {
                if self.status.is_terminal() {
                    return;
                }
                tracing::error!("session error: {}", reason);
                self.last_error = Some(format!("connection error: {}", reason));
                self.release_resources();
                self.transcript
                    .push_final(Speaker::Model, END_OF_INTERVIEW_NOTICE);
                self.status = InterviewStatus::Error;
            }
            SessionEvent::Closed { reason } => {
                // Also reached when stop() itself initiated the close;
                // stop() guards against the double teardown.
                tracing::info!("session closed: {:?}", reason);
                self.stop();
            }
        }
    }

    fn handle_message(&mut self, msg: ServerMessage, now: f64) {
        let Some(content) = msg.server_content else {
            return;
        };

        if let Some(delta) = content.output_transcription.as_ref() {
            self.transcript.push_delta(Speaker::Model, &delta.text);
        } else if let Some(delta) = content.input_transcription.as_ref() {
            self.transcript.push_delta(Speaker::User, &delta.text);
        }

        if content.is_turn_complete() {
            self.transcript.finalize_all();
        }

        if let Some(audio) = content.inline_audio() {
            let samples = codec::decode(audio);
            if !samples.is_empty() {
                let duration = samples.len() as f64 / self.output_sample_rate as f64;
                let scheduled = self.scheduler.enqueue(duration, now);
                self.send_playout(PlayoutCommand::Play {
                    samples,
                    start: scheduled.start,
                });
            }
        }

        if content.is_interrupted() {
            tracing::debug!("response interrupted by user speech, flushing playback");
            self.scheduler.stop_all();
            self.send_playout(PlayoutCommand::Flush);
        }
    }

    /// One fixed-size block of normalized mono capture samples.
    ///
    /// Streaming is best-effort: blocks arriving before the session is
    /// ready are dropped (no pre-connection queue), and a full outbound
    /// channel drops the frame rather than stalling the capture thread.
    pub fn handle_capture_block(&mut self, samples: &[f32]) {
        if self.status != InterviewStatus::Listening {
            return;
        }
        let Some(tx) = self.outbound.as_ref() else {
            return;
        };
        let event = ClientEvent::RealtimeInput(RealtimeInput::single(MediaChunk::input_audio(
            codec::encode(samples),
        )));
        if let Err(e) = tx.try_send(event) {
            tracing::debug!("dropping capture frame: {}", e);
        }
    }

    /// Deregisters playback entries that ended before `now`.
    pub fn reclaim_finished(&mut self, now: f64) {
        self.scheduler.prune(now);
    }

    fn send_playout(&self, command: PlayoutCommand) {
        if let Some(tx) = self.playout.as_ref() {
            if let Err(e) = tx.try_send(command) {
                tracing::warn!("failed to send playout command: {}", e);
            }
        }
    }

    fn release_resources(&mut self) {
        // Dropping the outbound sender closes the client's send channel,
        // which closes the socket.
        if let Some(outbound) = self.outbound.take() {
            drop(outbound);
        }
        self.scheduler.stop_all();
        if let Some(playout) = self.playout.take() {
            let _ = playout.try_send(PlayoutCommand::Flush);
        }
    }
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InterviewSession {
    fn drop(&mut self) {
        if self.status.is_live() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_live_types::events::{InlineData, ModelTurn, Part, ServerContent, Transcription};

    fn channels() -> (
        mpsc::Sender<ClientEvent>,
        mpsc::Receiver<ClientEvent>,
        mpsc::Sender<PlayoutCommand>,
        mpsc::Receiver<PlayoutCommand>,
    ) {
        let (c_tx, c_rx) = mpsc::channel(64);
        let (p_tx, p_rx) = mpsc::channel(64);
        (c_tx, c_rx, p_tx, p_rx)
    }

    fn started() -> (
        InterviewSession,
        mpsc::Receiver<ClientEvent>,
        mpsc::Receiver<PlayoutCommand>,
    ) {
        let (c_tx, c_rx, p_tx, p_rx) = channels();
        let mut session = InterviewSession::new();
        session.begin(p_tx).unwrap();
        session.wire_transport(c_tx);
        session.handle_event(SessionEvent::Opened, 0.0);
        (session, c_rx, p_rx)
    }

    fn output_delta(text: &str) -> SessionEvent {
        SessionEvent::Message(ServerMessage {
            server_content: Some(ServerContent {
                output_transcription: Some(Transcription {
                    text: text.to_string(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn input_delta(text: &str) -> SessionEvent {
        SessionEvent::Message(ServerMessage {
            server_content: Some(ServerContent {
                input_transcription: Some(Transcription {
                    text: text.to_string(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn turn_complete() -> SessionEvent {
        SessionEvent::Message(ServerMessage {
            server_content: Some(ServerContent {
                turn_complete: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn interrupted() -> SessionEvent {
        SessionEvent::Message(ServerMessage {
            server_content: Some(ServerContent {
                interrupted: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn audio_message(samples: &[f32]) -> SessionEvent {
        SessionEvent::Message(ServerMessage {
            server_content: Some(ServerContent {
                model_turn: Some(ModelTurn {
                    parts: vec![Part {
                        inline_data: Some(InlineData {
                            data: codec::encode(samples),
                            mime_type: "audio/pcm;rate=24000".to_string(),
                        }),
                        ..Default::default()
                    }],
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn start_then_open_reaches_listening() {
        let (c_tx, _c_rx, p_tx, _p_rx) = channels();
        let mut session = InterviewSession::new();
        assert_eq!(session.status(), InterviewStatus::Idle);

        session.begin(p_tx).unwrap();
        assert_eq!(session.status(), InterviewStatus::Connecting);

        session.wire_transport(c_tx);
        session.handle_event(SessionEvent::Opened, 0.0);
        assert_eq!(session.status(), InterviewStatus::Listening);
    }

    #[tokio::test]
    async fn begin_is_rejected_while_live() {
        let (mut session, _c_rx, _p_rx) = started();
        let (_c_tx, _c_rx2, p_tx, _p_rx2) = channels();
        assert!(session.begin(p_tx).is_err());
        assert_eq!(session.status(), InterviewStatus::Listening);
    }

    #[tokio::test]
    async fn same_speaker_deltas_build_one_turn() {
        let (mut session, _c_rx, _p_rx) = started();

        session.handle_event(output_delta("Hello"), 0.0);
        session.handle_event(output_delta(" there"), 0.0);
        session.handle_event(turn_complete(), 0.0);

        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "Hello there");
        assert_eq!(turns[0].speaker, Speaker::Model);
        assert!(turns[0].is_final);
    }

    #[tokio::test]
    async fn turn_complete_closes_both_speakers_open_turns() {
        let (mut session, _c_rx, _p_rx) = started();

        session.handle_event(input_delta("So, tell me"), 0.0);
        session.handle_event(output_delta("Sure"), 0.0);
        session.handle_event(turn_complete(), 0.0);

        assert_eq!(session.transcript().len(), 2);
        assert!(session.transcript().turns().iter().all(|t| t.is_final));
    }

    #[tokio::test]
    async fn audio_payloads_schedule_back_to_back() {
        let (mut session, _c_rx, mut p_rx) = started();

        // Two 240-sample chunks: 10ms each at 24kHz.
        let chunk = vec![0.1f32; 240];
        session.handle_event(audio_message(&chunk), 0.0);
        session.handle_event(audio_message(&chunk), 0.0);

        let first = p_rx.try_recv().unwrap();
        let second = p_rx.try_recv().unwrap();
        match (first, second) {
            (
                PlayoutCommand::Play { start: s1, samples },
                PlayoutCommand::Play { start: s2, .. },
            ) => {
                assert_eq!(samples.len(), 240);
                assert_eq!(s1, 0.0);
                assert!((s2 - 0.01).abs() < 1e-9);
            }
            other => panic!("expected two play commands, got {:?}", other),
        }
        assert!((session.scheduler().cursor() - 0.02).abs() < 1e-9);
        assert_eq!(session.scheduler().active_count(), 2);
    }

    #[tokio::test]
    async fn interruption_flushes_playback_and_resets_cursor() {
        let (mut session, _c_rx, mut p_rx) = started();

        session.handle_event(audio_message(&vec![0.1f32; 2400]), 0.0);
        let _ = p_rx.try_recv().unwrap();

        session.handle_event(interrupted(), 0.05);
        assert_eq!(session.scheduler().cursor(), 0.0);
        assert_eq!(session.scheduler().active_count(), 0);
        assert!(matches!(p_rx.try_recv().unwrap(), PlayoutCommand::Flush));

        // Audio after the interruption starts at the clock, not the old cursor.
        session.handle_event(audio_message(&vec![0.1f32; 240]), 0.3);
        match p_rx.try_recv().unwrap() {
            PlayoutCommand::Play { start, .. } => assert_eq!(start, 0.3),
            other => panic!("expected play command, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn capture_blocks_stream_in_order_while_listening() {
        let (mut session, mut c_rx, _p_rx) = started();

        for amplitude in [0.1f32, 0.2, 0.3] {
            session.handle_capture_block(&vec![amplitude; 160]);
        }

        let mut frames = Vec::new();
        while let Ok(event) = c_rx.try_recv() {
            frames.push(event);
        }
        assert_eq!(frames.len(), 3);

        let expected: Vec<String> = [0.1f32, 0.2, 0.3]
            .iter()
            .map(|&a| codec::encode(&vec![a; 160]))
            .collect();
        for (frame, want) in frames.iter().zip(expected.iter()) {
            match frame {
                ClientEvent::RealtimeInput(input) => {
                    assert_eq!(&input.media_chunks[0].data, want);
                    assert_eq!(input.media_chunks[0].mime_type, "audio/pcm;rate=16000");
                }
                other => panic!("expected realtime input, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn capture_before_session_ready_is_dropped() {
        let (c_tx, mut c_rx, p_tx, _p_rx) = channels();
        let mut session = InterviewSession::new();
        session.begin(p_tx).unwrap();

        // No transport yet: the block has nowhere to go.
        session.handle_capture_block(&vec![0.5f32; 160]);

        // Transport wired but the session has not opened: still dropped.
        session.wire_transport(c_tx);
        session.handle_capture_block(&vec![0.5f32; 160]);
        assert!(c_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn transport_wired_after_open_still_streams() {
        let (c_tx, mut c_rx, p_tx, _p_rx) = channels();
        let mut session = InterviewSession::new();
        session.begin(p_tx).unwrap();

        // The open ack can outrun the connect bookkeeping.
        session.handle_event(SessionEvent::Opened, 0.0);
        assert_eq!(session.status(), InterviewStatus::Listening);

        session.wire_transport(c_tx);
        session.handle_capture_block(&vec![0.1f32; 160]);
        assert!(c_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_appends_the_notice() {
        let (mut session, mut c_rx, _p_rx) = started();

        session.stop();
        session.stop();

        assert_eq!(session.status(), InterviewStatus::Ended);
        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, END_OF_INTERVIEW_NOTICE);
        assert!(turns[0].is_final);

        // The outbound channel is gone, so the transport sees a close.
        assert!(c_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn remote_error_is_terminal_with_message() {
        let (mut session, mut c_rx, mut p_rx) = started();

        session.handle_event(SessionEvent::Error("boom".to_string()), 0.0);

        assert_eq!(session.status(), InterviewStatus::Error);
        assert_eq!(session.last_error(), Some("connection error: boom"));
        assert!(c_rx.recv().await.is_none());
        assert!(matches!(p_rx.try_recv().unwrap(), PlayoutCommand::Flush));

        // The close that follows the error must not tear down twice.
        session.handle_event(SessionEvent::Closed { reason: None }, 0.0);
        assert_eq!(session.status(), InterviewStatus::Error);
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn remote_close_ends_the_session_once() {
        let (mut session, _c_rx, _p_rx) = started();

        session.handle_event(SessionEvent::Closed { reason: None }, 0.0);
        assert_eq!(session.status(), InterviewStatus::Ended);
        let turns_after_first = session.transcript().len();

        session.handle_event(SessionEvent::Closed { reason: None }, 0.0);
        assert_eq!(session.transcript().len(), turns_after_first);
    }

    #[tokio::test]
    async fn open_racing_a_stop_stays_torn_down() {
        let (c_tx, mut c_rx, p_tx, _p_rx) = channels();
        let mut session = InterviewSession::new();
        session.begin(p_tx).unwrap();

        session.stop();
        // The connect resolves after the stop: discarded, stays Ended.
        session.wire_transport(c_tx);
        session.handle_event(SessionEvent::Opened, 0.0);
        assert_eq!(session.status(), InterviewStatus::Ended);
        assert!(c_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn restart_after_end_clears_previous_state() {
        let (mut session, _c_rx, _p_rx) = started();
        session.handle_event(output_delta("old turn"), 0.0);
        session.stop();

        let (_c_tx, _c_rx2, p_tx, _p_rx2) = channels();
        session.begin(p_tx).unwrap();
        assert_eq!(session.status(), InterviewStatus::Connecting);
        assert!(session.transcript().is_empty());
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn setup_failure_reports_error_without_notice() {
        let (_c_tx, _c_rx, p_tx, _p_rx) = channels();
        let mut session = InterviewSession::new();
        session.begin(p_tx).unwrap();

        session.fail_setup("microphone permission denied");
        assert_eq!(session.status(), InterviewStatus::Error);
        assert_eq!(session.last_error(), Some("microphone permission denied"));
        assert!(session.transcript().is_empty());

        // A failed session may be started again.
        let (_c_tx2, _c_rx2, p_tx, _p_rx2) = channels();
        assert!(session.begin(p_tx).is_ok());
    }

    #[tokio::test]
    async fn end_to_end_interview_flow() {
        let (mut session, mut c_rx, _p_rx) = started();
        assert_eq!(session.status(), InterviewStatus::Listening);

        // Three capture blocks become three ordered frames.
        for amplitude in [0.1f32, 0.2, 0.3] {
            session.handle_capture_block(&vec![amplitude; 160]);
        }
        let mut sent = 0;
        while c_rx.try_recv().is_ok() {
            sent += 1;
        }
        assert_eq!(sent, 3);

        // Two deltas and a turn-complete yield exactly one final turn.
        session.handle_event(output_delta("Hello"), 0.0);
        session.handle_event(output_delta(" there"), 0.0);
        session.handle_event(turn_complete(), 0.0);

        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "Hello there");
        assert!(turns[0].is_final);
    }
}
