use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use gemini_live_types::audio::Base64EncodedAudioBytes;
use gemini_live_types::session::SessionConfig;

use crate::types;

mod consts;
mod config;
mod utils;

pub use config::Config;
pub use consts::{DEFAULT_MODEL, GEMINI_API_KEY};

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type SessionTx = tokio::sync::broadcast::Sender<types::SessionEvent>;
pub type SessionRx = tokio::sync::broadcast::Receiver<types::SessionEvent>;

pub struct Connection {
    pub(crate) send_handle: tokio::task::JoinHandle<()>,
    pub(crate) recv_handle: tokio::task::JoinHandle<()>,
}

/// A live bidirectional session with the conversational service.
///
/// Outbound frames are queued on an mpsc channel and written by a send
/// task; inbound frames are decoded by a recv task and broadcast as
/// [`types::SessionEvent`]s in arrival order.
pub struct Client {
    capacity: usize,
    config: Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<SessionTx>,
    // Subscription opened before the first frame is sent, so an early
    // setup ack cannot be missed.
    s_rx: Option<SessionRx>,
}

impl Client {
    fn new(capacity: usize, config: Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            s_rx: None,
        }
    }

    async fn connect(&mut self) -> anyhow::Result<Connection> {
        if self.c_tx.is_some() {
            anyhow::bail!("already connected");
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());
        self.s_rx = Some(s_tx.subscribe());

        let send_handle = tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send frame: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize frame: {}", e);
                    }
                }
            }
            // All senders dropped: the session is being torn down.
            if let Err(e) = write.send(Message::Close(None)).await {
                tracing::debug!("failed to send close frame: {}", e);
            }
        });

        let recv_handle = tokio::spawn(async move {
            let mut close_notified = false;
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read frame: {}", e);
                        let _ = s_tx.send(types::SessionEvent::Error(e.to_string()));
                        close_notified = true;
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => match serde_json::from_str::<types::ServerMessage>(&text)
                    {
                        Ok(msg) => {
                            if msg.setup_complete.is_some() {
                                tracing::debug!("session setup acknowledged");
                                let _ = s_tx.send(types::SessionEvent::Opened);
                            }
                            if msg.server_content.is_some() {
                                if let Err(e) = s_tx.send(types::SessionEvent::Message(msg)) {
                                    tracing::error!("failed to broadcast event: {}", e);
                                }
                            }
                        }
                        Err(e) => {
                            tracing::error!("failed to deserialize frame: {}, text=> {:?}", e, text);
                        }
                    },
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary frame: {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let _ = s_tx.send(types::SessionEvent::Closed {
                            reason: reason.map(|r| r.reason.to_string()),
                        });
                        close_notified = true;
                        break;
                    }
                    _ => {}
                }
            }
            if !close_notified {
                let _ = s_tx.send(types::SessionEvent::Closed { reason: None });
            }
        });

        Ok(Connection {
            send_handle,
            recv_handle,
        })
    }

    /// Event stream for this session. The first call returns the
    /// subscription opened at connect time; later calls subscribe fresh.
    pub fn session_events(&mut self) -> anyhow::Result<SessionRx> {
        if let Some(rx) = self.s_rx.take() {
            return Ok(rx);
        }
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => anyhow::bail!("not connected yet"),
        }
    }

    /// Sender half used for streaming capture frames; best-effort
    /// `try_send` on this channel preserves capture order.
    pub fn sender(&self) -> Option<ClientTx> {
        self.c_tx.clone()
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> anyhow::Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => anyhow::bail!("not connected yet"),
        }
    }

    /// Sends the session configuration; must be the first frame.
    pub async fn send_setup(&mut self, config: SessionConfig) -> anyhow::Result<()> {
        self.send_client_event(types::ClientEvent::Setup(config)).await
    }

    pub async fn send_realtime_audio(
        &mut self,
        audio: Base64EncodedAudioBytes,
    ) -> anyhow::Result<()> {
        let event = types::ClientEvent::RealtimeInput(types::RealtimeInput::single(
            types::MediaChunk::input_audio(audio),
        ));
        self.send_client_event(event).await
    }

    /// Stops accepting outbound frames and lets the send task close the
    /// socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.c_tx = None;
    }
}

pub async fn connect_with_config(
    capacity: usize,
    config: Config,
    session: SessionConfig,
) -> anyhow::Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    client.send_setup(session).await?;
    Ok(client)
}

pub async fn connect(session: SessionConfig) -> anyhow::Result<Client> {
    let config = Config::new();
    connect_with_config(1024, config, session).await
}
