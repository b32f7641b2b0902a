use async_trait::async_trait;
use thiserror::Error;

use super::messages::{OutboundMessage, ServerEvent, ToolDeclaration};
use crate::config::LiveSettings;

/// Errors raised by the live transport.
///
/// Auth rejections are kept distinct so the coordinator can prompt for a new
/// credential instead of reporting a generic session failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("credential rejected by the live endpoint")]
    AuthRejected,

    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    #[error("live session error: {0}")]
    Protocol(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Opens live sessions.
///
/// Connecting performs the full setup handshake; the returned halves are
/// ready for traffic. Sender and receiver are split so the send and receive
/// duties can run concurrently without sharing a lock.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    async fn connect(
        &self,
        settings: &LiveSettings,
        tools: &[ToolDeclaration],
        api_key: &str,
    ) -> Result<(Box<dyn LiveSender>, Box<dyn LiveReceiver>), TransportError>;
}

/// Write half of a live session. The send duty is the sole user.
#[async_trait]
pub trait LiveSender: Send {
    async fn send(&mut self, msg: OutboundMessage) -> Result<(), TransportError>;

    /// Best-effort close; errors during teardown are swallowed.
    async fn close(&mut self);
}

/// Read half of a live session.
#[async_trait]
pub trait LiveReceiver: Send {
    /// Next event from the session, or None once the remote side has
    /// closed gracefully.
    async fn next_event(&mut self) -> Result<Option<ServerEvent>, TransportError>;
}
