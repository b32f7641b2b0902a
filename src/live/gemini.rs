// Gemini Live client over the bidirectional WebSocket API.
//
// The connection is established with the API key in the query string, then
// a setup message is exchanged before any media flows. The socket is split
// into independent sender/receiver halves for the session duties.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::messages::{self, OutboundMessage, ServerEvent, ToolDeclaration};
use super::transport::{LiveConnector, LiveReceiver, LiveSender, TransportError};
use crate::config::LiveSettings;

const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for the production Gemini Live endpoint.
pub struct GeminiLiveConnector;

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(
        &self,
        settings: &LiveSettings,
        tools: &[ToolDeclaration],
        api_key: &str,
    ) -> Result<(Box<dyn LiveSender>, Box<dyn LiveReceiver>), TransportError> {
        let url = format!("{}?key={}", LIVE_ENDPOINT, api_key);

        info!("Connecting to live session ({})", settings.model);

        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(classify_connect_error)?;
        let (mut sink, mut stream) = ws.split();

        let setup = messages::setup_message(settings, tools);
        sink.send(Message::text(setup.to_string())).await?;

        wait_for_setup_complete(&mut stream).await?;

        info!("Live session established");

        Ok((
            Box::new(GeminiSender { sink }),
            Box::new(GeminiReceiver {
                stream,
                pending: VecDeque::new(),
            }),
        ))
    }
}

/// Drain handshake traffic until the server acknowledges the setup message.
async fn wait_for_setup_complete(
    stream: &mut SplitStream<WsStream>,
) -> Result<(), TransportError> {
    loop {
        match stream.next().await {
            Some(Ok(msg)) => {
                if msg.is_close() {
                    return Err(TransportError::ConnectionClosed);
                }
                if let Some(text) = message_text(&msg) {
                    if let Some(error) = messages::parse_error(&text) {
                        return Err(TransportError::Protocol(error));
                    }
                    if messages::is_setup_complete(&text) {
                        return Ok(());
                    }
                    debug!("Ignoring pre-setup message ({} bytes)", text.len());
                }
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Err(TransportError::ConnectionClosed),
        }
    }
}

/// The server speaks JSON over both text and binary frames.
fn message_text(msg: &Message) -> Option<String> {
    match msg {
        Message::Text(text) => Some(text.as_str().to_string()),
        Message::Binary(data) => String::from_utf8(data.to_vec()).ok(),
        _ => None,
    }
}

fn classify_connect_error(err: tungstenite::Error) -> TransportError {
    if let tungstenite::Error::Http(response) = &err {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            warn!("Live endpoint rejected credential (HTTP {})", status);
            return TransportError::AuthRejected;
        }
    }
    TransportError::WebSocket(err)
}

struct GeminiSender {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl LiveSender for GeminiSender {
    async fn send(&mut self, msg: OutboundMessage) -> Result<(), TransportError> {
        let payload = messages::encode_outbound(&msg);
        self.sink.send(Message::text(payload.to_string())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
    }
}

struct GeminiReceiver {
    stream: SplitStream<WsStream>,
    /// Events already parsed from a message but not yet handed out
    pending: VecDeque<ServerEvent>,
}

#[async_trait]
impl LiveReceiver for GeminiReceiver {
    async fn next_event(&mut self) -> Result<Option<ServerEvent>, TransportError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            match self.stream.next().await {
                Some(Ok(msg)) => {
                    if msg.is_close() {
                        return Ok(None);
                    }
                    if let Some(text) = message_text(&msg) {
                        if let Some(error) = messages::parse_error(&text) {
                            return Err(TransportError::Protocol(error));
                        }
                        self.pending.extend(messages::parse_server_events(&text));
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }
}
