//! Live session transport
//!
//! This module talks to the Gemini Live bidirectional WebSocket API:
//! - `messages`: wire shapes for setup, media chunks, user text, and
//!   server events
//! - `transport`: the connector/sender/receiver seams the coordinator uses
//! - `gemini`: the production client over tokio-tungstenite

pub mod gemini;
pub mod messages;
pub mod transport;

pub use gemini::GeminiLiveConnector;
pub use messages::{OutboundMessage, ServerEvent, ToolDeclaration};
pub use transport::{LiveConnector, LiveReceiver, LiveSender, TransportError};
