use tokio::sync::mpsc;

use crate::media::RawFrame;

/// Events published by the coordinator to the UI layer.
///
/// This channel is the coordinator's entire observable surface; the UI
/// subscribes and renders, nothing is polled.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The remote side started a new response turn
    TurnStarted,
    /// Streamed text fragment of the in-progress turn
    TextFragment(String),
    /// The turn ended; carries the concatenation of all its fragments
    TurnCompleted(String),
    /// A frame was captured, displayable as-is (pre-compression)
    FrameCaptured(RawFrame),
    /// No or invalid credential; prompt the user and start a new session
    AuthRequired,
    /// Error description; may repeat, never crashes the subscriber
    Error(String),
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
