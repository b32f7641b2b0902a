//! Live session coordination
//!
//! This module provides the `SessionCoordinator` abstraction that manages:
//! - Transport lifecycle for one live conversation
//! - Five concurrent duties: video capture, microphone capture, outbound
//!   send, inbound turn demux, audio playback
//! - Hardware-activation and listening toggles
//! - The event channel the UI layer observes
//! - Session statistics and state

mod config;
mod coordinator;
mod events;
mod queue;
mod state;
mod stats;
mod turn;

pub use config::SessionConfig;
pub use coordinator::{MediaDevices, SessionCoordinator};
pub use events::{event_channel, EventReceiver, EventSender, SessionEvent};
pub use queue::{PlaybackQueue, OUTBOUND_QUEUE_CAPACITY};
pub use state::{SessionPhase, SessionState};
pub use stats::SessionStats;
pub use turn::Turn;
