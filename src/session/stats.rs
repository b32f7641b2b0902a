use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// Whether the session is currently active
    pub is_active: bool,

    /// When the coordinator was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of video frames forwarded to the transport
    pub frames_sent: usize,

    /// Number of microphone chunks forwarded to the transport
    pub audio_chunks_sent: usize,

    /// Number of response turns completed
    pub turns_completed: usize,
}
