use std::time::Duration;

use crate::audio::AudioSpec;
use crate::config::{Config, LiveSettings};
use crate::live::ToolDeclaration;

/// Configuration for one coordinator session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-<uuid>")
    pub session_id: String,

    /// Remote model/voice/tooling settings sent in the setup message
    pub live: LiveSettings,

    /// Function declarations advertised to the model
    pub tools: Vec<ToolDeclaration>,

    /// Microphone capture format (upstream direction)
    pub send_audio: AudioSpec,

    /// Playback format for model audio (downstream direction)
    pub receive_audio: AudioSpec,

    /// Longest side of an uploaded frame in pixels
    pub max_frame_px: u32,

    /// Backoff after a capture failure before retrying the device
    pub capture_backoff: Duration,

    /// Idle wait while the microphone is deactivated
    pub mic_idle_wait: Duration,
}

impl SessionConfig {
    /// Derive session settings from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            live: config.live.clone(),
            send_audio: AudioSpec {
                sample_rate: config.audio.send_sample_rate,
                channels: config.audio.channels,
                chunk_frames: config.audio.chunk_frames,
            },
            receive_audio: AudioSpec {
                sample_rate: config.audio.receive_sample_rate,
                channels: config.audio.channels,
                chunk_frames: config.audio.chunk_frames,
            },
            max_frame_px: config.capture.max_frame_px,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            live: LiveSettings::default(),
            tools: Vec::new(),
            send_audio: AudioSpec {
                sample_rate: 16000,
                channels: 1,
                chunk_frames: 1024,
            },
            receive_audio: AudioSpec {
                sample_rate: 24000,
                channels: 1,
                chunk_frames: 1024,
            },
            max_frame_px: 512,
            capture_backoff: Duration::from_secs(1),
            mic_idle_wait: Duration::from_millis(500),
        }
    }
}
