use anyhow::Result;
use serde::Deserialize;

/// Environment variable consulted for the API credential before the
/// config file value.
pub const CREDENTIAL_ENV_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub live: LiveSettings,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
}

/// Remote session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    /// Model identifier sent in the setup message
    pub model: String,

    /// Prebuilt voice name for spoken responses
    pub voice: String,

    /// API key; the GEMINI_API_KEY environment variable takes precedence
    pub api_key: Option<String>,

    /// Optional system instruction prepended to the session
    pub system_instruction: Option<String>,

    /// Whether to attach the Google Search grounding tool
    pub google_search: bool,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            model: "models/gemini-2.0-flash-exp".to_string(),
            voice: "Puck".to_string(),
            api_key: None,
            system_instruction: None,
            google_search: true,
        }
    }
}

/// Audio pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Capture sample rate for microphone audio sent upstream
    pub send_sample_rate: u32,

    /// Sample rate of PCM audio received from the model
    pub receive_sample_rate: u32,

    /// Channel count for both directions (1 = mono)
    pub channels: u16,

    /// Sample frames per microphone chunk
    pub chunk_frames: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            send_sample_rate: 16000,
            receive_sample_rate: 24000,
            channels: 1,
            chunk_frames: 1024,
        }
    }
}

/// Video capture settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Delay between camera frames in milliseconds
    pub camera_interval_ms: u64,

    /// Delay between screen grabs in milliseconds
    pub screen_interval_ms: u64,

    /// Longest side of an uploaded frame in pixels
    pub max_frame_px: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            camera_interval_ms: 200,
            screen_interval_ms: 1000,
            max_frame_px: 512,
        }
    }
}

impl Config {
    /// Load configuration from an optional file, overlaid with
    /// GLANCE__-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GLANCE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Resolve the API credential: environment first, then config file.
    ///
    /// Returns None when no credential is configured anywhere, which the
    /// coordinator treats as an auth-required condition before connecting.
    pub fn credential(&self) -> Option<String> {
        std::env::var(CREDENTIAL_ENV_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.live.api_key.clone())
    }
}
