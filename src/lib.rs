pub mod audio;
pub mod config;
pub mod error;
pub mod live;
pub mod media;
pub mod session;

pub use audio::{
    AudioSpec, CpalMicrophone, MicStream, Microphone, RodioSpeaker, Speaker, SpeakerStream,
};
pub use config::Config;
pub use error::SessionError;
pub use live::{
    GeminiLiveConnector, LiveConnector, LiveReceiver, LiveSender, OutboundMessage, ServerEvent,
    ToolDeclaration, TransportError,
};
pub use media::{
    encode_frame, Camera, CameraHandle, CameraSource, Frame, MediaError, RawFrame, ScreenGrabber,
    ScreenSource, VideoSource,
};
pub use session::{
    event_channel, EventReceiver, EventSender, MediaDevices, SessionConfig, SessionCoordinator,
    SessionEvent, SessionPhase, SessionStats,
};
