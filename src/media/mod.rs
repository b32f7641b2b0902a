//! Video capture and frame encoding
//!
//! Capture devices are contracts the platform shell implements; this module
//! owns the duty-facing adapters (lazy open, single-shot grabs) and the
//! downscale + JPEG pipeline applied before a frame is uploaded.

pub mod capture;
pub mod frame;

use thiserror::Error;

pub use capture::{Camera, CameraHandle, CameraSource, ScreenGrabber, ScreenSource, VideoSource};
pub use frame::{encode_frame, Frame, RawFrame};

/// Errors raised by capture and audio devices.
///
/// These are recoverable at the duty level (release, back off, retry) and
/// never escalate out of the session.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no capture device available")]
    NoDevice,

    #[error("device error: {0}")]
    Device(String),

    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("frame buffer does not match its dimensions")]
    InvalidFrame,

    #[error("audio stream closed")]
    StreamClosed,
}
