use thiserror::Error;

use crate::live::TransportError;

/// Errors that prevent a session from starting or end a running one.
///
/// Device-level failures are not represented here: they are retried inside
/// the owning duty (see `media::MediaError`) and never escalate.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No credential configured, or the endpoint rejected it. The caller
    /// should prompt for a new key and start a fresh session.
    #[error("no valid API credential configured")]
    AuthRequired,

    /// The remote session failed or closed unexpectedly.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The stop path. Never surfaced to the UI as an error.
    #[error("session cancelled")]
    Cancelled,
}
