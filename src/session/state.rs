use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Top-level coordinator lifecycle.
///
/// `listening` and the hardware-active flags are orthogonal sub-states that
/// may change at any time while `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Connecting,
    Active,
    Stopping,
    Failed,
}

impl SessionPhase {
    fn as_u8(self) -> u8 {
        match self {
            SessionPhase::Idle => 0,
            SessionPhase::Connecting => 1,
            SessionPhase::Active => 2,
            SessionPhase::Stopping => 3,
            SessionPhase::Failed => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionPhase::Connecting,
            2 => SessionPhase::Active,
            3 => SessionPhase::Stopping,
            4 => SessionPhase::Failed,
            _ => SessionPhase::Idle,
        }
    }
}

/// State shared between the coordinator surface and its duties.
///
/// The coordinator mutates; duties read. Hardware handles themselves are
/// owned exclusively by their capture duty — these flags only gate whether
/// the duty opens or releases them.
pub struct SessionState {
    phase: AtomicU8,
    listening: AtomicBool,
    camera_active: AtomicBool,
    mic_active: AtomicBool,
    frames_sent: AtomicUsize,
    audio_chunks_sent: AtomicUsize,
    turns_completed: AtomicUsize,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(SessionPhase::Idle.as_u8()),
            listening: AtomicBool::new(false),
            camera_active: AtomicBool::new(false),
            mic_active: AtomicBool::new(false),
            frames_sent: AtomicUsize::new(0),
            audio_chunks_sent: AtomicUsize::new(0),
            turns_completed: AtomicUsize::new(0),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: SessionPhase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    /// Move Idle → Connecting atomically; false if a session is already
    /// underway.
    pub fn try_begin_connecting(&self) -> bool {
        self.phase
            .compare_exchange(
                SessionPhase::Idle.as_u8(),
                SessionPhase::Connecting.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    pub fn listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active.load(Ordering::SeqCst)
    }

    pub fn mic_active(&self) -> bool {
        self.mic_active.load(Ordering::SeqCst)
    }

    pub fn activate_hardware(&self) {
        self.camera_active.store(true, Ordering::SeqCst);
        self.mic_active.store(true, Ordering::SeqCst);
    }

    pub fn deactivate_hardware(&self) {
        self.camera_active.store(false, Ordering::SeqCst);
        self.mic_active.store(false, Ordering::SeqCst);
    }

    pub fn count_frame(&self) {
        self.frames_sent.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count_audio_chunk(&self) {
        self.audio_chunks_sent.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count_turn(&self) {
        self.turns_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn frames_sent(&self) -> usize {
        self.frames_sent.load(Ordering::SeqCst)
    }

    pub fn audio_chunks_sent(&self) -> usize {
        self.audio_chunks_sent.load(Ordering::SeqCst)
    }

    pub fn turns_completed(&self) -> usize {
        self.turns_completed.load(Ordering::SeqCst)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
