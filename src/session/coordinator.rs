use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::events::{event_channel, EventReceiver, EventSender, SessionEvent};
use super::queue::{PlaybackQueue, OUTBOUND_QUEUE_CAPACITY};
use super::state::{SessionPhase, SessionState};
use super::stats::SessionStats;
use super::turn::Turn;
use crate::audio::{AudioSpec, MicStream, Microphone, Speaker};
use crate::error::SessionError;
use crate::live::{
    LiveConnector, LiveReceiver, LiveSender, OutboundMessage, ServerEvent, TransportError,
};
use crate::media::{encode_frame, MediaError, VideoSource};

/// Mime tag for outbound microphone chunks
const AUDIO_PCM_MIME: &str = "audio/pcm";

/// Capture and playback devices injected by the platform shell.
///
/// Whether the session streams camera or screen frames is decided by which
/// video source the shell supplies.
pub struct MediaDevices {
    pub video: Box<dyn VideoSource>,
    pub microphone: Box<dyn Microphone>,
    pub speaker: Box<dyn Speaker>,
}

/// Coordinates one live conversation session.
///
/// Owns its devices and transport (no process-wide singletons), runs five
/// concurrent duties while active, and publishes everything observable on
/// the event channel returned by [`SessionCoordinator::new`].
pub struct SessionCoordinator {
    config: SessionConfig,
    state: Arc<SessionState>,
    events: EventSender,
    cancel: CancellationToken,
    connector: Arc<dyn LiveConnector>,
    devices: Arc<Mutex<Option<MediaDevices>>>,
    playback: Arc<PlaybackQueue>,
    /// Sender for direct user text; present while a session is running
    user_tx: Arc<Mutex<Option<mpsc::Sender<OutboundMessage>>>>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    started_at: DateTime<Utc>,
}

impl SessionCoordinator {
    /// Create a coordinator for one session. Returns the event receiver the
    /// UI layer subscribes to.
    pub fn new(
        config: SessionConfig,
        devices: MediaDevices,
        connector: Arc<dyn LiveConnector>,
    ) -> (Self, EventReceiver) {
        let (events, events_rx) = event_channel();

        let coordinator = Self {
            config,
            state: Arc::new(SessionState::new()),
            events,
            cancel: CancellationToken::new(),
            connector,
            devices: Arc::new(Mutex::new(Some(devices))),
            playback: Arc::new(PlaybackQueue::new()),
            user_tx: Arc::new(Mutex::new(None)),
            supervisor: Mutex::new(None),
            started_at: Utc::now(),
        };

        (coordinator, events_rx)
    }

    /// Start the session with the given credential.
    ///
    /// Fails fast with [`SessionError::AuthRequired`] (and the matching
    /// event) when no credential is configured, without attempting to
    /// connect; the caller can prompt for a key and call `start` again.
    pub async fn start(&self, credential: Option<&str>) -> Result<(), SessionError> {
        let Some(api_key) = credential
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
        else {
            warn!("No API credential configured; session not started");
            let _ = self.events.send(SessionEvent::AuthRequired);
            return Err(SessionError::AuthRequired);
        };

        if !self.state.try_begin_connecting() {
            warn!("Session already started (phase: {:?})", self.state.phase());
            return Ok(());
        }

        info!("Starting session: {}", self.config.session_id);

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        *self.user_tx.lock().await = Some(outbound_tx.clone());

        let runtime = SessionRuntime {
            config: self.config.clone(),
            api_key,
            connector: Arc::clone(&self.connector),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            devices: Arc::clone(&self.devices),
            playback: Arc::clone(&self.playback),
            user_tx: Arc::clone(&self.user_tx),
            outbound_tx,
            outbound_rx,
        };

        let handle = tokio::spawn(runtime.run());
        *self.supervisor.lock().await = Some(handle);

        Ok(())
    }

    /// Stop the session: cancel every duty, release hardware, close the
    /// transport, and wait until the coordinator is back to Idle.
    pub async fn stop(&self) {
        info!("Stopping session: {}", self.config.session_id);

        match self.state.phase() {
            SessionPhase::Connecting | SessionPhase::Active => {
                self.state.set_phase(SessionPhase::Stopping);
            }
            _ => {}
        }

        self.deactivate_hardware();
        self.cancel.cancel();

        if let Some(handle) = self.supervisor.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Session supervisor panicked: {}", e);
            }
        }

        *self.user_tx.lock().await = None;
        self.state.set_phase(SessionPhase::Idle);

        info!("Session stopped: {}", self.config.session_id);
    }

    /// Open capture hardware on the next duty pass. Idempotent; does not
    /// start transmission by itself.
    pub fn activate_hardware(&self) {
        self.state.activate_hardware();
    }

    /// Release capture hardware on the next duty pass. Idempotent.
    pub fn deactivate_hardware(&self) {
        self.state.deactivate_hardware();
    }

    /// Gate whether captured frames/audio are transmitted. Idempotent.
    /// When turning listening on, the caller is expected to clear any
    /// transcript it holds.
    pub fn set_listening(&self, listening: bool) {
        self.state.set_listening(listening);
    }

    pub fn listening(&self) -> bool {
        self.state.listening()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Send user-typed text as an end-of-turn message. Goes through the
    /// outbound queue (preserving enqueue order with media) but is not
    /// gated by `listening`.
    pub async fn send_user_text(&self, text: impl Into<String>) {
        let text = text.into();
        let sender = { self.user_tx.lock().await.clone() };

        match sender {
            Some(sender) => {
                if sender
                    .send(OutboundMessage::UserText { text })
                    .await
                    .is_err()
                {
                    warn!("Session ended; user text dropped");
                }
            }
            None => warn!("No active session; user text dropped"),
        }
    }

    /// Number of inbound audio chunks awaiting playback.
    pub fn playback_backlog(&self) -> usize {
        self.playback.len()
    }

    /// Current session statistics.
    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            session_id: self.config.session_id.clone(),
            is_active: self.state.phase() == SessionPhase::Active,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            frames_sent: self.state.frames_sent(),
            audio_chunks_sent: self.state.audio_chunks_sent(),
            turns_completed: self.state.turns_completed(),
        }
    }
}

/// Everything one running session owns, moved onto the supervisor task.
struct SessionRuntime {
    config: SessionConfig,
    api_key: String,
    connector: Arc<dyn LiveConnector>,
    state: Arc<SessionState>,
    events: EventSender,
    cancel: CancellationToken,
    devices: Arc<Mutex<Option<MediaDevices>>>,
    playback: Arc<PlaybackQueue>,
    user_tx: Arc<Mutex<Option<mpsc::Sender<OutboundMessage>>>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: mpsc::Receiver<OutboundMessage>,
}

impl SessionRuntime {
    async fn run(self) {
        let SessionRuntime {
            config,
            api_key,
            connector,
            state,
            events,
            cancel,
            devices,
            playback,
            user_tx,
            outbound_tx,
            outbound_rx,
        } = self;

        let connected = tokio::select! {
            _ = cancel.cancelled() => {
                state.set_phase(SessionPhase::Idle);
                return;
            }
            connected = connector.connect(&config.live, &config.tools, &api_key) => connected,
        };

        let (sender, receiver) = match connected {
            Ok(pair) => pair,
            Err(TransportError::AuthRejected) => {
                warn!("Live endpoint rejected the configured credential");
                let _ = events.send(SessionEvent::AuthRequired);
                finish_session(&state, &user_tx, true).await;
                return;
            }
            Err(e) => {
                error!("Failed to connect live session: {}", e);
                let _ = events.send(SessionEvent::Error(format!("Connection failed: {}", e)));
                finish_session(&state, &user_tx, true).await;
                return;
            }
        };

        // Devices are taken only once connected, so a failed connect leaves
        // the coordinator restartable.
        let Some(media) = devices.lock().await.take() else {
            warn!("Session devices already consumed; construct a new coordinator");
            finish_session(&state, &user_tx, true).await;
            return;
        };

        state.set_phase(SessionPhase::Active);
        info!("Session active: {}", config.session_id);

        let mut duties: JoinSet<Result<(), SessionError>> = JoinSet::new();

        duties.spawn(capture_duty(
            Arc::clone(&state),
            media.video,
            outbound_tx.clone(),
            events.clone(),
            cancel.clone(),
            config.max_frame_px,
            config.capture_backoff,
        ));
        duties.spawn(microphone_duty(
            Arc::clone(&state),
            media.microphone,
            config.send_audio,
            outbound_tx.clone(),
            cancel.clone(),
            config.mic_idle_wait,
        ));
        duties.spawn(send_duty(outbound_rx, sender, cancel.clone()));
        duties.spawn(receive_duty(
            receiver,
            Arc::clone(&playback),
            events.clone(),
            Arc::clone(&state),
            cancel.clone(),
        ));
        duties.spawn(playback_duty(
            media.speaker,
            config.receive_audio,
            Arc::clone(&playback),
            events.clone(),
            cancel.clone(),
        ));

        let mut failed = false;
        while let Some(joined) = duties.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                // The stop path; swallowed silently.
                Ok(Err(SessionError::Cancelled)) => {}
                Ok(Err(e)) => {
                    failed = true;
                    error!("Session duty failed: {}", e);
                    let _ = events.send(SessionEvent::Error(e.to_string()));
                    // Tear down the remaining duties; each releases its own
                    // hardware and the send duty closes the transport.
                    cancel.cancel();
                }
                Err(join_error) => {
                    failed = true;
                    error!("Session duty panicked: {}", join_error);
                    let _ =
                        events.send(SessionEvent::Error(format!("Internal error: {}", join_error)));
                    cancel.cancel();
                }
            }
        }

        finish_session(&state, &user_tx, failed).await;
        info!("Session closed: {}", config.session_id);
    }
}

/// Shared teardown: flags down, user-text sender gone, phase back to Idle
/// (through Failed when the session ended in error).
async fn finish_session(
    state: &SessionState,
    user_tx: &Mutex<Option<mpsc::Sender<OutboundMessage>>>,
    failed: bool,
) {
    state.deactivate_hardware();
    *user_tx.lock().await = None;

    if failed {
        state.set_phase(SessionPhase::Failed);
    }
    state.set_phase(SessionPhase::Idle);
}

/// Race a sleep against cancellation; true means cancelled.
async fn sleep_or_cancelled(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = time::sleep(duration) => false,
    }
}

/// Duty 1: pull frames from the video source while hardware is active,
/// encode, and enqueue while listening.
async fn capture_duty(
    state: Arc<SessionState>,
    mut video: Box<dyn VideoSource>,
    outbound: mpsc::Sender<OutboundMessage>,
    events: EventSender,
    cancel: CancellationToken,
    max_frame_px: u32,
    backoff: Duration,
) -> Result<(), SessionError> {
    while !cancel.is_cancelled() {
        if state.camera_active() {
            match video.grab().await {
                Ok(Some(raw)) => {
                    let _ = events.send(SessionEvent::FrameCaptured(raw.clone()));

                    if state.listening() {
                        match encode_frame(&raw, max_frame_px) {
                            Ok(frame) => {
                                let msg = OutboundMessage::Media {
                                    mime_type: frame.mime_type,
                                    data: frame.payload,
                                };
                                // Blocks while the queue is full; this is the
                                // backpressure that caps capture rate at
                                // transmit speed.
                                let sent = tokio::select! {
                                    _ = cancel.cancelled() => break,
                                    sent = outbound.send(msg) => sent,
                                };
                                if sent.is_err() {
                                    break;
                                }
                                state.count_frame();
                            }
                            Err(e) => warn!("Frame encoding failed: {}", e),
                        }
                    }
                }
                Ok(None) => {
                    warn!("Capture produced no frame; releasing device");
                    video.close().await;
                    if sleep_or_cancelled(&cancel, backoff).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    warn!("Capture failed: {}; releasing device", e);
                    video.close().await;
                    if sleep_or_cancelled(&cancel, backoff).await {
                        break;
                    }
                    continue;
                }
            }
        } else {
            video.close().await;
        }

        if sleep_or_cancelled(&cancel, video.interval()).await {
            break;
        }
    }

    video.close().await;
    Ok(())
}

/// Duty 2: read fixed-size microphone chunks while the mic is active,
/// reopening the device after read errors, and enqueue while listening.
async fn microphone_duty(
    state: Arc<SessionState>,
    microphone: Box<dyn Microphone>,
    spec: AudioSpec,
    outbound: mpsc::Sender<OutboundMessage>,
    cancel: CancellationToken,
    idle_wait: Duration,
) -> Result<(), SessionError> {
    let mut microphone = Some(microphone);
    let mut stream: Option<Box<dyn MicStream>> = None;

    while !cancel.is_cancelled() {
        if state.mic_active() {
            if stream.is_none() {
                let Some(mut mic) = microphone.take() else {
                    break;
                };
                let opened = match task::spawn_blocking(move || {
                    let opened = mic.open(spec);
                    (mic, opened)
                })
                .await
                {
                    Ok((mic, opened)) => {
                        microphone = Some(mic);
                        opened
                    }
                    Err(e) => Err(MediaError::Device(e.to_string())),
                };

                match opened {
                    Ok(opened) => {
                        debug!("Microphone opened");
                        stream = Some(opened);
                    }
                    Err(e) => {
                        warn!("Microphone unavailable: {}", e);
                        if sleep_or_cancelled(&cancel, idle_wait).await {
                            break;
                        }
                        continue;
                    }
                }
            }

            let Some(active) = stream.as_mut() else {
                continue;
            };

            let chunk = tokio::select! {
                _ = cancel.cancelled() => break,
                chunk = active.read_chunk() => chunk,
            };

            match chunk {
                Ok(data) => {
                    if state.listening() {
                        let msg = OutboundMessage::Media {
                            mime_type: AUDIO_PCM_MIME.to_string(),
                            data,
                        };
                        let sent = tokio::select! {
                            _ = cancel.cancelled() => break,
                            sent = outbound.send(msg) => sent,
                        };
                        if sent.is_err() {
                            break;
                        }
                        state.count_audio_chunk();
                    }
                }
                Err(e) => {
                    // Close and null out the handle so the next pass reopens.
                    warn!("Microphone read failed: {}", e);
                    stream = None;
                }
            }
        } else {
            if stream.take().is_some() {
                debug!("Microphone released");
            }
            if sleep_or_cancelled(&cancel, idle_wait).await {
                break;
            }
        }
    }

    Ok(())
}

/// Duty 3: sole writer to the transport. Drains the outbound queue in
/// order, so upstream traffic matches enqueue order exactly.
async fn send_duty(
    mut outbound: mpsc::Receiver<OutboundMessage>,
    mut sender: Box<dyn LiveSender>,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    let result = loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            msg = outbound.recv() => msg,
        };

        match msg {
            Some(msg) => {
                if let Err(e) = sender.send(msg).await {
                    break Err(SessionError::Transport(e));
                }
            }
            None => break Ok(()),
        }
    };

    // Transport close is guaranteed on every exit path.
    sender.close().await;
    result
}

/// Duty 4: demultiplex inbound events into turns. Audio goes to the
/// playback queue, text to the UI; unplayed audio is discarded at each
/// turn boundary so it never plays late.
async fn receive_duty(
    mut receiver: Box<dyn LiveReceiver>,
    playback: Arc<PlaybackQueue>,
    events: EventSender,
    state: Arc<SessionState>,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    let mut turn = Turn::default();

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            received = receiver.next_event() => received,
        };

        match received {
            Ok(Some(ServerEvent::Audio(chunk))) => {
                if !turn.in_progress() {
                    turn.begin();
                    let _ = events.send(SessionEvent::TurnStarted);
                }
                playback.push(chunk);
            }
            Ok(Some(ServerEvent::Text(fragment))) => {
                if !turn.in_progress() {
                    turn.begin();
                    let _ = events.send(SessionEvent::TurnStarted);
                }
                turn.push_text(&fragment);
                let _ = events.send(SessionEvent::TextFragment(fragment));
            }
            Ok(Some(ServerEvent::TurnComplete)) => {
                if turn.in_progress() {
                    if let Some(full_text) = turn.finish() {
                        let _ = events.send(SessionEvent::TurnCompleted(full_text));
                    }
                    state.count_turn();

                    // A completed turn makes its unplayed audio stale.
                    let dropped = playback.clear();
                    if dropped > 0 {
                        debug!("Discarded {} unplayed audio chunks at turn boundary", dropped);
                    }
                }
            }
            Ok(None) => {
                return Err(SessionError::Transport(TransportError::ConnectionClosed))
            }
            Err(e) => return Err(SessionError::Transport(e)),
        }
    }
}

/// Duty 5: play inbound chunks in arrival order. The device is opened once
/// at session start; failures are reported but never end the session.
async fn playback_duty(
    mut speaker: Box<dyn Speaker>,
    spec: AudioSpec,
    playback: Arc<PlaybackQueue>,
    events: EventSender,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    let opened = match task::spawn_blocking(move || speaker.open(spec)).await {
        Ok(opened) => opened,
        Err(e) => Err(MediaError::Device(e.to_string())),
    };

    let mut stream = match opened {
        Ok(stream) => Some(stream),
        Err(e) => {
            // Chunks are still drained (and discarded) so the queue cannot
            // back up behind a missing device.
            warn!("Playback device unavailable: {}", e);
            let _ = events.send(SessionEvent::Error(format!(
                "Audio playback unavailable: {}",
                e
            )));
            None
        }
    };

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => break,
            chunk = playback.pop() => chunk,
        };

        if let Some(active) = stream.as_mut() {
            if let Err(e) = active.write(&chunk) {
                warn!("Audio playback error: {}", e);
                let _ = events.send(SessionEvent::Error(format!(
                    "Audio playback error: {}",
                    e
                )));
            }
        }
    }

    Ok(())
}
