// Capture source adapters for the session's video duty.
//
// The platform shell supplies the device contracts (`Camera`,
// `ScreenGrabber`); the adapters here give the capture duty one surface
// with lazy open semantics and blocking reads dispatched off the async
// runtime so device stalls never block the turn demux.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task;

use super::frame::RawFrame;
use super::MediaError;

/// A camera the shell can open. Opening may fail when the device is busy
/// or missing; the capture duty retries with backoff.
pub trait Camera: Send + 'static {
    fn open(&mut self) -> Result<Box<dyn CameraHandle>, MediaError>;
}

/// An open camera. Dropping the handle releases the hardware.
pub trait CameraHandle: Send + 'static {
    /// Read one frame. `Ok(None)` signals a transient failure; the duty
    /// releases the handle and reopens on the next pass.
    fn read_frame(&mut self) -> Result<Option<RawFrame>, MediaError>;
}

/// Single-shot screen grabber; no persistent handle.
pub trait ScreenGrabber: Send + 'static {
    fn grab(&mut self) -> Result<RawFrame, MediaError>;
}

/// One surface for the capture duty, regardless of whether frames come
/// from a camera or the screen.
#[async_trait]
pub trait VideoSource: Send {
    /// Acquire the next raw frame, lazily opening hardware as needed.
    /// `Ok(None)` means a transient capture failure.
    async fn grab(&mut self) -> Result<Option<RawFrame>, MediaError>;

    /// Release any open hardware handle. Idempotent.
    async fn close(&mut self);

    /// Pacing delay between capture iterations.
    fn interval(&self) -> Duration;
}

/// Camera-backed video source with a persistent device handle.
pub struct CameraSource {
    camera: Option<Box<dyn Camera>>,
    handle: Option<Box<dyn CameraHandle>>,
    interval: Duration,
}

impl CameraSource {
    pub fn new(camera: Box<dyn Camera>, interval: Duration) -> Self {
        Self {
            camera: Some(camera),
            handle: None,
            interval,
        }
    }

    async fn ensure_open(&mut self) -> Result<(), MediaError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let Some(mut camera) = self.camera.take() else {
            return Err(MediaError::NoDevice);
        };

        let (camera, opened) = task::spawn_blocking(move || {
            let opened = camera.open();
            (camera, opened)
        })
        .await
        .map_err(|e| MediaError::Device(e.to_string()))?;

        self.camera = Some(camera);
        self.handle = Some(opened?);
        Ok(())
    }
}

#[async_trait]
impl VideoSource for CameraSource {
    async fn grab(&mut self) -> Result<Option<RawFrame>, MediaError> {
        self.ensure_open().await?;

        let Some(mut handle) = self.handle.take() else {
            return Err(MediaError::NoDevice);
        };

        let (handle, frame) = task::spawn_blocking(move || {
            let frame = handle.read_frame();
            (handle, frame)
        })
        .await
        .map_err(|e| MediaError::Device(e.to_string()))?;

        // The handle stays in place on every outcome; release decisions
        // belong to the capture duty.
        self.handle = Some(handle);
        frame
    }

    async fn close(&mut self) {
        self.handle = None;
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Screen-backed video source; each grab is independent.
pub struct ScreenSource {
    grabber: Option<Box<dyn ScreenGrabber>>,
    interval: Duration,
}

impl ScreenSource {
    pub fn new(grabber: Box<dyn ScreenGrabber>, interval: Duration) -> Self {
        Self {
            grabber: Some(grabber),
            interval,
        }
    }
}

#[async_trait]
impl VideoSource for ScreenSource {
    async fn grab(&mut self) -> Result<Option<RawFrame>, MediaError> {
        let Some(mut grabber) = self.grabber.take() else {
            return Err(MediaError::NoDevice);
        };

        let (grabber, frame) = task::spawn_blocking(move || {
            let frame = grabber.grab();
            (grabber, frame)
        })
        .await
        .map_err(|e| MediaError::Device(e.to_string()))?;

        self.grabber = Some(grabber);
        frame.map(Some)
    }

    async fn close(&mut self) {
        // No persistent handle to release.
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCamera {
        opens: Arc<AtomicUsize>,
    }

    impl Camera for CountingCamera {
        fn open(&mut self) -> Result<Box<dyn CameraHandle>, MediaError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingHandle))
        }
    }

    struct CountingHandle;

    impl CameraHandle for CountingHandle {
        fn read_frame(&mut self) -> Result<Option<RawFrame>, MediaError> {
            Ok(Some(RawFrame {
                width: 2,
                height: 2,
                rgb: vec![0; 12],
            }))
        }
    }

    struct CountingGrabber {
        grabs: Arc<AtomicUsize>,
    }

    impl ScreenGrabber for CountingGrabber {
        fn grab(&mut self) -> Result<RawFrame, MediaError> {
            self.grabs.fetch_add(1, Ordering::SeqCst);
            Ok(RawFrame {
                width: 2,
                height: 2,
                rgb: vec![255; 12],
            })
        }
    }

    #[tokio::test]
    async fn test_camera_source_opens_lazily_and_reuses_handle() {
        let opens = Arc::new(AtomicUsize::new(0));
        let mut source = CameraSource::new(
            Box::new(CountingCamera {
                opens: Arc::clone(&opens),
            }),
            Duration::from_millis(200),
        );

        assert!(source.grab().await.unwrap().is_some());
        assert!(source.grab().await.unwrap().is_some());
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_camera_source_reopens_after_close() {
        let opens = Arc::new(AtomicUsize::new(0));
        let mut source = CameraSource::new(
            Box::new(CountingCamera {
                opens: Arc::clone(&opens),
            }),
            Duration::from_millis(200),
        );

        source.grab().await.unwrap();
        source.close().await;
        source.close().await; // idempotent
        source.grab().await.unwrap();

        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_screen_source_grabs_single_shot() {
        let grabs = Arc::new(AtomicUsize::new(0));
        let mut source = ScreenSource::new(
            Box::new(CountingGrabber {
                grabs: Arc::clone(&grabs),
            }),
            Duration::from_secs(1),
        );

        assert!(source.grab().await.unwrap().is_some());
        source.close().await;
        assert!(source.grab().await.unwrap().is_some());
        assert_eq!(grabs.load(Ordering::SeqCst), 2);
    }
}
