// Microphone capture via cpal.
//
// The cpal stream lives on a dedicated thread; its callback converts the
// device's native f32 interleaved audio to 16 kHz mono i16 chunks and hands
// them over a channel, so reads on the async side never touch hardware.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tracing::{error, warn};

use super::AudioSpec;
use crate::media::MediaError;

/// A microphone the shell (or the default cpal backend) provides.
pub trait Microphone: Send {
    fn open(&mut self, spec: AudioSpec) -> Result<Box<dyn MicStream>, MediaError>;
}

/// An open microphone stream. Dropping it releases the device.
#[async_trait]
pub trait MicStream: Send {
    /// Read the next fixed-size chunk of 16-bit little-endian PCM.
    async fn read_chunk(&mut self) -> Result<Vec<u8>, MediaError>;
}

/// Microphone backed by the system default cpal input device.
pub struct CpalMicrophone;

impl Microphone for CpalMicrophone {
    fn open(&mut self, spec: AudioSpec) -> Result<Box<dyn MicStream>, MediaError> {
        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<u8>>(32);
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || capture_thread(spec, chunk_tx, stop_rx, ready_tx));

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalMicStream {
                chunks: chunk_rx,
                _stop: stop_tx,
            })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MediaError::Device(
                "capture thread exited during setup".to_string(),
            )),
        }
    }
}

struct CpalMicStream {
    chunks: mpsc::Receiver<Vec<u8>>,
    /// Dropping this sender unparks the capture thread, which drops the
    /// cpal stream and releases the device.
    _stop: std::sync::mpsc::Sender<()>,
}

#[async_trait]
impl MicStream for CpalMicStream {
    async fn read_chunk(&mut self) -> Result<Vec<u8>, MediaError> {
        self.chunks.recv().await.ok_or(MediaError::StreamClosed)
    }
}

/// Owns the cpal stream for its whole lifetime; parked on `stop_rx` until
/// the stream handle is dropped.
fn capture_thread(
    spec: AudioSpec,
    chunk_tx: mpsc::Sender<Vec<u8>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
    ready_tx: std::sync::mpsc::Sender<Result<(), MediaError>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready_tx.send(Err(MediaError::NoDevice));
        return;
    };

    let supported = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(MediaError::Device(e.to_string())));
            return;
        }
    };

    let native_rate = supported.sample_rate().0;
    let native_channels = supported.channels();
    let config: cpal::StreamConfig = supported.into();

    let chunk_samples = spec.chunk_frames * spec.channels as usize;
    let target_rate = spec.sample_rate;
    let mut pending: Vec<i16> = Vec::new();

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let samples = convert_to_i16(data);
            let mono = downmix_to_mono(&samples, native_channels);
            let resampled = decimate(&mono, native_rate, target_rate);

            pending.extend(resampled);
            for chunk in drain_chunks(&mut pending, chunk_samples) {
                // Never block the audio callback; a slow consumer loses
                // the oldest pending chunk.
                if chunk_tx.try_send(chunk).is_err() {
                    warn!("Microphone chunk dropped (consumer behind)");
                }
            }
        },
        |err: cpal::StreamError| {
            error!("cpal input stream error: {}", err);
        },
        None,
    );

    match stream {
        Ok(stream) => {
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(MediaError::Device(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            // Blocks until the MicStream is dropped.
            let _ = stop_rx.recv();
        }
        Err(e) => {
            let _ = ready_tx.send(Err(MediaError::Device(e.to_string())));
        }
    }
}

/// Convert f32 samples in [-1.0, 1.0] to i16 PCM.
fn convert_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Downmix interleaved channels by summing with clipping (no division to
/// preserve volume).
fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    let mut mono = Vec::with_capacity(samples.len() / channels);

    for frame in samples.chunks_exact(channels) {
        let sum: i32 = frame.iter().map(|s| *s as i32).sum();
        mono.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    mono
}

/// Downsample mono audio by decimation: take every Nth sample.
fn decimate(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate || target_rate == 0 {
        return samples.to_vec();
    }

    let ratio = source_rate / target_rate;
    if ratio <= 1 {
        return samples.to_vec(); // Can't upsample
    }

    samples.iter().step_by(ratio as usize).copied().collect()
}

/// Pull as many full chunks as `pending` holds, encoded little-endian.
fn drain_chunks(pending: &mut Vec<i16>, chunk_samples: usize) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();

    while pending.len() >= chunk_samples {
        let chunk: Vec<u8> = pending
            .drain(..chunk_samples)
            .flat_map(|s| s.to_le_bytes())
            .collect();
        chunks.push(chunk);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_clamps_out_of_range() {
        let converted = convert_to_i16(&[0.0, 1.0, -1.0, 2.0]);
        assert_eq!(converted[0], 0);
        assert_eq!(converted[1], i16::MAX);
        assert_eq!(converted[3], i16::MAX);
    }

    #[test]
    fn test_downmix_sums_channels() {
        let mono = downmix_to_mono(&[100, 50, 200, 100], 2);
        assert_eq!(mono, vec![150, 300]);
    }

    #[test]
    fn test_downmix_clips() {
        let mono = downmix_to_mono(&[i16::MAX - 100, 200], 2);
        assert_eq!(mono, vec![i16::MAX]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = vec![1, 2, 3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn test_decimate_48k_to_16k() {
        let samples: Vec<i16> = (0..12).collect();
        let decimated = decimate(&samples, 48000, 16000);
        assert_eq!(decimated, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_decimate_no_upsampling() {
        let samples = vec![1, 2, 3];
        assert_eq!(decimate(&samples, 16000, 48000), samples);
    }

    #[test]
    fn test_drain_chunks_fixed_size() {
        let mut pending: Vec<i16> = (0..2500).collect();
        let chunks = drain_chunks(&mut pending, 1024);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2048); // 1024 samples * 2 bytes
        assert_eq!(pending.len(), 2500 - 2048);

        // First sample round-trips
        assert_eq!(i16::from_le_bytes([chunks[0][0], chunks[0][1]]), 0);
        // First sample of the second chunk follows the first chunk
        assert_eq!(i16::from_le_bytes([chunks[1][0], chunks[1][1]]), 1024);
    }

    #[test]
    fn test_drain_chunks_keeps_partial() {
        let mut pending: Vec<i16> = (0..100).collect();
        let chunks = drain_chunks(&mut pending, 1024);

        assert!(chunks.is_empty());
        assert_eq!(pending.len(), 100);
    }
}
