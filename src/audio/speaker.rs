// PCM playback via rodio.
//
// The output stream is !Send, so it lives on a parked thread; the Sink it
// feeds is handed back and appended to from the playback duty. Appended
// buffers play strictly in arrival order.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

use super::AudioSpec;
use crate::media::MediaError;

/// A playback device the shell (or the default rodio backend) provides.
pub trait Speaker: Send {
    fn open(&mut self, spec: AudioSpec) -> Result<Box<dyn SpeakerStream>, MediaError>;
}

/// An open playback stream. Dropping it releases the device.
pub trait SpeakerStream: Send {
    /// Queue one chunk of 16-bit little-endian PCM for playback.
    fn write(&mut self, pcm: &[u8]) -> Result<(), MediaError>;
}

/// Speaker backed by the system default rodio output device.
pub struct RodioSpeaker;

impl Speaker for RodioSpeaker {
    fn open(&mut self, spec: AudioSpec) -> Result<Box<dyn SpeakerStream>, MediaError> {
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

        std::thread::spawn(move || {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = ready_tx.send(Err(MediaError::Device(e.to_string())));
                    return;
                }
            };

            match Sink::try_new(&handle) {
                Ok(sink) => {
                    let _ = ready_tx.send(Ok(sink));
                    // Keep the output stream alive until the SpeakerStream
                    // is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(MediaError::Device(e.to_string())));
                }
            }
        });

        let sink = ready_rx
            .recv()
            .map_err(|_| MediaError::Device("playback thread exited during setup".to_string()))??;

        Ok(Box::new(RodioSpeakerStream {
            sink,
            spec,
            _stop: stop_tx,
        }))
    }
}

struct RodioSpeakerStream {
    sink: Sink,
    spec: AudioSpec,
    _stop: std::sync::mpsc::Sender<()>,
}

impl SpeakerStream for RodioSpeakerStream {
    fn write(&mut self, pcm: &[u8]) -> Result<(), MediaError> {
        if pcm.len() % 2 != 0 {
            return Err(MediaError::Device(
                "odd-length PCM chunk".to_string(),
            ));
        }

        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        self.sink.append(SamplesBuffer::new(
            self.spec.channels,
            self.spec.sample_rate,
            samples,
        ));

        Ok(())
    }
}
