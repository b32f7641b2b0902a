use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, RgbImage};

use super::MediaError;

/// A compressed image ready for upload.
///
/// Immutable once created; consumed exactly once by the send duty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub mime_type: String,
    pub payload: Vec<u8>,
}

/// An uncompressed RGB image as delivered by a capture device.
///
/// Also the displayable payload of frame-captured events, so the UI can
/// render a preview without decoding JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB8 pixel data, row-major
    pub rgb: Vec<u8>,
}

/// Downscale a raw frame so its longest side is at most `max_px` and
/// compress it to JPEG, bounding upload bandwidth.
pub fn encode_frame(raw: &RawFrame, max_px: u32) -> Result<Frame, MediaError> {
    let img = RgbImage::from_raw(raw.width, raw.height, raw.rgb.clone())
        .ok_or(MediaError::InvalidFrame)?;

    let (width, height) = (raw.width, raw.height);
    let longest = width.max(height);

    let img = if longest > max_px && longest > 0 {
        let scale = max_px as f32 / longest as f32;
        let new_width = ((width as f32 * scale).round() as u32).max(1);
        let new_height = ((height as f32 * scale).round() as u32).max(1);
        image::imageops::resize(&img, new_width, new_height, FilterType::Triangle)
    } else {
        img
    };

    let mut payload = Vec::new();
    JpegEncoder::new_with_quality(&mut payload, 80).encode_image(&img)?;

    Ok(Frame {
        mime_type: "image/jpeg".to_string(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn raw(width: u32, height: u32) -> RawFrame {
        RawFrame {
            width,
            height,
            rgb: vec![128; (width * height * 3) as usize],
        }
    }

    #[test]
    fn test_encode_downscales_longest_side() {
        let frame = encode_frame(&raw(1024, 768), 512).unwrap();
        assert_eq!(frame.mime_type, "image/jpeg");

        let decoded = image::load_from_memory(&frame.payload).unwrap();
        assert_eq!(decoded.width(), 512);
        assert_eq!(decoded.height(), 384);
    }

    #[test]
    fn test_encode_keeps_small_frames() {
        let frame = encode_frame(&raw(320, 240), 512).unwrap();

        let decoded = image::load_from_memory(&frame.payload).unwrap();
        assert_eq!(decoded.width(), 320);
        assert_eq!(decoded.height(), 240);
    }

    #[test]
    fn test_encode_portrait_aspect() {
        let frame = encode_frame(&raw(600, 1200), 512).unwrap();

        let decoded = image::load_from_memory(&frame.payload).unwrap();
        assert_eq!(decoded.height(), 512);
        assert_eq!(decoded.width(), 256);
    }

    #[test]
    fn test_encode_rejects_mismatched_buffer() {
        let bad = RawFrame {
            width: 100,
            height: 100,
            rgb: vec![0; 10],
        };
        assert!(matches!(
            encode_frame(&bad, 512),
            Err(MediaError::InvalidFrame)
        ));
    }
}
