use std::io::Cursor;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("frame buffer does not match {width}x{height}x{channels}")]
    BufferMismatch {
        width: u32,
        height: u32,
        channels: u8,
    },
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Decodes any image format the `image` crate recognises into an RGB frame.
pub fn decode(bytes: &[u8], index: u32) -> Result<Frame, CodecError> {
    let img = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

/// Encodes an RGB frame as PNG.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, CodecError> {
    let mismatch = || CodecError::BufferMismatch {
        width: frame.width(),
        height: frame.height(),
        channels: frame.channels(),
    };
    if frame.channels() != 3 {
        return Err(mismatch());
    }
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(mismatch)?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Reads only the header to get `(width, height)`.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32), CodecError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    Ok(reader.into_dimensions()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_preserves_pixels() {
        let mut frame = Frame::filled(8, 4, [50, 100, 200], 3);
        frame.data_mut()[0] = 7;
        let bytes = encode(&frame).unwrap();
        let decoded = decode(&bytes, 3).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_dimensions_from_header() {
        let bytes = encode(&Frame::filled(12, 5, [0, 0, 0], 1)).unwrap();
        assert_eq!(dimensions(&bytes).unwrap(), (12, 5));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode(b"not an image", 1).is_err());
    }

    #[test]
    fn test_encode_rejects_non_rgb() {
        let frame = Frame::new(vec![0u8; 16], 2, 2, 4, 1);
        assert!(matches!(
            encode(&frame),
            Err(CodecError::BufferMismatch { channels: 4, .. })
        ));
    }
}
