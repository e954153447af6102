//! Preview frame metadata, pixel format, and bitmap decode.

use serde::{Deserialize, Serialize};

use crate::errors::TransportError;
use crate::frame::types::Crop;

/// Pixel encoding tag carried in [`PreviewFrameInfo::fmt`]. Decoding
/// dispatches on this tag; `Uint16` is a known-unimplemented branch (the
/// server is not expected to pre-encode raw 16-bit data, but the wire format
/// allows it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    Jpeg,
    Png,
    Uint16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRange {
    pub min: f32,
    pub max: f32,
}

/// Metadata accompanying a packed frame payload, as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewFrameInfo {
    pub frame_idx: u64,
    pub preview_width: u32,
    pub preview_height: u32,
    pub full_width: u32,
    pub full_height: u32,
    pub crop: Crop,
    pub intensity: IntensityRange,
    pub fmt: FrameFormat,
}

/// A GPU-uploadable bitmap, decoded from the wire-format bytes named in
/// [`PreviewFrameInfo::fmt`]. Always RGBA8, matching the compositor's
/// streaming texture format.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Parses the packed payload (`[info_json] 0x0A [data_bytes]`) into its
/// metadata and still-encoded image bytes.
pub fn parse_packed_payload(bytes: &[u8]) -> Result<(PreviewFrameInfo, &[u8]), TransportError> {
    let (head, tail) = super::envelope::split_on_newline(bytes)?;
    let head = std::str::from_utf8(head)
        .map_err(|_| TransportError::MalformedFrame("packed info is not valid UTF-8"))?;
    let info: PreviewFrameInfo = serde_json::from_str(head)?;
    Ok((info, tail))
}

/// Decodes `data` per `info.fmt` into an RGBA8 bitmap.
///
/// `Uint16` always fails with [`TransportError::UnsupportedFormat`]; the
/// caller (the Collector, per the one-shot-per-channel warning policy) is
/// responsible for logging and dropping the frame without treating the
/// channel as broken.
#[cfg(feature = "native-transport")]
pub fn decode_bitmap(info: &PreviewFrameInfo, data: &[u8]) -> Result<DecodedBitmap, TransportError> {
    match info.fmt {
        FrameFormat::Uint16 => Err(TransportError::UnsupportedFormat("uint16".to_string())),
        FrameFormat::Jpeg | FrameFormat::Png => {
            let img = image::load_from_memory(data)
                .map_err(|e| TransportError::UnsupportedFormat(e.to_string()))?
                .to_rgba8();
            let (width, height) = img.dimensions();
            Ok(DecodedBitmap {
                width,
                height,
                rgba: img.into_raw(),
            })
        }
    }
}

#[cfg(not(feature = "native-transport"))]
pub fn decode_bitmap(info: &PreviewFrameInfo, _data: &[u8]) -> Result<DecodedBitmap, TransportError> {
    match info.fmt {
        FrameFormat::Uint16 => Err(TransportError::UnsupportedFormat("uint16".to_string())),
        FrameFormat::Jpeg | FrameFormat::Png => Err(TransportError::UnsupportedFormat(
            "no image decoder compiled in for this target (enable native-transport, or decode via the host platform's own decoder under wasm)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info(fmt: FrameFormat) -> PreviewFrameInfo {
        PreviewFrameInfo {
            frame_idx: 1,
            preview_width: 512,
            preview_height: 512,
            full_width: 2048,
            full_height: 2048,
            crop: Crop { x: 0.0, y: 0.0, k: 0.0 },
            intensity: IntensityRange { min: 0.0, max: 1.0 },
            fmt,
        }
    }

    #[test]
    fn parses_packed_payload() {
        let info = sample_info(FrameFormat::Png);
        let mut bytes = serde_json::to_vec(&info).unwrap();
        bytes.push(b'\n');
        bytes.extend_from_slice(b"fake-png-bytes");

        let (parsed, data) = parse_packed_payload(&bytes).unwrap();
        assert_eq!(parsed.frame_idx, 1);
        assert_eq!(data, b"fake-png-bytes");
    }

    #[test]
    fn uint16_is_unsupported() {
        let info = sample_info(FrameFormat::Uint16);
        let err = decode_bitmap(&info, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedFormat(_)));
    }

    #[cfg(feature = "native-transport")]
    #[test]
    fn decodes_a_real_png() {
        use image::{ImageBuffer, Rgba};
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let mut png_bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .unwrap();

        let info = sample_info(FrameFormat::Png);
        let bitmap = decode_bitmap(&info, &png_bytes).unwrap();
        assert_eq!(bitmap.width, 2);
        assert_eq!(bitmap.height, 2);
        assert_eq!(&bitmap.rgba[0..4], &[10, 20, 30, 255]);
    }
}
