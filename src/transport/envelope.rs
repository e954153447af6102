//! Wire envelope parsing.
//!
//! Two shapes arrive over the socket: a UTF-8 JSON text frame
//! `{topic, payload}`, or a binary frame `[envelope_json] 0x0A [packed]`
//! where the envelope is `{topic, channel}`. The packed payload is itself
//! split the same way one level down (see [`crate::transport::frame_format`]):
//! `[info_json] 0x0A [data_bytes]`, since the data extends to the end of the
//! message and needs no length prefix.

use crate::errors::TransportError;
use crate::transport::frame_format::{DecodedBitmap, PreviewFrameInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The generic `{topic, payload}` JSON envelope used by every text message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

/// The `{topic, channel}` envelope prefixed to a binary frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryEnvelopeHeader {
    pub topic: String,
    pub channel: String,
}

/// A payload value as handed to dispatch handlers. Distinguishes decoded
/// binary frame payloads from ordinary JSON ones so a handler can match on
/// shape without re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// A decoded `preview/frame` binary message, dispatched on topic
    /// `preview/frame` alongside `channel` and `info` per the wire protocol.
    Frame {
        channel: String,
        info: PreviewFrameInfo,
        bitmap: DecodedBitmap,
    },
}

pub fn parse_text_frame(text: &str) -> Result<JsonEnvelope, TransportError> {
    Ok(serde_json::from_str(text)?)
}

/// Splits `bytes` on the first `0x0A` byte. Errors if the separator is
/// missing or if either side is empty, matching "malformed binary frames
/// (missing `\n` or empty payload) are dropped".
pub fn split_on_newline(bytes: &[u8]) -> Result<(&[u8], &[u8]), TransportError> {
    let idx = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(TransportError::MalformedFrame("missing newline separator"))?;
    let (head, tail) = bytes.split_at(idx);
    let tail = &tail[1..];
    if head.is_empty() || tail.is_empty() {
        return Err(TransportError::MalformedFrame("empty envelope or payload"));
    }
    Ok((head, tail))
}

/// Parses the outer `[envelope_json] 0x0A [packed_payload]` binary frame,
/// returning the header and the still-undecoded packed payload bytes.
pub fn parse_binary_frame(bytes: &[u8]) -> Result<(BinaryEnvelopeHeader, &[u8]), TransportError> {
    let (head, tail) = split_on_newline(bytes)?;
    let head = std::str::from_utf8(head)
        .map_err(|_| TransportError::MalformedFrame("envelope is not valid UTF-8"))?;
    let header: BinaryEnvelopeHeader = serde_json::from_str(head)?;
    Ok((header, tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_frame() {
        let env = parse_text_frame(r#"{"topic":"preview/frame","payload":42}"#).unwrap();
        assert_eq!(env.topic, "preview/frame");
        assert_eq!(env.payload, serde_json::json!(42));
    }

    #[test]
    fn parses_text_frame_without_payload() {
        let env = parse_text_frame(r#"{"topic":"preview/start"}"#).unwrap();
        assert_eq!(env.topic, "preview/start");
        assert!(env.payload.is_null());
    }

    #[test]
    fn splits_binary_frame() {
        let mut bytes = br#"{"topic":"preview/frame","channel":"green"}"#.to_vec();
        bytes.push(b'\n');
        bytes.extend_from_slice(b"packed-bytes");

        let (header, tail) = parse_binary_frame(&bytes).unwrap();
        assert_eq!(header.topic, "preview/frame");
        assert_eq!(header.channel, "green");
        assert_eq!(tail, b"packed-bytes");
    }

    #[test]
    fn missing_newline_is_malformed() {
        let err = split_on_newline(b"no-separator-here").unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame(_)));
    }

    #[test]
    fn empty_payload_is_malformed() {
        let mut bytes = b"{}".to_vec();
        bytes.push(b'\n');
        let err = split_on_newline(&bytes).unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame(_)));
    }

    #[test]
    fn empty_envelope_is_malformed() {
        let mut bytes = Vec::new();
        bytes.push(b'\n');
        bytes.extend_from_slice(b"data");
        let err = split_on_newline(&bytes).unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame(_)));
    }
}
