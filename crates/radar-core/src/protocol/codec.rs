//! Binary codec for encoding and decoding marker update frames.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][seq:8][timestamp_us:8][payload:N]
//! ```
//! Total header size: 24 bytes. All multi-byte integers are big-endian.
//! The payload is the bincode encoding of [`MarkerUpdateMessage`].

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::protocol::messages::{MarkerUpdateMessage, MessageType, HEADER_SIZE, PROTOCOL_VERSION};

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be serialized or parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`MarkerUpdateMessage`] into a byte vector including the 24-byte header.
///
/// The sequence number is **not** set by this function – pass a pre-incremented
/// value from a [`crate::protocol::TickCounter`] or the transport's own counter.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use radar_core::protocol::{encode_update, decode_update};
/// use radar_core::MarkerUpdateMessage;
///
/// let msg = MarkerUpdateMessage::removal_only(vec!["radar_a_1".into()]);
/// let bytes = encode_update(&msg, 0, 0).unwrap();
/// let (decoded, consumed) = decode_update(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_update(
    msg: &MarkerUpdateMessage,
    sequence_number: u64,
    timestamp_us: u64,
) -> Result<Vec<u8>, ProtocolError> {
    let payload =
        bincode::serialize(msg).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    let payload_len = payload.len() as u32;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());

    // Header: version (1) + msg_type (1) + reserved (2) + payload_len (4) +
    //         seq (8) + timestamp_us (8) = 24 bytes
    buf.push(PROTOCOL_VERSION);
    buf.push(MessageType::MarkerUpdate as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(&sequence_number.to_be_bytes());
    buf.extend_from_slice(&timestamp_us.to_be_bytes());

    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Encodes a [`MarkerUpdateMessage`] using the current system time as the timestamp.
///
/// # Errors
///
/// Returns [`ProtocolError`] if serialization fails.
pub fn encode_update_now(
    msg: &MarkerUpdateMessage,
    sequence_number: u64,
) -> Result<Vec<u8>, ProtocolError> {
    let timestamp_us = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64;
    encode_update(msg, sequence_number, timestamp_us)
}

/// Decodes one [`MarkerUpdateMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed.
pub fn decode_update(bytes: &[u8]) -> Result<(MarkerUpdateMessage, usize), ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let msg_type_byte = bytes[1];
    MessageType::try_from(msg_type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(msg_type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let payload = &bytes[HEADER_SIZE..HEADER_SIZE + payload_len];
    let msg: MarkerUpdateMessage =
        bincode::deserialize(payload).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    Ok((msg, total_needed))
}

/// Reads the sequence number field out of an encoded frame without a full decode.
///
/// Useful for logging and latency diagnostics on the receive side.
pub fn peek_sequence(bytes: &[u8]) -> Result<u64, ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }
    Ok(u64::from_be_bytes([
        bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    ]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
