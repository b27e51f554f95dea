use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, error, warn};

use crate::cipher;
use crate::error::{FrameError, Result};
use crate::message::{Command, Response};

/// Frame header: magic (1) + reserved (3) + length (1) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Magic byte that opens every frame.
pub const MAGIC: u8 = 0x10;

/// Largest ciphertext length the one-byte header field can carry.
pub const MAX_WIRE_LENGTH: usize = u8::MAX as usize;

/// Default maximum payload accepted from the stream: 64 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: u8,
    /// Bytes 1..5 read big-endian. Outgoing frames only ever set the last
    /// byte, so for them this equals the one-byte length.
    pub length: u32,
}

impl FrameHeader {
    /// Parse the header from the start of `src`.
    ///
    /// Returns `None` if fewer than [`HEADER_SIZE`] bytes are available.
    pub fn parse(src: &[u8]) -> Option<Self> {
        let header: [u8; HEADER_SIZE] = src.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self {
            magic: header[0],
            length: u32::from_be_bytes([header[1], header[2], header[3], header[4]]),
        })
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Bytes 1..4, zero on every frame whose ciphertext fits the length byte.
    pub fn reserved(&self) -> [u8; 3] {
        let [a, b, c, _] = self.length.to_be_bytes();
        [a, b, c]
    }

    pub fn has_reserved_bytes_set(&self) -> bool {
        self.reserved() != [0; 3]
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size accepted from the stream. Default: 64 KiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Write a frame around an already-encrypted payload.
///
/// Wire format:
/// ```text
/// ┌────────┬──────────────────┬─────────┬─────────────────────┐
/// │ Magic  │ Reserved (3B)    │ Length  │ Ciphertext          │
/// │ 0x10   │ 0x00 0x00 0x00   │ (1B)    │ (Length bytes)      │
/// └────────┴──────────────────┴─────────┴─────────────────────┘
/// ```
///
/// The length byte holds the ciphertext length modulo 256. Longer payloads
/// are still written, but the device cannot frame them.
pub fn encode_frame(ciphertext: &[u8], dst: &mut BytesMut) {
    if ciphertext.len() > MAX_WIRE_LENGTH {
        warn!(
            len = ciphertext.len(),
            max = MAX_WIRE_LENGTH,
            "ciphertext exceeds one-byte length field; device will misread it"
        );
    }
    dst.reserve(HEADER_SIZE + ciphertext.len());
    dst.put_u8(MAGIC);
    dst.put_slice(&[0x00, 0x00, 0x00]);
    dst.put_u8(ciphertext.len() as u8);
    dst.put_slice(ciphertext);
}

/// Serialize, encrypt and frame a command.
pub fn encode(command: &Command) -> Result<Bytes> {
    let plaintext = serde_json::to_vec(command).map_err(FrameError::Encode)?;
    let ciphertext = cipher::encrypt(&plaintext);
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + ciphertext.len());
    encode_frame(&ciphertext, &mut dst);
    debug!(%command, wire_len = dst.len(), "encoded command");
    Ok(dst.freeze())
}

/// Decrypt and parse one complete frame.
///
/// A wrong magic byte or non-zero reserved bytes are only logged: decryption
/// is still attempted.
pub fn decode_frame(frame: &[u8]) -> Result<Response> {
    let header = FrameHeader::parse(frame).ok_or(FrameError::Truncated { len: frame.len() })?;
    if !header.has_valid_magic() {
        warn!(magic = header.magic, "rx header magic mismatch");
    }
    if header.has_reserved_bytes_set() {
        warn!(
            reserved = ?header.reserved(),
            length = header.length,
            "rx header reserved bytes set; read as part of the length"
        );
    }

    let plaintext = cipher::decrypt(&frame[HEADER_SIZE..])?;
    let value = serde_json::from_slice(&plaintext).map_err(FrameError::MalformedPayload)?;
    Ok(Response::new(value))
}

/// Decode a frame, collapsing every failure to `None`.
///
/// This is the contract the session relies on: a received frame yields
/// either a parsed response or an explicit absence, never an error.
pub fn decode(frame: &[u8]) -> Option<Response> {
    match decode_frame(frame) {
        Ok(response) => Some(response),
        Err(err) => {
            error!(error = %err, len = frame.len(), "failed decoding frame");
            None
        }
    }
}

/// Split one complete frame (header included) off the front of a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn split_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let Some(header) = FrameHeader::parse(src) else {
        return Ok(None); // Need more data
    };

    let payload_len = header.length as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    Ok(Some(src.split_to(total).freeze()))
}
