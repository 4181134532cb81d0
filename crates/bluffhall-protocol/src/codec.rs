//! Codec trait and implementations for durable records.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The storage layer doesn't care HOW a room record is serialized; it
//! just needs something that implements [`Codec`]. We ship [`JsonCodec`]
//! because a JSON state file can be inspected (and, in a pinch, repaired)
//! by hand.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside the long-running
/// store writer task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes pretty-printed JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use bluffhall_protocol::{Card, Codec, JsonCodec, Suit};
///
/// let codec = JsonCodec;
/// let hand = vec![Card::new(0, Suit::Sun), Card::new(7, Suit::Joker)];
///
/// let bytes = codec.encode(&hand).unwrap();
/// let decoded: Vec<Card> = codec.decode(&bytes).unwrap();
/// assert_eq!(hand, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
