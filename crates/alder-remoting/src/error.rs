//! Errors for the exchange codec and serialization layer.

use alder_core::ExtensionError;
use snafu::Snafu;

/// Errors surfaced by encode, decode, and correlation operations.
///
/// A partial frame is not an error: decode reports it through
/// [`Decoded::NeedMoreInput`](crate::exchange::Decoded::NeedMoreInput) so the
/// transport can retry once more bytes arrive.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    /// The body exceeds the frame payload bound.
    #[snafu(display("data length {size} exceeds payload limit {limit}"))]
    ExceedPayloadLimit { size: usize, limit: usize },

    /// The header names a serializer id nobody registered.
    #[snafu(display("unknown serialization id {id}"))]
    UnknownSerialization { id: u8 },

    /// Body serialization failed.
    #[snafu(display("failed to serialize {what}: {reason}"))]
    Serialize { what: &'static str, reason: String },

    /// Body deserialization failed.
    #[snafu(display("failed to deserialize {what}: {reason}"))]
    Deserialize { what: &'static str, reason: String },

    /// The registry could not resolve a codec or serializer extension.
    #[snafu(display("extension resolution failed: {source}"))]
    Extension { source: ExtensionError },

    /// The pending slot was dropped before a response arrived.
    #[snafu(display("request {id} was cancelled before a response arrived"))]
    Cancelled { id: u64 },
}
