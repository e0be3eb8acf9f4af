//! Body serialization extension point.
//!
//! The exchange codec frames bodies but never interprets them; a
//! [`Serialization`] turns a [`Body`] into payload bytes and back. Outbound
//! frames pick the serializer by the URL's `serialization` parameter,
//! inbound frames by the id carried in the header flags, so both peers can
//! negotiate per connection while the header layout stays fixed.
//!
//! The built-in serializers are deliberately thin: `postcard` (the default,
//! id 2) and line-delimited `json` (id 6). Production-grade formats plug in
//! the same way from their own crates.

pub mod json;
pub mod postcard;

use bytes::Bytes;

use alder_core::extension::Extension;
use alder_core::extension::ExtensionPoint;
use alder_core::Url;

use crate::exchange::Body;
use crate::error::CodecError;

/// Streaming writer for one frame body.
pub trait ObjectOutput {
    /// Write a bare UTF-8 string (error messages of non-OK responses).
    fn write_utf(&mut self, value: &str) -> Result<(), CodecError>;

    /// Write a message body.
    fn write_body(&mut self, body: &Body) -> Result<(), CodecError>;

    /// Flush and take the serialized payload.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, CodecError>;
}

/// Streaming reader over one frame body, bounded to exactly the frame's
/// payload bytes.
pub trait ObjectInput {
    /// Read a bare UTF-8 string.
    fn read_utf(&mut self) -> Result<String, CodecError>;

    /// Read a message body.
    fn read_body(&mut self) -> Result<Body, CodecError>;

    /// Read a response body, given the originating request's payload when
    /// the correlation store still has it. Serializers that need the request
    /// signature to pick a decode shape override this; the default ignores
    /// the hint.
    fn read_response_body(&mut self, request: Option<&Body>) -> Result<Body, CodecError> {
        let _ = request;
        self.read_body()
    }

    /// Unconsumed payload bytes.
    fn remaining(&self) -> usize;
}

/// An extension point: one body serialization format.
pub trait Serialization: Extension {
    /// Wire id carried in the low five header flag bits. Must be unique
    /// among registered serializations and fit [`SERIALIZATION_MASK`].
    ///
    /// [`SERIALIZATION_MASK`]: crate::constants::SERIALIZATION_MASK
    fn content_type_id(&self) -> u8;

    /// MIME-style content label, for diagnostics.
    fn content_type(&self) -> &'static str;

    /// Open a writer for one outbound body.
    fn serialize(&self, url: &Url) -> Result<Box<dyn ObjectOutput>, CodecError>;

    /// Open a reader over one inbound body.
    fn deserialize(&self, url: &Url, body: Bytes) -> Result<Box<dyn ObjectInput>, CodecError>;
}

impl ExtensionPoint for dyn Serialization {
    const TYPE_ID: &'static str = "alder.remoting.Serialization";
    const TYPE_NAME: &'static str = "Serialization";
    const DEFAULT: &'static str = "postcard";
}

impl std::fmt::Debug for dyn Serialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serialization")
            .field("content_type", &self.content_type())
            .finish()
    }
}
