//! Default body serialization: postcard.
//!
//! Compact, non-self-describing binary encoding. Body values are written
//! back to back into one buffer; reads consume the same sequence, so writer
//! and reader call order must match, which the exchange codec guarantees
//! (one body, or one UTF string, per frame).

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use alder_core::extension::Extension;
use alder_core::submit_descriptor;
use alder_core::submit_provider;
use alder_core::Url;

use super::ObjectInput;
use super::ObjectOutput;
use super::Serialization;
use crate::error::{self, CodecError};
use crate::exchange::Body;

submit_provider! {
    point: dyn Serialization,
    impl_ref: "alder_remoting::serialize::postcard::PostcardSerialization",
    ordinary: PostcardSerialization,
}
submit_descriptor! {
    root: alder_core::constants::INTERNAL_DIRECTORY,
    type_id: "alder.remoting.Serialization",
    contents: "postcard=alder_remoting::serialize::postcard::PostcardSerialization\n",
}

/// Postcard body serialization, wire id 2 (the default slot).
#[derive(Debug, Default)]
pub struct PostcardSerialization;

impl Extension for PostcardSerialization {}

impl Serialization for PostcardSerialization {
    fn content_type_id(&self) -> u8 {
        2
    }

    fn content_type(&self) -> &'static str {
        "application/x-postcard"
    }

    fn serialize(&self, _url: &Url) -> Result<Box<dyn ObjectOutput>, CodecError> {
        Ok(Box::new(PostcardOutput { buffer: Vec::new() }))
    }

    fn deserialize(&self, _url: &Url, body: Bytes) -> Result<Box<dyn ObjectInput>, CodecError> {
        Ok(Box::new(PostcardInput { body, position: 0 }))
    }
}

struct PostcardOutput {
    buffer: Vec<u8>,
}

impl PostcardOutput {
    fn write<T: Serialize>(&mut self, what: &'static str, value: &T) -> Result<(), CodecError> {
        let buffer = std::mem::take(&mut self.buffer);
        self.buffer = postcard::to_extend(value, buffer).map_err(|source| {
            error::SerializeSnafu { what, reason: source.to_string() }.build()
        })?;
        Ok(())
    }
}

impl ObjectOutput for PostcardOutput {
    fn write_utf(&mut self, value: &str) -> Result<(), CodecError> {
        self.write("utf string", &value)
    }

    fn write_body(&mut self, body: &Body) -> Result<(), CodecError> {
        self.write("message body", body)
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, CodecError> {
        Ok(self.buffer)
    }
}

struct PostcardInput {
    body: Bytes,
    position: usize,
}

impl PostcardInput {
    fn read<T: DeserializeOwned>(&mut self, what: &'static str) -> Result<T, CodecError> {
        let (value, rest) = postcard::take_from_bytes::<T>(&self.body[self.position..])
            .map_err(|source| {
                error::DeserializeSnafu { what, reason: source.to_string() }.build()
            })?;
        self.position = self.body.len() - rest.len();
        Ok(value)
    }
}

impl ObjectInput for PostcardInput {
    fn read_utf(&mut self) -> Result<String, CodecError> {
        self.read("utf string")
    }

    fn read_body(&mut self) -> Result<Body, CodecError> {
        self.read("message body")
    }

    fn remaining(&self) -> usize {
        self.body.len() - self.position
    }
}
