//! Line-delimited JSON body serialization.
//!
//! Each written value is one compact JSON document terminated by `\n`.
//! Compact encoding never emits a raw newline (strings escape it), so the
//! terminator is unambiguous. Useful for debugging against a wire capture;
//! postcard remains the default.

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
    impl_ref: "alder_remoting::serialize::json::JsonSerialization",
    ordinary: JsonSerialization,
}
submit_descriptor! {
    root: alder_core::constants::INTERNAL_DIRECTORY,
    type_id: "alder.remoting.Serialization",
    contents: "json=alder_remoting::serialize::json::JsonSerialization\n",
}

/// JSON body serialization, wire id 6.
#[derive(Debug, Default)]
pub struct JsonSerialization;

impl Extension for JsonSerialization {}

impl Serialization for JsonSerialization {
    fn content_type_id(&self) -> u8 {
        6
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize(&self, _url: &Url) -> Result<Box<dyn ObjectOutput>, CodecError> {
        Ok(Box::new(JsonOutput { buffer: Vec::new() }))
    }

    fn deserialize(&self, _url: &Url, body: Bytes) -> Result<Box<dyn ObjectInput>, CodecError> {
        Ok(Box::new(JsonInput { body, position: 0 }))
    }
}

struct JsonOutput {
    buffer: Vec<u8>,
}

impl JsonOutput {
    fn write<T: Serialize>(&mut self, what: &'static str, value: &T) -> Result<(), CodecError> {
        let mut line = serde_json::to_vec(value).map_err(|source| {
            error::SerializeSnafu { what, reason: source.to_string() }.build()
        })?;
        line.push(b'\n');
        self.buffer.extend_from_slice(&line);
        Ok(())
    }
}

impl ObjectOutput for JsonOutput {
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

struct JsonInput {
    body: Bytes,
    position: usize,
}

impl JsonInput {
    fn read<T: DeserializeOwned>(&mut self, what: &'static str) -> Result<T, CodecError> {
        let rest = &self.body[self.position..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        if line.is_empty() {
            return error::DeserializeSnafu { what, reason: "no value left in body".to_string() }
                .fail();
        }
        let value = serde_json::from_slice(line).map_err(|source| {
            error::DeserializeSnafu { what, reason: source.to_string() }.build()
        })?;
        self.position += consumed;
        Ok(value)
    }
}

impl ObjectInput for JsonInput {
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
