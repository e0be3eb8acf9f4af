//! Exchange frame codec.
//!
//! Encodes [`Request`]/[`Response`] messages into length-prefixed frames and
//! decodes inbound buffers back, never blocking on I/O: decode consumes a
//! byte buffer and either returns a message, asks for more input, or hands
//! non-frame bytes (anything ahead of a magic boundary) back as raw data for
//! a fallback handler such as a telnet console.

use std::sync::Arc;

use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;
use snafu::ResultExt;
use tracing::warn;

use alder_core::extension::AdaptivePlan;
use alder_core::extension::Extension;
use alder_core::extension::ExtensionError;
use alder_core::extension::ExtensionLoader;
use alder_core::extension::ExtensionPoint;
use alder_core::submit_descriptor;
use alder_core::submit_provider;
use alder_core::Url;

use super::future::CorrelationStore;
use super::Body;
use super::Request;
use super::Response;
use crate::codec_support;
use crate::constants::CODEC_KEY;
use crate::constants::DEFAULT_PAYLOAD;
use crate::constants::ERROR_MESSAGE_LIMIT;
use crate::constants::FLAG_EVENT;
use crate::constants::FLAG_REQUEST;
use crate::constants::FLAG_TWOWAY;
use crate::constants::HEADER_LENGTH;
use crate::constants::MAGIC_HIGH;
use crate::constants::MAGIC_LOW;
use crate::constants::PAYLOAD_KEY;
use crate::constants::SERIALIZATION_MASK;
use crate::error::{self, CodecError};
use crate::serialize::ObjectInput;

/// A message the codec can encode.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeMessage {
    Request(Request),
    Response(Response),
}

/// Outcome of one decode pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The buffer holds less than one full frame; retry after more bytes
    /// arrive. The buffer is left untouched.
    NeedMoreInput,
    /// Bytes ahead of a frame boundary, for the fallback (telnet) handler.
    Raw(Bytes),
    Request(Request),
    Response(Response),
}

/// Codec extension point: message in, bytes out, and back.
pub trait Codec: Extension {
    fn encode(
        &self,
        url: &Url,
        buffer: &mut BytesMut,
        message: &ExchangeMessage,
    ) -> Result<(), CodecError>;

    fn decode(&self, url: &Url, buffer: &mut BytesMut) -> Result<Decoded, CodecError>;
}

impl ExtensionPoint for dyn Codec {
    const TYPE_ID: &'static str = "alder.remoting.Codec";
    const TYPE_NAME: &'static str = "Codec";
    const DEFAULT: &'static str = "exchange";

    fn synthesize_adaptive(
        loader: Arc<ExtensionLoader<Self>>,
    ) -> Result<Arc<Self>, ExtensionError> {
        let plan = AdaptivePlan::for_point::<dyn Codec>(&loader, &[CODEC_KEY])?;
        Ok(Arc::new(AdaptiveCodec { loader, plan }))
    }
}

/// URL-driven codec dispatcher: reads the `codec` parameter and delegates.
struct AdaptiveCodec {
    loader: Arc<ExtensionLoader<dyn Codec>>,
    plan: AdaptivePlan,
}

impl Extension for AdaptiveCodec {}

impl Codec for AdaptiveCodec {
    fn encode(
        &self,
        url: &Url,
        buffer: &mut BytesMut,
        message: &ExchangeMessage,
    ) -> Result<(), CodecError> {
        let codec = self
            .plan
            .select(&self.loader, url, None)
            .context(error::ExtensionSnafu)?;
        codec.encode(url, buffer, message)
    }

    fn decode(&self, url: &Url, buffer: &mut BytesMut) -> Result<Decoded, CodecError> {
        let codec = self
            .plan
            .select(&self.loader, url, None)
            .context(error::ExtensionSnafu)?;
        codec.decode(url, buffer)
    }
}

// =============================================================================
// ExchangeCodec
// =============================================================================

/// The standard exchange codec (extension name `exchange`).
pub struct ExchangeCodec {
    store: Arc<CorrelationStore>,
}

impl Default for ExchangeCodec {
    fn default() -> Self {
        Self { store: CorrelationStore::global() }
    }
}

impl Extension for ExchangeCodec {}

impl ExchangeCodec {
    /// Codec decoding responses against a specific correlation store.
    pub fn with_store(store: Arc<CorrelationStore>) -> Self {
        Self { store }
    }

    fn check_payload(url: &Url, size: usize) -> Result<(), CodecError> {
        let limit = url.positive_parameter(PAYLOAD_KEY, DEFAULT_PAYLOAD);
        if size > limit {
            return error::ExceedPayloadLimitSnafu { size, limit }.fail();
        }
        Ok(())
    }

    fn encode_request(
        &self,
        url: &Url,
        buffer: &mut BytesMut,
        request: &Request,
    ) -> Result<(), CodecError> {
        let serialization = codec_support::get_serialization(url)?;

        let mut header = [0u8; HEADER_LENGTH];
        header[0] = MAGIC_HIGH;
        header[1] = MAGIC_LOW;
        header[2] = FLAG_REQUEST | serialization.content_type_id();
        if request.is_two_way() {
            header[2] |= FLAG_TWOWAY;
        }
        if request.is_event() {
            header[2] |= FLAG_EVENT;
        }
        header[4..12].copy_from_slice(&request.id().to_be_bytes());

        // Reserve the header slot, serialize the body behind it, then patch
        // the length back in. A failed body never leaves a partial frame.
        let saved = buffer.len();
        buffer.resize(saved + HEADER_LENGTH, 0);
        let body = (|| {
            let mut out = serialization.serialize(url)?;
            out.write_body(request.data())?;
            out.finish()
        })();
        let body = match body {
            Ok(body) => body,
            Err(err) => {
                buffer.truncate(saved);
                return Err(err);
            }
        };
        if let Err(err) = Self::check_payload(url, body.len()) {
            buffer.truncate(saved);
            return Err(err);
        }
        header[12..16].copy_from_slice(&(body.len() as u32).to_be_bytes());

        buffer[saved..saved + HEADER_LENGTH].copy_from_slice(&header);
        buffer.extend_from_slice(&body);
        Ok(())
    }

    fn encode_response(
        &self,
        url: &Url,
        buffer: &mut BytesMut,
        response: &Response,
    ) -> Result<(), CodecError> {
        let saved = buffer.len();
        match self.try_encode_response(url, buffer, response) {
            Ok(()) => Ok(()),
            Err(err) => {
                buffer.truncate(saved);
                // Answer with BAD_RESPONSE instead of leaving the peer to
                // wait out its timeout. Events are fire-and-forget, and a
                // BAD_RESPONSE that itself failed must not recurse.
                if !response.is_event() && response.status() != Response::BAD_RESPONSE {
                    warn!(
                        id = response.id(),
                        error = %err,
                        "failed to encode response, sending bad-response frame instead"
                    );
                    let mut replacement = Response::new(response.id());
                    replacement.set_status(Response::BAD_RESPONSE);
                    replacement.set_error_message(truncate_message(&format!(
                        "failed to encode response: {err}"
                    )));
                    if let Err(replacement_err) =
                        self.try_encode_response(url, buffer, &replacement)
                    {
                        buffer.truncate(saved);
                        warn!(
                            id = response.id(),
                            error = %replacement_err,
                            "failed to encode bad-response frame"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    fn try_encode_response(
        &self,
        url: &Url,
        buffer: &mut BytesMut,
        response: &Response,
    ) -> Result<(), CodecError> {
        let serialization = codec_support::get_serialization(url)?;

        let mut header = [0u8; HEADER_LENGTH];
        header[0] = MAGIC_HIGH;
        header[1] = MAGIC_LOW;
        header[2] = serialization.content_type_id();
        if response.is_heartbeat() {
            header[2] |= FLAG_EVENT;
        }
        header[3] = response.status();
        header[4..12].copy_from_slice(&response.id().to_be_bytes());

        let saved = buffer.len();
        buffer.resize(saved + HEADER_LENGTH, 0);
        let body = (|| {
            let mut out = serialization.serialize(url)?;
            if response.status() == Response::OK {
                out.write_body(response.result())?;
            } else {
                out.write_utf(response.error_message().unwrap_or_default())?;
            }
            out.finish()
        })();
        let body = match body {
            Ok(body) => body,
            Err(err) => {
                buffer.truncate(saved);
                return Err(err);
            }
        };
        if let Err(err) = Self::check_payload(url, body.len()) {
            buffer.truncate(saved);
            return Err(err);
        }
        header[12..16].copy_from_slice(&(body.len() as u32).to_be_bytes());

        buffer[saved..saved + HEADER_LENGTH].copy_from_slice(&header);
        buffer.extend_from_slice(&body);
        Ok(())
    }

    fn decode_body(
        &self,
        url: &Url,
        header: [u8; HEADER_LENGTH],
        body: Bytes,
    ) -> Result<Decoded, CodecError> {
        let flag = header[2];
        let serialization_id = flag & SERIALIZATION_MASK;
        let serialization = codec_support::serialization_by_id(serialization_id)?;
        let mut input = serialization.deserialize(url, body)?;

        let id = u64::from_be_bytes([
            header[4], header[5], header[6], header[7], header[8], header[9], header[10],
            header[11],
        ]);

        let decoded = if flag & FLAG_REQUEST == 0 {
            let mut response = Response::new(id);
            response.set_event(flag & FLAG_EVENT != 0);
            let status = header[3];
            response.set_status(status);
            if status == Response::OK {
                // A decode failure still delivers the frame, downgraded to a
                // client-side error, so correlation can settle the caller.
                let result = if response.is_event() {
                    input.read_body()
                } else {
                    input.read_response_body(self.store.request_data(id).as_ref())
                };
                match result {
                    Ok(body) => response.set_result(body),
                    Err(err) => {
                        response.set_status(Response::CLIENT_ERROR);
                        response.set_error_message(err.to_string());
                    }
                }
            } else {
                response.set_error_message(input.read_utf()?);
            }
            Decoded::Response(response)
        } else {
            let mut request = Request::with_id(id);
            request.set_two_way(flag & FLAG_TWOWAY != 0);
            request.set_event(flag & FLAG_EVENT != 0);
            match input.read_body() {
                Ok(body) => request.set_data(body),
                Err(err) => {
                    request.set_broken(true);
                    request.set_data(Body::Text(err.to_string()));
                }
            }
            Decoded::Request(request)
        };

        if input.remaining() > 0 {
            warn!(skipped = input.remaining(), "skipping unread body bytes");
        }
        Ok(decoded)
    }
}

impl Codec for ExchangeCodec {
    fn encode(
        &self,
        url: &Url,
        buffer: &mut BytesMut,
        message: &ExchangeMessage,
    ) -> Result<(), CodecError> {
        match message {
            ExchangeMessage::Request(request) => self.encode_request(url, buffer, request),
            ExchangeMessage::Response(response) => self.encode_response(url, buffer, response),
        }
    }

    /// Decode one frame from the front of `buffer`.
    ///
    /// The header is only peeked until a full frame is available, so a
    /// `NeedMoreInput` outcome leaves the buffer byte-for-byte intact.
    fn decode(&self, url: &Url, buffer: &mut BytesMut) -> Result<Decoded, CodecError> {
        let readable = buffer.len();
        if readable == 0 {
            return Ok(Decoded::NeedMoreInput);
        }

        // Resynchronize on the magic: everything ahead of the next boundary
        // belongs to the fallback codec.
        if buffer[0] != MAGIC_HIGH || (readable > 1 && buffer[1] != MAGIC_LOW) {
            let mut boundary = readable;
            for i in 1..readable.saturating_sub(1) {
                if buffer[i] == MAGIC_HIGH && buffer[i + 1] == MAGIC_LOW {
                    boundary = i;
                    break;
                }
            }
            return Ok(Decoded::Raw(buffer.split_to(boundary).freeze()));
        }

        if readable < HEADER_LENGTH {
            return Ok(Decoded::NeedMoreInput);
        }

        let length =
            u32::from_be_bytes([buffer[12], buffer[13], buffer[14], buffer[15]]) as usize;
        Self::check_payload(url, length)?;
        if readable < HEADER_LENGTH + length {
            return Ok(Decoded::NeedMoreInput);
        }

        let mut header = [0u8; HEADER_LENGTH];
        header.copy_from_slice(&buffer[..HEADER_LENGTH]);
        buffer.advance(HEADER_LENGTH);
        let body = buffer.split_to(length).freeze();
        self.decode_body(url, header, body)
    }
}

/// Clamp an error message to the replacement-frame bound on a char boundary.
fn truncate_message(message: &str) -> String {
    if message.len() <= ERROR_MESSAGE_LIMIT {
        return message.to_string();
    }
    let mut end = ERROR_MESSAGE_LIMIT;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

submit_provider! {
    point: dyn Codec,
    impl_ref: "alder_remoting::exchange::codec::ExchangeCodec",
    ordinary: ExchangeCodec,
}
submit_descriptor! {
    root: alder_core::constants::INTERNAL_DIRECTORY,
    type_id: "alder.remoting.Codec",
    contents: "exchange=alder_remoting::exchange::codec::ExchangeCodec\n",
}
