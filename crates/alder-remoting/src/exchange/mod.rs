//! Request/response exchange model.
//!
//! A [`Request`] or [`Response`] is one correlated message: the id ties a
//! response back to the request that produced it, and the body is an opaque
//! [`Body`] the serialization layer turns into frame payload bytes. Events
//! (heartbeats, control messages) ride the same framing with the event flag
//! set; a heartbeat is an event with an empty body.

pub mod codec;
pub mod future;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_VERSION;

pub use codec::Codec;
pub use codec::Decoded;
pub use codec::ExchangeCodec;
pub use codec::ExchangeMessage;
pub use future::CorrelationStore;
pub use future::PendingResponse;
pub use future::ResponseFuture;

/// Body of the readonly control event.
pub const READONLY_EVENT: &str = "R";

static INVOKE_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    INVOKE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A self-describing wire value: the argument and result model of the
/// exchange layer. Self-description keeps bodies decodable by serializers
/// that carry no external schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// A method-call payload: which method, with what signature and arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcInvocation {
    pub method_name: String,
    pub parameter_types: Vec<String>,
    pub arguments: Vec<Value>,
    pub attachments: BTreeMap<String, String>,
}

impl RpcInvocation {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            parameter_types: Vec::new(),
            arguments: Vec::new(),
            attachments: BTreeMap::new(),
        }
    }
}

impl alder_core::Invocation for RpcInvocation {
    fn method_name(&self) -> &str {
        &self.method_name
    }
}

/// A method-call result: a value or a remote exception description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResult {
    pub value: Option<Value>,
    pub exception: Option<String>,
    pub attachments: BTreeMap<String, String>,
}

/// Message body. `Empty` doubles as the heartbeat payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Empty,
    Text(String),
    Invocation(RpcInvocation),
    Result(RpcResult),
    Raw(Vec<u8>),
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

// =============================================================================
// Request
// =============================================================================

/// An outbound or decoded request frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: u64,
    version: String,
    two_way: bool,
    event: bool,
    /// Set when the body failed to decode; the data then carries the error
    /// text so the handler can answer with BAD_REQUEST.
    broken: bool,
    data: Body,
}

impl Request {
    /// New two-way request with a process-unique id.
    pub fn new() -> Self {
        Self::with_id(next_id())
    }

    /// Request carrying an explicit id (decoding, tests).
    pub fn with_id(id: u64) -> Self {
        Self {
            id,
            version: DEFAULT_VERSION.to_string(),
            two_way: true,
            event: false,
            broken: false,
            data: Body::Empty,
        }
    }

    /// New heartbeat event.
    pub fn heartbeat() -> Self {
        let mut request = Self::new();
        request.event = true;
        request.two_way = false;
        request
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_two_way(&self) -> bool {
        self.two_way
    }

    pub fn set_two_way(&mut self, two_way: bool) {
        self.two_way = two_way;
    }

    pub fn is_event(&self) -> bool {
        self.event
    }

    pub fn set_event(&mut self, event: bool) {
        self.event = event;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }

    pub fn data(&self) -> &Body {
        &self.data
    }

    pub fn set_data(&mut self, data: Body) {
        self.data = data;
    }

    /// An event with an empty body is a heartbeat.
    pub fn is_heartbeat(&self) -> bool {
        self.event && matches!(self.data, Body::Empty)
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Response
// =============================================================================

/// An outbound or decoded response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: u64,
    version: String,
    status: u8,
    event: bool,
    error_message: Option<String>,
    result: Body,
}

impl Response {
    pub const OK: u8 = 20;
    pub const CLIENT_TIMEOUT: u8 = 30;
    pub const SERVER_TIMEOUT: u8 = 31;
    pub const BAD_REQUEST: u8 = 40;
    pub const BAD_RESPONSE: u8 = 50;
    pub const SERVICE_NOT_FOUND: u8 = 60;
    pub const SERVICE_ERROR: u8 = 70;
    pub const SERVER_ERROR: u8 = 80;
    pub const CLIENT_ERROR: u8 = 90;

    /// OK response answering the given request id.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            version: DEFAULT_VERSION.to_string(),
            status: Self::OK,
            event: false,
            error_message: None,
            result: Body::Empty,
        }
    }

    /// Heartbeat reply to a heartbeat request.
    pub fn heartbeat(id: u64) -> Self {
        let mut response = Self::new(id);
        response.event = true;
        response
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn set_status(&mut self, status: u8) {
        self.status = status;
    }

    pub fn is_event(&self) -> bool {
        self.event
    }

    pub fn set_event(&mut self, event: bool) {
        self.event = event;
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn result(&self) -> &Body {
        &self.result
    }

    pub fn set_result(&mut self, result: Body) {
        self.result = result;
    }

    /// An event with an empty body is a heartbeat.
    pub fn is_heartbeat(&self) -> bool {
        self.event && matches!(self.result, Body::Empty)
    }
}
