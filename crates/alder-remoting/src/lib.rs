//! Exchange layer of the alder RPC framework.
//!
//! Three pieces sit at the transport boundary:
//!
//! - [`exchange`]: the [`Request`]/[`Response`] model and the
//!   [`ExchangeCodec`]: a length-prefixed binary framing with a fixed
//!   16-byte header, magic resynchronization, and pluggable body
//!   serialization. The codec consumes and produces byte buffers; it never
//!   performs I/O itself.
//! - [`serialize`]: the `Serialization` extension point the codec resolves
//!   per URL (outbound) or per header id (inbound), with thin postcard and
//!   JSON built-ins.
//! - [`exchange::future`]: the correlation store matching inbound responses
//!   to the requests that are waiting on them.
//!
//! Both the codec and the serializers are ordinary extensions of
//! `alder-core`'s resolution engine, so deployments swap them per URL.

pub mod codec_support;
pub mod constants;
mod error;
pub mod exchange;
pub mod serialize;

pub use error::CodecError;
pub use exchange::Body;
pub use exchange::Codec;
pub use exchange::CorrelationStore;
pub use exchange::Decoded;
pub use exchange::ExchangeCodec;
pub use exchange::ExchangeMessage;
pub use exchange::PendingResponse;
pub use exchange::Request;
pub use exchange::Response;
pub use exchange::ResponseFuture;
pub use exchange::RpcInvocation;
pub use exchange::RpcResult;
pub use exchange::Value;
pub use serialize::ObjectInput;
pub use serialize::ObjectOutput;
pub use serialize::Serialization;
