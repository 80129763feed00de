//! JSON-RPC 2.0 over HTTP transport for PIM clients.
//!
//! Frames single-argument method calls as JSON-RPC envelopes, performs the
//! blocking HTTP exchange, and decodes results. Batches are accumulated on the
//! transport and resolved per position, so one failing call never hides the
//! results of its siblings.

mod batch;
mod config;
mod envelope;
mod error;
mod transport;

pub use batch::{decode_batch_response, BatchSlot, BatchState, PendingCall};
pub use config::{
    TransportConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_MS,
    DEFAULT_USER_AGENT,
};
pub use envelope::{
    decode_single_response, ErrorObject, RequestEnvelope, ResponseEnvelope, JSONRPC_VERSION,
};
pub use error::{
    BatchStateError, ProtocolError, RpcError, TransportError, INVALID_PARAMS_CODE,
    METHOD_NOT_FOUND_CODE,
};
pub use transport::JsonRpcTransport;
