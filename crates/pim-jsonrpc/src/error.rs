use serde_json::Value;
use thiserror::Error;

pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
pub const INVALID_PARAMS_CODE: i64 = -32602;

#[derive(Debug, Error)]
/// Failures of the HTTP exchange itself, before any JSON-RPC envelope is read.
pub enum TransportError {
    #[error("invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },
    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("http request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("unexpected HTTP status code: {status}")]
    HttpStatus { status: u16, body: String },
    #[error("failed to encode request envelope: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("unable to decode json response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid json-rpc response envelope: {0}")]
    InvalidEnvelope(String),
}

impl TransportError {
    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
/// A well-formed JSON-RPC `error` object returned by the server, or a missing reply.
pub enum ProtocolError {
    #[error("method not found: {message}")]
    MethodNotFound { message: String },
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("remote error {code}: {}", render_remote_message(.message, .data))]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("no response received for request id {id}")]
    MissingResponse { id: u64 },
}

impl ProtocolError {
    pub fn from_error_object(code: i64, message: String, data: Option<Value>) -> Self {
        match code {
            METHOD_NOT_FOUND_CODE => Self::MethodNotFound { message },
            INVALID_PARAMS_CODE => Self::InvalidParams { message },
            _ => Self::Remote {
                code,
                message,
                data,
            },
        }
    }

    /// JSON-RPC error code, `None` for replies the server never sent.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::MethodNotFound { .. } => Some(METHOD_NOT_FOUND_CODE),
            Self::InvalidParams { .. } => Some(INVALID_PARAMS_CODE),
            Self::Remote { code, .. } => Some(*code),
            Self::MissingResponse { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MethodNotFound { message }
            | Self::InvalidParams { message }
            | Self::Remote { message, .. } => message.clone(),
            Self::MissingResponse { id } => format!("no response for request id {id}"),
        }
    }

    /// Diagnostic payload attached to a remote error.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Remote { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}

fn render_remote_message(message: &str, data: &Option<Value>) -> String {
    let stacktrace = data
        .as_ref()
        .and_then(|data| data.get("stacktrace"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|trace| !trace.is_empty());
    match stacktrace {
        Some(trace) => format!("{message}\nStacktrace : {trace}"),
        None => message.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
/// An operation that is invalid for the current batch state.
pub enum BatchStateError {
    #[error("batch operation already in progress, execute it with execute_batch() or cancel it with discard_batch()")]
    AlreadyActive,
    #[error("transport is not in batch mode, start a batch operation with start_batch() first")]
    NotActive,
    #[error("no batch requests are queued, use call() first")]
    Empty,
    #[error("transport is in batch mode; immediate dispatch is unavailable until the batch is executed or discarded")]
    ActiveDuringDispatch,
}

#[derive(Debug, Error)]
/// Any failure surfaced by `JsonRpcTransport`.
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    BatchState(#[from] BatchStateError),
}

impl RpcError {
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ProtocolError, RpcError, TransportError};

    #[test]
    fn unit_protocol_error_classifies_standard_codes() {
        assert_eq!(
            ProtocolError::from_error_object(-32601, "nope".to_string(), None),
            ProtocolError::MethodNotFound {
                message: "nope".to_string()
            }
        );
        assert_eq!(
            ProtocolError::from_error_object(-32602, "bad".to_string(), Some(json!({}))),
            ProtocolError::InvalidParams {
                message: "bad".to_string()
            }
        );
        let remote = ProtocolError::from_error_object(-32000, "boom".to_string(), None);
        assert_eq!(remote.code(), Some(-32000));
        assert!(matches!(remote, ProtocolError::Remote { .. }));
    }

    #[test]
    fn unit_remote_error_renders_stacktrace_when_present() {
        let error = ProtocolError::from_error_object(
            -32000,
            "database unavailable".to_string(),
            Some(json!({"stacktrace": "#0 Db.php(12)"})),
        );
        assert_eq!(
            error.to_string(),
            "remote error -32000: database unavailable\nStacktrace : #0 Db.php(12)"
        );

        let without_trace = ProtocolError::from_error_object(
            -32000,
            "database unavailable".to_string(),
            Some(json!({"hint": "retry later"})),
        );
        assert_eq!(
            without_trace.to_string(),
            "remote error -32000: database unavailable"
        );
        assert_eq!(
            without_trace.data(),
            Some(&json!({"hint": "retry later"}))
        );
    }

    #[test]
    fn unit_rpc_error_distinguishes_transport_from_protocol() {
        let transport: RpcError = TransportError::HttpStatus {
            status: 502,
            body: String::new(),
        }
        .into();
        assert!(transport.is_transport());
        assert_eq!(transport.as_transport().and_then(TransportError::status), Some(502));

        let protocol: RpcError = ProtocolError::MissingResponse { id: 4 }.into();
        assert!(protocol.is_protocol());
        assert_eq!(protocol.as_protocol().and_then(ProtocolError::code), None);
    }
}
