use pim_jsonrpc::RpcError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot hydrate {type_name} from response payload: {message}")]
/// The payload does not fit the request's declared response type.
///
/// This is a client/server contract mismatch and is never retried.
pub struct HydrationError {
    pub type_name: String,
    pub message: String,
}

impl HydrationError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument for '{method}': {message}")]
/// The request could not produce its positional argument.
pub struct ArgumentError {
    pub method: String,
    pub message: String,
}

impl ArgumentError {
    pub fn new(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Hydration(#[from] HydrationError),
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error("middleware '{middleware}' rejected the call: {message}")]
    Middleware { middleware: String, message: String },
}

impl PipelineError {
    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(error) => Some(error),
            _ => None,
        }
    }

    /// Contract mismatches that no amount of retrying can fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Hydration(_) | Self::Argument(_))
    }
}
