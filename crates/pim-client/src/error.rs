use pim_jsonrpc::RpcError;
use pim_pipeline::PipelineError;
use pim_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("pipeline returned a response that is not {expected}")]
    UnexpectedResponse { expected: &'static str },
    #[error("login succeeded but returned no session id")]
    MissingSessionId,
    #[error("invalid base attribute set: {0}")]
    InvalidBaseAttributeSet(String),
}

impl ClientError {
    /// The JSON-RPC failure underneath, if any.
    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Pipeline(error) => error.as_rpc(),
            Self::Rpc(error) => Some(error),
            _ => None,
        }
    }
}
