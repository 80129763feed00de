use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, RpcError, TransportError};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One outbound JSON-RPC 2.0 call.
///
/// The target API takes exactly one positional argument, so `params` is either
/// absent or a one-element array. `id` is absent for notifications and `auth`
/// is absent when no session token was set at construction time.
pub struct RequestEnvelope {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<[Value; 1]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl RequestEnvelope {
    pub fn new(method: &str, arg: Option<Value>, id: Option<u64>, auth: Option<&str>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: arg.filter(|arg| !arg.is_null()).map(|arg| [arg]),
            id,
            auth: auth.map(str::to_string),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn argument(&self) -> Option<&Value> {
        self.params.as_ref().map(|[arg]| arg)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// One inbound JSON-RPC 2.0 reply.
pub struct ResponseEnvelope {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

impl ResponseEnvelope {
    pub fn from_value(value: Value) -> Result<Self, TransportError> {
        if !value.is_object() {
            return Err(TransportError::InvalidEnvelope(format!(
                "expected a json object, found {}",
                json_kind(&value)
            )));
        }
        let envelope = serde_json::from_value::<Self>(value)
            .map_err(|error| TransportError::InvalidEnvelope(error.to_string()))?;
        if let Some(version) = envelope.jsonrpc.as_deref() {
            if version != JSONRPC_VERSION {
                return Err(TransportError::InvalidEnvelope(format!(
                    "unsupported jsonrpc version '{version}'"
                )));
            }
        }
        Ok(envelope)
    }

    /// Numeric id of the reply; string and null ids do not match any outbound call.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }

    pub fn into_result(self) -> Result<Option<Value>, ProtocolError> {
        if let Some(error) = self.error {
            return Err(ProtocolError::from_error_object(
                error.code,
                error.message,
                error.data,
            ));
        }
        Ok(self.result.filter(|result| !result.is_null()))
    }
}

/// Decodes the body of a single (non-batch) exchange.
///
/// Notifications never parse a value. A zero-length body is the empty-result
/// case and is only valid for notifications.
pub fn decode_single_response(body: &[u8], expected_id: Option<u64>) -> Result<Option<Value>, RpcError> {
    let Some(id) = expected_id else {
        return Ok(None);
    };
    if body.is_empty() {
        return Err(ProtocolError::MissingResponse { id }.into());
    }
    let decoded = serde_json::from_slice::<Value>(body).map_err(TransportError::Decode)?;
    let envelope = ResponseEnvelope::from_value(decoded)?;
    Ok(envelope.into_result()?)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
