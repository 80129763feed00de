use std::any::type_name;

use pim_jsonrpc::JsonRpcTransport;
use pim_pipeline::{HandlerStack, JsonRpcHandler, Middleware, RpcRequest};
use pim_schema::{
    Filters, ListAttributeSets, ListAttributeSetsResponse, Login, Pagination, Record,
    RequestSchema, SchemaRequest,
};
use serde_json::Value;

use crate::ClientError;

/// Attribute set every PIM tenant is expected to define exactly once.
pub const BASE_ATTRIBUTE_SET_KEY: &str = "pim_base_set";

/// PIM operations on top of a JSON-RPC handler stack.
#[derive(Debug)]
pub struct Client {
    stack: HandlerStack<JsonRpcHandler>,
}

impl Client {
    pub fn new(stack: HandlerStack<JsonRpcHandler>) -> Self {
        Self { stack }
    }

    pub fn from_transport(transport: JsonRpcTransport) -> Self {
        Self::new(HandlerStack::json_rpc(transport))
    }

    pub fn stack_mut(&mut self) -> &mut HandlerStack<JsonRpcHandler> {
        &mut self.stack
    }

    pub fn push_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.stack.push_middleware(middleware);
        self
    }

    pub fn transport(&self) -> &JsonRpcTransport {
        self.stack.handler().transport()
    }

    pub fn transport_mut(&mut self) -> &mut JsonRpcTransport {
        self.stack.handler_mut().transport_mut()
    }

    pub fn filters(&self) -> Filters {
        Filters::new()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new()
    }

    /// Exchanges credentials for a session id and authenticates later calls
    /// with it.
    pub fn login(&mut self, login: &str, password: &str) -> Result<String, ClientError> {
        let mut body = Record::<Login>::new();
        body.set_login(login).set_pass(password);
        let response = self.execute(SchemaRequest::new(body))?;
        let session_id = response
            .session_id()
            .filter(|session_id| !session_id.is_empty())
            .ok_or(ClientError::MissingSessionId)?
            .to_string();
        self.set_auth(&session_id);
        tracing::info!(login, "logged in");
        Ok(session_id)
    }

    pub fn set_auth(&mut self, token: &str) {
        self.transport_mut().set_auth(token);
    }

    /// Lists attribute sets. Pagination is always sent so results never
    /// depend on server-side default limits.
    pub fn list_attribute_sets(
        &mut self,
        filters: Option<&Filters>,
        pagination: Option<&Pagination>,
    ) -> Result<Record<ListAttributeSetsResponse>, ClientError> {
        let mut request = SchemaRequest::<ListAttributeSets>::default();
        if let Some(filters) = filters {
            request.set_filters(filters)?;
        }
        let pagination = pagination.copied().unwrap_or_default();
        request.set_pagination(&pagination)?;
        self.execute(request)
    }

    /// Id of the single attribute set keyed `pim_base_set`.
    pub fn base_attribute_set_id(&mut self) -> Result<i64, ClientError> {
        let filters = self.filters().equals("key", BASE_ATTRIBUTE_SET_KEY);
        let pagination = self.pagination().with_limit(2)?;
        let response = self.list_attribute_sets(Some(&filters), Some(&pagination))?;
        let sets = response.data()?;

        match sets.as_slice() {
            [] => Err(ClientError::InvalidBaseAttributeSet(format!(
                "failed to find attribute set '{BASE_ATTRIBUTE_SET_KEY}'"
            ))),
            [set] => set.id().ok_or_else(|| {
                ClientError::InvalidBaseAttributeSet(format!(
                    "attribute set '{BASE_ATTRIBUTE_SET_KEY}' has no id"
                ))
            }),
            _ => Err(ClientError::InvalidBaseAttributeSet(format!(
                "2+ attribute sets with key '{BASE_ATTRIBUTE_SET_KEY}' (1 expected)"
            ))),
        }
    }

    /// Sends a schema request through the pipeline and returns its record.
    pub fn execute<S: RequestSchema>(
        &mut self,
        request: SchemaRequest<S>,
    ) -> Result<Record<S::Response>, ClientError> {
        let response = self.stack.process(Box::new(request))?;
        response
            .value_as::<Record<S::Response>>()
            .cloned()
            .ok_or(ClientError::UnexpectedResponse {
                expected: type_name::<Record<S::Response>>(),
            })
    }

    /// Calls any method through the pipeline and returns the raw result.
    pub fn call(&mut self, method: &str, arg: Option<Value>) -> Result<Value, ClientError> {
        let response = self.stack.process(Box::new(RpcRequest::new(method, arg)))?;
        response
            .value_as::<Value>()
            .cloned()
            .ok_or(ClientError::UnexpectedResponse {
                expected: type_name::<Value>(),
            })
    }

    /// Sends a notification. No result is read, so the pipeline is skipped.
    pub fn notify(&mut self, method: &str, arg: Option<Value>) -> Result<(), ClientError> {
        self.transport_mut().call(method, arg, true)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pim_jsonrpc::JsonRpcTransport;

    use super::Client;

    #[test]
    fn unit_set_auth_reaches_the_transport() {
        let mut client = Client::from_transport(JsonRpcTransport::new("http://127.0.0.1:1/rpc"));
        assert_eq!(client.transport().auth(), None);
        client.set_auth("tok");
        assert_eq!(client.transport().auth(), Some("tok"));
    }

    #[test]
    fn unit_filters_and_pagination_start_empty() {
        let client = Client::from_transport(JsonRpcTransport::new("http://127.0.0.1:1/rpc"));
        assert!(client.filters().is_empty());
        assert_eq!(client.pagination().limit(), 50);
    }
}
