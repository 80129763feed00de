use pim_jsonrpc::{BatchStateError, JsonRpcTransport, RpcError};

use crate::{PipelineError, Request, Response};

/// Terminal pipeline stage: turns a request into a response.
pub trait Handler {
    fn handle(&mut self, request: &dyn Request) -> Result<Box<dyn Response>, PipelineError>;
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(&mut self, request: &dyn Request) -> Result<Box<dyn Response>, PipelineError> {
        (**self).handle(request)
    }
}

#[derive(Debug)]
/// Handler that dispatches through a `JsonRpcTransport` and hydrates the result.
pub struct JsonRpcHandler {
    transport: JsonRpcTransport,
}

impl JsonRpcHandler {
    pub fn new(transport: JsonRpcTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &JsonRpcTransport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut JsonRpcTransport {
        &mut self.transport
    }

    pub fn into_transport(self) -> JsonRpcTransport {
        self.transport
    }
}

impl Handler for JsonRpcHandler {
    fn handle(&mut self, request: &dyn Request) -> Result<Box<dyn Response>, PipelineError> {
        // A queued call has no result to hydrate.
        if self.transport.in_batch_mode() {
            return Err(RpcError::from(BatchStateError::ActiveDuringDispatch).into());
        }

        let method = request.method();
        let arg = request.arg()?;
        let raw = self.transport.call(method, arg, false)?;
        let response_type = request.response_type();
        response_type.hydrate(raw).map_err(|error| {
            tracing::error!(
                method,
                response_type = response_type.name(),
                error = %error,
                "response payload does not match declared response type"
            );
            PipelineError::from(error)
        })
    }
}
