use std::time::Instant;

use crate::{PipelineError, Request, Response};

/// A stage that wraps every call passing through a `HandlerStack`.
///
/// `prepare` sees the request on the way in and may replace it; `respond`
/// sees the hydrated response on the way out. When the call fails, `recover`
/// runs instead of `respond` and may turn the error back into a response.
pub trait Middleware {
    fn prepare(&mut self, request: Box<dyn Request>) -> Box<dyn Request> {
        request
    }

    fn respond(&mut self, response: Box<dyn Response>) -> Box<dyn Response> {
        response
    }

    fn recover(&mut self, error: PipelineError) -> Result<Box<dyn Response>, PipelineError> {
        Err(error)
    }
}

#[derive(Debug, Default)]
/// Logs method name and latency for each call.
pub struct TracingMiddleware {
    in_flight: Option<(String, Instant)>,
}

impl TracingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish(&mut self) -> (String, u128) {
        match self.in_flight.take() {
            Some((method, started)) => (method, started.elapsed().as_millis()),
            None => (String::new(), 0),
        }
    }
}

impl Middleware for TracingMiddleware {
    fn prepare(&mut self, request: Box<dyn Request>) -> Box<dyn Request> {
        tracing::debug!(method = request.method(), "rpc call started");
        self.in_flight = Some((request.method().to_string(), Instant::now()));
        request
    }

    fn respond(&mut self, response: Box<dyn Response>) -> Box<dyn Response> {
        let (method, elapsed_ms) = self.finish();
        tracing::debug!(method = %method, elapsed_ms, "rpc call completed");
        response
    }

    fn recover(&mut self, error: PipelineError) -> Result<Box<dyn Response>, PipelineError> {
        let (method, elapsed_ms) = self.finish();
        tracing::warn!(method = %method, elapsed_ms, error = %error, "rpc call failed");
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::{Middleware, TracingMiddleware};
    use crate::{JsonResponse, PipelineError, RpcRequest};

    #[test]
    fn unit_tracing_middleware_passes_values_through() {
        let mut middleware = TracingMiddleware::new();
        let request = middleware.prepare(Box::new(RpcRequest::new("ping", None)));
        assert_eq!(request.method(), "ping");
        assert!(middleware.in_flight.is_some());

        let response = middleware.respond(Box::new(JsonResponse::new(7_i64)));
        assert_eq!(response.value_as::<i64>(), Some(&7));
        assert!(middleware.in_flight.is_none());
    }

    #[test]
    fn unit_tracing_middleware_does_not_swallow_errors() {
        let mut middleware = TracingMiddleware::new();
        middleware.prepare(Box::new(RpcRequest::new("ping", None)));
        let error = PipelineError::Middleware {
            middleware: "auth".to_string(),
            message: "no session".to_string(),
        };
        let recovered = middleware.recover(error);
        assert!(matches!(recovered, Err(PipelineError::Middleware { .. })));
    }
}
