use std::fmt;
use std::iter::Rev;
use std::ops::Range;

use pim_jsonrpc::JsonRpcTransport;

use crate::{Handler, JsonRpcHandler, Middleware, PipelineError, Request, Response};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Lookup key of a middleware in the chain.
pub enum MiddlewareKey {
    /// Unkeyed middleware, addressed by push position.
    Index(usize),
    Named(String),
}

impl From<&str> for MiddlewareKey {
    fn from(value: &str) -> Self {
        Self::Named(value.to_string())
    }
}

impl From<String> for MiddlewareKey {
    fn from(value: String) -> Self {
        Self::Named(value)
    }
}

impl fmt::Display for MiddlewareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Chain positions visited during the prepare phase: last pushed first.
pub fn prepare_order(len: usize) -> Rev<Range<usize>> {
    (0..len).rev()
}

/// Chain positions visited during the respond phase: push order.
pub fn respond_order(len: usize) -> Range<usize> {
    0..len
}

/// A handler wrapped by an ordered chain of middleware.
///
/// The first pushed middleware is innermost (next to the handler) and the
/// last pushed is outermost. `process` runs every middleware exactly once in
/// each phase.
pub struct HandlerStack<H = Box<dyn Handler>> {
    handler: H,
    middleware: Vec<(MiddlewareKey, Box<dyn Middleware>)>,
}

impl HandlerStack<JsonRpcHandler> {
    /// Stack with the JSON-RPC handler and no middleware.
    pub fn json_rpc(transport: JsonRpcTransport) -> Self {
        Self::new(JsonRpcHandler::new(transport))
    }
}

impl<H: Handler> HandlerStack<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            middleware: Vec::new(),
        }
    }

    pub fn set_handler(&mut self, handler: H) -> &mut Self {
        self.handler = handler;
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Pushes an unkeyed middleware under its positional key, the current
    /// chain length. A keyed entry already holding that index is replaced.
    pub fn push_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        let key = MiddlewareKey::Index(self.middleware.len());
        self.push_middleware_keyed(key, middleware)
    }

    /// Appends a keyed middleware. An existing entry with the same key is
    /// replaced in place and keeps its chain position.
    pub fn push_middleware_keyed(
        &mut self,
        key: impl Into<MiddlewareKey>,
        middleware: impl Middleware + 'static,
    ) -> &mut Self {
        let key = key.into();
        let middleware: Box<dyn Middleware> = Box::new(middleware);
        match self.middleware.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => {
                tracing::debug!(key = %key, "replacing middleware");
                entry.1 = middleware;
            }
            None => self.middleware.push((key, middleware)),
        }
        self
    }

    pub fn middleware(&self, key: &MiddlewareKey) -> Option<&dyn Middleware> {
        self.middleware
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, middleware)| middleware.as_ref())
    }

    /// Keys in push order (innermost first).
    pub fn middleware_keys(&self) -> Vec<MiddlewareKey> {
        self.middleware.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Runs the request through prepare, the handler, then respond.
    ///
    /// A handler failure travels outward through `recover`; a middleware that
    /// recovers hands a response to the next outer `respond`.
    pub fn process(
        &mut self,
        request: Box<dyn Request>,
    ) -> Result<Box<dyn Response>, PipelineError> {
        let mut request = request;
        for index in prepare_order(self.middleware.len()) {
            request = self.middleware[index].1.prepare(request);
        }

        let mut outcome = self.handler.handle(request.as_ref());

        for index in respond_order(self.middleware.len()) {
            let middleware = &mut self.middleware[index].1;
            outcome = match outcome {
                Ok(response) => Ok(middleware.respond(response)),
                Err(error) => middleware.recover(error),
            };
        }
        outcome
    }
}

impl<H> fmt::Debug for HandlerStack<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerStack")
            .field(
                "middleware",
                &self.middleware.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
