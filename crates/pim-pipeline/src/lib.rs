//! Request/response pipeline around the JSON-RPC transport.
//!
//! A `HandlerStack` runs an ordered list of `Middleware` around a terminal
//! `Handler` in two phases: requests are prepared outermost to innermost, and
//! responses travel back innermost to outermost. Either phase may replace the
//! object it receives.

mod contract;
mod error;
mod handler;
mod middleware;
mod stack;

pub use contract::{Hydrate, JsonResponse, Request, Response, ResponseType, RpcRequest};
pub use error::{ArgumentError, HydrationError, PipelineError};
pub use handler::{Handler, JsonRpcHandler};
pub use middleware::{Middleware, TracingMiddleware};
pub use stack::{prepare_order, respond_order, HandlerStack, MiddlewareKey};
