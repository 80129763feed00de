//! High-level PIM client.
//!
//! `Client` wraps a JSON-RPC `HandlerStack` with the login and attribute set
//! calls, and `session_store` keeps the session id on disk between runs so a
//! fresh token is reused instead of logging in again.

mod client;
mod error;
pub mod session_store;

pub use client::{Client, BASE_ATTRIBUTE_SET_KEY};
pub use error::ClientError;
pub use session_store::{authenticate, SessionTokenCache};
