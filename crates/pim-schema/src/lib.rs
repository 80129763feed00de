//! Schema-backed request and response records for the PIM JSON-RPC API.
//!
//! A `Record<S>` only accepts the fields its `RecordSchema` declares, except
//! while importing a server payload, which may carry fields the client does
//! not know about. `SchemaRequest` and `SchemaResponse` plug records into the
//! `pim-pipeline` request/response contracts.

mod error;
mod filters;
mod generated;
mod pagination;
mod record;
mod request;

pub use error::SchemaError;
pub use filters::Filters;
pub use generated::{
    AttributeSet, Filter, ListAttributeSets, ListAttributeSetsResponse, Login, LoginResponse,
};
pub use pagination::{Pagination, DEFAULT_LIMIT, DEFAULT_START};
pub use record::{FieldKind, FieldSpec, Record, RecordSchema};
pub use request::{RequestSchema, SchemaRequest, SchemaResponse};
