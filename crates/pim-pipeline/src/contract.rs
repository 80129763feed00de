use std::any::{type_name, Any};
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ArgumentError, HydrationError};

/// A remote call: method name, one positional argument, and the type that
/// hydrates its result.
pub trait Request {
    fn method(&self) -> &str;

    /// The single positional argument; `None` omits `params` from the envelope.
    fn arg(&self) -> Result<Option<Value>, ArgumentError>;

    fn response_type(&self) -> ResponseType;
}

/// A hydrated result travelling back through the pipeline.
pub trait Response {
    fn value(&self) -> &dyn Any;
}

impl dyn Response {
    pub fn value_as<T: 'static>(&self) -> Option<&T> {
        self.value().downcast_ref::<T>()
    }
}

/// Response types that can be built from a raw decoded result.
pub trait Hydrate: Response + Sized + 'static {
    fn hydrate(raw: Option<Value>) -> Result<Self, HydrationError>;
}

type Hydrator = fn(Option<Value>) -> Result<Box<dyn Response>, HydrationError>;

#[derive(Clone, Copy)]
/// Tag naming the declared response type of a request, plus how to build it.
pub struct ResponseType {
    name: &'static str,
    hydrate: Hydrator,
}

impl ResponseType {
    pub fn of<T: Hydrate>() -> Self {
        Self {
            name: type_name::<T>(),
            hydrate: hydrate_boxed::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hydrate(&self, raw: Option<Value>) -> Result<Box<dyn Response>, HydrationError> {
        (self.hydrate)(raw)
    }
}

impl fmt::Debug for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseType").field(&self.name).finish()
    }
}

fn hydrate_boxed<T: Hydrate>(raw: Option<Value>) -> Result<Box<dyn Response>, HydrationError> {
    T::hydrate(raw).map(|response| Box::new(response) as Box<dyn Response>)
}

#[derive(Debug, Clone, PartialEq)]
/// Response backed by any serde-deserializable value.
pub struct JsonResponse<T> {
    value: T,
}

impl<T> JsonResponse<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: 'static> Response for JsonResponse<T> {
    fn value(&self) -> &dyn Any {
        &self.value
    }
}

impl<T: DeserializeOwned + 'static> Hydrate for JsonResponse<T> {
    fn hydrate(raw: Option<Value>) -> Result<Self, HydrationError> {
        serde_json::from_value::<T>(raw.unwrap_or(Value::Null))
            .map(Self::new)
            .map_err(|error| HydrationError::new(type_name::<T>(), error.to_string()))
    }
}

#[derive(Debug, Clone)]
/// Ad-hoc request for a method name and a JSON argument.
pub struct RpcRequest {
    method: String,
    arg: Option<Value>,
    response_type: ResponseType,
}

impl RpcRequest {
    /// Request whose result is returned as an untyped JSON value.
    pub fn new(method: impl Into<String>, arg: Option<Value>) -> Self {
        Self::with_response_type(method, arg, ResponseType::of::<JsonResponse<Value>>())
    }

    pub fn with_response_type(
        method: impl Into<String>,
        arg: Option<Value>,
        response_type: ResponseType,
    ) -> Self {
        Self {
            method: method.into(),
            arg,
            response_type,
        }
    }
}

impl Request for RpcRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn arg(&self) -> Result<Option<Value>, ArgumentError> {
        Ok(self.arg.clone())
    }

    fn response_type(&self) -> ResponseType {
        self.response_type
    }
}
