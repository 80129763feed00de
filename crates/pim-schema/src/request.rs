use std::any::Any;
use std::fmt;

use pim_pipeline::{ArgumentError, Hydrate, HydrationError, Request, Response, ResponseType};
use serde_json::Value;

use crate::{Filters, Pagination, Record, RecordSchema, SchemaError};

/// A record schema that is the argument of one remote method.
pub trait RequestSchema: RecordSchema {
    const API_METHOD: &'static str;

    /// Schema that hydrates the method's result.
    type Response: RecordSchema;
}

/// Request whose argument is a schema record.
pub struct SchemaRequest<S> {
    arg: Record<S>,
}

impl<S: RequestSchema> SchemaRequest<S> {
    pub fn new(arg: Record<S>) -> Self {
        Self { arg }
    }

    pub fn arg_record(&self) -> &Record<S> {
        &self.arg
    }

    pub fn arg_record_mut(&mut self) -> &mut Record<S> {
        &mut self.arg
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> Result<&mut Self, SchemaError> {
        self.arg.set(property, value)?;
        Ok(self)
    }

    pub fn set_filters(&mut self, filters: &Filters) -> Result<&mut Self, SchemaError> {
        filters.apply(&mut self.arg)?;
        Ok(self)
    }

    pub fn set_pagination(&mut self, pagination: &Pagination) -> Result<&mut Self, SchemaError> {
        pagination.apply(&mut self.arg)?;
        Ok(self)
    }
}

impl<S> Clone for SchemaRequest<S> {
    fn clone(&self) -> Self {
        Self {
            arg: self.arg.clone(),
        }
    }
}

impl<S: RequestSchema> fmt::Debug for SchemaRequest<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRequest")
            .field("method", &S::API_METHOD)
            .field("arg", &self.arg)
            .finish()
    }
}

impl<S: RequestSchema> Default for SchemaRequest<S> {
    fn default() -> Self {
        Self::new(Record::new())
    }
}

impl<S: RequestSchema> Request for SchemaRequest<S> {
    fn method(&self) -> &str {
        S::API_METHOD
    }

    fn arg(&self) -> Result<Option<Value>, ArgumentError> {
        self.arg
            .to_primitive()
            .map(Some)
            .map_err(|error| ArgumentError::new(S::API_METHOD, error.to_string()))
    }

    fn response_type(&self) -> ResponseType {
        ResponseType::of::<SchemaResponse<S::Response>>()
    }
}

/// Response hydrated into a schema record.
pub struct SchemaResponse<S> {
    value: Record<S>,
}

impl<S: RecordSchema> SchemaResponse<S> {
    pub fn new(value: Record<S>) -> Self {
        Self { value }
    }

    pub fn record(&self) -> &Record<S> {
        &self.value
    }

    pub fn into_record(self) -> Record<S> {
        self.value
    }

    /// Pretty-printed JSON of the hydrated record.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(&self.value).map_err(|source| SchemaError::Encode {
            schema: S::NAME,
            source,
        })
    }
}

impl<S: RecordSchema> Response for SchemaResponse<S> {
    fn value(&self) -> &dyn Any {
        &self.value
    }
}

impl<S: RecordSchema> Hydrate for SchemaResponse<S> {
    fn hydrate(raw: Option<Value>) -> Result<Self, HydrationError> {
        Record::import(raw.unwrap_or(Value::Null))
            .map(Self::new)
            .map_err(|error| HydrationError::new(S::NAME, error.to_string()))
    }
}

impl<S: RecordSchema> fmt::Debug for SchemaResponse<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaResponse").field(&self.value).finish()
    }
}

impl<S: RecordSchema> fmt::Display for SchemaResponse<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        writeln!(f, "{json}")
    }
}

#[cfg(test)]
mod tests {
    use pim_pipeline::Request;
    use serde_json::json;

    use super::{SchemaRequest, SchemaResponse};
    use crate::{Filters, ListAttributeSets, ListAttributeSetsResponse, Login, Pagination, Record};

    #[test]
    fn functional_list_request_carries_filters_and_pagination() {
        let mut request = SchemaRequest::<ListAttributeSets>::default();
        request
            .set_filters(&Filters::new().equals("prop", 1))
            .expect("filters");
        request
            .set_pagination(
                &Pagination::new()
                    .with_start(10)
                    .and_then(|pagination| pagination.with_limit(20))
                    .expect("pagination"),
            )
            .expect("apply pagination");

        assert_eq!(
            request.method(),
            "Actindo.Modules.Actindo.DataHub.AttributeSets.get"
        );
        assert_eq!(
            request.arg().expect("arg"),
            Some(json!({
                "filter": [{"property": "prop", "operator": "=", "value": 1}],
                "start": 10,
                "limit": 20
            }))
        );
        assert!(request
            .response_type()
            .name()
            .contains("ListAttributeSetsResponse"));
    }

    #[test]
    fn regression_invalid_argument_is_reported_before_dispatch() {
        let mut body = Record::<Login>::new();
        body.set("login", 123).expect("declared field");
        let error = SchemaRequest::new(body).arg().expect_err("login must be a string");
        assert_eq!(error.method, "Actindo.Modules.Actindo.UserManager.Login.login");
        assert!(error.message.contains("Login.login"));
    }

    #[test]
    fn unit_schema_response_renders_pretty_json_with_trailing_newline() {
        let response = SchemaResponse::<ListAttributeSetsResponse>::new(
            Record::import(json!({"data": [], "success": true})).expect("import"),
        );
        let rendered = response.to_string();
        assert!(rendered.ends_with("}\n"));
        assert!(rendered.contains("\n  \"success\": true"));
    }
}
