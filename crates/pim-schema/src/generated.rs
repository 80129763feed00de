//! Precompiled record schemas for the PIM endpoints this crate talks to.

use serde_json::Value;

use crate::{FieldKind, FieldSpec, Record, RecordSchema, RequestSchema, SchemaError};

/// Argument of the login call.
pub struct Login;

impl RecordSchema for Login {
    const NAME: &'static str = "Login";

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("login", FieldKind::String),
            FieldSpec::required("pass", FieldKind::String),
        ];
        FIELDS
    }
}

impl RequestSchema for Login {
    const API_METHOD: &'static str = "Actindo.Modules.Actindo.UserManager.Login.login";
    type Response = LoginResponse;
}

impl Record<Login> {
    pub fn set_login(&mut self, login: impl Into<String>) -> &mut Self {
        self.put("login", Value::String(login.into()))
    }

    pub fn set_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.put("pass", Value::String(pass.into()))
    }

    pub fn login(&self) -> Option<&str> {
        self.field_str("login")
    }
}

pub struct LoginResponse;

impl RecordSchema for LoginResponse {
    const NAME: &'static str = "LoginResponse";

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::required("sessionId", FieldKind::String)];
        FIELDS
    }
}

impl Record<LoginResponse> {
    pub fn session_id(&self) -> Option<&str> {
        self.field_str("sessionId")
    }
}

/// Argument of the attribute set listing.
pub struct ListAttributeSets;

impl RecordSchema for ListAttributeSets {
    const NAME: &'static str = "ListAttributeSets";

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::optional("filter", FieldKind::Array),
            FieldSpec::optional("start", FieldKind::Integer),
            FieldSpec::optional("limit", FieldKind::Integer),
            FieldSpec::optional("sort", FieldKind::Array),
        ];
        FIELDS
    }
}

impl RequestSchema for ListAttributeSets {
    const API_METHOD: &'static str = "Actindo.Modules.Actindo.DataHub.AttributeSets.get";
    type Response = ListAttributeSetsResponse;
}

pub struct ListAttributeSetsResponse;

impl RecordSchema for ListAttributeSetsResponse {
    const NAME: &'static str = "ListAttributeSetsResponse";

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("data", FieldKind::Array),
            FieldSpec::optional("success", FieldKind::Boolean),
            FieldSpec::optional("total", FieldKind::Integer),
        ];
        FIELDS
    }
}

impl Record<ListAttributeSetsResponse> {
    /// Imports every entry of `data` as an attribute set.
    pub fn data(&self) -> Result<Vec<Record<AttributeSet>>, SchemaError> {
        match self.field_value("data") {
            Some(Value::Array(entries)) => entries.iter().cloned().map(Record::import).collect(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn success(&self) -> Option<bool> {
        self.field_bool("success")
    }

    pub fn total(&self) -> Option<i64> {
        self.field_i64("total")
    }
}

/// One condition of a listing filter.
pub struct Filter;

impl RecordSchema for Filter {
    const NAME: &'static str = "Filter";

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("property", FieldKind::String),
            FieldSpec::required("operator", FieldKind::String),
            FieldSpec::optional("value", FieldKind::Any),
        ];
        FIELDS
    }
}

impl Record<Filter> {
    pub fn set_property(&mut self, property: impl Into<String>) -> &mut Self {
        self.put("property", Value::String(property.into()))
    }

    pub fn set_operator(&mut self, operator: impl Into<String>) -> &mut Self {
        self.put("operator", Value::String(operator.into()))
    }

    pub fn set_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.put("value", value.into())
    }
}

pub struct AttributeSet;

impl RecordSchema for AttributeSet {
    const NAME: &'static str = "AttributeSet";

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("id", FieldKind::Integer),
            FieldSpec::optional("key", FieldKind::String),
            FieldSpec::optional("name", FieldKind::String),
        ];
        FIELDS
    }
}

impl Record<AttributeSet> {
    pub fn id(&self) -> Option<i64> {
        self.field_i64("id")
    }

    pub fn key(&self) -> Option<&str> {
        self.field_str("key")
    }

    pub fn name(&self) -> Option<&str> {
        self.field_str("name")
    }
}
