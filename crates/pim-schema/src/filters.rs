use serde_json::Value;

use crate::{Filter, Record, RecordSchema, SchemaError};

#[derive(Debug, Clone, Default, PartialEq)]
/// Conditions for a listing call, written to the `filter` field.
pub struct Filters {
    filters: Vec<Record<Filter>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `property = value` condition.
    pub fn equals(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut filter = Record::<Filter>::new();
        filter
            .set_property(property)
            .set_operator("=")
            .set_value(value);
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn to_value(&self) -> Result<Value, SchemaError> {
        self.filters
            .iter()
            .map(Record::to_primitive)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    pub fn apply<S: RecordSchema>(&self, record: &mut Record<S>) -> Result<(), SchemaError> {
        record.set("filter", self.to_value()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Filters;
    use crate::{Login, Record, SchemaError};

    #[test]
    fn unit_equals_builds_ordered_conditions() {
        let filters = Filters::new().equals("key", "pim_base_set").equals("id", 3);
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters.to_value().expect("filters"),
            json!([
                {"property": "key", "operator": "=", "value": "pim_base_set"},
                {"property": "id", "operator": "=", "value": 3}
            ])
        );
    }

    #[test]
    fn regression_filters_refuse_schemas_without_filter_field() {
        let mut login = Record::<Login>::new();
        let error = Filters::new()
            .equals("key", "x")
            .apply(&mut login)
            .expect_err("login has no filter");
        assert!(matches!(error, SchemaError::InvalidProperty { .. }));
    }
}
