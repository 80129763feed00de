use crate::{Record, RecordSchema, SchemaError};

pub const DEFAULT_START: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Offset window for listing calls, written to `start` and `limit`.
pub struct Pagination {
    start: i64,
    limit: i64,
}

impl Pagination {
    pub fn new() -> Self {
        Self {
            start: DEFAULT_START,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_start(mut self, start: i64) -> Result<Self, SchemaError> {
        if start < 0 {
            return Err(SchemaError::InvalidPagination {
                field: "start",
                minimum: 0,
                value: start,
            });
        }
        self.start = start;
        Ok(self)
    }

    pub fn with_limit(mut self, limit: i64) -> Result<Self, SchemaError> {
        if limit < 1 {
            return Err(SchemaError::InvalidPagination {
                field: "limit",
                minimum: 1,
                value: limit,
            });
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn apply<S: RecordSchema>(&self, record: &mut Record<S>) -> Result<(), SchemaError> {
        record.set("start", self.start)?.set("limit", self.limit)?;
        Ok(())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}
