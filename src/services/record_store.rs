//! Trait and error types for the remote grade record store.

use thiserror::Error;

use crate::grading::types::{GradeRecord, GradeUpdate, NewGrade};

/// Which records a [`RecordStore::list`] call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    Course(i64),
}

impl RecordFilter {
    pub fn matches(&self, record: &GradeRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Course(course_id) => record.course_id == *course_id,
        }
    }
}

/// A single field-level failure reported by the store for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

/// Failures talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("record store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("record store rejected the request: {0}")]
    Rejected(String),

    #[error("{count} record(s) failed: {}", summarize(.failures))]
    RecordFailures {
        count: usize,
        failures: Vec<FieldFailure>,
    },

    #[error("failed to decode record store response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode record store request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid record store url: {0}")]
    InvalidUrl(String),
}

fn summarize(failures: &[FieldFailure]) -> String {
    if failures.is_empty() {
        return "no details".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Durable storage for grade records.
///
/// `get_by_id`, `create` and `update` return `Ok(None)` when the store
/// answered but produced no record; `delete` returns whether a record was removed.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, filter: RecordFilter) -> Result<Vec<GradeRecord>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<GradeRecord>, StoreError>;

    async fn create(&self, grade: NewGrade) -> Result<Option<GradeRecord>, StoreError>;

    async fn update(&self, id: i64, update: GradeUpdate)
    -> Result<Option<GradeRecord>, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    async fn list(&self, filter: RecordFilter) -> Result<Vec<GradeRecord>, StoreError> {
        (**self).list(filter).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GradeRecord>, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn create(&self, grade: NewGrade) -> Result<Option<GradeRecord>, StoreError> {
        (**self).create(grade).await
    }

    async fn update(
        &self,
        id: i64,
        update: GradeUpdate,
    ) -> Result<Option<GradeRecord>, StoreError> {
        (**self).update(id, update).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}
