use chrono::Utc;
use tracing::{error, info, warn};

use crate::grading::aggregate::{course_breakdown, course_grade};
use crate::grading::types::{CategoryWeight, CourseGradeReport, GradeRecord, GradeUpdate, NewGrade};
use crate::services::record_store::{RecordFilter, RecordStore, StoreError};

/// Grade operations over a record store that is built once and reused.
///
/// The plain operations never fail: store errors are logged and replaced by an
/// empty value (`[]`, `None`, `false` or `0`). Use [`Gradebook::try_calculate_course_grade`]
/// or [`Gradebook::course_report`] to tell an ungraded course from an unreachable store.
pub struct Gradebook<S> {
    store: S,
}

impl<S: RecordStore> Gradebook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Vec<GradeRecord> {
        self.store
            .list(RecordFilter::All)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Error fetching grades");
                Vec::new()
            })
    }

    pub async fn get_by_id(&self, id: i64) -> Option<GradeRecord> {
        self.store.get_by_id(id).await.unwrap_or_else(|e| {
            error!(id, error = %e, "Error fetching grade");
            None
        })
    }

    pub async fn get_by_course_id(&self, course_id: i64) -> Vec<GradeRecord> {
        self.store
            .list(RecordFilter::Course(course_id))
            .await
            .unwrap_or_else(|e| {
                error!(course_id, error = %e, "Error fetching grades by course");
                Vec::new()
            })
    }

    /// Creates a grade, stamping it with the current time when no date is given.
    pub async fn create(&self, mut grade: NewGrade) -> Option<GradeRecord> {
        if grade.date.is_none() {
            grade.date = Some(Utc::now());
        }
        match self.store.create(grade).await {
            Ok(Some(record)) => {
                info!(id = record.id, course_id = record.course_id, "Grade created");
                Some(record)
            }
            Ok(None) => {
                warn!("Record store returned no created grade");
                None
            }
            Err(e) => {
                error!(error = %e, "Error creating grade");
                None
            }
        }
    }

    pub async fn update(&self, id: i64, update: GradeUpdate) -> Option<GradeRecord> {
        self.store.update(id, update).await.unwrap_or_else(|e| {
            error!(id, error = %e, "Error updating grade");
            None
        })
    }

    pub async fn delete(&self, id: i64) -> bool {
        self.store.delete(id).await.unwrap_or_else(|e| {
            error!(id, error = %e, "Error deleting grade");
            false
        })
    }

    /// Weighted course grade; `0` when the course has no grades or the store
    /// could not be reached.
    pub async fn calculate_course_grade(&self, course_id: i64, categories: &[CategoryWeight]) -> i64 {
        let records = self.get_by_course_id(course_id).await;
        course_grade(&records, categories)
    }

    /// Weighted course grade, propagating store failures.
    pub async fn try_calculate_course_grade(
        &self,
        course_id: i64,
        categories: &[CategoryWeight],
    ) -> Result<i64, StoreError> {
        let records = self.store.list(RecordFilter::Course(course_id)).await?;
        Ok(course_grade(&records, categories))
    }

    /// Per-category breakdown of the course grade, propagating store failures.
    pub async fn course_report(
        &self,
        course_id: i64,
        categories: &[CategoryWeight],
    ) -> Result<CourseGradeReport, StoreError> {
        let records = self.store.list(RecordFilter::Course(course_id)).await?;
        Ok(course_breakdown(course_id, &records, categories))
    }
}
