//! In-process [`RecordStore`] used by tests and the CLI's fixture mode.

use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::grading::types::{GradeRecord, GradeUpdate, NewGrade};
use crate::services::record_store::{RecordFilter, RecordStore, StoreError};

struct Table {
    /// `None` once every id up to `i64::MAX` is taken.
    next_id: Option<i64>,
    records: Vec<GradeRecord>,
}

/// Keeps records in insertion order and assigns ids sequentially.
pub struct MemoryRecordStore {
    table: Mutex<Table>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seeds the store. New ids continue after the largest seeded id.
    pub fn with_records(records: Vec<GradeRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0).checked_add(1);
        Self {
            table: Mutex::new(Table { next_id, records }),
        }
    }

    /// Loads a JSON array of grade records from `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading fixture '{path}'"))?;
        let records: Vec<GradeRecord> = serde_json::from_str(&content)
            .with_context(|| format!("parsing fixture '{path}'"))?;
        Ok(Self::with_records(records))
    }

    fn table(&self) -> std::sync::MutexGuard<'_, Table> {
        // A panic while holding the lock cannot leave a half-written record.
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, filter: RecordFilter) -> Result<Vec<GradeRecord>, StoreError> {
        Ok(self
            .table()
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GradeRecord>, StoreError> {
        Ok(self.table().records.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, grade: NewGrade) -> Result<Option<GradeRecord>, StoreError> {
        let mut table = self.table();
        let Some(id) = table.next_id else {
            return Err(StoreError::Rejected("no record ids left".to_string()));
        };
        let record = GradeRecord {
            id,
            course_id: grade.course_id,
            category: grade.category,
            score: grade.score,
            weight: grade.weight,
            title: grade.title,
            date: grade.date,
        };
        table.next_id = id.checked_add(1);
        table.records.push(record.clone());
        Ok(Some(record))
    }

    async fn update(
        &self,
        id: i64,
        update: GradeUpdate,
    ) -> Result<Option<GradeRecord>, StoreError> {
        let mut table = self.table();
        Ok(table.records.iter_mut().find(|r| r.id == id).map(|r| {
            update.apply_to(r);
            r.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut table = self.table();
        let before = table.records.len();
        table.records.retain(|r| r.id != id);
        Ok(table.records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_grade(course_id: i64, category: &str, score: f64) -> NewGrade {
        NewGrade {
            course_id,
            category: category.to_string(),
            score,
            weight: 0.0,
            title: String::new(),
            date: None,
        }
    }

    fn store_record(id: i64) -> GradeRecord {
        GradeRecord {
            id,
            course_id: 1,
            category: "Exam".to_string(),
            score: 70.0,
            weight: 0.0,
            title: String::new(),
            date: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryRecordStore::new();
        let a = store.create(new_grade(1, "Exam", 70.0)).await.unwrap().unwrap();
        let b = store.create(new_grade(1, "Exam", 80.0)).await.unwrap().unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn test_seeded_ids_are_not_reused() {
        let store = MemoryRecordStore::new();
        store.create(new_grade(1, "Exam", 70.0)).await.unwrap();
        let seeded = store.list(RecordFilter::All).await.unwrap();

        let store = MemoryRecordStore::with_records(seeded);
        let next = store.create(new_grade(1, "Quiz", 90.0)).await.unwrap().unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_largest_possible_seeded_id() {
        let mut seeded = store_record(i64::MAX);
        seeded.course_id = 3;
        let store = MemoryRecordStore::with_records(vec![seeded]);

        assert_eq!(store.list(RecordFilter::Course(3)).await.unwrap().len(), 1);
        assert!(matches!(
            store.create(new_grade(3, "Exam", 70.0)).await,
            Err(StoreError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_course_in_insertion_order() {
        let store = MemoryRecordStore::new();
        store.create(new_grade(1, "Homework", 80.0)).await.unwrap();
        store.create(new_grade(2, "Homework", 50.0)).await.unwrap();
        store.create(new_grade(1, "Exam", 70.0)).await.unwrap();

        let course = store.list(RecordFilter::Course(1)).await.unwrap();
        let categories: Vec<_> = course.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Homework", "Exam"]);
        assert_eq!(store.list(RecordFilter::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_record() {
        let store = MemoryRecordStore::new();
        let update = GradeUpdate {
            score: Some(1.0),
            ..Default::default()
        };
        assert!(store.update(42, update).await.unwrap().is_none());
        assert!(!store.delete(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let store = MemoryRecordStore::new();
        let created = store.create(new_grade(1, "Exam", 70.0)).await.unwrap().unwrap();

        let update = GradeUpdate {
            score: Some(75.0),
            ..Default::default()
        };
        let updated = store.update(created.id, update).await.unwrap().unwrap();
        assert_eq!(updated.score, 75.0);
        assert_eq!(store.get_by_id(created.id).await.unwrap().unwrap().score, 75.0);

        assert!(store.delete(created.id).await.unwrap());
        assert!(store.get_by_id(created.id).await.unwrap().is_none());
    }
}
