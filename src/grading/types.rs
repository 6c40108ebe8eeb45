//! Data types shared by the gradebook, the record stores and the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored score within a weighted category for one course.
///
/// `id` is assigned by the record store on creation. The per-record `weight`
/// is carried through but never used by aggregation; category weights come
/// from [`CategoryWeight`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub id: i64,
    pub course_id: i64,
    pub category: String,
    pub score: f64,
    pub weight: f64,
    pub title: String,
    pub date: Option<DateTime<Utc>>,
}

/// Fields for a record that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGrade {
    pub course_id: i64,
    pub category: String,
    pub score: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Partial update; `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeUpdate {
    pub course_id: Option<i64>,
    pub category: Option<String>,
    pub score: Option<f64>,
    pub weight: Option<f64>,
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl GradeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == GradeUpdate::default()
    }

    /// Applies every set field onto `record`.
    pub fn apply_to(&self, record: &mut GradeRecord) {
        if let Some(course_id) = self.course_id {
            record.course_id = course_id;
        }
        if let Some(category) = &self.category {
            record.category = category.clone();
        }
        if let Some(score) = self.score {
            record.score = score;
        }
        if let Some(weight) = self.weight {
            record.weight = weight;
        }
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(date) = self.date {
            record.date = Some(date);
        }
    }
}

/// A named grading bucket and its weight in percentage points (20 means 20%).
///
/// Weights for a course do not have to add up to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub name: String,
    pub weight: f64,
}

impl CategoryWeight {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Result for one category that had at least one matching record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub name: String,
    pub weight: f64,
    pub count: usize,
    pub mean_score: f64,
    pub grade: String,
}

/// Full course grade computation, with the categories that contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseGradeReport {
    pub course_id: i64,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub categories: Vec<CategoryBreakdown>,
    /// Names of supplied categories with no matching record.
    pub skipped: Vec<String>,
    /// Sum of matched category weights, as a fraction (0.3 for 30 points).
    pub matched_weight: f64,
    /// Weighted score before rounding.
    pub score: f64,
    pub grade: i64,
    pub letter: String,
}
