//! JSON shapes exchanged with the REST record store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::grading::types::{GradeRecord, GradeUpdate, NewGrade};
use crate::services::record_store::{FieldFailure, RecordFilter};

/// Fields requested for every grade read.
pub const GRADE_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "course_id_c",
    "category_c",
    "score_c",
    "weight_c",
    "date_c",
    "title_c",
];

#[derive(Debug, Serialize)]
struct FieldName {
    #[serde(rename = "Name")]
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct FieldSpec {
    field: FieldName,
}

#[derive(Debug, Serialize)]
struct WhereClause {
    #[serde(rename = "FieldName")]
    field_name: &'static str,
    #[serde(rename = "Operator")]
    operator: &'static str,
    #[serde(rename = "Values")]
    values: Vec<i64>,
}

/// Body of a list query.
#[derive(Debug, Serialize)]
pub struct FetchParams {
    fields: Vec<FieldSpec>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<WhereClause>,
}

impl FetchParams {
    pub fn for_filter(filter: RecordFilter) -> Self {
        let fields = GRADE_FIELDS
            .iter()
            .map(|&name| FieldSpec {
                field: FieldName { name },
            })
            .collect();

        let conditions = match filter {
            RecordFilter::All => Vec::new(),
            RecordFilter::Course(course_id) => vec![WhereClause {
                field_name: "course_id_c",
                operator: "EqualTo",
                values: vec![course_id],
            }],
        };

        Self { fields, conditions }
    }
}

/// A grade as written to the store. Unset fields are omitted.
#[derive(Debug, Default, Serialize)]
pub struct GradeFields {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id_c: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_c: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_c: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_c: Option<String>,
}

impl From<NewGrade> for GradeFields {
    fn from(grade: NewGrade) -> Self {
        Self {
            id: None,
            course_id_c: Some(grade.course_id),
            category_c: Some(grade.category),
            score_c: Some(grade.score),
            weight_c: Some(grade.weight),
            date_c: grade.date,
            title_c: Some(grade.title),
        }
    }
}

impl GradeFields {
    pub fn for_update(id: i64, update: GradeUpdate) -> Self {
        Self {
            id: Some(id),
            course_id_c: update.course_id,
            category_c: update.category,
            score_c: update.score,
            weight_c: update.weight,
            date_c: update.date,
            title_c: update.title,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordsBody {
    pub records: Vec<GradeFields>,
}

#[derive(Debug, Serialize)]
pub struct DeleteBody {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

/// A grade as read from the store.
///
/// Null numeric fields read as `0` and a null category as an empty string.
#[derive(Debug, Deserialize)]
pub struct WireGrade {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_id_c: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category_c: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score_c: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight_c: f64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date_c: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title_c: Option<String>,
}

impl From<WireGrade> for GradeRecord {
    fn from(w: WireGrade) -> Self {
        GradeRecord {
            id: w.id,
            course_id: w.course_id_c,
            category: w.category_c,
            score: w.score_c,
            weight: w.weight_c,
            title: w.title_c.or(w.name).unwrap_or_default(),
            date: w.date_c,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Offset-less timestamp layouts, read as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Accepts RFC 3339 timestamps, offset-less timestamps (as UTC) and bare
/// `YYYY-MM-DD` dates. Anything else reads as `None`.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = parse_date(&raw);
    if parsed.is_none() {
        warn!(date = %raw, "Unrecognized grade date, ignoring it");
    }
    Ok(parsed)
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(ts) = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Deserialize)]
pub struct WireFieldError {
    #[serde(rename = "fieldLabel", default)]
    pub field_label: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<WireFieldError> for FieldFailure {
    fn from(e: WireFieldError) -> Self {
        FieldFailure {
            field: e.field_label.unwrap_or_else(|| "record".to_string()),
            message: e.message.unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}

/// Per-record outcome of a bulk create/update/delete.
#[derive(Debug, Deserialize)]
pub struct RecordResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<WireFieldError>>,
}

/// Response envelope shared by every endpoint.
///
/// Missing `Option` fields read as `None`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
    pub results: Option<Vec<RecordResult<T>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_course_filter_adds_where_clause() {
        let body = serde_json::to_value(FetchParams::for_filter(RecordFilter::Course(12))).unwrap();
        assert_eq!(
            body["where"],
            json!([{"FieldName": "course_id_c", "Operator": "EqualTo", "Values": [12]}])
        );
        assert_eq!(body["fields"][0], json!({"field": {"Name": "Name"}}));
        assert_eq!(body["fields"].as_array().unwrap().len(), GRADE_FIELDS.len());
    }

    #[test]
    fn test_all_filter_omits_where() {
        let body = serde_json::to_value(FetchParams::for_filter(RecordFilter::All)).unwrap();
        assert!(body.get("where").is_none());
    }

    #[test]
    fn test_update_sends_only_set_fields() {
        let update = GradeUpdate {
            score: Some(91.5),
            ..Default::default()
        };
        let body = serde_json::to_value(GradeFields::for_update(3, update)).unwrap();
        assert_eq!(body, json!({"Id": 3, "score_c": 91.5}));
    }

    #[test]
    fn test_wire_grade_tolerates_nulls_and_plain_dates() {
        let w: WireGrade = serde_json::from_value(json!({
            "Id": 5,
            "Name": "Midterm",
            "course_id_c": 2,
            "category_c": "Exam",
            "score_c": null,
            "date_c": "2024-03-01",
        }))
        .unwrap();
        let record = GradeRecord::from(w);

        assert_eq!(record.id, 5);
        assert_eq!(record.score, 0.0);
        assert_eq!(record.weight, 0.0);
        assert_eq!(record.title, "Midterm");
        assert_eq!(
            record.date.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_wire_grade_reads_offsetless_timestamp_as_utc() {
        let w: WireGrade =
            serde_json::from_value(json!({"Id": 1, "date_c": "2024-03-01T10:00:00"})).unwrap();
        assert_eq!(
            w.date_c.unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_wire_grade_ignores_garbage_date() {
        let w: WireGrade =
            serde_json::from_value(json!({"Id": 1, "score_c": 70, "date_c": "last tuesday"}))
                .unwrap();
        assert_eq!(w.id, 1);
        assert_eq!(w.score_c, 70.0);
        assert!(w.date_c.is_none());
    }

    #[test]
    fn test_odd_dates_do_not_drop_the_course_list() {
        let envelope: Envelope<Vec<WireGrade>> = serde_json::from_value(json!({
            "success": true,
            "data": [
                {"Id": 1, "course_id_c": 4, "category_c": "Homework", "score_c": 90, "date_c": "2024-03-01T10:00:00"},
                {"Id": 2, "course_id_c": 4, "category_c": "Homework", "score_c": 80, "date_c": "03/02/2024"},
            ],
        }))
        .unwrap();
        let records: Vec<GradeRecord> = envelope
            .data
            .unwrap()
            .into_iter()
            .map(GradeRecord::from)
            .collect();

        assert_eq!(records.len(), 2);
        assert!(records[0].date.is_some());
        assert!(records[1].date.is_none());
        let categories = [crate::grading::types::CategoryWeight::new("Homework", 100.0)];
        assert_eq!(crate::grading::aggregate::course_grade(&records, &categories), 85);
    }
}
