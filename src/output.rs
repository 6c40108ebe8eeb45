//! Output formatting and persistence for grades and course reports.
//!
//! Supports JSON logging and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::grading::types::GradeRecord;
use csv::WriterBuilder;
use std::fs::OpenOptions;

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends grade records as rows to a CSV file.
///
/// Writes the header row only when the file is missing or empty.
pub fn append_records(path: &str, records: &[GradeRecord]) -> Result<()> {
    let has_rows = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    debug!(path, has_rows, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_rows)
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::Path;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn record(id: i64) -> GradeRecord {
        GradeRecord {
            id,
            course_id: 1,
            category: "Homework".to_string(),
            score: 92.5,
            weight: 10.0,
            title: "Problem set".to_string(),
            date: None,
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&record(1)).unwrap();
    }

    #[test]
    fn test_append_records_creates_file() {
        let path = temp_path("course_grader_test_create.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &[record(1)]).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Problem set"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("course_grader_test_header.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &[record(1), record(2)]).unwrap();
        append_records(&path, &[record(3)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "id,course_id,category,score,weight,title,date");
        assert_eq!(lines.iter().filter(|l| l.starts_with("id,")).count(), 1);
        assert_eq!(lines.len(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_nothing_to_new_file() {
        let path = temp_path("course_grader_test_empty.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        append_records(&path, &[record(1)]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("id,"));

        fs::remove_file(&path).unwrap();
    }
}
