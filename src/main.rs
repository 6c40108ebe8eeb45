//! CLI entry point for the course grader.
//!
//! Reads and writes grade records in the hosted record store (or a local JSON
//! fixture) and computes weighted course grades from them.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use course_grader::config::{CategoryConfig, StoreConfig};
use course_grader::grading::Gradebook;
use course_grader::grading::types::{GradeUpdate, NewGrade};
use course_grader::infra::MemoryRecordStore;
use course_grader::output::{append_records, print_json};
use course_grader::services::record_store::RecordStore;
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "course_grader")]
#[command(about = "Manage course grades and compute weighted course grades", long_about = None)]
struct Cli {
    /// Use a JSON array of grade records instead of the remote store (changes are not saved)
    #[arg(long, global = true, value_name = "JSON")]
    fixture: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List grades, optionally for a single course
    List {
        #[arg(short, long)]
        course: Option<i64>,
    },
    /// Show a single grade
    Get { id: i64 },
    /// Record a new grade
    Add {
        #[arg(short, long)]
        course: i64,
        #[arg(long)]
        category: String,
        #[arg(short, long)]
        score: f64,
        #[arg(short, long, default_value_t = 0.0)]
        weight: f64,
        #[arg(short, long, default_value = "")]
        title: String,
        /// RFC 3339 timestamp; defaults to now
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// Change fields of an existing grade
    Update {
        id: i64,
        #[arg(long)]
        course: Option<i64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(short, long)]
        score: Option<f64>,
        #[arg(short, long)]
        weight: Option<f64>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// Delete a grade
    Delete { id: i64 },
    /// Compute the weighted grade for a course
    CourseGrade {
        #[arg(short, long)]
        course: i64,

        /// JSON file with the course's category weights
        #[arg(long, default_value = "categories.json")]
        categories: String,

        /// Fail instead of reporting 0 when grades cannot be fetched
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Print the per-category breakdown as JSON
        #[arg(long, default_value_t = false)]
        breakdown: bool,
    },
    /// Append a course's grades to a CSV file
    Export {
        #[arg(short, long)]
        course: i64,

        #[arg(short, long, default_value = "grades.csv")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/course_grader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("course_grader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info")?);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug")?);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let store: Box<dyn RecordStore> = match &cli.fixture {
        Some(path) => {
            info!(path = %path, "Using fixture record store");
            Box::new(MemoryRecordStore::load(path)?)
        }
        None => StoreConfig::from_env()?.connect()?,
    };
    let book = Gradebook::new(store);

    match cli.command {
        Commands::List { course } => {
            let grades = match course {
                Some(course_id) => book.get_by_course_id(course_id).await,
                None => book.get_all().await,
            };
            info!(total = grades.len(), "Grades fetched");
            print_json(&grades)?;
        }
        Commands::Get { id } => match book.get_by_id(id).await {
            Some(grade) => print_json(&grade)?,
            None => bail!("grade {id} not found"),
        },
        Commands::Add {
            course,
            category,
            score,
            weight,
            title,
            date,
        } => {
            let grade = NewGrade {
                course_id: course,
                category,
                score,
                weight,
                title,
                date,
            };
            match book.create(grade).await {
                Some(created) => print_json(&created)?,
                None => bail!("grade was not created"),
            }
        }
        Commands::Update {
            id,
            course,
            category,
            score,
            weight,
            title,
            date,
        } => {
            let update = GradeUpdate {
                course_id: course,
                category,
                score,
                weight,
                title,
                date,
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            match book.update(id, update).await {
                Some(updated) => print_json(&updated)?,
                None => bail!("grade {id} was not updated"),
            }
        }
        Commands::Delete { id } => {
            if !book.delete(id).await {
                bail!("grade {id} was not deleted");
            }
            info!(id, "Grade deleted");
        }
        Commands::CourseGrade {
            course,
            categories,
            strict,
            breakdown,
        } => {
            let config = CategoryConfig::load(&categories)?;
            let categories = config.categories();
            info!(
                categories = categories.len(),
                total_weight = config.total_weight(),
                "Loaded category weights"
            );
            if categories.is_empty() {
                warn!("No categories configured; the course grade will be 0");
            }

            if breakdown {
                let report = book
                    .course_report(course, categories)
                    .await
                    .with_context(|| format!("fetching grades for course {course}"))?;
                print_json(&report)?;
            } else if strict {
                let grade = book
                    .try_calculate_course_grade(course, categories)
                    .await
                    .with_context(|| format!("fetching grades for course {course}"))?;
                print_json(&GradeSummary { course_id: course, grade })?;
            } else {
                let grade = book.calculate_course_grade(course, categories).await;
                print_json(&GradeSummary { course_id: course, grade })?;
            }
        }
        Commands::Export { course, output } => {
            let grades = book.get_by_course_id(course).await;
            append_records(&output, &grades)?;
            info!(course_id = course, rows = grades.len(), output = %output, "Grades exported");
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct GradeSummary {
    course_id: i64,
    grade: i64,
}

/// Builds a filter from `var` with `default` added as a directive.
fn env_filter(var: &str, default: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::from_env(var).add_directive(
        default
            .parse()
            .with_context(|| format!("invalid default log directive '{default}'"))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_summary_is_printable_json() {
        let summary = GradeSummary {
            course_id: 4,
            grade: 85,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"course_id": 4, "grade": 85})
        );
        print_json(&summary).unwrap();
    }
}
