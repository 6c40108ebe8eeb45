use crate::grading::grade::letter_grade;
use crate::grading::types::{CategoryBreakdown, CategoryWeight, CourseGradeReport, GradeRecord};
use crate::grading::utility::mean;
use chrono::Utc;
use tracing::debug;

/// A category with at least one matching record.
struct Contribution<'a> {
    category: &'a CategoryWeight,
    count: usize,
    mean: f64,
}

fn contributions<'a>(
    records: &[GradeRecord],
    categories: &'a [CategoryWeight],
) -> (Vec<Contribution<'a>>, Vec<String>) {
    let mut matched = Vec::new();
    let mut skipped = Vec::new();

    for category in categories {
        // Byte-exact match: no case folding, no trimming.
        let scores: Vec<f64> = records
            .iter()
            .filter(|r| r.category == category.name)
            .map(|r| r.score)
            .collect();

        if scores.is_empty() {
            debug!(category = %category.name, "No grades in category, skipping");
            skipped.push(category.name.clone());
            continue;
        }

        matched.push(Contribution {
            category,
            count: scores.len(),
            mean: mean(&scores),
        });
    }

    (matched, skipped)
}

/// Returns `(weighted_score, matched_weight)` where the weight is a fraction of 100.
///
/// Contributions are summed in (name, weight) order so the floating point result
/// does not depend on the order categories were supplied in.
fn weighted_score(matched: &[Contribution<'_>]) -> (f64, f64) {
    let mut ordered: Vec<&Contribution<'_>> = matched.iter().collect();
    ordered.sort_by(|a, b| {
        a.category
            .name
            .cmp(&b.category.name)
            .then(a.category.weight.total_cmp(&b.category.weight))
            .then(a.mean.total_cmp(&b.mean))
    });

    let mut weighted_total = 0.0;
    let mut weight_sum = 0.0;
    for c in ordered {
        let weight = c.category.weight / 100.0;
        weighted_total += c.mean * weight;
        weight_sum += weight;
    }

    if weight_sum > 0.0 {
        (weighted_total / weight_sum, weight_sum)
    } else {
        (0.0, weight_sum)
    }
}

/// Computes the weighted course grade for one course's records.
///
/// Each category contributes the mean of its matching records' scores, weighted
/// by the category weight. Categories without records are left out of both the
/// weighted sum and the weight total, so the result is normalized by the weights
/// actually matched. Rounds once, at the end. Returns `0` when there are no
/// records, no categories, or nothing matches.
pub fn course_grade(records: &[GradeRecord], categories: &[CategoryWeight]) -> i64 {
    if records.is_empty() {
        return 0;
    }

    let (matched, _) = contributions(records, categories);
    let (score, _) = weighted_score(&matched);
    score.round() as i64
}

/// Same computation as [`course_grade`], keeping the per-category detail.
pub fn course_breakdown(
    course_id: i64,
    records: &[GradeRecord],
    categories: &[CategoryWeight],
) -> CourseGradeReport {
    let (matched, skipped) = if records.is_empty() {
        (Vec::new(), categories.iter().map(|c| c.name.clone()).collect())
    } else {
        contributions(records, categories)
    };
    let (score, matched_weight) = weighted_score(&matched);
    let grade = score.round() as i64;

    CourseGradeReport {
        course_id,
        generated_at: Utc::now(),
        record_count: records.len(),
        categories: matched
            .iter()
            .map(|c| CategoryBreakdown {
                name: c.category.name.clone(),
                weight: c.category.weight,
                count: c.count,
                mean_score: c.mean,
                grade: letter_grade(c.mean),
            })
            .collect(),
        skipped,
        matched_weight,
        score,
        grade,
        letter: letter_grade(grade as f64),
    }
}
