//! Records published by the aggregation pipeline.

use serde::Serialize;

use crate::grades::BucketCounts;

/// One course, all sections combined. Published in the course view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CourseAggregate {
    /// Subject display title; blank when the subject is not in the directory.
    pub subject: String,
    pub code: String,
    pub name: String,
    pub faculty: String,
    pub average: f64,
    pub reported: u64,
    pub weighted_median: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub high: f64,
    pub low: f64,
    #[serde(flatten)]
    pub buckets: BucketCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub professors: Vec<String>,
}

/// One instructor's sections of a single course, combined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedCourse {
    /// Distinct section labels, sorted and joined with `", "`.
    pub section: String,
    pub reported: u64,
    pub title: String,
    pub average: f64,
    pub median: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub high: f64,
    pub low: f64,
    #[serde(flatten)]
    pub buckets: BucketCounts,
    pub code: String,
    pub subject: String,
}

/// Everything one instructor taught in a term. Published in the instructor view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorAggregate {
    pub name: String,
    pub faculties: Vec<String>,
    /// Sorted by course code.
    pub courses: Vec<CombinedCourse>,
    pub total_students: u64,
    pub overall_average: f64,
    pub number_of_courses: usize,
}

/// Both views of one (campus, term) unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermAggregates {
    pub courses: Vec<CourseAggregate>,
    pub instructors: Vec<InstructorAggregate>,
    /// Sections that found no distribution row.
    pub unmatched_sections: usize,
}
