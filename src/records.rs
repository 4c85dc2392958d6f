//! Typed input rows.
//!
//! Raw cells are coerced exactly once, here, so the aggregation engine only
//! ever sees [`SectionRecord`] and [`GradeDistributionRecord`] values.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::grades::{BucketCounts, bucket_index};

/// A row of the section statistics table, as read from disk.
#[derive(Debug, Default, Deserialize)]
pub struct RawSectionRow {
    #[serde(rename = "Course", default)]
    pub course: String,
    #[serde(rename = "Course Title", default)]
    pub title: String,
    #[serde(rename = "Section", default)]
    pub section: String,
    #[serde(rename = "Grades Reported", default)]
    pub reported: String,
    #[serde(rename = "Mean", default)]
    pub mean: String,
    #[serde(rename = "Median", default)]
    pub median: String,
    #[serde(rename = "25%-tile", default)]
    pub percentile25: String,
    #[serde(rename = "75%-tile", default)]
    pub percentile75: String,
    #[serde(rename = "Max", default)]
    pub high: String,
    #[serde(rename = "Min", default)]
    pub low: String,
    #[serde(rename = "Instructor(s)", default)]
    pub instructors: String,
}

/// Per-section statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub subject_code: String,
    pub course_number: String,
    pub section: String,
    pub title: String,
    pub reported: u64,
    pub mean: f64,
    pub median: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub high: f64,
    pub low: f64,
    /// Distinct, sorted; never contains blanks or the `"0"` placeholder.
    pub instructors: Vec<String>,
    /// Bucket counts carried on the row itself, as in the legacy combined
    /// export. `None` means they come from the distribution join.
    pub buckets: Option<BucketCounts>,
}

impl SectionRecord {
    /// Coerces a raw row. Returns `None` when the row has no course.
    pub fn from_raw(raw: &RawSectionRow) -> Option<Self> {
        let (subject_code, course_number) = split_course(&raw.course)?;
        Some(Self {
            subject_code,
            course_number,
            section: raw.section.trim().to_string(),
            title: raw.title.trim().to_string(),
            reported: coerce_count(&raw.reported),
            mean: coerce_f64(&raw.mean),
            median: coerce_f64(&raw.median),
            percentile25: coerce_f64(&raw.percentile25),
            percentile75: coerce_f64(&raw.percentile75),
            high: coerce_f64(&raw.high),
            low: coerce_f64(&raw.low),
            instructors: parse_instructors(&raw.instructors),
            buckets: None,
        })
    }

    /// Builds a record from one row of the legacy combined export, which has
    /// separate `Subject` and `Course` columns and the bucket counts inline.
    /// Missing columns are 0. Returns `None` when the row has no subject.
    pub fn from_legacy_row<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        cells: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let mut record = Self {
            subject_code: String::new(),
            course_number: String::new(),
            section: String::new(),
            title: String::new(),
            reported: 0,
            mean: 0.0,
            median: 0.0,
            percentile25: 0.0,
            percentile75: 0.0,
            high: 0.0,
            low: 0.0,
            instructors: Vec::new(),
            buckets: None,
        };
        let mut buckets = BucketCounts::default();

        for (header, cell) in headers.into_iter().zip(cells) {
            let cell = cell.trim();
            match header.trim() {
                "Subject" => record.subject_code = cell.to_string(),
                "Course" => record.course_number = cell.to_string(),
                "Section" => record.section = cell.to_string(),
                "Title" => record.title = cell.to_string(),
                "Professor" => record.instructors = split_names(cell, &[';']),
                "Reported" => record.reported = coerce_count(cell),
                "Avg" => record.mean = coerce_f64(cell),
                "Median" => record.median = coerce_f64(cell),
                "Percentile (25)" => record.percentile25 = coerce_f64(cell),
                "Percentile (75)" => record.percentile75 = coerce_f64(cell),
                "High" => record.high = coerce_f64(cell),
                "Low" => record.low = coerce_f64(cell),
                other => {
                    if let Some(i) = bucket_index(other) {
                        buckets.0[i] = coerce_count(cell);
                    }
                }
            }
        }

        if record.subject_code.is_empty() {
            return None;
        }
        record.buckets = Some(buckets);
        Some(record)
    }

    /// Subject code and course number joined by a single space, e.g. `CPSC 110`.
    pub fn course_code(&self) -> String {
        compose_code(&self.subject_code, &self.course_number)
    }
}

/// Per-section letter-grade counts.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeDistributionRecord {
    pub course_code: String,
    pub section: String,
    pub title: String,
    /// Every non-key column, keyed by trimmed header. Unparseable cells are 0.
    pub letter_counts: BTreeMap<String, u64>,
}

impl GradeDistributionRecord {
    /// Builds a record from a header row and one data row. Returns `None` when
    /// the row has no course.
    pub fn from_row<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        cells: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let mut course = None;
        let mut section = String::new();
        let mut title = String::new();
        let mut letter_counts = BTreeMap::new();

        for (header, cell) in headers.into_iter().zip(cells) {
            match header.trim() {
                "Course" => course = split_course(cell).map(|(s, n)| compose_code(&s, &n)),
                "Section" => section = cell.trim().to_string(),
                "Course Title" => title = cell.trim().to_string(),
                "" => {}
                other => {
                    letter_counts.insert(other.to_string(), coerce_count(cell));
                }
            }
        }

        Some(Self {
            course_code: course?,
            section,
            title,
            letter_counts,
        })
    }

    pub fn counts(&self) -> impl Iterator<Item = (&str, u64)> {
        self.letter_counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Splits `"CPSC 110"` into `("CPSC", "110")`. A cell without a number gives an
/// empty course number; a blank cell gives `None`.
pub fn split_course(cell: &str) -> Option<(String, String)> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.split_once(char::is_whitespace) {
        Some((subject, number)) => Some((subject.to_string(), number.trim().to_string())),
        None => Some((cell.to_string(), String::new())),
    }
}

pub fn compose_code(subject: &str, number: &str) -> String {
    if number.is_empty() {
        subject.to_string()
    } else {
        format!("{subject} {number}")
    }
}

/// Splits an `Instructor(s)` cell on commas and semicolons.
pub fn parse_instructors(cell: &str) -> Vec<String> {
    split_names(cell, &[',', ';'])
}

/// Distinct, sorted names from a cell. Blanks and the `"0"` placeholder are dropped.
pub fn split_names(cell: &str, separators: &[char]) -> Vec<String> {
    let mut names: Vec<String> = cell
        .split(separators)
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "0")
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Parses a statistic cell; anything unparseable or non-finite is 0.
pub fn coerce_f64(cell: &str) -> f64 {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses a count cell. Accepts float spellings such as `"12.0"`; negatives and
/// garbage are 0.
pub fn coerce_count(cell: &str) -> u64 {
    let value = coerce_f64(cell);
    if value > 0.0 { value.trunc() as u64 } else { 0 }
}
