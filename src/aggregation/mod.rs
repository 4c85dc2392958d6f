//! Grade aggregation.
//!
//! Joins section statistics to letter-grade distributions, then folds the
//! joined sections into enrollment-weighted per-course and per-instructor
//! records. The batch driver in [`runner`] walks campus and term directories
//! and writes both views as JSON.

pub mod course;
pub mod instructor;
pub mod join;
pub mod runner;
pub mod types;
pub mod utility;

#[cfg(test)]
pub(crate) mod test_support;

use tracing::debug;

use crate::classify::CreditRules;
use crate::grades::LetterGradeMap;
use crate::loader::TermInput;
use crate::subjects::SubjectDirectory;
use course::aggregate_courses;
use instructor::aggregate_instructors;
use join::{DistributionIndex, DuplicatePolicy, join_sections};
use types::TermAggregates;

/// Read-only tables shared by every term of one campus.
#[derive(Debug, Clone, Copy)]
pub struct AggregationContext<'a> {
    pub subjects: &'a SubjectDirectory,
    pub letters: &'a LetterGradeMap,
    /// Present only for campuses that publish the honorary science credit annotation.
    pub credit_rules: Option<&'a CreditRules>,
    pub duplicate_policy: DuplicatePolicy,
}

/// Aggregates one (campus, term) unit into both published views.
pub fn aggregate_term(ctx: &AggregationContext<'_>, input: &TermInput) -> TermAggregates {
    let index = DistributionIndex::new(&input.distribution, ctx.duplicate_policy);
    let joined = join_sections(&input.sections, &index, ctx.letters);
    let unmatched_sections = joined.iter().filter(|j| !j.matched).count();

    debug!(
        sections = joined.len(),
        unmatched_sections,
        duplicate_keys = index.duplicates(),
        "Sections joined"
    );

    TermAggregates {
        courses: aggregate_courses(&joined, ctx.subjects, ctx.credit_rules),
        instructors: aggregate_instructors(&joined, ctx.subjects),
        unmatched_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{directory, section};
    use super::*;
    use crate::grades::BucketCounts;
    use crate::loader::InputFormat;
    use crate::records::GradeDistributionRecord;
    use std::collections::BTreeMap;

    fn distribution(
        code: &str,
        section: &str,
        title: &str,
        counts: &[(&str, u64)],
    ) -> GradeDistributionRecord {
        GradeDistributionRecord {
            course_code: code.to_string(),
            section: section.to_string(),
            title: title.to_string(),
            letter_counts: counts
                .iter()
                .map(|(letter, n)| (letter.to_string(), *n))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn input() -> TermInput {
        TermInput {
            format: InputFormat::Export,
            sections: vec![
                section("CPSC 110", "101", 100, 75.0, &["Kiczales"]),
                section("CPSC 110", "102", 50, 80.0, &["Kiczales", "Lee"]),
                section("PSYC 460", "001", 30, 82.0, &["Lee"]),
            ],
            distribution: vec![
                distribution(
                    "CPSC 110",
                    "101",
                    "CPSC 110 title",
                    &[("A+", 20), ("B", 60), ("F", 20)],
                ),
                distribution(
                    "CPSC 110",
                    "102",
                    "CPSC 110 title",
                    &[("A", 25), ("C-", 25), ("W", 3)],
                ),
            ],
        }
    }

    #[test]
    fn test_aggregate_term_end_to_end() {
        let subjects = directory();
        let letters = LetterGradeMap::default();
        let rules = CreditRules::default();
        let ctx = AggregationContext {
            subjects: &subjects,
            letters: &letters,
            credit_rules: Some(&rules),
            duplicate_policy: DuplicatePolicy::First,
        };

        let result = aggregate_term(&ctx, &input());

        assert_eq!(result.unmatched_sections, 1);
        assert_eq!(result.courses.len(), 2);
        let cpsc = &result.courses[0];
        assert_eq!(cpsc.average, 76.67);
        assert_eq!(cpsc.buckets.total(), 150);
        assert_eq!(cpsc.buckets.get("85-89"), Some(25));
        assert_eq!(result.courses[1].buckets.total(), 0);
        assert_eq!(
            result.courses[1].faculty,
            "Faculty of Arts (Honorary Science Credit)"
        );

        let names: Vec<_> = result.instructors.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Kiczales", "Lee"]);
        let lee = &result.instructors[1];
        assert_eq!(lee.total_students, 80);
        assert_eq!(lee.number_of_courses, 2);
        assert_eq!(lee.overall_average, 80.75);
    }

    #[test]
    fn test_aggregate_term_with_inline_buckets() {
        let subjects = directory();
        let letters = LetterGradeMap::default();
        let ctx = AggregationContext {
            subjects: &subjects,
            letters: &letters,
            credit_rules: None,
            duplicate_policy: DuplicatePolicy::First,
        };
        let mut sections = vec![
            section("PSYC 460", "001", 40, 72.0, &["Doe"]),
            section("PSYC 460", "002", 20, 78.0, &["Doe"]),
        ];
        for (record, top) in sections.iter_mut().zip([4, 2]) {
            let mut buckets = BucketCounts::default();
            buckets.0[10] = top;
            record.buckets = Some(buckets);
        }
        let input = TermInput {
            format: InputFormat::Legacy,
            sections,
            distribution: vec![],
        };

        let result = aggregate_term(&ctx, &input);
        assert_eq!(result.unmatched_sections, 0);
        assert_eq!(result.courses.len(), 1);
        assert_eq!(result.courses[0].average, 74.0);
        assert_eq!(result.courses[0].buckets.get("90-100"), Some(6));
        assert_eq!(result.instructors[0].courses[0].section, "001, 002");
    }

    #[test]
    fn test_aggregate_term_is_deterministic() {
        let subjects = directory();
        let letters = LetterGradeMap::default();
        let ctx = AggregationContext {
            subjects: &subjects,
            letters: &letters,
            credit_rules: None,
            duplicate_policy: DuplicatePolicy::First,
        };
        let input = input();

        let first = aggregate_term(&ctx, &input);
        let second = aggregate_term(&ctx, &input);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.instructors).unwrap(),
            serde_json::to_string(&second.instructors).unwrap()
        );
    }
}
