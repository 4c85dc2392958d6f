use std::collections::{BTreeSet, HashMap};

use crate::aggregation::join::JoinedSection;
use crate::aggregation::types::CourseAggregate;
use crate::aggregation::utility::WeightedStats;
use crate::classify::CreditRules;
use crate::subjects::SubjectDirectory;

struct CourseAccumulator<'a> {
    code: String,
    subject_code: &'a str,
    course_number: &'a str,
    title: &'a str,
    stats: WeightedStats,
    instructors: BTreeSet<&'a str>,
}

/// Combines every section of each course into a [`CourseAggregate`].
///
/// Courses come out in the order their first section appears. When
/// `credit_rules` is given, eligible courses get the honorary science credit
/// suffix on their faculty.
pub fn aggregate_courses(
    sections: &[JoinedSection<'_>],
    subjects: &SubjectDirectory,
    credit_rules: Option<&CreditRules>,
) -> Vec<CourseAggregate> {
    let mut order: Vec<CourseAccumulator<'_>> = Vec::new();
    let mut by_code: HashMap<String, usize> = HashMap::new();

    for joined in sections {
        let record = joined.record;
        let code = record.course_code();

        let idx = *by_code.entry(code.clone()).or_insert_with(|| {
            order.push(CourseAccumulator {
                code,
                subject_code: &record.subject_code,
                course_number: &record.course_number,
                title: &record.title,
                stats: WeightedStats::default(),
                instructors: BTreeSet::new(),
            });
            order.len() - 1
        });

        let acc = &mut order[idx];
        acc.stats.push(&joined.stats());
        acc.instructors
            .extend(record.instructors.iter().map(String::as_str));
    }

    order
        .into_iter()
        .map(|acc| finish_course(acc, subjects, credit_rules))
        .collect()
}

fn finish_course(
    acc: CourseAccumulator<'_>,
    subjects: &SubjectDirectory,
    credit_rules: Option<&CreditRules>,
) -> CourseAggregate {
    let (subject, faculty) = match subjects.get(acc.subject_code) {
        Some(meta) => {
            let faculty = match credit_rules {
                Some(rules) => rules.annotate_faculty(
                    &meta.faculty_school,
                    acc.subject_code,
                    acc.course_number,
                ),
                None => meta.faculty_school.clone(),
            };
            (meta.title.clone(), faculty)
        }
        None => (String::new(), String::new()),
    };

    let stats = acc.stats.finish();

    CourseAggregate {
        subject,
        code: acc.code,
        name: acc.title.to_string(),
        faculty,
        average: stats.average,
        reported: stats.reported,
        weighted_median: stats.median,
        percentile25: stats.percentile25,
        percentile75: stats.percentile75,
        high: stats.high,
        low: stats.low,
        buckets: stats.buckets,
        professors: acc.instructors.into_iter().map(str::to_string).collect(),
    }
}
