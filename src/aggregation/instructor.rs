use std::collections::{BTreeMap, BTreeSet};

use crate::aggregation::join::JoinedSection;
use crate::aggregation::types::{CombinedCourse, InstructorAggregate};
use crate::aggregation::utility::{WeightedStats, weighted_ratio};
use crate::subjects::SubjectDirectory;

/// Faculty shown for subjects missing from the directory.
pub const UNKNOWN_FACULTY: &str = "Unknown Faculty";

#[derive(Default)]
struct InstructorAccumulator<'s, 'a> {
    faculties: BTreeSet<String>,
    /// Sections per course code.
    courses: BTreeMap<String, Vec<&'s JoinedSection<'a>>>,
}

/// Builds the per-instructor view.
///
/// Each instructor's sections of the same course are combined first; the
/// instructor's overall average then weights those combined courses by their
/// reported counts. Instructors with nobody reported are left out. Output is
/// sorted by name.
pub fn aggregate_instructors(
    sections: &[JoinedSection<'_>],
    subjects: &SubjectDirectory,
) -> Vec<InstructorAggregate> {
    let mut instructors: BTreeMap<&str, InstructorAccumulator<'_, '_>> = BTreeMap::new();

    for joined in sections {
        let record = joined.record;
        let faculty = subjects
            .get(&record.subject_code)
            .map_or(UNKNOWN_FACULTY, |s| s.faculty_school.as_str());

        for name in &record.instructors {
            let acc = instructors.entry(name.as_str()).or_default();
            acc.faculties.insert(faculty.to_string());
            acc.courses
                .entry(record.course_code())
                .or_default()
                .push(joined);
        }
    }

    instructors
        .into_iter()
        .filter_map(|(name, acc)| finish_instructor(name, acc, subjects))
        .collect()
}

fn finish_instructor(
    name: &str,
    acc: InstructorAccumulator<'_, '_>,
    subjects: &SubjectDirectory,
) -> Option<InstructorAggregate> {
    let courses: Vec<CombinedCourse> = acc
        .courses
        .into_iter()
        .filter_map(|(code, sections)| combine_course_sections(code, &sections, subjects))
        .collect();

    let total_students: u64 = courses.iter().map(|c| c.reported).sum();
    if total_students == 0 {
        return None;
    }

    let average_sum: f64 = courses
        .iter()
        .map(|c| c.average * c.reported as f64)
        .sum();

    Some(InstructorAggregate {
        name: name.to_string(),
        faculties: acc.faculties.into_iter().collect(),
        number_of_courses: courses.len(),
        overall_average: weighted_ratio(average_sum, total_students),
        total_students,
        courses,
    })
}

/// Collapses one instructor's sections of a course. Returns `None` when the
/// sections report no students at all.
pub fn combine_course_sections(
    code: String,
    sections: &[&JoinedSection<'_>],
    subjects: &SubjectDirectory,
) -> Option<CombinedCourse> {
    let first = sections.first()?.record;

    let section_stats: Vec<_> = sections.iter().map(|s| s.stats()).collect();
    let stats: WeightedStats = section_stats.iter().collect();
    if stats.reported() == 0 {
        return None;
    }
    let stats = stats.finish();

    let labels: BTreeSet<&str> = sections.iter().map(|s| s.record.section.as_str()).collect();
    let subject = subjects
        .get(&first.subject_code)
        .map_or_else(|| first.subject_code.clone(), |s| s.title.clone());

    Some(CombinedCourse {
        section: labels.into_iter().collect::<Vec<_>>().join(", "),
        reported: stats.reported,
        title: first.title.clone(),
        average: stats.average,
        median: stats.median,
        percentile25: stats.percentile25,
        percentile75: stats.percentile75,
        high: stats.high,
        low: stats.low,
        buckets: stats.buckets,
        code,
        subject,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::test_support::{directory, joined, section};

    #[test]
    fn test_overall_average_across_courses() {
        let sections = [
            section("CPSC 110", "A", 100, 75.0, &["Kiczales"]),
            section("CPSC 121", "B", 50, 85.0, &["Kiczales"]),
        ];
        let instructors = aggregate_instructors(&joined(&sections), &directory());

        assert_eq!(instructors.len(), 1);
        let prof = &instructors[0];
        assert_eq!(prof.name, "Kiczales");
        assert_eq!(prof.overall_average, 78.33);
        assert_eq!(prof.number_of_courses, 2);
        assert_eq!(prof.total_students, 150);
        assert_eq!(prof.faculties, vec!["Faculty of Science"]);
    }

    #[test]
    fn test_sections_of_same_course_are_combined() {
        let mut second = section("CPSC 110", "101", 50, 80.0, &["Lee"]);
        second.high = 99.0;
        let sections = [
            section("CPSC 110", "102", 100, 75.0, &["Lee"]),
            second,
            section("CPSC 110", "101", 0, 10.0, &["Lee"]),
        ];
        let instructors = aggregate_instructors(&joined(&sections), &directory());

        let course = &instructors[0].courses[0];
        assert_eq!(instructors[0].number_of_courses, 1);
        assert_eq!(course.section, "101, 102");
        assert_eq!(course.reported, 150);
        assert_eq!(course.average, 76.67);
        assert_eq!(course.high, 99.0);
        assert_eq!(course.subject, "Computer Science");
    }

    #[test]
    fn test_zero_reported_instructor_dropped() {
        let sections = [
            section("CPSC 110", "1", 0, 70.0, &["Ghost"]),
            section("CPSC 121", "1", 0, 70.0, &["Ghost"]),
            section("CPSC 110", "2", 10, 70.0, &["Real"]),
        ];
        let instructors = aggregate_instructors(&joined(&sections), &directory());
        let names: Vec<_> = instructors.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Real"]);
    }

    #[test]
    fn test_zero_reported_course_dropped_from_list() {
        let sections = [
            section("CPSC 110", "1", 0, 70.0, &["Lee"]),
            section("CPSC 121", "1", 20, 70.0, &["Lee"]),
        ];
        let instructors = aggregate_instructors(&joined(&sections), &directory());
        assert_eq!(instructors[0].number_of_courses, 1);
        assert_eq!(instructors[0].courses[0].code, "CPSC 121");
    }

    #[test]
    fn test_sorted_names_courses_and_faculties() {
        let sections = [
            section("PSYC 100", "1", 10, 70.0, &["Zhang", "Adams"]),
            section("CPSC 110", "1", 10, 70.0, &["Adams"]),
            section("ZOOL 200", "1", 10, 70.0, &["Adams"]),
        ];
        let instructors = aggregate_instructors(&joined(&sections), &directory());

        assert_eq!(instructors[0].name, "Adams");
        assert_eq!(instructors[1].name, "Zhang");
        let codes: Vec<_> = instructors[0].courses.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["CPSC 110", "PSYC 100", "ZOOL 200"]);
        assert_eq!(
            instructors[0].faculties,
            vec!["Faculty of Arts", "Faculty of Science", UNKNOWN_FACULTY]
        );
        assert_eq!(instructors[0].courses[2].subject, "ZOOL");
    }

    #[test]
    fn test_sections_without_instructors_are_ignored() {
        let sections = [section("CPSC 110", "1", 10, 70.0, &[])];
        assert!(aggregate_instructors(&joined(&sections), &directory()).is_empty());
    }

    #[test]
    fn test_instructor_view_json_keys() {
        let sections = [section("CPSC 110", "1", 10, 70.0, &["Lee"])];
        let instructors = aggregate_instructors(&joined(&sections), &directory());
        let json = serde_json::to_value(&instructors[0]).unwrap();
        for key in [
            "name",
            "faculties",
            "courses",
            "totalStudents",
            "overallAverage",
            "numberOfCourses",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        let course = &json["courses"][0];
        for key in ["section", "reported", "title", "median", "percentile25", "72-75", "code", "subject"] {
            assert!(course.get(key).is_some(), "missing course {key}");
        }
    }
}
