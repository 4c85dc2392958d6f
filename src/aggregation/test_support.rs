use crate::aggregation::join::JoinedSection;
use crate::grades::BucketCounts;
use crate::records::{SectionRecord, parse_instructors, split_course};
use crate::subjects::{SubjectDirectory, SubjectMetadata};

pub fn directory() -> SubjectDirectory {
    let entry = |code: &str, title: &str, faculty: &str| SubjectMetadata {
        code: code.to_string(),
        title: title.to_string(),
        faculty_school: faculty.to_string(),
    };
    SubjectDirectory::from_entries([
        entry("CPSC", "Computer Science", "Faculty of Science"),
        entry("MATH", "Mathematics", "Faculty of Science"),
        entry("PSYC", "Psychology", "Faculty of Arts"),
    ])
}

pub fn section(
    course: &str,
    section: &str,
    reported: u64,
    mean: f64,
    instructors: &[&str],
) -> SectionRecord {
    let (subject_code, course_number) = split_course(course).unwrap_or_default();
    SectionRecord {
        subject_code,
        course_number,
        section: section.to_string(),
        title: format!("{course} title"),
        reported,
        mean,
        median: mean,
        percentile25: mean - 10.0,
        percentile75: mean + 10.0,
        high: 95.0,
        low: 30.0,
        instructors: parse_instructors(&instructors.join(";")),
        buckets: None,
    }
}

/// Joins sections with no distribution rows.
pub fn joined(sections: &[SectionRecord]) -> Vec<JoinedSection<'_>> {
    sections
        .iter()
        .map(|record| JoinedSection {
            record,
            buckets: BucketCounts::default(),
            matched: false,
        })
        .collect()
}
