//! Honorary science credit classification.
//!
//! Certain courses outside the Faculty of Science count toward a science
//! credit requirement. The table here is the canonical one; it is only
//! applied to campuses configured with `honorary_science_credit`.

/// Suffix appended to a course's faculty when it earns honorary science credit.
pub const HONORARY_CREDIT_SUFFIX: &str = " (Honorary Science Credit)";

/// Immutable rule table. Any matching rule classifies the course as eligible.
#[derive(Debug, Clone)]
pub struct CreditRules {
    /// Subjects where every course is eligible.
    pub whole_subjects: Vec<String>,
    /// Exact `(subject, course number)` matches.
    pub exact_courses: Vec<(String, String)>,
    /// `(subject, low, high)`: eligible when the numeric prefix modulo 100 is in range.
    pub last_two_digit_ranges: Vec<(String, u32, u32)>,
    /// `(subject, low, high)`: eligible when the numeric prefix itself is in range.
    pub number_ranges: Vec<(String, u32, u32)>,
}

impl Default for CreditRules {
    fn default() -> Self {
        let owned = |s: &str| s.to_string();
        Self {
            whole_subjects: ["GEOS", "GEOB", "BIOC", "CAPS", "PCTH"]
                .into_iter()
                .map(owned)
                .collect(),
            exact_courses: [
                ("PSYC", "348"),
                ("PSYC", "448"),
                ("FNH", "350"),
                ("FNH", "351"),
                ("FNH", "450"),
                ("FNH", "451"),
            ]
            .into_iter()
            .map(|(s, n)| (owned(s), owned(n)))
            .collect(),
            last_two_digit_ranges: vec![(owned("PSYC"), 60, 89)],
            number_ranges: vec![(owned("MEDG"), 410, 421)],
        }
    }
}

impl CreditRules {
    pub fn is_honorary_science_credit(&self, subject: &str, course_number: &str) -> bool {
        let subject = subject.trim();
        let course_number = course_number.trim();

        if self.whole_subjects.iter().any(|s| s == subject) {
            return true;
        }

        if self
            .exact_courses
            .iter()
            .any(|(s, n)| s == subject && n == course_number)
        {
            return true;
        }

        let Some(number) = numeric_prefix(course_number) else {
            return false;
        };

        let in_range = |ranges: &[(String, u32, u32)], value: u64| {
            ranges
                .iter()
                .any(|(s, lo, hi)| s == subject && (*lo as u64..=*hi as u64).contains(&value))
        };

        in_range(&self.last_two_digit_ranges, number % 100) || in_range(&self.number_ranges, number)
    }

    /// Faculty string as shown in the course view, annotated when eligible.
    pub fn annotate_faculty(&self, faculty: &str, subject: &str, course_number: &str) -> String {
        if self.is_honorary_science_credit(subject, course_number) {
            format!("{faculty}{HONORARY_CREDIT_SUFFIX}")
        } else {
            faculty.to_string()
        }
    }
}

/// Value of the leading run of ASCII digits, e.g. `"448B"` gives `448`.
///
/// Returns `None` when the string does not start with a digit.
pub fn numeric_prefix(course_number: &str) -> Option<u64> {
    let end = course_number
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(course_number.len());
    course_number[..end].parse().ok()
}
