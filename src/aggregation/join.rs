//! Matching section statistics to letter-grade distributions.

use serde::Deserialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::aggregation::utility::SectionStats;
use crate::grades::{BucketCounts, LetterGradeMap};
use crate::records::{GradeDistributionRecord, SectionRecord};

/// Which distribution row wins when several share a join key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    First,
    Last,
}

type JoinKey<'a> = (&'a str, &'a str, &'a str);

/// Distribution rows indexed by (course code, section, title).
pub struct DistributionIndex<'a> {
    rows: HashMap<JoinKey<'a>, &'a GradeDistributionRecord>,
    duplicates: usize,
}

impl<'a> DistributionIndex<'a> {
    pub fn new(records: &'a [GradeDistributionRecord], policy: DuplicatePolicy) -> Self {
        let mut rows = HashMap::with_capacity(records.len());
        let mut duplicates = 0;

        for record in records {
            let key = (
                record.course_code.as_str(),
                record.section.as_str(),
                record.title.as_str(),
            );
            match rows.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    duplicates += 1;
                    if policy == DuplicatePolicy::Last {
                        slot.insert(record);
                    }
                }
            }
        }

        Self { rows, duplicates }
    }

    pub fn lookup(&self, section: &SectionRecord) -> Option<&'a GradeDistributionRecord> {
        let code = section.course_code();
        self.rows
            .get(&(code.as_str(), section.section.as_str(), section.title.as_str()))
            .copied()
    }

    /// Number of distribution rows whose key was already taken.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// A section paired with the bucket counts of its matched distribution row.
#[derive(Debug, Clone)]
pub struct JoinedSection<'a> {
    pub record: &'a SectionRecord,
    /// All zero when no distribution row matched.
    pub buckets: BucketCounts,
    pub matched: bool,
}

impl JoinedSection<'_> {
    pub fn stats(&self) -> SectionStats {
        let r = self.record;
        SectionStats {
            reported: r.reported,
            average: r.mean,
            median: r.median,
            percentile25: r.percentile25,
            percentile75: r.percentile75,
            high: r.high,
            low: r.low,
            buckets: self.buckets,
        }
    }
}

/// Joins every section to its distribution row, in section order. Sections
/// that already carry bucket counts keep them and count as matched.
pub fn join_sections<'a>(
    sections: &'a [SectionRecord],
    index: &DistributionIndex<'_>,
    letters: &LetterGradeMap,
) -> Vec<JoinedSection<'a>> {
    sections
        .iter()
        .map(|record| match (record.buckets, index.lookup(record)) {
            (Some(buckets), _) => JoinedSection {
                record,
                buckets,
                matched: true,
            },
            (None, Some(row)) => JoinedSection {
                record,
                buckets: letters.to_buckets(row.counts()),
                matched: true,
            },
            (None, None) => JoinedSection {
                record,
                buckets: BucketCounts::default(),
                matched: false,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn dist(code: &str, section: &str, title: &str, a_plus: u64) -> GradeDistributionRecord {
        GradeDistributionRecord {
            course_code: code.to_string(),
            section: section.to_string(),
            title: title.to_string(),
            letter_counts: BTreeMap::from([("A+".to_string(), a_plus), ("F".to_string(), 1)]),
        }
    }

    fn section(subject: &str, number: &str, section: &str, title: &str) -> SectionRecord {
        SectionRecord {
            subject_code: subject.to_string(),
            course_number: number.to_string(),
            section: section.to_string(),
            title: title.to_string(),
            reported: 10,
            mean: 70.0,
            median: 70.0,
            percentile25: 60.0,
            percentile75: 80.0,
            high: 95.0,
            low: 40.0,
            instructors: vec![],
            buckets: None,
        }
    }

    #[test]
    fn test_join_matches_on_full_key() {
        let rows = vec![dist("CPSC 110", "101", "Intro", 4), dist("CPSC 110", "102", "Intro", 6)];
        let sections = vec![section("CPSC", "110", "102", "Intro")];
        let index = DistributionIndex::new(&rows, DuplicatePolicy::First);
        let joined = join_sections(&sections, &index, &LetterGradeMap::default());

        assert!(joined[0].matched);
        assert_eq!(joined[0].buckets.get("90-100"), Some(6));
        assert_eq!(joined[0].buckets.get("<50"), Some(1));
    }

    #[test]
    fn test_unmatched_section_gets_zero_buckets() {
        let rows = vec![dist("CPSC 110", "101", "Different Title", 4)];
        let sections = vec![section("CPSC", "110", "101", "Intro")];
        let index = DistributionIndex::new(&rows, DuplicatePolicy::First);
        let joined = join_sections(&sections, &index, &LetterGradeMap::default());

        assert!(!joined[0].matched);
        assert_eq!(joined[0].buckets.total(), 0);
    }

    #[test]
    fn test_inline_buckets_skip_the_index() {
        let rows = vec![dist("CPSC 110", "101", "Intro", 4)];
        let mut record = section("CPSC", "110", "101", "Intro");
        let mut inline = BucketCounts::default();
        inline.0[5] = 10;
        record.buckets = Some(inline);
        let sections = vec![record];
        let index = DistributionIndex::new(&rows, DuplicatePolicy::First);
        let joined = join_sections(&sections, &index, &LetterGradeMap::default());

        assert!(joined[0].matched);
        assert_eq!(joined[0].buckets, inline);
        assert_eq!(joined[0].buckets.get("90-100"), Some(0));
    }

    #[test]
    fn test_duplicate_policy() {
        let rows = vec![dist("CPSC 110", "101", "Intro", 4), dist("CPSC 110", "101", "Intro", 9)];
        let sections = vec![section("CPSC", "110", "101", "Intro")];
        let letters = LetterGradeMap::default();

        let first = DistributionIndex::new(&rows, DuplicatePolicy::First);
        assert_eq!(first.duplicates(), 1);
        let joined = join_sections(&sections, &first, &letters);
        assert_eq!(joined[0].buckets.get("90-100"), Some(4));

        let last = DistributionIndex::new(&rows, DuplicatePolicy::Last);
        let joined = join_sections(&sections, &last, &letters);
        assert_eq!(joined[0].buckets.get("90-100"), Some(9));
    }
}
