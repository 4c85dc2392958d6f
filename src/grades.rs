//! Letter grades and the percentage buckets they are reported under.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::ops::AddAssign;

/// Percentage-range bucket labels, lowest first. Output always uses this order.
pub const GRADE_BUCKETS: [&str; 11] = [
    "<50", "50-54", "55-59", "60-63", "64-67", "68-71", "72-75", "76-79", "80-84", "85-89",
    "90-100",
];

/// Stock letter-grade table.
///
/// | Letter | Bucket |
/// |--------|--------|
/// | A+     | 90-100 |
/// | A      | 85-89  |
/// | A-     | 80-84  |
/// | B+     | 76-79  |
/// | B      | 72-75  |
/// | B-     | 68-71  |
/// | C+     | 64-67  |
/// | C      | 60-63  |
/// | C-     | 55-59  |
/// | D      | 50-54  |
/// | F      | <50    |
static LETTER_GRADES: &[(&str, &str)] = &[
    ("A+", "90-100"),
    ("A", "85-89"),
    ("A-", "80-84"),
    ("B+", "76-79"),
    ("B", "72-75"),
    ("B-", "68-71"),
    ("C+", "64-67"),
    ("C", "60-63"),
    ("C-", "55-59"),
    ("D", "50-54"),
    ("F", "<50"),
];

/// Histogram of students per grade bucket, indexed like [`GRADE_BUCKETS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts(pub [u64; 11]);

impl BucketCounts {
    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<u64> {
        bucket_index(label).map(|i| self.0[i])
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl AddAssign<&BucketCounts> for BucketCounts {
    fn add_assign(&mut self, other: &BucketCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }
}

impl<'a> std::iter::Sum<&'a BucketCounts> for BucketCounts {
    fn sum<I: Iterator<Item = &'a BucketCounts>>(iter: I) -> Self {
        let mut acc = BucketCounts::default();
        for counts in iter {
            acc += counts;
        }
        acc
    }
}

// Serialized as a map so it can be flattened into the surrounding record.
impl Serialize for BucketCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(GRADE_BUCKETS.len()))?;
        for (label, count) in GRADE_BUCKETS.iter().zip(self.0.iter()) {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Position of a bucket label in [`GRADE_BUCKETS`].
pub fn bucket_index(label: &str) -> Option<usize> {
    GRADE_BUCKETS.iter().position(|b| *b == label)
}

/// Immutable letter-grade to bucket mapping, handed to the aggregation engine.
#[derive(Debug, Clone)]
pub struct LetterGradeMap {
    letters: HashMap<String, usize>,
}

impl Default for LetterGradeMap {
    fn default() -> Self {
        Self::from_pairs(LETTER_GRADES.iter().copied())
    }
}

impl LetterGradeMap {
    /// Builds a mapping from `(letter, bucket label)` pairs. Pairs naming an
    /// unknown bucket are dropped.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let letters = pairs
            .into_iter()
            .filter_map(|(letter, bucket)| {
                bucket_index(bucket).map(|idx| (letter.to_string(), idx))
            })
            .collect();
        Self { letters }
    }

    pub fn bucket_for(&self, letter: &str) -> Option<usize> {
        self.letters.get(letter.trim()).copied()
    }

    /// Folds per-letter counts into bucket counts. Letters outside the table are ignored.
    pub fn to_buckets<'a>(&self, counts: impl IntoIterator<Item = (&'a str, u64)>) -> BucketCounts {
        let mut buckets = BucketCounts::default();
        for (letter, count) in counts {
            if let Some(idx) = self.bucket_for(letter) {
                buckets.0[idx] += count;
            }
        }
        buckets
    }
}
