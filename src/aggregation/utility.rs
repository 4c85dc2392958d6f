use crate::grades::BucketCounts;

/// Rounds to two decimal places, the precision every published statistic uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `sum / weight` rounded, or 0.0 when there is no weight.
pub fn weighted_ratio(sum: f64, weight: u64) -> f64 {
    if weight == 0 {
        0.0
    } else {
        round2(sum / weight as f64)
    }
}

/// Statistics of a single section, or of several sections already combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionStats {
    pub reported: u64,
    pub average: f64,
    pub median: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub high: f64,
    pub low: f64,
    pub buckets: BucketCounts,
}

/// Enrollment-weighted fold over [`SectionStats`].
///
/// High and low are seeded from the first section pushed, so folding one
/// section reproduces it exactly.
#[derive(Debug, Clone, Default)]
pub struct WeightedStats {
    reported: u64,
    average_sum: f64,
    median_sum: f64,
    percentile25_sum: f64,
    percentile75_sum: f64,
    high: Option<f64>,
    low: Option<f64>,
    buckets: BucketCounts,
}

impl WeightedStats {
    pub fn push(&mut self, section: &SectionStats) {
        let weight = section.reported as f64;
        self.reported += section.reported;
        self.average_sum += section.average * weight;
        self.median_sum += section.median * weight;
        self.percentile25_sum += section.percentile25 * weight;
        self.percentile75_sum += section.percentile75 * weight;
        self.high = Some(self.high.map_or(section.high, |h| h.max(section.high)));
        self.low = Some(self.low.map_or(section.low, |l| l.min(section.low)));
        self.buckets += &section.buckets;
    }

    pub fn reported(&self) -> u64 {
        self.reported
    }

    pub fn finish(&self) -> SectionStats {
        SectionStats {
            reported: self.reported,
            average: weighted_ratio(self.average_sum, self.reported),
            median: weighted_ratio(self.median_sum, self.reported),
            percentile25: weighted_ratio(self.percentile25_sum, self.reported),
            percentile75: weighted_ratio(self.percentile75_sum, self.reported),
            high: self.high.unwrap_or(0.0),
            low: self.low.unwrap_or(0.0),
            buckets: self.buckets,
        }
    }
}

impl<'a> FromIterator<&'a SectionStats> for WeightedStats {
    fn from_iter<I: IntoIterator<Item = &'a SectionStats>>(iter: I) -> Self {
        let mut stats = WeightedStats::default();
        for section in iter {
            stats.push(section);
        }
        stats
    }
}
