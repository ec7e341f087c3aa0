//! Histogram aggregation of experiment success counts.
//!
//! The histogram is a pure function of the result set: it is rebuilt from
//! scratch on every call and never mutated in place.
//!
//! Two binning policies are supported:
//! - **Unlimited**: one bin per integer from the observed minimum to the
//!   observed maximum, empty bins included.
//! - **Capped**: at most `max_bins` bins of width
//!   `ceil((max - min + 1) / bins)`, labelled `"start-end"`.

use serde::{Deserialize, Serialize};

use crate::engine::runner::ExperimentResult;

/// Default bin cap for [`BinningPolicy::Capped`].
pub const DEFAULT_MAX_BINS: u64 = 20;

/// Binning policy for [`compute_histogram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "policy")]
pub enum BinningPolicy {
    /// One bin per success count in `[min, max]`.
    #[default]
    Unlimited,
    /// At most `max_bins` equal-width range bins.
    Capped {
        /// Upper bound on the number of bins.
        max_bins: u64,
    },
}

/// One histogram bin covering the inclusive range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// First success count in the bin.
    pub start: u64,
    /// Last success count in the bin.
    pub end: u64,
    /// Number of experiments that fell in the bin.
    pub count: u64,
}

impl HistogramBin {
    /// Whether `value` falls inside the bin.
    #[must_use]
    pub const fn contains(&self, value: u64) -> bool {
        value >= self.start && value <= self.end
    }
}

/// Derived histogram, ordered by ascending success count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin labels: the integer for single-value bins, `"start-end"` for ranges.
    pub labels: Vec<String>,
    /// Frequency per bin, parallel to `labels`.
    pub data: Vec<u64>,
    /// Bin bounds, parallel to `labels`.
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Whether the histogram has no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Sum of all frequencies.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.data.iter().sum()
    }

    /// Largest frequency (0 when empty).
    #[must_use]
    pub fn max_frequency(&self) -> u64 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Success count represented by bin `index` (the bin start).
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<u64> {
        self.bins.get(index).map(|b| b.start)
    }

    /// Index of the bin containing `value`.
    #[must_use]
    pub fn index_of(&self, value: u64) -> Option<usize> {
        self.bins.iter().position(|b| b.contains(value))
    }
}

/// Build a histogram over the success counts of `results`.
///
/// # Example
///
/// ```rust
/// use binosim::domains::histogram::{compute_histogram, BinningPolicy};
/// use binosim::engine::runner::ExperimentResult;
/// use std::time::Duration;
///
/// let results: Vec<_> = [3, 5, 5]
///     .iter()
///     .enumerate()
///     .map(|(i, &s)| ExperimentResult {
///         experiment_number: i as u64 + 1,
///         successes: s,
///         timestamp: Duration::ZERO,
///     })
///     .collect();
///
/// let h = compute_histogram(&results, BinningPolicy::Unlimited);
/// assert_eq!(h.labels, vec!["3", "4", "5"]);
/// assert_eq!(h.data, vec![1, 0, 2]);
/// ```
#[must_use]
pub fn compute_histogram(results: &[ExperimentResult], policy: BinningPolicy) -> Histogram {
    let Some((min, max)) = extrema(results) else {
        return Histogram::default();
    };

    match policy {
        BinningPolicy::Unlimited => bin_by_value(results, min, max),
        BinningPolicy::Capped { max_bins } => bin_by_range(results, min, max, max_bins.max(1)),
    }
}

fn extrema(results: &[ExperimentResult]) -> Option<(u64, u64)> {
    let mut iter = results.iter().map(|r| r.successes);
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
}

fn bin_by_value(results: &[ExperimentResult], min: u64, max: u64) -> Histogram {
    let mut counts = vec![0u64; (max - min + 1) as usize];
    for r in results {
        counts[(r.successes - min) as usize] += 1;
    }

    let bins: Vec<HistogramBin> = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let value = min + i as u64;
            HistogramBin {
                start: value,
                end: value,
                count,
            }
        })
        .collect();

    Histogram {
        labels: bins.iter().map(|b| b.start.to_string()).collect(),
        data: counts,
        bins,
    }
}

fn bin_by_range(results: &[ExperimentResult], min: u64, max: u64, max_bins: u64) -> Histogram {
    let span = max - min + 1;
    let bin_count = max_bins.min(span);
    let width = span.div_ceil(bin_count);

    let mut counts = vec![0u64; bin_count as usize];
    for r in results {
        let index = ((r.successes - min) / width) as usize;
        counts[index] += 1;
    }

    let bins: Vec<HistogramBin> = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let start = min + i as u64 * width;
            HistogramBin {
                start,
                end: start + width - 1,
                count,
            }
        })
        .collect();

    Histogram {
        labels: bins.iter().map(|b| format!("{}-{}", b.start, b.end)).collect(),
        data: counts,
        bins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn results(values: &[u64]) -> Vec<ExperimentResult> {
        values
            .iter()
            .enumerate()
            .map(|(i, &successes)| ExperimentResult {
                experiment_number: i as u64 + 1,
                successes,
                timestamp: Duration::ZERO,
            })
            .collect()
    }

    #[test]
    fn test_empty_results() {
        let h = compute_histogram(&[], BinningPolicy::Unlimited);
        assert!(h.labels.is_empty());
        assert!(h.data.is_empty());
        assert!(h.is_empty());

        let h = compute_histogram(&[], BinningPolicy::Capped { max_bins: 20 });
        assert!(h.is_empty());
    }

    #[test]
    fn test_unlimited_includes_empty_bins() {
        let h = compute_histogram(&results(&[40, 50, 60]), BinningPolicy::Unlimited);
        assert_eq!(h.len(), 21);
        assert_eq!(h.labels.first().map(String::as_str), Some("40"));
        assert_eq!(h.labels.last().map(String::as_str), Some("60"));
        assert_eq!(h.data[0], 1);
        assert_eq!(h.data[1], 0);
        assert_eq!(h.data[10], 1);
        assert_eq!(h.data[20], 1);
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn test_unlimited_degenerate() {
        let h = compute_histogram(&results(&[7, 7, 7]), BinningPolicy::Unlimited);
        assert_eq!(h.labels, vec!["7"]);
        assert_eq!(h.data, vec![3]);
        assert_eq!((h.bins[0].start, h.bins[0].end), (7, 7));
    }

    #[test]
    fn test_capped_width_and_labels() {
        // span = 41, 20 bins -> width 3
        let h = compute_histogram(&results(&[40, 41, 42, 43, 80]), BinningPolicy::Capped { max_bins: 20 });
        assert_eq!(h.len(), 20);
        assert_eq!(h.labels[0], "40-42");
        assert_eq!(h.labels[1], "43-45");
        assert_eq!(h.data[0], 3);
        assert_eq!(h.data[1], 1);
        assert_eq!(h.data[13], 1); // (80 - 40) / 3 = 13
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn test_capped_narrow_span() {
        let h = compute_histogram(&results(&[3, 5]), BinningPolicy::Capped { max_bins: 20 });
        assert_eq!(h.labels, vec!["3-3", "4-4", "5-5"]);
        assert_eq!(h.data, vec![1, 0, 1]);
    }

    #[test]
    fn test_capped_degenerate() {
        let h = compute_histogram(&results(&[9, 9]), BinningPolicy::Capped { max_bins: 20 });
        assert_eq!(h.labels, vec!["9-9"]);
        assert_eq!(h.data, vec![2]);
    }

    #[test]
    fn test_capped_zero_bins_treated_as_one() {
        let h = compute_histogram(&results(&[1, 10]), BinningPolicy::Capped { max_bins: 0 });
        assert_eq!(h.labels, vec!["1-10"]);
        assert_eq!(h.data, vec![2]);
    }

    #[test]
    fn test_value_and_index_lookup() {
        let h = compute_histogram(&results(&[10, 12]), BinningPolicy::Unlimited);
        assert_eq!(h.value_at(1), Some(11));
        assert_eq!(h.value_at(5), None);
        assert_eq!(h.index_of(12), Some(2));
        assert_eq!(h.index_of(13), None);
        assert_eq!(h.max_frequency(), 1);
    }

    #[test]
    fn test_policy_yaml_round_trip() {
        let yaml = "policy: capped\nmax_bins: 12\n";
        let policy: Result<BinningPolicy, _> = serde_yaml::from_str(yaml);
        assert_eq!(policy.ok(), Some(BinningPolicy::Capped { max_bins: 12 }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn to_results(values: &[u64]) -> Vec<ExperimentResult> {
        values
            .iter()
            .enumerate()
            .map(|(i, &successes)| ExperimentResult {
                experiment_number: i as u64 + 1,
                successes,
                timestamp: Duration::ZERO,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_unlimited_sums_and_has_no_gaps(values in prop::collection::vec(0u64..200, 1..300)) {
            let h = compute_histogram(&to_results(&values), BinningPolicy::Unlimited);
            prop_assert_eq!(h.total(), values.len() as u64);

            let min = values.iter().copied().min().unwrap_or(0);
            let max = values.iter().copied().max().unwrap_or(0);
            prop_assert_eq!(h.len() as u64, max - min + 1);
            for (i, label) in h.labels.iter().enumerate() {
                prop_assert_eq!(label.parse::<u64>().ok(), Some(min + i as u64));
            }
        }

        #[test]
        fn prop_capped_respects_cap(values in prop::collection::vec(0u64..500, 1..300), cap in 1u64..40) {
            let h = compute_histogram(&to_results(&values), BinningPolicy::Capped { max_bins: cap });
            prop_assert!(h.len() as u64 <= cap);
            prop_assert_eq!(h.total(), values.len() as u64);
            let max = values.iter().copied().max().unwrap_or(0);
            prop_assert!(h.bins.last().map_or(false, |b| b.end >= max));
        }
    }
}
