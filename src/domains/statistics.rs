//! Summary statistics and two-tailed z-tests over experiment results.
//!
//! # Governing Equations
//!
//! ```text
//! Expected value:      E = p * n
//! Binomial sd:         σ = sqrt(n * p * (1 - p))
//! Sample-mean z:       z = (x̄ - E) / (σ / sqrt(N))
//! Single-count z:      z = (k - E) / σ
//! Two-tailed p-value:  P = 2 * (1 - Φ(|z|))
//! ```
//!
//! Φ uses the Abramowitz-Stegun 7.1.26 rational approximation of `erf`
//! (maximum absolute error 1.5e-7).

use serde::{Deserialize, Serialize};

use crate::engine::params::SimulationParams;
use crate::engine::runner::ExperimentResult;

const A1: f64 = 0.254_829_592;
const A2: f64 = -0.284_496_736;
const A3: f64 = 1.421_413_741;
const A4: f64 = -1.453_152_027;
const A5: f64 = 1.061_405_429;
const P: f64 = 0.327_591_1;

/// Error function (Abramowitz and Stegun 7.1.26).
#[must_use]
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// Standard normal CDF Φ(x).
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Standardized distance; 0 when `std_dev` is 0.
#[must_use]
pub fn z_score(observed: f64, expected: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (observed - expected) / std_dev
}

/// Two-tailed p-value of a z-score under the standard normal.
#[must_use]
pub fn two_tailed_p_value(z: f64) -> f64 {
    2.0 * (1.0 - normal_cdf(z.abs()))
}

/// Summary statistics of a result set.
///
/// Every field is zero for an empty result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Arithmetic mean of success counts.
    pub mean: f64,
    /// Population variance (divides by N).
    pub variance: f64,
    /// Square root of `variance`.
    pub standard_deviation: f64,
    /// Smallest observed success count.
    pub min: f64,
    /// Largest observed success count.
    pub max: f64,
    /// Theoretical binomial mean `p * n`.
    pub expected_value: f64,
    /// z-score of the sample mean against `expected_value`.
    pub z_score: f64,
    /// Two-tailed p-value of `z_score`.
    pub p_value: f64,
}

impl SimulationStats {
    /// Whether the observed mean differs from the expectation at level `alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Statistics of a single chosen success count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedBarStats {
    /// The chosen success count.
    pub successes: u64,
    /// How many experiments produced exactly that count.
    pub frequency: u64,
    /// z-score of the count against the binomial mean.
    pub z_score: f64,
    /// Two-tailed p-value of `z_score`.
    pub p_value: f64,
}

/// Compute [`SimulationStats`] for `results` under `params`.
///
/// `expected_value` always reflects `params`, even when `results` were
/// produced under different parameters.
#[must_use]
pub fn compute_statistics(results: &[ExperimentResult], params: &SimulationParams) -> SimulationStats {
    if results.is_empty() {
        return SimulationStats::default();
    }

    let n = results.len() as f64;
    let mean = results.iter().map(|r| r.successes as f64).sum::<f64>() / n;
    let variance = results
        .iter()
        .map(|r| (r.successes as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let (min, max) = results.iter().fold((u64::MAX, 0), |(lo, hi), r| {
        (lo.min(r.successes), hi.max(r.successes))
    });

    let expected_value = params.expected_value();
    let standard_error = params.theoretical_std_dev() / n.sqrt();
    let z = z_score(mean, expected_value, standard_error);

    SimulationStats {
        mean,
        variance,
        standard_deviation: variance.sqrt(),
        min: min as f64,
        max: max as f64,
        expected_value,
        z_score: z,
        p_value: two_tailed_p_value(z),
    }
}

/// Compute [`SelectedBarStats`] for the success count `selected`.
///
/// Returns `None` for an empty result set.
#[must_use]
pub fn compute_selected_bar_stats(
    results: &[ExperimentResult],
    params: &SimulationParams,
    selected: u64,
) -> Option<SelectedBarStats> {
    if results.is_empty() {
        return None;
    }

    let frequency = results.iter().filter(|r| r.successes == selected).count() as u64;
    let z = z_score(
        selected as f64,
        params.expected_value(),
        params.theoretical_std_dev(),
    );

    Some(SelectedBarStats {
        successes: selected,
        frequency,
        z_score: z,
        p_value: two_tailed_p_value(z),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_cdf_monotone_and_bounded(a in -8.0f64..8.0, b in -8.0f64..8.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (fl, fh) = (normal_cdf(lo), normal_cdf(hi));
            prop_assert!((0.0..=1.0).contains(&fl));
            prop_assert!((0.0..=1.0).contains(&fh));
            prop_assert!(fl <= fh + 1e-12);
        }

        #[test]
        fn prop_p_value_in_unit_interval(z in -50.0f64..50.0) {
            let p = two_tailed_p_value(z);
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&p));
        }
    }
}
