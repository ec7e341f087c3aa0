//! Deterministic random number generation.
//!
//! Implements PCG (Permuted Congruential Generator) with partitioned seeds
//! so that every run drawn from one master seed is reproducible.
//!
//! # Reproducibility Guarantee
//!
//! Given the same master seed, all Bernoulli draws are bitwise-identical
//! across different runs and platforms.

use rand::prelude::*;
use rand_pcg::Pcg64;

/// Golden-ratio increment used to derive stream seeds.
const STREAM_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic, reproducible random number generator.
#[derive(Debug, Clone)]
pub struct SimRng {
    /// Master seed for reproducibility.
    master_seed: u64,
    /// Next stream index handed out by [`SimRng::partition`].
    stream: u64,
    /// Internal PCG state.
    rng: Pcg64,
}

impl SimRng {
    /// Create a new RNG with the given master seed.
    #[must_use]
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            stream: 0,
            rng: Pcg64::seed_from_u64(master_seed),
        }
    }

    /// Get the master seed.
    #[must_use]
    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Get current stream index.
    #[must_use]
    pub const fn stream(&self) -> u64 {
        self.stream
    }

    /// Create `n` independent RNGs derived from the master seed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use binosim::engine::rng::SimRng;
    ///
    /// let mut rng = SimRng::new(42);
    /// let partitions = rng.partition(4);
    /// assert_eq!(partitions.len(), 4);
    /// assert_eq!(rng.stream(), 4);
    /// ```
    #[must_use]
    pub fn partition(&mut self, n: usize) -> Vec<Self> {
        let partitions: Vec<Self> = (0..n)
            .map(|i| {
                let stream = self.stream + i as u64;
                let seed = self
                    .master_seed
                    .wrapping_add(stream.wrapping_add(1).wrapping_mul(STREAM_MIX));
                Self {
                    master_seed: self.master_seed,
                    stream,
                    rng: Pcg64::seed_from_u64(seed),
                }
            })
            .collect();

        self.stream += n as u64;
        partitions
    }

    /// Split off the next single stream.
    #[must_use]
    pub fn next_stream(&mut self) -> Self {
        let mut parts = self.partition(1);
        parts.pop().unwrap_or_else(|| Self::new(self.master_seed))
    }

    /// Generate a random f64 in [0, 1).
    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// One Bernoulli trial: a uniform draw strictly below `p` is a success.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.gen_f64() < p
    }

    /// Count successes over `trials` independent Bernoulli draws.
    pub fn count_successes(&mut self, trials: u64, p: f64) -> u64 {
        let mut successes = 0;
        for _ in 0..trials {
            if self.bernoulli(p) {
                successes += 1;
            }
        }
        successes
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(42)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_reproducibility(seed in 0u64..u64::MAX) {
            let mut rng1 = SimRng::new(seed);
            let mut rng2 = SimRng::new(seed);

            let seq1: Vec<f64> = (0..100).map(|_| rng1.gen_f64()).collect();
            let seq2: Vec<f64> = (0..100).map(|_| rng2.gen_f64()).collect();

            prop_assert_eq!(seq1, seq2);
        }

        #[test]
        fn prop_unit_interval(seed in 0u64..u64::MAX) {
            let mut rng = SimRng::new(seed);

            for _ in 0..100 {
                let v = rng.gen_f64();
                prop_assert!((0.0..1.0).contains(&v), "Value {} not in [0, 1)", v);
            }
        }

        #[test]
        fn prop_successes_within_trials(seed in 0u64..10_000, trials in 0u64..500, p in 0.0f64..=1.0) {
            let mut rng = SimRng::new(seed);
            let k = rng.count_successes(trials, p);
            prop_assert!(k <= trials);
        }
    }
}
