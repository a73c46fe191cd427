//! xorshift64* random number generator
//!
//! This is a fast, high-quality PRNG that is deterministic and suitable
//! for instance generation.
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers → same preference lists.
//! This is what makes a batch reproducible from its seed alone.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use stable_match_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let index = rng.index(10); // [0, 10)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// # Example
    /// ```
    /// use stable_match_core_rs::RngManager;
    ///
    /// let rng = RngManager::new(12345);
    /// ```
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Create an RNG for one stream of a seeded family.
    ///
    /// Streams with different `stream` values are independent of each
    /// other, and the same `(seed, stream)` always yields the same sequence.
    /// The batch runner uses one stream per trial so that results do not
    /// depend on the order trials are dispatched in.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::new(splitmix64(seed ^ splitmix64(stream)))
    }

    /// Generate next random u64 value
    ///
    /// This advances the internal state and returns a random value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random index in range [0, upper)
    ///
    /// # Panics
    /// Panics if upper == 0
    pub fn index(&mut self, upper: usize) -> usize {
        assert!(upper > 0, "upper bound must be positive");

        (self.next() % upper as u64) as usize
    }

    /// Shuffle a slice in place (Fisher–Yates)
    ///
    /// # Example
    /// ```
    /// use stable_match_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// let mut items = vec![1, 2, 3, 4];
    /// rng.shuffle(&mut items);
    /// items.sort();
    /// assert_eq!(items, vec![1, 2, 3, 4]);
    /// ```
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }

    /// Get current RNG state (for replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }
}

/// splitmix64 finalizer, used to spread seeds over the state space
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
