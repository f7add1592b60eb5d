//! Deterministic random number generation for deck shuffles.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Full seed**: The 256-bit ChaCha key is kept, so an entropy-seeded
//!   deck can come out in any of the 108! orders
//! - **Serializable**: O(1) state capture and restore, so a snapshot can
//!   carry its RNG and every reshuffle depends only on the snapshot
//! - **Unbiased**: ChaCha8 stream feeding a Fisher-Yates shuffle
//!
//! ## Snapshot Usage
//!
//! ```
//! use uno_engine::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! let mut cards: Vec<u8> = (0..10).collect();
//! rng.shuffle(&mut cards);
//!
//! // Persist the position and resume later
//! let state = rng.state();
//! let mut resumed = GameRng::from_state(&state);
//! assert_eq!(rng.gen_range_usize(0..100), resumed.gen_range_usize(0..100));
//! ```

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG used for every shuffle in a game.
///
/// Uses ChaCha8 for speed while maintaining cryptographic quality randomness.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    /// Create a new RNG from a short seed, expanded to a full key.
    ///
    /// Reproducible but limited to 2^64 streams; use `from_entropy` for
    /// real games.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create an RNG from a full 256-bit key.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Create an RNG keyed from the operating system's entropy source.
    #[must_use]
    pub fn from_entropy() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// The key this stream started from.
    #[must_use]
    pub fn seed(&self) -> [u8; 32] {
        self.inner.get_seed()
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Shuffle a slice in place.
    ///
    /// `SliceRandom::shuffle` is a Fisher-Yates shuffle, so every
    /// permutation is equally likely.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.inner.get_seed(),
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::from_seed(state.seed);
        inner.set_word_pos(state.word_pos);
        Self { inner }
    }
}

/// Serializable RNG state stored inside every snapshot.
///
/// Uses ChaCha8 word position for O(1) serialization regardless of
/// how many random numbers have been generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRngState {
    /// ChaCha8 key
    pub seed: [u8; 32],
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
}
