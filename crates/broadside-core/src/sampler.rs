use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::consts::DEFAULT_SAMPLE_SEED;

/// Reproducible tile subset selection.
///
/// Every call seeds a fresh RNG from `seed`, so the selection depends only on
/// the seed and the input order, never on what else the process sampled
/// before. Resumed runs therefore pick exactly the tiles a previous run did.
/// ChaCha8 has a fixed, documented output stream, so the selection also
/// survives `rand` upgrades.
#[derive(Clone, Debug)]
pub struct Sampler {
    seed: u64,
    max_count: usize,
}

impl Sampler {
    pub fn new(seed: u64, max_count: usize) -> Self {
        Self { seed, max_count }
    }

    pub fn with_default_seed(max_count: usize) -> Self {
        Self::new(DEFAULT_SAMPLE_SEED, max_count)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Shuffle `tiles` with the configured seed and keep the first
    /// `min(max_count, tiles.len())`.
    pub fn sample(&self, tiles: &[PathBuf]) -> Vec<PathBuf> {
        sample_tiles(tiles, self.max_count, self.seed)
    }
}

pub fn sample_tiles(tiles: &[PathBuf], max_count: usize, seed: u64) -> Vec<PathBuf> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut sampled = tiles.to_vec();
    sampled.shuffle(&mut rng);
    sampled.truncate(max_count.min(tiles.len()));
    sampled
}
