//! White noise generator, seeded per call site for deterministic renders.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Noise generator state. Each call site in each voice gets its own seeded
/// `ChaCha8Rng`, so renders are reproducible and voices never observe each
/// other's stream.
#[derive(Debug, Clone)]
pub struct NoiseState {
    rng: ChaCha8Rng,
}

impl NoiseState {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One sample of uniform white noise in [-amps, amps).
    pub fn tick(&mut self, amps: f32) -> f32 {
        self.rng.gen_range(-1.0..1.0) * amps
    }
}
