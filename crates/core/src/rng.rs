//! RNG module - random piece generation
//!
//! Pieces are independent uniform draws over the full catalog (no bag), except that a
//! match may open with a piece from the fair subset so every opponent starts equal.
//! The generator is seeded so games replay identically in tests and benches.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pieces::FAIR_OPENERS;
use crate::types::PieceKind;

/// Seeded piece generator
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: StdRng,
    seed: u64,
}

impl PieceGenerator {
    /// Create a new generator with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from the thread-local entropy source.
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }

    /// Draw the opening piece from the fair subset.
    pub fn opener(&mut self) -> PieceKind {
        FAIR_OPENERS[self.rng.random_range(0..FAIR_OPENERS.len())]
    }

    /// Draw uniformly from all seven kinds.
    pub fn draw(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.random_range(0..PieceKind::ALL.len())]
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Underlying RNG, shared with penalty-row hole selection.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
