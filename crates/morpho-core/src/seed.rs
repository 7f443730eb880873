//! Deterministic seed derivation for reproducible candidate sampling.
//!
//! The controller owns a single root seed; each recomputation round derives
//! a child seed from it, so a run is reproducible regardless of how many
//! worker threads score the candidates.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Derive a child seed from a parent seed and a string key.
///
/// Uses `DefaultHasher` (SipHash-1-3) for fast, deterministic mixing.
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
///
/// Convenience wrapper for indexed children (recomputation rounds).
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Create a `ChaCha8Rng` seeded for a specific round of a run.
#[must_use]
pub fn round_rng(root_seed: u64, round: u64) -> rand_chacha::ChaCha8Rng {
    use rand::SeedableRng;
    rand_chacha::ChaCha8Rng::seed_from_u64(derive_seed_indexed(root_seed, round))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
