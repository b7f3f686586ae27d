//! Sampling corpus indices without replacement.
//!
//! `SampleState` remembers every index handed out so far. It is owned by the
//! caller, so its lifetime is whatever the caller makes it: a single run by
//! default, or several runs when the run command persists it to disk.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error(
        "cannot draw {requested} unique questions: {available} of {total} remain unvisited"
    )]
    InsufficientPopulation {
        requested: usize,
        available: usize,
        total: usize,
    },
}

/// Indices already drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleState {
    visited: BTreeSet<usize>,
}

impl SampleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.visited.contains(&index)
    }

    /// Record an index; returns false if it was already present.
    pub fn mark(&mut self, index: usize) -> bool {
        self.visited.insert(index)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn clear(&mut self) {
        self.visited.clear();
    }

    /// Number of indices in `[0, total)` not yet drawn.
    pub fn remaining(&self, total: usize) -> usize {
        total - self.visited.range(..total).count()
    }
}

/// Draw `n` distinct indices from `[0, total)` that are not in `state`.
///
/// The returned order is draw order. Every returned index is recorded in
/// `state`. On error `state` is left untouched.
pub fn sample<R>(
    n: usize,
    total: usize,
    state: &mut SampleState,
    rng: &mut R,
) -> Result<Vec<usize>, SampleError>
where
    R: Rng + ?Sized,
{
    let available = state.remaining(total);
    if n > total || n > available {
        return Err(SampleError::InsufficientPopulation {
            requested: n,
            available,
            total,
        });
    }

    let mut pool: Vec<usize> = (0..total).filter(|idx| !state.contains(*idx)).collect();
    let (chosen, _) = pool.partial_shuffle(rng, n);
    let chosen = chosen.to_vec();
    for &idx in &chosen {
        state.mark(idx);
    }
    Ok(chosen)
}

/// Random source for a run, optionally seeded for reproducible draws.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn sample(
        &mut self,
        n: usize,
        total: usize,
        state: &mut SampleState,
    ) -> Result<Vec<usize>, SampleError> {
        sample(n, total, state, &mut self.rng)
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
