//! Seeded randomness for stepping and emission.
//!
//! Every random draw the solver makes (age resets, emission positions) goes
//! through one [`SpawnContext`] owned by the simulation state, so a run is
//! reproducible from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random source threaded through the solver.
///
/// ```ignore
/// let mut ctx = SpawnContext::from_seed(7);
/// if ctx.chance(10) {
///     let age = ctx.random_uint(0, 70) as f32;
/// }
/// ```
#[derive(Clone, Debug)]
pub struct SpawnContext {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SpawnContext {
    /// Deterministic context.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Context seeded from the clock, different each program execution.
    pub fn from_entropy() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::from_seed(seed)
    }

    /// The seed this context started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random u32 in `min..max`.
    #[inline]
    pub fn random_uint(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..max)
    }

    /// `true` with probability `1 / one_in`. Always `false` for 0.
    #[inline]
    pub fn chance(&mut self, one_in: u32) -> bool {
        one_in > 0 && self.rng.gen_range(0..one_in) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SpawnContext::from_seed(99);
        let mut b = SpawnContext::from_seed(99);
        for _ in 0..32 {
            assert_eq!(a.random_uint(0, 1000), b.random_uint(0, 1000));
        }
        assert_eq!(a.seed(), 99);
    }

    #[test]
    fn test_interleaved_draws_replay() {
        // The solver mixes reset rolls and age draws on one stream
        let draw = |ctx: &mut SpawnContext| {
            (0..16)
                .map(|_| if ctx.chance(10) { ctx.random_uint(0, 70) } else { 70 })
                .collect::<Vec<_>>()
        };
        let first = draw(&mut SpawnContext::from_seed(8));
        assert_eq!(first, draw(&mut SpawnContext::from_seed(8)));
        assert!(first.iter().all(|age| *age <= 70));
    }

    #[test]
    fn test_random_uint_range() {
        let mut ctx = SpawnContext::from_seed(1);
        for _ in 0..200 {
            let value = ctx.random_uint(0, 70);
            assert!(value < 70);
        }
    }

    #[test]
    fn test_chance_edges() {
        let mut ctx = SpawnContext::from_seed(3);
        assert!((0..100).all(|_| !ctx.chance(0)));
        assert!((0..100).all(|_| ctx.chance(1)));
    }

    #[test]
    fn test_chance_rate() {
        let mut ctx = SpawnContext::from_seed(5);
        let hits = (0..10_000).filter(|_| ctx.chance(10)).count();
        assert!((700..1300).contains(&hits), "hits = {}", hits);
    }
}
