//! Particle lifecycle policy.
//!
//! Controls how the playground solver ages, perturbs and culls particles.
//!
//! # Per-tick Behavior
//!
//! | Stage | Effect |
//! |-------|--------|
//! | Integrate | `age += 1` for every live particle |
//! | Apply forces | `velocity += force * time_step` |
//! | Age reset | with probability `1 / reset_one_in` per block, every age in the block is redrawn from `[0, reset_age_window)` |
//! | Cull | particles with `age >= max_age` are removed |
//!
//! The age reset is a visual-variety placeholder rather than a physical
//! rule. Set `reset_one_in` to 0 (or call [`Lifecycle::without_age_reset`])
//! for fully deterministic aging.
//!
//! # Example
//!
//! ```ignore
//! let lifecycle = Lifecycle::new()
//!     .max_age(120.0)
//!     .time_step(0.02)
//!     .without_age_reset();
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle configuration builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifecycle {
    /// Simulated time units per tick, scales accumulated forces.
    pub time_step: f32,
    /// Particles whose age reaches this value are culled.
    pub max_age: f32,
    /// Per-block chance of an age reset each tick is `1 / reset_one_in` (0 = never).
    pub reset_one_in: u32,
    /// Reset ages are drawn from `0..reset_age_window` (integers).
    pub reset_age_window: u32,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            max_age: 50.0,
            reset_one_in: 10,
            reset_age_window: 70,
        }
    }
}

impl Lifecycle {
    /// The reference lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the force integration time step.
    pub fn time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    /// Set the age at which particles are culled.
    pub fn max_age(mut self, max_age: f32) -> Self {
        self.max_age = max_age;
        self
    }

    /// Configure the stochastic age reset.
    ///
    /// # Arguments
    ///
    /// * `one_in` - A block is reset on a tick with probability `1 / one_in`
    /// * `window` - New ages are drawn from `0..window`
    pub fn age_reset(mut self, one_in: u32, window: u32) -> Self {
        self.reset_one_in = one_in;
        self.reset_age_window = window;
        self
    }

    /// Disable the stochastic age reset.
    pub fn without_age_reset(mut self) -> Self {
        self.reset_one_in = 0;
        self
    }

    /// Whether ages are ever redrawn.
    pub fn has_age_reset(&self) -> bool {
        self.reset_one_in > 0 && self.reset_age_window > 0
    }

    /// Whether a particle of this age is culled.
    #[inline]
    pub fn is_expired(&self, age: f32) -> bool {
        age >= self.max_age
    }
}
