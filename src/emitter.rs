//! Emission shapes for newly spawned particles.
//!
//! The playground solver emits exactly one particle per tick. The emitter
//! only decides where it appears and how fast it moves.
//!
//! # Emitter Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Emitter::Line`] | Random point on a segment, quantized to `steps` positions |
//! | [`Emitter::Point`] | Fixed position |
//!
//! # Example
//!
//! ```ignore
//! // Reference emitter: x in {0.00, 0.01, ..., 0.99}, y = 0, z = 1, moving up
//! let emitter = Emitter::default();
//!
//! let fountain = Emitter::Point {
//!     position: Vec3::ZERO,
//!     velocity: Vec3::new(0.0, 0.5, 0.0),
//! };
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::spawn::SpawnContext;

/// Particle emitter configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Emitter {
    /// Spawn at `start + (end - start) * k / steps` for a random `k` in `0..steps`.
    Line {
        /// Segment start (k = 0).
        start: Vec3,
        /// Segment end (never reached).
        end: Vec3,
        /// Number of distinct spawn positions. Zero always spawns at `start`.
        steps: u32,
        /// Initial velocity.
        velocity: Vec3,
    },

    /// Spawn every particle at the same position.
    Point {
        /// Spawn position.
        position: Vec3,
        /// Initial velocity.
        velocity: Vec3,
    },
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter::Line {
            start: Vec3::new(0.0, 0.0, 1.0),
            end: Vec3::new(1.0, 0.0, 1.0),
            steps: 100,
            velocity: Vec3::new(0.0, 0.1, 0.0),
        }
    }
}

impl Emitter {
    /// Initial `(position, velocity)` of the next particle.
    pub fn spawn(&self, ctx: &mut SpawnContext) -> (Vec3, Vec3) {
        match self {
            Emitter::Line {
                start,
                end,
                steps,
                velocity,
            } => {
                if *steps == 0 {
                    return (*start, *velocity);
                }
                let k = ctx.random_uint(0, *steps);
                let t = k as f32 / *steps as f32;
                (*start + (*end - *start) * t, *velocity)
            }
            Emitter::Point { position, velocity } => (*position, *velocity),
        }
    }
}
