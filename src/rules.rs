//! Force contributors.
//!
//! Each step, the solver builds a zeroed per-particle force accumulator for
//! every block and hands it to each registered [`Force`] in order. Forces
//! read the block through a [`BlockBuffers`] view and add their contribution;
//! they never resize or reorder anything. The solver then applies
//! `velocity += force * time_step`.
//!
//! # Built-in Rules
//!
//! - **Uniform**: Gravity, Acceleration, Drag
//! - **Point Forces**: AttractTo, RepelFrom, PointGravity, Spring, Radial
//! - **Field Effects**: Vortex
//!
//! # Custom Forces
//!
//! Implement [`Force`] for your own type and register it with
//! [`Description::with_force`](crate::Description::with_force):
//!
//! ```ignore
//! struct Buoyancy(f32);
//!
//! impl Force for Buoyancy {
//!     fn add_force(&self, buffers: &BlockBuffers<'_>, forces: &mut [Vec3]) -> Result<()> {
//!         for (force, position) in forces.iter_mut().zip(buffers.vector(POSITION)?) {
//!             if position.y < 0.0 {
//!                 force.y += self.0;
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::attributes::{BlockBuffers, POSITION, VELOCITY};
use crate::error::Result;

/// Minimum distance below which directional forces are skipped.
const MIN_DISTANCE: f32 = 0.001;

/// A pluggable contribution to the per-particle force accumulator.
///
/// `forces` has exactly `buffers.active_amount()` entries, index-aligned with
/// the view's buffers. Implementations must only add into it.
pub trait Force: Send + Sync {
    /// Add this force's contribution for every live particle of one block.
    fn add_force(&self, buffers: &BlockBuffers<'_>, forces: &mut [Vec3]) -> Result<()>;
}

impl<F: Force + ?Sized> Force for Box<F> {
    fn add_force(&self, buffers: &BlockBuffers<'_>, forces: &mut [Vec3]) -> Result<()> {
        (**self).add_force(buffers, forces)
    }
}

/// Distance falloff functions for force-based rules.
///
/// Controls how a force's strength changes with distance from the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Falloff {
    /// Constant force regardless of distance.
    #[default]
    Constant,

    /// Linear falloff: force decreases linearly to zero at max range.
    Linear,

    /// Inverse falloff: force = 1/distance (with softening).
    Inverse,

    /// Inverse-square falloff: force = 1/distance² (realistic gravity/EM).
    InverseSquare,

    /// Smooth falloff using smoothstep for gradual transitions.
    Smooth,
}

impl Falloff {
    const SOFTENING: f32 = 0.01;

    /// Falloff factor at `dist` for a force reaching `radius`.
    pub fn factor(&self, dist: f32, radius: f32) -> f32 {
        match self {
            Falloff::Constant => 1.0,
            Falloff::Linear => {
                if radius > 0.0 {
                    (1.0 - dist / radius).max(0.0)
                } else {
                    1.0
                }
            }
            Falloff::Inverse => 1.0 / (dist + Self::SOFTENING),
            Falloff::InverseSquare => 1.0 / (dist * dist + Self::SOFTENING * Self::SOFTENING),
            Falloff::Smooth => {
                if radius > 0.0 {
                    1.0 - smoothstep(0.0, radius, dist)
                } else {
                    1.0
                }
            }
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Built-in force contributors.
///
/// Rules are consulted every step in the order they were added. Since forces
/// sum, the order only matters for floating-point reproducibility.
///
/// # Example
///
/// ```ignore
/// Description::new()
///     .with_rule(Rule::Gravity(9.8))
///     .with_rule(Rule::Drag(0.5))
///     .with_rule(Rule::AttractTo { point: Vec3::ZERO, strength: 2.0 });
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    /// Constant downward acceleration (negative Y).
    ///
    /// # Example
    ///
    /// ```ignore
    /// Rule::Gravity(9.8)  // Earth-like gravity
    /// ```
    Gravity(f32),

    /// Constant acceleration in any direction.
    ///
    /// Useful for wind, currents, or directional fields.
    Acceleration(Vec3),

    /// Velocity-proportional damping (air resistance / friction).
    ///
    /// Adds `-velocity * strength`.
    Drag(f32),

    /// Attract particles toward a fixed point with constant magnitude.
    AttractTo {
        /// Target position.
        point: Vec3,
        /// Attraction strength.
        strength: f32,
    },

    /// Repel particles from a fixed point within a radius.
    ///
    /// Force is strongest at the point and falls linearly to zero at `radius`.
    RepelFrom {
        /// Center of repulsion.
        point: Vec3,
        /// Repulsion strength.
        strength: f32,
        /// Effect radius.
        radius: f32,
    },

    /// Rotational force around an axis (vortex/whirlpool effect).
    ///
    /// Pushes particles tangentially around the line through `center` along
    /// `axis`. A degenerate axis falls back to Y.
    Vortex {
        /// Point on rotation axis.
        center: Vec3,
        /// Direction of rotation axis.
        axis: Vec3,
        /// Rotational strength.
        strength: f32,
    },

    /// Inverse-square gravity toward a fixed point.
    PointGravity {
        /// Center of attraction.
        point: Vec3,
        /// Gravitational strength.
        strength: f32,
        /// Softening to prevent singularities.
        softening: f32,
    },

    /// Spring force tethering particles to an anchor (Hooke's law).
    ///
    /// Adds `(anchor - position) * stiffness - velocity * damping`.
    Spring {
        /// Rest position.
        anchor: Vec3,
        /// Spring stiffness.
        stiffness: f32,
        /// Damping factor.
        damping: f32,
    },

    /// Radial force (explode/implode) with configurable falloff.
    ///
    /// Positive strength pushes particles outward, negative pulls inward.
    Radial {
        /// Center of radial force.
        point: Vec3,
        /// Force strength (positive = out, negative = in).
        strength: f32,
        /// Maximum effect radius (0.0 = unlimited).
        radius: f32,
        /// Distance falloff function.
        falloff: Falloff,
    },
}

impl Force for Rule {
    fn add_force(&self, buffers: &BlockBuffers<'_>, forces: &mut [Vec3]) -> Result<()> {
        match self {
            Rule::Gravity(g) => {
                for force in forces.iter_mut() {
                    force.y -= *g;
                }
            }

            Rule::Acceleration(acc) => {
                for force in forces.iter_mut() {
                    *force += *acc;
                }
            }

            Rule::Drag(strength) => {
                let velocities = buffers.vector(VELOCITY)?;
                for (force, velocity) in forces.iter_mut().zip(velocities) {
                    *force -= *velocity * *strength;
                }
            }

            Rule::AttractTo { point, strength } => {
                let positions = buffers.vector(POSITION)?;
                for (force, position) in forces.iter_mut().zip(positions) {
                    let dir = *point - *position;
                    let dist = dir.length();
                    if dist > MIN_DISTANCE {
                        *force += dir / dist * *strength;
                    }
                }
            }

            Rule::RepelFrom { point, strength, radius } => {
                let positions = buffers.vector(POSITION)?;
                for (force, position) in forces.iter_mut().zip(positions) {
                    let dir = *position - *point;
                    let dist = dir.length();
                    if dist < *radius && dist > MIN_DISTANCE {
                        let magnitude = (*radius - dist) / *radius * *strength;
                        *force += dir / dist * magnitude;
                    }
                }
            }

            Rule::Vortex { center, axis, strength } => {
                let axis = axis.try_normalize().unwrap_or(Vec3::Y);
                let positions = buffers.vector(POSITION)?;
                for (force, position) in forces.iter_mut().zip(positions) {
                    let to_particle = *position - *center;
                    // Project onto plane perpendicular to axis
                    let radial = to_particle - axis * to_particle.dot(axis);
                    let dist = radial.length();
                    if dist > MIN_DISTANCE {
                        *force += axis.cross(radial) / dist * *strength;
                    }
                }
            }

            Rule::PointGravity { point, strength, softening } => {
                let positions = buffers.vector(POSITION)?;
                for (force, position) in forces.iter_mut().zip(positions) {
                    let to_point = *point - *position;
                    let dist_sq = to_point.length_squared() + softening * softening;
                    let dist = dist_sq.sqrt();
                    if dist > MIN_DISTANCE {
                        *force += to_point / dist * (*strength / dist_sq);
                    }
                }
            }

            Rule::Spring { anchor, stiffness, damping } => {
                let positions = buffers.vector(POSITION)?;
                let velocities = buffers.vector(VELOCITY)?;
                for ((force, position), velocity) in
                    forces.iter_mut().zip(positions).zip(velocities)
                {
                    *force += (*anchor - *position) * *stiffness - *velocity * *damping;
                }
            }

            Rule::Radial { point, strength, radius, falloff } => {
                let positions = buffers.vector(POSITION)?;
                for (force, position) in forces.iter_mut().zip(positions) {
                    let to_particle = *position - *point;
                    let dist = to_particle.length();
                    let in_range = *radius <= 0.0 || dist < *radius;
                    if in_range && dist > MIN_DISTANCE {
                        let dir = to_particle / dist;
                        *force += dir * *strength * falloff.factor(dist, *radius);
                    }
                }
            }
        }
        Ok(())
    }
}
