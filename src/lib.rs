//! # bparticles - Block-pooled particle storage and step solver
//!
//! Particles live in fixed-capacity blocks of named attribute arrays
//! (structure-of-arrays). A solver advances them tick by tick: integrate,
//! accumulate pluggable forces, cull expired particles, emit new ones and
//! compact the blocks so storage stays dense.
//!
//! ## Quick Start
//!
//! ```ignore
//! use bparticles::prelude::*;
//!
//! let solver = PlaygroundSolver::new(
//!     Description::new()
//!         .with_rule(Rule::Gravity(0.5))
//!         .with_rule(Rule::Drag(0.1))
//!         .with_seed(42),
//! );
//!
//! let mut state = solver.init()?;
//! for _ in 0..1000 {
//!     solver.step(&mut state)?;
//! }
//!
//! let mut positions = vec![Vec3::ZERO; solver.particle_amount(&state)];
//! solver.get_positions(&state, &mut positions)?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! A particle type is a plain struct of `f32` and `Vec3` fields. Deriving
//! [`Particle`] maps each `f32` field to a scalar attribute and each `Vec3`
//! field to a vector attribute, named in PascalCase:
//!
//! ```ignore
//! #[derive(Particle, Clone, Copy)]
//! struct Spark {
//!     position: Vec3,                // "Position"
//!     velocity: Vec3,                // "Velocity"
//!     age: f32,                      // "Age"
//!     #[attribute("Heat")]
//!     temperature: f32,              // "Heat"
//! }
//! ```
//!
//! ### Blocks and Containers
//!
//! A [`ParticleBlock`] holds up to `block_size` particles. Its live
//! particles always occupy the slots `0..active_amount()`. A
//! [`ParticlesContainer`] owns the blocks, hands out [`BlockHandle`]s and
//! moves particles between blocks when compacting.
//!
//! ### Forces
//!
//! Built-in [`Rule`]s and user types implementing [`Force`] add into a
//! per-particle force accumulator each step. See [`rules`].
//!
//! ### Configuration
//!
//! [`SimConfig`] loads a description from JSON. See [`config`].
//!
//! ## Logging
//!
//! The solver emits `tracing` events: one `debug` event per step with the
//! tick, particle and block counts, and `trace` events when blocks are
//! allocated or released. Install any `tracing` subscriber to see them.

extern crate self as bparticles;

pub mod attributes;
pub mod block;
pub mod config;
pub mod container;
mod emitter;
pub mod error;
pub mod lifecycle;
pub mod rules;
mod simulation;
mod spawn;

pub use attributes::{AttributeBuffers, BlockBuffers, Schema, AGE, POSITION, VELOCITY};
pub use block::ParticleBlock;
pub use bparticles_derive::Particle;
pub use config::SimConfig;
pub use container::{BlockHandle, ParticlesContainer};
pub use emitter::Emitter;
pub use error::{ConfigError, ParticleError, Result, ViolationKind};
pub use glam::Vec3;
pub use lifecycle::Lifecycle;
pub use rules::{Falloff, Force, Rule};
pub use simulation::{
    Description, PlaygroundParticle, PlaygroundSolver, PlaygroundState, Solver,
    DEFAULT_BLOCK_SIZE,
};
pub use spawn::SpawnContext;

/// Trait automatically implemented by `#[derive(Particle)]`.
///
/// Describes which attributes a particle type occupies and how one row of
/// a block's buffers converts to and from the struct.
///
/// # Example
///
/// ```ignore
/// #[derive(Particle, Clone, Copy)]
/// struct Dot {
///     position: Vec3,
///     size: f32,
/// }
///
/// assert_eq!(Dot::VECTORS, &["Position"]);
/// assert_eq!(Dot::SCALARS, &["Size"]);
/// ```
pub trait ParticleTrait: Sized {
    /// Scalar (`f32`) attribute names, in field order.
    const SCALARS: &'static [&'static str];

    /// Vector (`Vec3`) attribute names, in field order.
    const VECTORS: &'static [&'static str];

    /// The block schema for this particle type.
    ///
    /// Fails with [`ParticleError::DuplicateAttribute`] when two fields map
    /// to the same name.
    fn schema() -> Result<Schema> {
        Schema::new(Self::SCALARS.iter().copied(), Self::VECTORS.iter().copied())
    }

    /// Write this particle into slot `index`.
    fn write_to(&self, buffers: &mut AttributeBuffers, index: usize) -> Result<()>;

    /// Read the particle stored in slot `index`.
    fn read_from(buffers: &AttributeBuffers, index: usize) -> Result<Self>;
}

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use bparticles::prelude::*;
/// ```
pub mod prelude {
    pub use crate::container::{BlockHandle, ParticlesContainer};
    pub use crate::emitter::Emitter;
    pub use crate::lifecycle::Lifecycle;
    pub use crate::rules::{Falloff, Force, Rule};
    pub use crate::simulation::{Description, PlaygroundParticle, PlaygroundSolver, Solver};
    pub use crate::spawn::SpawnContext;
    pub use crate::{BlockBuffers, Particle, ParticleTrait, SimConfig, Vec3};
}
