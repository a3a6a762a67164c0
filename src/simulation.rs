//! Simulation description and step solver.
//!
//! A [`Description`] collects the block size, force contributors, lifecycle
//! policy, emitter and seed. A [`Solver`] turns it into an opaque state with
//! [`Solver::init`] and advances that state one tick per [`Solver::step`].
//!
//! # Step Pipeline
//!
//! For every block, in container iteration order:
//!
//! 1. Integrate: `position += velocity`, `age += 1`
//! 2. Accumulate forces from every contributor, in registration order
//! 3. Apply forces: `velocity += force * time_step`
//! 4. Age reset: occasionally redraw every age in the block
//! 5. Cull particles with `age >= max_age`, keeping the active prefix contiguous
//!
//! Then, once per tick:
//!
//! 6. Emit one new particle into the first block with room
//! 7. Compact all blocks and release the empty ones
//!
//! # Example
//!
//! ```ignore
//! let solver = PlaygroundSolver::new(
//!     Description::new()
//!         .with_rule(Rule::Gravity(0.5))
//!         .with_seed(7),
//! );
//! let mut state = solver.init()?;
//! for _ in 0..100 {
//!     solver.step(&mut state)?;
//! }
//! let mut positions = vec![Vec3::ZERO; solver.particle_amount(&state)];
//! solver.get_positions(&state, &mut positions)?;
//! ```

use std::fmt;

use glam::Vec3;

use crate::attributes::{AGE, POSITION, VELOCITY};
use crate::block::ParticleBlock;
use crate::container::{BlockHandle, ParticlesContainer};
use crate::emitter::Emitter;
use crate::error::Result;
use crate::lifecycle::Lifecycle;
use crate::rules::{Force, Rule};
use crate::spawn::SpawnContext;
use crate::Particle;

/// Block capacity of the reference simulation.
pub const DEFAULT_BLOCK_SIZE: usize = 10;

/// Everything a solver needs to build and advance a simulation.
pub struct Description {
    block_size: usize,
    forces: Vec<Box<dyn Force>>,
    lifecycle: Lifecycle,
    emitter: Emitter,
    seed: Option<u64>,
}

impl Default for Description {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            forces: Vec::new(),
            lifecycle: Lifecycle::default(),
            emitter: Emitter::default(),
            seed: None,
        }
    }
}

impl fmt::Debug for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Description")
            .field("block_size", &self.block_size)
            .field("forces", &self.forces.len())
            .field("lifecycle", &self.lifecycle)
            .field("emitter", &self.emitter)
            .field("seed", &self.seed)
            .finish()
    }
}

impl Description {
    /// The reference description: blocks of 10, no forces, unseeded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity of every block.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Add a built-in rule.
    pub fn with_rule(self, rule: Rule) -> Self {
        self.with_force(rule)
    }

    /// Add a force contributor. Contributors run in the order they are added.
    pub fn with_force<F: Force + 'static>(mut self, force: F) -> Self {
        self.forces.push(Box::new(force));
        self
    }

    /// Replace the lifecycle policy.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Replace the emitter.
    pub fn with_emitter(mut self, emitter: Emitter) -> Self {
        self.emitter = emitter;
        self
    }

    /// Seed the simulation RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Force contributors in consultation order.
    pub fn forces(&self) -> &[Box<dyn Force>] {
        &self.forces
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// A time-stepping particle solver.
///
/// The state is created by [`init`](Solver::init) and only ever touched
/// through the solver's own methods.
pub trait Solver {
    /// Solver-owned simulation state.
    type State;

    /// Build a fresh state.
    fn init(&self) -> Result<Self::State>;

    /// Advance the state by one tick.
    fn step(&self, state: &mut Self::State) -> Result<()>;

    /// Number of live particles.
    fn particle_amount(&self, state: &Self::State) -> usize;

    /// Copy every live position into `dst`, block by block.
    ///
    /// Returns the number of positions written, or
    /// [`InsufficientCapacity`](crate::ParticleError::InsufficientCapacity)
    /// when `dst` is shorter than [`particle_amount`](Solver::particle_amount).
    fn get_positions(&self, state: &Self::State, dst: &mut [Vec3]) -> Result<usize>;

    /// [`get_positions`](Solver::get_positions) into a plain `[f32; 3]` host buffer.
    fn get_positions_raw(&self, state: &Self::State, dst: &mut [[f32; 3]]) -> Result<usize> {
        self.get_positions(state, bytemuck::cast_slice_mut(dst))
    }
}

/// The particle row the playground solver stores.
#[derive(Particle, Clone, Copy, Debug, PartialEq)]
pub struct PlaygroundParticle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
}

/// Opaque state of a [`PlaygroundSolver`].
#[derive(Debug)]
pub struct PlaygroundState {
    particles: ParticlesContainer,
    spawn: SpawnContext,
    tick: u64,
}

impl PlaygroundState {
    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Read-only access to the particle storage.
    pub fn particles(&self) -> &ParticlesContainer {
        &self.particles
    }

    /// Seed of the state's RNG.
    pub fn seed(&self) -> u64 {
        self.spawn.seed()
    }
}

/// The reference solver: ballistic motion, pluggable forces, age-based
/// culling and one emitted particle per tick.
#[derive(Debug)]
pub struct PlaygroundSolver {
    description: Description,
}

impl PlaygroundSolver {
    pub fn new(description: Description) -> Self {
        Self { description }
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Integrate, apply forces and maybe reset ages for one block.
    pub fn step_block(&self, block: &mut ParticleBlock, spawn: &mut SpawnContext) -> Result<()> {
        let active = block.active_amount();
        let lifecycle = self.description.lifecycle();

        {
            let (positions, velocities) = block.buffers_mut().vector_pair_mut(POSITION, VELOCITY)?;
            for (position, velocity) in positions[..active].iter_mut().zip(&velocities[..active]) {
                *position += *velocity;
            }
        }
        for age in &mut block.scalar_mut(AGE)?[..active] {
            *age += 1.0;
        }

        let mut combined_force = vec![Vec3::ZERO; active];
        let buffers = block.view();
        for force in self.description.forces() {
            force.add_force(&buffers, &mut combined_force)?;
        }

        let time_step = lifecycle.time_step;
        for (velocity, force) in block.vector_mut(VELOCITY)?[..active]
            .iter_mut()
            .zip(&combined_force)
        {
            *velocity += *force * time_step;
        }

        if lifecycle.has_age_reset() && spawn.chance(lifecycle.reset_one_in) {
            let window = lifecycle.reset_age_window;
            for age in &mut block.scalar_mut(AGE)?[..active] {
                *age = spawn.random_uint(0, window) as f32;
            }
        }

        Ok(())
    }

    /// Remove every expired particle from `block`.
    ///
    /// Expired particles are overwritten by the last live particle, so the
    /// active prefix stays contiguous. Returns the number removed.
    pub fn delete_old_particles(&self, block: &mut ParticleBlock) -> Result<usize> {
        let lifecycle = self.description.lifecycle();
        let mut removed = 0;
        let mut index = 0;

        while index < block.active_amount() {
            let last = block.active_amount() - 1;
            let ages = block.scalar(AGE)?;

            if !lifecycle.is_expired(ages[index]) {
                index += 1;
                continue;
            }
            if lifecycle.is_expired(ages[last]) {
                block.set_active_amount(last)?;
                removed += 1;
                continue;
            }
            block.move_particle(last, index);
            index += 1;
            block.set_active_amount(last)?;
            removed += 1;
        }

        Ok(removed)
    }

    /// Emit one particle into the first block with room.
    pub fn emit_new_particles(
        &self,
        particles: &mut ParticlesContainer,
        spawn: &mut SpawnContext,
    ) -> Result<BlockHandle> {
        let (position, velocity) = self.description.emitter().spawn(spawn);
        particles.push(&PlaygroundParticle {
            position,
            velocity,
            age: 0.0,
        })
    }

    /// Compact all blocks and release the empty ones.
    pub fn compress_all_blocks(&self, particles: &mut ParticlesContainer) -> usize {
        particles.compress()
    }
}

impl Solver for PlaygroundSolver {
    type State = PlaygroundState;

    fn init(&self) -> Result<PlaygroundState> {
        let particles =
            ParticlesContainer::for_particle::<PlaygroundParticle>(self.description.block_size())?;
        let spawn = match self.description.seed() {
            Some(seed) => SpawnContext::from_seed(seed),
            None => SpawnContext::from_entropy(),
        };
        tracing::debug!(
            block_size = particles.block_size(),
            forces = self.description.forces().len(),
            seed = spawn.seed(),
            "initialized playground state"
        );
        Ok(PlaygroundState {
            particles,
            spawn,
            tick: 0,
        })
    }

    fn step(&self, state: &mut PlaygroundState) -> Result<()> {
        let mut culled = 0;
        for handle in state.particles.active_blocks() {
            let block = state.particles.block_mut(handle)?;
            self.step_block(block, &mut state.spawn)?;
            culled += self.delete_old_particles(block)?;
        }

        self.emit_new_particles(&mut state.particles, &mut state.spawn)?;
        let released = self.compress_all_blocks(&mut state.particles);
        state.tick += 1;

        tracing::debug!(
            tick = state.tick,
            particles = state.particles.particle_amount(),
            blocks = state.particles.block_count(),
            culled,
            released,
            "step"
        );
        Ok(())
    }

    fn particle_amount(&self, state: &PlaygroundState) -> usize {
        state.particles.particle_amount()
    }

    fn get_positions(&self, state: &PlaygroundState, dst: &mut [Vec3]) -> Result<usize> {
        state.particles.copy_vectors(POSITION, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::BlockBuffers;
    use crate::ParticleTrait;

    fn quiet() -> Description {
        Description::new()
            .with_seed(1)
            .with_lifecycle(Lifecycle::new().without_age_reset())
    }

    fn block_with(ages: &[f32]) -> ParticleBlock {
        let mut particles = ParticlesContainer::for_particle::<PlaygroundParticle>(ages.len()).unwrap();
        let handle = particles.new_block();
        let mut block = particles.block(handle).unwrap().clone();
        for (i, age) in ages.iter().enumerate() {
            block
                .push(&PlaygroundParticle {
                    position: Vec3::new(i as f32, 0.0, 0.0),
                    velocity: Vec3::ZERO,
                    age: *age,
                })
                .unwrap();
        }
        block
    }

    #[test]
    fn test_playground_schema() {
        assert_eq!(PlaygroundParticle::SCALARS, &["Age"]);
        assert_eq!(PlaygroundParticle::VECTORS, &["Position", "Velocity"]);
    }

    #[test]
    fn test_description_builder() {
        let description = Description::new()
            .with_block_size(32)
            .with_rule(Rule::Gravity(1.0))
            .with_rule(Rule::Drag(0.1))
            .with_seed(9);
        assert_eq!(description.block_size(), 32);
        assert_eq!(description.forces().len(), 2);
        assert_eq!(description.seed(), Some(9));
        assert!(format!("{:?}", description).contains("forces: 2"));
    }

    #[test]
    fn test_init_is_empty() {
        let solver = PlaygroundSolver::new(quiet());
        let state = solver.init().unwrap();
        assert_eq!(solver.particle_amount(&state), 0);
        assert_eq!(state.particles().block_count(), 0);
        assert_eq!(state.tick(), 0);
        assert_eq!(state.seed(), 1);
    }

    #[test]
    fn test_init_rejects_zero_block_size() {
        let solver = PlaygroundSolver::new(quiet().with_block_size(0));
        assert!(solver.init().is_err());
    }

    #[test]
    fn test_step_block_integrates() {
        let solver = PlaygroundSolver::new(quiet().with_rule(Rule::Acceleration(Vec3::Y)));
        let mut block = block_with(&[3.0]);
        block.vector_mut(VELOCITY).unwrap()[0] = Vec3::X;
        let mut spawn = SpawnContext::from_seed(0);

        solver.step_block(&mut block, &mut spawn).unwrap();
        let particle: PlaygroundParticle = block.read(0).unwrap();
        assert_eq!(particle.position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(particle.age, 4.0);
        // velocity += (0, 1, 0) * 0.01
        assert!((particle.velocity - Vec3::new(1.0, 0.01, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_step_block_leaves_inactive_slots() {
        let solver = PlaygroundSolver::new(quiet());
        let mut block = block_with(&[1.0, 2.0]);
        block.set_active_amount(1).unwrap();
        let mut spawn = SpawnContext::from_seed(0);

        solver.step_block(&mut block, &mut spawn).unwrap();
        assert_eq!(block.scalar(AGE).unwrap()[..2], [2.0, 2.0]);
    }

    #[test]
    fn test_forces_see_only_live_particles() {
        struct CountingForce;
        impl Force for CountingForce {
            fn add_force(&self, buffers: &BlockBuffers<'_>, forces: &mut [Vec3]) -> Result<()> {
                assert_eq!(forces.len(), buffers.active_amount());
                assert_eq!(buffers.vector(POSITION)?.len(), forces.len());
                Ok(())
            }
        }

        let solver = PlaygroundSolver::new(quiet().with_force(CountingForce));
        let mut block = block_with(&[1.0, 2.0, 3.0]);
        block.set_active_amount(2).unwrap();
        solver
            .step_block(&mut block, &mut SpawnContext::from_seed(0))
            .unwrap();
    }

    #[test]
    fn test_age_reset_redraws_ages() {
        let lifecycle = Lifecycle::new().age_reset(1, 70);
        let solver = PlaygroundSolver::new(Description::new().with_lifecycle(lifecycle));
        let mut block = block_with(&[100.0, 200.0, 300.0]);
        solver
            .step_block(&mut block, &mut SpawnContext::from_seed(4))
            .unwrap();

        for age in &block.scalar(AGE).unwrap()[..3] {
            assert!(*age >= 0.0 && *age < 70.0);
            assert_eq!(age.fract(), 0.0);
        }
    }

    #[test]
    fn test_delete_old_particles() {
        let solver = PlaygroundSolver::new(quiet());
        let mut block = block_with(&[10.0, 55.0, 20.0, 50.0, 30.0, 70.0]);

        let removed = solver.delete_old_particles(&mut block).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(block.active_amount(), 3);

        let mut ages = block.scalar(AGE).unwrap()[..3].to_vec();
        ages.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(ages, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_delete_all_particles() {
        let solver = PlaygroundSolver::new(quiet());
        let mut block = block_with(&[50.0, 60.0, 70.0]);
        assert_eq!(solver.delete_old_particles(&mut block).unwrap(), 3);
        assert!(block.is_empty());
    }

    #[test]
    fn test_emit_uses_first_free_block() {
        let solver = PlaygroundSolver::new(quiet().with_block_size(2));
        let mut particles = ParticlesContainer::for_particle::<PlaygroundParticle>(2).unwrap();
        let mut spawn = SpawnContext::from_seed(0);

        let a = solver.emit_new_particles(&mut particles, &mut spawn).unwrap();
        let b = solver.emit_new_particles(&mut particles, &mut spawn).unwrap();
        let c = solver.emit_new_particles(&mut particles, &mut spawn).unwrap();
        assert_eq!(a, b);
        assert_ne!(b, c);

        let emitted: PlaygroundParticle = particles.block(c).unwrap().read(0).unwrap();
        assert_eq!(emitted.age, 0.0);
        assert_eq!(emitted.velocity, Vec3::new(0.0, 0.1, 0.0));
        assert_eq!(emitted.position.z, 1.0);
    }

    #[test]
    fn test_step_emits_one_particle() {
        let solver = PlaygroundSolver::new(quiet());
        let mut state = solver.init().unwrap();
        for tick in 1..=5 {
            solver.step(&mut state).unwrap();
            assert_eq!(solver.particle_amount(&state), tick);
        }
        assert_eq!(state.tick(), 5);
    }

    #[test]
    fn test_particles_expire() {
        let solver = PlaygroundSolver::new(quiet());
        let mut state = solver.init().unwrap();
        for _ in 0..200 {
            solver.step(&mut state).unwrap();
        }
        // Ages 0..=49 survive, one emitted per tick
        assert_eq!(solver.particle_amount(&state), 50);
        assert_eq!(state.particles().block_count(), 5);
    }

    #[test]
    fn test_get_positions_raw() {
        let solver = PlaygroundSolver::new(quiet().with_emitter(Emitter::Point {
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::ZERO,
        }));
        let mut state = solver.init().unwrap();
        solver.step(&mut state).unwrap();
        solver.step(&mut state).unwrap();

        let mut raw = [[0.0f32; 3]; 2];
        assert_eq!(solver.get_positions_raw(&state, &mut raw).unwrap(), 2);
        assert_eq!(raw, [[1.0, 2.0, 3.0]; 2]);
    }
}
