//! The owning collection of particle blocks.
//!
//! Blocks live in a generational slot map. Callers refer to them through
//! [`BlockHandle`]s (slot index + generation), so a handle obtained from
//! [`ParticlesContainer::active_blocks`] can never reach a block that was
//! released by a later compaction: lookups through it fail with
//! [`ParticleError::StaleHandle`] instead.
//!
//! # Iteration Order
//!
//! Blocks are iterated in creation order. [`active_blocks`](ParticlesContainer::active_blocks)
//! returns every owned block, including blocks that are momentarily empty;
//! consumers check `active_amount()` themselves. Empty blocks only survive
//! until the next [`compress`](ParticlesContainer::compress).

use std::sync::Arc;

use glam::Vec3;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::attributes::Schema;
use crate::block::ParticleBlock;
use crate::error::{ParticleError, Result};
use crate::ParticleTrait;

new_key_type! {
    /// Generation-checked reference to a block owned by a [`ParticlesContainer`].
    pub struct BlockHandle;
}

/// Owns every block of a simulation.
///
/// All blocks share the container's schema and block size.
#[derive(Debug)]
pub struct ParticlesContainer {
    schema: Arc<Schema>,
    block_size: usize,
    blocks: SlotMap<BlockHandle, ParticleBlock>,
    order: Vec<BlockHandle>,
}

impl ParticlesContainer {
    /// Create an empty container.
    pub fn new(block_size: usize, schema: Schema) -> Result<Self> {
        if block_size == 0 {
            return Err(ParticleError::InvalidCapacity);
        }
        Ok(Self {
            schema: Arc::new(schema),
            block_size,
            blocks: SlotMap::with_key(),
            order: Vec::new(),
        })
    }

    /// Create an empty container whose schema matches particle type `P`.
    pub fn for_particle<P: ParticleTrait>(block_size: usize) -> Result<Self> {
        Self::new(block_size, P::schema()?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Capacity of every block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks currently owned.
    pub fn block_count(&self) -> usize {
        self.order.len()
    }

    /// Snapshot of all block handles in iteration order.
    pub fn active_blocks(&self) -> Vec<BlockHandle> {
        self.order.clone()
    }

    /// Iterate all blocks in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &ParticleBlock> + '_ {
        self.order.iter().filter_map(move |handle| self.blocks.get(*handle))
    }

    /// Look up a block.
    pub fn block(&self, handle: BlockHandle) -> Result<&ParticleBlock> {
        self.blocks.get(handle).ok_or(ParticleError::StaleHandle)
    }

    /// Look up a block mutably.
    pub fn block_mut(&mut self, handle: BlockHandle) -> Result<&mut ParticleBlock> {
        self.blocks.get_mut(handle).ok_or(ParticleError::StaleHandle)
    }

    /// Whether `handle` still refers to a live block.
    pub fn contains(&self, handle: BlockHandle) -> bool {
        self.blocks.contains_key(handle)
    }

    /// Allocate an empty block and append it to the iteration order.
    pub fn new_block(&mut self) -> BlockHandle {
        let block = ParticleBlock::new(Arc::clone(&self.schema), self.block_size);
        let handle = self.blocks.insert(block);
        self.order.push(handle);
        tracing::trace!(?handle, blocks = self.order.len(), "allocated block");
        handle
    }

    /// Release an empty block.
    ///
    /// The handle (and every copy of it) becomes stale.
    pub fn release_block(&mut self, handle: BlockHandle) -> Result<()> {
        let block = self.block(handle)?;
        if !block.is_empty() {
            return Err(ParticleError::BlockNotEmpty {
                active: block.active_amount(),
            });
        }
        self.blocks.remove(handle);
        self.order.retain(|h| *h != handle);
        tracing::trace!(?handle, blocks = self.order.len(), "released block");
        Ok(())
    }

    /// First block with a free slot, in iteration order.
    pub fn first_non_full(&self) -> Option<BlockHandle> {
        self.order
            .iter()
            .copied()
            .find(|handle| self.blocks.get(*handle).is_some_and(|b| !b.is_full()))
    }

    /// Store `particle` in the first block with room, allocating one if needed.
    pub fn push<P: ParticleTrait>(&mut self, particle: &P) -> Result<BlockHandle> {
        let handle = match self.first_non_full() {
            Some(handle) => handle,
            None => self.new_block(),
        };
        self.block_mut(handle)?.push(particle)?;
        Ok(handle)
    }

    /// Total number of live particles.
    pub fn particle_amount(&self) -> usize {
        self.iter().map(ParticleBlock::active_amount).sum()
    }

    /// Compact all blocks and release the ones left empty.
    ///
    /// Returns the number of released blocks.
    pub fn compress(&mut self) -> usize {
        let rank: SecondaryMap<BlockHandle, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, handle)| (*handle, i))
            .collect();

        let mut entries: Vec<(usize, &mut ParticleBlock)> = self
            .blocks
            .iter_mut()
            .filter_map(|(handle, block)| rank.get(handle).map(|r| (*r, block)))
            .collect();
        entries.sort_by_key(|(r, _)| *r);

        let mut blocks: Vec<&mut ParticleBlock> = entries.into_iter().map(|(_, b)| b).collect();
        ParticleBlock::compress(&mut blocks);

        let empty: Vec<BlockHandle> = self
            .order
            .iter()
            .copied()
            .filter(|handle| self.blocks.get(*handle).is_some_and(ParticleBlock::is_empty))
            .collect();
        for handle in &empty {
            self.blocks.remove(*handle);
        }
        self.order.retain(|handle| !empty.contains(handle));

        if !empty.is_empty() {
            tracing::trace!(released = empty.len(), blocks = self.order.len(), "compacted");
        }
        empty.len()
    }

    /// Copy one vector attribute of every live particle into `dst`.
    ///
    /// Particles are written block by block in iteration order. Returns the
    /// number of values written.
    pub fn copy_vectors(&self, name: &str, dst: &mut [Vec3]) -> Result<usize> {
        let required = self.particle_amount();
        if dst.len() < required {
            return Err(ParticleError::InsufficientCapacity {
                required,
                available: dst.len(),
            });
        }

        let mut offset = 0;
        for block in self.iter() {
            let amount = block.active_amount();
            dst[offset..offset + amount].copy_from_slice(&block.vector(name)?[..amount]);
            offset += amount;
        }
        Ok(offset)
    }
}
