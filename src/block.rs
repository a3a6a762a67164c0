//! Fixed-capacity particle blocks.
//!
//! A block owns one [`AttributeBuffers`] set and an active count. Live
//! particles always occupy the contiguous prefix `[0, active_amount())`;
//! slots past it are free. Removal keeps the prefix contiguous by moving the
//! last live particle into the vacated slot, and [`ParticleBlock::compress`]
//! reflows particles across blocks so that trailing blocks empty out and can
//! be released.

use std::sync::Arc;

use crate::attributes::{AttributeBuffers, BlockBuffers, Schema};
use crate::error::{ParticleError, Result};
use crate::ParticleTrait;

/// A fixed-capacity chunk of particle storage.
#[derive(Clone, Debug)]
pub struct ParticleBlock {
    buffers: AttributeBuffers,
    active_amount: usize,
}

impl ParticleBlock {
    /// Allocate an empty block.
    pub fn new(schema: Arc<Schema>, capacity: usize) -> Self {
        Self {
            buffers: AttributeBuffers::new(schema, capacity),
            active_amount: 0,
        }
    }

    /// Number of slots in this block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffers.capacity()
    }

    /// Number of live particles (the length of the active prefix).
    #[inline]
    pub fn active_amount(&self) -> usize {
        self.active_amount
    }

    /// Set the number of live particles.
    ///
    /// Callers grow the count after writing into [`next_inactive_index`](Self::next_inactive_index)
    /// and shrink it after removing particles from the end of the prefix.
    pub fn set_active_amount(&mut self, amount: usize) -> Result<()> {
        if amount > self.capacity() {
            return Err(ParticleError::ActiveAmountOverflow {
                requested: amount,
                capacity: self.capacity(),
            });
        }
        self.active_amount = amount;
        Ok(())
    }

    /// Whether every slot holds a live particle.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.active_amount == self.capacity()
    }

    /// Whether the block holds no live particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active_amount == 0
    }

    /// First free slot.
    pub fn next_inactive_index(&self) -> Result<usize> {
        if self.is_full() {
            Err(ParticleError::BlockFull {
                capacity: self.capacity(),
            })
        } else {
            Ok(self.active_amount)
        }
    }

    /// The attribute buffers, full capacity.
    pub fn buffers(&self) -> &AttributeBuffers {
        &self.buffers
    }

    /// The attribute buffers, full capacity, mutable.
    pub fn buffers_mut(&mut self) -> &mut AttributeBuffers {
        &mut self.buffers
    }

    /// Read-only view of the live particles.
    pub fn view(&self) -> BlockBuffers<'_> {
        BlockBuffers::new(&self.buffers, self.active_amount)
    }

    /// Full-capacity scalar buffer.
    pub fn scalar(&self, name: &str) -> Result<&[f32]> {
        self.buffers.scalar(name)
    }

    /// Full-capacity scalar buffer, mutable.
    pub fn scalar_mut(&mut self, name: &str) -> Result<&mut [f32]> {
        self.buffers.scalar_mut(name)
    }

    /// Full-capacity vector buffer.
    pub fn vector(&self, name: &str) -> Result<&[glam::Vec3]> {
        self.buffers.vector(name)
    }

    /// Full-capacity vector buffer, mutable.
    pub fn vector_mut(&mut self, name: &str) -> Result<&mut [glam::Vec3]> {
        self.buffers.vector_mut(name)
    }

    /// Copy all attributes of the particle at `src` into slot `dst`.
    ///
    /// `dst` must lie inside the active prefix and `src` inside the block.
    /// Only checked in debug builds.
    #[inline]
    pub fn move_particle(&mut self, src: usize, dst: usize) {
        debug_assert!(
            dst < self.active_amount,
            "move destination {} outside active prefix {}",
            dst,
            self.active_amount
        );
        debug_assert!(src < self.capacity(), "move source {} outside block", src);
        self.buffers.copy_slot(src, dst);
    }

    /// Write `particle` into the first free slot and activate it.
    ///
    /// Returns the slot index.
    pub fn push<P: ParticleTrait>(&mut self, particle: &P) -> Result<usize> {
        let index = self.next_inactive_index()?;
        particle.write_to(&mut self.buffers, index)?;
        self.active_amount += 1;
        Ok(index)
    }

    /// Read the live particle at `index`.
    pub fn read<P: ParticleTrait>(&self, index: usize) -> Result<P> {
        if index >= self.active_amount {
            return Err(ParticleError::InactiveSlot {
                index,
                active: self.active_amount,
            });
        }
        P::read_from(&self.buffers, index)
    }

    /// Reflow live particles so occupancy concentrates in the earliest blocks.
    ///
    /// Particles are taken from the end of the last occupied block and
    /// appended to the first block with spare room, left to right, until no
    /// occupied block lies after a block with a gap. Later blocks end up empty
    /// (or with the remainder), ready to be released.
    ///
    /// All blocks must share one schema.
    pub fn compress(blocks: &mut [&mut ParticleBlock]) {
        if blocks.len() < 2 {
            return;
        }

        let mut head = 0;
        let mut tail = blocks.len() - 1;

        loop {
            while head < tail && blocks[head].is_full() {
                head += 1;
            }
            while tail > head && blocks[tail].is_empty() {
                tail -= 1;
            }
            if head >= tail {
                break;
            }

            let (front, back) = blocks.split_at_mut(tail);
            let dst = &mut *front[head];
            let src = &mut *back[0];

            let amount = (dst.capacity() - dst.active_amount).min(src.active_amount);
            for _ in 0..amount {
                let from = src.active_amount - 1;
                let to = dst.active_amount;
                dst.buffers.copy_slot_from(&src.buffers, from, to);
                dst.active_amount += 1;
                src.active_amount -= 1;
            }
        }
    }
}
