//! Error types for bparticles.
//!
//! This module provides the error taxonomy for block storage and stepping,
//! and a separate error for loading and saving simulation configurations.
//!
//! Core errors fall into three kinds (see [`ViolationKind`]):
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `Schema` | An attribute name is missing, duplicated or aliased |
//! | `Capacity` | A block slot or active count is out of range, or a non-empty block was released |
//! | `Bounds` | A caller-supplied destination is too short |
//!
//! Schema and capacity errors are programming mistakes: they never occur
//! for a well-formed `Description`. Bounds errors cross the caller boundary
//! and are expected to be handled.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, ParticleError>;

/// Errors raised by the attribute buffers, blocks, container and solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParticleError {
    /// The attribute name is not part of the block schema.
    #[error("attribute `{0}` is not part of the block schema")]
    AttributeNotFound(String),

    /// The same attribute name was declared twice.
    #[error("attribute `{0}` is declared more than once in the schema")]
    DuplicateAttribute(String),

    /// The same attribute was requested twice for simultaneous mutable access.
    #[error("attribute `{0}` was requested twice for mutable access")]
    AliasedAttribute(String),

    /// Blocks must hold at least one particle.
    #[error("block capacity must be greater than zero")]
    InvalidCapacity,

    /// A slot index lies outside the block capacity.
    #[error("slot {index} is outside the block capacity of {capacity}")]
    SlotOutOfRange {
        /// Requested slot.
        index: usize,
        /// Capacity of the block.
        capacity: usize,
    },

    /// A slot index lies outside the active prefix of the block.
    #[error("slot {index} is not active (block holds {active} particles)")]
    InactiveSlot {
        /// Requested slot.
        index: usize,
        /// Active particles in the block.
        active: usize,
    },

    /// Tried to write a particle into a full block.
    #[error("block is full ({capacity} particles)")]
    BlockFull {
        /// Capacity of the block.
        capacity: usize,
    },

    /// Tried to set the active count beyond the block capacity.
    #[error("active amount {requested} exceeds the block capacity of {capacity}")]
    ActiveAmountOverflow {
        /// Requested active count.
        requested: usize,
        /// Capacity of the block.
        capacity: usize,
    },

    /// Only empty blocks can be released.
    #[error("cannot release a block that still holds {active} particles")]
    BlockNotEmpty {
        /// Active particles in the block.
        active: usize,
    },

    /// The block handle was released or belongs to another container.
    #[error("block handle is stale or was not issued by this container")]
    StaleHandle,

    /// A destination buffer is shorter than the live particle count.
    #[error("destination holds {available} entries but {required} particles are active")]
    InsufficientCapacity {
        /// Entries needed.
        required: usize,
        /// Entries available in the destination.
        available: usize,
    },
}

/// Broad classification of a [`ParticleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Attribute schema mismatch.
    Schema,
    /// Block slot or occupancy contract broken.
    Capacity,
    /// Caller-supplied buffer too short.
    Bounds,
}

impl ParticleError {
    /// Which part of the contract this error breaks.
    pub fn kind(&self) -> ViolationKind {
        match self {
            ParticleError::AttributeNotFound(_)
            | ParticleError::DuplicateAttribute(_)
            | ParticleError::AliasedAttribute(_) => ViolationKind::Schema,
            ParticleError::InvalidCapacity
            | ParticleError::SlotOutOfRange { .. }
            | ParticleError::InactiveSlot { .. }
            | ParticleError::BlockFull { .. }
            | ParticleError::ActiveAmountOverflow { .. }
            | ParticleError::BlockNotEmpty { .. }
            | ParticleError::StaleHandle => ViolationKind::Capacity,
            ParticleError::InsufficientCapacity { .. } => ViolationKind::Bounds,
        }
    }

    /// Whether this error signals a programming mistake rather than a
    /// condition the caller is expected to handle.
    pub fn is_contract_violation(&self) -> bool {
        self.kind() != ViolationKind::Bounds
    }
}

/// Errors that can occur while loading or saving a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for this schema.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but describes an unusable simulation.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}
