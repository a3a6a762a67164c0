//! Named per-particle attribute buffers.
//!
//! Every block stores its particles as a structure of arrays: one `f32`
//! array per scalar attribute and one [`Vec3`] array per vector attribute,
//! all of the same fixed length (the block capacity).
//!
//! # Schema
//!
//! The set of attribute names is fixed by a [`Schema`] when the container is
//! created and shared by every block it allocates:
//!
//! ```ignore
//! let schema = Schema::new(["Age"], ["Position", "Velocity"])?;
//! ```
//!
//! # Standard Attributes
//!
//! | Name | Kind | Used by |
//! |------|------|---------|
//! | `Position` | vector | integration, position queries, spatial rules |
//! | `Velocity` | vector | integration, force application, `Drag`/`Spring` |
//! | `Age` | scalar | aging and culling |

use std::sync::Arc;

use glam::Vec3;

use crate::error::{ParticleError, Result};

/// Name of the position attribute.
pub const POSITION: &str = "Position";
/// Name of the velocity attribute.
pub const VELOCITY: &str = "Velocity";
/// Name of the age attribute.
pub const AGE: &str = "Age";

/// The fixed set of scalar and vector attribute names of a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    scalars: Vec<String>,
    vectors: Vec<String>,
}

impl Schema {
    /// Build a schema from scalar and vector attribute names.
    ///
    /// Names must be unique across both kinds.
    pub fn new<S, V>(scalars: S, vectors: V) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let scalars: Vec<String> = scalars.into_iter().map(Into::into).collect();
        let vectors: Vec<String> = vectors.into_iter().map(Into::into).collect();

        let mut seen: Vec<&str> = Vec::with_capacity(scalars.len() + vectors.len());
        for name in scalars.iter().chain(vectors.iter()) {
            if seen.contains(&name.as_str()) {
                return Err(ParticleError::DuplicateAttribute(name.clone()));
            }
            seen.push(name);
        }

        Ok(Self { scalars, vectors })
    }

    /// Scalar attribute names in declaration order.
    pub fn scalar_names(&self) -> &[String] {
        &self.scalars
    }

    /// Vector attribute names in declaration order.
    pub fn vector_names(&self) -> &[String] {
        &self.vectors
    }

    /// Buffer index of a scalar attribute.
    pub fn scalar_index(&self, name: &str) -> Option<usize> {
        self.scalars.iter().position(|n| n == name)
    }

    /// Buffer index of a vector attribute.
    pub fn vector_index(&self, name: &str) -> Option<usize> {
        self.vectors.iter().position(|n| n == name)
    }

    /// Whether `name` is a scalar or vector attribute of this schema.
    pub fn contains(&self, name: &str) -> bool {
        self.scalar_index(name).is_some() || self.vector_index(name).is_some()
    }
}

/// Fixed-length attribute arrays for one block.
///
/// Created once with a shared [`Schema`]; never resized.
#[derive(Clone, Debug)]
pub struct AttributeBuffers {
    schema: Arc<Schema>,
    capacity: usize,
    scalars: Vec<Vec<f32>>,
    vectors: Vec<Vec<Vec3>>,
}

impl AttributeBuffers {
    /// Allocate zero-filled buffers for every attribute in `schema`.
    pub fn new(schema: Arc<Schema>, capacity: usize) -> Self {
        let scalars = vec![vec![0.0; capacity]; schema.scalars.len()];
        let vectors = vec![vec![Vec3::ZERO; capacity]; schema.vectors.len()];
        Self {
            schema,
            capacity,
            scalars,
            vectors,
        }
    }

    /// The schema shared with the owning container.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Length of every buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn scalar_slot(&self, name: &str) -> Result<usize> {
        self.schema
            .scalar_index(name)
            .ok_or_else(|| ParticleError::AttributeNotFound(name.to_string()))
    }

    fn vector_slot(&self, name: &str) -> Result<usize> {
        self.schema
            .vector_index(name)
            .ok_or_else(|| ParticleError::AttributeNotFound(name.to_string()))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.capacity {
            Ok(())
        } else {
            Err(ParticleError::SlotOutOfRange {
                index,
                capacity: self.capacity,
            })
        }
    }

    /// Full-capacity scalar buffer.
    pub fn scalar(&self, name: &str) -> Result<&[f32]> {
        let slot = self.scalar_slot(name)?;
        Ok(&self.scalars[slot])
    }

    /// Full-capacity scalar buffer, mutable.
    pub fn scalar_mut(&mut self, name: &str) -> Result<&mut [f32]> {
        let slot = self.scalar_slot(name)?;
        Ok(&mut self.scalars[slot])
    }

    /// Full-capacity vector buffer.
    pub fn vector(&self, name: &str) -> Result<&[Vec3]> {
        let slot = self.vector_slot(name)?;
        Ok(&self.vectors[slot])
    }

    /// Full-capacity vector buffer, mutable.
    pub fn vector_mut(&mut self, name: &str) -> Result<&mut [Vec3]> {
        let slot = self.vector_slot(name)?;
        Ok(&mut self.vectors[slot])
    }

    /// Two distinct vector buffers borrowed mutably at once.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (positions, velocities) = buffers.vector_pair_mut(POSITION, VELOCITY)?;
    /// for (p, v) in positions.iter_mut().zip(velocities.iter()) {
    ///     *p += *v;
    /// }
    /// ```
    pub fn vector_pair_mut(&mut self, a: &str, b: &str) -> Result<(&mut [Vec3], &mut [Vec3])> {
        let slot_a = self.vector_slot(a)?;
        let slot_b = self.vector_slot(b)?;
        if slot_a == slot_b {
            return Err(ParticleError::AliasedAttribute(a.to_string()));
        }

        if slot_a < slot_b {
            let (low, high) = self.vectors.split_at_mut(slot_b);
            Ok((&mut low[slot_a], &mut high[0]))
        } else {
            let (low, high) = self.vectors.split_at_mut(slot_a);
            Ok((&mut high[0], &mut low[slot_b]))
        }
    }

    /// Read one scalar value.
    pub fn scalar_at(&self, name: &str, index: usize) -> Result<f32> {
        self.check_index(index)?;
        Ok(self.scalar(name)?[index])
    }

    /// Write one scalar value.
    pub fn set_scalar(&mut self, name: &str, index: usize, value: f32) -> Result<()> {
        self.check_index(index)?;
        self.scalar_mut(name)?[index] = value;
        Ok(())
    }

    /// Read one vector value.
    pub fn vector_at(&self, name: &str, index: usize) -> Result<Vec3> {
        self.check_index(index)?;
        Ok(self.vector(name)?[index])
    }

    /// Write one vector value.
    pub fn set_vector(&mut self, name: &str, index: usize, value: Vec3) -> Result<()> {
        self.check_index(index)?;
        self.vector_mut(name)?[index] = value;
        Ok(())
    }

    /// Copy every attribute at `src` into `dst`.
    pub(crate) fn copy_slot(&mut self, src: usize, dst: usize) {
        for buffer in &mut self.scalars {
            buffer[dst] = buffer[src];
        }
        for buffer in &mut self.vectors {
            buffer[dst] = buffer[src];
        }
    }

    /// Copy every attribute at `other[src]` into `self[dst]`.
    ///
    /// Both sets must share a schema.
    pub(crate) fn copy_slot_from(&mut self, other: &AttributeBuffers, src: usize, dst: usize) {
        debug_assert!(
            Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema,
            "copy between attribute sets with different schemas"
        );
        for (to, from) in self.scalars.iter_mut().zip(&other.scalars) {
            to[dst] = from[src];
        }
        for (to, from) in self.vectors.iter_mut().zip(&other.vectors) {
            to[dst] = from[src];
        }
    }
}

/// Read-only view of a block's live particles.
///
/// This is what [`Force`](crate::rules::Force) contributors receive. All
/// buffers are truncated to the active prefix, so their length always
/// matches the force accumulator.
#[derive(Clone, Copy, Debug)]
pub struct BlockBuffers<'a> {
    buffers: &'a AttributeBuffers,
    active: usize,
}

impl<'a> BlockBuffers<'a> {
    pub(crate) fn new(buffers: &'a AttributeBuffers, active: usize) -> Self {
        debug_assert!(active <= buffers.capacity());
        Self { buffers, active }
    }

    /// Number of live particles in the viewed block.
    #[inline]
    pub fn active_amount(&self) -> usize {
        self.active
    }

    /// The block schema.
    pub fn schema(&self) -> &'a Schema {
        &self.buffers.schema
    }

    /// Live values of a scalar attribute.
    pub fn scalar(&self, name: &str) -> Result<&'a [f32]> {
        Ok(&self.buffers.scalar(name)?[..self.active])
    }

    /// Live values of a vector attribute.
    pub fn vector(&self, name: &str) -> Result<&'a [Vec3]> {
        Ok(&self.buffers.vector(name)?[..self.active])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playground_schema() -> Arc<Schema> {
        Arc::new(Schema::new([AGE], [POSITION, VELOCITY]).unwrap())
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = Schema::new(["Age", "Mass"], ["Age"]).unwrap_err();
        assert_eq!(err, ParticleError::DuplicateAttribute("Age".to_string()));

        let err = Schema::new(Vec::<String>::new(), ["Position", "Position"]).unwrap_err();
        assert_eq!(err, ParticleError::DuplicateAttribute("Position".to_string()));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = playground_schema();
        assert_eq!(schema.scalar_index(AGE), Some(0));
        assert_eq!(schema.vector_index(VELOCITY), Some(1));
        assert!(schema.contains(POSITION));
        assert!(!schema.contains("Mass"));
    }

    #[test]
    fn test_buffers_have_capacity_length() {
        let buffers = AttributeBuffers::new(playground_schema(), 10);
        assert_eq!(buffers.scalar(AGE).unwrap().len(), 10);
        assert_eq!(buffers.vector(POSITION).unwrap().len(), 10);
        assert!(buffers.vector(POSITION).unwrap().iter().all(|v| *v == Vec3::ZERO));
    }

    #[test]
    fn test_missing_attribute() {
        let mut buffers = AttributeBuffers::new(playground_schema(), 4);
        assert_eq!(
            buffers.scalar("Mass").unwrap_err(),
            ParticleError::AttributeNotFound("Mass".to_string())
        );
        // A vector name is not a scalar attribute
        assert!(buffers.scalar_mut(POSITION).is_err());
        assert!(buffers.vector(AGE).is_err());
    }

    #[test]
    fn test_element_access_is_bounds_checked() {
        let mut buffers = AttributeBuffers::new(playground_schema(), 4);
        buffers.set_scalar(AGE, 3, 7.0).unwrap();
        assert_eq!(buffers.scalar_at(AGE, 3).unwrap(), 7.0);

        let err = buffers.set_vector(POSITION, 4, Vec3::ONE).unwrap_err();
        assert_eq!(err, ParticleError::SlotOutOfRange { index: 4, capacity: 4 });
    }

    #[test]
    fn test_vector_pair_mut() {
        let mut buffers = AttributeBuffers::new(playground_schema(), 2);
        buffers.set_vector(VELOCITY, 0, Vec3::X).unwrap();

        {
            let (velocities, positions) = buffers.vector_pair_mut(VELOCITY, POSITION).unwrap();
            positions[0] += velocities[0];
        }
        assert_eq!(buffers.vector_at(POSITION, 0).unwrap(), Vec3::X);

        let err = buffers.vector_pair_mut(POSITION, POSITION).unwrap_err();
        assert_eq!(err, ParticleError::AliasedAttribute(POSITION.to_string()));
    }

    #[test]
    fn test_copy_slot_moves_every_attribute() {
        let mut buffers = AttributeBuffers::new(playground_schema(), 3);
        buffers.set_scalar(AGE, 2, 9.0).unwrap();
        buffers.set_vector(POSITION, 2, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        buffers.set_vector(VELOCITY, 2, Vec3::Y).unwrap();

        buffers.copy_slot(2, 0);
        assert_eq!(buffers.scalar_at(AGE, 0).unwrap(), 9.0);
        assert_eq!(buffers.vector_at(POSITION, 0).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(buffers.vector_at(VELOCITY, 0).unwrap(), Vec3::Y);
    }

    #[test]
    fn test_view_truncates_to_active() {
        let buffers = AttributeBuffers::new(playground_schema(), 8);
        let view = BlockBuffers::new(&buffers, 3);
        assert_eq!(view.active_amount(), 3);
        assert_eq!(view.scalar(AGE).unwrap().len(), 3);
        assert_eq!(view.vector(VELOCITY).unwrap().len(), 3);
        assert!(view.vector("Color").is_err());
    }
}
