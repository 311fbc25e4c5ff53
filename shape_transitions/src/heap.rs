// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod generational;
pub mod heap_bits;
pub mod heap_gc;
pub mod indexes;
mod write_barrier;

pub use generational::GenerationalBarrier;
pub(crate) use write_barrier::conditional_write_barrier;
pub use write_barrier::{NoWriteBarrier, RawSlot, WriteBarrier, WriteBarrierMode};

use crate::{
    fixed_array::{FixedArray, FixedArrayRecord},
    object::{Object, ObjectRecord},
    options::Options,
    property_name::{PropertyName, PropertyNameTable},
    shape::{Shape, ShapeRecord},
    transitions::{TransitionArray, TransitionArrayRecord},
};

/// A tagged heap slot value.
///
/// Every slot of a heap container holds one of these, so that a tracer can
/// scan containers uniformly. The `Smi` variant never refers to heap data,
/// which makes `Smi(0)` a safe "nothing here" marker for optional slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapValue {
    Smi(i32),
    PropertyName(PropertyName),
    Object(Object),
    Shape(Shape),
    FixedArray(FixedArray),
    TransitionArray(TransitionArray),
}

impl HeapValue {
    /// Sentinel for an empty optional slot.
    pub const ZERO: Self = Self::Smi(0);

    pub fn is_heap_reference(self) -> bool {
        !matches!(self, Self::Smi(_))
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Smi(_) => "Smi",
            Self::PropertyName(_) => "PropertyName",
            Self::Object(_) => "Object",
            Self::Shape(_) => "Shape",
            Self::FixedArray(_) => "FixedArray",
            Self::TransitionArray(_) => "TransitionArray",
        }
    }
}

impl From<i32> for HeapValue {
    fn from(value: i32) -> Self {
        Self::Smi(value)
    }
}

pub trait CreateHeapData<T, F> {
    /// Allocates the given data on the heap and returns its handle.
    fn create(&mut self, data: T) -> F;
}

/// Heap holding all shape related data.
///
/// Data is stored in one vector per type and referred to by index handles.
/// Mutation of references stored inside heap containers must go through the
/// containers' own setters, which notify the write barrier `B`.
#[derive(Debug)]
pub struct Heap<B: WriteBarrier = NoWriteBarrier> {
    pub(crate) names: PropertyNameTable,
    pub(crate) objects: Vec<ObjectRecord>,
    pub(crate) shapes: Vec<ShapeRecord>,
    pub(crate) fixed_arrays: Vec<FixedArrayRecord>,
    pub(crate) transition_arrays: Vec<TransitionArrayRecord>,
    pub(crate) roots: Vec<HeapValue>,
    pub(crate) options: Options,
    pub(crate) barrier: B,
}

impl Heap {
    pub fn new(options: Options) -> Self {
        Self::with_barrier(options, NoWriteBarrier)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl<B: WriteBarrier> Heap<B> {
    pub fn with_barrier(options: Options, barrier: B) -> Self {
        let capacity = options.initial_capacity;
        Self {
            names: PropertyNameTable::with_capacity(capacity),
            objects: Vec::with_capacity(capacity),
            shapes: Vec::with_capacity(capacity),
            fixed_arrays: Vec::with_capacity(capacity),
            transition_arrays: Vec::with_capacity(capacity),
            roots: Vec::new(),
            options,
            barrier,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn barrier(&self) -> &B {
        &self.barrier
    }

    pub fn barrier_mut(&mut self) -> &mut B {
        &mut self.barrier
    }

    /// Get the interned property name for the given text.
    pub fn intern(&mut self, text: &str) -> PropertyName {
        let (name, is_new) = self.names.intern(text);
        if is_new {
            self.barrier.on_allocation(name.into());
        }
        name
    }

    pub fn name_text(&self, name: PropertyName) -> &str {
        self.names.get_text(name)
    }

    /// Add a value to the root set traced by the collector.
    pub fn add_root(&mut self, value: impl Into<HeapValue>) {
        self.roots.push(value.into());
    }

    /// Check if the value can be reached from the root set.
    pub fn is_reachable(&self, value: impl Into<HeapValue>) -> bool {
        heap_gc::mark_reachable(self).is_marked(value.into())
    }

    #[inline]
    pub(crate) fn write_barrier(
        &mut self,
        slot: RawSlot,
        value: HeapValue,
        mode: WriteBarrierMode,
    ) {
        conditional_write_barrier(&mut self.barrier, slot, value, mode);
    }
}

impl<B: WriteBarrier> AsRef<[ShapeRecord]> for Heap<B> {
    fn as_ref(&self) -> &[ShapeRecord] {
        &self.shapes
    }
}

impl<B: WriteBarrier> AsRef<[FixedArrayRecord]> for Heap<B> {
    fn as_ref(&self) -> &[FixedArrayRecord] {
        &self.fixed_arrays
    }
}

impl<B: WriteBarrier> AsRef<[TransitionArrayRecord]> for Heap<B> {
    fn as_ref(&self) -> &[TransitionArrayRecord] {
        &self.transition_arrays
    }
}

impl<B: WriteBarrier> AsMut<[TransitionArrayRecord]> for Heap<B> {
    fn as_mut(&mut self) -> &mut [TransitionArrayRecord] {
        &mut self.transition_arrays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smi_sentinel_is_not_a_reference() {
        assert!(!HeapValue::ZERO.is_heap_reference());
        assert_eq!(HeapValue::from(0), HeapValue::ZERO);
        assert_eq!(HeapValue::ZERO.type_name(), "Smi");
    }

    #[test]
    fn interning_reuses_names() {
        let mut heap = Heap::default();
        let a = heap.intern("a");
        let b = heap.intern("b");
        assert_ne!(a, b);
        assert_eq!(heap.intern("a"), a);
        assert_eq!(heap.name_text(b), "b");
        assert!(HeapValue::from(a).is_heap_reference());
    }
}
