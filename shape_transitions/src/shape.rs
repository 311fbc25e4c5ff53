// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    error::ContractViolation,
    heap::{
        CreateHeapData, Heap, HeapValue, RawSlot, WriteBarrier, WriteBarrierMode,
        heap_bits::{HeapMark, WorkQueues},
        indexes::ShapeIndex,
    },
    object::Object,
    property_name::PropertyName,
    transitions::TransitionArray,
};

/// Backing representation of an object's indexed elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementsKind {
    #[default]
    PackedSmi,
    HoleySmi,
    PackedDouble,
    HoleyDouble,
    Packed,
    Holey,
    Dictionary,
}

/// Attributes of a single property as recorded in a shape's descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDetails {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    /// Index of the property's value in the object's property storage.
    pub field_index: u32,
}

impl PropertyDetails {
    /// Details of an ordinary writable, enumerable and configurable data
    /// property.
    pub const fn data_field(field_index: u32) -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
            field_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub key: PropertyName,
    pub details: PropertyDetails,
}

impl HeapMark for Descriptor {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.key.mark_values(queues);
    }
}

/// Reference to the shape (hidden class) of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Shape(ShapeIndex);

impl Shape {
    pub(crate) const fn new(index: ShapeIndex) -> Self {
        Self(index)
    }

    /// Get the implied usize index of the Shape reference.
    #[inline(always)]
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }

    /// Create a shape with no properties for the given prototype.
    pub fn create_root<B: WriteBarrier>(heap: &mut Heap<B>, prototype: Option<Object>) -> Self {
        heap.create(ShapeRecord::root(prototype))
    }

    pub fn get_prototype(self, heap: &impl AsRef<[ShapeRecord]>) -> Option<Object> {
        heap.as_ref()[self.get_index()].prototype
    }

    pub fn get_elements_kind(self, heap: &impl AsRef<[ShapeRecord]>) -> ElementsKind {
        heap.as_ref()[self.get_index()].elements_kind
    }

    /// Get the property descriptors of the shape.
    pub fn instance_descriptors(self, heap: &impl AsRef<[ShapeRecord]>) -> &[Descriptor] {
        &heap.as_ref()[self.get_index()].descriptors
    }

    /// Index of the descriptor that was added to create this shape.
    ///
    /// Returns None for shapes that were not created by adding a property.
    pub fn last_added_descriptor_index(self, heap: &impl AsRef<[ShapeRecord]>) -> Option<u32> {
        heap.as_ref()[self.get_index()].last_added
    }

    pub fn get_transitions(self, heap: &impl AsRef<[ShapeRecord]>) -> Option<TransitionArray> {
        heap.as_ref()[self.get_index()].transitions
    }

    /// Get the shape this shape was derived from.
    pub fn get_back_pointer(self, heap: &impl AsRef<[ShapeRecord]>) -> Option<Shape> {
        heap.as_ref()[self.get_index()].back_pointer
    }

    /// Attach a transition array to the shape.
    ///
    /// This is the write that publishes a transition array.
    pub(crate) fn set_transitions<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        transitions: TransitionArray,
        mode: WriteBarrierMode,
    ) {
        heap.shapes[self.get_index()].transitions = Some(transitions);
        heap.write_barrier(
            RawSlot::new(self, ShapeRecord::TRANSITIONS_SLOT),
            transitions.into(),
            mode,
        );
    }
}

impl From<Shape> for HeapValue {
    fn from(value: Shape) -> Self {
        HeapValue::Shape(value)
    }
}

impl TryFrom<HeapValue> for Shape {
    type Error = ContractViolation;

    fn try_from(value: HeapValue) -> Result<Self, Self::Error> {
        match value {
            HeapValue::Shape(shape) => Ok(shape),
            _ => Err(ContractViolation::TypeMismatch {
                expected: "Shape",
                found: value.type_name(),
            }),
        }
    }
}

impl HeapMark for Shape {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.shapes.push(*self);
    }
}

/// Data structure describing the shape of an object.
#[derive(Debug, Clone)]
pub struct ShapeRecord {
    prototype: Option<Object>,
    elements_kind: ElementsKind,
    descriptors: Box<[Descriptor]>,
    /// Index into descriptors; None if no descriptor was added.
    last_added: Option<u32>,
    transitions: Option<TransitionArray>,
    back_pointer: Option<Shape>,
}

impl ShapeRecord {
    /// Slot offset of the transitions field, as seen by the write barrier.
    pub(crate) const TRANSITIONS_SLOT: usize = 3;

    pub fn root(prototype: Option<Object>) -> Self {
        Self {
            prototype,
            elements_kind: ElementsKind::default(),
            descriptors: Box::default(),
            last_added: None,
            transitions: None,
            back_pointer: None,
        }
    }

    /// Copy of the parent's layout with no transitions of its own.
    pub(crate) fn derive(&self, parent: Shape) -> Self {
        Self {
            prototype: self.prototype,
            elements_kind: self.elements_kind,
            descriptors: self.descriptors.clone(),
            last_added: self.last_added,
            transitions: None,
            back_pointer: Some(parent),
        }
    }

    pub(crate) fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        let mut descriptors = self.descriptors.into_vec();
        let index = u32::try_from(descriptors.len()).expect("Unreasonable shape size");
        descriptors.push(descriptor);
        self.descriptors = descriptors.into_boxed_slice();
        self.last_added = Some(index);
        self
    }

    pub(crate) fn with_elements_kind(mut self, elements_kind: ElementsKind) -> Self {
        self.elements_kind = elements_kind;
        self
    }

    pub(crate) fn with_prototype(mut self, prototype: Option<Object>) -> Self {
        self.prototype = prototype;
        self
    }

    pub(crate) fn has_descriptor(&self, key: PropertyName) -> bool {
        self.descriptors.iter().any(|descriptor| descriptor.key == key)
    }
}

impl HeapMark for ShapeRecord {
    fn mark_values(&self, queues: &mut WorkQueues) {
        let Self {
            prototype,
            elements_kind: _,
            descriptors,
            last_added: _,
            transitions,
            back_pointer,
        } = self;
        prototype.mark_values(queues);
        descriptors.mark_values(queues);
        transitions.mark_values(queues);
        back_pointer.mark_values(queues);
    }
}

impl<B: WriteBarrier> CreateHeapData<ShapeRecord, Shape> for Heap<B> {
    fn create(&mut self, data: ShapeRecord) -> Shape {
        debug_assert!(data.transitions.is_none());
        self.shapes.push(data);
        let shape = Shape::new(ShapeIndex::last(&self.shapes));
        self.barrier.on_allocation(shape.into());
        shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_shapes_append_descriptors() {
        let mut heap = Heap::default();
        let root = Shape::create_root(&mut heap, None);
        let x = heap.intern("x");
        let record = heap.shapes[root.get_index()]
            .derive(root)
            .with_descriptor(Descriptor {
                key: x,
                details: PropertyDetails::data_field(0),
            });
        let child = heap.create(record);

        assert_eq!(root.last_added_descriptor_index(&heap), None);
        assert_eq!(child.last_added_descriptor_index(&heap), Some(0));
        assert_eq!(child.instance_descriptors(&heap)[0].key, x);
        assert_eq!(child.get_back_pointer(&heap), Some(root));
        assert_eq!(child.get_transitions(&heap), None);
    }
}
