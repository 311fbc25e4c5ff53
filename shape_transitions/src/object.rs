// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    error::ContractViolation,
    heap::{
        CreateHeapData, Heap, HeapValue, WriteBarrier,
        heap_bits::{HeapMark, WorkQueues},
        indexes::ObjectIndex,
    },
    shape::Shape,
};

/// A heap object. Objects only matter here as prototypes, compared by
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Object(ObjectIndex);

impl Object {
    pub(crate) const fn new(index: ObjectIndex) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl From<Object> for HeapValue {
    fn from(value: Object) -> Self {
        HeapValue::Object(value)
    }
}

impl TryFrom<HeapValue> for Object {
    type Error = ContractViolation;

    fn try_from(value: HeapValue) -> Result<Self, Self::Error> {
        match value {
            HeapValue::Object(object) => Ok(object),
            _ => Err(ContractViolation::TypeMismatch {
                expected: "Object",
                found: value.type_name(),
            }),
        }
    }
}

impl HeapMark for Object {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.objects.push(*self);
    }
}

#[derive(Debug)]
pub struct ObjectRecord {
    shape: Shape,
}

impl ObjectRecord {
    pub fn new(shape: Shape) -> Self {
        Self { shape }
    }
}

impl HeapMark for ObjectRecord {
    fn mark_values(&self, queues: &mut WorkQueues) {
        let Self { shape } = self;
        shape.mark_values(queues);
    }
}

impl<B: WriteBarrier> CreateHeapData<ObjectRecord, Object> for Heap<B> {
    fn create(&mut self, data: ObjectRecord) -> Object {
        self.objects.push(data);
        let object = Object::new(ObjectIndex::last(&self.objects));
        self.barrier.on_allocation(object.into());
        object
    }
}
