// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Heap, HeapValue, WriteBarrier};
use crate::{
    fixed_array::FixedArray, object::Object, property_name::PropertyName, shape::Shape,
    transitions::TransitionArray,
};

/// Mark bits, one per heap vector slot.
#[derive(Debug)]
pub struct HeapBits {
    pub names: Box<[bool]>,
    pub objects: Box<[bool]>,
    pub shapes: Box<[bool]>,
    pub fixed_arrays: Box<[bool]>,
    pub transition_arrays: Box<[bool]>,
}

#[derive(Debug)]
pub struct WorkQueues {
    pub names: Vec<PropertyName>,
    pub objects: Vec<Object>,
    pub shapes: Vec<Shape>,
    pub fixed_arrays: Vec<FixedArray>,
    pub transition_arrays: Vec<TransitionArray>,
}

impl HeapBits {
    pub fn new<B: WriteBarrier>(heap: &Heap<B>) -> Self {
        Self {
            names: vec![false; heap.names.len()].into_boxed_slice(),
            objects: vec![false; heap.objects.len()].into_boxed_slice(),
            shapes: vec![false; heap.shapes.len()].into_boxed_slice(),
            fixed_arrays: vec![false; heap.fixed_arrays.len()].into_boxed_slice(),
            transition_arrays: vec![false; heap.transition_arrays.len()].into_boxed_slice(),
        }
    }

    pub fn is_marked(&self, value: HeapValue) -> bool {
        match value {
            HeapValue::Smi(_) => false,
            HeapValue::PropertyName(name) => self.names[name.get_index()],
            HeapValue::Object(object) => self.objects[object.get_index()],
            HeapValue::Shape(shape) => self.shapes[shape.get_index()],
            HeapValue::FixedArray(array) => self.fixed_arrays[array.get_index()],
            HeapValue::TransitionArray(array) => self.transition_arrays[array.get_index()],
        }
    }
}

impl WorkQueues {
    pub fn new<B: WriteBarrier>(heap: &Heap<B>) -> Self {
        Self {
            names: Vec::with_capacity(heap.names.len() / 4),
            objects: Vec::with_capacity(heap.objects.len() / 4),
            shapes: Vec::with_capacity(heap.shapes.len() / 4),
            fixed_arrays: Vec::with_capacity(heap.fixed_arrays.len() / 4),
            transition_arrays: Vec::with_capacity(heap.transition_arrays.len() / 4),
        }
    }

    pub fn push_value(&mut self, value: HeapValue) {
        match value {
            HeapValue::Smi(_) => {}
            HeapValue::PropertyName(name) => self.names.push(name),
            HeapValue::Object(object) => self.objects.push(object),
            HeapValue::Shape(shape) => self.shapes.push(shape),
            HeapValue::FixedArray(array) => self.fixed_arrays.push(array),
            HeapValue::TransitionArray(array) => self.transition_arrays.push(array),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.objects.is_empty()
            && self.shapes.is_empty()
            && self.fixed_arrays.is_empty()
            && self.transition_arrays.is_empty()
    }
}

/// Push every heap reference held by `self` onto the work queues.
pub trait HeapMark {
    fn mark_values(&self, queues: &mut WorkQueues);
}

impl HeapMark for HeapValue {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.push_value(*self);
    }
}

impl<T: HeapMark> HeapMark for Option<T> {
    fn mark_values(&self, queues: &mut WorkQueues) {
        if let Some(content) = self {
            content.mark_values(queues);
        }
    }
}

impl<T: HeapMark> HeapMark for [T] {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.iter().for_each(|entry| entry.mark_values(queues));
    }
}

impl<T: HeapMark> HeapMark for Vec<T> {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.as_slice().mark_values(queues);
    }
}

impl<T: HeapMark> HeapMark for Box<[T]> {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.as_ref().mark_values(queues);
    }
}
