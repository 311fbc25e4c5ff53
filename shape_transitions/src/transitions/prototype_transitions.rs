// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### Prototype transitions
//!
//! Shapes reached by changing the prototype of an object are cached in a
//! side table hanging off the transition array's prototype transitions slot:
//!
//! ```text
//! [Smi(count), prototype_0, shape_0, prototype_1, shape_1, ...]
//! ```
//!
//! Entries are appended and looked up linearly by prototype identity.

use tracing::debug;

use crate::{
    error::{ContractViolation, TransitionResult},
    fixed_array::FixedArray,
    heap::{CreateHeapData, Heap, HeapValue, WriteBarrier, WriteBarrierMode},
    object::Object,
    shape::Shape,
};

const COUNT_INDEX: usize = 0;
const HEADER_SIZE: usize = 1;
const ENTRY_SIZE: usize = 2;
const ENTRY_PROTOTYPE: usize = 0;
const ENTRY_TARGET: usize = 1;
const INITIAL_CAPACITY: usize = 4;

#[inline(always)]
const fn prototype_index(entry: usize) -> usize {
    HEADER_SIZE + entry * ENTRY_SIZE + ENTRY_PROTOTYPE
}

#[inline(always)]
const fn target_index(entry: usize) -> usize {
    HEADER_SIZE + entry * ENTRY_SIZE + ENTRY_TARGET
}

fn capacity<B: WriteBarrier>(heap: &Heap<B>, table: FixedArray) -> usize {
    (table.len(heap) - HEADER_SIZE) / ENTRY_SIZE
}

fn count<B: WriteBarrier>(heap: &Heap<B>, table: FixedArray) -> TransitionResult<usize> {
    match table.get(heap, COUNT_INDEX)? {
        HeapValue::Smi(count) => {
            usize::try_from(count).map_err(|_| ContractViolation::TypeMismatch {
                expected: "non-negative Smi",
                found: "Smi",
            })
        }
        value => Err(ContractViolation::TypeMismatch {
            expected: "Smi",
            found: value.type_name(),
        }),
    }
}

/// Copy the table into a new one with room for `new_capacity` entries.
fn grow<B: WriteBarrier>(
    heap: &mut Heap<B>,
    table: Option<FixedArray>,
    new_capacity: usize,
) -> TransitionResult<FixedArray> {
    let grown = FixedArray::allocate(heap, prototype_index(new_capacity));
    if let Some(table) = table {
        for index in 0..table.len(&*heap) {
            let value = table.get(&*heap, index)?;
            grown.set(heap, index, value)?;
        }
    }
    debug!(?table, ?grown, new_capacity, "grew prototype transitions");
    Ok(grown)
}

impl Shape {
    fn prototype_transitions<B: WriteBarrier>(self, heap: &Heap<B>) -> Option<FixedArray> {
        self.get_transitions(heap)?
            .get_prototype_transitions_unchecked(heap)
    }

    /// Number of cached prototype transitions of the shape.
    pub fn number_of_prototype_transitions<B: WriteBarrier>(
        self,
        heap: &Heap<B>,
    ) -> TransitionResult<usize> {
        match self.prototype_transitions(heap) {
            Some(table) => count(heap, table),
            None => Ok(0),
        }
    }

    /// Get the cached shape for objects of this shape whose prototype is
    /// changed to `prototype`.
    pub fn get_prototype_transition<B: WriteBarrier>(
        self,
        heap: &Heap<B>,
        prototype: Object,
    ) -> Option<Shape> {
        let table = self.prototype_transitions(heap)?;
        let count = count(heap, table).ok()?;
        (0..count).find_map(|entry| {
            match table.get(heap, prototype_index(entry)).ok()? {
                HeapValue::Object(cached) if cached == prototype => {
                    Shape::try_from(table.get(heap, target_index(entry)).ok()?).ok()
                }
                _ => None,
            }
        })
    }

    /// Cache `target` as the shape reached by changing the prototype to
    /// `prototype`.
    ///
    /// Returns false if the cache is full and nothing was stored.
    pub fn put_prototype_transition<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        prototype: Object,
        target: Shape,
    ) -> TransitionResult<bool> {
        let max = heap.options.max_cached_prototype_transitions;
        let transitions = self.ensure_transitions(heap)?;
        let table = transitions.get_prototype_transitions_unchecked(&*heap);
        let (count, capacity) = match table {
            Some(table) => (count(heap, table)?, capacity(heap, table)),
            None => (0, 0),
        };
        if count >= max {
            debug!(shape = ?self, count, "prototype transitions cache is full");
            return Ok(false);
        }

        let table = match table {
            Some(table) if count < capacity => table,
            _ => {
                let new_capacity = (capacity * 2).max(INITIAL_CAPACITY).min(max);
                let grown = grow(heap, table, new_capacity)?;
                transitions.set_prototype_transitions(heap, grown, WriteBarrierMode::Update);
                grown
            }
        };
        table.set(heap, prototype_index(count), prototype.into())?;
        table.set(heap, target_index(count), target.into())?;
        let count = i32::try_from(count + 1).expect("Unreasonable prototype transition count");
        table.set(heap, COUNT_INDEX, HeapValue::Smi(count))?;
        Ok(true)
    }

    /// Get the shape of an object of this shape after its prototype is
    /// changed to `prototype`.
    pub fn transition_to_prototype<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        prototype: Object,
    ) -> TransitionResult<Shape> {
        if self.get_prototype(&*heap) == Some(prototype) {
            return Ok(self);
        }
        if let Some(cached) = self.get_prototype_transition(&*heap, prototype) {
            return Ok(cached);
        }
        let record = heap.shapes[self.get_index()]
            .derive(self)
            .with_prototype(Some(prototype));
        let target = heap.create(record);
        self.put_prototype_transition(heap, prototype, target)?;
        Ok(target)
    }
}
