// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Transition arrays
//!
//! A transition array records every shape that is known to be derived from
//! a given shape, so that adding the same property to two objects of the
//! same shape leads both of them to the same derived shape. This is what
//! makes shape identity useful for inline caching.
//!
//! The storage of a transition array is a single homogeneous slice of heap
//! values:
//!
//! ```text
//! [elements transition, prototype transitions, key_0, target_0, ...]
//! ```
//!
//! The two leading special slots hold `Smi(0)` when empty. The key/target
//! pairs are sorted strictly ascending by key identity, which lets lookups
//! binary search without ever reading property name text.
//!
//! Arrays are never resized: adding a transition creates a new array (see
//! [`TransitionArray::copy_insert`]). A new array is populated under a
//! [`WhitenessWitness`] without write barriers while it is still
//! unreachable, and then published onto its owning shape.

mod insert;
mod prototype_transitions;
mod witness;

pub use witness::WhitenessWitness;

use core::cmp::Ordering;

use crate::{
    error::{ContractViolation, SpecialSlot, TransitionResult},
    fixed_array::FixedArray,
    heap::{
        CreateHeapData, Heap, HeapValue, RawSlot, WriteBarrier, WriteBarrierMode,
        heap_bits::{HeapMark, WorkQueues},
        indexes::TransitionArrayIndex,
    },
    property_name::PropertyName,
    shape::{PropertyDetails, Shape, ShapeRecord},
};

pub const ELEMENTS_TRANSITION_INDEX: usize = 0;
pub const PROTOTYPE_TRANSITIONS_INDEX: usize = 1;
pub const FIRST_INDEX: usize = 2;

pub const TRANSITION_SIZE: usize = 2;
pub const TRANSITION_KEY: usize = 0;
pub const TRANSITION_TARGET: usize = 1;

/// Storage index of the key of the given transition.
#[inline(always)]
pub const fn key_index(transition_number: usize) -> usize {
    FIRST_INDEX + transition_number * TRANSITION_SIZE + TRANSITION_KEY
}

/// Storage index of the target of the given transition.
#[inline(always)]
pub const fn target_index(transition_number: usize) -> usize {
    FIRST_INDEX + transition_number * TRANSITION_SIZE + TRANSITION_TARGET
}

/// Reference to a transition array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TransitionArray(TransitionArrayIndex);

impl TransitionArray {
    pub(crate) const fn new(index: TransitionArrayIndex) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }

    fn record(self, heap: &impl AsRef<[TransitionArrayRecord]>) -> &TransitionArrayRecord {
        &heap.as_ref()[self.get_index()]
    }

    /// Check that the heap value is a transition array.
    pub fn cast(value: HeapValue) -> TransitionResult<Self> {
        Self::try_from(value)
    }

    /// Number of transitions in the array.
    pub fn len(self, heap: &impl AsRef<[TransitionArrayRecord]>) -> usize {
        self.record(heap).number_of_transitions()
    }

    pub fn is_empty(self, heap: &impl AsRef<[TransitionArrayRecord]>) -> bool {
        self.len(heap) == 0
    }

    fn check_index(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
        transition_number: usize,
    ) -> TransitionResult<()> {
        let len = self.len(heap);
        if transition_number < len {
            Ok(())
        } else {
            Err(ContractViolation::IndexOutOfRange {
                index: transition_number,
                len,
            })
        }
    }

    /// Find the transition with the given key.
    ///
    /// Returns None if the array has no transition for the key.
    pub fn search(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
        key: PropertyName,
    ) -> Option<usize> {
        self.search_insertion_point(heap, key).ok()
    }

    /// Binary search for the key.
    ///
    /// Returns `Ok(index)` of the matching transition, or `Err(index)` of the
    /// position the key would be inserted at to keep the keys sorted. Entries
    /// that were never written compare greater than every key.
    pub fn search_insertion_point(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
        key: PropertyName,
    ) -> Result<usize, usize> {
        let record = self.record(heap);
        let mut low = 0;
        let mut high = record.number_of_transitions();
        while low < high {
            let mid = low + (high - low) / 2;
            let ordering = match record.key(mid) {
                Some(probe) => probe.cmp(&key),
                None => Ordering::Greater,
            };
            match ordering {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(low)
    }

    pub fn get_key(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
        transition_number: usize,
    ) -> TransitionResult<PropertyName> {
        self.check_index(heap, transition_number)?;
        match self.record(heap).get(key_index(transition_number)) {
            HeapValue::Smi(_) => Err(ContractViolation::IncompleteEntry {
                index: transition_number,
            }),
            value => PropertyName::try_from(value),
        }
    }

    pub fn get_target(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
        transition_number: usize,
    ) -> TransitionResult<Shape> {
        self.check_index(heap, transition_number)?;
        match self.record(heap).get(target_index(transition_number)) {
            HeapValue::Smi(_) => Err(ContractViolation::IncompleteEntry {
                index: transition_number,
            }),
            value => Shape::try_from(value),
        }
    }

    /// Address of the key slot of the given transition.
    pub fn key_slot(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
        transition_number: usize,
    ) -> TransitionResult<RawSlot> {
        self.check_index(heap, transition_number)?;
        Ok(RawSlot::new(self, key_index(transition_number)))
    }

    /// Replace the key of a transition, keeping the keys sorted.
    pub fn set_key<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        transition_number: usize,
        key: PropertyName,
    ) -> TransitionResult<()> {
        self.check_index(&*heap, transition_number)?;
        self.record(&*heap).check_order(transition_number, key)?;
        self.write_slot(
            heap,
            key_index(transition_number),
            key.into(),
            WriteBarrierMode::Update,
        );
        Ok(())
    }

    pub fn set_target<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        transition_number: usize,
        target: Shape,
    ) -> TransitionResult<()> {
        self.check_index(&*heap, transition_number)?;
        self.write_slot(
            heap,
            target_index(transition_number),
            target.into(),
            WriteBarrierMode::Update,
        );
        Ok(())
    }

    /// Get the details of the property that the given transition adds.
    ///
    /// These are read off the last added descriptor of the target shape.
    /// Its key is not compared with the transition key.
    pub fn get_target_property_details<H>(
        self,
        heap: &H,
        transition_number: usize,
    ) -> TransitionResult<PropertyDetails>
    where
        H: AsRef<[TransitionArrayRecord]> + AsRef<[ShapeRecord]>,
    {
        let target = self.get_target(heap, transition_number)?;
        let descriptor = target
            .last_added_descriptor_index(heap)
            .ok_or(ContractViolation::NoneAdded)?;
        Ok(target.instance_descriptors(heap)[descriptor as usize].details)
    }

    pub fn has_elements_transition(self, heap: &impl AsRef<[TransitionArrayRecord]>) -> bool {
        self.record(heap).get(ELEMENTS_TRANSITION_INDEX) != HeapValue::ZERO
    }

    /// Get the shape reached by changing the elements kind.
    ///
    /// Callers should check [`Self::has_elements_transition`] first.
    pub fn get_elements_transition(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
    ) -> TransitionResult<Shape> {
        match self.record(heap).get(ELEMENTS_TRANSITION_INDEX) {
            HeapValue::Smi(0) => Err(ContractViolation::AbsentSlot(
                SpecialSlot::ElementsTransition,
            )),
            value => Shape::try_from(value),
        }
    }

    /// Set the elements transition, replacing any previous one.
    pub fn set_elements_transition<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        target: Shape,
        mode: WriteBarrierMode,
    ) {
        self.write_slot(heap, ELEMENTS_TRANSITION_INDEX, target.into(), mode);
    }

    pub fn clear_elements_transition(self, heap: &mut impl AsMut<[TransitionArrayRecord]>) {
        // Storing a Smi never creates a reference the collector must know of.
        heap.as_mut()[self.get_index()].slots[ELEMENTS_TRANSITION_INDEX] = HeapValue::ZERO;
    }

    pub fn has_prototype_transitions(self, heap: &impl AsRef<[TransitionArrayRecord]>) -> bool {
        self.record(heap).get(PROTOTYPE_TRANSITIONS_INDEX) != HeapValue::ZERO
    }

    pub fn get_prototype_transitions(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
    ) -> TransitionResult<FixedArray> {
        match self.record(heap).get(PROTOTYPE_TRANSITIONS_INDEX) {
            HeapValue::Smi(0) => Err(ContractViolation::AbsentSlot(
                SpecialSlot::PrototypeTransitions,
            )),
            value => FixedArray::try_from(value),
        }
    }

    /// Get the prototype transitions side table without checks.
    ///
    /// Returns None when the slot is empty.
    pub fn get_prototype_transitions_unchecked(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
    ) -> Option<FixedArray> {
        match self.record(heap).get(PROTOTYPE_TRANSITIONS_INDEX) {
            HeapValue::FixedArray(array) => Some(array),
            _ => None,
        }
    }

    pub fn set_prototype_transitions<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        transitions: FixedArray,
        mode: WriteBarrierMode,
    ) {
        self.write_slot(heap, PROTOTYPE_TRANSITIONS_INDEX, transitions.into(), mode);
    }

    /// Address of the prototype transitions slot, for callers doing their
    /// own barrier bookkeeping.
    pub fn prototype_transitions_slot(self) -> RawSlot {
        RawSlot::new(self, PROTOTYPE_TRANSITIONS_INDEX)
    }

    /// Iterate over the written key/target pairs in key order.
    pub fn entries(
        self,
        heap: &impl AsRef<[TransitionArrayRecord]>,
    ) -> impl Iterator<Item = (PropertyName, Shape)> + '_ {
        let record = self.record(heap);
        (0..record.number_of_transitions())
            .filter_map(move |i| Some((record.key(i)?, record.target(i)?)))
    }

    /// Check that every transition is written and the keys are strictly
    /// sorted.
    pub fn verify(self, heap: &impl AsRef<[TransitionArrayRecord]>) -> TransitionResult<()> {
        let record = self.record(heap);
        let mut previous: Option<PropertyName> = None;
        for index in 0..record.number_of_transitions() {
            let (Some(key), Some(_)) = (record.key(index), record.target(index)) else {
                return Err(ContractViolation::IncompleteEntry { index });
            };
            if previous.is_some_and(|previous| previous >= key) {
                return Err(ContractViolation::Unsorted { index });
            }
            previous = Some(key);
        }
        Ok(())
    }

    fn write_slot<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        index: usize,
        value: HeapValue,
        mode: WriteBarrierMode,
    ) {
        heap.transition_arrays[self.get_index()].slots[index] = value;
        heap.write_barrier(RawSlot::new(self, index), value, mode);
    }
}

impl From<TransitionArray> for HeapValue {
    fn from(value: TransitionArray) -> Self {
        HeapValue::TransitionArray(value)
    }
}

impl TryFrom<HeapValue> for TransitionArray {
    type Error = ContractViolation;

    fn try_from(value: HeapValue) -> Result<Self, Self::Error> {
        match value {
            HeapValue::TransitionArray(array) => Ok(array),
            _ => Err(ContractViolation::TypeMismatch {
                expected: "TransitionArray",
                found: value.type_name(),
            }),
        }
    }
}

impl HeapMark for TransitionArray {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.transition_arrays.push(*self);
    }
}

#[derive(Debug)]
pub struct TransitionArrayRecord {
    slots: Box<[HeapValue]>,
}

impl TransitionArrayRecord {
    /// Storage for the given number of transitions, all slots empty.
    pub(crate) fn with_transitions(number_of_transitions: usize) -> Self {
        Self {
            slots: vec![HeapValue::ZERO; key_index(number_of_transitions)].into_boxed_slice(),
        }
    }

    pub fn number_of_transitions(&self) -> usize {
        debug_assert_eq!((self.slots.len() - FIRST_INDEX) % TRANSITION_SIZE, 0);
        (self.slots.len() - FIRST_INDEX) / TRANSITION_SIZE
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> HeapValue {
        self.slots[index]
    }

    fn key(&self, transition_number: usize) -> Option<PropertyName> {
        PropertyName::try_from(self.get(key_index(transition_number))).ok()
    }

    fn target(&self, transition_number: usize) -> Option<Shape> {
        Shape::try_from(self.get(target_index(transition_number))).ok()
    }

    /// Check that `key` fits between the written neighbours of the given
    /// transition.
    fn check_order(&self, transition_number: usize, key: PropertyName) -> TransitionResult<()> {
        let previous = (0..transition_number).rev().find_map(|i| self.key(i));
        let next = (transition_number + 1..self.number_of_transitions()).find_map(|i| self.key(i));
        if previous.is_some_and(|previous| previous >= key) || next.is_some_and(|next| next <= key)
        {
            return Err(ContractViolation::Unsorted {
                index: transition_number,
            });
        }
        Ok(())
    }
}

impl HeapMark for TransitionArrayRecord {
    fn mark_values(&self, queues: &mut WorkQueues) {
        // Empty special slots and unwritten entries are Smis and get skipped.
        self.slots.mark_values(queues);
    }
}

impl<B: WriteBarrier> CreateHeapData<TransitionArrayRecord, TransitionArray> for Heap<B> {
    fn create(&mut self, data: TransitionArrayRecord) -> TransitionArray {
        self.transition_arrays.push(data);
        let array = TransitionArray::new(TransitionArrayIndex::last(&self.transition_arrays));
        self.barrier.on_allocation(array.into());
        array
    }
}
