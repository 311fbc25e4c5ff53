// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::cell::Cell;

use tracing::debug;

use super::{
    ELEMENTS_TRANSITION_INDEX, PROTOTYPE_TRANSITIONS_INDEX, TransitionArray,
    TransitionArrayRecord, key_index, target_index,
};
use crate::{
    error::{ContractViolation, TransitionResult},
    heap::{CreateHeapData, Heap, WriteBarrier, WriteBarrierMode},
    property_name::PropertyName,
    shape::Shape,
};

/// # Proof that a transition array is not yet reachable
///
/// Only [`TransitionArray::allocate`] creates witnesses, and each witness
/// belongs to the array allocated with it. Writes made with the witness skip
/// the write barrier entirely: the collector has not seen the array yet, so
/// it cannot lose track of anything stored into it.
///
/// Publishing the array consumes the witness.
///
/// With [`Options::verify_heap`](crate::options::Options) set, the array is
/// checked to be unreachable on the first write through the witness and
/// again when it is published.
#[derive(Debug)]
#[must_use = "an unpublished transition array must be published or discarded"]
pub struct WhitenessWitness {
    array: TransitionArray,
    verified: Cell<bool>,
}

impl TransitionArray {
    /// Allocate an unpublished transition array with room for the given
    /// number of transitions.
    ///
    /// All slots start out empty. Every transition must be written with
    /// [`TransitionArray::set_entry`] before the array can be published.
    pub fn allocate<B: WriteBarrier>(
        heap: &mut Heap<B>,
        number_of_transitions: usize,
    ) -> (TransitionArray, WhitenessWitness) {
        let array = heap.create(TransitionArrayRecord::with_transitions(
            number_of_transitions,
        ));
        debug!(?array, number_of_transitions, "allocated transition array");
        let witness = WhitenessWitness {
            array,
            verified: Cell::new(false),
        };
        (array, witness)
    }

    /// Write both cells of a transition of an unpublished array, without
    /// write barriers.
    pub fn set_entry<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        transition_number: usize,
        key: PropertyName,
        target: Shape,
        witness: &WhitenessWitness,
    ) -> TransitionResult<()> {
        witness.check(heap, self)?;
        self.check_index(&*heap, transition_number)?;
        let record = &mut heap.transition_arrays[self.get_index()];
        record.check_order(transition_number, key)?;
        record.slots[key_index(transition_number)] = key.into();
        record.slots[target_index(transition_number)] = target.into();
        Ok(())
    }

    /// Copy both special slots of `source` into this unpublished array,
    /// without write barriers.
    pub(crate) fn copy_special_slots_from<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        source: TransitionArray,
        witness: &WhitenessWitness,
    ) -> TransitionResult<()> {
        witness.check(heap, self)?;
        let source = source.record(&*heap);
        let elements_transition = source.get(ELEMENTS_TRANSITION_INDEX);
        let prototype_transitions = source.get(PROTOTYPE_TRANSITIONS_INDEX);
        let record = &mut heap.transition_arrays[self.get_index()];
        record.slots[ELEMENTS_TRANSITION_INDEX] = elements_transition;
        record.slots[PROTOTYPE_TRANSITIONS_INDEX] = prototype_transitions;
        Ok(())
    }
}

impl WhitenessWitness {
    /// The array this witness vouches for.
    pub fn array(&self) -> TransitionArray {
        self.array
    }

    fn check<B: WriteBarrier>(
        &self,
        heap: &Heap<B>,
        array: TransitionArray,
    ) -> TransitionResult<()> {
        if self.array != array {
            return Err(ContractViolation::ForeignWitness);
        }
        if heap.options.verify_heap && !self.verified.get() {
            if heap.is_reachable(array) {
                return Err(ContractViolation::AlreadyReachable);
            }
            self.verified.set(true);
        }
        Ok(())
    }

    /// Attach the array to its owner shape, making it reachable.
    ///
    /// The array must be fully written and sorted. If it is not, the array
    /// stays unpublished and is left for the collector.
    pub fn publish<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        owner: Shape,
    ) -> TransitionResult<TransitionArray> {
        let Self { array, .. } = self;
        array.verify(&*heap)?;
        if heap.options.verify_heap && heap.is_reachable(array) {
            return Err(ContractViolation::AlreadyReachable);
        }
        owner.set_transitions(heap, array, WriteBarrierMode::Update);
        debug!(
            ?array,
            ?owner,
            len = array.len(&*heap),
            "published transition array"
        );
        Ok(array)
    }

    /// Give up on the array without publishing it.
    pub fn discard(self) {
        debug!(array = ?self.array, "discarded unpublished transition array");
    }
}
