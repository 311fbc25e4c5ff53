// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use hashbrown::HashSet;

use super::{HeapValue, RawSlot, WriteBarrier};

/// Write barrier recorder for a two-generation collector with incremental
/// marking.
///
/// Every allocated heap value starts out young. The recorder keeps the
/// marking worklist and the remembered set that the collector would consume,
/// and counts its invocations.
#[derive(Debug, Default)]
pub struct GenerationalBarrier {
    marking: bool,
    young: HashSet<HeapValue>,
    marking_worklist: Vec<(RawSlot, HeapValue)>,
    remembered_set: HashSet<RawSlot>,
    incremental_mark_calls: usize,
    generational_write_calls: usize,
}

impl GenerationalBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_marking(&mut self) {
        self.marking = true;
    }

    /// End the incremental marking cycle, handing back the slots recorded
    /// during it.
    pub fn finish_marking(&mut self) -> Vec<(RawSlot, HeapValue)> {
        self.marking = false;
        core::mem::take(&mut self.marking_worklist)
    }

    pub fn is_marking(&self) -> bool {
        self.marking
    }

    /// Minor collection: every young value survives into the old
    /// generation. Returns the number of remembered slots consumed.
    pub fn promote_all(&mut self) -> usize {
        self.young.clear();
        let remembered = self.remembered_set.len();
        self.remembered_set.clear();
        remembered
    }

    pub fn marking_worklist(&self) -> &[(RawSlot, HeapValue)] {
        &self.marking_worklist
    }

    pub fn is_remembered(&self, slot: RawSlot) -> bool {
        self.remembered_set.contains(&slot)
    }

    pub fn incremental_mark_calls(&self) -> usize {
        self.incremental_mark_calls
    }

    pub fn generational_write_calls(&self) -> usize {
        self.generational_write_calls
    }

    pub fn reset_counters(&mut self) {
        self.incremental_mark_calls = 0;
        self.generational_write_calls = 0;
    }
}

impl WriteBarrier for GenerationalBarrier {
    fn record_incremental_mark(&mut self, container: HeapValue, slot: RawSlot, value: HeapValue) {
        self.incremental_mark_calls += 1;
        if !self.marking {
            return;
        }
        tracing::trace!(?container, offset = slot.offset, ?value, "recording slot for marker");
        self.marking_worklist.push((slot, value));
    }

    fn record_generational_write(&mut self, container: HeapValue, offset: u32) {
        self.generational_write_calls += 1;
        tracing::trace!(?container, offset, "remembering old-to-young slot");
        self.remembered_set.insert(RawSlot { container, offset });
    }

    fn in_young_generation(&self, value: HeapValue) -> bool {
        self.young.contains(&value)
    }

    fn on_allocation(&mut self, value: HeapValue) {
        if value.is_heap_reference() {
            self.young.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{WriteBarrierMode, conditional_write_barrier, indexes::ShapeIndex};
    use crate::shape::Shape;

    fn shape(index: usize) -> HeapValue {
        HeapValue::Shape(Shape::new(ShapeIndex::from_index(index)))
    }

    #[test]
    fn young_values_are_remembered() {
        let mut barrier = GenerationalBarrier::new();
        let container = shape(0);
        let value = shape(1);
        barrier.on_allocation(value);
        let slot = RawSlot::new(container, 3);
        conditional_write_barrier(&mut barrier, slot, value, WriteBarrierMode::Update);
        assert_eq!(barrier.incremental_mark_calls(), 1);
        assert_eq!(barrier.generational_write_calls(), 1);
        assert!(barrier.is_remembered(slot));
        // Not marking: nothing for the marker.
        assert!(barrier.marking_worklist().is_empty());

        assert_eq!(barrier.promote_all(), 1);
        assert!(!barrier.in_young_generation(value));
        conditional_write_barrier(&mut barrier, slot, value, WriteBarrierMode::Update);
        assert_eq!(barrier.generational_write_calls(), 1);
        assert!(!barrier.is_remembered(slot));
    }

    #[test]
    fn marking_collects_slots() {
        let mut barrier = GenerationalBarrier::new();
        barrier.start_marking();
        let slot = RawSlot::new(shape(0), 0);
        conditional_write_barrier(&mut barrier, slot, shape(2), WriteBarrierMode::Update);
        conditional_write_barrier(&mut barrier, slot, shape(3), WriteBarrierMode::Skip);
        assert_eq!(barrier.incremental_mark_calls(), 1);
        let worklist = barrier.finish_marking();
        assert_eq!(worklist, vec![(slot, shape(2))]);
        assert!(!barrier.is_marking());
    }

    #[test]
    fn smis_are_never_young() {
        let mut barrier = GenerationalBarrier::new();
        barrier.on_allocation(HeapValue::ZERO);
        assert!(!barrier.in_young_generation(HeapValue::ZERO));
    }
}
