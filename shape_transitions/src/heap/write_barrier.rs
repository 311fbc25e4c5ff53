// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::HeapValue;

/// Address of a single slot inside a heap container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSlot {
    pub container: HeapValue,
    pub offset: u32,
}

impl RawSlot {
    pub fn new(container: impl Into<HeapValue>, offset: usize) -> Self {
        Self {
            container: container.into(),
            offset: u32::try_from(offset).expect("Unreasonable slot offset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteBarrierMode {
    /// Notify the collector of the write.
    #[default]
    Update,
    /// The caller guarantees the collector does not need to know.
    Skip,
}

/// Bookkeeping interface of a generational, incrementally marking
/// collector.
///
/// The mutator calls into this on every reference write into a heap
/// container, at the point of the write.
pub trait WriteBarrier {
    /// Record a written slot so that an in-progress incremental marking
    /// revisits it. Implementations ignore this while not marking.
    fn record_incremental_mark(&mut self, container: HeapValue, slot: RawSlot, value: HeapValue);

    /// Record that the slot at `offset` of `container` now points into the
    /// young generation.
    fn record_generational_write(&mut self, container: HeapValue, offset: u32);

    fn in_young_generation(&self, value: HeapValue) -> bool;

    /// Called for every newly allocated heap value.
    fn on_allocation(&mut self, _value: HeapValue) {}
}

/// Write barrier for heaps without a tracing collector.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWriteBarrier;

impl WriteBarrier for NoWriteBarrier {
    #[inline(always)]
    fn record_incremental_mark(&mut self, _: HeapValue, _: RawSlot, _: HeapValue) {}

    #[inline(always)]
    fn record_generational_write(&mut self, _: HeapValue, _: u32) {}

    #[inline(always)]
    fn in_young_generation(&self, _: HeapValue) -> bool {
        false
    }
}

/// Run the write barrier for a write of `value` into `slot`, unless `mode`
/// skips it.
#[inline]
pub(crate) fn conditional_write_barrier<B: WriteBarrier>(
    barrier: &mut B,
    slot: RawSlot,
    value: HeapValue,
    mode: WriteBarrierMode,
) {
    if mode == WriteBarrierMode::Update {
        barrier.record_incremental_mark(slot.container, slot, value);
        if barrier.in_young_generation(value) {
            barrier.record_generational_write(slot.container, slot.offset);
        }
    }
}
