// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    error::{ContractViolation, TransitionResult},
    heap::{
        CreateHeapData, Heap, HeapValue, RawSlot, WriteBarrier, WriteBarrierMode,
        heap_bits::{HeapMark, WorkQueues},
        indexes::FixedArrayIndex,
    },
};

/// A fixed-length array of heap values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FixedArray(FixedArrayIndex);

impl FixedArray {
    pub(crate) const fn new(index: FixedArrayIndex) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }

    /// Allocate a fixed array of `len` zero Smis.
    pub fn allocate<B: WriteBarrier>(heap: &mut Heap<B>, len: usize) -> Self {
        heap.create(FixedArrayRecord {
            values: vec![HeapValue::ZERO; len].into_boxed_slice(),
        })
    }

    pub fn cast(value: HeapValue) -> TransitionResult<Self> {
        Self::try_from(value)
    }

    pub fn len(self, heap: &impl AsRef<[FixedArrayRecord]>) -> usize {
        heap.as_ref()[self.get_index()].values.len()
    }

    pub fn is_empty(self, heap: &impl AsRef<[FixedArrayRecord]>) -> bool {
        self.len(heap) == 0
    }

    pub fn get(
        self,
        heap: &impl AsRef<[FixedArrayRecord]>,
        index: usize,
    ) -> TransitionResult<HeapValue> {
        let values = &heap.as_ref()[self.get_index()].values;
        values
            .get(index)
            .copied()
            .ok_or(ContractViolation::IndexOutOfRange {
                index,
                len: values.len(),
            })
    }

    /// Write `value` at `index`, running the write barrier.
    pub fn set<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        index: usize,
        value: HeapValue,
    ) -> TransitionResult<()> {
        let values = &mut heap.fixed_arrays[self.get_index()].values;
        let len = values.len();
        let Some(slot) = values.get_mut(index) else {
            return Err(ContractViolation::IndexOutOfRange { index, len });
        };
        *slot = value;
        heap.write_barrier(RawSlot::new(self, index), value, WriteBarrierMode::Update);
        Ok(())
    }
}

impl From<FixedArray> for HeapValue {
    fn from(value: FixedArray) -> Self {
        HeapValue::FixedArray(value)
    }
}

impl TryFrom<HeapValue> for FixedArray {
    type Error = ContractViolation;

    fn try_from(value: HeapValue) -> Result<Self, Self::Error> {
        match value {
            HeapValue::FixedArray(array) => Ok(array),
            _ => Err(ContractViolation::TypeMismatch {
                expected: "FixedArray",
                found: value.type_name(),
            }),
        }
    }
}

impl HeapMark for FixedArray {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.fixed_arrays.push(*self);
    }
}

#[derive(Debug)]
pub struct FixedArrayRecord {
    values: Box<[HeapValue]>,
}

impl HeapMark for FixedArrayRecord {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.values.mark_values(queues);
    }
}

impl<B: WriteBarrier> CreateHeapData<FixedArrayRecord, FixedArray> for Heap<B> {
    fn create(&mut self, data: FixedArrayRecord) -> FixedArray {
        self.fixed_arrays.push(data);
        let array = FixedArray::new(FixedArrayIndex::last(&self.fixed_arrays));
        self.barrier.on_allocation(array.into());
        array
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::GenerationalBarrier;
    use crate::options::Options;

    #[test]
    fn set_is_bounds_checked_and_barriered() {
        let mut heap = Heap::with_barrier(Options::default(), GenerationalBarrier::new());
        let array = FixedArray::allocate(&mut heap, 2);
        let name = heap.intern("x");
        heap.barrier_mut().reset_counters();

        array.set(&mut heap, 1, name.into()).unwrap();
        assert_eq!(array.get(&heap, 1), Ok(HeapValue::from(name)));
        assert_eq!(array.get(&heap, 0), Ok(HeapValue::ZERO));
        assert_eq!(heap.barrier().incremental_mark_calls(), 1);
        assert!(heap.barrier().is_remembered(RawSlot::new(array, 1)));

        assert_eq!(
            array.set(&mut heap, 2, name.into()),
            Err(ContractViolation::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(heap.barrier().incremental_mark_calls(), 1);
    }

    #[test]
    fn cast_checks_type() {
        let mut heap = Heap::default();
        let empty = FixedArray::allocate(&mut heap, 0);
        let name = heap.intern("x");
        assert!(empty.is_empty(&heap));
        assert!(!FixedArray::allocate(&mut heap, 1).is_empty(&heap));
        assert_eq!(FixedArray::cast(empty.into()), Ok(empty));
        assert_eq!(
            FixedArray::cast(name.into()),
            Err(ContractViolation::TypeMismatch {
                expected: "FixedArray",
                found: "PropertyName"
            })
        );
    }
}
