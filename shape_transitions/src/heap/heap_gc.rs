// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{
    Heap, WriteBarrier,
    heap_bits::{HeapBits, HeapMark, WorkQueues},
};

fn mark_records<R: HeapMark>(
    marks: impl Iterator<Item = usize>,
    bits: &mut [bool],
    records: &[R],
    queues: &mut WorkQueues,
) {
    for index in marks {
        let Some(marked) = bits.get_mut(index) else {
            continue;
        };
        if *marked {
            // Already marked, ignore
            continue;
        }
        *marked = true;
        records[index].mark_values(queues);
    }
}

/// Mark everything reachable from the heap roots.
///
/// Property transitions are treated as strong references here; clearing
/// dead transitions is the business of the collector proper.
pub fn mark_reachable<B: WriteBarrier>(heap: &Heap<B>) -> HeapBits {
    let mut bits = HeapBits::new(heap);
    let mut queues = WorkQueues::new(heap);

    heap.roots.mark_values(&mut queues);

    while !queues.is_empty() {
        let Heap {
            names: _,
            objects,
            shapes,
            fixed_arrays,
            transition_arrays,
            roots: _,
            options: _,
            barrier: _,
        } = heap;

        // Property names hold no references.
        for name in queues.names.drain(..) {
            bits.names[name.get_index()] = true;
        }

        let mut object_marks: Box<[_]> = queues.objects.drain(..).collect();
        object_marks.sort();
        mark_records(
            object_marks.iter().map(|object| object.get_index()),
            &mut bits.objects,
            objects,
            &mut queues,
        );

        let mut shape_marks: Box<[_]> = queues.shapes.drain(..).collect();
        shape_marks.sort();
        mark_records(
            shape_marks.iter().map(|shape| shape.get_index()),
            &mut bits.shapes,
            shapes,
            &mut queues,
        );

        let mut fixed_array_marks: Box<[_]> = queues.fixed_arrays.drain(..).collect();
        fixed_array_marks.sort();
        mark_records(
            fixed_array_marks.iter().map(|array| array.get_index()),
            &mut bits.fixed_arrays,
            fixed_arrays,
            &mut queues,
        );

        let mut transition_array_marks: Box<[_]> = queues.transition_arrays.drain(..).collect();
        transition_array_marks.sort();
        mark_records(
            transition_array_marks.iter().map(|array| array.get_index()),
            &mut bits.transition_arrays,
            transition_arrays,
            &mut queues,
        );
    }

    bits
}

#[cfg(test)]
mod tests {
    use crate::{
        heap::{CreateHeapData, Heap, HeapValue},
        object::ObjectRecord,
        shape::{Shape, ShapeRecord},
    };

    #[test]
    fn marks_from_roots_only() {
        let mut heap = Heap::default();
        let root_shape = Shape::create_root(&mut heap, None);
        let object = heap.create(ObjectRecord::new(root_shape));
        let stray = heap.create(ShapeRecord::root(None));
        heap.add_root(object);

        let bits = super::mark_reachable(&heap);
        assert!(bits.is_marked(object.into()));
        assert!(bits.is_marked(root_shape.into()));
        assert!(!bits.is_marked(stray.into()));
        assert!(!bits.is_marked(HeapValue::ZERO));
    }
}
