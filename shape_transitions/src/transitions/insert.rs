// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

use super::{TransitionArray, WhitenessWitness};
use crate::{
    error::{ContractViolation, TransitionResult},
    heap::{CreateHeapData, Heap, WriteBarrier, WriteBarrierMode},
    property_name::PropertyName,
    shape::{Descriptor, ElementsKind, PropertyDetails, Shape},
};

impl TransitionArray {
    /// Create an unpublished copy of this array with the given transition
    /// added.
    ///
    /// If the array already has a transition for `key`, the copy has the
    /// same length and `target` replaces the old target. Both special slots
    /// are carried over.
    pub fn copy_insert<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        key: PropertyName,
        target: Shape,
    ) -> TransitionResult<(TransitionArray, WhitenessWitness)> {
        let old_len = self.len(&*heap);
        let insertion = self.search_insertion_point(&*heap, key);
        let new_len = match insertion {
            Ok(_) => old_len,
            Err(_) => old_len + 1,
        };
        let (array, witness) = TransitionArray::allocate(heap, new_len);
        array.copy_special_slots_from(heap, self, &witness)?;

        let mut out = 0;
        for i in 0..old_len {
            if insertion == Err(i) {
                array.set_entry(heap, out, key, target, &witness)?;
                out += 1;
            }
            let old_key = self.get_key(&*heap, i)?;
            let old_target = if insertion == Ok(i) {
                target
            } else {
                self.get_target(&*heap, i)?
            };
            array.set_entry(heap, out, old_key, old_target, &witness)?;
            out += 1;
        }
        if insertion == Err(old_len) {
            array.set_entry(heap, out, key, target, &witness)?;
        }
        debug!(from = ?self, to = ?array, old_len, new_len, "copied transition array");
        Ok((array, witness))
    }
}

impl Shape {
    /// Get the shape reached by adding the given property to this shape.
    ///
    /// Returns None if no transition exists.
    pub fn find_transition<B: WriteBarrier>(
        self,
        heap: &Heap<B>,
        key: PropertyName,
    ) -> Option<Shape> {
        let transitions = self.get_transitions(heap)?;
        let index = transitions.search(heap, key)?;
        transitions.get_target(heap, index).ok()
    }

    /// Get the shape's transition array, publishing an empty one if the shape
    /// has none yet.
    pub fn ensure_transitions<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
    ) -> TransitionResult<TransitionArray> {
        if let Some(transitions) = self.get_transitions(&*heap) {
            return Ok(transitions);
        }
        let (array, witness) = TransitionArray::allocate(heap, 0);
        witness.publish(heap, self)
    }

    /// Record a transition from this shape to `target` for `key`.
    ///
    /// Transition arrays are never extended in place: a new array holding
    /// the added transition replaces the old one.
    pub fn add_transition<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        key: PropertyName,
        target: Shape,
    ) -> TransitionResult<TransitionArray> {
        let (array, witness) = match self.get_transitions(&*heap) {
            Some(transitions) => transitions.copy_insert(heap, key, target)?,
            None => {
                let (array, witness) = TransitionArray::allocate(heap, 1);
                array.set_entry(heap, 0, key, target, &witness)?;
                (array, witness)
            }
        };
        witness.publish(heap, self)
    }

    /// Get the shape of an object of this shape after adding a property.
    ///
    /// An existing transition is reused; otherwise a new shape is created
    /// and the transition recorded.
    pub fn add_property<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        key: PropertyName,
        details: PropertyDetails,
    ) -> TransitionResult<Shape> {
        if let Some(target) = self.find_transition(&*heap, key) {
            return Ok(target);
        }
        let parent = &heap.shapes[self.get_index()];
        if parent.has_descriptor(key) {
            return Err(ContractViolation::DuplicateDescriptor);
        }
        let record = parent.derive(self).with_descriptor(Descriptor { key, details });
        let target = heap.create(record);
        self.add_transition(heap, key, target)?;
        Ok(target)
    }

    /// Get the shape of an object of this shape after its elements are
    /// changed to the given kind.
    ///
    /// A shape remembers a single elements transition; reaching a different
    /// elements kind replaces it.
    pub fn transition_elements_to<B: WriteBarrier>(
        self,
        heap: &mut Heap<B>,
        elements_kind: ElementsKind,
    ) -> TransitionResult<Shape> {
        if self.get_elements_kind(&*heap) == elements_kind {
            return Ok(self);
        }
        let transitions = self.ensure_transitions(heap)?;
        if transitions.has_elements_transition(&*heap) {
            let previous = transitions.get_elements_transition(&*heap)?;
            if previous.get_elements_kind(&*heap) == elements_kind {
                return Ok(previous);
            }
            debug!(
                shape = ?self,
                ?previous,
                ?elements_kind,
                "replacing elements transition"
            );
        }
        let record = heap.shapes[self.get_index()]
            .derive(self)
            .with_elements_kind(elements_kind);
        let target = heap.create(record);
        transitions.set_elements_transition(heap, target, WriteBarrierMode::Update);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        heap::GenerationalBarrier, options::Options, shape::ShapeRecord,
        transitions::key_index,
    };

    fn heap() -> Heap<GenerationalBarrier> {
        Heap::with_barrier(Options::default(), GenerationalBarrier::new())
    }

    #[test]
    fn copy_insert_keeps_keys_sorted() {
        let mut heap = heap();
        let owner = Shape::create_root(&mut heap, None);
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|name| heap.intern(name));
        for key in [d, b, a, c] {
            let target = heap.create(ShapeRecord::root(None));
            owner.add_transition(&mut heap, key, target).unwrap();
        }
        let transitions = owner.get_transitions(&heap).unwrap();
        let keys: Vec<_> = transitions.entries(&heap).map(|(key, _)| key).collect();
        assert_eq!(keys, vec![a, b, c, d]);
        assert!(transitions.verify(&heap).is_ok());
    }

    #[test]
    fn copy_insert_carries_special_slots() {
        let mut heap = heap();
        let owner = Shape::create_root(&mut heap, None);
        let transitions = owner.ensure_transitions(&mut heap).unwrap();
        let elements_target = heap.create(ShapeRecord::root(None));
        transitions.set_elements_transition(&mut heap, elements_target, WriteBarrierMode::Update);
        let side_table = crate::fixed_array::FixedArray::allocate(&mut heap, 1);
        transitions.set_prototype_transitions(&mut heap, side_table, WriteBarrierMode::Update);

        let key = heap.intern("x");
        let target = heap.create(ShapeRecord::root(None));
        let grown = owner.add_transition(&mut heap, key, target).unwrap();
        assert_ne!(grown, transitions);
        assert_eq!(grown.get_elements_transition(&heap), Ok(elements_target));
        assert_eq!(grown.get_prototype_transitions(&heap), Ok(side_table));
        assert_eq!(grown.search(&heap, key), Some(0));
        // The old array is left as it was.
        assert_eq!(transitions.len(&heap), 0);
    }

    #[test]
    fn adding_an_existing_key_replaces_the_target() {
        let mut heap = heap();
        let owner = Shape::create_root(&mut heap, None);
        let key = heap.intern("x");
        let first = heap.create(ShapeRecord::root(None));
        let second = heap.create(ShapeRecord::root(None));
        owner.add_transition(&mut heap, key, first).unwrap();
        let transitions = owner.add_transition(&mut heap, key, second).unwrap();
        assert_eq!(transitions.len(&heap), 1);
        assert_eq!(owner.find_transition(&heap, key), Some(second));
    }

    #[test]
    fn copies_are_written_without_barriers() {
        let mut heap = heap();
        let owner = Shape::create_root(&mut heap, None);
        let [a, b] = ["a", "b"].map(|name| heap.intern(name));
        let target = heap.create(ShapeRecord::root(None));
        owner.add_transition(&mut heap, a, target).unwrap();
        heap.barrier_mut().reset_counters();

        let transitions = owner.get_transitions(&heap).unwrap();
        let (copy, witness) = transitions.copy_insert(&mut heap, b, target).unwrap();
        assert_eq!(heap.barrier().incremental_mark_calls(), 0);
        assert_eq!(copy.key_slot(&heap, 1).unwrap().offset as usize, key_index(1));
        witness.publish(&mut heap, owner).unwrap();
        assert_eq!(heap.barrier().incremental_mark_calls(), 1);
    }

    #[test]
    fn add_property_reuses_transitions() {
        let mut heap = heap();
        let root = Shape::create_root(&mut heap, None);
        let x = heap.intern("x");
        let y = heap.intern("y");
        let with_x = root
            .add_property(&mut heap, x, PropertyDetails::data_field(0))
            .unwrap();
        let again = root
            .add_property(&mut heap, x, PropertyDetails::data_field(0))
            .unwrap();
        assert_eq!(with_x, again);
        let with_xy = with_x
            .add_property(&mut heap, y, PropertyDetails::data_field(1))
            .unwrap();
        assert_eq!(with_xy.instance_descriptors(&heap).len(), 2);
        assert_eq!(with_xy.get_back_pointer(&heap), Some(with_x));

        let transitions = with_x.get_transitions(&heap).unwrap();
        assert_eq!(
            transitions.get_target_property_details(&heap, 0),
            Ok(PropertyDetails::data_field(1))
        );
        assert_eq!(
            with_xy.add_property(&mut heap, x, PropertyDetails::data_field(2)),
            Err(ContractViolation::DuplicateDescriptor)
        );
    }

    #[test]
    fn elements_transition_is_reused_or_replaced() {
        let mut heap = heap();
        let root = Shape::create_root(&mut heap, None);
        assert_eq!(
            root.transition_elements_to(&mut heap, ElementsKind::PackedSmi),
            Ok(root)
        );

        let holey = root
            .transition_elements_to(&mut heap, ElementsKind::HoleySmi)
            .unwrap();
        assert_eq!(holey.get_elements_kind(&heap), ElementsKind::HoleySmi);
        assert_eq!(
            root.transition_elements_to(&mut heap, ElementsKind::HoleySmi),
            Ok(holey)
        );

        let double = root
            .transition_elements_to(&mut heap, ElementsKind::PackedDouble)
            .unwrap();
        let transitions = root.get_transitions(&heap).unwrap();
        assert_eq!(transitions.get_elements_transition(&heap), Ok(double));
        assert_ne!(double, holey);
    }
}
