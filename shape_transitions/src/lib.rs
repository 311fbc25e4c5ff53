// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Shape transitions
//!
//! Transition tables for object shapes (hidden classes): the index from a
//! shape to the shapes derived from it by adding a property, changing the
//! elements kind or changing the prototype.
//!
//! All data lives in a [`Heap`] and is referred to by small index handles.
//! Every reference stored into a heap container is reported to the heap's
//! [`WriteBarrier`], except while populating a freshly allocated transition
//! array under its [`WhitenessWitness`].

pub mod error;
pub mod fixed_array;
pub mod heap;
pub mod object;
pub mod options;
pub mod property_name;
pub mod shape;
pub mod transitions;

pub use error::{ContractViolation, SpecialSlot, TransitionResult};
pub use fixed_array::FixedArray;
pub use heap::{
    CreateHeapData, GenerationalBarrier, Heap, HeapValue, NoWriteBarrier, RawSlot, WriteBarrier,
    WriteBarrierMode,
};
pub use object::{Object, ObjectRecord};
pub use options::Options;
pub use property_name::PropertyName;
pub use shape::{Descriptor, ElementsKind, PropertyDetails, Shape, ShapeRecord};
pub use transitions::{TransitionArray, WhitenessWitness};
