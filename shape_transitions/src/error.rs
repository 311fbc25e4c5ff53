// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::fmt;

use thiserror::Error;

/// One of the two out-of-band slots that precede the sorted transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialSlot {
    ElementsTransition,
    PrototypeTransitions,
}

impl fmt::Display for SpecialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialSlot::ElementsTransition => f.write_str("elements transition"),
            SpecialSlot::PrototypeTransitions => f.write_str("prototype transitions"),
        }
    }
}

/// Caller-side misuse of a transition array or one of its collaborators.
///
/// None of these are transient: retrying the same call with the same
/// arguments fails the same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("expected {expected} but found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("transition index {index} out of range for {len} transitions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0} slot is empty")]
    AbsentSlot(SpecialSlot),
    #[error("target shape has no last added descriptor")]
    NoneAdded,
    #[error("shape already has a descriptor for the property")]
    DuplicateDescriptor,
    #[error("transition key at index {index} breaks the key order")]
    Unsorted { index: usize },
    #[error("transition at index {index} was never written")]
    IncompleteEntry { index: usize },
    #[error("whiteness witness belongs to a different transition array")]
    ForeignWitness,
    #[error("transition array is already reachable from the heap roots")]
    AlreadyReachable,
}

pub type TransitionResult<T> = core::result::Result<T, ContractViolation>;
