// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::{
    cmp::Ordering,
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::size_of,
    num::NonZeroU32,
};

use crate::{
    fixed_array::FixedArrayRecord, object::ObjectRecord, property_name::PropertyNameRecord,
    shape::ShapeRecord, transitions::TransitionArrayRecord,
};

/// A struct containing a non-zero index into a heap vector of `T`s. Due to
/// the non-zero value, the offset in the vector is offset by one.
///
/// Ordering of indexes is allocation order.
pub struct BaseIndex<T: ?Sized>(NonZeroU32, PhantomData<T>);

const _INDEX_SIZE_IS_U32: () = assert!(size_of::<BaseIndex<()>>() == size_of::<u32>());
const _OPTION_INDEX_SIZE_IS_U32: () =
    assert!(size_of::<Option<BaseIndex<()>>>() == size_of::<u32>());

impl<T: ?Sized> Debug for BaseIndex<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.into_u32_index().fmt(f)
    }
}

impl<T: ?Sized> Clone for BaseIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for BaseIndex<T> {}

impl<T: ?Sized> PartialEq for BaseIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: ?Sized> Eq for BaseIndex<T> {}

impl<T: ?Sized> PartialOrd for BaseIndex<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for BaseIndex<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: ?Sized> Hash for BaseIndex<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized> BaseIndex<T> {
    pub const fn into_index(self) -> usize {
        self.0.get() as usize - 1
    }

    pub const fn into_u32_index(self) -> u32 {
        self.0.get() - 1
    }

    pub const fn from_index(value: usize) -> Self {
        let value = value as u32;
        assert!(value != u32::MAX);
        // SAFETY: Number is not max value and will not overflow to zero.
        // This check is done manually to allow const context.
        Self(unsafe { NonZeroU32::new_unchecked(value + 1) }, PhantomData)
    }

    /// Index of the last item in the given heap vector.
    pub fn last(vec: &[T]) -> Self
    where
        T: Sized,
    {
        assert!(!vec.is_empty());
        Self::from_index(vec.len() - 1)
    }
}

pub type FixedArrayIndex = BaseIndex<FixedArrayRecord>;
pub type ObjectIndex = BaseIndex<ObjectRecord>;
pub type PropertyNameIndex = BaseIndex<PropertyNameRecord>;
pub type ShapeIndex = BaseIndex<ShapeRecord>;
pub type TransitionArrayIndex = BaseIndex<TransitionArrayRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_offset() {
        let index = ShapeIndex::from_index(0);
        assert_eq!(index.into_index(), 0);
        assert_eq!(index.into_u32_index(), 0);
        assert_eq!(ShapeIndex::from_index(41).into_index(), 41);
    }

    #[test]
    fn index_order_is_allocation_order() {
        assert!(PropertyNameIndex::from_index(3) < PropertyNameIndex::from_index(4));
        assert_eq!(
            PropertyNameIndex::from_index(7),
            PropertyNameIndex::from_index(7)
        );
    }
}
