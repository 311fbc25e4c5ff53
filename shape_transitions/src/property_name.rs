// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ahash::AHashMap;

use crate::{
    error::ContractViolation,
    heap::{
        HeapValue,
        heap_bits::{HeapMark, WorkQueues},
        indexes::PropertyNameIndex,
    },
};

/// An interned property name.
///
/// Two property names are equal only if they are the same interned name.
/// They are ordered by interning order, which is the order transition keys
/// are sorted in: comparing keys never needs to look at the name text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PropertyName(PropertyNameIndex);

impl PropertyName {
    pub(crate) const fn new(index: PropertyNameIndex) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }
}

impl From<PropertyName> for HeapValue {
    fn from(value: PropertyName) -> Self {
        HeapValue::PropertyName(value)
    }
}

impl TryFrom<HeapValue> for PropertyName {
    type Error = ContractViolation;

    fn try_from(value: HeapValue) -> Result<Self, Self::Error> {
        match value {
            HeapValue::PropertyName(name) => Ok(name),
            _ => Err(ContractViolation::TypeMismatch {
                expected: "PropertyName",
                found: value.type_name(),
            }),
        }
    }
}

impl HeapMark for PropertyName {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.names.push(*self);
    }
}

#[derive(Debug)]
pub struct PropertyNameRecord {
    text: Box<str>,
}

/// Interning table for property names.
#[derive(Debug, Default)]
pub(crate) struct PropertyNameTable {
    records: Vec<PropertyNameRecord>,
    lookup: AHashMap<Box<str>, PropertyName>,
}

impl PropertyNameTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            lookup: AHashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Intern the text, returning its name and whether it was newly created.
    pub(crate) fn intern(&mut self, text: &str) -> (PropertyName, bool) {
        if let Some(name) = self.lookup.get(text) {
            return (*name, false);
        }
        let text: Box<str> = text.into();
        self.records.push(PropertyNameRecord { text: text.clone() });
        let name = PropertyName::new(PropertyNameIndex::last(&self.records));
        self.lookup.insert(text, name);
        (name, true)
    }

    pub(crate) fn get_text(&self, name: PropertyName) -> &str {
        &self.records[name.get_index()].text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_ordered_by_interning() {
        let mut table = PropertyNameTable::default();
        let (zebra, _) = table.intern("zebra");
        let (apple, is_new) = table.intern("apple");
        assert!(is_new);
        assert!(zebra < apple);
        let (again, is_new) = table.intern("zebra");
        assert!(!is_new);
        assert_eq!(again, zebra);
        assert_eq!(table.get_text(apple), "apple");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn only_names_convert_from_heap_values() {
        let mut table = PropertyNameTable::default();
        let (name, _) = table.intern("x");
        assert_eq!(PropertyName::try_from(HeapValue::from(name)), Ok(name));
        assert_eq!(
            PropertyName::try_from(HeapValue::ZERO),
            Err(ContractViolation::TypeMismatch {
                expected: "PropertyName",
                found: "Smi"
            })
        );
    }
}
