// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Maximum number of prototype transitions cached per shape.
pub const MAX_CACHED_PROTOTYPE_TRANSITIONS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Check that witness writes only ever touch unreachable transition
    /// arrays. This walks the whole heap on every such write.
    pub verify_heap: bool,
    pub max_cached_prototype_transitions: usize,
    /// Initial capacity of each heap vector.
    pub initial_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verify_heap: false,
            max_cached_prototype_transitions: MAX_CACHED_PROTOTYPE_TRANSITIONS,
            initial_capacity: 64,
        }
    }
}
