//! Bounded session id allocation.
//!
//! Each pool of sessions (receiving, requested) owns one allocator. Ids are
//! handed out by scanning a presence table forward from a rotating cursor, so
//! a freshly released id is not reused until the cursor wraps around to it.

use std::sync::{Mutex, MutexGuard};

use crate::error::{CoreError, Result};
use crate::types::SessionId;

/// Allocator for one pool of [`SessionId`]s.
///
/// Thread-safe via a single mutex: allocate and free are mutually exclusive.
pub struct SessionIdAllocator {
    inner: Mutex<AllocatorState>,
}

struct AllocatorState {
    /// `slots[i]` is true while id `i` is held.
    slots: Box<[bool]>,

    /// Next slot to inspect.
    cursor: usize,

    /// Number of held ids.
    in_use: usize,
}

impl SessionIdAllocator {
    /// Create an allocator with every id free.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AllocatorState {
                slots: vec![false; SessionId::SPACE].into_boxed_slice(),
                cursor: 0,
                in_use: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AllocatorState> {
        // The state is a flat table; a panic mid-update cannot leave it torn.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the next free id at or after the cursor.
    ///
    /// Fails with [`CoreError::SessionIdsExhausted`] after one full scan
    /// finds nothing free.
    pub fn allocate(&self) -> Result<SessionId> {
        let mut state = self.state();

        for step in 0..SessionId::SPACE {
            let slot = (state.cursor + step) % SessionId::SPACE;
            if !state.slots[slot] {
                state.slots[slot] = true;
                state.cursor = (slot + 1) % SessionId::SPACE;
                state.in_use += 1;
                return Ok(SessionId::new(slot as u16));
            }
        }

        Err(CoreError::SessionIdsExhausted(SessionId::SPACE))
    }

    /// Release an id.
    ///
    /// There is no ownership check: freeing an id that is not held is a no-op.
    pub fn free(&self, id: SessionId) {
        let mut state = self.state();
        if state.slots[id.index()] {
            state.slots[id.index()] = false;
            state.in_use -= 1;
        }
    }

    /// Mark a specific id as held, e.g. for a session recovered from disk.
    ///
    /// Returns false if the id was already held.
    pub fn reserve(&self, id: SessionId) -> bool {
        let mut state = self.state();
        if state.slots[id.index()] {
            return false;
        }
        state.slots[id.index()] = true;
        state.in_use += 1;
        true
    }

    /// Check whether an id is currently held.
    pub fn is_allocated(&self, id: SessionId) -> bool {
        self.state().slots[id.index()]
    }

    /// Number of ids currently held.
    pub fn in_use(&self) -> usize {
        self.state().in_use
    }
}

impl Default for SessionIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionIdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("SessionIdAllocator")
            .field("cursor", &state.cursor)
            .field("in_use", &state.in_use)
            .finish()
    }
}
