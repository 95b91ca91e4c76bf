//! Purpose-keyed delayed tasks
//!
//! At most one task is pending per [`TimerPurpose`]. Arming a purpose aborts
//! whatever was pending for it. Each arm gets a fresh generation number; a
//! task that wakes up must still hold the current generation for its
//! purpose, otherwise it was replaced or cancelled after its sleep finished
//! and must do nothing.

use std::collections::HashMap;

use sprout_state::TimerPurpose;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Pending timer tasks, one slot per purpose
#[derive(Debug, Default)]
pub(crate) struct TimerTable {
    slots: HashMap<TimerPurpose, Slot>,
    next_generation: u64,
}

impl TimerTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the generation for the next [`arm`](Self::arm)
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Install `handle` for `purpose`, aborting the task it replaces
    pub(crate) fn arm(&mut self, purpose: TimerPurpose, generation: u64, handle: JoinHandle<()>) {
        if let Some(previous) = self.slots.insert(purpose, Slot { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Called by a task that woke up. Releases the slot and returns true
    /// only if the task is still the current one for its purpose.
    pub(crate) fn claim(&mut self, purpose: TimerPurpose, generation: u64) -> bool {
        match self.slots.get(&purpose) {
            Some(slot) if slot.generation == generation => {
                self.slots.remove(&purpose);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn cancel(&mut self, purpose: TimerPurpose) {
        if let Some(slot) = self.slots.remove(&purpose) {
            slot.handle.abort();
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            slot.handle.abort();
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for TimerTable {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
