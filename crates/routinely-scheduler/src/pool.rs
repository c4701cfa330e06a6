use std::cell::RefCell;

use crate::handle::RoutineHandle;
use crate::instance::RoutineInstance;

/// Fixed-capacity array of routine slots
///
/// The pool never grows. Lookups are linear scans in slot order, which is
/// fine for the small number of timers a host keeps alive.
pub(crate) struct SlotPool {
    slots: Box<[RefCell<RoutineInstance>]>,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| RefCell::new(RoutineInstance::default()))
            .collect();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&RefCell<RoutineInstance>> {
        self.slots.get(index)
    }

    /// Slot at an index known to be within capacity
    pub fn at(&self, index: usize) -> &RefCell<RoutineInstance> {
        &self.slots[index]
    }

    /// First slot that is neither claimed nor executing
    pub fn find_unused(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.borrow().is_free())
    }

    /// Claimed slots, including inactive ones
    pub fn count_used(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.borrow().is_claimed())
            .count()
    }

    /// First claimed slot whose tag matches exactly. Empty tags never match.
    pub fn find_by_tag(&self, tag: &str) -> Option<RoutineHandle> {
        if tag.is_empty() {
            return None;
        }
        self.slots.iter().find_map(|slot| {
            let slot = slot.borrow();
            match slot.handle {
                Some(handle) if slot.tag == tag => Some(handle),
                _ => None,
            }
        })
    }

    /// Handles of every claimed slot, in slot order
    pub fn claimed(&self) -> Vec<RoutineHandle> {
        self.slots
            .iter()
            .filter_map(|slot| slot.borrow().handle)
            .collect()
    }
}
