use std::fmt;

/// Caller-held reference to one slot of the routine pool
///
/// The generation is bumped every time a slot is claimed, so a handle kept
/// past `terminate()` fails validation instead of reaching whichever routine
/// reuses the slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutineHandle {
    slot: u32,
    generation: u32,
}

impl RoutineHandle {
    pub(crate) fn new(slot: usize, generation: u32) -> Self {
        Self {
            slot: slot as u32,
            generation,
        }
    }

    /// Index of the slot in the pool
    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for RoutineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "routine#{}.{}", self.slot, self.generation)
    }
}
