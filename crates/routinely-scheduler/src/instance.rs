use crate::handle::RoutineHandle;
use crate::value::Value;

/// Number of arguments a routine can forward to its callback
pub const MAX_ARGUMENTS: usize = 14;

/// State of one pool slot
///
/// Every field is empty by default. A slot is claimed while `handle` is set.
#[derive(Debug, Default)]
pub(crate) struct RoutineInstance {
    /// "self" for the callback; the routine itself when null
    pub env: Value,
    /// Always null or [`Value::Function`]
    pub func: Value,
    pub handle: Option<RoutineHandle>,
    /// Bumped on every claim, survives release
    pub generation: u32,
    pub data: Value,
    pub result: Value,
    pub tag: String,
    /// Zero runs forever
    pub iterations: u32,
    pub interval: u64,
    pub suspended: bool,
    /// Set only while the callback is on the call stack, survives release
    pub executing: bool,
    pub quiet: bool,
    pub endure: bool,
    pub inactive: bool,
    pub persistent: bool,
    pub yields: bool,
    pub argv: [Value; MAX_ARGUMENTS],
    pub argc: usize,
}

impl RoutineInstance {
    /// A slot mid-callback is never free, even if it was released from
    /// inside that callback.
    pub fn is_free(&self) -> bool {
        self.handle.is_none() && !self.executing
    }

    pub fn is_claimed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn holds(&self, handle: RoutineHandle) -> bool {
        self.handle == Some(handle)
    }

    /// Take ownership of the slot under a fresh generation
    pub fn claim(&mut self, slot: usize) -> RoutineHandle {
        self.generation = self.generation.wrapping_add(1);
        let handle = RoutineHandle::new(slot, self.generation);
        self.handle = Some(handle);
        handle
    }

    /// Reset the slot to its empty state and hand back what it held
    ///
    /// The returned instance is meant to be dropped by the caller once no
    /// slot borrow is active, since dropping a native value runs host code.
    pub fn release(&mut self) -> RoutineInstance {
        let reset = RoutineInstance {
            generation: self.generation,
            executing: self.executing,
            ..Default::default()
        };
        std::mem::replace(self, reset)
    }

    /// The value passed to the callback as "self"
    pub fn this(&self) -> Value {
        match (&self.env, self.handle) {
            (Value::Null, Some(handle)) => Value::Routine(handle),
            (env, _) => env.clone(),
        }
    }

    pub fn arguments(&self) -> &[Value] {
        &self.argv[..self.argc]
    }

    /// Replace the forwarded arguments, returning the previous ones
    pub fn replace_arguments(&mut self, args: Vec<Value>) -> Vec<Value> {
        debug_assert!(args.len() <= MAX_ARGUMENTS);
        let previous: Vec<Value> = self.argv[..self.argc]
            .iter_mut()
            .map(std::mem::take)
            .collect();
        self.argc = args.len();
        for (slot, arg) in self.argv.iter_mut().zip(args) {
            *slot = arg;
        }
        previous
    }
}
