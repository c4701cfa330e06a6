use std::fmt;
use std::rc::Rc;

use crate::handle::RoutineHandle;
use crate::scheduler::Scheduler;
use crate::value::Value;

/// Failure raised by a routine callback
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of one invocation: an optional yielded value, or a failure
pub type InvokeResult = Result<Option<Value>, CallbackError>;

/// Everything a callback receives when the scheduler fires it
pub struct Invocation<'a> {
    /// The scheduler that fired the routine. Callbacks may create, terminate
    /// or restart routines through it, including the one being invoked.
    pub scheduler: &'a Scheduler,
    /// The routine being invoked
    pub routine: RoutineHandle,
    /// The environment, or the routine itself when none was set
    pub this: &'a Value,
    /// Forwarded arguments, in order
    pub args: &'a [Value],
    /// Whether a returned value will be captured as the routine's result
    pub yields: bool,
}

impl Invocation<'_> {
    /// Argument at `index`, or null when fewer were forwarded
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }
}

/// Something the scheduler can call
pub trait Invocable {
    fn invoke(&self, call: &Invocation<'_>) -> InvokeResult;
}

impl<F> Invocable for F
where
    F: Fn(&Invocation<'_>) -> InvokeResult,
{
    fn invoke(&self, call: &Invocation<'_>) -> InvokeResult {
        self(call)
    }
}

/// Shared reference to an [`Invocable`]
#[derive(Clone)]
pub struct Callback(Rc<dyn Invocable>);

impl Callback {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> InvokeResult + 'static,
    {
        Self(Rc::new(f))
    }

    /// Wrap any other invocable type
    pub fn from_invocable(invocable: impl Invocable + 'static) -> Self {
        Self(Rc::new(invocable))
    }

    pub fn invoke(&self, call: &Invocation<'_>) -> InvokeResult {
        self.0.invoke(call)
    }

    /// Whether both callbacks share the same target
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
