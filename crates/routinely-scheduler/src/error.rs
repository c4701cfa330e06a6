use crate::instance::MAX_ARGUMENTS;

/// Errors raised synchronously by pool and routine operations
///
/// Callback failures are not part of this type: they never leave
/// [`Scheduler::process`](crate::Scheduler::process) and are handled by the
/// routine's `quiet` and `endure` flags instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutineError {
    #[error("not a valid routine instance")]
    InvalidHandle,

    #[error("invalid callback type: expected a function, found {found}")]
    InvalidCallback { found: &'static str },

    #[error("argument index {index} out of range (capacity {max})", max = MAX_ARGUMENTS)]
    ArgumentOutOfRange { index: usize },

    #[error("too many arguments: {count} (capacity {max})", max = MAX_ARGUMENTS)]
    TooManyArguments { count: usize },

    #[error("routine pool exhausted: all {capacity} slots are in use")]
    PoolExhausted { capacity: usize },

    #[error("a non-empty routine tag is required")]
    TagRequired,

    #[error("no routine tagged '{tag}'")]
    TagNotFound { tag: String },
}

pub type Result<T, E = RoutineError> = std::result::Result<T, E>;
