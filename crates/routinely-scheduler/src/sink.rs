use tracing::error;

use crate::callback::CallbackError;
use crate::handle::RoutineHandle;

/// Receives callback failures of routines that are not `quiet`
pub trait ErrorSink {
    fn report(&self, routine: RoutineHandle, tag: &str, error: &CallbackError);
}

/// Reports failures through `tracing` on the `routine` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, routine: RoutineHandle, tag: &str, error: &CallbackError) {
        error!(target: "routine", "Routine {} ({:?}) failed: {}", routine, tag, error);
    }
}
