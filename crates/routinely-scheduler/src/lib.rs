//! Fixed-capacity routine scheduler
//!
//! A [`Scheduler`] owns a pool of routine slots. Each routine pairs a
//! callback with an interval, an iteration budget, forwarded arguments and a
//! handful of policy flags. A host calls [`Scheduler::process`] once per tick;
//! every routine whose accumulated time reached its interval is invoked.
//!
//! Routines are addressed through [`RoutineHandle`]s, which are slot indices
//! tagged with a generation. A handle outliving its routine fails validation
//! rather than reaching whatever routine reuses the slot.
//!
//! Callbacks receive the scheduler itself and may create, terminate or
//! restart any routine while the pool is being dispatched, including the one
//! currently running.

pub mod builder;
pub mod callback;
pub mod clock;
pub mod error;
pub mod handle;
mod instance;
mod pool;
pub mod routine;
pub mod scheduler;
pub mod sink;
pub mod value;

pub use builder::RoutineBuilder;
pub use callback::{Callback, CallbackError, Invocable, Invocation, InvokeResult};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{Result, RoutineError};
pub use handle::RoutineHandle;
pub use instance::MAX_ARGUMENTS;
pub use routine::Routine;
pub use scheduler::{Scheduler, MAX_ROUTINES};
pub use sink::{ErrorSink, TracingErrorSink};
pub use value::Value;
