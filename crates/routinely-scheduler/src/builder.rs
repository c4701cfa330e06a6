use crate::callback::{Callback, Invocation, InvokeResult};
use crate::error::Result;
use crate::handle::RoutineHandle;
use crate::scheduler::Scheduler;
use crate::value::Value;

/// Configuration for a new routine
///
/// Everything is optional. `quiet` and `persistent` fall back to the
/// scheduler's global defaults when left unset.
///
/// ```
/// use routinely_scheduler::{RoutineBuilder, Scheduler};
///
/// let scheduler = Scheduler::with_capacity(8);
/// let handle = RoutineBuilder::new()
///     .callback(|_| Ok(None))
///     .interval(250)
///     .iterations(3)
///     .tag("heartbeat")
///     .arg("ping")
///     .build(&scheduler)
///     .unwrap();
/// assert_eq!(scheduler.find_by_tag("heartbeat"), Some(handle));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutineBuilder {
    pub(crate) env: Value,
    pub(crate) func: Value,
    pub(crate) interval: i64,
    pub(crate) iterations: u32,
    pub(crate) args: Vec<Value>,
    pub(crate) tag: String,
    pub(crate) data: Value,
    pub(crate) suspended: bool,
    pub(crate) quiet: Option<bool>,
    pub(crate) endure: bool,
    pub(crate) persistent: Option<bool>,
    pub(crate) yields: bool,
}

impl RoutineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value passed to the callback as "self"
    pub fn env(mut self, env: impl Into<Value>) -> Self {
        self.env = env.into();
        self
    }

    /// Callback as a value; validated when the routine is built
    pub fn func(mut self, func: impl Into<Value>) -> Self {
        self.func = func.into();
        self
    }

    /// Callback from a closure
    pub fn callback<F>(self, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> InvokeResult + 'static,
    {
        self.func(Callback::new(f))
    }

    /// Milliseconds between invocations; negative values are clamped to zero
    pub fn interval(mut self, interval_ms: i64) -> Self {
        self.interval = interval_ms;
        self
    }

    /// Number of invocations before the routine finishes; zero runs forever
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Append one forwarded argument
    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several forwarded arguments
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Arbitrary value kept alongside the routine
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    pub fn suspended(mut self, suspended: bool) -> Self {
        self.suspended = suspended;
        self
    }

    /// Do not report callback failures
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }

    /// Keep running after callback failures
    pub fn endure(mut self, endure: bool) -> Self {
        self.endure = endure;
        self
    }

    /// Stay claimed but inactive once the iterations run out
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = Some(persistent);
        self
    }

    /// Capture the callback's returned value as the routine's result
    pub fn yields(mut self, yields: bool) -> Self {
        self.yields = yields;
        self
    }

    /// Claim a slot in `scheduler`
    pub fn build(self, scheduler: &Scheduler) -> Result<RoutineHandle> {
        scheduler.insert(self)
    }
}
