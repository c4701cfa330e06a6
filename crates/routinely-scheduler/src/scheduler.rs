use std::cell::{Cell, Ref, RefMut};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use crate::builder::RoutineBuilder;
use crate::callback::{Callback, CallbackError, InvokeResult, Invocation};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{Result, RoutineError};
use crate::handle::RoutineHandle;
use crate::instance::{RoutineInstance, MAX_ARGUMENTS};
use crate::pool::SlotPool;
use crate::routine::Routine;
use crate::sink::{ErrorSink, TracingErrorSink};
use crate::value::Value;

/// Default number of routine slots
pub const MAX_ROUTINES: usize = 1024;

/// A callback ready to be invoked, copied out of its slot so no borrow is
/// held while host code runs
struct PendingCall {
    callback: Callback,
    this: Value,
    args: Vec<Value>,
    yields: bool,
}

/// Owns the routine pool, its per-slot interval accumulators and the clock
///
/// Single-threaded by construction: every entry point takes `&self` so that
/// callbacks fired from [`process`](Scheduler::process) can create, terminate
/// or restart routines through the same scheduler.
pub struct Scheduler {
    pool: SlotPool,
    /// Elapsed milliseconds since each slot last fired, indexed like `pool`
    accumulators: Box<[Cell<u64>]>,
    clock: Box<dyn Clock>,
    sink: Box<dyn ErrorSink>,
    last_tick: Cell<Option<u64>>,
    previous_tick: Cell<Option<u64>>,
    current: Cell<Option<usize>>,
    processing: Cell<bool>,
    default_silenced: Cell<bool>,
    default_persistent: Cell<bool>,
}

impl Scheduler {
    /// Create a scheduler with [`MAX_ROUTINES`] slots and a monotonic clock
    pub fn new() -> Self {
        Self::with_capacity(MAX_ROUTINES)
    }

    /// Create a scheduler with a fixed number of slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: SlotPool::new(capacity),
            accumulators: (0..capacity).map(|_| Cell::new(0)).collect(),
            clock: Box::new(MonotonicClock::new()),
            sink: Box::new(TracingErrorSink),
            last_tick: Cell::new(None),
            previous_tick: Cell::new(None),
            current: Cell::new(None),
            processing: Cell::new(false),
            default_silenced: Cell::new(false),
            default_persistent: Cell::new(false),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the destination of callback failure reports
    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    // ===== Lifecycle =====

    /// Prepare the pool for a new run: sample the clock and zero every
    /// accumulator so the first tick measures from now.
    pub fn initialize(&self) {
        let now = self.clock.now_ms();
        self.last_tick.set(Some(now));
        self.previous_tick.set(Some(now));
        for accumulator in self.accumulators.iter() {
            accumulator.set(0);
        }
        debug!(target: "routine", "Scheduler initialized with {} slots", self.capacity());
    }

    /// Terminate every routine and forget the clock samples
    pub fn deinitialize(&self) {
        let claimed = self.pool.claimed();
        let count = claimed.len();
        for handle in claimed {
            self.release(handle);
        }
        self.last_tick.set(None);
        self.previous_tick.set(None);
        self.current.set(None);
        debug!(target: "routine", "Scheduler deinitialized, released {} routine(s)", count);
    }

    // ===== Creation =====

    /// Create a routine from the bare essentials
    ///
    /// `func` must be null (the routine starts inactive) or a function.
    pub fn create(
        &self,
        env: impl Into<Value>,
        func: impl Into<Value>,
        interval_ms: i64,
        iterations: u32,
    ) -> Result<RoutineHandle> {
        RoutineBuilder::new()
            .env(env)
            .func(func)
            .interval(interval_ms)
            .iterations(iterations)
            .build(self)
    }

    /// Claim a slot and populate it from a builder
    pub(crate) fn insert(&self, builder: RoutineBuilder) -> Result<RoutineHandle> {
        if !matches!(builder.func, Value::Null | Value::Function(_)) {
            return Err(RoutineError::InvalidCallback {
                found: builder.func.type_name(),
            });
        }
        if builder.args.len() > MAX_ARGUMENTS {
            return Err(RoutineError::TooManyArguments {
                count: builder.args.len(),
            });
        }

        let Some(index) = self.pool.find_unused() else {
            warn!(target: "routine", "Routine pool exhausted ({} slots)", self.capacity());
            return Err(RoutineError::PoolExhausted {
                capacity: self.capacity(),
            });
        };

        let handle = {
            let mut slot = self.slot_mut(index);
            let handle = slot.claim(index);
            slot.inactive = builder.func.is_null();
            slot.env = builder.env;
            slot.func = builder.func;
            slot.data = builder.data;
            slot.tag = builder.tag;
            slot.interval = clamp_interval(builder.interval);
            slot.iterations = builder.iterations;
            slot.suspended = builder.suspended;
            slot.quiet = builder.quiet.unwrap_or_else(|| self.default_silenced.get());
            slot.endure = builder.endure;
            slot.persistent = builder
                .persistent
                .unwrap_or_else(|| self.default_persistent.get());
            slot.yields = builder.yields;
            slot.replace_arguments(builder.args);
            handle
        };
        self.accumulators[index].set(0);

        debug!(target: "routine", "Created {} ({:?})", handle, self.slot(index).tag);
        Ok(handle)
    }

    // ===== Queries =====

    /// View of a routine; validity is checked on every access
    pub fn routine(&self, handle: RoutineHandle) -> Routine<'_> {
        Routine::new(self, handle)
    }

    /// Number of claimed slots, inactive ones included
    pub fn count_used(&self) -> usize {
        self.pool.count_used()
    }

    /// First routine tagged `tag`, if any
    pub fn find_by_tag(&self, tag: &str) -> Option<RoutineHandle> {
        self.pool.find_by_tag(tag)
    }

    /// Like [`find_by_tag`](Self::find_by_tag), but a missing routine or an
    /// empty tag is an error
    pub fn fetch_by_tag(&self, tag: &str) -> Result<RoutineHandle> {
        if tag.is_empty() {
            return Err(RoutineError::TagRequired);
        }
        self.pool
            .find_by_tag(tag)
            .ok_or_else(|| RoutineError::TagNotFound {
                tag: tag.to_string(),
            })
    }

    /// Terminate the first routine tagged `tag`, reporting whether one existed
    pub fn terminate_by_tag(&self, tag: &str) -> Result<bool> {
        if tag.is_empty() {
            return Err(RoutineError::TagRequired);
        }
        Ok(match self.pool.find_by_tag(tag) {
            Some(handle) => self.release(handle),
            None => false,
        })
    }

    /// Routine whose callback is currently on the call stack
    pub fn current(&self) -> Option<RoutineHandle> {
        let index = self.current.get()?;
        self.slot(index).handle
    }

    // ===== Global defaults =====

    /// Whether new routines are created `quiet`
    pub fn silenced(&self) -> bool {
        self.default_silenced.get()
    }

    /// Applies only to routines created afterwards
    pub fn set_silenced(&self, silenced: bool) {
        self.default_silenced.set(silenced);
    }

    /// Whether new routines are created `persistent`
    pub fn persistency(&self) -> bool {
        self.default_persistent.get()
    }

    /// Applies only to routines created afterwards
    pub fn set_persistency(&self, persistent: bool) {
        self.default_persistent.set(persistent);
    }

    /// Clock samples taken by the two most recent ticks
    pub fn tick_samples(&self) -> (Option<u64>, Option<u64>) {
        (self.last_tick.get(), self.previous_tick.get())
    }

    // ===== Dispatch =====

    /// Advance every routine by the time elapsed since the previous call and
    /// fire the ones that are due
    ///
    /// Callback failures never escape; each routine's `quiet` and `endure`
    /// flags decide what happens to it.
    pub fn process(&self) {
        if self.processing.replace(true) {
            warn!(target: "routine", "Ignoring re-entrant call to process()");
            return;
        }

        let now = self.clock.now_ms();
        let delta = self
            .last_tick
            .get()
            .map_or(0, |last| now.saturating_sub(last));
        self.previous_tick.set(self.last_tick.get());
        self.last_tick.set(Some(now));

        // Resets the dispatch state even if host code unwinds through here
        let _guard = DispatchGuard { scheduler: self };

        // Slots are re-read on every iteration; callbacks may have changed
        // any of them since the previous one.
        for index in 0..self.capacity() {
            if self.advance(index, delta) {
                self.accumulators[index].set(0);
                self.current.set(Some(index));
                self.execute(index);
                self.current.set(None);
            }
        }
    }

    /// Add `delta` to a claimed slot's accumulator and report whether it is
    /// due. Inactive slots keep counting but are never due.
    fn advance(&self, index: usize, delta: u64) -> bool {
        let slot = self.slot(index);
        if !slot.is_claimed() {
            return false;
        }
        let accumulator = &self.accumulators[index];
        accumulator.set(accumulator.get().saturating_add(delta));
        !slot.inactive && accumulator.get() >= slot.interval
    }

    fn execute(&self, index: usize) {
        let (handle, pending) = {
            let mut slot = self.slot_mut(index);
            let Some(handle) = slot.handle else {
                return;
            };
            if slot.suspended {
                (handle, None)
            } else {
                let Some(callback) = slot.func.as_callback().cloned() else {
                    return;
                };
                slot.executing = true;
                let pending = PendingCall {
                    callback,
                    this: slot.this(),
                    args: slot.arguments().to_vec(),
                    yields: slot.yields,
                };
                (handle, Some(pending))
            }
        };

        if let Some(pending) = pending {
            trace!(target: "routine", "Invoking {}", handle);
            let outcome = self.invoke(handle, &pending);
            drop(pending);
            if !self.complete(index, handle, outcome) {
                return;
            }
        } else {
            trace!(target: "routine", "Skipping suspended {}", handle);
        }

        self.count_down(index, handle);
    }

    fn invoke(&self, handle: RoutineHandle, pending: &PendingCall) -> InvokeResult {
        let call = Invocation {
            scheduler: self,
            routine: handle,
            this: &pending.this,
            args: &pending.args,
            yields: pending.yields,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| pending.callback.invoke(&call))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(CallbackError::new(format!(
                "callback panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Apply the outcome of an invocation. Returns `false` when the routine
    /// is gone and no further bookkeeping applies.
    fn complete(&self, index: usize, handle: RoutineHandle, outcome: InvokeResult) -> bool {
        let mut slot = self.slot_mut(index);
        slot.executing = false;
        if !slot.holds(handle) {
            trace!(target: "routine", "{} terminated during its own invocation", handle);
            return false;
        }

        match outcome {
            Ok(yielded) => {
                let stale = if slot.yields {
                    std::mem::replace(&mut slot.result, yielded.unwrap_or_default())
                } else {
                    Value::Null
                };
                drop(slot);
                drop(stale);
                true
            }
            Err(error) => {
                let stale = if slot.yields {
                    std::mem::take(&mut slot.result)
                } else {
                    Value::Null
                };
                let quiet = slot.quiet;
                let endure = slot.endure;
                let tag = slot.tag.clone();
                drop(slot);
                drop(stale);

                if !quiet {
                    self.report(handle, &tag, &error);
                }
                if endure {
                    return self.slot(index).holds(handle);
                }
                debug!(target: "routine", "Terminating {} after callback failure", handle);
                self.release(handle);
                false
            }
        }
    }

    /// Hand a failure to the sink. A panicking sink is logged and otherwise
    /// ignored so the remaining slots still run.
    fn report(&self, handle: RoutineHandle, tag: &str, error: &CallbackError) {
        let reported =
            panic::catch_unwind(AssertUnwindSafe(|| self.sink.report(handle, tag, error)));
        if let Err(payload) = reported {
            warn!(
                target: "routine",
                "Error sink panicked while reporting {}: {}",
                handle,
                panic_message(payload.as_ref())
            );
        }
    }

    /// Spend one iteration and finalize the routine once the budget is gone
    fn count_down(&self, index: usize, handle: RoutineHandle) {
        let finalize = {
            let mut slot = self.slot_mut(index);
            if !slot.holds(handle) || slot.iterations == 0 {
                return;
            }
            slot.iterations -= 1;
            if slot.iterations != 0 {
                return;
            }
            if slot.persistent {
                slot.inactive = true;
                debug!(target: "routine", "{} exhausted its iterations, keeping it inactive", handle);
                false
            } else {
                true
            }
        };

        if finalize {
            debug!(target: "routine", "{} exhausted its iterations", handle);
            self.release(handle);
        }
    }

    // ===== Slot access for routine views =====

    /// Release a slot if `handle` still owns it
    pub(crate) fn release(&self, handle: RoutineHandle) -> bool {
        let released = {
            let Some(cell) = self.pool.slot(handle.slot()) else {
                return false;
            };
            let mut slot = cell.borrow_mut();
            if !slot.holds(handle) {
                return false;
            }
            slot.release()
        };
        self.accumulators[handle.slot()].set(0);
        debug!(target: "routine", "Released {} ({:?})", handle, released.tag);
        drop(released);
        true
    }

    pub(crate) fn reset_accumulator(&self, handle: RoutineHandle) {
        if let Some(accumulator) = self.accumulators.get(handle.slot()) {
            accumulator.set(0);
        }
    }

    /// Elapsed time counted towards a routine's next firing
    pub(crate) fn accumulated(&self, handle: RoutineHandle) -> u64 {
        self.accumulators
            .get(handle.slot())
            .map_or(0, |accumulator| accumulator.get())
    }

    /// Run `f` against a slot if `handle` still owns it
    pub(crate) fn read<R>(
        &self,
        handle: RoutineHandle,
        f: impl FnOnce(&RoutineInstance) -> R,
    ) -> Result<R> {
        let cell = self
            .pool
            .slot(handle.slot())
            .ok_or(RoutineError::InvalidHandle)?;
        let slot = cell.borrow();
        if !slot.holds(handle) {
            return Err(RoutineError::InvalidHandle);
        }
        Ok(f(&slot))
    }

    /// Mutable counterpart of [`read`](Self::read)
    pub(crate) fn write<R>(
        &self,
        handle: RoutineHandle,
        f: impl FnOnce(&mut RoutineInstance) -> R,
    ) -> Result<R> {
        let cell = self
            .pool
            .slot(handle.slot())
            .ok_or(RoutineError::InvalidHandle)?;
        let mut slot = cell.borrow_mut();
        if !slot.holds(handle) {
            return Err(RoutineError::InvalidHandle);
        }
        Ok(f(&mut slot))
    }

    fn slot(&self, index: usize) -> Ref<'_, RoutineInstance> {
        self.pool.at(index).borrow()
    }

    fn slot_mut(&self, index: usize) -> RefMut<'_, RoutineInstance> {
        self.pool.at(index).borrow_mut()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

struct DispatchGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.current.set(None);
        self.scheduler.processing.set(false);
    }
}

/// Negative intervals run as fast as the driver ticks
pub(crate) fn clamp_interval(interval_ms: i64) -> u64 {
    u64::try_from(interval_ms).unwrap_or(0)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
