use crate::error::{Result, RoutineError};
use crate::handle::RoutineHandle;
use crate::instance::MAX_ARGUMENTS;
use crate::scheduler::{clamp_interval, Scheduler};
use crate::value::Value;

/// Accessors and mutators for one routine
///
/// A `Routine` is only a handle paired with its scheduler. Nothing is checked
/// when it is created; every call validates the handle and fails with
/// [`RoutineError::InvalidHandle`] once the routine has been terminated.
#[derive(Clone, Copy)]
pub struct Routine<'a> {
    scheduler: &'a Scheduler,
    handle: RoutineHandle,
}

impl<'a> Routine<'a> {
    pub(crate) fn new(scheduler: &'a Scheduler, handle: RoutineHandle) -> Self {
        Self { scheduler, handle }
    }

    pub fn handle(&self) -> RoutineHandle {
        self.handle
    }

    /// Whether the handle still refers to a live routine
    pub fn is_valid(&self) -> bool {
        self.scheduler.read(self.handle, |_| ()).is_ok()
    }

    /// Release the slot. The handle is invalid afterwards.
    pub fn terminate(&self) -> Result<()> {
        if self.scheduler.release(self.handle) {
            Ok(())
        } else {
            Err(RoutineError::InvalidHandle)
        }
    }

    /// Re-arm the routine with a fresh iteration budget and a full interval
    /// before its next firing
    ///
    /// Called from the routine's own callback, one extra iteration is granted
    /// to absorb the countdown that follows the invocation.
    pub fn restart(&self, iterations: u32) -> Result<()> {
        self.scheduler.write(self.handle, |slot| {
            slot.iterations = if slot.executing && iterations != 0 {
                iterations.saturating_add(1)
            } else {
                iterations
            };
            if slot.func.as_callback().is_some() {
                slot.inactive = false;
            }
        })?;
        self.scheduler.reset_accumulator(self.handle);
        Ok(())
    }

    // ===== Identity =====

    pub fn tag(&self) -> Result<String> {
        self.scheduler.read(self.handle, |slot| slot.tag.clone())
    }

    pub fn set_tag(&self, tag: impl Into<String>) -> Result<()> {
        let tag = tag.into();
        self.scheduler.write(self.handle, |slot| slot.tag = tag)
    }

    // ===== Opaque values =====

    pub fn env(&self) -> Result<Value> {
        self.scheduler.read(self.handle, |slot| slot.env.clone())
    }

    pub fn set_env(&self, env: impl Into<Value>) -> Result<()> {
        self.replace(env.into(), |slot| &mut slot.env)
    }

    /// Forget the environment; the callback receives the routine itself
    pub fn drop_env(&self) -> Result<()> {
        self.replace(Value::Null, |slot| &mut slot.env)
    }

    pub fn func(&self) -> Result<Value> {
        self.scheduler.read(self.handle, |slot| slot.func.clone())
    }

    /// Replace the callback. Anything but a function is rejected.
    pub fn set_func(&self, func: impl Into<Value>) -> Result<()> {
        let func = func.into();
        if func.as_callback().is_none() {
            return Err(RoutineError::InvalidCallback {
                found: func.type_name(),
            });
        }
        let previous = self.scheduler.write(self.handle, |slot| {
            if slot.func.is_null() {
                slot.inactive = false;
            }
            std::mem::replace(&mut slot.func, func)
        })?;
        drop(previous);
        Ok(())
    }

    pub fn data(&self) -> Result<Value> {
        self.scheduler.read(self.handle, |slot| slot.data.clone())
    }

    pub fn set_data(&self, data: impl Into<Value>) -> Result<()> {
        self.replace(data.into(), |slot| &mut slot.data)
    }

    /// Value captured from the last invocation of a yielding routine
    pub fn result(&self) -> Result<Value> {
        self.scheduler.read(self.handle, |slot| slot.result.clone())
    }

    pub fn set_result(&self, result: impl Into<Value>) -> Result<()> {
        self.replace(result.into(), |slot| &mut slot.result)
    }

    // ===== Timing =====

    pub fn interval(&self) -> Result<u64> {
        self.scheduler.read(self.handle, |slot| slot.interval)
    }

    /// Negative intervals are clamped to zero
    pub fn set_interval(&self, interval_ms: i64) -> Result<()> {
        let interval = clamp_interval(interval_ms);
        self.scheduler
            .write(self.handle, |slot| slot.interval = interval)
    }

    /// Remaining iterations; zero means the routine runs until terminated
    pub fn iterations(&self) -> Result<u32> {
        self.scheduler.read(self.handle, |slot| slot.iterations)
    }

    pub fn set_iterations(&self, iterations: u32) -> Result<()> {
        self.scheduler
            .write(self.handle, |slot| slot.iterations = iterations)
    }

    /// Milliseconds since the routine last fired or was restarted
    ///
    /// Inactive routines keep counting, so attaching a callback to one that
    /// has already waited a full interval fires it on the next tick.
    pub fn elapsed(&self) -> Result<u64> {
        self.scheduler.read(self.handle, |_| ())?;
        Ok(self.scheduler.accumulated(self.handle))
    }

    // ===== Flags =====

    pub fn suspended(&self) -> Result<bool> {
        self.scheduler.read(self.handle, |slot| slot.suspended)
    }

    pub fn set_suspended(&self, suspended: bool) -> Result<()> {
        self.scheduler
            .write(self.handle, |slot| slot.suspended = suspended)
    }

    pub fn quiet(&self) -> Result<bool> {
        self.scheduler.read(self.handle, |slot| slot.quiet)
    }

    pub fn set_quiet(&self, quiet: bool) -> Result<()> {
        self.scheduler.write(self.handle, |slot| slot.quiet = quiet)
    }

    pub fn endure(&self) -> Result<bool> {
        self.scheduler.read(self.handle, |slot| slot.endure)
    }

    pub fn set_endure(&self, endure: bool) -> Result<()> {
        self.scheduler.write(self.handle, |slot| slot.endure = endure)
    }

    pub fn persistent(&self) -> Result<bool> {
        self.scheduler.read(self.handle, |slot| slot.persistent)
    }

    pub fn set_persistent(&self, persistent: bool) -> Result<()> {
        self.scheduler
            .write(self.handle, |slot| slot.persistent = persistent)
    }

    pub fn yields(&self) -> Result<bool> {
        self.scheduler.read(self.handle, |slot| slot.yields)
    }

    pub fn set_yields(&self, yields: bool) -> Result<()> {
        self.scheduler.write(self.handle, |slot| slot.yields = yields)
    }

    /// True once the iterations ran out on a persistent routine, or while no
    /// callback is attached
    pub fn inactive(&self) -> Result<bool> {
        self.scheduler.read(self.handle, |slot| slot.inactive)
    }

    // ===== Arguments =====

    /// Number of forwarded arguments
    pub fn argument_count(&self) -> Result<usize> {
        self.scheduler.read(self.handle, |slot| slot.argc)
    }

    pub fn arguments(&self) -> Result<Vec<Value>> {
        self.scheduler
            .read(self.handle, |slot| slot.arguments().to_vec())
    }

    /// Argument at `index`; unset positions below capacity read as null
    pub fn argument(&self, index: usize) -> Result<Value> {
        check_argument_index(index)?;
        self.scheduler
            .read(self.handle, |slot| slot.argv[index].clone())
    }

    /// Overwrite one argument, extending the forwarded list to cover it
    pub fn set_argument(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        check_argument_index(index)?;
        let value = value.into();
        let previous = self.scheduler.write(self.handle, |slot| {
            slot.argc = slot.argc.max(index + 1);
            std::mem::replace(&mut slot.argv[index], value)
        })?;
        drop(previous);
        Ok(())
    }

    /// Replace the whole argument list
    pub fn set_arguments<I>(&self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        if args.len() > MAX_ARGUMENTS {
            return Err(RoutineError::TooManyArguments { count: args.len() });
        }
        let previous = self
            .scheduler
            .write(self.handle, |slot| slot.replace_arguments(args))?;
        drop(previous);
        Ok(())
    }

    pub fn clear_arguments(&self) -> Result<()> {
        self.set_arguments(Vec::<Value>::new())
    }

    /// Swap one opaque field, dropping the old value outside the slot borrow
    fn replace(
        &self,
        value: Value,
        field: impl FnOnce(&mut crate::instance::RoutineInstance) -> &mut Value,
    ) -> Result<()> {
        let previous = self
            .scheduler
            .write(self.handle, |slot| std::mem::replace(field(slot), value))?;
        drop(previous);
        Ok(())
    }
}

fn check_argument_index(index: usize) -> Result<()> {
    if index < MAX_ARGUMENTS {
        Ok(())
    } else {
        Err(RoutineError::ArgumentOutOfRange { index })
    }
}

impl std::fmt::Debug for Routine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routine")
            .field("handle", &self.handle)
            .field("valid", &self.is_valid())
            .finish()
    }
}
