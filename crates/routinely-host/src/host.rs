use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use routinely_scheduler::{
    Callback, Invocable, Invocation, InvokeResult, RoutineBuilder, RoutineHandle, Scheduler, Value,
};

use crate::config::{RoutineConfig, RoutinelyConfig};
use crate::error::HostError;

/// Logs a configured message, with the routine's arguments, every time it fires
struct Announcement {
    tag: String,
    message: String,
}

impl Announcement {
    fn render(&self, args: &[Value]) -> String {
        let mut line = self.message.clone();
        for arg in args {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&arg.to_string());
        }
        line
    }
}

impl Invocable for Announcement {
    fn invoke(&self, call: &Invocation<'_>) -> InvokeResult {
        let line = self.render(call.args);
        info!(target: "host", tag = %self.tag, "{}", line);
        Ok(call.yields.then(|| Value::from(line)))
    }
}

/// Drives a [`Scheduler`] at a fixed tick rate and seeds it from config
pub struct RoutineHost {
    scheduler: Scheduler,
    tick_interval: Duration,
    routines: Vec<RoutineConfig>,
    initialized: bool,
}

impl RoutineHost {
    pub fn new(config: &RoutinelyConfig) -> Self {
        Self::with_scheduler(Scheduler::with_capacity(config.scheduler.capacity), config)
    }

    /// Use a prepared scheduler, e.g. one with a manual clock
    pub fn with_scheduler(scheduler: Scheduler, config: &RoutinelyConfig) -> Self {
        scheduler.set_silenced(config.scheduler.silenced);
        scheduler.set_persistency(config.scheduler.persistent);
        Self {
            scheduler,
            tick_interval: config.scheduler.tick_interval(),
            routines: config.routines.clone(),
            initialized: false,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reset the scheduler and create every configured routine
    ///
    /// Returns how many routines were created. Calling it again starts over.
    /// On failure every routine created so far is terminated again.
    pub fn initialize(&mut self) -> Result<usize, HostError> {
        if self.initialized {
            self.deinitialize();
        }
        self.scheduler.initialize();
        self.initialized = true;

        let created = self.routines.iter().try_for_each(|routine| -> Result<(), HostError> {
            let handle = create_routine(&self.scheduler, routine)?;
            debug!(target: "host", "Created routine '{}' as {}", routine.tag, handle);
            Ok(())
        });
        if let Err(e) = created {
            self.deinitialize();
            return Err(e);
        }

        info!(
            target: "host",
            "Initialized {} routine(s), ticking every {:?}",
            self.routines.len(),
            self.tick_interval
        );
        Ok(self.routines.len())
    }

    /// Terminate every routine
    pub fn deinitialize(&mut self) {
        if !self.initialized {
            return;
        }
        self.scheduler.deinitialize();
        self.initialized = false;
        info!(target: "host", "Deinitialized");
    }

    /// Run one scheduler pass
    pub fn tick(&self) {
        self.scheduler.process();
    }

    /// Tick until `max_ticks` passes have run or `shutdown` turns true
    ///
    /// A dropped shutdown sender also stops the loop. Late ticks are skipped
    /// rather than replayed in a burst. Returns the number of passes run.
    pub async fn run(&self, max_ticks: Option<u64>, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if !self.initialized {
            warn!(target: "host", "Running a host that was never initialized");
        }

        let mut ticks = 0;
        loop {
            if max_ticks.is_some_and(|max| ticks >= max) {
                debug!(target: "host", "Tick budget of {} reached", ticks);
                break;
            }
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                    ticks += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(target: "host", "Stopped after {} tick(s)", ticks);
        ticks
    }
}

impl Drop for RoutineHost {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

fn create_routine(scheduler: &Scheduler, config: &RoutineConfig) -> Result<RoutineHandle, HostError> {
    let args = config
        .arguments()
        .map_err(|kind| HostError::UnsupportedArgument {
            tag: config.tag.clone(),
            kind,
        })?;

    let callback = Callback::from_invocable(Announcement {
        tag: config.tag.clone(),
        message: config.message.clone(),
    });

    let mut builder = RoutineBuilder::new()
        .func(callback)
        .tag(config.tag.clone())
        .interval(config.interval_ms)
        .iterations(config.iterations)
        .args(args)
        .endure(config.endure)
        .suspended(config.suspended)
        .yields(true);
    if let Some(quiet) = config.quiet {
        builder = builder.quiet(quiet);
    }
    if let Some(persistent) = config.persistent {
        builder = builder.persistent(persistent);
    }

    builder.build(scheduler).map_err(|source| HostError::Routine {
        tag: config.tag.clone(),
        source,
    })
}
