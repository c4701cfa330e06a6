// Shared helpers for scheduler tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use routinely_scheduler::{
    Callback, CallbackError, ErrorSink, ManualClock, RoutineHandle, Scheduler, Value,
};

/// Error sink that keeps every report for later inspection
#[derive(Clone, Default)]
pub struct RecordingSink {
    reports: Rc<RefCell<Vec<(RoutineHandle, String, String)>>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.reports
            .borrow()
            .iter()
            .map(|(_, _, message)| message.clone())
            .collect()
    }

    pub fn tags(&self) -> Vec<String> {
        self.reports
            .borrow()
            .iter()
            .map(|(_, tag, _)| tag.clone())
            .collect()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, routine: RoutineHandle, tag: &str, error: &CallbackError) {
        self.reports
            .borrow_mut()
            .push((routine, tag.to_string(), error.message().to_string()));
    }
}

/// Scheduler driven by a manual clock, already initialized
pub struct Harness {
    pub clock: ManualClock,
    pub sink: RecordingSink,
    pub scheduler: Scheduler,
}

impl Harness {
    pub fn new(capacity: usize) -> Self {
        let clock = ManualClock::new();
        let sink = RecordingSink::default();
        let scheduler = Scheduler::with_capacity(capacity)
            .with_clock(clock.clone())
            .with_error_sink(sink.clone());
        scheduler.initialize();
        Self {
            clock,
            sink,
            scheduler,
        }
    }

    /// Move time forward by `ms` and run one tick
    pub fn tick(&self, ms: u64) {
        self.clock.advance(ms);
        self.scheduler.process();
    }

    /// Run `count` ticks of `ms` each
    pub fn ticks(&self, count: usize, ms: u64) {
        for _ in 0..count {
            self.tick(ms);
        }
    }
}

/// Callback that counts its invocations
pub fn counter() -> (Rc<Cell<u32>>, Callback) {
    let hits = Rc::new(Cell::new(0));
    let seen = hits.clone();
    let callback = Callback::new(move |_| {
        seen.set(seen.get() + 1);
        Ok(None)
    });
    (hits, callback)
}

/// Callback that counts its invocations and always fails
pub fn failing_counter() -> (Rc<Cell<u32>>, Callback) {
    let hits = Rc::new(Cell::new(0));
    let seen = hits.clone();
    let callback = Callback::new(move |_| {
        seen.set(seen.get() + 1);
        Err(CallbackError::new("boom"))
    });
    (hits, callback)
}

/// Callback that records the arguments of every invocation
pub fn recorder() -> (Rc<RefCell<Vec<Vec<Value>>>>, Callback) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let seen = calls.clone();
    let callback = Callback::new(move |call| {
        seen.borrow_mut().push(call.args.to_vec());
        Ok(None)
    });
    (calls, callback)
}
