use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::StopReason;

/// Scheduling anomalies reported while a simulation runs.
///
/// These are observations, not failures: the run goes on unless the driver
/// was asked to stop on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RepeatedStateDetected {
        previous: usize,
        current: usize,
    },
    /// Emitted on every tick a job is still pending at or past its deadline.
    DeadlineMissed {
        task: String,
        job: String,
        deadline: usize,
        time: usize,
    },
    RunStopped {
        reason: StopReason,
    },
}

/// Receives the [`Event`]s of a scheduler.
pub trait Diagnostics: Send {
    fn emit(&mut self, event: Event);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Diagnostics for LogSink {
    fn emit(&mut self, event: Event) {
        match event {
            Event::RepeatedStateDetected { previous, current } => {
                info!("state at time {current} repeats time {previous}");
            }
            Event::DeadlineMissed {
                job,
                deadline,
                time,
                ..
            } => {
                if time == deadline {
                    warn!("job {job} missed its deadline at time {time}");
                } else {
                    debug!("job {job} still pending at time {time} (deadline {deadline})");
                }
            }
            Event::RunStopped { reason } => {
                warn!("stopping: {reason}");
            }
        }
    }
}

/// Keeps every event. Clones share the same buffer, so a test can hand one
/// clone to the scheduler and read the events through another.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Diagnostics for Recorder {
    fn emit(&mut self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
