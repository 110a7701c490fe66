//! A real-time scheduling simulator.
//!
//! This library simulates preemptive scheduling of periodic tasks whose
//! jobs go through ordered phases, each phase needing a processor or the
//! memory unit. Time advances in unit ticks; every tick the [`Scheduler`]
//! releases new jobs, matches ready jobs to free resources in priority order
//! and records what ran where in its schedule log, together with missed
//! deadlines. Snapshots of the system are compared across ticks so that a run
//! can stop once the schedule starts repeating.
//!

mod config;
mod diagnostics;
mod error;
mod job;
mod resource;
mod scheduler;
mod state;
mod task;

pub use crate::config::{Configuration, Descriptor, Processors, Switch, Switches};
pub use crate::diagnostics::{Diagnostics, Event, LogSink, Recorder};
pub use crate::error::{ConfigError, SchedError};
pub use crate::job::{Job, JobKey, JobTable};
pub use crate::resource::{Resource, ResourceDescriptor, ResourceId, ResourceSet, ResourceType};
pub use crate::scheduler::{RunSummary, ScheduleEntry, Scheduler, Step, StopOn, StopReason};
pub use crate::state::{ProcessorState, RepeatedState, SystemState, TaskState};
pub use crate::task::{PhaseDescriptor, Task, TaskDescriptor, TaskId, TaskPhase, TaskRow, TaskSet};

mod schedulers;

pub use schedulers::{DeadlineMonotonic, EarliestDeadlineFirst, Policy, Priority};

/// Returns a scheduler ranking jobs by their task's relative deadline.
///
/// * `tasks` - the periodic tasks to simulate.
/// * `resources` - the processors and memory unit they share.
/// * `switches` - global preemption switches, and whether memory phases also
///                occupy a processor.
pub fn deadline_monotonic(
    tasks: TaskSet,
    resources: ResourceSet,
    switches: Switches,
) -> Scheduler<DeadlineMonotonic> {
    Scheduler::new(DeadlineMonotonic, tasks, resources, switches)
}

/// Returns a scheduler ranking jobs by their absolute deadline.
///
/// * `tasks` - the periodic tasks to simulate.
/// * `resources` - the processors and memory unit they share.
/// * `switches` - global preemption switches, and whether memory phases also
///                occupy a processor.
pub fn earliest_deadline_first(
    tasks: TaskSet,
    resources: ResourceSet,
    switches: Switches,
) -> Scheduler<EarliestDeadlineFirst> {
    Scheduler::new(EarliestDeadlineFirst, tasks, resources, switches)
}
