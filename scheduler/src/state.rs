//! Snapshots of the simulated system and detection of repeated states.
//!
//! A periodic task set on a deterministic scheduler eventually cycles. Once
//! two ticks produce the same snapshot, every following tick repeats an
//! earlier one, so a run can be cut short without losing information.

use std::collections::HashMap;

use crate::{JobKey, JobTable, ResourceSet, ResourceType, TaskId, TaskSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskState {
    /// Ticks since the last activation, `None` before the first one.
    pub clock: Option<usize>,
    /// Units left across all live jobs of the task.
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessorState {
    /// Task whose job ran on the processor during the previous tick.
    pub task: Option<TaskId>,
    /// Request left for that job when its current phase is a memory phase.
    pub memory_request: Option<usize>,
}

/// The state of every task and processor at the start of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemState {
    pub tasks: Vec<TaskState>,
    pub processors: Vec<ProcessorState>,
}

impl SystemState {
    /// `finishing` holds, per resource, the job that ran on it during the
    /// previous tick.
    pub(crate) fn capture(
        time: usize,
        tasks: &TaskSet,
        resources: &ResourceSet,
        jobs: &JobTable,
        finishing: &[Option<JobKey>],
    ) -> SystemState {
        let task_states = tasks
            .iter()
            .map(|(id, task)| TaskState {
                clock: task.clock(time),
                remaining: jobs.of_task(id).map(|job| job.remaining(task)).sum(),
            })
            .collect();

        let processor_states = resources
            .processors()
            .map(|(id, _)| {
                let Some(key) = finishing[id.index()] else {
                    return ProcessorState {
                        task: None,
                        memory_request: None,
                    };
                };
                let memory_request = jobs.get(&key).and_then(|job| {
                    let phase = tasks.get(key.task).phase(job.phase());
                    (phase.resource_type == ResourceType::Memory).then_some(job.request())
                });
                ProcessorState {
                    task: Some(key.task),
                    memory_request,
                }
            })
            .collect();

        SystemState {
            tasks: task_states,
            processors: processor_states,
        }
    }

    /// Every task has been activated at least once.
    pub fn is_warm(&self) -> bool {
        self.tasks.iter().all(|task| task.clock.is_some())
    }
}

/// Two ticks that started from the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedState {
    pub previous_time: usize,
    pub current_time: usize,
    pub previous: SystemState,
    pub current: SystemState,
}

#[derive(Debug, Default)]
pub(crate) struct StateHistory {
    seen: HashMap<SystemState, usize>,
    repeated: Vec<RepeatedState>,
}

impl StateHistory {
    /// Compares `state` against the earliest identical snapshot recorded so
    /// far. Snapshots taken before every task was activated never match.
    pub(crate) fn check(&mut self, state: &SystemState, time: usize) -> Option<&RepeatedState> {
        if !state.is_warm() {
            return None;
        }
        let previous_time = *self.seen.get(state)?;
        self.repeated.push(RepeatedState {
            previous_time,
            current_time: time,
            previous: state.clone(),
            current: state.clone(),
        });
        self.repeated.last()
    }

    pub(crate) fn record(&mut self, state: SystemState, time: usize) {
        self.seen.entry(state).or_insert(time);
    }

    pub(crate) fn repeated(&self) -> &[RepeatedState] {
        &self.repeated
    }

    pub(crate) fn clear(&mut self) {
        self.seen.clear();
        self.repeated.clear();
    }
}
