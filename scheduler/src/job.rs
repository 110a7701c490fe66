use std::collections::BTreeMap;

use crate::{ResourceId, Task, TaskId, TaskSet};

/// Identifies one activation of a task.
///
/// Keys order by activation time first, then by task, which is the order in
/// which jobs are created. Ties in priority are broken by this order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct JobKey {
    pub activation: usize,
    pub task: TaskId,
}

impl JobKey {
    /// The `<task>_<activation>` label used in schedule rows.
    pub fn label(&self, tasks: &TaskSet) -> String {
        format!("{}_{}", tasks.get(self.task).name(), self.activation)
    }
}

/// One activation of a task and its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub(crate) key: JobKey,
    pub(crate) phase: usize,
    pub(crate) request: usize,
    pub(crate) absolute_deadline: usize,
    pub(crate) lock: Vec<ResourceId>,
    pub(crate) executed: bool,
}

impl Job {
    pub(crate) fn activate(task_id: TaskId, task: &Task, time: usize) -> Job {
        Job {
            key: JobKey {
                activation: time,
                task: task_id,
            },
            phase: 0,
            request: task.phase(0).duration,
            absolute_deadline: time + task.deadline(),
            lock: vec![],
            executed: false,
        }
    }

    pub fn key(&self) -> JobKey {
        self.key
    }

    pub fn task(&self) -> TaskId {
        self.key.task
    }

    pub fn activation(&self) -> usize {
        self.key.activation
    }

    /// Zero-based index of the current phase.
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Units left in the current phase.
    pub fn request(&self) -> usize {
        self.request
    }

    pub fn absolute_deadline(&self) -> usize {
        self.absolute_deadline
    }

    /// Resources held across ticks by a non-preemptible phase.
    pub fn lock(&self) -> &[ResourceId] {
        &self.lock
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn is_pending(&self) -> bool {
        self.request > 0
    }

    /// Units left across the current and all following phases.
    pub fn remaining(&self, task: &Task) -> usize {
        self.request
            + task.phases()[self.phase + 1..]
                .iter()
                .map(|phase| phase.duration)
                .sum::<usize>()
    }

    /// Pending at or after its absolute deadline.
    pub fn is_late(&self, time: usize) -> bool {
        self.is_pending() && time >= self.absolute_deadline
    }

    /// Finished and its activation window has elapsed.
    pub(crate) fn is_retired(&self, task: &Task, time: usize) -> bool {
        !self.is_pending() && time >= self.key.activation + task.period()
    }
}

/// The live jobs, iterated in activation order.
#[derive(Debug, Default, Clone)]
pub struct JobTable {
    jobs: BTreeMap<JobKey, Job>,
}

impl JobTable {
    pub fn get(&self, key: &JobKey) -> Option<&Job> {
        self.jobs.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &JobKey) -> Option<&mut Job> {
        self.jobs.get_mut(key)
    }

    pub(crate) fn insert(&mut self, job: Job) {
        self.jobs.insert(job.key, job);
    }

    pub(crate) fn retain(&mut self, mut f: impl FnMut(&Job) -> bool) {
        self.jobs.retain(|_, job| f(job));
    }

    pub(crate) fn clear(&mut self) {
        self.jobs.clear();
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Live jobs of one task, oldest first.
    pub fn of_task(&self, task: TaskId) -> impl Iterator<Item = &Job> {
        self.jobs.values().filter(move |job| job.key.task == task)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
