use crate::{Job, Priority, Task};

/// Fixed priorities: the shorter the relative deadline, the higher the
/// priority. Every job of a task ranks the same.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DeadlineMonotonic;

impl Priority for DeadlineMonotonic {
    fn priority(&self, task: &Task, _job: &Job) -> usize {
        task.deadline()
    }
}
