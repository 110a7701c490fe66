use crate::{Job, Priority, Task};

/// Dynamic priorities: the job with the nearest absolute deadline runs first.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct EarliestDeadlineFirst;

impl Priority for EarliestDeadlineFirst {
    fn priority(&self, _task: &Task, job: &Job) -> usize {
        job.absolute_deadline()
    }
}
