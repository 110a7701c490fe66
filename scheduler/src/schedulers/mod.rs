//! Priority policies.
//!
//! Each policy ranks ready jobs through [`Priority`]; [`Policy`] selects one
//! of them at runtime.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::{ConfigError, Job, Task};

mod deadline_monotonic;
pub use deadline_monotonic::DeadlineMonotonic;

mod earliest_deadline;
pub use earliest_deadline::EarliestDeadlineFirst;

/// Ranks a job among the ready jobs. Lower keys are scheduled first; equal
/// keys keep activation order.
pub trait Priority {
    fn priority(&self, task: &Task, job: &Job) -> usize;
}

/// The built-in policies.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    #[default]
    DeadlineMonotonic,
    EarliestDeadlineFirst,
}

impl Priority for Policy {
    fn priority(&self, task: &Task, job: &Job) -> usize {
        match self {
            Policy::DeadlineMonotonic => DeadlineMonotonic.priority(task, job),
            Policy::EarliestDeadlineFirst => EarliestDeadlineFirst.priority(task, job),
        }
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::DeadlineMonotonic => write!(f, "DM"),
            Policy::EarliestDeadlineFirst => write!(f, "EDF"),
        }
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Policy, ConfigError> {
        match s {
            "DM" => Ok(Policy::DeadlineMonotonic),
            "EDF" => Ok(Policy::EarliestDeadlineFirst),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}
