use std::fmt::{self, Display};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ResourceType};

/// One ordered segment of a task's work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaskPhase {
    pub resource_type: ResourceType,
    /// Units of work, always positive.
    pub duration: usize,
    /// A non-preemptible phase keeps its resources until it completes.
    pub preemptible: bool,
    pub resumable: bool,
}

impl TaskPhase {
    pub fn new(resource_type: ResourceType, duration: usize, preemptible: bool) -> TaskPhase {
        TaskPhase {
            resource_type,
            duration,
            preemptible,
            resumable: true,
        }
    }
}

impl Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Type = {}, duration = {}, premption = {}, resumable = {}]",
            self.resource_type, self.duration, self.preemptible, self.resumable
        )
    }
}

/// Index of a task inside its [`TaskSet`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A periodic task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: String,
    first_activation: usize,
    deadline: usize,
    period: usize,
    phases: Vec<TaskPhase>,
}

impl Task {
    /// Builds a task and checks that it can be simulated: positive timing
    /// parameters and at least one phase, every phase with positive duration.
    pub fn new(
        name: impl Into<String>,
        first_activation: usize,
        deadline: usize,
        period: usize,
        phases: Vec<TaskPhase>,
    ) -> Result<Task, ConfigError> {
        let name = name.into();
        let not_positive = |field| ConfigError::NotPositive {
            task: name.clone(),
            field,
        };
        if deadline == 0 {
            return Err(not_positive("deadline"));
        }
        if period == 0 {
            return Err(not_positive("period"));
        }
        if phases.is_empty() {
            return Err(ConfigError::MissingPhases { task: name });
        }
        if phases.iter().any(|phase| phase.duration == 0) {
            return Err(not_positive("phase duration"));
        }
        if deadline > period {
            warn!("task {name}: deadline {deadline} exceeds period {period}, jobs may overlap");
        }
        Ok(Task {
            name,
            first_activation,
            deadline,
            period,
            phases,
        })
    }

    /// A single preemptible processor phase of `wcet` units.
    pub fn single(
        name: impl Into<String>,
        first_activation: usize,
        wcet: usize,
        deadline: usize,
        period: usize,
    ) -> Result<Task, ConfigError> {
        Task::new(
            name,
            first_activation,
            deadline,
            period,
            vec![TaskPhase::new(ResourceType::Processor, wcet, true)],
        )
    }

    /// The read / execute / write-back shape: memory, processor, memory.
    pub fn triple(
        name: impl Into<String>,
        first_activation: usize,
        (read, execute, write): (usize, usize, usize),
        deadline: usize,
        period: usize,
    ) -> Result<Task, ConfigError> {
        Task::new(
            name,
            first_activation,
            deadline,
            period,
            vec![
                TaskPhase::new(ResourceType::Memory, read, true),
                TaskPhase::new(ResourceType::Processor, execute, true),
                TaskPhase::new(ResourceType::Memory, write, true),
            ],
        )
    }

    pub fn from_descriptor(descriptor: &TaskDescriptor) -> Result<Task, ConfigError> {
        let name = descriptor.name.as_str();
        let triple = [descriptor.read, descriptor.execute, descriptor.write];

        let mut shapes = vec![];
        if descriptor.wcet.is_some() {
            shapes.push("C");
        }
        if descriptor.phases.is_some() {
            shapes.push("Phases");
        }
        if triple.iter().any(Option::is_some) {
            shapes.push("R/E/W");
        }
        if shapes.len() > 1 {
            return Err(ConfigError::ConflictingPhases {
                task: name.to_string(),
                shapes: shapes.join(", "),
            });
        }

        let (o, d, t) = (descriptor.first_activation, descriptor.deadline, descriptor.period);
        if let Some(wcet) = descriptor.wcet {
            Task::single(name, o, wcet, d, t)
        } else if let Some(phases) = &descriptor.phases {
            let phases = phases
                .iter()
                .map(|phase| TaskPhase {
                    resource_type: phase.kind,
                    duration: phase.duration,
                    preemptible: phase.preemptible,
                    resumable: phase.resumable,
                })
                .collect();
            Task::new(name, o, d, t, phases)
        } else if let [Some(r), Some(e), Some(w)] = triple {
            Task::triple(name, o, (r, e, w), d, t)
        } else if shapes.is_empty() {
            Err(ConfigError::MissingPhases {
                task: name.to_string(),
            })
        } else {
            Err(ConfigError::IncompleteTriple {
                task: name.to_string(),
            })
        }
    }

    /// Explicit-phase form of the descriptor.
    pub fn to_descriptor(&self) -> TaskDescriptor {
        TaskDescriptor {
            name: self.name.clone(),
            first_activation: self.first_activation,
            deadline: self.deadline,
            period: self.period,
            wcet: None,
            phases: Some(
                self.phases
                    .iter()
                    .map(|phase| PhaseDescriptor {
                        kind: phase.resource_type,
                        duration: phase.duration,
                        preemptible: phase.preemptible,
                        resumable: phase.resumable,
                    })
                    .collect(),
            ),
            read: None,
            execute: None,
            write: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_activation(&self) -> usize {
        self.first_activation
    }

    /// Relative deadline.
    pub fn deadline(&self) -> usize {
        self.deadline
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn phases(&self) -> &[TaskPhase] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> &TaskPhase {
        &self.phases[index]
    }

    /// Whether a new job of this task is released at `time`.
    pub fn activates_at(&self, time: usize) -> bool {
        time >= self.first_activation && (time - self.first_activation) % self.period == 0
    }

    /// Time elapsed since the most recent activation, `None` before the first.
    pub fn clock(&self, time: usize) -> Option<usize> {
        time.checked_sub(self.first_activation)
            .map(|elapsed| elapsed % self.period)
    }

    pub fn execution_time(&self) -> usize {
        self.phases.iter().map(|phase| phase.duration).sum()
    }

    pub fn utilization(&self) -> f64 {
        self.execution_time() as f64 / self.period as f64
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task: {}", self.name)?;
        writeln!(f, "\tFirst activation: {}", self.first_activation)?;
        writeln!(f, "\tDeadline: {}", self.deadline)?;
        writeln!(f, "\tPeriod: {}", self.period)?;
        writeln!(f, "\tPhases:")?;
        for phase in &self.phases {
            writeln!(f, "\t\t{phase}")?;
        }
        Ok(())
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    #[serde(rename = "Type")]
    pub kind: ResourceType,
    #[serde(rename = "Duration")]
    pub duration: usize,
    #[serde(rename = "Premption", default = "enabled")]
    pub preemptible: bool,
    #[serde(rename = "Resumable", default = "enabled")]
    pub resumable: bool,
}

/// A task as written in a configuration document.
///
/// Exactly one phase shape must be present: `C`, `Phases` or the `R`/`E`/`W`
/// triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "O")]
    pub first_activation: usize,
    #[serde(rename = "D")]
    pub deadline: usize,
    #[serde(rename = "T")]
    pub period: usize,
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub wcet: Option<usize>,
    #[serde(rename = "Phases", default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<PhaseDescriptor>>,
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub read: Option<usize>,
    #[serde(rename = "E", default, skip_serializing_if = "Option::is_none")]
    pub execute: Option<usize>,
    #[serde(rename = "W", default, skip_serializing_if = "Option::is_none")]
    pub write: Option<usize>,
}

/// One row of the `(Name, O, D, T)` task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub name: String,
    pub first_activation: usize,
    pub deadline: usize,
    pub period: usize,
}

/// The tasks to simulate, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Result<TaskSet, ConfigError> {
        for (i, task) in tasks.iter().enumerate() {
            if tasks[..i].iter().any(|other| other.name == task.name) {
                return Err(ConfigError::DuplicateTask(task.name.clone()));
            }
        }
        Ok(TaskSet { tasks })
    }

    pub fn from_descriptors(descriptors: &[TaskDescriptor]) -> Result<TaskSet, ConfigError> {
        let tasks = descriptors
            .iter()
            .map(Task::from_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        TaskSet::new(tasks)
    }

    pub fn get(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<(TaskId, &Task)> {
        self.iter().find(|(_, task)| task.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().enumerate().map(|(i, t)| (TaskId(i), t))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Least common multiple of all periods, `0` for an empty set and
    /// `None` when it does not fit in a `usize`.
    pub fn hyperperiod(&self) -> Option<usize> {
        let mut periods = self.tasks.iter().map(|task| task.period);
        let Some(first) = periods.next() else {
            return Some(0);
        };
        periods.try_fold(first, lcm)
    }

    pub fn max_offset(&self) -> usize {
        self.tasks
            .iter()
            .map(|task| task.first_activation)
            .max()
            .unwrap_or(0)
    }

    /// Two hyperperiods past the latest first activation: long enough for a
    /// periodic schedule to show its cycle.
    pub fn horizon(&self) -> Option<usize> {
        self.hyperperiod()?
            .checked_mul(2)?
            .checked_add(self.max_offset())
    }

    pub fn utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        self.tasks
            .iter()
            .map(|task| TaskRow {
                name: task.name.clone(),
                first_activation: task.first_activation,
                deadline: task.deadline,
                period: task.period,
            })
            .collect()
    }

    pub fn to_descriptors(&self) -> Vec<TaskDescriptor> {
        self.tasks.iter().map(Task::to_descriptor).collect()
    }
}

impl Display for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tasks:")?;
        for task in &self.tasks {
            writeln!(f, "{task}")?;
        }
        Ok(())
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: usize, b: usize) -> Option<usize> {
    (a / gcd(a, b)).checked_mul(b)
}
