use std::fmt::{self, Display};

use log::debug;

use crate::state::StateHistory;
use crate::{
    ConfigError, Configuration, Descriptor, Diagnostics, Event, Job, JobKey, JobTable, LogSink,
    Policy, Priority, RepeatedState, ResourceId, ResourceSet, ResourceType, SchedError, Switches,
    SystemState, TaskSet,
};

/// One row of the schedule log.
///
/// A row either records one unit of work of a job on one resource during
/// `[start, finish)`, or, with `missed` set and an empty `resource`, that the
/// job was still pending at `start` although its deadline had been reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub task: String,
    pub job: String,
    pub start: usize,
    pub finish: usize,
    pub resource: String,
    pub missed: bool,
    /// 1-based.
    pub phase: usize,
    /// Request of the phase at the start of the tick.
    pub remaining: usize,
    pub total_phases: usize,
    pub phase_duration: usize,
}

impl Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missed {
            write!(
                f,
                "{}\tMISSED at {}\tphase {}/{}\tremaining {}/{}",
                self.job, self.start, self.phase, self.total_phases, self.remaining, self.phase_duration
            )
        } else {
            write!(
                f,
                "{}\t{}\t[{}, {})\tphase {}/{}\tremaining {}/{}",
                self.job,
                self.resource,
                self.start,
                self.finish,
                self.phase,
                self.total_phases,
                self.remaining,
                self.phase_duration
            )
        }
    }
}

/// Why a run ended before `max_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The first repeated pair found.
    RepeatedState { previous: usize, current: usize },
    /// Tasks with a job pending at or past its deadline.
    MissedDeadline { time: usize, tasks: Vec<String> },
}

impl Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::RepeatedState { previous, current } => {
                write!(f, "state at time {current} repeats time {previous}")
            }
            StopReason::MissedDeadline { time, tasks } => {
                write!(f, "deadline missed at time {time} by {}", tasks.join(", "))
            }
        }
    }
}

/// Conditions checked between ticks.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct StopOn {
    pub repeated_state: bool,
    pub missed_deadline: bool,
}

impl StopOn {
    pub fn never() -> StopOn {
        StopOn::default()
    }

    pub fn any() -> StopOn {
        StopOn {
            repeated_state: true,
            missed_deadline: true,
        }
    }
}

/// The outcome of [`Scheduler::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Ticked,
    Stopped(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Time reached: the number of ticks simulated.
    pub time: usize,
    pub stopped: Option<StopReason>,
}

/// The scheduling engine.
///
/// Owns the live jobs and the schedule log and advances simulated time one
/// tick at a time. Which ready job goes first is decided by `P`.
pub struct Scheduler<P: Priority = Policy> {
    policy: P,
    tasks: TaskSet,
    resources: ResourceSet,
    switches: Switches,
    jobs: JobTable,
    log: Vec<ScheduleEntry>,
    time: usize,
    history: StateHistory,
    /// Per resource, the job it served during the previous tick.
    finishing: Vec<Option<JobKey>>,
    diagnostics: Box<dyn Diagnostics>,
}

impl Scheduler<Policy> {
    /// A scheduler running the policy named by the configuration.
    pub fn from_configuration(config: Configuration) -> Scheduler<Policy> {
        Scheduler::new(config.policy, config.tasks, config.resources, config.switches)
    }
}

impl<P: Priority> Scheduler<P> {
    pub fn new(policy: P, tasks: TaskSet, resources: ResourceSet, switches: Switches) -> Scheduler<P> {
        let finishing = vec![None; resources.len()];
        Scheduler {
            policy,
            tasks,
            resources,
            switches,
            jobs: JobTable::default(),
            log: vec![],
            time: 0,
            history: StateHistory::default(),
            finishing,
            diagnostics: Box::new(LogSink),
        }
    }

    /// Replaces the sink receiving scheduling [`Event`]s.
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Scheduler<P> {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    pub fn configure(&mut self, tasks: TaskSet, resources: ResourceSet, switches: Switches) {
        self.tasks = tasks;
        self.resources = resources;
        self.switches = switches;
        self.reset();
    }

    /// Like [`configure`](Scheduler::configure) from a descriptor. The
    /// descriptor's `scheduler` field is ignored: the policy is `P`.
    pub fn configure_from_descriptor(&mut self, descriptor: &Descriptor) -> Result<(), ConfigError> {
        let tasks = descriptor.task_set()?;
        let resources = descriptor.resource_set()?;
        let switches = descriptor.switches()?;
        self.configure(tasks, resources, switches);
        Ok(())
    }

    /// Drops every job, the log and the state history and rewinds to time 0.
    pub fn reset(&mut self) {
        self.jobs.clear();
        self.log.clear();
        self.history.clear();
        self.time = 0;
        self.finishing = vec![None; self.resources.len()];
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn switches(&self) -> Switches {
        self.switches
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn log(&self) -> &[ScheduleEntry] {
        &self.log
    }

    pub fn time(&self) -> usize {
        self.time
    }

    pub fn repeated_states(&self) -> &[RepeatedState] {
        self.history.repeated()
    }

    /// Resets, then runs up to `max_time` ticks or until a stop condition
    /// holds.
    pub fn run(&mut self, max_time: usize, stop: StopOn) -> Result<RunSummary, SchedError> {
        self.reset();
        let mut stopped = None;
        while self.time < max_time {
            if let Step::Stopped(reason) = self.advance(stop)? {
                stopped = Some(reason);
                break;
            }
        }
        Ok(RunSummary {
            time: self.time,
            stopped,
        })
    }

    /// Checks the stop conditions and runs one tick if none holds.
    pub fn advance(&mut self, stop: StopOn) -> Result<Step, SchedError> {
        match self.stop_reason(stop) {
            Some(reason) => {
                self.diagnostics.emit(Event::RunStopped {
                    reason: reason.clone(),
                });
                Ok(Step::Stopped(reason))
            }
            None => {
                self.tick()?;
                Ok(Step::Ticked)
            }
        }
    }

    /// The condition that ends a run at the current time, if any.
    pub fn stop_reason(&self, stop: StopOn) -> Option<StopReason> {
        if stop.repeated_state {
            if let Some(first) = self.history.repeated().first() {
                return Some(StopReason::RepeatedState {
                    previous: first.previous_time,
                    current: first.current_time,
                });
            }
        }
        if stop.missed_deadline {
            let mut tasks: Vec<String> = vec![];
            for job in self.jobs.iter().filter(|job| job.is_late(self.time)) {
                let name = self.tasks.get(job.task()).name();
                if !tasks.iter().any(|t| t == name) {
                    tasks.push(name.to_string());
                }
            }
            if !tasks.is_empty() {
                return Some(StopReason::MissedDeadline {
                    time: self.time,
                    tasks,
                });
            }
        }
        None
    }

    /// Simulates one time unit.
    pub fn tick(&mut self) -> Result<(), SchedError> {
        let time = self.time;

        for job in self.jobs.iter_mut() {
            job.executed = false;
        }

        for (id, task) in self.tasks.iter() {
            if task.activates_at(time) {
                self.jobs.insert(Job::activate(id, task, time));
            }
        }

        let state = SystemState::capture(time, &self.tasks, &self.resources, &self.jobs, &self.finishing);
        if let Some(repeat) = self.history.check(&state, time) {
            self.diagnostics.emit(Event::RepeatedStateDetected {
                previous: repeat.previous_time,
                current: repeat.current_time,
            });
        }

        let tasks = &self.tasks;
        self.jobs.retain(|job| !job.is_retired(tasks.get(job.task()), time));

        self.history.record(state, time);

        self.assign_resources()?;
        self.check_deadlines();

        self.time += 1;
        Ok(())
    }

    /// Matches jobs to resources for the current tick.
    ///
    /// Jobs holding a non-preemptive lock keep their resources first. The
    /// remaining jobs are served in priority order, each taking the first
    /// free resource of every type its phase needs, or nothing at all.
    fn assign_resources(&mut self) -> Result<(), SchedError> {
        let mut pool: Vec<ResourceId> = self.resources.ids().collect();
        self.finishing.iter_mut().for_each(|slot| *slot = None);

        let locked: Vec<(JobKey, Vec<ResourceId>)> = self
            .jobs
            .iter()
            .filter(|job| !job.lock.is_empty() && job.is_pending() && !job.executed)
            .map(|job| (job.key, job.lock.clone()))
            .collect();
        for (key, lock) in locked {
            pool.retain(|id| !lock.contains(id));
            self.execute(key, &lock)?;
        }

        let mut ready: Vec<(usize, JobKey)> = self
            .jobs
            .iter()
            .filter(|job| job.is_pending() && !job.executed)
            .map(|job| (self.policy.priority(self.tasks.get(job.task()), job), job.key))
            .collect();
        // Stable: equal priorities stay in activation order.
        ready.sort_by_key(|(priority, _)| *priority);

        for (_, key) in ready {
            if pool.is_empty() {
                break;
            }
            let Some(job) = self.jobs.get(&key) else {
                continue;
            };
            let mut wanted = self.required_types(self.tasks.get(key.task).phase(job.phase).resource_type);

            let mut selected = vec![];
            for &id in &pool {
                let kind = self.resources.get(id).kind();
                if let Some(pos) = wanted.iter().position(|&w| w == kind) {
                    wanted.swap_remove(pos);
                    selected.push(id);
                    if wanted.is_empty() {
                        break;
                    }
                }
            }

            if wanted.is_empty() {
                pool.retain(|id| !selected.contains(id));
                self.execute(key, &selected)?;
            } else {
                debug!(
                    "t={}: {} waits, no free {:?}",
                    self.time,
                    key.label(&self.tasks),
                    wanted
                );
            }
        }
        Ok(())
    }

    fn required_types(&self, phase_type: ResourceType) -> Vec<ResourceType> {
        if phase_type == ResourceType::Memory && self.switches.memory_use_processor {
            vec![ResourceType::Memory, ResourceType::Processor]
        } else {
            vec![phase_type]
        }
    }

    /// Runs one unit of the job's current phase on `assigned`.
    fn execute(&mut self, key: JobKey, assigned: &[ResourceId]) -> Result<(), SchedError> {
        let time = self.time;
        let task = self.tasks.get(key.task);
        let Some(job) = self.jobs.get_mut(&key) else {
            return Ok(());
        };
        let phase = *task.phase(job.phase);

        for &id in assigned {
            let resource = self.resources.get(id);
            let compatible = resource.kind() == phase.resource_type
                || (phase.resource_type == ResourceType::Memory
                    && resource.kind() == ResourceType::Processor
                    && self.switches.memory_use_processor);
            if !compatible {
                return Err(SchedError::ResourceMismatch {
                    task: task.name().to_string(),
                    activation: key.activation,
                    phase: job.phase + 1,
                    required: phase.resource_type,
                    resource: resource.name().to_string(),
                    found: resource.kind(),
                });
            }
        }

        if !phase.preemptible || !self.switches.preemptive(phase.resource_type) {
            job.lock = assigned.to_vec();
        } else {
            job.lock.clear();
        }

        let label = key.label(&self.tasks);
        for &id in assigned {
            self.log.push(ScheduleEntry {
                task: task.name().to_string(),
                job: label.clone(),
                start: time,
                finish: time + 1,
                resource: self.resources.get(id).name().to_string(),
                missed: false,
                phase: job.phase + 1,
                remaining: job.request,
                total_phases: task.phases().len(),
                phase_duration: phase.duration,
            });
            self.finishing[id.index()] = Some(key);
        }

        job.request -= 1;
        job.executed = true;
        if job.request == 0 {
            job.lock.clear();
            if let Some(next) = task.phases().get(job.phase + 1) {
                job.phase += 1;
                job.request = next.duration;
            }
        }
        Ok(())
    }

    /// Logs a missed row for every job still pending when its deadline is
    /// reached at the end of this tick, and on every later tick it stays so.
    fn check_deadlines(&mut self) {
        let now = self.time + 1;
        for job in self.jobs.iter().filter(|job| job.is_late(now)) {
            let task = self.tasks.get(job.task());
            let label = job.key.label(&self.tasks);
            self.log.push(ScheduleEntry {
                task: task.name().to_string(),
                job: label.clone(),
                start: now,
                finish: now,
                resource: String::new(),
                missed: true,
                phase: job.phase + 1,
                remaining: job.request,
                total_phases: task.phases().len(),
                phase_duration: task.phase(job.phase).duration,
            });
            self.diagnostics.emit(Event::DeadlineMissed {
                task: task.name().to_string(),
                job: label,
                deadline: job.absolute_deadline,
                time: now,
            });
        }
    }
}
