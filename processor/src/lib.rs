//! A processor simulation library
//!
//! This drives a [`rtsched::Scheduler`] one tick at a time and keeps a trace
//! of every tick: the schedule rows it produced and the job table it left
//! behind.

use std::fmt::{self, Display};

use rtsched::{
    Job, Priority, RepeatedState, ScheduleEntry, SchedError, Scheduler, Step, StopOn, StopReason,
    TaskSet,
};

/// Running iteration log
#[derive(Debug, PartialEq)]
pub struct Log {
    /// The tick this log describes.
    pub time: usize,

    /// Schedule rows appended during the tick, missed deadlines included.
    pub entries: Vec<ScheduleEntry>,

    /// The live jobs after the tick.
    pub jobs: Vec<JobInfo>,

    /// Set on the last log of a run that ended on a stop condition. Such a
    /// log describes the state in which the run stopped: no tick ran.
    pub stop_reason: Option<StopReason>,
}

impl Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        writeln!(f, "JOB\tPHASE\tREQUEST\tDEADLINE\tLOCK")?;
        for job in &self.jobs {
            writeln!(f, "{job}")?;
        }
        if let Some(reason) = &self.stop_reason {
            writeln!(f, "STOP {reason}")?;
        }
        Ok(())
    }
}

/// Information about a job's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    /// `<task>_<activation>`
    pub job: String,

    /// The current phase, 1-based.
    pub phase: usize,

    pub total_phases: usize,

    /// Units left in the current phase.
    pub request: usize,

    pub deadline: usize,

    /// Names of the resources held by a non-preemptive lock.
    pub lock: Vec<String>,
}

impl JobInfo {
    fn new<P: Priority>(scheduler: &Scheduler<P>, job: &Job) -> JobInfo {
        let tasks = scheduler.tasks();
        JobInfo {
            job: job.key().label(tasks),
            phase: job.phase() + 1,
            total_phases: tasks.get(job.task()).phases().len(),
            request: job.request(),
            deadline: job.absolute_deadline(),
            lock: job
                .lock()
                .iter()
                .map(|&id| scheduler.resources().get(id).name().to_string())
                .collect(),
        }
    }
}

impl Display for JobInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}/{}\t{}\t{}\t{}",
            self.job,
            self.phase,
            self.total_phases,
            self.request,
            self.deadline,
            self.lock.join(",")
        )
    }
}

/// The processor simulator.
pub struct Processor<'a, P: Priority> {
    scheduler: &'a mut Scheduler<P>,
    logs: Vec<Log>,
}

impl<'a, P: Priority> Processor<'a, P> {
    /// Run a simulation from time 0.
    ///
    /// * `scheduler` - the configured scheduler; it is reset first and keeps
    ///                 the full schedule log and repeated states afterwards.
    /// * `max_time` - the number of ticks to simulate at most.
    /// * `stop` - the conditions that end the run early.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use rtsched::{Configuration, Scheduler, StopOn};
    /// use rtsched_processor::{format_logs, Processor};
    ///
    /// let config = Configuration::from_json(
    ///     r#"{"nb_processors": 1, "tasks": [{"Name": "T1", "O": 0, "C": 2, "D": 5, "T": 6}]}"#,
    /// )
    /// .unwrap();
    /// let mut scheduler = Scheduler::from_configuration(config);
    /// let logs = Processor::run(&mut scheduler, 12, StopOn::never()).unwrap();
    ///
    /// println!("{}", format_logs(&logs));
    /// ```
    pub fn run(scheduler: &'a mut Scheduler<P>, max_time: usize, stop: StopOn) -> Result<Vec<Log>, SchedError> {
        scheduler.reset();
        let mut processor = Processor {
            scheduler,
            logs: vec![],
        };
        while processor.scheduler.time() < max_time {
            if !processor.step(stop)? {
                break;
            }
        }
        Ok(processor.logs)
    }

    /// Advances one tick. Returns `false` once a stop condition holds.
    fn step(&mut self, stop: StopOn) -> Result<bool, SchedError> {
        let time = self.scheduler.time();
        let before = self.scheduler.log().len();
        let step = self.scheduler.advance(stop)?;

        let scheduler = &*self.scheduler;
        let jobs = scheduler
            .jobs()
            .iter()
            .map(|job| JobInfo::new(scheduler, job))
            .collect();
        let (entries, stop_reason, ticked) = match step {
            Step::Ticked => (self.scheduler.log()[before..].to_vec(), None, true),
            Step::Stopped(reason) => (vec![], Some(reason), false),
        };
        let log = Log {
            time,
            entries,
            jobs,
            stop_reason,
        };
        #[cfg(feature = "output")]
        println!("===== Tick: {time} =====\n{log}");
        self.logs.push(log);
        Ok(ticked)
    }
}

/// Format the [`Processor`]'s logs to a [`String`].
///
/// * `logs` - the logs returned by the [`Processor`].
pub fn format_logs(logs: &[Log]) -> String {
    logs.iter()
        .map(|log| format!("===== Tick: {} =====\n{}\n", log.time, log))
        .collect()
}

/// Format repeated states with both snapshots side by side, one line per task
/// and per processor.
pub fn format_repeated_states(tasks: &TaskSet, repeated: &[RepeatedState]) -> String {
    let name = |task: Option<rtsched::TaskId>| task.map_or("-", |id| tasks.get(id).name()).to_string();
    let clock = |clock: Option<usize>| clock.map_or("-1".to_string(), |c| c.to_string());
    let memory = |request: Option<usize>| request.map_or("-".to_string(), |r| r.to_string());

    let mut s = String::new();
    for repeat in repeated {
        let (p, c) = (repeat.previous_time, repeat.current_time);
        s.push_str(&format!(
            "===== Repeated: {p} / {c} =====\nNAME\t{p}_CLOCK\t{p}_REMAINING\t{c}_CLOCK\t{c}_REMAINING\n"
        ));
        for (((_, task), before), after) in tasks
            .iter()
            .zip(&repeat.previous.tasks)
            .zip(&repeat.current.tasks)
        {
            s.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                task.name(),
                clock(before.clock),
                before.remaining,
                clock(after.clock),
                after.remaining
            ));
        }
        for (i, (before, after)) in repeat
            .previous
            .processors
            .iter()
            .zip(&repeat.current.processors)
            .enumerate()
        {
            s.push_str(&format!(
                "CPU{i}\t{}\t{}\t{}\t{}\n",
                name(before.task),
                memory(before.memory_request),
                name(after.task),
                memory(after.memory_request)
            ));
        }
        s.push('\n');
    }
    s
}
