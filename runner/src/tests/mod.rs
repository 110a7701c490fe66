use std::collections::{BTreeMap, BTreeSet};

use rtsched::{Configuration, Priority, ScheduleEntry, Scheduler, StopOn};
use rtsched_processor::{Log, Processor};

mod config;
mod phases;
mod repeated;

fn configuration(json: &str) -> Configuration {
    Configuration::from_json(json).unwrap()
}

/// Runs the configuration through the processor, returning the scheduler
/// (which keeps the full schedule log) and the per tick trace.
fn run(json: &str, max_time: usize, stop: StopOn) -> (Scheduler, Vec<Log>) {
    let mut scheduler = Scheduler::from_configuration(configuration(json));
    let logs = Processor::run(&mut scheduler, max_time, stop).unwrap();
    (scheduler, logs)
}

/// `(job, resource, start)` for every unit of work.
fn units(log: &[ScheduleEntry]) -> Vec<(&str, &str, usize)> {
    log.iter()
        .filter(|row| !row.missed)
        .map(|row| (row.job.as_str(), row.resource.as_str(), row.start))
        .collect()
}

/// `(job, time)` for every missed deadline row.
fn missed(log: &[ScheduleEntry]) -> Vec<(&str, usize)> {
    log.iter()
        .filter(|row| row.missed)
        .map(|row| (row.job.as_str(), row.start))
        .collect()
}

/// Distinct ticks each job executed in.
fn ticks_per_job(log: &[ScheduleEntry]) -> BTreeMap<&str, BTreeSet<usize>> {
    let mut ticks: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
    for row in log.iter().filter(|row| !row.missed) {
        ticks.entry(row.job.as_str()).or_default().insert(row.start);
    }
    ticks
}

/// Ticks from time 0 to `max_time`, asserting before every tick that each
/// job holding a lock runs on exactly the locked resources during that tick.
fn simulate_checking_locks<P: Priority>(scheduler: &mut Scheduler<P>, max_time: usize) {
    scheduler.reset();
    while scheduler.time() < max_time {
        let time = scheduler.time();
        let locked: Vec<(String, BTreeSet<String>)> = scheduler
            .jobs()
            .iter()
            .filter(|job| job.is_pending() && !job.lock().is_empty())
            .map(|job| {
                let names = job
                    .lock()
                    .iter()
                    .map(|&id| scheduler.resources().get(id).name().to_string())
                    .collect();
                (job.key().label(scheduler.tasks()), names)
            })
            .collect();

        scheduler.tick().unwrap();

        for (job, lock) in locked {
            let used: BTreeSet<String> = scheduler
                .log()
                .iter()
                .filter(|row| !row.missed && row.start == time && row.job == job)
                .map(|row| row.resource.clone())
                .collect();
            assert_eq!(used, lock, "{job} left its lock at time {time}");
        }
    }
}
