use pretty_assertions::assert_eq;
use rtsched::{Scheduler, StopOn};

use super::{configuration, missed, run, simulate_checking_locks, ticks_per_job, units};

const MIXED_PHASES: &str = r#"{
    "tasks": [
        {
            "Name": "T1",
            "O": 0,
            "Phases": [
                {"Type": "Memory", "Duration": 2, "Premption": false},
                {"Type": "Processor", "Duration": 3, "Premption": true},
                {"Type": "Memory", "Duration": 1, "Premption": false}
            ],
            "D": 10,
            "T": 10
        },
        {"Name": "T2", "O": 1, "R": 1, "E": 1, "W": 1, "D": 4, "T": 9},
        {"Name": "T3", "O": 0, "C": 2, "D": 5, "T": 6}
    ],
    "resources": [
        {"Name": "P1", "Type": "Processor"},
        {"Name": "M1", "Type": "Memory"}
    ]
}"#;

#[test]
pub fn mixed_phase_shapes() {
    let (scheduler, _) = run(MIXED_PHASES, 10, StopOn::never());
    assert_eq!(
        units(scheduler.log()),
        vec![
            ("T3_0", "P1", 0),
            ("T1_0", "M1", 0),
            // T1_0 keeps M1 although T2_1 ranks higher.
            ("T1_0", "M1", 1),
            ("T3_0", "P1", 1),
            ("T2_1", "M1", 2),
            ("T1_0", "P1", 2),
            ("T2_1", "P1", 3),
            ("T2_1", "M1", 4),
            ("T1_0", "P1", 4),
            ("T1_0", "P1", 5),
            ("T3_6", "P1", 6),
            ("T1_0", "M1", 6),
            ("T3_6", "P1", 7),
        ]
    );
    assert!(missed(scheduler.log()).is_empty());
}

#[test]
pub fn trace_follows_phases_and_locks() {
    let (_, logs) = run(MIXED_PHASES, 3, StopOn::never());
    let t1: Vec<(usize, usize, Vec<String>)> = logs
        .iter()
        .map(|log| {
            let info = log.jobs.iter().find(|job| job.job == "T1_0").unwrap();
            (info.phase, info.request, info.lock.clone())
        })
        .collect();
    assert_eq!(
        t1,
        vec![
            (1, 1, vec!["M1".to_string()]),
            (2, 3, vec![]),
            (2, 2, vec![]),
        ]
    );
}

#[test]
pub fn locks_hold_over_a_long_run() {
    let config = configuration(MIXED_PHASES);
    let horizon = config.horizon().unwrap();
    let mut scheduler = Scheduler::from_configuration(config);
    simulate_checking_locks(&mut scheduler, horizon);

    // Every job that left the table ran for its full execution time.
    let ticks = ticks_per_job(scheduler.log());
    let live: Vec<String> = scheduler
        .jobs()
        .iter()
        .map(|job| job.key().label(scheduler.tasks()))
        .collect();
    for (job, ticks) in ticks.iter().filter(|(job, _)| !live.iter().any(|l| l == *job)) {
        let task = job.split('_').next().unwrap();
        let (_, task) = scheduler.tasks().lookup(task).unwrap();
        assert_eq!(ticks.len(), task.execution_time(), "{job}");
    }
}

#[test]
pub fn memory_phases_also_take_a_processor() {
    let (scheduler, _) = run(
        r#"{
            "nb_processors": 1,
            "memory_use_processor": "True",
            "tasks": [
                {"Name": "A", "O": 0, "R": 1, "E": 1, "W": 1, "D": 10, "T": 10},
                {"Name": "B", "O": 0, "C": 1, "D": 3, "T": 10}
            ]
        }"#,
        4,
        StopOn::never(),
    );
    // A_0 needs P0 and M together, so it waits for B_0.
    assert_eq!(
        units(scheduler.log()),
        vec![
            ("B_0", "P0", 0),
            ("A_0", "P0", 1),
            ("A_0", "M", 1),
            ("A_0", "P0", 2),
            ("A_0", "P0", 3),
            ("A_0", "M", 3),
        ]
    );
}

const MEMORY_CONTENTION: &str = r#"{
    "nb_processors": 1,
    "premption_memory": "True",
    "tasks": [
        {"Name": "A", "O": 0, "R": 2, "E": 1, "W": 1, "D": 10, "T": 10},
        {"Name": "B", "O": 1, "R": 1, "E": 1, "W": 1, "D": 3, "T": 10}
    ]
}"#;

#[test]
pub fn preemptive_memory_serves_the_urgent_job() {
    let (scheduler, _) = run(MEMORY_CONTENTION, 6, StopOn::never());
    assert_eq!(
        units(scheduler.log()),
        vec![
            ("A_0", "M", 0),
            ("B_1", "M", 1),
            ("B_1", "P0", 2),
            ("A_0", "M", 2),
            ("B_1", "M", 3),
            ("A_0", "P0", 3),
            ("A_0", "M", 4),
        ]
    );
    assert!(missed(scheduler.log()).is_empty());
}

#[test]
pub fn non_preemptive_memory_delays_the_urgent_job() {
    let json = MEMORY_CONTENTION.replace("\"True\"", "\"False\"");
    let (scheduler, _) = run(&json, 6, StopOn::never());
    assert_eq!(
        units(scheduler.log()),
        vec![
            ("A_0", "M", 0),
            ("A_0", "M", 1),
            ("B_1", "M", 2),
            ("A_0", "P0", 2),
            ("B_1", "P0", 3),
            ("A_0", "M", 3),
            ("B_1", "M", 4),
        ]
    );
    assert_eq!(missed(scheduler.log()), vec![("B_1", 4)]);
}
