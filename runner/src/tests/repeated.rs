use pretty_assertions::assert_eq;
use rtsched::{StopOn, StopReason};
use rtsched_processor::format_repeated_states;

use super::{configuration, run};

const OFFSET_TRIPLES: &str = r#"{
    "nb_processors": 1,
    "tasks": [
        {"Name": "T1", "O": 4, "R": 2, "E": 2, "W": 1, "D": 9, "T": 10},
        {"Name": "T2", "O": 3, "R": 2, "E": 2, "W": 1, "D": 10, "T": 10}
    ]
}"#;

#[test]
pub fn states_repeat_after_one_period() {
    let horizon = configuration(OFFSET_TRIPLES).horizon().unwrap();
    assert_eq!(horizon, 24);

    let (scheduler, _) = run(OFFSET_TRIPLES, horizon, StopOn::never());
    let pairs: Vec<(usize, usize)> = scheduler
        .repeated_states()
        .iter()
        .map(|repeat| (repeat.previous_time, repeat.current_time))
        .collect();
    assert_eq!(pairs.first(), Some(&(4, 14)));
    assert!(pairs.iter().all(|(previous, current)| current - previous == 10));

    let first = &scheduler.repeated_states()[0];
    assert_eq!(first.previous, first.current);
    assert!(first.current.is_warm());
}

#[test]
pub fn nothing_repeats_before_every_task_started() {
    let (scheduler, _) = run(OFFSET_TRIPLES, 14, StopOn::never());
    assert!(scheduler.repeated_states().is_empty());
}

#[test]
pub fn run_stops_at_the_first_repeat() {
    let (scheduler, logs) = run(OFFSET_TRIPLES, 24, StopOn::any());
    assert_eq!(scheduler.time(), 15);
    assert_eq!(
        logs.last().and_then(|log| log.stop_reason.clone()),
        Some(StopReason::RepeatedState {
            previous: 4,
            current: 14,
        })
    );
}

#[test]
pub fn repeated_states_are_printed_side_by_side() {
    let (scheduler, _) = run(OFFSET_TRIPLES, 15, StopOn::never());
    assert_eq!(
        format_repeated_states(scheduler.tasks(), scheduler.repeated_states()),
        "===== Repeated: 4 / 14 =====\n\
         NAME\t4_CLOCK\t4_REMAINING\t14_CLOCK\t14_REMAINING\n\
         T1\t0\t5\t0\t5\n\
         T2\t1\t4\t1\t4\n\
         CPU0\t-\t-\t-\t-\n\
         \n"
    );
}
