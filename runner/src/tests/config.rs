use pretty_assertions::assert_eq;
use rtsched::{
    deadline_monotonic, earliest_deadline_first, ConfigError, Configuration, Descriptor, Policy,
    ResourceSet, Scheduler, StopOn, Switches, TaskSet,
};
use rtsched_processor::{format_logs, Processor};

use super::{configuration, run, units};

const TRIPLE_AND_SINGLE: &str = r#"{
    "max_time": 30,
    "scheduler": "EDF",
    "premption_processor": "False",
    "nb_processors": 1,
    "tasks": [
        {"Name": "T1", "O": 0, "R": 1, "E": 3, "W": 1, "D": 9, "T": 10},
        {"Name": "T2", "O": 2, "C": 2, "D": 5, "T": 5}
    ]
}"#;

#[test]
pub fn reloaded_configuration_produces_the_same_trace() {
    let config = configuration(TRIPLE_AND_SINGLE);
    assert_eq!(config.horizon().unwrap(), 30);
    let json = config.to_json().unwrap();

    let (_, first) = run(TRIPLE_AND_SINGLE, 30, StopOn::never());
    let (_, reloaded) = run(&json, 30, StopOn::never());
    assert_eq!(format_logs(&first), format_logs(&reloaded));
    assert_eq!(first, reloaded);
}

#[test]
pub fn picks_a_configuration_out_of_a_list() {
    let document = format!(
        r#"[
            {TRIPLE_AND_SINGLE},
            {{"nb_processors": 2, "tasks": [{{"Name": "X", "O": 1, "C": 1, "D": 2, "T": 2}}]}}
        ]"#
    );
    let config = Configuration::from_json_at(&document, 1).unwrap();
    assert_eq!(config.policy, Policy::DeadlineMonotonic);
    assert_eq!(config.horizon().unwrap(), 5);

    let mut scheduler = Scheduler::from_configuration(config);
    let logs = Processor::run(&mut scheduler, 5, StopOn::never()).unwrap();
    assert_eq!(logs.len(), 5);
    assert_eq!(
        units(scheduler.log()),
        vec![("X_1", "P0", 1), ("X_3", "P0", 3)]
    );

    assert!(matches!(
        Configuration::from_json_at(&document, 3),
        Err(ConfigError::IndexOutOfRange { index: 3, count: 2 })
    ));
}

#[test]
pub fn typed_schedulers_ignore_the_policy_field() {
    let descriptor: Descriptor = configuration(TRIPLE_AND_SINGLE).to_descriptor();
    let mut dm = deadline_monotonic(
        TaskSet::new(vec![]).unwrap(),
        ResourceSet::with_processors(1),
        Switches::default(),
    );
    dm.configure_from_descriptor(&descriptor).unwrap();
    dm.run(10, StopOn::never()).unwrap();

    let mut edf = earliest_deadline_first(
        TaskSet::new(vec![]).unwrap(),
        ResourceSet::with_processors(1),
        Switches::default(),
    );
    edf.configure_from_descriptor(&descriptor).unwrap();
    edf.run(10, StopOn::never()).unwrap();

    let (generic, _) = run(TRIPLE_AND_SINGLE, 10, StopOn::never());
    assert_eq!(edf.log(), generic.log());
    assert_eq!(dm.switches(), edf.switches());
    assert!(!dm.switches().preempt_processor);
}

#[test]
pub fn broken_documents_are_reported() {
    let malformed = Configuration::from_json("{\"tasks\": [").unwrap_err();
    assert!(matches!(malformed, ConfigError::Malformed(_)));

    let unknown = Configuration::from_json(
        r#"{"scheduler": "RM", "nb_processors": 1, "tasks": []}"#,
    )
    .unwrap_err();
    assert_eq!(unknown.to_string(), ConfigError::UnknownPolicy("RM".to_string()).to_string());
}
