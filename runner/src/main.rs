use anyhow::{Context, Result};
use log::info;

use rtsched::{Configuration, Scheduler, StopOn};
use rtsched_processor::{format_logs, format_repeated_states, Processor};

const DEMO: &str = r#"{
    "scheduler": "DM",
    "premption_processor": true,
    "premption_memory": true,
    "memory_use_processor": false,
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

fn main() -> Result<()> {
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let config = Configuration::from_json(DEMO).context("Invalid demo configuration")?;
    let max_time = config.horizon()?;
    info!(
        "{} tasks on {} resources, policy {}, up to {max_time} ticks",
        config.tasks.len(),
        config.resources.len(),
        config.policy
    );

    let mut scheduler = Scheduler::from_configuration(config);
    let stop = StopOn {
        repeated_state: true,
        missed_deadline: false,
    };
    let logs = Processor::run(&mut scheduler, max_time, stop).context("Simulation aborted")?;

    println!("{}", format_logs(&logs));
    println!(
        "{}",
        format_repeated_states(scheduler.tasks(), scheduler.repeated_states())
    );
    Ok(())
}

// Do not delete this line
#[cfg(test)]
mod tests;
