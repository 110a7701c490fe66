use crate::ResourceType;

/// A task set, resource set or descriptor that cannot be simulated.
///
/// These are raised while building a configuration, before any tick runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed descriptor: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("task {task}: no phase shape given (expected C, Phases or R/E/W)")]
    MissingPhases { task: String },

    #[error("task {task}: conflicting phase shapes ({shapes})")]
    ConflictingPhases { task: String, shapes: String },

    #[error("task {task}: incomplete R/E/W triple")]
    IncompleteTriple { task: String },

    #[error("task {task}: {field} must be positive")]
    NotPositive { task: String, field: &'static str },

    #[error("duplicate task name `{0}`")]
    DuplicateTask(String),

    #[error("duplicate resource name `{0}`")]
    DuplicateResource(String),

    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    #[error("no processor count or resource list given")]
    MissingResources,

    #[error("invalid value `{value}` for switch `{field}` (expected a boolean, \"True\" or \"False\")")]
    InvalidSwitch { field: &'static str, value: String },

    #[error("unknown scheduling policy `{0}`")]
    UnknownPolicy(String),

    #[error("configuration index {index} out of range ({count} available)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("hyperperiod of the task set overflows, give max_time explicitly")]
    HorizonOverflow,
}

/// Errors returned by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A phase was matched to a resource of an incompatible type.
    ///
    /// This aborts the run: either the matching is wrong or the resource set
    /// cannot serve the task.
    #[error(
        "task {task} job {activation} phase {phase} needs {required} but was matched to {resource} ({found})"
    )]
    ResourceMismatch {
        task: String,
        activation: usize,
        phase: usize,
        required: ResourceType,
        resource: String,
        found: ResourceType,
    },
}
