//! Configuration documents.
//!
//! A document is a JSON object (or an array of them) of the form:
//!
//! ```json
//! {
//!     "max_time": 40,
//!     "scheduler": "DM",
//!     "premption_processor": "True",
//!     "premption_memory": true,
//!     "memory_use_processor": false,
//!     "nb_processors": 1,
//!     "tasks": [
//!         {"Name": "T1", "O": 0, "C": 2, "D": 5, "T": 6},
//!         {"Name": "T2", "O": 1, "R": 1, "E": 1, "W": 1, "D": 4, "T": 9}
//!     ]
//! }
//! ```
//!
//! `nb_processors` may also be a list of `{"Name", "Type"}` resources; a
//! `resources` list is accepted when `nb_processors` is absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConfigError, Policy, ResourceDescriptor, ResourceSet, ResourceType, TaskDescriptor, TaskSet};

/// Global scheduling switches.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Switches {
    pub preempt_processor: bool,
    pub preempt_memory: bool,
    /// Memory phases also occupy a processor.
    pub memory_use_processor: bool,
}

impl Default for Switches {
    fn default() -> Self {
        Switches {
            preempt_processor: true,
            preempt_memory: true,
            memory_use_processor: false,
        }
    }
}

impl Switches {
    pub fn preemptive(&self, kind: ResourceType) -> bool {
        match kind {
            ResourceType::Processor => self.preempt_processor,
            ResourceType::Memory => self.preempt_memory,
        }
    }
}

/// A boolean switch as written in a document: `true` or `"True"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Switch {
    Flag(bool),
    Text(String),
}

impl Switch {
    fn resolve(field: &'static str, switch: &Option<Switch>, default: bool) -> Result<bool, ConfigError> {
        match switch {
            None => Ok(default),
            Some(Switch::Flag(flag)) => Ok(*flag),
            Some(Switch::Text(text)) => match text.as_str() {
                "True" => Ok(true),
                "False" => Ok(false),
                _ => Err(ConfigError::InvalidSwitch {
                    field,
                    value: text.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Processors {
    Count(usize),
    List(Vec<ResourceDescriptor>),
}

/// The serialized form of a [`Configuration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premption_processor: Option<Switch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premption_memory: Option<Switch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_use_processor: Option<Switch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nb_processors: Option<Processors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceDescriptor>>,
    pub tasks: Vec<TaskDescriptor>,
}

impl Descriptor {
    pub fn switches(&self) -> Result<Switches, ConfigError> {
        let defaults = Switches::default();
        Ok(Switches {
            preempt_processor: Switch::resolve(
                "premption_processor",
                &self.premption_processor,
                defaults.preempt_processor,
            )?,
            preempt_memory: Switch::resolve(
                "premption_memory",
                &self.premption_memory,
                defaults.preempt_memory,
            )?,
            memory_use_processor: Switch::resolve(
                "memory_use_processor",
                &self.memory_use_processor,
                defaults.memory_use_processor,
            )?,
        })
    }

    pub fn resource_set(&self) -> Result<ResourceSet, ConfigError> {
        match (&self.nb_processors, &self.resources) {
            (Some(Processors::Count(count)), _) => Ok(ResourceSet::with_processors(*count)),
            (Some(Processors::List(list)), _) | (None, Some(list)) => {
                ResourceSet::from_descriptors(list)
            }
            (None, None) => Err(ConfigError::MissingResources),
        }
    }

    pub fn task_set(&self) -> Result<TaskSet, ConfigError> {
        TaskSet::from_descriptors(&self.tasks)
    }

    pub fn policy(&self) -> Result<Policy, ConfigError> {
        self.scheduler
            .as_deref()
            .map_or(Ok(Policy::default()), str::parse)
    }
}

/// Everything needed to set up a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub tasks: TaskSet,
    pub resources: ResourceSet,
    pub switches: Switches,
    pub policy: Policy,
    pub max_time: Option<usize>,
}

impl Configuration {
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Configuration, ConfigError> {
        Ok(Configuration {
            tasks: descriptor.task_set()?,
            resources: descriptor.resource_set()?,
            switches: descriptor.switches()?,
            policy: descriptor.policy()?,
            max_time: descriptor.max_time,
        })
    }

    /// Parses a document holding a single configuration.
    pub fn from_json(text: &str) -> Result<Configuration, ConfigError> {
        Configuration::from_json_at(text, 0)
    }

    /// Parses the `index`-th configuration of a document. A document holding
    /// a single object only has index 0.
    pub fn from_json_at(text: &str, index: usize) -> Result<Configuration, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        let selected = match value {
            Value::Array(mut list) => {
                let count = list.len();
                if index >= count {
                    return Err(ConfigError::IndexOutOfRange { index, count });
                }
                list.swap_remove(index)
            }
            single if index == 0 => single,
            _ => return Err(ConfigError::IndexOutOfRange { index, count: 1 }),
        };
        let descriptor: Descriptor = serde_json::from_value(selected)?;
        Configuration::from_descriptor(&descriptor)
    }

    /// Tasks are written in explicit phase form and resources as a list, so
    /// reloading the descriptor yields the same configuration.
    pub fn to_descriptor(&self) -> Descriptor {
        Descriptor {
            max_time: self.max_time,
            scheduler: Some(self.policy.to_string()),
            premption_processor: Some(Switch::Flag(self.switches.preempt_processor)),
            premption_memory: Some(Switch::Flag(self.switches.preempt_memory)),
            memory_use_processor: Some(Switch::Flag(self.switches.memory_use_processor)),
            nb_processors: Some(Processors::List(self.resources.rows())),
            resources: None,
            tasks: self.tasks.to_descriptors(),
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.to_descriptor())?)
    }

    /// The configured `max_time`, or two hyperperiods past the latest offset.
    pub fn horizon(&self) -> Result<usize, ConfigError> {
        match self.max_time {
            Some(max_time) => Ok(max_time),
            None => self.tasks.horizon().ok_or(ConfigError::HorizonOverflow),
        }
    }
}
