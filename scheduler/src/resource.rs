use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// The kind of a schedulable unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Processor,
    Memory,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Processor => write!(f, "Processor"),
            ResourceType::Memory => write!(f, "Memory"),
        }
    }
}

/// Index of a resource inside its [`ResourceSet`].
///
/// Indices follow the configuration order, which is also the order in which
/// the pool is searched when matching jobs to resources.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    kind: ResourceType,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: ResourceType) -> Resource {
        Resource {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// One row of the resource table handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: ResourceType,
}

/// The resources available to the scheduler, in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet {
    resources: Vec<Resource>,
}

impl ResourceSet {
    /// `count` processors named `P0`, `P1`, ... followed by a single memory
    /// unit named `M`.
    pub fn with_processors(count: usize) -> ResourceSet {
        let mut resources: Vec<Resource> = (0..count)
            .map(|p| Resource::new(format!("P{p}"), ResourceType::Processor))
            .collect();
        resources.push(Resource::new("M", ResourceType::Memory));
        ResourceSet { resources }
    }

    pub fn from_descriptors(descriptors: &[ResourceDescriptor]) -> Result<ResourceSet, ConfigError> {
        let mut resources: Vec<Resource> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if resources.iter().any(|r| r.name == descriptor.name) {
                return Err(ConfigError::DuplicateResource(descriptor.name.clone()));
            }
            resources.push(Resource::new(descriptor.name.clone(), descriptor.kind));
        }
        Ok(ResourceSet { resources })
    }

    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn lookup(&self, name: &str) -> Result<ResourceId, ConfigError> {
        self.resources
            .iter()
            .position(|r| r.name == name)
            .map(ResourceId)
            .ok_or_else(|| ConfigError::UnknownResource(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i), r))
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> {
        (0..self.resources.len()).map(ResourceId)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn processors(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.iter()
            .filter(|(_, r)| r.kind == ResourceType::Processor)
    }

    /// The `(Name, Type)` relation.
    pub fn rows(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .map(|r| ResourceDescriptor {
                name: r.name.clone(),
                kind: r.kind,
            })
            .collect()
    }
}

impl Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resources:")?;
        for resource in &self.resources {
            writeln!(f, "\t{resource}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn processors_then_one_memory() {
        let set = ResourceSet::with_processors(2);
        let names: Vec<&str> = set.iter().map(|(_, r)| r.name()).collect();
        assert_eq!(names, vec!["P0", "P1", "M"]);
        assert_eq!(set.processors().count(), 2);
        assert_eq!(set.get(set.lookup("M").unwrap()).kind(), ResourceType::Memory);
    }

    #[test]
    fn explicit_list_keeps_order() {
        let rows: Vec<ResourceDescriptor> = serde_json::from_str(
            r#"[{"Name": "M1", "Type": "Memory"}, {"Name": "P1", "Type": "Processor"}]"#,
        )
        .unwrap();
        let set = ResourceSet::from_descriptors(&rows).unwrap();
        assert_eq!(set.lookup("P1").unwrap().index(), 1);
        assert_eq!(set.rows()[0].kind, ResourceType::Memory);
    }

    #[test]
    fn duplicate_and_unknown_names_are_rejected() {
        let duplicate = vec![
            ResourceDescriptor { name: "P".into(), kind: ResourceType::Processor },
            ResourceDescriptor { name: "P".into(), kind: ResourceType::Memory },
        ];
        assert!(matches!(
            ResourceSet::from_descriptors(&duplicate),
            Err(ConfigError::DuplicateResource(name)) if name == "P"
        ));
        assert!(matches!(
            ResourceSet::with_processors(1).lookup("P7"),
            Err(ConfigError::UnknownResource(_))
        ));
    }

    #[test]
    fn unknown_type_tag_does_not_parse() {
        let parsed = serde_json::from_str::<ResourceDescriptor>(r#"{"Name": "X", "Type": "Disk"}"#);
        assert!(parsed.is_err());
    }
}
