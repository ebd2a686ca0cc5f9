use std::{
    collections::{BTreeMap, HashMap},
    fmt::{Display, Formatter},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{mapper::JobAttributes, resource::ResourceState};

/// The name a resource is declared under, distinct from the job name it manages.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Desired jobs, read from a toml file of `[job.<name>]` tables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub job: BTreeMap<ResourceName, JobAttributes>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let manifest = std::fs::read_to_string(path).with_context(|| {
            format!("failed to read manifest at {}", path.to_string_lossy())
        })?;
        Self::parse(&manifest)
            .with_context(|| format!("invalid manifest at {}", path.to_string_lossy()))
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let manifest: Manifest = toml::from_str(s)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// job_id is the remote identifier so it must be present and unique
    fn validate(&self) -> anyhow::Result<()> {
        let mut seen: HashMap<&str, &ResourceName> = HashMap::new();
        for (name, attrs) in &self.job {
            anyhow::ensure!(!attrs.job_id.is_empty(), "job {} has no job_id", name);
            for container in &attrs.container {
                anyhow::ensure!(
                    !container.kind.is_empty(),
                    "container of job {} has an empty type",
                    name
                );
                anyhow::ensure!(
                    !container.image.is_empty(),
                    "container of job {} has an empty image",
                    name
                );
            }
            if let Some(other) = seen.insert(attrs.job_id.as_str(), name) {
                anyhow::bail!(
                    "jobs {} and {} both manage job_id {}",
                    other,
                    name,
                    attrs.job_id
                );
            }
        }
        Ok(())
    }
}

/// Tracked resources, persisted as json between runs.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    resources: BTreeMap<ResourceName, ResourceState>,
}

impl StateFile {
    /// A missing file is an empty state.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let resources = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| {
                format!("failed to parse state file at {}", path.to_string_lossy())
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read state file at {}", path.to_string_lossy())
                })
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            resources,
        })
    }

    pub fn resources(&self) -> &BTreeMap<ResourceName, ResourceState> {
        &self.resources
    }

    pub fn get(&self, name: &ResourceName) -> Option<&ResourceState> {
        self.resources.get(name)
    }

    /// Record the state of a resource and write the file. Unmanaged resources are forgotten.
    pub fn set(&mut self, name: &ResourceName, state: ResourceState) -> anyhow::Result<()> {
        match state {
            ResourceState::Unmanaged => {
                self.resources.remove(name);
            }
            tracked => {
                self.resources.insert(name.clone(), tracked);
            }
        }
        self.save()
    }

    fn save(&self) -> anyhow::Result<()> {
        let tmp = self.path.with_extension("tmp");
        let js = serde_json::to_vec_pretty(&self.resources)?;
        std::fs::write(&tmp, js)
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        std::fs::rename(&tmp, &self.path).with_context(|| {
            format!("failed to replace state file {}", self.path.to_string_lossy())
        })?;
        Ok(())
    }
}
