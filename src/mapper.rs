//! Declarative job attributes and their mapping to scheduler jobs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::job::{Container, Job, Volume, DEFAULT_NETWORK, DEFAULT_VOLUME_MODE};

/// The attribute bag of a `chronos_job` resource.
///
/// Fields left out are zero valued. Only the first `container` block is honoured; the list
/// form exists so a job can declare no container at all. A container block needs a `type` and
/// an `image`: one with neither would read back from the scheduler as no container.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct JobAttributes {
    pub schedule: String,
    pub job_id: String,
    pub cpus: f64,
    pub mem: f64,
    pub disk: f64,
    pub uris: Vec<String>,
    pub command: String,
    pub env: BTreeMap<String, String>,
    pub container: Vec<ContainerAttributes>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerAttributes {
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default)]
    pub force_pull_image: bool,
    #[serde(default)]
    pub volume: Vec<VolumeAttributes>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VolumeAttributes {
    pub container_path: String,
    pub host_path: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_mode() -> String {
    DEFAULT_VOLUME_MODE.to_string()
}

pub fn to_job(attrs: &JobAttributes) -> Job {
    if attrs.container.len() > 1 {
        warn!(
            job = %attrs.job_id,
            declared = attrs.container.len(),
            "only the first container block is used"
        );
    }
    let container = attrs
        .container
        .first()
        .map(|c| Container {
            kind: c.kind.clone(),
            image: c.image.clone(),
            network: c.network.clone(),
            force_pull_image: c.force_pull_image,
            volumes: c
                .volume
                .iter()
                .map(|v| Volume {
                    container_path: v.container_path.clone(),
                    host_path: v.host_path.clone(),
                    mode: v.mode.clone(),
                })
                .collect(),
        })
        .unwrap_or_default();

    Job {
        schedule: attrs.schedule.clone(),
        name: attrs.job_id.clone(),
        cpus: attrs.cpus,
        mem: attrs.mem,
        disk: attrs.disk,
        uris: attrs.uris.clone(),
        container,
        command: attrs.command.clone(),
        env: attrs.env.clone(),
    }
}

pub fn from_job(job: &Job) -> JobAttributes {
    let container = if job.container.is_unset() {
        Vec::new()
    } else {
        let c = &job.container;
        vec![ContainerAttributes {
            kind: c.kind.clone(),
            image: c.image.clone(),
            network: c.network.clone(),
            force_pull_image: c.force_pull_image,
            volume: c
                .volumes
                .iter()
                .map(|v| VolumeAttributes {
                    container_path: v.container_path.clone(),
                    host_path: v.host_path.clone(),
                    mode: v.mode.clone(),
                })
                .collect(),
        }]
    };

    JobAttributes {
        schedule: job.schedule.clone(),
        job_id: job.name.clone(),
        cpus: job.cpus,
        mem: job.mem,
        disk: job.disk,
        uris: job.uris.clone(),
        command: job.command.clone(),
        env: job.env.clone(),
        container,
    }
}
