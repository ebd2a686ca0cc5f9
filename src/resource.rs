//! Lifecycle callbacks for a single `chronos_job` resource.
//!
//! Update is a full re-create: the scheduler's create endpoint overwrites a job of the same name.
//! No call is ever retried.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    client::SchedulerClient,
    error::{Result, SchedulerError},
    mapper::{from_job, to_job, JobAttributes},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResourceState {
    /// Nothing is known to exist remotely.
    Unmanaged,
    /// `id` is the scheduler's job name, `attributes` the last state read back from it.
    Tracked { id: String, attributes: JobAttributes },
}

impl ResourceState {
    pub fn id(&self) -> Option<&str> {
        match self {
            ResourceState::Unmanaged => None,
            ResourceState::Tracked { id, .. } => Some(id),
        }
    }

    pub fn attributes(&self) -> Option<&JobAttributes> {
        match self {
            ResourceState::Unmanaged => None,
            ResourceState::Tracked { attributes, .. } => Some(attributes),
        }
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, ResourceState::Tracked { .. })
    }
}

/// Submit the job then read it straight back so the tracked attributes reflect the scheduler.
pub async fn create(client: &SchedulerClient, desired: &JobAttributes) -> Result<ResourceState> {
    let job = to_job(desired);
    client.create_job(&job).await?;
    read(client, &job.name).await
}

pub async fn update(client: &SchedulerClient, desired: &JobAttributes) -> Result<ResourceState> {
    create(client, desired).await
}

/// A job that vanished remotely is not an error, the resource just stops being tracked.
pub async fn read(client: &SchedulerClient, id: &str) -> Result<ResourceState> {
    match client.get_job(id).await {
        Ok(job) if job.name.is_empty() => {
            warn!(job = %id, "scheduler returned a job without a name");
            Ok(ResourceState::Unmanaged)
        }
        Ok(job) => Ok(ResourceState::Tracked {
            id: job.name.clone(),
            attributes: from_job(&job),
        }),
        Err(SchedulerError::NotFound(_)) => {
            info!(job = %id, "job no longer exists");
            Ok(ResourceState::Unmanaged)
        }
        Err(e) => Err(e),
    }
}

/// Issues the delete whether or not the job is known to exist; the status code decides.
pub async fn delete(client: &SchedulerClient, current: &JobAttributes) -> Result<ResourceState> {
    let job = to_job(current);
    client.delete_job(&job.name).await?;
    Ok(ResourceState::Unmanaged)
}
