use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use anyhow::Context;
use tracing::info;

use crate::{
    client::SchedulerClient,
    manifest::{Manifest, ResourceName, StateFile},
    mapper::JobAttributes,
    resource::{self, ResourceState},
};

/// Difference between the declared jobs and the tracked ones.
#[derive(Debug, Default, PartialEq)]
pub struct Plan {
    /// Declared but not tracked.
    pub create: BTreeMap<ResourceName, JobAttributes>,
    /// Tracked with different attributes, desired attributes and the tracked state.
    pub replace: BTreeMap<ResourceName, (JobAttributes, TrackedJob)>,
    /// Tracked and unchanged, only re-read.
    pub refresh: BTreeMap<ResourceName, TrackedJob>,
    /// Tracked but no longer declared.
    pub delete: BTreeMap<ResourceName, TrackedJob>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedJob {
    pub id: String,
    pub attributes: JobAttributes,
}

impl Plan {
    pub fn new(desired: &Manifest, state: &StateFile) -> Self {
        let mut plan = Plan::default();

        for (name, current) in state.resources() {
            let ResourceState::Tracked { id, attributes } = current else {
                continue;
            };
            let tracked = TrackedJob {
                id: id.clone(),
                attributes: attributes.clone(),
            };
            match desired.job.get(name) {
                None => {
                    plan.delete.insert(name.clone(), tracked);
                }
                Some(want) if want == attributes => {
                    plan.refresh.insert(name.clone(), tracked);
                }
                Some(want) => {
                    plan.replace.insert(name.clone(), (want.clone(), tracked));
                }
            }
        }

        for (name, want) in &desired.job {
            if !state.get(name).map_or(false, ResourceState::is_tracked) {
                plan.create.insert(name.clone(), want.clone());
            }
        }

        plan
    }

    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.replace.is_empty() && self.delete.is_empty()
    }

    /// Refresh tracked resources from the scheduler, then diff against `desired`.
    ///
    /// Jobs removed behind our back are dropped from `state` and so planned for creation again.
    pub async fn refreshed(
        client: &SchedulerClient,
        desired: &Manifest,
        state: &mut StateFile,
    ) -> anyhow::Result<Self> {
        refresh(client, state).await?;
        Ok(Self::new(desired, state))
    }

    /// Execute the plan, recording each resource's outcome in `state` as soon as it is known.
    ///
    /// Every job that goes away, removed or renamed, is deleted before anything is written, so a
    /// job_id moved between resources is freed before it is recreated.
    pub async fn apply(&self, client: &SchedulerClient, state: &mut StateFile) -> anyhow::Result<()> {
        for (name, tracked) in &self.delete {
            info!(resource = %name, job = %tracked.id, "deleting");
            let after = resource::delete(client, &tracked.attributes)
                .await
                .with_context(|| format!("failed to delete {}", name))?;
            state.set(name, after)?;
        }

        for (name, (want, tracked)) in &self.replace {
            if tracked.id == want.job_id {
                continue;
            }
            info!(resource = %name, job = %tracked.id, renamed_to = %want.job_id, "deleting renamed job");
            let after = resource::delete(client, &tracked.attributes)
                .await
                .with_context(|| format!("failed to delete previous job of {}", name))?;
            state.set(name, after)?;
        }

        for (name, (want, _)) in &self.replace {
            info!(resource = %name, job = %want.job_id, "replacing");
            let after = resource::update(client, want)
                .await
                .with_context(|| format!("failed to update {}", name))?;
            state.set(name, after)?;
        }

        for (name, want) in &self.create {
            info!(resource = %name, job = %want.job_id, "creating");
            let after = resource::create(client, want)
                .await
                .with_context(|| format!("failed to create {}", name))?;
            state.set(name, after)?;
        }

        for (name, tracked) in &self.refresh {
            let after = resource::read(client, &tracked.id)
                .await
                .with_context(|| format!("failed to read {}", name))?;
            state.set(name, after)?;
        }

        Ok(())
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (name, want) in &self.create {
            writeln!(f, "+ {} (job {})", name, want.job_id)?;
        }
        for (name, (want, tracked)) in &self.replace {
            if want.job_id == tracked.id {
                writeln!(f, "~ {} (job {})", name, want.job_id)?;
            } else {
                writeln!(f, "~ {} (job {} -> {})", name, tracked.id, want.job_id)?;
            }
        }
        for (name, tracked) in &self.delete {
            writeln!(f, "- {} (job {})", name, tracked.id)?;
        }
        if self.is_noop() {
            writeln!(f, "no changes")?;
        }
        Ok(())
    }
}

/// Re-read every tracked resource, forgetting those that vanished remotely.
pub async fn refresh(client: &SchedulerClient, state: &mut StateFile) -> anyhow::Result<()> {
    let tracked: Vec<(ResourceName, String)> = state
        .resources()
        .iter()
        .filter_map(|(name, s)| s.id().map(|id| (name.clone(), id.to_string())))
        .collect();
    for (name, id) in tracked {
        let after = resource::read(client, &id)
            .await
            .with_context(|| format!("failed to read {}", name))?;
        if !after.is_tracked() {
            info!(resource = %name, job = %id, "job vanished remotely");
        }
        state.set(&name, after)?;
    }
    Ok(())
}

/// Delete every tracked resource.
pub async fn destroy(client: &SchedulerClient, state: &mut StateFile) -> anyhow::Result<()> {
    let tracked: Vec<(ResourceName, JobAttributes)> = state
        .resources()
        .iter()
        .filter_map(|(name, s)| s.attributes().map(|a| (name.clone(), a.clone())))
        .collect();
    for (name, attributes) in tracked {
        let after = resource::delete(client, &attributes)
            .await
            .with_context(|| format!("failed to delete {}", name))?;
        state.set(&name, after)?;
    }
    Ok(())
}
