use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, info};

use crate::{
    config::{Credentials, ProviderConfig},
    error::{Result, SchedulerError},
    job::Job,
};

/// Authenticated client for the scheduler's job endpoints.
///
/// Holds no mutable state, clones are cheap and may be used from any number of tasks at once.
#[derive(Debug, Clone)]
pub struct SchedulerClient {
    http: reqwest::Client,
    base: Url,
    credentials: Credentials,
}

impl SchedulerClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: config.url.as_url().clone(),
            credentials: config.credentials.clone(),
        }
    }

    pub fn create_url(&self) -> Url {
        self.endpoint(&["scheduler", "iso8601"])
    }

    pub fn jobs_url(&self) -> Url {
        self.endpoint(&["scheduler", "jobs"])
    }

    pub fn job_url(&self, name: &str) -> Url {
        self.endpoint(&["scheduler", "job", name])
    }

    /// Create or overwrite a job.
    pub async fn create_job(&self, job: &Job) -> Result<()> {
        info!(job = %job.name, "creating job");
        let response = self
            .request(Method::POST, self.create_url())
            .json(job)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Fetch the full job list and pick out the job named `name`.
    pub async fn get_job(&self, name: &str) -> Result<Job> {
        debug!(job = %name, "reading job");
        let response = self.request(Method::GET, self.jobs_url()).send().await?;
        let body = ensure_success(response).await?.bytes().await?;
        let jobs: Vec<Job> = serde_json::from_slice(&body)?;
        debug!(count = jobs.len(), "scheduler returned jobs");
        jobs.into_iter()
            .find(|job| job.name == name)
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }

    /// Delete the job named `name`; the status code alone decides the outcome.
    pub async fn delete_job(&self, name: &str) -> Result<()> {
        info!(job = %name, "deleting job");
        let response = self
            .request(Method::DELETE, self.job_url(name))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(self.credentials.user(), Some(self.credentials.password()))
    }

    /// Appends path segments to the base url, keeping any prefix it already carries.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // SchedulerUrl guarantees the base can carry a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

pub fn is_success(status: StatusCode) -> bool {
    (200..300).contains(&status.as_u16())
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if is_success(status) {
        return Ok(response);
    }
    // the body is only a hint for the operator, losing it is fine
    let body = response.text().await.unwrap_or_default();
    Err(SchedulerError::RemoteRejected {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> SchedulerClient {
        SchedulerClient::new(&ProviderConfig {
            url: url.parse().unwrap(),
            credentials: Credentials::new("user", "secret"),
        })
    }

    #[test]
    fn status_codes() {
        for code in [200, 201, 204, 299] {
            assert!(is_success(StatusCode::from_u16(code).unwrap()), "{code}");
        }
        for code in [199, 300, 404, 500] {
            assert!(!is_success(StatusCode::from_u16(code).unwrap()), "{code}");
        }
    }

    #[test]
    fn endpoints() {
        let c = client("http://chronos:4400");
        assert_eq!(c.create_url().as_str(), "http://chronos:4400/scheduler/iso8601");
        assert_eq!(c.jobs_url().as_str(), "http://chronos:4400/scheduler/jobs");
        assert_eq!(
            c.job_url("nightly").as_str(),
            "http://chronos:4400/scheduler/job/nightly"
        );
    }

    #[test]
    fn endpoints_keep_base_path() {
        for base in ["https://mesos.example.com/chronos", "https://mesos.example.com/chronos/"] {
            let c = client(base);
            assert_eq!(
                c.jobs_url().as_str(),
                "https://mesos.example.com/chronos/scheduler/jobs"
            );
        }
    }

    #[test]
    fn job_names_are_a_single_segment() {
        let c = client("http://chronos:4400");
        assert_eq!(
            c.job_url("a b/c").as_str(),
            "http://chronos:4400/scheduler/job/a%20b%2Fc"
        );
    }

    #[test]
    fn client_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone + 'static>() {}
        assert_send_sync::<SchedulerClient>();
    }
}
