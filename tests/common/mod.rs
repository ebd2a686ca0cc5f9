//! An in-process stand-in for the Chronos REST api.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chronos_provider::{
    client::SchedulerClient,
    config::ProviderConfig,
};
use serde_json::Value;
use tokio::net::TcpListener;

pub const USER: &str = "user";
pub const PASSWORD: &str = "secret";
/// base64 of "user:secret"
pub const EXPECTED_AUTH: &str = "Basic dXNlcjpzZWNyZXQ=";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct Inner {
    jobs: Vec<Value>,
    requests: Vec<Recorded>,
    /// answer every request with this status instead of handling it
    reject_with: Option<StatusCode>,
    /// answer the job list with this raw body
    list_body: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeChronos {
    inner: Arc<Mutex<Inner>>,
}

impl FakeChronos {
    pub fn with_jobs(jobs: Vec<Value>) -> Self {
        let fake = Self::default();
        fake.inner.lock().unwrap().jobs = jobs;
        fake
    }

    pub fn jobs(&self) -> Vec<Value> {
        self.inner.lock().unwrap().jobs.clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn reject_with(&self, status: u16) {
        self.inner.lock().unwrap().reject_with = Some(StatusCode::from_u16(status).unwrap());
    }

    pub fn list_body(&self, body: &str) {
        self.inner.lock().unwrap().list_body = Some(body.to_string());
    }

    /// Serve on an ephemeral port under `prefix` and return a client pointed at it.
    pub async fn serve(&self, prefix: &str) -> (SchedulerClient, SocketAddr) {
        let api = Router::new()
            .route("/scheduler/iso8601", post(create_job))
            .route("/scheduler/jobs", get(list_jobs))
            .route("/scheduler/job/:name", delete(delete_job))
            .with_state(self.clone());
        let app = if prefix.is_empty() {
            api
        } else {
            Router::new().nest(prefix, api)
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config =
            ProviderConfig::new(&format!("http://{}{}", addr, prefix), USER, PASSWORD).unwrap();
        let client = SchedulerClient::new(&config);
        (client, addr)
    }

    /// Record the request and return the forced status, if any.
    fn record(&self, method: &str, path: String, headers: &HeaderMap) -> Option<StatusCode> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(Recorded {
            method: method.to_string(),
            path,
            authorization: header("authorization"),
            content_type: header("content-type"),
        });
        inner.reject_with
    }
}

async fn create_job(
    State(fake): State<FakeChronos>,
    headers: HeaderMap,
    Json(job): Json<Value>,
) -> Response {
    if let Some(status) = fake.record("POST", "/scheduler/iso8601".into(), &headers) {
        return (status, "rejected").into_response();
    }
    let mut inner = fake.inner.lock().unwrap();
    // like chronos, a job with an existing name replaces it
    inner.jobs.retain(|j| j["name"] != job["name"]);
    inner.jobs.push(job);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_jobs(State(fake): State<FakeChronos>, headers: HeaderMap) -> Response {
    if let Some(status) = fake.record("GET", "/scheduler/jobs".into(), &headers) {
        return (status, "rejected").into_response();
    }
    let inner = fake.inner.lock().unwrap();
    match &inner.list_body {
        Some(body) => (StatusCode::OK, body.clone()).into_response(),
        None => Json(inner.jobs.clone()).into_response(),
    }
}

async fn delete_job(
    State(fake): State<FakeChronos>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(status) = fake.record("DELETE", format!("/scheduler/job/{}", name), &headers) {
        return (status, "rejected").into_response();
    }
    let mut inner = fake.inner.lock().unwrap();
    let before = inner.jobs.len();
    inner.jobs.retain(|j| j["name"] != name.as_str());
    if inner.jobs.len() == before {
        StatusCode::BAD_REQUEST.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}
