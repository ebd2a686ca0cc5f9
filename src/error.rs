use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode scheduler response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The scheduler answered with a status outside of 200..=299.
    #[error("received bad status code {status}: {body}")]
    RemoteRejected { status: u16, body: String },
    #[error("job {0} does not exist")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
