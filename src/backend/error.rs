use thiserror::Error;

/// Failure of a single backend endpoint. Never escapes the channel that issued the request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("could not decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
