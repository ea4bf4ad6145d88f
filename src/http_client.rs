use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Failure of a call to an external service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing credential: set {0} in the environment or the secret store")]
    MissingCredential(String),
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

// Transport errors never carry the request URL.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.without_url())
    }
}

impl ApiError {
    pub fn missing_credential(name: impl Into<String>) -> Self {
        ApiError::MissingCredential(name.into())
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, ApiError> {
    let timeout = if timeout_secs == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        timeout_secs
    };
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?)
}

/// Turn a non-2xx response into [`ApiError::Status`] and decode the rest.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
}
