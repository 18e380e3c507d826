//! Shared HTTP plumbing for the provider clients

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::error::ProviderFailure;
use crate::retry::RetryError;

const USER_AGENT: &str = concat!("MapRoute/", env!("CARGO_PKG_VERSION"));

/// Failure of a single provider call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}")]
    Status { status: u16 },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl CallError {
    /// Timeouts, connection problems, 429 and 5xx are worth another try
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            CallError::Timeout | CallError::Transport(_) => true,
            CallError::Status { status } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..600).contains(status)
            }
            CallError::Decode(_) => false,
        }
    }

    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            CallError::Timeout
        } else if error.is_decode() {
            CallError::Decode(error.to_string())
        } else {
            CallError::Transport(error.to_string())
        }
    }
}

impl RetryError<CallError> {
    /// Collapse a retried call failure into the client-level failure class
    #[must_use]
    pub fn failure(&self) -> ProviderFailure {
        match self {
            RetryError::Rejected {
                error: CallError::Status { status: 404 },
                ..
            } => ProviderFailure::NotFound,
            RetryError::Rejected {
                error: CallError::Decode(_),
                ..
            } => ProviderFailure::BadResponse,
            RetryError::Rejected { .. }
            | RetryError::Exhausted { .. }
            | RetryError::BudgetExceeded { .. } => ProviderFailure::ProviderUnavailable,
        }
    }
}

/// Build the pooled HTTP client a provider client reuses across requests
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .with_context(|| "Failed to create HTTP client")
}

/// GET `url` and decode a JSON body, classifying every failure
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, CallError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CallError::from_reqwest(&e))?;

    let status = response.status();
    debug!("HTTP response received: {}", status);
    if !status.is_success() {
        return Err(CallError::Status {
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| CallError::from_reqwest(&e))?;
    serde_json::from_slice(&body).map_err(|e| CallError::Decode(e.to_string()))
}

/// Strip the API key from a provider URL before it reaches the logs
#[must_use]
pub fn redact_key(url: &str) -> String {
    url.split('&')
        .map(|part| match part.split_once("key=") {
            Some((prefix, _)) if prefix.is_empty() || prefix.ends_with('?') => {
                format!("{prefix}key=***")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}
