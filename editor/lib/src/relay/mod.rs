pub mod client;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use shared::{RunCodeRequest, RunCodeResponse};
use thiserror::Error;

pub use client::HttpRelay;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayClientError {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Server(String),
    #[error("unexpected response from relay: {0}")]
    Malformed(String),
}

/// The two calls the editor makes to the relay server.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn run_code(&self, request: &RunCodeRequest) -> Result<RunCodeResponse, RelayClientError>;
    async fn chat(&self, message: &str) -> Result<String, RelayClientError>;
}
