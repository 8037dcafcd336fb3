pub mod client;
pub mod output;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, trace, warn};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::ExecutionReport;
use thiserror::Error;

use crate::{config::Judge0Config, languages::LanguageRegistry};

pub use client::Judge0Client;

pub const STATUS_IN_QUEUE: u8 = 1;
pub const STATUS_PROCESSING: u8 = 2;
pub const STATUS_ACCEPTED: u8 = 3;

#[derive(Error, Debug)]
pub enum Judge0Error {
    #[error("JUDGE0_API_KEY not configured")]
    MissingApiKey,
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("failed to reach the execution service: {0}")]
    Transport(String),
    #[error("execution service answered {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed execution service response: {0}")]
    MalformedResponse(String),
    #[error("Execution failed.")]
    ExecutionFailed(Box<SubmissionResult>),
    #[error("Execution timed out after {polls} polls")]
    Timeout { polls: u32 },
}

/// Body of a submission creation request, payloads already base64 encoded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Submission {
    pub language_id: u32,
    pub source_code: String,
    pub stdin: String,
}

impl Submission {
    pub fn new(language_id: u32, source_code: &str, stdin: Option<&str>) -> Self {
        Submission {
            language_id,
            source_code: output::encode(source_code),
            stdin: stdin
                .filter(|stdin| !stdin.is_empty())
                .map(output::encode)
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionStatus {
    pub id: u8,
    #[serde(default)]
    pub description: String,
}

impl SubmissionStatus {
    /// Only queued and processing submissions are still waiting for a result.
    pub fn is_pending(&self) -> bool {
        matches!(self.id, STATUS_IN_QUEUE | STATUS_PROCESSING)
    }
}

/// A submission as returned by the poll endpoint.
///
/// Fields this relay does not interpret are kept in `extra` so the raw payload
/// can be handed back for diagnostics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionResult {
    /// Build the report of an accepted submission, decoding every stream.
    pub fn report(&self) -> ExecutionReport {
        ExecutionReport {
            stdout: self.stdout.as_deref().map(output::decode_stdout),
            stderr: self.stderr.as_deref().map(output::decode_stream),
            compile_output: self.compile_output.as_deref().map(output::decode_stream),
            time: self.time.clone(),
            memory: self.memory,
        }
    }
}

/// Transport to the execution service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubmissionApi: Send + Sync {
    /// Create an asynchronous submission and return its token.
    async fn create(&self, api_key: &str, submission: &Submission) -> Result<String, Judge0Error>;
    /// Fetch the current state of the submission behind `token`.
    async fn fetch(&self, api_key: &str, token: &str) -> Result<SubmissionResult, Judge0Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: u32,
}

impl From<&Judge0Config> for PollSettings {
    fn from(config: &Judge0Config) -> Self {
        PollSettings {
            interval: config.poll_interval(),
            max_polls: config.max_polls.max(1),
        }
    }
}

/// Poll `token` until its status leaves queued/processing.
///
/// Polls are strictly sequential and every non-terminal poll is followed by a
/// wait of `settings.interval`. After `settings.max_polls` non-terminal polls
/// the submission is abandoned with [`Judge0Error::Timeout`].
pub async fn wait_for_result(
    api: &dyn SubmissionApi,
    api_key: &str,
    token: &str,
    settings: &PollSettings,
) -> Result<SubmissionResult, Judge0Error> {
    let mut polls = 0;
    loop {
        let result = api.fetch(api_key, token).await?;
        polls += 1;
        debug!(
            "Submission {} status after poll {}: {} ({})",
            token, polls, result.status.id, result.status.description
        );

        if !result.status.is_pending() {
            return Ok(result);
        }

        if polls >= settings.max_polls {
            warn!("Submission {} still pending after {} polls", token, polls);
            return Err(Judge0Error::Timeout { polls });
        }

        tokio::time::sleep(settings.interval).await;
    }
}

/// Submits source code and waits for its completion.
pub struct SubmissionClient {
    api: Box<dyn SubmissionApi>,
    api_key: Option<String>,
    registry: LanguageRegistry,
    poll: PollSettings,
}

impl SubmissionClient {
    pub fn new(
        api: Box<dyn SubmissionApi>,
        api_key: Option<String>,
        registry: LanguageRegistry,
        poll: PollSettings,
    ) -> Self {
        SubmissionClient {
            api,
            api_key,
            registry,
            poll,
        }
    }

    pub async fn execute(
        &self,
        code: &str,
        language: &str,
        stdin: Option<&str>,
    ) -> Result<ExecutionReport, Judge0Error> {
        let api_key = self.api_key.as_deref().ok_or(Judge0Error::MissingApiKey)?;
        let language_id = self
            .registry
            .lookup(language)
            .ok_or_else(|| Judge0Error::UnsupportedLanguage(language.to_string()))?;

        let submission = Submission::new(language_id, code, stdin);
        let token = self.api.create(api_key, &submission).await?;
        info!("Submission created with token {}", token);

        let result = wait_for_result(self.api.as_ref(), api_key, &token, &self.poll).await?;
        trace!("Submission {} result: {:?}", token, result);

        if result.status.id != STATUS_ACCEPTED {
            return Err(Judge0Error::ExecutionFailed(Box::new(result)));
        }

        Ok(result.report())
    }
}
