use anyhow::Result;
use async_trait::async_trait;
use log::{debug, trace};
#[cfg(test)]
use mockall::automock;
use shared::{ExecutionReport, RunCodeRequest};

use crate::{
    config::{CodepadConfig, Secrets},
    gemini::{ChatClient, GeminiClient, GeminiError, GenerationApi, GenerationConfig},
    judge0::{Judge0Client, Judge0Error, PollSettings, SubmissionApi, SubmissionClient},
    languages::LanguageRegistry,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RelayServiceTrait: Send + Sync {
    async fn run_code(&self, request: RunCodeRequest) -> Result<ExecutionReport, Judge0Error>;
    async fn chat(&self, message: String) -> Result<String, GeminiError>;
}

/// Stateless relay holding the upstream clients and their keys.
pub struct RelayService {
    submissions: SubmissionClient,
    chat: ChatClient,
}

impl RelayService {
    pub fn new(config: &CodepadConfig, secrets: Secrets) -> Result<Self> {
        let judge0 = Judge0Client::new(&config.judge0)?;
        let gemini = GeminiClient::new(&config.gemini)?;
        Ok(Self::with_backends(
            config,
            secrets,
            Box::new(judge0),
            Box::new(gemini),
        ))
    }

    pub fn with_backends(
        config: &CodepadConfig,
        secrets: Secrets,
        submission_api: Box<dyn SubmissionApi>,
        generation_api: Box<dyn GenerationApi>,
    ) -> Self {
        let registry = LanguageRegistry::new(&config.languages);
        debug!("Languages accepted: {:?}", registry.names());

        RelayService {
            submissions: SubmissionClient::new(
                submission_api,
                secrets.judge0_api_key,
                registry,
                PollSettings::from(&config.judge0),
            ),
            chat: ChatClient::new(
                generation_api,
                secrets.gemini_api_key,
                GenerationConfig::from(&config.gemini),
            ),
        }
    }
}

#[async_trait]
impl RelayServiceTrait for RelayService {
    async fn run_code(&self, request: RunCodeRequest) -> Result<ExecutionReport, Judge0Error> {
        trace!("Relaying {} bytes of {} code", request.code.len(), request.language);
        self.submissions
            .execute(&request.code, &request.language, request.stdin.as_deref())
            .await
    }

    async fn chat(&self, message: String) -> Result<String, GeminiError> {
        self.chat.ask(&message).await
    }
}
