use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use shared::{ChatRequest, ChatResponse, RunCodeRequest, RunCodeResponse};

use super::{RelayApi, RelayClientError};

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

/// `RelayApi` over HTTP.
pub struct HttpRelay {
    client: Client,
    server: String,
}

impl HttpRelay {
    pub fn new(server: &str) -> Self {
        HttpRelay {
            client: Client::new(),
            server: server.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.server, route)
    }
}

impl Default for HttpRelay {
    fn default() -> Self {
        HttpRelay::new(DEFAULT_SERVER)
    }
}

fn transport(e: reqwest::Error) -> RelayClientError {
    error!("Failed to reach the relay: {}", e);
    RelayClientError::Transport(e.to_string())
}

/// Turn a chat envelope into the reply text or the error it carries.
pub fn chat_reply(response: ChatResponse) -> Result<String, RelayClientError> {
    if response.success {
        Ok(response.data.unwrap_or_default())
    } else {
        Err(RelayClientError::Server(
            response
                .error
                .unwrap_or_else(|| "Unknown error occurred".to_string()),
        ))
    }
}

#[async_trait]
impl RelayApi for HttpRelay {
    async fn run_code(&self, request: &RunCodeRequest) -> Result<RunCodeResponse, RelayClientError> {
        let url = self.url("/run-code");
        debug!("Posting {} code to {}", request.language, url);

        let res = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        res.json::<RunCodeResponse>().await.map_err(|e| {
            error!("Unreadable run response ({}): {}", status, e);
            RelayClientError::Malformed(format!("{} ({})", e, status))
        })
    }

    async fn chat(&self, message: &str) -> Result<String, RelayClientError> {
        let url = self.url("/api/chat");
        debug!("Posting chat message to {}", url);

        let res = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        // failures come back as 500 with an envelope
        let status = res.status();
        let response = res.json::<ChatResponse>().await.map_err(|e| {
            error!("Unreadable chat response ({}): {}", status, e);
            RelayClientError::Malformed(format!("{} ({})", e, status))
        })?;

        chat_reply(response)
    }
}
