use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::Deserialize;

use crate::config::GeminiConfig;

use super::{GeminiError, GenerateRequest, GenerateResponse, GenerationApi};

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// HTTP client of the `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GeminiError::Transport(e.to_string()))?;

        Ok(GeminiClient {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.url, self.model)
    }
}

/// Extract the `error.message` of an error body, or fall back to the status.
fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| format!("Request failed with status {}", status))
}

#[async_trait]
impl GenerationApi for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError> {
        let url = self.endpoint();

        let res = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the full url, key included
                let e = e.without_url();
                error!("Failed to reach {}: {}", url, e);
                GeminiError::Transport(e.to_string())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            error!("Error with Gemini API ({}): {}", status, body);
            return Err(GeminiError::Upstream(upstream_message(status, &body)));
        }

        res.json::<GenerateResponse>()
            .await
            .map_err(|e| GeminiError::MalformedResponse(e.without_url().to_string()))
    }
}

#[cfg(test)]
mod test {
    use reqwest::StatusCode;

    use super::{upstream_message, GeminiClient};
    use crate::config::GeminiConfig;

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&GeminiConfig::default()).unwrap();

        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_upstream_message_from_body() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;

        assert_eq!(upstream_message(StatusCode::BAD_REQUEST, body), "API key not valid");
    }

    #[test]
    fn test_upstream_message_fallback() {
        assert_eq!(
            upstream_message(StatusCode::BAD_GATEWAY, "<html>"),
            "Request failed with status 502 Bad Gateway"
        );
    }
}
