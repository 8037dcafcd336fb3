use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::Judge0Config;

use super::{Judge0Error, Submission, SubmissionApi, SubmissionResult};

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTP client of the Judge0 submissions API (RapidAPI flavour).
pub struct Judge0Client {
    client: Client,
    url: String,
    rapidapi_host: String,
}

impl Judge0Client {
    pub fn new(config: &Judge0Config) -> Result<Self, Judge0Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Judge0Error::Transport(e.to_string()))?;

        Ok(Judge0Client {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            rapidapi_host: config.rapidapi_host.clone(),
        })
    }

    fn authenticated(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.rapidapi_host)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, Judge0Error> {
        let res = request.send().await.map_err(|e| {
            error!("Failed to run request to {}: {}", url, e);
            Judge0Error::Transport(e.to_string())
        })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            error!("Execution service answered {} for {}: {}", status, url, body);
            return Err(Judge0Error::Upstream { status, body });
        }

        Ok(res)
    }
}

#[async_trait]
impl SubmissionApi for Judge0Client {
    async fn create(&self, api_key: &str, submission: &Submission) -> Result<String, Judge0Error> {
        let url = format!("{}/submissions", self.url);
        debug!("Creating submission for language {}", submission.language_id);

        let request = self
            .authenticated(self.client.post(&url), api_key)
            .query(&[("base64_encoded", "true"), ("wait", "false"), ("fields", "*")])
            .json(submission);
        let res = self.send(request, &url).await?;

        let token = res
            .json::<TokenResponse>()
            .await
            .map_err(|e| Judge0Error::MalformedResponse(e.to_string()))?
            .token;

        Ok(token)
    }

    async fn fetch(&self, api_key: &str, token: &str) -> Result<SubmissionResult, Judge0Error> {
        let url = format!("{}/submissions/{}", self.url, token);

        let request = self
            .authenticated(self.client.get(&url), api_key)
            .query(&[("base64_encoded", "true"), ("fields", "*")]);
        let res = self.send(request, &url).await?;

        res.json::<SubmissionResult>()
            .await
            .map_err(|e| Judge0Error::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::Judge0Client;
    use crate::config::Judge0Config;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = Judge0Config {
            url: "http://judge0.local/".to_string(),
            ..Default::default()
        };

        let client = Judge0Client::new(&config).unwrap();
        assert_eq!(client.url, "http://judge0.local");
        assert_eq!(client.rapidapi_host, "judge0-ce.p.rapidapi.com");
    }
}
