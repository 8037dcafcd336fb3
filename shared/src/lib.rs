use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /run-code`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunCodeRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub stdin: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
}

/// Captured output of an accepted submission.
///
/// `stdout` is absent when the program printed nothing at all; an output that
/// decodes to whitespace only is reported as `No output`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ExecutionReport {
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    pub time: Option<String>,
    pub memory: Option<u64>,
}

/// Envelope answered by `POST /run-code`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeResponse {
    pub api_status: ApiStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExecutionReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RunCodeResponse {
    pub fn success(report: ExecutionReport) -> Self {
        RunCodeResponse {
            api_status: ApiStatus::Success,
            data: Some(report),
            message: None,
            details: None,
        }
    }

    pub fn error(message: impl Into<String>, details: Option<Value>) -> Self {
        RunCodeResponse {
            api_status: ApiStatus::Error,
            data: None,
            message: Some(message.into()),
            details,
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
}

/// Envelope answered by `POST /api/chat`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn reply(text: String) -> Self {
        ChatResponse {
            success: true,
            data: Some(text),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ChatResponse {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let response = RunCodeResponse::success(ExecutionReport {
            stdout: Some("hi\n".to_string()),
            time: Some("0.01".to_string()),
            memory: Some(3200),
            ..Default::default()
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "apiStatus": "success",
                "data": { "stdout": "hi\n", "time": "0.01", "memory": 3200 }
            })
        );
    }

    #[test]
    fn test_error_envelope_keeps_details() {
        let response = RunCodeResponse::error("Execution failed.", Some(json!({"status": {"id": 6}})));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["apiStatus"], "error");
        assert_eq!(value["message"], "Execution failed.");
        assert_eq!(value["details"]["status"]["id"], 6);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_run_request_without_stdin() {
        let request: RunCodeRequest =
            serde_json::from_str(r#"{"code": "print(1)", "language": "python"}"#).unwrap();

        assert_eq!(request.stdin, None);
        assert_eq!(request.language, "python");
    }

    #[test]
    fn test_chat_failure_envelope() {
        let value = serde_json::to_value(ChatResponse::failure("boom")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }
}
