use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{self, BufReader, Read},
    time::Duration,
};
use thiserror::Error;

use crate::languages::{default_languages, LanguageConfig};

#[derive(Error, Debug)]
pub enum CodepadConfigError {
    #[error("cannot load config file")]
    Load(#[from] io::Error),
    #[error("cannot parse config file")]
    Parse(#[from] serde_yaml::Error),
    #[error("unsupported config kind")]
    KindNotSupported,
    #[error("unsupported config api version")]
    VersionNotSupported,
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

const CONFIG_KIND: &str = "Config";
const CONFIG_API_VERSION: &str = "codepad.io/v1alpha1";

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[allow(non_snake_case)]
pub struct CodepadConfig {
    /// The api version of the codepad config file
    pub apiVersion: String,
    /// The kind of the codepad config file
    pub kind: String,
    /// The relay server configuration
    #[serde(default)]
    pub api: CodepadApiConfig,
    /// The code execution service configuration
    #[serde(default)]
    pub judge0: Judge0Config,
    /// The generative language service configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// The languages accepted by `/run-code`
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageConfig>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct CodepadApiConfig {
    /// The host on which the API server will listen
    #[serde(default = "default_host")]
    pub host: String,
    /// The port on which the API server will listen
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Judge0Config {
    /// Base URL of the submissions API
    #[serde(default = "default_judge0_url")]
    pub url: String,
    /// Value of the `x-rapidapi-host` header
    #[serde(default = "default_judge0_host")]
    pub rapidapi_host: String,
    /// Delay between two polls of a pending submission
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Number of polls after which a submission is considered timed out
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    /// Timeout of a single HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

fn default_port() -> u16 {
    3000
}

fn default_judge0_url() -> String {
    String::from("https://judge0-ce.p.rapidapi.com")
}

fn default_judge0_host() -> String {
    String::from("judge0-ce.p.rapidapi.com")
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_polls() -> u32 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_gemini_url() -> String {
    String::from("https://generativelanguage.googleapis.com")
}

fn default_gemini_model() -> String {
    String::from("gemini-2.0-flash")
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f64 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1000
}

impl Default for CodepadApiConfig {
    fn default() -> Self {
        CodepadApiConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for Judge0Config {
    fn default() -> Self {
        Judge0Config {
            url: default_judge0_url(),
            rapidapi_host: default_judge0_host(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Judge0Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            url: default_gemini_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GeminiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CodepadConfig {
    fn default() -> Self {
        CodepadConfig {
            apiVersion: CONFIG_API_VERSION.to_string(),
            kind: CONFIG_KIND.to_string(),
            api: CodepadApiConfig::default(),
            judge0: Judge0Config::default(),
            gemini: GeminiConfig::default(),
            languages: default_languages(),
        }
    }
}

impl CodepadConfig {
    /// Load a CodepadConfig from a file.
    ///
    /// Arguments:
    ///
    /// * `path`: The path to the config file.
    ///
    /// Returns:
    ///
    /// A Result<CodepadConfig>
    pub fn load(path: &str) -> Result<Self> {
        let file = File::open(path).map_err(CodepadConfigError::Load)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: CodepadConfig =
            serde_yaml::from_reader(reader).map_err(CodepadConfigError::Parse)?;

        if config.kind != CONFIG_KIND {
            return Err(CodepadConfigError::KindNotSupported.into());
        }

        if config.apiVersion != CONFIG_API_VERSION {
            return Err(CodepadConfigError::VersionNotSupported.into());
        }

        Ok(config)
    }

    /// Apply the `PORT` override, looked up through `lookup`.
    pub fn apply_port_override<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|value| !value.trim().is_empty()) {
            self.api.port = port
                .trim()
                .parse()
                .map_err(|_| CodepadConfigError::InvalidPort(port.clone()))?;
        }
        Ok(())
    }
}

/// Upstream API keys. Only ever read from the environment, never from the
/// config file, and never shipped to a client.
#[derive(Clone, Default)]
pub struct Secrets {
    pub judge0_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Secrets {
            judge0_api_key: read("JUDGE0_API_KEY"),
            gemini_api_key: read("GEMINI_API_KEY"),
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("judge0_api_key", &state(&self.judge0_api_key))
            .field("gemini_api_key", &state(&self.gemini_api_key))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, io::Write};

    use super::{CodepadConfig, Secrets};

    const FULL_CONFIG: &str = r#"
apiVersion: codepad.io/v1alpha1
kind: Config
api:
  host: 127.0.0.1
  port: 8080
judge0:
  url: http://judge0.local
  poll_interval_ms: 500
  max_polls: 10
gemini:
  model: gemini-1.5-pro
  temperature: 0.2
languages:
  - name: python
    id: 71
"#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_full_config() {
        let config = CodepadConfig::from_reader(FULL_CONFIG.as_bytes()).unwrap();

        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.judge0.url, "http://judge0.local");
        assert_eq!(config.judge0.rapidapi_host, "judge0-ce.p.rapidapi.com");
        assert_eq!(config.judge0.poll_interval_ms, 500);
        assert_eq!(config.judge0.max_polls, 10);
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.top_k, 40);
        assert_eq!(config.languages.len(), 1);
        assert_eq!(config.languages[0].id, 71);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config =
            CodepadConfig::from_reader("apiVersion: codepad.io/v1alpha1\nkind: Config\n".as_bytes())
                .unwrap();

        assert_eq!(config, CodepadConfig::default());
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.judge0.poll_interval_ms, 2000);
        assert_eq!(config.gemini.max_output_tokens, 1000);
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let err = CodepadConfig::from_reader("apiVersion: codepad.io/v1alpha1\nkind: Other\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported config kind");
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let err = CodepadConfig::from_reader("apiVersion: codepad.io/v2\nkind: Config\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported config api version");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = CodepadConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CodepadConfig::load("/nonexistent/codepad.yaml").unwrap_err();
        assert_eq!(err.to_string(), "cannot load config file");
    }

    #[test]
    fn test_port_override() {
        let mut config = CodepadConfig::default();
        config.apply_port_override(env(&[("PORT", "4100")])).unwrap();
        assert_eq!(config.api.port, 4100);

        config.apply_port_override(env(&[])).unwrap();
        assert_eq!(config.api.port, 4100);

        assert!(config
            .apply_port_override(env(&[("PORT", "not-a-port")]))
            .is_err());
    }

    #[test]
    fn test_secrets_ignore_blank_values() {
        let secrets = Secrets::from_lookup(env(&[("JUDGE0_API_KEY", "abc"), ("GEMINI_API_KEY", " ")]));

        assert_eq!(secrets.judge0_api_key.as_deref(), Some("abc"));
        assert_eq!(secrets.gemini_api_key, None);
    }

    #[test]
    fn test_secrets_are_not_printed() {
        let secrets = Secrets::from_lookup(env(&[("JUDGE0_API_KEY", "very-secret")]));

        let printed = format!("{:?}", secrets);
        assert!(!printed.contains("very-secret"));
        assert!(printed.contains("<set>"));
        assert!(printed.contains("<unset>"));
    }
}
