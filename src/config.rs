use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT: &str = "https://invest-public-api.tinkoff.ru/rest";
pub const DEFAULT_WS_ENDPOINT: &str = "wss://invest-public-api.tinkoff.ru/ws";
pub const SANDBOX_ENDPOINT: &str = "https://sandbox-invest-public-api.tinkoff.ru/rest";
pub const SANDBOX_WS_ENDPOINT: &str = "wss://sandbox-invest-public-api.tinkoff.ru/ws";

/// Connection settings shared by every service client.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub token: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ws_endpoint")]
    pub ws_endpoint: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_ws_endpoint() -> String {
    DEFAULT_WS_ENDPOINT.to_string()
}

fn default_app_name() -> String {
    "rust-invest".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: default_endpoint(),
            ws_endpoint: default_ws_endpoint(),
            account_id: None,
            app_name: default_app_name(),
            export_dir: default_export_dir()
        }
    }

    /// Load configuration from `INVEST_*` environment variables.
    ///
    /// `INVEST_TOKEN` is required; everything else falls back to the production defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>
    {
        let token = match lookup("INVEST_TOKEN") {
            Some(token) if !token.is_empty() => token,
            _ => anyhow::bail!("INVEST_TOKEN environment variable not found")
        };

        let mut config = Config::new(token);
        if let Some(endpoint) = lookup("INVEST_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(ws_endpoint) = lookup("INVEST_WS_ENDPOINT") {
            config.ws_endpoint = ws_endpoint;
        }
        if let Some(app_name) = lookup("INVEST_APP_NAME") {
            config.app_name = app_name;
        }
        if let Some(export_dir) = lookup("INVEST_EXPORT_DIR") {
            config.export_dir = PathBuf::from(export_dir);
        }
        config.account_id = lookup("INVEST_ACCOUNT_ID").filter(|id| !id.is_empty());

        Ok(config)
    }

    /// Point both gateways at the sandbox environment.
    pub fn sandbox(mut self) -> Self {
        self.endpoint = SANDBOX_ENDPOINT.to_string();
        self.ws_endpoint = SANDBOX_WS_ENDPOINT.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "INVEST_TOKEN environment variable not found"
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("INVEST_TOKEN", "t.abc")])).unwrap();
        assert_eq!(config.token, "t.abc");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.ws_endpoint, DEFAULT_WS_ENDPOINT);
        assert_eq!(config.account_id, None);
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn test_overrides_and_sandbox() {
        let config = Config::from_lookup(lookup_from(&[
            ("INVEST_TOKEN", "t.abc"),
            ("INVEST_ACCOUNT_ID", "2000123456"),
            ("INVEST_EXPORT_DIR", "/tmp/candles"),
        ]))
        .unwrap();
        assert_eq!(config.account_id.as_deref(), Some("2000123456"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/candles"));

        let sandbox = config.sandbox();
        assert_eq!(sandbox.endpoint, SANDBOX_ENDPOINT);
        assert_eq!(sandbox.ws_endpoint, SANDBOX_WS_ENDPOINT);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"token": "t.abc"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.app_name, "rust-invest");
    }
}
