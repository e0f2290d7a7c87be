//! Provider connection settings
//!
//! Read from the `provider` block of the configuration document, then
//! overridden by `ADC_*` environment variables.

use serde::Deserialize;

use crate::client::ClientError;

/// Connection settings for one appliance
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Management address: host name, IP, or a full `https://` URL
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Obtain an auth token instead of sending basic auth on every call
    #[serde(default = "default_true")]
    pub token_auth: bool,
    /// Login provider used for token auth (e.g., "tmos", "radius")
    #[serde(default = "default_login_ref")]
    pub login_ref: String,
    /// Accept self-signed management certificates
    #[serde(default = "default_true")]
    pub insecure: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Interval between polls of long-running appliance tasks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_port() -> u16 {
    443
}

fn default_true() -> bool {
    true
}

fn default_login_ref() -> String {
    "tmos".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    3000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            token_auth: true,
            login_ref: default_login_ref(),
            insecure: true,
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ProviderConfig {
    /// Parse the `provider` block; an absent block yields the defaults
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ClientError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| ClientError::Config(format!("invalid provider block: {}", e)))
    }

    /// Apply `ADC_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `ADC_*` overrides from any lookup; unparsable values are ignored
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("ADC_HOST") {
            self.address = v;
        }
        if let Some(v) = lookup("ADC_PORT").and_then(|v| v.parse().ok()) {
            self.port = v;
        }
        if let Some(v) = lookup("ADC_USERNAME") {
            self.username = v;
        }
        if let Some(v) = lookup("ADC_PASSWORD") {
            self.password = v;
        }
        if let Some(v) = lookup("ADC_LOGIN_REF") {
            self.login_ref = v;
        }
        if let Some(v) = lookup("ADC_TOKEN_AUTH").and_then(|v| parse_bool(&v)) {
            self.token_auth = v;
        }
        if let Some(v) = lookup("ADC_INSECURE").and_then(|v| parse_bool(&v)) {
            self.insecure = v;
        }
        self
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.address.is_empty() {
            return Err(ClientError::Config(
                "address is required (provider block or ADC_HOST)".to_string(),
            ));
        }
        if self.username.is_empty() {
            return Err(ClientError::Config(
                "username is required (provider block or ADC_USERNAME)".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL of the management API
    pub fn base_url(&self) -> String {
        if self.address.starts_with("https://") || self.address.starts_with("http://") {
            self.address.trim_end_matches('/').to_string()
        } else {
            format!("https://{}:{}", self.address, self.port)
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_fill_missing_settings() {
        let config =
            ProviderConfig::from_json(&serde_json::json!({"address": "10.1.1.4"})).unwrap();
        assert_eq!(config.port, 443);
        assert!(config.token_auth);
        assert_eq!(config.login_ref, "tmos");
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.base_url(), "https://10.1.1.4:443");
    }

    #[test]
    fn unknown_settings_are_rejected() {
        let err = ProviderConfig::from_json(&serde_json::json!({"adress": "x"})).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn environment_overrides_the_document() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ADC_HOST", "bigip.example.com"),
            ("ADC_PORT", "8443"),
            ("ADC_TOKEN_AUTH", "false"),
            ("ADC_INSECURE", "not-a-bool"),
        ]);
        let config = ProviderConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url(), "https://bigip.example.com:8443");
        assert!(!config.token_auth);
        assert!(config.insecure);
    }

    #[test]
    fn url_address_is_used_as_is() {
        let config = ProviderConfig {
            address: "http://127.0.0.1:9000/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn validate_requires_address_and_username() {
        assert!(ProviderConfig::default().validate().is_err());
        let config = ProviderConfig {
            address: "10.1.1.4".to_string(),
            username: "admin".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
