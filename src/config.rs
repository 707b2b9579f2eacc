//! Configuration types.
//!
//! The gateway reads three provider-owned JSON documents once at startup:
//! the identity key document, the realtime database connection document,
//! and the NLU project document. File paths and the bind port come from
//! `CHAT_GATEWAY_*` environment variables with defaults.

use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Identity provider key document.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Web API key for the provider's REST account endpoints.
    #[serde(alias = "apiKey")]
    pub api_key: SecretString,
    #[serde(default = "default_identity_endpoint")]
    pub endpoint: String,
}

/// Realtime database connection document.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(alias = "databaseURL")]
    pub database_url: String,
}

/// NLU project document.
#[derive(Debug, Clone, Deserialize)]
pub struct NluConfig {
    pub project_id: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    /// Bearer credential for the NLU endpoint. Obtaining and refreshing it
    /// belongs to the deployment, not this process.
    pub access_token: SecretString,
    #[serde(default = "default_nlu_endpoint")]
    pub endpoint: String,
}

fn default_identity_endpoint() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_nlu_endpoint() -> String {
    "https://dialogflow.googleapis.com".to_string()
}

fn default_language_code() -> String {
    "en-us".to_string()
}

/// Full gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub identity: IdentityConfig,
    pub database: DatabaseConfig,
    pub nlu: NluConfig,
    pub port: u16,
}

impl Config {
    /// Load all three provider documents plus the bind port.
    pub fn from_env() -> Result<Self, ConfigError> {
        let identity = load_document(&env_or("CHAT_GATEWAY_IDENTITY_CONFIG", "identity.json"))?;
        let database = load_document(&env_or("CHAT_GATEWAY_DB_CONFIG", "database.json"))?;
        let nlu = load_document(&env_or("CHAT_GATEWAY_NLU_CONFIG", "nlu.json"))?;

        let port: u16 = std::env::var("CHAT_GATEWAY_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            identity,
            database,
            nlu,
            port,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse one JSON config document.
pub fn load_document<T: DeserializeOwned>(path: &str) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_doc(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn identity_document_defaults_endpoint() {
        let file = write_doc(r#"{"api_key": "web-key-123"}"#);
        let config: IdentityConfig = load_document(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.endpoint, "https://identitytoolkit.googleapis.com");
    }

    #[test]
    fn database_document_accepts_provider_casing() {
        let file = write_doc(r#"{"databaseURL": "https://demo.firebaseio.com"}"#);
        let config: DatabaseConfig = load_document(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database_url, "https://demo.firebaseio.com");
    }

    #[test]
    fn nlu_document_defaults_language_and_endpoint() {
        let file = write_doc(r#"{"project_id": "demo-agent", "access_token": "tok"}"#);
        let config: NluConfig = load_document(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.project_id, "demo-agent");
        assert_eq!(config.language_code, "en-us");
        assert_eq!(config.endpoint, "https://dialogflow.googleapis.com");
    }

    #[test]
    fn malformed_document_reports_parse_error() {
        let file = write_doc("{not json");
        let result: Result<DatabaseConfig, _> = load_document(file.path().to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_document_reports_io_error() {
        let result: Result<DatabaseConfig, _> = load_document("/nonexistent/database.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
