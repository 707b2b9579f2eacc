//! Conversation relay — forwards free text to the managed NLU service.
//!
//! One implicit long-lived NLU session per user: the session id is the
//! verified user id, so conversation context accumulates provider-side
//! without any local session bookkeeping.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::config::NluConfig;
use crate::error::RelayError;

/// External NLU seam.
#[async_trait]
pub trait ConversationRelay: Send + Sync {
    /// Send one user utterance under the given session, returning the
    /// provider's fulfillment text.
    async fn detect_intent(&self, session_id: &str, text: &str) -> Result<String, RelayError>;
}

/// REST client for the NLU provider's detectIntent endpoint.
pub struct RestConversationRelay {
    endpoint: String,
    project_id: String,
    language_code: String,
    access_token: SecretString,
    client: reqwest::Client,
}

impl RestConversationRelay {
    pub fn new(config: NluConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            language_code: config.language_code,
            access_token: config.access_token,
            client: reqwest::Client::new(),
        }
    }

    fn session_url(&self, session_id: &str) -> String {
        format!(
            "{}/v2/projects/{}/agent/sessions/{}:detectIntent",
            self.endpoint, self.project_id, session_id
        )
    }
}

#[async_trait]
impl ConversationRelay for RestConversationRelay {
    async fn detect_intent(&self, session_id: &str, text: &str) -> Result<String, RelayError> {
        let body = json!({
            "queryInput": {
                "text": {
                    "text": text,
                    "languageCode": self.language_code,
                }
            }
        });

        let resp = self
            .client
            .post(self.session_url(session_id))
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Request(e.to_string()))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            if is_invalid_argument(status.as_u16(), &payload) {
                return Err(RelayError::InvalidArgument);
            }
            return Err(RelayError::Request(format!(
                "detectIntent returned {status}"
            )));
        }

        // fulfillmentText is absent when the agent has no reply; an empty
        // string is the faithful result either way.
        Ok(payload["queryResult"]["fulfillmentText"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

/// The provider signals a rejected query with HTTP 400 and a status string
/// of `INVALID_ARGUMENT` in the error envelope.
fn is_invalid_argument(status: u16, payload: &Value) -> bool {
    status == 400 || payload["error"]["status"] == "INVALID_ARGUMENT"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> RestConversationRelay {
        RestConversationRelay::new(NluConfig {
            project_id: "demo-agent".to_string(),
            language_code: "en-us".to_string(),
            access_token: SecretString::from("tok"),
            endpoint: "https://dialogflow.googleapis.com".to_string(),
        })
    }

    #[test]
    fn session_url_scopes_by_project_and_session() {
        assert_eq!(
            relay().session_url("uid-1"),
            "https://dialogflow.googleapis.com/v2/projects/demo-agent/agent/sessions/uid-1:detectIntent"
        );
    }

    #[test]
    fn invalid_argument_detection() {
        assert!(is_invalid_argument(400, &json!({})));
        assert!(is_invalid_argument(
            409,
            &json!({"error": {"status": "INVALID_ARGUMENT"}})
        ));
        assert!(!is_invalid_argument(
            500,
            &json!({"error": {"status": "INTERNAL"}})
        ));
    }
}
