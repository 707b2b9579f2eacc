//! Identity gateway — account creation, password sign-in, token verification.
//!
//! All three capabilities are opaque calls to the managed identity provider;
//! no credential ever persists in this process beyond the request that
//! carries it.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::config::IdentityConfig;
use crate::error::IdentityError;

/// External identity provider seam.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Create an account. Returns the provider-assigned user id.
    async fn create_user(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Exchange credentials for a session token.
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Verify a bearer token. Returns the user id it is bound to.
    async fn verify_token(&self, token: &str) -> Result<String, IdentityError>;
}

/// REST client for the provider's account endpoints, authenticated by a
/// web API key carried as a query parameter.
pub struct RestIdentityGateway {
    endpoint: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl RestIdentityGateway {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            client: reqwest::Client::new(),
        }
    }

    fn account_url(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.endpoint,
            method,
            self.api_key.expose_secret()
        )
    }

    async fn post_account(&self, method: &str, body: Value) -> Result<Value, IdentityError> {
        let resp = self
            .client
            .post(self.account_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let reason = payload["error"]["message"]
                .as_str()
                .unwrap_or("unknown")
                .to_string();
            return Err(IdentityError::Rejected(reason));
        }

        Ok(payload)
    }
}

#[async_trait]
impl IdentityGateway for RestIdentityGateway {
    async fn create_user(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let payload = self
            .post_account(
                "signUp",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        local_id(&payload)
            .ok_or_else(|| IdentityError::InvalidResponse("signUp response missing localId".into()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let payload = self
            .post_account(
                "signInWithPassword",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        payload["idToken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                IdentityError::InvalidResponse("signIn response missing idToken".into())
            })
    }

    async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        let payload = self
            .post_account("lookup", json!({ "idToken": token }))
            .await?;

        lookup_uid(&payload).ok_or_else(|| {
            IdentityError::InvalidResponse("lookup response missing user".into())
        })
    }
}

fn local_id(payload: &Value) -> Option<String> {
    payload["localId"].as_str().map(str::to_string)
}

fn lookup_uid(payload: &Value) -> Option<String> {
    payload["users"][0]["localId"].as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_url_carries_method_and_key() {
        let gateway = RestIdentityGateway::new(IdentityConfig {
            api_key: SecretString::from("web-key"),
            endpoint: "https://identitytoolkit.googleapis.com/".to_string(),
        });
        assert_eq!(
            gateway.account_url("signUp"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=web-key"
        );
    }

    #[test]
    fn local_id_extraction() {
        let payload = json!({"localId": "uid-1", "email": "bo@example.com"});
        assert_eq!(local_id(&payload).as_deref(), Some("uid-1"));
        assert_eq!(local_id(&json!({})), None);
    }

    #[test]
    fn lookup_uid_reads_first_user() {
        let payload = json!({"users": [{"localId": "uid-9"}]});
        assert_eq!(lookup_uid(&payload).as_deref(), Some("uid-9"));
        assert_eq!(lookup_uid(&json!({"users": []})), None);
    }
}
