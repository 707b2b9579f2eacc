//! Profile & transcript store — REST client for the managed realtime
//! database.
//!
//! Profiles live under `users/{uid}` and merge per field; transcripts live
//! under `messages/{uid}` as an ordered push list with server-assigned
//! keys. Concurrency control over concurrent writes to the same node
//! belongs to the database, not this process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

/// One chat turn. Appended, never edited; insertion order is the only
/// ordering guarantee — no timestamps are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub from: Speaker,
    pub message: String,
}

impl TranscriptEntry {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            from: Speaker::User,
            message: message.into(),
        }
    }

    pub fn bot(message: impl Into<String>) -> Self {
        Self {
            from: Speaker::Bot,
            message: message.into(),
        }
    }
}

/// External realtime database seam.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Merge a single field into the user's profile (last write wins for
    /// that field, other fields untouched).
    async fn update_profile_field(
        &self,
        uid: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), StoreError>;

    /// The user's full profile; empty if none exists.
    async fn get_profile(&self, uid: &str) -> Result<Map<String, Value>, StoreError>;

    /// Append one entry to the user's transcript.
    async fn push_transcript_entry(
        &self,
        uid: &str,
        entry: &TranscriptEntry,
    ) -> Result<(), StoreError>;

    /// The user's full transcript as the store's keyed-by-push-id object,
    /// or `Value::Null` if none exists.
    async fn get_transcript(&self, uid: &str) -> Result<Value, StoreError>;
}

/// REST client for the realtime database.
pub struct RestUserStore {
    base_url: String,
    client: reqwest::Client,
}

impl RestUserStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            base_url: config.database_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn node_url(&self, root: &str, uid: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, root, uid)
    }

    async fn read_node(&self, root: &str, uid: &str) -> Result<Value, StoreError> {
        let resp = self
            .client
            .get(self.node_url(root, uid))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let resp = check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl UserStore for RestUserStore {
    async fn update_profile_field(
        &self,
        uid: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let resp = self
            .client
            .patch(self.node_url("users", uid))
            .json(&json!({ field: value }))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        check_status(resp).await?;
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> Result<Map<String, Value>, StoreError> {
        match self.read_node("users", uid).await? {
            Value::Null => Ok(Map::new()),
            Value::Object(fields) => Ok(fields),
            other => Err(StoreError::InvalidResponse(format!(
                "profile node is not an object: {other}"
            ))),
        }
    }

    async fn push_transcript_entry(
        &self,
        uid: &str,
        entry: &TranscriptEntry,
    ) -> Result<(), StoreError> {
        // POST to a list node appends under a fresh server-assigned key.
        let resp = self
            .client
            .post(self.node_url("messages", uid))
            .json(entry)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        check_status(resp).await?;
        Ok(())
    }

    async fn get_transcript(&self, uid: &str) -> Result<Value, StoreError> {
        self.read_node("messages", uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_url_targets_per_user_json_nodes() {
        let store = RestUserStore::new(DatabaseConfig {
            database_url: "https://demo.firebaseio.com/".to_string(),
        });
        assert_eq!(
            store.node_url("users", "uid-1"),
            "https://demo.firebaseio.com/users/uid-1.json"
        );
        assert_eq!(
            store.node_url("messages", "uid-1"),
            "https://demo.firebaseio.com/messages/uid-1.json"
        );
    }

    #[test]
    fn transcript_entry_wire_shape() {
        let entry = TranscriptEntry::user("hello");
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"from": "user", "message": "hello"})
        );
        let entry = TranscriptEntry::bot("hi there");
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"from": "bot", "message": "hi there"})
        );
    }
}
