//! Cloud document store client.
//!
//! One document per user at `users/{uid}.json`, read whole and written
//! with merge-patch semantics: a PATCH body carries only the fields being
//! set and leaves the rest of the document alone.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, RemoteError};
use crate::storage::BackendConfig;

/// The per-user document. Every field optional; `None` fields are
/// omitted from PATCH bodies, which is what gives writes their
/// merge-patch behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    /// Exercise duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_days: Option<Vec<String>>,
    /// Reminder time of day, "HH:MM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
}

/// HTTP client for the per-user cloud document.
#[derive(Debug, Clone)]
pub struct DocStoreClient {
    http: Client,
    base_url: Url,
}

impl DocStoreClient {
    pub fn new(backend: &BackendConfig) -> Result<Self, CoreError> {
        Self::with_url(&backend.database_url)
    }

    pub fn with_url(base_url: &str) -> Result<Self, CoreError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)
                .map_err(|e| RemoteError::UnexpectedResponse(format!("bad base URL '{base_url}': {e}")))?,
        })
    }

    fn user_url(&self, user_id: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(&format!("/users/{user_id}.json"))
            .map_err(|e| RemoteError::UnexpectedResponse(e.to_string()))
    }

    /// Fetch the full user document. A user with no document yet reads as
    /// the empty document, not an error.
    pub async fn fetch_user(&self, user_id: &str, id_token: &str) -> Result<UserDocument, RemoteError> {
        let resp = self
            .http
            .get(self.user_url(user_id)?)
            .query(&[("auth", id_token)])
            .send()
            .await
            .map_err(RemoteError::Network)?;

        if !resp.status().is_success() {
            return Err(RemoteError::UnexpectedResponse(format!(
                "GET users/{user_id}: HTTP {}",
                resp.status()
            )));
        }

        let value: serde_json::Value = resp.json().await.map_err(RemoteError::Network)?;
        if value.is_null() {
            return Ok(UserDocument::default());
        }
        serde_json::from_value(value)
            .map_err(|e| RemoteError::UnexpectedResponse(format!("malformed user document: {e}")))
    }

    /// Merge-patch a subset of fields into the user document.
    pub async fn merge_user(
        &self,
        user_id: &str,
        id_token: &str,
        patch: &UserDocument,
    ) -> Result<(), RemoteError> {
        let resp = self
            .http
            .patch(self.user_url(user_id)?)
            .query(&[("auth", id_token)])
            .json(patch)
            .send()
            .await
            .map_err(RemoteError::Network)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::WriteFailed {
                doc: format!("users/{user_id}"),
                message: format!("HTTP {}", resp.status()),
            })
        }
    }
}
