//! Push-delivery client.
//!
//! Posts the legacy send payload to the push service and treats a
//! response without a message id as a failed delivery.

use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::error::{CoreError, RemoteError};
use crate::storage::BackendConfig;

/// HTTP client for the external push/notification service.
#[derive(Debug, Clone)]
pub struct PushClient {
    http: Client,
    base_url: Url,
    server_key: String,
}

impl PushClient {
    pub fn new(backend: &BackendConfig) -> Result<Self, CoreError> {
        Self::with_url(&backend.push_url, &backend.push_server_key)
    }

    pub fn with_url(base_url: &str, server_key: &str) -> Result<Self, CoreError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)
                .map_err(|e| RemoteError::UnexpectedResponse(format!("bad base URL '{base_url}': {e}")))?,
            server_key: server_key.to_string(),
        })
    }

    /// Deliver one notification to a device registration token.
    pub async fn deliver(&self, target: &str, title: &str, body: &str) -> Result<(), RemoteError> {
        let url = self
            .base_url
            .join("/fcm/send")
            .map_err(|e| RemoteError::UnexpectedResponse(e.to_string()))?;
        let payload = json!({
            "to": target,
            "notification": {
                "title": title,
                "body": body,
                "sound": "default",
            },
            "priority": "high",
        });

        let resp = self
            .http
            .post(url)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await
            .map_err(RemoteError::Network)?;

        if !resp.status().is_success() {
            return Err(RemoteError::DeliveryFailed(format!("HTTP {}", resp.status())));
        }

        let result: serde_json::Value = resp.json().await.map_err(RemoteError::Network)?;
        // The service acknowledges accepted sends with a message id.
        if result.get("message_id").is_some()
            || result.get("success").and_then(|v| v.as_i64()).unwrap_or(0) >= 1
        {
            Ok(())
        } else {
            Err(RemoteError::DeliveryFailed(result.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deliver_posts_notification_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/fcm/send")
            .match_header("authorization", "key=sk")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"to":"device-1","notification":{"title":"Vision Therapy Reminder"}}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"message_id":123}"#)
            .create_async()
            .await;

        let client = PushClient::with_url(&server.url(), "sk").unwrap();
        client
            .deliver("device-1", "Vision Therapy Reminder", "It's time for your exercise!")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unacknowledged_send_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/fcm/send")
            .with_status(200)
            .with_body(r#"{"failure":1,"results":[{"error":"NotRegistered"}]}"#)
            .create_async()
            .await;

        let client = PushClient::with_url(&server.url(), "sk").unwrap();
        let err = client.deliver("gone", "t", "b").await.unwrap_err();
        assert!(matches!(err, RemoteError::DeliveryFailed(_)));
    }
}
