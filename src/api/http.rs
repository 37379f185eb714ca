//! HTTP implementation of the outbound notification API.

use async_trait::async_trait;

use crate::config::ApiConfig;

use super::{ApiError, DeliveryReceipt, NotificationApi, SendNotificationRequest};

/// Sends notifications over HTTPS.
///
/// The caller should construct one instance and share it; the inner
/// `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.clone(), config.key.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/notifications", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn send_notification(
        &self,
        request: SendNotificationRequest,
    ) -> Result<DeliveryReceipt, ApiError> {
        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "Notification send rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let receipt: DeliveryReceipt = response.json().await?;
        tracing::debug!(notification_id = %receipt.id, recipients = receipt.recipients, "Notification sent");
        Ok(receipt)
    }
}
