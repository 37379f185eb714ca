//! Outbound notification API.
//!
//! The sync core sends exactly one kind of outbound request: the welcome
//! notification on a fresh subscribe. The trait keeps the transport
//! substitutable; [`HttpNotificationApi`] is the production
//! implementation. No retry or backoff lives here; a failed send rejects
//! the pass.

mod http;

pub use http::HttpNotificationApi;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur sending a notification.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request itself failed
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("notification rejected: status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A notification send request.
///
/// `headings` and `contents` map locale codes to localized strings, the
/// shape the delivery platform expects.
#[derive(Debug, Clone, Serialize)]
pub struct SendNotificationRequest {
    pub app_id: String,
    pub user_ids: Vec<String>,
    pub headings: HashMap<String, String>,
    pub contents: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<serde_json::Value>,
    /// Deliver at this time instead of immediately
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_after: Option<DateTime<Utc>>,
}

impl SendNotificationRequest {
    pub fn new(app_id: impl Into<String>, user_ids: Vec<String>) -> Self {
        Self {
            app_id: app_id.into(),
            user_ids,
            headings: HashMap::new(),
            contents: HashMap::new(),
            url: None,
            buttons: None,
            custom_data: None,
            send_after: None,
        }
    }

    /// Set the title for a locale.
    pub fn heading(mut self, locale: impl Into<String>, title: impl Into<String>) -> Self {
        self.headings.insert(locale.into(), title.into());
        self
    }

    /// Set the message body for a locale.
    pub fn content(mut self, locale: impl Into<String>, message: impl Into<String>) -> Self {
        self.contents.insert(locale.into(), message.into());
        self
    }

    /// Set the landing URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the action buttons payload.
    pub fn buttons(mut self, buttons: serde_json::Value) -> Self {
        self.buttons = Some(buttons);
        self
    }

    /// Attach opaque custom data delivered with the notification.
    pub fn custom_data(mut self, data: serde_json::Value) -> Self {
        self.custom_data = Some(data);
        self
    }

    /// Schedule delivery for a later time.
    pub fn send_after(mut self, when: DateTime<Utc>) -> Self {
        self.send_after = Some(when);
        self
    }
}

/// The platform's answer to a send request.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryReceipt {
    /// Id the platform assigned to the notification
    pub id: String,
    /// Number of recipients the notification was queued for
    #[serde(default)]
    pub recipients: u64,
}

/// Outbound notification delivery.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Send a notification, returning the platform's delivery receipt.
    async fn send_notification(
        &self,
        request: SendNotificationRequest,
    ) -> Result<DeliveryReceipt, ApiError>;
}
