//! Welcome notification dispatch on a fresh subscribe.

use std::sync::Arc;

use serde_json::json;
use url::Url;

use crate::api::{NotificationApi, SendNotificationRequest};
use crate::config::WelcomeNotificationConfig;
use crate::context::SyncContext;
use crate::error::Result;
use crate::events::{EventBus, SdkEvent};
use crate::metrics::WELCOME_SENT_TOTAL;
use crate::text::decode_html_entities;

/// Message used when configuration provides none (or an empty one).
pub const DEFAULT_WELCOME_MESSAGE: &str = "Thanks for subscribing!";

/// Locale the welcome notification is localized under.
const DEFAULT_LOCALE: &str = "en";

/// Query marker telling the click handler not to navigate anywhere when
/// the welcome notification itself is clicked.
const DO_NOT_OPEN_MARKER: &str = "?_osp=do_not_open";

/// Sends the one-time welcome notification after a subscribe transition.
pub struct WelcomeDispatcher {
    context: Arc<dyn SyncContext>,
    api: Arc<dyn NotificationApi>,
    events: EventBus,
    config: WelcomeNotificationConfig,
}

impl WelcomeDispatcher {
    pub fn new(
        context: Arc<dyn SyncContext>,
        api: Arc<dyn NotificationApi>,
        events: EventBus,
        config: WelcomeNotificationConfig,
    ) -> Self {
        Self {
            context,
            api,
            events,
            config,
        }
    }

    /// React to a subscription transition.
    ///
    /// Only a transition into `true` proceeds, and `suppress_welcome`
    /// (set by an explicit user-state reset) short-circuits everything.
    /// User and app ids resolve concurrently, and resolve even when the
    /// welcome notification is disabled; only the final guard differs
    /// between the disabled and enabled paths.
    ///
    /// Title and message are entity-decoded; an absent or empty message
    /// falls back to [`DEFAULT_WELCOME_MESSAGE`], and an absent or empty
    /// URL falls back to the page origin tagged with a do-not-open
    /// marker. A failed send rejects without publishing.
    pub async fn on_subscription_changed(
        &self,
        new_state: bool,
        suppress_welcome: bool,
        page_url: &str,
    ) -> Result<()> {
        if suppress_welcome {
            tracing::debug!("Not sending welcome notification because user state was reset");
            return Ok(());
        }
        if !new_state {
            return Ok(());
        }

        let (user_id, app_id) = futures::try_join!(
            self.context.resolve_user_id(),
            self.context.resolve_app_id(),
        )?;

        let title = decode_html_entities(self.config.title.as_deref().unwrap_or(""));
        let message = decode_html_entities(match self.config.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => DEFAULT_WELCOME_MESSAGE,
        });
        let url = match self.config.url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!(
                "{}{}",
                Url::parse(page_url)?.origin().ascii_serialization(),
                DO_NOT_OPEN_MARKER
            ),
        };

        if self.config.disable {
            tracing::debug!("Welcome notification is disabled by configuration");
            return Ok(());
        }

        tracing::debug!(%app_id, %user_id, "Sending welcome notification");
        let request = SendNotificationRequest::new(app_id, vec![user_id])
            .heading(DEFAULT_LOCALE, &title)
            .content(DEFAULT_LOCALE, &message)
            .url(&url)
            .custom_data(json!({ "is_welcome_notification": true }));
        self.api.send_notification(request).await?;

        WELCOME_SENT_TOTAL.inc();
        self.events.publish(SdkEvent::WelcomeNotificationSent {
            title,
            message,
            url,
        });
        Ok(())
    }
}
