//! Page-load reconciliation engine.
//!
//! Wires the detectors, the click replayer and the welcome dispatcher
//! over shared collaborators and runs them in the order the delivery
//! guarantees require: permission detection, subscription detection,
//! click replay, then welcome dispatch iff the subscription detector
//! observed a transition into "subscribed".
//!
//! All three stages mutate the same `AppState` record without locking, so
//! a pass is strictly sequential and passes must not overlap. The engine
//! itself never runs two stages concurrently; callers must not run two
//! passes concurrently.

mod clicks;
mod permission;
mod subscription;
mod welcome;

pub use clicks::{ClickReplayer, CLICK_FRESHNESS_WINDOW_MINUTES};
pub use permission::PermissionChangeDetector;
pub use subscription::SubscriptionChangeDetector;
pub use welcome::{WelcomeDispatcher, DEFAULT_WELCOME_MESSAGE};

use std::sync::Arc;

use crate::api::NotificationApi;
use crate::config::Settings;
use crate::context::SyncContext;
use crate::error::Result;
use crate::events::EventBus;
use crate::platform::PushPlatform;
use crate::store::{signal_keys, SignalStore, StateStore};

/// Reconciles persisted client state against live platform state.
pub struct SyncEngine {
    subscription: SubscriptionChangeDetector,
    permission: PermissionChangeDetector,
    clicks: ClickReplayer,
    welcome: WelcomeDispatcher,
    signals: SignalStore,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn StateStore>,
        platform: Arc<dyn PushPlatform>,
        api: Arc<dyn NotificationApi>,
        context: Arc<dyn SyncContext>,
        events: EventBus,
        settings: Settings,
    ) -> Self {
        Self {
            subscription: SubscriptionChangeDetector::new(
                store.clone(),
                platform.clone(),
                events.clone(),
            ),
            permission: PermissionChangeDetector::new(store.clone(), platform, events.clone()),
            clicks: ClickReplayer::new(store, events.clone(), settings.clicks.handler_match),
            welcome: WelcomeDispatcher::new(context, api, events, settings.welcome_notification),
            signals: SignalStore::new(),
        }
    }

    /// Run one full reconciliation pass for a freshly opened page.
    ///
    /// `suppress_welcome` is threaded from the explicit state-reset path:
    /// a reset deliberately re-triggers the subscribe transition, which
    /// must not re-send the welcome notification.
    pub async fn run_page_load(&self, page_url: &str, suppress_welcome: bool) -> Result<()> {
        tracing::debug!(page_url, "Starting page-load sync pass");

        self.permission.trigger_notification_permission_changed(false).await?;
        let transition = self.subscription.check_and_trigger_subscription_changed().await?;
        self.clicks.fire_stored_notification_clicks(page_url).await?;

        if let Some(new_state) = transition {
            self.welcome
                .on_subscription_changed(new_state, suppress_welcome, page_url)
                .await?;
        }
        Ok(())
    }

    /// Hook for the platform's native permission-change callback; re-runs
    /// subscription detection, since flipping the permission usually
    /// flips effective push-enabled state too.
    pub async fn on_notification_permission_change(&self) -> Result<Option<bool>> {
        self.subscription.check_and_trigger_subscription_changed().await
    }

    /// Record the ephemeral opted-out flag for this page session.
    pub fn on_internal_subscription_set(&self, opted_out: bool) {
        self.signals.put(
            signal_keys::SUBSCRIPTION_OPTED_OUT,
            serde_json::Value::Bool(opted_out),
        );
    }

    /// Latest opted-out flag recorded this session, if any.
    pub fn last_opted_out(&self) -> Option<bool> {
        self.signals
            .last(signal_keys::SUBSCRIPTION_OPTED_OUT)
            .and_then(|value| value.as_bool())
    }
}
