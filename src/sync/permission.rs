//! Notification permission change detection.

use std::sync::Arc;

use crate::error::{Result, SyncError};
use crate::events::{EventBus, SdkEvent};
use crate::metrics::PERMISSION_CHANGES_TOTAL;
use crate::platform::{NotificationPermission, PushPlatform};
use crate::store::{get_typed_option, option_keys, StateStore, StoreError};

/// Diffs the platform's native notification permission against the
/// persisted previous value.
pub struct PermissionChangeDetector {
    store: Arc<dyn StateStore>,
    platform: Arc<dyn PushPlatform>,
    events: EventBus,
}

impl PermissionChangeDetector {
    pub fn new(store: Arc<dyn StateStore>, platform: Arc<dyn PushPlatform>, events: EventBus) -> Self {
        Self {
            store,
            platform,
            events,
        }
    }

    /// Detect a permission transition and publish `PermissionChanged`.
    ///
    /// Current and previous values are read concurrently. When they
    /// differ, or `force_emit_if_identical` is set, the new value is
    /// persisted first and the event published after. A permission that
    /// was never recorded counts as different from any current value.
    ///
    /// Completion of the returned future is the only signal; there is no
    /// payload. Not safe to invoke concurrently with itself.
    pub async fn trigger_notification_permission_changed(
        &self,
        force_emit_if_identical: bool,
    ) -> Result<()> {
        let (current, previous) = futures::try_join!(
            async {
                self.platform
                    .notification_permission()
                    .await
                    .map_err(SyncError::from)
            },
            async {
                get_typed_option::<NotificationPermission>(
                    self.store.as_ref(),
                    option_keys::NOTIFICATION_PERMISSION,
                )
                .await
                .map_err(SyncError::from)
            },
        )?;

        let is_updating = previous != Some(current) || force_emit_if_identical;
        if !is_updating {
            tracing::debug!(permission = %current, "Notification permission unchanged");
            return Ok(());
        }

        self.store
            .put_option(
                option_keys::NOTIFICATION_PERMISSION,
                serde_json::to_value(current).map_err(StoreError::from)?,
            )
            .await?;

        tracing::info!(from = ?previous, to = %current, "Notification permission changed");
        PERMISSION_CHANGES_TOTAL.inc();
        self.events.publish(SdkEvent::PermissionChanged { to: current });
        Ok(())
    }
}
