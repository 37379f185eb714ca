//! Subscription change detection.

use std::sync::Arc;

use crate::error::Result;
use crate::events::{EventBus, SdkEvent};
use crate::metrics::SUBSCRIPTION_CHANGES_TOTAL;
use crate::platform::PushPlatform;
use crate::store::{PushEnabledState, StateStore};

/// Diffs the platform's live push-enabled flag against the persisted
/// baseline and publishes at most one `SubscriptionChanged` per
/// divergence.
pub struct SubscriptionChangeDetector {
    store: Arc<dyn StateStore>,
    platform: Arc<dyn PushPlatform>,
    events: EventBus,
}

impl SubscriptionChangeDetector {
    pub fn new(store: Arc<dyn StateStore>, platform: Arc<dyn PushPlatform>, events: EventBus) -> Self {
        Self {
            store,
            platform,
            events,
        }
    }

    /// Compare live push-enabled state with the stored baseline.
    ///
    /// A baseline of `Unset` always counts as a change, so the very first
    /// observation publishes. On divergence the new baseline is written
    /// back in a single `set_app_state` before the event goes out.
    ///
    /// Returns the newly observed state iff it diverged, so the caller
    /// can run the subscribe-transition path (welcome notification)
    /// without subscribing to its own bus.
    ///
    /// Not safe to invoke concurrently with itself; the read-modify-write
    /// on `AppState` is unlocked.
    pub async fn check_and_trigger_subscription_changed(&self) -> Result<Option<bool>> {
        let push_enabled = self.platform.is_push_enabled().await?;
        let mut app_state = self.store.get_app_state().await?;

        let last_known = app_state.last_known_push_enabled;
        let changed = match last_known {
            PushEnabledState::Unset => true,
            known => known != PushEnabledState::from_bool(push_enabled),
        };
        if !changed {
            tracing::debug!(push_enabled, "Subscription state unchanged");
            return Ok(None);
        }

        tracing::info!(from = ?last_known, to = push_enabled, "Subscription state changed");
        app_state.last_known_push_enabled = PushEnabledState::from_bool(push_enabled);
        self.store.set_app_state(app_state).await?;

        SUBSCRIPTION_CHANGES_TOTAL.inc();
        self.events.publish(SdkEvent::SubscriptionChanged(push_enabled));
        Ok(Some(push_enabled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{NotificationPermission, PlatformError};
    use crate::store::{AppState, MemoryStateStore};
    use async_trait::async_trait;

    struct StaticPlatform {
        push_enabled: bool,
    }

    #[async_trait]
    impl PushPlatform for StaticPlatform {
        async fn is_push_enabled(&self) -> std::result::Result<bool, PlatformError> {
            Ok(self.push_enabled)
        }

        async fn notification_permission(
            &self,
        ) -> std::result::Result<NotificationPermission, PlatformError> {
            Ok(NotificationPermission::Default)
        }
    }

    async fn detector_with(
        prior: PushEnabledState,
        current: bool,
    ) -> (SubscriptionChangeDetector, EventBus, Arc<MemoryStateStore>) {
        let store = Arc::new(MemoryStateStore::new());
        store
            .set_app_state(AppState {
                last_known_push_enabled: prior,
                ..Default::default()
            })
            .await
            .unwrap();
        let events = EventBus::new();
        let detector = SubscriptionChangeDetector::new(
            store.clone(),
            Arc::new(StaticPlatform {
                push_enabled: current,
            }),
            events.clone(),
        );
        (detector, events, store)
    }

    #[tokio::test]
    async fn test_first_observation_always_counts_as_change() {
        for current in [true, false] {
            let (detector, events, store) = detector_with(PushEnabledState::Unset, current).await;
            let mut rx = events.subscribe();

            let transition = detector.check_and_trigger_subscription_changed().await.unwrap();

            assert_eq!(transition, Some(current));
            assert_eq!(rx.try_recv().unwrap(), SdkEvent::SubscriptionChanged(current));
            assert!(rx.try_recv().is_err(), "exactly one event expected");
            assert_eq!(
                store.get_app_state().await.unwrap().last_known_push_enabled,
                PushEnabledState::from_bool(current)
            );
        }
    }

    #[tokio::test]
    async fn test_stable_state_emits_nothing() {
        for (prior, current) in [
            (PushEnabledState::Enabled, true),
            (PushEnabledState::Disabled, false),
        ] {
            let (detector, events, store) = detector_with(prior, current).await;
            let mut rx = events.subscribe();

            let transition = detector.check_and_trigger_subscription_changed().await.unwrap();

            assert_eq!(transition, None);
            assert!(rx.try_recv().is_err());
            assert_eq!(store.get_app_state().await.unwrap().last_known_push_enabled, prior);
        }
    }

    #[tokio::test]
    async fn test_divergence_emits_exactly_once_and_moves_baseline() {
        for (prior, current) in [
            (PushEnabledState::Enabled, false),
            (PushEnabledState::Disabled, true),
        ] {
            let (detector, events, store) = detector_with(prior, current).await;
            let mut rx = events.subscribe();

            let transition = detector.check_and_trigger_subscription_changed().await.unwrap();

            assert_eq!(transition, Some(current));
            assert_eq!(rx.try_recv().unwrap(), SdkEvent::SubscriptionChanged(current));
            assert!(rx.try_recv().is_err());
            assert_eq!(
                store.get_app_state().await.unwrap().last_known_push_enabled,
                PushEnabledState::from_bool(current)
            );
        }
    }

    #[tokio::test]
    async fn test_second_call_after_divergence_is_quiet() {
        let (detector, events, _store) = detector_with(PushEnabledState::Disabled, true).await;

        assert_eq!(
            detector.check_and_trigger_subscription_changed().await.unwrap(),
            Some(true)
        );

        let mut rx = events.subscribe();
        assert_eq!(detector.check_and_trigger_subscription_changed().await.unwrap(), None);
        assert!(rx.try_recv().is_err());
    }
}
