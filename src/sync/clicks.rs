//! Retroactive notification click replay.
//!
//! A click on a notification usually arrives while no page of the site is
//! open; the click handler stores it in the `AppState` inbox and the page
//! that opens next replays it from here. Because this runs on every page
//! load, replay must be idempotent: the record's slot is tombstoned and
//! persisted before the event is published, so a repeated pass (or one
//! racing a slow emit) observes the record as already gone. A crash
//! between tombstone and publish loses the event rather than delivering
//! it twice.

use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::config::ClickMatchMode;
use crate::error::Result;
use crate::events::{EventBus, SdkEvent};
use crate::metrics::{CLICKS_REPLAYED_TOTAL, CLICKS_STALE_TOTAL};
use crate::store::{get_typed_option, option_keys, AppState, ClickRecord, StateStore};

/// A stored click older than this is discarded unfired: the page opening
/// now is no longer "the page the user clicked through to".
pub const CLICK_FRESHNESS_WINDOW_MINUTES: f64 = 5.0;

/// Replays stored notification clicks against the current page.
pub struct ClickReplayer {
    store: Arc<dyn StateStore>,
    events: EventBus,
    default_match_mode: ClickMatchMode,
}

impl ClickReplayer {
    pub fn new(store: Arc<dyn StateStore>, events: EventBus, default_match_mode: ClickMatchMode) -> Self {
        Self {
            store,
            events,
            default_match_mode,
        }
    }

    /// Replay every stored click that matches `page_url`.
    ///
    /// The matching policy comes from the persisted
    /// `notification_click_handler_match` option, falling back to the
    /// configured default:
    ///
    /// - `origin`: every inbox record whose URL shares the page's origin
    ///   replays (unbounded fan-out within the origin).
    /// - `exact`: only the record stored under `page_url` replays; a miss
    ///   on a URL ending in `/` is retried without the trailing slash,
    ///   since platforms report the bare domain with one.
    ///
    /// Records that match nothing are left untouched; a pass over an
    /// empty inbox is a no-op.
    pub async fn fire_stored_notification_clicks(&self, page_url: &str) -> Result<()> {
        let app_state = self.store.get_app_state().await?;

        let match_mode =
            get_typed_option::<ClickMatchMode>(self.store.as_ref(), option_keys::CLICK_HANDLER_MATCH)
                .await?
                .unwrap_or(self.default_match_mode);

        match match_mode {
            ClickMatchMode::Origin => {
                let page_origin = Url::parse(page_url)?.origin();
                for (stored_url, slot) in &app_state.clicked_notifications {
                    let origin = match Url::parse(stored_url) {
                        Ok(parsed) => parsed.origin(),
                        Err(error) => {
                            tracing::debug!(%stored_url, %error, "Skipping unparseable stored click URL");
                            continue;
                        }
                    };
                    if origin != page_origin {
                        continue;
                    }
                    if let Some(record) = slot {
                        self.replay(record.clone()).await?;
                    }
                }
            }
            ClickMatchMode::Exact => {
                if let Some(record) = Self::lookup_exact(&app_state, page_url) {
                    self.replay(record.clone()).await?;
                }
            }
        }
        Ok(())
    }

    /// Exact-mode lookup with the trailing-slash fallback.
    ///
    /// `https://site.com` and `https://site.com/` are the same page to the
    /// browser but distinct inbox keys; when the slashed form misses, the
    /// bare form is tried.
    fn lookup_exact<'a>(app_state: &'a AppState, page_url: &str) -> Option<&'a ClickRecord> {
        if let Some(Some(record)) = app_state.clicked_notifications.get(page_url) {
            return Some(record);
        }
        if page_url.ends_with('/') {
            let without_slash = &page_url[..page_url.len() - 1];
            if let Some(Some(record)) = app_state.clicked_notifications.get(without_slash) {
                return Some(record);
            }
        }
        None
    }

    /// Tombstone a record and publish its click event.
    ///
    /// The tombstone write happens before the freshness check; a stale
    /// record is consumed without firing anything.
    async fn replay(&self, record: ClickRecord) -> Result<()> {
        // Remove the record before publishing: once any pass claims it,
        // nothing may deliver the same click again.
        let mut app_state = self.store.get_app_state().await?;
        app_state.clicked_notifications.insert(record.url.clone(), None);
        self.store.set_app_state(app_state).await?;

        if let Some(timestamp) = record.timestamp {
            let minutes_since_click =
                (Utc::now().timestamp_millis() - timestamp) as f64 / 60_000.0;
            if minutes_since_click > CLICK_FRESHNESS_WINDOW_MINUTES {
                CLICKS_STALE_TOTAL.inc();
                tracing::debug!(
                    url = %record.url,
                    minutes_since_click,
                    "Discarding stale stored notification click"
                );
                return Ok(());
            }
        }

        CLICKS_REPLAYED_TOTAL.inc();
        tracing::info!(url = %record.url, "Replaying stored notification click");
        self.events.publish(SdkEvent::NotificationClicked(record.data));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStore;
    use serde_json::json;
    use tokio::sync::broadcast::Receiver;

    fn record(url: &str, timestamp: Option<i64>) -> ClickRecord {
        ClickRecord {
            url: url.to_string(),
            data: json!({ "id": url, "heading": "Example Notification" }),
            timestamp,
        }
    }

    async fn store_with(records: Vec<ClickRecord>) -> Arc<MemoryStateStore> {
        let store = Arc::new(MemoryStateStore::new());
        let mut state = AppState::default();
        for rec in records {
            state.clicked_notifications.insert(rec.url.clone(), Some(rec));
        }
        store.set_app_state(state).await.unwrap();
        store
    }

    fn replayer(store: Arc<MemoryStateStore>) -> (ClickReplayer, EventBus) {
        let events = EventBus::new();
        let replayer = ClickReplayer::new(store, events.clone(), ClickMatchMode::Exact);
        (replayer, events)
    }

    fn drain(rx: &mut Receiver<SdkEvent>) -> Vec<SdkEvent> {
        let mut received = Vec::new();
        while let Ok(event) = rx.try_recv() {
            received.push(event);
        }
        received
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    #[tokio::test]
    async fn test_exact_match_fires_once_and_tombstones() {
        let url = "https://a.com/page";
        let store = store_with(vec![record(url, Some(now_millis()))]).await;
        let (replayer, events) = replayer(store.clone());
        let mut rx = events.subscribe();

        replayer.fire_stored_notification_clicks(url).await.unwrap();
        replayer.fire_stored_notification_clicks(url).await.unwrap();

        let received = drain(&mut rx);
        assert_eq!(received.len(), 1, "second pass must not redeliver");
        assert!(matches!(received[0], SdkEvent::NotificationClicked(_)));
        assert_eq!(
            store.get_app_state().await.unwrap().clicked_notifications.get(url),
            Some(&None),
            "slot is tombstoned after replay"
        );
    }

    #[tokio::test]
    async fn test_no_match_is_a_silent_noop() {
        let store = store_with(vec![record("https://a.com/x", Some(now_millis()))]).await;
        let (replayer, events) = replayer(store.clone());
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com/other")
            .await
            .unwrap();

        assert!(drain(&mut rx).is_empty());
        // The unmatched record is still pending
        assert!(matches!(
            store
                .get_app_state()
                .await
                .unwrap()
                .clicked_notifications
                .get("https://a.com/x"),
            Some(&Some(_))
        ));
    }

    #[tokio::test]
    async fn test_trailing_slash_falls_back_to_bare_key() {
        let store = store_with(vec![record("https://a.com", Some(now_millis()))]).await;
        let (replayer, events) = replayer(store);
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com/")
            .await
            .unwrap();

        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_tombstoned_slot_does_not_fire() {
        let store = Arc::new(MemoryStateStore::new());
        let mut state = AppState::default();
        state
            .clicked_notifications
            .insert("https://a.com/page".to_string(), None);
        store.set_app_state(state).await.unwrap();
        let (replayer, events) = replayer(store);
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com/page")
            .await
            .unwrap();

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_stale_record_is_discarded_silently() {
        let url = "https://a.com/page";
        let stale = now_millis() - 5 * 60 * 1000 - 1;
        let store = store_with(vec![record(url, Some(stale))]).await;
        let (replayer, events) = replayer(store.clone());
        let mut rx = events.subscribe();

        replayer.fire_stored_notification_clicks(url).await.unwrap();

        assert!(drain(&mut rx).is_empty(), "stale click must not fire");
        assert_eq!(
            store.get_app_state().await.unwrap().clicked_notifications.get(url),
            Some(&None),
            "stale record is still consumed"
        );
    }

    #[tokio::test]
    async fn test_fresh_record_inside_window_fires() {
        let url = "https://a.com/page";
        let fresh = now_millis() - 4 * 60 * 1000;
        let store = store_with(vec![record(url, Some(fresh))]).await;
        let (replayer, events) = replayer(store);
        let mut rx = events.subscribe();

        replayer.fire_stored_notification_clicks(url).await.unwrap();

        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_timestamp_always_fires() {
        let url = "https://a.com/page";
        let store = store_with(vec![record(url, None)]).await;
        let (replayer, events) = replayer(store);
        let mut rx = events.subscribe();

        replayer.fire_stored_notification_clicks(url).await.unwrap();

        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_origin_mode_fans_out_within_origin_only() {
        let now = now_millis();
        let store = store_with(vec![
            record("https://a.com/x", Some(now)),
            record("https://a.com/y", Some(now)),
            record("https://b.com/z", Some(now)),
        ])
        .await;
        store
            .put_option(option_keys::CLICK_HANDLER_MATCH, json!("origin"))
            .await
            .unwrap();
        let (replayer, events) = replayer(store.clone());
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com")
            .await
            .unwrap();

        let mut ids: Vec<String> = drain(&mut rx)
            .into_iter()
            .map(|event| match event {
                SdkEvent::NotificationClicked(data) => data["id"].as_str().unwrap().to_string(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["https://a.com/x", "https://a.com/y"]);

        let state = store.get_app_state().await.unwrap();
        assert_eq!(state.clicked_notifications.get("https://a.com/x"), Some(&None));
        assert_eq!(state.clicked_notifications.get("https://a.com/y"), Some(&None));
        assert!(matches!(
            state.clicked_notifications.get("https://b.com/z"),
            Some(&Some(_))
        ), "cross-origin record stays pending");
    }

    #[tokio::test]
    async fn test_origin_mode_checks_freshness_per_record() {
        let now = now_millis();
        let store = store_with(vec![
            record("https://a.com/fresh", Some(now - 60 * 1000)),
            record("https://a.com/stale", Some(now - 6 * 60 * 1000)),
        ])
        .await;
        store
            .put_option(option_keys::CLICK_HANDLER_MATCH, json!("origin"))
            .await
            .unwrap();
        let (replayer, events) = replayer(store);
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com")
            .await
            .unwrap();

        let received = drain(&mut rx);
        assert_eq!(received.len(), 1);
        match &received[0] {
            SdkEvent::NotificationClicked(data) => assert_eq!(data["id"], "https://a.com/fresh"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_origin_mode_skips_unparseable_stored_keys() {
        let store = store_with(vec![record("not a url", Some(now_millis()))]).await;
        store
            .put_option(option_keys::CLICK_HANDLER_MATCH, json!("origin"))
            .await
            .unwrap();
        let (replayer, events) = replayer(store);
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com")
            .await
            .unwrap();

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_config_default_applies_when_option_absent() {
        // Replayer configured for origin mode, no persisted override
        let store = store_with(vec![record("https://a.com/x", Some(now_millis()))]).await;
        let events = EventBus::new();
        let replayer = ClickReplayer::new(store, events.clone(), ClickMatchMode::Origin);
        let mut rx = events.subscribe();

        replayer
            .fire_stored_notification_clicks("https://a.com/landing")
            .await
            .unwrap();

        assert_eq!(drain(&mut rx).len(), 1, "origin default matched a sibling path");
    }
}
