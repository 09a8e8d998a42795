//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use storedesk_core::PinSessionStatus;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::{SharedClock, SystemClock};
use crate::config::{AdminConfig, PinSessionConfig};
use crate::pin_api::PinApiClient;
use crate::services::{ExpiryWatch, PinSessionGuard, VisitorTracker};
use crate::storage::{DynStore, JsonFileStore, MemoryStore};

/// PIN guard as held by the HTTP service.
pub type SharedPinGuard = Arc<Mutex<PinSessionGuard<DynStore, SharedClock>>>;

/// Visitor tracker as held by the HTTP service.
pub type SharedVisitorTracker = Mutex<VisitorTracker<DynStore, SharedClock>>;

/// Application state shared across all handlers.
///
/// Cheap to clone; all clones share the same session and tracker.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pin_api: PinApiClient,
    pin_guard: SharedPinGuard,
    expiry_watch: Mutex<Option<ExpiryWatch>>,
    check_interval: Duration,
    visitors: SharedVisitorTracker,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pin_api", &self.inner.pin_api)
            .field("check_interval", &self.inner.check_interval)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state for the running service.
    ///
    /// The PIN session lives in memory for the life of the process; visitor
    /// data is kept in `visitors.json` under the configured data directory.
    #[must_use]
    pub fn new(config: &AdminConfig) -> Self {
        Self::from_parts(
            PinApiClient::new(&config.dashboard_api),
            &config.pin_session,
            Box::new(MemoryStore::new()),
            Box::new(JsonFileStore::open(config.visitor_store_path())),
            Arc::new(SystemClock),
        )
    }

    /// Assemble state from explicit components.
    #[must_use]
    pub fn from_parts(
        pin_api: PinApiClient,
        pin_session: &PinSessionConfig,
        session_store: DynStore,
        durable_store: DynStore,
        clock: SharedClock,
    ) -> Self {
        let guard =
            PinSessionGuard::restore(session_store, Arc::clone(&clock), pin_session.idle_timeout);
        let tracker = VisitorTracker::new(durable_store, clock);

        Self {
            inner: Arc::new(AppStateInner {
                pin_api,
                pin_guard: Arc::new(Mutex::new(guard)),
                expiry_watch: Mutex::new(None),
                check_interval: pin_session.check_interval,
                visitors: Mutex::new(tracker),
            }),
        }
    }

    /// Dashboard API client used for PIN checks.
    #[must_use]
    pub fn pin_api(&self) -> &PinApiClient {
        &self.inner.pin_api
    }

    /// The PIN session guard.
    #[must_use]
    pub fn pin_guard(&self) -> &SharedPinGuard {
        &self.inner.pin_guard
    }

    /// The visitor tracker.
    #[must_use]
    pub fn visitors(&self) -> &SharedVisitorTracker {
        &self.inner.visitors
    }

    /// Start, poke, or stop the background expiry check to match `status`.
    ///
    /// Call after every operation that can change the session status or its
    /// activity timestamp.
    pub async fn sync_expiry_watch(&self, status: PinSessionStatus) {
        let mut slot = self.inner.expiry_watch.lock().await;
        match status {
            PinSessionStatus::Unlocked => {
                if let Some(watch) = slot.as_ref().filter(|w| w.is_running()) {
                    watch.poke();
                    return;
                }
                *slot = Some(ExpiryWatch::spawn(
                    Arc::clone(&self.inner.pin_guard),
                    self.inner.check_interval,
                ));
            }
            PinSessionStatus::Locked => {
                if let Some(watch) = slot.take() {
                    debug!("Stopping PIN expiry watch");
                    watch.stop();
                }
            }
        }
    }

    /// Whether a background expiry check is currently running.
    pub async fn expiry_watch_running(&self) -> bool {
        self.inner
            .expiry_watch
            .lock()
            .await
            .as_ref()
            .is_some_and(ExpiryWatch::is_running)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::services::pin_session::keys;
    use crate::storage::KeyValueStore;
    use crate::test_support::test_state;
    use chrono::{TimeZone, Utc};

    #[tokio::test(start_paused = true)]
    async fn test_watch_follows_status() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        let mut session = MemoryStore::new();
        session.set(keys::AUTHENTICATED, "true").unwrap();
        session
            .set(keys::AUTH_TIME, &clock.now().timestamp_millis().to_string())
            .unwrap();
        let (template, _) = test_state();
        let state = AppState::from_parts(
            template.pin_api().clone(),
            &PinSessionConfig::default(),
            Box::new(session),
            Box::new(MemoryStore::new()),
            Arc::new(clock.clone()),
        );
        assert!(state.pin_guard().lock().await.status().is_unlocked());
        assert!(!state.expiry_watch_running().await);

        state.sync_expiry_watch(PinSessionStatus::Unlocked).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(state.expiry_watch_running().await);

        // Already running: only poked.
        state.sync_expiry_watch(PinSessionStatus::Unlocked).await;
        assert!(state.expiry_watch_running().await);

        state.sync_expiry_watch(PinSessionStatus::Locked).await;
        assert!(!state.expiry_watch_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_exits_on_its_own_for_locked_guard() {
        let (state, _clock) = test_state();

        // The guard was never unlocked, so the first check ends the task.
        state.sync_expiry_watch(PinSessionStatus::Unlocked).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!state.expiry_watch_running().await);
    }
}
