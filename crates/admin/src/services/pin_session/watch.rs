//! Background expiry check for an unlocked PIN session.

use std::sync::Arc;
use std::time::Duration;

use storedesk_core::PinSessionStatus;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::{ExpiryCheck, PinSessionGuard};
use crate::clock::Clock;
use crate::storage::KeyValueStore;

/// Periodic expiry check bound to the lifetime of an unlocked session.
///
/// The task checks once immediately, then on every tick and whenever
/// [`ExpiryWatch::poke`] is called. It publishes the session status and
/// exits as soon as the session is locked. Dropping the watch aborts the
/// task.
#[derive(Debug)]
pub struct ExpiryWatch {
    handle: JoinHandle<()>,
    poke: Arc<Notify>,
    status: watch::Receiver<PinSessionStatus>,
}

impl ExpiryWatch {
    /// Start watching `guard`, checking every `period`.
    pub fn spawn<S, C>(guard: Arc<Mutex<PinSessionGuard<S, C>>>, period: Duration) -> Self
    where
        S: KeyValueStore + Send + 'static,
        C: Clock + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let poke = Arc::new(Notify::new());
        let (tx, rx) = watch::channel(PinSessionStatus::Unlocked);

        let task_poke = Arc::clone(&poke);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(period_secs = period.as_secs(), "PIN expiry watch started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = task_poke.notified() => {}
                }

                let check = guard.lock().await.check_expiry();
                match check {
                    ExpiryCheck::Active { .. } => {
                        tx.send_replace(PinSessionStatus::Unlocked);
                    }
                    ExpiryCheck::Expired | ExpiryCheck::Locked => {
                        if check.must_leave() {
                            info!("PIN session expired; leaving gated section");
                        }
                        tx.send_replace(PinSessionStatus::Locked);
                        break;
                    }
                }
            }

            debug!("PIN expiry watch stopped");
        });

        Self {
            handle,
            poke,
            status: rx,
        }
    }

    /// Run a check now instead of waiting for the next tick.
    pub fn poke(&self) {
        self.poke.notify_one();
    }

    /// Receiver that observes the session status as seen by the watch.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PinSessionStatus> {
        self.status.clone()
    }

    /// Whether the background task is still checking.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop checking.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ExpiryWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn unlocked_guard(clock: &ManualClock) -> Arc<Mutex<PinSessionGuard<MemoryStore, ManualClock>>> {
        let mut store = MemoryStore::new();
        store.set(super::super::keys::AUTHENTICATED, "true").unwrap();
        store
            .set(
                super::super::keys::AUTH_TIME,
                &clock.now().timestamp_millis().to_string(),
            )
            .unwrap();
        let guard = PinSessionGuard::restore(store, clock.clone(), Duration::from_secs(1800));
        assert!(guard.status().is_unlocked());
        Arc::new(Mutex::new(guard))
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_locks_after_idle_timeout() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        let guard = unlocked_guard(&clock);
        let watch = ExpiryWatch::spawn(Arc::clone(&guard), Duration::from_secs(60));
        let mut status = watch.subscribe();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(watch.is_running());
        assert_eq!(*status.borrow(), PinSessionStatus::Unlocked);

        clock.advance(TimeDelta::minutes(30));
        tokio::time::timeout(
            Duration::from_secs(120),
            status.wait_for(|s| *s == PinSessionStatus::Locked),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(guard.lock().await.status(), PinSessionStatus::Locked);
        tokio::task::yield_now().await;
        assert!(!watch.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poke_checks_without_waiting_for_tick() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        let guard = unlocked_guard(&clock);
        let watch = ExpiryWatch::spawn(Arc::clone(&guard), Duration::from_secs(3600));
        let mut status = watch.subscribe();
        tokio::task::yield_now().await;

        guard.lock().await.reset();
        watch.poke();

        status
            .wait_for(|s| *s == PinSessionStatus::Locked)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_task() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        let guard = unlocked_guard(&clock);
        let watch = ExpiryWatch::spawn(Arc::clone(&guard), Duration::from_secs(60));
        let mut status = watch.subscribe();

        watch.stop();
        // Sender is dropped with the aborted task.
        assert!(status.changed().await.is_err());
        assert!(guard.lock().await.status().is_unlocked());
    }
}
