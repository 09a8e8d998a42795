//! PIN-gated session guard.
//!
//! Gates a sensitive dashboard section behind a 4-digit PIN verified by the
//! dashboard API. An unlocked session locks again after a period without
//! tracked activity (30 minutes by default).
//!
//! # State machine
//!
//! ```text
//! Locked   --verify_pin ok------> Unlocked
//! Unlocked --check_expiry timeout-> Locked
//! Unlocked --reset / user change--> Locked
//! Unlocked --record_activity-----> Unlocked (timestamp refreshed)
//! ```
//!
//! State is mirrored into a session-scoped [`KeyValueStore`] under
//! [`keys::AUTHENTICATED`] and [`keys::AUTH_TIME`] so a restarted guard
//! resumes an unexpired session.

mod error;
mod watch;

pub use error::PinError;
pub use watch::ExpiryWatch;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use storedesk_core::{ActivityEvent, Pin, PinSessionStatus};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::pin_api::{PinApiClient, PinApiError, PinApiResponse};
use crate::storage::KeyValueStore;

/// Message shown when the API rejects a PIN without saying why.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Invalid PIN";

/// Message shown when the API refuses a PIN change without saying why.
pub const DEFAULT_UPDATE_FAILURE_MESSAGE: &str = "Failed to update PIN";

/// Session storage keys.
pub mod keys {
    /// `"true"` while the session is unlocked.
    pub const AUTHENTICATED: &str = "pinAuthenticated";

    /// Last activity as epoch milliseconds.
    pub const AUTH_TIME: &str = "pinAuthTime";
}

/// Server-side PIN check.
pub trait PinVerifier {
    /// Ask whether `pin` is the dashboard PIN.
    fn verify(&self, pin: &Pin)
    -> impl Future<Output = Result<PinApiResponse, PinApiError>> + Send;

    /// Replace the dashboard PIN.
    fn update(
        &self,
        current: &Pin,
        new: &Pin,
    ) -> impl Future<Output = Result<PinApiResponse, PinApiError>> + Send;
}

impl PinVerifier for PinApiClient {
    async fn verify(&self, pin: &Pin) -> Result<PinApiResponse, PinApiError> {
        self.verify_pin(pin).await
    }

    async fn update(&self, current: &Pin, new: &Pin) -> Result<PinApiResponse, PinApiError> {
        self.update_pin(current, new).await
    }
}

/// Ask the dashboard API whether `candidate` is the PIN.
///
/// Touches no session, so callers need not hold a guard while the API is
/// consulted. Apply the answer with [`PinSessionGuard::apply_verification`].
///
/// # Errors
///
/// `PinError::Validation` for a malformed PIN, `PinError::Transport` if the
/// API could not be asked. A wrong PIN is an `Ok` answer.
#[instrument(skip_all)]
pub async fn request_verification<V: PinVerifier>(
    verifier: &V,
    candidate: &str,
) -> Result<PinApiResponse, PinError> {
    let pin = Pin::parse(candidate)?;
    verifier.verify(&pin).await.map_err(|e| {
        warn!(error = %e, "PIN verification request failed");
        PinError::Transport(e)
    })
}

/// Ask the dashboard API to replace `current` with `new`.
///
/// Apply the answer with [`PinSessionGuard::apply_update`].
///
/// # Errors
///
/// Same as [`request_verification`].
#[instrument(skip_all)]
pub async fn request_update<V: PinVerifier>(
    verifier: &V,
    current: &str,
    new: &str,
) -> Result<PinApiResponse, PinError> {
    let current = Pin::parse(current)?;
    let new = Pin::parse(new)?;
    verifier.update(&current, &new).await.map_err(|e| {
        warn!(error = %e, "PIN update request failed");
        PinError::Transport(e)
    })
}

/// Access granted by a successful PIN verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinGrant {
    /// When the grant started; also the initial last-activity time.
    pub granted_at: DateTime<Utc>,
}

/// Outcome of [`PinSessionGuard::check_expiry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// Session is unlocked and still has `remaining` before it expires.
    Active {
        /// Time left until the idle timeout.
        remaining: TimeDelta,
    },
    /// Session was unlocked and has just been locked; leave the gated section.
    Expired,
    /// Session was already locked.
    Locked,
}

impl ExpiryCheck {
    /// Whether the caller must navigate away from the gated section.
    #[must_use]
    pub const fn must_leave(self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// PIN session state holder.
pub struct PinSessionGuard<S, C> {
    store: S,
    clock: C,
    idle_timeout: TimeDelta,
    authenticated: bool,
    last_activity_at: Option<DateTime<Utc>>,
    current_user: Option<String>,
}

impl<S, C> std::fmt::Debug for PinSessionGuard<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinSessionGuard")
            .field("idle_timeout", &self.idle_timeout)
            .field("authenticated", &self.authenticated)
            .field("last_activity_at", &self.last_activity_at)
            .field("current_user", &self.current_user)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore, C: Clock> PinSessionGuard<S, C> {
    /// Build a guard, resuming a persisted session if it has not expired.
    ///
    /// Stale or malformed persisted keys are cleared.
    pub fn restore(store: S, clock: C, idle_timeout: Duration) -> Self {
        let idle_timeout = TimeDelta::from_std(idle_timeout).unwrap_or(TimeDelta::MAX);
        let mut guard = Self {
            store,
            clock,
            idle_timeout,
            authenticated: false,
            last_activity_at: None,
            current_user: None,
        };

        match guard.read_persisted() {
            Some(last) if guard.clock.now() - last < guard.idle_timeout => {
                info!(last_activity_at = %last, "Resumed unlocked PIN session");
                guard.authenticated = true;
                guard.last_activity_at = Some(last);
            }
            Some(_) => {
                debug!("Persisted PIN session expired while away");
                guard.clear_persisted();
            }
            None => guard.clear_persisted(),
        }

        guard
    }

    /// Current state. Does not apply expiry; see [`Self::check_expiry`].
    #[must_use]
    pub const fn status(&self) -> PinSessionStatus {
        if self.authenticated {
            PinSessionStatus::Unlocked
        } else {
            PinSessionStatus::Locked
        }
    }

    /// Last recorded activity of an unlocked session.
    #[must_use]
    pub const fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.last_activity_at
    }

    /// Time left before an unlocked session expires, never negative.
    #[must_use]
    pub fn remaining(&self) -> Option<TimeDelta> {
        if !self.authenticated {
            return None;
        }
        let last = self.last_activity_at?;
        let left = self.idle_timeout - (self.clock.now() - last);
        Some(left.max(TimeDelta::zero()))
    }

    /// Identity the session currently belongs to.
    #[must_use]
    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Verify `candidate` with the dashboard API and unlock on success.
    ///
    /// # Errors
    ///
    /// - `PinError::Validation` if the input is not a 4-digit code
    /// - `PinError::Rejected` with the API's message if the PIN is wrong
    /// - `PinError::Transport` if the API could not be asked
    ///
    /// The session state is unchanged on every error.
    pub async fn verify_pin<V: PinVerifier>(
        &mut self,
        verifier: &V,
        candidate: &str,
    ) -> Result<PinGrant, PinError> {
        let response = request_verification(verifier, candidate).await?;
        self.apply_verification(&response)
    }

    /// Unlock if `response` accepted the PIN.
    ///
    /// # Errors
    ///
    /// Returns `PinError::Rejected` with the API's message if it did not; the
    /// session is then unchanged.
    pub fn apply_verification(&mut self, response: &PinApiResponse) -> Result<PinGrant, PinError> {
        if !response.success {
            info!("PIN rejected");
            return Err(PinError::Rejected(
                response.message_or(DEFAULT_REJECTION_MESSAGE),
            ));
        }

        let now = self.clock.now();
        self.authenticated = true;
        self.last_activity_at = Some(now);
        self.persist(keys::AUTHENTICATED, "true");
        self.persist(keys::AUTH_TIME, &now.timestamp_millis().to_string());

        info!("PIN session unlocked");
        Ok(PinGrant { granted_at: now })
    }

    /// Change the dashboard PIN, then force re-authentication.
    ///
    /// Returns the API's confirmation message, if any.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::verify_pin`]; on error the session is unchanged.
    pub async fn update_pin<V: PinVerifier>(
        &mut self,
        verifier: &V,
        current: &str,
        new: &str,
    ) -> Result<Option<String>, PinError> {
        let response = request_update(verifier, current, new).await?;
        self.apply_update(response)
    }

    /// Lock the session if `response` confirms the PIN change.
    ///
    /// # Errors
    ///
    /// Returns `PinError::Rejected` if the API refused the change; the session
    /// is then unchanged.
    pub fn apply_update(&mut self, response: PinApiResponse) -> Result<Option<String>, PinError> {
        if !response.success {
            return Err(PinError::Rejected(
                response.message_or(DEFAULT_UPDATE_FAILURE_MESSAGE),
            ));
        }

        info!("Dashboard PIN changed; locking session");
        self.reset();
        Ok(response.message)
    }

    /// Refresh the activity timestamp of an unlocked session.
    ///
    /// Returns `true` if the timestamp was refreshed. A session that has
    /// already passed its idle timeout is locked instead.
    pub fn record_activity(&mut self, event: ActivityEvent) -> bool {
        if !self.authenticated {
            return false;
        }
        if matches!(self.check_expiry(), ExpiryCheck::Expired) {
            return false;
        }

        let now = self.clock.now();
        self.last_activity_at = Some(now);
        self.persist(keys::AUTH_TIME, &now.timestamp_millis().to_string());
        debug!(%event, "PIN session activity");
        true
    }

    /// Lock the session if it has been idle for the timeout or longer.
    pub fn check_expiry(&mut self) -> ExpiryCheck {
        if !self.authenticated {
            return ExpiryCheck::Locked;
        }

        let Some(last) = self.last_activity_at else {
            warn!("Unlocked PIN session without activity timestamp; locking");
            self.reset();
            return ExpiryCheck::Expired;
        };

        let idle = self.clock.now() - last;
        if idle >= self.idle_timeout {
            info!(idle_secs = idle.num_seconds(), "PIN session expired");
            self.reset();
            return ExpiryCheck::Expired;
        }

        ExpiryCheck::Active {
            remaining: self.idle_timeout - idle,
        }
    }

    /// Lock the session and forget persisted state.
    pub fn reset(&mut self) {
        self.authenticated = false;
        self.last_activity_at = None;
        self.clear_persisted();
    }

    /// Record which user the dashboard is signed in as.
    ///
    /// Switching from one known identity to another (or to none) locks the
    /// session. Returns `true` if that happened.
    pub fn set_user(&mut self, user: Option<&str>) -> bool {
        let user = user.map(str::trim).filter(|u| !u.is_empty());
        if self.current_user.as_deref() == user {
            return false;
        }

        let had_user = self.current_user.is_some();
        self.current_user = user.map(str::to_owned);
        if had_user {
            info!("Dashboard user changed; locking PIN session");
            self.reset();
        }
        had_user
    }

    fn read_persisted(&self) -> Option<DateTime<Utc>> {
        let flag = self.read(keys::AUTHENTICATED)?;
        if flag != "true" {
            return None;
        }
        let millis = self.read(keys::AUTH_TIME)?.trim().parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read PIN session storage");
            None
        })
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "Failed to persist PIN session state");
        }
    }

    fn clear_persisted(&mut self) {
        for key in [keys::AUTHENTICATED, keys::AUTH_TIME] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to clear PIN session state");
            }
        }
    }
}
