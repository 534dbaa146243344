//! Per-session dashboard state

use prophet_forecast::{request_forecast, ForecastError, ForecastResult, Horizon, ProphetModel};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

/// Sessions untouched for this long are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Upper bound on live sessions; the least recently seen one is evicted
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// State owned by one user session
///
/// A cached result is only shown while `has_forecast` is set; a failed
/// prediction clears the flag but leaves the previous result in place.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    has_forecast: bool,
    cached_result: Option<ForecastResult>,
    horizon: Horizon,
    last_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached forecast, if the last prediction attempt succeeded
    pub fn valid_forecast(&self) -> Option<&ForecastResult> {
        if self.has_forecast {
            self.cached_result.as_ref()
        } else {
            None
        }
    }

    pub fn has_forecast(&self) -> bool {
        self.has_forecast
    }

    /// Cached result regardless of the success flag
    pub fn cached_result(&self) -> Option<&ForecastResult> {
        self.cached_result.as_ref()
    }

    /// Horizon currently entered by the user
    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn set_horizon(&mut self, horizon: Horizon) {
        self.horizon = horizon;
    }

    /// Error from the last action, if it has not been shown yet
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Hand the pending error to the renderer, clearing it
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Record an input problem without touching the forecast
    pub fn report_input_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Record the outcome of a prediction attempt
    pub fn apply_prediction(&mut self, outcome: Result<ForecastResult, ForecastError>) {
        match outcome {
            Ok(result) => {
                self.cached_result = Some(result);
                self.has_forecast = true;
                self.last_error = None;
            }
            Err(err) => {
                self.has_forecast = false;
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Run a prediction for `horizon` and record its outcome
    pub fn predict(&mut self, model: &ProphetModel, horizon: Horizon, seed: u64) -> bool {
        self.horizon = horizon;
        let outcome = request_forecast(model, horizon, seed);
        match &outcome {
            Ok(result) => {
                tracing::info!(horizon = horizon.days(), records = result.len(), "forecast ready")
            }
            Err(err) => {
                tracing::warn!(horizon = horizon.days(), error = %err, "forecast failed")
            }
        }
        self.apply_prediction(outcome);
        self.has_forecast
    }
}

/// Shared handle to one session's state
pub type SharedSession = Arc<Mutex<SessionState>>;

#[derive(Debug)]
struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// All live sessions, keyed by cookie id
///
/// Sessions idle for longer than `idle_timeout` are swept on every lookup,
/// and at most `max_sessions` are kept.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Look up `id`, or start a fresh session when it is absent, unknown or expired
    ///
    /// Returns the session id, its state, and whether it was just created.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, SharedSession, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "idle sessions dropped");
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, Arc::clone(&entry.session), false);
            }
        }

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!(session = %oldest, "session evicted");
            }
        }

        let id = Uuid::new_v4();
        let session = SharedSession::default();
        sessions.insert(
            id,
            Entry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        tracing::info!(session = %id, "session created");
        (id, session, true)
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_has_no_forecast() {
        let state = SessionState::new();
        assert!(!state.has_forecast());
        assert!(state.valid_forecast().is_none());
        assert_eq!(state.horizon().days(), 1);
    }

    #[test]
    fn test_failure_hides_cached_result() {
        let mut state = SessionState::new();
        state.apply_prediction(Err(ForecastError::EmptyForecast));

        assert!(!state.has_forecast());
        assert!(state.valid_forecast().is_none());
        assert_eq!(
            state.take_error().as_deref(),
            Some("The forecast failed or returned empty data.")
        );
        assert!(state.take_error().is_none());
    }

    #[tokio::test]
    async fn test_store_reuses_known_sessions() {
        let store = SessionStore::default();
        let (id, _, created) = store.resolve(None).await;
        assert!(created);

        let (same, _, created) = store.resolve(Some(id)).await;
        assert_eq!(same, id);
        assert!(!created);

        let (other, _, created) = store.resolve(Some(Uuid::new_v4())).await;
        assert_ne!(other, id);
        assert!(created);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(60), 100);
        let (stale, _, _) = store.resolve(None).await;
        store.resolve(None).await;
        store.resolve(None).await;
        assert_eq!(store.len().await, 3);

        tokio::time::advance(Duration::from_secs(30)).await;
        let (kept, _, created) = store.resolve(Some(stale)).await;
        assert_eq!(kept, stale);
        assert!(!created);

        // The other two were last seen 61s ago, `stale` only 31s ago
        tokio::time::advance(Duration::from_secs(31)).await;
        store.resolve(Some(stale)).await;
        assert_eq!(store.len().await, 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let (fresh, _, created) = store.resolve(Some(stale)).await;
        assert!(created);
        assert_ne!(fresh, stale);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_is_capped() {
        let store = SessionStore::new(Duration::from_secs(600), 2);
        let (first, _, _) = store.resolve(None).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let (second, _, _) = store.resolve(None).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        store.resolve(None).await;

        // The oldest session made room for the third
        assert_eq!(store.len().await, 2);
        let (_, _, created) = store.resolve(Some(second)).await;
        assert!(!created);
        let (_, _, created) = store.resolve(Some(first)).await;
        assert!(created);
    }
}
