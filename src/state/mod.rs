//! Shared application state and the core match model it guards.

pub mod match_state;
pub mod rally;
pub mod roster;
pub mod rotation;
mod sse;
pub mod stats;
pub mod swap;

use std::{sync::Arc, time::SystemTime};

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{match_store::MatchStore, models::MatchBackupEntity},
    error::ServiceError,
    state::match_state::MatchState,
};

pub use self::sse::SseHub;

/// Cheaply clonable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the running match, the storage slot, and the
/// public event hub. There is exactly one writer path into the match state
/// (the action dispatch service), so a plain `RwLock` is all the coordination
/// needed.
pub struct AppState {
    config: Arc<AppConfig>,
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    sse: SseHub,
    current_match: RwLock<Option<MatchState>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config: Arc::new(config),
            match_store: RwLock::new(None),
            sse: SseHub::new(32),
            current_match: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration handle.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// The match store, or a degraded-mode error when none is installed.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn set_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }
        let _ = self.degraded.send(value);
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Read-only access to the current match slot.
    pub async fn read_match<F, T>(&self, f: F) -> T
    where
        F: FnOnce(Option<&MatchState>) -> T,
    {
        let guard = self.current_match.read().await;
        f(guard.as_ref())
    }

    /// Run a closure against the current match, failing when no set is live.
    pub async fn with_match<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&MatchState) -> Result<T, ServiceError>,
    {
        let guard = self.current_match.read().await;
        match guard.as_ref() {
            Some(state) => f(state),
            None => Err(ServiceError::NotFound("no match is in progress".into())),
        }
    }

    /// Run a mutating closure against the current match, failing when no set
    /// is live.
    pub async fn with_match_mut<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut MatchState) -> Result<T, ServiceError>,
    {
        let mut guard = self.current_match.write().await;
        match guard.as_mut() {
            Some(state) => f(state),
            None => Err(ServiceError::NotFound("no match is in progress".into())),
        }
    }

    /// Mutate the match slot itself (installing or discarding a set).
    pub async fn with_match_slot_mut<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Option<MatchState>) -> T,
    {
        let mut guard = self.current_match.write().await;
        f(&mut guard)
    }

    /// Write the current match to the backup store. Callers on the action hot
    /// path wrap this in a detached task so persistence stays fire-and-forget.
    pub async fn persist_match(&self) -> Result<(), ServiceError> {
        let snapshot = self.read_match(|maybe| maybe.cloned()).await;
        let Some(state) = snapshot else {
            return Ok(());
        };
        let store = self.require_match_store().await?;
        store
            .save_backup(MatchBackupEntity {
                saved_at: SystemTime::now(),
                state,
            })
            .await?;
        Ok(())
    }
}
