// Shared application store
// Wraps the state in a lock, writes touched keys through to persistence and
// publishes a revision counter so views can redraw after every change

use super::app_state::AppState;
use super::persistence::{KeyValueStore, StoreKey};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};

/// Cloneable handle to the application state
#[derive(Clone)]
pub struct AppStore {
    state: Arc<RwLock<AppState>>,
    backend: Arc<dyn KeyValueStore>,
    /// Sequence number of the next mutation; assigned under the write lock
    sequence: Arc<AtomicU64>,
    /// Sequence of the last value written per key; older writes are skipped
    written: Arc<Mutex<HashMap<StoreKey, u64>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl AppStore {
    /// Load the state from `backend` (first-run defaults for missing keys)
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
        let state = AppState::load(backend.as_ref());
        Self::with_state(state, backend)
    }

    /// Wrap an already built state
    pub fn with_state(state: AppState, backend: Arc<dyn KeyValueStore>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(state)),
            backend,
            sequence: Arc::new(AtomicU64::new(0)),
            written: Arc::new(Mutex::new(HashMap::new())),
            revision: Arc::new(revision),
        }
    }

    /// Receive the revision number after every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Run a read-only closure against the state
    pub async fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    /// Blocking variant of [`AppStore::read`] for callers outside the runtime
    /// (the UI thread). Must not be called from async code.
    pub fn blocking_read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.blocking_read();
        f(&state)
    }

    /// Clone of the whole state
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    /// Mutate the state, persist `keys` and publish a new revision
    ///
    /// The touched keys are encoded under the write lock; the backend writes
    /// run on the blocking pool after the lock is released. Persistence
    /// failures are logged and do not undo the change; the in-memory state
    /// stays authoritative for the session.
    pub async fn mutate<R>(&self, keys: &[StoreKey], f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.state.write().await;
        let result = f(&mut state);
        let encoded: Vec<(StoreKey, Value)> = keys
            .iter()
            .filter_map(|key| match state.encode_key(*key) {
                Ok(value) => Some((*key, value)),
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "Failed to encode state");
                    None
                }
            })
            .collect();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        drop(state);

        self.revision.send_modify(|revision| *revision += 1);
        debug!(revision = self.revision(), "State changed");

        if !encoded.is_empty() {
            self.persist(sequence, encoded).await;
        }
        result
    }

    async fn persist(&self, sequence: u64, encoded: Vec<(StoreKey, Value)>) {
        let backend = self.backend.clone();
        let written = self.written.clone();
        let task = tokio::task::spawn_blocking(move || {
            let Ok(mut written) = written.lock() else {
                warn!("Persistence bookkeeping poisoned; skipping write");
                return;
            };
            for (key, value) in encoded {
                if written.get(&key).is_some_and(|last| *last > sequence) {
                    debug!(key = key.as_str(), sequence, "Skipping superseded write");
                    continue;
                }
                match backend.set(key.as_str(), value) {
                    Ok(()) => {
                        written.insert(key, sequence);
                    }
                    Err(e) => warn!(key = key.as_str(), error = %e, "Failed to persist state"),
                }
            }
        })
        .await;
        if let Err(e) = task {
            warn!(error = %e, "Persistence task failed");
        }
    }
}
