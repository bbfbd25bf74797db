/// Match lifecycle transition table.
pub mod match_machine;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{dao::record_store::RecordStore, error::ServiceError};

/// Shared handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state holding the installable record store handle.
pub struct AppState {
    record_store: RwLock<Option<Arc<dyn RecordStore>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new() -> SharedState {
        Arc::new(Self {
            record_store: RwLock::new(None),
        })
    }

    /// Construct state with a backend already installed. Used by tests and
    /// database-less local runs.
    pub fn with_store(store: Arc<dyn RecordStore>) -> SharedState {
        Arc::new(Self {
            record_store: RwLock::new(Some(store)),
        })
    }

    /// Obtain a handle to the current record store, if one is installed.
    pub async fn record_store(&self) -> Option<Arc<dyn RecordStore>> {
        let guard = self.record_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the record store or fail with a degraded-mode error.
    pub async fn require_record_store(&self) -> Result<Arc<dyn RecordStore>, ServiceError> {
        self.record_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new record store implementation and leave degraded mode.
    pub async fn install_record_store(&self, store: Arc<dyn RecordStore>) {
        let mut guard = self.record_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current record store and enter degraded mode.
    pub async fn clear_record_store(&self) {
        let mut guard = self.record_store.write().await;
        guard.take();
    }

    /// Whether the application currently has no storage backend.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.record_store.read().await;
        guard.is_none()
    }
}
