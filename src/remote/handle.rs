//! Shared connection handle to the remote backend.

use std::sync::Arc;

use tokio::sync::watch;

use super::{CatalogBackend, RemoteError};

type Slot = Option<Arc<dyn CatalogBackend>>;

/// Handle every request uses to reach the backend.
///
/// Starts out initializing. Until a backend is installed, [`RemoteHandle::get`] fails with
/// [`RemoteError::NotReady`] so callers never issue a call against a half-built connection.
#[derive(Clone)]
pub struct RemoteHandle {
    slot: Arc<watch::Sender<Slot>>,
}

impl RemoteHandle {
    pub fn initializing() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot: Arc::new(tx) }
    }

    pub fn ready(backend: Arc<dyn CatalogBackend>) -> Self {
        let handle = Self::initializing();
        handle.install(backend);
        handle
    }

    /// Make the backend available to all clones of this handle.
    pub fn install(&self, backend: Arc<dyn CatalogBackend>) {
        self.slot.send_replace(Some(backend));
    }

    pub fn is_ready(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn get(&self) -> Result<Arc<dyn CatalogBackend>, RemoteError> {
        self.slot.borrow().clone().ok_or(RemoteError::NotReady)
    }
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryBackend;

    #[test]
    fn test_initializing_handle_refuses_calls() {
        let handle = RemoteHandle::initializing();
        assert!(!handle.is_ready());
        assert_eq!(handle.get().err(), Some(RemoteError::NotReady));
    }

    #[tokio::test]
    async fn test_install_reaches_all_clones() {
        let handle = RemoteHandle::initializing();
        let clone = handle.clone();

        handle.install(Arc::new(InMemoryBackend::new()));

        assert!(clone.is_ready());
        let departments = clone.get().unwrap().get_all_departments().await.unwrap();
        assert!(departments.is_empty());
    }
}
