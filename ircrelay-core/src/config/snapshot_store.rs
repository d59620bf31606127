//! Versioned snapshot store with change notification.
//!
//! `SnapshotStore<T>` holds an `Arc<T>` that is replaced wholesale. Readers
//! clone the `Arc` and keep a consistent snapshot for as long as they need
//! it; writers build the next value off to the side and swap it in.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, watch};

/// A shared, versioned snapshot with change notification.
///
/// Subscribers receive a [`SnapshotWatcher`] that can `await` the next swap.
pub struct SnapshotStore<T> {
    inner: Arc<SnapshotStoreInner<T>>,
}

struct SnapshotStoreInner<T> {
    data: RwLock<Arc<T>>,
    version: AtomicU64,
    version_tx: watch::Sender<u64>,
}

/// Receives notifications when a [`SnapshotStore`] is swapped.
pub struct SnapshotWatcher {
    version_rx: watch::Receiver<u64>,
}

// -- SnapshotStore ------------------------------------------------------

impl<T> SnapshotStore<T> {
    /// Create a new `SnapshotStore` holding `initial` at version 0.
    pub fn new(initial: T) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(SnapshotStoreInner {
                data: RwLock::new(Arc::new(initial)),
                version: AtomicU64::new(0),
                version_tx,
            }),
        }
    }

    /// Replace the snapshot and notify all watchers. Returns the new version.
    pub async fn store(&self, value: T) -> u64 {
        let value = Arc::new(value);
        let mut guard = self.inner.data.write().await;
        *guard = value;
        let new_version = self.inner.version.fetch_add(1, Ordering::Relaxed) + 1;
        // Drop the write guard before notifying so subscribers can
        // immediately acquire a read lock.
        drop(guard);
        let _ = self.inner.version_tx.send(new_version);
        new_version
    }

    /// The current snapshot.
    pub async fn load(&self) -> Arc<T> {
        Arc::clone(&*self.inner.data.read().await)
    }

    /// Number of swaps since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> SnapshotWatcher {
        SnapshotWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl<T: Default> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for SnapshotStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// -- SnapshotWatcher ----------------------------------------------------

impl SnapshotWatcher {
    /// Wait until the store is swapped and return the new version.
    ///
    /// Returns `Err` if the [`SnapshotStore`] has been dropped.
    pub async fn changed(&mut self) -> Result<u64, watch::error::RecvError> {
        self.version_rx.changed().await?;
        Ok(*self.version_rx.borrow_and_update())
    }
}
