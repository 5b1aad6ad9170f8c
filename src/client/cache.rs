//! Cache for the "all departments" query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::Department;

/// One authoritative read of the catalog, replaced wholesale on refetch.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub departments: Vec<Department>,
    pub fetched_at: DateTime<Utc>,
    /// Cache generation the snapshot was fetched in.
    pub revision: u64,
}

/// Issued when a fetch starts; presented again when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    seq: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<Snapshot>>,
    generation: u64,
    issued: u64,
    stored: u64,
}

/// Holds at most one snapshot.
///
/// A fetch may only store its result if no invalidation happened since it began and no
/// later fetch has stored first.
#[derive(Debug)]
pub struct QueryCache {
    state: RwLock<CacheState>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
        }
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.state.read().await.snapshot.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn begin_fetch(&self) -> FetchTicket {
        let mut state = self.state.write().await;
        state.issued += 1;
        FetchTicket {
            generation: state.generation,
            seq: state.issued,
        }
    }

    /// Offer the result of a fetch.
    ///
    /// Returns the snapshot callers should use: the offered data if it was stored, the
    /// newer stored snapshot if this fetch was overtaken, or the offered data unstored if
    /// the cache was invalidated while it was in flight and nothing newer exists.
    pub async fn complete_fetch(&self, ticket: FetchTicket, departments: Vec<Department>) -> Arc<Snapshot> {
        let mut state = self.state.write().await;
        let snapshot = Arc::new(Snapshot {
            departments,
            fetched_at: Utc::now(),
            revision: ticket.generation,
        });

        if ticket.generation != state.generation {
            tracing::debug!(
                fetch_generation = ticket.generation,
                generation = state.generation,
                "Discarding fetch started before invalidation"
            );
            return state.snapshot.clone().unwrap_or(snapshot);
        }
        if ticket.seq <= state.stored {
            tracing::debug!(seq = ticket.seq, stored = state.stored, "Fetch overtaken by newer result");
            return state.snapshot.clone().unwrap_or(snapshot);
        }

        state.stored = ticket.seq;
        state.snapshot = Some(snapshot.clone());
        snapshot
    }

    /// Drop the snapshot so the next read refetches.
    pub async fn invalidate(&self) -> u64 {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.snapshot = None;
        tracing::debug!(generation = state.generation, "Catalog cache invalidated");
        state.generation
    }
}
