//! Shared, read-only album snapshots and the high-res cache that lives
//! alongside each of them.
//!
//! A session is created when an album finishes loading and is replaced
//! wholesale on reload. Consumers hold an `Arc<AlbumSession>` and never see
//! a half-built photo list.

use crate::album::{AlbumError, AlbumResolver, AlbumSnapshot, AlbumSource, HighResCache};
use crate::navigation::Lightbox;
use crate::pcloud::SharedClient;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub type SharedFeed = Arc<PhotoFeed>;

pub struct AlbumSession {
    pub snapshot: Arc<AlbumSnapshot>,
    pub high_res: HighResCache,
    lightbox: Mutex<Lightbox>,
}

impl AlbumSession {
    fn new(snapshot: AlbumSnapshot, high_res: HighResCache) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            high_res,
            lightbox: Mutex::new(Lightbox::new()),
        }
    }

    /// The album's lightbox. Never hold the guard across an await.
    pub fn lightbox(&self) -> MutexGuard<'_, Lightbox> {
        self.lightbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Loads in flight for one source. The entry disappears with its last ticket.
#[derive(Debug, Default)]
struct Pending {
    generation: u64,
    in_flight: usize,
}

type PendingLoads = Arc<Mutex<HashMap<AlbumSource, Pending>>>;

fn lock_pending(pending: &PendingLoads) -> MutexGuard<'_, HashMap<AlbumSource, Pending>> {
    pending
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Identifies one album load. Only the most recent ticket for a source may
/// publish; closing the source invalidates every outstanding ticket.
///
/// Dropping the ticket (after publishing, on failure, or when the request is
/// abandoned) retires the load.
#[derive(Debug)]
pub struct LoadTicket {
    source: AlbumSource,
    generation: u64,
    pending: PendingLoads,
}

impl LoadTicket {
    pub fn source(&self) -> &AlbumSource {
        &self.source
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        let mut pending = lock_pending(&self.pending);
        if let Some(entry) = pending.get_mut(&self.source) {
            entry.in_flight = entry.in_flight.saturating_sub(1);
            if entry.in_flight == 0 {
                pending.remove(&self.source);
            }
        }
    }
}

#[derive(Clone)]
pub enum Publish {
    Committed(Arc<AlbumSession>),
    Stale(Arc<AlbumSession>),
}

impl Publish {
    pub fn session(&self) -> &Arc<AlbumSession> {
        match self {
            Publish::Committed(session) | Publish::Stale(session) => session,
        }
    }

    pub fn into_session(self) -> Arc<AlbumSession> {
        match self {
            Publish::Committed(session) | Publish::Stale(session) => session,
        }
    }
}

pub struct PhotoFeed {
    resolver: AlbumResolver,
    client: SharedClient,
    high_res_size: String,
    sessions: RwLock<HashMap<AlbumSource, Arc<AlbumSession>>>,
    pending: PendingLoads,
    next_generation: AtomicU64,
}

impl PhotoFeed {
    pub fn new(resolver: AlbumResolver, client: SharedClient, high_res_size: String) -> Self {
        Self {
            resolver,
            client,
            high_res_size,
            sessions: RwLock::new(HashMap::new()),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Returns the published session for `source`, loading it first when
    /// absent or when `refresh` is set.
    pub async fn session(
        &self,
        source: &AlbumSource,
        refresh: bool,
    ) -> Result<Arc<AlbumSession>, AlbumError> {
        if !refresh && let Some(session) = self.current(source).await {
            return Ok(session);
        }
        self.load(source).await
    }

    pub async fn load(&self, source: &AlbumSource) -> Result<Arc<AlbumSession>, AlbumError> {
        let ticket = self.begin_load(source);
        let snapshot = self.resolver.resolve(source).await?;
        Ok(self.publish(&ticket, snapshot).await.into_session())
    }

    pub async fn current(&self, source: &AlbumSource) -> Option<Arc<AlbumSession>> {
        self.sessions.read().await.get(source).cloned()
    }

    pub fn begin_load(&self, source: &AlbumSource) -> LoadTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut pending = lock_pending(&self.pending);
        let entry = pending.entry(source.clone()).or_default();
        entry.generation = generation;
        entry.in_flight += 1;

        LoadTicket {
            source: source.clone(),
            generation,
            pending: self.pending.clone(),
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        lock_pending(&self.pending)
            .get(&ticket.source)
            .is_some_and(|entry| entry.generation == ticket.generation)
    }

    /// Commits `snapshot` as the new session for the ticket's source, unless a
    /// newer load started or the source was closed in the meantime. A stale
    /// result is still handed back so the caller can answer its own request.
    pub async fn publish(&self, ticket: &LoadTicket, snapshot: AlbumSnapshot) -> Publish {
        let session = Arc::new(AlbumSession::new(
            snapshot,
            HighResCache::new(self.client.clone(), self.high_res_size.clone()),
        ));

        let mut sessions = self.sessions.write().await;
        if !self.is_current(ticket) {
            debug!("Discarding stale album load for {}", ticket.source);
            return Publish::Stale(session);
        }

        sessions.insert(ticket.source.clone(), session.clone());
        Publish::Committed(session)
    }

    /// Ends the album session: drops the snapshot and its high-res cache and
    /// invalidates loads still in flight.
    pub async fn close(&self, source: &AlbumSource) -> bool {
        if let Some(entry) = lock_pending(&self.pending).get_mut(source) {
            entry.generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        }

        let removed = self.sessions.write().await.remove(source).is_some();
        if removed {
            info!("Closed album session for {}", source);
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Sources with at least one load still in flight.
    pub fn pending_count(&self) -> usize {
        lock_pending(&self.pending).len()
    }
}
