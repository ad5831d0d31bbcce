//! Pending Request Store - bridges waiting callers and reporting rounds.
//!
//! Flow:
//! 1. Intake validates a request and calls `add()`, keeping the receiver
//! 2. Each round's observation phase peeks at `first_n()`
//! 3. The transmitter calls `respond()` once an attested report arrives
//! 4. Requests that outlive their expiry receive a timeout response

use crate::domain::{PluginError, PluginResult, RequestStoreConfig, VaultRequest};
use crate::ports::RequestQueue;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use vault_types::VaultResponse;

struct PendingEntry {
    request: VaultRequest,
    sender: oneshot::Sender<VaultResponse>,
    /// Insertion order
    seq: u64,
    created_at: Instant,
    expires_at: Instant,
}

/// Counters for the pending request store
#[derive(Debug, Default)]
pub struct RequestStoreStats {
    pub total_added: AtomicU64,
    pub total_responded: AtomicU64,
    pub total_expired: AtomicU64,
    pub total_evicted: AtomicU64,
    /// Responses whose caller had already gone away
    pub total_dropped: AtomicU64,
}

/// Thread-safe store of requests awaiting a report.
pub struct RequestStore {
    pending: DashMap<String, PendingEntry>,
    next_seq: AtomicU64,
    config: RequestStoreConfig,
    stats: Arc<RequestStoreStats>,
}

impl RequestStore {
    pub fn new(config: RequestStoreConfig) -> Self {
        Self {
            pending: DashMap::new(),
            next_seq: AtomicU64::new(0),
            config,
            stats: Arc::new(RequestStoreStats::default()),
        }
    }

    /// Queue `request` and return the receiver its response is delivered on.
    ///
    /// # Errors
    ///
    /// `PluginError::DuplicateRequest` if a request with the same id is pending.
    pub fn add(&self, request: VaultRequest) -> PluginResult<oneshot::Receiver<VaultResponse>> {
        match self.pending.entry(request.id.clone()) {
            Entry::Occupied(_) => Err(PluginError::DuplicateRequest(request.id)),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                let now = Instant::now();
                debug!(
                    request_id = %request.id,
                    request_type = request.payload.request_type().as_str_name(),
                    "Registered pending request"
                );
                slot.insert(PendingEntry {
                    request,
                    sender: tx,
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    created_at: now,
                    expires_at: now + self.config.request_expiry,
                });
                self.stats.total_added.fetch_add(1, Ordering::Relaxed);
                Ok(rx)
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<VaultRequest> {
        self.pending.get(id).map(|entry| entry.request.clone())
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &RequestStoreStats {
        &self.stats
    }

    pub fn config(&self) -> &RequestStoreConfig {
        &self.config
    }

    /// Remove a request without answering it.
    pub fn evict(&self, id: &str) -> bool {
        if self.pending.remove(id).is_some() {
            self.stats.total_evicted.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    fn deliver(&self, id: &str, entry: PendingEntry, response: VaultResponse) -> bool {
        match entry.sender.send(response) {
            Ok(()) => {
                debug!(
                    request_id = %id,
                    waited_ms = entry.created_at.elapsed().as_millis() as u64,
                    "Delivered response"
                );
                true
            }
            Err(_) => {
                self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %id, "Caller dropped before response arrived");
                false
            }
        }
    }

    /// Answer every expired request with a timeout.
    ///
    /// Returns the number of requests expired.
    pub fn expire_stale(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|entry| entry.expires_at <= now)
            .map(|entry| entry.key().clone())
            .collect();

        let mut count = 0;
        for id in expired {
            if let Some((id, entry)) = self.pending.remove(&id) {
                warn!(
                    request_id = %id,
                    elapsed_ms = now.duration_since(entry.created_at).as_millis() as u64,
                    "Request expired before a report was produced"
                );
                self.stats.total_expired.fetch_add(1, Ordering::Relaxed);
                self.deliver(&id, entry, VaultResponse::timeout(&id));
                count += 1;
            }
        }
        count
    }
}

impl RequestQueue for RequestStore {
    fn first_n(&self, n: usize) -> PluginResult<Vec<VaultRequest>> {
        let mut entries: Vec<(u64, VaultRequest)> = self
            .pending
            .iter()
            .map(|entry| (entry.seq, entry.request.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().take(n).map(|(_, r)| r).collect())
    }

    fn respond(&self, id: &str, response: VaultResponse) -> bool {
        match self.pending.remove(id) {
            Some((id, entry)) => {
                self.stats.total_responded.fetch_add(1, Ordering::Relaxed);
                self.deliver(&id, entry, response)
            }
            None => {
                debug!(request_id = %id, "No local caller waiting for response");
                false
            }
        }
    }
}

/// Background task that periodically expires stale requests.
pub async fn expiry_task(store: Arc<RequestStore>) {
    let mut ticker = tokio::time::interval(store.config().sweep_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let expired = store.expire_stale();
        if expired > 0 {
            debug!(expired, "Expired pending requests");
        }
    }
}
