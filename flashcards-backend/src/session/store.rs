//! In-memory server-side session store.
//!
//! Sessions are keyed by an opaque token held by the client in a cookie and
//! only carry the pending flash messages. Entries live in a DashMap so
//! concurrent requests from different sessions never contend on one lock.
//! Idle entries are dropped:
//!   1. lazily, when an expired token is looked up
//!   2. by a periodic background sweeper (start_background_sweeper)

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::models::FlashMessage;

/// A single session entry.
pub struct SessionEntry {
    pub messages: Vec<FlashMessage>,
    pub last_access: Instant,
}

/// Thread-safe session store, keyed by session token.
pub struct SessionStore {
    entries: DashMap<String, SessionEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_minutes * 60), config.max_sessions)
    }

    /// Start a new, empty session and return its token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.entries.insert(
            token.clone(),
            SessionEntry {
                messages: Vec::new(),
                last_access: Instant::now(),
            },
        );
        token
    }

    /// Check whether a token refers to a live session, touching it if so.
    pub fn contains(&self, token: &str) -> bool {
        let live = match self.entries.get_mut(token) {
            Some(mut entry) if entry.last_access.elapsed() <= self.ttl => {
                entry.last_access = Instant::now();
                true
            }
            Some(_) => false,
            None => return false,
        };
        if !live {
            self.entries.remove(token);
        }
        live
    }

    /// Queue a message for the next request of this session.
    /// Returns false when the session does not exist.
    pub fn push_message(&self, token: &str, message: FlashMessage) -> bool {
        match self.entries.get_mut(token) {
            Some(mut entry) => {
                entry.messages.push(message);
                entry.last_access = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Remove and return every pending message of this session.
    pub fn take_messages(&self, token: &str) -> Vec<FlashMessage> {
        match self.entries.get_mut(token) {
            Some(mut entry) => {
                entry.last_access = Instant::now();
                std::mem::take(&mut entry.messages)
            }
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop sessions idle for longer than the TTL.
    pub fn remove_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.last_access.elapsed() <= ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Evict oldest entries when the store exceeds max_entries.
    fn evict_stale(&self) {
        if self.entries.len() <= self.max_entries {
            return;
        }
        let mut entries: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.last_access))
            .collect();
        // Oldest first
        entries.sort_by_key(|(_, t)| *t);
        let to_evict = entries.len() - self.max_entries;
        for (token, _) in entries.into_iter().take(to_evict) {
            self.entries.remove(&token);
        }
    }

    /// Spawn a background task that periodically drops idle sessions.
    pub fn start_background_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip immediate tick
            loop {
                ticker.tick().await;
                let expired = store.remove_expired();
                if expired > 0 {
                    log::debug!("[SESSIONS] Dropped {} expired sessions", expired);
                }
                store.evict_stale();
            }
        })
    }
}
