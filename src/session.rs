// src/session.rs
//! Latest-wins bookkeeping for interactive search.
//!
//! Each keystroke-driven search takes a ticket from its session's
//! generation counter; when the search finishes, only the holder of the
//! newest ticket may publish. Older completions are reported as stale.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Request header that groups searches into one latest-wins session.
pub const SESSION_HEADER: &str = "x-search-session";
pub const DEFAULT_MAX_SESSIONS: usize = 1024;
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

#[derive(Debug, Default)]
pub struct SearchGeneration {
    current: AtomicU64,
}

impl SearchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search; every earlier ticket becomes stale.
    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /// Hand `value` back only if `ticket` is still the newest.
    pub fn commit<T>(&self, ticket: SearchTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}

/// Bounded map of session id → generation. When full, the least recently
/// used idle session is evicted; sessions with a search in flight are only
/// evicted if every session is busy.
pub struct SearchSessions {
    inner: Mutex<SessionMap>,
    cap: usize,
}

#[derive(Default)]
struct SessionMap {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

struct SessionEntry {
    generation: Arc<SearchGeneration>,
    last_used: u64,
}

impl SessionMap {
    fn evict_one(&mut self) -> Option<String> {
        // Only the map holds an idle session's Arc.
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (Arc::strong_count(&e.generation) > 1, e.last_used))
            .map(|(id, _)| id.clone())?;
        self.entries.remove(&victim);
        Some(victim)
    }
}

impl Default for SearchSessions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SearchSessions {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(SessionMap::default()),
            cap: cap.max(1),
        }
    }

    /// Generation for `id`, created on first use. Blank or oversized ids are
    /// not tracked and yield `None`.
    pub fn get(&self, id: &str) -> Option<Arc<SearchGeneration>> {
        let id = id.trim();
        if id.is_empty() || id.len() > MAX_SESSION_ID_LEN {
            return None;
        }
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.clock += 1;
        let now = map.clock;
        if let Some(e) = map.entries.get_mut(id) {
            e.last_used = now;
            return Some(e.generation.clone());
        }
        if map.entries.len() >= self.cap && map.evict_one().is_some() {
            tracing::debug!(target: "search", "session map full; evicted least recently used");
        }
        let generation = Arc::new(SearchGeneration::new());
        map.entries.insert(
            id.to_string(),
            SessionEntry {
                generation: generation.clone(),
                last_used: now,
            },
        );
        Some(generation)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
