use crate::extract::ToolpathStats;
use std::collections::HashMap;
use std::sync::RwLock;

/// Content-addressed memo of extracted stats, keyed by drawing hash. Entries
/// are immutable: a `put` for a key already present is a no-op overwrite
/// with an identical value, never a correction.
pub trait StatsCache: Send + Sync {
    fn get(&self, key: &str) -> Option<ToolpathStats>;
    fn put(&self, key: &str, stats: ToolpathStats);
}

/// In-process cache backed by a `RwLock<HashMap>`. Many readers, write on
/// miss; a race between two misses for the same key just duplicates the
/// extraction work, it never corrupts the entry.
#[derive(Debug, Default)]
pub struct InMemoryStatsCache {
    entries: RwLock<HashMap<String, ToolpathStats>>,
}

impl InMemoryStatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("stats cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatsCache for InMemoryStatsCache {
    fn get(&self, key: &str) -> Option<ToolpathStats> {
        self.entries
            .read()
            .expect("stats cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, stats: ToolpathStats) {
        self.entries
            .write()
            .expect("stats cache lock poisoned")
            .insert(key.to_string(), stats);
    }
}
