use super::types::AnalysisResult;
use lru::LruCache;
use std::num::NonZeroUsize;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => unreachable!(),
};

/// Bounded working-text → result cache. Lookups are exact-match.
pub struct AnalysisCache {
    entries: LruCache<String, AnalysisResult>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    /// A zero capacity falls back to the default of 32 entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY)),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<AnalysisResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Lookup that does not touch recency or hit counters.
    pub fn peek(&self, key: &str) -> Option<&AnalysisResult> {
        self.entries.peek(key)
    }

    pub fn put(&mut self, key: String, result: AnalysisResult) {
        self.entries.put(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}
