//! The global method cache.
//!
//! A fixed-size, direct-mapped cache from (class, selector) to the
//! resolved method and its defining module. The dispatch fast path is a
//! hash, two compares, and a clone; there is no probing and no chaining.
//! A colliding `retain` simply overwrites the slot, and the next miss for
//! the evicted pair re-resolves and writes it back.
//!
//! The cache is an acceleration, never authoritative: every entry is
//! reproducible from the method tables, so correctness never depends on a
//! lookup hitting.

use garnet_core::{ModuleId, Symbol};
use garnet_runtime::Executable;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of cache slots.
pub const CACHE_SIZE: usize = 0x1000;
const CACHE_MASK: usize = 0xFFF;

/// One resolved (class, selector) pair.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Class the lookup started from.
    pub class: ModuleId,
    /// Selector.
    pub name: Symbol,
    /// Module the method was found in.
    pub module: ModuleId,
    /// The executable, visibility wrappers stripped.
    pub method: Executable,
    /// Whether the stored entry was wrapped public (bare entries count as
    /// public).
    pub is_public: bool,
}

/// Direct-mapped (class, selector) → method cache.
pub struct GlobalCache {
    entries: Vec<Option<CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GlobalCache {
    pub fn new() -> Self {
        Self {
            entries: vec![None; CACHE_SIZE],
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Slot index for a (class, selector) pair.
    ///
    /// Module ids are dense arena indices, so the masked XOR spreads pairs
    /// without the address-alignment shift a pointer key would need. The
    /// full key recheck in [`lookup`](Self::lookup) keeps collisions
    /// harmless.
    #[inline]
    fn slot(class: ModuleId, name: Symbol) -> usize {
        (class.index() ^ name.index()) & CACHE_MASK
    }

    /// Probe the cache. Returns the entry iff both key halves match.
    #[inline]
    pub fn lookup(&self, class: ModuleId, name: Symbol) -> Option<&CacheEntry> {
        match &self.entries[Self::slot(class, name)] {
            Some(entry) if entry.class == class && entry.name == name => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write a resolution into its slot, unconditionally.
    ///
    /// A visibility wrapper is stripped before storage; `is_public`
    /// records what the wrapper said.
    pub fn retain(&mut self, class: ModuleId, name: Symbol, module: ModuleId, method: &Executable) {
        let is_public = method.visibility().is_public();
        self.entries[Self::slot(class, name)] = Some(CacheEntry {
            class,
            name,
            module,
            method: method.unwrap_visibility().clone(),
            is_public,
        });
    }

    /// Drop every entry. Counters are preserved.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Hit rate as a percentage; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let (hits, misses) = self.stats();
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

impl Default for GlobalCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garnet_runtime::{CompiledMethod, Visibility};
    use std::sync::Arc;

    fn selectors() -> (Symbol, Symbol) {
        let mut table = garnet_core::SymbolTable::new();
        (table.intern("blah"), table.intern("other"))
    }

    #[test]
    fn test_round_trip() {
        let mut cache = GlobalCache::new();
        let class = ModuleId::from_raw(3);
        let (name, _) = selectors();
        let defining = ModuleId::from_raw(9);
        let cm = Arc::new(CompiledMethod::default());

        cache.retain(class, name, defining, &Executable::Compiled(Arc::clone(&cm)));

        let entry = cache.lookup(class, name).expect("entry retained");
        assert_eq!(entry.module, defining);
        assert!(entry.is_public);
        assert!(Arc::ptr_eq(entry.method.as_compiled().unwrap(), &cm));
    }

    #[test]
    fn test_wrong_selector_is_absent() {
        let mut cache = GlobalCache::new();
        let class = ModuleId::from_raw(3);
        let (name, other) = selectors();
        let cm = Arc::new(CompiledMethod::default());

        cache.retain(class, name, class, &Executable::Compiled(cm));
        assert!(cache.lookup(class, other).is_none());
    }

    #[test]
    fn test_retain_unwraps_and_records_visibility() {
        let mut cache = GlobalCache::new();
        let class = ModuleId::from_raw(1);
        let (name, _) = selectors();
        let cm = Arc::new(CompiledMethod::default());
        let wrapped =
            Executable::Compiled(Arc::clone(&cm)).with_visibility(Visibility::Private);

        cache.retain(class, name, class, &wrapped);

        let entry = cache.lookup(class, name).unwrap();
        assert!(!entry.is_public);
        // Stored method is the unwrapped executable
        assert!(matches!(entry.method, Executable::Compiled(_)));
        assert!(Arc::ptr_eq(entry.method.as_compiled().unwrap(), &cm));
    }

    #[test]
    fn test_overwrite_on_collision() {
        let mut cache = GlobalCache::new();
        let class = ModuleId::from_raw(4);
        let (name, _) = selectors();
        let a = Arc::new(CompiledMethod::default());
        let b = Arc::new(CompiledMethod::default());

        cache.retain(class, name, class, &Executable::Compiled(Arc::clone(&a)));
        cache.retain(class, name, class, &Executable::Compiled(Arc::clone(&b)));

        let entry = cache.lookup(class, name).unwrap();
        assert!(Arc::ptr_eq(entry.method.as_compiled().unwrap(), &b));
    }

    #[test]
    fn test_stats_and_hit_rate() {
        let mut cache = GlobalCache::new();
        let class = ModuleId::from_raw(2);
        let (name, _) = selectors();
        assert_eq!(cache.hit_rate(), 0.0);

        assert!(cache.lookup(class, name).is_none());
        cache.retain(class, name, class, &Executable::Compiled(Arc::new(CompiledMethod::default())));
        assert!(cache.lookup(class, name).is_some());

        let (hits, misses) = cache.stats();
        assert_eq!((hits, misses), (1, 1));
        assert!((cache.hit_rate() - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_clear() {
        let mut cache = GlobalCache::new();
        let class = ModuleId::from_raw(7);
        let (name, _) = selectors();
        cache.retain(class, name, class, &Executable::Compiled(Arc::new(CompiledMethod::default())));
        cache.clear();
        assert!(cache.lookup(class, name).is_none());
    }
}
