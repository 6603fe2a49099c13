//! Method resolution.
//!
//! Resolution has three tiers, fastest first:
//!
//! 1. A call site's own monomorphic entry ([`SendSite`]).
//! 2. The global (class, selector) cache.
//! 3. The hierarchy walk over the method tables, which retains its result
//!    in the global cache on the way out.
//!
//! The walk is the source of truth; both caches are reproducible from it.

use crate::message::Message;
use crate::state::VmState;
use garnet_core::{ModuleId, Symbol};
use garnet_runtime::Executable;
use tracing::trace;

/// The hierarchy resolver, fronted by the global cache.
pub struct Resolver;

impl Resolver {
    /// Resolve `msg`, filling `method`, `module`, and `public` on success.
    ///
    /// A private entry fails resolution unless the message asserts
    /// privacy; protected resolves like public.
    pub fn resolve(state: &mut VmState, msg: &mut Message<'_>) -> bool {
        if let Some(entry) = state.cache.lookup(msg.lookup_from, msg.name) {
            if entry.is_public || msg.priv_send {
                msg.method = Some(entry.method.clone());
                msg.module = Some(entry.module);
                msg.public = entry.is_public;
                return true;
            }
            // Non-public cache hit on a non-privileged send: the walk
            // decides whether it was protected (visible) or private.
        }
        Self::resolve_hierarchy(state, msg)
    }

    /// Walk `lookup_from` and its superclass chain, bypassing the cache.
    pub fn resolve_hierarchy(state: &mut VmState, msg: &mut Message<'_>) -> bool {
        trace!(selector = msg.name.raw(), class = msg.lookup_from.raw(), "method lookup");

        let mut current = Some(msg.lookup_from);
        while let Some(id) = current {
            if let Some(entry) = state.registry.get(id).method(msg.name).cloned() {
                let visibility = entry.visibility();
                if visibility.hidden_without_privacy() && !msg.priv_send {
                    return false;
                }
                state.cache.retain(msg.lookup_from, msg.name, id, &entry);
                msg.method = Some(entry.unwrap_visibility().clone());
                msg.module = Some(id);
                msg.public = visibility.is_public();
                return true;
            }
            current = state.registry.superclass(id);
        }

        trace!(selector = msg.name.raw(), "method lookup failed");
        false
    }
}

/// A monomorphic per-call-site inline cache.
#[derive(Debug, Clone)]
pub struct SendSite {
    /// The selector this site sends.
    pub name: Symbol,
    entry: Option<SiteEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone)]
struct SiteEntry {
    class: ModuleId,
    module: ModuleId,
    method: Executable,
    is_public: bool,
}

impl SendSite {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Locate the method for `msg`: site entry, then global cache, then
    /// hierarchy walk. Refills the site entry on a miss that resolves.
    pub fn locate(&mut self, state: &mut VmState, msg: &mut Message<'_>) -> bool {
        if let Some(entry) = &self.entry {
            if self.name == msg.name
                && entry.class == msg.lookup_from
                && (entry.is_public || msg.priv_send)
            {
                self.hits += 1;
                msg.method = Some(entry.method.clone());
                msg.module = Some(entry.module);
                msg.public = entry.is_public;
                return true;
            }
        }
        self.misses += 1;

        if !Resolver::resolve(state, msg) {
            return false;
        }

        self.entry = Some(SiteEntry {
            class: msg.lookup_from,
            module: msg.module.expect("resolved message carries module"),
            method: msg.method.clone().expect("resolved message carries method"),
            is_public: msg.public,
        });
        true
    }

    /// Drop the cached entry; the next locate re-resolves.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
