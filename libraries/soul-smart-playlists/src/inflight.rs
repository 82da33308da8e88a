//! Per-key run coalescing
//!
//! At most one run per key. A request that arrives while a run is in flight
//! marks the key for one more pass instead of starting a second run; any
//! number of such requests collapse into that single extra pass.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Registry of keys with a run in flight; the value records a pending rerun
pub(crate) struct InFlight<K: Eq + Hash> {
    entries: Arc<DashMap<K, bool>>,
}

impl<K: Eq + Hash> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

pub(crate) enum Claim<K: Eq + Hash + Clone> {
    /// The caller owns the run
    Acquired(RunGuard<K>),
    /// A run is in flight and will pass once more
    Coalesced,
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn claim(&self, key: K) -> Claim<K> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() = true;
                Claim::Coalesced
            }
            Entry::Vacant(entry) => {
                entry.insert(false);
                Claim::Acquired(RunGuard {
                    entries: Arc::clone(&self.entries),
                    key: Some(key),
                })
            }
        }
    }

    /// Ask the in-flight run for `key` to pass once more
    ///
    /// Returns `false` when nothing is in flight.
    pub fn request_rerun(&self, key: &K) -> bool {
        match self.entries.get_mut(key) {
            Some(mut rerun) => {
                *rerun = true;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }
}

/// Ownership of one key's run; released on drop
pub(crate) struct RunGuard<K: Eq + Hash + Clone> {
    entries: Arc<DashMap<K, bool>>,
    key: Option<K>,
}

impl<K: Eq + Hash + Clone> RunGuard<K> {
    /// Finish the current pass
    ///
    /// Returns `true` if a rerun was requested meanwhile; the guard is still
    /// held and the caller must run again. Returns `false` once released.
    pub fn finish_or_rerun(&mut self) -> bool {
        let Some(key) = self.key.as_ref() else {
            return false;
        };

        if self.entries.remove_if(key, |_, rerun| !*rerun).is_some() {
            self.key = None;
            return false;
        }

        if let Some(mut rerun) = self.entries.get_mut(key) {
            *rerun = false;
        }
        true
    }

    /// Release the key without another pass
    ///
    /// Returns whether a rerun had been requested and is now dropped.
    pub fn abandon(mut self) -> bool {
        self.key
            .take()
            .and_then(|key| self.entries.remove(&key))
            .is_some_and(|(_, rerun)| rerun)
    }
}

impl<K: Eq + Hash + Clone> Drop for RunGuard<K> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.entries.remove(&key);
        }
    }
}
