//! TtlStore implementation
//!
//! Three coordinated indexes over one key space, with an injected clock.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::Entry;
use crate::clock::{Clock, SystemClock};

/// In-memory key-value store with per-entry TTL expiration
///
/// ## Consistency Model
///
/// Every mutating call leaves the three indexes mutually consistent:
/// - a key present in the value index appears in the key order index
///   exactly once
/// - a key with a deadline sits in exactly the schedule bucket for that
///   deadline; entries without a deadline are never scheduled
/// - schedule buckets are never empty
///
/// Liveness is a separate question from presence: an entry whose deadline
/// has passed stays in all three indexes (and is skipped by reads and
/// scans) until a reclamation call, a `remove`, or an overwrite deletes it.
///
/// ## Concurrency
///
/// Single-threaded by design. Mutation requires `&mut self`, there is no
/// internal locking, and calls are not reentrant-safe under concurrent
/// mutation. Embedders that share a store across threads must serialize
/// access externally, e.g. one exclusive lock around the whole store.
pub struct TtlStore<C: Clock = SystemClock> {
    /// Injected time source; all liveness comparisons go through it
    clock: C,

    /// Value index: key → (value, deadline)
    entries: HashMap<String, Entry>,

    /// Expiration schedule: deadline → keys expiring at that instant
    expirations: BTreeMap<Instant, HashSet<String>>,

    /// Key order index: every not-yet-reclaimed key, sorted
    keys: BTreeSet<String>,
}

impl<C: Clock> TtlStore<C> {
    /// Create an empty store over the given clock
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            entries: HashMap::new(),
            expirations: BTreeMap::new(),
            keys: BTreeSet::new(),
        }
    }

    /// Create a store pre-loaded with `(key, value, ttl_secs)` triples
    ///
    /// Triples are applied in order with the same contract as
    /// [`TtlStore::set`]: a later triple silently supersedes an earlier
    /// one with the same key.
    pub fn with_entries<I>(initial: I, clock: C) -> Self
    where
        I: IntoIterator<Item = (String, String, u64)>,
    {
        let mut store = Self::new(clock);
        for (key, value, ttl_secs) in initial {
            store.set(key, value, ttl_secs);
        }
        store
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert or overwrite an entry
    ///
    /// A `ttl_secs` of 0 means the entry never expires. Overwriting always
    /// succeeds and fully supersedes the previous value and deadline.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, ttl_secs: u64) {
        let key = key.into();
        let value = value.into();

        // Step 1: An overwrite keeps the key order index entry, but the old
        // deadline must come off the schedule before the new one goes on.
        match self.entries.get(&key) {
            Some(old) => {
                if let Some(deadline) = old.expires_at() {
                    self.unschedule(deadline, &key);
                }
            }
            None => {
                self.keys.insert(key.clone());
            }
        }

        // Step 2: Compute the new deadline and schedule it. TTL 0 stays off
        // the schedule entirely.
        let expires_at = if ttl_secs == 0 {
            None
        } else {
            let deadline = self.clock.now() + Duration::from_secs(ttl_secs);
            self.expirations
                .entry(deadline)
                .or_default()
                .insert(key.clone());
            Some(deadline)
        };

        trace!(key = %key, ttl_secs, "set");

        // Step 3: Install the entry, superseding any previous one.
        self.entries.insert(key, Entry::new(value, expires_at));
    }

    /// Remove an entry from all indexes
    ///
    /// Returns `false` if the key is not present. Removal does not check
    /// liveness: an expired-but-unreclaimed entry is removed the same way
    /// a live one is.
    pub fn remove(&mut self, key: &str) -> bool {
        let entry = match self.entries.remove(key) {
            Some(entry) => entry,
            None => return false,
        };

        if let Some(deadline) = entry.expires_at() {
            self.unschedule(deadline, key);
        }
        self.keys.remove(key);

        trace!(key = %key, "remove");
        true
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the value for a key, if the entry exists and is live
    ///
    /// An expired-but-unreclaimed entry reads as absent, with no side
    /// effect; callers cannot distinguish "expired" from "never existed".
    pub fn get(&self, key: &str) -> Option<&str> {
        let entry = self.entries.get(key)?;
        if entry.is_live(self.clock.now()) {
            Some(entry.value())
        } else {
            None
        }
    }

    /// Collect up to `count` live entries in key order, starting at the
    /// first key ≥ `start`
    ///
    /// Expired entries encountered along the way are skipped, not
    /// reclaimed. Stops early when the key space is exhausted.
    pub fn scan_sorted(&self, start: &str, count: usize) -> Vec<(String, String)> {
        let now = self.clock.now();
        self.keys
            .range::<str, _>((std::ops::Bound::Included(start), std::ops::Bound::Unbounded))
            .filter_map(|key| {
                let entry = self.entries.get(key)?;
                entry
                    .is_live(now)
                    .then(|| (key.clone(), entry.value().to_owned()))
            })
            .take(count)
            .collect()
    }

    // =========================================================================
    // Reclamation
    // =========================================================================

    /// Delete one expired entry and return its (key, value)
    ///
    /// Inspects only the earliest-deadline bucket. Returns `None`, with no
    /// changes, when nothing is scheduled or the earliest deadline is
    /// still in the future. Which key is picked from a multi-key bucket is
    /// unspecified.
    pub fn reclaim_one_expired(&mut self) -> Option<(String, String)> {
        let now = self.clock.now();

        // Only the earliest bucket can hold a reclaimable key.
        let (deadline, bucket) = self.expirations.first_key_value()?;
        if *deadline > now {
            return None;
        }

        let key = bucket.iter().next()?.clone();
        let value = self.entries.get(&key)?.value().to_owned();
        self.remove(&key);

        debug!(key = %key, "reclaimed expired entry");
        Some((key, value))
    }

    /// Delete up to `max` expired entries, returning them in reclamation
    /// order
    ///
    /// A bounded convenience loop over [`TtlStore::reclaim_one_expired`]
    /// for callers sweeping on a cadence. Stops as soon as nothing more is
    /// reclaimable.
    pub fn reclaim_expired(&mut self, max: usize) -> Vec<(String, String)> {
        let mut reclaimed = Vec::new();
        while reclaimed.len() < max {
            match self.reclaim_one_expired() {
                Some(pair) => reclaimed.push(pair),
                None => break,
            }
        }
        reclaimed
    }

    // =========================================================================
    // Accessors (for sweepers, testing and debugging)
    // =========================================================================

    /// Number of entries physically present (live or awaiting reclamation)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The earliest scheduled deadline, if any entry can ever expire
    ///
    /// Lets an external sweeper pick its cadence without polling
    /// [`TtlStore::reclaim_one_expired`].
    pub fn next_expiration(&self) -> Option<Instant> {
        self.expirations.keys().next().copied()
    }

    // =========================================================================
    // Internal Index Maintenance
    // =========================================================================

    /// Drop `key` from the bucket at `deadline`, removing the bucket if
    /// that leaves it empty
    fn unschedule(&mut self, deadline: Instant, key: &str) {
        if let Some(bucket) = self.expirations.get_mut(&deadline) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.expirations.remove(&deadline);
            }
        }
    }
}

impl Default for TtlStore<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}
