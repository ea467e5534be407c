//! HistoryMap: a key/value map that remembers when bindings were inserted.
//!
//! Besides the usual map contract, every `put` appends a [`HistoryEntry`]
//! to an insertion log ordered by `(timestamp, insertion sequence)`. The
//! log answers time-window questions ("what was inserted after T?") and
//! drives oldest/latest eviction.
//!
//! # Log policy
//!
//! Overwriting a key appends a new entry and leaves the superseded one in
//! the log, so time-window queries see raw insertion events. Removing a key
//! (directly or through any eviction) prunes **every** log entry for that
//! key, so the log never refers to a key that is no longer mapped.
//! [`HistoryMap::compact`] drops superseded entries on demand.
//!
//! Oldest/latest operations look only at *current* entries, i.e. the most
//! recent insertion of each mapped key.
//!
//! # Concurrency
//!
//! Not synchronized. Wrap in a `RwLock` or `Mutex` to share across threads.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock instant with millisecond resolution (milliseconds since the
/// Unix epoch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        SystemTime::now().into()
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        // Times before the epoch collapse to zero.
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of insertion timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// One insertion event: the key and value as they were put, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry<K, V> {
    time: Timestamp,
    key: K,
    value: V,
}

impl<K, V> HistoryEntry<K, V> {
    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for HistoryEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[time:{},key:{},val:{}]", self.time, self.key, self.value)
    }
}

/// Position of an entry in the log. `seq` breaks ties between equal
/// timestamps in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Stamp {
    at: Timestamp,
    seq: u64,
}

impl Stamp {
    /// Sorts before every real stamp taken at `at`.
    fn first(at: Timestamp) -> Self {
        Self { at, seq: 0 }
    }

    /// Sorts after every real stamp taken at `at`.
    fn last(at: Timestamp) -> Self {
        Self { at, seq: u64::MAX }
    }
}

/// Current value of a key plus the stamps of all its live log entries
/// (ascending; the last one is the current entry).
#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    stamps: Vec<Stamp>,
}

impl<V> Slot<V> {
    fn current(&self) -> Option<Stamp> {
        self.stamps.last().copied()
    }
}

/// Map with an insertion-time log. See the [module docs](self).
pub struct HistoryMap<K, V> {
    log: BTreeMap<Stamp, HistoryEntry<K, V>>,
    slots: HashMap<K, Slot<V>>,
    clock: Arc<dyn Clock>,
    /// Highest timestamp handed out so far.
    high_water: Timestamp,
    next_seq: u64,
}

impl<K, V> HistoryMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty map stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty map stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            log: BTreeMap::new(),
            slots: HashMap::new(),
            clock,
            high_water: Timestamp::default(),
            next_seq: 0,
        }
    }

    /// Stamps never go backwards, even if the clock does.
    fn next_stamp(&mut self) -> Stamp {
        let at = self.clock.now().max(self.high_water);
        self.high_water = at;
        let seq = self.next_seq;
        self.next_seq += 1;
        Stamp { at, seq }
    }

    /// Bind `key` to `value`, log the insertion, and return the previous value.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let stamp = self.next_stamp();
        self.log.insert(
            stamp,
            HistoryEntry {
                time: stamp.at,
                key: key.clone(),
                value: value.clone(),
            },
        );

        match self.slots.get_mut(&key) {
            Some(slot) => {
                slot.stamps.push(stamp);
                Some(std::mem::replace(&mut slot.value, value))
            }
            None => {
                self.slots.insert(
                    key,
                    Slot {
                        value,
                        stamps: vec![stamp],
                    },
                );
                None
            }
        }
    }

    /// Put every pair in order; each gets its own log entry.
    pub fn put_all<I: IntoIterator<Item = (K, V)>>(&mut self, pairs: I) {
        for (key, value) in pairs {
            self.put(key, value);
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.get(key).map(|slot| &slot.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.slots.values().any(|slot| &slot.value == value)
    }

    /// The log entry of the key's most recent insertion.
    pub fn history_entry<Q>(&self, key: &Q) -> Option<&HistoryEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let stamp = self.slots.get(key)?.current()?;
        self.log.get(&stamp)
    }

    /// Unbind `key` and prune all of its log entries.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.slots.remove(key)?;
        for stamp in &slot.stamps {
            self.log.remove(stamp);
        }
        Some(slot.value)
    }

    pub fn clear(&mut self) {
        self.log.clear();
        self.slots.clear();
    }

    /// Number of mapped keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of entries in the insertion log, superseded ones included.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.values().map(|slot| &slot.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().map(|(key, slot)| (key, &slot.value))
    }

    /// All log entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry<K, V>> {
        self.log.values()
    }

    fn oldest_key(&self) -> Option<&K> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| slot.current().map(|stamp| (stamp, key)))
            .min_by_key(|(stamp, _)| *stamp)
            .map(|(_, key)| key)
    }

    fn latest_key(&self) -> Option<&K> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| slot.current().map(|stamp| (stamp, key)))
            .max_by_key(|(stamp, _)| *stamp)
            .map(|(_, key)| key)
    }

    /// Current entry with the earliest insertion time.
    pub fn oldest_entry(&self) -> Option<&HistoryEntry<K, V>> {
        self.history_entry(self.oldest_key()?)
    }

    /// Current entry with the latest insertion time.
    pub fn latest_entry(&self) -> Option<&HistoryEntry<K, V>> {
        self.history_entry(self.latest_key()?)
    }

    /// Value whose current binding was inserted first.
    pub fn oldest(&self) -> Option<&V> {
        self.get(self.oldest_key()?)
    }

    /// Value whose current binding was inserted last.
    pub fn latest(&self) -> Option<&V> {
        self.get(self.latest_key()?)
    }

    /// Evict the key with the oldest current binding.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let key = self.oldest_key()?.clone();
        let value = self.remove(&key)?;
        Some((key, value))
    }

    /// Evict the key with the most recent current binding.
    pub fn remove_latest(&mut self) -> Option<(K, V)> {
        let key = self.latest_key()?.clone();
        let value = self.remove(&key)?;
        Some((key, value))
    }

    /// Log entries whose time falls in `range`, in insertion order.
    ///
    /// This scans raw insertion events: superseded entries are included.
    pub fn entries_in<R: RangeBounds<Timestamp>>(&self, range: R) -> Vec<&HistoryEntry<K, V>> {
        match stamp_bounds(&range) {
            Some(bounds) => self.log.range(bounds).map(|(_, entry)| entry).collect(),
            None => Vec::new(),
        }
    }

    pub fn entries_before(&self, time: Timestamp) -> Vec<&HistoryEntry<K, V>> {
        self.entries_in(..time)
    }

    pub fn entries_before_inclusive(&self, time: Timestamp) -> Vec<&HistoryEntry<K, V>> {
        self.entries_in(..=time)
    }

    pub fn entries_after(&self, time: Timestamp) -> Vec<&HistoryEntry<K, V>> {
        self.entries_in((Bound::Excluded(time), Bound::Unbounded))
    }

    pub fn entries_after_inclusive(&self, time: Timestamp) -> Vec<&HistoryEntry<K, V>> {
        self.entries_in(time..)
    }

    /// Remove every key that has a log entry in `range`, together with all
    /// of that key's log entries. Returns the evicted bindings in the order
    /// their first matching entry appears in the log.
    pub fn remove_in<R: RangeBounds<Timestamp>>(&mut self, range: R) -> Vec<(K, V)> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for entry in self.entries_in(range) {
            if seen.insert(entry.key.clone()) {
                keys.push(entry.key.clone());
            }
        }

        keys.into_iter()
            .filter_map(|key| {
                let value = self.remove(&key)?;
                Some((key, value))
            })
            .collect()
    }

    pub fn remove_before(&mut self, time: Timestamp) -> Vec<(K, V)> {
        self.remove_in(..time)
    }

    pub fn remove_before_inclusive(&mut self, time: Timestamp) -> Vec<(K, V)> {
        self.remove_in(..=time)
    }

    pub fn remove_after(&mut self, time: Timestamp) -> Vec<(K, V)> {
        self.remove_in((Bound::Excluded(time), Bound::Unbounded))
    }

    pub fn remove_after_inclusive(&mut self, time: Timestamp) -> Vec<(K, V)> {
        self.remove_in(time..)
    }

    /// Drop superseded log entries, keeping only each key's current entry.
    /// Returns how many entries were dropped.
    pub fn compact(&mut self) -> usize {
        let mut dropped = 0;
        for slot in self.slots.values_mut() {
            let current = slot.stamps.pop();
            for stamp in slot.stamps.drain(..) {
                self.log.remove(&stamp);
                dropped += 1;
            }
            slot.stamps.extend(current);
        }
        dropped
    }
}

/// Translate timestamp bounds into log-key bounds. Returns `None` for
/// ranges that cannot contain anything (`BTreeMap::range` panics on those).
fn stamp_bounds<R: RangeBounds<Timestamp>>(range: &R) -> Option<(Bound<Stamp>, Bound<Stamp>)> {
    let lo = match range.start_bound() {
        Bound::Included(&t) => Bound::Included(Stamp::first(t)),
        Bound::Excluded(&t) => Bound::Excluded(Stamp::last(t)),
        Bound::Unbounded => Bound::Unbounded,
    };
    let hi = match range.end_bound() {
        Bound::Included(&t) => Bound::Included(Stamp::last(t)),
        Bound::Excluded(&t) => Bound::Excluded(Stamp::first(t)),
        Bound::Unbounded => Bound::Unbounded,
    };

    if let (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) =
        (&lo, &hi)
    {
        let either_excluded =
            matches!(lo, Bound::Excluded(_)) || matches!(hi, Bound::Excluded(_));
        if a > b || (a == b && either_excluded) {
            return None;
        }
    }
    Some((lo, hi))
}

impl<K, V> Default for HistoryMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for HistoryMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            slots: self.slots.clone(),
            clock: Arc::clone(&self.clock),
            high_water: self.high_water,
            next_seq: self.next_seq,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for HistoryMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryMap")
            .field("log", &self.log.values().collect::<Vec<_>>())
            .field("len", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for HistoryMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, entry) in self.log.values().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{entry}")?;
        }
        f.write_str(")")
    }
}

impl<K, V> Extend<(K, V)> for HistoryMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K, V> FromIterator<(K, V)> for HistoryMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.put_all(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock that only moves when told to.
    #[derive(Debug, Default)]
    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn set(&self, millis: u64) {
            self.0.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_millis(self.0.load(Ordering::SeqCst))
        }
    }

    fn map_with_clock() -> (HistoryMap<&'static str, i32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let map = HistoryMap::with_clock(clock.clone());
        (map, clock)
    }

    fn t(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    fn keys_of(entries: Vec<&HistoryEntry<&'static str, i32>>) -> Vec<&'static str> {
        entries.into_iter().map(|e| *e.key()).collect()
    }

    #[test]
    fn oldest_and_latest_follow_insertion_time() {
        let (mut map, clock) = map_with_clock();
        clock.set(100);
        map.put("k1", 1);
        clock.set(200);
        map.put("k2", 2);

        assert_eq!(map.oldest(), Some(&1));
        assert_eq!(map.latest(), Some(&2));
    }

    #[test]
    fn entries_after_exclusive_and_inclusive() {
        let (mut map, clock) = map_with_clock();
        clock.set(100);
        map.put("k1", 1);
        clock.set(200);
        map.put("k2", 2);

        assert_eq!(keys_of(map.entries_after(t(100))), vec!["k2"]);
        assert_eq!(keys_of(map.entries_after_inclusive(t(100))), vec!["k1", "k2"]);
        assert_eq!(keys_of(map.entries_before(t(200))), vec!["k1"]);
        assert_eq!(keys_of(map.entries_before_inclusive(t(200))), vec!["k1", "k2"]);
    }

    #[test]
    fn put_get_remove_roundtrip() {
        let (mut map, _clock) = map_with_clock();
        assert_eq!(map.put("k", 7), None);
        assert_eq!(map.get("k"), Some(&7));

        assert_eq!(map.remove("k"), Some(7));
        assert_eq!(map.get("k"), None);
        assert!(!map.contains_key("k"));
        assert_eq!(map.log_len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn overwrite_keeps_superseded_entry_in_log() {
        let (mut map, clock) = map_with_clock();
        clock.set(10);
        map.put("a", 1);
        clock.set(20);
        assert_eq!(map.put("a", 2), Some(1));

        assert_eq!(map.len(), 1);
        assert_eq!(map.log_len(), 2);
        let early = map.entries_before(t(20));
        assert_eq!(early.len(), 1);
        assert_eq!(*early[0].value(), 1);
        assert_eq!(map.history_entry("a").map(|e| e.time()), Some(t(20)));
    }

    #[test]
    fn remove_prunes_every_log_entry_for_key() {
        let (mut map, clock) = map_with_clock();
        clock.set(10);
        map.put("a", 1);
        map.put("b", 2);
        clock.set(20);
        map.put("a", 3);

        map.remove("a");
        assert_eq!(keys_of(map.entries_in(..)), vec!["b"]);
        assert_eq!(map.oldest(), Some(&2));
    }

    #[test]
    fn oldest_ignores_superseded_entries() {
        let (mut map, clock) = map_with_clock();
        clock.set(1);
        map.put("a", 1);
        clock.set(2);
        map.put("b", 2);
        clock.set(3);
        map.put("a", 10);

        assert_eq!(map.oldest(), Some(&2));
        assert_eq!(map.latest(), Some(&10));
        assert_eq!(map.oldest_entry().map(|e| *e.key()), Some("b"));
    }

    #[test]
    fn remove_oldest_and_latest_evict_one_binding() {
        let (mut map, clock) = map_with_clock();
        for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
            clock.set(i as u64 * 10);
            map.put(key, i as i32);
        }

        assert_eq!(map.remove_oldest(), Some(("a", 0)));
        assert_eq!(map.remove_latest(), Some(("c", 2)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("b"), Some(&1));
        assert_eq!(map.log_len(), 1);
    }

    #[test]
    fn empty_map_queries() {
        let (mut map, _clock) = map_with_clock();
        assert_eq!(map.oldest(), None);
        assert_eq!(map.latest(), None);
        assert_eq!(map.remove_oldest(), None);
        assert_eq!(map.remove_latest(), None);
        assert!(map.remove_before(t(1_000)).is_empty());
    }

    #[test]
    fn remove_before_and_after_are_bounded_correctly() {
        let (mut map, clock) = map_with_clock();
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            clock.set(100 + i as u64 * 100);
            map.put(key, i as i32);
        }

        let removed = map.remove_before(t(200));
        assert_eq!(removed, vec![("a", 0)]);

        let removed = map.remove_after_inclusive(t(400));
        assert_eq!(removed, vec![("d", 3)]);

        let mut left: Vec<_> = map.keys().copied().collect();
        left.sort();
        assert_eq!(left, vec!["b", "c"]);
    }

    #[test]
    fn remove_in_range_drops_key_even_when_current_entry_is_outside() {
        let (mut map, clock) = map_with_clock();
        clock.set(10);
        map.put("a", 1);
        clock.set(50);
        map.put("a", 2);

        let removed = map.remove_before_inclusive(t(10));
        assert_eq!(removed, vec![("a", 2)]);
        assert!(map.is_empty());
        assert_eq!(map.log_len(), 0);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let (mut map, clock) = map_with_clock();
        clock.set(5);
        map.put("x", 1);
        map.put("y", 2);
        map.put("z", 3);

        assert_eq!(map.oldest(), Some(&1));
        assert_eq!(map.latest(), Some(&3));
        assert_eq!(keys_of(map.entries_after_inclusive(t(5))), vec!["x", "y", "z"]);
        assert!(map.entries_after(t(5)).is_empty());
    }

    #[test]
    fn stamps_never_go_backwards() {
        let (mut map, clock) = map_with_clock();
        clock.set(500);
        map.put("a", 1);
        clock.set(100);
        map.put("b", 2);

        assert_eq!(map.history_entry("b").map(|e| e.time()), Some(t(500)));
        assert_eq!(map.latest(), Some(&2));
    }

    #[test]
    fn degenerate_ranges_are_empty() {
        let (mut map, clock) = map_with_clock();
        clock.set(5);
        map.put("a", 1);

        assert!(map.entries_in(t(5)..t(5)).is_empty());
        assert!(map
            .entries_in((Bound::Excluded(t(5)), Bound::Excluded(t(5))))
            .is_empty());
        assert!(map
            .entries_in((Bound::Excluded(t(5)), Bound::Included(t(5))))
            .is_empty());
        assert_eq!(map.entries_in(t(5)..=t(5)).len(), 1);
    }

    #[test]
    fn compact_keeps_current_entries_only() {
        let (mut map, clock) = map_with_clock();
        clock.set(1);
        map.put("a", 1);
        clock.set(2);
        map.put("a", 2);
        map.put("b", 3);

        assert_eq!(map.compact(), 1);
        assert_eq!(map.log_len(), 2);
        assert_eq!(map.entries_before(t(2)).len(), 0);
        assert_eq!(map.get("a"), Some(&2));
    }

    #[test]
    fn display_lists_log_entries() {
        let clock = Arc::new(ManualClock::default());
        let mut map: HistoryMap<String, String> = HistoryMap::with_clock(clock.clone());
        clock.set(7);
        map.put("k".into(), "v".into());
        map.put("q".into(), "w".into());

        assert_eq!(
            map.to_string(),
            "([time:7ms,key:k,val:v],[time:7ms,key:q,val:w])"
        );
    }

    #[test]
    fn extend_and_collect() {
        let mut map: HistoryMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        map.extend([("c", 3)]);
        assert_eq!(map.len(), 3);
        assert!(map.contains_value(&3));
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.log_len(), 0);
    }
}
