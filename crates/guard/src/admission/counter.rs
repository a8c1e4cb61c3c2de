// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiring counters backing the admission checks.

use bloom_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Key/value store of counters that expire after a TTL.
///
/// Reads of a missing or expired key return zero. Writes replace the value
/// and restart its TTL.
pub trait CounterStore: Send + Sync + 'static {
    fn get_count(&self, key: &str) -> u64;
    fn set_count(&self, key: &str, value: u64, ttl: Duration);
    fn get_amount(&self, key: &str) -> f64;
    fn set_amount(&self, key: &str, value: f64, ttl: Duration);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Count(u64),
    Amount(f64),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: Value,
    expires_at_ms: u64,
}

/// In-process counter store.
///
/// Expired entries are dropped lazily on read; [`MemoryCounters::purge_expired`]
/// sweeps the rest.
pub struct MemoryCounters<C: Clock> {
    clock: C,
    entries: Mutex<HashMap<String, Entry>>,
}

impl<C: Clock> MemoryCounters<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, entries: Mutex::new(HashMap::new()) }
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at_ms > now);
        before - entries.len()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.epoch_ms();
        self.entries.lock().values().filter(|e| e.expires_at_ms > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now => Some(entry.value),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at_ms = self.clock.epoch_ms().saturating_add(ttl.as_millis() as u64);
        self.entries.lock().insert(key.to_string(), Entry { value, expires_at_ms });
    }
}

impl<C: Clock> CounterStore for MemoryCounters<C> {
    fn get_count(&self, key: &str) -> u64 {
        match self.get(key) {
            Some(Value::Count(n)) => n,
            Some(Value::Amount(a)) => a.max(0.0) as u64,
            None => 0,
        }
    }

    fn set_count(&self, key: &str, value: u64, ttl: Duration) {
        self.set(key, Value::Count(value), ttl);
    }

    fn get_amount(&self, key: &str) -> f64 {
        match self.get(key) {
            Some(Value::Amount(a)) => a,
            Some(Value::Count(n)) => n as f64,
            None => 0.0,
        }
    }

    fn set_amount(&self, key: &str, value: f64, ttl: Duration) {
        self.set(key, Value::Amount(value), ttl);
    }
}

#[cfg(test)]
#[path = "counter_tests.rs"]
mod tests;
