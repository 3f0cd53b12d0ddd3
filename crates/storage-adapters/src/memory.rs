//! # In-memory store adapter
//!
//! A process-local implementation of the store port with the same
//! observable semantics as the real server: absent-key reads are empty,
//! mutations on missing keys are no-ops, and collection keys disappear
//! when their last element goes. Backed by dashmap so concurrent test
//! tasks behave.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use dashmap::DashMap;
use domains::ports::{KvStore, StoreWrite};
use domains::Result;

#[derive(Default)]
pub struct MemoryStore {
    counters: DashMap<String, i64>,
    hashes: DashMap<String, HashMap<String, String>>,
    lists: DashMap<String, VecDeque<String>>,
    zsets: DashMap<String, BTreeMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize possibly-negative range indices against `len`, clamping
    /// to valid bounds. Mirrors the store's LRANGE/LTRIM index rules.
    fn resolve_range(len: i64, start: i64, stop: i64) -> Option<(usize, usize)> {
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len || stop < 0 {
            return None;
        }
        Some((start as usize, stop as usize))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.counters.contains_key(key)
            || self.hashes.contains_key(key)
            || self.lists.contains_key(key)
            || self.zsets.contains_key(key))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.counters.remove(key);
        self.hashes.remove(key);
        self.lists.remove(key);
        self.zsets.remove(key);
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self.hashes.get(key).map(|hash| hash.clone()).unwrap_or_default())
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        let current = hash
            .get(field)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn list_prepend(&self, key: &str, value: &str) -> Result<()> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let Some(mut list) = self.lists.get_mut(key) else {
            return Ok(());
        };
        let len = list.len() as i64;
        match Self::resolve_range(len, start, stop) {
            Some((start, stop)) => {
                list.drain(stop + 1..);
                list.drain(..start);
            }
            None => list.clear(),
        }
        let emptied = list.is_empty();
        drop(list);
        if emptied {
            self.lists.remove(key);
        }
        Ok(())
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let Some(list) = self.lists.get(key) else {
            return Ok(Vec::new());
        };
        let len = list.len() as i64;
        Ok(match Self::resolve_range(len, start, stop) {
            Some((start, stop)) => list.iter().skip(start).take(stop - start + 1).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn list_remove(&self, key: &str, value: &str) -> Result<u64> {
        let Some(mut list) = self.lists.get_mut(key) else {
            return Ok(0);
        };
        let before = list.len();
        list.retain(|v| v != value);
        let removed = (before - list.len()) as u64;
        let emptied = list.is_empty();
        drop(list);
        if emptied {
            self.lists.remove(key);
        }
        Ok(removed)
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        Ok(self.lists.get(key).map(|list| list.len() as u64).unwrap_or(0))
    }

    async fn sorted_add_nx(&self, key: &str, member: &str, score: i64) -> Result<bool> {
        // The entry guard holds the shard lock, making check-and-set one
        // atomic step like the server-side operation it stands in for.
        let mut zset = self.zsets.entry(key.to_string()).or_default();
        if zset.contains_key(member) {
            return Ok(false);
        }
        zset.insert(member.to_string(), score);
        Ok(true)
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> Result<bool> {
        let Some(mut zset) = self.zsets.get_mut(key) else {
            return Ok(false);
        };
        let removed = zset.remove(member).is_some();
        let emptied = zset.is_empty();
        drop(zset);
        if emptied {
            self.zsets.remove(key);
        }
        Ok(removed)
    }

    async fn sorted_range(&self, key: &str) -> Result<Vec<String>> {
        let Some(zset) = self.zsets.get(key) else {
            return Ok(Vec::new());
        };
        let mut members: Vec<(i64, String)> = zset
            .iter()
            .map(|(member, &score)| (score, member.clone()))
            .collect();
        members.sort();
        Ok(members.into_iter().map(|(_, member)| member).collect())
    }

    async fn sorted_rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let ordered = self.sorted_range(key).await?;
        Ok(ordered.iter().position(|m| m == member).map(|p| p as u64))
    }

    async fn sorted_score(&self, key: &str, member: &str) -> Result<Option<i64>> {
        Ok(self.zsets.get(key).and_then(|zset| zset.get(member).copied()))
    }

    async fn run_batch(&self, writes: Vec<StoreWrite>) -> Result<()> {
        for write in writes {
            match write {
                StoreWrite::HashSet { key, fields } => self.hash_set(&key, &fields).await?,
                StoreWrite::ListPrepend { key, value } => self.list_prepend(&key, &value).await?,
                StoreWrite::ListTrim { key, start, stop } => {
                    self.list_trim(&key, start, stop).await?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_is_monotonic_from_one() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("global:pid").await.unwrap(), 1);
        assert_eq!(store.incr("global:pid").await.unwrap(), 2);
        assert_eq!(store.incr("global:cid").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_range_handles_negative_indices() {
        let store = MemoryStore::new();
        for v in ["c", "b", "a"] {
            store.list_prepend("k", v).await.unwrap();
        }
        // Head is the most recently prepended value.
        assert_eq!(
            store.list_range("k", 0, -1).await.unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(store.list_range("k", 1, 1).await.unwrap(), vec!["b"]);
        assert_eq!(store.list_range("k", 5, 9).await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn trim_keeps_the_requested_window() {
        let store = MemoryStore::new();
        for v in ["d", "c", "b", "a"] {
            store.list_prepend("k", v).await.unwrap();
        }
        store.list_trim("k", 0, 2).await.unwrap();
        assert_eq!(
            store.list_range("k", 0, -1).await.unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn emptied_collections_stop_existing() {
        let store = MemoryStore::new();
        store.list_prepend("l", "x").await.unwrap();
        store.list_remove("l", "x").await.unwrap();
        assert!(!store.exists("l").await.unwrap());

        store.sorted_add_nx("z", "m", 1).await.unwrap();
        store.sorted_remove("z", "m").await.unwrap();
        assert!(!store.exists("z").await.unwrap());
    }

    #[tokio::test]
    async fn sorted_range_orders_by_score_then_member() {
        let store = MemoryStore::new();
        store.sorted_add_nx("z", "10", 3).await.unwrap();
        store.sorted_add_nx("z", "2", 1).await.unwrap();
        store.sorted_add_nx("z", "11", 1).await.unwrap();
        assert_eq!(store.sorted_range("z").await.unwrap(), vec!["11", "2", "10"]);
        assert_eq!(store.sorted_rank("z", "2").await.unwrap(), Some(1));
        assert_eq!(store.sorted_rank("z", "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn hash_incr_by_counts_missing_fields_as_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.hash_incr_by("h", "score", -2).await.unwrap(), -2);
        assert_eq!(store.hash_incr_by("h", "score", 5).await.unwrap(), 3);
        assert_eq!(
            store.hash_get("h", "score").await.unwrap(),
            Some("3".to_string())
        );
    }
}
