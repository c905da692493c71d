//! Tagged read-through cache.
//!
//! Entries carry the cache tags of the fetch that produced them and an
//! absolute expiry. Purging a tag drops every entry carrying it; expired
//! entries are treated as absent and removed on access. A hit through
//! [`TaggedCache::get_tagged`] adds the caller's tags to the entry, so an
//! entry shared by several callers answers to every one of their tags.

use std::sync::Arc;

use dashmap::DashMap;
use shared_content::TimeSource;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    tags: Vec<String>,
    expires_at_ms: u64,
}

pub struct TaggedCache<V> {
    entries: DashMap<String, Entry<V>>,
    clock: Arc<dyn TimeSource>,
}

impl<V: Clone> TaggedCache<V> {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_tagged(key, &[])
    }

    /// Fresh value for `key`, recording `tags` on the entry when it hits.
    pub fn get_tagged(&self, key: &str, tags: &[String]) -> Option<V> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get_mut(key) {
            Some(mut entry) if now < entry.expires_at_ms => {
                for tag in tags {
                    if !entry.tags.contains(tag) {
                        entry.tags.push(tag.clone());
                    }
                }
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries
                .remove_if(key, |_, entry| now >= entry.expires_at_ms);
        }
        None
    }

    /// Store `value` for `ttl_ms`. A zero TTL stores nothing.
    pub fn insert(&self, key: impl Into<String>, value: V, tags: &[String], ttl_ms: u64) {
        if ttl_ms == 0 {
            return;
        }
        let expires_at_ms = self.clock.now_ms().saturating_add(ttl_ms);
        self.entries.insert(
            key.into(),
            Entry {
                value,
                tags: tags.to_vec(),
                expires_at_ms,
            },
        );
    }

    /// Drop every entry tagged `tag`. Returns how many were dropped.
    pub fn purge_tag(&self, tag: &str) -> usize {
        self.purge_matching(|_, tags| tags.iter().any(|t| t == tag))
    }

    pub fn purge_key(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop the entry under `key`, returning the tags it carried.
    pub fn take_tags(&self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key).map(|(_, entry)| entry.tags)
    }

    /// Drop every entry whose key and tags satisfy `predicate`.
    pub fn purge_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str, &[String]) -> bool,
    {
        let before = self.entries.len();
        self.entries
            .retain(|key, entry| !predicate(key, &entry.tags));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
