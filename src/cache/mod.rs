//! Memoization store for solved components.
//!
//! Every component pushed on the component stack gets an entry here, keyed by
//! its [`Signature`]. Entries form a tree: the father of an entry is the entry
//! of the super-component it was split off from.
//!
//! # Lookup table
//!
//! An entry becomes visible to lookups only once a model count is attached
//! ([`ComponentCache::store_value_of`]). Visible entries are chained into
//! buckets, much like a unique table:
//!
//! ```text
//! table[hash & mask] -> id -> next_bucket_element -> ... -> NONE
//! ```
//!
//! The table doubles when there are more live entries than buckets and
//! shrinks again after eviction.
//!
//! # Reclamation
//!
//! - [`clean_pollutions_involving`][ComponentCache::clean_pollutions_involving]
//!   erases an entry together with its whole descendant subtree,
//! - [`delete_entries`][ComponentCache::delete_entries] erases the older half
//!   of the entries flagged deletable, re-parenting their children.
//!
//! Ids are never reused, but erased entries leave nothing behind: entries
//! live in a map keyed by id. Id `0` means "none" and id `1` is the root.

use std::collections::HashMap;
use std::mem::size_of;

use log::debug;
use num_bigint::BigUint;

use crate::component::{Component, Signature};
use crate::stack::StackLevel;
use crate::types::CacheEntryId;
use crate::utils::MyHash;

mod entry;

pub use entry::CacheEntry;

pub struct ComponentCache {
    entries: HashMap<CacheEntryId, CacheEntry>,
    next_id: u32,
    table: Vec<CacheEntryId>,
    table_size_mask: u64,
    min_table_size: usize,
    my_time: u64,
    lookups: usize,
    hits: usize,
    sum_bytes_cached_components: usize,
    bytes_memory_usage: usize,
}

impl Default for ComponentCache {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ComponentCache {
    /// Creates a store with an initial table of `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits should be in the range 0..=31");

        let size = 1usize << bits;
        let mut cache = Self {
            entries: HashMap::new(),
            next_id: 1,
            table: vec![CacheEntryId::NONE; size],
            table_size_mask: (size - 1) as u64,
            min_table_size: size,
            my_time: 0,
            lookups: 0,
            hits: 0,
            sum_bytes_cached_components: 0,
            bytes_memory_usage: 0,
        };
        cache.recompute_bytes_memory_usage();
        cache
    }

    /// Registers the whole-formula component as the root entry and sets its id.
    pub fn init(&mut self, root: &mut Component, signature: Signature) {
        self.entries.clear();
        self.table.fill(CacheEntryId::NONE);
        self.sum_bytes_cached_components = 0;
        self.my_time = 1;

        let root_id = self.root_id();
        let entry = CacheEntry::new(signature, CacheEntryId::NONE, self.my_time);
        self.incorporate(root_id, entry);
        self.next_id = root_id.id() + 1;
        root.set_id(root_id);

        self.recompute_bytes_memory_usage();
    }

    pub fn root_id(&self) -> CacheEntryId {
        CacheEntryId::new(1)
    }

    /// Number of live entries.
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn lookups(&self) -> usize {
        self.lookups
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Memory estimate as of the last [`recompute_bytes_memory_usage`][Self::recompute_bytes_memory_usage].
    pub fn bytes_memory_usage(&self) -> usize {
        self.bytes_memory_usage
    }

    pub fn has_entry(&self, id: CacheEntryId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entry(&self, id: CacheEntryId) -> &CacheEntry {
        match self.entries.get(&id) {
            Some(entry) => entry,
            None => panic!("No cache entry {}", id),
        }
    }

    fn entry_mut(&mut self, id: CacheEntryId) -> &mut CacheEntry {
        match self.entries.get_mut(&id) {
            Some(entry) => entry,
            None => panic!("No cache entry {}", id),
        }
    }

    fn incorporate(&mut self, id: CacheEntryId, entry: CacheEntry) {
        self.sum_bytes_cached_components += entry.size_in_bytes();
        self.entries.insert(id, entry);
    }

    /// Mints a fresh id for `signature`, a child of `super_comp_id`.
    pub fn store_as_entry(&mut self, signature: Signature, super_comp_id: CacheEntryId) -> CacheEntryId {
        assert!(self.has_entry(super_comp_id), "No cache entry {}", super_comp_id);

        self.my_time += 1;
        let id = CacheEntryId::new(self.next_id);
        self.next_id += 1;
        let entry = CacheEntry::new(signature, super_comp_id, self.my_time);
        self.incorporate(id, entry);
        self.entry_mut(super_comp_id).add_descendant(id);
        id
    }

    /// Looks `signature` up; on a hit, the cached count is folded into `top`.
    pub fn manage_new_component(&mut self, top: &mut StackLevel, signature: &Signature) -> bool {
        self.lookups += 1;
        let bucket = self.bucket_of(MyHash::hash(signature));
        let mut act_id = self.table[bucket];
        while !act_id.is_none() {
            let entry = self.entry(act_id);
            if entry.signature() == signature {
                if let Some(count) = entry.model_count() {
                    let count = count.clone();
                    self.hits += 1;
                    top.include_solution(count);
                    return true;
                }
            }
            act_id = entry.next_bucket_element();
        }
        false
    }

    /// Attaches `model_count` to `id`, making it visible to lookups.
    pub fn store_value_of(&mut self, id: CacheEntryId, model_count: BigUint) {
        self.consider_cache_resize();

        if self.entry(id).model_count_found() {
            self.unlink_from_table(id);
        }
        let time = self.my_time;
        let old_size = self.entry(id).size_in_bytes();
        let bucket = self.bucket_of(self.entry(id).hash_key());
        let head = self.table[bucket];

        let entry = self.entry_mut(id);
        entry.set_model_count(model_count, time);
        entry.set_next_bucket_element(head);
        let new_size = entry.size_in_bytes();
        self.table[bucket] = id;

        self.sum_bytes_cached_components = self.sum_bytes_cached_components - old_size + new_size;
    }

    pub fn set_deletable(&mut self, id: CacheEntryId) {
        self.entry_mut(id).set_deletable();
    }

    /// Erases `id` and its whole descendant subtree.
    pub fn clean_pollutions_involving(&mut self, id: CacheEntryId) {
        let father = self.entry(id).father();
        if self.has_entry(father) {
            self.entry_mut(father).remove_descendant(id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if !self.has_entry(next) {
                continue;
            }
            pending.extend(self.entry_mut(next).take_descendants());
            self.erase_entry(next);
        }
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash & self.table_size_mask) as usize
    }

    fn erase_entry(&mut self, id: CacheEntryId) {
        assert_ne!(id, self.root_id(), "The root entry is never erased");
        if self.entry(id).model_count_found() {
            self.unlink_from_table(id);
        }
        if let Some(entry) = self.entries.remove(&id) {
            self.sum_bytes_cached_components -= entry.size_in_bytes();
        }
    }

    fn unlink_from_table(&mut self, id: CacheEntryId) {
        let bucket = self.bucket_of(self.entry(id).hash_key());
        let next = self.entry(id).next_bucket_element();

        if self.table[bucket] == id {
            self.table[bucket] = next;
        } else {
            let mut act_id = self.table[bucket];
            while !act_id.is_none() {
                let following = self.entry(act_id).next_bucket_element();
                if following == id {
                    self.entry_mut(act_id).set_next_bucket_element(next);
                    break;
                }
                act_id = following;
            }
        }
        self.entry_mut(id).set_next_bucket_element(CacheEntryId::NONE);
    }

    fn consider_cache_resize(&mut self) {
        if self.entries.len() > self.table.len() {
            self.rehash_table(2 * self.table.len());
        }
    }

    /// Halves the table while it is more than four times the live entries,
    /// never below its initial size.
    fn consider_cache_shrink(&mut self) {
        let mut size = self.table.len();
        while size > self.min_table_size && 4 * self.entries.len() < size {
            size /= 2;
        }
        if size < self.table.len() {
            self.rehash_table(size);
        }
    }

    fn rehash_table(&mut self, size: usize) {
        debug!("rehash_table: {} -> {} buckets", self.table.len(), size);
        self.table = vec![CacheEntryId::NONE; size];
        self.table_size_mask = (size - 1) as u64;

        let mut visible: Vec<CacheEntryId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.model_count_found())
            .map(|(&id, _)| id)
            .collect();
        visible.sort_unstable();

        for id in visible {
            let bucket = self.bucket_of(self.entry(id).hash_key());
            let head = self.table[bucket];
            self.entry_mut(id).set_next_bucket_element(head);
            self.table[bucket] = id;
        }
    }

    /// Moves the children of `id` to its father and detaches `id`.
    fn remove_from_descendants_tree(&mut self, id: CacheEntryId) {
        let father = self.entry(id).father();
        assert!(self.has_entry(father), "Entry {} has no live father", id);

        self.entry_mut(father).remove_descendant(id);
        for child in self.entry_mut(id).take_descendants() {
            self.entry_mut(child).set_father(father);
            self.entry_mut(father).add_descendant(child);
        }
    }

    /// Erases the deletable entries created at or before the median creation
    /// time of all deletable entries. Returns the number of erased entries.
    pub fn delete_entries(&mut self) -> usize {
        let root_id = self.root_id();
        let mut candidates: Vec<(CacheEntryId, u64)> = self
            .entries
            .iter()
            .filter(|&(&id, e)| id != root_id && e.is_deletable())
            .map(|(&id, e)| (id, e.creation_time()))
            .collect();
        if candidates.is_empty() {
            return 0;
        }
        let num_deletable = candidates.len();

        let mut times: Vec<u64> = candidates.iter().map(|&(_, t)| t).collect();
        times.sort_unstable();
        let cutoff = times[times.len() / 2];

        candidates.sort_unstable();
        let mut erased = 0;
        for (id, time) in candidates {
            if time <= cutoff {
                self.remove_from_descendants_tree(id);
                self.erase_entry(id);
                erased += 1;
            }
        }

        self.consider_cache_shrink();
        self.recompute_bytes_memory_usage();
        debug!(
            "delete_entries: erased {} of {} deletable entries, {} left, {} bytes",
            erased,
            num_deletable,
            self.entries.len(),
            self.bytes_memory_usage
        );
        erased
    }

    /// Recomputes the memory estimate: live entries, their keys and the table.
    pub fn recompute_bytes_memory_usage(&mut self) -> usize {
        let infrastructure =
            self.table.len() * size_of::<CacheEntryId>() + self.entries.len() * size_of::<CacheEntryId>();
        self.bytes_memory_usage = infrastructure + self.sum_bytes_cached_components;
        self.bytes_memory_usage
    }
}
