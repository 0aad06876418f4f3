use std::mem::size_of;

use num_bigint::BigUint;

use crate::component::Signature;
use crate::types::CacheEntryId;
use crate::utils::MyHash;

/// One stored component: its signature, its model count once known, and its
/// place in the parent/descendant tree.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    signature: Signature,
    hash: u64,
    model_count: Option<BigUint>,
    creation_time: u64,
    deletable: bool,
    father: CacheEntryId,
    descendants: Vec<CacheEntryId>,
    /// Next entry in the same bucket, [`CacheEntryId::NONE`] at the end.
    next_bucket_element: CacheEntryId,
}

impl CacheEntry {
    pub fn new(signature: Signature, father: CacheEntryId, creation_time: u64) -> Self {
        let hash = MyHash::hash(&signature);
        Self {
            signature,
            hash,
            model_count: None,
            creation_time,
            deletable: false,
            father,
            descendants: Vec::new(),
            next_bucket_element: CacheEntryId::NONE,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn hash_key(&self) -> u64 {
        self.hash
    }

    pub fn model_count(&self) -> Option<&BigUint> {
        self.model_count.as_ref()
    }

    pub fn model_count_found(&self) -> bool {
        self.model_count.is_some()
    }

    pub(super) fn set_model_count(&mut self, count: BigUint, time: u64) {
        self.model_count = Some(count);
        self.creation_time = time;
    }

    pub fn creation_time(&self) -> u64 {
        self.creation_time
    }

    pub fn is_deletable(&self) -> bool {
        self.deletable
    }

    pub fn set_deletable(&mut self) {
        self.deletable = true;
    }

    pub fn father(&self) -> CacheEntryId {
        self.father
    }

    pub(super) fn set_father(&mut self, father: CacheEntryId) {
        self.father = father;
    }

    pub fn descendants(&self) -> &[CacheEntryId] {
        &self.descendants
    }

    pub(super) fn add_descendant(&mut self, id: CacheEntryId) {
        debug_assert!(!self.descendants.contains(&id));
        self.descendants.push(id);
    }

    pub(super) fn remove_descendant(&mut self, id: CacheEntryId) {
        if let Some(pos) = self.descendants.iter().position(|&d| d == id) {
            self.descendants.swap_remove(pos);
        }
    }

    pub(super) fn take_descendants(&mut self) -> Vec<CacheEntryId> {
        std::mem::take(&mut self.descendants)
    }

    pub fn next_bucket_element(&self) -> CacheEntryId {
        self.next_bucket_element
    }

    pub(super) fn set_next_bucket_element(&mut self, next: CacheEntryId) {
        self.next_bucket_element = next;
    }

    /// Estimated footprint of the signature and the count.
    ///
    /// The descendant list is left out, so the size only changes when a
    /// count is attached.
    pub fn size_in_bytes(&self) -> usize {
        let count_bytes = self
            .model_count
            .as_ref()
            .map_or(0, |c| (c.bits() as usize).div_ceil(8));
        size_of::<Self>()
            + self.signature.as_words().len() * size_of::<u32>()
            + count_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::types::{ClauseId, Var};

    #[test]
    fn test_size_grows_with_count() {
        let sig = Signature::new([1, 2, 3].map(Var::new), [ClauseId::new(1)]);
        let mut entry = CacheEntry::new(sig, CacheEntryId::new(1), 5);
        let before = entry.size_in_bytes();
        assert!(!entry.model_count_found());

        entry.set_model_count(BigUint::from(1u32) << 100, 7);
        assert!(entry.size_in_bytes() >= before + 12);
        assert_eq!(entry.creation_time(), 7);
    }

    #[test]
    fn test_descendants() {
        let sig = Signature::new([Var::new(1)], std::iter::empty());
        let mut entry = CacheEntry::new(sig, CacheEntryId::NONE, 1);
        entry.add_descendant(CacheEntryId::new(2));
        entry.add_descendant(CacheEntryId::new(3));
        entry.remove_descendant(CacheEntryId::new(2));
        assert_eq!(entry.descendants(), &[CacheEntryId::new(3)]);
        assert_eq!(entry.take_descendants(), vec![CacheEntryId::new(3)]);
        assert!(entry.descendants().is_empty());
    }
}
