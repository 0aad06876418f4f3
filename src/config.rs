/// Solver-wide knobs consumed by the component manager and its cache.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Gate for component caching. When disabled, cache ids are still minted
    /// (reclamation bookkeeping needs them) but lookups always miss and no
    /// results are attached.
    pub perform_component_caching: bool,

    /// The cache bucket table starts with `2^bits` slots and doubles on demand.
    pub cache_table_bits: usize,

    /// Budget for [`ComponentManager::evict_cache_if_needed`][crate::manager::ComponentManager::evict_cache_if_needed].
    pub maximum_cache_size_bytes: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            perform_component_caching: true,
            cache_table_bits: 16,
            maximum_cache_size_bytes: 1 << 30,
        }
    }
}

impl SolverConfig {
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.perform_component_caching = enabled;
        self
    }

    pub fn with_cache_table_bits(mut self, bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits should be in the range 0..=31");
        self.cache_table_bits = bits;
        self
    }

    pub fn with_maximum_cache_size(mut self, bytes: usize) -> Self {
        self.maximum_cache_size_bytes = bytes;
        self
    }
}
