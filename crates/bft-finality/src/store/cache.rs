//! Request-scoped memoized parameter lookups for one block application.

use crate::domain::params::BftParameters;
use crate::error::BftResult;
use crate::ports::StateStore;
use crate::store::params;
use std::collections::HashMap;
use std::sync::Arc;

/// Memoized view over the parameter sub-store for the heights touched while
/// applying one block.
///
/// Throwaway by design: it borrows the store for a single invocation of the
/// lifecycle hook and must never be reused across block applications.
pub struct ParamsCache<'a, S: StateStore> {
    store: &'a S,
    by_height: HashMap<u32, Arc<BftParameters>>,
}

impl<'a, S: StateStore> ParamsCache<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            by_height: HashMap::new(),
        }
    }

    /// Warm the cache so every height in `[from, to]` resolves without
    /// further store reads: one reverse range query over the stored versions,
    /// plus at most one floor fetch for the heights below the oldest version
    /// found in the range.
    pub async fn populate(&mut self, from: u32, to: u32) -> BftResult<()> {
        if from > to {
            return Ok(());
        }
        let entries: Vec<(u32, Arc<BftParameters>)> = params::range_desc(self.store, from, to)
            .await?
            .into_iter()
            .map(|(height, params)| (height, Arc::new(params)))
            .collect();

        let mut cursor = 0usize;
        for height in (from..=to).rev() {
            while cursor < entries.len() && entries[cursor].0 > height {
                cursor += 1;
            }
            if cursor < entries.len() {
                self.by_height.insert(height, entries[cursor].1.clone());
                continue;
            }
            // No stored version within [from, height]: every remaining height
            // shares the version effective just below the range.
            if from == 0 {
                break;
            }
            let below = Arc::new(params::get(self.store, height).await?);
            for h in from..=height {
                self.by_height.insert(h, below.clone());
            }
            break;
        }
        Ok(())
    }

    /// Parameters effective at `height`, memoizing floor lookups on miss.
    pub async fn get(&mut self, height: u32) -> BftResult<Arc<BftParameters>> {
        if let Some(params) = self.by_height.get(&height) {
            return Ok(params.clone());
        }
        let fetched = Arc::new(params::get(self.store, height).await?);
        self.by_height.insert(height, fetched.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::ports::{InMemoryStateStore, IterateOptions, KvPair};
    use crate::types::{Address, BlsKey};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper counting read operations, to pin down the cache's I/O
    /// behavior.
    struct CountingStore {
        inner: InMemoryStateStore,
        reads: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: InMemoryStateStore) -> Self {
            Self {
                inner,
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StateStore for CountingStore {
        async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            self.inner.set(key, value).await
        }

        async fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }

        async fn iterate(&self, options: IterateOptions) -> Result<Vec<KvPair>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.iterate(options).await
        }
    }

    fn params(tag: u8) -> crate::domain::params::BftParameters {
        crate::domain::params::BftParameters {
            prevote_threshold: 3,
            precommit_threshold: 2,
            certificate_threshold: 2,
            validators: vec![crate::domain::params::Validator {
                address: Address([tag; 20]),
                bft_weight: 1,
                generator_key: [tag; 32],
                bls_key: BlsKey([tag; 48]),
            }],
            validators_hash: [tag; 32],
        }
    }

    #[tokio::test]
    async fn test_populate_resolves_whole_range_with_bounded_reads() {
        let mut inner = InMemoryStateStore::new();
        params::set(&mut inner, 5, &params(1)).await.unwrap();
        params::set(&mut inner, 10, &params(2)).await.unwrap();
        let store = CountingStore::new(inner);

        let mut cache = ParamsCache::new(&store);
        cache.populate(8, 12).await.unwrap();
        // One range scan plus one floor fetch below the range.
        assert_eq!(store.reads(), 2);

        for height in 8..=12 {
            cache.get(height).await.unwrap();
        }
        // Every height in [8, 12] was served from memory.
        assert_eq!(store.reads(), 2);

        assert_eq!(*cache.get(9).await.unwrap(), params(1));
        assert_eq!(*cache.get(10).await.unwrap(), params(2));
        assert_eq!(*cache.get(12).await.unwrap(), params(2));
    }

    #[tokio::test]
    async fn test_populate_without_older_version_needed() {
        let mut inner = InMemoryStateStore::new();
        params::set(&mut inner, 8, &params(1)).await.unwrap();
        let store = CountingStore::new(inner);

        let mut cache = ParamsCache::new(&store);
        cache.populate(8, 10).await.unwrap();
        // The range itself covers every height; no extra floor fetch.
        assert_eq!(store.reads(), 1);
        assert_eq!(*cache.get(10).await.unwrap(), params(1));
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_get_falls_back_and_memoizes() {
        let mut inner = InMemoryStateStore::new();
        params::set(&mut inner, 5, &params(1)).await.unwrap();
        let store = CountingStore::new(inner);

        let mut cache = ParamsCache::new(&store);
        assert_eq!(*cache.get(7).await.unwrap(), params(1));
        assert_eq!(store.reads(), 1);
        assert_eq!(*cache.get(7).await.unwrap(), params(1));
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_get_unresolvable_height_fails() {
        let store = InMemoryStateStore::new();
        let mut cache = ParamsCache::new(&store);
        assert!(cache.get(3).await.is_err());
    }
}
