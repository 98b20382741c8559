//! Driven port: the ordered, byte-keyed state store supplied by the
//! block-processing pipeline.
//!
//! The caller owns transaction scoping; every mutation performed through this
//! port is expected to land in the caller's atomic batch for the block being
//! applied. The gadget itself never commits.

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Options for a bounded range scan over byte keys.
#[derive(Clone, Debug)]
pub struct IterateOptions {
    /// Inclusive lower key bound
    pub gte: Vec<u8>,
    /// Inclusive upper key bound
    pub lte: Vec<u8>,
    /// Scan from the upper bound downwards
    pub reverse: bool,
    /// Stop after this many pairs
    pub limit: Option<usize>,
}

/// One key-value pair returned by a range scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvPair {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Abstract interface for the ordered key-value state store.
///
/// Keys compare lexicographically; the sub-stores encode heights big-endian
/// so numeric and lexicographic order coincide.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get a value by key.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check if a key exists.
    async fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Put a key-value pair.
    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key.
    async fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// Range scan between the inclusive bounds of `options`.
    async fn iterate(&self, options: IterateOptions) -> Result<Vec<KvPair>, StoreError>;
}

/// In-memory state store for unit tests and single-process embedding.
///
/// Production deployments wrap the node's transactional store behind
/// [`StateStore`]; this adapter keeps the same ordering semantics over a
/// `BTreeMap`.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    async fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.data.contains_key(key))
    }

    async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }

    async fn iterate(&self, options: IterateOptions) -> Result<Vec<KvPair>, StoreError> {
        if options.gte > options.lte {
            return Ok(Vec::new());
        }
        let range = (
            Bound::Included(options.gte.clone()),
            Bound::Included(options.lte.clone()),
        );
        let limit = options.limit.unwrap_or(usize::MAX);
        let pairs: Vec<KvPair> = if options.reverse {
            self.data
                .range(range)
                .rev()
                .take(limit)
                .map(|(k, v)| KvPair {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect()
        } else {
            self.data
                .range(range)
                .take(limit)
                .map(|(k, v)| KvPair {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect()
        };
        Ok(pairs)
    }
}
