//! Generator-key sub-store: same floor/prune pattern as the parameter
//! sub-store, versioned independently of weight changes.

use crate::error::{BftError, BftResult};
use crate::ports::{IterateOptions, StateStore};
use crate::store::{decode, encode, height_key, PREFIX_KEYS};
use crate::types::GeneratorKeys;

/// Generator keys effective at `height` (floor lookup).
pub async fn get<S: StateStore>(store: &S, height: u32) -> BftResult<GeneratorKeys> {
    let results = store
        .iterate(IterateOptions {
            gte: height_key(PREFIX_KEYS, 0),
            lte: height_key(PREFIX_KEYS, height),
            reverse: true,
            limit: Some(1),
        })
        .await?;
    let pair = results
        .into_iter()
        .next()
        .ok_or(BftError::GeneratorKeysNotFound { height })?;
    decode(&pair.value)
}

/// Store a snapshot at exactly `height`.
pub async fn set<S: StateStore>(
    store: &mut S,
    height: u32,
    keys: &GeneratorKeys,
) -> BftResult<()> {
    let value = encode(keys)?;
    store.set(&height_key(PREFIX_KEYS, height), &value).await?;
    Ok(())
}

/// Drop every snapshot keyed at or below `height` except the most recent of
/// them.
pub async fn delete<S: StateStore>(store: &mut S, height: u32) -> BftResult<()> {
    let results = store
        .iterate(IterateOptions {
            gte: height_key(PREFIX_KEYS, 0),
            lte: height_key(PREFIX_KEYS, height),
            reverse: false,
            limit: None,
        })
        .await?;
    if results.len() <= 1 {
        return Ok(());
    }
    for pair in &results[..results.len() - 1] {
        store.delete(&pair.key).await?;
    }
    Ok(())
}
