//! Versioned parameter sub-store: floor lookups over big-endian height keys.

use crate::domain::params::BftParameters;
use crate::error::{BftError, BftResult};
use crate::ports::{IterateOptions, StateStore};
use crate::store::{decode, decode_height, encode, height_key, PREFIX_PARAMS};

/// Parameters effective at `height`: the stored version with the greatest key
/// less than or equal to `height`.
pub async fn get<S: StateStore>(store: &S, height: u32) -> BftResult<BftParameters> {
    let results = store
        .iterate(IterateOptions {
            gte: height_key(PREFIX_PARAMS, 0),
            lte: height_key(PREFIX_PARAMS, height),
            reverse: true,
            limit: Some(1),
        })
        .await?;
    let pair = results
        .into_iter()
        .next()
        .ok_or(BftError::ParameterNotFound { height })?;
    decode(&pair.value)
}

/// Store a version at exactly `height`. Validation happens in the facade.
pub async fn set<S: StateStore>(
    store: &mut S,
    height: u32,
    params: &BftParameters,
) -> BftResult<()> {
    let value = encode(params)?;
    store.set(&height_key(PREFIX_PARAMS, height), &value).await?;
    Ok(())
}

/// Whether a version is stored at exactly `height`.
pub async fn exists<S: StateStore>(store: &S, height: u32) -> BftResult<bool> {
    Ok(store.has(&height_key(PREFIX_PARAMS, height)).await?)
}

/// Height of the first version stored strictly above `height`.
pub async fn next_height<S: StateStore>(store: &S, height: u32) -> BftResult<u32> {
    let from = height
        .checked_add(1)
        .ok_or(BftError::ParameterNotFound { height })?;
    let results = store
        .iterate(IterateOptions {
            gte: height_key(PREFIX_PARAMS, from),
            lte: height_key(PREFIX_PARAMS, u32::MAX),
            reverse: false,
            limit: Some(1),
        })
        .await?;
    let pair = results
        .into_iter()
        .next()
        .ok_or(BftError::ParameterNotFound { height })?;
    decode_height(PREFIX_PARAMS, &pair.key)
}

/// Drop every version keyed at or below `height` except the most recent of
/// them, so floor lookups at any height >= `height` keep resolving.
pub async fn delete<S: StateStore>(store: &mut S, height: u32) -> BftResult<()> {
    let results = store
        .iterate(IterateOptions {
            gte: height_key(PREFIX_PARAMS, 0),
            lte: height_key(PREFIX_PARAMS, height),
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

/// All versions keyed within `[from, to]`, newest first. Used by the
/// request-scoped cache.
pub(crate) async fn range_desc<S: StateStore>(
    store: &S,
    from: u32,
    to: u32,
) -> BftResult<Vec<(u32, BftParameters)>> {
    let results = store
        .iterate(IterateOptions {
            gte: height_key(PREFIX_PARAMS, from),
            lte: height_key(PREFIX_PARAMS, to),
            reverse: true,
            limit: None,
        })
        .await?;
    results
        .into_iter()
        .map(|pair| Ok((decode_height(PREFIX_PARAMS, &pair.key)?, decode(&pair.value)?)))
        .collect()
}
