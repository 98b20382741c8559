//! Singleton persistence of the chain-wide vote ledger.

use crate::domain::votes::BftVotes;
use crate::error::{BftError, BftResult};
use crate::ports::StateStore;
use crate::store::{decode, encode, PREFIX_VOTES};

/// Load the ledger. It is written at genesis and must exist for every later
/// operation; a missing record is state corruption, not a lookup miss.
pub async fn get<S: StateStore>(store: &S) -> BftResult<BftVotes> {
    let bytes = store
        .get(PREFIX_VOTES)
        .await?
        .ok_or_else(|| BftError::InvariantViolation {
            detail: "BFT votes missing; genesis state was never initialized".into(),
        })?;
    decode(&bytes)
}

pub async fn set<S: StateStore>(store: &mut S, votes: &BftVotes) -> BftResult<()> {
    let value = encode(votes)?;
    store.set(PREFIX_VOTES, &value).await?;
    Ok(())
}
