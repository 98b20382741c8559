//! The sliding vote window and the incremental prevote/precommit algorithm.
//!
//! One signed block casts an explicit prevote for its own height and implicit
//! prevotes for every ancestor height its generator can provably not have
//! abandoned. Precommit weight is only added to heights that already carry
//! threshold prevote weight. Weights only accumulate and the threshold scans
//! start from the newest block, so the derived finality heights never move
//! backwards.

use crate::error::BftResult;
use crate::ports::StateStore;
use crate::store::cache::ParamsCache;
use crate::types::{Address, BlockHeader};
use serde::{Deserialize, Serialize};

/// Voting facts of one recent block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBftInfo {
    pub height: u32,
    pub generator_address: Address,
    pub max_height_generated: u32,
    pub max_height_prevoted: u32,
    pub prevote_weight: u64,
    pub precommit_weight: u64,
}

impl BlockBftInfo {
    /// Zero-weight voting facts for a freshly accepted header.
    pub fn from_header(header: &BlockHeader) -> Self {
        Self {
            height: header.height,
            generator_address: header.generator_address,
            max_height_generated: header.max_height_generated,
            max_height_prevoted: header.max_height_prevoted,
            prevote_weight: 0,
            precommit_weight: 0,
        }
    }
}

/// Per-validator bounds constraining which heights it may still contribute
/// precommit weight to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveValidatorVoteInfo {
    pub address: Address,
    /// First height at which the validator joined the current set
    pub min_active_height: u32,
    /// Highest height the validator has already precommitted
    pub largest_height_precommit: u32,
}

/// Chain-wide vote ledger: the three finality heights, the newest-first
/// window of recent block facts, and per-validator bookkeeping.
///
/// One instance exists for the whole chain. It is created at genesis, mutated
/// exactly once per accepted block, and always passed explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BftVotes {
    pub max_height_prevoted: u32,
    pub max_height_precommitted: u32,
    pub max_height_certified: u32,
    /// Newest first, strictly descending by height, length bounded by the
    /// window size
    pub block_bft_infos: Vec<BlockBftInfo>,
    /// Sorted by address
    pub active_validators_vote_info: Vec<ActiveValidatorVoteInfo>,
}

impl BftVotes {
    /// Ledger as written at genesis: all three heights start at the genesis
    /// height, nothing tracked yet.
    pub fn genesis(height: u32) -> Self {
        Self {
            max_height_prevoted: height,
            max_height_precommitted: height,
            max_height_certified: height,
            block_bft_infos: Vec::new(),
            active_validators_vote_info: Vec::new(),
        }
    }

    /// Height of the newest tracked block, or `max_height_prevoted` when the
    /// window is empty.
    pub fn current_height(&self) -> u32 {
        self.block_bft_infos
            .first()
            .map_or(self.max_height_prevoted, |info| info.height)
    }

    /// Prepend the header's voting facts and truncate the window.
    pub fn insert_block_info(&mut self, header: &BlockHeader, max_length: usize) {
        self.block_bft_infos.insert(0, BlockBftInfo::from_header(header));
        self.block_bft_infos.truncate(max_length);
    }

    /// Window entry at `height`, if still tracked. The window is newest-first
    /// and strictly descending, so the entry for height `h` sits at index
    /// `newest - h`.
    pub(crate) fn info_at(&self, height: u32) -> Option<&BlockBftInfo> {
        let newest = self.block_bft_infos.first()?.height;
        if height > newest {
            return None;
        }
        self.block_bft_infos.get((newest - height) as usize)
    }

    /// Greatest height the newest block's generator cannot be assumed to have
    /// prevoted.
    ///
    /// Starting from the newest entry's `max_height_generated`, follows each
    /// own-block's `max_height_generated` pointer backwards while the pointed
    /// block has the same generator and strictly decreases the pointer. The
    /// walk stops at the first break; if it runs off the window, every
    /// tracked height is covered and one less than the oldest is returned.
    /// `None` when the window is empty.
    pub fn height_not_prevoted(&self) -> Option<u32> {
        let newest = self.block_bft_infos.first()?;
        let current_height = newest.height;
        let mut previous_height = newest.max_height_generated;

        loop {
            let distance = current_height.saturating_sub(previous_height) as usize;
            if distance >= self.block_bft_infos.len() {
                return Some(current_height - self.block_bft_infos.len() as u32);
            }
            let info = &self.block_bft_infos[distance];
            if info.generator_address != newest.generator_address
                || info.max_height_generated >= previous_height
            {
                return Some(previous_height);
            }
            previous_height = info.max_height_generated;
        }
    }

    /// Apply the newest block's explicit and implied votes to the window.
    ///
    /// No-op when the window is empty, when the block claims
    /// `max_height_generated >= height` (implying no votes), or when its
    /// generator is not in the active set.
    pub async fn update_prevotes_precommits<S: StateStore>(
        &mut self,
        params: &mut ParamsCache<'_, S>,
    ) -> BftResult<()> {
        let Some(newest) = self.block_bft_infos.first() else {
            return Ok(());
        };
        if newest.max_height_generated >= newest.height {
            return Ok(());
        }
        let generator = newest.generator_address;
        let new_max_height_generated = newest.max_height_generated;
        let Some(vote_idx) = self
            .active_validators_vote_info
            .iter()
            .position(|v| v.address == generator)
        else {
            return Ok(());
        };
        let Some(height_not_prevoted) = self.height_not_prevoted() else {
            return Ok(());
        };

        let infos = &mut self.block_bft_infos;
        let vote_infos = &mut self.active_validators_vote_info;

        let min_precommit_height = {
            let vote_info = &vote_infos[vote_idx];
            vote_info
                .min_active_height
                .max(height_not_prevoted + 1)
                .max(vote_info.largest_height_precommit + 1)
        };

        // Precommits go to heights already prevoted by threshold weight, and
        // largest_height_precommit advances to the highest such height once.
        let mut has_precommitted = false;
        for info in infos.iter_mut() {
            if info.height < min_precommit_height {
                break;
            }
            let params_at = params.get(info.height).await?;
            if info.prevote_weight >= params_at.prevote_threshold {
                let weight = params_at.weight_of(&generator, info.height)?;
                info.precommit_weight = info.precommit_weight.saturating_add(weight);
                if !has_precommitted {
                    vote_infos[vote_idx].largest_height_precommit = info.height;
                    has_precommitted = true;
                }
            }
        }

        // Explicit prevote for the block itself plus implied prevotes down to
        // the generator's unbroken ancestor chain or activation height.
        let min_prevote_height =
            (new_max_height_generated + 1).max(vote_infos[vote_idx].min_active_height);
        for info in infos.iter_mut() {
            if info.height < min_prevote_height {
                break;
            }
            let params_at = params.get(info.height).await?;
            let weight = params_at.weight_of(&generator, info.height)?;
            info.prevote_weight = info.prevote_weight.saturating_add(weight);
        }

        Ok(())
    }

    /// Newest height whose prevote weight meets its height-effective
    /// threshold becomes `max_height_prevoted`.
    pub async fn update_max_height_prevoted<S: StateStore>(
        &mut self,
        params: &mut ParamsCache<'_, S>,
    ) -> BftResult<()> {
        for info in &self.block_bft_infos {
            let params_at = params.get(info.height).await?;
            if info.prevote_weight >= params_at.prevote_threshold {
                self.max_height_prevoted = info.height;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Newest height whose precommit weight meets its height-effective
    /// threshold becomes `max_height_precommitted`.
    pub async fn update_max_height_precommitted<S: StateStore>(
        &mut self,
        params: &mut ParamsCache<'_, S>,
    ) -> BftResult<()> {
        for info in &self.block_bft_infos {
            let params_at = params.get(info.height).await?;
            if info.precommit_weight >= params_at.precommit_threshold {
                self.max_height_precommitted = info.height;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Adopt the height of the header's aggregate commit, if it carries one.
    pub fn update_max_height_certified(&mut self, header: &BlockHeader) {
        if header.aggregate_commit.is_empty() {
            return;
        }
        self.max_height_certified = header.aggregate_commit.height;
    }
}
