//! Lifecycle facade driven by the block-processing pipeline.
//!
//! The pipeline is the single writer: it applies blocks one at a time and
//! scopes every store handle to the transactional batch of the block being
//! applied. The facade holds no state beyond its configuration; the vote
//! ledger is loaded, mutated and persisted explicitly within each call.

use crate::domain::contradiction::are_distinct_headers_contradicting;
use crate::domain::params::{
    aggregate_bft_weight, check_threshold_range, compute_validators_hash, prevote_threshold,
    same_validators, BftParameters, Validator,
};
use crate::domain::votes::ActiveValidatorVoteInfo;
use crate::error::{BftError, BftResult};
use crate::ports::StateStore;
use crate::store::{self, cache::ParamsCache};
use crate::types::{BftHeights, BlockHeader, GeneratorKeyEntry, GeneratorKeys};
use tracing::{debug, info};

/// Gadget configuration.
#[derive(Clone, Debug)]
pub struct BftConfig {
    /// Maximum validators per parameter set; the vote window keeps
    /// `3 * batch_size` recent blocks.
    pub batch_size: u32,
}

impl Default for BftConfig {
    fn default() -> Self {
        Self { batch_size: 103 }
    }
}

/// The finality gadget's public surface, consumed by the block validator,
/// the fork-choice rule and the synchronizer.
pub struct BftModule {
    batch_size: u32,
    max_window_length: usize,
}

impl BftModule {
    pub fn new(config: BftConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            max_window_length: 3 * config.batch_size as usize,
        }
    }

    /// Write the initial vote ledger: all three finality heights start at the
    /// genesis height, nothing tracked.
    pub async fn init_genesis_state<S: StateStore>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> BftResult<()> {
        let votes = crate::domain::votes::BftVotes::genesis(header.height);
        store::votes::set(store, &votes).await?;
        info!("initialized BFT votes at genesis height {}", header.height);
        Ok(())
    }

    /// Per-block hook: account the header's votes, refresh the finality
    /// heights and prune parameter/generator-key versions no longer
    /// reachable.
    ///
    /// `max_removal_height` is the caller's pruning floor; versions are only
    /// deleted below `min(oldest tracked height, max_removal_height)`.
    pub async fn before_transactions_execute<S: StateStore>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        max_removal_height: u32,
    ) -> BftResult<()> {
        let mut votes = store::votes::get(store).await?;
        votes.insert_block_info(header, self.max_window_length);

        let (oldest, newest) = match (votes.block_bft_infos.last(), votes.block_bft_infos.first())
        {
            (Some(oldest), Some(newest)) => (oldest.height, newest.height),
            _ => {
                return Err(BftError::InvariantViolation {
                    detail: "vote window empty after insert".into(),
                })
            }
        };

        {
            let mut cache = ParamsCache::new(&*store);
            cache.populate(oldest, newest).await?;
            votes.update_prevotes_precommits(&mut cache).await?;
            votes.update_max_height_prevoted(&mut cache).await?;
            votes.update_max_height_precommitted(&mut cache).await?;
        }
        votes.update_max_height_certified(header);

        store::votes::set(store, &votes).await?;

        let min_height_required = oldest.min(max_removal_height);
        store::params::delete(store, min_height_required).await?;
        store::keys::delete(store, min_height_required).await?;

        debug!(
            "applied block {}: maxHeightPrevoted={} maxHeightPrecommitted={} maxHeightCertified={}",
            header.height,
            votes.max_height_prevoted,
            votes.max_height_precommitted,
            votes.max_height_certified,
        );
        Ok(())
    }

    /// The three finality heights.
    pub async fn get_bft_heights<S: StateStore>(&self, store: &S) -> BftResult<BftHeights> {
        let votes = store::votes::get(store).await?;
        Ok(BftHeights {
            max_height_prevoted: votes.max_height_prevoted,
            max_height_precommitted: votes.max_height_precommitted,
            max_height_certified: votes.max_height_certified,
        })
    }

    /// Parameters effective at `height` (floor lookup).
    pub async fn get_bft_parameters<S: StateStore>(
        &self,
        store: &S,
        height: u32,
    ) -> BftResult<BftParameters> {
        store::params::get(store, height).await
    }

    /// Whether a parameter version is stored at exactly `height`.
    pub async fn exist_bft_parameters<S: StateStore>(
        &self,
        store: &S,
        height: u32,
    ) -> BftResult<bool> {
        store::params::exists(store, height).await
    }

    /// Height at which the parameters next change, strictly above `height`.
    pub async fn get_next_height_bft_parameters<S: StateStore>(
        &self,
        store: &S,
        height: u32,
    ) -> BftResult<u32> {
        store::params::next_height(store, height).await
    }

    /// Whether a not-yet-applied header would cast prevotes for every height
    /// down to its own `max_height_generated` pointer.
    ///
    /// Used by proposal validation; the header must sit at the current tip or
    /// extend it by one.
    pub async fn implies_maximal_prevotes<S: StateStore>(
        &self,
        store: &S,
        header: &BlockHeader,
    ) -> BftResult<bool> {
        let votes = store::votes::get(store).await?;
        let tip = votes.current_height();
        if header.height != tip && header.height != tip + 1 {
            return Err(BftError::InvalidHeaderHeight {
                actual: header.height,
                tip,
            });
        }
        if header.max_height_generated >= header.height {
            // The header admits generating at or above its own height: it
            // casts no votes at all.
            return Ok(false);
        }
        let previous_height = header.max_height_generated;
        let oldest = match votes.block_bft_infos.last() {
            Some(info) => info.height,
            None => return Ok(true),
        };
        if previous_height < oldest {
            // The claimed previous own block fell out of the window; nothing
            // can break the chain of implied prevotes.
            return Ok(true);
        }
        let info = votes
            .info_at(previous_height)
            .ok_or_else(|| BftError::InvariantViolation {
                detail: format!("window entry missing for tracked height {previous_height}"),
            })?;
        Ok(info.generator_address == header.generator_address
            && info.max_height_generated < previous_height)
    }

    /// Whether two headers are evidence of double-signing. Identical headers
    /// never contradict.
    pub fn are_headers_contradicting(&self, b1: &BlockHeader, b2: &BlockHeader) -> bool {
        if b1.id == b2.id {
            return false;
        }
        are_distinct_headers_contradicting(&b1.into(), &b2.into())
    }

    /// Whether `header` contradicts the newest tracked block from the same
    /// generator.
    pub async fn is_header_contradicting_chain<S: StateStore>(
        &self,
        store: &S,
        header: &BlockHeader,
    ) -> BftResult<bool> {
        let votes = store::votes::get(store).await?;
        for info in &votes.block_bft_infos {
            if info.generator_address == header.generator_address {
                return Ok(are_distinct_headers_contradicting(
                    &info.into(),
                    &header.into(),
                ));
            }
        }
        Ok(false)
    }

    /// Validate and store a new parameter version at the next height.
    ///
    /// No-op when the proposed set is identical (membership, weights and both
    /// thresholds) to the currently effective one. On success the validator
    /// bookkeeping in the vote ledger is refreshed: retained validators keep
    /// their bounds, new ones start at the next height.
    pub async fn set_bft_parameters<S: StateStore>(
        &self,
        store: &mut S,
        precommit_threshold: u64,
        certificate_threshold: u64,
        validators: Vec<Validator>,
    ) -> BftResult<()> {
        if validators.len() > self.batch_size as usize {
            return Err(BftError::BatchSizeExceeded {
                count: validators.len(),
                batch_size: self.batch_size,
            });
        }
        let aggregate_weight = aggregate_bft_weight(&validators)?;
        check_threshold_range("precommit", precommit_threshold, aggregate_weight)?;
        check_threshold_range("certificate", certificate_threshold, aggregate_weight)?;

        let mut validators = validators;
        validators.sort_by(|a, b| a.address.cmp(&b.address));

        let mut votes = store::votes::get(store).await?;
        let current_height = votes.current_height();

        match store::params::get(store, current_height).await {
            Ok(current) => {
                if same_validators(&current.validators, &validators)
                    && current.precommit_threshold == precommit_threshold
                    && current.certificate_threshold == certificate_threshold
                {
                    debug!(
                        "BFT parameters unchanged at height {current_height}; keeping stored version"
                    );
                    return Ok(());
                }
            }
            Err(BftError::ParameterNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let next_height = current_height + 1;
        let validators_hash = compute_validators_hash(&validators, certificate_threshold)?;
        let params = BftParameters {
            prevote_threshold: prevote_threshold(aggregate_weight),
            precommit_threshold,
            certificate_threshold,
            validators,
            validators_hash,
        };
        store::params::set(store, next_height, &params).await?;

        // Validators already sorted by address, so the bookkeeping list stays
        // address-ordered.
        votes.active_validators_vote_info = params
            .validators
            .iter()
            .map(|v| {
                votes
                    .active_validators_vote_info
                    .iter()
                    .find(|i| i.address == v.address)
                    .cloned()
                    .unwrap_or(ActiveValidatorVoteInfo {
                        address: v.address,
                        min_active_height: next_height,
                        largest_height_precommit: next_height - 1,
                    })
            })
            .collect();
        store::votes::set(store, &votes).await?;

        info!(
            "stored BFT parameters for height {next_height}: {} validators, aggregate weight {aggregate_weight}",
            params.validators.len(),
        );
        Ok(())
    }

    /// Generator keys effective at `height` (floor lookup).
    pub async fn get_generator_keys<S: StateStore>(
        &self,
        store: &S,
        height: u32,
    ) -> BftResult<GeneratorKeys> {
        store::keys::get(store, height).await
    }

    /// Store a generator-key snapshot at the next height.
    pub async fn set_generator_keys<S: StateStore>(
        &self,
        store: &mut S,
        generators: Vec<GeneratorKeyEntry>,
    ) -> BftResult<()> {
        let votes = store::votes::get(store).await?;
        let next_height = votes.current_height() + 1;
        store::keys::set(store, next_height, &GeneratorKeys { generators }).await?;
        Ok(())
    }
}
