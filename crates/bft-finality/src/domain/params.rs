//! Versioned validator-set parameters and their validation.

use crate::error::{BftError, BftResult};
use crate::types::{Address, BlsKey, GeneratorKey, Hash};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A voting member of the active validator set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: Address,
    /// Voting power summed into prevote/precommit weight. Must be > 0.
    pub bft_weight: u64,
    pub generator_key: GeneratorKey,
    pub bls_key: BlsKey,
}

/// Validator-set snapshot, effective from the height it is stored at until
/// the next stored version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BftParameters {
    /// Always `floor(2W/3) + 1`; derived, never caller-supplied
    pub prevote_threshold: u64,
    pub precommit_threshold: u64,
    pub certificate_threshold: u64,
    /// Sorted by address
    pub validators: Vec<Validator>,
    /// Commitment to the BLS keys and weights, consumed by certificate
    /// verification
    pub validators_hash: Hash,
}

impl BftParameters {
    /// Validator entry for `address`, if it is part of this set.
    pub fn validator(&self, address: &Address) -> Option<&Validator> {
        self.validators.iter().find(|v| v.address == *address)
    }

    /// BFT weight of `address` in this set.
    ///
    /// A validator expected to vote at a height must be present in the
    /// parameters effective there; absence is state corruption, not a
    /// recoverable condition.
    pub fn weight_of(&self, address: &Address, height: u32) -> BftResult<u64> {
        self.validator(address)
            .map(|v| v.bft_weight)
            .ok_or_else(|| BftError::InvariantViolation {
                detail: format!(
                    "validator {address:?} missing from parameters effective at height {height}"
                ),
            })
    }
}

/// Sum of all validator weights, rejecting zero-weight entries.
pub fn aggregate_bft_weight(validators: &[Validator]) -> BftResult<u64> {
    let mut total: u64 = 0;
    for validator in validators {
        if validator.bft_weight == 0 {
            return Err(BftError::ZeroValidatorWeight {
                address: validator.address,
            });
        }
        total = total.saturating_add(validator.bft_weight);
    }
    Ok(total)
}

/// `floor(2W/3) + 1` over the aggregate weight `W`.
pub fn prevote_threshold(aggregate_weight: u64) -> u64 {
    ((2u128 * u128::from(aggregate_weight)) / 3) as u64 + 1
}

/// Reject a caller-supplied threshold outside `[floor(W/3) + 1, W]`.
pub fn check_threshold_range(name: &'static str, value: u64, aggregate_weight: u64) -> BftResult<()> {
    let min = aggregate_weight / 3 + 1;
    if value < min || value > aggregate_weight {
        return Err(BftError::ThresholdOutOfRange {
            name,
            value,
            min,
            max: aggregate_weight,
        });
    }
    Ok(())
}

/// Same membership: equal length, and pairwise equal address and weight.
/// Both inputs are expected sorted by address.
pub fn same_validators(a: &[Validator], b: &[Validator]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.address == y.address && x.bft_weight == y.bft_weight)
}

/// Canonical input of the validators hash: BLS key and weight of every
/// validator sorted by BLS key, plus the certificate threshold.
#[derive(Serialize)]
struct ValidatorsHashInput {
    active_validators: Vec<ValidatorsHashEntry>,
    certificate_threshold: u64,
}

#[derive(Serialize)]
struct ValidatorsHashEntry {
    bls_key: BlsKey,
    bft_weight: u64,
}

/// SHA-256 over the canonical encoding of the validator keys/weights and the
/// certificate threshold. Input ordering is normalized, so two sets with the
/// same membership hash identically.
pub fn compute_validators_hash(
    validators: &[Validator],
    certificate_threshold: u64,
) -> BftResult<Hash> {
    let mut active_validators: Vec<ValidatorsHashEntry> = validators
        .iter()
        .map(|v| ValidatorsHashEntry {
            bls_key: v.bls_key,
            bft_weight: v.bft_weight,
        })
        .collect();
    active_validators.sort_by(|a, b| a.bls_key.cmp(&b.bls_key));

    let input = ValidatorsHashInput {
        active_validators,
        certificate_threshold,
    };
    let encoded = bincode::serialize(&input).map_err(|e| BftError::Codec {
        reason: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(hasher.finalize().into())
}
