//! Value types consumed and produced by the gadget.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// 32-byte identifier (block id, validators hash).
pub type Hash = [u8; 32];

/// Block-signing public key (32 bytes).
pub type GeneratorKey = [u8; 32];

/// Validator account address (20 bytes).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// BLS public key (48 bytes for BLS12-381 G1).
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlsKey(#[serde_as(as = "Bytes")] pub [u8; 48]);

impl BlsKey {
    pub fn new(bytes: [u8; 48]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 48] {
        &self.0
    }
}

impl Default for BlsKey {
    fn default() -> Self {
        Self([0u8; 48])
    }
}

/// Aggregate BLS commit carried inside a block header.
///
/// Produced by the surrounding certificate machinery; the gadget only checks
/// whether one is present and adopts its height as `max_height_certified`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCommit {
    pub height: u32,
    pub aggregation_bits: Vec<u8>,
    pub certificate_signature: Vec<u8>,
}

impl AggregateCommit {
    /// An empty commit certifies nothing.
    pub fn is_empty(&self) -> bool {
        self.aggregation_bits.is_empty() && self.certificate_signature.is_empty()
    }
}

/// Voting-relevant view of a block header, as delivered by the
/// block-processing pipeline. Signatures are verified upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: Hash,
    pub height: u32,
    pub generator_address: Address,
    pub max_height_generated: u32,
    pub max_height_prevoted: u32,
    pub aggregate_commit: AggregateCommit,
}

/// The three monotonic finality heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BftHeights {
    pub max_height_prevoted: u32,
    pub max_height_precommitted: u32,
    pub max_height_certified: u32,
}

/// A validator's signing key, versioned per height independently of weight
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorKeyEntry {
    pub generator_address: Address,
    pub generator_key: GeneratorKey,
}

/// Per-height snapshot of the validator signing keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorKeys {
    pub generators: Vec<GeneratorKeyEntry>,
}
